//! Per-object-instance attribute accumulation.
//!
//! One [`Accumulator`] instance is reused storage for the object currently
//! being read: parameter events fill it, the row (or the schema, during
//! discovery) is built from it when the object closes, and it is cleared
//! before the next object of any type.
//!
//! Parameter names are uppercased on the way in, so column identity is
//! case-insensitive at the source but case-fixed in output. Multi-valued
//! encodings are split here: each child lands under its derived
//! `<PARENT>_<child>` column and the child-key order is forwarded to the
//! run's [`ExpansionMap`].

use indexmap::IndexMap;

use super::multivalue;
use super::schema::ExpansionMap;

/// Where an accumulated column came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Plain parameter, column name is the uppercased parameter name.
    Direct,
    /// Child of a multi-valued parameter.
    Derived { parent: String, key: String },
}

/// Value of one accumulated column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    pub value: String,
    pub origin: Origin,
}

/// Insertion-ordered column → value map for one object instance.
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: IndexMap<String, ParamValue>,
}

impl Accumulator {
    /// Store one parameter event. Multi-valued encodings fan out into one
    /// entry per child; everything else is stored verbatim under the
    /// uppercased parameter name. A repeated name overwrites the value but
    /// keeps its original position.
    pub fn put(&mut self, mo_type: &str, param_name: &str, value: &str, expansions: &mut ExpansionMap) {
        let param = param_name.to_uppercase();

        match multivalue::decode(&param, value) {
            Some(pairs) => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| k.clone()).collect();
                expansions.record(mo_type, &param, &keys);
                for (key, child_value) in pairs {
                    let column = format!("{param}_{key}");
                    self.entries.insert(
                        column,
                        ParamValue {
                            value: child_value,
                            origin: Origin::Derived {
                                parent: param.clone(),
                                key,
                            },
                        },
                    );
                }
            }
            None => {
                self.entries.insert(
                    param,
                    ParamValue {
                        value: value.to_string(),
                        origin: Origin::Direct,
                    },
                );
            }
        }
    }

    /// Value for a resolved column name, if this instance carried it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries.get(column).map(|p| p.value.as_str())
    }

    /// Accumulated columns in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries; called once per completed object instance.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
