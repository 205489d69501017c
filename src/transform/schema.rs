//! Per-MO-type column schemas and multi-value expansion bookkeeping.
//!
//! A [`Schema`] is the ordered column list for one managed-object type.
//! Column order is first-occurrence order across the discovery pass and is
//! append-only: once a column is in, it never moves. The one refinement over
//! plain appending is for multi-valued parameters: a child column discovered
//! late (a later instance carrying an extra child key) is inserted right
//! after the parent's last existing child, so a parent's derived columns
//! always form one contiguous block at the parent's first-seen position.
//!
//! The [`ExpansionMap`] records, per (MO type, parent parameter), the child
//! keys in the order the first expanded instance presented them. Later
//! instances reuse that order; unseen keys are appended.

use indexmap::IndexMap;
use std::collections::HashMap;

/// Ordered column list for one MO type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Build a closed schema from a configured column list.
    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn push_if_absent(&mut self, name: &str) {
        if !self.contains(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Insert `name` right after `anchor`, or append if the anchor is gone.
    fn insert_after(&mut self, anchor: &str, name: &str) {
        if self.contains(name) {
            return;
        }
        match self.columns.iter().position(|c| c == anchor) {
            Some(pos) => self.columns.insert(pos + 1, name.to_string()),
            None => self.columns.push(name.to_string()),
        }
    }
}

/// Child-key order per (MO type, parent parameter), fixed by first expansion.
#[derive(Debug, Default)]
pub struct ExpansionMap {
    children: HashMap<(String, String), Vec<String>>,
}

impl ExpansionMap {
    /// Recorded child keys for a parent parameter, in emission order.
    pub fn children(&self, mo_type: &str, param: &str) -> Option<&[String]> {
        self.children
            .get(&(mo_type.to_string(), param.to_string()))
            .map(|v| v.as_slice())
    }

    /// Record the child keys of one decoded instance. The first instance
    /// fixes the order; keys it did not carry are appended as they show up.
    pub fn record(&mut self, mo_type: &str, param: &str, keys: &[String]) {
        let recorded = self
            .children
            .entry((mo_type.to_string(), param.to_string()))
            .or_default();
        for key in keys {
            if !recorded.contains(key) {
                recorded.push(key.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// All schemas of a run, keyed by MO type in first-seen order.
///
/// In discovery mode schemas grow as instances arrive. In restricted mode
/// (pre-seeded from a parameter-configuration file) the column sets are
/// closed: `ensure_*` calls are no-ops and unknown MO types stay absent,
/// which the emitter treats as "drop the row".
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
    restricted: bool,
}

impl SchemaRegistry {
    /// Empty registry that grows during the discovery pass.
    pub fn discovering() -> Self {
        Self::default()
    }

    /// Closed registry seeded from a parameter-configuration file.
    pub fn restricted(schemas: IndexMap<String, Schema>) -> Self {
        Self {
            schemas,
            restricted: true,
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn get(&self, mo_type: &str) -> Option<&Schema> {
        self.schemas.get(mo_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// MO types and their schemas in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append a direct column if absent. No-op in restricted mode.
    pub fn ensure_column(&mut self, mo_type: &str, column: &str) {
        if self.restricted {
            return;
        }
        self.schemas
            .entry(mo_type.to_string())
            .or_default()
            .push_if_absent(column);
    }

    /// Ensure the derived column `<param>_<key>` exists, placed inside the
    /// parent's contiguous block as dictated by the expansion map's recorded
    /// order. No-op in restricted mode.
    pub fn ensure_child(
        &mut self,
        mo_type: &str,
        param: &str,
        key: &str,
        expansions: &ExpansionMap,
    ) {
        if self.restricted {
            return;
        }
        let column = format!("{param}_{key}");
        let schema = self.schemas.entry(mo_type.to_string()).or_default();
        if schema.contains(&column) {
            return;
        }

        // The column goes right after the previous child in recorded order;
        // the first recorded child starts the block at the schema tail.
        let anchor = expansions
            .children(mo_type, param)
            .and_then(|keys| {
                let pos = keys.iter().position(|k| k == key)?;
                pos.checked_sub(1).map(|p| format!("{param}_{}", keys[p]))
            });
        match anchor {
            Some(anchor) if schema.contains(&anchor) => schema.insert_after(&anchor, &column),
            _ => schema.push_if_absent(&column),
        }
    }

    /// Make sure an MO type exists even if its first instance had no
    /// parameters, so it still gets an output file.
    pub fn ensure_mo_type(&mut self, mo_type: &str) {
        if self.restricted {
            return;
        }
        self.schemas.entry(mo_type.to_string()).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_keep_first_seen_order() {
        let mut reg = SchemaRegistry::discovering();
        reg.ensure_column("UCELL", "CELLID");
        reg.ensure_column("UCELL", "NAME");
        reg.ensure_column("UCELL", "CELLID");
        assert_eq!(reg.get("UCELL").unwrap().columns(), ["CELLID", "NAME"]);
    }

    #[test]
    fn test_mo_types_keep_first_seen_order() {
        let mut reg = SchemaRegistry::discovering();
        reg.ensure_column("B", "X");
        reg.ensure_column("A", "Y");
        let order: Vec<&str> = reg.iter().map(|(mo, _)| mo).collect();
        assert_eq!(order, ["B", "A"]);
    }

    #[test]
    fn test_children_stay_contiguous() {
        let mut reg = SchemaRegistry::discovering();
        let mut exp = ExpansionMap::default();

        // First instance: P1, X=A&B, P2
        reg.ensure_column("FOO", "P1");
        exp.record("FOO", "X", &["A".into(), "B".into()]);
        reg.ensure_child("FOO", "X", "A", &exp);
        reg.ensure_child("FOO", "X", "B", &exp);
        reg.ensure_column("FOO", "P2");

        // Later instance introduces child C: it must join X's block, not
        // land after P2.
        exp.record("FOO", "X", &["A".into(), "B".into(), "C".into()]);
        reg.ensure_child("FOO", "X", "C", &exp);

        assert_eq!(
            reg.get("FOO").unwrap().columns(),
            ["P1", "X_A", "X_B", "X_C", "P2"]
        );
    }

    #[test]
    fn test_expansion_order_first_wins() {
        let mut exp = ExpansionMap::default();
        exp.record("FOO", "X", &["B".into(), "A".into()]);
        exp.record("FOO", "X", &["A".into(), "C".into(), "B".into()]);
        assert_eq!(exp.children("FOO", "X").unwrap(), ["B", "A", "C"]);
    }

    #[test]
    fn test_restricted_registry_is_closed() {
        let mut schemas = IndexMap::new();
        schemas.insert(
            "FOO".to_string(),
            Schema::from_columns(vec!["P1".into(), "P2".into()]),
        );
        let mut reg = SchemaRegistry::restricted(schemas);

        reg.ensure_column("FOO", "P3");
        reg.ensure_column("BAR", "Q1");
        let exp = ExpansionMap::default();
        reg.ensure_child("FOO", "X", "A", &exp);

        assert_eq!(reg.get("FOO").unwrap().columns(), ["P1", "P2"]);
        assert!(reg.get("BAR").is_none());
    }
}
