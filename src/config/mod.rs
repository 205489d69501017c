//! Parameter-configuration file loading.
//!
//! The format is one line per managed-object type:
//!
//! ```text
//! UCELL:CELLID,CELLNAME,LAC
//! UCELLSETUP:CELLID,ACTIVE
//! ```
//!
//! A configuration restricts the run to exactly the listed MO types with
//! exactly the listed columns in the listed order, and skips the discovery
//! pass entirely. The `-p` listing printed by the converter uses the same
//! format, so a previous run's output can be edited down and fed back in.

use indexmap::IndexMap;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::transform::schema::{Schema, SchemaRegistry};

/// Load a configuration file into a closed, pre-seeded registry.
///
/// Any line without a `:` separator aborts the load; with a half-read
/// configuration the schema restriction would be ill-defined.
pub fn load_parameter_config(path: &Path) -> ConfigResult<SchemaRegistry> {
    let content = fs::read_to_string(path)?;
    parse_parameter_config(&content)
}

/// Parse configuration text; see [`load_parameter_config`].
pub fn parse_parameter_config(content: &str) -> ConfigResult<SchemaRegistry> {
    let mut schemas: IndexMap<String, Schema> = IndexMap::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        let Some((mo_type, column_list)) = line.split_once(':') else {
            return Err(ConfigError::MissingSeparator {
                line: idx + 1,
                content: line.to_string(),
            });
        };

        let columns: Vec<String> = column_list
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        schemas.insert(mo_type.to_string(), Schema::from_columns(columns));
    }

    if schemas.is_empty() {
        return Err(ConfigError::Empty);
    }

    Ok(SchemaRegistry::restricted(schemas))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_config() {
        let reg = parse_parameter_config("UCELL:CELLID,CELLNAME\nSITE:NAME\n").unwrap();
        assert!(reg.is_restricted());
        assert_eq!(reg.get("UCELL").unwrap().columns(), ["CELLID", "CELLNAME"]);
        assert_eq!(reg.get("SITE").unwrap().columns(), ["NAME"]);
        assert!(reg.get("OTHER").is_none());
    }

    #[test]
    fn test_mo_order_is_file_order() {
        let reg = parse_parameter_config("B:X\nA:Y\n").unwrap();
        let order: Vec<&str> = reg.iter().map(|(mo, _)| mo).collect();
        assert_eq!(order, ["B", "A"]);
    }

    #[test]
    fn test_missing_separator_is_fatal() {
        let err = parse_parameter_config("UCELL:CELLID\nBROKEN LINE\n").unwrap_err();
        match err {
            ConfigError::MissingSeparator { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "BROKEN LINE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_crlf_lines() {
        let reg = parse_parameter_config("UCELL:CELLID,LAC\r\nSITE:NAME\r\n").unwrap();
        assert_eq!(reg.get("UCELL").unwrap().columns(), ["CELLID", "LAC"]);
    }

    #[test]
    fn test_meta_columns_may_be_configured() {
        let reg = parse_parameter_config("UCELL:FILENAME,CELLID,DATETIME\n").unwrap();
        assert_eq!(
            reg.get("UCELL").unwrap().columns(),
            ["FILENAME", "CELLID", "DATETIME"]
        );
    }

    #[test]
    fn test_empty_config_rejected() {
        assert!(matches!(
            parse_parameter_config(""),
            Err(ConfigError::Empty)
        ));
    }
}
