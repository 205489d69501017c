//! Per-file parse state: nesting depths, current MO type, and the
//! network-element identity captured from the document.
//!
//! One [`RunContext`] is built fresh for every input file and threaded
//! through the event dispatch, instead of scattering the counters over the
//! orchestrator. Dropping it is the reset between files.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::parser::ObjectAttrs;

/// Reserved meta column names, in header order.
pub const META_COLUMNS: [&str; 6] = [
    "FILENAME",
    "DATETIME",
    "NE_TECHNOLOGY",
    "NE_VENDOR",
    "NE_VERSION",
    "NE_TYPE",
];

/// Trailing digit run right before a three-letter file extension, e.g.
/// `GExport_RNC01_10.22.111.88_20171211060843.xml`.
static FILE_TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)\.\D{3}$").unwrap());

/// Parse state for one input file.
#[derive(Debug, Default)]
pub struct RunContext {
    class_depth: u32,
    object_depth: u32,
    /// Name of the most recently started `class`; the MO type of every
    /// object until the next class starts.
    current_class: Option<String>,
    /// Name of the depth-1 class, e.g. `BSC6900UMTSV900R013`.
    node_type_version: String,
    vendor: Option<String>,
    technique: Option<String>,
    version: Option<String>,
    base_file_name: String,
    date_time: String,
}

impl RunContext {
    pub fn new(path: &Path) -> Self {
        let base_file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let date_time = datetime_from_filename(&base_file_name);
        Self {
            base_file_name,
            date_time,
            ..Self::default()
        }
    }

    pub fn on_class_start(&mut self, name: Option<String>) {
        self.class_depth += 1;
        if let Some(name) = name {
            if self.class_depth == 1 {
                self.node_type_version = name.clone();
            }
            self.current_class = Some(name);
        }
    }

    pub fn on_class_end(&mut self) {
        self.class_depth = self.class_depth.saturating_sub(1);
    }

    /// The depth-1 object carries the network-element identity; the first
    /// one seen wins and is never overwritten.
    pub fn on_object_start(&mut self, attrs: &ObjectAttrs) {
        self.object_depth += 1;
        if self.object_depth == 1 {
            if self.vendor.is_none() {
                self.vendor = attrs.vendor.clone();
            }
            if self.technique.is_none() {
                self.technique = attrs.technique.clone();
            }
            if self.version.is_none() {
                self.version = attrs.version.clone();
            }
        }
    }

    /// Returns `true` when the closed object was the root-level one, so the
    /// orchestrator can tell the NE envelope apart from an MO instance.
    pub fn on_object_end(&mut self) -> bool {
        let was_root = self.object_depth == 1;
        self.object_depth = self.object_depth.saturating_sub(1);
        was_root
    }

    /// MO type of the object currently being read, if any class was seen.
    pub fn mo_type(&self) -> Option<&str> {
        self.current_class.as_deref()
    }

    pub fn base_file_name(&self) -> &str {
        &self.base_file_name
    }

    /// Value for a reserved meta column name, `None` for ordinary columns.
    pub fn meta_value(&self, column: &str) -> Option<&str> {
        match column {
            "FILENAME" => Some(&self.base_file_name),
            "DATETIME" => Some(&self.date_time),
            "NE_TECHNOLOGY" => Some(self.technique.as_deref().unwrap_or("")),
            "NE_VENDOR" => Some(self.vendor.as_deref().unwrap_or("")),
            "NE_VERSION" => Some(self.version.as_deref().unwrap_or("")),
            "NE_TYPE" => Some(&self.node_type_version),
            _ => None,
        }
    }

    /// The six meta values in [`META_COLUMNS`] order.
    pub fn meta_values(&self) -> Vec<String> {
        META_COLUMNS
            .iter()
            .map(|c| self.meta_value(c).unwrap_or("").to_string())
            .collect()
    }
}

/// Extract the capture timestamp from a dump file name.
///
/// A trailing `_<digits>.<ext>` run is pulled out; a 14-digit run is
/// reformatted `YYYYMMDDhhmmss` → `YYYY-MM-DD hh:mm:ss`, any other digit
/// run passes through as-is, and names without the pattern yield "".
pub fn datetime_from_filename(file_name: &str) -> String {
    let digits = match FILE_TIMESTAMP_RE.captures(file_name) {
        Some(caps) => caps[1].to_string(),
        None => return String::new(),
    };
    match NaiveDateTime::parse_from_str(&digits, "%Y%m%d%H%M%S") {
        Ok(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => digits,
    }
}
