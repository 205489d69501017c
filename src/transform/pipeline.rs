//! Two-pass conversion pipeline.
//!
//! The converter walks the input set twice: a discovery pass that only grows
//! the schema registry and expansion map, then an emission pass that writes
//! rows against the now-closed schemas. When a parameter-configuration file
//! pre-seeds the registry, discovery is skipped and the single walk emits
//! directly.
//!
//! ```text
//! ┌──────────────┐   events   ┌─────────────┐  object close  ┌───────────┐
//! │ XML tokenizer│───────────▶│ RunContext +│───────────────▶│ Schema    │
//! │ (per file)   │            │ Accumulator │                │ registry  │
//! └──────────────┘            └─────────────┘                └─────┬─────┘
//!                                                                  │ row
//!                                                            ┌─────▼─────┐
//!                                                            │ CSV sinks │
//!                                                            └───────────┘
//! ```
//!
//! Registry, expansion map and sink pool persist across files within one
//! run, so an MO type spread over several dumps shares one schema and one
//! output file. Everything per-file lives in a fresh [`RunContext`].

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::accumulator::{Accumulator, Origin};
use super::context::{RunContext, META_COLUMNS};
use super::schema::{ExpansionMap, SchemaRegistry};
use crate::config::load_parameter_config;
use crate::error::{PipelineError, PipelineResult};
use crate::parser::{CmEvent, XmlEventSource};
use crate::sink::SinkPool;

/// Options for one conversion run.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Directory receiving the per-MO-type CSV files.
    pub output_dir: PathBuf,

    /// Pre-seed the schema registry from this file and skip discovery.
    pub parameter_config: Option<PathBuf>,

    /// Prepend FILENAME, DATETIME, NE_TECHNOLOGY, NE_VENDOR, NE_VERSION and
    /// NE_TYPE to every header and row.
    pub meta_fields: bool,

    /// Discovery only: print the `MOType:col1,col2,...` listing to stdout
    /// and write no CSV files.
    pub extract_parameters_only: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            parameter_config: None,
            meta_fields: false,
            extract_parameters_only: false,
        }
    }
}

/// Orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    DiscoveringSchema,
    EmittingRows,
    Done,
}

/// What one run did, for the operator's closing summary.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub mo_types: usize,
    pub output_files: usize,
    pub rows_written: u64,
}

/// Drives the whole conversion; owns all state that outlives one file.
pub struct Converter {
    state: ParserState,
    registry: SchemaRegistry,
    expansions: ExpansionMap,
    sinks: SinkPool,
    options: ParseOptions,
    files_processed: usize,
    files_skipped: usize,
}

impl Converter {
    /// Build a converter, loading the parameter configuration if one was
    /// supplied (which also decides the initial state).
    pub fn new(options: ParseOptions) -> PipelineResult<Self> {
        let (registry, state) = match &options.parameter_config {
            Some(path) => (load_parameter_config(path)?, ParserState::EmittingRows),
            None => (
                SchemaRegistry::discovering(),
                ParserState::DiscoveringSchema,
            ),
        };
        let sinks = SinkPool::new(&options.output_dir);
        Ok(Self {
            state,
            registry,
            expansions: ExpansionMap::default(),
            sinks,
            options,
            files_processed: 0,
            files_skipped: 0,
        })
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Run the conversion over one file or a directory of files.
    pub fn run(&mut self, input: &Path) -> PipelineResult<RunSummary> {
        if self.state == ParserState::DiscoveringSchema {
            self.walk_input(input)?;
            self.state = ParserState::EmittingRows;
        }

        if self.options.extract_parameters_only {
            self.print_parameter_listing();
            self.state = ParserState::Done;
            return Ok(self.summary());
        }

        self.walk_input(input)?;
        self.state = ParserState::Done;
        self.sinks.close()?;
        Ok(self.summary())
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            files_processed: self.files_processed,
            files_skipped: self.files_skipped,
            mo_types: self.registry.len(),
            output_files: self.sinks.files_created(),
            rows_written: self.sinks.rows_written(),
        }
    }

    /// One walk over the input set in the current state.
    ///
    /// A single-file input fails the run on error; inside a directory each
    /// file is its own failure domain and the walk continues.
    fn walk_input(&mut self, input: &Path) -> PipelineResult<()> {
        self.files_processed = 0;
        self.files_skipped = 0;

        let meta = fs::metadata(input)
            .map_err(|_| PipelineError::InputNotReadable(input.to_path_buf()))?;

        if meta.is_file() {
            self.announce(input);
            self.process_file(input)?;
            self.files_processed += 1;
            self.announce_done();
            return Ok(());
        }

        if !meta.is_dir() {
            return Err(PipelineError::InputNotReadable(input.to_path_buf()));
        }

        // Sorted so reruns produce byte-identical output files.
        let mut paths: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        for path in paths {
            self.announce(&path);
            match self.process_file(&path) {
                Ok(()) => {
                    self.files_processed += 1;
                    self.announce_done();
                }
                Err(e) => {
                    self.files_skipped += 1;
                    if !self.options.extract_parameters_only {
                        eprintln!(" Error: {e}");
                        eprintln!("Skipping file: {}", path.display());
                    }
                }
            }
        }
        Ok(())
    }

    fn announce(&self, path: &Path) {
        if self.options.extract_parameters_only {
            return;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.state {
            ParserState::DiscoveringSchema => eprint!("Extracting parameters from {name}..."),
            _ => eprint!("Parsing {name}..."),
        }
    }

    fn announce_done(&self) {
        if !self.options.extract_parameters_only {
            eprintln!(" Done.");
        }
    }

    /// Walk one file's event stream with a fresh per-file context.
    fn process_file(&mut self, path: &Path) -> PipelineResult<()> {
        let mut source = XmlEventSource::open(path)?;
        let mut ctx = RunContext::new(path);
        let mut acc = Accumulator::default();

        let result = self.drive(&mut source, &mut ctx, &mut acc);
        if let Err(ref e) = result {
            warn!(
                file = %ctx.base_file_name(),
                mo_type = ctx.mo_type().unwrap_or(""),
                error = %e,
                "file walk failed"
            );
        }
        result
    }

    fn drive<R: BufRead>(
        &mut self,
        source: &mut XmlEventSource<R>,
        ctx: &mut RunContext,
        acc: &mut Accumulator,
    ) -> PipelineResult<()> {
        while let Some(event) = source.next_event()? {
            match event {
                CmEvent::ClassStart { name } => ctx.on_class_start(name),
                CmEvent::ClassEnd => ctx.on_class_end(),
                CmEvent::ObjectStart(attrs) => ctx.on_object_start(&attrs),
                CmEvent::ObjectEnd => {
                    let was_root = ctx.on_object_end();
                    if was_root && acc.is_empty() {
                        // NE envelope closing, not a managed-object instance.
                        continue;
                    }
                    self.finish_instance(ctx, acc)?;
                }
                CmEvent::Parameter { name, value } => {
                    if let Some(mo_type) = ctx.mo_type() {
                        acc.put(mo_type, &name, &value, &mut self.expansions);
                    }
                }
                // Comments were once meant to override the preceding
                // parameter value; the source format never used that, so
                // they carry no data. Text inside these dumps is layout.
                CmEvent::Comment(_) | CmEvent::Text(_) => {}
            }
        }
        Ok(())
    }

    /// One object instance is complete: grow the schema (discovery) or
    /// write its row (emission), then recycle the accumulator.
    fn finish_instance(&mut self, ctx: &RunContext, acc: &mut Accumulator) -> PipelineResult<()> {
        let Some(mo_type) = ctx.mo_type() else {
            acc.clear();
            return Ok(());
        };

        match self.state {
            ParserState::DiscoveringSchema => {
                self.registry.ensure_mo_type(mo_type);
                for (column, param) in acc.entries() {
                    match &param.origin {
                        Origin::Direct => self.registry.ensure_column(mo_type, column),
                        Origin::Derived { parent, key } => {
                            self.registry
                                .ensure_child(mo_type, parent, key, &self.expansions)
                        }
                    }
                }
            }
            ParserState::EmittingRows => self.emit_row(mo_type, ctx, acc)?,
            ParserState::Done => {}
        }

        acc.clear();
        Ok(())
    }

    /// Reconcile one instance's values against the closed schema and write
    /// the row: schema order decides everything, values the instance did
    /// not carry render empty, reserved meta names fall back to run context.
    fn emit_row(&mut self, mo_type: &str, ctx: &RunContext, acc: &Accumulator) -> PipelineResult<()> {
        let Some(schema) = self.registry.get(mo_type) else {
            // Restricted mode drops unconfigured MO types. In discovery
            // mode a type can only be missing if its file already failed
            // mid-discovery, and that file is not producing rows anyway.
            debug!(mo_type, "no schema for MO type, dropping row");
            return Ok(());
        };

        let meta = self.options.meta_fields;
        let width = schema.len() + if meta { META_COLUMNS.len() } else { 0 };
        if width == 0 {
            debug!(mo_type, "schema has no columns, dropping row");
            return Ok(());
        }

        let mut row: Vec<String> = Vec::with_capacity(width);
        if meta {
            row.extend(ctx.meta_values());
        }
        for column in schema.columns() {
            let value = acc
                .get(column)
                .or_else(|| ctx.meta_value(column))
                .unwrap_or("");
            row.push(value.to_string());
        }

        let header = || {
            let mut header: Vec<String> = Vec::with_capacity(width);
            if meta {
                header.extend(META_COLUMNS.iter().map(|c| c.to_string()));
            }
            header.extend(schema.columns().iter().cloned());
            header
        };
        self.sinks.write_row(mo_type, header, &row)?;
        Ok(())
    }

    /// Print the discovered (or configured) schemas in the same
    /// `MOType:col1,col2,...` format the configuration loader reads.
    fn print_parameter_listing(&self) {
        for (mo_type, schema) in self.registry.iter() {
            let mut columns: Vec<&str> = Vec::new();
            if self.options.meta_fields {
                columns.extend(META_COLUMNS);
            }
            columns.extend(schema.columns().iter().map(String::as_str));
            println!("{mo_type}:{}", columns.join(","));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DUMP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bulkCmConfigDataFile>
<class name="BSC6900UMTS">
  <object vendor="Huawei" technique="WCDMA" version="V900R013">
    <class name="UCELL">
      <object>
        <parameter name="CellId" value="101"/>
        <parameter name="NbrList" value="A-1&amp;B-2"/>
        <parameter name="Remark" value="plain"/>
      </object>
      <object>
        <parameter name="CellId" value="102"/>
        <parameter name="Extra" value="with,comma"/>
      </object>
    </class>
    <class name="SITE">
      <object>
        <parameter name="Name" value="North"/>
        <parameter name="Action" value="SET-1&amp;GET-2"/>
      </object>
    </class>
  </object>
</class>
</bulkCmConfigDataFile>
"#;

    fn write_dump(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn convert(input: &Path, options: ParseOptions) -> RunSummary {
        let mut converter = Converter::new(options).unwrap();
        let summary = converter.run(input).unwrap();
        assert_eq!(converter.state(), ParserState::Done);
        summary
    }

    #[test]
    fn test_discovery_then_emission() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dump = write_dump(input_dir.path(), "GExport_RNC1_20230102030405.xml", DUMP);

        let summary = convert(
            &dump,
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                ..ParseOptions::default()
            },
        );

        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_skipped, 0);
        assert_eq!(summary.mo_types, 2);
        assert_eq!(summary.rows_written, 3);

        let ucell = fs::read_to_string(out_dir.path().join("UCELL.csv")).unwrap();
        let mut lines = ucell.lines();
        // Derived columns sit at the parent's first-seen position, columns
        // discovered in the second instance go to the end.
        assert_eq!(lines.next().unwrap(), "CELLID,NBRLIST_A,NBRLIST_B,REMARK,EXTRA");
        assert_eq!(lines.next().unwrap(), "101,1,2,plain,");
        assert_eq!(lines.next().unwrap(), "102,,,,\"with,comma\"");
        assert_eq!(lines.next(), None);

        let site = fs::read_to_string(out_dir.path().join("SITE.csv")).unwrap();
        // ACTION keeps its raw &-joined value as one column.
        assert_eq!(site, "NAME,ACTION\nNorth,SET-1&GET-2\n");
    }

    #[test]
    fn test_meta_fields_prepended() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dump = write_dump(input_dir.path(), "GExport_RNC1_20230102030405.xml", DUMP);

        convert(
            &dump,
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                meta_fields: true,
                ..ParseOptions::default()
            },
        );

        let site = fs::read_to_string(out_dir.path().join("SITE.csv")).unwrap();
        let mut lines = site.lines();
        assert_eq!(
            lines.next().unwrap(),
            "FILENAME,DATETIME,NE_TECHNOLOGY,NE_VENDOR,NE_VERSION,NE_TYPE,NAME,ACTION"
        );
        assert_eq!(
            lines.next().unwrap(),
            "GExport_RNC1_20230102030405.xml,2023-01-02 03:04:05,WCDMA,Huawei,V900R013,BSC6900UMTS,North,SET-1&GET-2"
        );
    }

    #[test]
    fn test_restricted_mode_filters_and_orders() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dump = write_dump(input_dir.path(), "dump.xml", DUMP);
        let config = input_dir.path().join("parser.cfg");
        fs::write(&config, "UCELL:REMARK,CELLID\n").unwrap();

        let summary = convert(
            &dump,
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                parameter_config: Some(config),
                ..ParseOptions::default()
            },
        );

        // Configured order wins, unconfigured MO types produce no file.
        let ucell = fs::read_to_string(out_dir.path().join("UCELL.csv")).unwrap();
        assert_eq!(ucell, "REMARK,CELLID\nplain,101\n,102\n");
        assert!(!out_dir.path().join("SITE.csv").exists());
        assert_eq!(summary.output_files, 1);
    }

    #[test]
    fn test_restricted_mode_meta_column_substitution() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dump = write_dump(input_dir.path(), "GExport_X_20230102030405.xml", DUMP);
        let config = input_dir.path().join("parser.cfg");
        fs::write(&config, "SITE:NAME,DATETIME\n").unwrap();

        convert(
            &dump,
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                parameter_config: Some(config),
                ..ParseOptions::default()
            },
        );

        let site = fs::read_to_string(out_dir.path().join("SITE.csv")).unwrap();
        assert_eq!(site, "NAME,DATETIME\nNorth,2023-01-02 03:04:05\n");
    }

    #[test]
    fn test_directory_walk_recovers_per_file() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_dump(input_dir.path(), "a_good.xml", DUMP);
        write_dump(input_dir.path(), "b_broken.xml", "<class name=\"X\"><object><parameter");
        write_dump(input_dir.path(), "c_good.xml", DUMP);

        let summary = convert(
            input_dir.path(),
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                ..ParseOptions::default()
            },
        );

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, 1);

        // Rows from both good files share one schema and one output file.
        let ucell = fs::read_to_string(out_dir.path().join("UCELL.csv")).unwrap();
        assert_eq!(ucell.lines().count(), 1 + 4);
    }

    #[test]
    fn test_reruns_are_byte_identical() {
        let input_dir = tempfile::tempdir().unwrap();
        write_dump(input_dir.path(), "GExport_A_20230102030405.xml", DUMP);

        let out_a = tempfile::tempdir().unwrap();
        let out_b = tempfile::tempdir().unwrap();
        for out in [out_a.path(), out_b.path()] {
            convert(
                input_dir.path(),
                ParseOptions {
                    output_dir: out.to_path_buf(),
                    meta_fields: true,
                    ..ParseOptions::default()
                },
            );
        }

        for name in ["UCELL.csv", "SITE.csv"] {
            let a = fs::read(out_a.path().join(name)).unwrap();
            let b = fs::read(out_b.path().join(name)).unwrap();
            assert_eq!(a, b, "{name} differs between identical runs");
        }
    }

    #[test]
    fn test_extract_parameters_only_writes_nothing() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let dump = write_dump(input_dir.path(), "dump.xml", DUMP);

        let summary = convert(
            &dump,
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                extract_parameters_only: true,
                ..ParseOptions::default()
            },
        );

        assert_eq!(summary.mo_types, 2);
        assert_eq!(summary.rows_written, 0);
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rows_always_match_header_width() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_dump(input_dir.path(), "dump.xml", DUMP);

        convert(
            input_dir.path(),
            ParseOptions {
                output_dir: out_dir.path().to_path_buf(),
                meta_fields: true,
                ..ParseOptions::default()
            },
        );

        for entry in fs::read_dir(out_dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_path(&path)
                .unwrap();
            let records: Vec<csv::StringRecord> =
                reader.records().collect::<Result<_, _>>().unwrap();
            let width = records[0].len();
            assert!(records.iter().all(|r| r.len() == width));
        }
    }

    #[test]
    fn test_single_broken_file_is_fatal() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let broken = write_dump(input_dir.path(), "broken.xml", "<object><parameter");

        let mut converter = Converter::new(ParseOptions {
            output_dir: out_dir.path().to_path_buf(),
            ..ParseOptions::default()
        })
        .unwrap();
        assert!(converter.run(&broken).is_err());
    }
}
