//! gexport2csv CLI - Parse Huawei GExport configuration dumps to CSV
//!
//! ```bash
//! gexport2csv -i GExport_RNC01_20171211060843.xml -o out_folder
//! gexport2csv -i dump_folder -o out_folder
//! gexport2csv -i dump_folder -o out_folder -c parser.cfg
//! gexport2csv -i dump_folder -p -m
//! ```

use clap::Parser;
use gexport2csv::{Converter, ParseOptions, PipelineError, PipelineResult, RunSummary};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gexport2csv")]
#[command(version)]
#[command(about = "Parses Huawei GExport configuration data file XML to csv", long_about = None)]
struct Cli {
    /// Input file or directory name
    #[arg(short = 'i', long = "input-file", value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Output directory name
    #[arg(
        short = 'o',
        long = "output-directory",
        value_name = "OUTPUT_DIRECTORY",
        required_unless_present = "extract_parameters"
    )]
    output_directory: Option<PathBuf>,

    /// Parameter configuration file (MOType:col1,col2,...)
    #[arg(short = 'c', long = "parameter-config", value_name = "PARAMETER_CONFIG")]
    parameter_config: Option<PathBuf>,

    /// Add meta fields to extracted rows:
    /// FILENAME,DATETIME,NE_TECHNOLOGY,NE_VENDOR,NE_VERSION,NE_TYPE
    #[arg(short = 'm', long = "meta-fields")]
    meta_fields: bool,

    /// Extract only the managed objects and parameters
    #[arg(short = 'p', long = "extract-parameters")]
    extract_parameters: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    let started = Instant::now();

    if let Some(ref dir) = cli.output_directory {
        check_output_directory(dir)?;
    }

    let options = ParseOptions {
        output_dir: cli
            .output_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
        parameter_config: cli.parameter_config.clone(),
        meta_fields: cli.meta_fields,
        extract_parameters_only: cli.extract_parameters,
    };

    let mut converter = Converter::new(options)?;
    let summary = converter.run(&cli.input_file)?;

    if !cli.extract_parameters {
        print_summary(&summary, started);
    }
    Ok(())
}

/// The output directory must exist and accept new files before any XML is
/// touched; finding out halfway through a large dump set is too late.
fn check_output_directory(dir: &Path) -> PipelineResult<()> {
    if !dir.is_dir() {
        return Err(PipelineError::OutputNotWritable(dir.to_path_buf()));
    }
    let probe = dir.join(".gexport2csv.probe");
    match fs::write(&probe, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(PipelineError::OutputNotWritable(dir.to_path_buf())),
    }
}

fn print_summary(summary: &RunSummary, started: Instant) {
    eprintln!(
        "Parsing completed. {} file(s) parsed, {} skipped.",
        summary.files_processed, summary.files_skipped
    );
    eprintln!(
        "{} row(s) written across {} output file(s) ({} MO type(s)).",
        summary.rows_written, summary.output_files, summary.mo_types
    );
    eprintln!("Total time: {:.2?}", started.elapsed());
}
