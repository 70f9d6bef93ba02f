use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use polars::prelude::ParquetWriter;
use sensorlog_parser::{load, load_file, AggregateReport, LoadOptions, LoadRequest, SourceFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATA_DIR_VAR: &str = "SENSORLOG_DATA_DIR";

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge sensor log exports into one time-series table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a directory of exports (or one file) and summarize the merged table
    Load(LoadArgs),
    /// Show how a single file's header is resolved
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ParserArgs {
    /// Source convention: generic, named-platform or model-export
    #[arg(long, default_value = "generic")]
    format: SourceFormat,
    /// TOML file with parser options
    #[arg(long)]
    config: Option<PathBuf>,
    /// Field delimiter (overrides the config file)
    #[arg(long)]
    delimiter: Option<char>,
    /// Rows scanned for the first timestamp (overrides the config file)
    #[arg(long)]
    header_scan_limit: Option<usize>,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Directory or file to load; defaults to $SENSORLOG_DATA_DIR
    path: Option<PathBuf>,
    /// Load only this file from the directory
    #[arg(long)]
    file: Option<String>,
    /// Read only model-export files and skip everything else
    #[arg(long)]
    model_exports: bool,
    /// Write the merged table to this parquet file
    #[arg(long)]
    output: Option<PathBuf>,
    #[command(flatten)]
    parser: ParserArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    file: PathBuf,
    #[command(flatten)]
    parser: ParserArgs,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Load(args) => handle_load(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn handle_load(args: LoadArgs) -> Result<()> {
    let options = resolve_options(&args.parser)?;
    let path = match args.path {
        Some(path) => path,
        None => env::var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .with_context(|| format!("no path given and {DATA_DIR_VAR} is not set"))?,
    };

    let mut request =
        LoadRequest::new(&path, args.parser.format).with_model_exports(args.model_exports);
    if let Some(file) = args.file {
        request = request.with_file_name(file);
    }

    let report = load(&request, &options)
        .with_context(|| format!("failed to load '{}'", path.display()))?;
    print_report(&report);

    if let Some(output) = args.output {
        write_parquet(&report, &output)?;
        info!(output = %output.display(), rows = report.table.height(), "wrote parquet");
    }

    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let options = resolve_options(&args.parser)?;
    let loaded = load_file(&args.file, args.parser.format, &options)
        .with_context(|| format!("failed to load '{}'", args.file.display()))?;

    println!("file:        {}", loaded.path.display());
    println!("encoding:    {}", loaded.encoding);
    println!("header rows: {}", loaded.header_block.rows());
    println!("header span: {}", loaded.header_span);
    println!("data rows:   {}", loaded.table.height());
    println!("blake3:      {}", loaded.hash);

    let mut table = Table::new();
    table.set_header(vec!["#", "column key"]);
    for (position, key) in loaded.table.column_keys().iter().enumerate() {
        table.add_row(vec![position.to_string(), format!("{:?}", key.as_str())]);
    }
    println!("{table}");
    Ok(())
}

fn resolve_options(args: &ParserArgs) -> Result<LoadOptions> {
    let mut options = match &args.config {
        Some(path) => read_config(path)?,
        None => LoadOptions::default(),
    };
    if let Some(delimiter) = args.delimiter {
        options.delimiter = delimiter;
    }
    if let Some(limit) = args.header_scan_limit {
        options.header_scan_limit = limit;
    }
    Ok(options)
}

fn read_config(path: &Path) -> Result<LoadOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse config TOML from '{}'", path.display()))
}

fn print_report(report: &AggregateReport) {
    let mut files = Table::new();
    files.set_header(vec![
        "file",
        "status",
        "encoding",
        "header rows",
        "header span",
        "rows",
    ]);
    for file in &report.loaded {
        files.add_row(vec![
            file.path.display().to_string(),
            "read".to_string(),
            file.encoding.to_string(),
            file.header_rows.to_string(),
            file.header_span.to_string(),
            file.rows.to_string(),
        ]);
    }
    for skipped in &report.skipped {
        files.add_row(vec![
            skipped.path.display().to_string(),
            format!("skipped ({})", skipped.reason),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    println!("{files}");

    let rows = report.table.height();
    let mut columns = Table::new();
    columns.set_header(vec!["column", "values", "missing"]);
    for (key, values) in report.table.columns() {
        let present = values.iter().filter(|value| value.is_some()).count();
        columns.add_row(vec![
            key.to_string(),
            present.to_string(),
            (rows - present).to_string(),
        ]);
    }
    println!("{columns}");
    println!(
        "{rows} rows from {} files ({} skipped)",
        report.loaded.len(),
        report.skipped_count()
    );
}

fn write_parquet(report: &AggregateReport, output: &Path) -> Result<()> {
    let mut df = report
        .table
        .to_dataframe()
        .context("failed to build output frame")?;
    let file = File::create(output)
        .with_context(|| format!("failed to create '{}'", output.display()))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("failed to write parquet to '{}'", output.display()))?;
    Ok(())
}
