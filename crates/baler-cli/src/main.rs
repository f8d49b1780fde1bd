//! baler - pack text directories into the fewest size-bounded files.
//!
//! `baler convert` bundles a source tree into `output_<n>.txt` shards;
//! `baler unconvert` restores the tree from those shards.

use baler_cli::exit_codes::{render_error, ExitCode};
use baler_cli::logging::{generate_run_id, init_logging, LogConfig, LogFormat};
use baler_cli::output::{render_version, ConvertSummary, OutputFormat, RunInfo, UnconvertSummary};
use baler_cli::settings::{
    convert_config, load_settings, unconvert_config, ConvertOverrides, LoadedSettings,
    UnconvertOverrides,
};
use baler_core::{convert_report, unconvert_report, BalerError, TracingLogger};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Convert text directories into the minimum number of files to use with LLMs
#[derive(Parser)]
#[command(name = "baler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Settings file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Payload format on stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    /// Prefix human log lines with a timestamp
    #[arg(long, global = true)]
    log_timestamps: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a directory into size-bounded text files
    ///
    /// Input files larger than --max-input-file-size are skipped and output
    /// files are split before they pass --max-output-file-size.
    Convert(ConvertArgs),

    /// Restore original files from converted output
    Unconvert(UnconvertArgs),

    /// Show the version of baler
    Version,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Directory to convert
    source: PathBuf,

    /// Existing directory receiving the shards
    dest: PathBuf,

    /// Skip files larger than this many bytes [default: 1048576]
    #[arg(short = 'i', long)]
    max_input_file_size: Option<u64>,

    /// Skip files with more lines than this [default: 10000]
    #[arg(short = 'l', long)]
    max_input_file_lines: Option<u64>,

    /// Maximum size in bytes of a generated shard [default: 5242880]
    #[arg(short = 'o', long)]
    max_output_file_size: Option<u64>,

    /// Longest line in bytes the scanner accepts (0 = max input file size)
    #[arg(short = 'b', long)]
    max_buffer_size: Option<u64>,

    /// Exclusion glob, e.g. -e "node_modules*" -e "*.lock"
    #[arg(short = 'e', long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Text written before each file name in a shard [default: "// filename: "]
    #[arg(short = 'd', long)]
    delimiter: Option<String>,

    /// Log progress and skipped files
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct UnconvertArgs {
    /// Directory holding the shards
    shards: PathBuf,

    /// Existing directory receiving the restored tree
    dest: PathBuf,

    /// Bounds shard line length when no buffer size is given [default: 5242880]
    #[arg(short = 'i', long)]
    max_input_file_size: Option<u64>,

    /// Longest line in bytes the scanner accepts (0 = max input file size)
    #[arg(short = 'b', long)]
    max_buffer_size: Option<u64>,

    /// Text that opens each file in a shard [default: "// filename: "]
    #[arg(short = 'd', long)]
    delimiter: Option<String>,

    /// Log progress
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Convert(args) => args.verbose,
        Commands::Unconvert(args) => args.verbose,
        Commands::Version => false,
    };
    init_logging(
        &LogConfig::from_flags(cli.global.log_format, verbose, cli.global.quiet)
            .with_timestamps(cli.global.log_timestamps),
    );

    let result = match &cli.command {
        Commands::Convert(args) => run_convert(&cli.global, args),
        Commands::Unconvert(args) => run_unconvert(&cli.global, args),
        Commands::Version => run_version(&cli.global),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::Failure
        }
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_convert(global: &GlobalOpts, args: &ConvertArgs) -> Result<(), BalerError> {
    let run = RunInfo::start(generate_run_id());
    let span = tracing::info_span!("run", run_id = %run.run_id, command = "convert");
    let _guard = span.enter();

    let loaded = settings(global.config.as_deref())?;
    let overrides = ConvertOverrides {
        max_input_file_size: args.max_input_file_size,
        max_input_file_lines: args.max_input_file_lines,
        max_output_file_size: args.max_output_file_size,
        max_buffer_size: args.max_buffer_size,
        exclude: args.exclude.clone(),
        delimiter: args.delimiter.clone(),
        verbose: args.verbose,
    };
    let config = convert_config(&loaded.settings.convert, &overrides)?;
    tracing::debug!(
        source = %args.source.display(),
        dest = %args.dest.display(),
        max_input_size = config.max_input_size,
        max_output_size = config.max_output_size,
        exclusions = config.exclusion_patterns.len(),
        "starting convert"
    );

    let report = convert_report(&args.source, &args.dest, &config, &TracingLogger)?;
    tracing::info!(
        processed = report.processed.len(),
        shards = report.shards.len(),
        skipped = report.skipped.total(),
        "convert finished"
    );

    emit(ConvertSummary::new(&run, report).render(global.format))
}

fn run_unconvert(global: &GlobalOpts, args: &UnconvertArgs) -> Result<(), BalerError> {
    let run = RunInfo::start(generate_run_id());
    let span = tracing::info_span!("run", run_id = %run.run_id, command = "unconvert");
    let _guard = span.enter();

    let loaded = settings(global.config.as_deref())?;
    let overrides = UnconvertOverrides {
        max_input_file_size: args.max_input_file_size,
        max_buffer_size: args.max_buffer_size,
        delimiter: args.delimiter.clone(),
        verbose: args.verbose,
    };
    let config = unconvert_config(&loaded.settings.unconvert, &overrides)?;
    tracing::debug!(
        shards = %args.shards.display(),
        dest = %args.dest.display(),
        buffer = config.effective_buffer_size(),
        "starting unconvert"
    );

    let report = unconvert_report(&args.shards, &args.dest, &config, &TracingLogger)?;
    tracing::info!(
        shards = report.shards_read.len(),
        files = report.files_written.len(),
        "unconvert finished"
    );

    emit(UnconvertSummary::new(&run, report).render(global.format))
}

fn run_version(global: &GlobalOpts) -> Result<(), BalerError> {
    emit(render_version(global.format))
}

fn settings(cli_path: Option<&Path>) -> Result<LoadedSettings, BalerError> {
    let loaded = load_settings(cli_path)?;
    match &loaded.path {
        Some(path) => tracing::debug!(path = %path.display(), source = %loaded.source, "loaded settings"),
        None => tracing::debug!(source = %loaded.source, "no settings file"),
    }
    Ok(loaded)
}

fn emit(payload: serde_json::Result<String>) -> Result<(), BalerError> {
    let text = payload.map_err(|e| BalerError::internal(format!("failed to render output: {e}")))?;
    println!("{text}");
    Ok(())
}
