use std::borrow::Borrow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rs_lines2arrow_ipc::{
    BatchAccumulator, BuilderConfig, Error, IngestOptions, LineMatcher, Pattern,
    batches2ipc_file, derive_schema, describe_schema, lines2batch_iter, reader2byte_lines,
    reader2lines,
};

/// Converts structured text lines to an arrow ipc file.
///
/// Each named capture group of the pattern becomes a Utf8 column; lines
/// which do not match are skipped.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Regex with named capture groups, e.g. '^(?P<ts>[^ ]+) (?P<level>\w+) (?P<msg>.+)'
    #[arg(long)]
    pattern: String,

    /// Input file; reads stdin when absent.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output arrow ipc file.
    #[arg(long, required_unless_present = "schema")]
    output: Option<PathBuf>,

    /// Rows per record batch; 0 writes a single batch.
    #[arg(long, default_value_t = 10000)]
    flush_interval: usize,

    /// Print the derived schema and exit.
    #[arg(long)]
    schema: bool,

    /// Log skipped lines and print a summary.
    #[arg(long)]
    verbose: bool,

    /// Log per-batch timings.
    #[arg(long)]
    bench_report: bool,

    /// Stop after this many rows; 0 means no limit.
    #[arg(long, default_value_t = 0)]
    max_rows: u64,

    /// Match raw bytes instead of UTF-8 lines.
    #[arg(long)]
    bytes: bool,
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.bench_report {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, io::Error> {
    match path {
        Some(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn convert<P, F, I, L>(cli: &Cli, pattern: P, rdr2lines: F) -> Result<(), Error>
where
    P: Pattern,
    F: FnOnce(Box<dyn BufRead>) -> I,
    I: Iterator<Item = Result<L, io::Error>>,
    L: Borrow<P::Haystack>,
{
    let schema = derive_schema(&pattern)?;
    if cli.schema {
        return describe_schema(&schema, io::stdout().lock()).map_err(Error::from);
    }

    let Some(output) = cli.output.as_deref() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "--output is required").into());
    };

    let matcher = LineMatcher::new(pattern)?;
    let bldr = BatchAccumulator::new(
        Arc::clone(&schema),
        cli.flush_interval,
        BuilderConfig::for_batch_size(cli.flush_interval),
    );

    let lines = rdr2lines(open_input(cli.input.as_deref())?);
    let opts = IngestOptions {
        row_limit: cli.max_rows,
    };
    let mut batches = lines2batch_iter(lines, matcher, bldr, opts);

    let mut out = BufWriter::new(File::create(output)?);
    let rows = batches2ipc_file(&mut out, &schema, &mut batches, cli.bench_report)?;
    out.flush()?;

    let stats = batches.stats();
    tracing::info!(
        lines = stats.lines,
        rows,
        skipped = stats.skipped,
        batches = stats.batches,
        output = %output.display(),
        "done"
    );
    if cli.verbose {
        println!(
            "processed {} lines, wrote {} rows to {}",
            stats.lines,
            rows,
            output.display()
        );
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Error> {
    if cli.bytes {
        let re = regex::bytes::Regex::new(&cli.pattern)?;
        convert(cli, re, |rdr| reader2byte_lines(rdr))
    } else {
        let re = regex::Regex::new(&cli.pattern)?;
        convert(cli, re, |rdr| reader2lines(rdr))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
