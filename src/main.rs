//! tsv-coldef CLI - generate computed column definitions from a TSV file

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tsv_coldef::{
    Analyzer, ColdefError, DEFAULT_SAMPLE_SIZE, ErrorReport, NoProgress, WriteProgress,
};

/// Generate F001_... computed lines from a tab-delimited file.
///
/// Records must be separated by CRLF. Every field is checked for unbalanced
/// quotes and stray line breaks; if any are found a report is written
/// instead of the definitions.
#[derive(Parser, Debug)]
#[command(name = "tsv-coldef")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input TSV file
    file: PathBuf,

    /// Write results (or the error report) to this file instead of stdout/stderr
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print "PROGRESS <current>/<total>" lines to stdout while generating
    #[arg(long)]
    progress: bool,

    /// Number of bytes sampled for encoding detection
    #[arg(short = 'b', long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_bytes: usize,

    /// Force the input encoding (WHATWG label, e.g. utf-8, latin1, gbk)
    #[arg(short = 'e', long)]
    encoding: Option<String>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let Err(e) = run(&args) else {
        return ExitCode::SUCCESS;
    };

    if let ColdefError::StructuralViolation(errors) = &e {
        match ErrorReport::new(errors).write(args.output.as_deref()) {
            Ok(()) => {
                if let Some(path) = &args.output {
                    eprintln!("Wrote error report to '{}'", path.display());
                }
            }
            Err(report_err) => eprintln!("Failed to write error report: {report_err}"),
        }
    } else {
        eprintln!("Error processing {}: {}", args.file.display(), e);
    }

    ExitCode::from(e.exit_code())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> tsv_coldef::Result<()> {
    let mut analyzer = Analyzer::new();
    analyzer.sample_size(args.sample_bytes);
    if let Some(label) = &args.encoding {
        analyzer.encoding(label)?;
    }

    let analysis = if args.progress {
        analyzer.analyze_path(&args.file, &mut WriteProgress::new(io::stdout()))?
    } else {
        analyzer.analyze_path(&args.file, &mut NoProgress)?
    };

    let mut stdout = io::stdout().lock();
    match &args.output {
        Some(path) => {
            analysis.write_to(path)?;
            writeln!(stdout, "Wrote {} lines to '{}'", analysis.lines.len(), path.display())
                .map_err(ColdefError::StdoutWrite)?;
        }
        None => writeln!(stdout, "{}", analysis.render()).map_err(ColdefError::StdoutWrite)?,
    }

    Ok(())
}
