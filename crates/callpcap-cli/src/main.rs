use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use callpcap_core::{CallCapture, encode, inspect_file};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CALLPCAP_LOG";

#[derive(Parser, Debug)]
#[command(name = "callpcap")]
#[command(version)]
#[command(
    about = "Rebuild classic PCAP captures from call trace records (SIP / RTP).",
    long_about = None,
    after_help = "Examples:\n  callpcap encode call.json -o call.pcap\n  callpcap encode call.json --stdout > call.pcap\n  callpcap inspect call.pcap --pretty"
)]
struct Cli {
    /// Log debug diagnostics to stderr (overridden by CALLPCAP_LOG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a call capture JSON document into a .pcap file.
    Encode {
        /// Path to the call capture (.json); a glob must match exactly one file
        input: PathBuf,

        /// Output capture path (defaults to <callId>.pcap)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Write the capture to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Summarize a classic .pcap file as JSON.
    Inspect {
        /// Path to a .pcap file
        input: PathBuf,

        /// Output report path (JSON); stdout when omitted
        #[arg(short = 'o', long)]
        report: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            stdout,
        } => cmd_encode(input, output, stdout, cli.quiet),
        Commands::Inspect {
            input,
            report,
            pretty,
        } => cmd_inspect(input, report, pretty, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_encode(
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let input = resolve_input_path(&input)?;
    validate_input_file(&input, &["json"], "use a call capture .json file")?;

    let raw = fs::read(&input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let capture = CallCapture::from_json_slice(&raw).map_err(|err| {
        CliError::new(
            format!("capture generation failed: {}", err),
            Some("check that the document has a `messages` list".to_string()),
        )
    })?;
    debug!(
        call_id = %capture.call_id,
        messages = capture.messages.len(),
        "loaded call capture"
    );

    let pcap = encode(&capture);

    if stdout {
        let mut out = std::io::stdout().lock();
        out.write_all(pcap.as_bytes())
            .and_then(|()| out.flush())
            .context("Failed to write capture to stdout")?;
        return Ok(());
    }

    let output = output.unwrap_or_else(|| PathBuf::from(capture.file_name()));
    ensure_distinct(&input, &output)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, pcap.as_bytes())
        .with_context(|| format!("Failed to write capture: {}", output.display()))?;

    if !quiet {
        eprintln!(
            "OK: {} packets written -> {}",
            pcap.packet_count(),
            output.display()
        );
    }
    Ok(())
}

fn cmd_inspect(
    input: PathBuf,
    report: Option<PathBuf>,
    pretty: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let input = resolve_input_path(&input)?;
    validate_input_file(&input, &["pcap"], "use a classic .pcap file")?;

    let summary = inspect_file(&input).map_err(|err| {
        CliError::new(
            format!("PCAP inspection failed: {}", err),
            Some("only classic (non-pcapng) captures are supported".to_string()),
        )
    })?;
    let json = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
    .context("JSON serialization failed")?;

    match report {
        None => {
            println!("{}", json);
        }
        Some(report) => {
            ensure_distinct(&input, &report)?;
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }
    Ok(())
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Ok(output_dir) = fs::canonicalize(&output_dir) else {
        // Directory does not exist yet, so it cannot contain the input.
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| CliError::new("invalid output path", None))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path, extensions: &[&str], hint: &str) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some(hint.to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some(hint.to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !extensions.contains(&ext.as_str()) {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some(hint.to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
