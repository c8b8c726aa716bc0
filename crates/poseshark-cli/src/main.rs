use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use poseshark_core::{
    AllowList, AnalysisConfig, DEFAULT_MAX_REASSEMBLY_BYTES, DecoderConfig, FramingMode,
    ISSUE_CATALOG, Report,
};
use tracing::debug;

mod logging;

use logging::{LogFormat, LogLevel, init_logging};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("POSESHARK_BUILD_COMMIT"),
    " ",
    env!("POSESHARK_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  poseshark pcap analyse capture.pcapng -o report.json\n  poseshark pcap analyze capture.pcap --stdout --pretty --messages\n  poseshark pcap analyse capture.pcapng -o report.json --port 60015 --framing declared-size";

#[derive(Parser, Debug)]
#[command(name = "poseshark")]
#[command(version = VERSION)]
#[command(
    about = "Offline analyzer for robot position-report captures.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log verbosity on stderr
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// List every issue id the analyzer can report.
    Issues,
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Analyse a capture file and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = EXAMPLES)]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Path to a .pcap or .pcapng file (a glob matching exactly one file is accepted)
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if the report contains issues
    #[arg(long)]
    strict: bool,

    /// List report issues on stderr after analysis
    #[arg(long)]
    list_issues: bool,

    /// Include one record per decoded message in the report
    #[arg(long)]
    messages: bool,

    /// UDP port carrying position reports (repeatable; default: every UDP datagram)
    #[arg(long = "port", value_name = "PORT")]
    ports: Vec<u16>,

    /// Only decode datagrams from this source IP or MAC address (repeatable)
    #[arg(long = "allow-source", value_name = "ADDR")]
    allow_sources: Vec<String>,

    /// Number of joint values printed per joint section
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=9))]
    axes: u8,

    /// How message boundaries are derived
    #[arg(long, value_enum, default_value = "remainder")]
    framing: FramingArg,

    /// Cap on buffered partial-message bytes per flow
    #[arg(long, default_value_t = DEFAULT_MAX_REASSEMBLY_BYTES)]
    max_reassembly_bytes: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FramingArg {
    /// The rest of each datagram is one message; the size field is ignored
    Remainder,
    /// Bound each message by its header size field
    DeclaredSize,
}

impl From<FramingArg> for FramingMode {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Remainder => FramingMode::Remainder,
            FramingArg::DeclaredSize => FramingMode::DeclaredSize,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = matches!(
        &cli.command,
        Commands::Pcap {
            command: PcapCommands::Analyse(args)
        } if args.quiet
    );
    let level = if quiet { LogLevel::Error } else { cli.log_level };
    init_logging(cli.log_format, level);

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Analyse(args) => cmd_pcap_analyse(args),
        },
        Commands::Issues => {
            print_catalog();
            Ok(())
        }
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
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = match (args.stdout, args.report.as_ref()) {
        (true, _) => None,
        (false, Some(path)) => Some(path.clone()),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };
    if let Some(path) = report_path.as_ref() {
        ensure_distinct_output(path, &input_abs)?;
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", args.input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }

    let config = build_config(&args)?;
    debug!(?config, "analysis configuration");
    let rep = poseshark_core::analyze_pcap_file(&resolved_input, &config)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => println!("{}", json),
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
    }

    if args.list_issues && !args.quiet {
        print_issues(&rep);
    }
    if args.strict && !rep.issues.is_empty() {
        return Err(CliError::new(
            format!("{} issue kind(s) detected", rep.issues.len()),
            Some("use --list-issues to inspect".to_string()),
        ));
    }
    Ok(())
}

fn build_config(args: &AnalyseArgs) -> Result<AnalysisConfig, CliError> {
    let mut decoder = DecoderConfig::default()
        .with_axis_display_count(usize::from(args.axes))
        .with_framing(args.framing.into());

    if !args.allow_sources.is_empty() {
        let mut allow = AllowList::new();
        for entry in &args.allow_sources {
            allow.allow_str(entry).map_err(|err| {
                CliError::new(
                    err.to_string(),
                    Some("use an IP address or a MAC such as 00:e0:e4:01:02:03".to_string()),
                )
            })?;
        }
        decoder = decoder.with_source_filter(allow);
    }

    Ok(AnalysisConfig::default()
        .with_decoder(decoder)
        .with_ports(args.ports.iter().copied())
        .with_messages(args.messages)
        .with_max_reassembly_bytes(args.max_reassembly_bytes))
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    };
    // A directory that does not exist yet cannot contain the input.
    let Ok(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_issues(rep: &Report) {
    if rep.issues.is_empty() {
        eprintln!("Issues: none");
        return;
    }
    eprintln!("Issues:");
    for issue in &rep.issues {
        eprintln!(
            "  {} {} ({}): {}",
            issue.severity, issue.id, issue.count, issue.message
        );
        for example in &issue.examples {
            eprintln!("    {}", example);
        }
    }
}

fn print_catalog() {
    for issue in ISSUE_CATALOG {
        println!("{:<24} {:<8} {}", issue.id, issue.severity, issue.message);
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
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

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
