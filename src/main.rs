use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use port_sweep_rs::range::parse_port_str;
use port_sweep_rs::{PortRange, Report, ScanConfig, ScanError, Scanner};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// port-sweep-rs — worker-pool TCP connect port scanner for a single host.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "port-sweep-rs",
    version,
    about = "Worker-pool TCP connect port scanner for a single host.",
    long_about = None
)]
struct Cli {
    /// Target hostname or IP address. Prompted for when omitted.
    target: Option<String>,

    /// Port range as `START-END` or a single port.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    ports: Option<PortRange>,

    /// First port of the range. Prompted for when omitted.
    #[arg(long)]
    start: Option<u32>,

    /// Last port of the range. Prompted for when omitted.
    #[arg(long)]
    end: Option<u32>,

    /// JSON config file with engine defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of concurrent workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Idle worker poll interval in milliseconds.
    #[arg(long = "poll-ms")]
    poll_ms: Option<u64>,

    /// Write the report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match cli.config.as_deref() {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(w) = cli.workers {
        config.workers = w;
    }
    if let Some(t) = cli.timeout_ms {
        config.connect_timeout_ms = t;
    }
    if let Some(p) = cli.poll_ms {
        config.poll_interval_ms = p;
    }

    println!("{}", "-".repeat(50));
    println!("Simple Port Scanner (worker pool)");
    println!("{}", "-".repeat(50));

    let host = match cli.target.clone() {
        Some(t) => t,
        None => prompt("Enter the target host to scan (e.g., example.com): ")?,
    };
    let (start, end) = match cli.ports {
        Some(r) => (u32::from(r.start()), u32::from(r.end())),
        None => {
            let start = match cli.start {
                Some(s) => s,
                None => prompt_port("Enter the starting port: ")?,
            };
            let end = match cli.end {
                Some(e) => e,
                None => prompt_port("Enter the ending port: ")?,
            };
            (start, end)
        }
    };

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    let scanner = Scanner::new(config);
    let result = scanner.run_with_cancel(&host, start, end, cancel).await;
    let code = exit_status(&result);
    match &result {
        Ok(report) => {
            print!("{}", render_summary(report));
            if let Some(path) = cli.output.as_deref() {
                match write_report_json(path, report) {
                    Ok(()) => println!("Wrote JSON report to {}", path.display()),
                    Err(e) => eprintln!("Failed to write JSON to {}: {e:#}", path.display()),
                }
            }
        }
        Err(e) => eprintln!("{e}"),
    }

    Ok(ExitCode::from(code))
}

/// 0 clean, 2 resolution or range error, 3 incomplete scan.
fn exit_status(result: &Result<Report, ScanError>) -> u8 {
    match result {
        Ok(report) if report.completed => 0,
        Ok(_) => 3,
        Err(ScanError::Resolution { .. } | ScanError::InvalidRange { .. }) => 2,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("port_sweep_rs={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    let n = io::stdin().lock().read_line(&mut line)?;
    if n == 0 {
        bail!("no input provided");
    }
    Ok(line.trim().to_string())
}

fn prompt_port(question: &str) -> Result<u32> {
    let answer = prompt(question)?;
    parse_port_str(&answer)
        .with_context(|| format!("invalid port number: {answer:?}; please enter a valid integer"))
}

fn render_summary(report: &Report) -> String {
    let mut out = format!(
        "Scanning target: {} ({})\n{}\n",
        report.target.hostname,
        report.target.ip,
        "-".repeat(50)
    );
    if report.completed {
        out.push_str("Scan completed.\n");
    } else {
        out.push_str(&format!(
            "Scan incomplete: {} ({} of {} ports scanned)\n",
            report.fault.as_deref().unwrap_or("stopped early"),
            report.ports_scanned,
            report.range.len()
        ));
    }
    out.push_str(&format!("Scan duration: {}\n", format_duration(report.duration)));

    if report.open_count() == 0 {
        out.push_str("\nNo open ports found in the specified range.\n");
    } else {
        let label = if report.completed { "" } else { " (partial)" };
        out.push_str(&format!("\nSummary of open ports{label}:\n"));
        for port in &report.open_ports {
            out.push_str(&format!("- {port}\n"));
        }
    }
    out
}

/// `H:MM:SS.micros`, the form the original tool printed.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        d.subsec_micros()
    )
}

fn write_report_json(path: &Path, report: &Report) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
