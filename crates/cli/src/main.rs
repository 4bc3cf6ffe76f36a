use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use gleaner_core::{
    DEFAULT_DIGEST_BUDGET, Extractor, FetchConfig, Fetcher, GleanerError, JsonConfig, JsonFormatter,
    RetryPolicy, TextConfig, fetch_file, fetch_stdin, flatten, record_to_text, text_digest, to_csv,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the extracted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
    Flat,
    Csv,
    Digest,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "flat" => Ok(Self::Flat),
            "csv" => Ok(Self::Csv),
            "digest" => Ok(Self::Digest),
            _ => Err(format!("Invalid format: {}. Valid options: json, text, flat, csv, digest", s)),
        }
    }
}

/// Fetch a web page and extract its structured content
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(author = "Gleaner Contributors")]
#[command(version = VERSION)]
#[command(about = "Fetch a web page and extract its structured content", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (json, text, flat, csv, digest)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,

    /// Total HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    connect_timeout: u64,

    /// Total attempts per fetch, the first included
    #[arg(long, default_value = "3", value_name = "NUM")]
    retries: u32,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10", value_name = "NUM")]
    max_connections: usize,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Skip TLS certificate validation (debugging only)
    #[arg(long)]
    insecure: bool,

    /// Character budget of the digest format
    #[arg(long, default_value_t = DEFAULT_DIGEST_BUDGET, value_name = "CHARS")]
    digest_budget: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_url(&self) -> bool {
        self.input.contains("://")
    }

    fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            timeout: Duration::from_secs(self.timeout),
            max_connections: self.max_connections,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            accept_invalid_certs: self.insecure,
            retry: RetryPolicy::with_max_retries(self.retries),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,gleaner_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read the input markup; returns it with the number of requests made (URLs only).
async fn read_input(args: &Args) -> anyhow::Result<(String, Option<u32>)> {
    if args.input == "-" {
        if args.verbose {
            echo::print_step(1, 3, "Reading from stdin");
        }
        let html = fetch_stdin().context("Failed to read from stdin")?;
        return Ok((html, None));
    }

    if args.is_url() {
        if args.verbose {
            echo::print_step(1, 3, &format!("Fetching from {}", args.input.bright_white().underline()));
        }
        if args.insecure {
            echo::print_warning("TLS certificate validation is disabled");
        }

        let fetcher = Fetcher::new(args.fetch_config());
        let result = fetcher.fetch(&args.input).await;
        fetcher.shutdown().await;

        let page = result.map_err(GleanerError::from)?;
        if args.verbose {
            echo::print_detail("Status", &page.status.to_string());
            echo::print_detail("Attempts", &page.attempts.to_string());
        }
        return Ok((page.body, Some(page.attempts)));
    }

    if args.verbose {
        echo::print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
    }
    let html = fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
    Ok((html, None))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!(input = %args.input, format = ?args.format, "starting");

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let started = Instant::now();
    let (html, attempts) = read_input(&args).await?;
    let read_time = started.elapsed();

    if args.verbose {
        echo::print_detail("Size", &echo::format_size(html.len()));
        eprintln!();
        echo::print_step(2, 3, "Extracting content");
    }

    let extract_started = Instant::now();
    let record = Extractor::new().extract(&html);
    let extract_time = extract_started.elapsed();

    if args.verbose {
        echo::print_record_summary(&record);
    }

    if record.is_empty() {
        tracing::warn!(input = %args.input, bytes = html.len(), "page yielded no usable content");
        return Err(GleanerError::NoUsableContent.into());
    }

    if args.verbose {
        echo::print_step(3, 3, "Writing output");
        echo::print_detail("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    let render_started = Instant::now();
    let output = match args.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(JsonConfig { pretty: !args.compact });
            formatter.convert(&record).context("Failed to render JSON")?
        }
        OutputFormat::Text => record_to_text(&record, &TextConfig::default()),
        OutputFormat::Flat => {
            let row = flatten(&record).context("Failed to flatten record")?;
            if args.compact { serde_json::to_string(&row)? } else { serde_json::to_string_pretty(&row)? }
        }
        OutputFormat::Csv => to_csv(std::slice::from_ref(&record)).context("Failed to render CSV")?,
        OutputFormat::Digest => text_digest(&record, args.digest_budget),
    };
    let render_time = render_started.elapsed();

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else {
                println!("{}", output);
            }
        }
    }

    if args.verbose {
        let read_label = if attempts.is_some() { "Fetch" } else { "Read" };
        echo::print_timing_summary(
            started.elapsed(),
            &[(read_label, read_time), ("Extract", extract_time), ("Render", render_time)],
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_fetch_config_from_args() {
        let args = Args::parse_from(["gleaner", "--retries", "5", "--timeout", "7", "https://example.com"]);
        let config = args.fetch_config();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(!config.accept_invalid_certs);
        assert!(args.is_url());
    }
}
