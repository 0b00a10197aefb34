use anyhow::{Context, Result};
use bsdaudit::{
    checker::default_fetcher,
    config::{Config, ServerConfig},
    model::ScanReport,
    output::{format_report_to_string, print_report, OutputFormat},
    scanner::{run_scanners, scanners_for},
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VULNERABLE: u8 = 2;
}

#[derive(Parser)]
#[command(name = "bsdaudit")]
#[command(
    author,
    version,
    about = "Scan FreeBSD hosts for vulnerable packages using pkg audit"
)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan configured servers
    Scan {
        /// Only scan these servers (by name); may be repeated
        #[arg(short, long)]
        server: Vec<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scan servers one at a time
        #[arg(long)]
        no_parallel: bool,

        /// Exit with status 2 if any vulnerability is found
        #[arg(long)]
        fail_on_vulns: bool,
    },

    /// List configured servers
    ListServers,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Scan {
            server,
            format,
            output,
            no_parallel,
            fail_on_vulns,
        } => {
            let config = Config::load_from(&config_path)?;
            let format = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
            let servers = select_servers(&config, &server)?;

            let report = run_scan(&config, &servers, format, !no_parallel).await?;

            if let Some(path) = output {
                let content = format_report_to_string(&report, format)?;
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Results written to: {}", path.display());
            } else {
                print_report(&report, format)?;
            }

            Ok(determine_exit_code(&report, fail_on_vulns))
        }
        Commands::ListServers => {
            let config = Config::load_from(&config_path)?;
            list_servers(&config);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(&config_path, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn select_servers(config: &Config, names: &[String]) -> Result<Vec<ServerConfig>> {
    if config.servers.is_empty() {
        anyhow::bail!(
            "No servers configured. Add [[servers]] entries to the config file (see 'bsdaudit config --path')"
        );
    }
    if names.is_empty() {
        return Ok(config.servers.clone());
    }

    names
        .iter()
        .map(|name| {
            config
                .find_server(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown server: {}", name))
        })
        .collect()
}

async fn run_scan(
    config: &Config,
    servers: &[ServerConfig],
    format: OutputFormat,
    parallel: bool,
) -> Result<ScanReport> {
    let fetcher = default_fetcher(&config.cve_api)?;
    let scanners = scanners_for(config, servers);

    let progress = if format == OutputFormat::Table {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("invalid progress template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {} server(s)...", scanners.len()));
        Some(pb)
    } else {
        None
    };

    let report = run_scanners(&scanners, &fetcher, parallel).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(report)
}

/// Failed hosts win over findings: a partial picture is an error.
fn determine_exit_code(report: &ScanReport, fail_on_vulns: bool) -> u8 {
    if !report.failures.is_empty() {
        exit_codes::ERROR
    } else if fail_on_vulns && report.has_vulnerabilities() {
        exit_codes::VULNERABLE
    } else {
        exit_codes::SUCCESS
    }
}

fn list_servers(config: &Config) {
    if config.servers.is_empty() {
        println!("No servers configured.");
        return;
    }

    println!("Configured servers:");
    println!();
    for server in &config.servers {
        let transport = if server.is_local() { "local" } else { "ssh" };
        println!(
            "  {:<16} {}:{} [{}]",
            server.name,
            server.destination(),
            server.port,
            transport
        );
    }
}

fn handle_config(config_path: &Path, init: bool, show_path: bool) -> Result<()> {
    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save_to(config_path)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'bsdaudit config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
