//! Device Inspector - what the current environment looks like
//!
//! Six independent detectors report on the browser (from a user-agent
//! string), operating system, CPU, preferred languages, location and time
//! zone. They run inside a fullscreen dashboard by default, or once from the
//! command line with `detect`.

mod config;
mod detect;
mod platform;
mod report;
mod tui;

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;

use crate::config::Config;
use crate::detect::browser::{detect_browser, detect_engine, is_mobile, UNKNOWN_BROWSER};
use crate::detect::os::{os_from_user_agent, UNKNOWN_OS};
use crate::detect::{DetectionResult, DetectorSet};
use crate::platform::Platform;

/// How long `detect` waits for deferred reads before printing.
const DETECT_TIMEOUT: Duration = Duration::from_secs(2);
const DETECT_POLL: Duration = Duration::from_millis(20);

/// Device Inspector - browser, OS, CPU, language, location and time zone
#[derive(Parser, Debug)]
#[command(name = "device-inspector")]
#[command(version)]
#[command(about = "Inspect the environment this program runs in")]
struct Cli {
    /// Enable debug logging for this crate (RUST_LOG still wins)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// User-agent string to analyze (overrides the environment and config)
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Open the live dashboard (default)
    Tui,

    /// Run every detector once and print the results
    Detect {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Identify the browser and OS in a user-agent string
    ParseUa {
        /// The user-agent string
        user_agent: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the configuration file location and effective values
    Config {
        /// Write the effective settings to the config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
    let dashboard = matches!(cli.command, None | Some(Commands::Tui)) && interactive;
    init_tracing(cli.verbose, dashboard);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Tui) => {
            let rt = tokio::runtime::Runtime::new()?;
            let platform = platform::native::platform(&config, cli.user_agent, rt.handle().clone());

            // Redirected stdin/stdout (CI logs, pipes) gets the one-shot report.
            if !dashboard {
                if matches!(cli.command, Some(Commands::Tui)) {
                    println!(
                        "{}",
                        "The dashboard requires an interactive terminal. Showing a one-shot report instead."
                            .bright_yellow()
                    );
                }
                report::print_reports(&collect_reports(&platform, &config, DETECT_TIMEOUT));
                return Ok(());
            }

            if let Err(err) = tui::run_tui(&platform, &config) {
                println!(
                    "{} {}",
                    "Could not start the dashboard:".bright_red(),
                    err.to_string().bright_red()
                );
                println!("{}", "Falling back to a one-shot report...".bright_yellow());
                report::print_reports(&collect_reports(&platform, &config, DETECT_TIMEOUT));
            }
        }
        Some(Commands::Detect { json }) => {
            let rt = tokio::runtime::Runtime::new()?;
            let platform = platform::native::platform(&config, cli.user_agent, rt.handle().clone());
            let reports = collect_reports(&platform, &config, DETECT_TIMEOUT);
            if json {
                let out = serde_json::to_string_pretty(&reports)
                    .context("Failed to serialize detection results")?;
                println!("{out}");
            } else {
                report::print_reports(&reports);
            }
        }
        Some(Commands::ParseUa { user_agent, json }) => {
            let parsed = ParsedUserAgent::parse(&user_agent);
            if json {
                let out = serde_json::to_string_pretty(&parsed)
                    .context("Failed to serialize user-agent analysis")?;
                println!("{out}");
            } else {
                parsed.print();
            }
        }
        Some(Commands::Config { init }) => {
            if init {
                let path = match cli.config.as_deref() {
                    Some(path) => path.to_path_buf(),
                    None => Config::config_path()?,
                };
                if write_config_if_missing(&path, &config)? {
                    println!(
                        "{} {}\n",
                        "Wrote".bright_green(),
                        path.display().to_string().bright_white()
                    );
                } else {
                    println!(
                        "{} {}\n",
                        "Left the existing file alone:".bright_yellow(),
                        path.display().to_string().bright_white()
                    );
                }
            }
            show_config_info(cli.config.as_deref(), &config)?;
        }
    }

    Ok(())
}

/// Logs go to stderr, except under the dashboard where they would corrupt
/// the screen and go to a file instead.
fn init_tracing(verbose: u8, to_file: bool) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    if verbose > 0 {
        if let Ok(parsed) = "device_inspector=debug".parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    if to_file {
        match open_log_file() {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .init();
                return;
            }
            Err(err) => {
                eprintln!("{} {err:#}", "Logging disabled:".bright_yellow());
                return;
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn open_log_file() -> Result<fs::File> {
    let path = config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Mounts every detector, polls until nothing is pending or `timeout`
/// passes, and returns the reports. Detectors are unmounted before return.
fn collect_reports(platform: &Platform, config: &Config, timeout: Duration) -> Vec<DetectionResult> {
    let mut set = DetectorSet::new(platform, config);
    set.mount_all();

    let deadline = Instant::now() + timeout;
    loop {
        set.poll_all();
        if !set.any_pending() {
            break;
        }
        if Instant::now() >= deadline {
            tracing::debug!("detect timed out with detectors still pending");
            break;
        }
        std::thread::sleep(DETECT_POLL);
    }

    let reports = set.reports();
    set.unmount_all();
    reports
}

#[derive(Debug, Serialize)]
struct ParsedUserAgent {
    browser: String,
    browser_version: Option<String>,
    engine: Option<String>,
    os: String,
    os_version: Option<String>,
    mobile: bool,
}

impl ParsedUserAgent {
    fn parse(user_agent: &str) -> Self {
        let browser = detect_browser(user_agent);
        let os = os_from_user_agent(user_agent);
        Self {
            browser: browser
                .as_ref()
                .map_or(UNKNOWN_BROWSER, |m| m.name)
                .to_string(),
            browser_version: browser.and_then(|m| m.version),
            engine: detect_engine(user_agent).map(|m| m.display()),
            os: os.as_ref().map_or(UNKNOWN_OS, |m| m.name).to_string(),
            os_version: os.and_then(|m| m.version),
            mobile: is_mobile(user_agent),
        }
    }

    fn print(&self) {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        println!("{}\n", "User-agent analysis".bright_cyan().bold());
        println!("  {} {}", "Browser:".bright_cyan(), self.browser.bright_white());
        println!("  {} {}", "Version:".bright_cyan(), or_dash(&self.browser_version));
        println!("  {} {}", "Engine:".bright_cyan(), or_dash(&self.engine));
        println!("  {} {}", "OS:".bright_cyan(), self.os.bright_white());
        println!("  {} {}", "OS version:".bright_cyan(), or_dash(&self.os_version));
        println!(
            "  {} {}",
            "Device:".bright_cyan(),
            if self.mobile { "Mobile" } else { "Desktop" }
        );
    }
}

/// Returns false when `path` already exists.
fn write_config_if_missing(path: &Path, config: &Config) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config.save_to(path)?;
    tracing::info!(path = %path.display(), "config file created");
    Ok(true)
}

fn show_config_info(explicit: Option<&Path>, config: &Config) -> Result<()> {
    println!("{}", "Device Inspector Configuration\n".bright_cyan().bold());

    let path = match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_path(),
    };
    match path {
        Ok(path) => {
            println!(
                "{} {}",
                "Config file:".bright_yellow(),
                path.display().to_string().bright_white()
            );
            if path.exists() {
                println!("  {} {}", "Status:".bright_cyan(), "Exists".bright_green());
            } else {
                println!(
                    "  {} {}",
                    "Status:".bright_cyan(),
                    "Not created yet (using defaults)".bright_yellow()
                );
            }
        }
        Err(e) => {
            println!(
                "{} Could not determine config path: {}",
                "Error:".bright_red(),
                e
            );
        }
    }

    if let Ok(log) = config::log_path() {
        println!(
            "{} {}",
            "Dashboard log:".bright_yellow(),
            log.display().to_string().bright_white()
        );
    }

    let toml = toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
    println!("\n{}", "Effective settings:".bright_white().bold());
    for line in toml.lines() {
        println!("  {line}");
    }

    Ok(())
}
