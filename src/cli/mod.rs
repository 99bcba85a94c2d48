//! CLI command implementations for oven.
//!
//! Provides subcommand handlers for:
//! - `oven bake` / `oven check <id>`: bake or adopt a cluster and watch it
//! - `oven pull [--table T]...`: run the data pull loop on its own
//! - `oven terminate [<id>]`: shut a cluster down
//! - `oven serve`: the web control panel
//! - `oven health`: backend reachability, config and log files
//! - `oven history`: per-endpoint summary of logged requests
//! - `oven config show|init|set|reset|path`: configuration management

use anyhow::Result;
use colored::Colorize;

use crate::analytics::events;
use crate::analytics::reporter::{self, History};
use crate::cluster::{ClusterHandle, HttpTransport};
use crate::config::{self, OvenConfig};
use crate::run;
use crate::session::clock::SystemClock;
use crate::session::{Dashboard, SessionSettings};
use crate::ui::Control;
use crate::utils::health;
use crate::web;

/// Output format for analytics commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

type CliDashboard = Dashboard<HttpTransport, SystemClock>;

/// A live session against the configured backend.
fn session(config: &OvenConfig, settings: SessionSettings) -> CliDashboard {
    let transport = HttpTransport::from_config(&config.backend, config.logging.enabled);
    Dashboard::new(transport, SystemClock::new(), settings)
}

fn print_banner(title: &str, config: &OvenConfig) {
    println!("{}", title.bold().cyan());
    println!("  {} {}", "Backend:".dimmed(), config.backend.url.dimmed());
}

fn print_now(dashboard: &mut CliDashboard) -> Result<()> {
    let stdout = std::io::stdout();
    run::print_updates(dashboard, &mut stdout.lock())
}

// ---------------------------------------------------------------------------
// oven bake / check
// ---------------------------------------------------------------------------

/// Bake a new cluster and stay in the foreground until the pull loop ends.
pub fn run_bake(config: &OvenConfig) -> Result<()> {
    print_banner("Baking a new cluster", config);

    let mut dashboard = session(config, SessionSettings::from_config(config));
    let baked = dashboard.bake();
    print_now(&mut dashboard)?;

    if let Err(e) = baked {
        anyhow::bail!("bake failed ({})", e.kind());
    }
    run::drive(&mut dashboard)
}

/// Watch a cluster that was started elsewhere.
pub fn run_check(config: &OvenConfig, id: &str) -> Result<()> {
    print_banner(&format!("Checking cluster {id}"), config);

    let mut dashboard = session(config, SessionSettings::from_config(config));
    dashboard.dispatch(Control::AlreadyBakingCheck.bind(Some(id)));
    run::drive(&mut dashboard)
}

// ---------------------------------------------------------------------------
// oven pull
// ---------------------------------------------------------------------------

/// Run the pull loop alone. `tables` (as `table[:region]`) replace the
/// configured bindings when given.
pub fn run_pull(config: &OvenConfig, tables: &[String]) -> Result<()> {
    let mut settings = SessionSettings::from_config(config);
    if !tables.is_empty() {
        settings.tables = tables
            .iter()
            .map(|t| {
                config::parse_table_binding(t)
                    .ok_or_else(|| anyhow::anyhow!("invalid table binding: '{t}'"))
            })
            .collect::<Result<_>>()?;
    }

    print_banner(
        &format!(
            "Pulling {} round(s) every {} ms",
            settings.max_pull_count,
            settings.pull_interval.as_millis()
        ),
        config,
    );

    let mut dashboard = session(config, settings);
    dashboard.dispatch(Control::Pull.bind(None));
    run::drive(&mut dashboard)
}

// ---------------------------------------------------------------------------
// oven terminate
// ---------------------------------------------------------------------------

/// Terminate the given cluster. A fresh session has no active cluster, so
/// without an id this only reports that.
pub fn run_terminate(config: &OvenConfig, id: Option<&str>) -> Result<()> {
    let mut dashboard = session(config, SessionSettings::from_config(config));

    let result = match id {
        Some(id) => dashboard.terminate(ClusterHandle::new(id)).map(|_| ()),
        None => {
            dashboard.terminate_current();
            Ok(())
        }
    };
    print_now(&mut dashboard)?;

    if let Err(e) = result {
        anyhow::bail!("terminate failed ({})", e.kind());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// oven serve
// ---------------------------------------------------------------------------

pub fn run_serve(config: &OvenConfig, open_browser: bool) -> Result<()> {
    web::serve(config, open_browser)
}

// ---------------------------------------------------------------------------
// oven health
// ---------------------------------------------------------------------------

/// Check backend reachability, config files and the request log.
pub fn run_health(config: &OvenConfig) -> Result<()> {
    println!("{}", "oven Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let report = health::check(config);

    print_health_item(
        "Backend",
        report.backend_reachable,
        &match &report.backend_error {
            None => format!("reachable at {}", report.backend_url),
            Some(e) => e.clone(),
        },
    );

    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        report.config_exists,
        if report.config_exists {
            "~/.oven/config.toml found"
        } else {
            "not found (run `oven config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".oven.toml found"
        } else {
            "none (optional)"
        },
    );

    print_health_item(
        "Intervals",
        true,
        &format!(
            "check {} ms, pull {} ms x {}",
            config.polling.check_interval_ms,
            config.polling.pull_interval_ms,
            config.polling.max_pull_count
        ),
    );
    print_health_item(
        "Tables",
        !report.tables.is_empty(),
        &if report.tables.is_empty() {
            "none configured".to_string()
        } else {
            report.tables.join(", ")
        },
    );

    let log_entries = if report.log_exists {
        events::read_all_events().len()
    } else {
        0
    };
    print_health_item(
        "Request log",
        report.log_exists,
        &if !report.logging_enabled {
            "disabled".to_string()
        } else if report.log_exists {
            format!("{} entries", format_number(log_entries))
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// oven history
// ---------------------------------------------------------------------------

/// Summarize the request log per endpoint.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let history = reporter::compute_history(days);

    if history.total_requests == 0 {
        println!(
            "{}",
            "No requests logged yet. Run `oven bake` or `oven serve` first.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_history_json(&history)?,
        OutputFormat::Csv => print_history_csv(&history),
        OutputFormat::Table => print_history_table(&history),
    }

    Ok(())
}

fn print_history_table(history: &History) {
    println!("{}", "oven Request History".bold().cyan());
    println!("{}", "=".repeat(70));
    println!();

    println!(
        "  {} {}",
        "Total requests:".bold(),
        format_number(history.total_requests)
    );
    println!(
        "  {} {}",
        "Failures:      ".bold(),
        format_number(history.total_failures)
    );
    println!();

    println!(
        "  {:<12} {:>8} {:>8} {:>8} {:>9} {:>9}  Last seen",
        "Endpoint", "Requests", "Failed", "Timeout", "Avg ms", "Max ms"
    );
    println!("  {}", "-".repeat(78));

    for (i, stat) in history.endpoints.iter().enumerate() {
        let line = format!(
            "  {:<12} {:>8} {:>7.0}% {:>8} {:>9.1} {:>9}  {}",
            truncate(&stat.endpoint, 12),
            format_number(stat.requests),
            stat.failure_pct(),
            stat.timeouts,
            stat.avg_latency_ms,
            stat.max_latency_ms,
            stat.last_seen,
        );

        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_history_json(history: &History) -> Result<()> {
    let value = serde_json::json!({
        "total_requests": history.total_requests,
        "total_failures": history.total_failures,
        "endpoints": history.endpoints.iter().map(|s| serde_json::json!({
            "endpoint": s.endpoint,
            "requests": s.requests,
            "failures": s.failures,
            "timeouts": s.timeouts,
            "avg_latency_ms": s.avg_latency_ms,
            "max_latency_ms": s.max_latency_ms,
            "last_seen": s.last_seen,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_history_csv(history: &History) {
    println!("endpoint,requests,failures,timeouts,avg_latency_ms,max_latency_ms,last_seen");
    for s in &history.endpoints {
        println!(
            "{},{},{},{},{:.1},{},{}",
            s.endpoint,
            s.requests,
            s.failures,
            s.timeouts,
            s.avg_latency_ms,
            s.max_latency_ms,
            s.last_seen,
        );
    }
}

// ---------------------------------------------------------------------------
// oven config show | init | set | reset | path
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective oven Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.oven/config.toml");
    print_source(project_exists, ".oven.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "OVEN_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.oven/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point oven at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Print where oven reads its config and writes its log.
pub fn run_config_path() -> Result<()> {
    let show = |label: &str, path: Option<std::path::PathBuf>| match path {
        Some(p) => println!("  {:<16} {}", label.bold(), p.display()),
        None => println!("  {:<16} {}", label.bold(), "unavailable".dimmed()),
    };
    show("Global config", config::global_config_file());
    show("Project config", config::project_config_file());
    show("Request log", events::events_log_path());
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
