use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use oven::cli;
use oven::config::{self, OvenConfig};

#[derive(Debug, Parser)]
#[command(name = "oven")]
#[command(about = "Bake, watch and terminate a remote compute cluster")]
struct App {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// One-run overrides applied on top of the resolved config.
#[derive(Debug, Args)]
struct Overrides {
    /// Backend base URL
    #[arg(long, global = true)]
    backend: Option<String>,
    /// Status poll interval in milliseconds
    #[arg(long, global = true)]
    check_interval_ms: Option<u64>,
    /// Data pull interval in milliseconds
    #[arg(long, global = true)]
    pull_interval_ms: Option<u64>,
    /// Pull rounds before the pull loop stops
    #[arg(long, global = true)]
    max_pull_count: Option<u32>,
}

impl Overrides {
    fn apply(self, config: &mut OvenConfig) {
        if let Some(url) = self.backend {
            config.backend.url = url;
        }
        if let Some(ms) = self.check_interval_ms {
            config.polling.check_interval_ms = ms;
        }
        if let Some(ms) = self.pull_interval_ms {
            config.polling.pull_interval_ms = ms;
        }
        if let Some(n) = self.max_pull_count {
            config.polling.max_pull_count = n;
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bake a new cluster, then watch it until the data pull finishes
    Bake,
    /// Watch a cluster that is already baking
    Check {
        /// Cluster id, e.g. j-2AXXXXXXGAPLF
        id: String,
    },
    /// Pull the latest record from each table on a timer
    Pull {
        /// Table to pull, as `table` or `table:region` (repeatable)
        #[arg(long = "table")]
        tables: Vec<String>,
    },
    /// Terminate a cluster
    Terminate {
        /// Cluster id; without one there is no active cluster to terminate
        id: Option<String>,
    },
    /// Serve the web control panel
    Serve {
        /// Listen address, e.g. 127.0.0.1:12341
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Check backend reachability and local files
    Health,
    /// Summarize logged backend requests per endpoint
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.oven/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value by dotted key, e.g. polling.max_pull_count 10
    Set { key: String, value: String },
    /// Overwrite the config file with defaults
    Reset,
    /// Print the config file locations
    Path,
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut cfg = config::load();
    app.overrides.apply(&mut cfg);

    match app.command {
        Commands::Bake => cli::run_bake(&cfg),
        Commands::Check { id } => cli::run_check(&cfg, &id),
        Commands::Pull { tables } => cli::run_pull(&cfg, &tables),
        Commands::Terminate { id } => cli::run_terminate(&cfg, id.as_deref()),
        Commands::Serve { addr, no_open } => {
            if let Some(addr) = addr {
                cfg.web.addr = addr;
            }
            let open = cfg.web.open_browser && !no_open;
            cli::run_serve(&cfg, open)
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::History { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::run_config_show(),
            ConfigCommands::Init { force } => cli::run_config_init(force),
            ConfigCommands::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommands::Reset => cli::run_config_reset(),
            ConfigCommands::Path => cli::run_config_path(),
        },
    }
}
