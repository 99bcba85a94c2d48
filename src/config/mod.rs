/// Configuration system for oven.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::OvenConfig::default()`]
/// 2. **User global config**: `~/.oven/config.toml`
/// 3. **Project local config**: `.oven.toml` in the current working directory
/// 4. **Environment variables**: `OVEN_*` overrides (highest precedence)
///
/// File layers are deep-merged at the key level: a file that only sets
/// `[polling] max_pull_count` leaves every other value from the layers
/// below untouched. Arrays (such as `[[tables]]`) replace wholesale.
///
/// # Usage
///
/// ```rust,ignore
/// use oven::config;
///
/// let cfg = config::load();
/// let every = cfg.polling.check_interval_ms;
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::OvenConfig;

use crate::session::display::Region;
use crate::session::puller::TableBinding;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved oven configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. Unreadable or
/// malformed files are skipped.
pub fn load() -> OvenConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.into_iter().flatten());
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files over the built-in defaults.
fn load_layers(paths: impl Iterator<Item = PathBuf>) -> OvenConfig {
    let Ok(mut merged) = toml::Value::try_from(OvenConfig::default()) else {
        return OvenConfig::default();
    };

    for path in paths {
        if let Some(layer) = load_toml_layer(&path) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read one config file as a raw TOML tree, provided it is also a valid
/// (partial) [`OvenConfig`].
fn load_toml_layer(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str::<OvenConfig>(&content).ok()?.validate().ok()?;
    toml::from_str(&content).ok()
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other
/// value replaces what was there.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.oven/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".oven").join("config.toml"))
}

/// Path to the project local config: `.oven.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".oven.toml"))
}

pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `OVEN_BACKEND_URL`: backend base URL
/// - `OVEN_REQUEST_TIMEOUT_MS`: per-request timeout (timings of 0 are ignored)
/// - `OVEN_CHECK_INTERVAL_MS`: status poll interval
/// - `OVEN_PULL_INTERVAL_MS`: data pull interval
/// - `OVEN_MAX_PULL_COUNT`: pull rounds before stopping
/// - `OVEN_TABLES`: comma list of `table[:region]`
/// - `OVEN_WEB_ADDR`: dashboard listen address
/// - `OVEN_LOGGING`: event log on/off
fn apply_env_overrides(config: &mut OvenConfig) {
    if let Ok(val) = std::env::var("OVEN_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.url = val;
    }
    if let Ok(val) = std::env::var("OVEN_REQUEST_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.backend.request_timeout_ms = ms;
    }

    if let Ok(val) = std::env::var("OVEN_CHECK_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.polling.check_interval_ms = ms;
    }
    if let Ok(val) = std::env::var("OVEN_PULL_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.polling.pull_interval_ms = ms;
    }
    if let Ok(val) = std::env::var("OVEN_MAX_PULL_COUNT")
        && let Ok(n) = val.parse::<u32>()
    {
        config.polling.max_pull_count = n;
    }
    if let Ok(val) = std::env::var("OVEN_TABLES")
        && let Some(tables) = parse_table_list(&val)
    {
        config.tables = tables;
    }

    if let Ok(val) = std::env::var("OVEN_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("OVEN_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a table binding: `table` or `table:region`. A bare table name is
/// shown in the tweet region.
pub fn parse_table_binding(spec: &str) -> Option<TableBinding> {
    let (table, region) = match spec.trim().split_once(':') {
        Some((table, region)) => (table.trim(), Region::from_element_id(region.trim())?),
        None => (spec.trim(), Region::Tweet),
    };
    if table.is_empty() {
        return None;
    }
    Some(TableBinding::new(table, region))
}

/// Parse a comma-separated list of table bindings. Any bad item rejects the
/// whole list.
pub fn parse_table_list(val: &str) -> Option<Vec<TableBinding>> {
    val.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_table_binding)
        .collect()
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.oven/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.oven/ directory")?;
    }

    fs::write(&path, OvenConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `polling.max_pull_count`. The file is created
/// from defaults if it does not exist yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(OvenConfig::default())
            .context("failed to serialize default config")?
    };

    set_toml_value(&mut root, key, value)?;

    // Reject edits that would leave an unloadable file behind.
    let updated: OvenConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;
    updated
        .validate()
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path. The existing
/// value's type decides how `raw_value` is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a section at '{}'", sections.join(".")))?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Array(items)) if items.iter().all(toml::Value::is_table) => {
            // Table bindings: "tweets:tweet,sentiment:sentiment"
            let bindings = parse_table_list(raw_value)
                .with_context(|| format!("expected table[:region] list for '{key}'"))?;
            toml::Value::try_from(bindings).context("failed to encode table list")?
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("oven-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn layers_merge_key_by_key() {
        let global = temp_file(
            "global.toml",
            "[polling]\ncheck_interval_ms = 1000\nmax_pull_count = 7\n",
        );
        let project = temp_file("project.toml", "[polling]\nmax_pull_count = 3\n");

        let config = load_layers([global, project].into_iter());
        assert_eq!(config.polling.check_interval_ms, 1000);
        assert_eq!(config.polling.max_pull_count, 3);
        assert_eq!(config.polling.pull_interval_ms, 5000);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let bad = temp_file("bad.toml", "[polling]\nmax_pull_count = \"many\"\n");
        let good = temp_file("good.toml", "[backend]\nurl = \"http://emr-proxy:80\"\n");

        let config = load_layers([bad, good].into_iter());
        assert_eq!(config.polling.max_pull_count, 40);
        assert_eq!(config.backend.url, "http://emr-proxy:80");
    }

    #[test]
    fn layer_with_zero_timing_is_skipped() {
        let zero = temp_file(
            "zero.toml",
            "[backend]\nrequest_timeout_ms = 0\n[polling]\nmax_pull_count = 5\n",
        );
        let config = load_layers(std::iter::once(zero));
        assert_eq!(config.backend.request_timeout_ms, 10_000);
        assert_eq!(config.polling.max_pull_count, 40);
    }

    #[test]
    fn tables_layer_replaces_list() {
        let single = temp_file(
            "single.toml",
            "[[tables]]\ntable = \"tweettest\"\nregion = \"tweet\"\n",
        );
        let config = load_layers(std::iter::once(single));
        assert_eq!(config.tables, vec![TableBinding::new("tweettest", Region::Tweet)]);
    }

    #[test]
    fn table_binding_parsing() {
        assert_eq!(
            parse_table_binding("sentiment:sentiment"),
            Some(TableBinding::new("sentiment", Region::Sentiment))
        );
        assert_eq!(
            parse_table_binding(" tweettest "),
            Some(TableBinding::new("tweettest", Region::Tweet))
        );
        assert_eq!(parse_table_binding("x:nowhere"), None);
        assert_eq!(parse_table_binding(":tweet"), None);
    }

    #[test]
    fn table_list_rejects_any_bad_item() {
        assert_eq!(
            parse_table_list("tweets:tweet, sentiment:sentiment").map(|t| t.len()),
            Some(2)
        );
        assert_eq!(parse_table_list("tweets,x:nowhere"), None);
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root: toml::Value =
            toml::from_str("[polling]\nmax_pull_count = 40\n").unwrap();
        set_toml_value(&mut root, "polling.max_pull_count", "12").unwrap();
        assert_eq!(root["polling"]["max_pull_count"].as_integer(), Some(12));
    }

    #[test]
    fn set_toml_value_updates_bool_and_string() {
        let mut root = toml::Value::try_from(OvenConfig::default()).unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        set_toml_value(&mut root, "backend.url", "http://10.1.2.3:5000").unwrap();
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
        assert_eq!(root["backend"]["url"].as_str(), Some("http://10.1.2.3:5000"));
    }

    #[test]
    fn set_toml_value_replaces_tables() {
        let mut root = toml::Value::try_from(OvenConfig::default()).unwrap();
        set_toml_value(&mut root, "tables", "tweettest:tweet").unwrap();
        let config: OvenConfig = root.try_into().unwrap();
        assert_eq!(config.tables, vec![TableBinding::new("tweettest", Region::Tweet)]);
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root = toml::Value::try_from(OvenConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "polling.nope", "1").is_err());
        assert!(set_toml_value(&mut root, "polling.max_pull_count", "lots").is_err());
        assert!(set_toml_value(&mut root, "", "1").is_err());
    }
}
