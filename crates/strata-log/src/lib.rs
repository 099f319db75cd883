//! Structured logging for the Strata voxel world.
//!
//! Console output carries the module path, worker thread names, and time since
//! start; debug builds can also write newline-delimited JSON to a log file.
//! `RUST_LOG` wins over the configured level.

use std::path::Path;

use strata_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "strata.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - supplies `debug.log_level` when `RUST_LOG` is unset
///
/// ```no_run
/// use strata_config::Config;
/// use strata_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Worker threads are named per pipeline stage, so thread names are worth printing.
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Returns the filter directive derived from the config, or the default.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_directive_from_config() {
        let mut config = Config::default();
        config.debug.log_level = "debug,strata_world=trace".to_string();
        assert_eq!(
            filter_directive(Some(&config)),
            "debug,strata_world=trace"
        );
    }

    #[test]
    fn test_blank_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "   ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_subsystem_filter() {
        let filter = EnvFilter::new("info,strata_terrain=debug");
        assert!(format!("{}", filter).contains("strata_terrain=debug"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,strata_mesh=trace",
            "warn,strata_world=debug,strata_voxel=trace",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_file_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file_path = temp_dir.path().join(LOG_FILE_NAME);
        assert_eq!(log_file_path.file_name().unwrap(), "strata.log");
    }
}
