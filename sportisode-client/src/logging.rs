use log::LevelFilter;
use simplelog::*;
use std::fs::OpenOptions;
use std::path::PathBuf;

const LOG_FILE: &str = "sportisode.log";

/// Where and how much the client logs.
///
/// The stores and the gateway each carry a copy and check the area switch
/// before formatting a message, so a disabled area costs one branch.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub enabled: bool,
    pub log_file: PathBuf,
    /// Truncate instead of appending to the previous run's log
    pub clear_on_startup: bool,
    pub features: LogFeatures,
    pub level: LevelFilter,
}

/// Per-area switches for the `log_*!` macros
#[derive(Debug, Clone)]
pub struct LogFeatures {
    /// Requests and response statuses
    pub api_calls: bool,
    /// Optimistic toggles, confirmations and reverts
    pub interactions: bool,
    /// Comment thread mutations
    pub comments: bool,
    /// Feed paging and search
    pub feed: bool,
    /// Live channel frames
    pub live_updates: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: default_log_file(),
            clear_on_startup: false,
            features: LogFeatures::default(),
            level: LevelFilter::Info,
        }
    }
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            api_calls: true,
            interactions: true,
            comments: true,
            feed: true,
            live_updates: true,
        }
    }
}

impl LogFeatures {
    fn none() -> Self {
        Self {
            api_calls: false,
            interactions: false,
            comments: false,
            feed: false,
            live_updates: false,
        }
    }
}

impl LogConfig {
    /// Nothing is written. Used by embedders that bring their own logger
    /// and by tests.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            features: LogFeatures::none(),
            ..Default::default()
        }
    }

    /// `--verbose` logs every area at debug level into a fresh file;
    /// otherwise only warnings and errors are appended.
    pub fn for_cli(verbose: bool) -> Self {
        if verbose {
            Self {
                level: LevelFilter::Debug,
                clear_on_startup: true,
                ..Default::default()
            }
        } else {
            Self {
                level: LevelFilter::Warn,
                features: LogFeatures::none(),
                ..Default::default()
            }
        }
    }
}

/// Next to the token file when a home directory exists
fn default_log_file() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".sportisode").join(LOG_FILE),
        None => PathBuf::from(LOG_FILE),
    }
}

/// Install the file logger described by `config`
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(!config.clear_on_startup)
        .truncate(config.clear_on_startup)
        .open(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    WriteLogger::init(config.level, log_config, log_file)?;

    log::info!(
        "Logging to {} at {:?}",
        config.log_file.display(),
        config.level
    );
    log::debug!("Log areas: {:?}", config.features);

    Ok(())
}

/// Request and response lines from the gateway
#[macro_export]
macro_rules! log_api_call {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.api_calls {
            log::debug!(target: "api_calls", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_interaction {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.interactions {
            log::debug!(target: "interactions", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_comments {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.comments {
            log::debug!(target: "comments", $($arg)*);
        }
    };
}

/// Feed paging and search
#[macro_export]
macro_rules! log_feed {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.feed {
            log::debug!(target: "feed", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_live {
    ($config:expr, $($arg:tt)*) => {
        if $config.enabled && $config.features.live_updates {
            log::debug!(target: "live_updates", $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_presets() {
        let quiet = LogConfig::for_cli(false);
        assert!(quiet.enabled);
        assert_eq!(quiet.level, LevelFilter::Warn);
        assert!(!quiet.features.api_calls);
        assert!(!quiet.clear_on_startup);

        let verbose = LogConfig::for_cli(true);
        assert_eq!(verbose.level, LevelFilter::Debug);
        assert!(verbose.features.api_calls && verbose.features.live_updates);
        assert!(verbose.clear_on_startup);
    }

    #[test]
    fn test_disabled_installs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_file: dir.path().join("nested").join(LOG_FILE),
            ..LogConfig::disabled()
        };

        init_logging(&config).unwrap();
        assert!(!config.log_file.exists());
    }

    #[test]
    fn test_log_file_lives_in_client_dir() {
        let file = default_log_file();
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some(LOG_FILE));
    }
}
