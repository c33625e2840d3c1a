use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ColorChoice, ConfigBuilder, TerminalMode};

/// Modules to filter out from logging when not in Trace mode.
/// These are the HTTP stack underneath the broker; their output drowns the login flow.
const FILTERED_MODULES: &[&str] = &["hyper", "reqwest", "rustls", "tower", "tracing", "axum"];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger with configuration based on the provided Config.
    ///
    /// When the log level is set to Trace, all logs including dependency logs are shown.
    /// For all other log levels, verbose dependency logs are filtered out. Outside of
    /// development, output goes uncolored to stderr so it can be collected as-is.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);
        let (terminal_mode, color_choice) = Self::terminal_for(&config.runtime_env);

        simplelog::TermLogger::init(
            config.log_level_filter,
            log_config,
            terminal_mode,
            color_choice,
        )?;

        log::debug!(
            "Logger initialized at {} with dependency filtering {}",
            config.log_level_filter,
            if apply_filters { "on" } else { "off" }
        );
        Ok(())
    }

    /// Determines whether dependency logging should be filtered.
    ///
    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Picks where log lines go and whether they are colored.
    fn terminal_for(env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match env {
            RustEnv::Development => (TerminalMode::Mixed, ColorChoice::Auto),
            RustEnv::Staging | RustEnv::Production => (TerminalMode::Stderr, ColorChoice::Never),
        }
    }

    /// Builds a simplelog Config with optional module filtering.
    ///
    /// When `apply_filters` is true, logs from noisy dependencies are suppressed.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        // Show the module path so flow, provider and audit lines can be told apart.
        builder.set_target_level(LevelFilter::Error);

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
