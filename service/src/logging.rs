use crate::config::Config;
use log::LevelFilter;
use simplelog::{CombinedLogger, ConfigBuilder, SharedLogger, TermLogger};

/// Module path prefixes of the platform's own crates. Their records are logged at the
/// configured level.
const PLATFORM_MODULES: &[&str] = &[
    "meetings_platform_rs",
    "seed_db",
    "domain",
    "entity_api",
    "events",
    "meeting_ai",
    "meeting_auth",
    "migration",
    "service",
    "sse",
    "web",
];

/// Dependency records below this level are dropped unless tracing.
const DEPENDENCY_FLOOR: LevelFilter = LevelFilter::Warn;

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger for the platform crates at the configured level and a
    /// second one for everything else (sqlx, hyper, reqwest, ...) at `Warn`. A slow
    /// query warning or a refused connection from a dependency is therefore never hidden,
    /// while its debug chatter only shows up at `Trace`.
    pub fn init_logger(config: &Config) {
        let level = config.log_level_filter;

        // A second initialization (e.g. seed_db after migrations) keeps the first logger
        if let Err(e) = CombinedLogger::init(Self::loggers(level)) {
            eprintln!("Logger already initialized: {e}");
        }
    }

    fn loggers(level: LevelFilter) -> Vec<Box<dyn SharedLogger>> {
        let mut platform = ConfigBuilder::new();
        platform.set_time_format_rfc3339();
        for module in PLATFORM_MODULES {
            platform.add_filter_allow_str(module);
        }

        let mut dependencies = ConfigBuilder::new();
        dependencies.set_time_format_rfc3339();
        for module in PLATFORM_MODULES {
            dependencies.add_filter_ignore_str(module);
        }

        vec![
            TermLogger::new(
                Self::convert_level_filter(level),
                platform.build(),
                simplelog::TerminalMode::Mixed,
                simplelog::ColorChoice::Auto,
            ),
            TermLogger::new(
                Self::convert_level_filter(Self::dependency_level(level)),
                dependencies.build(),
                simplelog::TerminalMode::Mixed,
                simplelog::ColorChoice::Auto,
            ),
        ]
    }

    /// `Trace` opens up dependency logs completely; `Off` silences them along with
    /// everything else.
    fn dependency_level(level: LevelFilter) -> LevelFilter {
        match level {
            LevelFilter::Trace | LevelFilter::Off => level,
            _ => level.min(DEPENDENCY_FLOOR),
        }
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }
}
