// Logging module, powered by tracing-subscriber
//
// Library crates log through the `log` facade. The `tracing_log::LogTracer`
// bridge captures those records and routes them through the subscriber
// installed here.

use std::collections::HashMap;

use strata_configs::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Build the `EnvFilter` from the base level, noisy-crate overrides, and
/// optional per-target overrides from config.
fn build_env_filter(
    level: &str,
    target_levels: Option<&HashMap<String, String>>,
) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    // Suppress noisy third-party crates
    let noisy: &[(&str, &str)] = &[("rocksdb", "warn"), ("tracing", "warn")];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    if let Some(map) = target_levels {
        let mut targets: Vec<_> = map.iter().collect();
        targets.sort();
        for (target, lvl) in targets {
            directives.push(format!("{}={}", target, lvl));
        }
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Initialize logging based on configuration.
///
/// Installs a `tracing-subscriber` registry with a console layer (compact text
/// or JSON lines) when `log_to_console` is set, plus the `log` bridge.
/// Calling it again after a subscriber is installed leaves the first one in
/// place and returns `Ok`.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = build_env_filter(&settings.level, Some(&settings.targets))?;

    // ok() in case already initialized
    tracing_log::LogTracer::init().ok();

    let console_layer = if settings.log_to_console {
        let layer = match LogFormat::parse(&settings.format) {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_span_list(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_names(true)
                .with_filter(filter)
                .boxed(),
        };
        Some(layer)
    } else {
        None
    };

    if let Err(e) = tracing_subscriber::registry().with(console_layer).try_init() {
        log::debug!("Logging already initialized: {}", e);
        return Ok(());
    }

    tracing::trace!(
        "Logging initialized: level={}, format={}, console={}",
        settings.level,
        settings.format,
        settings.log_to_console
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("jsonl"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Compact);
    }

    #[test]
    fn test_env_filter_accepts_targets() {
        let targets = HashMap::from([("strata_store".to_string(), "trace".to_string())]);
        assert!(build_env_filter("info", Some(&targets)).is_ok());
        assert!(build_env_filter("debug", None).is_ok());
    }

    #[test]
    fn test_init_logging_twice_is_ok() {
        let settings = LoggingSettings::default();
        assert!(init_logging(&settings).is_ok());
        assert!(init_logging(&settings).is_ok());
    }
}
