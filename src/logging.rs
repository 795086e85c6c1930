//! Logging and tracing setup for Guardrail Core.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the emitted log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    /// Machine-readable, one JSON object per event. The default.
    Json,
    /// Multi-line human-readable output for local debugging.
    Pretty,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    fn from_env() -> Self {
        Self::parse(std::env::var("GUARDRAIL_LOG_FORMAT").ok().as_deref())
    }
}

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `guardrail_core=info`;
/// the output format from `GUARDRAIL_LOG_FORMAT` (`json` or `pretty`).
pub fn init() {
    init_with_default_filter("guardrail_core=info");
}

/// Initialize with a caller-supplied default filter directive, still
/// overridable through `RUST_LOG`.
pub fn init_with_default_filter(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        // Unknown values fall back rather than erroring at startup.
        assert_eq!(LogFormat::parse(Some("xml")), LogFormat::Json);
    }

    #[test]
    fn test_pretty_format_selected() {
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
    }
}
