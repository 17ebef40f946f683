use crate::utils::error::{CorreiosError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "correios";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per event, for services that ship their logs.
    Json,
}

/// Directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> String {
    if verbose {
        format!("{}=debug,info", LOG_TARGET)
    } else {
        format!("{}=info,warn", LOG_TARGET)
    }
}

/// Installs the global subscriber on stderr; stdout is left to command output.
/// Fails if a subscriber is already installed.
pub fn init_logger(format: LogFormat, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(false)
        .with_line_number(false);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Json => registry.with(layer.json().flatten_event(true)).try_init(),
    };
    installed.map_err(|e| CorreiosError::ConfigError {
        message: format!("cannot install logger: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_directive(verbose)).is_ok());
        }
        assert_eq!(default_directive(true), "correios=debug,info");
    }

    #[test]
    fn test_second_install_fails() {
        let _ = init_logger(LogFormat::Compact, false);
        assert!(init_logger(LogFormat::Json, false).is_err());
    }
}
