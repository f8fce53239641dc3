//! Logging bootstrap for SHELF binaries.

use shelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the filter from `RUST_LOG`, falling back to the configured directives.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}

/// Install the global tracing subscriber.
///
/// Calling this twice is harmless: the second installation is reported and ignored.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_target(true);

    let installed = match settings.log_format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Pretty => builder.compact().try_init(),
    };

    if let Err(e) = installed {
        tracing::debug!(target: "shelf-telemetry", error = %e, "subscriber already installed");
        return Ok(());
    }

    tracing::info!(
        target: "shelf-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let settings = TelemetrySettings::default();
        assert!(init(&settings).is_ok());
        assert!(init(&settings).is_ok());
    }

    #[test]
    fn configured_filter_parses() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Json,
            filter: "debug,hyper=warn".to_string(),
        };
        let filter = env_filter(&settings);
        assert!(!filter.to_string().is_empty());
    }
}
