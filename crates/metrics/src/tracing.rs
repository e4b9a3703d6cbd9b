use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. With `json` set, events
/// are emitted as one JSON object per line.
pub fn init_tracing(default_filter: &str, json: bool) -> Result<(), TracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .json(),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| TracingError::InitError(e.to_string()))
}

/// Build a filter directive from a configured log level
///
/// The level applies to the harness crates and their dependencies alike.
pub fn default_filter(log_level: &str) -> String {
    log_level.trim().to_lowercase()
}

/// Identifier attached to every event emitted during one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracing span for one verification run
pub fn run_span(run_id: RunId) -> tracing::Span {
    tracing::info_span!("bridging_run", run_id = %run_id)
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_generation() {
        let id1 = RunId::new();
        let id2 = RunId::new();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("warn"), "warn");
        assert_eq!(default_filter(" INFO "), "info");
    }

    #[test]
    fn test_configured_level_applies_to_harness_targets() {
        let subscriber = tracing_subscriber::registry().with(EnvFilter::new(default_filter("warn")));

        ::tracing::subscriber::with_default(subscriber, || {
            assert!(!::tracing::enabled!(
                target: "bridge_probe_orchestrator::orchestrator",
                ::tracing::Level::DEBUG
            ));
            assert!(!::tracing::enabled!(
                target: "bridge_probe_orchestrator::poll",
                ::tracing::Level::INFO
            ));
            assert!(::tracing::enabled!(
                target: "bridge_probe_orchestrator::orchestrator",
                ::tracing::Level::WARN
            ));
        });
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        // Only one global subscriber may be installed per process
        let _ = init_tracing("info", true);
        assert!(init_tracing("info", false).is_err());
    }
}
