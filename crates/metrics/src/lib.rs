//! Metrics and logging for the bridge-probe harness
//!
//! - Prometheus counters for submissions, balance polls, pair outcomes and
//!   validator perturbations
//! - HTTP endpoint for scraping while a run is in progress
//! - Tracing subscriber initialisation and per-run correlation IDs
//!
//! # Example
//!
//! ```no_run
//! use bridge_probe_metrics::{init_tracing, MetricsCollector};
//!
//! init_tracing("info", false).unwrap();
//! let collector = MetricsCollector::new();
//! collector.record_run_started();
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod http;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError, RunPhase};
pub use http::{MetricsServer, MetricsServerError};
pub use self::tracing::{default_filter, init_tracing, run_span, RunId, TracingError};
