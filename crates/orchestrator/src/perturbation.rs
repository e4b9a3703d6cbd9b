//! Timed validator stop/start injection
//!
//! Each scheduled action runs on its own one-shot task. Failures are
//! recorded, never propagated, so verification continues regardless.
//! A timer that has fired always applies its action to every listed
//! validator; only timers still sleeping are abandoned at the end of a run.

use bridge_probe_metrics::MetricsCollector;
use bridge_probe_retry::CancellationToken;
use bridge_probe_types::{PerturbationSchedule, ValidatorAction};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn, Instrument};

use crate::client::ValidatorControl;
use crate::report::{PerturbationRecord, RunFailure, ValidatorActionKind};

/// Armed perturbation timers of one run
pub struct PerturbationTimers {
    tasks: Vec<(ValidatorActionKind, JoinHandle<Vec<PerturbationRecord>>)>,
    abandon: CancellationToken,
}

impl PerturbationTimers {
    /// Spawn one timer per scheduled action; delays count from now
    pub fn arm(
        schedule: &PerturbationSchedule,
        control: Arc<dyn ValidatorControl>,
        cancel: CancellationToken,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        let mut tasks = Vec::new();
        let abandon = CancellationToken::new();
        let armed_at = Instant::now();

        let actions = [
            (ValidatorActionKind::Stop, &schedule.stop),
            (ValidatorActionKind::Start, &schedule.start),
        ];

        for (kind, action) in actions {
            let Some(action) = action.clone() else {
                continue;
            };
            if action.validators.is_empty() {
                continue;
            }

            info!(
                action = %kind,
                after_ms = action.after.as_millis() as u64,
                validators = ?action.validators,
                "armed validator perturbation"
            );

            let handle = tokio::spawn(
                run_action(
                    kind,
                    armed_at + action.after,
                    action,
                    schedule.resync,
                    control.clone(),
                    TimerSignals {
                        cancel: cancel.clone(),
                        abandon: abandon.clone(),
                    },
                    metrics.clone(),
                )
                .in_current_span(),
            );
            tasks.push((kind, handle));
        }

        Self { tasks, abandon }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abandon timers that are still sleeping and wait for fired ones to
    /// apply their action
    ///
    /// Returns every record plus the failures that belong in the run error.
    pub async fn finish(self) -> (Vec<PerturbationRecord>, Vec<RunFailure>) {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        self.abandon.cancel();

        for (kind, handle) in self.tasks {
            match handle.await {
                Ok(fired) => {
                    for record in fired {
                        if let PerturbationRecord::Failed {
                            action,
                            validator,
                            reason,
                        } = &record
                        {
                            failures.push(RunFailure::Perturbation {
                                action: *action,
                                validator: *validator,
                                reason: reason.clone(),
                            });
                        }
                        records.push(record);
                    }
                }
                Err(e) => {
                    error!(action = %kind, error = %e, "validator perturbation task failed");
                    failures.push(RunFailure::Task {
                        task: format!("validator {kind}"),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (records, failures)
    }
}

struct TimerSignals {
    /// Run cancellation
    cancel: CancellationToken,
    /// Fired by `finish`; ignored once the deadline has passed
    abandon: CancellationToken,
}

async fn run_action(
    kind: ValidatorActionKind,
    deadline: Instant,
    action: ValidatorAction,
    resync: bool,
    control: Arc<dyn ValidatorControl>,
    signals: TimerSignals,
    metrics: Option<Arc<MetricsCollector>>,
) -> Vec<PerturbationRecord> {
    tokio::select! {
        biased;
        _ = signals.cancel.cancelled() => {
            info!(action = %kind, "validator perturbation cancelled");
            return vec![PerturbationRecord::Cancelled { action: kind }];
        }
        _ = tokio::time::sleep_until(deadline) => {}
        _ = signals.abandon.cancelled() => {
            if Instant::now() < deadline {
                warn!(action = %kind, "validator perturbation abandoned before its timer fired");
                return vec![PerturbationRecord::Abandoned { action: kind }];
            }
        }
    }

    let mut records = Vec::with_capacity(action.validators.len());

    for validator in action.validators {
        let result = match kind {
            ValidatorActionKind::Stop => control.stop_validator(validator).await,
            ValidatorActionKind::Start => control.start_validator(validator, resync).await,
        };

        if let Some(metrics) = &metrics {
            metrics.record_validator_action(kind.as_str(), result.is_ok());
        }

        match result {
            Ok(()) => {
                info!(action = %kind, validator, "validator perturbation applied");
                records.push(PerturbationRecord::Applied {
                    action: kind,
                    validator,
                });
            }
            Err(e) => {
                error!(action = %kind, validator, error = %e, "validator perturbation failed");
                records.push(PerturbationRecord::Failed {
                    action: kind,
                    validator,
                    reason: e.to_string(),
                });
            }
        }
    }

    records
}
