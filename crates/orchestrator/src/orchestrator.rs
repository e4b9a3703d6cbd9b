use bridge_probe_metrics::{run_span, MetricsCollector, RunId, RunPhase};
use bridge_probe_retry::{execute_with_retry, CancellationToken, RetryError, RetryPolicy};
use bridge_probe_types::{
    Account, Binary, ChainRoute, Ledger, PollSettings, Rounding, RunSpec, TransferRequest, Uint256,
};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn, Instrument};

use crate::client::{BalanceQuery, TransferSubmitter, ValidatorControl};
use crate::error::OrchestratorError;
use crate::expected::{ExpectedBalances, ExpectedSnapshot, PairKey};
use crate::perturbation::PerturbationTimers;
use crate::poll::{wait_for_exact_amount, wait_for_greater_amount};
use crate::report::{
    PairReport, PairState, PollOutcome, QuietOutcome, RunFailure, RunReport, SubmissionSummary,
};

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Budget for reading pre-run balances
    pub pre_run: PollSettings,

    /// Budget used by the single-route helpers
    pub convergence: PollSettings,
}

impl OrchestratorConfig {
    pub fn with_convergence(mut self, convergence: PollSettings) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_pre_run(mut self, pre_run: PollSettings) -> Self {
        self.pre_run = pre_run;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pre_run: PollSettings::new(5, Duration::from_secs(2)),
            convergence: PollSettings::convergence_default(),
        }
    }
}

pub fn retry_policy(settings: &PollSettings) -> RetryPolicy {
    RetryPolicy::new(settings.max_attempts, settings.interval)
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Builder for BridgingOrchestrator
#[derive(Default)]
pub struct BridgingOrchestratorBuilder {
    submitter: Option<Arc<dyn TransferSubmitter>>,
    balances: Option<Arc<dyn BalanceQuery>>,
    validators: Option<Arc<dyn ValidatorControl>>,
    metrics: Option<Arc<MetricsCollector>>,
    config: OrchestratorConfig,
    cancel: Option<CancellationToken>,
}

impl BridgingOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn TransferSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_balances(mut self, balances: Arc<dyn BalanceQuery>) -> Self {
        self.balances = Some(balances);
        self
    }

    pub fn with_validators(mut self, validators: Arc<dyn ValidatorControl>) -> Self {
        self.validators = Some(validators);
        self
    }

    /// Use one collaborator for submissions, balances and validators
    pub fn with_bridge<T>(self, bridge: Arc<T>) -> Self
    where
        T: TransferSubmitter + BalanceQuery + ValidatorControl + 'static,
    {
        self.with_submitter(bridge.clone())
            .with_balances(bridge.clone())
            .with_validators(bridge)
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an externally owned cancellation token
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<BridgingOrchestrator, BuilderError> {
        let submitter = self.submitter.ok_or_else(|| BuilderError::MissingField {
            field: "submitter".to_string(),
        })?;
        let balances = self.balances.ok_or_else(|| BuilderError::MissingField {
            field: "balances".to_string(),
        })?;

        Ok(BridgingOrchestrator {
            submitter,
            balances,
            validators: self.validators,
            metrics: self.metrics,
            config: self.config,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// Drives bridging verification runs against the collaborator traits
pub struct BridgingOrchestrator {
    submitter: Arc<dyn TransferSubmitter>,
    balances: Arc<dyn BalanceQuery>,
    validators: Option<Arc<dyn ValidatorControl>>,
    metrics: Option<Arc<MetricsCollector>>,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

/// A route with the amount every receiver gains per successful submission
struct RoutePlan {
    route: ChainRoute,
    credited: Uint256,
}

/// What one submit task achieved
struct SubmitTaskResult {
    summary: SubmissionSummary,
    failure: Option<RunFailure>,
}

impl BridgingOrchestrator {
    pub fn builder() -> BridgingOrchestratorBuilder {
        BridgingOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Token observed by every task of every run
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FULL RUN
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submit every sender x route transfer, then verify every receiver on
    /// every destination chain
    ///
    /// Returns `Err` only when no verdict is possible (invalid spec, pre-run
    /// balances unavailable, cancellation before seeding finished). Failed
    /// submissions, pairs and perturbations are reported in the `RunReport`.
    pub async fn execute(&self, spec: RunSpec) -> Result<RunReport, OrchestratorError> {
        let run_id = RunId::new();
        let started = Instant::now();

        if let Some(metrics) = &self.metrics {
            metrics.record_run_started();
        }

        let result = self
            .run(run_id, spec)
            .instrument(run_span(run_id))
            .await;

        if let Some(metrics) = &self.metrics {
            let success = matches!(&result, Ok(report) if report.is_success());
            metrics.record_run_finished(success, started.elapsed());
        }

        result
    }

    async fn run(&self, run_id: RunId, spec: RunSpec) -> Result<RunReport, OrchestratorError> {
        let started_at = Utc::now();
        let plans = self.plan(&spec)?;

        info!(
            senders = spec.senders.len(),
            receivers = spec.receivers.len(),
            routes = plans.len(),
            repeat = spec.repeat,
            "starting bridging run"
        );

        // Seed
        let phase_started = Instant::now();
        let expected = self.seed(&spec).await?;
        self.record_phase(RunPhase::Seed, phase_started);

        // Perturbation timers run alongside submit and verify
        let timers = match (&spec.perturbation, &self.validators) {
            (Some(schedule), Some(control)) if !schedule.is_empty() => Some(PerturbationTimers::arm(
                schedule,
                control.clone(),
                self.cancel.clone(),
                self.metrics.clone(),
            )),
            _ => None,
        };

        // Submit
        let phase_started = Instant::now();
        let submit_results = self.submit_all(&spec, &plans).await;
        self.record_phase(RunPhase::Submit, phase_started);

        let mut failures = Vec::new();
        let mut submissions = Vec::with_capacity(submit_results.len());
        for result in submit_results {
            match result {
                Ok(task) => {
                    failures.extend(task.failure);
                    submissions.push(task.summary);
                }
                Err(failure) => failures.push(failure),
            }
        }

        // Barrier passed: every submit task has been joined
        let snapshot = match credit_submissions(expected, &submissions, &spec.receivers) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if let Some(timers) = timers {
                    timers.finish().await;
                }
                return Err(e);
            }
        };

        info!(
            submitted = submissions.iter().map(|s| s.succeeded).sum::<u32>(),
            failed = failures.len(),
            pairs = snapshot.len(),
            "submit phase complete, verifying balances"
        );

        // Verify
        let phase_started = Instant::now();
        let pair_results = self.verify_all(&spec, &snapshot).await;
        self.record_phase(RunPhase::Verify, phase_started);

        let mut pairs = Vec::with_capacity(pair_results.len());
        for result in pair_results {
            match result {
                Ok(pair) => {
                    failures.extend(pair_failure(&pair));
                    pairs.push(pair);
                }
                Err(failure) => failures.push(failure),
            }
        }

        let perturbations = match timers {
            Some(timers) => {
                let (records, perturbation_failures) = timers.finish().await;
                failures.extend(perturbation_failures);
                records
            }
            None => Vec::new(),
        };

        let report = RunReport {
            run_id: run_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            routes: plans.into_iter().map(|p| p.route).collect(),
            submissions,
            pairs,
            perturbations,
            failures,
        };

        if report.is_success() {
            info!(pairs = report.pairs.len(), "bridging run succeeded");
        } else {
            error!(failures = report.failures.len(), "bridging run failed");
        }

        Ok(report)
    }

    /// Validate the run and resolve the per-route credited amount
    fn plan(&self, spec: &RunSpec) -> Result<Vec<RoutePlan>, OrchestratorError> {
        if spec.senders.is_empty() {
            return Err(OrchestratorError::invalid_spec("no senders"));
        }
        if spec.receivers.is_empty() {
            return Err(OrchestratorError::invalid_spec("no receivers"));
        }
        if spec.repeat == 0 {
            return Err(OrchestratorError::invalid_spec("repeat must be at least 1"));
        }
        if spec.amount.is_zero() {
            return Err(OrchestratorError::invalid_spec("amount must be positive"));
        }

        let has_perturbation = spec.perturbation.as_ref().is_some_and(|p| !p.is_empty());
        if has_perturbation && self.validators.is_none() {
            return Err(OrchestratorError::invalid_spec(
                "perturbation scheduled without validator control",
            ));
        }

        let routes = spec.routes();
        if routes.is_empty() {
            return Err(OrchestratorError::invalid_spec("routing table yields no routes"));
        }

        routes
            .into_iter()
            .map(|route| -> Result<RoutePlan, OrchestratorError> {
                let source = ledger(spec, &route.source)?;
                let destination = ledger(spec, &route.destination)?;
                let credited = source
                    .convert_to(spec.amount, destination, Rounding::Truncate)
                    .map_err(|source| OrchestratorError::Conversion {
                        route: route.to_string(),
                        source,
                    })?;

                if credited.is_zero() {
                    warn!(route = %route, amount = %spec.amount, "amount truncates to zero on destination");
                }

                Ok(RoutePlan { route, credited })
            })
            .collect()
    }

    /// Read the pre-run balance of every receiver on every destination chain
    async fn seed(&self, spec: &RunSpec) -> Result<ExpectedBalances, OrchestratorError> {
        let mut expected = ExpectedBalances::new();

        for chain_id in spec.destination_chains() {
            for receiver in &spec.receivers {
                let observed = self.read_balance(receiver, &chain_id).await?;
                debug!(receiver = %receiver, chain = %chain_id, balance = %observed, "pre-run balance");
                expected.seed(PairKey::new(receiver.clone(), chain_id.clone()), observed);
            }
        }

        Ok(expected)
    }

    async fn read_balance(
        &self,
        account: &Account,
        chain_id: &str,
    ) -> Result<Uint256, OrchestratorError> {
        let policy = retry_policy(&self.config.pre_run);
        let balances = self.balances.as_ref();
        let metrics = self.metrics.as_deref();

        let result = execute_with_retry(&policy, &self.cancel, move |_| async move {
            let result = balances.get_balance(account, chain_id).await;
            if let Some(metrics) = metrics {
                metrics.record_balance_query(chain_id, result.is_ok());
            }
            result
        })
        .await;

        result.map_err(|e| match e {
            RetryError::Cancelled { .. } => OrchestratorError::Cancelled { phase: "seed" },
            RetryError::Timeout { attempts, last } => OrchestratorError::PreRunBalance {
                pair: PairKey::new(account.clone(), chain_id).to_string(),
                attempts,
                reason: last.to_string(),
            },
        })
    }

    async fn submit_all(
        &self,
        spec: &RunSpec,
        plans: &[RoutePlan],
    ) -> Vec<Result<SubmitTaskResult, RunFailure>> {
        let mut handles = Vec::new();

        for sender in &spec.senders {
            for plan in plans {
                let task = SubmitTask {
                    submitter: self.submitter.clone(),
                    sender: sender.clone(),
                    route: plan.route.clone(),
                    credited: plan.credited,
                    receivers: spec.receivers.clone(),
                    amount: spec.amount,
                    metadata: spec.metadata.clone(),
                    repeat: spec.repeat,
                    cancel: self.cancel.clone(),
                    metrics: self.metrics.clone(),
                };
                let name = format!("submit {} on {}", sender, plan.route);
                handles.push((name, tokio::spawn(task.run().in_current_span())));
            }
        }

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(joined, task)| {
                joined.map_err(|e| {
                    error!(task = %task, error = %e, "submit task failed");
                    RunFailure::Task {
                        task,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    async fn verify_all(
        &self,
        spec: &RunSpec,
        snapshot: &ExpectedSnapshot,
    ) -> Vec<Result<PairReport, RunFailure>> {
        let convergence = retry_policy(&spec.convergence);
        let no_activity = spec
            .expect_no_further_activity
            .then(|| retry_policy(&spec.no_activity));

        let mut names = Vec::with_capacity(snapshot.len());
        let mut handles = Vec::with_capacity(snapshot.len());

        for (pair, expected) in snapshot.iter() {
            let task = VerifyTask {
                balances: self.balances.clone(),
                pair: pair.clone(),
                expected: *expected,
                convergence,
                no_activity,
                cancel: self.cancel.clone(),
                metrics: self.metrics.clone(),
            };
            names.push(format!("verify {pair}"));
            handles.push(tokio::spawn(task.run().in_current_span()));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(joined, task)| {
                joined.map_err(|e| {
                    error!(task = %task, error = %e, "verify task failed");
                    RunFailure::Task {
                        task,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    fn record_phase(&self, phase: RunPhase, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_phase_duration(phase, started.elapsed());
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SINGLE-ROUTE HELPERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submit one transfer and wait for the receiver to hold exactly the
    /// pre-run balance plus the converted amount
    pub async fn execute_single(
        &self,
        source: &Ledger,
        destination: &Ledger,
        sender: &Account,
        receiver: &Account,
        amount: Uint256,
    ) -> Result<PollOutcome, OrchestratorError> {
        let credited = credited_amount(source, destination, amount)?;
        let prior = self.read_balance(receiver, &destination.chain_id).await?;

        let route = ChainRoute::new(source.chain_id.clone(), destination.chain_id.clone());
        self.submit_once(&route, sender, vec![receiver.clone()], amount)
            .await?;

        let expected = checked_add(prior, credited, receiver, destination)?;
        Ok(self.wait_for(receiver, &destination.chain_id, expected).await)
    }

    /// Transfer to self `instances` times, waiting for each to settle before
    /// submitting the next
    ///
    /// Stops at the first instance that does not converge.
    pub async fn execute_one_by_one(
        &self,
        instances: u32,
        account: &Account,
        source: &Ledger,
        destination: &Ledger,
        amount: Uint256,
    ) -> Result<Vec<PollOutcome>, OrchestratorError> {
        let mut outcomes = Vec::with_capacity(instances as usize);

        for instance in 1..=instances {
            let outcome = self
                .execute_single(source, destination, account, account, amount)
                .await?;
            let converged = outcome.is_converged();
            outcomes.push(outcome);

            if !converged {
                warn!(instance, instances, "transfer did not converge, stopping");
                break;
            }
            debug!(instance, instances, "transfer converged");
        }

        Ok(outcomes)
    }

    /// Submit `instances` transfers to self back to back, then wait once for
    /// their sum
    pub async fn execute_wait_after_submits(
        &self,
        instances: u32,
        account: &Account,
        source: &Ledger,
        destination: &Ledger,
        amount: Uint256,
    ) -> Result<PollOutcome, OrchestratorError> {
        let credited = credited_amount(source, destination, amount)?;
        let prior = self.read_balance(account, &destination.chain_id).await?;
        let route = ChainRoute::new(source.chain_id.clone(), destination.chain_id.clone());

        for instance in 1..=instances {
            if self.cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled { phase: "submit" });
            }
            self.submit_once(&route, account, vec![account.clone()], amount)
                .await?;
            debug!(instance, instances, "transfer submitted");
        }

        let total = credited
            .checked_mul(Uint256::from(instances))
            .map_err(|_| OrchestratorError::ExpectedOverflow {
                pair: PairKey::new(account.clone(), destination.chain_id.clone()).to_string(),
            })?;
        let expected = checked_add(prior, total, account, destination)?;

        Ok(self.wait_for(account, &destination.chain_id, expected).await)
    }

    async fn submit_once(
        &self,
        route: &ChainRoute,
        sender: &Account,
        receivers: Vec<Account>,
        amount: Uint256,
    ) -> Result<String, OrchestratorError> {
        let request = TransferRequest::new(route, sender.clone(), receivers, amount);
        let result = self.submitter.submit(&request).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_submission(&route.to_string(), result.is_ok());
        }

        let tx_hash = result?;
        info!(sender = %sender, route = %route, tx_hash = %tx_hash, "transfer submitted");
        Ok(tx_hash)
    }

    async fn wait_for(&self, account: &Account, chain_id: &str, expected: Uint256) -> PollOutcome {
        wait_for_exact_amount(
            self.balances.as_ref(),
            account,
            chain_id,
            expected,
            &retry_policy(&self.config.convergence),
            &self.cancel,
            self.metrics.as_deref(),
        )
        .await
    }
}

fn ledger<'a>(spec: &'a RunSpec, chain_id: &str) -> Result<&'a Ledger, OrchestratorError> {
    spec.ledger(chain_id)
        .ok_or_else(|| OrchestratorError::invalid_spec(format!("unknown chain {chain_id}")))
}

fn credit_submissions(
    mut expected: ExpectedBalances,
    submissions: &[SubmissionSummary],
    receivers: &[Account],
) -> Result<ExpectedSnapshot, OrchestratorError> {
    for summary in submissions {
        let total = summary
            .credited_per_transfer
            .checked_mul(Uint256::from(summary.succeeded))
            .map_err(|_| OrchestratorError::ExpectedOverflow {
                pair: format!("{} on {}", summary.sender, summary.route),
            })?;

        for receiver in receivers {
            let key = PairKey::new(receiver.clone(), summary.route.destination.clone());
            expected.credit(&key, total)?;
        }
    }

    Ok(expected.freeze())
}

fn credited_amount(
    source: &Ledger,
    destination: &Ledger,
    amount: Uint256,
) -> Result<Uint256, OrchestratorError> {
    source
        .convert_to(amount, destination, Rounding::Truncate)
        .map_err(|e| OrchestratorError::Conversion {
            route: format!("{}->{}", source.chain_id, destination.chain_id),
            source: e,
        })
}

fn checked_add(
    prior: Uint256,
    credited: Uint256,
    account: &Account,
    destination: &Ledger,
) -> Result<Uint256, OrchestratorError> {
    prior
        .checked_add(credited)
        .map_err(|_| OrchestratorError::ExpectedOverflow {
            pair: PairKey::new(account.clone(), destination.chain_id.clone()).to_string(),
        })
}

fn pair_failure(report: &PairReport) -> Option<RunFailure> {
    match &report.convergence {
        PollOutcome::Converged { .. } => {}
        PollOutcome::TimedOut {
            expected,
            last_observed,
            last_error,
            attempts,
        } => {
            return Some(RunFailure::NotConverged {
                pair: report.pair.clone(),
                expected: *expected,
                last_observed: *last_observed,
                reason: last_error
                    .clone()
                    .unwrap_or_else(|| format!("no match after {attempts} attempts")),
            });
        }
        PollOutcome::Cancelled { .. } => {
            return Some(RunFailure::Cancelled {
                pair: report.pair.clone(),
            });
        }
    }

    match &report.no_activity {
        Some(QuietOutcome::UnexpectedActivity { expected, observed }) => {
            Some(RunFailure::UnexpectedActivity {
                pair: report.pair.clone(),
                expected: *expected,
                observed: *observed,
            })
        }
        Some(QuietOutcome::Cancelled { .. }) => Some(RunFailure::Cancelled {
            pair: report.pair.clone(),
        }),
        _ => None,
    }
}

/// Sequential submissions of one sender on one route
struct SubmitTask {
    submitter: Arc<dyn TransferSubmitter>,
    sender: Account,
    route: ChainRoute,
    credited: Uint256,
    receivers: Vec<Account>,
    amount: Uint256,
    metadata: Option<Binary>,
    repeat: u32,
    cancel: CancellationToken,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SubmitTask {
    async fn run(self) -> SubmitTaskResult {
        let route_label = self.route.to_string();
        let mut tx_hashes = Vec::new();
        let mut failure = None;

        for iteration in 1..=self.repeat {
            if self.cancel.is_cancelled() {
                warn!(sender = %self.sender, route = %self.route, iteration, "run cancelled, no further submissions");
                break;
            }

            let request = TransferRequest::new(
                &self.route,
                self.sender.clone(),
                self.receivers.clone(),
                self.amount,
            )
            .with_metadata(self.metadata.clone());

            let result = self.submitter.submit(&request).await;
            if let Some(metrics) = &self.metrics {
                metrics.record_submission(&route_label, result.is_ok());
            }

            match result {
                Ok(tx_hash) => {
                    info!(
                        sender = %self.sender,
                        route = %self.route,
                        iteration,
                        tx_hash = %tx_hash,
                        "transfer submitted"
                    );
                    tx_hashes.push(tx_hash);
                }
                Err(e) => {
                    error!(
                        sender = %self.sender,
                        route = %self.route,
                        iteration,
                        error = %e,
                        "transfer submission failed"
                    );
                    failure = Some(RunFailure::Submission {
                        sender: self.sender.clone(),
                        route: self.route.clone(),
                        iteration,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        SubmitTaskResult {
            summary: SubmissionSummary {
                sender: self.sender,
                route: self.route,
                succeeded: tx_hashes.len() as u32,
                tx_hashes,
                credited_per_transfer: self.credited,
            },
            failure,
        }
    }
}

/// Convergence (and optional quiet check) of one receiver on one chain
struct VerifyTask {
    balances: Arc<dyn BalanceQuery>,
    pair: PairKey,
    expected: Uint256,
    convergence: RetryPolicy,
    no_activity: Option<RetryPolicy>,
    cancel: CancellationToken,
    metrics: Option<Arc<MetricsCollector>>,
}

impl VerifyTask {
    async fn run(self) -> PairReport {
        let metrics = self.metrics.as_deref();
        let chain_id = self.pair.chain_id.as_str();

        if let Some(metrics) = metrics {
            metrics.record_pair_polling();
        }
        debug!(pair = %self.pair, expected = %self.expected, state = ?PairState::Polling, "verifying");

        let convergence = wait_for_exact_amount(
            self.balances.as_ref(),
            &self.pair.receiver,
            chain_id,
            self.expected,
            &self.convergence,
            &self.cancel,
            metrics,
        )
        .await;

        let no_activity = match (&convergence, &self.no_activity) {
            (PollOutcome::Converged { .. }, Some(policy)) => Some(
                wait_for_greater_amount(
                    self.balances.as_ref(),
                    &self.pair.receiver,
                    chain_id,
                    self.expected,
                    policy,
                    &self.cancel,
                    metrics,
                )
                .await,
            ),
            _ => None,
        };

        let state = PairState::from(&convergence);
        let outcome = match &no_activity {
            Some(quiet) if !quiet.is_quiet() => quiet.label(),
            _ => convergence.label(),
        };

        if let Some(metrics) = metrics {
            metrics.record_pair_outcome(chain_id, outcome);
        }

        match &convergence {
            PollOutcome::Converged { attempts, .. } => {
                info!(pair = %self.pair, expected = %self.expected, attempts, outcome, "pair verified");
            }
            PollOutcome::TimedOut { last_observed, .. } => {
                warn!(
                    pair = %self.pair,
                    expected = %self.expected,
                    last_observed = ?last_observed,
                    "pair did not converge"
                );
            }
            PollOutcome::Cancelled { .. } => {
                warn!(pair = %self.pair, "pair verification cancelled");
            }
        }

        PairReport {
            pair: self.pair,
            expected: self.expected,
            state,
            convergence,
            no_activity,
        }
    }
}
