use async_trait::async_trait;
use bridge_probe_config::{validate_config, ConfigLoader};
use bridge_probe_orchestrator::{
    BalanceQuery, BridgingOrchestrator, ClientError, OrchestratorConfig, PairKey, PollOutcome,
    RunFailure, SimulatedBridge, SimulatedBridgeConfig, TransferSubmitter, ValidatorControl,
};
use bridge_probe_retry::{execute_with_retry, CancellationToken, RetryPolicy};
use bridge_probe_types::{
    Account, ChainRoute, Ledger, PollSettings, Rounding, RunSpec, TransferRequest, TxHash,
};
use cosmwasm_std::Uint256;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════
// MOCK IMPLEMENTATIONS FOR TESTING
// ═══════════════════════════════════════════════════════════════════════════

/// Mock bridge that settles instantly, optionally losing every n-th transfer
#[derive(Clone)]
struct MockBridge {
    ledgers: HashMap<String, Ledger>,
    balances: Arc<Mutex<HashMap<(Account, String), Uint256>>>,
    requests: Arc<Mutex<Vec<TransferRequest>>>,
    drop_every: Option<u32>,
    seen: Arc<AtomicU32>,
    /// Reject this sender's n-th request
    reject: Option<(Account, u32)>,
    latency: Duration,
    per_sender: Arc<Mutex<HashMap<Account, u32>>>,
    in_flight: Arc<Mutex<HashMap<Account, u32>>>,
    sender_overlaps: Arc<AtomicU32>,
    active: Arc<AtomicU32>,
    peak_active: Arc<AtomicU32>,
}

impl MockBridge {
    fn new(ledgers: &[Ledger]) -> Self {
        Self {
            ledgers: ledgers
                .iter()
                .map(|l| (l.chain_id.clone(), l.clone()))
                .collect(),
            balances: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            drop_every: None,
            seen: Arc::new(AtomicU32::new(0)),
            reject: None,
            latency: Duration::ZERO,
            per_sender: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            sender_overlaps: Arc::new(AtomicU32::new(0)),
            active: Arc::new(AtomicU32::new(0)),
            peak_active: Arc::new(AtomicU32::new(0)),
        }
    }

    fn rejecting(mut self, sender: &str, nth: u32) -> Self {
        self.reject = Some((Account::new(sender), nth));
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn enter(&self, sender: &Account) -> u32 {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(active, Ordering::SeqCst);

        let mut in_flight = self.in_flight.lock().unwrap();
        let count = in_flight.entry(sender.clone()).or_default();
        if *count > 0 {
            self.sender_overlaps.fetch_add(1, Ordering::SeqCst);
        }
        *count += 1;

        let mut per_sender = self.per_sender.lock().unwrap();
        let nth = per_sender.entry(sender.clone()).or_default();
        *nth += 1;
        *nth
    }

    fn leave(&self, sender: &Account) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        if let Some(count) = self.in_flight.lock().unwrap().get_mut(sender) {
            *count -= 1;
        }
    }

    fn dropping_every(mut self, n: u32) -> Self {
        self.drop_every = Some(n);
        self
    }

    fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferSubmitter for MockBridge {
    async fn submit(&self, request: &TransferRequest) -> Result<TxHash, ClientError> {
        let nth = self.enter(&request.sender);
        tokio::time::sleep(self.latency).await;
        self.leave(&request.sender);

        if self
            .reject
            .as_ref()
            .is_some_and(|(sender, n)| sender == &request.sender && *n == nth)
        {
            return Err(ClientError::Submission(format!("{} rejected", request.sender)));
        }

        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        if self.drop_every.is_some_and(|every| n % every == 0) {
            return Ok(format!("lost-{n}"));
        }

        let source = &self.ledgers[&request.source];
        let destination = &self.ledgers[&request.destination];
        let credited = source
            .convert_to(request.amount, destination, Rounding::Truncate)
            .map_err(|e| ClientError::Submission(e.to_string()))?;

        let mut balances = self.balances.lock().unwrap();
        for receiver in &request.receivers {
            let balance = balances
                .entry((receiver.clone(), request.destination.clone()))
                .or_insert_with(Uint256::zero);
            *balance += credited;
        }

        Ok(format!("tx-{n}"))
    }
}

#[async_trait]
impl BalanceQuery for MockBridge {
    async fn get_balance(&self, account: &Account, chain_id: &str) -> Result<Uint256, ClientError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(account.clone(), chain_id.to_string()))
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ValidatorControl for MockBridge {
    async fn stop_validator(&self, _index: usize) -> Result<(), ClientError> {
        Ok(())
    }

    async fn start_validator(&self, _index: usize, _resync: bool) -> Result<(), ClientError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

fn ledgers() -> Vec<Ledger> {
    vec![
        Ledger::new("prime", 6),
        Ledger::new("vector", 6),
        Ledger::new("nexus", 18),
    ]
}

fn fast() -> PollSettings {
    PollSettings::new(20, Duration::from_millis(10))
}

fn spec(senders: &[&str], receivers: &[&str], routing: &[(&str, &[&str])]) -> RunSpec {
    let routing = routing
        .iter()
        .map(|(source, destinations)| {
            (
                source.to_string(),
                destinations.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect();

    RunSpec::new(
        senders.iter().map(|s| Account::new(*s)).collect(),
        receivers.iter().map(|r| Account::new(*r)).collect(),
        ledgers(),
        routing,
        Uint256::from(10u128),
    )
    .with_convergence(fast())
}

fn orchestrator_for<T>(bridge: Arc<T>) -> BridgingOrchestrator
where
    T: TransferSubmitter + BalanceQuery + ValidatorControl + 'static,
{
    BridgingOrchestrator::builder()
        .with_bridge(bridge)
        .with_config(
            OrchestratorConfig::default()
                .with_pre_run(PollSettings::new(3, Duration::from_millis(5)))
                .with_convergence(fast()),
        )
        .build()
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// INTEGRATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_full_run_against_mock_bridge() {
    let bridge = Arc::new(MockBridge::new(&ledgers()));
    let orchestrator = orchestrator_for(bridge.clone());

    let report = orchestrator
        .execute(
            spec(&["alice", "dave"], &["bob", "carol"], &[("prime", &["vector", "nexus"])])
                .with_repeat(3),
        )
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.total_submitted(), 12);

    // every request carries every receiver
    let requests = bridge.requests();
    assert_eq!(requests.len(), 12);
    assert!(requests.iter().all(|r| r.receivers.len() == 2));

    let bob_vector = report
        .pair(&PairKey::new(Account::new("bob"), "vector"))
        .unwrap();
    assert_eq!(bob_vector.expected, Uint256::from(60u128));

    let carol_nexus = report
        .pair(&PairKey::new(Account::new("carol"), "nexus"))
        .unwrap();
    assert_eq!(carol_nexus.expected, Uint256::from(60_000_000_000_000u128));
}

#[tokio::test]
async fn test_lost_transfer_detected() {
    let bridge = Arc::new(MockBridge::new(&ledgers()).dropping_every(3));
    let orchestrator = orchestrator_for(bridge);

    let report = orchestrator
        .execute(spec(&["alice"], &["bob"], &[("prime", &["vector"])]).with_repeat(3))
        .await
        .unwrap();

    let error = report.into_result().unwrap_err();
    assert_eq!(error.failures.len(), 1);
    match &error.failures[0] {
        RunFailure::NotConverged {
            pair,
            expected,
            last_observed,
            ..
        } => {
            assert_eq!(pair, &PairKey::new(Account::new("bob"), "vector"));
            assert_eq!(*expected, Uint256::from(30u128));
            assert_eq!(*last_observed, Some(Uint256::from(20u128)));
        }
        other => panic!("unexpected failure {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_sender_does_not_affect_siblings() {
    let bridge = Arc::new(MockBridge::new(&ledgers()).rejecting("alice", 2));
    let orchestrator = orchestrator_for(bridge.clone());

    let report = orchestrator
        .execute(spec(&["alice", "dave"], &["bob"], &[("prime", &["vector"])]).with_repeat(3))
        .await
        .unwrap();

    // alice stops after her second request, dave sends all three
    assert_eq!(bridge.requests().len(), 4);
    assert_eq!(report.total_submitted(), 4);

    let alice = report
        .submissions
        .iter()
        .find(|s| s.sender == Account::new("alice"))
        .unwrap();
    let dave = report
        .submissions
        .iter()
        .find(|s| s.sender == Account::new("dave"))
        .unwrap();
    assert_eq!(alice.succeeded, 1);
    assert_eq!(dave.succeeded, 3);

    let pair = report
        .pair(&PairKey::new(Account::new("bob"), "vector"))
        .unwrap();
    assert_eq!(pair.expected, Uint256::from(40u128));
    assert!(pair.convergence.is_converged());

    assert_eq!(report.failures.len(), 1);
    match &report.failures[0] {
        RunFailure::Submission {
            sender,
            route,
            iteration,
            ..
        } => {
            assert_eq!(sender, &Account::new("alice"));
            assert_eq!(route, &ChainRoute::new("prime", "vector"));
            assert_eq!(*iteration, 2);
        }
        other => panic!("unexpected failure {other:?}"),
    }
}

#[tokio::test]
async fn test_sender_requests_are_sequential_and_ordered() {
    let bridge = Arc::new(MockBridge::new(&ledgers()).with_latency(Duration::from_millis(20)));
    let orchestrator = orchestrator_for(bridge.clone());

    let report = orchestrator
        .execute(spec(&["alice", "dave"], &["bob"], &[("prime", &["vector"])]).with_repeat(4))
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);

    // senders run side by side, but one sender never has two requests in flight
    assert!(bridge.peak_active.load(Ordering::SeqCst) >= 2);
    assert_eq!(bridge.sender_overlaps.load(Ordering::SeqCst), 0);

    for summary in &report.submissions {
        let sequence: Vec<u32> = summary
            .tx_hashes
            .iter()
            .map(|hash| hash.trim_start_matches("tx-").parse().unwrap())
            .collect();
        assert_eq!(sequence.len(), 4);
        assert!(sequence.windows(2).all(|w| w[0] < w[1]), "{sequence:?}");
    }
}

#[tokio::test]
async fn test_metadata_attached_to_every_request() {
    let bridge = Arc::new(MockBridge::new(&ledgers()));
    let orchestrator = orchestrator_for(bridge.clone());
    let metadata = cosmwasm_std::Binary::from(b"probe".as_slice());

    orchestrator
        .execute(
            spec(&["alice"], &["bob"], &[("vector", &["prime"])])
                .with_repeat(2)
                .with_metadata(metadata.clone()),
        )
        .await
        .unwrap();

    let requests = bridge.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.metadata.as_ref() == Some(&metadata)));
}

#[tokio::test]
async fn test_sample_config_runs_against_simulated_bridge() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/local.toml");
    let mut config = ConfigLoader::from_file(&path).unwrap();
    validate_config(&config).unwrap();

    // keep the run short
    config.polling.interval_ms = 20;
    config.no_activity.max_attempts = 3;
    config.no_activity.interval_ms = 10;
    config.simulation.settlement_delay_ms = 30;

    let bridge = Arc::new(SimulatedBridge::new(
        config.ledgers(),
        SimulatedBridgeConfig {
            settlement_delay: config.settlement_delay(),
            validators: config.simulation.validators,
            quorum: config.simulation.quorum,
        },
    ));

    let report = orchestrator_for(bridge)
        .execute(config.to_run_spec().unwrap())
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.routes.len(), 3);
    // two receivers on three destination chains
    assert_eq!(report.pairs.len(), 6);
    assert!(report.pairs.iter().all(|p| p.no_activity.is_some()));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["pairs"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_retry_executor_with_flaky_balance_source() {
    let bridge = &MockBridge::new(&ledgers());
    let calls = &AtomicU32::new(0);
    let bob = &Account::new("bob");

    let result = execute_with_retry(
        &RetryPolicy::new(5, Duration::from_millis(5)),
        &CancellationToken::new(),
        move |_| async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                return Err(ClientError::Transport("connection reset".to_string()));
            }
            bridge.get_balance(bob, "prime").await
        },
    )
    .await;

    assert_eq!(result.unwrap(), Uint256::zero());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_single_route_helpers_against_mock_bridge() {
    let bridge = Arc::new(MockBridge::new(&ledgers()));
    let orchestrator = orchestrator_for(bridge.clone());
    let prime = Ledger::new("prime", 6);
    let nexus = Ledger::new("nexus", 18);
    let alice = Account::new("alice");

    let outcomes = orchestrator
        .execute_one_by_one(2, &alice, &nexus, &prime, Uint256::from(1_500_000_000_000u128))
        .await
        .unwrap();
    assert!(outcomes.iter().all(PollOutcome::is_converged));

    let outcome = orchestrator
        .execute_wait_after_submits(3, &alice, &nexus, &prime, Uint256::from(1_500_000_000_000u128))
        .await
        .unwrap();
    assert!(outcome.is_converged());

    // 5 transfers of 1.5 micro-units, each truncated to 1
    assert_eq!(
        bridge.get_balance(&alice, "prime").await.unwrap(),
        Uint256::from(5u128)
    );
}
