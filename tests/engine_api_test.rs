//! Engine behavior through the public API: fresh runs, resumed runs, and
//! aborted runs against a mock broadcaster.

use std::cell::RefCell;
use std::sync::Mutex;

use cairn::artifacts::ContractArtifact;
use cairn::chain::{ActionRequest, Broadcaster, PendingTx};
use cairn::config::DeployConfig;
use cairn::engine::MigrationEngine;
use cairn::error::CairnError;
use cairn::state::{MigrationState, StepRecord};
use cairn::steps::StepDefinition;
use ethers_core::abi::Token;
use ethers_core::types::{Address, H256};

/// Broadcaster that fabricates deterministic handles and counts
/// submissions.
struct MockBroadcaster {
    submitted: Mutex<Vec<String>>,
}

impl MockBroadcaster {
    fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submissions(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Broadcaster for MockBroadcaster {
    fn submit(&self, action: &ActionRequest) -> cairn::Result<PendingTx> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(action.describe());
        let n = submitted.len() as u8;
        Ok(PendingTx {
            hash: H256::repeat_byte(n),
            contract_address: match action {
                ActionRequest::Deploy { .. } => Some(Address::repeat_byte(n)),
                ActionRequest::Call { .. } => None,
            },
        })
    }
}

fn sample_config() -> DeployConfig {
    serde_yaml::from_str(
        r#"
network: test
rpc_url: http://localhost:8545
from: "0x00000000000000000000000000000000000000aa"
owner: "0x00000000000000000000000000000000000000bb"
currency_label: USD
secondary_factory: "0x00000000000000000000000000000000000000cc"
gas_price: 1000000000
"#,
    )
    .unwrap()
}

fn artifact(name: &str) -> ContractArtifact {
    ContractArtifact {
        name: name.into(),
        bytecode: vec![0x60, 0x80],
        abi: serde_json::json!([]),
    }
}

/// Step A: no dependencies.
fn step_a() -> StepDefinition {
    StepDefinition::deploy("a", "Deploy A", &artifact("A"), |_, _| Ok(vec![]))
}

/// Step B: constructor takes A's recorded address.
fn step_b() -> StepDefinition {
    StepDefinition::deploy("b", "Deploy B", &artifact("B"), |state, _| {
        Ok(vec![Token::Address(state.require_address("b", "a")?)])
    })
}

#[test]
fn fresh_deploy_runs_both_steps() {
    let config = sample_config();
    let broadcaster = MockBroadcaster::new();
    let hook_states: RefCell<Vec<Vec<String>>> = RefCell::new(Vec::new());

    let engine = MigrationEngine::new(
        vec![step_a(), step_b()],
        MigrationState::new(),
        &config,
        &broadcaster,
        Box::new(|state| {
            hook_states
                .borrow_mut()
                .push(state.keys().map(String::from).collect());
            Ok(())
        }),
    );

    let batches: Vec<_> = engine.map(|b| b.unwrap()).collect();
    assert_eq!(batches.len(), 2);
    assert!(!batches[0].skipped);
    assert!(!batches[1].skipped);

    // Persistence fired once per step, with monotonically more complete
    // state: {a}, then {a, b}.
    let states = hook_states.borrow();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0], vec!["a"]);
    assert_eq!(states[1].len(), 2);

    assert_eq!(broadcaster.submissions().len(), 2);
}

#[test]
fn resumed_deploy_skips_recorded_prefix() {
    let config = sample_config();
    let broadcaster = MockBroadcaster::new();

    let mut initial = MigrationState::new();
    initial.record(
        "a",
        StepRecord {
            address: Some(Address::repeat_byte(0x77)),
            ..Default::default()
        },
    );

    let engine = MigrationEngine::new(
        vec![step_a(), step_b()],
        initial,
        &config,
        &broadcaster,
        Box::new(|_| Ok(())),
    );

    let batches: Vec<_> = engine.map(|b| b.unwrap()).collect();

    // Step A is replayed without submission; only step B submits.
    assert!(batches[0].skipped);
    assert!(!batches[1].skipped);
    let submitted: Vec<_> = batches.iter().filter(|b| !b.skipped).collect();
    assert_eq!(submitted.len(), 1);
    assert_eq!(broadcaster.submissions(), vec!["deploy B"]);
}

#[test]
fn resumed_step_feeds_recorded_address_to_dependents() {
    let config = sample_config();
    let broadcaster = MockBroadcaster::new();
    let captured = std::sync::Arc::new(Mutex::new(None::<Address>));

    let mut initial = MigrationState::new();
    initial.record(
        "a",
        StepRecord {
            address: Some(Address::repeat_byte(0x77)),
            ..Default::default()
        },
    );

    let capture = captured.clone();
    let step_b = StepDefinition::deploy("b", "Deploy B", &artifact("B"), move |state, _| {
        let address = state.require_address("b", "a")?;
        *capture.lock().unwrap() = Some(address);
        Ok(vec![Token::Address(address)])
    });

    let engine = MigrationEngine::new(
        vec![step_a(), step_b],
        initial,
        &config,
        &broadcaster,
        Box::new(|_| Ok(())),
    );
    for batch in engine {
        batch.unwrap();
    }

    assert_eq!(*captured.lock().unwrap(), Some(Address::repeat_byte(0x77)));
}

#[test]
fn idempotent_resume_submits_nothing() {
    let config = sample_config();

    // First run to completion, capturing the final state.
    let broadcaster = MockBroadcaster::new();
    let mut engine = MigrationEngine::new(
        vec![step_a(), step_b()],
        MigrationState::new(),
        &config,
        &broadcaster,
        Box::new(|_| Ok(())),
    );
    while let Some(batch) = engine.next() {
        batch.unwrap();
    }
    let persisted = engine.into_state();
    assert_eq!(persisted.len(), 2);

    // Second run against the persisted state: every step skips.
    let broadcaster2 = MockBroadcaster::new();
    let engine2 = MigrationEngine::new(
        vec![step_a(), step_b()],
        persisted,
        &config,
        &broadcaster2,
        Box::new(|_| Ok(())),
    );
    let batches: Vec<_> = engine2.map(|b| b.unwrap()).collect();

    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.skipped));
    assert!(broadcaster2.submissions().is_empty());
}

#[test]
fn visit_order_is_identical_for_fresh_and_resumed_runs() {
    let config = sample_config();

    let broadcaster = MockBroadcaster::new();
    let mut engine = MigrationEngine::new(
        vec![step_a(), step_b()],
        MigrationState::new(),
        &config,
        &broadcaster,
        Box::new(|_| Ok(())),
    );
    let mut fresh_keys = Vec::new();
    while let Some(batch) = engine.next() {
        fresh_keys.push(batch.unwrap().key);
    }
    let persisted = engine.into_state();

    let broadcaster2 = MockBroadcaster::new();
    let engine2 = MigrationEngine::new(
        vec![step_a(), step_b()],
        persisted,
        &config,
        &broadcaster2,
        Box::new(|_| Ok(())),
    );
    let resumed_keys: Vec<_> = engine2.map(|b| b.unwrap().key).collect();

    assert_eq!(fresh_keys, resumed_keys);
    assert_eq!(fresh_keys, vec!["a", "b"]);
}

#[test]
fn aborted_mid_run_keeps_completed_prefix() {
    let config = sample_config();
    let broadcaster = MockBroadcaster::new();

    // Step B requires a key nothing records, simulating corrupted state.
    let broken_b = StepDefinition::deploy("b", "Deploy B", &artifact("B"), |state, _| {
        Ok(vec![Token::Address(state.require_address("b", "missing")?)])
    });

    let mut engine = MigrationEngine::new(
        vec![step_a(), broken_b],
        MigrationState::new(),
        &config,
        &broadcaster,
        Box::new(|_| Ok(())),
    );

    engine.next().unwrap().unwrap();
    let err = engine.next().unwrap().unwrap_err();
    assert!(matches!(err, CairnError::MissingPrerequisite { .. }));
    assert!(engine.next().is_none());

    // The failure left step A's record intact and observable.
    let state = engine.state();
    assert!(state.is_recorded("a"));
    assert!(!state.is_recorded("b"));
    assert_eq!(broadcaster.submissions(), vec!["deploy A"]);
}

#[test]
fn resume_through_a_persisted_state_file() {
    let config = sample_config();
    let temp = tempfile::TempDir::new().unwrap();
    let state_path = temp.path().join("migration-state.yml");

    // First run persists through the real state file after every step.
    let broadcaster = MockBroadcaster::new();
    let path = state_path.clone();
    let engine = MigrationEngine::new(
        vec![step_a(), step_b()],
        MigrationState::new(),
        &config,
        &broadcaster,
        Box::new(move |state| state.save(&path)),
    );
    for batch in engine {
        batch.unwrap();
    }

    // A new process would reload the file and skip everything.
    let reloaded = MigrationState::load(&state_path).unwrap();
    let broadcaster2 = MockBroadcaster::new();
    let engine2 = MigrationEngine::new(
        vec![step_a(), step_b()],
        reloaded,
        &config,
        &broadcaster2,
        Box::new(|_| Ok(())),
    );
    let batches: Vec<_> = engine2.map(|b| b.unwrap()).collect();

    assert!(batches.iter().all(|b| b.skipped));
    assert!(broadcaster2.submissions().is_empty());
}
