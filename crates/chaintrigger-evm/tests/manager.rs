//! End-to-end manager tests.
//!
//! Each test drives an [`EvmManager`] the way a transport would: build a
//! request, feed back a recorded node response from `fixtures/evm/`, and
//! check the emitted job-run requests and the cursor.

use std::sync::{Arc, Mutex};

use num_bigint::BigUint;
use serde_json::{json, Value};

use chaintrigger_core::{
    ChainManager, ConnectionMode, Cursor, FilterScope, ManagerConfig, ManagerError, ManagerPhase,
    SourcePingRecorder, SubscriptionConfig,
};
use chaintrigger_evm::{create_manager, Chain, EvmManager};

// ─── Helpers ──────────────────────────────────────────────────────────────────

const JOB_ID: &str = "4c7b7ffb66b344fbaa64995af81e355a";
const GENERIC_TOPIC: &str = "0xabababababababababababababababababababababababababababababababab";

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/evm");
    p.push(name);
    p
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("request is valid JSON")
}

fn generic_manager(chain: Chain, mode: ConnectionMode) -> EvmManager {
    let config = ManagerConfig::new(
        FilterScope::new(vec![], vec![GENERIC_TOPIC.into()]),
        mode,
        "test-node",
        "job-generic",
    );
    EvmManager::new(chain, config)
}

fn oracle_config(url: &str, accept_mock: bool) -> SubscriptionConfig {
    SubscriptionConfig::from_json_str(
        &json!({
            "job_id": JOB_ID,
            "endpoint_name": "test-node",
            "endpoint_url": url,
            "chain": "ethereum",
            "accept_mock_job_id": accept_mock,
        })
        .to_string(),
    )
    .unwrap()
}

/// Remembers every (endpoint, job) ping in arrival order.
#[derive(Default)]
struct RecordedPings(Mutex<Vec<(String, String)>>);

impl SourcePingRecorder for RecordedPings {
    fn record_ping(&self, endpoint: &str, job_id: &str) {
        self.0
            .lock()
            .unwrap()
            .push((endpoint.to_string(), job_id.to_string()));
    }
}

fn head_response(hex: &str) -> Vec<u8> {
    json!({"jsonrpc": "2.0", "id": 1, "result": hex})
        .to_string()
        .into_bytes()
}

// ─── Pull mode ────────────────────────────────────────────────────────────────

#[test]
fn health_check_bootstraps_cursor() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);

    let health = as_json(&m.build_health_check_request().unwrap());
    assert_eq!(health["method"], "eth_blockNumber");
    assert_eq!(health["jsonrpc"], "2.0");
    assert_eq!(health["id"], 1);

    m.parse_health_check_response(&head_response("0x10")).unwrap();
    assert_eq!(m.state().cursor(), &Cursor::at(16u32));

    let trigger = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(trigger["method"], "eth_getLogs");
    assert_eq!(trigger["params"][0]["fromBlock"], "0x10");
    assert_eq!(m.state().phase(), ManagerPhase::Streaming);
}

#[test]
fn health_check_rejects_bad_heads() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);

    let err = m.parse_health_check_response(&head_response("16")).unwrap_err();
    assert!(err.is_decode());
    let err = m
        .parse_health_check_response(br#"{"jsonrpc":"2.0","id":1,"result":16}"#)
        .unwrap_err();
    assert!(err.is_decode());
    let err = m
        .parse_health_check_response(br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#)
        .unwrap_err();
    assert!(matches!(err, ManagerError::Rpc(_)));
    for lenient in ["0x1_0", "0x+10"] {
        let err = m.parse_health_check_response(&head_response(lenient)).unwrap_err();
        assert!(err.is_decode(), "{lenient} accepted");
    }

    assert_eq!(m.state().cursor(), &Cursor::Unset);
}

#[test]
fn replies_with_unusual_ids_are_accepted() {
    for id in [json!(-1), json!(1.0), json!({"a": 1}), json!("req-1")] {
        let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
        let reply = json!({"jsonrpc": "2.0", "id": id, "result": "0x10"}).to_string();
        m.parse_health_check_response(reply.as_bytes()).unwrap();
        assert_eq!(m.state().cursor(), &Cursor::at(16u32));
    }
}

#[test]
fn head_beyond_u64_keeps_full_precision() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    let huge = "0x1000000000000000000000"; // 2^84
    m.parse_health_check_response(&head_response(huge)).unwrap();

    let expected = BigUint::from(1u32) << 84usize;
    assert_eq!(m.state().cursor().block(), Some(&expected));
    let trigger = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(trigger["params"][0]["fromBlock"], huge);
}

#[test]
fn cursor_moves_past_highest_block() {
    let config = ManagerConfig::new(
        FilterScope::new(vec![], vec![GENERIC_TOPIC.into()]),
        ConnectionMode::Pull,
        "test-node",
        "job-generic",
    )
    .with_cursor(Cursor::Latest);
    let mut m = EvmManager::new(Chain::Ethereum, config);
    let first = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(first["params"][0]["fromBlock"], "latest");

    let requests = m.parse_event_response(&fixture("getlogs-two-blocks.json")).unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].get("blockNumber"), Some(&json!("0x5")));
    assert_eq!(requests[1].get("blockNumber"), Some(&json!("0x7")));
    assert_eq!(requests[1].get("logIndex"), Some(&json!("0x2")));
    assert_eq!(requests[0].get("chain"), Some(&json!("ethereum")));
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));

    let next = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(next["params"][0]["fromBlock"], "0x8");
}

#[test]
fn health_check_never_rewinds() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    m.parse_event_response(&fixture("getlogs-two-blocks.json")).unwrap();
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));

    m.parse_health_check_response(&head_response("0x3")).unwrap();
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));
}

#[test]
fn removed_logs_are_dropped() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    let requests = m.parse_event_response(&fixture("getlogs-removed.json")).unwrap();

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("blockNumber"), Some(&json!("0x5")));
    assert_eq!(m.state().cursor(), &Cursor::at(6u32));
}

#[test]
fn malformed_payload_leaves_state_unchanged() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    m.parse_health_check_response(&head_response("0x10")).unwrap();
    let scope = m.state().scope().clone();

    for payload in [
        &b"{not json"[..],
        &b""[..],
        &br#"{"jsonrpc":"2.0","id":1,"result":"0x5"}"#[..],
        &br#"{"jsonrpc":"2.0","id":1}"#[..],
    ] {
        let err = m.parse_event_response(payload).unwrap_err();
        assert!(err.is_decode(), "expected decode error, got {err}");
        assert_eq!(m.state().cursor(), &Cursor::at(16u32));
        assert_eq!(m.state().scope(), &scope);
    }
}

#[test]
fn later_batch_with_older_blocks_never_rewinds() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    m.parse_event_response(&fixture("getlogs-two-blocks.json")).unwrap();
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));

    let stale = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": [
            {"address": "0x01", "topics": [GENERIC_TOPIC], "data": "0x", "blockNumber": "0x3"},
            {"address": "0x01", "topics": [GENERIC_TOPIC], "data": "0x", "blockNumber": "0x7"},
        ],
    });
    let requests = m.parse_event_response(stale.to_string().as_bytes()).unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));

    let next = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(next["params"][0]["fromBlock"], "0x8");
}

#[test]
fn logs_outside_address_scope_are_unmatched() {
    let config = ManagerConfig::new(
        FilterScope::new(vec!["0xDEAD000000000000000000000000000000000000".into()], vec![]),
        ConnectionMode::Pull,
        "test-node",
        "job-generic",
    );
    let mut m = EvmManager::new(Chain::Ethereum, config);
    let requests = m.parse_event_response(&fixture("getlogs-two-blocks.json")).unwrap();

    assert!(requests.is_empty());
    // observed, so the cursor still moves
    assert_eq!(m.state().cursor(), &Cursor::at(8u32));
}

#[test]
fn malformed_entry_does_not_poison_batch() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    let requests = m.parse_event_response(&fixture("getlogs-malformed.json")).unwrap();

    assert_eq!(requests.len(), 2);
    assert_eq!(m.state().cursor(), &Cursor::at(10u32));
}

#[test]
fn conflux_reads_epoch_numbers() {
    let mut m = generic_manager(Chain::Conflux, ConnectionMode::Pull);
    let trigger = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(trigger["method"], "cfx_getLogs");
    assert_eq!(trigger["params"][0]["fromEpoch"], "latest");

    let requests = m.parse_event_response(&fixture("conflux-getlogs.json")).unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("chain"), Some(&json!("conflux")));
    assert_eq!(requests[0].get("blockNumber"), Some(&json!("0x1f")));
    assert_eq!(m.state().cursor(), &Cursor::at(0x20u32));
}

// ─── Push mode ────────────────────────────────────────────────────────────────

#[test]
fn push_mode_has_no_health_check() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Push);
    assert!(m.build_health_check_request().is_none());
    m.parse_health_check_response(b"anything at all").unwrap();
    assert_eq!(m.state().cursor(), &Cursor::Unset);
}

#[test]
fn push_subscription_yields_oracle_request() {
    let mut m = create_manager(&oracle_config("wss://node.example/ws", false), None).unwrap();
    assert_eq!(m.state().mode(), ConnectionMode::Push);

    let subscribe = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(subscribe["method"], "eth_subscribe");
    assert_eq!(subscribe["params"][0], "logs");
    assert_eq!(
        subscribe["params"][1]["topics"],
        json!([["0xd8d7ecc4800d25fa53ce0372f13a416d98907a7ef3d8d3bdd79cf4fe75529c65"]])
    );

    let confirmed = m
        .parse_event_response(br#"{"jsonrpc":"2.0","id":1,"result":"0xcd0c3e8af590364c09d0fa6a1210faf5"}"#)
        .unwrap();
    assert!(confirmed.is_empty());

    let requests = m
        .parse_event_response(&fixture("subscription-oracle-request.json"))
        .unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.get("jobId"), Some(&json!(JOB_ID)));
    assert_eq!(req.get("blockNumber"), Some(&json!("0x12a05f200")));
    assert_eq!(
        req.get("requester"),
        Some(&json!("0x9f37f5f695cc16bebb1b227502809ad0fb117e08"))
    );
    assert_eq!(req.get("payment"), Some(&json!("1000000000000000000")));
    assert_eq!(req.get("callbackFunctionId"), Some(&json!("0x4357855e")));
    assert_eq!(req.get("expiration"), Some(&json!("100000000")));
    assert_eq!(req.get("dataVersion"), Some(&json!("1")));
    assert_eq!(
        req.get("requestData"),
        Some(&json!("0x6370617468635553446574696d65731864"))
    );
    assert_eq!(m.state().cursor(), &Cursor::at(0x12a05f201u64));
}

#[test]
fn mock_job_id_needs_opt_in() {
    let mut strict = create_manager(&oracle_config("wss://node.example/ws", false), None).unwrap();
    let requests = strict
        .parse_event_response(&fixture("subscription-mock-job.json"))
        .unwrap();
    assert!(requests.is_empty());
    // well formed but unmatched: still observed
    assert_eq!(strict.state().cursor(), &Cursor::at(0x21u32));

    let mut lenient = create_manager(&oracle_config("wss://node.example/ws", true), None).unwrap();
    let requests = lenient
        .parse_event_response(&fixture("subscription-mock-job.json"))
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("jobId"), Some(&json!("mock")));
}

#[test]
fn other_jobs_are_filtered_in_pull_mode() {
    let mut m = create_manager(&oracle_config("https://node.example/rpc", false), None).unwrap();
    let requests = m.parse_event_response(&fixture("getlogs-mixed-jobs.json")).unwrap();

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("blockNumber"), Some(&json!("0x30")));
    assert_eq!(m.state().cursor(), &Cursor::at(0x32u32));
}

#[test]
fn push_error_reply_is_reported() {
    let mut m = generic_manager(Chain::Harmony, ConnectionMode::Push);
    let err = m
        .parse_event_response(br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"notifications not supported"}}"#)
        .unwrap_err();
    assert!(matches!(err, ManagerError::Rpc(ref e) if e.code == -32601));
}

// ─── Unsupported modes and lifecycle ──────────────────────────────────────────

#[test]
fn tron_cannot_push() {
    let mut m = generic_manager(Chain::Tron, ConnectionMode::Push);
    assert!(m.build_trigger_request().is_none());
    assert!(m.build_health_check_request().is_none());
    assert!(m
        .parse_event_response(&fixture("getlogs-two-blocks.json"))
        .unwrap_err()
        .is_unsupported_mode());
    assert!(m
        .parse_health_check_response(&head_response("0x10"))
        .unwrap_err()
        .is_unsupported_mode());
    assert_eq!(m.state().phase(), ManagerPhase::Idle);

    let mut config = oracle_config("wss://tron.example/ws", false);
    config.chain = "tron".into();
    let err = create_manager(&config, None).err().unwrap();
    assert!(err.is_unsupported_mode());
    assert_eq!(err.to_string(), "unknown connection type 'push' for chain 'tron'");
}

#[test]
fn tron_pull_uses_eth_methods() {
    let mut m = generic_manager(Chain::Tron, ConnectionMode::Pull);
    let trigger = as_json(&m.build_trigger_request().unwrap());
    assert_eq!(trigger["method"], "eth_getLogs");
}

#[test]
fn unknown_chain_is_rejected() {
    let mut config = oracle_config("https://node.example/rpc", false);
    config.chain = "solana".into();
    assert!(matches!(
        create_manager(&config, None),
        Err(ManagerError::UnknownChain(_))
    ));
}

#[test]
fn stopped_manager_refuses_work() {
    let mut m = generic_manager(Chain::Ethereum, ConnectionMode::Pull);
    m.stop();
    assert_eq!(m.state().phase(), ManagerPhase::Stopped);
    assert!(m.build_trigger_request().is_none());
    assert!(m.build_health_check_request().is_none());
    assert!(matches!(
        m.parse_event_response(&fixture("getlogs-two-blocks.json")),
        Err(ManagerError::Stopped { .. })
    ));
    assert_eq!(m.state().cursor(), &Cursor::Unset);
}

#[test]
fn every_event_response_pings_the_source() {
    let pings = Arc::new(RecordedPings::default());
    let mut m = create_manager(
        &oracle_config("https://node.example/rpc", false),
        Some(pings.clone() as Arc<dyn SourcePingRecorder>),
    )
    .unwrap();

    m.parse_event_response(&fixture("getlogs-mixed-jobs.json")).unwrap();
    m.parse_event_response(b"garbage").unwrap_err();

    let seen = pings.0.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen
        .iter()
        .all(|(endpoint, job)| endpoint == "test-node" && job == JOB_ID));
}
