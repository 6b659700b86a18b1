//! JSON-RPC implementations of the chain interfaces.
//!
//! [`JsonRpcBroadcaster`] submits actions with `eth_sendTransaction`
//! against a node holding the unlocked sender account, so signing stays
//! node-side. [`RpcConfirmationWaiter`] polls receipts until the required
//! confirmation depth is reached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ethers_core::types::{Address, H256, U256, U64};
use ethers_core::utils::get_contract_address;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::chain::{encoding, ActionRequest, Broadcaster, ConfirmationWaiter, PendingTx, Receipt};
use crate::config::DeployConfig;
use crate::error::{CairnError, Result};

/// Per-request timeout for a single HTTP round trip.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between receipt polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Minimal JSON-RPC 2.0 client over blocking HTTP.
pub struct RpcClient {
    url: String,
    http: reqwest::blocking::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    /// Create a client for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            next_id: AtomicU64::new(1),
        }
    }

    /// Perform one call, returning the raw `result` value (may be null).
    fn call_raw(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| CairnError::RpcError {
                message: format!("{}: {}", method, e),
            })?;

        let envelope: RpcEnvelope = response.json().map_err(|e| CairnError::RpcError {
            message: format!("{}: invalid response: {}", method, e),
        })?;

        if let Some(err) = envelope.error {
            return Err(CairnError::RpcError {
                message: format!("{}: {} (code {})", method, err.message, err.code),
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Perform one call and deserialize a non-null `result`.
    fn call<T: serde::de::DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call_raw(method, params)?;
        if result.is_null() {
            return Err(CairnError::RpcError {
                message: format!("{}: missing result", method),
            });
        }
        serde_json::from_value(result).map_err(|e| CairnError::RpcError {
            message: format!("{}: unexpected result shape: {}", method, e),
        })
    }
}

/// Broadcaster submitting via `eth_sendTransaction`.
pub struct JsonRpcBroadcaster {
    client: RpcClient,
    from: Address,
    gas_price: u64,
    gas_limit: Option<u64>,
}

impl JsonRpcBroadcaster {
    /// Build a broadcaster from the deployment configuration.
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            client: RpcClient::new(config.rpc_url.clone()),
            from: config.from,
            gas_price: config.gas_price,
            gas_limit: config.gas_limit,
        }
    }

    fn send(&self, to: Option<Address>, data: Vec<u8>, value: U256) -> Result<H256> {
        let mut tx = json!({
            "from": self.from,
            "gasPrice": U256::from(self.gas_price),
            "value": value,
            "data": format!("0x{}", hex::encode(data)),
        });
        if let Some(to) = to {
            tx["to"] = json!(to);
        }
        if let Some(gas) = self.gas_limit {
            tx["gas"] = json!(U256::from(gas));
        }
        self.client.call("eth_sendTransaction", json!([tx]))
    }

    fn pending_nonce(&self) -> Result<U256> {
        self.client
            .call("eth_getTransactionCount", json!([self.from, "pending"]))
    }
}

impl Broadcaster for JsonRpcBroadcaster {
    fn submit(&self, action: &ActionRequest) -> Result<PendingTx> {
        let wrap = |e: CairnError| CairnError::SubmissionFailed {
            action: action.describe(),
            message: e.to_string(),
        };

        match action {
            ActionRequest::Deploy {
                bytecode,
                args,
                value,
                ..
            } => {
                // The created address is determined by sender and nonce, so
                // it is known before the transaction is mined.
                let nonce = self.pending_nonce().map_err(wrap)?;
                let data = encoding::deploy_data(bytecode, args);
                let hash = self.send(None, data, *value).map_err(wrap)?;
                let address = get_contract_address(self.from, nonce);
                debug!(action = %action.describe(), tx = ?hash, address = ?address, "submitted");
                Ok(PendingTx {
                    hash,
                    contract_address: Some(address),
                })
            }
            ActionRequest::Call {
                to,
                function,
                args,
                value,
                ..
            } => {
                let data = encoding::call_data(function, args);
                let hash = self.send(Some(*to), data, *value).map_err(wrap)?;
                debug!(action = %action.describe(), tx = ?hash, "submitted");
                Ok(PendingTx {
                    hash,
                    contract_address: None,
                })
            }
        }
    }
}

/// Confirmation waiter polling `eth_getTransactionReceipt`.
pub struct RpcConfirmationWaiter {
    client: RpcClient,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    block_number: Option<U64>,
    contract_address: Option<Address>,
    status: Option<U64>,
    gas_used: Option<U256>,
}

impl RpcConfirmationWaiter {
    /// Create a waiter for the given endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new(rpc_url),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the receipt poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn fetch_receipt(&self, tx: H256) -> Result<Option<RpcReceipt>> {
        let raw = self
            .client
            .call_raw("eth_getTransactionReceipt", json!([tx]))?;
        if raw.is_null() {
            return Ok(None);
        }
        let receipt: RpcReceipt =
            serde_json::from_value(raw).map_err(|e| CairnError::RpcError {
                message: format!("eth_getTransactionReceipt: unexpected result shape: {}", e),
            })?;
        Ok(Some(receipt))
    }
}

impl ConfirmationWaiter for RpcConfirmationWaiter {
    fn wait(&self, tx: H256, confirmations: u64, timeout: Duration) -> Result<Receipt> {
        let started = Instant::now();

        loop {
            if let Some(receipt) = self.fetch_receipt(tx)? {
                if receipt.status == Some(U64::zero()) {
                    return Err(CairnError::TransactionReverted {
                        tx: format!("{:?}", tx),
                    });
                }
                if let Some(block) = receipt.block_number {
                    let head: U64 = self.client.call("eth_blockNumber", json!([]))?;
                    if head >= block {
                        let depth = (head - block).as_u64() + 1;
                        if depth >= confirmations {
                            debug!(tx = ?tx, depth, "confirmed");
                            return Ok(Receipt {
                                tx_hash: tx,
                                block_number: block.as_u64(),
                                contract_address: receipt.contract_address,
                                gas_used: receipt.gas_used,
                            });
                        }
                    }
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(CairnError::ConfirmationTimeout {
                    tx: format!("{:?}", tx),
                    waited_secs: elapsed.as_secs(),
                });
            }
            std::thread::sleep(self.poll_interval.min(timeout - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn rpc_result(value: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": 1, "result": value })
    }

    fn test_config(url: &str) -> DeployConfig {
        serde_yaml::from_str(&format!(
            r#"
network: test
rpc_url: "{}"
from: "0x00000000000000000000000000000000000000aa"
owner: "0x00000000000000000000000000000000000000bb"
currency_label: USD
secondary_factory: "0x00000000000000000000000000000000000000cc"
gas_price: 1000000000
"#,
            url
        ))
        .unwrap()
    }

    #[test]
    fn deploy_submission_derives_contract_address() {
        let server = MockServer::start();
        let tx_hash = "0x1111111111111111111111111111111111111111111111111111111111111111";

        let nonce_mock = server.mock(|when, then| {
            when.method(POST).body_includes("eth_getTransactionCount");
            then.status(200).json_body(rpc_result(json!("0x2")));
        });
        let send_mock = server.mock(|when, then| {
            when.method(POST).body_includes("eth_sendTransaction");
            then.status(200).json_body(rpc_result(json!(tx_hash)));
        });

        let config = test_config(&server.url("/"));
        let broadcaster = JsonRpcBroadcaster::from_config(&config);
        let action = ActionRequest::Deploy {
            contract: "CurrencyToken".into(),
            bytecode: vec![0x60, 0x80],
            checksum: "00".into(),
            args: vec![],
            value: U256::zero(),
        };

        let pending = broadcaster.submit(&action).unwrap();
        nonce_mock.assert();
        send_mock.assert();

        assert_eq!(pending.hash, tx_hash.parse().unwrap());
        assert_eq!(
            pending.contract_address,
            Some(get_contract_address(config.from, U256::from(2)))
        );
    }

    #[test]
    fn call_submission_sends_selector_data() {
        let server = MockServer::start();
        let tx_hash = "0x2222222222222222222222222222222222222222222222222222222222222222";

        let send_mock = server.mock(|when, then| {
            when.method(POST)
                .body_includes("eth_sendTransaction")
                // transferOwnership(address) selector
                .body_includes("0xf2fde38b");
            then.status(200).json_body(rpc_result(json!(tx_hash)));
        });

        let config = test_config(&server.url("/"));
        let broadcaster = JsonRpcBroadcaster::from_config(&config);
        let action = ActionRequest::Call {
            contract: "Exchange".into(),
            to: Address::repeat_byte(0x11),
            function: "transferOwnership(address)".into(),
            args: vec![ethers_core::abi::Token::Address(config.owner)],
            value: U256::zero(),
        };

        let pending = broadcaster.submit(&action).unwrap();
        send_mock.assert();
        assert!(pending.contract_address.is_none());
    }

    #[test]
    fn node_rejection_is_submission_failed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "insufficient funds" },
            }));
        });

        let config = test_config(&server.url("/"));
        let broadcaster = JsonRpcBroadcaster::from_config(&config);
        let action = ActionRequest::Call {
            contract: "Exchange".into(),
            to: Address::repeat_byte(0x11),
            function: "transferOwnership(address)".into(),
            args: vec![],
            value: U256::zero(),
        };

        let err = broadcaster.submit(&action).unwrap_err();
        match err {
            CairnError::SubmissionFailed { action, message } => {
                assert!(action.contains("Exchange"));
                assert!(message.contains("insufficient funds"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn waiter_returns_receipt_at_depth() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("eth_getTransactionReceipt");
            then.status(200).json_body(rpc_result(json!({
                "blockNumber": "0x5",
                "contractAddress": "0x00000000000000000000000000000000000000dd",
                "status": "0x1",
                "gasUsed": "0x5208",
            })));
        });
        server.mock(|when, then| {
            when.method(POST).body_includes("eth_blockNumber");
            then.status(200).json_body(rpc_result(json!("0x6")));
        });

        let waiter = RpcConfirmationWaiter::new(server.url("/"))
            .with_poll_interval(Duration::from_millis(10));
        let receipt = waiter
            .wait(H256::repeat_byte(0x33), 2, Duration::from_secs(5))
            .unwrap();

        assert_eq!(receipt.block_number, 5);
        assert_eq!(
            receipt.contract_address,
            Some("0x00000000000000000000000000000000000000dd".parse().unwrap())
        );
    }

    #[test]
    fn waiter_times_out_when_receipt_never_appears() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("eth_getTransactionReceipt");
            then.status(200).json_body(rpc_result(Value::Null));
        });

        let waiter = RpcConfirmationWaiter::new(server.url("/"))
            .with_poll_interval(Duration::from_millis(10));
        let err = waiter
            .wait(H256::repeat_byte(0x44), 1, Duration::from_millis(50))
            .unwrap_err();

        assert!(matches!(err, CairnError::ConfirmationTimeout { .. }));
    }

    #[test]
    fn waiter_surfaces_reverted_transactions() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).body_includes("eth_getTransactionReceipt");
            then.status(200).json_body(rpc_result(json!({
                "blockNumber": "0x5",
                "status": "0x0",
            })));
        });

        let waiter = RpcConfirmationWaiter::new(server.url("/"))
            .with_poll_interval(Duration::from_millis(10));
        let err = waiter
            .wait(H256::repeat_byte(0x55), 1, Duration::from_secs(5))
            .unwrap_err();

        assert!(matches!(err, CairnError::TransactionReverted { .. }));
    }
}
