//! External ledger interfaces.
//!
//! The migration core never talks to a node directly; it hands declarative
//! [`ActionRequest`]s to a [`Broadcaster`] and receives [`PendingTx`]
//! acknowledgements. Waiting for confirmations is a separate concern behind
//! [`ConfirmationWaiter`], invoked by the outer driver between steps, never
//! by the engine.
//!
//! - [`encoding`] - constructor/call data building
//! - [`rpc`] - JSON-RPC implementations of both traits

pub mod encoding;
pub mod rpc;

use std::time::Duration;

use ethers_core::abi::Token;
use ethers_core::types::{Address, H256, U256};

use crate::error::Result;

pub use rpc::{JsonRpcBroadcaster, RpcClient, RpcConfirmationWaiter};

/// One submittable unit of work, described declaratively.
///
/// The broadcaster owns the wire-level concerns (data encoding, nonce,
/// gas); steps only say what to deploy or call with which arguments.
#[derive(Debug, Clone)]
pub enum ActionRequest {
    /// Deploy a contract from creation bytecode plus constructor arguments.
    Deploy {
        /// Contract name, for display and state records.
        contract: String,
        /// Creation bytecode.
        bytecode: Vec<u8>,
        /// SHA-256 checksum of the bytecode, recorded into state.
        checksum: String,
        /// Constructor arguments.
        args: Vec<Token>,
        /// Value transferred with the deployment.
        value: U256,
    },

    /// Call a function on an already-deployed contract.
    Call {
        /// Contract name, for display.
        contract: String,
        /// Target address.
        to: Address,
        /// Full function signature, e.g. `setExchange(address)`.
        function: String,
        /// Call arguments.
        args: Vec<Token>,
        /// Value transferred with the call.
        value: U256,
    },
}

impl ActionRequest {
    /// Human-readable label used in results, logs, and error messages.
    pub fn describe(&self) -> String {
        match self {
            ActionRequest::Deploy { contract, .. } => format!("deploy {}", contract),
            ActionRequest::Call {
                contract, function, ..
            } => format!("call {}.{}", contract, function),
        }
    }
}

/// Acknowledgement of a submitted action.
///
/// Returned as soon as the node accepts the transaction; nothing here
/// implies the transaction was mined. For deployments the broadcaster
/// reports the to-be-created contract address, which is fully determined
/// by sender and nonce at submission time.
#[derive(Debug, Clone)]
pub struct PendingTx {
    /// Transaction hash.
    pub hash: H256,

    /// Address the deployment will create, if this was a deployment.
    pub contract_address: Option<Address>,
}

/// Outcome of waiting for a transaction to be confirmed.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// Transaction hash.
    pub tx_hash: H256,

    /// Block the transaction was included in.
    pub block_number: u64,

    /// Contract created by the transaction, if any.
    pub contract_address: Option<Address>,

    /// Gas consumed.
    pub gas_used: Option<U256>,
}

/// Submits actions to the ledger.
///
/// Implementations may fail synchronously (malformed action, node
/// rejection); the engine treats any failure as fatal for the run and
/// never retries.
pub trait Broadcaster {
    /// Submit one action, returning immediately with a pending handle.
    fn submit(&self, action: &ActionRequest) -> Result<PendingTx>;
}

/// Blocks until a transaction reaches a confirmation depth.
///
/// Invoked by the outer driver once per step's result batch, concurrently
/// across the batch's entries but never across steps; `Sync` so one waiter
/// can serve the batch from scoped threads.
pub trait ConfirmationWaiter: Sync {
    /// Wait until `tx` has `confirmations` confirmations, or fail with
    /// a timeout after `timeout` has elapsed.
    fn wait(&self, tx: H256, confirmations: u64, timeout: Duration) -> Result<Receipt>;
}
