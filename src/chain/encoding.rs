//! Transaction data encoding.
//!
//! Builds the `data` field of submitted transactions: creation bytecode
//! with ABI-encoded constructor arguments appended, or a 4-byte function
//! selector followed by ABI-encoded call arguments.

use ethers_core::abi::{encode, Token};
use ethers_core::utils::id;

/// Build deployment data: bytecode followed by encoded constructor args.
pub fn deploy_data(bytecode: &[u8], args: &[Token]) -> Vec<u8> {
    let mut data = bytecode.to_vec();
    if !args.is_empty() {
        data.extend(encode(args));
    }
    data
}

/// Build call data: selector of the full signature followed by encoded args.
///
/// `signature` must be the canonical form, e.g. `transferOwnership(address)`.
pub fn call_data(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = id(signature).to_vec();
    if !args.is_empty() {
        data.extend(encode(args));
    }
    data
}
