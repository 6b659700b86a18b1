//! The deployment plan.
//!
//! The fixed, ordered list of migration steps. Declaration order IS
//! execution order: a step may read any earlier step's recorded output
//! and must never read a later one's.

use ethers_core::abi::Token;
use ethers_core::types::U256;

use crate::artifacts::ArtifactSet;
use crate::chain::ActionRequest;
use crate::error::Result;
use crate::steps::completion::CompletionCheck;
use crate::steps::StepDefinition;

/// Step keys, stable across runs and releases. Changing one orphans the
/// records existing state files hold under the old key.
pub const CURRENCY_TOKEN: &str = "currency_token";
pub const ASSET_REGISTRY: &str = "asset_registry";
pub const EXCHANGE: &str = "exchange";
pub const WIRE_UP: &str = "wire_up";

/// Every step key, in execution order.
pub const STEP_KEYS: [&str; 4] = [CURRENCY_TOKEN, ASSET_REGISTRY, EXCHANGE, WIRE_UP];

/// Artifacts the plan deploys, by contract name.
pub const CONTRACTS: [&str; 3] = ["CurrencyToken", "AssetRegistry", "Exchange"];

/// The contract a step deploys, for steps that deploy one.
pub fn artifact_for(key: &str) -> Option<&'static str> {
    match key {
        CURRENCY_TOKEN => Some("CurrencyToken"),
        ASSET_REGISTRY => Some("AssetRegistry"),
        EXCHANGE => Some("Exchange"),
        _ => None,
    }
}

/// Build the deployment plan against a loaded artifact set.
pub fn deployment_plan(artifacts: &ArtifactSet) -> Result<Vec<StepDefinition>> {
    let currency_token = artifacts.get("CurrencyToken")?;
    let asset_registry = artifacts.get("AssetRegistry")?;
    let exchange = artifacts.get("Exchange")?;

    Ok(vec![
        StepDefinition::deploy(
            CURRENCY_TOKEN,
            "Deploy the currency token",
            currency_token,
            |_, config| Ok(vec![Token::String(config.currency_label.clone())]),
        ),
        StepDefinition::deploy(
            ASSET_REGISTRY,
            "Deploy the asset registry",
            asset_registry,
            |_, _| Ok(vec![]),
        ),
        StepDefinition::deploy(EXCHANGE, "Deploy the exchange", exchange, |state, config| {
            Ok(vec![
                Token::Address(state.require_address(EXCHANGE, CURRENCY_TOKEN)?),
                Token::Address(state.require_address(EXCHANGE, ASSET_REGISTRY)?),
                Token::Address(config.secondary_factory),
            ])
        }),
        StepDefinition::new(
            WIRE_UP,
            "Wire registry and exchange, hand over ownership",
            CompletionCheck::TransactionsRecorded { count: 2 },
            Box::new(|state, config| {
                let registry = state.require_address(WIRE_UP, ASSET_REGISTRY)?;
                let exchange = state.require_address(WIRE_UP, EXCHANGE)?;
                Ok(vec![
                    ActionRequest::Call {
                        contract: "AssetRegistry".into(),
                        to: registry,
                        function: "setExchange(address)".into(),
                        args: vec![Token::Address(exchange)],
                        value: U256::zero(),
                    },
                    ActionRequest::Call {
                        contract: "Exchange".into(),
                        to: exchange,
                        function: "transferOwnership(address)".into(),
                        args: vec![Token::Address(config.owner)],
                        value: U256::zero(),
                    },
                ])
            }),
        ),
    ])
}
