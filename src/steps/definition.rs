//! Step definitions.
//!
//! A [`StepDefinition`] describes one unit of deployable work: a stable
//! key, a completion check, and a plan function that derives the step's
//! actions from the current state and the static configuration. Plan
//! functions are where inter-step dependencies live: they read earlier
//! steps' recorded addresses via
//! [`MigrationState::require_address`](crate::state::MigrationState::require_address)
//! and fail fast when a prerequisite is missing.

use ethers_core::abi::Token;
use ethers_core::types::U256;

use crate::artifacts::ContractArtifact;
use crate::chain::ActionRequest;
use crate::config::DeployConfig;
use crate::error::Result;
use crate::state::MigrationState;
use crate::steps::completion::CompletionCheck;

/// Argument computation: state + config in, submittable actions out.
pub type PlanFn =
    Box<dyn Fn(&MigrationState, &DeployConfig) -> Result<Vec<ActionRequest>> + Send + Sync>;

/// A declarative description of one migration step.
///
/// Defined statically at program start, never mutated, consumed once per
/// run by the engine.
pub struct StepDefinition {
    key: String,
    title: String,
    completion: CompletionCheck,
    plan: PlanFn,
}

impl StepDefinition {
    /// Create a step from its parts.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        completion: CompletionCheck,
        plan: PlanFn,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            completion,
            plan,
        }
    }

    /// Create the common single-deployment step: deploy one artifact with
    /// computed constructor arguments, complete once its address is
    /// recorded.
    pub fn deploy(
        key: impl Into<String>,
        title: impl Into<String>,
        artifact: &ContractArtifact,
        args: impl Fn(&MigrationState, &DeployConfig) -> Result<Vec<Token>> + Send + Sync + 'static,
    ) -> Self {
        let contract = artifact.name.clone();
        let bytecode = artifact.bytecode.clone();
        let checksum = artifact.checksum();

        Self::new(
            key,
            title,
            CompletionCheck::AddressRecorded,
            Box::new(move |state, config| {
                Ok(vec![ActionRequest::Deploy {
                    contract: contract.clone(),
                    bytecode: bytecode.clone(),
                    checksum: checksum.clone(),
                    args: args(state, config)?,
                    value: U256::zero(),
                }])
            }),
        )
    }

    /// Stable key identifying this step across runs.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable title for progress output.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// This step's finished-predicate.
    pub fn completion(&self) -> &CompletionCheck {
        &self.completion
    }

    /// Compute the actions this step would submit given the current state.
    pub fn plan(
        &self,
        state: &MigrationState,
        config: &DeployConfig,
    ) -> Result<Vec<ActionRequest>> {
        (self.plan)(state, config)
    }
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CairnError;

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

    fn sample_artifact() -> ContractArtifact {
        ContractArtifact {
            name: "CurrencyToken".into(),
            bytecode: vec![0x60, 0x80],
            abi: serde_json::json!([]),
        }
    }

    #[test]
    fn deploy_step_plans_single_deploy_action() {
        let artifact = sample_artifact();
        let step = StepDefinition::deploy(
            "currency_token",
            "Deploy the currency token",
            &artifact,
            |_, config| Ok(vec![Token::String(config.currency_label.clone())]),
        );

        let actions = step.plan(&MigrationState::new(), &sample_config()).unwrap();
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            ActionRequest::Deploy {
                contract,
                bytecode,
                checksum,
                args,
                ..
            } => {
                assert_eq!(contract, "CurrencyToken");
                assert_eq!(bytecode, &vec![0x60, 0x80]);
                assert_eq!(checksum, &artifact.checksum());
                assert_eq!(args, &vec![Token::String("USD".into())]);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn deploy_step_uses_address_completion() {
        let step = StepDefinition::deploy("k", "t", &sample_artifact(), |_, _| Ok(vec![]));
        assert!(matches!(
            step.completion(),
            CompletionCheck::AddressRecorded
        ));
    }

    #[test]
    fn plan_failure_propagates_missing_prerequisite() {
        let step = StepDefinition::deploy("exchange", "t", &sample_artifact(), |state, _| {
            Ok(vec![Token::Address(
                state.require_address("exchange", "currency_token")?,
            )])
        });

        let err = step
            .plan(&MigrationState::new(), &sample_config())
            .unwrap_err();
        assert!(matches!(err, CairnError::MissingPrerequisite { .. }));
    }
}
