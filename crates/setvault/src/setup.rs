//! Setup-status derivation from configured flags

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::SettingsCatalog;

/// Onboarding steps in canonical order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
	AiProvider,
	Auth,
	Integrations,
}

impl SetupStep {
	pub const ALL: [SetupStep; 3] = [SetupStep::AiProvider, SetupStep::Auth, SetupStep::Integrations];

	pub fn id(self) -> &'static str {
		match self {
			SetupStep::AiProvider => "ai_provider",
			SetupStep::Auth => "auth",
			SetupStep::Integrations => "integrations",
		}
	}

	pub fn is_required(self) -> bool {
		match self {
			SetupStep::AiProvider | SetupStep::Auth => true,
			SetupStep::Integrations => false,
		}
	}
}

impl std::fmt::Display for SetupStep {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.id())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
	pub is_setup: bool,
	pub completed_steps: Vec<SetupStep>,
	pub next_step: Option<SetupStep>,
}

/// Maps configured flags onto setup steps
#[derive(Debug)]
pub struct SetupStatusDeriver<'a> {
	catalog: &'a SettingsCatalog,
}

impl<'a> SetupStatusDeriver<'a> {
	pub fn new(catalog: &'a SettingsCatalog) -> Self {
		Self { catalog }
	}

	/// A step is complete when any of its flags is true. Flags missing from
	/// `configured` count as false.
	pub fn step_complete(&self, step: SetupStep, configured: &BTreeMap<String, bool>) -> bool {
		self.catalog
			.step_flags(step)
			.any(|flag| configured.get(flag).copied().unwrap_or(false))
	}

	pub fn derive(&self, configured: &BTreeMap<String, bool>) -> SetupStatus {
		let completed_steps: Vec<SetupStep> = SetupStep::ALL
			.into_iter()
			.filter(|step| self.step_complete(*step, configured))
			.collect();

		let is_setup = SetupStep::ALL
			.into_iter()
			.filter(|step| step.is_required())
			.all(|step| completed_steps.contains(&step));

		let next_step = if is_setup {
			None
		} else {
			SetupStep::ALL.into_iter().find(|step| !completed_steps.contains(step))
		};

		SetupStatus { is_setup, completed_steps, next_step }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn flags(set: &[&str]) -> BTreeMap<String, bool> {
		set.iter().map(|flag| ((*flag).to_string(), true)).collect()
	}

	#[test]
	fn test_nothing_configured() {
		let catalog = SettingsCatalog::standard().unwrap();
		let status = SetupStatusDeriver::new(&catalog).derive(&BTreeMap::new());
		assert!(!status.is_setup);
		assert!(status.completed_steps.is_empty());
		assert_eq!(status.next_step, Some(SetupStep::AiProvider));
	}

	#[test]
	fn test_any_provider_completes_ai_step() {
		let catalog = SettingsCatalog::standard().unwrap();
		let deriver = SetupStatusDeriver::new(&catalog);

		for provider in ["anthropic", "openai"] {
			let status = deriver.derive(&flags(&[provider]));
			assert_eq!(status.completed_steps, vec![SetupStep::AiProvider]);
			assert_eq!(status.next_step, Some(SetupStep::Auth));
			assert!(!status.is_setup);
		}
	}

	#[test]
	fn test_required_steps_complete() {
		let catalog = SettingsCatalog::standard().unwrap();
		let status = SetupStatusDeriver::new(&catalog).derive(&flags(&["openai", "auth"]));
		assert!(status.is_setup);
		assert_eq!(status.completed_steps, vec![SetupStep::AiProvider, SetupStep::Auth]);
		assert_eq!(status.next_step, None);
	}

	#[test]
	fn test_optional_step_does_not_make_setup() {
		let catalog = SettingsCatalog::standard().unwrap();
		let status = SetupStatusDeriver::new(&catalog).derive(&flags(&["auth", "zotero"]));
		assert!(!status.is_setup);
		assert_eq!(status.completed_steps, vec![SetupStep::Auth, SetupStep::Integrations]);
		assert_eq!(status.next_step, Some(SetupStep::AiProvider));
	}

	#[test]
	fn test_false_flags_ignored() {
		let catalog = SettingsCatalog::standard().unwrap();
		let mut configured = flags(&["auth"]);
		configured.insert("anthropic".into(), false);
		let status = SetupStatusDeriver::new(&catalog).derive(&configured);
		assert_eq!(status.next_step, Some(SetupStep::AiProvider));
	}

	#[test]
	fn test_serializes_camel_case() {
		let catalog = SettingsCatalog::standard().unwrap();
		let status = SetupStatusDeriver::new(&catalog).derive(&flags(&["anthropic"]));
		let json = serde_json::to_value(&status).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"isSetup": false,
				"completedSteps": ["ai_provider"],
				"nextStep": "auth",
			})
		);
	}
}

// vim: ts=4
