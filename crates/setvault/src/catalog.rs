//! Static classification of known settings
//!
//! Definitions are registered into a mutable `CatalogBuilder` during startup
//! and frozen into an immutable `SettingsCatalog` shared by the repository and
//! the setup-status deriver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use setvault_types::prelude::*;

use crate::setup::SetupStep;

/// Type alias for setting validator function
pub type SettingValidator = Box<dyn Fn(&str) -> SvResult<()> + Send + Sync>;

/// What to do with writes to keys the catalog does not know
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownKeyPolicy {
	/// Reject, unless the caller passes an explicit `encrypt` override
	#[default]
	Reject,
	/// Store as a plain, optional UI setting
	AllowPlain,
}

/// Result of `SettingsCatalog::classify`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
	pub encrypt: bool,
	pub category: Category,
	/// Belongs to a required setup step. A step is satisfied by any one of
	/// its keys, so a required key can be absent on a set-up instance.
	pub required: bool,
}

/// Setting definition - metadata of one known key
pub struct SettingDefinition {
	pub key: String,
	pub description: String,
	/// Stored encrypted at rest
	pub encrypt: bool,
	pub category: Category,
	/// Name of the entry in the `configured` summary (e.g. "anthropic")
	pub flag: Option<String>,
	/// Setup step this setting contributes to
	pub step: Option<SetupStep>,
	pub validator: Option<SettingValidator>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("description", &self.description)
			.field("encrypt", &self.encrypt)
			.field("category", &self.category)
			.field("flag", &self.flag)
			.field("step", &self.step)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	pub fn classification(&self) -> Classification {
		Classification {
			encrypt: self.encrypt,
			category: self.category,
			required: self.step.is_some_and(SetupStep::is_required),
		}
	}

	pub fn validate(&self, value: &str) -> SvResult<()> {
		match &self.validator {
			Some(validator) => validator(value),
			None => Ok(()),
		}
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: String,
	description: Option<String>,
	encrypt: bool,
	category: Category,
	flag: Option<String>,
	step: Option<SetupStep>,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			description: None,
			encrypt: false,
			category: Category::Ui,
			flag: None,
			step: None,
			validator: None,
		}
	}

	/// Set the description (required)
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn category(mut self, category: Category) -> Self {
		self.category = category;
		self
	}

	/// Store this setting encrypted at rest
	pub fn encrypted(mut self) -> Self {
		self.encrypt = true;
		self
	}

	pub fn flag(mut self, flag: impl Into<String>) -> Self {
		self.flag = Some(flag.into());
		self
	}

	pub fn step(mut self, step: SetupStep) -> Self {
		self.step = Some(step);
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&str) -> SvResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> SvResult<SettingDefinition> {
		let description = self.description.ok_or_else(|| {
			Error::ConfigurationError(format!("Setting '{}' has no description", self.key))
		})?;

		if self.key.is_empty() || self.key.len() > 128 {
			return Err(Error::ConfigurationError(format!(
				"Setting key '{}' must be 1 to 128 bytes",
				self.key
			)));
		}

		// The deriver looks steps up through flags
		if self.step.is_some() && self.flag.is_none() {
			return Err(Error::ConfigurationError(format!(
				"Setting '{}' belongs to a setup step but has no flag",
				self.key
			)));
		}

		Ok(SettingDefinition {
			key: self.key,
			description,
			encrypt: self.encrypt,
			category: self.category,
			flag: self.flag,
			step: self.step,
			validator: self.validator,
		})
	}
}

/// Mutable registry used during startup
#[derive(Default)]
pub struct CatalogBuilder {
	definitions: BTreeMap<String, SettingDefinition>,
}

impl CatalogBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, def: SettingDefinition) -> SvResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigurationError(format!(
				"Setting '{}' is already registered",
				def.key
			)));
		}

		debug!("Registering setting: {}", def.key);
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	pub fn freeze(self) -> SettingsCatalog {
		debug!("Freezing settings catalog with {} definitions", self.definitions.len());
		SettingsCatalog { definitions: self.definitions }
	}
}

/// Immutable catalog
#[derive(Debug)]
pub struct SettingsCatalog {
	definitions: BTreeMap<String, SettingDefinition>,
}

impl SettingsCatalog {
	/// The application's standard settings table
	pub fn standard() -> SvResult<SettingsCatalog> {
		let mut builder = CatalogBuilder::new();
		register_standard_settings(&mut builder)?;
		Ok(builder.freeze())
	}

	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		self.definitions.get(key)
	}

	/// Classify a key. `None` for keys the catalog does not know.
	pub fn classify(&self, key: &str) -> Option<Classification> {
		self.get(key).map(SettingDefinition::classification)
	}

	/// All definitions, ordered by key
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.definitions.values()
	}

	/// Keys flagged `required`
	pub fn required_keys(&self) -> impl Iterator<Item = &str> {
		self.list().filter(|def| def.classification().required).map(|def| def.key.as_str())
	}

	/// Required keys grouped by their setup step. Setup is complete when each
	/// group has at least one configured key.
	pub fn required_keys_by_step(&self) -> BTreeMap<SetupStep, Vec<&str>> {
		let mut groups: BTreeMap<SetupStep, Vec<&str>> = BTreeMap::new();
		for def in self.list() {
			if let Some(step) = def.step.filter(|step| step.is_required()) {
				groups.entry(step).or_default().push(def.key.as_str());
			}
		}
		groups
	}

	/// Definitions backing one setup step
	pub fn step_settings(&self, step: SetupStep) -> impl Iterator<Item = &SettingDefinition> {
		self.list().filter(move |def| def.step == Some(step))
	}

	/// Configured-flag names backing one setup step
	pub fn step_flags(&self, step: SetupStep) -> impl Iterator<Item = &str> {
		self.step_settings(step).filter_map(|def| def.flag.as_deref())
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

// Validators
//************

fn non_negative_number(value: &str) -> SvResult<()> {
	match value.trim().parse::<f64>() {
		Ok(n) if n.is_finite() && n >= 0.0 => Ok(()),
		_ => Err(Error::ValidationError(format!("'{}' is not a non-negative number", value))),
	}
}

fn http_url(value: &str) -> SvResult<()> {
	let rest = value.strip_prefix("https://").or_else(|| value.strip_prefix("http://"));
	match rest {
		Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
		_ => Err(Error::ValidationError(format!("'{}' is not an http(s) URL", value))),
	}
}

fn email(value: &str) -> SvResult<()> {
	match value.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(Error::ValidationError(format!("'{}' is not an email address", value))),
	}
}

fn one_of(choices: &'static [&'static str]) -> impl Fn(&str) -> SvResult<()> + Send + Sync {
	move |value| {
		if choices.contains(&value) {
			Ok(())
		} else {
			Err(Error::ValidationError(format!(
				"'{}' is not one of {}",
				value,
				choices.join(", ")
			)))
		}
	}
}

/// Register the standard settings table
pub fn register_standard_settings(builder: &mut CatalogBuilder) -> SvResult<()> {
	// AI providers
	builder.register(
		SettingDefinition::builder("anthropic_api_key")
			.description("Anthropic API key")
			.category(Category::Ai)
			.encrypted()
			.flag("anthropic")
			.step(SetupStep::AiProvider)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("openai_api_key")
			.description("OpenAI API key")
			.category(Category::Ai)
			.encrypted()
			.flag("openai")
			.step(SetupStep::AiProvider)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("ai_default_model")
			.description("Model used when a request does not name one")
			.category(Category::Ai)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("ai_monthly_budget")
			.description("Monthly AI spending limit in USD")
			.category(Category::Ai)
			.validator(non_negative_number)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("ollama_base_url")
			.description("Base URL of a local Ollama server")
			.category(Category::Ai)
			.validator(http_url)
			.build()?,
	)?;

	// Authentication
	builder.register(
		SettingDefinition::builder("auth_secret")
			.description("Secret used to sign sessions")
			.category(Category::Auth)
			.encrypted()
			.flag("auth")
			.step(SetupStep::Auth)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("github_client_id")
			.description("GitHub OAuth client id")
			.category(Category::Auth)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("github_client_secret")
			.description("GitHub OAuth client secret")
			.category(Category::Auth)
			.encrypted()
			.flag("github")
			.build()?,
	)?;

	// Integrations
	builder.register(
		SettingDefinition::builder("semantic_scholar_api_key")
			.description("Semantic Scholar API key")
			.category(Category::Integration)
			.encrypted()
			.flag("semantic_scholar")
			.step(SetupStep::Integrations)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("zotero_api_key")
			.description("Zotero API key")
			.category(Category::Integration)
			.encrypted()
			.flag("zotero")
			.step(SetupStep::Integrations)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("zotero_user_id")
			.description("Zotero library user id")
			.category(Category::Integration)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("unpaywall_email")
			.description("Contact email sent with Unpaywall lookups")
			.category(Category::Integration)
			.validator(email)
			.build()?,
	)?;

	// UI
	builder.register(
		SettingDefinition::builder("public_url")
			.description("Public URL of this instance")
			.category(Category::Ui)
			.validator(http_url)
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("citation_style")
			.description("Default citation style")
			.category(Category::Ui)
			.validator(one_of(&["apa", "mla", "chicago", "harvard", "ieee", "vancouver"]))
			.build()?,
	)?;
	builder.register(
		SettingDefinition::builder("theme")
			.description("Color theme")
			.category(Category::Ui)
			.validator(one_of(&["light", "dark", "system"]))
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
