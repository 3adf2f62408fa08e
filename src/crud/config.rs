//! Per-model admin configuration

use crate::error::{AdminError, AdminResult};
use crate::storage::Record;
use crate::text::{kebab_case, pluralize, title_case};
use serde::{Deserialize, Serialize};

/// Attributes hidden from forms and lists unless overridden
pub const DEFAULT_IGNORE: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Icon used for the list page nav entry unless overridden
pub const DEFAULT_ICON_CLASS: &str = "fa fa-list";

/// Model admin configuration
///
/// Every field except `model` is optional; [`ModelConfig::resolve`] fills in
/// the defaults.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::crud::ModelConfig;
///
/// let resolved = ModelConfig::for_model("invoice").resolve().unwrap();
/// assert_eq!(resolved.base, "/invoices");
/// assert_eq!(resolved.display_name, "Invoice");
/// assert_eq!(resolved.template_prefix, "admin-invoice");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
	/// Model identity in the repository (required)
	pub model: Option<String>,
	/// Path below the admin base, e.g. `/invoices`
	pub base: Option<String>,
	pub display_name: Option<String>,
	/// Prefix of the `-list`, `-form` and `-import` templates
	pub template_prefix: Option<String>,
	pub ignore: Option<Vec<String>>,
	/// Attribute whitelist; overrides `ignore` when non-empty
	pub display: Option<Vec<String>>,
	/// Relations eager-loaded by list and edit views
	pub model_populate: Option<Vec<String>>,
	pub icon_class: Option<String>,
	/// Enables the import pages (e.g. `csv`)
	pub upload_type: Option<String>,
	/// Extra options handed to the importer
	pub upload_options: Option<Record>,
}

impl ModelConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn for_model(model: impl Into<String>) -> Self {
		Self::new().model(model)
	}

	pub fn model(mut self, model: impl Into<String>) -> Self {
		self.model = Some(model.into());
		self
	}

	pub fn base(mut self, base: impl Into<String>) -> Self {
		self.base = Some(base.into());
		self
	}

	pub fn display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	pub fn template_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.template_prefix = Some(prefix.into());
		self
	}

	pub fn ignore(mut self, fields: Vec<impl Into<String>>) -> Self {
		self.ignore = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn display(mut self, fields: Vec<impl Into<String>>) -> Self {
		self.display = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn model_populate(mut self, relations: Vec<impl Into<String>>) -> Self {
		self.model_populate = Some(relations.into_iter().map(Into::into).collect());
		self
	}

	pub fn icon_class(mut self, icon_class: impl Into<String>) -> Self {
		self.icon_class = Some(icon_class.into());
		self
	}

	pub fn upload_type(mut self, upload_type: impl Into<String>) -> Self {
		self.upload_type = Some(upload_type.into());
		self
	}

	pub fn upload_options(mut self, options: Record) -> Self {
		self.upload_options = Some(options);
		self
	}

	/// Fill in defaults
	///
	/// Fails with [`AdminError::Configuration`] when no model is set.
	pub fn resolve(&self) -> AdminResult<ResolvedModelConfig> {
		let model = self
			.model
			.as_deref()
			.map(str::trim)
			.filter(|m| !m.is_empty())
			.ok_or_else(|| {
				AdminError::Configuration("model admin configuration requires a model".into())
			})?
			.to_string();

		let display_name = self
			.display_name
			.clone()
			.unwrap_or_else(|| title_case(&model));
		let base = match &self.base {
			Some(base) => normalize_base(base),
			None => format!("/{}", pluralize(&model.to_lowercase())),
		};

		Ok(ResolvedModelConfig {
			plural_name: pluralize(&display_name),
			template_prefix: self
				.template_prefix
				.clone()
				.unwrap_or_else(|| format!("admin-{}", kebab_case(&model))),
			ignore: self
				.ignore
				.clone()
				.unwrap_or_else(|| DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()),
			display: self.display.clone().unwrap_or_default(),
			model_populate: self.model_populate.clone().unwrap_or_default(),
			icon_class: self
				.icon_class
				.clone()
				.unwrap_or_else(|| DEFAULT_ICON_CLASS.to_string()),
			upload_type: self.upload_type.clone().filter(|t| !t.trim().is_empty()),
			upload_options: self.upload_options.clone().unwrap_or_default(),
			model,
			base,
			display_name,
		})
	}
}

fn normalize_base(base: &str) -> String {
	let trimmed = base.trim().trim_matches('/');
	format!("/{}", trimmed)
}

/// Source of a model admin's configuration
pub trait ConfigResolver: Send + Sync {
	fn resolve_config(&self) -> ModelConfig;
}

impl ConfigResolver for ModelConfig {
	fn resolve_config(&self) -> ModelConfig {
		self.clone()
	}
}

/// Model admin configuration with every default applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModelConfig {
	pub model: String,
	/// Path below the admin base, with a leading `/` and no trailing one
	pub base: String,
	pub display_name: String,
	/// Pluralized display name, used as the list title
	pub plural_name: String,
	pub template_prefix: String,
	pub ignore: Vec<String>,
	pub display: Vec<String>,
	pub model_populate: Vec<String>,
	pub icon_class: String,
	pub upload_type: Option<String>,
	pub upload_options: Record,
}

impl ResolvedModelConfig {
	pub fn list_template(&self) -> String {
		format!("{}-list", self.template_prefix)
	}

	pub fn form_template(&self) -> String {
		format!("{}-form", self.template_prefix)
	}

	pub fn import_template(&self) -> String {
		format!("{}-import", self.template_prefix)
	}

	pub fn import_enabled(&self) -> bool {
		self.upload_type.is_some()
	}
}
