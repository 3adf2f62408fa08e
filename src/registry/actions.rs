//! Model and instance action registry
//!
//! Actions are the buttons a list or form view offers: model actions apply to
//! the whole collection ("Create", "Import"), instance actions to one record
//! ("Edit", "Remove"). Actions registered under [`WILDCARD`] apply to every
//! model.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;

/// Key whose actions apply to every model
pub const WILDCARD: &str = "*";

/// A UI action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
	pub label: String,
	/// Path fragment appended to the model base (or instance path)
	#[serde(rename = "subUrl")]
	pub sub_url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon_class: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub suffix_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_class: Option<String>,
}

impl Action {
	fn is_empty(&self) -> bool {
		self.label.trim().is_empty() && self.sub_url.trim().is_empty()
	}
}

/// Optional presentation fields of an [`Action`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOptions {
	pub icon_class: Option<String>,
	pub suffix_name: Option<String>,
	pub display_class: Option<String>,
}

impl ActionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_icon(mut self, icon_class: impl Into<String>) -> Self {
		self.icon_class = Some(icon_class.into());
		self
	}

	pub fn with_suffix(mut self, suffix_name: impl Into<String>) -> Self {
		self.suffix_name = Some(suffix_name.into());
		self
	}

	pub fn with_display_class(mut self, display_class: impl Into<String>) -> Self {
		self.display_class = Some(display_class.into());
		self
	}
}

type ActionMap = RwLock<IndexMap<String, Vec<Action>>>;

/// Per-model action lists
#[derive(Debug, Default)]
pub struct ActionRegistry {
	model: ActionMap,
	instance: ActionMap,
}

impl ActionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a collection-level action for `model` (or [`WILDCARD`])
	pub fn model_action(
		&self,
		model: &str,
		label: impl Into<String>,
		sub_url: impl Into<String>,
		options: ActionOptions,
	) {
		push(&self.model, model, build(label, sub_url, options));
	}

	/// Append a record-level action for `model` (or [`WILDCARD`])
	pub fn instance_action(
		&self,
		model: &str,
		label: impl Into<String>,
		sub_url: impl Into<String>,
		options: ActionOptions,
	) {
		push(&self.instance, model, build(label, sub_url, options));
	}

	/// Wildcard actions followed by the model's own, empty entries removed
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::registry::{ActionOptions, ActionRegistry};
	/// use reinhardt_admin_console::registry::actions::WILDCARD;
	///
	/// let actions = ActionRegistry::new();
	/// actions.model_action("invoice", "Create", "create", ActionOptions::new());
	/// actions.model_action(WILDCARD, "Export", "export", ActionOptions::new());
	///
	/// let labels: Vec<String> = actions
	///     .model_actions("invoice")
	///     .into_iter()
	///     .map(|a| a.label)
	///     .collect();
	/// assert_eq!(labels, vec!["Export", "Create"]);
	/// ```
	pub fn model_actions(&self, model: &str) -> Vec<Action> {
		collect(&self.model, model)
	}

	/// Wildcard instance actions followed by the model's own, empty entries removed
	pub fn instance_actions(&self, model: &str) -> Vec<Action> {
		collect(&self.instance, model)
	}
}

fn build(label: impl Into<String>, sub_url: impl Into<String>, options: ActionOptions) -> Action {
	Action {
		label: label.into(),
		sub_url: sub_url.into(),
		icon_class: options.icon_class,
		suffix_name: options.suffix_name,
		display_class: options.display_class,
	}
}

fn push(map: &ActionMap, model: &str, action: Action) {
	tracing::debug!(model, label = %action.label, sub_url = %action.sub_url, "registered admin action");
	map.write().entry(model.to_string()).or_default().push(action);
}

fn collect(map: &ActionMap, model: &str) -> Vec<Action> {
	let map = map.read();
	let wildcard = map.get(WILDCARD).into_iter().flatten();
	// A model registered as "*" must not see the wildcard group twice
	let own = map
		.get(model)
		.filter(|_| model != WILDCARD)
		.into_iter()
		.flatten();
	wildcard
		.chain(own)
		.filter(|action| !action.is_empty())
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_wildcard_actions_come_first() {
		// Arrange
		let actions = ActionRegistry::new();
		actions.instance_action("invoice", "Edit", "edit", ActionOptions::new());
		actions.instance_action(WILDCARD, "History", "history", ActionOptions::new());
		actions.instance_action("invoice", "Remove", "remove", ActionOptions::new());
		actions.instance_action("customer", "Merge", "merge", ActionOptions::new());

		// Act
		let labels: Vec<String> = actions
			.instance_actions("invoice")
			.into_iter()
			.map(|a| a.label)
			.collect();

		// Assert
		assert_eq!(labels, vec!["History", "Edit", "Remove"]);
	}

	#[rstest]
	fn test_empty_entries_are_dropped() {
		// Arrange
		let actions = ActionRegistry::new();
		actions.model_action("invoice", "", " ", ActionOptions::new());
		actions.model_action("invoice", "", "archive", ActionOptions::new());

		// Act
		let result = actions.model_actions("invoice");

		// Assert
		assert_eq!(result.len(), 1);
		assert_eq!(result[0].sub_url, "archive");
	}

	#[rstest]
	fn test_unknown_model_sees_only_wildcard() {
		// Arrange
		let actions = ActionRegistry::new();
		actions.model_action(WILDCARD, "Export", "export", ActionOptions::new());

		// Act & Assert
		assert_eq!(actions.model_actions("ledger").len(), 1);
		assert!(actions.instance_actions("ledger").is_empty());
	}

	#[rstest]
	fn test_wildcard_lookup_does_not_duplicate() {
		// Arrange
		let actions = ActionRegistry::new();
		actions.model_action(WILDCARD, "Export", "export", ActionOptions::new());

		// Act & Assert
		assert_eq!(actions.model_actions(WILDCARD).len(), 1);
	}

	#[rstest]
	fn test_action_serializes_for_templates() {
		// Arrange
		let actions = ActionRegistry::new();
		actions.model_action(
			"invoice",
			"Import",
			"import",
			ActionOptions::new().with_icon("fa fa-upload"),
		);

		// Act
		let value = serde_json::to_value(&actions.model_actions("invoice")[0]).unwrap();

		// Assert
		assert_eq!(
			value,
			json!({"label": "Import", "subUrl": "import", "iconClass": "fa fa-upload"})
		);
	}
}
