//! Storage collaborator contract
//!
//! The admin console does not own persistence. Each model is served by a
//! [`ModelStore`]; a [`Repository`] looks stores up by model identity so
//! relations and imports can reach other models. Records travel as JSON
//! objects.

pub mod memory;

pub use memory::{MemoryRepository, MemoryStore};

use crate::error::StorageError;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A stored record
pub type Record = Map<String, Value>;

/// Result type for storage collaborators
pub type StorageResult<T> = Result<T, StorageError>;

/// Declared attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
	String,
	Text,
	Integer,
	Float,
	Boolean,
	Date,
	DateTime,
	Json,
	Mixed,
	Array,
	Binary,
	/// Reference to another model's record
	Reference,
	/// Internal identifier managed by the store (never shown in forms)
	Identifier,
}

impl AttributeType {
	pub fn as_str(&self) -> &'static str {
		match self {
			AttributeType::String => "string",
			AttributeType::Text => "text",
			AttributeType::Integer => "integer",
			AttributeType::Float => "float",
			AttributeType::Boolean => "boolean",
			AttributeType::Date => "date",
			AttributeType::DateTime => "datetime",
			AttributeType::Json => "json",
			AttributeType::Mixed => "mixed",
			AttributeType::Array => "array",
			AttributeType::Binary => "binary",
			AttributeType::Reference => "reference",
			AttributeType::Identifier => "identifier",
		}
	}

	/// Types whose submitted string value holds structured data
	pub fn is_structured(&self) -> bool {
		matches!(self, AttributeType::Json | AttributeType::Mixed)
	}
}

/// Raw metadata for one declared attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
	pub kind: AttributeType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enum_values: Option<Vec<String>>,
	#[serde(default)]
	pub required: bool,
}

impl AttributeMeta {
	pub fn new(kind: AttributeType) -> Self {
		Self {
			kind,
			label: None,
			enum_values: None,
			required: false,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_enum(mut self, values: Vec<impl Into<String>>) -> Self {
		self.enum_values = Some(values.into_iter().map(Into::into).collect());
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
}

/// Schema metadata a store exposes for its model
///
/// Attributes keep declaration order. Relations are declared explicitly: each
/// names an attribute and the model it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
	pub identity: String,
	pub attributes: IndexMap<String, AttributeMeta>,
	pub relations: IndexMap<String, String>,
}

impl ModelSchema {
	/// Start a schema with the conventional `id` identifier attribute
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::storage::{AttributeMeta, AttributeType, ModelSchema};
	///
	/// let schema = ModelSchema::new("invoice")
	///     .attribute("number", AttributeMeta::new(AttributeType::String).required())
	///     .attribute("paid", AttributeMeta::new(AttributeType::Boolean))
	///     .relation("customer", "customer");
	///
	/// assert_eq!(schema.attribute_names(), vec!["id", "number", "paid", "customer"]);
	/// assert_eq!(schema.relation_target("customer"), Some("customer"));
	/// ```
	pub fn new(identity: impl Into<String>) -> Self {
		let mut attributes = IndexMap::new();
		attributes.insert("id".to_string(), AttributeMeta::new(AttributeType::Identifier));
		Self {
			identity: identity.into(),
			attributes,
			relations: IndexMap::new(),
		}
	}

	/// Declare (or redeclare) an attribute
	pub fn attribute(mut self, name: impl Into<String>, meta: AttributeMeta) -> Self {
		self.attributes.insert(name.into(), meta);
		self
	}

	/// Declare a relation attribute pointing at `target`
	pub fn relation(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
		let name = name.into();
		self.attributes
			.entry(name.clone())
			.or_insert_with(|| AttributeMeta::new(AttributeType::Reference));
		self.relations.insert(name, target.into());
		self
	}

	pub fn attribute_names(&self) -> Vec<&str> {
		self.attributes.keys().map(String::as_str).collect()
	}

	pub fn relation_target(&self, name: &str) -> Option<&str> {
		self.relations.get(name).map(String::as_str)
	}
}

/// Query modifiers for [`ModelStore::find`] and [`ModelStore::find_one`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
	/// Equality criteria
	pub criteria: Record,
	/// Relations to eager-load
	pub populate: Vec<String>,
}

impl FindQuery {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an equality criterion
	pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.criteria.insert(field.into(), value.into());
		self
	}

	/// Eager-load the named relations
	pub fn populate<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.populate.extend(names.into_iter().map(Into::into));
		self
	}

	/// Whether `record` satisfies every criterion
	pub fn matches(&self, record: &Record) -> bool {
		self.criteria
			.iter()
			.all(|(field, expected)| record.get(field).is_some_and(|v| loosely_equal(v, expected)))
	}
}

/// Equality that treats `1` and `"1"` alike, since form and route values
/// arrive as strings
pub(crate) fn loosely_equal(stored: &Value, expected: &Value) -> bool {
	match (stored, expected) {
		(Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
			n.to_string() == *s
		}
		_ => stored == expected,
	}
}

/// Per-model storage collaborator
#[async_trait]
pub trait ModelStore: Send + Sync {
	/// Attribute metadata for this model
	fn schema(&self) -> ModelSchema;

	/// Model identity, as used by [`Repository::store`]
	fn identity(&self) -> String {
		self.schema().identity
	}

	async fn find(&self, query: FindQuery) -> StorageResult<Vec<Record>>;

	async fn find_one(&self, id: &str, query: FindQuery) -> StorageResult<Option<Record>>;

	async fn create(&self, values: Record) -> StorageResult<Record>;

	/// Update the record with `id`, returning the updated records
	async fn update(&self, id: &str, values: Record) -> StorageResult<Vec<Record>>;

	/// Destroy the record with `id`, returning the destroyed records
	async fn destroy(&self, id: &str) -> StorageResult<Vec<Record>>;
}

/// Looks stores up by model identity
pub trait Repository: Send + Sync {
	fn store(&self, model: &str) -> Option<Arc<dyn ModelStore>>;
}
