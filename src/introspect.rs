//! Attribute introspection
//!
//! Turns a model's raw schema metadata into the attribute list that list and form
//! templates iterate over: labeled, classified (`enum`, `related`, or the
//! declared type) and filtered by the model admin's display/ignore settings.

use crate::error::{AdminError, AdminResult};
use crate::storage::{AttributeType, FindQuery, ModelSchema, Record, Repository};
use crate::text::title_case;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// UI view of one attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
	pub name: String,
	pub label: String,
	/// `enum`, `related`, or the declared type name
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enum_options: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub related_model: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub related_instances: Option<Vec<Record>>,
	/// Declared storage type, used when coercing submitted values
	#[serde(skip)]
	pub attribute_type: AttributeType,
}

impl AttributeDescriptor {
	pub fn is_related(&self) -> bool {
		self.related_model.is_some()
	}
}

/// Attribute introspector for one model admin
pub struct Introspector {
	display: Vec<String>,
	ignore: HashSet<String>,
	repository: Arc<dyn Repository>,
}

impl Introspector {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self {
			display: Vec::new(),
			ignore: HashSet::new(),
			repository,
		}
	}

	/// Whitelist of attribute names; when non-empty it overrides `ignore`
	pub fn with_display(mut self, display: Vec<String>) -> Self {
		self.display = display;
		self
	}

	pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
		self.ignore = ignore.into_iter().collect();
		self
	}

	/// Labeled, classified and filtered attributes, without relation data
	pub fn describe(&self, schema: &ModelSchema) -> Vec<AttributeDescriptor> {
		schema
			.attributes
			.iter()
			.filter(|(name, _)| self.display.is_empty() || self.display.iter().any(|d| d == *name))
			.filter(|(name, meta)| {
				!self.ignore.contains(name.as_str()) && meta.kind != AttributeType::Identifier
			})
			.map(|(name, meta)| {
				let label = meta.label.clone().unwrap_or_else(|| title_case(name));
				let related_model = schema.relation_target(name).map(str::to_string);
				let kind = if meta.enum_values.is_some() {
					"enum".to_string()
				} else if related_model.is_some() {
					"related".to_string()
				} else {
					meta.kind.as_str().to_string()
				};
				AttributeDescriptor {
					name: name.clone(),
					label,
					kind,
					enum_options: meta.enum_values.clone(),
					related_model,
					related_instances: None,
					attribute_type: meta.kind,
				}
			})
			.collect()
	}

	/// Attributes of `schema`, with every relation's target collection attached
	/// when `with_related` is set
	///
	/// Relation collections are fetched concurrently; the call fails if any
	/// fetch failed.
	pub async fn attributes(
		&self,
		schema: &ModelSchema,
		with_related: bool,
	) -> AdminResult<Vec<AttributeDescriptor>> {
		let mut attributes = self.describe(schema);
		if !with_related || !attributes.iter().any(AttributeDescriptor::is_related) {
			return Ok(attributes);
		}

		let fetches: Vec<_> = attributes
			.iter()
			.enumerate()
			.filter_map(|(index, attr)| attr.related_model.clone().map(|target| (index, target)))
			.map(|(index, target)| {
				let store = self.repository.store(&target);
				async move {
					let store = store.ok_or_else(|| {
						AdminError::Fetch(format!("no store registered for model '{}'", target))
					})?;
					let instances = store.find(FindQuery::new()).await.map_err(AdminError::fetch)?;
					Ok::<_, AdminError>((index, instances))
				}
			})
			.collect();

		for settled in join_all(fetches).await {
			let (index, instances) = settled?;
			attributes[index].related_instances = Some(instances);
		}
		Ok(attributes)
	}
}
