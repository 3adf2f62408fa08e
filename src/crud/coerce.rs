//! Coercion of submitted form values into typed storage values

use crate::introspect::AttributeDescriptor;
use crate::storage::{AttributeType, Record};
use serde::Serialize;
use serde_json::Value;

/// A submitted field removed during coercion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedField {
	pub name: String,
	pub reason: String,
}

/// Coerced values plus the fields that could not be coerced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coerced {
	pub values: Record,
	pub dropped: Vec<DroppedField>,
}

/// Coerce `values` against the model's attributes
///
/// - `boolean` attributes follow checkbox semantics: an absent key is `false`,
///   a present key is `true` unless it already holds a JSON boolean.
/// - `json`/`mixed` attributes submitted as strings are parsed; a string that
///   does not parse is removed and reported in [`Coerced::dropped`].
///
/// Every other value passes through untouched.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::crud::coerce::coerce_values;
/// use serde_json::json;
///
/// let coerced = coerce_values(&[], json!({"number": "INV-1"}).as_object().cloned().unwrap());
/// assert_eq!(coerced.values["number"], json!("INV-1"));
/// assert!(coerced.dropped.is_empty());
/// ```
pub fn coerce_values(attributes: &[AttributeDescriptor], mut values: Record) -> Coerced {
	let mut dropped = Vec::new();
	for attr in attributes {
		match attr.attribute_type {
			AttributeType::Boolean => {
				let checked = match values.get(&attr.name) {
					Some(Value::Bool(b)) => *b,
					Some(_) => true,
					None => false,
				};
				values.insert(attr.name.clone(), Value::Bool(checked));
			}
			kind if kind.is_structured() => {
				let Some(Value::String(raw)) = values.get(&attr.name) else {
					continue;
				};
				match serde_json::from_str::<Value>(raw) {
					Ok(parsed) => {
						values.insert(attr.name.clone(), parsed);
					}
					Err(e) => {
						tracing::warn!(field = %attr.name, error = %e, "dropping unparseable structured field");
						values.remove(&attr.name);
						dropped.push(DroppedField {
							name: attr.name.clone(),
							reason: e.to_string(),
						});
					}
				}
			}
			_ => {}
		}
	}
	Coerced { values, dropped }
}
