//! Text helpers for labels, display names and URL fragments

use convert_case::{Case, Casing};

const UNCOUNTABLE: &[&str] = &[
	"data",
	"equipment",
	"fish",
	"information",
	"media",
	"news",
	"series",
	"sheep",
	"species",
];

const IRREGULAR: &[(&str, &str)] = &[
	("child", "children"),
	("foot", "feet"),
	("goose", "geese"),
	("man", "men"),
	("mouse", "mice"),
	("person", "people"),
	("tooth", "teeth"),
	("woman", "women"),
];

/// Pluralizes the last word of an English phrase.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::text::pluralize;
///
/// assert_eq!(pluralize("Invoice"), "Invoices");
/// assert_eq!(pluralize("Test Model"), "Test Models");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("Person"), "People");
/// ```
pub fn pluralize(phrase: &str) -> String {
	let split_at = phrase
		.rfind(|c: char| c == ' ' || c == '_' || c == '-')
		.map(|i| i + 1)
		.unwrap_or(0);
	let (head, word) = phrase.split_at(split_at);
	if word.is_empty() {
		return phrase.to_string();
	}

	let lower = word.to_lowercase();
	if UNCOUNTABLE.contains(&lower.as_str()) {
		return phrase.to_string();
	}

	if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
		return format!("{}{}", head, match_initial_case(word, plural));
	}

	let plural = if ["s", "x", "z", "ch", "sh"]
		.iter()
		.any(|suffix| lower.ends_with(suffix))
	{
		format!("{}es", word)
	} else if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
		format!("{}ies", &word[..word.len() - 1])
	} else {
		format!("{}s", word)
	};

	format!("{}{}", head, plural)
}

fn ends_with_vowel_y(lower: &str) -> bool {
	let mut chars = lower.chars().rev();
	chars.next();
	matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

fn match_initial_case(original: &str, replacement: &str) -> String {
	match original.chars().next() {
		Some(first) if first.is_uppercase() => capitalize(replacement),
		_ => replacement.to_string(),
	}
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(value: &str) -> String {
	let mut chars = value.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Converts an identifier to a human-readable title.
///
/// `created_at` → `Created At`, `testModel` → `Test Model`.
pub fn title_case(identifier: &str) -> String {
	identifier.to_case(Case::Title)
}

/// Converts an identifier to a kebab-case URL/template fragment.
///
/// `testModel` → `test-model`.
pub fn kebab_case(identifier: &str) -> String {
	identifier.to_case(Case::Kebab)
}

/// Truthiness of a submitted form value.
///
/// `null`, `false`, `0`, and empty strings are falsy; everything else is truthy.
pub fn is_truthy(value: &serde_json::Value) -> bool {
	use serde_json::Value;

	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("invoice", "invoices")]
	#[case("Invoice", "Invoices")]
	#[case("Test Model", "Test Models")]
	#[case("box", "boxes")]
	#[case("match", "matches")]
	#[case("status", "statuses")]
	#[case("category", "categories")]
	#[case("day", "days")]
	#[case("person", "people")]
	#[case("Sales Person", "Sales People")]
	#[case("news", "news")]
	#[case("", "")]
	fn test_pluralize(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(pluralize(input), expected);
	}

	#[rstest]
	#[case("created_at", "Created At")]
	#[case("testModel", "Test Model")]
	#[case("invoice", "Invoice")]
	#[case("name", "Name")]
	fn test_title_case(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(title_case(input), expected);
	}

	#[rstest]
	fn test_kebab_case() {
		assert_eq!(kebab_case("testModel"), "test-model");
		assert_eq!(kebab_case("invoice"), "invoice");
	}

	#[rstest]
	#[case(json!(null), false)]
	#[case(json!(false), false)]
	#[case(json!(0), false)]
	#[case(json!(""), false)]
	#[case(json!("0"), true)]
	#[case(json!(7), true)]
	#[case(json!("abc"), true)]
	fn test_is_truthy(#[case] value: serde_json::Value, #[case] expected: bool) {
		assert_eq!(is_truthy(&value), expected);
	}
}
