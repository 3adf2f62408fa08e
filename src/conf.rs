//! Admin console settings
//!
//! Process-wide settings read once at startup. Every field has a default, so an
//! empty TOML document yields a working configuration.
//!
//! ```toml
//! base_path = "/backoffice"
//! layout_template = "backoffice"
//! admin_only = false
//! ```

use crate::error::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_base_path() -> String {
	"/admin".to_string()
}

fn default_layout_template() -> String {
	"admin".to_string()
}

fn default_admin_only() -> bool {
	true
}

/// Settings for the admin console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
	/// URL prefix of every admin page and route
	#[serde(default = "default_base_path")]
	pub base_path: String,
	/// Template used to wrap page content
	#[serde(default = "default_layout_template")]
	pub layout_template: String,
	/// Require admin status (not just authentication) under the base path
	#[serde(default = "default_admin_only")]
	pub admin_only: bool,
}

impl Default for AdminSettings {
	fn default() -> Self {
		Self {
			base_path: default_base_path(),
			layout_template: default_layout_template(),
			admin_only: default_admin_only(),
		}
	}
}

impl AdminSettings {
	/// Parse settings from a TOML document
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::conf::AdminSettings;
	///
	/// let settings = AdminSettings::from_toml_str("base_path = \"/staff\"").unwrap();
	/// assert_eq!(settings.base_path, "/staff");
	/// assert_eq!(settings.layout_template, "admin");
	/// ```
	pub fn from_toml_str(source: &str) -> AdminResult<Self> {
		let settings: AdminSettings = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a TOML file
	pub fn from_file(path: impl AsRef<Path>) -> AdminResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|e| {
			AdminError::Settings(format!("cannot read {}: {}", path.display(), e))
		})?;
		Self::from_toml_str(&source)
	}

	/// Override the base path
	pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = base_path.into();
		self
	}

	/// Override the layout template
	pub fn with_layout_template(mut self, template: impl Into<String>) -> Self {
		self.layout_template = template.into();
		self
	}

	/// Toggle the admin-only gate
	pub fn with_admin_only(mut self, admin_only: bool) -> Self {
		self.admin_only = admin_only;
		self
	}

	/// Check invariants the registry relies on.
	///
	/// The base path must start with `/` and must not end with one; the root
	/// mount is expressed as an empty string.
	pub fn validate(&self) -> AdminResult<()> {
		if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
			return Err(AdminError::Settings(format!(
				"base_path '{}' must start with '/'",
				self.base_path
			)));
		}
		if self.base_path.len() > 1 && self.base_path.ends_with('/') {
			return Err(AdminError::Settings(format!(
				"base_path '{}' must not end with '/'",
				self.base_path
			)));
		}
		if self.base_path == "/" {
			return Err(AdminError::Settings(
				"mount the admin at the root with an empty base_path".into(),
			));
		}
		if self.layout_template.trim().is_empty() {
			return Err(AdminError::Settings("layout_template must not be empty".into()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	#[rstest]
	fn test_defaults() {
		// Arrange & Act
		let settings = AdminSettings::default();

		// Assert
		assert_eq!(settings.base_path, "/admin");
		assert_eq!(settings.layout_template, "admin");
		assert!(settings.admin_only);
	}

	#[rstest]
	fn test_empty_document_uses_defaults() {
		// Act
		let settings = AdminSettings::from_toml_str("").unwrap();

		// Assert
		assert_eq!(settings, AdminSettings::default());
	}

	#[rstest]
	fn test_partial_document_overrides_fields() {
		// Arrange
		let source = r#"
			base_path = "/staff"
			admin_only = false
		"#;

		// Act
		let settings = AdminSettings::from_toml_str(source).unwrap();

		// Assert
		assert_eq!(settings.base_path, "/staff");
		assert_eq!(settings.layout_template, "admin");
		assert!(!settings.admin_only);
	}

	#[rstest]
	#[case("base_path = \"admin\"")]
	#[case("base_path = \"/admin/\"")]
	#[case("base_path = \"/\"")]
	#[case("layout_template = \"  \"")]
	#[case("base_path = 3")]
	fn test_invalid_documents_are_rejected(#[case] source: &str) {
		// Act
		let result = AdminSettings::from_toml_str(source);

		// Assert
		assert!(matches!(result, Err(AdminError::Settings(_))));
	}

	#[rstest]
	fn test_from_file() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "layout_template = \"backoffice\"").unwrap();

		// Act
		let settings = AdminSettings::from_file(file.path()).unwrap();

		// Assert
		assert_eq!(settings.layout_template, "backoffice");
	}

	#[rstest]
	fn test_from_missing_file() {
		// Act
		let result = AdminSettings::from_file("/nonexistent/admin.toml");

		// Assert
		assert!(matches!(result, Err(AdminError::Settings(_))));
	}
}
