//! Templater collaborator and its Tera implementation
//!
//! The admin core never renders markup itself: it hands a template name and a
//! JSON context to a [`Templater`]. [`TeraTemplater`] is the bundled
//! implementation, preloaded with the default layout, list, form and import
//! templates.

use crate::error::{AdminError, AdminResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tera::{Context, Tera};

/// Default admin layout, registered as `admin`
pub const LAYOUT_TEMPLATE: &str = include_str!("../templates/admin.tpl");
/// Default model list view, registered as `admin-list`
pub const LIST_TEMPLATE: &str = include_str!("../templates/admin-list.tpl");
/// Default model form view, registered as `admin-form`
pub const FORM_TEMPLATE: &str = include_str!("../templates/admin-form.tpl");
/// Default upload form, registered as `admin-import`
pub const IMPORT_TEMPLATE: &str = include_str!("../templates/admin-import.tpl");

/// Rendering collaborator
#[async_trait]
pub trait Templater: Send + Sync {
	/// Render `template` with a JSON object context
	async fn render(&self, template: &str, context: &Value) -> AdminResult<String>;

	/// Register (or replace) a template from source
	fn register_template(&self, name: &str, source: &str) -> AdminResult<()>;

	/// Whether a template with this name is registered
	fn has_template(&self, name: &str) -> bool;

	/// Register `source` under `name` unless the host already provided one
	fn register_default(&self, name: &str, source: &str) -> AdminResult<()> {
		if self.has_template(name) {
			return Ok(());
		}
		self.register_template(name, source)
	}
}

/// Tera-backed templater
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::templates::{TeraTemplater, Templater};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let templater = TeraTemplater::new().unwrap();
/// templater.register_template("hello", "Hello {{ name }}!").unwrap();
///
/// let html = templater.render("hello", &json!({"name": "admin"})).await.unwrap();
/// assert_eq!(html, "Hello admin!");
/// # });
/// ```
pub struct TeraTemplater {
	tera: RwLock<Tera>,
}

impl TeraTemplater {
	/// Create a templater with the bundled default templates registered
	pub fn new() -> AdminResult<Self> {
		let templater = Self::empty();
		templater.register_template("admin", LAYOUT_TEMPLATE)?;
		templater.register_template("admin-list", LIST_TEMPLATE)?;
		templater.register_template("admin-form", FORM_TEMPLATE)?;
		templater.register_template("admin-import", IMPORT_TEMPLATE)?;
		Ok(templater)
	}

	/// Create a templater without any template
	///
	/// Output is HTML-escaped for every template name; mark trusted markup
	/// with `| safe`.
	pub fn empty() -> Self {
		let mut tera = Tera::default();
		tera.autoescape_on(vec![""]);
		Self {
			tera: RwLock::new(tera),
		}
	}

	/// Load every template matching a glob (e.g. `templates/**/*.tpl`)
	///
	/// Names are paths relative to the glob's root, as Tera assigns them.
	pub fn load_glob(&self, pattern: &str) -> AdminResult<()> {
		let loaded = Tera::new(pattern)?;
		self.tera.write().extend(&loaded)?;
		Ok(())
	}

	/// Names of every registered template, sorted
	pub fn template_names(&self) -> Vec<String> {
		let tera = self.tera.read();
		let mut names: Vec<String> = tera.get_template_names().map(str::to_string).collect();
		names.sort();
		names
	}
}

impl std::fmt::Debug for TeraTemplater {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TeraTemplater")
			.field("templates", &self.template_names())
			.finish()
	}
}

#[async_trait]
impl Templater for TeraTemplater {
	async fn render(&self, template: &str, context: &Value) -> AdminResult<String> {
		if !context.is_object() {
			return Err(AdminError::Template(format!(
				"context for '{}' must be an object",
				template
			)));
		}
		let context = Context::from_value(context.clone())?;
		let tera = self.tera.read();
		Ok(tera.render(template, &context)?)
	}

	fn register_template(&self, name: &str, source: &str) -> AdminResult<()> {
		tracing::debug!(template = name, "registering template");
		self.tera.write().add_raw_template(name, source)?;
		Ok(())
	}

	fn has_template(&self, name: &str) -> bool {
		self.tera.read().get_template_names().any(|n| n == name)
	}
}
