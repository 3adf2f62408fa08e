//! Page and route registry
//!
//! Host modules register admin pages (navigable, rendered inside the admin
//! layout) and bare routes (bound straight to the router) at startup. Every
//! path is prefixed with the configured base path. Pages are bound to the
//! [`Dispatcher`], which resolves them again at request time.

pub mod actions;

pub use actions::{Action, ActionOptions, ActionRegistry};

use crate::conf::AdminSettings;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{AdminError, AdminResult};
use crate::handler::Handler;
use crate::http::{Request, Response};
use crate::router::{Endpoint, Router};
use crate::templates::Templater;
use ::http::Method;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Display options of a page
///
/// Serialized with the field names templates expect: `iconClass`, `nav`,
/// `order`, `class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOptions {
	#[serde(default)]
	pub icon_class: Option<String>,
	/// Whether the page appears in the navigation
	#[serde(default = "default_nav")]
	pub nav: bool,
	/// Explicit navigation position
	#[serde(default)]
	pub order: Option<i64>,
	#[serde(default)]
	pub class: Option<String>,
}

fn default_nav() -> bool {
	true
}

impl Default for PageOptions {
	fn default() -> Self {
		Self {
			icon_class: None,
			nav: default_nav(),
			order: None,
			class: None,
		}
	}
}

impl PageOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_icon(mut self, icon_class: impl Into<String>) -> Self {
		self.icon_class = Some(icon_class.into());
		self
	}

	/// Keep the page out of the navigation
	pub fn hidden(mut self) -> Self {
		self.nav = false;
		self
	}

	pub fn with_order(mut self, order: i64) -> Self {
		self.order = Some(order);
		self
	}

	pub fn with_class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}
}

/// A registered admin page
#[derive(Debug, Clone)]
pub struct Page {
	pub title: String,
	/// Full path, base prefix included
	pub path: String,
	pub handler: Handler,
	pub options: PageOptions,
}

/// Navigation view of a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavEntry {
	pub title: String,
	pub path: String,
	pub options: PageOptions,
}

/// Pages and nav entries shared between the registry and the dispatcher
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
	pub(crate) pages: HashMap<String, Page>,
	nav: Vec<NavEntry>,
}

impl RegistryState {
	/// Nav entries sorted by explicit order, falling back to registration index
	pub(crate) fn sorted_nav(&self) -> Vec<NavEntry> {
		let mut indexed: Vec<(i64, &NavEntry)> = self
			.nav
			.iter()
			.enumerate()
			.map(|(index, entry)| (entry.options.order.unwrap_or(index as i64), entry))
			.collect();
		// sort_by_key is stable: equal keys keep registration order
		indexed.sort_by_key(|(key, _)| *key);
		indexed.into_iter().map(|(_, entry)| entry.clone()).collect()
	}
}

/// Join `path` onto `base`, adding the leading `/` and dropping a trailing one
///
/// `/` alone maps to the base itself.
pub(crate) fn join_path(base: &str, path: &str) -> String {
	let trimmed = path.trim().trim_end_matches('/');
	let full = if trimmed.is_empty() {
		base.to_string()
	} else if trimmed.starts_with('/') {
		format!("{}{}", base, trimmed)
	} else {
		format!("{}/{}", base, trimmed)
	};
	if full.is_empty() { "/".to_string() } else { full }
}

/// Router endpoint bound to every page
struct PageEndpoint {
	dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl Endpoint for PageEndpoint {
	async fn handle(&self, request: Request) -> Option<Response> {
		self.dispatcher.dispatch(request).await.into_response()
	}
}

/// Router endpoint bound to every bare route
struct RouteEndpoint {
	dispatcher: Arc<Dispatcher>,
	handler: Handler,
}

#[async_trait]
impl Endpoint for RouteEndpoint {
	async fn handle(&self, request: Request) -> Option<Response> {
		self.dispatcher
			.run_route(&self.handler, request)
			.await
			.into_response()
	}
}

/// Page and route registry
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::conf::AdminSettings;
/// use reinhardt_admin_console::handler::Handler;
/// use reinhardt_admin_console::registry::{PageOptions, Registry};
/// use reinhardt_admin_console::router::RouteTable;
/// use reinhardt_admin_console::templates::TeraTemplater;
/// use std::sync::Arc;
///
/// let router = Arc::new(RouteTable::new());
/// let templater = Arc::new(TeraTemplater::new().unwrap());
/// let registry = Registry::new(router.clone(), templater, AdminSettings::default());
///
/// registry
///     .register_page("Help", "help", PageOptions::new(), Handler::template("admin"))
///     .unwrap();
///
/// assert!(registry.page("/admin/help").is_some());
/// assert_eq!(registry.nav()[0].path, "/admin/help");
/// ```
pub struct Registry {
	state: Arc<RwLock<RegistryState>>,
	dispatcher: Arc<Dispatcher>,
	router: Arc<dyn Router>,
	settings: AdminSettings,
}

impl Registry {
	pub fn new(
		router: Arc<dyn Router>,
		templater: Arc<dyn Templater>,
		settings: AdminSettings,
	) -> Self {
		let state = Arc::new(RwLock::new(RegistryState::default()));
		let dispatcher = Arc::new(Dispatcher::new(
			Arc::clone(&state),
			templater,
			settings.clone(),
		));
		Self {
			state,
			dispatcher,
			router,
			settings,
		}
	}

	pub fn settings(&self) -> &AdminSettings {
		&self.settings
	}

	pub fn base_path(&self) -> &str {
		&self.settings.base_path
	}

	/// Full path of `path` under the admin base
	pub fn full_path(&self, path: &str) -> String {
		join_path(&self.settings.base_path, path)
	}

	/// Register a navigable page
	///
	/// The page is bound to `GET <base><path>` through the dispatcher and, unless
	/// `options.nav` is false, listed in the navigation.
	pub fn register_page(
		&self,
		title: impl Into<String>,
		path: &str,
		options: PageOptions,
		handler: Handler,
	) -> AdminResult<()> {
		let title = title.into();
		let path = self.full_path(path);

		if self.state.read().pages.contains_key(&path) {
			return Err(AdminError::DuplicatePath(path));
		}

		// The router is bound without holding the state lock
		let endpoint = Arc::new(PageEndpoint {
			dispatcher: Arc::clone(&self.dispatcher),
		});
		self.router.route(Method::GET, &path, endpoint)?;

		let mut state = self.state.write();
		if state.pages.contains_key(&path) {
			return Err(AdminError::DuplicatePath(path));
		}
		tracing::debug!(path = %path, title = %title, handler = handler.kind(), "registered admin page");
		if options.nav {
			state.nav.push(NavEntry {
				title: title.clone(),
				path: path.clone(),
				options: options.clone(),
			});
		}
		state.pages.insert(
			path.clone(),
			Page {
				title,
				path,
				handler,
				options,
			},
		);
		Ok(())
	}

	/// Register a bare route, outside the layout and the navigation
	///
	/// A missing method means `POST`.
	pub fn register_route(
		&self,
		method: Option<Method>,
		path: &str,
		handler: Handler,
	) -> AdminResult<()> {
		let method = method.unwrap_or(Method::POST);
		let path = self.full_path(path);
		tracing::debug!(%method, path = %path, handler = handler.kind(), "registered admin route");
		let endpoint = Arc::new(RouteEndpoint {
			dispatcher: Arc::clone(&self.dispatcher),
			handler,
		});
		self.router.route(method, &path, endpoint)
	}

	/// Shorthand for a `POST` route
	pub fn register_post(&self, path: &str, handler: Handler) -> AdminResult<()> {
		self.register_route(None, path, handler)
	}

	/// Look a page up by its full path
	pub fn page(&self, path: &str) -> Option<Page> {
		self.state.read().pages.get(path).cloned()
	}

	/// Full paths of every registered page, sorted
	pub fn page_paths(&self) -> Vec<String> {
		let mut paths: Vec<String> = self.state.read().pages.keys().cloned().collect();
		paths.sort();
		paths
	}

	/// Navigation entries in display order
	pub fn nav(&self) -> Vec<NavEntry> {
		self.state.read().sorted_nav()
	}

	pub fn dispatcher(&self) -> Arc<Dispatcher> {
		Arc::clone(&self.dispatcher)
	}

	/// Dispatch a request to the page registered on its matched path
	pub async fn dispatch(&self, request: Request) -> DispatchOutcome {
		self.dispatcher.dispatch(request).await
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry")
			.field("base_path", &self.settings.base_path)
			.field("pages", &self.page_paths())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::router::RouteTable;
	use crate::templates::TeraTemplater;
	use rstest::{fixture, rstest};

	struct Fixture {
		router: Arc<RouteTable>,
		registry: Registry,
	}

	#[fixture]
	fn fixture() -> Fixture {
		let router = Arc::new(RouteTable::new());
		let templater = Arc::new(TeraTemplater::new().unwrap());
		let registry = Registry::new(router.clone(), templater, AdminSettings::default());
		Fixture { router, registry }
	}

	#[rstest]
	#[case("/admin", "help", "/admin/help")]
	#[case("/admin", "/help", "/admin/help")]
	#[case("/admin", "/help/", "/admin/help")]
	#[case("/admin", "/", "/admin")]
	#[case("/admin", "", "/admin")]
	#[case("", "/", "/")]
	#[case("", "invoices", "/invoices")]
	fn test_join_path(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
		assert_eq!(join_path(base, path), expected);
	}

	#[rstest]
	fn test_register_page_binds_get_route(fixture: Fixture) {
		// Act
		fixture
			.registry
			.register_page("Help", "help", PageOptions::new(), Handler::template("admin"))
			.unwrap();

		// Assert
		assert_eq!(
			fixture.router.routes(),
			vec![(Method::GET, "/admin/help".to_string())]
		);
		assert_eq!(fixture.registry.page("/admin/help").unwrap().title, "Help");
	}

	#[rstest]
	fn test_duplicate_page_is_rejected(fixture: Fixture) {
		// Arrange
		fixture
			.registry
			.register_page("Help", "/help", PageOptions::new(), Handler::template("admin"))
			.unwrap();

		// Act
		let result = fixture.registry.register_page(
			"Other",
			"help",
			PageOptions::new(),
			Handler::template("admin"),
		);

		// Assert
		assert!(matches!(result, Err(AdminError::DuplicatePath(p)) if p == "/admin/help"));
		assert_eq!(fixture.router.routes().len(), 1);
		assert_eq!(fixture.registry.page("/admin/help").unwrap().title, "Help");
	}

	#[rstest]
	fn test_hidden_page_has_no_nav_entry(fixture: Fixture) {
		// Act
		fixture
			.registry
			.register_page(
				"New Invoice",
				"/invoices/create",
				PageOptions::new().hidden(),
				Handler::template("admin"),
			)
			.unwrap();

		// Assert
		assert!(fixture.registry.nav().is_empty());
		assert!(fixture.registry.page("/admin/invoices/create").is_some());
	}

	#[rstest]
	fn test_nav_orders_explicit_before_fallback(fixture: Fixture) {
		// Arrange
		let registry = &fixture.registry;
		registry
			.register_page("A", "/a", PageOptions::new().with_order(1), Handler::template("admin"))
			.unwrap();
		registry
			.register_page("B", "/b", PageOptions::new().with_order(0), Handler::template("admin"))
			.unwrap();
		registry
			.register_page("C", "/c", PageOptions::new(), Handler::template("admin"))
			.unwrap();

		// Act
		let titles: Vec<String> = registry.nav().into_iter().map(|e| e.title).collect();

		// Assert
		assert_eq!(titles, vec!["B", "A", "C"]);
	}

	#[rstest]
	fn test_register_route_defaults_to_post(fixture: Fixture) {
		// Act
		fixture
			.registry
			.register_route(None, "invoices/save", Handler::template("admin"))
			.unwrap();
		fixture
			.registry
			.register_route(Some(Method::GET), "/invoices/:id/remove", Handler::template("admin"))
			.unwrap();

		// Assert
		assert_eq!(
			fixture.router.routes(),
			vec![
				(Method::POST, "/admin/invoices/save".to_string()),
				(Method::GET, "/admin/invoices/:id/remove".to_string()),
			]
		);
		assert!(fixture.registry.nav().is_empty());
		assert!(fixture.registry.page_paths().is_empty());
	}

	/// Router that reads the registry back while binding
	#[derive(Default)]
	struct InspectingRouter {
		registry: std::sync::OnceLock<std::sync::Weak<Registry>>,
		seen: parking_lot::Mutex<Vec<Vec<String>>>,
	}

	impl Router for InspectingRouter {
		fn route(&self, _method: Method, _path: &str, _endpoint: Arc<dyn Endpoint>) -> AdminResult<()> {
			if let Some(registry) = self.registry.get().and_then(std::sync::Weak::upgrade) {
				self.seen.lock().push(registry.page_paths());
			}
			Ok(())
		}

		fn middleware(&self, _path: &str, _middleware: Arc<dyn crate::router::Middleware>) {}
	}

	#[rstest]
	fn test_router_may_read_registry_while_binding() {
		// Arrange
		let router = Arc::new(InspectingRouter::default());
		let templater = Arc::new(TeraTemplater::new().unwrap());
		let registry = Arc::new(Registry::new(router.clone(), templater, AdminSettings::default()));
		router.registry.set(Arc::downgrade(&registry)).unwrap();

		// Act
		registry
			.register_page("A", "/a", PageOptions::new(), Handler::template("admin"))
			.unwrap();
		registry
			.register_page("B", "/b", PageOptions::new(), Handler::template("admin"))
			.unwrap();

		// Assert
		assert_eq!(
			*router.seen.lock(),
			vec![Vec::<String>::new(), vec!["/admin/a".to_string()]]
		);
		assert_eq!(registry.page_paths(), vec!["/admin/a", "/admin/b"]);
	}

	#[rstest]
	fn test_page_options_serialize_template_names() {
		// Act
		let value = serde_json::to_value(PageOptions::new().with_icon("fa fa-file")).unwrap();

		// Assert
		assert_eq!(
			value,
			serde_json::json!({"iconClass": "fa fa-file", "nav": true, "order": null, "class": null})
		);
	}
}
