//! Admin site
//!
//! [`AdminSite`] owns the page registry and the action registry and wires them
//! to the router, templater, storage, import and auth collaborators. Host
//! modules receive the site at startup and register their pages, routes and
//! model admins on it.

use crate::auth::AdminAuth;
use crate::conf::AdminSettings;
use crate::crud::{ConfigResolver, CrudContext, CrudEngine};
use crate::dispatch::DispatchOutcome;
use crate::error::{AdminError, AdminResult};
use crate::handler::{Handler, HandlerOutput};
use crate::http::{Request, Response};
use crate::import::{FileImporter, Importer};
use crate::registry::{ActionRegistry, NavEntry, PageOptions, Registry};
use crate::router::{Middleware, Router};
use crate::storage::Repository;
use crate::templates::{TeraTemplater, Templater};
use ::http::Method;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Stamps the admin base path on every request below it
struct BasePathMiddleware {
	base_path: String,
}

#[async_trait]
impl Middleware for BasePathMiddleware {
	async fn process(&self, request: &mut Request) -> Option<Response> {
		request.set_base_path(self.base_path.clone());
		None
	}
}

/// Builder for [`AdminSite`]
#[derive(Default)]
pub struct AdminSiteBuilder {
	settings: Option<AdminSettings>,
	router: Option<Arc<dyn Router>>,
	templater: Option<Arc<dyn Templater>>,
	repository: Option<Arc<dyn Repository>>,
	importer: Option<Arc<dyn Importer>>,
	auth: Option<Arc<dyn AdminAuth>>,
	dashboard: Option<Handler>,
}

impl AdminSiteBuilder {
	pub fn settings(mut self, settings: AdminSettings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Router the admin binds its pages and routes to (required)
	pub fn router(mut self, router: Arc<dyn Router>) -> Self {
		self.router = Some(router);
		self
	}

	/// Templater used for every page; defaults to [`TeraTemplater::new`]
	pub fn templater(mut self, templater: Arc<dyn Templater>) -> Self {
		self.templater = Some(templater);
		self
	}

	/// Storage the model admins read and write (required)
	pub fn repository(mut self, repository: Arc<dyn Repository>) -> Self {
		self.repository = Some(repository);
		self
	}

	/// Importer for model uploads; defaults to a [`FileImporter`] over the repository
	pub fn importer(mut self, importer: Arc<dyn Importer>) -> Self {
		self.importer = Some(importer);
		self
	}

	pub fn auth(mut self, auth: Arc<dyn AdminAuth>) -> Self {
		self.auth = Some(auth);
		self
	}

	/// Handler served at the base path
	pub fn dashboard(mut self, handler: Handler) -> Self {
		self.dashboard = Some(handler);
		self
	}

	/// Validate the settings, gate the base path and register the dashboard
	pub fn build(self) -> AdminResult<AdminSite> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;
		let router = self
			.router
			.ok_or_else(|| AdminError::Configuration("admin site requires a router".into()))?;
		let repository = self
			.repository
			.ok_or_else(|| AdminError::Configuration("admin site requires a repository".into()))?;
		let templater: Arc<dyn Templater> = match self.templater {
			Some(templater) => templater,
			None => Arc::new(TeraTemplater::new()?),
		};
		let importer: Arc<dyn Importer> = match self.importer {
			Some(importer) => importer,
			None => Arc::new(FileImporter::new(Arc::clone(&repository))),
		};

		let base_path = settings.base_path.clone();
		let wildcard = format!("{}/*", base_path);
		match &self.auth {
			Some(auth) => {
				let base = if base_path.is_empty() { "/" } else { base_path.as_str() };
				auth.protected_route(base);
				auth.protected_route(&wildcard);
				if settings.admin_only {
					auth.ensure_admin(base);
					auth.ensure_admin(&wildcard);
				}
			}
			None => tracing::warn!(base_path = %base_path, "admin site built without an auth collaborator"),
		}
		router.middleware(
			&wildcard,
			Arc::new(BasePathMiddleware {
				base_path: base_path.clone(),
			}),
		);

		let registry = Registry::new(Arc::clone(&router), Arc::clone(&templater), settings);
		let dashboard = self.dashboard.unwrap_or_else(|| {
			Handler::callback(|_request, _response| async { Ok(HandlerOutput::from("Hello Admin")) })
		});
		registry.register_page("Dashboard", "/", PageOptions::new().hidden(), dashboard)?;
		tracing::debug!(base_path = %base_path, "admin site ready");

		Ok(AdminSite {
			registry,
			actions: Arc::new(ActionRegistry::new()),
			templater,
			repository,
			importer,
			models: RwLock::new(IndexMap::new()),
		})
	}
}

/// The admin console
pub struct AdminSite {
	registry: Registry,
	actions: Arc<ActionRegistry>,
	templater: Arc<dyn Templater>,
	repository: Arc<dyn Repository>,
	importer: Arc<dyn Importer>,
	models: RwLock<IndexMap<String, CrudEngine>>,
}

impl AdminSite {
	pub fn builder() -> AdminSiteBuilder {
		AdminSiteBuilder::default()
	}

	pub fn settings(&self) -> &AdminSettings {
		self.registry.settings()
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn actions(&self) -> Arc<ActionRegistry> {
		Arc::clone(&self.actions)
	}

	pub fn templater(&self) -> Arc<dyn Templater> {
		Arc::clone(&self.templater)
	}

	pub fn repository(&self) -> Arc<dyn Repository> {
		Arc::clone(&self.repository)
	}

	/// See [`Registry::register_page`]
	pub fn register_page(
		&self,
		title: impl Into<String>,
		path: &str,
		options: PageOptions,
		handler: Handler,
	) -> AdminResult<()> {
		self.registry.register_page(title, path, options, handler)
	}

	/// See [`Registry::register_route`]
	pub fn register_route(
		&self,
		method: Option<Method>,
		path: &str,
		handler: Handler,
	) -> AdminResult<()> {
		self.registry.register_route(method, path, handler)
	}

	/// See [`Registry::register_post`]
	pub fn register_post(&self, path: &str, handler: Handler) -> AdminResult<()> {
		self.registry.register_post(path, handler)
	}

	/// Register a model admin
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::crud::ModelConfig;
	/// use reinhardt_admin_console::router::RouteTable;
	/// use reinhardt_admin_console::site::AdminSite;
	/// use reinhardt_admin_console::storage::{MemoryRepository, ModelSchema};
	/// use std::sync::Arc;
	///
	/// let repository = Arc::new(MemoryRepository::new());
	/// repository.register(ModelSchema::new("invoice"));
	///
	/// let site = AdminSite::builder()
	///     .router(Arc::new(RouteTable::new()))
	///     .repository(repository)
	///     .build()
	///     .unwrap();
	///
	/// let engine = site.register_model(&ModelConfig::for_model("invoice")).unwrap();
	/// assert_eq!(engine.base_url(), "/admin/invoices");
	/// ```
	pub fn register_model(&self, resolver: &dyn ConfigResolver) -> AdminResult<CrudEngine> {
		let engine = CrudEngine::register(
			resolver,
			&self.registry,
			CrudContext {
				actions: Arc::clone(&self.actions),
				repository: Arc::clone(&self.repository),
				importer: Some(Arc::clone(&self.importer)),
			},
		)?;
		self.models
			.write()
			.insert(engine.config().model.clone(), engine.clone());
		Ok(engine)
	}

	/// Model admin registered for `model`
	pub fn model(&self, model: &str) -> Option<CrudEngine> {
		self.models.read().get(model).cloned()
	}

	/// Registered model identities, in registration order
	pub fn model_names(&self) -> Vec<String> {
		self.models.read().keys().cloned().collect()
	}

	pub fn nav(&self) -> Vec<NavEntry> {
		self.registry.nav()
	}

	/// Dispatch a request to the page registered on its matched path
	pub async fn dispatch(&self, request: Request) -> DispatchOutcome {
		self.registry.dispatch(request).await
	}
}

impl std::fmt::Debug for AdminSite {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AdminSite")
			.field("registry", &self.registry)
			.field("models", &self.model_names())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::auth::{Guard, RouteGuards};
	use crate::crud::ModelConfig;
	use crate::router::RouteTable;
	use crate::storage::{MemoryRepository, ModelSchema};
	use rstest::rstest;

	fn repository() -> Arc<MemoryRepository> {
		let repository = Arc::new(MemoryRepository::new());
		repository.register(ModelSchema::new("invoice"));
		repository
	}

	#[rstest]
	fn test_build_gates_base_path() {
		// Arrange
		let guards = Arc::new(RouteGuards::new());

		// Act
		AdminSite::builder()
			.router(Arc::new(RouteTable::new()))
			.repository(repository())
			.auth(guards.clone())
			.build()
			.unwrap();

		// Assert
		assert_eq!(
			guards.rules(),
			vec![
				("/admin".to_string(), Guard::Authenticated),
				("/admin/*".to_string(), Guard::Authenticated),
				("/admin".to_string(), Guard::Admin),
				("/admin/*".to_string(), Guard::Admin),
			]
		);
	}

	#[rstest]
	fn test_admin_only_can_be_disabled() {
		// Arrange
		let guards = Arc::new(RouteGuards::new());

		// Act
		AdminSite::builder()
			.settings(AdminSettings::default().with_admin_only(false))
			.router(Arc::new(RouteTable::new()))
			.repository(repository())
			.auth(guards.clone())
			.build()
			.unwrap();

		// Assert
		assert_eq!(guards.guard_for("/admin/invoices"), Guard::Authenticated);
	}

	#[rstest]
	fn test_build_requires_router_and_repository() {
		assert!(matches!(
			AdminSite::builder().repository(repository()).build(),
			Err(AdminError::Configuration(_))
		));
		assert!(matches!(
			AdminSite::builder().router(Arc::new(RouteTable::new())).build(),
			Err(AdminError::Configuration(_))
		));
	}

	#[rstest]
	fn test_invalid_settings_are_rejected() {
		// Act
		let result = AdminSite::builder()
			.settings(AdminSettings::default().with_base_path("admin/"))
			.router(Arc::new(RouteTable::new()))
			.repository(repository())
			.build();

		// Assert
		assert!(matches!(result, Err(AdminError::Settings(_))));
	}

	#[rstest]
	fn test_register_model_tracks_engines() {
		// Arrange
		let site = AdminSite::builder()
			.router(Arc::new(RouteTable::new()))
			.repository(repository())
			.build()
			.unwrap();

		// Act
		site.register_model(&ModelConfig::for_model("invoice")).unwrap();
		let missing = site.register_model(&ModelConfig::for_model("ledger"));

		// Assert
		assert_eq!(site.model_names(), vec!["invoice"]);
		assert!(site.model("invoice").is_some());
		assert!(matches!(missing, Err(AdminError::Configuration(_))));
	}
}
