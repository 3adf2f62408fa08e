//! Model-driven CRUD engine
//!
//! A [`CrudEngine`] turns one [`ModelConfig`] into a complete admin section:
//! a list page, create and edit forms, remove and save routes, and optional
//! import pages. Forms and lists are derived from the model's schema through
//! the [`Introspector`]; submitted values are coerced back with
//! [`coerce::coerce_values`].
//!
//! | Method | Path                  | Kind  |
//! |--------|-----------------------|-------|
//! | GET    | `<base>`              | page  |
//! | GET    | `<base>/create`       | page  |
//! | GET    | `<base>/:id/edit`     | page  |
//! | GET    | `<base>/:id/remove`   | route |
//! | POST   | `<base>/save`         | route |
//! | GET    | `<base>/import`       | page (when an upload type is set) |
//! | POST   | `<base>/import`       | route (when an upload type is set) |

pub mod coerce;
pub mod config;

pub use coerce::{Coerced, DroppedField};
pub use config::{ConfigResolver, ModelConfig, ResolvedModelConfig};

use crate::error::{AdminError, AdminResult};
use crate::handler::{Handler, HandlerOutput, RenderDirective};
use crate::http::{Request, ResponseWriter};
use crate::import::Importer;
use crate::introspect::Introspector;
use crate::registry::{ActionOptions, ActionRegistry, PageOptions, Registry};
use crate::storage::{FindQuery, ModelStore, Record, Repository};
use crate::templates::{FORM_TEMPLATE, IMPORT_TEMPLATE, LIST_TEMPLATE, Templater};
use crate::text::is_truthy;
use ::http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// What a save request did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveAction {
	Created,
	Updated,
	/// The store rejected the values; carries the flashed error text
	Failed(String),
}

/// Result of [`CrudEngine::save`]
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
	pub action: SaveAction,
	/// The stored record, when the save succeeded
	pub record: Option<Record>,
	/// Fields removed during coercion
	pub dropped: Vec<DroppedField>,
	/// Where the client was redirected
	pub redirect: String,
}

/// Collaborators a CRUD engine registers into and reads from
#[derive(Clone)]
pub struct CrudContext {
	pub actions: Arc<ActionRegistry>,
	pub repository: Arc<dyn Repository>,
	pub importer: Option<Arc<dyn Importer>>,
}

struct CrudInner {
	config: ResolvedModelConfig,
	/// Admin base path + model base
	base_url: String,
	store: Arc<dyn ModelStore>,
	introspector: Introspector,
	actions: Arc<ActionRegistry>,
	importer: Option<Arc<dyn Importer>>,
}

/// Per-model admin controller
#[derive(Clone)]
pub struct CrudEngine {
	inner: Arc<CrudInner>,
}

impl CrudEngine {
	/// Resolve the configuration and register the model's pages, routes,
	/// actions and default templates
	pub fn register(
		resolver: &dyn ConfigResolver,
		registry: &Registry,
		context: CrudContext,
	) -> AdminResult<Self> {
		let config = resolver.resolve_config().resolve()?;
		let store = context.repository.store(&config.model).ok_or_else(|| {
			AdminError::Configuration(format!("no store registered for model '{}'", config.model))
		})?;
		let importer = match (&config.upload_type, context.importer) {
			(Some(_), Some(importer)) => Some(importer),
			(Some(upload_type), None) => {
				return Err(AdminError::Configuration(format!(
					"model '{}' accepts '{}' uploads but no importer is configured",
					config.model, upload_type
				)));
			}
			(None, _) => None,
		};

		let introspector = Introspector::new(Arc::clone(&context.repository))
			.with_display(config.display.clone())
			.with_ignore(config.ignore.clone());

		let engine = Self {
			inner: Arc::new(CrudInner {
				base_url: registry.full_path(&config.base),
				config,
				store,
				introspector,
				actions: context.actions,
				importer,
			}),
		};
		engine.register_templates(registry.dispatcher().templater().as_ref())?;
		engine.register_actions();
		engine.register_routes(registry)?;

		tracing::debug!(
			model = %engine.inner.config.model,
			base = %engine.inner.base_url,
			"registered model admin"
		);
		Ok(engine)
	}

	pub fn config(&self) -> &ResolvedModelConfig {
		&self.inner.config
	}

	/// Full URL of the list page
	pub fn base_url(&self) -> &str {
		&self.inner.base_url
	}

	fn register_templates(&self, templater: &dyn Templater) -> AdminResult<()> {
		let config = &self.inner.config;
		templater.register_default(&config.list_template(), LIST_TEMPLATE)?;
		templater.register_default(&config.form_template(), FORM_TEMPLATE)?;
		if config.import_enabled() {
			templater.register_default(&config.import_template(), IMPORT_TEMPLATE)?;
		}
		Ok(())
	}

	fn register_actions(&self) {
		let config = &self.inner.config;
		let actions = &self.inner.actions;
		actions.model_action(
			&config.model,
			"Create",
			"create",
			ActionOptions::new().with_icon("fa fa-plus"),
		);
		actions.instance_action(
			&config.model,
			"Edit",
			"edit",
			ActionOptions::new().with_icon("fa fa-edit"),
		);
		actions.instance_action(
			&config.model,
			"Remove",
			"remove",
			ActionOptions::new()
				.with_icon("fa fa-trash")
				.with_display_class("danger"),
		);
		if config.import_enabled() {
			actions.model_action(
				&config.model,
				"Import",
				"import",
				ActionOptions::new().with_icon("fa fa-upload"),
			);
		}
	}

	fn register_routes(&self, registry: &Registry) -> AdminResult<()> {
		let config = &self.inner.config;
		let base = &config.base;

		registry.register_page(
			config.plural_name.clone(),
			base,
			PageOptions::new().with_icon(config.icon_class.clone()),
			self.handler(|engine, request, _| async move { engine.list(request).await }),
		)?;
		registry.register_page(
			format!("New {}", config.display_name),
			&format!("{}/create", base),
			PageOptions::new().hidden(),
			self.handler(|engine, request, _| async move { engine.create(request).await }),
		)?;
		registry.register_page(
			format!("Edit {}", config.display_name),
			&format!("{}/:id/edit", base),
			PageOptions::new().hidden(),
			self.handler(|engine, request, _| async move { engine.edit(request).await }),
		)?;
		registry.register_route(
			Some(Method::GET),
			&format!("{}/:id/remove", base),
			self.handler(|engine, request, response| async move {
				engine.remove(request, response).await
			}),
		)?;
		registry.register_post(
			&format!("{}/save", base),
			self.handler(|engine, request, response| async move {
				engine.save(request, response, None).await?;
				Ok(HandlerOutput::Handled)
			}),
		)?;

		if config.import_enabled() {
			registry.register_page(
				format!("Import {}", config.plural_name),
				&format!("{}/import", base),
				PageOptions::new().hidden(),
				self.handler(|engine, request, _| async move { engine.import(request).await }),
			)?;
			registry.register_post(
				&format!("{}/import", base),
				self.handler(|engine, request, response| async move {
					engine.save_import(request, response).await
				}),
			)?;
		}
		Ok(())
	}

	/// Bind an engine method as a callback handler
	fn handler<F, Fut>(&self, method: F) -> Handler
	where
		F: Fn(CrudEngine, Request, ResponseWriter) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = AdminResult<HandlerOutput>> + Send + 'static,
	{
		let engine = self.clone();
		Handler::callback(move |request, response| method(engine.clone(), request, response))
	}

	fn populate_query(&self) -> FindQuery {
		FindQuery::new().populate(self.inner.config.model_populate.iter().cloned())
	}

	fn required_id(request: &Request) -> AdminResult<String> {
		request
			.param("id")
			.filter(|id| !id.is_empty())
			.map(str::to_string)
			.ok_or_else(|| AdminError::NotFound("request carries no record id".into()))
	}

	/// List view
	pub async fn list(&self, _request: Request) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		let instances = inner
			.store
			.find(self.populate_query())
			.await
			.map_err(AdminError::fetch)?;
		let attributes = inner
			.introspector
			.attributes(&inner.store.schema(), false)
			.await?;

		Ok(HandlerOutput::Directive(
			RenderDirective::new(inner.config.list_template())
				.with("instances", instances)
				.with("attributes", to_value(&attributes)?)
				.with("actions", to_value(&inner.actions.model_actions(&inner.config.model))?)
				.with(
					"instanceActions",
					to_value(&inner.actions.instance_actions(&inner.config.model))?,
				)
				.with("name", inner.config.display_name.clone())
				.with("base", inner.base_url.clone())
				.with("title", inner.config.plural_name.clone()),
		))
	}

	/// Edit form
	///
	/// The record and the relation-aware attributes are fetched concurrently.
	pub async fn edit(&self, request: Request) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		let id = Self::required_id(&request)?;
		let schema = inner.store.schema();

		let fetch = async {
			match inner.store.find_one(&id, self.populate_query()).await {
				Ok(Some(instance)) => Ok(instance),
				Ok(None) => Err(AdminError::Fetch(format!(
					"{} '{}' not found",
					inner.config.model, id
				))),
				Err(e) => Err(AdminError::fetch(e)),
			}
		};
		let (instance, attributes) =
			futures::try_join!(fetch, inner.introspector.attributes(&schema, true))?;

		Ok(HandlerOutput::Directive(
			self.form_directive(format!("Edit {}", inner.config.display_name), instance)
				.with("attributes", to_value(&attributes)?)
				.with(
					"instanceActions",
					to_value(&inner.actions.instance_actions(&inner.config.model))?,
				),
		))
	}

	/// New-instance form
	pub async fn create(&self, _request: Request) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		let instance: Record = inner
			.config
			.model_populate
			.iter()
			.map(|relation| (relation.clone(), Value::Object(Map::new())))
			.collect();
		let attributes = inner
			.introspector
			.attributes(&inner.store.schema(), true)
			.await?;

		Ok(HandlerOutput::Directive(
			self.form_directive(format!("New {}", inner.config.display_name), instance)
				.with("attributes", to_value(&attributes)?),
		))
	}

	fn form_directive(&self, title: String, instance: Record) -> RenderDirective {
		let inner = &self.inner;
		RenderDirective::new(inner.config.form_template())
			.with("instance", instance)
			.with("name", inner.config.display_name.clone())
			.with("base", inner.base_url.clone())
			.with("title", title)
	}

	/// Destroy the record and return to the list
	pub async fn remove(&self, request: Request, response: ResponseWriter) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		let id = Self::required_id(&request)?;
		let destroyed = inner.store.destroy(&id).await?;
		tracing::info!(model = %inner.config.model, id = %id, count = destroyed.len(), "removed record");

		request
			.messages()
			.info(format!("{} deleted", inner.config.display_name));
		response.redirect(&inner.base_url);
		Ok(HandlerOutput::Handled)
	}

	/// Create or update a record from submitted values
	///
	/// `values` defaults to the request body. A truthy `id` updates that
	/// record, anything else creates one. Store failures are recovered: the
	/// error is flashed and the client is sent back to the originating form.
	pub async fn save(
		&self,
		request: Request,
		response: ResponseWriter,
		values: Option<Record>,
	) -> AdminResult<SaveOutcome> {
		let inner = &self.inner;
		let values = values.unwrap_or_else(|| request.body().clone());
		let attributes = inner.introspector.describe(&inner.store.schema());
		let Coerced {
			mut values,
			dropped,
		} = coerce::coerce_values(&attributes, values);

		let id = values
			.get("id")
			.filter(|v| is_truthy(v))
			.and_then(id_string)
			.filter(|id| !id.is_empty());
		let result = match &id {
			Some(id) => inner
				.store
				.update(id, values)
				.await
				.map_err(AdminError::save)
				.and_then(|updated| {
					updated.into_iter().next().ok_or_else(|| {
						AdminError::Save(format!("{} '{}' not found", inner.config.model, id))
					})
				})
				.map(|record| (SaveAction::Updated, record)),
			None => {
				values.remove("id");
				inner
					.store
					.create(values)
					.await
					.map_err(AdminError::save)
					.map(|record| (SaveAction::Created, record))
			}
		};

		let outcome = match result {
			Ok((action, record)) => {
				tracing::info!(model = %inner.config.model, action = ?action, "saved record");
				request
					.messages()
					.info(format!("{} saved", inner.config.display_name));
				SaveOutcome {
					action,
					record: Some(record),
					dropped,
					redirect: inner.base_url.clone(),
				}
			}
			Err(error) => {
				tracing::error!(model = %inner.config.model, error = %error, "failed to save record");
				let message = error.to_string();
				request.messages().error(message.clone());
				let redirect = match &id {
					Some(id) => format!("{}/{}/edit", inner.base_url, id),
					None => format!("{}/create", inner.base_url),
				};
				SaveOutcome {
					action: SaveAction::Failed(message),
					record: None,
					dropped,
					redirect,
				}
			}
		};

		response.redirect(&outcome.redirect);
		Ok(outcome)
	}

	/// Upload form
	pub async fn import(&self, _request: Request) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		Ok(HandlerOutput::Directive(
			RenderDirective::new(inner.config.import_template())
				.with("base", inner.base_url.clone())
				.with("name", inner.config.plural_name.clone())
				.with("uploadType", inner.config.upload_type.clone())
				.with("title", format!("Import {}", inner.config.plural_name)),
		))
	}

	/// Import the uploaded file and return to the list
	pub async fn save_import(
		&self,
		request: Request,
		response: ResponseWriter,
	) -> AdminResult<HandlerOutput> {
		let inner = &self.inner;
		let (Some(importer), Some(upload_type)) = (&inner.importer, &inner.config.upload_type) else {
			return Err(AdminError::Import(format!(
				"imports are not enabled for model '{}'",
				inner.config.model
			)));
		};
		let upload = request
			.upload()
			.ok_or_else(|| AdminError::Import("no file was uploaded".into()))?;

		let mut options = inner.config.upload_options.clone();
		options.insert("type".into(), Value::String(upload_type.clone()));

		let records = importer
			.import_file_to_model(&inner.config.model, &upload.path, options)
			.await?;
		tracing::info!(
			model = %inner.config.model,
			file = %upload.filename,
			count = records.len(),
			"imported records"
		);

		request.messages().info(format!(
			"Imported {} {}",
			records.len(),
			inner.config.plural_name
		));
		response.redirect(&inner.base_url);
		Ok(HandlerOutput::Handled)
	}
}

impl std::fmt::Debug for CrudEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CrudEngine")
			.field("model", &self.inner.config.model)
			.field("base_url", &self.inner.base_url)
			.finish()
	}
}

fn id_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.trim().to_string()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> AdminResult<Value> {
	serde_json::to_value(value).map_err(|e| AdminError::Template(e.to_string()))
}
