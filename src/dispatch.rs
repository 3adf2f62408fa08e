//! Request dispatcher
//!
//! Resolves a request to its registered page, runs the page handler and turns
//! what it produced into a rendered response. Failures never escape: they
//! are logged and reported as [`DispatchOutcome::Abandoned`].

use crate::conf::AdminSettings;
use crate::error::{AdminError, AdminResult};
use crate::handler::{Handler, HandlerOutput, RenderDirective};
use crate::http::{Request, Response, ResponseWriter};
use crate::registry::{NavEntry, Page, RegistryState};
use crate::templates::Templater;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// How a request ended
#[derive(Debug)]
pub enum DispatchOutcome {
	/// No page is registered on the matched path
	NotFound,
	/// A template was rendered
	Rendered(Response),
	/// The handler wrote its own response
	Responded(Response),
	/// The handler deliberately produced nothing
	Unanswered,
	/// The handler (or rendering) failed; no response was generated
	Abandoned(AdminError),
}

impl DispatchOutcome {
	/// Response to hand back to the router, if any
	pub fn into_response(self) -> Option<Response> {
		match self {
			DispatchOutcome::NotFound => Some(Response::not_found()),
			DispatchOutcome::Rendered(response) | DispatchOutcome::Responded(response) => {
				Some(response)
			}
			DispatchOutcome::Unanswered | DispatchOutcome::Abandoned(_) => None,
		}
	}

	pub fn response(&self) -> Option<&Response> {
		match self {
			DispatchOutcome::Rendered(response) | DispatchOutcome::Responded(response) => {
				Some(response)
			}
			_ => None,
		}
	}

	pub fn is_abandoned(&self) -> bool {
		matches!(self, DispatchOutcome::Abandoned(_))
	}

	pub fn error(&self) -> Option<&AdminError> {
		match self {
			DispatchOutcome::Abandoned(error) => Some(error),
			_ => None,
		}
	}
}

/// Page dispatcher
pub struct Dispatcher {
	state: Arc<RwLock<RegistryState>>,
	templater: Arc<dyn Templater>,
	settings: AdminSettings,
}

impl Dispatcher {
	pub(crate) fn new(
		state: Arc<RwLock<RegistryState>>,
		templater: Arc<dyn Templater>,
		settings: AdminSettings,
	) -> Self {
		Self {
			state,
			templater,
			settings,
		}
	}

	pub fn templater(&self) -> Arc<dyn Templater> {
		Arc::clone(&self.templater)
	}

	/// Serve `request` with the page registered on its matched path
	pub async fn dispatch(&self, request: Request) -> DispatchOutcome {
		let key = request.route_or_path().to_string();
		let (page, nav) = {
			let state = self.state.read();
			(state.pages.get(&key).cloned(), state.sorted_nav())
		};
		let Some(page) = page else {
			tracing::debug!(path = %key, "no admin page registered");
			return DispatchOutcome::NotFound;
		};

		match self.run_page(&page, nav, request).await {
			Ok(outcome) => outcome,
			Err(error) => {
				tracing::error!(
					path = %page.path,
					handler = page.handler.kind(),
					error = %error,
					"admin page handler failed"
				);
				DispatchOutcome::Abandoned(error)
			}
		}
	}

	/// Serve `request` with a bare route handler: no layout, no navigation
	pub async fn run_route(&self, handler: &Handler, request: Request) -> DispatchOutcome {
		let path = request.path().to_string();
		match self.run_bare(handler, request).await {
			Ok(outcome) => outcome,
			Err(error) => {
				tracing::error!(
					path = %path,
					handler = handler.kind(),
					error = %error,
					"admin route handler failed"
				);
				DispatchOutcome::Abandoned(error)
			}
		}
	}

	async fn run_page(
		&self,
		page: &Page,
		nav: Vec<NavEntry>,
		request: Request,
	) -> AdminResult<DispatchOutcome> {
		let mut context = self.page_context(page, nav, &request)?;
		match &page.handler {
			Handler::Template(name) => self.render(name, context).await,
			Handler::Directive(directive) => self.render_directive(directive, context).await,
			Handler::Callback(callback) => {
				let messages = request.messages().clone();
				let writer = ResponseWriter::new();
				let output = callback.call(request, writer.clone()).await?;
				// A response written by the callback always wins
				if let Some(response) = writer.take() {
					return Ok(DispatchOutcome::Responded(response));
				}
				context.insert("messages".into(), to_value(&messages.peek())?);
				match output {
					HandlerOutput::Handled => Ok(DispatchOutcome::Unanswered),
					HandlerOutput::Content(content) => {
						context.insert("content".into(), Value::String(content));
						self.render(&self.settings.layout_template, context).await
					}
					HandlerOutput::Directive(directive) => {
						self.render_directive(&directive, context).await
					}
				}
			}
		}
	}

	async fn run_bare(&self, handler: &Handler, request: Request) -> AdminResult<DispatchOutcome> {
		let context = self.base_context(&request)?;
		match handler {
			Handler::Template(name) => self.render(name, context).await,
			Handler::Directive(directive) => self.render_directive(directive, context).await,
			Handler::Callback(callback) => {
				let writer = ResponseWriter::new();
				let output = callback.call(request, writer.clone()).await?;
				if let Some(response) = writer.take() {
					return Ok(DispatchOutcome::Responded(response));
				}
				match output {
					HandlerOutput::Handled => Ok(DispatchOutcome::Unanswered),
					HandlerOutput::Content(content) => {
						Ok(DispatchOutcome::Responded(Response::html(content)))
					}
					HandlerOutput::Directive(directive) => {
						self.render_directive(&directive, context).await
					}
				}
			}
		}
	}

	/// `{basePath, config, request, messages}`
	fn base_context(&self, request: &Request) -> AdminResult<Map<String, Value>> {
		let base_path = request.base_path().unwrap_or(&self.settings.base_path);
		let mut context = Map::new();
		context.insert("basePath".into(), Value::String(base_path.to_string()));
		context.insert("config".into(), to_value(&self.settings)?);
		context.insert("request".into(), to_value(&request.summary())?);
		context.insert("messages".into(), to_value(&request.messages().peek())?);
		Ok(context)
	}

	/// Standard page context: the base context plus `{title, nav}`
	fn page_context(
		&self,
		page: &Page,
		nav: Vec<NavEntry>,
		request: &Request,
	) -> AdminResult<Map<String, Value>> {
		let mut context = self.base_context(request)?;
		context.insert("title".into(), Value::String(page.title.clone()));
		context.insert("nav".into(), to_value(&nav)?);
		Ok(context)
	}

	async fn render_directive(
		&self,
		directive: &RenderDirective,
		mut context: Map<String, Value>,
	) -> AdminResult<DispatchOutcome> {
		context.extend(directive.options.clone());
		self.render(&directive.template, context).await
	}

	async fn render(&self, template: &str, context: Map<String, Value>) -> AdminResult<DispatchOutcome> {
		let html = self.templater.render(template, &Value::Object(context)).await?;
		Ok(DispatchOutcome::Rendered(Response::html(html)))
	}
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> AdminResult<Value> {
	serde_json::to_value(value).map_err(|e| AdminError::Template(e.to_string()))
}
