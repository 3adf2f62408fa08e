//! Page handler shapes
//!
//! A page is served by one of three handler shapes, modelled as a tagged union:
//!
//! - [`Handler::Template`]: render a template with the standard page context
//! - [`Handler::Callback`]: run code, then render whatever it returns
//! - [`Handler::Directive`]: render a fixed template with extra context
//!
//! Callbacks report what they produced through [`HandlerOutput`].

use crate::error::AdminResult;
use crate::http::{Request, ResponseWriter};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Explicit template + context, overriding the default layout
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDirective {
	pub template: String,
	/// Merged over the standard page context; keys here win
	pub options: Map<String, Value>,
}

impl RenderDirective {
	pub fn new(template: impl Into<String>) -> Self {
		Self {
			template: template.into(),
			options: Map::new(),
		}
	}

	/// Add a context entry
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.options.insert(key.into(), value.into());
		self
	}

	pub fn with_options(mut self, options: Map<String, Value>) -> Self {
		self.options.extend(options);
		self
	}
}

/// What a callback produced
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
	/// The callback owns the response (written to the [`ResponseWriter`], or
	/// intentionally withheld); nothing is rendered
	Handled,
	/// Markup wrapped as `content` inside the admin layout
	Content(String),
	/// Explicit template and context
	Directive(RenderDirective),
}

impl From<String> for HandlerOutput {
	fn from(content: String) -> Self {
		HandlerOutput::Content(content)
	}
}

impl From<&str> for HandlerOutput {
	fn from(content: &str) -> Self {
		HandlerOutput::Content(content.to_string())
	}
}

impl From<RenderDirective> for HandlerOutput {
	fn from(directive: RenderDirective) -> Self {
		HandlerOutput::Directive(directive)
	}
}

/// Callback handler
///
/// Implemented for any `Fn(Request, ResponseWriter) -> impl Future<Output = AdminResult<HandlerOutput>>`.
#[async_trait]
pub trait PageHandler: Send + Sync {
	async fn call(&self, request: Request, response: ResponseWriter) -> AdminResult<HandlerOutput>;
}

#[async_trait]
impl<F, Fut> PageHandler for F
where
	F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = AdminResult<HandlerOutput>> + Send + 'static,
{
	async fn call(&self, request: Request, response: ResponseWriter) -> AdminResult<HandlerOutput> {
		(self)(request, response).await
	}
}

/// Page handler shape
#[derive(Clone)]
pub enum Handler {
	Template(String),
	Callback(Arc<dyn PageHandler>),
	Directive(RenderDirective),
}

impl Handler {
	pub fn template(name: impl Into<String>) -> Self {
		Handler::Template(name.into())
	}

	/// Wrap an async closure
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::handler::{Handler, HandlerOutput};
	///
	/// let handler = Handler::callback(|_request, _response| async {
	///     Ok(HandlerOutput::from("<p>Hello</p>"))
	/// });
	/// assert_eq!(handler.kind(), "callback");
	/// ```
	pub fn callback<F, Fut>(handler: F) -> Self
	where
		F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = AdminResult<HandlerOutput>> + Send + 'static,
	{
		Handler::Callback(Arc::new(handler))
	}

	/// Wrap a [`PageHandler`] implementation
	pub fn from_handler(handler: impl PageHandler + 'static) -> Self {
		Handler::Callback(Arc::new(handler))
	}

	pub fn directive(directive: RenderDirective) -> Self {
		Handler::Directive(directive)
	}

	/// Shape name, for logs
	pub fn kind(&self) -> &'static str {
		match self {
			Handler::Template(_) => "template",
			Handler::Callback(_) => "callback",
			Handler::Directive(_) => "directive",
		}
	}
}

impl std::fmt::Debug for Handler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Handler::Template(name) => f.debug_tuple("Template").field(name).finish(),
			Handler::Callback(_) => f.write_str("Callback(..)"),
			Handler::Directive(d) => f.debug_tuple("Directive").field(d).finish(),
		}
	}
}
