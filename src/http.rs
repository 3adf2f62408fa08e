//! Request and response types exchanged with the router collaborator

use crate::messages::FlashMessages;
use crate::storage::Record;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue, LOCATION};
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A file received through a multipart upload and spooled to disk by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	/// Original client-side file name
	pub filename: String,
	/// Location of the spooled file
	pub path: PathBuf,
}

impl UploadedFile {
	pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
		Self {
			filename: filename.into(),
			path: path.into(),
		}
	}
}

/// An admin request
///
/// Cloning is cheap enough for handlers to take ownership; the flash queue is
/// shared between clones.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	path: String,
	route: Option<String>,
	params: HashMap<String, String>,
	query: HashMap<String, String>,
	body: Record,
	upload: Option<UploadedFile>,
	base_path: Option<String>,
	messages: FlashMessages,
}

impl Request {
	/// Create a request for `uri`, splitting off and decoding its query string
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::http::Request;
	/// use http::Method;
	///
	/// let request = Request::new(Method::GET, "/admin/invoices?page=2");
	/// assert_eq!(request.path(), "/admin/invoices");
	/// assert_eq!(request.query("page"), Some("2"));
	/// ```
	pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
		let uri = uri.as_ref();
		let (path, query) = match uri.split_once('?') {
			Some((path, query)) => (path, parse_query(query)),
			None => (uri, HashMap::new()),
		};
		Self {
			method,
			path: path.to_string(),
			route: None,
			params: HashMap::new(),
			query,
			body: Record::new(),
			upload: None,
			base_path: None,
			messages: FlashMessages::new(),
		}
	}

	pub fn get(uri: impl AsRef<str>) -> Self {
		Self::new(Method::GET, uri)
	}

	pub fn post(uri: impl AsRef<str>) -> Self {
		Self::new(Method::POST, uri)
	}

	/// Attach an already decoded form body
	pub fn with_form(mut self, body: Record) -> Self {
		self.body = body;
		self
	}

	/// Attach an `application/x-www-form-urlencoded` body
	///
	/// Every value is kept as a string, the way browsers submit forms.
	pub fn with_urlencoded_body(mut self, body: &str) -> Result<Self, serde_urlencoded::de::Error> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body)?;
		self.body = pairs
			.into_iter()
			.map(|(k, v)| (k, serde_json::Value::String(v)))
			.collect();
		Ok(self)
	}

	pub fn with_upload(mut self, upload: UploadedFile) -> Self {
		self.upload = Some(upload);
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	/// The route pattern the router matched, e.g. `/admin/invoices/:id/edit`
	pub fn route(&self) -> Option<&str> {
		self.route.as_deref()
	}

	/// Matched pattern, or the raw path when the router did not record one
	pub fn route_or_path(&self) -> &str {
		self.route.as_deref().unwrap_or(&self.path)
	}

	pub(crate) fn set_route(&mut self, route: impl Into<String>, params: HashMap<String, String>) {
		self.route = Some(route.into());
		self.params.extend(params);
	}

	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	pub fn params(&self) -> &HashMap<String, String> {
		&self.params
	}

	pub fn query(&self, name: &str) -> Option<&str> {
		self.query.get(name).map(String::as_str)
	}

	pub fn body(&self) -> &Record {
		&self.body
	}

	pub fn upload(&self) -> Option<&UploadedFile> {
		self.upload.as_ref()
	}

	/// Admin base path stamped by the admin middleware
	pub fn base_path(&self) -> Option<&str> {
		self.base_path.as_deref()
	}

	pub(crate) fn set_base_path(&mut self, base_path: impl Into<String>) {
		self.base_path = Some(base_path.into());
	}

	pub fn messages(&self) -> &FlashMessages {
		&self.messages
	}

	/// Template-friendly view of the request
	pub fn summary(&self) -> RequestSummary {
		RequestSummary {
			method: self.method.to_string(),
			path: self.path.clone(),
			params: self.params.clone(),
			query: self.query.clone(),
		}
	}
}

fn parse_query(query: &str) -> HashMap<String, String> {
	query
		.split('&')
		.filter(|pair| !pair.is_empty())
		.map(|pair| {
			// Split on first '=' only to preserve '=' in values
			let mut parts = pair.splitn(2, '=');
			let key = parts.next().unwrap_or_default();
			let value = parts.next().unwrap_or_default();
			(decode(key), decode(value))
		})
		.collect()
}

fn decode(value: &str) -> String {
	percent_decode_str(&value.replace('+', " "))
		.decode_utf8_lossy()
		.into_owned()
}

/// Serializable request snapshot handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
	pub method: String,
	pub path: String,
	pub params: HashMap<String, String>,
	pub query: HashMap<String, String>,
}

/// An admin response
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// 200 response with an HTML body
	pub fn html(body: impl Into<String>) -> Self {
		let mut response = Self::new(StatusCode::OK);
		response.body = Bytes::from(body.into());
		response.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		response
	}

	/// 302 redirect to `location`
	///
	/// A location that is not a valid header value is dropped and logged; the
	/// status is still a redirect.
	pub fn redirect(location: &str) -> Self {
		let mut response = Self::new(StatusCode::FOUND);
		match HeaderValue::from_str(location) {
			Ok(value) => {
				response.headers.insert(LOCATION, value);
			}
			Err(e) => tracing::warn!(location, error = %e, "invalid redirect location"),
		}
		response
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn location(&self) -> Option<&str> {
		self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
	}

	pub fn body_str(&self) -> &str {
		std::str::from_utf8(&self.body).unwrap_or_default()
	}
}

/// Response slot handed to callbacks
///
/// A callback that writes here and returns [`HandlerOutput::Handled`](crate::handler::HandlerOutput)
/// owns the response; the dispatcher will not render anything else.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
	slot: Arc<Mutex<Option<Response>>>,
}

impl ResponseWriter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store the response, replacing any earlier one
	pub fn send(&self, response: Response) {
		*self.slot.lock() = Some(response);
	}

	pub fn redirect(&self, location: &str) {
		self.send(Response::redirect(location));
	}

	pub fn is_sent(&self) -> bool {
		self.slot.lock().is_some()
	}

	pub fn take(&self) -> Option<Response> {
		self.slot.lock().take()
	}
}
