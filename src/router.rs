//! Router collaborator
//!
//! The registry only needs two operations from the HTTP router: bind an
//! endpoint to a method and path, and attach middleware to a path prefix.
//! [`RouteTable`] is an in-memory implementation used by tests, demos, and
//! transports that do not bring their own router.
//!
//! Path patterns use `:name` segments and an optional trailing `*`:
//!
//! - `/admin/invoices` - exact match
//! - `/admin/invoices/:id/edit` - captures `id`
//! - `/admin/*` - anything below `/admin/`

use crate::error::{AdminError, AdminResult};
use crate::http::{Request, Response};
use ::http::Method;
use async_trait::async_trait;
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;

/// Something the router can hand a request to
///
/// `None` means the endpoint produced no response; what happens next (hang,
/// timeout, 500) is up to the transport.
#[async_trait]
pub trait Endpoint: Send + Sync {
	async fn handle(&self, request: Request) -> Option<Response>;
}

/// Request preprocessor bound to a path prefix
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Inspect or amend the request. Returning a response short-circuits the
	/// remaining middleware and the endpoint.
	async fn process(&self, request: &mut Request) -> Option<Response>;
}

/// Router collaborator contract
pub trait Router: Send + Sync {
	/// Bind `endpoint` to `method` + `path`
	fn route(&self, method: Method, path: &str, endpoint: Arc<dyn Endpoint>) -> AdminResult<()>;

	/// Run `middleware` for every request at or below `path`
	fn middleware(&self, path: &str, middleware: Arc<dyn Middleware>);
}

/// Maximum allowed length for a route pattern in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled route regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Compiled route pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compile a `:param` style pattern
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::router::PathPattern;
	///
	/// let pattern = PathPattern::new("/admin/invoices/:id/edit").unwrap();
	/// let params = pattern.matches("/admin/invoices/42/edit").unwrap();
	/// assert_eq!(params["id"], "42");
	/// assert!(pattern.matches("/admin/invoices/42").is_none());
	/// ```
	pub fn new(pattern: &str) -> AdminResult<Self> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(AdminError::Configuration(format!(
				"route pattern length {} exceeds maximum of {} bytes",
				pattern.len(),
				MAX_PATTERN_LENGTH
			)));
		}
		let segment_count = pattern.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(AdminError::Configuration(format!(
				"route pattern has {} path segments, exceeding maximum of {}",
				segment_count, MAX_PATH_SEGMENTS
			)));
		}
		if !pattern.starts_with('/') {
			return Err(AdminError::Configuration(format!(
				"route pattern '{}' must start with '/'",
				pattern
			)));
		}

		let (regex_str, param_names) = Self::compile(pattern)?;
		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| {
				AdminError::Configuration(format!("invalid route pattern '{}': {}", pattern, e))
			})?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
		})
	}

	fn compile(pattern: &str) -> AdminResult<(String, Vec<String>)> {
		let segments: Vec<&str> = pattern.split('/').collect();
		let last = segments.len() - 1;
		let mut param_names = Vec::new();
		let mut parts = Vec::with_capacity(segments.len());

		for (index, segment) in segments.iter().enumerate() {
			if let Some(name) = segment.strip_prefix(':') {
				if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
					return Err(AdminError::Configuration(format!(
						"invalid parameter '{}' in route pattern '{}'",
						segment, pattern
					)));
				}
				if param_names.iter().any(|n| n == name) {
					return Err(AdminError::Configuration(format!(
						"duplicate parameter '{}' in route pattern '{}'",
						name, pattern
					)));
				}
				param_names.push(name.to_string());
				parts.push(format!("(?P<{}>[^/]+)", name));
			} else if *segment == "*" && index == last {
				parts.push(".*".to_string());
			} else {
				parts.push(regex::escape(segment));
			}
		}

		Ok((format!("^{}$", parts.join("/")), param_names))
	}

	/// The original pattern string
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Match `path`, returning percent-decoded captured parameters
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		self.regex.captures(path).map(|caps| {
			self.param_names
				.iter()
				.filter_map(|name| {
					caps.name(name).map(|m| {
						let value = percent_decode_str(m.as_str()).decode_utf8_lossy();
						(name.clone(), value.into_owned())
					})
				})
				.collect()
		})
	}
}

struct RouteEntry {
	method: Method,
	pattern: PathPattern,
	endpoint: Arc<dyn Endpoint>,
}

/// In-memory [`Router`]
///
/// Routes match in registration order; middleware runs in registration order
/// before route resolution.
#[derive(Default)]
pub struct RouteTable {
	routes: RwLock<Vec<RouteEntry>>,
	middleware: RwLock<Vec<(String, Arc<dyn Middleware>)>>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registered `(method, pattern)` pairs in registration order
	pub fn routes(&self) -> Vec<(Method, String)> {
		self.routes
			.read()
			.iter()
			.map(|entry| (entry.method.clone(), entry.pattern.pattern().to_string()))
			.collect()
	}

	/// Run middleware, resolve the route, and call its endpoint.
	///
	/// Unmatched requests get a 404.
	pub async fn handle(&self, mut request: Request) -> Option<Response> {
		let middleware: Vec<Arc<dyn Middleware>> = self
			.middleware
			.read()
			.iter()
			.filter(|(prefix, _)| prefix_applies(prefix, request.path()))
			.map(|(_, m)| Arc::clone(m))
			.collect();

		for m in middleware {
			if let Some(response) = m.process(&mut request).await {
				return Some(response);
			}
		}

		let resolved = self.routes.read().iter().find_map(|entry| {
			if entry.method != request.method {
				return None;
			}
			entry.pattern.matches(request.path()).map(|params| {
				(
					entry.pattern.pattern().to_string(),
					params,
					Arc::clone(&entry.endpoint),
				)
			})
		});

		match resolved {
			Some((route, params, endpoint)) => {
				request.set_route(route, params);
				endpoint.handle(request).await
			}
			None => {
				tracing::debug!(method = %request.method, path = request.path(), "no route matched");
				Some(Response::not_found())
			}
		}
	}
}

fn prefix_applies(prefix: &str, path: &str) -> bool {
	let prefix = prefix.trim_end_matches("/*");
	if prefix.is_empty() {
		return true;
	}
	path == prefix
		|| path
			.strip_prefix(prefix)
			.is_some_and(|rest| rest.starts_with('/'))
}

impl Router for RouteTable {
	fn route(&self, method: Method, path: &str, endpoint: Arc<dyn Endpoint>) -> AdminResult<()> {
		let pattern = PathPattern::new(path)?;
		tracing::debug!(%method, path, "binding route");
		self.routes.write().push(RouteEntry {
			method,
			pattern,
			endpoint,
		});
		Ok(())
	}

	fn middleware(&self, path: &str, middleware: Arc<dyn Middleware>) {
		self.middleware.write().push((path.to_string(), middleware));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct Echo;

	#[async_trait]
	impl Endpoint for Echo {
		async fn handle(&self, request: Request) -> Option<Response> {
			let id = request.param("id").unwrap_or("-").to_string();
			Some(Response::html(format!("{} {}", request.route_or_path(), id)))
		}
	}

	struct Silent;

	#[async_trait]
	impl Endpoint for Silent {
		async fn handle(&self, _request: Request) -> Option<Response> {
			None
		}
	}

	struct Deny;

	#[async_trait]
	impl Middleware for Deny {
		async fn process(&self, _request: &mut Request) -> Option<Response> {
			Some(Response::new(::http::StatusCode::FORBIDDEN))
		}
	}

	#[rstest]
	#[case("/admin", "/admin", true)]
	#[case("/admin", "/admin/", false)]
	#[case("/admin/:id", "/admin/7", true)]
	#[case("/admin/:id", "/admin/7/edit", false)]
	#[case("/admin/*", "/admin/a/b", true)]
	#[case("/admin/*", "/administrator", false)]
	#[case("/a.b", "/aXb", false)]
	fn test_pattern_matching(#[case] pattern: &str, #[case] path: &str, #[case] matched: bool) {
		// Arrange
		let pattern = PathPattern::new(pattern).unwrap();

		// Act & Assert
		assert_eq!(pattern.matches(path).is_some(), matched);
	}

	#[rstest]
	#[case("admin")]
	#[case("/admin/:")]
	#[case("/admin/:id/:id")]
	#[case("/admin/:bad-name")]
	#[case("/a/b/c/d/e/f/g/h/i/j/k/l/m/n/o/p/q/r/s/t/u/v/w/x/y/z/1/2/3/4/5/6/7")]
	fn test_invalid_patterns(#[case] pattern: &str) {
		assert!(matches!(PathPattern::new(pattern), Err(AdminError::Configuration(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_handle_resolves_route_and_params() {
		// Arrange
		let table = RouteTable::new();
		table
			.route(Method::GET, "/admin/invoices/:id/edit", Arc::new(Echo))
			.unwrap();

		// Act
		let response = table.handle(Request::get("/admin/invoices/9/edit")).await.unwrap();

		// Assert
		assert_eq!(response.body_str(), "/admin/invoices/:id/edit 9");
	}

	#[rstest]
	#[case("/admin/invoices/a%20b/edit", "a b")]
	#[case("/admin/invoices/caf%C3%A9/edit", "café")]
	#[case("/admin/invoices/42/edit", "42")]
	fn test_params_are_percent_decoded(#[case] path: &str, #[case] expected: &str) {
		// Arrange
		let pattern = PathPattern::new("/admin/invoices/:id/edit").unwrap();

		// Act
		let params = pattern.matches(path).unwrap();

		// Assert
		assert_eq!(params["id"], expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_handle_respects_method() {
		// Arrange
		let table = RouteTable::new();
		table.route(Method::POST, "/admin/save", Arc::new(Echo)).unwrap();

		// Act
		let response = table.handle(Request::get("/admin/save")).await.unwrap();

		// Assert
		assert_eq!(response.status, ::http::StatusCode::NOT_FOUND);
	}

	#[rstest]
	#[tokio::test]
	async fn test_endpoint_may_leave_request_unanswered() {
		// Arrange
		let table = RouteTable::new();
		table.route(Method::GET, "/admin/slow", Arc::new(Silent)).unwrap();

		// Act
		let response = table.handle(Request::get("/admin/slow")).await;

		// Assert
		assert!(response.is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_is_scoped_to_prefix() {
		// Arrange
		let table = RouteTable::new();
		table.route(Method::GET, "/admin", Arc::new(Echo)).unwrap();
		table.route(Method::GET, "/public", Arc::new(Echo)).unwrap();
		table.middleware("/admin/*", Arc::new(Deny));

		// Act
		let admin = table.handle(Request::get("/admin")).await.unwrap();
		let public = table.handle(Request::get("/public")).await.unwrap();

		// Assert
		assert_eq!(admin.status, ::http::StatusCode::FORBIDDEN);
		assert_eq!(public.status, ::http::StatusCode::OK);
	}

	#[rstest]
	fn test_routes_lists_registrations_in_order() {
		// Arrange
		let table = RouteTable::new();
		table.route(Method::GET, "/a", Arc::new(Echo)).unwrap();
		table.route(Method::POST, "/b", Arc::new(Echo)).unwrap();

		// Act
		let routes = table.routes();

		// Assert
		assert_eq!(
			routes,
			vec![(Method::GET, "/a".to_string()), (Method::POST, "/b".to_string())]
		);
	}
}
