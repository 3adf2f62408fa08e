//! Authentication collaborator
//!
//! The admin console does not decide who is logged in or who is an admin; it
//! only tells the auth layer which paths need which gate.

use crate::router::PathPattern;
use parking_lot::RwLock;
use serde::Serialize;

/// Auth collaborator contract
pub trait AdminAuth: Send + Sync {
	/// Require an authenticated user below `path`
	fn protected_route(&self, path: &str);

	/// Require an admin user below `path`
	fn ensure_admin(&self, path: &str);
}

/// Access level required for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Guard {
	Public,
	Authenticated,
	Admin,
}

/// In-memory [`AdminAuth`] recording gated path patterns
///
/// Transports look the required [`Guard`] up per request and enforce it with
/// whatever session mechanism they use.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_console::auth::{AdminAuth, Guard, RouteGuards};
///
/// let guards = RouteGuards::new();
/// guards.protected_route("/admin/*");
/// guards.ensure_admin("/admin/users");
///
/// assert_eq!(guards.guard_for("/admin/invoices"), Guard::Authenticated);
/// assert_eq!(guards.guard_for("/admin/users"), Guard::Admin);
/// assert_eq!(guards.guard_for("/blog"), Guard::Public);
/// ```
#[derive(Debug, Default)]
pub struct RouteGuards {
	rules: RwLock<Vec<(PathPattern, Guard)>>,
}

impl RouteGuards {
	pub fn new() -> Self {
		Self::default()
	}

	fn add(&self, path: &str, guard: Guard) {
		match PathPattern::new(path) {
			Ok(pattern) => {
				tracing::debug!(path, guard = ?guard, "gating admin path");
				self.rules.write().push((pattern, guard));
			}
			Err(e) => tracing::warn!(path, error = %e, "ignoring invalid guarded path"),
		}
	}

	/// Strictest guard among the rules matching `path`
	pub fn guard_for(&self, path: &str) -> Guard {
		self.rules
			.read()
			.iter()
			.filter(|(pattern, _)| pattern.matches(path).is_some())
			.map(|(_, guard)| *guard)
			.max()
			.unwrap_or(Guard::Public)
	}

	/// Gated patterns in registration order
	pub fn rules(&self) -> Vec<(String, Guard)> {
		self.rules
			.read()
			.iter()
			.map(|(pattern, guard)| (pattern.pattern().to_string(), *guard))
			.collect()
	}
}

impl AdminAuth for RouteGuards {
	fn protected_route(&self, path: &str) {
		self.add(path, Guard::Authenticated);
	}

	fn ensure_admin(&self, path: &str) {
		self.add(path, Guard::Admin);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/admin", Guard::Admin)]
	#[case("/admin/invoices/3/edit", Guard::Authenticated)]
	#[case("/administrator", Guard::Public)]
	fn test_strictest_matching_guard_wins(#[case] path: &str, #[case] expected: Guard) {
		// Arrange
		let guards = RouteGuards::new();
		guards.protected_route("/admin");
		guards.protected_route("/admin/*");
		guards.ensure_admin("/admin");

		// Act & Assert
		assert_eq!(guards.guard_for(path), expected);
	}

	#[rstest]
	fn test_invalid_pattern_is_ignored() {
		// Arrange
		let guards = RouteGuards::new();

		// Act
		guards.protected_route("admin");

		// Assert
		assert!(guards.rules().is_empty());
	}
}
