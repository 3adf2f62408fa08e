//! Flash messages
//!
//! Handlers queue messages on the request; the transport drains them into the
//! session (or wherever it keeps them) once the response is produced.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	Debug,
	Info,
	Success,
	Warning,
	Error,
}

impl Level {
	/// Tag used by templates for styling
	pub fn as_str(&self) -> &'static str {
		match self {
			Level::Debug => "debug",
			Level::Info => "info",
			Level::Success => "success",
			Level::Warning => "warning",
			Level::Error => "error",
		}
	}
}

/// A single flash message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub level: Level,
	pub text: String,
}

impl Message {
	pub fn new(level: Level, text: impl Into<String>) -> Self {
		Self {
			level,
			text: text.into(),
		}
	}
}

/// Shared, request-scoped message queue
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct FlashMessages {
	messages: Arc<Mutex<Vec<Message>>>,
}

impl FlashMessages {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queue a message
	pub fn add(&self, level: Level, text: impl Into<String>) {
		self.messages.lock().push(Message::new(level, text));
	}

	pub fn info(&self, text: impl Into<String>) {
		self.add(Level::Info, text);
	}

	pub fn error(&self, text: impl Into<String>) {
		self.add(Level::Error, text);
	}

	/// Snapshot without consuming
	pub fn peek(&self) -> Vec<Message> {
		self.messages.lock().clone()
	}

	/// Take every queued message
	pub fn drain(&self) -> Vec<Message> {
		std::mem::take(&mut *self.messages.lock())
	}

	pub fn is_empty(&self) -> bool {
		self.messages.lock().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_add_and_drain() {
		// Arrange
		let messages = FlashMessages::new();

		// Act
		messages.info("Invoice saved");
		messages.error("boom");
		let drained = messages.drain();

		// Assert
		assert_eq!(
			drained,
			vec![
				Message::new(Level::Info, "Invoice saved"),
				Message::new(Level::Error, "boom"),
			]
		);
		assert!(messages.is_empty());
	}

	#[rstest]
	fn test_clones_share_queue() {
		// Arrange
		let messages = FlashMessages::new();
		let handle = messages.clone();

		// Act
		handle.info("from clone");

		// Assert
		assert_eq!(messages.peek().len(), 1);
		assert_eq!(messages.peek()[0].level.as_str(), "info");
	}
}
