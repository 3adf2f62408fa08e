//! Error types for the admin console

use thiserror::Error;

/// Admin console error type
#[derive(Debug, Error)]
pub enum AdminError {
	/// Invalid registration-time configuration (e.g. a model admin without a model)
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A page was registered twice on the same path
	#[error("Path '{0}' is already registered")]
	DuplicatePath(String),

	/// Storage read failure during a list or form view
	#[error("Fetch error: {0}")]
	Fetch(String),

	/// Requested instance does not exist
	#[error("Not found: {0}")]
	NotFound(String),

	/// Validation or storage failure while saving an instance
	#[error("Save error: {0}")]
	Save(String),

	/// Template registration or rendering failure
	#[error("Template rendering error: {0}")]
	Template(String),

	/// Import pipeline failure
	#[error("Import error: {0}")]
	Import(String),

	/// Storage collaborator failure outside of fetch/save paths
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	/// Settings could not be loaded or are invalid
	#[error("Settings error: {0}")]
	Settings(String),
}

/// Result type for admin console operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Errors reported by storage collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
	/// No record matched the given identity
	#[error("record '{0}' not found")]
	NotFound(String),

	/// The store rejected the submitted values
	#[error("validation failed: {0}")]
	Validation(String),

	/// Backend failure (connection, query, ...)
	#[error("{0}")]
	Backend(String),
}

impl AdminError {
	/// Wrap a storage failure that happened while reading data for a view
	pub fn fetch(err: impl std::fmt::Display) -> Self {
		AdminError::Fetch(err.to_string())
	}

	/// Wrap a storage failure that happened while writing submitted values
	pub fn save(err: impl std::fmt::Display) -> Self {
		AdminError::Save(err.to_string())
	}
}

impl From<tera::Error> for AdminError {
	fn from(err: tera::Error) -> Self {
		// Tera nests the useful message in the source chain
		let mut message = err.to_string();
		let mut source = std::error::Error::source(&err);
		while let Some(inner) = source {
			message = format!("{}: {}", message, inner);
			source = inner.source();
		}
		AdminError::Template(message)
	}
}

impl From<toml::de::Error> for AdminError {
	fn from(err: toml::de::Error) -> Self {
		AdminError::Settings(err.to_string())
	}
}
