//! File import collaborator
//!
//! The CRUD engine hands uploaded files to an [`Importer`]. [`FileImporter`]
//! is the bundled implementation: it parses CSV, TSV or JSON files and creates
//! one record per row through the [`Repository`].
//!
//! Recognised options:
//!
//! - `type`: `csv`, `tsv` or `json`; defaults to the file extension
//! - `field_mappings`: object mapping file columns to model attributes
//! - `skip_fields`: array of file columns to ignore

use crate::error::{AdminError, AdminResult};
use crate::storage::{Record, Repository};
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
	Csv,
	Tsv,
	Json,
}

impl ImportFormat {
	/// Parse a format name (`csv`, `tsv`/`tab`, `json`)
	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_lowercase().as_str() {
			"csv" => Some(ImportFormat::Csv),
			"tsv" | "tab" => Some(ImportFormat::Tsv),
			"json" => Some(ImportFormat::Json),
			_ => None,
		}
	}

	/// Detect the format from a file name's extension
	pub fn from_filename(filename: &str) -> Option<Self> {
		let (_, ext) = filename.rsplit_once('.')?;
		Self::from_name(ext)
	}

	/// Parse file contents into records
	///
	/// CSV and TSV values are kept as strings; JSON values keep their type.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_console::import::ImportFormat;
	///
	/// let records = ImportFormat::Csv.parse(b"number,total\nINV-1,10\n").unwrap();
	/// assert_eq!(records.len(), 1);
	/// assert_eq!(records[0]["number"], "INV-1");
	/// ```
	pub fn parse(&self, data: &[u8]) -> AdminResult<Vec<Record>> {
		match self {
			ImportFormat::Csv => parse_delimited(data, b','),
			ImportFormat::Tsv => parse_delimited(data, b'\t'),
			ImportFormat::Json => parse_json(data),
		}
	}
}

fn parse_delimited(data: &[u8], delimiter: u8) -> AdminResult<Vec<Record>> {
	let mut reader = ReaderBuilder::new()
		.has_headers(true)
		.delimiter(delimiter)
		.flexible(false)
		.trim(csv::Trim::All)
		.from_reader(data);

	let headers: Vec<String> = reader
		.headers()
		.map_err(|e| AdminError::Import(format!("failed to read header row: {}", e)))?
		.iter()
		.map(str::to_string)
		.collect();
	if headers.iter().all(String::is_empty) {
		return Err(AdminError::Import("header row is empty".into()));
	}

	let mut records = Vec::new();
	for (index, row) in reader.records().enumerate() {
		// Row numbers are 1-indexed and count the header
		let row = row.map_err(|e| AdminError::Import(format!("row {}: {}", index + 2, e)))?;
		records.push(
			headers
				.iter()
				.zip(row.iter())
				.map(|(header, value)| (header.clone(), Value::String(value.to_string())))
				.collect(),
		);
	}
	Ok(records)
}

fn parse_json(data: &[u8]) -> AdminResult<Vec<Record>> {
	let value: Value = serde_json::from_slice(data)
		.map_err(|e| AdminError::Import(format!("invalid JSON: {}", e)))?;
	let Value::Array(items) = value else {
		return Err(AdminError::Import("JSON import must be an array".into()));
	};
	items
		.into_iter()
		.enumerate()
		.map(|(index, item)| match item {
			Value::Object(record) => Ok(record),
			_ => Err(AdminError::Import(format!("item {} is not an object", index))),
		})
		.collect()
}

/// Import collaborator
#[async_trait]
pub trait Importer: Send + Sync {
	/// Import every record in the file at `path` into `model`, returning the
	/// created records
	async fn import_file_to_model(
		&self,
		model: &str,
		path: &Path,
		options: Record,
	) -> AdminResult<Vec<Record>>;
}

/// Row transformation options
#[derive(Debug, Clone, Default, PartialEq)]
struct RowOptions {
	field_mappings: HashMap<String, String>,
	skip_fields: Vec<String>,
}

impl RowOptions {
	fn from_options(options: &Record) -> Self {
		let field_mappings = options
			.get("field_mappings")
			.and_then(Value::as_object)
			.map(|mappings| {
				mappings
					.iter()
					.filter_map(|(from, to)| to.as_str().map(|to| (from.clone(), to.to_string())))
					.collect()
			})
			.unwrap_or_default();
		let skip_fields = options
			.get("skip_fields")
			.and_then(Value::as_array)
			.map(|fields| {
				fields
					.iter()
					.filter_map(Value::as_str)
					.map(str::to_string)
					.collect()
			})
			.unwrap_or_default();
		Self {
			field_mappings,
			skip_fields,
		}
	}

	fn apply(&self, row: Record) -> Record {
		row.into_iter()
			.filter(|(field, _)| !self.skip_fields.contains(field))
			.map(|(field, value)| match self.field_mappings.get(&field) {
				Some(mapped) => (mapped.clone(), value),
				None => (field, value),
			})
			.collect()
	}
}

/// [`Importer`] reading CSV, TSV and JSON files
pub struct FileImporter {
	repository: Arc<dyn Repository>,
}

impl FileImporter {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self { repository }
	}

	fn format(path: &Path, options: &Record) -> AdminResult<ImportFormat> {
		if let Some(name) = options.get("type").and_then(Value::as_str) {
			return ImportFormat::from_name(name)
				.ok_or_else(|| AdminError::Import(format!("unsupported import type '{}'", name)));
		}
		path.file_name()
			.and_then(|name| name.to_str())
			.and_then(ImportFormat::from_filename)
			.ok_or_else(|| {
				AdminError::Import(format!("cannot detect the format of '{}'", path.display()))
			})
	}
}

#[async_trait]
impl Importer for FileImporter {
	async fn import_file_to_model(
		&self,
		model: &str,
		path: &Path,
		options: Record,
	) -> AdminResult<Vec<Record>> {
		let store = self
			.repository
			.store(model)
			.ok_or_else(|| AdminError::Import(format!("no store registered for model '{}'", model)))?;
		let format = Self::format(path, &options)?;
		let data = tokio::fs::read(path).await.map_err(|e| {
			AdminError::Import(format!("failed to read '{}': {}", path.display(), e))
		})?;

		let rows = format.parse(&data)?;
		let row_options = RowOptions::from_options(&options);
		tracing::debug!(model, format = ?format, rows = rows.len(), "importing file");

		let mut created = Vec::with_capacity(rows.len());
		for (index, row) in rows.into_iter().enumerate() {
			let record = store
				.create(row_options.apply(row))
				.await
				.map_err(|e| AdminError::Import(format!("record {}: {}", index + 1, e)))?;
			created.push(record);
		}
		Ok(created)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::storage::{AttributeMeta, AttributeType, MemoryRepository, ModelSchema};
	use rstest::{fixture, rstest};
	use serde_json::json;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn write_file(suffix: &str, contents: &str) -> NamedTempFile {
		let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		file
	}

	#[fixture]
	fn repository() -> Arc<MemoryRepository> {
		let repository = Arc::new(MemoryRepository::new());
		repository.register(
			ModelSchema::new("invoice")
				.attribute("number", AttributeMeta::new(AttributeType::String).required()),
		);
		repository
	}

	#[rstest]
	#[case("invoices.csv", Some(ImportFormat::Csv))]
	#[case("invoices.TSV", Some(ImportFormat::Tsv))]
	#[case("invoices.tab", Some(ImportFormat::Tsv))]
	#[case("archive.invoices.json", Some(ImportFormat::Json))]
	#[case("invoices.xlsx", None)]
	#[case("invoices", None)]
	fn test_format_from_filename(#[case] filename: &str, #[case] expected: Option<ImportFormat>) {
		assert_eq!(ImportFormat::from_filename(filename), expected);
	}

	#[rstest]
	fn test_tsv_parse() {
		// Act
		let records = ImportFormat::Tsv.parse(b"number\ttotal\nINV-1\t 10 \n").unwrap();

		// Assert
		assert_eq!(records[0]["total"], json!("10"));
	}

	#[rstest]
	fn test_csv_rejects_ragged_rows() {
		// Act
		let result = ImportFormat::Csv.parse(b"number,total\nINV-1\n");

		// Assert
		assert!(matches!(result, Err(AdminError::Import(msg)) if msg.starts_with("row 2")));
	}

	#[rstest]
	#[case(br#"{"number": "INV-1"}"#.as_slice())]
	#[case(br#"[{"number": "INV-1"}, 3]"#.as_slice())]
	#[case(b"not json".as_slice())]
	fn test_json_parse_errors(#[case] data: &[u8]) {
		assert!(matches!(ImportFormat::Json.parse(data), Err(AdminError::Import(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_import_csv_creates_records(repository: Arc<MemoryRepository>) {
		// Arrange
		let file = write_file(".csv", "number,total\nINV-1,10\nINV-2,20\nINV-3,30\n");
		let importer = FileImporter::new(repository.clone());

		// Act
		let created = importer
			.import_file_to_model("invoice", file.path(), Record::new())
			.await
			.unwrap();

		// Assert
		assert_eq!(created.len(), 3);
		assert_eq!(created[2]["id"], json!(3));
		assert_eq!(repository.memory_store("invoice").unwrap().len(), 3);
	}

	#[rstest]
	#[tokio::test]
	async fn test_import_applies_type_and_mappings(repository: Arc<MemoryRepository>) {
		// Arrange
		let file = write_file(".upload", r#"[{"ref": "INV-9", "internal": "x", "total": 12.5}]"#);
		let importer = FileImporter::new(repository);
		let options = json!({
			"type": "json",
			"field_mappings": {"ref": "number"},
			"skip_fields": ["internal"],
		});

		// Act
		let created = importer
			.import_file_to_model("invoice", file.path(), options.as_object().cloned().unwrap())
			.await
			.unwrap();

		// Assert
		assert_eq!(created[0], json!({"id": 1, "number": "INV-9", "total": 12.5}).as_object().cloned().unwrap());
	}

	#[rstest]
	#[tokio::test]
	async fn test_import_reports_store_rejection(repository: Arc<MemoryRepository>) {
		// Arrange
		let file = write_file(".csv", "number\nINV-1\n\"\"\n");
		let importer = FileImporter::new(repository);

		// Act
		let result = importer
			.import_file_to_model("invoice", file.path(), Record::new())
			.await;

		// Assert
		assert!(matches!(result, Err(AdminError::Import(msg)) if msg.starts_with("record 2")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_import_unknown_model(repository: Arc<MemoryRepository>) {
		// Arrange
		let file = write_file(".csv", "number\nINV-1\n");
		let importer = FileImporter::new(repository);

		// Act
		let result = importer
			.import_file_to_model("ledger", file.path(), Record::new())
			.await;

		// Assert
		assert!(matches!(result, Err(AdminError::Import(_))));
	}
}
