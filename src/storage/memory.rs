//! In-memory storage backend

use super::{FindQuery, ModelSchema, ModelStore, Record, Repository, StorageResult};
use crate::error::StorageError;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type StoreMap = RwLock<IndexMap<String, Arc<MemoryStore>>>;

/// In-memory [`ModelStore`]
///
/// Records get sequential numeric ids. Relations declared on the schema are
/// populated from sibling stores of the same [`MemoryRepository`].
pub struct MemoryStore {
	schema: ModelSchema,
	records: RwLock<BTreeMap<u64, Record>>,
	next_id: AtomicU64,
	peers: Weak<StoreMap>,
}

impl MemoryStore {
	/// Create a standalone store (relations cannot be populated)
	pub fn new(schema: ModelSchema) -> Self {
		Self::with_peers(schema, Weak::new())
	}

	fn with_peers(schema: ModelSchema, peers: Weak<StoreMap>) -> Self {
		Self {
			schema,
			records: RwLock::new(BTreeMap::new()),
			next_id: AtomicU64::new(1),
			peers,
		}
	}

	/// Snapshot of every record, in id order
	pub fn all(&self) -> Vec<Record> {
		self.records.read().values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}

	fn parse_id(id: &str) -> StorageResult<u64> {
		id.trim()
			.parse()
			.map_err(|_| StorageError::NotFound(id.to_string()))
	}

	fn check_required(&self, values: &Record, partial: bool) -> StorageResult<()> {
		for (name, meta) in &self.schema.attributes {
			if !meta.required {
				continue;
			}
			let missing = match values.get(name) {
				None => !partial,
				Some(Value::Null) => true,
				Some(Value::String(s)) => s.trim().is_empty(),
				Some(_) => false,
			};
			if missing {
				return Err(StorageError::Validation(format!("{} is required", name)));
			}
		}
		Ok(())
	}

	fn populate(&self, mut record: Record, names: &[String]) -> Record {
		if names.is_empty() {
			return record;
		}
		let Some(peers) = self.peers.upgrade() else {
			return record;
		};
		for name in names {
			let Some(target) = self.schema.relation_target(name) else {
				continue;
			};
			let Some(store) = peers.read().get(target).cloned() else {
				continue;
			};
			let related = record
				.get(name)
				.and_then(id_string)
				.and_then(|id| Self::parse_id(&id).ok())
				.and_then(|id| store.records.read().get(&id).cloned());
			if let Some(related) = related {
				record.insert(name.clone(), Value::Object(related));
			}
		}
		record
	}
}

fn id_string(value: &Value) -> Option<String> {
	match value {
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		_ => None,
	}
}

#[async_trait]
impl ModelStore for MemoryStore {
	fn schema(&self) -> ModelSchema {
		self.schema.clone()
	}

	fn identity(&self) -> String {
		self.schema.identity.clone()
	}

	async fn find(&self, query: FindQuery) -> StorageResult<Vec<Record>> {
		let matched: Vec<Record> = self
			.records
			.read()
			.values()
			.filter(|record| query.matches(record))
			.cloned()
			.collect();
		Ok(matched
			.into_iter()
			.map(|record| self.populate(record, &query.populate))
			.collect())
	}

	async fn find_one(&self, id: &str, query: FindQuery) -> StorageResult<Option<Record>> {
		let Ok(id) = Self::parse_id(id) else {
			return Ok(None);
		};
		let record = self
			.records
			.read()
			.get(&id)
			.filter(|record| query.matches(record))
			.cloned();
		Ok(record.map(|record| self.populate(record, &query.populate)))
	}

	async fn create(&self, mut values: Record) -> StorageResult<Record> {
		self.check_required(&values, false)?;
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		values.insert("id".to_string(), Value::from(id));
		self.records.write().insert(id, values.clone());
		Ok(values)
	}

	async fn update(&self, id: &str, values: Record) -> StorageResult<Vec<Record>> {
		self.check_required(&values, true)?;
		let key = Self::parse_id(id)?;
		let mut records = self.records.write();
		let record = records
			.get_mut(&key)
			.ok_or_else(|| StorageError::NotFound(id.to_string()))?;
		for (name, value) in values {
			if name != "id" {
				record.insert(name, value);
			}
		}
		Ok(vec![record.clone()])
	}

	async fn destroy(&self, id: &str) -> StorageResult<Vec<Record>> {
		let Ok(key) = Self::parse_id(id) else {
			return Ok(Vec::new());
		};
		Ok(self.records.write().remove(&key).into_iter().collect())
	}
}

/// In-memory [`Repository`] owning one [`MemoryStore`] per model
#[derive(Default)]
pub struct MemoryRepository {
	stores: Arc<StoreMap>,
}

impl MemoryRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create (or replace) the store for `schema.identity`
	pub fn register(&self, schema: ModelSchema) -> Arc<MemoryStore> {
		let identity = schema.identity.clone();
		let store = Arc::new(MemoryStore::with_peers(schema, Arc::downgrade(&self.stores)));
		self.stores.write().insert(identity, Arc::clone(&store));
		store
	}

	/// Concrete store handle, for seeding and assertions
	pub fn memory_store(&self, model: &str) -> Option<Arc<MemoryStore>> {
		self.stores.read().get(model).cloned()
	}
}

impl Repository for MemoryRepository {
	fn store(&self, model: &str) -> Option<Arc<dyn ModelStore>> {
		self.memory_store(model)
			.map(|store| store as Arc<dyn ModelStore>)
	}
}
