//! Read-only schema catalog interface (spec §3, "Schema catalog").
//!
//! The catalog itself is owned and mutated by the surrounding system (out of
//! scope per spec §1); HRQL only needs a frozen snapshot to resolve names
//! against. Following §9's "frozen snapshot plus atomic swap" note, readers
//! (every compile) take a cloned [`std::sync::Arc`] under a shared
//! [`std::sync::RwLock`] read guard and never hold the lock across a
//! [`crate::resolver::Resolver`] await point.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Currency,
    Percentage,
    Date,
    Datetime,
    Boolean,
    Choice,
    Multichoice,
    Email,
    Url,
    Phone,
    Lookup,
    Formula,
}

impl FieldType {
    /// Field types whose values are stored as PostgreSQL numerics once cast
    /// out of JSONB text (spec §4.5, "Field expressions").
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency | FieldType::Percentage)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: Uuid,
    pub api_name: String,
    pub field_type: FieldType,
    /// Physical column name, present only for standard objects.
    pub storage_column: Option<String>,
    /// Target object id, present only when `field_type == Lookup`.
    pub lookup_object_id: Option<Uuid>,
}

impl FieldDef {
    pub fn is_lookup(&self) -> bool {
        self.field_type == FieldType::Lookup
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub id: Uuid,
    pub api_name: String,
    pub is_standard: bool,
    /// `Some` only for standard objects.
    pub storage_schema: Option<String>,
    /// `Some` only for standard objects.
    pub storage_table: Option<String>,
    pub fields: Vec<FieldDef>,
    fields_by_api_name: HashMap<String, usize>,
}

impl ObjectDef {
    pub fn new(
        id: Uuid,
        api_name: impl Into<String>,
        is_standard: bool,
        storage_schema: Option<String>,
        storage_table: Option<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        let fields_by_api_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.api_name.clone(), i))
            .collect();
        ObjectDef {
            id,
            api_name: api_name.into(),
            is_standard,
            storage_schema,
            storage_table,
            fields,
            fields_by_api_name,
        }
    }

    pub fn field(&self, api_name: &str) -> Option<&FieldDef> {
        self.fields_by_api_name
            .get(api_name)
            .map(|&i| &self.fields[i])
    }
}

/// Read-only lookup surface exposed to the compiler and SQL backend (spec §2,
/// "Schema catalog interface").
pub trait SchemaCatalog: Send + Sync {
    fn get(&self, api_name: &str) -> Option<Arc<ObjectDef>>;
    fn get_by_id(&self, id: Uuid) -> Option<Arc<ObjectDef>>;
    fn count(&self) -> usize;
}

/// A frozen, reference-counted snapshot of the catalog. Production code wraps
/// the whole table in an [`RwLock`] so that a metadata reload (out of scope)
/// can swap the `Arc` exclusively while every in-flight compile keeps working
/// against the clone it captured at the start of `compile(...)` (spec §5,
/// "Ordering guarantees" / §9 open question on catalog reload semantics).
#[derive(Default)]
pub struct CatalogTable {
    by_name: HashMap<String, Arc<ObjectDef>>,
    by_id: HashMap<Uuid, Arc<ObjectDef>>,
}

impl CatalogTable {
    pub fn insert(&mut self, object: ObjectDef) {
        let object = Arc::new(object);
        self.by_name.insert(object.api_name.clone(), object.clone());
        self.by_id.insert(object.id, object);
    }

    pub fn get(&self, api_name: &str) -> Option<Arc<ObjectDef>> {
        self.by_name.get(api_name).cloned()
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<Arc<ObjectDef>> {
        self.by_id.get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.by_name.len()
    }
}

/// The long-lived, swappable handle production code holds one of per
/// database connection. Cloning is cheap (`Arc` bump); a fresh snapshot can
/// replace the interior table atomically without blocking readers already
/// holding a clone.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<CatalogTable>>>,
}

impl SharedCatalog {
    pub fn new(table: CatalogTable) -> Self {
        SharedCatalog {
            inner: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Takes a snapshot under a shared read lock and immediately releases it
    /// — the clone is what compilation actually reads from (spec §5, "Shared
    /// resources").
    pub fn snapshot(&self) -> Arc<CatalogTable> {
        self.inner
            .read()
            .expect("schema catalog lock poisoned")
            .clone()
    }

    /// Atomically replaces the catalog. Out of scope functionally (spec §1
    /// excludes catalog persistence), kept here because the concurrency
    /// model in spec §5 names it explicitly.
    pub fn swap(&self, table: CatalogTable) {
        *self.inner.write().expect("schema catalog lock poisoned") = Arc::new(table);
    }
}

impl SchemaCatalog for Arc<CatalogTable> {
    fn get(&self, api_name: &str) -> Option<Arc<ObjectDef>> {
        self.by_name.get(api_name).cloned()
    }

    fn get_by_id(&self, id: Uuid) -> Option<Arc<ObjectDef>> {
        self.by_id.get(&id).cloned()
    }

    fn count(&self) -> usize {
        self.by_name.len()
    }
}
