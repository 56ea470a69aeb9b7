//! In-memory collection with MongoDB-like matching.
//!
//! `MemoryCollection` is a [`Collection`] for tests and embedded use. It
//! understands equality (including array membership and dotted paths),
//! `$eq`, `$ne`, `$in`, `$nin`, `$exists`, `$gt`, `$gte`, `$lt`, `$lte`,
//! `$and` and `$or`, inclusion/exclusion projections, optional unique
//! indexes, and one-shot failure injection.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use parking_lot::Mutex;

use crate::collection::{Collection, CriteriaHook};
use crate::document::{DocumentExt, ID_KEY, Precedence, merge_seed};
use crate::error::{SeedError, SeedResult};
use crate::filter::is_operator_doc;
use crate::unique::normalize_unique_error;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `find_one`
    FindOne,
    /// `find`
    Find,
    /// `create`
    Create,
    /// `save`
    Save,
    /// `delete_many`
    DeleteMany,
}

/// An in-memory document collection.
pub struct MemoryCollection {
    name: String,
    docs: Mutex<Vec<Document>>,
    unique_indexes: Vec<Vec<String>>,
    criteria: Option<CriteriaHook>,
    failures: Mutex<HashMap<Operation, String>>,
}

impl MemoryCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Mutex::new(Vec::new()),
            unique_indexes: Vec::new(),
            criteria: None,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Create a collection holding `docs`; documents without `_id` get one.
    pub fn with_documents(name: impl Into<String>, docs: Vec<Document>) -> Self {
        let collection = Self::new(name);
        {
            let mut stored = collection.docs.lock();
            for mut doc in docs {
                ensure_id(&mut doc);
                stored.push(doc);
            }
        }
        collection
    }

    /// Add a unique index over `fields`.
    pub fn with_unique_index(mut self, fields: &[&str]) -> Self {
        self.unique_indexes
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Attach a seed criteria hook.
    pub fn with_seed_criteria(
        mut self,
        hook: impl Fn(&Document) -> Document + Send + Sync + 'static,
    ) -> Self {
        self.criteria = Some(std::sync::Arc::new(hook));
        self
    }

    /// Make the next call of `operation` fail with a store error.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.failures.lock().insert(operation, message.into());
    }

    /// Snapshot of all stored documents, in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.docs.lock().clone()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.lock().len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.lock().is_empty()
    }

    fn check_failure(&self, operation: Operation) -> SeedResult<()> {
        match self.failures.lock().remove(&operation) {
            Some(message) => Err(SeedError::store(message)),
            None => Ok(()),
        }
    }

    fn check_unique(&self, docs: &[Document], record: &Document) -> SeedResult<()> {
        for fields in &self.unique_indexes {
            let conflict = docs.iter().any(|other| {
                other.id_value() != record.id_value()
                    && fields
                        .iter()
                        .all(|f| record.get_path(f).is_some() && record.get_path(f) == other.get_path(f))
            });
            if conflict {
                let message = duplicate_key_message(&self.name, fields, record);
                return Err(match normalize_unique_error(11000, &message, Some(record)) {
                    Some(validation) => SeedError::Validation(validation),
                    None => SeedError::store(message),
                });
            }
        }
        Ok(())
    }

    fn insert_locked(&self, docs: &mut Vec<Document>, mut record: Document) -> SeedResult<Document> {
        ensure_id(&mut record);
        self.check_unique(docs, &record)?;
        docs.push(record.clone());
        Ok(record)
    }

    fn replace_locked(&self, docs: &mut Vec<Document>, mut record: Document) -> SeedResult<Document> {
        ensure_id(&mut record);
        self.check_unique(docs, &record)?;
        match docs.iter_mut().find(|d| d.id_value() == record.id_value()) {
            Some(slot) => *slot = record.clone(),
            None => docs.push(record.clone()),
        }
        Ok(record)
    }
}

impl std::fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("unique_indexes", &self.unique_indexes)
            .finish()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Option<Document>> {
        self.check_failure(Operation::FindOne)?;
        let docs = self.docs.lock();
        Ok(docs
            .iter()
            .find(|doc| matches(doc, &criteria))
            .map(|doc| project(doc, projection.as_ref())))
    }

    async fn find(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Vec<Document>> {
        self.check_failure(Operation::Find)?;
        let docs = self.docs.lock();
        Ok(docs
            .iter()
            .filter(|doc| matches(doc, &criteria))
            .map(|doc| project(doc, projection.as_ref()))
            .collect())
    }

    async fn create(&self, record: Document) -> SeedResult<Document> {
        self.check_failure(Operation::Create)?;
        let mut docs = self.docs.lock();
        self.insert_locked(&mut docs, record)
    }

    async fn save(&self, record: Document) -> SeedResult<Document> {
        self.check_failure(Operation::Save)?;
        let mut docs = self.docs.lock();
        self.replace_locked(&mut docs, record)
    }

    async fn delete_many(&self, criteria: Document) -> SeedResult<u64> {
        self.check_failure(Operation::DeleteMany)?;
        let mut docs = self.docs.lock();
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &criteria));
        Ok((before - docs.len()) as u64)
    }

    fn prepare_seed_criteria(&self, seed: &Document) -> Document {
        match &self.criteria {
            Some(hook) => hook(seed),
            None => seed.clone(),
        }
    }

    async fn merge_upsert(
        &self,
        criteria: Document,
        seed: Document,
        precedence: Precedence,
    ) -> SeedResult<Document> {
        self.check_failure(Operation::FindOne)?;
        // The lock is held across lookup and write, so concurrent upserts
        // of the same seed cannot both insert.
        let mut docs = self.docs.lock();
        let stored = docs.iter().find(|doc| matches(doc, &criteria)).cloned();
        match stored {
            Some(stored) => {
                self.check_failure(Operation::Save)?;
                self.replace_locked(&mut docs, merge_seed(stored, seed, precedence))
            }
            None => {
                self.check_failure(Operation::Create)?;
                self.insert_locked(&mut docs, seed)
            }
        }
    }
}

fn ensure_id(doc: &mut Document) {
    if !doc.contains_key(ID_KEY) {
        doc.insert(ID_KEY, ObjectId::new());
    }
}

fn duplicate_key_message(collection: &str, fields: &[String], record: &Document) -> String {
    let index = fields
        .iter()
        .map(|f| format!("{f}_1"))
        .collect::<Vec<_>>()
        .join("_");
    let keys = fields
        .iter()
        .map(|f| {
            let value = match record.get_path(f) {
                Some(Bson::String(s)) => format!("\"{s}\""),
                Some(other) => other.to_string(),
                None => "null".to_string(),
            };
            format!("{f}: {value}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("E11000 duplicate key error collection: memory.{collection} index: {index} dup key: {{ {keys} }}")
}

/// Check whether `doc` matches a MongoDB-style `filter`.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => sub_filters(condition).iter().all(|f| matches(doc, f)),
        "$or" => sub_filters(condition).iter().any(|f| matches(doc, f)),
        "$nor" => !sub_filters(condition).iter().any(|f| matches(doc, f)),
        path => matches_condition(doc.get_path(path), condition),
    })
}

fn sub_filters(condition: &Bson) -> Vec<Document> {
    match condition {
        Bson::Array(items) => items
            .iter()
            .filter_map(|item| item.as_document().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn operators_of(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(doc) if is_operator_doc(doc) => Some(doc),
        _ => None,
    }
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> bool {
    match operators_of(condition) {
        Some(operators) => operators
            .iter()
            .all(|(op, operand)| matches_operator(value, op, operand)),
        None => equals(value, condition),
    }
}

fn matches_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    match op {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$in" => match operand {
            Bson::Array(candidates) => candidates.iter().any(|c| equals(value, c)),
            _ => false,
        },
        "$nin" => match operand {
            Bson::Array(candidates) => !candidates.iter().any(|c| equals(value, c)),
            _ => true,
        },
        "$exists" => {
            let wanted = !matches!(operand, Bson::Boolean(false) | Bson::Null);
            value.is_some() == wanted
        }
        "$gt" => compare(value, operand).is_some_and(|o| o == Ordering::Greater),
        "$gte" => compare(value, operand).is_some_and(|o| o != Ordering::Less),
        "$lt" => compare(value, operand).is_some_and(|o| o == Ordering::Less),
        "$lte" => compare(value, operand).is_some_and(|o| o != Ordering::Greater),
        _ => false,
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| scalar_eq(item, expected))
        }
        Some(actual) => scalar_eq(actual, expected),
    }
}

fn scalar_eq(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

fn compare(value: Option<&Bson>, operand: &Bson) -> Option<Ordering> {
    let value = value?;
    if let (Some(l), Some(r)) = (as_number(value), as_number(operand)) {
        return l.partial_cmp(&r);
    }
    match (value, operand) {
        (Bson::String(l), Bson::String(r)) => Some(l.cmp(r)),
        (Bson::DateTime(l), Bson::DateTime(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Apply an inclusion or exclusion projection.
pub fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection.filter(|p| !p.is_empty()) else {
        return doc.clone();
    };
    let truthy = |v: &Bson| !matches!(v, Bson::Boolean(false) | Bson::Int32(0) | Bson::Int64(0))
        && !matches!(v, Bson::Double(d) if *d == 0.0);
    let inclusive = projection
        .iter()
        .any(|(key, value)| key != ID_KEY && truthy(value));

    if inclusive {
        let mut projected = Document::new();
        let keep_id = projection.get(ID_KEY).is_none_or(truthy);
        for (key, value) in doc {
            let wanted = if key == ID_KEY {
                keep_id
            } else {
                projection.get(key).is_some_and(truthy)
            };
            if wanted {
                projected.insert(key.clone(), value.clone());
            }
        }
        projected
    } else {
        let mut projected = doc.clone();
        for (key, value) in projection {
            if !truthy(value) {
                projected.remove(key);
            }
        }
        projected
    }
}
