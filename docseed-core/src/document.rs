//! Document helpers used by the seed pipeline.

use bson::{Bson, Document, oid::ObjectId};

/// Reserved seed key holding dependency descriptors.
pub const POPULATE_KEY: &str = "populate";

/// Primary key field.
pub const ID_KEY: &str = "_id";

/// Timestamp stamped on merged records.
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Timestamp stamped on records created with timestamps enabled.
pub const CREATED_AT_KEY: &str = "createdAt";

/// Which side wins when a seed and a stored record disagree on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// Incoming seed values overwrite stored values.
    #[default]
    Seed,
    /// Stored values are kept; only fields missing from the store are added.
    Stored,
}

impl Precedence {
    /// Precedence for the `fresh` flag.
    pub fn from_fresh(fresh: bool) -> Self {
        if fresh { Self::Stored } else { Self::Seed }
    }
}

/// Extension trait for BSON documents.
pub trait DocumentExt {
    /// Get the `_id` field, whatever its BSON type.
    fn id_value(&self) -> Option<&Bson>;

    /// Get the `_id` field as ObjectId.
    fn object_id(&self) -> Option<ObjectId>;

    /// Copy of this document without the given key.
    fn without(&self, key: &str) -> Document;

    /// Look up a dotted path (`address.city`).
    fn get_path(&self, path: &str) -> Option<&Bson>;
}

impl DocumentExt for Document {
    fn id_value(&self) -> Option<&Bson> {
        self.get(ID_KEY)
    }

    fn object_id(&self) -> Option<ObjectId> {
        self.get_object_id(ID_KEY).ok()
    }

    fn without(&self, key: &str) -> Document {
        let mut copy = self.clone();
        copy.remove(key);
        copy
    }

    fn get_path(&self, path: &str) -> Option<&Bson> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.get(first)?;
        for part in parts {
            current = match current {
                Bson::Document(inner) => inner.get(part)?,
                Bson::Array(items) => {
                    let index: usize = part.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Identifier of a resolved value: the `_id` of a document, or the value itself.
pub fn id_of(value: &Bson) -> Option<Bson> {
    match value {
        Bson::Document(doc) => doc.id_value().cloned(),
        Bson::Null | Bson::Undefined => None,
        other => Some(other.clone()),
    }
}

/// Deep-merge `overlay` into `base`.
///
/// Nested documents present on both sides are merged key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_objects(mut base: Document, overlay: Document) -> Document {
    for (key, value) in overlay {
        let value = match (base.get_mut(&key), value) {
            (Some(Bson::Document(left)), Bson::Document(right)) => {
                *left = merge_objects(std::mem::take(left), right);
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
    base
}

/// Merge a seed with the stored record it reconciles against.
///
/// The stored `_id` is always kept and `updatedAt` is stamped.
pub fn merge_seed(stored: Document, seed: Document, precedence: Precedence) -> Document {
    let id = stored.id_value().cloned();
    let mut merged = match precedence {
        Precedence::Seed => merge_objects(stored, seed),
        Precedence::Stored => merge_objects(seed, stored),
    };
    if let Some(id) = id {
        merged.insert(ID_KEY, id);
    }
    merged.insert(UPDATED_AT_KEY, Bson::DateTime(bson::DateTime::now()));
    merged
}

/// Strip the reserved `populate` key.
pub fn without_populate(mut seed: Document) -> Document {
    seed.remove(POPULATE_KEY);
    seed
}
