//! A [`Collection`] backed by a MongoDB collection.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use docseed_core::document::{CREATED_AT_KEY, DocumentExt, ID_KEY, UPDATED_AT_KEY};
use docseed_core::{Collection, CriteriaHook, Precedence, SeedResult};
use futures::TryStreamExt;
use mongodb::options::{
    FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReplaceOptions, ReturnDocument,
};
use tracing::debug;

use crate::error::MongoError;

/// A seedable MongoDB model.
///
/// Write errors are normalized: duplicate-key errors become
/// [`ValidationError`](docseed_core::ValidationError)s keyed by path.
#[derive(Clone)]
pub struct MongoModel {
    collection: mongodb::Collection<Document>,
    timestamps: bool,
    criteria: Option<CriteriaHook>,
}

impl MongoModel {
    /// Wrap a driver collection.
    pub fn new(collection: mongodb::Collection<Document>) -> Self {
        Self {
            collection,
            timestamps: false,
            criteria: None,
        }
    }

    /// Stamp `createdAt` and `updatedAt` on writes.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Map seeds to the criteria used to find their stored counterpart.
    pub fn with_seed_criteria(
        mut self,
        hook: impl Fn(&Document) -> Document + Send + Sync + 'static,
    ) -> Self {
        self.criteria = Some(Arc::new(hook));
        self
    }

    /// The underlying driver collection.
    pub fn inner(&self) -> &mongodb::Collection<Document> {
        &self.collection
    }

    /// Whether timestamps are stamped.
    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    fn stamp_created(&self, record: &mut Document) {
        if !self.timestamps {
            return;
        }
        let now = Bson::DateTime(bson::DateTime::now());
        if !record.contains_key(CREATED_AT_KEY) {
            record.insert(CREATED_AT_KEY, now.clone());
        }
        if !record.contains_key(UPDATED_AT_KEY) {
            record.insert(UPDATED_AT_KEY, now);
        }
    }
}

impl std::fmt::Debug for MongoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoModel")
            .field("collection", &self.collection.name())
            .field("timestamps", &self.timestamps)
            .field("criteria", &self.criteria.is_some())
            .finish()
    }
}

fn read_error(err: mongodb::error::Error) -> docseed_core::SeedError {
    MongoError::from(err).into_seed_error(None)
}

fn write_error(err: mongodb::error::Error, record: &Document) -> docseed_core::SeedError {
    MongoError::from(err).into_seed_error(Some(record))
}

#[async_trait]
impl Collection for MongoModel {
    fn name(&self) -> &str {
        self.collection.name()
    }

    async fn find_one(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Option<Document>> {
        let options = FindOneOptions::builder().projection(projection).build();
        self.collection
            .find_one(criteria, options)
            .await
            .map_err(read_error)
    }

    async fn find(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Vec<Document>> {
        let options = FindOptions::builder().projection(projection).build();
        let cursor = self
            .collection
            .find(criteria, options)
            .await
            .map_err(read_error)?;
        cursor.try_collect().await.map_err(read_error)
    }

    async fn create(&self, mut record: Document) -> SeedResult<Document> {
        if !record.contains_key(ID_KEY) {
            record.insert(ID_KEY, ObjectId::new());
        }
        self.stamp_created(&mut record);

        debug!(collection = self.name(), "Inserting document");
        self.collection
            .insert_one(&record, None)
            .await
            .map_err(|e| write_error(e, &record))?;
        Ok(record)
    }

    async fn save(&self, mut record: Document) -> SeedResult<Document> {
        let Some(id) = record.id_value().cloned() else {
            return self.create(record).await;
        };
        if self.timestamps {
            record.insert(UPDATED_AT_KEY, Bson::DateTime(bson::DateTime::now()));
        }

        debug!(collection = self.name(), "Replacing document");
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { ID_KEY: id }, &record, options)
            .await
            .map_err(|e| write_error(e, &record))?;
        Ok(record)
    }

    async fn delete_many(&self, criteria: Document) -> SeedResult<u64> {
        let result = self
            .collection
            .delete_many(criteria, None)
            .await
            .map_err(read_error)?;
        Ok(result.deleted_count)
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
        let pipeline = merge_pipeline(&seed, precedence, self.timestamps);
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        debug!(collection = self.name(), ?precedence, "Atomically upserting seed");
        let stored = self
            .collection
            .find_one_and_update(criteria, pipeline, options)
            .await
            .map_err(|e| write_error(e, &seed))?;
        // With upsert and ReturnDocument::After the server always returns
        // a document; fall back to the seed if it does not.
        Ok(stored.unwrap_or(seed))
    }
}

/// Aggregation-pipeline update merging `seed` into the matched document.
///
/// The merge is shallow: top-level fields of the winning side replace those
/// of the other. `_id` is never taken from the seed, so a stored id is kept.
///
/// An upserted document has no `_id` while the pipeline runs, so `updatedAt`
/// is stamped only when a stored document was matched. With `timestamps`,
/// inserts are stamped as [`Collection::create`] would.
pub fn merge_pipeline(seed: &Document, precedence: Precedence, timestamps: bool) -> Vec<Document> {
    let incoming = doc! { "$literal": seed.without(ID_KEY) };
    let sides = match precedence {
        Precedence::Seed => vec![Bson::from("$$ROOT"), Bson::Document(incoming)],
        Precedence::Stored => vec![Bson::Document(incoming), Bson::from("$$ROOT")],
    };

    let stamps = if timestamps {
        doc! {
            UPDATED_AT_KEY: "$$NOW",
            CREATED_AT_KEY: { "$ifNull": [format!("${CREATED_AT_KEY}"), "$$NOW"] },
        }
    } else {
        // A missing result leaves the field as the seed wrote it.
        doc! {
            UPDATED_AT_KEY: {
                "$cond": [
                    { "$eq": [{ "$type": format!("${ID_KEY}") }, "missing"] },
                    format!("${UPDATED_AT_KEY}"),
                    "$$NOW",
                ]
            },
        }
    };

    vec![
        doc! { "$replaceWith": { "$mergeObjects": sides } },
        doc! { "$set": stamps },
    ]
}
