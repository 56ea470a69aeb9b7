//! Seed input normalization.

use std::fmt;
use std::sync::Arc;

use bson::Document;
use tracing::debug;

use crate::source::SeedProvider;

/// Predicate deciding which records of a bundle are kept.
pub type SeedFilter = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

/// Mapping applied to each kept record of a bundle.
pub type SeedTransform = Arc<dyn Fn(Document) -> Document + Send + Sync>;

/// What a caller hands to [`Seeder::seed`](crate::Seeder::seed).
#[derive(Debug, Clone, Default)]
pub enum SeedInput {
    /// Load seeds from the seed provider.
    #[default]
    None,
    /// A single record.
    One(Document),
    /// A list of records.
    Many(Vec<Document>),
    /// Records with an optional filter and transform.
    Bundle(SeedBundle),
}

impl From<Document> for SeedInput {
    fn from(doc: Document) -> Self {
        Self::One(doc)
    }
}

impl From<Vec<Document>> for SeedInput {
    fn from(docs: Vec<Document>) -> Self {
        Self::Many(docs)
    }
}

impl From<SeedBundle> for SeedInput {
    fn from(bundle: SeedBundle) -> Self {
        Self::Bundle(bundle)
    }
}

impl From<Option<Document>> for SeedInput {
    fn from(doc: Option<Document>) -> Self {
        doc.map_or(Self::None, Self::One)
    }
}

impl From<()> for SeedInput {
    fn from(_: ()) -> Self {
        Self::None
    }
}

/// Seed records with an optional filter and transform.
///
/// ```rust
/// use docseed_core::{SeedBundle, doc};
///
/// let bundle = SeedBundle::new(vec![doc! { "name": "a" }, doc! { "name": "b" }])
///     .filter(|seed| seed.get_str("name").ok() != Some("b"))
///     .transform(|mut seed| {
///         seed.insert("active", true);
///         seed
///     });
/// assert_eq!(bundle.data.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct SeedBundle {
    /// Records; when empty, the seed provider is consulted.
    pub data: Vec<Document>,
    /// Keep predicate; keeps everything when unset.
    pub filter: Option<SeedFilter>,
    /// Per-record mapping; identity when unset.
    pub transform: Option<SeedTransform>,
}

impl SeedBundle {
    /// Create a bundle of records.
    pub fn new(data: Vec<Document>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Set the keep predicate.
    pub fn filter(mut self, filter: impl Fn(&Document) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Set the per-record mapping.
    pub fn transform(
        mut self,
        transform: impl Fn(Document) -> Document + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }
}

impl fmt::Debug for SeedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedBundle")
            .field("data", &self.data)
            .field("filter", &self.filter.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Turn caller input into the list of records to seed.
///
/// Empty records are dropped first. When no records remain, `provider` is
/// asked for the seeds of `collection`. Empty records are dropped again
/// after transforming. Order is preserved.
pub fn normalize(input: SeedInput, collection: &str, provider: &dyn SeedProvider) -> Vec<Document> {
    let bundle = match input {
        SeedInput::None => SeedBundle::default(),
        SeedInput::One(doc) => SeedBundle::new(vec![doc]),
        SeedInput::Many(docs) => SeedBundle::new(docs),
        SeedInput::Bundle(bundle) => bundle,
    };
    let SeedBundle {
        mut data,
        filter,
        transform,
    } = bundle;

    data.retain(|seed| !seed.is_empty());
    if data.is_empty() {
        data.extend(provider.load(collection));
    }

    let records: Vec<Document> = data
        .into_iter()
        .filter(|seed| !seed.is_empty())
        .filter(|seed| filter.as_ref().is_none_or(|keep| keep(seed)))
        .map(|seed| match &transform {
            Some(transform) => transform(seed),
            None => seed,
        })
        .filter(|seed| !seed.is_empty())
        .collect();

    debug!(collection, count = records.len(), "Normalized seed input");
    records
}
