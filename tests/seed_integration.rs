//! Integration tests for the seed engine.
//!
//! These tests run the full pipeline (normalization, dependency resolution,
//! reconciliation) against in-memory collections.

use std::fs;
use std::sync::Arc;

use docseed::engine::document::UPDATED_AT_KEY;
use docseed::engine::memory::Operation;
use docseed::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct World {
    registry: Arc<Registry>,
    parents: Arc<MemoryCollection>,
    children: Arc<MemoryCollection>,
}

impl World {
    fn new() -> Self {
        Self::with(MemoryCollection::new("parents"), MemoryCollection::new("children"))
    }

    fn with(parents: MemoryCollection, children: MemoryCollection) -> Self {
        let registry = Arc::new(Registry::new());
        let parents = Arc::new(parents);
        let children = Arc::new(children);
        registry.register("Parent", parents.clone());
        registry.register("Child", children.clone());
        Self {
            registry,
            parents,
            children,
        }
    }

    fn seeder(&self, collection: &Arc<MemoryCollection>, config: SeedConfig) -> Seeder {
        Seeder::builder(collection.clone(), self.registry.clone())
            .config(config)
            .provider(NoSeeds)
            .build()
    }

    fn parents(&self) -> Seeder {
        self.seeder(&self.parents, SeedConfig::default())
    }

    fn children(&self) -> Seeder {
        self.seeder(&self.children, SeedConfig::default())
    }

    async fn parent_id(&self, name: &str) -> Bson {
        self.parents
            .find_one(doc! { "name": name }, None)
            .await
            .unwrap()
            .and_then(|p| p.get("_id").cloned())
            .unwrap()
    }
}

/// Seeding the same record twice yields one document.
#[tokio::test]
async fn test_seed_twice_is_idempotent() {
    let world = World::new();
    let seeder = world.parents();

    let first = seeder.seed(doc! { "name": "John Doe" }).await.unwrap();
    let second = seeder.seed(doc! { "name": "John Doe" }).await.unwrap();

    assert_eq!(world.parents.len(), 1);
    assert_eq!(first[0].get("_id"), second[0].get("_id"));
    assert_eq!(second[0].get_str("name").unwrap(), "John Doe");
}

/// A bundle persists transform(filter(data minus empties)).
#[tokio::test]
async fn test_bundle_filter_and_transform() {
    let world = World::new();
    let bundle = SeedBundle::new(vec![
        doc! { "name": "a" },
        doc! {},
        doc! { "name": "skip" },
        doc! { "name": "b" },
    ])
    .filter(|seed| seed.get_str("name").ok() != Some("skip"))
    .transform(|mut seed| {
        seed.insert("active", true);
        seed
    });

    let seeded = world.parents().seed(bundle).await.unwrap();

    let names: Vec<&str> = seeded.iter().map(|s| s.get_str("name").unwrap()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(seeded.iter().all(|s| s.get_bool("active").unwrap()));
    assert_eq!(world.parents.len(), 2);
}

/// The Parent/Child scenario: a child references its parent by `_id`.
#[tokio::test]
async fn test_parent_child_scenario() {
    let world = World::new();
    world.parents().seed(doc! { "name": "Parent" }).await.unwrap();

    let seeded = world
        .children()
        .seed(doc! {
            "name": "Child",
            "populate": { "parent": Dependency::new("Parent", doc! { "name": "Parent" }) },
        })
        .await
        .unwrap();

    let parent_id = world.parent_id("Parent").await;
    assert_eq!(seeded[0].get("parent"), Some(&parent_id));
    assert!(!seeded[0].contains_key("populate"));

    let stored = world.children.documents();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("parent"), Some(&parent_id));
    assert!(!stored[0].contains_key("populate"));
}

/// Array dependencies resolve to every match; single ones to the first.
#[tokio::test]
async fn test_array_and_single_dependencies() {
    let world = World::new();
    world
        .parents()
        .seed(vec![
            doc! { "name": "A", "kind": "p" },
            doc! { "name": "B", "kind": "p" },
        ])
        .await
        .unwrap();

    let seeded = world
        .children()
        .seed(doc! {
            "name": "Child",
            "populate": {
                "parents": Dependency::many("Parent", doc! { "kind": "p" }),
                "first": Dependency::new("Parent", doc! { "kind": "p" }),
                "named": Dependency::new("Parent", doc! { "kind": "p" }).select(doc! { "name": 1 }),
            },
        })
        .await
        .unwrap();

    let a = world.parent_id("A").await;
    let b = world.parent_id("B").await;
    assert_eq!(seeded[0].get_array("parents").unwrap(), &vec![a.clone(), b]);
    assert_eq!(seeded[0].get("first"), Some(&a));
    assert_eq!(
        seeded[0].get_document("named").unwrap(),
        &doc! { "_id": a, "name": "A" }
    );
}

/// An absent single dependency removes the field; an absent array one is empty.
#[tokio::test]
async fn test_absent_dependencies() {
    let world = World::new();

    let seeded = world
        .children()
        .seed(doc! {
            "name": "Orphan",
            "parent": "placeholder",
            "populate": {
                "parent": Dependency::new("Parent", doc! { "name": "Nobody" }),
                "siblings": Dependency::many("Child", doc! { "name": "Nobody" }),
            },
        })
        .await
        .unwrap();

    assert!(!seeded[0].contains_key("parent"));
    assert_eq!(seeded[0].get_array("siblings").unwrap(), &Vec::<Bson>::new());
}

/// `ignore` excludes documents by `_id` by default.
#[tokio::test]
async fn test_ignore_excludes_by_id() {
    let world = World::new();
    world
        .children()
        .seed(vec![
            doc! { "name": "A", "family": "F" },
            doc! { "name": "B", "family": "F" },
        ])
        .await
        .unwrap();

    let seeded = world
        .children()
        .seed(doc! {
            "name": "C",
            "family": "F",
            "populate": {
                "siblings": Dependency::many("Child", doc! { "family": "F" })
                    .select(doc! { "name": 1 })
                    .ignore(IgnoreClause::new(doc! { "name": "A" })),
            },
        })
        .await
        .unwrap();

    let siblings = seeded[0].get_array("siblings").unwrap();
    assert_eq!(siblings.len(), 1);
    assert_eq!(
        siblings[0].as_document().unwrap().get_str("name").unwrap(),
        "B"
    );
}

/// `ignore` on another model matched against a custom path.
#[tokio::test]
async fn test_ignore_with_custom_path_and_model() {
    let world = World::new();
    world
        .parents()
        .seed(vec![doc! { "name": "Keep" }, doc! { "name": "Drop" }])
        .await
        .unwrap();
    let keep = world.parent_id("Keep").await;
    let drop = world.parent_id("Drop").await;
    world
        .children()
        .seed(vec![
            doc! { "name": "K", "parent": keep },
            doc! { "name": "D", "parent": drop },
        ])
        .await
        .unwrap();

    let seeded = world
        .children()
        .seed(doc! {
            "name": "New",
            "populate": {
                "cousins": Dependency::many("Child", doc! {})
                    .select(doc! { "name": 1 })
                    .ignore(
                        IgnoreClause::new(doc! { "name": "Drop" })
                            .model("Parent")
                            .path("parent"),
                    ),
            },
        })
        .await
        .unwrap();

    let names: Vec<&str> = seeded[0]
        .get_array("cousins")
        .unwrap()
        .iter()
        .map(|c| c.as_document().unwrap().get_str("name").unwrap())
        .collect();
    assert_eq!(names, vec!["K"]);
}

/// Keys already present in `match` win over the exclusion.
#[tokio::test]
async fn test_match_wins_over_ignore_path() {
    let world = World::new();
    world.parents().seed(doc! { "name": "Only" }).await.unwrap();
    let only = world.parent_id("Only").await;

    let seeded = world
        .children()
        .seed(doc! {
            "name": "C",
            "populate": {
                "parent": Dependency::new("Parent", doc! { "_id": only.clone() })
                    .ignore(IgnoreClause::new(doc! { "name": "Only" })),
            },
        })
        .await
        .unwrap();

    assert_eq!(seeded[0].get("parent"), Some(&only));
}

/// An operator condition at the ignore path is combined with the exclusion.
#[tokio::test]
async fn test_ignore_joins_operator_match() {
    let world = World::new();
    world
        .parents()
        .seed(vec![doc! { "name": "A" }, doc! { "name": "B" }])
        .await
        .unwrap();
    let a = world.parent_id("A").await;
    let b = world.parent_id("B").await;

    let seeded = world
        .children()
        .seed(doc! {
            "name": "C",
            "populate": {
                "parent": Dependency::new("Parent", doc! { "_id": { "$in": [a, b.clone()] } })
                    .ignore(IgnoreClause::new(doc! { "name": "A" })),
            },
        })
        .await
        .unwrap();

    assert_eq!(seeded[0].get("parent"), Some(&b));
}

/// Array dependencies with `select` and `ignore` yield the remaining projections.
#[tokio::test]
async fn test_array_select_with_ignore() {
    let world = World::new();
    world
        .parents()
        .seed(vec![
            doc! { "name": "A", "kind": "p", "age": 1 },
            doc! { "name": "B", "kind": "p", "age": 2 },
            doc! { "name": "C", "kind": "p", "age": 3 },
        ])
        .await
        .unwrap();
    let b = world.parent_id("B").await;
    let c = world.parent_id("C").await;

    let seeded = world
        .children()
        .seed(doc! {
            "name": "Child",
            "populate": {
                "parents": Dependency::many("Parent", doc! { "kind": "p" })
                    .select(doc! { "name": 1 })
                    .ignore(IgnoreClause::new(doc! { "age": { "$lt": 2 } })),
            },
        })
        .await
        .unwrap();

    let mut parents: Vec<Document> = seeded[0]
        .get_array("parents")
        .unwrap()
        .iter()
        .map(|p| p.as_document().unwrap().clone())
        .collect();
    parents.sort_by_key(|p| p.get_str("name").unwrap().to_string());
    assert_eq!(
        parents,
        vec![
            doc! { "_id": b, "name": "B" },
            doc! { "_id": c, "name": "C" },
        ]
    );
}

/// Seed values win by default; `updatedAt` is stamped only on merge.
#[tokio::test]
async fn test_seed_values_win_by_default() {
    let parents = MemoryCollection::new("parents")
        .with_seed_criteria(|seed| doc! { "code": seed.get("code").cloned() });
    let world = World::with(parents, MemoryCollection::new("children"));
    let seeder = world.parents();

    let created = seeder
        .seed(doc! { "code": "P1", "name": "Old", "extra": 1 })
        .await
        .unwrap();
    assert!(!created[0].contains_key(UPDATED_AT_KEY));

    let merged = seeder
        .seed(doc! { "code": "P1", "name": "New" })
        .await
        .unwrap();
    assert_eq!(merged[0].get_str("name").unwrap(), "New");
    assert_eq!(merged[0].get_i32("extra").unwrap(), 1);
    assert_eq!(merged[0].get("_id"), created[0].get("_id"));
    assert!(merged[0].contains_key(UPDATED_AT_KEY));
    assert_eq!(world.parents.len(), 1);
}

/// With `fresh`, stored values win and new seed fields are added.
#[tokio::test]
async fn test_fresh_keeps_stored_values() {
    let parents = MemoryCollection::with_documents(
        "parents",
        vec![doc! { "code": "P1", "name": "Stored" }],
    )
    .with_seed_criteria(|seed| doc! { "code": seed.get("code").cloned() });
    let world = World::with(parents, MemoryCollection::new("children"));
    let seeder = world.seeder(&world.parents, SeedConfig::builder().fresh(true).build());

    let merged = seeder
        .seed(doc! { "code": "P1", "name": "Seed", "added": true })
        .await
        .unwrap();

    assert_eq!(merged[0].get_str("name").unwrap(), "Stored");
    assert!(merged[0].get_bool("added").unwrap());
    assert!(merged[0].contains_key(UPDATED_AT_KEY));
}

/// The atomic strategy reconciles the same way.
#[tokio::test]
async fn test_atomic_strategy_is_idempotent() {
    let world = World::new();
    let config = SeedConfig::builder().strategy(UpsertStrategy::Atomic).build();
    let seeder = world.seeder(&world.parents, config);

    let records: Vec<Document> = (0..5).map(|_| doc! { "name": "Same" }).collect();
    seeder.seed_all(records).await.unwrap();
    assert_eq!(world.parents.len(), 1);
}

/// The atomic strategy stamps `updatedAt` on merge only.
#[tokio::test]
async fn test_atomic_strategy_stamps_on_merge() {
    let world = World::new();
    let config = SeedConfig::builder().strategy(UpsertStrategy::Atomic).build();
    let seeder = world.seeder(&world.parents, config);

    let created = seeder.seed(doc! { "name": "P" }).await.unwrap();
    assert!(!created[0].contains_key(UPDATED_AT_KEY));

    let merged = seeder.seed(doc! { "name": "P" }).await.unwrap();
    assert!(merged[0].contains_key(UPDATED_AT_KEY));
    assert_eq!(merged[0].get("_id"), created[0].get("_id"));
}

/// clear_and_seed leaves only the derived records.
#[tokio::test]
async fn test_clear_and_seed_replaces_everything() {
    let parents = MemoryCollection::with_documents(
        "parents",
        vec![doc! { "name": "Stale" }, doc! { "name": "Keep" }],
    );
    let world = World::with(parents, MemoryCollection::new("children"));

    world
        .parents()
        .clear_and_seed(vec![doc! { "name": "Keep" }, doc! { "name": "Fresh" }])
        .await
        .unwrap();

    let mut names: Vec<String> = world
        .parents
        .documents()
        .iter()
        .map(|p| p.get_str("name").unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Fresh", "Keep"]);
}

/// A failed delete stops clear_and_seed before any seed is written.
#[tokio::test]
async fn test_clear_failure_stops_seeding() {
    let world = World::with(
        MemoryCollection::with_documents("parents", vec![doc! { "name": "Stale" }]),
        MemoryCollection::new("children"),
    );
    world.parents.fail_next(Operation::DeleteMany, "unavailable");

    let err = world
        .parents()
        .clear_and_seed(doc! { "name": "Fresh" })
        .await
        .unwrap_err();

    assert!(matches!(err, SeedError::Store(_)));
    assert_eq!(world.parents.len(), 1);
    assert!(world.parents.documents()[0].get_str("name").unwrap() == "Stale");
}

/// Seeds without data come from the seed directory.
#[tokio::test]
async fn test_seeds_from_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("parents.json"),
        r#"{"default": [{"name": "A"}, {}, {"name": "B"}]}"#,
    )
    .unwrap();
    fs::create_dir(dir.path().join("children")).unwrap();
    fs::write(
        dir.path().join("children").join("index.toml"),
        "name = \"Only\"\n",
    )
    .unwrap();

    let world = World::new();
    let config = SeedConfig::builder().seed_path(dir.path()).build();
    let parents = Seeder::builder(world.parents.clone(), world.registry.clone())
        .config(config.clone())
        .build();
    let children = Seeder::builder(world.children.clone(), world.registry.clone())
        .config(config)
        .build();

    assert_eq!(parents.seed(SeedInput::None).await.unwrap().len(), 2);
    assert_eq!(children.clear_and_seed(()).await.unwrap().len(), 1);
    assert_eq!(world.children.documents()[0].get_str("name").unwrap(), "Only");
}

/// A broken seed file degrades to an empty, successful seed.
#[tokio::test]
async fn test_broken_seed_file_seeds_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("parents.json"), "[{ broken").unwrap();

    let world = World::new();
    let seeder = Seeder::builder(world.parents.clone(), world.registry.clone())
        .config(SeedConfig::builder().base_path(dir.path()).seed_path(".").build())
        .build();

    assert!(seeder.seed(()).await.unwrap().is_empty());
    assert!(world.parents.is_empty());
}

/// Duplicate keys surface as structured validation errors.
#[tokio::test]
async fn test_unique_violation_is_normalized() {
    let parents = MemoryCollection::with_documents(
        "parents",
        vec![doc! { "name": "Taken", "code": "X" }],
    )
    .with_unique_index(&["name", "code"]);
    let world = World::with(parents, MemoryCollection::new("children"));

    let err = world
        .parents()
        .seed(doc! { "name": "Taken", "code": "X", "other": 1 })
        .await
        .unwrap_err();

    let validation = err.validation().unwrap();
    assert_eq!(validation.status, 400);
    assert_eq!(validation.paths(), vec!["code", "name"]);
    assert_eq!(validation.errors["name"].index, "name_1_code_1");
    assert_eq!(
        validation.errors["code"].message,
        "Path `code` (X) is not unique."
    );
}

/// The first error is returned, and sibling records still complete.
#[tokio::test]
async fn test_first_error_does_not_cancel_siblings() {
    let world = World::new();

    let err = world
        .children()
        .seed(vec![
            doc! { "name": "ok-1" },
            doc! { "name": "bad", "populate": { "parent": { "model": "Parent" } } },
            doc! { "name": "ok-2" },
        ])
        .await
        .unwrap_err();

    assert!(err.is_invalid_populate());
    assert!(err.to_string().contains("parent"));
    assert_eq!(world.children.len(), 2);
}

/// Unknown dependency models fail that seed only.
#[tokio::test]
async fn test_unknown_model_fails_seed() {
    let world = World::new();
    let err = world
        .children()
        .seed(doc! {
            "name": "C",
            "populate": { "owner": Dependency::new("Owner", doc! {}) },
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SeedError::ModelNotFound(ref model) if model == "Owner"));
    assert!(world.children.is_empty());
}
