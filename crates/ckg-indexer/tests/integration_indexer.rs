//! Integration tests for the CKG build pipeline and store cache.

use ckg_indexer::{
    CacheOptions, CkgCache, Entity, EntityKind, FunctionFilter, GraphBuilder, OpenOutcome,
};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Helper to create a small mixed-language project
fn create_test_project(base: &Path) -> PathBuf {
    let project = base.join("test_project");
    std::fs::create_dir_all(project.join("src")).unwrap();
    std::fs::create_dir_all(project.join(".cache")).unwrap();

    std::fs::write(
        project.join("src").join("shapes.py"),
        r#"class Circle:
    def __init__(self, radius):
        self.radius = radius

    def area(self):
        return 3.14 * self.radius ** 2


def standalone_function():
    return Circle(1).area()
"#,
    )
    .unwrap();

    std::fs::write(
        project.join("src").join("shapes.js"),
        r#"class Square {
  constructor(side) {
    this.side = side;
  }
  area() {
    return this.side * this.side;
  }
}

function standalone_function() {
  return new Square(2).area();
}
"#,
    )
    .unwrap();

    // Hidden directories are never indexed
    std::fs::write(
        project.join(".cache").join("generated.py"),
        "def hidden_function():\n    pass\n",
    )
    .unwrap();

    // Unknown extensions are skipped
    std::fs::write(project.join("notes.txt"), "def not_code():\n").unwrap();

    project
}

fn cache_in(base: &Path) -> CkgCache {
    CkgCache::new(CacheOptions {
        root: base.join("storage"),
        ..Default::default()
    })
}

#[test]
fn test_build_pipeline_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());

    let mut entities: Vec<Entity> = Vec::new();
    let stats = GraphBuilder::new().build(&project, &mut entities).unwrap();

    assert_eq!(stats.files_seen, 3, "hidden files are not walked");
    assert_eq!(stats.files_indexed, 2);
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.files_failed, 0);

    assert!(entities.iter().all(|e| e.name != "hidden_function"));
    assert!(entities.iter().all(|e| e.name != "not_code"));

    let standalone: Vec<_> = entities
        .iter()
        .filter(|e| e.name == "standalone_function")
        .collect();
    assert_eq!(standalone.len(), 2);
    // Walk order is sorted: shapes.js before shapes.py
    assert!(standalone[0].file_path.ends_with("shapes.js"));
    assert!(standalone[1].file_path.ends_with("shapes.py"));
}

#[test]
fn test_cache_reuse_keeps_entities_queryable() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());
    let cache = cache_in(temp_dir.path());

    let first = cache.open(&project).unwrap();
    let OpenOutcome::Built(stats) = &first.outcome else {
        panic!("first open should build");
    };
    assert!(stats.entities > 0);
    drop(first);

    let second = cache.open(&project).unwrap();
    assert!(matches!(second.outcome, OpenOutcome::Reused));
    assert_eq!(cache.build_count(), 1);

    let methods = second
        .store
        .query(EntityKind::Function, "area", FunctionFilter::Method)
        .unwrap();
    let parents: Vec<_> = methods.iter().filter_map(|m| m.parent_class()).collect();
    assert_eq!(parents, vec!["Square", "Circle"]);

    let free = second
        .store
        .query(EntityKind::Function, "standalone_function", FunctionFilter::Free)
        .unwrap();
    assert_eq!(free.len(), 2);
}

#[test]
fn test_modification_triggers_rebuild() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());
    let cache = cache_in(temp_dir.path());

    let first = cache.open(&project).unwrap();
    let first_fp = first.fingerprint.clone();
    let stale = first.db_path.clone();
    drop(first);

    std::fs::write(
        project.join("src").join("extra.py"),
        "def brand_new():\n    return 42\n",
    )
    .unwrap();

    let second = cache.open(&project).unwrap();
    assert_ne!(second.fingerprint, first_fp);
    assert!(matches!(second.outcome, OpenOutcome::Built(_)));
    assert!(!stale.exists(), "stale database should be deleted");
    assert_eq!(cache.build_count(), 2);

    let found = second
        .store
        .query(EntityKind::Function, "brand_new", FunctionFilter::Free)
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_separate_codebases_share_a_cache() {
    let temp_dir = tempdir().unwrap();
    let cache = cache_in(temp_dir.path());

    let alpha = temp_dir.path().join("alpha");
    let beta = temp_dir.path().join("beta");
    std::fs::create_dir_all(&alpha).unwrap();
    std::fs::create_dir_all(&beta).unwrap();
    std::fs::write(alpha.join("a.go"), "package a\n\nfunc Alpha() {}\n").unwrap();
    std::fs::write(beta.join("b.rs"), "fn beta() {}\n\nfn gamma() {}\n").unwrap();

    let a = cache.open(&alpha).unwrap();
    let b = cache.open(&beta).unwrap();
    assert_ne!(a.db_path, b.db_path);

    assert_eq!(
        a.store
            .query(EntityKind::Function, "Alpha", FunctionFilter::Any)
            .unwrap()
            .len(),
        1
    );
    assert!(b
        .store
        .query(EntityKind::Function, "Alpha", FunctionFilter::Any)
        .unwrap()
        .is_empty());
}

#[test]
fn test_expire_spares_fresh_databases() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());
    let cache = cache_in(temp_dir.path());

    let opened = cache.open(&project).unwrap();
    let db_path = opened.db_path.clone();
    drop(opened);

    assert_eq!(cache.expire().unwrap(), 0);
    assert!(db_path.exists());

    let reopened = cache.open(&project).unwrap();
    assert!(matches!(reopened.outcome, OpenOutcome::Reused));
}
