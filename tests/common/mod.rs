use std::sync::Arc;

use tempfile::TempDir;

use slug_registry::{CaseRule, Part, SlugRegistry, Store};

pub struct TestContext {
    pub store: Arc<Store>,
    pub registry: SlugRegistry,
    _temp_dir: TempDir,
}

pub fn setup() -> TestContext {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("slugs-test.sled");
    let store = Arc::new(Store::open(sled_path.to_str().expect("utf-8 path")).expect("open store"));
    store.run_migrations().expect("run migrations");

    TestContext {
        registry: SlugRegistry::new(store.clone()),
        store,
        _temp_dir: temp_dir,
    }
}

pub fn seed_part(
    store: &Store,
    name: &str,
    case_rule: CaseRule,
    multilang: bool,
) -> Part {
    let mut part = Part::new(name, "App:Article");
    part.set_case_rule(case_rule).set_multilang(multilang);
    store.create_part(&part).expect("create seed part");
    part
}
