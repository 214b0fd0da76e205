use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::case;
use crate::constants::LANG_ALL;
use crate::store::operations::parts::Part;
use crate::store::operations::slugs::{Slug, SlugState};
use crate::store::{Store, StoreError};

/// Read-mostly, insert-once cache of part definitions, owned by a registry
/// instance. Parts are effectively static configuration, so entries live
/// until explicitly invalidated.
#[derive(Debug, Default)]
pub struct PartCache {
    inner: RwLock<HashMap<String, Arc<Part>>>,
}

impl PartCache {
    fn get(&self, name: &str) -> Option<Arc<Part>> {
        self.inner.read().expect("part cache poisoned").get(name).cloned()
    }

    fn insert(&self, part: Part) -> Arc<Part> {
        let part = Arc::new(part);
        self.inner
            .write()
            .expect("part cache poisoned")
            .entry(part.name.clone())
            .or_insert_with(|| part.clone())
            .clone()
    }

    pub fn invalidate(&self, name: &str) {
        self.inner.write().expect("part cache poisoned").remove(name);
    }

    pub fn clear(&self) {
        self.inner.write().expect("part cache poisoned").clear();
    }
}

/// The slug lifecycle engine: assignment with automatic history
/// versioning, uniqueness queries and per-part name normalization.
#[derive(Debug)]
pub struct SlugRegistry {
    store: Arc<Store>,
    parts: PartCache,
}

impl SlugRegistry {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            parts: PartCache::default(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Resolve a part by name, filling the cache on first use.
    pub fn part(&self, part_name: &str) -> Result<Arc<Part>, StoreError> {
        if let Some(part) = self.parts.get(part_name) {
            return Ok(part);
        }
        let part = self
            .store
            .get_part_by_name(part_name)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "part".to_string(),
                key: part_name.to_string(),
            })?;
        tracing::debug!(part = %part_name, "Cached part definition");
        Ok(self.parts.insert(part))
    }

    /// Drop one cached part definition, forcing a reload on next use.
    pub fn invalidate_part(&self, part_name: &str) {
        self.parts.invalidate(part_name);
    }

    pub fn clear_part_cache(&self) {
        self.parts.clear();
    }

    /// Assign `name` to `object_id` under the given part.
    ///
    /// Re-asserting an existing (name, language) pair transitions that
    /// record to `state`; otherwise a new record is created. When the new
    /// record is Active and not an alternate, any other record the object
    /// holds in the same language is demoted to Outdated, so its URL can
    /// keep redirecting. The name is stored as given; normalization is the
    /// caller's explicit step (see `normalize`).
    ///
    /// All touched records commit as one transaction. A concurrent assigner
    /// claiming the same (part, language, name) loses with a retryable
    /// `Conflict`.
    pub fn assign(
        &self,
        part_name: &str,
        object_id: i64,
        lang: &str,
        name: &str,
        state: SlugState,
        as_alternate: bool,
    ) -> Result<(), StoreError> {
        let part = self.part(part_name)?;
        let lang = effective_lang(&part, lang);

        let existing = self.store.list_slugs_for_object(&part.id, object_id)?;
        let (updates, insert) =
            plan_assignment(&part, object_id, lang, name, state, as_alternate, existing);

        let created = insert.is_some();
        self.store.apply_slug_changes(&updates, insert.as_ref())?;

        tracing::info!(
            part = %part_name,
            object_id,
            lang,
            name,
            state = state.as_str(),
            as_alternate,
            created,
            demoted = updates.iter().filter(|s| s.name != name).count(),
            "Assigned slug"
        );
        Ok(())
    }

    /// All slugs the object holds under the part, across languages and
    /// states. Order unspecified.
    pub fn list_for_object(
        &self,
        part_name: &str,
        object_id: i64,
    ) -> Result<Vec<Slug>, StoreError> {
        let part = self.part(part_name)?;
        self.store.list_slugs_for_object(&part.id, object_id)
    }

    /// Whether `name` is free in the part's effective-language namespace.
    ///
    /// Records of every state occupy their name, so even Deleted or
    /// Outdated slugs block reuse. An object re-asserting its own name is
    /// not a conflict when passed as `excluding_object_id`.
    pub fn is_name_available(
        &self,
        part_name: &str,
        name: &str,
        lang: &str,
        excluding_object_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let part = self.part(part_name)?;
        let lang = effective_lang(&part, lang);
        match self.store.find_slug_by_name(&part.id, lang, name)? {
            Some(slug) => Ok(excluding_object_id == Some(slug.object_id)),
            None => Ok(true),
        }
    }

    /// Look up the slug occupying (part, effective language, name), in any
    /// state.
    pub fn find_by_name(
        &self,
        part_name: &str,
        name: &str,
        lang: &str,
    ) -> Result<Option<Slug>, StoreError> {
        let part = self.part(part_name)?;
        let lang = effective_lang(&part, lang);
        self.store.find_slug_by_name(&part.id, lang, name)
    }

    /// Apply the part's case rule to a raw name.
    pub fn normalize(&self, part_name: &str, raw_name: &str) -> Result<String, StoreError> {
        let part = self.part(part_name)?;
        Ok(case::normalize(part.case_rule, raw_name))
    }
}

fn effective_lang<'a>(part: &Part, lang: &'a str) -> &'a str {
    if part.multilang {
        lang
    } else {
        LANG_ALL
    }
}

/// The assignment state machine, as a pure pass over the object's existing
/// records. Returns the records to rewrite and the record to create, if
/// any.
fn plan_assignment(
    part: &Part,
    object_id: i64,
    lang: &str,
    name: &str,
    state: SlugState,
    as_alternate: bool,
    existing: Vec<Slug>,
) -> (Vec<Slug>, Option<Slug>) {
    let mut updates = Vec::new();
    let mut exists = false;

    for mut item in existing {
        if item.name == name && item.lang == lang {
            // The same slug re-asserted: take the desired state, advance
            // updated_at even when the state is unchanged.
            item.set_state(state);
            updates.push(item);
            exists = true;
        } else if item.lang == lang
            && state == SlugState::Active
            && !as_alternate
            && item.state != SlugState::Outdated
        {
            // A different slug in the same language loses canonical status.
            item.outdate();
            updates.push(item);
        }
    }

    let insert = if exists {
        None
    } else {
        Some(Slug::new(part, object_id, lang, name, state))
    };
    (updates, insert)
}
