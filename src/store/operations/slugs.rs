use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::operations::parts::Part;
use crate::store::{Store, StoreError};
use crate::validation::{validate_lang, validate_slug_name};

/// A human-readable identifier mapped to an object within a part+language
/// namespace. Never physically removed; "deleted" is a state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slug {
    pub id: String,
    pub part_id: String,
    pub object_id: i64,
    pub lang: String,
    pub name: String,
    pub state: SlugState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlugState {
    Active,
    Outdated,
    Deleted,
    Hidden,
}

impl SlugState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlugState::Active => "active",
            SlugState::Outdated => "outdated",
            SlugState::Deleted => "deleted",
            SlugState::Hidden => "hidden",
        }
    }
}

impl Slug {
    pub fn new(part: &Part, object_id: i64, lang: &str, name: &str, state: SlugState) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            part_id: part.id.clone(),
            object_id,
            lang: lang.to_string(),
            name: name.to_string(),
            state,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_state(&mut self, state: SlugState) -> &mut Self {
        self.state = state;
        self.updated_at = Utc::now();
        self
    }

    pub fn activate(&mut self) -> &mut Self {
        self.set_state(SlugState::Active)
    }

    pub fn outdate(&mut self) -> &mut Self {
        self.set_state(SlugState::Outdated)
    }

    pub fn delete(&mut self) -> &mut Self {
        self.set_state(SlugState::Deleted)
    }

    pub fn hide(&mut self) -> &mut Self {
        self.set_state(SlugState::Hidden)
    }

    /// Repoint at a different target object. Persist with `update_slug`.
    pub fn change_object_id(&mut self, new_object_id: i64) -> &mut Self {
        self.object_id = new_object_id;
        self.updated_at = Utc::now();
        self
    }

    /// Move to a different language namespace. Persist with `update_slug`;
    /// the move fails with Conflict if the name is taken there.
    pub fn change_lang(&mut self, new_lang: &str) -> &mut Self {
        self.lang = new_lang.to_string();
        self.updated_at = Utc::now();
        self
    }
}

fn validate_slug(slug: &Slug) -> Result<(), StoreError> {
    validate_slug_name(&slug.name).map_err(|e| StoreError::Validation(e.to_string()))?;
    validate_lang(&slug.lang).map_err(|e| StoreError::Validation(e.to_string()))?;
    Ok(())
}

impl Store {
    pub fn get_slug_by_id(&self, slug_id: &str) -> Result<Option<Slug>, StoreError> {
        let key = keys::slug_key(slug_id);
        match self.slugs.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Point lookup through the uniqueness index. Any state matches.
    pub fn find_slug_by_name(
        &self,
        part_id: &str,
        lang: &str,
        name: &str,
    ) -> Result<Option<Slug>, StoreError> {
        let index_key = keys::slug_name_index_key(part_id, lang, name);
        let Some(slug_id_raw) = self.slug_names.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let slug_id = match String::from_utf8(slug_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in slug name index");
                return Ok(None);
            }
        };
        self.get_slug_by_id(&slug_id)
    }

    /// All of an object's slugs across languages and states. Order
    /// unspecified.
    pub fn list_slugs_for_object(
        &self,
        part_id: &str,
        object_id: i64,
    ) -> Result<Vec<Slug>, StoreError> {
        let prefix = keys::slug_object_prefix(part_id, object_id);
        let mut slugs = Vec::new();
        for item in self.slugs.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let key_str = String::from_utf8_lossy(&key);
            let slug_id = &key_str[prefix.len()..];
            match self.get_slug_by_id(slug_id)? {
                Some(slug) => slugs.push(slug),
                None => {
                    tracing::warn!(slug_id, "Dangling object index entry, skipping");
                }
            }
        }
        Ok(slugs)
    }

    pub fn insert_slug(&self, slug: &Slug) -> Result<(), StoreError> {
        self.apply_slug_changes(&[], Some(slug))
    }

    pub fn update_slug(&self, slug: &Slug) -> Result<(), StoreError> {
        self.apply_slug_changes(std::slice::from_ref(slug), None)
    }

    /// Persist a set of slug mutations and at most one insert as a single
    /// transaction over the slugs tree and the name index. Claiming a name
    /// key held by a different slug aborts with Conflict, so a racing
    /// writer loses deterministically and no write is partially applied.
    pub fn apply_slug_changes(
        &self,
        updates: &[Slug],
        insert: Option<&Slug>,
    ) -> Result<(), StoreError> {
        for slug in updates.iter().chain(insert) {
            validate_slug(slug)?;
        }

        let update_bytes = updates
            .iter()
            .map(Self::serialize)
            .collect::<Result<Vec<_>, _>>()?;
        let insert_bytes = insert.map(Self::serialize).transpose()?;

        (&self.slugs, &self.slug_names)
            .transaction(|(tx_slugs, tx_names)| {
                use sled::transaction::ConflictableTransactionError::Abort;

                for (slug, bytes) in updates.iter().zip(&update_bytes) {
                    let slug_key = keys::slug_key(&slug.id);
                    let old_raw = tx_slugs
                        .get(slug_key.as_bytes())?
                        .ok_or_else(|| {
                            Abort(StoreError::NotFound {
                                entity: "slug".to_string(),
                                key: slug.id.clone(),
                            })
                        })?;
                    let old: Slug = serde_json::from_slice(&old_raw)
                        .map_err(|e| Abort(StoreError::Serialization(e)))?;

                    if (&old.part_id, &old.lang, &old.name)
                        != (&slug.part_id, &slug.lang, &slug.name)
                    {
                        let old_name_key =
                            keys::slug_name_index_key(&old.part_id, &old.lang, &old.name);
                        let new_name_key =
                            keys::slug_name_index_key(&slug.part_id, &slug.lang, &slug.name);
                        if let Some(holder) = tx_names.get(new_name_key.as_bytes())? {
                            if holder.as_ref() != slug.id.as_bytes() {
                                return Err(Abort(StoreError::Conflict {
                                    entity: "slug_name".to_string(),
                                    key: new_name_key,
                                }));
                            }
                        }
                        tx_names.remove(old_name_key.as_bytes())?;
                        tx_names
                            .insert(new_name_key.as_bytes(), slug.id.as_bytes())?;
                    }

                    if (&old.part_id, old.object_id) != (&slug.part_id, slug.object_id) {
                        let old_obj_key = keys::slug_object_index_key(
                            &old.part_id,
                            old.object_id,
                            &old.id,
                        );
                        let new_obj_key = keys::slug_object_index_key(
                            &slug.part_id,
                            slug.object_id,
                            &slug.id,
                        );
                        tx_slugs.remove(old_obj_key.as_bytes())?;
                        tx_slugs.insert(new_obj_key.as_bytes(), &[])?;
                    }

                    tx_slugs.insert(slug_key.as_bytes(), bytes.as_slice())?;
                }

                if let (Some(slug), Some(bytes)) = (insert, &insert_bytes) {
                    let name_key =
                        keys::slug_name_index_key(&slug.part_id, &slug.lang, &slug.name);
                    if let Some(holder) = tx_names.get(name_key.as_bytes())? {
                        if holder.as_ref() != slug.id.as_bytes() {
                            return Err(Abort(StoreError::Conflict {
                                entity: "slug_name".to_string(),
                                key: name_key,
                            }));
                        }
                    }
                    tx_names.insert(name_key.as_bytes(), slug.id.as_bytes())?;

                    let slug_key = keys::slug_key(&slug.id);
                    tx_slugs.insert(slug_key.as_bytes(), bytes.as_slice())?;
                    let obj_key = keys::slug_object_index_key(
                        &slug.part_id,
                        slug.object_id,
                        &slug.id,
                    );
                    tx_slugs.insert(obj_key.as_bytes(), &[])?;
                }

                Ok(())
            })
            .map_err(
                |error: sled::transaction::TransactionError<StoreError>| match error {
                    sled::transaction::TransactionError::Abort(store_error) => store_error,
                    sled::transaction::TransactionError::Storage(storage_error) => {
                        StoreError::Sled(storage_error)
                    }
                },
            )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open_store(dir: &tempfile::TempDir, name: &str) -> Store {
        let db_path = dir.path().join(name);
        Store::open(db_path.to_str().unwrap()).unwrap()
    }

    fn seed_part(store: &Store, name: &str) -> Part {
        let part = Part::new(name, "App:Article");
        store.create_part(&part).unwrap();
        part
    }

    #[test]
    fn insert_and_find_by_name() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db");
        let part = seed_part(&store, "article");

        let slug = Slug::new(&part, 42, "en", "my-post", SlugState::Active);
        store.insert_slug(&slug).unwrap();

        let got = store
            .find_slug_by_name(&part.id, "en", "my-post")
            .unwrap()
            .unwrap();
        assert_eq!(got.id, slug.id);
        assert_eq!(got.object_id, 42);
        assert_eq!(got.state, SlugState::Active);
    }

    #[test]
    fn duplicate_name_in_namespace_conflicts() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db2");
        let part = seed_part(&store, "article");

        store
            .insert_slug(&Slug::new(&part, 1, "en", "my-post", SlugState::Active))
            .unwrap();
        let err = store
            .insert_slug(&Slug::new(&part, 2, "en", "my-post", SlugState::Active))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn same_name_other_lang_coexists() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db3");
        let part = seed_part(&store, "article");

        store
            .insert_slug(&Slug::new(&part, 1, "en", "my-post", SlugState::Active))
            .unwrap();
        store
            .insert_slug(&Slug::new(&part, 1, "de", "my-post", SlugState::Active))
            .unwrap();

        assert!(store.find_slug_by_name(&part.id, "de", "my-post").unwrap().is_some());
    }

    #[test]
    fn list_for_object_returns_all_states() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db4");
        let part = seed_part(&store, "article");

        store
            .insert_slug(&Slug::new(&part, 42, "en", "one", SlugState::Active))
            .unwrap();
        store
            .insert_slug(&Slug::new(&part, 42, "en", "two", SlugState::Outdated))
            .unwrap();
        store
            .insert_slug(&Slug::new(&part, 7, "en", "other", SlugState::Active))
            .unwrap();

        let slugs = store.list_slugs_for_object(&part.id, 42).unwrap();
        assert_eq!(slugs.len(), 2);
        assert!(slugs.iter().all(|s| s.object_id == 42));
    }

    #[test]
    fn update_state_keeps_indexes() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db5");
        let part = seed_part(&store, "article");

        let mut slug = Slug::new(&part, 42, "en", "my-post", SlugState::Active);
        store.insert_slug(&slug).unwrap();

        slug.outdate();
        store.update_slug(&slug).unwrap();

        let got = store
            .find_slug_by_name(&part.id, "en", "my-post")
            .unwrap()
            .unwrap();
        assert_eq!(got.state, SlugState::Outdated);
        assert_eq!(store.list_slugs_for_object(&part.id, 42).unwrap().len(), 1);
    }

    #[test]
    fn change_lang_moves_name_index() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db6");
        let part = seed_part(&store, "article");

        let mut slug = Slug::new(&part, 42, "en", "my-post", SlugState::Active);
        store.insert_slug(&slug).unwrap();

        slug.change_lang("de");
        store.update_slug(&slug).unwrap();

        assert!(store.find_slug_by_name(&part.id, "en", "my-post").unwrap().is_none());
        assert!(store.find_slug_by_name(&part.id, "de", "my-post").unwrap().is_some());
    }

    #[test]
    fn change_lang_onto_taken_name_conflicts() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db7");
        let part = seed_part(&store, "article");

        store
            .insert_slug(&Slug::new(&part, 1, "de", "my-post", SlugState::Active))
            .unwrap();
        let mut slug = Slug::new(&part, 2, "en", "my-post", SlugState::Active);
        store.insert_slug(&slug).unwrap();

        slug.change_lang("de");
        let err = store.update_slug(&slug).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Nothing was applied: the record still lives under "en".
        assert!(store.find_slug_by_name(&part.id, "en", "my-post").unwrap().is_some());
    }

    #[test]
    fn change_object_id_moves_object_index() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db8");
        let part = seed_part(&store, "article");

        let mut slug = Slug::new(&part, 42, "en", "my-post", SlugState::Active);
        store.insert_slug(&slug).unwrap();

        slug.change_object_id(43);
        store.update_slug(&slug).unwrap();

        assert!(store.list_slugs_for_object(&part.id, 42).unwrap().is_empty());
        let moved = store.list_slugs_for_object(&part.id, 43).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].id, slug.id);
    }

    #[test]
    fn update_missing_slug_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db9");
        let part = seed_part(&store, "article");

        let slug = Slug::new(&part, 42, "en", "ghost", SlugState::Active);
        let err = store.update_slug(&slug).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn state_display_names() {
        assert_eq!(SlugState::Active.as_str(), "active");
        assert_eq!(SlugState::Outdated.as_str(), "outdated");
        assert_eq!(SlugState::Deleted.as_str(), "deleted");
        assert_eq!(SlugState::Hidden.as_str(), "hidden");
    }

    #[test]
    fn invalid_lang_rejected() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir, "slugs-db10");
        let part = seed_part(&store, "article");

        let slug = Slug::new(&part, 42, "EN", "my-post", SlugState::Active);
        let err = store.insert_slug(&slug).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
