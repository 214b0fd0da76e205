use crate::store::keys;
use crate::store::operations::slugs::Slug;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_slug_object_index", m002_slug_object_index),
    ]
}

/// Run all unapplied migrations.
///
/// Every migration must be idempotent: a crash between func() and
/// set_version() re-runs it on the next start. The version is persisted
/// after each successful step and never moves backwards.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            if raw.len() == 4 {
                let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
                Ok(u32::from_be_bytes(bytes))
            } else {
                Ok(0)
            }
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuild the in-tree object index from the slug records. Covers stores
/// written before the index existed and repairs dangling entries left by a
/// crash mid-write.
fn m002_slug_object_index(store: &Store) -> Result<(), StoreError> {
    for item in store.slugs.iter() {
        let (key, value) = item?;
        let key_str = String::from_utf8_lossy(&key);
        if key_str.starts_with("obj:") {
            continue;
        }
        let slug: Slug = Store::deserialize(&value)?;

        let obj_key = keys::slug_object_index_key(&slug.part_id, slug.object_id, &slug.id);
        store.slugs.insert(obj_key.as_bytes(), &[])?;
    }

    Ok(())
}
