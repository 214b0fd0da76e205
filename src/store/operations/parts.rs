use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::CaseRule;
use crate::store::keys;
use crate::store::{Store, StoreError};
use crate::validation::{validate_model_name, validate_part_name};

/// A named slug namespace with its formatting and language policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub name: String,
    pub model: String,
    pub case_rule: CaseRule,
    pub multilang: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Part {
    pub fn new(name: &str, model: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            model: model.to_string(),
            case_rule: CaseRule::None,
            multilang: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Affects only future normalization; existing slugs are never
    /// renormalized.
    pub fn set_case_rule(&mut self, rule: CaseRule) -> &mut Self {
        self.case_rule = rule;
        self.updated_at = Utc::now();
        self
    }

    /// Affects only future assignments; existing slugs keep their stored
    /// language.
    pub fn set_multilang(&mut self, multilang: bool) -> &mut Self {
        self.multilang = multilang;
        self.updated_at = Utc::now();
        self
    }
}

impl Store {
    pub fn create_part(&self, part: &Part) -> Result<(), StoreError> {
        validate_part_name(&part.name).map_err(|e| StoreError::Validation(e.to_string()))?;
        validate_model_name(&part.model).map_err(|e| StoreError::Validation(e.to_string()))?;

        let name_key = keys::part_name_index_key(&part.name);

        // Atomic compare-and-swap: only insert if the name key does not
        // exist, so two concurrent creates with the same name cannot both
        // pass the existence check.
        let cas_result = self
            .parts
            .compare_and_swap(
                name_key.as_bytes(),
                None::<&[u8]>,
                Some(part.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "part_name".to_string(),
                key: part.name.clone(),
            });
        }

        let part_key = keys::part_key(&part.id);
        let part_bytes = Self::serialize(part)?;
        if let Err(e) = self.parts.insert(part_key.as_bytes(), part_bytes) {
            let _ = self.parts.remove(name_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        tracing::info!(part = %part.name, model = %part.model, "Created part");
        Ok(())
    }

    pub fn get_part_by_id(&self, part_id: &str) -> Result<Option<Part>, StoreError> {
        let key = keys::part_key(part_id);
        match self.parts.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_part_by_name(&self, name: &str) -> Result<Option<Part>, StoreError> {
        let index_key = keys::part_name_index_key(name);
        let Some(part_id_raw) = self.parts.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let part_id = match String::from_utf8(part_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in part name index");
                return Ok(None);
            }
        };
        self.get_part_by_id(&part_id)
    }

    pub fn update_part(&self, part: &Part) -> Result<(), StoreError> {
        validate_part_name(&part.name).map_err(|e| StoreError::Validation(e.to_string()))?;
        validate_model_name(&part.model).map_err(|e| StoreError::Validation(e.to_string()))?;

        let existing = self
            .get_part_by_id(&part.id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "part".to_string(),
                key: part.id.clone(),
            })?;

        let part_bytes = Self::serialize(part)?;
        let part_key = keys::part_key(&part.id);

        if existing.name != part.name {
            let old_name_key = keys::part_name_index_key(&existing.name);
            let new_name_key = keys::part_name_index_key(&part.name);
            let pid_bytes = part.id.as_bytes().to_vec();
            let pb = part_bytes.clone();
            let pk = part_key.clone();
            self.parts
                .transaction(move |tx| {
                    // Check inside the transaction that the new name isn't
                    // already taken (idempotent if it points to this part).
                    if let Some(existing_pid) = tx.get(new_name_key.as_bytes())? {
                        if existing_pid.as_ref() != pid_bytes.as_slice() {
                            return sled::transaction::abort(());
                        }
                    }
                    tx.remove(old_name_key.as_bytes())?;
                    tx.insert(new_name_key.as_bytes(), pid_bytes.as_slice())?;
                    tx.insert(pk.as_bytes(), pb.as_slice())?;
                    Ok(())
                })
                .map_err(
                    |e: sled::transaction::TransactionError<()>| match e {
                        sled::transaction::TransactionError::Abort(()) => StoreError::Conflict {
                            entity: "part_name".to_string(),
                            key: part.name.clone(),
                        },
                        sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
                    },
                )?;
        } else {
            self.parts.insert(part_key.as_bytes(), part_bytes)?;
        }

        Ok(())
    }

    pub fn list_parts(&self) -> Result<Vec<Part>, StoreError> {
        let mut parts = Vec::new();
        for item in self.parts.iter() {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);
            if key_str.starts_with("name:") {
                continue;
            }
            parts.push(Self::deserialize::<Part>(&value)?);
        }

        parts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parts)
    }
}
