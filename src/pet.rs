//! Pet records and drafts
use crate::error::{FieldError, ServiceError, StorageError};
use crate::pet_state::PetState;
use crate::storage::Record;
use crate::types::TimeStamp;
use crate::utils::{PET_PREFIX, new_record_id};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, `pet_` prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    #[serde(rename = "type")]
    pub kind: String,
    #[n(3)]
    pub owner_id: Option<String>, // id of the owning hero
    #[n(4)]
    pub state: PetState,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
}

/// Reduced view of a pet used when listing a hero's pets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: PetState,
}

/// Incoming pet fields, also used as the request body for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetDraft {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    // only honoured when an admin creates the pet
    pub owner_id: Option<String>,
}

impl Record for Pet {
    const TREE: &'static str = "pets";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Pet {
    pub fn summary(&self) -> PetSummary {
        PetSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            state: self.state,
        }
    }
}

impl PetDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn set_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
    pub fn set_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    fn field_errors(&self, required: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !present_or_absent(&self.name, required) {
            errors.push(FieldError::new("name", "name is required"));
        }
        if !present_or_absent(&self.kind, required) {
            errors.push(FieldError::new("type", "type is required"));
        }
        errors
    }

    /// Both `name` and `type` must be present and non-blank.
    pub fn validate_for_create(&self) -> Result<(), ServiceError> {
        into_result(self.field_errors(true))
    }

    /// Fields may be omitted but not blank.
    pub fn validate_for_update(&self) -> Result<(), ServiceError> {
        into_result(self.field_errors(false))
    }

    /// Build a new pet in the `normal` state owned by `owner_id`.
    pub fn into_pet(self, owner_id: String) -> Result<Pet, ServiceError> {
        self.validate_for_create()?;
        let id = new_record_id(PET_PREFIX).map_err(|e| StorageError::Id(e.to_string()))?;

        Ok(Pet {
            id,
            name: trimmed(self.name),
            kind: trimmed(self.kind),
            owner_id: Some(owner_id),
            state: PetState::Normal,
            created_at: TimeStamp::new(),
        })
    }

    /// Copy the provided descriptive fields onto `pet`. Owner and state are untouched.
    pub fn apply_to(self, pet: &mut Pet) -> Result<(), ServiceError> {
        self.validate_for_update()?;
        if let Some(name) = self.name {
            pet.name = name.trim().to_string();
        }
        if let Some(kind) = self.kind {
            pet.kind = kind.trim().to_string();
        }
        Ok(())
    }
}

pub(crate) fn present_or_absent(value: &Option<String>, required: bool) -> bool {
    match value {
        Some(v) => !v.trim().is_empty(),
        None => !required,
    }
}

pub(crate) fn into_result(errors: Vec<FieldError>) -> Result<(), ServiceError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationFailed(errors))
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
