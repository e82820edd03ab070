//! Hero records and drafts
use crate::error::{FieldError, ServiceError, StorageError};
use crate::pet::{into_result, present_or_absent};
use crate::storage::Record;
use crate::types::TimeStamp;
use crate::utils::{HERO_PREFIX, new_record_id};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, `hero_` prefix
    #[n(1)]
    pub name: String, // unique across heroes
    #[n(2)]
    pub alias: String,
    #[n(3)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[n(4)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[n(5)]
    #[serde(skip)]
    pub credential_hash: Option<String>,
    #[n(6)]
    pub owner_id: Option<String>, // administrative owner, a hero id
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
}

/// Incoming hero fields, also used as the request body for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HeroDraft {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub city: Option<String>,
    pub team: Option<String>,
    pub password: Option<String>,
}

impl Record for Hero {
    const TREE: &'static str = "heroes";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Hero {
    /// The identity the ownership guard checks against. Heroes without an owner own themselves.
    pub fn owner(&self) -> &str {
        self.owner_id.as_deref().unwrap_or(&self.id)
    }

    pub fn in_city(&self, city: &str) -> bool {
        self.city
            .as_deref()
            .is_some_and(|c| c.trim().to_lowercase() == city.trim().to_lowercase())
    }
}

impl HeroDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn set_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
    pub fn set_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
    pub fn set_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }
    pub fn set_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn field_errors(&self, required: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !present_or_absent(&self.name, required) {
            errors.push(FieldError::new("name", "name is required"));
        }
        if !present_or_absent(&self.alias, required) {
            errors.push(FieldError::new("alias", "alias is required"));
        }
        if !present_or_absent(&self.password, false) {
            errors.push(FieldError::new("password", "password cannot be blank"));
        }
        errors
    }

    pub fn validate_for_create(&self) -> Result<(), ServiceError> {
        into_result(self.field_errors(true))
    }

    pub fn validate_for_update(&self) -> Result<(), ServiceError> {
        into_result(self.field_errors(false))
    }

    /// Build a new hero. `owner_id` of `None` makes the hero its own owner.
    pub fn into_hero(
        self,
        owner_id: Option<String>,
        credential_hash: Option<String>,
    ) -> Result<Hero, ServiceError> {
        self.validate_for_create()?;
        let id = new_record_id(HERO_PREFIX).map_err(|e| StorageError::Id(e.to_string()))?;
        let owner_id = owner_id.unwrap_or_else(|| id.clone());

        Ok(Hero {
            id,
            name: self.name.unwrap_or_default().trim().to_string(),
            alias: self.alias.unwrap_or_default().trim().to_string(),
            city: optional(self.city),
            team: optional(self.team),
            credential_hash,
            owner_id: Some(owner_id),
            created_at: TimeStamp::new(),
        })
    }

    /// Merge provided fields into `hero`. The owner never changes here.
    pub fn apply_to(self, hero: &mut Hero, credential_hash: Option<String>) -> Result<(), ServiceError> {
        self.validate_for_update()?;
        if let Some(name) = self.name {
            hero.name = name.trim().to_string();
        }
        if let Some(alias) = self.alias {
            hero.alias = alias.trim().to_string();
        }
        if self.city.is_some() {
            hero.city = optional(self.city);
        }
        if self.team.is_some() {
            hero.team = optional(self.team);
        }
        if credential_hash.is_some() {
            hero.credential_hash = credential_hash;
        }
        Ok(())
    }
}

// blank optional fields are stored as absent
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
