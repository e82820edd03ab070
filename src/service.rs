//! Service layer API for pet records and pet care
use crate::error::{ServiceError, StorageError};
use crate::guard;
use crate::pet::{Pet, PetDraft};
use crate::pet_state::{CareAction, DriftSource, PetState, apply_action, apply_query_drift};
use crate::storage::Store;
use crate::types::CallerIdentity;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reply to a care action: the persisted pet plus caller-facing feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareOutcome {
    pub message: String,
    /// Immediate feedback value, e.g. `alimentada` right after feeding.
    pub display: String,
    pub state: PetState,
    pub pet: Pet,
}

/// Reply to a state query after drift has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateReport {
    pub state: PetState,
    pub description: String,
}

#[derive(Clone)]
pub struct PetService {
    store: Store,
    drift: Arc<dyn DriftSource>,
}

impl PetService {
    pub fn new(store: Store, drift: Arc<dyn DriftSource>) -> Self {
        Self { store, drift }
    }

    /// Load a pet and check the caller may act on it.
    fn load_authorized(&self, pet_id: &str, caller: &CallerIdentity) -> Result<Pet, ServiceError> {
        let pet = self
            .store
            .pets()
            .get(pet_id)
            .map_err(log_storage)?
            .ok_or(ServiceError::NotFound { entity: "pet" })?;
        guard::require(caller, pet.owner_id.as_deref())?;
        Ok(pet)
    }

    fn persist(&self, pet: &Pet) -> Result<(), ServiceError> {
        self.store.pets().save(pet).map_err(log_storage)?;
        Ok(())
    }

    /// Admins see every pet, heroes only their own.
    pub fn list_pets(&self, caller: &CallerIdentity) -> Result<Vec<Pet>, ServiceError> {
        let pets = if caller.is_admin() {
            self.store.pets().all()
        } else {
            self.store
                .pets()
                .find(|p| guard::authorize(caller, p.owner_id.as_deref()).is_permit())
        };
        Ok(pets.map_err(log_storage)?)
    }

    /// Heroes always own what they create; admins must name an existing hero.
    pub fn add_pet(&self, caller: &CallerIdentity, draft: PetDraft) -> Result<Pet, ServiceError> {
        draft.validate_for_create()?;

        let owner_id = if caller.is_admin() {
            let requested = draft
                .owner_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ServiceError::invalid("ownerId", "ownerId is required"))?;
            let hero = self
                .store
                .heroes()
                .get(requested)
                .map_err(log_storage)?
                .ok_or_else(|| ServiceError::invalid("ownerId", "ownerId must name an existing hero"))?;
            hero.id
        } else {
            caller.id.clone()
        };

        let pet = draft.into_pet(owner_id)?;
        self.persist(&pet)?;
        info!(pet = %pet.id, owner = ?pet.owner_id, "pet created");
        Ok(pet)
    }

    pub fn update_pet(
        &self,
        caller: &CallerIdentity,
        pet_id: &str,
        draft: PetDraft,
    ) -> Result<Pet, ServiceError> {
        let mut pet = self.load_authorized(pet_id, caller)?;
        draft.apply_to(&mut pet)?;
        self.persist(&pet)?;
        info!(pet = %pet.id, "pet updated");
        Ok(pet)
    }

    pub fn delete_pet(&self, caller: &CallerIdentity, pet_id: &str) -> Result<(), ServiceError> {
        let pet = self.load_authorized(pet_id, caller)?;
        self.store.pets().remove(&pet.id).map_err(log_storage)?;
        info!(pet = %pet.id, "pet deleted");
        Ok(())
    }

    /// Apply a care action and persist the resulting canonical state.
    pub fn care(
        &self,
        caller: &CallerIdentity,
        pet_id: &str,
        action: CareAction,
    ) -> Result<CareOutcome, ServiceError> {
        let mut pet = self.load_authorized(pet_id, caller)?;

        let transition = apply_action(pet.state, action);
        debug!(
            pet = %pet.id,
            %action,
            from = %pet.state,
            to = %transition.state,
            "care action applied"
        );

        if transition.state != pet.state {
            pet.state = transition.state;
            self.persist(&pet)?;
        }

        Ok(CareOutcome {
            message: transition.message.to_string(),
            display: transition.display.to_string(),
            state: pet.state,
            pet,
        })
    }

    pub fn feed(&self, caller: &CallerIdentity, pet_id: &str) -> Result<CareOutcome, ServiceError> {
        self.care(caller, pet_id, CareAction::Feed)
    }

    pub fn bathe(&self, caller: &CallerIdentity, pet_id: &str) -> Result<CareOutcome, ServiceError> {
        self.care(caller, pet_id, CareAction::Bathe)
    }

    pub fn walk(&self, caller: &CallerIdentity, pet_id: &str) -> Result<CareOutcome, ServiceError> {
        self.care(caller, pet_id, CareAction::Walk)
    }

    pub fn play(&self, caller: &CallerIdentity, pet_id: &str) -> Result<CareOutcome, ServiceError> {
        self.care(caller, pet_id, CareAction::Play)
    }

    pub fn heal(&self, caller: &CallerIdentity, pet_id: &str) -> Result<CareOutcome, ServiceError> {
        self.care(caller, pet_id, CareAction::Heal)
    }

    /// Read the pet's state, letting it drift first.
    pub fn pet_state(
        &self,
        caller: &CallerIdentity,
        pet_id: &str,
    ) -> Result<StateReport, ServiceError> {
        let mut pet = self.load_authorized(pet_id, caller)?;

        let draw = self.drift.draw();
        let report = apply_query_drift(pet.state, draw);
        debug!(pet = %pet.id, draw, from = %pet.state, to = %report.state, "state drift");

        if report.state != pet.state {
            pet.state = report.state;
            self.persist(&pet)?;
        }

        Ok(StateReport {
            state: report.state,
            description: report.description.to_string(),
        })
    }
}

pub(crate) fn log_storage(err: StorageError) -> ServiceError {
    error!(error = %err, "storage failure");
    ServiceError::Storage(err)
}
