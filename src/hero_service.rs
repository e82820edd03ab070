//! Ownership-scoped hero management
use crate::auth::hash_credential;
use crate::error::ServiceError;
use crate::guard;
use crate::hero::{Hero, HeroDraft};
use crate::pet::PetSummary;
use crate::service::log_storage;
use crate::storage::Store;
use crate::types::CallerIdentity;
use tracing::info;

#[derive(Clone)]
pub struct HeroService {
    store: Store,
}

impl HeroService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn load_authorized(&self, hero_id: &str, caller: &CallerIdentity) -> Result<Hero, ServiceError> {
        let hero = self
            .store
            .heroes()
            .get(hero_id)
            .map_err(log_storage)?
            .ok_or(ServiceError::NotFound { entity: "hero" })?;
        guard::require(caller, Some(hero.owner()))?;
        Ok(hero)
    }

    fn ensure_unique_name(&self, name: &str, except: Option<&str>) -> Result<(), ServiceError> {
        let name = name.trim();
        let taken = self
            .store
            .heroes()
            .find(|h| h.name.eq_ignore_ascii_case(name) && Some(h.id.as_str()) != except)
            .map_err(log_storage)?;
        if taken.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::invalid("name", "name is already taken"))
        }
    }

    /// Admins see every hero, heroes see the ones they own.
    pub fn list_heroes(&self, caller: &CallerIdentity) -> Result<Vec<Hero>, ServiceError> {
        let heroes = self
            .store
            .heroes()
            .find(|h| guard::authorize(caller, Some(h.owner())).is_permit())
            .map_err(log_storage)?;
        Ok(heroes)
    }

    pub fn heroes_by_city(
        &self,
        caller: &CallerIdentity,
        city: &str,
    ) -> Result<Vec<Hero>, ServiceError> {
        Ok(self
            .list_heroes(caller)?
            .into_iter()
            .filter(|h| h.in_city(city))
            .collect())
    }

    /// A hero registered by another hero is owned by them; one registered by an admin owns itself.
    pub fn register_hero(
        &self,
        caller: &CallerIdentity,
        draft: HeroDraft,
    ) -> Result<Hero, ServiceError> {
        draft.validate_for_create()?;
        if let Some(name) = draft.name.as_deref() {
            self.ensure_unique_name(name, None)?;
        }

        let owner_id = (!caller.is_admin()).then(|| caller.id.clone());

        let credential_hash = draft.password.as_deref().map(hash_credential).transpose()?;
        let hero = draft.into_hero(owner_id, credential_hash)?;
        self.store.heroes().save(&hero).map_err(log_storage)?;
        info!(hero = %hero.id, owner = %hero.owner(), "hero registered");
        Ok(hero)
    }

    pub fn update_hero(
        &self,
        caller: &CallerIdentity,
        hero_id: &str,
        draft: HeroDraft,
    ) -> Result<Hero, ServiceError> {
        let mut hero = self.load_authorized(hero_id, caller)?;
        if let Some(name) = draft.name.as_deref() {
            self.ensure_unique_name(name, Some(&hero.id))?;
        }

        let credential_hash = draft.password.as_deref().map(hash_credential).transpose()?;
        draft.apply_to(&mut hero, credential_hash)?;
        self.store.heroes().save(&hero).map_err(log_storage)?;
        info!(hero = %hero.id, "hero updated");
        Ok(hero)
    }

    /// Heroes owned by the deleted hero become their own owners. Pets stay in place.
    pub fn delete_hero(&self, caller: &CallerIdentity, hero_id: &str) -> Result<(), ServiceError> {
        let hero = self.load_authorized(hero_id, caller)?;

        let orphans = self
            .store
            .heroes()
            .find(|h| {
                h.id != hero.id
                    && h.owner_id
                        .as_deref()
                        .is_some_and(|owner| guard::same_identity(owner, &hero.id))
            })
            .map_err(log_storage)?;
        for mut orphan in orphans {
            orphan.owner_id = None;
            self.store.heroes().save(&orphan).map_err(log_storage)?;
            info!(hero = %orphan.id, former_owner = %hero.id, "hero now owns itself");
        }

        self.store.heroes().remove(&hero.id).map_err(log_storage)?;
        info!(hero = %hero.id, "hero deleted");
        Ok(())
    }

    pub fn hero_pets(
        &self,
        caller: &CallerIdentity,
        hero_id: &str,
    ) -> Result<Vec<PetSummary>, ServiceError> {
        let hero = self.load_authorized(hero_id, caller)?;
        let pets = self
            .store
            .pets()
            .find(|p| {
                p.owner_id
                    .as_deref()
                    .is_some_and(|owner| guard::same_identity(owner, &hero.id))
            })
            .map_err(log_storage)?;
        Ok(pets.iter().map(|p| p.summary()).collect())
    }

    pub fn face_villain(
        &self,
        caller: &CallerIdentity,
        hero_id: &str,
        villain: &str,
    ) -> Result<String, ServiceError> {
        let villain = villain.trim();
        if villain.is_empty() {
            return Err(ServiceError::invalid("villain", "villain is required"));
        }
        let hero = self.load_authorized(hero_id, caller)?;
        Ok(format!("{} faces {}", hero.alias, villain))
    }
}
