//! sled-backed repository, one tree per record type
use crate::error::StorageError;
use crate::auth::Admin;
use crate::hero::Hero;
use crate::pet::Pet;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// A CBOR-encoded record keyed by its id.
pub trait Record: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> {
    const TREE: &'static str;

    fn id(&self) -> &str;
}

/// Typed view over one sled tree.
#[derive(Clone)]
pub struct Collection<T> {
    tree: sled::Tree,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Collection<T> {
    fn open(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(T::TREE)?,
            _record: PhantomData,
        })
    }

    pub fn get(&self, id: &str) -> Result<Option<T>, StorageError> {
        match self.tree.get(id.trim().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn find<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let mut found = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            let record: T = decode(&bytes)?;
            if predicate(&record) {
                found.push(record);
            }
        }
        Ok(found)
    }

    pub fn all(&self) -> Result<Vec<T>, StorageError> {
        self.find(|_| true)
    }

    /// Insert or replace the record under its id.
    pub fn save(&self, record: &T) -> Result<(), StorageError> {
        let bytes = minicbor::to_vec(record).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.tree.insert(record.id().as_bytes(), bytes)?;
        Ok(())
    }

    /// Returns whether a record was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.tree.remove(id.trim().as_bytes())?.is_some())
    }
}

fn decode<T: Record>(bytes: &[u8]) -> Result<T, StorageError> {
    minicbor::decode(bytes).map_err(|e| StorageError::Decode(e.to_string()))
}

/// All collections backed by one database instance.
#[derive(Clone)]
pub struct Store {
    instance: Arc<sled::Db>,
    heroes: Collection<Hero>,
    pets: Collection<Pet>,
    admins: Collection<Admin>,
}

impl Store {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StorageError> {
        Ok(Self {
            heroes: Collection::open(&instance)?,
            pets: Collection::open(&instance)?,
            admins: Collection::open(&instance)?,
            instance,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::new(Arc::new(sled::open(path)?))
    }

    pub fn heroes(&self) -> &Collection<Hero> {
        &self.heroes
    }

    pub fn pets(&self) -> &Collection<Pet> {
        &self.pets
    }

    pub fn admins(&self) -> &Collection<Admin> {
        &self.admins
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.instance.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::PetDraft;
    use crate::pet_state::PetState;
    use tempfile::tempdir;

    fn pet(name: &str, owner: &str) -> Pet {
        PetDraft::new()
            .set_name(name)
            .set_kind("Dog")
            .into_pet(owner.to_string())
            .unwrap()
    }

    #[test]
    fn save_get_and_remove() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = Store::open(temp_dir.path().join("store.db"))?;

        let krypto = pet("Krypto", "hero_1abc");
        store.pets().save(&krypto)?;

        let loaded = store.pets().get(&krypto.id)?.expect("pet should exist");
        assert_eq!(loaded, krypto);
        assert_eq!(loaded.state, PetState::Normal);

        assert!(store.pets().remove(&krypto.id)?);
        assert!(!store.pets().remove(&krypto.id)?);
        assert!(store.pets().get(&krypto.id)?.is_none());
        Ok(())
    }

    #[test]
    fn find_filters_records() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let store = Store::open(temp_dir.path().join("find.db"))?;

        store.pets().save(&pet("Krypto", "hero_1abc"))?;
        store.pets().save(&pet("Streaky", "hero_1abc"))?;
        store.pets().save(&pet("Ace", "hero_1def"))?;

        let owned = store
            .pets()
            .find(|p| p.owner_id.as_deref() == Some("hero_1abc"))?;
        assert_eq!(owned.len(), 2);
        assert_eq!(store.pets().all()?.len(), 3);
        assert!(store.heroes().all()?.is_empty());
        Ok(())
    }
}
