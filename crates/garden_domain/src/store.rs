use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    plant::{ImageBlob, Plant, PlantError, PlantId},
    storage::{KeyValueStore, StorageError},
};

pub const PLANTS_KEY: &str = "plants";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode slot `{key}`: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to decode slot `{key}`: {source}")]
    Decode {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Plant(#[from] PlantError),
}

/// Reads a whole snapshot from `key`. A missing slot is `Ok(None)`.
pub fn load_slot<T, S>(storage: &S, key: &'static str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(bytes) = storage.load(key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Decode { key, source })
}

/// Replaces the snapshot in `key`. Nothing is written unless encoding succeeds.
pub fn save_slot<T, S>(storage: &S, key: &'static str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Encode { key, source })?;
    storage.save(key, &bytes)?;
    Ok(())
}

/// Ordered plant list persisted as one snapshot after every mutation.
///
/// Mutations always apply to the in-memory list. When the snapshot cannot be
/// written the previous one stays in storage and the error is returned.
#[derive(Debug)]
pub struct PlantStore<S> {
    storage: S,
    plants: Vec<Plant>,
}

impl<S: KeyValueStore> PlantStore<S> {
    /// Loads the list, treating an unreadable or undecodable slot as empty.
    pub fn open(storage: S) -> Self {
        let plants = match load_slot::<Vec<Plant>, _>(&storage, PLANTS_KEY) {
            Ok(plants) => plants.unwrap_or_default(),
            Err(err) => {
                warn!(%err, "discarding unreadable plant list");
                Vec::new()
            }
        };
        debug!(count = plants.len(), "plant store opened");
        Self { storage, plants }
    }

    pub fn try_open(storage: S) -> Result<Self, StoreError> {
        let plants = load_slot(&storage, PLANTS_KEY)?.unwrap_or_default();
        Ok(Self { storage, plants })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn get(&self, id: PlantId) -> Option<&Plant> {
        self.plants.iter().find(|plant| plant.id == id)
    }

    pub fn position(&self, id: PlantId) -> Option<usize> {
        self.plants.iter().position(|plant| plant.id == id)
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn append(&mut self, plant: Plant) -> Result<(), StoreError> {
        debug!(plant_id = %plant.id, name = %plant.name, "appending plant");
        self.plants.push(plant);
        self.persist()
    }

    pub fn update_images(&mut self, id: PlantId, image: ImageBlob) -> Result<(), StoreError> {
        let plant = self
            .plants
            .iter_mut()
            .find(|plant| plant.id == id)
            .ok_or(PlantError::UnknownPlant(id))?;
        plant.images.push(image);
        debug!(plant_id = %id, images = plant.images.len(), "appended image");
        self.persist()
    }

    /// Removes the plants at `indices`, ignoring duplicates and indices past
    /// the end. The remaining plants keep their relative order.
    pub fn remove_at(&mut self, indices: &[usize]) -> Result<usize, StoreError> {
        let mut doomed: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|idx| *idx < self.plants.len())
            .collect();
        doomed.sort_unstable();
        doomed.dedup();
        if doomed.is_empty() {
            return Ok(0);
        }
        for idx in doomed.iter().rev() {
            let removed = self.plants.remove(*idx);
            debug!(plant_id = %removed.id, "removed plant");
        }
        self.persist()?;
        Ok(doomed.len())
    }

    fn persist(&self) -> Result<(), StoreError> {
        save_slot(&self.storage, PLANTS_KEY, &self.plants).inspect_err(|err| {
            warn!(%err, "plant list not persisted; previous snapshot kept");
        })
    }
}
