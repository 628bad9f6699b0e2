use std::fmt;
use std::ops::RangeInclusive;

use base64::Engine as _;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Watering intervals the add-plant form accepts, in days.
pub const WATERING_FREQUENCY_DAYS: RangeInclusive<u32> = 1..=30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(Uuid);

impl PlantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Opaque image bytes as handed over by the photo picker or camera.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageBlob(Vec<u8>);

impl ImageBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageBlob({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for ImageBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for ImageBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.0);
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for ImageBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<ImageBlob>,
    pub watering_frequency_days: u32,
    pub last_watered: NaiveDate,
}

impl Plant {
    /// The day the plant is due again. Saturates at the end of chrono's calendar.
    pub fn next_watering(&self) -> NaiveDate {
        self.last_watered
            .checked_add_days(Days::new(u64::from(self.watering_frequency_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn cover_image(&self) -> Option<&ImageBlob> {
        self.images.first()
    }
}

/// Input collected by the add-plant form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlant {
    pub name: String,
    pub description: String,
    pub image: Option<ImageBlob>,
    pub watering_frequency_days: u32,
}

impl NewPlant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image: None,
            watering_frequency_days: *WATERING_FREQUENCY_DAYS.start(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: ImageBlob) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_frequency(mut self, days: u32) -> Self {
        self.watering_frequency_days = days;
        self
    }

    pub fn validate(&self) -> Result<(), PlantError> {
        if self.name.trim().is_empty() {
            return Err(PlantError::EmptyName);
        }
        if !WATERING_FREQUENCY_DAYS.contains(&self.watering_frequency_days) {
            return Err(PlantError::FrequencyOutOfRange(self.watering_frequency_days));
        }
        Ok(())
    }

    /// Validates the form and turns it into a plant watered on `watered_on`.
    pub fn into_plant(self, watered_on: NaiveDate) -> Result<Plant, PlantError> {
        self.validate()?;
        Ok(Plant {
            id: PlantId::new(),
            name: self.name,
            description: self.description,
            images: self.image.into_iter().collect(),
            watering_frequency_days: self.watering_frequency_days,
            last_watered: watered_on,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlantError {
    #[error("plant name must not be empty")]
    EmptyName,
    #[error("watering frequency of {0} days is outside 1..=30")]
    FrequencyOutOfRange(u32),
    #[error("no plant with id {0}")]
    UnknownPlant(PlantId),
}
