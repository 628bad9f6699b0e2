pub mod calendar;
pub mod notifications;
pub mod plant;
pub mod service;
pub mod storage;
pub mod store;
pub mod watering;

pub use crate::service::{GardenError, GardenService, GardenServiceBuilder};
