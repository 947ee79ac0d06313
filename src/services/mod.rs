pub mod detection_store;
pub mod location_service;
pub mod locations;
pub mod memory;
pub mod prompt;
pub mod selection;
pub mod zones;
