//! Repository module - data access layer.

mod flood_settings_repository;

pub use flood_settings_repository::FloodSettingsRepository;
