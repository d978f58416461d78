//! Repository module - data access with caching on top of a `Store`.

mod history_repository;
mod settings_repository;

pub use history_repository::HistoryRepository;
pub use settings_repository::SettingsRepository;
