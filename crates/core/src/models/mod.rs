pub mod alert;
pub mod asset;
pub mod coin;
pub mod history;
pub mod portfolio;
pub mod preferences;
pub mod settings;
pub mod stats;
