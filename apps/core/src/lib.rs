pub mod config;
pub mod contract;
pub mod core_service;
pub mod history_store;
pub mod hotkey;
pub mod logging;
pub mod model;
pub mod overlay_state;
pub mod reconcile;
pub mod runtime;
pub mod search;
pub mod selection;
pub mod settings;
pub mod snapshot_store;
pub mod tab_store;
pub mod transport;
