//! Infrastructure layer: document store, payment gateway, configuration.

pub mod config;
pub mod db;
pub mod external;
