pub mod cleaning;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod summary;
pub mod tables;
