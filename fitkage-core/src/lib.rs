pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod plans;
pub mod runtime;
pub mod session;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
