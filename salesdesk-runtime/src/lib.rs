pub mod auth;
pub mod call_setup;
pub mod config_store;
pub mod defaults;
pub mod fs;
pub mod kv;
pub mod script_store;
