pub mod developer;
pub mod sales;
pub mod script_manager;
pub mod service;
