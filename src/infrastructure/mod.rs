pub mod alert;
pub mod config;
pub mod error;
pub mod kv_store;
