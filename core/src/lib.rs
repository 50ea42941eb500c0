pub mod client;
pub mod config;
pub mod photo;
pub mod security;
pub mod types;
pub mod utils;
