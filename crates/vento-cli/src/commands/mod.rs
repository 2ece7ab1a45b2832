pub mod compute;
pub mod config;
