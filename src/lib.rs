pub mod auth;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod update;
