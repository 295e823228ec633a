pub mod capability;
pub mod cli;
pub mod config;
pub mod core;
pub mod detect;
pub mod engine;
pub mod exit;
pub mod platform;
pub mod probe;
pub mod ui;
