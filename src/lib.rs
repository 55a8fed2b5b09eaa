//! Library crate for lab-scan-api exposing reusable modules.
pub mod config;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod server;
pub mod types;
