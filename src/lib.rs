pub mod batch;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prompts;
pub mod report;
pub mod runner;
