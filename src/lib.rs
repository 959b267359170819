// Library exports for integration tests and binaries
pub mod cli;
pub mod config;
pub mod link;
pub mod tweet;
pub mod twitter;
