//! A small REST API over a SQLite database of Hungarian postal codes,
//! the cities they belong to and the counties those cities are in.

pub mod cli;
/// Configuration handling for the server
pub mod config;
pub mod db;
pub mod error;
/// CSV bulk import
pub mod loader;
pub mod logging;
pub mod models;
pub mod servers;
pub mod store;
#[cfg(test)]
mod tests;
pub mod validation;
/// The HTTP API
pub mod web;
