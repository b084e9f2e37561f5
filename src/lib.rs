//! # Docshelf Core Library
//!
//! This crate provides the core functionality for the `docshelf` documentation server.
//!
//! It is designed to be used by the `docshelf` command-line application and by HTTP
//! front ends, which treat the [`registry::Registry`] as a frozen snapshot of all
//! loaded documentation bundles.
//!
//! ## Key Modules
//!
//! - [`bundle`]: Archive access for individual documentation bundles.
//! - [`descriptor`]: Parsers for the plugin, table-of-contents and keyword-index descriptors.
//! - [`loader`]: Discovers and loads every bundle in a collection directory at startup.
//! - [`search`]: Builds and queries the full-text index over all bundle pages.
//! - [`registry`]: The immutable post-startup aggregate of everything above.
//! - [`resolver`]: Maps incoming logical paths to redirects, archive entries or not-found.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod html;
pub mod loader;
pub mod redirect;
pub mod registry;
pub mod resolver;
pub mod search;

pub use error::DocshelfError;
