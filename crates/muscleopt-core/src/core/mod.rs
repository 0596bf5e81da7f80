//! # Core Module
//!
//! Foundation types shared by the engine and the workflows.
//!
//! ## Architecture
//!
//! - **Quantities** ([`quantity`]) - Name registries, wildcard patterns, tagged selections
//!   and the selection set that tracks which names are shown and which are selected
//! - **Events** ([`events`]) - Typed listener channels used instead of global broadcast
//! - **Models** ([`model`]) - The read-only model collaborator interface and a TOML manifest
//!   implementation of it
//! - **File I/O** ([`io`]) - The settings document read and written by the tool

pub mod events;
pub mod io;
pub mod model;
pub mod quantity;
