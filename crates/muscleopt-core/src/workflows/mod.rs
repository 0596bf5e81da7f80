//! # Workflows Module
//!
//! High-level entry points that assemble the engine pieces into something a front end
//! can drive directly.
//!
//! - **Optimization Session** ([`session`]) - One model, one configuration, a filter per
//!   quantity kind and the execution controller, with selections kept in sync with the
//!   configuration.

pub mod session;
