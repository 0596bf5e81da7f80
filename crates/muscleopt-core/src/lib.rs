//! # muscleopt Core Library
//!
//! Configuration and execution engine for scaling the muscle-tendon parameters of a
//! musculoskeletal model against a reference model.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the interactive pieces
//! (filters, selections, settings) can be driven and tested without the optimizer itself.
//!
//! - **[`core`]: The Foundation.** Self-contained data models: name registries, wildcard
//!   pattern compilation, selection sets with independent visibility and selection flags,
//!   typed event channels, the model collaborator interface and the settings document.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer. It holds the tool configuration
//!   with its modified flag, the filter controller that drives visibility, and the
//!   single-flight execution controller that runs the external optimizer and publishes
//!   its result.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into an editing
//!   session: one configuration, one filter per quantity kind and one execution controller.

pub mod core;
pub mod engine;
pub mod workflows;
