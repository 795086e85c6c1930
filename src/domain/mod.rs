//! Domain types for Guardrail Core.
//!
//! This module contains the core business entities and value objects.

mod conflict;
mod context;
mod result;
mod rule;
mod violation;

pub use conflict::*;
pub use context::*;
pub use result::*;
pub use rule::*;
pub use violation::*;
