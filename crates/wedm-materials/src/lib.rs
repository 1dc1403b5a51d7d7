//! Wire electrode material properties.
//!
//! A small read-only catalog keyed by material name. The built-in table holds
//! brass; additional materials can be loaded from a JSON document of the form
//! `{ "<name>": { "density": .., "specific_heat": .., ... } }`.

pub mod catalog;
pub mod error;

pub use catalog::{MaterialDatabase, WireMaterial, BUILTIN_MATERIALS};
pub use error::{MaterialError, MaterialResult};
