#![no_std]
extern crate alloc;

pub mod error;
pub mod field;
pub mod graph;
pub mod ops;
pub mod runner;
pub mod types;

// Re-export public API
pub use error::CircuitError;
pub use field::WitnessField;
pub use graph::{CircuitGraph, ComponentTemplate, GraphBuilder, SubcomponentSpec, TemplateBody};
pub use runner::{CircuitRunner, ComponentScope, InputAssignment, Witness};
pub use types::{ConstId, InstanceId, TemplateId};
