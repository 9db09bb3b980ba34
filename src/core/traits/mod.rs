//! Core traits module
//!
//! Contains the abstract interfaces of every external collaborator

pub mod cache;
pub mod provider;
pub mod vector;

pub use cache::*;
pub use provider::*;
pub use vector::*;
