//! Error handling for the retrieval backend
//!
//! This module defines the error type used throughout the crate.

#![allow(missing_docs)]

mod conversions;
mod helpers;
mod types;

pub use types::{Result, TravelError};
