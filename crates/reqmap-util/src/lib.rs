#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for reqmap.
//!
//! Pure helpers with no logging dependencies; the core and CLI crates
//! own their tracing.

pub mod fs;
pub mod hash;
