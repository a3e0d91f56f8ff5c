#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for waypath.
//!
//! This crate provides pure helper functions with no logging/tracing dependencies
//! and no filesystem access. Paths are handled as strings so that both `/` and
//! `\` separated paths behave the same on every host.

pub mod path;
