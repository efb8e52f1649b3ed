//! Streamforged - RIFF and Ogg container inspection
//!
//! This library crate exposes the CLI's configuration and output helpers for
//! integration testing.

pub mod config;
pub mod output;
