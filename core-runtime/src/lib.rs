//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the music server core:
//! - Logging and tracing infrastructure
//! - Server configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that every other crate depends
//! on. It establishes the logging conventions, the explicit configuration
//! struct handed to backend construction, and the broadcast channel through
//! which controllers announce state changes to idle clients.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
