//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Spotify core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend on.
//! It establishes the async runtime patterns, logging conventions, and event
//! broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, DEFAULT_SCOPES};
pub use error::{Error, Result};
pub use events::{
    AuthEvent, CoreEvent, EventBus, EventKind, EventStream, ListenerId, PlayerEvent,
    DEFAULT_EVENT_BUFFER_SIZE,
};
