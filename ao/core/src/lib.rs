#![forbid(unsafe_code)]

//! # AO Core
//!
//! Core types shared by the active object crates: unsigned signal values with
//! the reserved lifecycle signals, the [`Event`] trait the state machine and
//! queue operate on, and the error type returned by every fallible framework
//! operation.

pub mod events;

pub use events::*;

/// AO core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the active object crates
pub type AoResult<T> = Result<T, AoError>;

/// Error types for active object operations.
///
/// Capacity and lifecycle problems are reported through this type. Broken
/// state machine definitions are not: those panic, since no caller can recover
/// from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AoError {
    /// Event queue has no free slot
    #[error("event queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
    /// Event queue was closed by `stop`
    #[error("event queue is closed")]
    QueueClosed,
    /// `start` called on an object that is already running
    #[error("active object is already started")]
    AlreadyStarted,
    /// `start` called after `stop`
    #[error("active object has been stopped")]
    Stopped,
    /// The background execution context could not be created
    #[error("failed to spawn execution context: {0:?}")]
    Spawn(std::io::ErrorKind),
}

impl AoError {
    /// True for errors a producer may retry once the consumer catches up.
    pub fn is_capacity(&self) -> bool {
        matches!(self, AoError::QueueFull { .. })
    }
}
