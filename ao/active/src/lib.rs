#![forbid(unsafe_code)]

//! # AO Active
//!
//! Active objects built on the flat state machine engine. Provides:
//! - a bounded, thread-safe event queue with urgent posting
//! - a per-object context handed to state handlers for self-posting
//! - lifecycle management in a background thread or manual stepping mode

pub mod active;
pub mod config;
pub mod context;
pub mod queue;

pub use active::{ActiveObject, ActiveState};
pub use config::{ActiveConfig, ActiveConfigBuilder, ExecutionMode, ThreadPriority};
pub use context::ActiveContext;
pub use queue::{EventQueue, EventSink};

pub use ao_core::{AoError, AoResult, BaseEvent, DataEvent, Event, SignalValue};
pub use ao_fsm::{handled, transition_to, FlatStateMachine, StateHandlers, StateRtn};
