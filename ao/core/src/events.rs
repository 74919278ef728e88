//! Event types and signal definitions.
//!
//! A signal is an unsigned integer. The first two values are reserved for the
//! lifecycle events the state machine synthesizes around transitions; user
//! signals start at [`SignalValue::USER`].

use core::fmt;
use core::hash::Hash;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod sealed {
    pub trait Sealed {}
}

/// Integral type usable as an event signal.
///
/// Only unsigned integers implement this trait, so a signed signal type is
/// rejected at compile time.
pub trait SignalValue:
    sealed::Sealed + Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Reserved signal for state entry actions
    const ENTER: Self;
    /// Reserved signal for state exit actions
    const EXIT: Self;
    /// First user-defined signal
    const USER: Self;

    /// Check if this is one of the reserved lifecycle signals
    fn is_reserved(self) -> bool {
        self < Self::USER
    }
}

macro_rules! impl_signal_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl SignalValue for $ty {
                const ENTER: Self = 0;
                const EXIT: Self = 1;
                const USER: Self = 2;
            }
        )*
    };
}

impl_signal_value!(u8, u16, u32, u64, usize);

/// Reserved signal values for the default `u32` signal type.
pub mod signals {
    /// State entry
    pub const ENTER: u32 = 0;
    /// State exit
    pub const EXIT: u32 = 1;
    /// First user-defined signal
    pub const USER: u32 = 2;
}

/// Base trait for all events processed by a state machine.
///
/// Events are plain values: they are cloned into the queue and handed to
/// state handlers by reference.
pub trait Event: Clone + Send + 'static {
    /// Signal type carried by this event
    type Signal: SignalValue;

    /// Get the signal identifier for this event
    fn signal(&self) -> Self::Signal;

    /// Build an event that carries only a signal.
    ///
    /// Used to synthesize the ENTER/EXIT events, so payload-carrying events
    /// must produce an empty payload here.
    fn from_signal(signal: Self::Signal) -> Self;

    /// Check if this is a reserved lifecycle event
    fn is_reserved(&self) -> bool {
        self.signal().is_reserved()
    }

    /// The synthetic ENTER event
    fn enter() -> Self {
        Self::from_signal(Self::Signal::ENTER)
    }

    /// The synthetic EXIT event
    fn exit() -> Self {
        Self::from_signal(Self::Signal::EXIT)
    }
}

/// Event that carries no data
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseEvent<S: SignalValue = u32> {
    signal: S,
}

impl<S: SignalValue> BaseEvent<S> {
    /// Create a new signal-only event
    pub const fn new(signal: S) -> Self {
        Self { signal }
    }

    /// Get the raw signal value
    pub fn signal(&self) -> S {
        self.signal
    }
}

impl<S: SignalValue> From<S> for BaseEvent<S> {
    fn from(signal: S) -> Self {
        Self::new(signal)
    }
}

impl<S: SignalValue> Event for BaseEvent<S> {
    type Signal = S;

    fn signal(&self) -> S {
        self.signal
    }

    fn from_signal(signal: S) -> Self {
        Self::new(signal)
    }
}

impl<S: SignalValue> fmt::Display for BaseEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG({})", self.signal)
    }
}

/// Event with an optional strongly typed payload.
///
/// Lifecycle events built through [`Event::from_signal`] have no payload.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEvent<T, S: SignalValue = u32> {
    signal: S,
    payload: Option<T>,
}

impl<T, S: SignalValue> DataEvent<T, S> {
    /// Create a new event with data
    pub const fn new(signal: S, payload: T) -> Self {
        Self {
            signal,
            payload: Some(payload),
        }
    }

    /// Create a new event without data
    pub const fn empty(signal: S) -> Self {
        Self {
            signal,
            payload: None,
        }
    }

    pub fn signal(&self) -> S {
        self.signal
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<T, S> Event for DataEvent<T, S>
where
    T: Clone + Send + 'static,
    S: SignalValue,
{
    type Signal = S;

    fn signal(&self) -> S {
        self.signal
    }

    fn from_signal(signal: S) -> Self {
        Self::empty(signal)
    }
}
