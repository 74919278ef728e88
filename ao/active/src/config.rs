//! Active object configuration.

use core::fmt;

/// Requested scheduling priority of an active object's thread.
///
/// Recorded for diagnostics only; it is not mapped to an OS priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ThreadPriority {
    Idle,
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
    TimeCritical,
}

impl fmt::Display for ThreadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadPriority::Idle => write!(f, "Idle"),
            ThreadPriority::Lowest => write!(f, "Lowest"),
            ThreadPriority::Low => write!(f, "Low"),
            ThreadPriority::Normal => write!(f, "Normal"),
            ThreadPriority::High => write!(f, "High"),
            ThreadPriority::Highest => write!(f, "Highest"),
            ThreadPriority::TimeCritical => write!(f, "TimeCritical"),
        }
    }
}

/// How an active object executes its event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Dedicated thread; dequeuing blocks until an event arrives
    #[default]
    Background,
    /// No thread; the caller steps the object one event at a time
    Manual,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Background => write!(f, "Background"),
            ExecutionMode::Manual => write!(f, "Manual"),
        }
    }
}

/// Configuration for an active object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    /// Name of the active object, also used as the thread name
    pub name: String,
    pub priority: ThreadPriority,
    /// Stack size in bytes for the background thread, platform default if `None`
    pub stack_size: Option<usize>,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            name: "active-object".to_string(),
            priority: ThreadPriority::Normal,
            stack_size: None,
        }
    }
}

impl ActiveConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ActiveConfigBuilder {
        ActiveConfigBuilder::default()
    }
}

/// Builder for ergonomic active object configuration construction.
#[derive(Debug, Clone, Default)]
pub struct ActiveConfigBuilder {
    config: ActiveConfig,
}

impl ActiveConfigBuilder {
    /// Sets the active object name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the thread priority.
    pub fn priority(mut self, priority: ThreadPriority) -> Self {
        self.config.priority = priority;
        self
    }

    /// Sets the stack size for the background thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ActiveConfig {
        self.config
    }
}
