//! Logger trait definition

/// Logger abstraction shared by the agent, the tool gateway and the
/// remote tool clients
///
/// Implementations:
/// - `NoOpLogger`: silent logger for tests and embedding
/// - `ConsoleLogger`: writes to stderr so stdout stays free for the UI
/// - `MemoryLogger`: keeps lines in memory for assertions
/// - `DebugFileLogger`: forwards to the debug log file
pub trait Logger: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}
