//! Logging: injectable loggers plus a process-wide debug file

mod traits;
mod noop;
mod console;
pub mod file_logger;

pub use traits::Logger;
pub use noop::{MemoryLogger, NoOpLogger};
pub use console::ConsoleLogger;
pub use file_logger::{
    log, trace, debug, info, warn, error,
    log_file_path, LogLevel, DebugFileLogger,
};
