//! Logging sink used by the pipeline.
//!
//! The core only reports at phase boundaries; presentation (colors,
//! spinner) lives in the CLI, which implements this trait. A failing or
//! absent sink must never block the pipeline, so every method is
//! infallible and takes `&self`.

/// Receiver for pipeline progress output.
pub trait Reporter: Send + Sync {
    /// A normal status line.
    fn log(&self, context: &str, text: &str);

    /// A line only shown in verbose mode.
    fn verbose(&self, context: &str, text: &str);

    /// A completed-step line.
    fn done(&self, context: &str, text: &str);

    /// A recoverable error line.
    fn error(&self, context: &str, text: &str);

    /// Start (or retext) the ongoing spinner.
    fn start_loading(&self, text: &str);
}

/// Reporter that swallows everything. Used in tests and as a default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn log(&self, _context: &str, _text: &str) {}
    fn verbose(&self, _context: &str, _text: &str) {}
    fn done(&self, _context: &str, _text: &str) {}
    fn error(&self, _context: &str, _text: &str) {}
    fn start_loading(&self, _text: &str) {}
}
