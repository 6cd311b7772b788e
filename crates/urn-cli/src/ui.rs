//! Uranio CLI UI primitives.
#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use urn_transpose::Reporter;

/// Terminal palette
pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(45);
    pub const MAGENTA: Color = Color::Color256(198);
    pub const GREEN: Color = Color::Color256(77);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const DOT: &str = "\u{00B7}"; // ·
}

/// Print the version header.
pub fn print_header(version: &str) {
    println!(
        "  {} {} {}",
        style(symbols::DIAMOND).fg(colors::CYAN),
        style("uranio").fg(colors::CYAN).bold(),
        style(version).dim()
    );
}

pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::TRIANGLE).fg(colors::GREEN), msg);
}

pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

pub fn info(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        msg
    );
}

pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

/// Create a styled spinner.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("\u{25C7}\u{25C6}\u{25C7}\u{25C6}") // ◇◆◇◆
            .template("  {spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// Console-backed [`Reporter`] for the transpose pipeline.
///
/// Phase-boundary lines print above the active spinner so long watch
/// sessions keep a readable scrollback.
pub struct ConsoleReporter {
    verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            spinner: Mutex::new(None),
        }
    }

    fn print(&self, line: String) {
        let guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }

    fn stop_spinner(&self) {
        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn log(&self, context: &str, text: &str) {
        self.print(format!(
            "  {} {} {}",
            style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
            style(format!("[{context}]")).fg(colors::DIM),
            text
        ));
    }

    fn verbose(&self, context: &str, text: &str) {
        if self.verbose {
            self.print(format!(
                "  {} {} {}",
                style(symbols::DOT).fg(colors::DIM),
                style(format!("[{context}]")).fg(colors::DIM),
                style(text).fg(colors::DIM)
            ));
        }
    }

    fn done(&self, context: &str, text: &str) {
        self.stop_spinner();
        self.print(format!(
            "  {} {} {}",
            style(symbols::TRIANGLE).fg(colors::GREEN),
            style(format!("[{context}]")).fg(colors::DIM),
            text
        ));
    }

    fn error(&self, context: &str, text: &str) {
        self.print(format!(
            "  {} {} {}",
            style(symbols::DIAMOND).fg(colors::MAGENTA),
            style(format!("[{context}]")).fg(colors::DIM),
            style(text).fg(colors::MAGENTA)
        ));
    }

    fn start_loading(&self, text: &str) {
        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(pb) => pb.set_message(text.to_string()),
            None => *guard = Some(spinner(text)),
        }
    }
}
