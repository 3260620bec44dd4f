// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON-lines output modes.

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

#[derive(Serialize)]
struct Event<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> Event<'a> {
    fn new(event: &'a str, message: &'a str) -> Self {
        Self {
            event,
            message,
            template: None,
            output: None,
            duration_secs: None,
        }
    }

    fn emit_stdout(self) {
        if let Ok(json) = serde_json::to_string(&self) {
            println!("{json}");
        }
    }

    fn emit_stderr(self) {
        if let Ok(json) = serde_json::to_string(&self) {
            eprintln!("{json}");
        }
    }
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing; success events report elapsed time once started.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// A progress line. Suppressed in quiet and json modes.
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Report one rendered artifact as `'template' => 'output'`.
    pub fn artifact(&self, template: &Path, output: &Path) {
        match self.mode {
            OutputMode::Normal => {
                println!("'{}' => '{}'", template.display(), output.display());
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let mut event = Event::new("artifact", "rendered");
                event.template = Some(template.display().to_string());
                event.output = Some(output.display().to_string());
                event.emit_stdout();
            }
        }
    }

    /// The final result line, with timing when a timer is running.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.elapsed() {
                Some(secs) if secs > 0.0 => println!("{message} ({secs:.1}s)"),
                _ => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => {
                let mut event = Event::new("success", message);
                event.duration_secs = self.elapsed();
                event.emit_stdout();
            }
        }
    }

    /// An error line, always on stderr.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                let mut event = Event::new("error", message);
                event.duration_secs = self.elapsed();
                event.emit_stderr();
            }
        }
    }
}
