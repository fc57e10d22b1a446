//! Line-based terminal output for the CLI.
//!
//! The answer goes to stdout so it can be piped; reasoning, progress and
//! status lines go to stderr.

use std::io::{self, Write};

use crate::models::{ImageStyles, ModelCatalog, TaskKind, TaskProgress};
use crate::sse::StreamRecord;
use crate::stream::{PhaseTransition, RecordHandler, StreamPhase, StreamState};

/// Line width for separators.
const LINE_WIDTH: usize = 60;

/// Prints streamed records as they arrive.
///
/// ```text
/// ── thinking ──────────────────────────────────────────────
/// The user asks about ...
/// ── answer ────────────────────────────────────────────────
/// ```
pub struct ConsolePrinter<O: Write, E: Write> {
    out: O,
    err: E,
    show_thinking: bool,
    printed_thinking: bool,
}

impl ConsolePrinter<io::Stdout, io::Stderr> {
    pub fn stdio(show_thinking: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), show_thinking)
    }
}

impl<O: Write, E: Write> ConsolePrinter<O, E> {
    pub fn new(out: O, err: E, show_thinking: bool) -> Self {
        Self {
            out,
            err,
            show_thinking,
            printed_thinking: false,
        }
    }

    /// Consume the printer, returning its writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }

    fn write_err(&mut self, text: &str) {
        if let Err(e) = self.err.write_all(text.as_bytes()).and_then(|_| self.err.flush()) {
            tracing::debug!(error = %e, "stderr write failed");
        }
    }
}

impl<O: Write, E: Write> RecordHandler for ConsolePrinter<O, E> {
    fn on_record(&mut self, record: &StreamRecord, _state: &StreamState) {
        match record {
            StreamRecord::Thinking { content } | StreamRecord::ThinkingEnd { content }
                if self.show_thinking =>
            {
                if !self.printed_thinking {
                    self.printed_thinking = true;
                    self.write_err(&separator("thinking"));
                }
                self.write_err(content);
            }
            StreamRecord::Content { content } => self.write_out(content),
            _ => {}
        }
    }

    fn on_phase(&mut self, transition: PhaseTransition) {
        if transition.to == StreamPhase::Answering && self.printed_thinking {
            self.write_err("\n");
            self.write_err(&separator("answer"));
        }
        if transition.to == StreamPhase::Done && transition.from == StreamPhase::Answering {
            self.write_out("\n");
        }
    }
}

fn separator(label: &str) -> String {
    let head = format!("── {} ", label);
    let fill = LINE_WIDTH.saturating_sub(head.chars().count());
    format!("{}{}\n", head, "─".repeat(fill))
}

/// One status line for a polled job.
///
/// ```text
/// [video] processing 60% rendering (2-5 minutes)
/// ```
pub fn progress_line(kind: TaskKind, progress: &TaskProgress) -> String {
    let status = serde_json::to_value(progress.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let mut line = format!("[{}] {}", kind, status);

    if let Some(detail) = &progress.progress {
        if let Some(pct) = detail.percentage {
            line.push_str(&format!(" {:.0}%", pct));
        }
        if let Some(stage) = detail.current_stage.as_ref().or(detail.message.as_ref()) {
            line.push(' ');
            line.push_str(stage);
        }
        if let Some(eta) = &detail.estimated_time {
            line.push_str(&format!(" ({})", eta));
        }
    }
    line
}

/// Print the model catalog, marking the default.
pub fn print_models(catalog: &ModelCatalog) {
    for (id, info) in &catalog.models {
        let marker = if catalog.default.as_deref() == Some(id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:<14} {}", marker, id, info.name);
        if !info.description.is_empty() {
            println!("  {:<14} {}", "", info.description);
        }
    }
}

/// Print image styles and sizes.
pub fn print_styles(styles: &ImageStyles) {
    println!("Styles");
    println!("{}", "─".repeat(LINE_WIDTH));
    for style in &styles.styles {
        let label = styles.style_names.get(style).map(String::as_str).unwrap_or("");
        println!("  {:<16} {}", style, label);
    }
    println!();
    println!("Sizes");
    println!("{}", "─".repeat(LINE_WIDTH));
    for size in &styles.sizes {
        let label = styles.size_names.get(size).map(String::as_str).unwrap_or("");
        println!("  {:<16} {}", size, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProgressInfo, TaskStatus};

    fn feed(printer: &mut ConsolePrinter<Vec<u8>, Vec<u8>>, records: &[StreamRecord]) {
        let mut state = StreamState::new();
        if let Some(t) = state.start() {
            printer.on_phase(t);
        }
        for record in records {
            if let Some(t) = state.apply(record) {
                printer.on_phase(t);
            }
            printer.on_record(record, &state);
        }
    }

    #[test]
    fn test_answer_goes_to_stdout_only() {
        let mut printer = ConsolePrinter::new(Vec::new(), Vec::new(), false);
        feed(
            &mut printer,
            &[
                StreamRecord::Thinking {
                    content: "hmm".to_string(),
                },
                StreamRecord::Content {
                    content: "Hi".to_string(),
                },
                StreamRecord::Done,
            ],
        );
        let (out, err) = printer.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "Hi\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_thinking_goes_to_stderr_when_enabled() {
        let mut printer = ConsolePrinter::new(Vec::new(), Vec::new(), true);
        feed(
            &mut printer,
            &[
                StreamRecord::Thinking {
                    content: "hmm".to_string(),
                },
                StreamRecord::Content {
                    content: "Hi".to_string(),
                },
            ],
        );
        let (out, err) = printer.into_inner();
        let err = String::from_utf8(err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hi");
        assert!(err.contains("── thinking"));
        assert!(err.contains("hmm"));
        assert!(err.contains("── answer"));
    }

    #[test]
    fn test_progress_line() {
        let progress = TaskProgress {
            success: true,
            status: TaskStatus::Processing,
            progress: Some(ProgressInfo {
                percentage: Some(60.0),
                current_stage: Some("rendering".to_string()),
                estimated_time: Some("2-5 minutes".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            progress_line(TaskKind::Video, &progress),
            "[video] processing 60% rendering (2-5 minutes)"
        );

        let bare = TaskProgress {
            status: TaskStatus::Pending,
            ..Default::default()
        };
        assert_eq!(progress_line(TaskKind::Image, &bare), "[image] pending");
    }

    #[test]
    fn test_separator_width() {
        assert_eq!(separator("answer").trim_end().chars().count(), LINE_WIDTH);
    }
}
