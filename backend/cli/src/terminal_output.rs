//! Terminal notes for interactive subcommands such as `check-config`.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Severity of a printed note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Info,
    Warn,
    Error,
    Success,
}

impl NoteKind {
    fn glyph(self) -> (&'static str, &'static str) {
        match self {
            NoteKind::Info => (CYAN, "ℹ"),
            NoteKind::Warn => (YELLOW, "⚠"),
            NoteKind::Error => (RED, "✗"),
            NoteKind::Success => (GREEN, "✓"),
        }
    }

    fn label(self) -> &'static str {
        match self {
            NoteKind::Info => "INFO",
            NoteKind::Warn => "WARN",
            NoteKind::Error => "ERROR",
            NoteKind::Success => "OK",
        }
    }
}

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Render a note line, with or without ANSI styling.
pub fn format_note(kind: NoteKind, msg: &str, color: bool) -> String {
    if color {
        let (style, glyph) = kind.glyph();
        format!("{style}{BOLD}{glyph}{RESET} {msg}")
    } else {
        format!("{}: {msg}", kind.label())
    }
}

/// Errors go to stderr, everything else to stdout.
pub fn note(kind: NoteKind, msg: &str) {
    let line = format_note(kind, msg, supports_color());
    match kind {
        NoteKind::Error => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

pub fn note_info(msg: &str) {
    note(NoteKind::Info, msg);
}

pub fn note_warn(msg: &str) {
    note(NoteKind::Warn, msg);
}

pub fn note_error(msg: &str) {
    note(NoteKind::Error, msg);
}

pub fn note_success(msg: &str) {
    note(NoteKind::Success, msg);
}
