use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::cli::OutputFormat;

static OUTPUT_JSON: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);

pub fn set_format(format: OutputFormat) {
    OUTPUT_JSON.store(matches!(format, OutputFormat::Json), Ordering::Relaxed);
}

pub fn is_json_output() -> bool {
    OUTPUT_JSON.load(Ordering::Relaxed)
}

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Whether rendered pages should carry ANSI styling.
pub fn use_color() -> bool {
    !is_json_output() && std::io::stdout().is_terminal()
}

/// Print rendered text, or the raw item as JSON in JSON mode
pub fn print_item<T: Serialize>(item: &T, display: impl FnOnce(&T) -> String) {
    if is_json_output() {
        println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
    } else {
        println!("{}", display(item));
    }
}

/// Print a message (skipped when quiet, or prints simple object in JSON mode)
pub fn print_message(message: &str) {
    if is_quiet() {
        return;
    }
    if is_json_output() {
        println!("{}", serde_json::json!({ "message": message }));
    } else {
        println!("{message}");
    }
}
