// src/ui/sanitize.rs

use std::sync::LazyLock;

use regex::Regex;

static ANSI_CURSOR_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[ABCD]").expect("cursor regex is valid"));

/// Remove ANSI cursor-movement sequences (`ESC [ n A|B|C|D`), keeping colour
/// and other SGR codes.
pub fn sanitize_ansi(text: &str) -> String {
    ANSI_CURSOR_SEQUENCE.replace_all(text, "").into_owned()
}
