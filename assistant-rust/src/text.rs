use regex::Regex;
use std::sync::LazyLock;

static LINE_ENDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n?").expect("line ending pattern is valid"));
static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[^\S\n]*\n){2,}").expect("blank line pattern is valid"));

/// Normalize a generated body: turn `\r\n` and lone `\r` into `\n`, trim
/// outer whitespace and collapse every run of three or more newlines (blank
/// lines may hold spaces or tabs) into a single blank line. Applying it twice
/// changes nothing.
#[must_use]
pub fn normalize_body(body: &str) -> String {
    let unified = LINE_ENDING.replace_all(body, "\n");
    BLANK_LINE_RUN
        .replace_all(unified.trim(), "\n\n")
        .into_owned()
}
