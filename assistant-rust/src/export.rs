//! Conversions applied when a body leaves the assistant.
//!
//! Bodies always carry `<strong>` emphasis. Markdown and PDF exports convert
//! it here and nowhere else.

use crate::{OutputFormat, ProcessingMode};
use regex::Regex;
use std::sync::LazyLock;

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<strong>(.*?)</strong>").expect("strong pattern is valid"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern is valid"));

/// Convert `<strong>x</strong>` to `**x**` and `<br>` tags to newlines.
/// Text that is already `**x**` passes through untouched.
#[must_use]
pub fn to_markdown(body: &str) -> String {
    let bolded = STRONG.replace_all(body, "**$1**");
    LINE_BREAK.replace_all(&bolded, "\n").into_owned()
}

/// Markup for renderers that ignore raw newlines, such as the PDF export.
#[must_use]
pub fn to_line_break_markup(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "<br />")
}

/// File name for a Markdown download, e.g. `simplify_bullet_points.md`.
#[must_use]
pub fn markdown_file_name(mode: ProcessingMode, format: OutputFormat) -> String {
    format!("{mode}_{format}.md")
}
