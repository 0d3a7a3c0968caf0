use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?(?:</think>|$)").expect("think pattern is valid"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(subject|url)\}").expect("placeholder pattern is valid"));

/// Remove `<think>...</think>` reasoning blocks from a model response
///
/// An unterminated block swallows the rest of the text.
pub fn strip_reasoning(text: &str) -> Cow<'_, str> {
    THINK_BLOCK.replace_all(text, "")
}

/// Fill the `{subject}` and `{url}` placeholders of an instruction template
///
/// Both are substituted in one pass, so placeholder text inside the
/// substituted values is left alone.
pub fn render_instruction(template: &str, subject: &str, url: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "subject" => subject,
            _ => url,
        })
        .into_owned()
}

/// Shorten text for log lines without splitting a character
pub fn truncate_for_log(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &text[..idx])),
        None => Cow::Borrowed(text),
    }
}
