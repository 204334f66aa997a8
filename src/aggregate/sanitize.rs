//! Readability cleanup for resource descriptions.

use regex::Regex;
use std::sync::LazyLock;

/// Everything outside letters, digits, basic punctuation, space and newline.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9,.:;?!()%/\- \n]").expect("Invalid regex"));

/// Punctuation glued to the following word.
static GLUED_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,:;?!()\-])(\w)").expect("Invalid regex"));

/// Clean a short description for display.
///
/// Strips disallowed characters, then puts a single space between punctuation
/// and a word character that directly follows it. Other spacing is left alone.
pub fn sanitize_description(text: &str) -> String {
    let stripped = DISALLOWED.replace_all(text, "");
    GLUED_PUNCTUATION
        .replace_all(&stripped, "$1 $2")
        .into_owned()
}
