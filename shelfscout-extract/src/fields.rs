//! Turning raw strategy values into field values.

use regex::Regex;
use std::sync::LazyLock;

static RATING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("rating pattern compiles"));

/// Trimmed, non-empty text.
pub(crate) fn title(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// First decimal or integer number in `raw`, e.g. `"4.5 out of 5 stars"` -> `4.5`.
///
/// Returns `None` when no number is present. The value is not clamped.
pub(crate) fn rating(raw: &str) -> Option<Result<f64, String>> {
    let token = RATING_NUMBER.find(raw)?.as_str();
    Some(match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(token.to_string()),
    })
}

/// Image source that is neither empty nor an inline `data:` placeholder.
pub(crate) fn image_url(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || is_inline_data(t) {
        return None;
    }
    Some(t.to_string())
}

fn is_inline_data(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Every digit in `raw`, in order. `"1,234 reviews"` -> `"1234"`.
pub(crate) fn review_digits(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Parse collected digits; anything unparseable (overflow) counts as zero.
pub(crate) fn review_count(digits: Option<&str>) -> u64 {
    digits.and_then(|d| d.parse().ok()).unwrap_or(0)
}
