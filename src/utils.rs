use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d.,]*").unwrap());

/// Parses a price out of text like `$1,299.99`, `1.234,56 €` or `EUR 85`.
///
/// Only the first number in the text is considered, so ranges resolve to their
/// lower bound. Returns `None` for anything that is not a positive amount.
pub fn parse_price(text: &str) -> Option<f64> {
    let raw = NUMBER.find(text)?.as_str().trim_end_matches(['.', ',']);

    let last_comma = raw.rfind(',');
    let last_period = raw.rfind('.');

    let normalized = match (last_comma, last_period) {
        (Some(c), None) => {
            if is_thousands_group(raw, c) {
                raw.replace(',', "")
            } else {
                raw.replace(',', ".")
            }
        }
        (None, Some(p)) => {
            if is_thousands_group(raw, p) {
                raw.replace('.', "")
            } else {
                raw.to_string()
            }
        }
        // The decimal separator is whichever comes last
        (Some(c), Some(p)) => {
            if c > p {
                raw.replace('.', "").replace(',', ".")
            } else {
                raw.replace(',', "")
            }
        }
        (None, None) => raw.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// `1,299` and `12.500`: exactly three digits follow the only kind of separator.
fn is_thousands_group(raw: &str, last_sep: usize) -> bool {
    let tail = &raw[last_sep + 1..];
    tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit())
}

pub fn detect_currency(text: &str) -> &'static str {
    let text = text.trim();
    if text.contains("CA$") || text.contains("C$") || text.contains("CAD") {
        "CAD"
    } else if text.contains('€') || text.contains("EUR") {
        "EUR"
    } else if text.contains('£') || text.contains("GBP") {
        "GBP"
    } else if text.contains('₹') || text.contains("INR") {
        "INR"
    } else {
        "USD"
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// All text below `element`, whitespace collapsed.
pub fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
