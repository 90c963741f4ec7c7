//! Text rendering of the ranking.
//!
//! Each entry becomes one line of the form
//! `<key>: <early> => <late> change-ratio:<ratio>`, and the whole ranking
//! is emitted as a single bracketed listing of quoted entries. Short
//! listings fit on one line (`[ 'a', 'b' ]`); longer ones put each entry on
//! its own indented line.

use crate::models::RankingEntry;
use std::io::Write;

/// Width a listing may take before it is broken over several lines.
const BREAK_LENGTH: usize = 80;

/// Entries printed before the rest are summarized as `... N more items`.
const MAX_LISTED_ENTRIES: usize = 100;

/// Render one ranking entry.
pub fn format_entry(entry: &RankingEntry) -> String {
    let ratio = match entry.summary.ratio {
        Some(ratio) => format_number(ratio),
        None => "null".to_string(),
    };

    format!(
        "{}: {} => {} change-ratio:{}",
        entry.key, entry.summary.count_early, entry.summary.count_late, ratio
    )
}

/// Render a float in shortest round-trip form.
///
/// Non-finite values print as `Infinity`, `-Infinity` and `NaN`. Magnitudes
/// below 1e-6 or from 1e21 upwards switch to exponent notation (`1e-7`,
/// `1.5e+21`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", value);
    }

    let exponent_form = format!("{:e}", value);
    match exponent_form.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponent_form,
    }
}

/// Format every entry of a ranking, in order.
pub fn format_ranking(ranking: &[RankingEntry]) -> Vec<String> {
    ranking.iter().map(format_entry).collect()
}

/// Render formatted lines as one bracketed listing.
pub fn render_listing(lines: &[String]) -> String {
    if lines.is_empty() {
        return "[]\n".to_string();
    }

    let mut items: Vec<String> = lines
        .iter()
        .take(MAX_LISTED_ENTRIES)
        .map(|line| quote_entry(line))
        .collect();

    if lines.len() > MAX_LISTED_ENTRIES {
        let remaining = lines.len() - MAX_LISTED_ENTRIES;
        let plural = if remaining > 1 { "s" } else { "" };
        items.push(format!("... {} more item{}", remaining, plural));
    }

    if fits_on_one_line(&items) {
        format!("[ {} ]\n", items.join(", "))
    } else {
        format!("[\n  {}\n]\n", items.join(",\n  "))
    }
}

/// Whether the items, with brackets and separators, stay within `BREAK_LENGTH`.
///
/// Widths are counted in UTF-16 code units.
fn fits_on_one_line(items: &[String]) -> bool {
    let mut total = 2 * items.len() + 11;
    if total + items.len() > BREAK_LENGTH {
        return false;
    }

    for item in items {
        total += item.encode_utf16().count();
        if total > BREAK_LENGTH {
            return false;
        }
    }

    true
}

/// Quote one entry.
///
/// Single quotes are preferred. An entry containing `'` is wrapped in `"`,
/// or in backticks if it also contains `"`; only when all three appear is
/// `'` escaped. Backslashes and control characters are always escaped.
fn quote_entry(text: &str) -> String {
    let quote = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else if !text.contains('`') && !text.contains("${") {
        '`'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(quote);
    for c in text.chars() {
        match c {
            '\'' if quote == '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0C}' => quoted.push_str("\\f"),
            c if c < '\u{20}' || ('\u{7F}'..='\u{9F}').contains(&c) => {
                quoted.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => quoted.push(c),
        }
    }
    quoted.push(quote);

    quoted
}

/// Write the listing to `out` in a single call.
pub fn write_listing<W: Write>(out: &mut W, lines: &[String]) -> std::io::Result<()> {
    let listing = render_listing(lines);
    out.write_all(listing.as_bytes())?;
    out.flush()
}
