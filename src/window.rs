//! Parsing and rendering of voting windows.
//!
//! Windows arrive as human-written strings like "30s", "1h 30m" or
//! "2 hours" and are rendered back in verbose form for ballot footers.

use std::time::Duration;

const SECS_PER_MINUTE: f64 = 60.0;
const SECS_PER_HOUR: f64 = 3_600.0;
const SECS_PER_DAY: f64 = 86_400.0;

/// Parse a human-written window into a duration.
///
/// Accepts one or more `<number><unit>` segments, whitespace optional
/// ("90s", "1h 30m", "1h30m", "1.5 hours"). Bare numbers are rejected:
/// a unitless "30" is too easy to misread as minutes or milliseconds.
/// Zero-length windows are rejected as well.
pub fn parse(input: &str) -> Option<Duration> {
    let mut chars = input.chars().peekable();
    let mut total_secs = 0.0_f64;
    let mut segments = 0;

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut number = String::new();
        while chars.peek().is_some_and(|c| c.is_ascii_digit() || *c == '.') {
            number.push(chars.next()?);
        }
        if number.is_empty() {
            return None;
        }
        let value: f64 = number.parse().ok()?;

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut unit = String::new();
        while chars.peek().is_some_and(|c| c.is_alphabetic()) {
            unit.push(chars.next()?);
        }
        let factor = match unit.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            "m" | "min" | "mins" | "minute" | "minutes" => SECS_PER_MINUTE,
            "h" | "hr" | "hrs" | "hour" | "hours" => SECS_PER_HOUR,
            "d" | "day" | "days" => SECS_PER_DAY,
            _ => return None,
        };

        total_secs += value * factor;
        segments += 1;
    }

    if segments == 0 || total_secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(total_secs).ok()
}

/// Render a window verbosely for display, e.g. "1 hour 30 minutes".
pub fn humanize(window: Duration) -> String {
    let total = window.as_secs();
    if total == 0 {
        return "less than a second".to_string();
    }

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    push_part(&mut parts, days, "day");
    push_part(&mut parts, hours, "hour");
    push_part(&mut parts, minutes, "minute");
    push_part(&mut parts, seconds, "second");
    parts.join(" ")
}

fn push_part(parts: &mut Vec<String>, amount: u64, unit: &str) {
    match amount {
        0 => {}
        1 => parts.push(format!("1 {}", unit)),
        n => parts.push(format!("{} {}s", n, unit)),
    }
}
