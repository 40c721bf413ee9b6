// 🪙 Display formatting - currency, dates, chart buckets
//
// Amounts are shown in rupees with Indian digit grouping (12,34,567)
// and at most two fraction digits, trailing zeros dropped.

use chrono::{DateTime, Datelike, TimeZone};

pub const CURRENCY_SYMBOL: &str = "₹";

/// Group an integer string the Indian way: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Amount without symbol, e.g. `1,23,456.5`
pub fn format_amount(amount: f64) -> String {
    let rounded = (amount.abs() * 100.0).round() / 100.0;
    let fixed = format!("{:.2}", rounded);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let frac = frac_part.trim_end_matches('0');

    let sign = if amount < 0.0 && rounded > 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, group_indian(int_part))
    } else {
        format!("{}{}.{}", sign, group_indian(int_part), frac)
    }
}

/// Amount with the rupee symbol; negatives render as `-₹500`
pub fn format_currency(amount: f64) -> String {
    let body = format_amount(amount);
    match body.strip_prefix('-') {
        Some(positive) => format!("-{}{}", CURRENCY_SYMBOL, positive),
        None => format!("{}{}", CURRENCY_SYMBOL, body),
    }
}

/// `18 Oct 2026`
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%-d %b %Y").to_string()
}

/// Short month name, e.g. `Oct`
pub fn month_name<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%b").to_string()
}

/// Bucket the day of month into four weekly bars
pub fn week_label<Tz: TimeZone>(date: &DateTime<Tz>) -> &'static str {
    match date.day() {
        1..=7 => "Week 1",
        8..=14 => "Week 2",
        15..=21 => "Week 3",
        _ => "Week 4",
    }
}
