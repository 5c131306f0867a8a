//! Rendering helpers for money and dates shown in answers

use chrono::NaiveDate;

pub const CURRENCY_GLYPH: char = '₹';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Group digits in threes: `5000000` -> `5,000,000`
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// `5000000` -> `₹5,000,000`
pub fn format_inr(value: u64) -> String {
    format!("{}{}", CURRENCY_GLYPH, thousands(value))
}

/// Inverse of [`format_inr`]; also accepts the amount without the glyph.
pub fn parse_inr(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix(CURRENCY_GLYPH).unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }

    digits.replace(',', "").parse().ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(5_000_000), "5,000,000");
        assert_eq!(thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn test_currency_round_trip() {
        for value in [0_u64, 7, 2_500_000, 18_500_000, u64::MAX] {
            let rendered = format_inr(value);
            assert!(rendered.starts_with(CURRENCY_GLYPH));
            assert_eq!(parse_inr(&rendered), Some(value));
        }
    }

    #[test]
    fn test_parse_inr_rejects_garbage() {
        assert_eq!(parse_inr("₹"), None);
        assert_eq!(parse_inr("₹12a"), None);
        assert_eq!(parse_inr("1,000"), Some(1000));
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let rendered = format_date(date);
        assert_eq!(rendered, "2025-01-15");
        assert_eq!(parse_date(&rendered), Some(date));
    }
}
