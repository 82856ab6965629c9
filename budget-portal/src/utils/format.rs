use chrono::DateTime;

/// Shorten an RFC 3339 timestamp for table cells; anything unparseable is
/// shown as-is.
pub fn short_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::short_date;

    #[test]
    fn formats_rfc3339_and_passes_through_garbage() {
        assert_eq!(short_date("2026-08-01T09:30:00Z"), "2026-08-01 09:30");
        assert_eq!(short_date("yesterday"), "yesterday");
        assert_eq!(short_date(""), "");
    }
}
