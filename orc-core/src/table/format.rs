use chrono::{DateTime, Datelike, Timelike, Utc};

/// Renders a timestamp against a template using the recognised tokens
/// `{YYYY} {MM} {DD} {hh} {mm} {ss} {mmm}`. Unrecognised braces pass
/// through unchanged.
pub fn render_timestamp(ts: &DateTime<Utc>, template: &str) -> String {
    template
        .replace("{YYYY}", &format!("{:04}", ts.year()))
        .replace("{MM}", &format!("{:02}", ts.month()))
        .replace("{DD}", &format!("{:02}", ts.day()))
        .replace("{hh}", &format!("{:02}", ts.hour()))
        .replace("{mm}", &format!("{:02}", ts.minute()))
        .replace("{ss}", &format!("{:02}", ts.second()))
        .replace("{mmm}", &format!("{:03}", ts.timestamp_subsec_millis()))
}

pub const DEFAULT_TIMESTAMP_TEMPLATE: &str = "{YYYY}-{MM}-{DD} {hh}:{mm}:{ss}.{mmm}";

/// Renders bytes as hex using the column's format hint, defaulting to
/// `{:02X}` (uppercase, zero-padded).
pub fn render_binary(bytes: &[u8], format_hint: Option<&str>) -> String {
    match format_hint {
        Some(hint) if hint.to_ascii_uppercase().contains("X") => {
            bytes.iter().map(|b| format!("{b:02X}")).collect()
        }
        Some(hint) if hint.contains('x') => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        _ => bytes.iter().map(|b| format!("{b:02X}")).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_timestamp_tokens() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            render_timestamp(&ts, "{YYYY}{MM}{DD}_{hh}{mm}{ss}"),
            "20240307_090501"
        );
    }

    #[test]
    fn renders_binary_as_uppercase_hex_by_default() {
        assert_eq!(render_binary(&[0xAB, 0x01], None), "AB01");
    }
}
