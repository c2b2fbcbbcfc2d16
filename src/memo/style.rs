//! Fixed memo palette and the rating/severity color maps.

use crate::types::{FlagSeverity, IssueSeverity};

use super::document::Color;

pub const NAVY: Color = Color::rgb(0x1f, 0x3a, 0x5f);
pub const GREEN: Color = Color::rgb(0x1e, 0x7e, 0x34);
pub const GREEN_SOFT: Color = Color::rgb(0x5c, 0xb8, 0x5c);
pub const AMBER: Color = Color::rgb(0xb8, 0x86, 0x0b);
pub const ORANGE: Color = Color::rgb(0xd9, 0x6b, 0x0b);
pub const RED: Color = Color::rgb(0xc0, 0x2b, 0x2b);
pub const DARK_RED: Color = Color::rgb(0x7a, 0x12, 0x12);
pub const GRAY: Color = Color::rgb(0x5a, 0x5a, 0x5a);
pub const LIGHT_GRAY: Color = Color::rgb(0xee, 0xee, 0xee);
pub const PALE_RED: Color = Color::rgb(0xfb, 0xe4, 0xe4);
pub const PALE_AMBER: Color = Color::rgb(0xfd, 0xf3, 0xd8);
pub const PALE_GREEN: Color = Color::rgb(0xe4, 0xf3, 0xe4);
pub const PALE_BLUE: Color = Color::rgb(0xe6, 0xee, 0xf7);

/// Map an analyst rating string to its display color.
pub fn rating_color(rating: &str) -> Color {
    let rating = rating.to_lowercase();
    let has = |needle: &str| rating.contains(needle);

    if has("excellent") || has("strong") {
        GREEN
    } else if has("good") {
        GREEN_SOFT
    } else if has("adequate") || has("acceptable") || has("moderate") {
        AMBER
    } else if has("below") || has("marginal") || has("weak") {
        ORANGE
    } else if has("poor") || has("high risk") {
        RED
    } else if has("critical") || has("severe") {
        DARK_RED
    } else {
        GRAY
    }
}

/// Severity badge color for analyst risk flags.
pub fn flag_color(severity: FlagSeverity) -> Color {
    match severity {
        FlagSeverity::Critical => DARK_RED,
        FlagSeverity::High => RED,
        FlagSeverity::Medium => ORANGE,
        FlagSeverity::Low => AMBER,
        FlagSeverity::Info => GRAY,
    }
}

/// Tint behind a risk-flag box.
pub fn flag_fill(severity: FlagSeverity) -> Color {
    match severity {
        FlagSeverity::Critical | FlagSeverity::High => PALE_RED,
        FlagSeverity::Medium | FlagSeverity::Low => PALE_AMBER,
        FlagSeverity::Info => LIGHT_GRAY,
    }
}

/// Severity color for compliance issues rendered in the memo.
pub fn issue_color(severity: IssueSeverity) -> Color {
    match severity {
        IssueSeverity::Critical => DARK_RED,
        IssueSeverity::Warning => ORANGE,
        IssueSeverity::Info => GRAY,
    }
}

/// Color for a pass rate rendered as a fraction of one.
pub fn pass_rate_color(rate: rust_decimal::Decimal) -> Color {
    use rust_decimal_macros::dec;
    if rate >= dec!(0.9) {
        GREEN
    } else if rate >= dec!(0.7) {
        AMBER
    } else {
        RED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rating_color_keywords() {
        assert_eq!(rating_color("Strong"), GREEN);
        assert_eq!(rating_color("good"), GREEN_SOFT);
        assert_eq!(rating_color("Adequate coverage"), AMBER);
        assert_eq!(rating_color("marginal"), ORANGE);
        assert_eq!(rating_color("Poor"), RED);
        assert_eq!(rating_color("SEVERE"), DARK_RED);
        assert_eq!(rating_color("unscored"), GRAY);
    }

    #[test]
    fn test_high_risk_beats_substring_collisions() {
        // "high risk" must not read as "excellent"/"good" family
        assert_eq!(rating_color("high risk"), RED);
    }

    #[test]
    fn test_flag_severity_ordering_darkens() {
        assert_eq!(flag_color(FlagSeverity::Critical), DARK_RED);
        assert_eq!(flag_color(FlagSeverity::Info), GRAY);
    }
}
