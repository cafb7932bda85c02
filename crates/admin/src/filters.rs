//! Askama filters for back-office templates.

use std::fmt::Display;

/// Current year for the layout footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Placeholder for empty table cells.
///
/// Usage in templates: `{{ order.phone|or_dash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn or_dash(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(blank_to_dash(&value.to_string()))
}

fn blank_to_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_to_dash() {
        assert_eq!(blank_to_dash("  "), "-");
        assert_eq!(blank_to_dash("Jaipur"), "Jaipur");
    }
}
