//! Attribute names, parsing and schema validation.

use crate::error::{ModelError, ModelResult};
use std::collections::BTreeMap;

/// Key-value formats carried by a node
pub type Attributes = BTreeMap<String, String>;

/// Row-group id, shared by every cell created by one row insert
pub const ROW: &str = "data-row";
/// Content id, shared by every block of one cell
pub const CELL: &str = "data-cell";
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const COLSPAN: &str = "colspan";
pub const ROWSPAN: &str = "rowspan";
pub const STYLE: &str = "style";
pub const BORDER: &str = "border";
pub const CELL_SPACING: &str = "cellspacing";
pub const HEADER: &str = "header";
pub const LIST: &str = "list";

/// Embed key used for column lines
pub const TABLE_COL: &str = "table-col";

pub const LIST_KINDS: &[&str] = &["ordered", "bullet", "checked", "unchecked"];

/// Largest colspan (and `<col span>`) honored, as in HTML
pub const MAX_COLSPAN: usize = 1000;
/// Largest rowspan honored, as in HTML
pub const MAX_ROWSPAN: usize = 65534;

fn span_limit(key: &str) -> usize {
    if key == ROWSPAN {
        MAX_ROWSPAN
    } else {
        MAX_COLSPAN
    }
}

/// Read a span attribute, defaulting to 1 for missing or malformed values
/// and clamping to the HTML limit of its key
pub fn span(attributes: &Attributes, key: &str) -> usize {
    attributes
        .get(key)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .map_or(1, |n| n.min(span_limit(key)))
}

/// Parse a length such as `120`, `120.5` or `120px`
pub fn parse_length(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
}

pub fn format_length(value: f32) -> String {
    format!("{}", value)
}

/// Attributes built from string pairs
pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Validate a single value against the rules of its key
pub fn validate_value(key: &str, value: &str) -> ModelResult<()> {
    let valid = match key {
        COLSPAN | ROWSPAN => value
            .trim()
            .parse::<usize>()
            .map_or(false, |n| (1..=span_limit(key)).contains(&n)),
        WIDTH | HEIGHT | BORDER | CELL_SPACING => parse_length(value).is_some(),
        HEADER => value.trim().parse::<u8>().map_or(false, |n| (1..=6).contains(&n)),
        LIST => LIST_KINDS.contains(&value),
        ROW | CELL => !value.is_empty() && !value.chars().any(char::is_whitespace),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(ModelError::invalid_attribute(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_defaults() {
        let attrs = from_pairs([(COLSPAN, "3"), (ROWSPAN, "zero")]);
        assert_eq!(span(&attrs, COLSPAN), 3);
        assert_eq!(span(&attrs, ROWSPAN), 1);
        assert_eq!(span(&Attributes::new(), COLSPAN), 1);
    }

    #[test]
    fn test_span_limits() {
        let attrs = from_pairs([
            (COLSPAN, "18446744073709551615"),
            (ROWSPAN, "70000"),
            ("span", "5000"),
        ]);
        assert_eq!(span(&attrs, COLSPAN), MAX_COLSPAN);
        assert_eq!(span(&attrs, ROWSPAN), MAX_ROWSPAN);
        assert_eq!(span(&attrs, "span"), MAX_COLSPAN);

        assert!(validate_value(COLSPAN, "1000").is_ok());
        assert!(validate_value(COLSPAN, "1001").is_err());
        assert!(validate_value(ROWSPAN, "65534").is_ok());
        assert!(validate_value(ROWSPAN, "65535").is_err());
        assert!(validate_value(COLSPAN, "18446744073709551615").is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("120"), Some(120.0));
        assert_eq!(parse_length(" 80px "), Some(80.0));
        assert_eq!(parse_length("-4"), None);
        assert_eq!(parse_length("wide"), None);
        assert_eq!(format_length(100.0), "100");
        assert_eq!(format_length(12.5), "12.5");
    }

    #[test]
    fn test_validate_values() {
        assert!(validate_value(COLSPAN, "2").is_ok());
        assert!(validate_value(ROWSPAN, "0").is_err());
        assert!(validate_value(HEADER, "7").is_err());
        assert!(validate_value(LIST, "bullet").is_ok());
        assert!(validate_value(ROW, "row 1").is_err());
        assert!(validate_value(STYLE, "color: red").is_ok());
    }
}
