//! Rendering of values as SQL literal text
//!
//! The default rules, in priority order:
//!
//! | Value | Literal |
//! |-------|---------|
//! | null | `null` |
//! | bool | `1` / `0` |
//! | bytes | `0x` + upper-case hex, two digits per byte |
//! | date/time | `'YYYY-MM-DD HH:MM:SS'` |
//! | guid | `'xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx'` |
//! | string / char | `'text'` |
//! | list | every element formatted, joined with `", "` |
//! | numbers | invariant text (`.` decimal separator, no grouping) |
//!
//! NaN and the infinities have no SQL literal form and render as `null`.
//!
//! Strings are quoted as-is. Escaping quotes inside text is the caller's job, so the
//! default formatter is not an injection-safe encoder.

use super::value::{SqlValue, DATETIME_FORMAT};

/// Converts a value into SQL literal text
pub trait SqlFormatter: Send + Sync {
    /// Render the value
    fn format(&self, value: &SqlValue) -> String;
}

/// Built-in formatter implementing the default literal rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

/// Process-wide default formatter instance
pub static DEFAULT_FORMATTER: DefaultFormatter = DefaultFormatter;

fn finite_or_null(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        "null".to_string()
    }
}

impl DefaultFormatter {
    fn format_scalar(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "null".to_string(),
            SqlValue::Bool(v) => u8::from(*v).to_string(),
            SqlValue::Bytes(b) => format!("0x{}", hex::encode_upper(b)),
            SqlValue::DateTime(v) => format!("'{}'", v.format(DATETIME_FORMAT)),
            SqlValue::Guid(v) => format!("'{}'", v.hyphenated()),
            SqlValue::String(s) => format!("'{}'", s),
            SqlValue::Char(c) => format!("'{}'", c),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Long(v) => v.to_string(),
            SqlValue::Float(v) => finite_or_null(f64::from(*v)),
            SqlValue::Double(v) => finite_or_null(*v),
            SqlValue::List(items) => items
                .iter()
                .map(|item| self.format_scalar(item))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl SqlFormatter for DefaultFormatter {
    fn format(&self, value: &SqlValue) -> String {
        self.format_scalar(value)
    }
}

impl<F> SqlFormatter for F
where
    F: Fn(&SqlValue) -> String + Send + Sync,
{
    fn format(&self, value: &SqlValue) -> String {
        self(value)
    }
}
