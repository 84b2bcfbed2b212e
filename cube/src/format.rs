//! FILENAME: cube/src/format.rs
//! PURPOSE: Default per-field value formatting.
//! CONTEXT: The extraction engine never formats values itself; it calls the
//! formatter a Field was built with. This module supplies the built-in
//! formatter derived from a column's format descriptor. Full pattern engines
//! are out of scope.

use crate::meta::{FormatKind, FormatMeta};
use crate::value::CubeValue;

/// Formatter derived from a column's format descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueFormatter {
    kind: FormatKind,
    decimals: Option<u8>,
}

impl ValueFormatter {
    pub fn from_meta(meta: Option<&FormatMeta>) -> Self {
        match meta {
            Some(m) => ValueFormatter {
                kind: m.kind,
                decimals: m.decimals,
            },
            None => ValueFormatter::default(),
        }
    }

    /// Renders a value as display text.
    pub fn format(&self, value: &CubeValue) -> String {
        match value {
            CubeValue::Number(n) => self.format_number(*n),
            other => other.display(),
        }
    }

    fn format_number(&self, value: f64) -> String {
        if value.is_nan() {
            return "-".to_string();
        }
        match self.kind {
            FormatKind::None => general(value),
            FormatKind::Number => {
                let decimals = self.decimals.unwrap_or(2);
                thousands(&format!("{:.prec$}", value, prec = decimals as usize))
            }
            FormatKind::Percent => {
                let decimals = self.decimals.unwrap_or(1);
                format!("{:.prec$}%", value * 100.0, prec = decimals as usize)
            }
        }
    }
}

/// General format: trimmed decimals, scientific notation at the extremes.
fn general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e10 || magnitude < 1e-4 {
        return format!("{:e}", value);
    }
    if value.fract() == 0.0 && magnitude < 1e15 {
        return format!("{:.0}", value);
    }
    format!("{:.10}", value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Inserts thousands separators into a plain numeric string.
fn thousands(s: &str) -> String {
    let (integer, fraction) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let negative = integer.starts_with('-');
    let digits: Vec<char> = integer.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    if let Some(f) = fraction {
        out.push('.');
        out.push_str(f);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_format_trims_trailing_zeros() {
        let f = ValueFormatter::default();
        assert_eq!(f.format(&CubeValue::Number(42.0)), "42");
        assert_eq!(f.format(&CubeValue::Number(0.25)), "0.25");
    }

    #[test]
    fn number_format_applies_decimals_and_separators() {
        let f = ValueFormatter::from_meta(Some(&FormatMeta {
            kind: FormatKind::Number,
            decimals: Some(2),
        }));
        assert_eq!(f.format(&CubeValue::Number(1234.5)), "1,234.50");
        assert_eq!(f.format(&CubeValue::Number(-1234.5)), "-1,234.50");
    }

    #[test]
    fn percent_format_scales_by_hundred() {
        let f = ValueFormatter::from_meta(Some(&FormatMeta {
            kind: FormatKind::Percent,
            decimals: Some(0),
        }));
        assert_eq!(f.format(&CubeValue::Number(0.42)), "42%");
    }

    #[test]
    fn nan_renders_as_dash() {
        let f = ValueFormatter::default();
        assert_eq!(f.format(&CubeValue::Number(f64::NAN)), "-");
    }

    #[test]
    fn non_numbers_use_their_display_form() {
        let f = ValueFormatter::default();
        assert_eq!(f.format(&CubeValue::from("SE")), "SE");
    }
}
