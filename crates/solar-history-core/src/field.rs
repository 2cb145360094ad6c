// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Cell values carried through the merge untouched.

use std::fmt;

/// A single measurement cell from a controller export.
///
/// The merge never looks inside these. A cell is only typed as a number
/// when its text is exactly what the number displays as, so writing a
/// value back reproduces the exported cell byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Classify a raw CSV cell. Empty cells carry no value.
    ///
    /// Anything that would not display back as `raw` stays text: leading
    /// zeros, `+` signs, padding, integers beyond `i64`, `nan`, `inf`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        if let Ok(v) = raw.parse::<i64>()
            && v.to_string() == raw
        {
            return Some(Self::Integer(v));
        }
        if let Ok(v) = raw.parse::<f64>() {
            let number = Self::Number(v);
            if v.is_finite() && number.to_string() == raw {
                return Some(number);
            }
        }
        Some(Self::Text(raw.to_owned()))
    }

    /// The form this value takes after a save/load cycle: text that reads
    /// as a number becomes that number, empty text becomes no value.
    pub fn normalize(self) -> Option<Self> {
        match self {
            Self::Text(s) => Self::parse(&s),
            Self::Integer(_) | Self::Number(_) => Some(self),
        }
    }

    /// Numeric view used by summaries; text yields `None`.
    #[expect(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) | Self::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            // Integral floats keep a ".0" so they re-parse as numbers, not integers
            Self::Number(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_cells() {
        assert_eq!(FieldValue::parse("42"), Some(FieldValue::Integer(42)));
        assert_eq!(FieldValue::parse("-3"), Some(FieldValue::Integer(-3)));
        assert_eq!(FieldValue::parse("13.35"), Some(FieldValue::Number(13.35)));
        assert_eq!(
            FieldValue::parse("No error"),
            Some(FieldValue::Text("No error".to_owned()))
        );
        assert_eq!(FieldValue::parse(""), None);
        assert_eq!(FieldValue::parse("41.0"), Some(FieldValue::Number(41.0)));
    }

    #[test]
    fn test_non_canonical_numbers_stay_text() {
        for raw in [
            "007",
            "+5",
            "12345678901234567890",
            "12.850",
            "1e5",
            "nan",
            "inf",
            " 42",
            "   ",
        ] {
            let value = FieldValue::parse(raw).unwrap();
            assert_eq!(value.as_text(), Some(raw), "{raw} was reclassified");
            assert_eq!(value.to_string(), raw);
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            FieldValue::from("42").normalize(),
            Some(FieldValue::Integer(42))
        );
        assert_eq!(
            FieldValue::from("007").normalize(),
            Some(FieldValue::Text("007".to_owned()))
        );
        assert_eq!(FieldValue::from("").normalize(), None);
        assert_eq!(
            FieldValue::Number(2.5).normalize(),
            Some(FieldValue::Number(2.5))
        );
    }

    #[test]
    fn test_integral_float_survives_display() {
        let value = FieldValue::Number(10.0);
        assert_eq!(value.to_string(), "10.0");
        assert_eq!(FieldValue::parse(&value.to_string()), Some(value));
    }

    #[test]
    fn test_fractional_float_survives_display() {
        for v in [0.1, 13.96, -0.25, 1234.5678] {
            let value = FieldValue::Number(v);
            assert_eq!(FieldValue::parse(&value.to_string()), Some(value));
        }
    }

    #[test]
    fn test_text_keeps_surrounding_whitespace() {
        let value = FieldValue::parse(" Input voltage too high").unwrap();
        assert_eq!(value.as_text(), Some(" Input voltage too high"));
        assert_eq!(value.to_string(), " Input voltage too high");
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(FieldValue::Integer(7).as_f64(), Some(7.0));
        assert_eq!(FieldValue::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(FieldValue::from("x").as_f64(), None);
    }
}
