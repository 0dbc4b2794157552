//! Wire-level scalars and outbound control commands.
//!
//! Everything on the wire is text generated by an exporter script that is not
//! locale aware. Numbers therefore always use a decimal point and never a
//! thousands separator. Rust's float formatting already follows those rules,
//! so the helpers here only deal with precision and equality.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static FORMAT_PRECISION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"%[-+ 0#]*\d*(?:\.(\d+))?[a-zA-Z]").ok());

/// Decimal places requested by a printf-style output format.
///
/// `%0.2f` yields 2, `%d` and `%5d` yield 0, anything unparsable yields 0.
pub fn precision_from_format(format: &str) -> usize {
    let Some(pattern) = FORMAT_PRECISION.as_ref() else {
        return 0;
    };
    pattern
        .captures(format)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Parses a wire scalar, rejecting text and non-finite numbers.
pub fn parse_wire_f64(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a number for the wire with a fixed number of decimals.
pub fn format_wire_f64(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    // Values that round to zero must not reach the remote parser as "-0".
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.bytes().all(|b| b == b'0' || b == b'.') => {
            magnitude.to_string()
        }
        _ => text,
    }
}

/// A wire value normalised once at the boundary.
///
/// The exporter is not byte-stable for equal numbers (`"1"` and `"1.0"` both
/// occur), so matching compares the text first and the parsed number second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WireScalar {
    text: String,
    number: Option<f64>,
}

impl WireScalar {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let number = parse_wire_f64(&text);
        Self { text, number }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> Option<f64> {
        self.number
    }

    /// Exact text match, or numeric equality when both sides are numbers.
    pub fn matches(&self, other: &WireScalar) -> bool {
        if self.text == other.text {
            return true;
        }
        match (self.number, other.number) {
            (Some(a), Some(b)) => numbers_equal(a, b),
            _ => false,
        }
    }

    /// Same as [`WireScalar::matches`] for raw inbound text.
    pub fn matches_str(&self, text: &str) -> bool {
        self.matches(&WireScalar::new(text))
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= f64::EPSILON * scale
}

impl From<String> for WireScalar {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for WireScalar {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<WireScalar> for String {
    fn from(scalar: WireScalar) -> Self {
        scalar.text
    }
}

impl fmt::Display for WireScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An outbound control command: `C<device>,<action>,<value>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireCommand {
    pub device_id: String,
    pub action_id: String,
    pub value: String,
}

impl WireCommand {
    pub fn new(
        device_id: impl Into<String>,
        action_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            action_id: action_id.into(),
            value: value.into(),
        }
    }

    /// Command carrying a number formatted with `precision` decimals.
    pub fn numeric(
        device_id: impl Into<String>,
        action_id: impl Into<String>,
        value: f64,
        precision: usize,
    ) -> Self {
        Self::new(device_id, action_id, format_wire_f64(value, precision))
    }
}

impl fmt::Display for WireCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{},{},{}", self.device_id, self.action_id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_from_format() {
        assert_eq!(precision_from_format("%0.1f"), 1);
        assert_eq!(precision_from_format("%.3f"), 3);
        assert_eq!(precision_from_format("%5.2f"), 2);
        assert_eq!(precision_from_format("%d"), 0);
        assert_eq!(precision_from_format("%3d"), 0);
        assert_eq!(precision_from_format("%s"), 0);
        assert_eq!(precision_from_format("garbage"), 0);
        assert_eq!(precision_from_format(""), 0);
    }

    #[test]
    fn test_parse_rejects_text_and_non_finite() {
        assert_eq!(parse_wire_f64(" 0.5 "), Some(0.5));
        assert_eq!(parse_wire_f64("-1"), Some(-1.0));
        assert_eq!(parse_wire_f64("abc"), None);
        assert_eq!(parse_wire_f64("NaN"), None);
        assert_eq!(parse_wire_f64("inf"), None);
        assert_eq!(parse_wire_f64(""), None);
    }

    #[test]
    fn test_format_is_invariant() {
        assert_eq!(format_wire_f64(0.1, 1), "0.1");
        assert_eq!(format_wire_f64(1234.5, 2), "1234.50");
        assert_eq!(format_wire_f64(-0.25, 2), "-0.25");
        assert_eq!(format_wire_f64(-0.0, 2), "0.00");
        assert_eq!(format_wire_f64(3.0, 0), "3");
        assert_eq!(format_wire_f64(-0.04, 1), "0.0");
        assert_eq!(format_wire_f64(-0.4, 0), "0");
    }

    #[test]
    fn test_scalar_matching() {
        let one = WireScalar::new("1.0");
        assert!(one.matches_str("1.0"));
        assert!(one.matches_str("1"));
        assert!(one.matches_str("1.000"));
        assert!(!one.matches_str("0.1"));
        assert!(!one.matches_str("one"));

        let text = WireScalar::new("ON");
        assert!(text.matches_str("ON"));
        assert!(!text.matches_str("on"));
    }

    #[test]
    fn test_command_display() {
        let cmd = WireCommand::new("25", "3001", "1.0");
        assert_eq!(cmd.to_string(), "C25,3001,1.0");

        let cmd = WireCommand::numeric("12", "3005", -0.05, 2);
        assert_eq!(cmd.to_string(), "C12,3005,-0.05");
    }
}
