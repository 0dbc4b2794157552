//! Values, triggers and actions: the surface host automation binds to.
//!
//! Every function exposes itself through the same three primitives. A value
//! is readable typed state, a trigger is a fire-and-forget notification, and
//! an action is an operation the host invokes with a loosely typed parameter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FunctionError;

/// Typed payload of a value, trigger or action parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BindingValue {
    /// Unknown: nothing decoded yet, or reset after losing the remote.
    #[default]
    Empty,
    Bool(bool),
    Double(f64),
    Text(String),
}

impl BindingValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, BindingValue::Empty)
    }

    /// Numeric view, parsing text the way the wire would.
    ///
    /// Non-finite numbers have no wire form and yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BindingValue::Empty => None,
            BindingValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            BindingValue::Double(v) => Some(*v).filter(|v| v.is_finite()),
            BindingValue::Text(t) => crate::wire::parse_wire_f64(t),
        }
    }

    /// Boolean view; numbers are true when nonzero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BindingValue::Empty => None,
            BindingValue::Bool(b) => Some(*b),
            BindingValue::Double(v) => Some(*v != 0.0),
            BindingValue::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "up" | "open" => Some(true),
                "false" | "off" | "no" | "down" | "closed" => Some(false),
                other => crate::wire::parse_wire_f64(other).map(|v| v != 0.0),
            },
        }
    }

    /// Text view, `None` only for [`BindingValue::Empty`].
    pub fn as_text(&self) -> Option<String> {
        match self {
            BindingValue::Empty => None,
            BindingValue::Bool(b) => Some(b.to_string()),
            BindingValue::Double(v) => Some(v.to_string()),
            BindingValue::Text(t) => Some(t.clone()),
        }
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingValue::Empty => f.write_str("<empty>"),
            BindingValue::Bool(b) => write!(f, "{b}"),
            BindingValue::Double(v) => write!(f, "{v}"),
            BindingValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<bool> for BindingValue {
    fn from(value: bool) -> Self {
        BindingValue::Bool(value)
    }
}

impl From<f64> for BindingValue {
    fn from(value: f64) -> Self {
        BindingValue::Double(value)
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        BindingValue::Text(value.to_string())
    }
}

impl From<String> for BindingValue {
    fn from(value: String) -> Self {
        BindingValue::Text(value)
    }
}

/// Unit attached to a value or action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingValueUnit {
    #[default]
    Numeric,
    Boolean,
    Text,
    Degrees,
    Percent,
    Seconds,
    Feet,
    Knots,
    Rpm,
    Position,
}

impl fmt::Display for BindingValueUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingValueUnit::Numeric => "numeric",
            BindingValueUnit::Boolean => "boolean",
            BindingValueUnit::Text => "text",
            BindingValueUnit::Degrees => "degrees",
            BindingValueUnit::Percent => "percent",
            BindingValueUnit::Seconds => "seconds",
            BindingValueUnit::Feet => "feet",
            BindingValueUnit::Knots => "knots",
            BindingValueUnit::Rpm => "rpm",
            BindingValueUnit::Position => "position",
        };
        f.write_str(name)
    }
}

/// Stable binding name: `device.function[.sub]`.
///
/// External profiles reference bindings by this text, so it must survive
/// serialization unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BindingAddress {
    pub device: String,
    pub function: String,
    pub sub: Option<String>,
}

impl BindingAddress {
    pub fn new(device: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            function: function.into(),
            sub: None,
        }
    }

    #[must_use]
    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// `device.function`, the key used for registry lookup and ordering.
    pub fn local_key(&self) -> String {
        format!("{}.{}", self.device, self.function)
    }
}

impl fmt::Display for BindingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub {
            Some(sub) => write!(f, "{}.{}.{}", self.device, self.function, sub),
            None => write!(f, "{}.{}", self.device, self.function),
        }
    }
}

impl FromStr for BindingAddress {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let device = parts.next().map(str::trim).unwrap_or_default();
        let function = parts.next().map(str::trim).unwrap_or_default();
        if device.is_empty() || function.is_empty() {
            return Err(FunctionError::InvalidAddress(s.to_string()));
        }
        let sub = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Ok(Self {
            device: device.to_string(),
            function: function.to_string(),
            sub,
        })
    }
}

impl TryFrom<String> for BindingAddress {
    type Error = FunctionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BindingAddress> for String {
    fn from(address: BindingAddress) -> Self {
        address.to_string()
    }
}

/// Named roles an action can play.
///
/// Each function kind supports a small subset; invoking anything else is
/// ignored rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Set,
    Increment,
    Decrement,
    Push,
    Release,
    PushUp,
    PushDown,
    AutoguardSet,
    SetGuard,
    ToggleGuard,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::Set,
        ActionKind::Increment,
        ActionKind::Decrement,
        ActionKind::Push,
        ActionKind::Release,
        ActionKind::PushUp,
        ActionKind::PushDown,
        ActionKind::AutoguardSet,
        ActionKind::SetGuard,
        ActionKind::ToggleGuard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Set => "set",
            ActionKind::Increment => "increment",
            ActionKind::Decrement => "decrement",
            ActionKind::Push => "push",
            ActionKind::Release => "release",
            ActionKind::PushUp => "push_up",
            ActionKind::PushDown => "push_down",
            ActionKind::AutoguardSet => "autoguard_set",
            ActionKind::SetGuard => "set_guard",
            ActionKind::ToggleGuard => "toggle_guard",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| FunctionError::InvalidAddress(s.to_string()))
    }
}

/// Describes a readable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDescriptor {
    pub address: BindingAddress,
    pub unit: BindingValueUnit,
    pub description: String,
}

/// Describes a trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerDescriptor {
    pub address: BindingAddress,
    pub description: String,
}

/// Describes an invocable action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescriptor {
    pub address: BindingAddress,
    pub kind: ActionKind,
    pub parameter_unit: Option<BindingValueUnit>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_address_round_trip() -> TestResult {
        let address: BindingAddress = "Fuel System.Boost Pump.set".parse()?;
        assert_eq!(address.device, "Fuel System");
        assert_eq!(address.function, "Boost Pump");
        assert_eq!(address.sub.as_deref(), Some("set"));
        assert_eq!(address.to_string(), "Fuel System.Boost Pump.set");
        assert_eq!(address.local_key(), "Fuel System.Boost Pump");

        let json = serde_json::to_string(&address)?;
        assert_eq!(json, "\"Fuel System.Boost Pump.set\"");
        let decoded: BindingAddress = serde_json::from_str(&json)?;
        assert_eq!(decoded, address);
        Ok(())
    }

    #[test]
    fn test_address_without_sub() -> TestResult {
        let address: BindingAddress = "Gear.Handle".parse()?;
        assert!(address.sub.is_none());
        assert_eq!(address.to_string(), "Gear.Handle");
        Ok(())
    }

    #[test]
    fn test_address_rejects_missing_parts() {
        assert!("Gear".parse::<BindingAddress>().is_err());
        assert!(".Handle".parse::<BindingAddress>().is_err());
    }

    #[test]
    fn test_action_kind_parsing() -> TestResult {
        assert_eq!("push up".parse::<ActionKind>()?, ActionKind::PushUp);
        assert_eq!("Autoguard-Set".parse::<ActionKind>()?, ActionKind::AutoguardSet);
        assert_eq!("set".parse::<ActionKind>()?, ActionKind::Set);
        assert!("fly".parse::<ActionKind>().is_err());
        Ok(())
    }

    #[test]
    fn test_value_coercions() {
        assert_eq!(BindingValue::from("2").as_f64(), Some(2.0));
        assert_eq!(BindingValue::from(true).as_f64(), Some(1.0));
        assert_eq!(BindingValue::from("on").as_bool(), Some(true));
        assert_eq!(BindingValue::from(0.0).as_bool(), Some(false));
        assert_eq!(BindingValue::from("maybe").as_bool(), None);
        assert_eq!(BindingValue::Empty.as_f64(), None);
        assert_eq!(BindingValue::from(1.5).as_text().as_deref(), Some("1.5"));
    }

    #[test]
    fn test_non_finite_has_no_numeric_view() {
        assert_eq!(BindingValue::Double(f64::NAN).as_f64(), None);
        assert_eq!(BindingValue::Double(f64::INFINITY).as_f64(), None);
        assert_eq!(BindingValue::Double(f64::NEG_INFINITY).as_f64(), None);
        assert_eq!(BindingValue::from("inf").as_f64(), None);
    }
}
