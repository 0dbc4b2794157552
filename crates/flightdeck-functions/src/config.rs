//! Serializable function records and the factory that builds them.
//!
//! A panel definition is a list of [`FunctionConfig`] records. Whether a
//! record was written by hand, generated, or read back from a saved profile,
//! [`FunctionConfig::build`] is the only way to turn it into a live function.

use serde::{Deserialize, Serialize};

use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{
    AbsoluteEncoder, AbsoluteEncoderConfig, Axis, AxisConfig, DualNetworkValue, DualRocker,
    DualRockerConfig, FlagValue, FlagValueConfig, GuardedSwitch, GuardedSwitchConfig, HatSwitch,
    HatSwitchConfig, IndicatorDimmable, IndicatorDimmableConfig, LockedEncoder,
    LockedEncoderConfig, NetworkTrigger, NetworkTriggerConfig, NetworkTriggerValue, NetworkValue,
    NetworkValueConfig, PushButton, PushButtonConfig, RotaryEncoder, RotaryEncoderConfig,
    ScaledNetworkValue, ScaledValueConfig, Switch, SwitchConfig, Text, TextConfig,
};

/// One function record, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FunctionConfig {
    Switch(SwitchConfig),
    GuardedSwitch(GuardedSwitchConfig),
    HatSwitch(HatSwitchConfig),
    PushButton(PushButtonConfig),
    DualRocker(DualRockerConfig),
    Axis(AxisConfig),
    RotaryEncoder(RotaryEncoderConfig),
    LockedEncoder(LockedEncoderConfig),
    AbsoluteEncoder(AbsoluteEncoderConfig),
    ScaledValue(ScaledValueConfig),
    DualValue(ScaledValueConfig),
    Flag(FlagValueConfig),
    IndicatorDimmable(IndicatorDimmableConfig),
    Text(TextConfig),
    Value(NetworkValueConfig),
    Trigger(NetworkTriggerConfig),
    TriggerValue(NetworkValueConfig),
}

impl FunctionConfig {
    pub fn identity(&self) -> &FunctionIdentity {
        match self {
            FunctionConfig::Switch(c) => &c.identity,
            FunctionConfig::GuardedSwitch(c) => &c.switch.identity,
            FunctionConfig::HatSwitch(c) => &c.identity,
            FunctionConfig::PushButton(c) => &c.identity,
            FunctionConfig::DualRocker(c) => &c.identity,
            FunctionConfig::Axis(c) => &c.identity,
            FunctionConfig::RotaryEncoder(c) => &c.identity,
            FunctionConfig::LockedEncoder(c) => &c.encoder.identity,
            FunctionConfig::AbsoluteEncoder(c) => &c.identity,
            FunctionConfig::ScaledValue(c) | FunctionConfig::DualValue(c) => &c.identity,
            FunctionConfig::Flag(c) | FunctionConfig::IndicatorDimmable(c) => &c.identity,
            FunctionConfig::Text(c) => &c.identity,
            FunctionConfig::Value(c) | FunctionConfig::TriggerValue(c) => &c.identity,
            FunctionConfig::Trigger(c) => &c.identity,
        }
    }

    /// Name of the `type` tag, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FunctionConfig::Switch(_) => "switch",
            FunctionConfig::GuardedSwitch(_) => "guarded_switch",
            FunctionConfig::HatSwitch(_) => "hat_switch",
            FunctionConfig::PushButton(_) => "push_button",
            FunctionConfig::DualRocker(_) => "dual_rocker",
            FunctionConfig::Axis(_) => "axis",
            FunctionConfig::RotaryEncoder(_) => "rotary_encoder",
            FunctionConfig::LockedEncoder(_) => "locked_encoder",
            FunctionConfig::AbsoluteEncoder(_) => "absolute_encoder",
            FunctionConfig::ScaledValue(_) => "scaled_value",
            FunctionConfig::DualValue(_) => "dual_value",
            FunctionConfig::Flag(_) => "flag",
            FunctionConfig::IndicatorDimmable(_) => "indicator_dimmable",
            FunctionConfig::Text(_) => "text",
            FunctionConfig::Value(_) => "value",
            FunctionConfig::Trigger(_) => "trigger",
            FunctionConfig::TriggerValue(_) => "trigger_value",
        }
    }

    /// Builds the live function.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the concrete function type.
    pub fn build(self) -> FunctionResult<Box<dyn NetworkFunction>> {
        Ok(match self {
            FunctionConfig::Switch(c) => Box::new(Switch::new(c)?),
            FunctionConfig::GuardedSwitch(c) => Box::new(GuardedSwitch::new(c)?),
            FunctionConfig::HatSwitch(c) => Box::new(HatSwitch::new(c)?),
            FunctionConfig::PushButton(c) => Box::new(PushButton::new(c)?),
            FunctionConfig::DualRocker(c) => Box::new(DualRocker::new(c)?),
            FunctionConfig::Axis(c) => Box::new(Axis::new(c)?),
            FunctionConfig::RotaryEncoder(c) => Box::new(RotaryEncoder::new(c)?),
            FunctionConfig::LockedEncoder(c) => Box::new(LockedEncoder::new(c)?),
            FunctionConfig::AbsoluteEncoder(c) => Box::new(AbsoluteEncoder::new(c)?),
            FunctionConfig::ScaledValue(c) => Box::new(ScaledNetworkValue::new(c)?),
            FunctionConfig::DualValue(c) => Box::new(DualNetworkValue::new(c)?),
            FunctionConfig::Flag(c) => Box::new(FlagValue::new(c)?),
            FunctionConfig::IndicatorDimmable(c) => Box::new(IndicatorDimmable::new(c)?),
            FunctionConfig::Text(c) => Box::new(Text::new(c)?),
            FunctionConfig::Value(c) => Box::new(NetworkValue::new(c)?),
            FunctionConfig::Trigger(c) => Box::new(NetworkTrigger::new(c)?),
            FunctionConfig::TriggerValue(c) => Box::new(NetworkTriggerValue::new(c)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const PANEL: &str = r#"
- type: switch
  device: Electrical
  name: Battery
  device_id: "1"
  element: { id: "404", format: "%0.1f" }
  action_id: "3001"
  positions:
    - { arg_value: "1.0", name: "On" }
    - { arg_value: "0.0", name: "Off" }
- type: scaled_value
  device: Engine
  name: Oil Pressure
  element: { id: "88", format: "%0.3f", every_frame: true }
  unit: percent
  scaling:
    mode: calibration
    points:
      - { input: 0.0, output: 0.0 }
      - { input: 1.0, output: 100.0 }
- type: text
  device: UFC
  name: Scratchpad
  element: { id: "2095" }
"#;

    #[test]
    fn test_yaml_records_build() -> TestResult {
        let records: Vec<FunctionConfig> = serde_yaml::from_str(PANEL)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records.first().map(FunctionConfig::kind), Some("switch"));

        let built = records
            .into_iter()
            .map(FunctionConfig::build)
            .collect::<FunctionResult<Vec<_>>>()?;
        let keys: Vec<String> = built.iter().map(|f| f.local_key()).collect();
        assert_eq!(
            keys,
            vec!["Electrical.Battery", "Engine.Oil Pressure", "UFC.Scratchpad"]
        );
        Ok(())
    }

    #[test]
    fn test_record_survives_json_round_trip() -> TestResult {
        let records: Vec<FunctionConfig> = serde_yaml::from_str(PANEL)?;
        let json = serde_json::to_string(&records)?;
        let back: Vec<FunctionConfig> = serde_json::from_str(&json)?;
        assert_eq!(back, records);
        Ok(())
    }

    #[test]
    fn test_invalid_record_fails_build() -> TestResult {
        let records: Vec<FunctionConfig> = serde_yaml::from_str(
            r#"
- type: axis
  device: Engine
  name: Throttle
  device_id: "5"
  element: { id: "104" }
  action_id: "3005"
  min: 1.0
  max: 0.0
  step: 0.1
"#,
        )?;
        let result = records.into_iter().map(FunctionConfig::build).next();
        assert!(matches!(result, Some(Err(_))));
        Ok(())
    }
}
