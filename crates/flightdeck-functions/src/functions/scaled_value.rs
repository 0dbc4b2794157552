//! Gauges: raw wire scalars converted to engineering units.

use flightdeck_calibration::{CalibrationPoint, CalibrationPointCollection};
use serde::{Deserialize, Serialize};

use crate::binding::{BindingValue, BindingValueUnit, ValueDescriptor};
use crate::context::{ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{require_element, require_finite};
use crate::wire::parse_wire_f64;

/// How a raw value becomes an engineering value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ValueScaling {
    /// `raw * scale + base`.
    Linear {
        #[serde(default = "unit_scale")]
        scale: f64,
        #[serde(default)]
        base: f64,
    },
    /// Piecewise-linear table.
    Calibration { points: Vec<CalibrationPoint> },
}

fn unit_scale() -> f64 {
    1.0
}

impl Default for ValueScaling {
    fn default() -> Self {
        ValueScaling::Linear {
            scale: 1.0,
            base: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledValueConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub element: DataElement,
    #[serde(default)]
    pub scaling: ValueScaling,
    #[serde(default)]
    pub unit: BindingValueUnit,
}

#[derive(Debug, Clone)]
enum Transform {
    Linear { scale: f64, base: f64 },
    Table(CalibrationPointCollection),
}

impl Transform {
    fn build(identity: &FunctionIdentity, scaling: ValueScaling) -> FunctionResult<Self> {
        match scaling {
            ValueScaling::Linear { scale, base } => {
                require_finite(identity, "scale", scale)?;
                require_finite(identity, "base", base)?;
                Ok(Transform::Linear { scale, base })
            }
            ValueScaling::Calibration { points } => CalibrationPointCollection::new(points)
                .map(Transform::Table)
                .map_err(|source| FunctionError::Calibration {
                    function: identity.local_key(),
                    source,
                }),
        }
    }

    fn apply(&self, raw: f64) -> f64 {
        match self {
            Transform::Linear { scale, base } => raw * scale + base,
            Transform::Table(table) => table.interpolate(raw),
        }
    }
}

/// Numeric gauge reading.
#[derive(Debug)]
pub struct ScaledNetworkValue {
    identity: FunctionIdentity,
    element: DataElement,
    transform: Transform,
    value: ValueSlot,
}

impl ScaledNetworkValue {
    /// # Errors
    ///
    /// Fails for blank names, non-finite linear factors, or an invalid table.
    pub fn new(config: ScaledValueConfig) -> FunctionResult<Self> {
        let ScaledValueConfig {
            identity,
            element,
            scaling,
            unit,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        let transform = Transform::build(&identity, scaling)?;
        let description = if identity.description.is_empty() {
            format!("Current {}", identity.name)
        } else {
            identity.description.clone()
        };
        let value = ValueSlot::new(identity.address(), unit, description);
        Ok(Self {
            identity,
            element,
            transform,
            value,
        })
    }

    /// Converted value for a raw reading, without storing it.
    pub fn convert(&self, raw: f64) -> f64 {
        self.transform.apply(raw)
    }

    fn decode(&mut self, value: &str, notifications: &mut Notifications) -> Option<f64> {
        let raw = parse_wire_f64(value)?;
        let converted = self.transform.apply(raw);
        self.value
            .set(converted.into(), ChangeOrigin::Network, notifications);
        Some(raw)
    }
}

impl NetworkFunction for ScaledNetworkValue {
    fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id == self.element.id {
            self.decode(value, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }
}

/// Scaled gauge that also exposes the untransformed number as `raw`.
#[derive(Debug)]
pub struct DualNetworkValue {
    scaled: ScaledNetworkValue,
    raw: ValueSlot,
}

impl DualNetworkValue {
    /// # Errors
    ///
    /// Same as [`ScaledNetworkValue::new`].
    pub fn new(config: ScaledValueConfig) -> FunctionResult<Self> {
        let scaled = ScaledNetworkValue::new(config)?;
        let raw = ValueSlot::new(
            scaled.identity.sub_address("raw"),
            BindingValueUnit::Numeric,
            "Raw value before calibration",
        );
        Ok(Self { scaled, raw })
    }
}

impl NetworkFunction for DualNetworkValue {
    fn identity(&self) -> &FunctionIdentity {
        &self.scaled.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        self.scaled.data_elements()
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id != self.scaled.element.id {
            return;
        }
        if let Some(raw) = self.scaled.decode(value, notifications) {
            self.raw.set(raw.into(), ChangeOrigin::Network, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.scaled.reset(notifications);
        self.raw.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        let mut values = self.scaled.values();
        values.push((self.raw.descriptor().clone(), self.raw.get().clone()));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn airspeed() -> ScaledValueConfig {
        ScaledValueConfig {
            identity: FunctionIdentity::new("Flight Instruments", "IAS"),
            element: DataElement::new("51").with_format("%0.4f").every_frame(true),
            scaling: ValueScaling::Calibration {
                points: vec![
                    CalibrationPoint::new(0.0, 0.0),
                    CalibrationPoint::new(0.5, 200.0),
                    CalibrationPoint::new(1.0, 600.0),
                ],
            },
            unit: BindingValueUnit::Knots,
        }
    }

    fn first_value(function: &dyn NetworkFunction) -> Option<BindingValue> {
        function.values().first().map(|(_, v)| v.clone())
    }

    #[test]
    fn test_calibrated_decode() -> TestResult {
        let mut gauge = ScaledNetworkValue::new(airspeed())?;
        let mut notes = Notifications::new();
        gauge.process_network_data("51", "0.75", &mut notes);
        assert_eq!(first_value(&gauge), Some(BindingValue::Double(400.0)));
        gauge.process_network_data("51", "x", &mut notes);
        assert_eq!(first_value(&gauge), Some(BindingValue::Double(400.0)));
        Ok(())
    }

    #[test]
    fn test_linear_decode() -> TestResult {
        let mut gauge = ScaledNetworkValue::new(ScaledValueConfig {
            identity: FunctionIdentity::new("Engine", "RPM"),
            element: DataElement::new("52"),
            scaling: ValueScaling::Linear {
                scale: 100.0,
                base: 5.0,
            },
            unit: BindingValueUnit::Percent,
        })?;
        let mut notes = Notifications::new();
        gauge.process_network_data("52", "0.5", &mut notes);
        assert_eq!(first_value(&gauge), Some(BindingValue::Double(55.0)));
        Ok(())
    }

    #[test]
    fn test_dual_exposes_raw() -> TestResult {
        let mut gauge = DualNetworkValue::new(airspeed())?;
        let mut notes = Notifications::new();
        gauge.process_network_data("51", "0.25", &mut notes);
        let values = gauge.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(1).map(|(d, _)| d.address.to_string()).as_deref(), Some("Flight Instruments.IAS.raw"));
        assert_eq!(values.get(1).map(|(_, v)| v.clone()), Some(BindingValue::Double(0.25)));
        assert_eq!(values.first().map(|(_, v)| v.clone()), Some(BindingValue::Double(100.0)));

        gauge.reset(&mut notes);
        assert!(gauge.values().iter().all(|(_, v)| v.is_empty()));
        Ok(())
    }

    #[test]
    fn test_invalid_table_is_calibration_error() {
        let mut config = airspeed();
        config.scaling = ValueScaling::Calibration { points: Vec::new() };
        assert!(matches!(
            ScaledNetworkValue::new(config),
            Err(FunctionError::Calibration { .. })
        ));
    }
}
