//! Passthrough telemetry: values and triggers with no outbound side.

use serde::{Deserialize, Serialize};

use crate::binding::{BindingValue, BindingValueUnit, TriggerDescriptor, ValueDescriptor};
use crate::context::{ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::require_element;
use crate::wire::parse_wire_f64;

const RECEIVED: &str = "received";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkValueConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub element: DataElement,
    #[serde(default)]
    pub unit: BindingValueUnit,
}

/// Decodes a wire string according to the unit it is exposed with.
fn decode_as(unit: BindingValueUnit, value: &str) -> Option<BindingValue> {
    match unit {
        BindingValueUnit::Text => Some(BindingValue::Text(value.to_string())),
        BindingValueUnit::Boolean => parse_wire_f64(value).map(|v| BindingValue::Bool(v != 0.0)),
        _ => parse_wire_f64(value).map(BindingValue::Double),
    }
}

/// Telemetry value copied straight from the wire.
#[derive(Debug)]
pub struct NetworkValue {
    identity: FunctionIdentity,
    element: DataElement,
    value: ValueSlot,
}

impl NetworkValue {
    /// # Errors
    ///
    /// Fails for blank names or element id.
    pub fn new(config: NetworkValueConfig) -> FunctionResult<Self> {
        let NetworkValueConfig {
            identity,
            element,
            unit,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        let description = if identity.description.is_empty() {
            format!("Current {}", identity.name)
        } else {
            identity.description.clone()
        };
        let value = ValueSlot::new(identity.address(), unit, description);
        Ok(Self {
            identity,
            element,
            value,
        })
    }

    fn decode(&mut self, value: &str, notifications: &mut Notifications) -> Option<BindingValue> {
        let decoded = decode_as(self.value.descriptor().unit, value)?;
        self.value
            .set(decoded.clone(), ChangeOrigin::Network, notifications);
        Some(decoded)
    }
}

impl NetworkFunction for NetworkValue {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTriggerConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub element: DataElement,
}

/// Fires every time its element arrives; carries no state.
#[derive(Debug)]
pub struct NetworkTrigger {
    identity: FunctionIdentity,
    element: DataElement,
}

impl NetworkTrigger {
    /// # Errors
    ///
    /// Fails for blank names or element id.
    pub fn new(config: NetworkTriggerConfig) -> FunctionResult<Self> {
        let NetworkTriggerConfig { identity, element } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        Ok(Self { identity, element })
    }
}

impl NetworkFunction for NetworkTrigger {
    fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, _value: &str, notifications: &mut Notifications) {
        if id == self.element.id {
            notifications.fire(self.identity.sub_address(RECEIVED), BindingValue::Empty);
        }
    }

    fn reset(&mut self, _notifications: &mut Notifications) {}

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        Vec::new()
    }

    fn triggers(&self) -> Vec<TriggerDescriptor> {
        vec![self.identity.trigger(RECEIVED, "Fired when the simulator reports this event")]
    }
}

/// Value that also fires a trigger carrying each decoded reading.
#[derive(Debug)]
pub struct NetworkTriggerValue {
    value: NetworkValue,
}

impl NetworkTriggerValue {
    /// # Errors
    ///
    /// Same as [`NetworkValue::new`].
    pub fn new(config: NetworkValueConfig) -> FunctionResult<Self> {
        Ok(Self {
            value: NetworkValue::new(config)?,
        })
    }
}

impl NetworkFunction for NetworkTriggerValue {
    fn identity(&self) -> &FunctionIdentity {
        &self.value.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        self.value.data_elements()
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id != self.value.element.id {
            return;
        }
        if let Some(decoded) = self.value.decode(value, notifications) {
            notifications.fire(self.value.identity.sub_address(RECEIVED), decoded);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.value.reset(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        self.value.values()
    }

    fn triggers(&self) -> Vec<TriggerDescriptor> {
        vec![
            self.value
                .identity
                .trigger(RECEIVED, "Fired with each value received from the simulator"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BindingEvent;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn triggers_fired(notes: &Notifications) -> Vec<BindingValue> {
        notes
            .events()
            .iter()
            .filter_map(|e| match e {
                BindingEvent::TriggerFired { value, .. } => Some(value.clone()),
                BindingEvent::ValueChanged { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_value_respects_unit() -> TestResult {
        let mut altitude = NetworkValue::new(NetworkValueConfig {
            identity: FunctionIdentity::new("Air Data", "Altitude"),
            element: DataElement::new("ALT"),
            unit: BindingValueUnit::Feet,
        })?;
        let mut notes = Notifications::new();
        altitude.process_network_data("ALT", "12500", &mut notes);
        altitude.process_network_data("ALT", "n/a", &mut notes);
        assert_eq!(
            altitude.values().first().map(|(_, v)| v.clone()),
            Some(BindingValue::Double(12500.0))
        );
        Ok(())
    }

    #[test]
    fn test_trigger_fires_every_time() -> TestResult {
        let mut event = NetworkTrigger::new(NetworkTriggerConfig {
            identity: FunctionIdentity::new("Weapons", "Gun Fired"),
            element: DataElement::new("GUN"),
        })?;
        let mut notes = Notifications::new();
        event.process_network_data("GUN", "1", &mut notes);
        event.process_network_data("GUN", "1", &mut notes);
        assert_eq!(triggers_fired(&notes).len(), 2);
        Ok(())
    }

    #[test]
    fn test_trigger_value_carries_payload() -> TestResult {
        let mut radio = NetworkTriggerValue::new(NetworkValueConfig {
            identity: FunctionIdentity::new("Radio", "Frequency"),
            element: DataElement::new("FREQ"),
            unit: BindingValueUnit::Text,
        })?;
        let mut notes = Notifications::new();
        radio.process_network_data("FREQ", "251.000", &mut notes);
        radio.process_network_data("FREQ", "251.000", &mut notes);
        assert_eq!(
            triggers_fired(&notes),
            vec![BindingValue::from("251.000"), BindingValue::from("251.000")]
        );
        assert_eq!(notes.len(), 3);
        Ok(())
    }
}
