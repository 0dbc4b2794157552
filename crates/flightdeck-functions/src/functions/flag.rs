//! Lamps and flags.

use serde::{Deserialize, Serialize};

use crate::binding::{BindingValue, BindingValueUnit, ValueDescriptor};
use crate::context::{ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::require_element;
use crate::wire::parse_wire_f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagValueConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub element: DataElement,
}

/// Boolean indicator: any nonzero reading is on.
#[derive(Debug)]
pub struct FlagValue {
    identity: FunctionIdentity,
    element: DataElement,
    value: ValueSlot,
}

impl FlagValue {
    /// # Errors
    ///
    /// Fails for blank names or element id.
    pub fn new(config: FlagValueConfig) -> FunctionResult<Self> {
        let FlagValueConfig { identity, element } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        let value = ValueSlot::new(identity.address(), BindingValueUnit::Boolean, "Indicator is lit");
        Ok(Self {
            identity,
            element,
            value,
        })
    }

    fn decode(&mut self, value: &str, notifications: &mut Notifications) -> Option<f64> {
        let raw = parse_wire_f64(value)?;
        self.value
            .set((raw != 0.0).into(), ChangeOrigin::Network, notifications);
        Some(raw)
    }
}

impl NetworkFunction for FlagValue {
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

pub type IndicatorDimmableConfig = FlagValueConfig;

/// Lamp that also reports brightness as a 0-100 percentage.
#[derive(Debug)]
pub struct IndicatorDimmable {
    flag: FlagValue,
    brightness: ValueSlot,
}

impl IndicatorDimmable {
    /// # Errors
    ///
    /// Same as [`FlagValue::new`].
    pub fn new(config: IndicatorDimmableConfig) -> FunctionResult<Self> {
        let flag = FlagValue::new(config)?;
        let brightness = ValueSlot::new(
            flag.identity.sub_address("brightness"),
            BindingValueUnit::Percent,
            "Lamp brightness",
        );
        Ok(Self { flag, brightness })
    }
}

impl NetworkFunction for IndicatorDimmable {
    fn identity(&self) -> &FunctionIdentity {
        &self.flag.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        self.flag.data_elements()
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id != self.flag.element.id {
            return;
        }
        if let Some(raw) = self.flag.decode(value, notifications) {
            let percent = raw.clamp(0.0, 1.0) * 100.0;
            self.brightness
                .set(percent.into(), ChangeOrigin::Network, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.flag.reset(notifications);
        self.brightness.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        let mut values = self.flag.values();
        values.push((
            self.brightness.descriptor().clone(),
            self.brightness.get().clone(),
        ));
        values
    }
}
