//! Text displays (scratchpads, UFC windows, radio readouts).

use serde::{Deserialize, Serialize};

use crate::binding::{BindingValue, BindingValueUnit, ValueDescriptor};
use crate::context::{ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::require_element;

/// Line separator used by the exporter, since the framing reserves newlines.
const LINE_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub element: DataElement,
}

#[derive(Debug)]
pub struct Text {
    identity: FunctionIdentity,
    element: DataElement,
    value: ValueSlot,
}

impl Text {
    /// # Errors
    ///
    /// Fails for blank names or element id.
    pub fn new(config: TextConfig) -> FunctionResult<Self> {
        let TextConfig { identity, element } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        let value = ValueSlot::new(identity.address(), BindingValueUnit::Text, "Displayed text");
        Ok(Self {
            identity,
            element,
            value,
        })
    }
}

impl NetworkFunction for Text {
    fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id == self.element.id {
            let text = value.replace(LINE_SEPARATOR, "\n");
            self.value
                .set(text.into(), ChangeOrigin::Network, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }
}
