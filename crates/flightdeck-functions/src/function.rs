//! The network function contract shared by every control type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingAddress, BindingValue, BindingValueUnit,
    TriggerDescriptor, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, Notifications};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};

/// Who a function is: the device it belongs to and its name on that device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionIdentity {
    pub device: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FunctionIdentity {
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// `device.name`, used for ordering and lookup.
    pub fn local_key(&self) -> String {
        format!("{}.{}", self.device, self.name)
    }

    /// Address of the function itself (its primary value).
    pub fn address(&self) -> BindingAddress {
        BindingAddress::new(&self.device, &self.name)
    }

    pub fn sub_address(&self, sub: impl Into<String>) -> BindingAddress {
        self.address().with_sub(sub)
    }

    pub fn action(
        &self,
        kind: ActionKind,
        parameter_unit: Option<BindingValueUnit>,
        description: impl Into<String>,
    ) -> ActionDescriptor {
        ActionDescriptor {
            address: self.sub_address(kind.name()),
            kind,
            parameter_unit,
            description: description.into(),
        }
    }

    pub fn trigger(&self, sub: &str, description: impl Into<String>) -> TriggerDescriptor {
        TriggerDescriptor {
            address: self.sub_address(sub),
            description: description.into(),
        }
    }

    /// Rejects blank names, which would produce unusable binding addresses.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::InvalidConfiguration`] for a blank device or name.
    pub fn validate(&self) -> FunctionResult<()> {
        if self.device.trim().is_empty() || self.name.trim().is_empty() {
            return Err(FunctionError::invalid(
                self.local_key(),
                "device and name must not be blank",
            ));
        }
        if self.device.contains('.') || self.name.contains('.') {
            return Err(FunctionError::invalid(
                self.local_key(),
                "device and name must not contain '.'",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.device, self.name)
    }
}

/// Binding between wire elements and the automation surface.
///
/// Implementations must keep [`NetworkFunction::data_elements`] pure: it is
/// called repeatedly to regenerate the protocol contract. Decoding must
/// tolerate malformed input by keeping the previous state, and invoking an
/// action with a bad parameter must be ignored rather than panic.
pub trait NetworkFunction: Send + fmt::Debug {
    fn identity(&self) -> &FunctionIdentity;

    /// Protocol slots this function consumes or emits, primary first.
    fn data_elements(&self) -> Vec<DataElement>;

    /// Decodes one inbound `(id, value)` pair for an owned element.
    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications);

    /// Returns every value to unknown and re-arms sequencing state.
    fn reset(&mut self, notifications: &mut Notifications);

    /// Current values with their descriptors.
    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)>;

    fn triggers(&self) -> Vec<TriggerDescriptor> {
        Vec::new()
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        Vec::new()
    }

    /// Runs an action, composing wire commands into the context outbox.
    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        let _ = (parameter, context);
        ActionOutcome::ignored(format!(
            "{} does not support '{action}'",
            self.identity()
        ))
    }

    /// Id of the first data element; drives the canonical order.
    fn primary_element_id(&self) -> Option<String> {
        self.data_elements().into_iter().next().map(|e| e.id)
    }

    fn local_key(&self) -> String {
        self.identity().local_key()
    }
}
