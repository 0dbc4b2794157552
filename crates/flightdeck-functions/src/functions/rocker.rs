//! Two-button spring-loaded rocker.
//!
//! The exposed value is the rocker position: 1 up, 2 centered, 3 down.

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{describe, require_element, require_text};
use crate::wire::{WireCommand, WireScalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RockerDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RockerPosition {
    Up,
    Center,
    Down,
}

impl RockerPosition {
    pub fn number(self) -> f64 {
        match self {
            RockerPosition::Up => 1.0,
            RockerPosition::Center => 2.0,
            RockerPosition::Down => 3.0,
        }
    }
}

impl From<RockerDirection> for RockerPosition {
    fn from(direction: RockerDirection) -> Self {
        match direction {
            RockerDirection::Up => RockerPosition::Up,
            RockerDirection::Down => RockerPosition::Down,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualRockerConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    pub up_action_id: String,
    pub up_value: WireScalar,
    pub down_action_id: String,
    pub down_value: WireScalar,
    /// Shared by both buttons.
    pub release_value: WireScalar,
}

#[derive(Debug)]
pub struct DualRocker {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    up_action_id: String,
    up_value: WireScalar,
    down_action_id: String,
    down_value: WireScalar,
    release_value: WireScalar,
    /// Button last pushed by an action, released on `release`.
    held: Option<RockerDirection>,
    position: Option<RockerPosition>,
    value: ValueSlot,
}

impl DualRocker {
    /// # Errors
    ///
    /// Fails for blank names or ids.
    pub fn new(config: DualRockerConfig) -> FunctionResult<Self> {
        let DualRockerConfig {
            identity,
            device_id,
            element,
            up_action_id,
            up_value,
            down_action_id,
            down_value,
            release_value,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        require_text(&identity, "up_action_id", &up_action_id)?;
        require_text(&identity, "down_action_id", &down_action_id)?;
        let value = ValueSlot::new(
            identity.address(),
            BindingValueUnit::Position,
            "Rocker position (1 up, 2 center, 3 down)",
        );
        Ok(Self {
            identity,
            device_id,
            element,
            up_action_id,
            up_value,
            down_action_id,
            down_value,
            release_value,
            held: None,
            position: None,
            value,
        })
    }

    pub fn position(&self) -> Option<RockerPosition> {
        self.position
    }

    fn action_id(&self, direction: RockerDirection) -> &str {
        match direction {
            RockerDirection::Up => &self.up_action_id,
            RockerDirection::Down => &self.down_action_id,
        }
    }

    fn push(&mut self, direction: RockerDirection, context: &mut ActionContext<'_>) -> ActionOutcome {
        let wire = match direction {
            RockerDirection::Up => &self.up_value,
            RockerDirection::Down => &self.down_value,
        };
        context.outbox.send(WireCommand::new(
            &self.device_id,
            self.action_id(direction),
            wire.as_str(),
        ));
        self.held = Some(direction);
        self.store(direction.into(), ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }

    fn release(&mut self, context: &mut ActionContext<'_>) -> ActionOutcome {
        let Some(direction) = self.held.take() else {
            return ActionOutcome::ignored(format!("{} is not held", self.identity));
        };
        context.outbox.send(WireCommand::new(
            &self.device_id,
            self.action_id(direction),
            self.release_value.as_str(),
        ));
        self.store(RockerPosition::Center, ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }

    fn store(&mut self, position: RockerPosition, origin: ChangeOrigin, notifications: &mut Notifications) {
        self.position = Some(position);
        self.value.set(position.number().into(), origin, notifications);
    }
}

impl NetworkFunction for DualRocker {
    fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id != self.element.id {
            return;
        }
        let inbound = WireScalar::new(value);
        let position = if self.up_value.matches(&inbound) {
            RockerPosition::Up
        } else if self.down_value.matches(&inbound) {
            RockerPosition::Down
        } else if self.release_value.matches(&inbound) {
            RockerPosition::Center
        } else {
            return;
        };
        self.store(position, ChangeOrigin::Network, notifications);
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.held = None;
        self.position = None;
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            self.identity
                .action(ActionKind::PushUp, None, describe(&self.identity, "Push up")),
            self.identity
                .action(ActionKind::PushDown, None, describe(&self.identity, "Push down")),
            self.identity
                .action(ActionKind::Release, None, describe(&self.identity, "Release")),
        ]
    }

    fn execute(
        &mut self,
        action: ActionKind,
        _parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::PushUp => self.push(RockerDirection::Up, context),
            ActionKind::PushDown => self.push(RockerDirection::Down, context),
            ActionKind::Release => self.release(context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}
