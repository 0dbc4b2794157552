//! Push buttons, momentary or latching.

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, TriggerDescriptor,
    ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::FunctionResult;
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{describe, require_element, require_text};
use crate::wire::{WireCommand, WireScalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushButtonType {
    /// Held while pushed, released explicitly.
    #[default]
    Momentary,
    /// Each push flips the latched state.
    Toggle,
}

fn default_push_value() -> WireScalar {
    WireScalar::new("1")
}

fn default_release_value() -> WireScalar {
    WireScalar::new("0")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushButtonConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    pub action_id: String,
    #[serde(default = "default_push_value")]
    pub push_value: WireScalar,
    #[serde(default = "default_release_value")]
    pub release_value: WireScalar,
    #[serde(default)]
    pub button_type: PushButtonType,
}

#[derive(Debug)]
pub struct PushButton {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    action_id: String,
    push_value: WireScalar,
    release_value: WireScalar,
    button_type: PushButtonType,
    pushed: Option<bool>,
    value: ValueSlot,
}

impl PushButton {
    /// # Errors
    ///
    /// Fails for blank names or ids.
    pub fn new(config: PushButtonConfig) -> FunctionResult<Self> {
        let PushButtonConfig {
            identity,
            device_id,
            element,
            action_id,
            push_value,
            release_value,
            button_type,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        require_text(&identity, "action_id", &action_id)?;
        let value = ValueSlot::new(
            identity.address(),
            BindingValueUnit::Boolean,
            "Button is pushed",
        );
        Ok(Self {
            identity,
            device_id,
            element,
            action_id,
            push_value,
            release_value,
            button_type,
            pushed: None,
            value,
        })
    }

    pub fn is_pushed(&self) -> Option<bool> {
        self.pushed
    }

    fn update(&mut self, pushed: bool, origin: ChangeOrigin, notifications: &mut Notifications) {
        let changed = self.value.set(pushed.into(), origin, notifications);
        self.pushed = Some(pushed);
        if changed {
            let sub = if pushed { "pushed" } else { "released" };
            notifications.fire(self.identity.sub_address(sub), pushed.into());
        }
    }

    fn send(&mut self, pushed: bool, context: &mut ActionContext<'_>) -> ActionOutcome {
        let wire = if pushed {
            &self.push_value
        } else {
            &self.release_value
        };
        context.outbox.send(WireCommand::new(
            &self.device_id,
            &self.action_id,
            wire.as_str(),
        ));
        self.update(pushed, ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }
}

impl NetworkFunction for PushButton {
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
        // Anything that parses but is not the push value reads as released.
        let inbound = WireScalar::new(value);
        let pushed = self.push_value.matches(&inbound);
        if !pushed && inbound.number().is_none() && !self.release_value.matches(&inbound) {
            return;
        }
        self.update(pushed, ChangeOrigin::Network, notifications);
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.pushed = None;
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }

    fn triggers(&self) -> Vec<TriggerDescriptor> {
        vec![
            self.identity.trigger("pushed", "Fired when the button is pushed"),
            self.identity.trigger("released", "Fired when the button is released"),
        ]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        let mut actions = vec![
            self.identity
                .action(ActionKind::Push, None, describe(&self.identity, "Push")),
            self.identity.action(
                ActionKind::Set,
                Some(BindingValueUnit::Boolean),
                describe(&self.identity, "Set"),
            ),
        ];
        if self.button_type == PushButtonType::Momentary {
            actions.push(self.identity.action(
                ActionKind::Release,
                None,
                describe(&self.identity, "Release"),
            ));
        }
        actions
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match (action, self.button_type) {
            (ActionKind::Push, PushButtonType::Momentary) => self.send(true, context),
            (ActionKind::Push, PushButtonType::Toggle) => {
                let next = !self.pushed.unwrap_or(false);
                self.send(next, context)
            }
            (ActionKind::Release, PushButtonType::Momentary) => self.send(false, context),
            (ActionKind::Set, _) => match parameter.as_bool() {
                Some(pushed) => self.send(pushed, context),
                None => ActionOutcome::ignored(format!(
                    "{} cannot be set to '{parameter}'",
                    self.identity
                )),
            },
            (other, _) => {
                ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity))
            }
        }
    }
}
