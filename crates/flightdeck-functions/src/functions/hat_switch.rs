//! Five-way hat: center plus four directions, each its own button.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{describe, require_element, require_text};
use crate::wire::{WireCommand, WireScalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatPosition {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl HatPosition {
    pub const ALL: [HatPosition; 5] = [
        HatPosition::Center,
        HatPosition::Up,
        HatPosition::Down,
        HatPosition::Left,
        HatPosition::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HatPosition::Center => "center",
            HatPosition::Up => "up",
            HatPosition::Down => "down",
            HatPosition::Left => "left",
            HatPosition::Right => "right",
        }
    }
}

impl fmt::Display for HatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HatPosition {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HatPosition::ALL
            .into_iter()
            .find(|p| p.name() == wanted || (wanted == "centre" && *p == HatPosition::Center))
            .ok_or_else(|| FunctionError::InvalidAddress(s.to_string()))
    }
}

/// Wire command for one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatCommand {
    pub action_id: String,
    pub value: WireScalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatSwitchConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    pub up: HatCommand,
    pub down: HatCommand,
    pub left: HatCommand,
    pub right: HatCommand,
    /// Sent on the held direction's action when returning to center, and
    /// reported by the simulator while centered.
    pub center_value: WireScalar,
}

#[derive(Debug)]
pub struct HatSwitch {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    up: HatCommand,
    down: HatCommand,
    left: HatCommand,
    right: HatCommand,
    center_value: WireScalar,
    /// Inbound value to position; first entry wins when values repeat.
    reverse: Vec<(WireScalar, HatPosition)>,
    position: Option<HatPosition>,
    value: ValueSlot,
}

impl HatSwitch {
    /// # Errors
    ///
    /// Fails for blank names, ids or direction action ids.
    pub fn new(config: HatSwitchConfig) -> FunctionResult<Self> {
        let HatSwitchConfig {
            identity,
            device_id,
            element,
            up,
            down,
            left,
            right,
            center_value,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        for (field, command) in [("up", &up), ("down", &down), ("left", &left), ("right", &right)] {
            require_text(&identity, field, &command.action_id)?;
        }

        let reverse = vec![
            (center_value.clone(), HatPosition::Center),
            (up.value.clone(), HatPosition::Up),
            (down.value.clone(), HatPosition::Down),
            (left.value.clone(), HatPosition::Left),
            (right.value.clone(), HatPosition::Right),
        ];
        let value = ValueSlot::new(
            identity.address(),
            BindingValueUnit::Text,
            "Current hat position",
        );
        Ok(Self {
            identity,
            device_id,
            element,
            up,
            down,
            left,
            right,
            center_value,
            reverse,
            position: None,
            value,
        })
    }

    pub fn position(&self) -> Option<HatPosition> {
        self.position
    }

    fn command(&self, position: HatPosition) -> Option<&HatCommand> {
        match position {
            HatPosition::Center => None,
            HatPosition::Up => Some(&self.up),
            HatPosition::Down => Some(&self.down),
            HatPosition::Left => Some(&self.left),
            HatPosition::Right => Some(&self.right),
        }
    }

    fn move_to(&mut self, target: HatPosition, context: &mut ActionContext<'_>) -> ActionOutcome {
        match self.command(target) {
            Some(command) => context.outbox.send(WireCommand::new(
                &self.device_id,
                &command.action_id,
                command.value.as_str(),
            )),
            None => {
                if let Some(held) = self.position.and_then(|p| self.command(p)) {
                    context.outbox.send(WireCommand::new(
                        &self.device_id,
                        &held.action_id,
                        self.center_value.as_str(),
                    ));
                }
            }
        }
        self.position = Some(target);
        self.value
            .set(target.name().into(), ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }
}

impl NetworkFunction for HatSwitch {
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
        let Some(position) = self
            .reverse
            .iter()
            .find(|(wire, _)| wire.matches(&inbound))
            .map(|(_, position)| *position)
        else {
            return;
        };
        self.position = Some(position);
        self.value
            .set(position.name().into(), ChangeOrigin::Network, notifications);
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.position = None;
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            self.identity.action(
                ActionKind::Set,
                Some(BindingValueUnit::Text),
                describe(&self.identity, "Set position of"),
            ),
            self.identity.action(
                ActionKind::Release,
                None,
                describe(&self.identity, "Center"),
            ),
        ]
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::Set => {
                let parsed = parameter
                    .as_text()
                    .and_then(|text| text.parse::<HatPosition>().ok());
                match parsed {
                    Some(target) => self.move_to(target, context),
                    None => ActionOutcome::ignored(format!(
                        "{} has no position '{parameter}'",
                        self.identity
                    )),
                }
            }
            ActionKind::Release => self.move_to(HatPosition::Center, context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Outbox;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn trim_hat() -> FunctionResult<HatSwitch> {
        let command = |action: &str, value: &str| HatCommand {
            action_id: action.to_string(),
            value: value.into(),
        };
        HatSwitch::new(HatSwitchConfig {
            identity: FunctionIdentity::new("Stick", "Trim"),
            device_id: "17".to_string(),
            element: DataElement::new("600"),
            up: command("3001", "1"),
            down: command("3002", "2"),
            left: command("3003", "3"),
            right: command("3004", "4"),
            center_value: "0".into(),
        })
    }

    fn act(hat: &mut HatSwitch, action: ActionKind, parameter: BindingValue) -> (ActionOutcome, Vec<String>) {
        let mut notes = Notifications::new();
        let mut outbox = Outbox::new();
        let outcome = {
            let mut ctx = ActionContext::new(&mut notes, &mut outbox);
            hat.execute(action, &parameter, &mut ctx)
        };
        (outcome, outbox.lines())
    }

    #[test]
    fn test_direction_then_release() -> TestResult {
        let mut hat = trim_hat()?;
        let (outcome, lines) = act(&mut hat, ActionKind::Set, "Left".into());
        assert!(outcome.is_executed());
        assert_eq!(lines, vec!["C17,3003,3"]);

        let (_, lines) = act(&mut hat, ActionKind::Release, BindingValue::Empty);
        assert_eq!(lines, vec!["C17,3003,0"]);
        assert_eq!(hat.position(), Some(HatPosition::Center));
        Ok(())
    }

    #[test]
    fn test_invalid_name_is_ignored() -> TestResult {
        let mut hat = trim_hat()?;
        act(&mut hat, ActionKind::Set, "up".into());
        let (outcome, lines) = act(&mut hat, ActionKind::Set, "diagonal".into());
        assert!(!outcome.is_executed());
        assert!(lines.is_empty());
        assert_eq!(hat.position(), Some(HatPosition::Up));

        let (outcome, _) = act(&mut hat, ActionKind::Set, BindingValue::Empty);
        assert!(!outcome.is_executed());
        Ok(())
    }

    #[test]
    fn test_decode_reverse_map() -> TestResult {
        let mut hat = trim_hat()?;
        let mut notes = Notifications::new();
        hat.process_network_data("600", "4", &mut notes);
        assert_eq!(hat.position(), Some(HatPosition::Right));
        hat.process_network_data("600", "9", &mut notes);
        assert_eq!(hat.position(), Some(HatPosition::Right));
        hat.process_network_data("600", "0.0", &mut notes);
        assert_eq!(hat.position(), Some(HatPosition::Center));
        assert_eq!(
            hat.values().first().map(|(_, v)| v.clone()),
            Some(BindingValue::from("center"))
        );
        Ok(())
    }
}
