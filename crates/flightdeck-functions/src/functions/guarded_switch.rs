//! Switch under a protective cover.

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
use crate::functions::switch::{Switch, SwitchConfig};
use crate::functions::{describe, require_element, require_text};
use crate::wire::{WireCommand, WireScalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPosition {
    Up,
    Down,
}

impl GuardPosition {
    pub fn is_up(self) -> bool {
        self == GuardPosition::Up
    }

    pub fn toggled(self) -> Self {
        match self {
            GuardPosition::Up => GuardPosition::Down,
            GuardPosition::Down => GuardPosition::Up,
        }
    }
}

impl fmt::Display for GuardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuardPosition::Up => "up",
            GuardPosition::Down => "down",
        })
    }
}

impl FromStr for GuardPosition {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "open" => Ok(GuardPosition::Up),
            "down" | "closed" => Ok(GuardPosition::Down),
            _ => Err(FunctionError::InvalidAddress(s.to_string())),
        }
    }
}

/// The cover: its own element, action and the two wire values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    pub element: DataElement,
    pub action_id: String,
    pub up_value: WireScalar,
    pub down_value: WireScalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardedSwitchConfig {
    #[serde(flatten)]
    pub switch: SwitchConfig,
    pub guard: GuardConfig,
}

#[derive(Debug)]
pub struct GuardedSwitch {
    switch: Switch,
    guard: GuardConfig,
    position: Option<GuardPosition>,
    value: ValueSlot,
}

impl GuardedSwitch {
    /// # Errors
    ///
    /// Fails when the inner switch is invalid, the guard action is blank, or
    /// the guard shares the switch's element.
    pub fn new(config: GuardedSwitchConfig) -> FunctionResult<Self> {
        let GuardedSwitchConfig { switch, guard } = config;
        let identity = switch.identity.clone();
        require_element(&identity, &guard.element)?;
        require_text(&identity, "guard.action_id", &guard.action_id)?;
        if guard.element.id == switch.element.id {
            return Err(FunctionError::RepeatedElementId {
                function: identity.local_key(),
                id: guard.element.id.clone(),
            });
        }

        let switch = Switch::new(switch)?;
        let value = ValueSlot::new(
            switch.identity().sub_address("guard"),
            BindingValueUnit::Boolean,
            "Guard is up (open)",
        );
        Ok(Self {
            switch,
            guard,
            position: None,
            value,
        })
    }

    pub fn guard_position(&self) -> Option<GuardPosition> {
        self.position
    }

    pub fn switch(&self) -> &Switch {
        &self.switch
    }

    fn decode_guard(&mut self, value: &str, notifications: &mut Notifications) {
        let position = if self.guard.up_value.matches_str(value) {
            GuardPosition::Up
        } else if self.guard.down_value.matches_str(value) {
            GuardPosition::Down
        } else {
            return;
        };
        self.position = Some(position);
        self.value
            .set(position.is_up().into(), ChangeOrigin::Network, notifications);
    }

    fn move_guard(&mut self, position: GuardPosition, context: &mut ActionContext<'_>) {
        let wire = match position {
            GuardPosition::Up => &self.guard.up_value,
            GuardPosition::Down => &self.guard.down_value,
        };
        context.outbox.send(WireCommand::new(
            self.switch.device_id(),
            &self.guard.action_id,
            wire.as_str(),
        ));
        self.position = Some(position);
        self.value
            .set(position.is_up().into(), ChangeOrigin::Action, context.notifications);
    }

    fn resolve_guard(parameter: &BindingValue) -> Option<GuardPosition> {
        if let BindingValue::Text(text) = parameter
            && let Ok(position) = text.parse::<GuardPosition>()
        {
            return Some(position);
        }
        parameter.as_bool().map(|up| {
            if up {
                GuardPosition::Up
            } else {
                GuardPosition::Down
            }
        })
    }

    fn autoguard_set(
        &mut self,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        let Some(index) = self.switch.resolve_position(parameter) else {
            return ActionOutcome::ignored(format!(
                "{} cannot set position '{parameter}'",
                self.switch.identity()
            ));
        };
        // Unknown guard state is treated as closed.
        if self.position != Some(GuardPosition::Up) {
            self.move_guard(GuardPosition::Up, context);
        }
        self.switch.set_position(index, context)
    }
}

impl NetworkFunction for GuardedSwitch {
    fn identity(&self) -> &FunctionIdentity {
        self.switch.identity()
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.switch.element().clone(), self.guard.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id == self.guard.element.id {
            self.decode_guard(value, notifications);
        } else if id == self.switch.element().id {
            self.switch.decode(value, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.switch.clear(notifications);
        self.position = None;
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![
            self.switch.value_entry(),
            (self.value.descriptor().clone(), self.value.get().clone()),
        ]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        let identity = self.switch.identity();
        let mut actions = self.switch.action_list();
        actions.extend([
            identity.action(
                ActionKind::AutoguardSet,
                Some(BindingValueUnit::Position),
                describe(identity, "Open guard and set"),
            ),
            identity.action(
                ActionKind::SetGuard,
                Some(BindingValueUnit::Boolean),
                describe(identity, "Set guard of"),
            ),
            identity.action(
                ActionKind::ToggleGuard,
                None,
                describe(identity, "Toggle guard of"),
            ),
        ]);
        actions
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::AutoguardSet => self.autoguard_set(parameter, context),
            ActionKind::SetGuard => match Self::resolve_guard(parameter) {
                Some(position) => {
                    self.move_guard(position, context);
                    ActionOutcome::Executed
                }
                None => ActionOutcome::ignored(format!(
                    "{} cannot set guard to '{parameter}'",
                    self.switch.identity()
                )),
            },
            ActionKind::ToggleGuard => {
                // Unknown guard state is treated as closed.
                let next = self.position.unwrap_or(GuardPosition::Down).toggled();
                self.move_guard(next, context);
                ActionOutcome::Executed
            }
            other => self.switch.run(other, parameter, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Outbox;
    use crate::functions::switch::SwitchPosition;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn master_arm() -> FunctionResult<GuardedSwitch> {
        GuardedSwitch::new(GuardedSwitchConfig {
            switch: SwitchConfig {
                identity: FunctionIdentity::new("Armament", "Master Arm"),
                device_id: "12".to_string(),
                element: DataElement::new("509"),
                action_id: Some("3001".to_string()),
                positions: vec![
                    SwitchPosition::new("1", "Arm"),
                    SwitchPosition::new("0", "Safe"),
                ],
                pulse: None,
            },
            guard: GuardConfig {
                element: DataElement::new("508"),
                action_id: "3002".to_string(),
                up_value: "1".into(),
                down_value: "0".into(),
            },
        })
    }

    fn act(
        function: &mut GuardedSwitch,
        action: ActionKind,
        parameter: BindingValue,
    ) -> (ActionOutcome, Vec<String>) {
        let mut notes = Notifications::new();
        let mut outbox = Outbox::new();
        let outcome = {
            let mut ctx = ActionContext::new(&mut notes, &mut outbox);
            function.execute(action, &parameter, &mut ctx)
        };
        (outcome, outbox.lines())
    }

    #[test]
    fn test_autoguard_opens_cover_first() -> TestResult {
        let mut function = master_arm()?;
        let mut notes = Notifications::new();
        function.process_network_data("508", "0", &mut notes);
        assert_eq!(function.guard_position(), Some(GuardPosition::Down));

        let (outcome, lines) = act(&mut function, ActionKind::AutoguardSet, "Arm".into());
        assert!(outcome.is_executed());
        assert_eq!(lines, vec!["C12,3002,1", "C12,3001,1"]);
        assert_eq!(function.guard_position(), Some(GuardPosition::Up));

        let (_, lines) = act(&mut function, ActionKind::AutoguardSet, 2.0.into());
        assert_eq!(lines, vec!["C12,3001,0"]);
        Ok(())
    }

    #[test]
    fn test_autoguard_lifts_unknown_guard() -> TestResult {
        let mut function = master_arm()?;
        assert_eq!(function.guard_position(), None);
        let (outcome, lines) = act(&mut function, ActionKind::AutoguardSet, "Arm".into());
        assert!(outcome.is_executed());
        assert_eq!(lines, vec!["C12,3002,1", "C12,3001,1"]);
        Ok(())
    }

    #[test]
    fn test_guard_and_switch_decode_independently() -> TestResult {
        let mut function = master_arm()?;
        let mut notes = Notifications::new();
        function.process_network_data("509", "1.0", &mut notes);
        function.process_network_data("508", "1", &mut notes);
        function.process_network_data("508", "0.5", &mut notes);
        assert_eq!(function.switch().position(), Some(0));
        assert_eq!(function.guard_position(), Some(GuardPosition::Up));
        Ok(())
    }

    #[test]
    fn test_set_and_toggle_guard() -> TestResult {
        let mut function = master_arm()?;
        let (_, lines) = act(&mut function, ActionKind::ToggleGuard, BindingValue::Empty);
        assert_eq!(lines, vec!["C12,3002,1"]);
        let (_, lines) = act(&mut function, ActionKind::SetGuard, "down".into());
        assert_eq!(lines, vec!["C12,3002,0"]);
        let (outcome, lines) = act(&mut function, ActionKind::SetGuard, "sideways".into());
        assert!(!outcome.is_executed());
        assert!(lines.is_empty());
        Ok(())
    }

    #[test]
    fn test_reset_clears_guard() -> TestResult {
        let mut function = master_arm()?;
        let mut notes = Notifications::new();
        function.process_network_data("508", "1", &mut notes);
        function.reset(&mut notes);
        assert_eq!(function.guard_position(), None);
        assert!(function.values().iter().all(|(_, v)| v.is_empty()));
        Ok(())
    }

    #[test]
    fn test_rejects_shared_element() {
        let result = GuardedSwitch::new(GuardedSwitchConfig {
            switch: SwitchConfig {
                identity: FunctionIdentity::new("A", "B"),
                device_id: "1".to_string(),
                element: DataElement::new("7"),
                action_id: Some("1".to_string()),
                positions: vec![SwitchPosition::new("1", "On")],
                pulse: None,
            },
            guard: GuardConfig {
                element: DataElement::new("7"),
                action_id: "2".to_string(),
                up_value: "1".into(),
                down_value: "0".into(),
            },
        });
        assert!(matches!(
            result,
            Err(FunctionError::RepeatedElementId { .. })
        ));
    }
}
