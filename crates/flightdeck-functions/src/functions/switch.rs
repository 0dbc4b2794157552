//! N-position discrete switch.
//!
//! Inbound data selects the position whose argument matches the wire value.
//! Outbound, a position change sends the target position's argument, after
//! first sending the exit value of the position being left when one is
//! configured. Switches in incremental-pulse mode instead send a relative
//! nudge followed by a neutral command, which is how rotary controls without
//! absolute arguments are driven.

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{describe, require_element, require_finite, require_text};
use crate::wire::{WireCommand, WireScalar};

/// One detent of a switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchPosition {
    /// Wire value reported and sent for this position.
    pub arg_value: WireScalar,
    pub name: String,
    /// Overrides the switch-level action id for this position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    /// Command sent on release while this position is held (spring-loaded positions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_action_value: Option<String>,
    /// Value sent with this position's action when the switch leaves it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_value: Option<String>,
}

impl SwitchPosition {
    pub fn new(arg_value: impl Into<WireScalar>, name: impl Into<String>) -> Self {
        Self {
            arg_value: arg_value.into(),
            name: name.into(),
            action_id: None,
            stop_action_id: None,
            stop_action_value: None,
            exit_value: None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    #[must_use]
    pub fn with_stop(mut self, action_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.stop_action_id = Some(action_id.into());
        self.stop_action_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_exit(mut self, value: impl Into<String>) -> Self {
        self.exit_value = Some(value.into());
        self
    }
}

/// Relative nudge used instead of absolute arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    pub action_id: String,
    /// Magnitude of one nudge; increments send `+step`, decrements `-step`.
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    /// Action id used by positions that do not name their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    pub positions: Vec<SwitchPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<PulseConfig>,
}

/// Direction of an incremental pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseDirection {
    Increment,
    Decrement,
}

impl PulseDirection {
    /// Direction for moving from `last` to `target` among `count` detents.
    ///
    /// An unknown last position sorts before index 0, so any move from it is
    /// an increment. With more than two detents the first/last boundary is
    /// treated as a wrap: last→first is an increment and first→last a
    /// decrement. Two-detent switches compare indices plainly because both
    /// moves would otherwise be wraps. Returns `None` when nothing moves.
    pub fn between(last: Option<usize>, target: usize, count: usize) -> Option<Self> {
        let Some(last) = last else {
            return Some(PulseDirection::Increment);
        };
        if last == target {
            return None;
        }
        if count > 2 {
            let end = count - 1;
            if last == end && target == 0 {
                return Some(PulseDirection::Increment);
            }
            if last == 0 && target == end {
                return Some(PulseDirection::Decrement);
            }
        }
        if target > last {
            Some(PulseDirection::Increment)
        } else {
            Some(PulseDirection::Decrement)
        }
    }
}

#[derive(Debug)]
pub struct Switch {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    action_id: Option<String>,
    positions: Vec<SwitchPosition>,
    pulse: Option<PulseConfig>,
    /// Position last reported by the simulator or set locally.
    current: Option<usize>,
    /// Position last requested by an action; sequencing for pulses.
    last_set: Option<usize>,
    value: ValueSlot,
}

impl Switch {
    /// Builds a switch from its configuration record.
    ///
    /// # Errors
    ///
    /// Fails for blank names or ids, an empty position list, or a pulse
    /// step that is not a positive finite number.
    pub fn new(config: SwitchConfig) -> FunctionResult<Self> {
        let SwitchConfig {
            identity,
            device_id,
            element,
            action_id,
            positions,
            pulse,
        } = config;

        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        if positions.is_empty() {
            return Err(FunctionError::invalid(
                identity.local_key(),
                "a switch needs at least one position",
            ));
        }
        if let Some(pulse) = &pulse {
            require_text(&identity, "pulse.action_id", &pulse.action_id)?;
            require_finite(&identity, "pulse.step", pulse.step)?;
            if pulse.step <= 0.0 {
                return Err(FunctionError::invalid(
                    identity.local_key(),
                    "pulse.step must be positive",
                ));
            }
        }

        let value = ValueSlot::new(
            identity.address(),
            BindingValueUnit::Position,
            "Current position of the switch (1-based)",
        );

        Ok(Self {
            identity,
            device_id,
            element,
            action_id,
            positions,
            pulse,
            current: None,
            last_set: None,
            value,
        })
    }

    pub fn positions(&self) -> &[SwitchPosition] {
        &self.positions
    }

    /// 0-based position, `None` while unknown.
    pub fn position(&self) -> Option<usize> {
        self.current
    }

    pub fn last_set_position(&self) -> Option<usize> {
        self.last_set
    }

    pub fn is_pulsed(&self) -> bool {
        self.pulse.is_some()
    }

    pub(crate) fn element(&self) -> &DataElement {
        &self.element
    }

    pub(crate) fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Maps an action parameter onto a 0-based index.
    ///
    /// Numbers are 1-based positions; text that is not a number is matched
    /// against position names, ignoring case.
    pub fn resolve_position(&self, parameter: &BindingValue) -> Option<usize> {
        if let BindingValue::Text(text) = parameter
            && crate::wire::parse_wire_f64(text).is_none()
        {
            let wanted = text.trim();
            return self
                .positions
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(wanted));
        }

        let number = match parameter {
            BindingValue::Double(_) | BindingValue::Text(_) => parameter.as_f64()?,
            BindingValue::Bool(_) | BindingValue::Empty => return None,
        };
        if number.fract() != 0.0 || number < 1.0 || number > self.positions.len() as f64 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "checked integral and within 1..=len above"
        )]
        let one_based = number as usize;
        Some(one_based - 1)
    }

    pub(crate) fn decode(&mut self, value: &str, notifications: &mut Notifications) {
        let inbound = WireScalar::new(value);
        let Some(index) = self
            .positions
            .iter()
            .position(|p| p.arg_value.matches(&inbound))
        else {
            return;
        };
        self.current = Some(index);
        self.value.set(
            position_value(index),
            ChangeOrigin::Network,
            notifications,
        );
    }

    /// Moves the switch to `index`, composing the wire commands.
    pub(crate) fn set_position(&mut self, index: usize, context: &mut ActionContext<'_>) -> ActionOutcome {
        let Some(target) = self.positions.get(index) else {
            return ActionOutcome::ignored(format!(
                "{} has no position {}",
                self.identity,
                index + 1
            ));
        };

        match &self.pulse {
            Some(pulse) => {
                let from = self.last_set.or(self.current);
                let Some(direction) = PulseDirection::between(from, index, self.positions.len())
                else {
                    return ActionOutcome::Executed;
                };
                let precision = self.element.precision();
                let step = match direction {
                    PulseDirection::Increment => pulse.step,
                    PulseDirection::Decrement => -pulse.step,
                };
                context.outbox.send(WireCommand::numeric(
                    &self.device_id,
                    &pulse.action_id,
                    step,
                    precision,
                ));
                context.outbox.send(WireCommand::numeric(
                    &self.device_id,
                    &pulse.action_id,
                    0.0,
                    precision,
                ));
            }
            None => {
                if let Some(leaving) = self.current.filter(|&c| c != index)
                    && let Some(previous) = self.positions.get(leaving)
                    && let Some(exit) = &previous.exit_value
                    && let Some(action) = previous.action_id.as_ref().or(self.action_id.as_ref())
                {
                    context
                        .outbox
                        .send(WireCommand::new(&self.device_id, action, exit));
                }
                if let Some(action) = target.action_id.as_ref().or(self.action_id.as_ref()) {
                    context.outbox.send(WireCommand::new(
                        &self.device_id,
                        action,
                        target.arg_value.as_str(),
                    ));
                }
            }
        }

        self.last_set = Some(index);
        self.current = Some(index);
        self.value
            .set(position_value(index), ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }

    fn step(&mut self, forward: bool, context: &mut ActionContext<'_>) -> ActionOutcome {
        let Some(current) = self.current.or(self.last_set) else {
            return ActionOutcome::ignored(format!("{} position is unknown", self.identity));
        };
        let target = if forward {
            current + 1
        } else if let Some(previous) = current.checked_sub(1) {
            previous
        } else {
            return ActionOutcome::ignored(format!("{} is at its first position", self.identity));
        };
        if target >= self.positions.len() {
            return ActionOutcome::ignored(format!("{} is at its last position", self.identity));
        }
        self.set_position(target, context)
    }

    /// Sends the stop command of the held position, if it has one.
    pub(crate) fn release(&mut self, context: &mut ActionContext<'_>) -> ActionOutcome {
        let held = self.last_set.or(self.current);
        let Some(position) = held.and_then(|i| self.positions.get(i)) else {
            return ActionOutcome::ignored(format!("{} has no held position", self.identity));
        };
        let Some(stop_action) = &position.stop_action_id else {
            return ActionOutcome::ignored(format!(
                "{} position '{}' has no stop action",
                self.identity, position.name
            ));
        };
        let stop_value = position.stop_action_value.as_deref().unwrap_or("0");
        context
            .outbox
            .send(WireCommand::new(&self.device_id, stop_action, stop_value));
        ActionOutcome::Executed
    }

    pub(crate) fn clear(&mut self, notifications: &mut Notifications) {
        self.current = None;
        self.last_set = None;
        self.value.clear(notifications);
    }

    pub(crate) fn value_entry(&self) -> (ValueDescriptor, BindingValue) {
        (self.value.descriptor().clone(), self.value.get().clone())
    }

    pub(crate) fn action_list(&self) -> Vec<ActionDescriptor> {
        let mut actions = vec![
            self.identity.action(
                ActionKind::Set,
                Some(BindingValueUnit::Position),
                describe(&self.identity, "Set position of"),
            ),
            self.identity
                .action(ActionKind::Increment, None, describe(&self.identity, "Advance")),
            self.identity
                .action(ActionKind::Decrement, None, describe(&self.identity, "Retard")),
        ];
        if self.positions.iter().any(|p| p.stop_action_id.is_some()) {
            actions.push(self.identity.action(
                ActionKind::Release,
                None,
                describe(&self.identity, "Release"),
            ));
        }
        actions
    }

    pub(crate) fn run(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::Set => match self.resolve_position(parameter) {
                Some(index) => self.set_position(index, context),
                None => ActionOutcome::ignored(format!(
                    "{} cannot set position '{parameter}'",
                    self.identity
                )),
            },
            ActionKind::Increment => self.step(true, context),
            ActionKind::Decrement => self.step(false, context),
            ActionKind::Release => self.release(context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}

fn position_value(index: usize) -> BindingValue {
    #[expect(clippy::cast_precision_loss, reason = "position counts are tiny")]
    let one_based = (index + 1) as f64;
    BindingValue::Double(one_based)
}

impl NetworkFunction for Switch {
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
        self.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![self.value_entry()]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        self.action_list()
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        self.run(action, parameter, context)
    }
}
