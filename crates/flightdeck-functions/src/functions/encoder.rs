//! Relative-motion controls.
//!
//! Rotary and locked encoders send deltas and never track an absolute
//! position; the simulator echoes the resulting value back as ordinary data.
//! The absolute encoder keeps its own bounded value and sends that instead.

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::axis::{RangedValue, step_override, validate_step};
use crate::functions::{describe, require_element, require_text};
use crate::wire::{WireCommand, WireScalar, parse_wire_f64};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotaryEncoderConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    pub action_id: String,
    pub step: f64,
    #[serde(default)]
    pub unit: BindingValueUnit,
}

#[derive(Debug)]
pub struct RotaryEncoder {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    action_id: String,
    step: f64,
    value: ValueSlot,
}

impl RotaryEncoder {
    /// # Errors
    ///
    /// Fails for blank names or ids and a non-positive step.
    pub fn new(config: RotaryEncoderConfig) -> FunctionResult<Self> {
        let RotaryEncoderConfig {
            identity,
            device_id,
            element,
            action_id,
            step,
            unit,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        require_text(&identity, "action_id", &action_id)?;
        validate_step(&identity, step)?;
        let value = ValueSlot::new(identity.address(), unit, "Value reported by the simulator");
        Ok(Self {
            identity,
            device_id,
            element,
            action_id,
            step,
            value,
        })
    }

    fn turn(&self, sign: f64, parameter: &BindingValue, context: &mut ActionContext<'_>) -> ActionOutcome {
        let amount = step_override(parameter).unwrap_or(self.step);
        context.outbox.send(WireCommand::numeric(
            &self.device_id,
            &self.action_id,
            sign * amount,
            self.element.precision(),
        ));
        ActionOutcome::Executed
    }

    fn decode(&mut self, value: &str, notifications: &mut Notifications) {
        if let Some(number) = parse_wire_f64(value) {
            self.value
                .set(number.into(), ChangeOrigin::Network, notifications);
        }
    }

    fn turn_actions(&self) -> Vec<ActionDescriptor> {
        let unit = Some(self.value.descriptor().unit);
        vec![
            self.identity
                .action(ActionKind::Increment, unit, describe(&self.identity, "Turn up")),
            self.identity
                .action(ActionKind::Decrement, unit, describe(&self.identity, "Turn down")),
        ]
    }

    fn dispatch(
        &self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::Increment => self.turn(1.0, parameter, context),
            ActionKind::Decrement => self.turn(-1.0, parameter, context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}

impl NetworkFunction for RotaryEncoder {
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

    fn actions(&self) -> Vec<ActionDescriptor> {
        self.turn_actions()
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        self.dispatch(action, parameter, context)
    }
}

/// Lock reported on its own element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderLock {
    pub element: DataElement,
    /// Wire value reported while the encoder is locked.
    pub locked_value: WireScalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedEncoderConfig {
    #[serde(flatten)]
    pub encoder: RotaryEncoderConfig,
    pub lock: EncoderLock,
}

/// Rotary encoder that refuses to turn while known to be locked.
#[derive(Debug)]
pub struct LockedEncoder {
    encoder: RotaryEncoder,
    lock: EncoderLock,
    locked: Option<bool>,
    lock_value: ValueSlot,
}

impl LockedEncoder {
    /// # Errors
    ///
    /// Fails when the encoder is invalid or the lock reuses its element.
    pub fn new(config: LockedEncoderConfig) -> FunctionResult<Self> {
        let LockedEncoderConfig { encoder, lock } = config;
        require_element(&encoder.identity, &lock.element)?;
        if lock.element.id == encoder.element.id {
            return Err(FunctionError::RepeatedElementId {
                function: encoder.identity.local_key(),
                id: lock.element.id.clone(),
            });
        }
        let encoder = RotaryEncoder::new(encoder)?;
        let lock_value = ValueSlot::new(
            encoder.identity.sub_address("locked"),
            BindingValueUnit::Boolean,
            "Encoder is locked",
        );
        Ok(Self {
            encoder,
            lock,
            locked: None,
            lock_value,
        })
    }

    pub fn is_locked(&self) -> Option<bool> {
        self.locked
    }
}

impl NetworkFunction for LockedEncoder {
    fn identity(&self) -> &FunctionIdentity {
        &self.encoder.identity
    }

    fn data_elements(&self) -> Vec<DataElement> {
        vec![self.encoder.element.clone(), self.lock.element.clone()]
    }

    fn process_network_data(&mut self, id: &str, value: &str, notifications: &mut Notifications) {
        if id == self.lock.element.id {
            // Lock state is binary: anything that is not the locked value unlocks.
            if value.trim().is_empty() {
                return;
            }
            let locked = self.lock.locked_value.matches_str(value);
            self.locked = Some(locked);
            self.lock_value
                .set(locked.into(), ChangeOrigin::Network, notifications);
        } else if id == self.encoder.element.id {
            self.encoder.decode(value, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.encoder.reset(notifications);
        self.locked = None;
        self.lock_value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        let mut values = self.encoder.values();
        values.push((
            self.lock_value.descriptor().clone(),
            self.lock_value.get().clone(),
        ));
        values
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        self.encoder.turn_actions()
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        if self.locked == Some(true) {
            return ActionOutcome::ignored(format!("{} is locked", self.encoder.identity));
        }
        self.encoder.dispatch(action, parameter, context)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteEncoderConfig {
    #[serde(flatten)]
    pub identity: FunctionIdentity,
    pub device_id: String,
    pub element: DataElement,
    pub action_id: String,
    #[serde(flatten)]
    pub range: RangedValue,
    pub step: f64,
    #[serde(default)]
    pub unit: BindingValueUnit,
}

/// Encoder whose command carries the resulting absolute value.
#[derive(Debug)]
pub struct AbsoluteEncoder {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    action_id: String,
    range: RangedValue,
    step: f64,
    current: Option<f64>,
    value: ValueSlot,
}

impl AbsoluteEncoder {
    /// # Errors
    ///
    /// Fails for blank names or ids, an empty range, or a non-positive step.
    pub fn new(config: AbsoluteEncoderConfig) -> FunctionResult<Self> {
        let AbsoluteEncoderConfig {
            identity,
            device_id,
            element,
            action_id,
            range,
            step,
            unit,
        } = config;
        identity.validate()?;
        require_element(&identity, &element)?;
        require_text(&identity, "device_id", &device_id)?;
        require_text(&identity, "action_id", &action_id)?;
        range.validate(&identity)?;
        validate_step(&identity, step)?;
        let value = ValueSlot::new(identity.address(), unit, "Current value");
        Ok(Self {
            identity,
            device_id,
            element,
            action_id,
            range,
            step,
            current: None,
            value,
        })
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }

    fn turn(&mut self, sign: f64, parameter: &BindingValue, context: &mut ActionContext<'_>) -> ActionOutcome {
        let amount = step_override(parameter).unwrap_or(self.step);
        let base = self.current.unwrap_or(self.range.min);
        let target = self.range.apply(base + sign * amount);
        context.outbox.send(WireCommand::numeric(
            &self.device_id,
            &self.action_id,
            target,
            self.element.precision(),
        ));
        self.current = Some(target);
        self.value
            .set(target.into(), ChangeOrigin::Action, context.notifications);
        ActionOutcome::Executed
    }
}

impl NetworkFunction for AbsoluteEncoder {
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
        if let Some(raw) = parse_wire_f64(value) {
            let decoded = self.range.apply(raw);
            self.current = Some(decoded);
            self.value
                .set(decoded.into(), ChangeOrigin::Network, notifications);
        }
    }

    fn reset(&mut self, notifications: &mut Notifications) {
        self.current = None;
        self.value.clear(notifications);
    }

    fn values(&self) -> Vec<(ValueDescriptor, BindingValue)> {
        vec![(self.value.descriptor().clone(), self.value.get().clone())]
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        let unit = Some(self.value.descriptor().unit);
        vec![
            self.identity
                .action(ActionKind::Increment, unit, describe(&self.identity, "Turn up")),
            self.identity
                .action(ActionKind::Decrement, unit, describe(&self.identity, "Turn down")),
        ]
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::Increment => self.turn(1.0, parameter, context),
            ActionKind::Decrement => self.turn(-1.0, parameter, context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}
