//! Continuous controls: levers, knobs and rheostats with an absolute value.

use serde::{Deserialize, Serialize};

use crate::binding::{
    ActionDescriptor, ActionKind, BindingValue, BindingValueUnit, ValueDescriptor,
};
use crate::context::{ActionContext, ActionOutcome, ChangeOrigin, Notifications, ValueSlot};
use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::{FunctionIdentity, NetworkFunction};
use crate::functions::{describe, require_element, require_finite, require_text};
use crate::wire::{WireCommand, parse_wire_f64};

/// A bounded number that either clamps or wraps at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedValue {
    pub min: f64,
    pub max: f64,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

impl RangedValue {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            looped: false,
        }
    }

    #[must_use]
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Brings `value` into range.
    ///
    /// Looping ranges subtract or add whole spans until the value lands in
    /// `[min, max]`, so `max` itself is kept rather than folded onto `min`.
    pub fn apply(&self, value: f64) -> f64 {
        if !self.looped {
            return value.clamp(self.min, self.max);
        }
        let span = self.span();
        if span <= 0.0 {
            return self.min;
        }
        if value > self.max {
            let spans = ((value - self.max) / span).ceil();
            value - spans * span
        } else if value < self.min {
            let spans = ((self.min - value) / span).ceil();
            value + spans * span
        } else {
            value
        }
    }

    pub(crate) fn validate(&self, identity: &FunctionIdentity) -> FunctionResult<()> {
        require_finite(identity, "min", self.min)?;
        require_finite(identity, "max", self.max)?;
        if self.min >= self.max {
            return Err(FunctionError::invalid(
                identity.local_key(),
                format!("min {} must be below max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
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

/// Absolute continuous control.
#[derive(Debug)]
pub struct Axis {
    identity: FunctionIdentity,
    device_id: String,
    element: DataElement,
    action_id: String,
    range: RangedValue,
    step: f64,
    current: Option<f64>,
    value: ValueSlot,
}

impl Axis {
    /// # Errors
    ///
    /// Fails for blank names or ids, an empty range, or a non-positive step.
    pub fn new(config: AxisConfig) -> FunctionResult<Self> {
        let AxisConfig {
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

    pub fn range(&self) -> RangedValue {
        self.range
    }

    fn send(&mut self, target: f64, context: &mut ActionContext<'_>) -> ActionOutcome {
        let target = self.range.apply(target);
        if !target.is_finite() {
            return ActionOutcome::ignored(format!("{} has no finite target", self.identity));
        }
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

    fn nudge(&mut self, sign: f64, parameter: &BindingValue, context: &mut ActionContext<'_>) -> ActionOutcome {
        let amount = step_override(parameter).unwrap_or(self.step);
        // Unknown position starts from the bottom of the range.
        let base = self.current.unwrap_or(self.range.min);
        self.send(base + sign * amount, context)
    }
}

pub(crate) fn validate_step(identity: &FunctionIdentity, step: f64) -> FunctionResult<()> {
    require_finite(identity, "step", step)?;
    if step <= 0.0 {
        return Err(FunctionError::invalid(identity.local_key(), "step must be positive"));
    }
    Ok(())
}

/// Explicit nudge amount from an action parameter, if one was given.
pub(crate) fn step_override(parameter: &BindingValue) -> Option<f64> {
    parameter
        .as_f64()
        .filter(|v| v.is_finite() && *v != 0.0)
        .map(f64::abs)
}

impl NetworkFunction for Axis {
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
        let Some(raw) = parse_wire_f64(value) else {
            return;
        };
        let decoded = self.range.apply(raw);
        self.current = Some(decoded);
        self.value
            .set(decoded.into(), ChangeOrigin::Network, notifications);
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
                .action(ActionKind::Set, unit, describe(&self.identity, "Set")),
            self.identity
                .action(ActionKind::Increment, unit, describe(&self.identity, "Increase")),
            self.identity
                .action(ActionKind::Decrement, unit, describe(&self.identity, "Decrease")),
        ]
    }

    fn execute(
        &mut self,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> ActionOutcome {
        match action {
            ActionKind::Set => match parameter.as_f64() {
                Some(target) => self.send(target, context),
                None => ActionOutcome::ignored(format!(
                    "{} cannot be set to '{parameter}'",
                    self.identity
                )),
            },
            ActionKind::Increment => self.nudge(1.0, parameter, context),
            ActionKind::Decrement => self.nudge(-1.0, parameter, context),
            other => ActionOutcome::ignored(format!("{} does not support '{other}'", self.identity)),
        }
    }
}
