//! Event buffers handed to functions while they decode, reset or act.
//!
//! Decode and reset only receive [`Notifications`]. Actions receive an
//! [`ActionContext`], which adds the [`Outbox`]. A decode path therefore has
//! no way to send a wire command, which rules out feedback loops between the
//! simulator echo and the outbound path.

use serde::Serialize;

use crate::binding::{BindingAddress, BindingValue, BindingValueUnit, ValueDescriptor};
use crate::wire::WireCommand;

/// Why a value changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Decoded from inbound simulator data.
    Network,
    /// Optimistic local update made by an action.
    Action,
    /// Forced back to unknown after losing the remote.
    Reset,
}

/// Something host automation may want to observe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BindingEvent {
    ValueChanged {
        address: BindingAddress,
        value: BindingValue,
        origin: ChangeOrigin,
    },
    TriggerFired {
        address: BindingAddress,
        value: BindingValue,
    },
}

impl BindingEvent {
    pub fn address(&self) -> &BindingAddress {
        match self {
            BindingEvent::ValueChanged { address, .. } | BindingEvent::TriggerFired { address, .. } => {
                address
            }
        }
    }
}

/// Collects value changes and trigger firings.
#[derive(Debug, Default)]
pub struct Notifications {
    events: Vec<BindingEvent>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BindingEvent) {
        self.events.push(event);
    }

    pub fn fire(&mut self, address: BindingAddress, value: BindingValue) {
        self.events.push(BindingEvent::TriggerFired { address, value });
    }

    pub fn events(&self) -> &[BindingEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, BindingEvent> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Wire commands composed by an action, in send order.
#[derive(Debug, Default)]
pub struct Outbox {
    commands: Vec<WireCommand>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, command: WireCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[WireCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, WireCommand> {
        self.commands.drain(..)
    }

    /// Rendered `C...` lines, mostly useful in tests.
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }
}

/// Everything an action may touch.
#[derive(Debug)]
pub struct ActionContext<'a> {
    pub notifications: &'a mut Notifications,
    pub outbox: &'a mut Outbox,
}

impl<'a> ActionContext<'a> {
    pub fn new(notifications: &'a mut Notifications, outbox: &'a mut Outbox) -> Self {
        Self {
            notifications,
            outbox,
        }
    }
}

/// Result of invoking an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    Executed,
    /// Bad parameter or unsupported action; state is unchanged.
    Ignored(String),
}

impl ActionOutcome {
    pub fn ignored(reason: impl Into<String>) -> Self {
        ActionOutcome::Ignored(reason.into())
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, ActionOutcome::Executed)
    }
}

/// Storage for one exposed value.
///
/// Changes are only announced when the value actually differs, so repeated
/// identical updates from an every-frame element stay silent.
#[derive(Debug, Clone)]
pub struct ValueSlot {
    descriptor: ValueDescriptor,
    current: BindingValue,
}

impl ValueSlot {
    pub fn new(address: BindingAddress, unit: BindingValueUnit, description: impl Into<String>) -> Self {
        Self {
            descriptor: ValueDescriptor {
                address,
                unit,
                description: description.into(),
            },
            current: BindingValue::Empty,
        }
    }

    pub fn descriptor(&self) -> &ValueDescriptor {
        &self.descriptor
    }

    pub fn address(&self) -> &BindingAddress {
        &self.descriptor.address
    }

    pub fn get(&self) -> &BindingValue {
        &self.current
    }

    /// Stores `value`, announcing it when it changed. Returns whether it did.
    pub fn set(
        &mut self,
        value: BindingValue,
        origin: ChangeOrigin,
        notifications: &mut Notifications,
    ) -> bool {
        if self.current == value {
            return false;
        }
        self.current = value.clone();
        notifications.push(BindingEvent::ValueChanged {
            address: self.descriptor.address.clone(),
            value,
            origin,
        });
        true
    }

    /// Forces the value back to [`BindingValue::Empty`].
    pub fn clear(&mut self, notifications: &mut Notifications) {
        self.set(BindingValue::Empty, ChangeOrigin::Reset, notifications);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> ValueSlot {
        ValueSlot::new(
            BindingAddress::new("Lights", "Taxi"),
            BindingValueUnit::Boolean,
            "taxi light",
        )
    }

    #[test]
    fn test_set_announces_only_changes() {
        let mut notes = Notifications::new();
        let mut value = slot();

        assert!(value.set(true.into(), ChangeOrigin::Network, &mut notes));
        assert!(!value.set(true.into(), ChangeOrigin::Network, &mut notes));
        assert_eq!(notes.len(), 1);
        assert_eq!(value.get(), &BindingValue::Bool(true));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut notes = Notifications::new();
        let mut value = slot();
        value.set(false.into(), ChangeOrigin::Network, &mut notes);
        notes.clear();

        value.clear(&mut notes);
        value.clear(&mut notes);
        assert_eq!(notes.len(), 1);
        assert!(value.get().is_empty());
        assert!(matches!(
            notes.events().first(),
            Some(BindingEvent::ValueChanged {
                origin: ChangeOrigin::Reset,
                ..
            })
        ));
    }

    #[test]
    fn test_outbox_lines() {
        let mut outbox = Outbox::new();
        outbox.send(WireCommand::new("1", "2", "3"));
        assert_eq!(outbox.lines(), vec!["C1,2,3".to_string()]);
    }
}
