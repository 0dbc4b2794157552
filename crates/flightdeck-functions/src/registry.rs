//! The set of functions bound to one simulator interface.
//!
//! A registry is immutable once built. Functions are held in canonical order
//! (device, then primary element id compared as text, then name) so anything
//! generated from it is stable across rebuilds. Reloading a profile builds a
//! new registry and swaps it in whole.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::binding::{ActionKind, BindingAddress, BindingValue};
use crate::config::FunctionConfig;
use crate::context::{ActionContext, ActionOutcome, Notifications};
use crate::error::{FunctionError, FunctionResult};
use crate::function::NetworkFunction;

/// Canonical ordering of two functions.
pub fn canonical_order(a: &dyn NetworkFunction, b: &dyn NetworkFunction) -> Ordering {
    let (ia, ib) = (a.identity(), b.identity());
    ia.device
        .cmp(&ib.device)
        .then_with(|| {
            a.primary_element_id()
                .unwrap_or_default()
                .cmp(&b.primary_element_id().unwrap_or_default())
        })
        .then_with(|| ia.name.cmp(&ib.name))
}

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: Vec<Box<dyn NetworkFunction>>,
    /// Element id to index in `functions`.
    owners: HashMap<String, usize>,
    /// Local key to index; the first function wins on duplicates.
    by_key: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Orders and indexes `functions`.
    ///
    /// # Errors
    ///
    /// Fails when a function lists an element twice or two functions claim
    /// the same element id.
    pub fn build(mut functions: Vec<Box<dyn NetworkFunction>>) -> FunctionResult<Self> {
        functions.sort_by(|a, b| canonical_order(a.as_ref(), b.as_ref()));

        let mut owners: HashMap<String, usize> = HashMap::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (index, function) in functions.iter().enumerate() {
            let key = function.local_key();
            let mut seen = Vec::new();
            for element in function.data_elements() {
                if seen.contains(&element.id) {
                    return Err(FunctionError::RepeatedElementId {
                        function: key,
                        id: element.id,
                    });
                }
                match owners.entry(element.id.clone()) {
                    Entry::Occupied(entry) => {
                        let first = functions
                            .get(*entry.get())
                            .map(|f| f.local_key())
                            .unwrap_or_default();
                        return Err(FunctionError::DuplicateElementId {
                            id: element.id,
                            first,
                            second: key,
                        });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(index);
                    }
                }
                seen.push(element.id);
            }
            if by_key.contains_key(&key) {
                warn!(function = %key, "Duplicate function name; later definition is not addressable");
            } else {
                by_key.insert(key, index);
            }
        }

        debug!(
            functions = functions.len(),
            elements = owners.len(),
            "Function registry built"
        );
        Ok(Self {
            functions,
            owners,
            by_key,
        })
    }

    /// Builds every record and then the registry.
    ///
    /// # Errors
    ///
    /// Returns the first record or registry validation failure.
    pub fn from_configs(configs: impl IntoIterator<Item = FunctionConfig>) -> FunctionResult<Self> {
        let functions = configs
            .into_iter()
            .map(FunctionConfig::build)
            .collect::<FunctionResult<Vec<_>>>()?;
        Self::build(functions)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn NetworkFunction> {
        self.functions.iter().map(AsRef::as_ref)
    }

    pub fn get(&self, local_key: &str) -> Option<&dyn NetworkFunction> {
        let index = *self.by_key.get(local_key)?;
        self.functions.get(index).map(AsRef::as_ref)
    }

    /// Local key of the function owning `id`.
    pub fn owner_of(&self, id: &str) -> Option<String> {
        let index = *self.owners.get(id)?;
        self.functions.get(index).map(|f| f.local_key())
    }

    pub fn owns(&self, id: &str) -> bool {
        self.owners.contains_key(id)
    }

    /// Routes one inbound pair. Returns `false` when no function owns `id`.
    pub fn dispatch(&mut self, id: &str, value: &str, notifications: &mut Notifications) -> bool {
        let Some(&index) = self.owners.get(id) else {
            return false;
        };
        match self.functions.get_mut(index) {
            Some(function) => {
                function.process_network_data(id, value, notifications);
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&mut self, notifications: &mut Notifications) {
        for function in &mut self.functions {
            function.reset(notifications);
        }
    }

    /// Invokes an action by its binding address (`device.function.action`).
    ///
    /// # Errors
    ///
    /// Fails when the address names no action or no registered function.
    /// A known action with a bad parameter is not an error; it comes back as
    /// [`ActionOutcome::Ignored`].
    pub fn execute(
        &mut self,
        address: &BindingAddress,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> FunctionResult<ActionOutcome> {
        let action = address
            .sub
            .as_deref()
            .ok_or_else(|| FunctionError::InvalidAddress(address.to_string()))?
            .parse::<ActionKind>()?;
        self.execute_kind(&address.local_key(), action, parameter, context)
    }

    /// # Errors
    ///
    /// Fails when `local_key` names no registered function.
    pub fn execute_kind(
        &mut self,
        local_key: &str,
        action: ActionKind,
        parameter: &BindingValue,
        context: &mut ActionContext<'_>,
    ) -> FunctionResult<ActionOutcome> {
        let function = self
            .by_key
            .get(local_key)
            .copied()
            .and_then(|index| self.functions.get_mut(index))
            .ok_or_else(|| FunctionError::UnknownFunction(local_key.to_string()))?;
        Ok(function.execute(action, parameter, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Outbox;
    use crate::element::DataElement;
    use crate::function::FunctionIdentity;
    use crate::functions::{FlagValue, FlagValueConfig, Switch, SwitchConfig, SwitchPosition};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn flag(device: &str, name: &str, id: &str) -> FunctionResult<Box<dyn NetworkFunction>> {
        Ok(Box::new(FlagValue::new(FlagValueConfig {
            identity: FunctionIdentity::new(device, name),
            element: DataElement::new(id),
        })?))
    }

    fn battery() -> FunctionResult<Box<dyn NetworkFunction>> {
        Ok(Box::new(Switch::new(SwitchConfig {
            identity: FunctionIdentity::new("Electrical", "Battery"),
            device_id: "1".to_string(),
            element: DataElement::new("404"),
            action_id: Some("3001".to_string()),
            positions: vec![
                SwitchPosition::new("1", "On"),
                SwitchPosition::new("0", "Off"),
            ],
            pulse: None,
        })?))
    }

    #[test]
    fn test_canonical_order_is_lexicographic() -> TestResult {
        let registry = FunctionRegistry::build(vec![
            flag("Lights", "B", "9")?,
            flag("Caution", "Z", "100")?,
            flag("Lights", "A", "10")?,
            flag("Caution", "Y", "100a")?,
        ])?;
        let keys: Vec<String> = registry.iter().map(NetworkFunction::local_key).collect();
        // "10" sorts before "9" as text.
        assert_eq!(keys, vec!["Caution.Z", "Caution.Y", "Lights.A", "Lights.B"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_element_id_is_rejected() -> TestResult {
        let result = FunctionRegistry::build(vec![flag("A", "One", "7")?, flag("B", "Two", "7")?]);
        match result {
            Err(FunctionError::DuplicateElementId { id, first, second }) => {
                assert_eq!(id, "7");
                assert_eq!(first, "A.One");
                assert_eq!(second, "B.Two");
            }
            other => return Err(format!("unexpected result: {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn test_unknown_id_dispatch_changes_nothing() -> TestResult {
        let mut registry = FunctionRegistry::build(vec![flag("A", "One", "7")?])?;
        let mut notes = Notifications::new();
        assert!(!registry.dispatch("8", "1", &mut notes));
        assert!(notes.is_empty());
        assert!(registry.iter().all(|f| f.values().iter().all(|(_, v)| v.is_empty())));

        assert!(registry.dispatch("7", "1", &mut notes));
        assert_eq!(registry.owner_of("7").as_deref(), Some("A.One"));
        Ok(())
    }

    #[test]
    fn test_execute_by_address() -> TestResult {
        let mut registry = FunctionRegistry::build(vec![battery()?])?;
        let mut notes = Notifications::new();
        let mut outbox = Outbox::new();
        let mut ctx = ActionContext::new(&mut notes, &mut outbox);

        let address: BindingAddress = "Electrical.Battery.set".parse()?;
        let outcome = registry.execute(&address, &"Off".into(), &mut ctx)?;
        assert!(outcome.is_executed());

        let missing: BindingAddress = "Electrical.Generator.set".parse()?;
        assert!(matches!(
            registry.execute(&missing, &BindingValue::Empty, &mut ctx),
            Err(FunctionError::UnknownFunction(_))
        ));
        let no_action: BindingAddress = "Electrical.Battery".parse()?;
        assert!(registry.execute(&no_action, &BindingValue::Empty, &mut ctx).is_err());

        assert_eq!(outbox.lines(), vec!["C1,3001,0"]);
        Ok(())
    }

    #[test]
    fn test_reset_all_is_idempotent() -> TestResult {
        let mut registry = FunctionRegistry::build(vec![battery()?, flag("A", "One", "7")?])?;
        let mut notes = Notifications::new();
        registry.dispatch("404", "1", &mut notes);
        registry.dispatch("7", "1", &mut notes);

        registry.reset_all(&mut notes);
        notes.clear();
        registry.reset_all(&mut notes);
        assert!(notes.is_empty());
        Ok(())
    }
}
