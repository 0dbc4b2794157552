//! Concrete control types.
//!
//! Each type pairs a configuration record (plain serde data, as produced by a
//! panel definition) with the runtime function built from it.

pub mod axis;
pub mod encoder;
pub mod flag;
pub mod guarded_switch;
pub mod hat_switch;
pub mod network_value;
pub mod push_button;
pub mod rocker;
pub mod scaled_value;
pub mod switch;
pub mod text;

pub use axis::{Axis, AxisConfig, RangedValue};
pub use encoder::{
    AbsoluteEncoder, AbsoluteEncoderConfig, EncoderLock, LockedEncoder, LockedEncoderConfig,
    RotaryEncoder, RotaryEncoderConfig,
};
pub use flag::{FlagValue, FlagValueConfig, IndicatorDimmable, IndicatorDimmableConfig};
pub use guarded_switch::{GuardConfig, GuardPosition, GuardedSwitch, GuardedSwitchConfig};
pub use hat_switch::{HatCommand, HatPosition, HatSwitch, HatSwitchConfig};
pub use network_value::{
    NetworkTrigger, NetworkTriggerConfig, NetworkTriggerValue, NetworkValue, NetworkValueConfig,
};
pub use push_button::{PushButton, PushButtonConfig, PushButtonType};
pub use rocker::{DualRocker, DualRockerConfig, RockerDirection, RockerPosition};
pub use scaled_value::{DualNetworkValue, ScaledNetworkValue, ScaledValueConfig, ValueScaling};
pub use switch::{PulseConfig, PulseDirection, Switch, SwitchConfig, SwitchPosition};
pub use text::{Text, TextConfig};

use crate::element::DataElement;
use crate::error::{FunctionError, FunctionResult};
use crate::function::FunctionIdentity;

pub(crate) fn require_element(identity: &FunctionIdentity, element: &DataElement) -> FunctionResult<()> {
    if element.id.trim().is_empty() {
        return Err(FunctionError::invalid(
            identity.local_key(),
            "wire element id must not be blank",
        ));
    }
    Ok(())
}

pub(crate) fn require_text(identity: &FunctionIdentity, field: &str, value: &str) -> FunctionResult<()> {
    if value.trim().is_empty() {
        return Err(FunctionError::invalid(
            identity.local_key(),
            format!("{field} must not be blank"),
        ));
    }
    Ok(())
}

pub(crate) fn require_finite(identity: &FunctionIdentity, field: &str, value: f64) -> FunctionResult<()> {
    if !value.is_finite() {
        return Err(FunctionError::invalid(
            identity.local_key(),
            format!("{field} must be finite"),
        ));
    }
    Ok(())
}

/// Default one-line description for an action when the panel gives none.
pub(crate) fn describe(identity: &FunctionIdentity, verb: &str) -> String {
    if identity.description.is_empty() {
        format!("{verb} {}", identity.name)
    } else {
        format!("{verb} {}", identity.description)
    }
}
