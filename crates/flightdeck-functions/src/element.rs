//! Wire elements: the addressable slots of the export protocol.

use serde::{Deserialize, Serialize};

use crate::contract::DEFAULT_OUTPUT_FORMAT;

/// One protocol slot a function reads and/or writes.
///
/// Identity is the `id`. The remote exporter formats the value with
/// `format` (a printf-style pattern such as `%0.2f`) and sends it either every
/// export cycle or only when it changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub every_frame: bool,
}

impl DataElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            format: None,
            every_frame: false,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Optional format, keeping `None` when absent or blank.
    #[must_use]
    pub fn with_optional_format(mut self, format: Option<&str>) -> Self {
        self.format = format
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        self
    }

    #[must_use]
    pub fn every_frame(mut self, every_frame: bool) -> Self {
        self.every_frame = every_frame;
        self
    }

    /// Format the exporter applies, falling back to the contract default.
    pub fn output_format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }

    /// Decimal places implied by [`DataElement::output_format`].
    pub fn precision(&self) -> usize {
        crate::wire::precision_from_format(self.output_format())
    }
}
