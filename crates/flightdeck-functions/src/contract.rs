//! The protocol contract shared with the exporter script.
//!
//! Both sides must agree on which element ids exist and how each value is
//! formatted. The contract is derived from a registry, so it inherits its
//! canonical order and regenerating it from an unchanged panel definition
//! yields byte-identical output.

use serde::{Deserialize, Serialize};

use crate::element::DataElement;
use crate::registry::FunctionRegistry;

/// Format used for elements that do not name one.
pub const DEFAULT_OUTPUT_FORMAT: &str = "%0.1f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractElement {
    pub id: String,
    pub format: String,
    pub every_frame: bool,
}

impl From<DataElement> for ContractElement {
    fn from(element: DataElement) -> Self {
        let format = element.output_format().to_string();
        Self {
            id: element.id,
            format,
            every_frame: element.every_frame,
        }
    }
}

/// Elements of one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFunction {
    pub device: String,
    pub name: String,
    pub elements: Vec<ContractElement>,
}

impl ContractFunction {
    pub fn local_key(&self) -> String {
        format!("{}.{}", self.device, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolContract {
    pub functions: Vec<ContractFunction>,
}

impl ProtocolContract {
    pub fn from_registry(registry: &FunctionRegistry) -> Self {
        let functions = registry
            .iter()
            .map(|function| {
                let identity = function.identity();
                ContractFunction {
                    device: identity.device.clone(),
                    name: identity.name.clone(),
                    elements: function
                        .data_elements()
                        .into_iter()
                        .map(ContractElement::from)
                        .collect(),
                }
            })
            .collect();
        Self { functions }
    }

    pub fn element_count(&self) -> usize {
        self.functions.iter().map(|f| f.elements.len()).sum()
    }

    /// Renders the Lua driver tables read by the exporter.
    pub fn to_lua(&self) -> String {
        let mut out = String::new();
        out.push_str("-- Generated by flightdeck; do not edit.\n");
        self.write_table(&mut out, "driver.everyFrameArguments", true);
        out.push('\n');
        self.write_table(&mut out, "driver.arguments", false);
        out
    }

    fn write_table(&self, out: &mut String, table: &str, every_frame: bool) {
        out.push_str(&format!("{table} = {{\n"));
        for function in &self.functions {
            let mut elements = function
                .elements
                .iter()
                .filter(|e| e.every_frame == every_frame)
                .peekable();
            if elements.peek().is_none() {
                continue;
            }
            out.push_str(&format!("    -- {}\n", function.local_key()));
            for element in elements {
                out.push_str(&format!(
                    "    [{}] = {},\n",
                    lua_key(&element.id),
                    lua_string(&element.format)
                ));
            }
        }
        out.push_str("}\n");
    }
}

/// Numeric ids stay bare so the exporter can index by number.
fn lua_key(id: &str) -> String {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        id.to_string()
    } else {
        lua_string(id)
    }
}

fn lua_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
