//! Panel profiles: interface settings plus the function records of one
//! aircraft panel, loadable from YAML or JSON.

use std::fs;
use std::path::Path;

use flightdeck_functions::{FunctionConfig, FunctionRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::InterfaceConfig;
use crate::error::{InterfaceError, InterfaceResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub interface: InterfaceConfig,
    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
}

impl Profile {
    /// Loads a profile; `.json` files are JSON, anything else YAML.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, does not parse, or carries an
    /// invalid interface section.
    pub fn load(path: &Path) -> InterfaceResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| InterfaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let profile = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        debug!(
            path = ?path,
            functions = profile.functions.len(),
            "Profile loaded"
        );
        Ok(profile)
    }

    /// # Errors
    ///
    /// Fails on malformed YAML or an invalid interface section.
    pub fn from_yaml_str(text: &str) -> InterfaceResult<Self> {
        let profile: Self =
            serde_yaml::from_str(text).map_err(|e| InterfaceError::Profile(e.to_string()))?;
        profile.interface.validate()?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid interface section.
    pub fn from_json_str(text: &str) -> InterfaceResult<Self> {
        let profile: Self =
            serde_json::from_str(text).map_err(|e| InterfaceError::Profile(e.to_string()))?;
        profile.interface.validate()?;
        Ok(profile)
    }

    /// Builds every function record into a registry.
    ///
    /// # Errors
    ///
    /// Returns the first record or registry validation failure.
    pub fn build_registry(&self) -> InterfaceResult<FunctionRegistry> {
        Ok(FunctionRegistry::from_configs(self.functions.iter().cloned())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const PROFILE: &str = r#"
interface:
  expected_driver: F-16C
  retry_limit: 3
functions:
  - type: flag
    device: Caution
    name: Master Caution
    element: { id: "13", format: "%d" }
  - type: push_button
    device: UFC
    name: Enter
    device_id: "17"
    element: { id: "3034" }
    action_id: "3034"
"#;

    #[test]
    fn test_yaml_profile_builds() -> TestResult {
        let profile = Profile::from_yaml_str(PROFILE)?;
        assert_eq!(profile.interface.expected_driver.as_deref(), Some("F-16C"));
        assert_eq!(profile.interface.retry_limit, 3);
        let registry = profile.build_registry()?;
        assert_eq!(registry.len(), 2);
        assert!(registry.owns("3034"));
        Ok(())
    }

    #[test]
    fn test_load_by_extension() -> TestResult {
        let profile = Profile::from_yaml_str(PROFILE)?;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        file.write_all(serde_json::to_string_pretty(&profile)?.as_bytes())?;
        let loaded = Profile::load(file.path())?;
        assert_eq!(loaded, profile);
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = Profile::load(Path::new("/nonexistent/panel.yaml"));
        assert!(matches!(err, Err(InterfaceError::Io { .. })));
    }

    #[test]
    fn test_invalid_interface_section_is_rejected() {
        let result = Profile::from_yaml_str("interface:\n  retry_interval_ms: 0\n");
        assert!(matches!(result, Err(InterfaceError::InvalidConfiguration(_))));
    }
}
