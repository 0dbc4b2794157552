//! Interface configuration.
//!
//! Everything the protocol and coordination layers need is passed in through
//! [`InterfaceConfig`]; nothing is read from process-wide state.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InterfaceError, InterfaceResult};

/// Default UDP port the bridge listens on for exporter packets.
pub const DEFAULT_LISTEN_PORT: u16 = 9089;

/// Default number of retries after the initial control request.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Default retry interval for control requests.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// Default silence after which the remote is treated as gone.
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 5000;

/// Interface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Exporter endpoint. When unset, the source of the first inbound
    /// packet is used.
    pub remote_addr: Option<SocketAddr>,

    /// Local endpoint for inbound packets.
    pub listen_addr: SocketAddr,

    /// Short name of the export driver to request, e.g. `F-16C`.
    ///
    /// When unset, the bridge is synchronized with whatever driver the
    /// remote reports.
    pub expected_driver: Option<String>,

    /// Retries after the initial send before a request is abandoned.
    pub retry_limit: u32,

    pub retry_interval_ms: u64,

    pub heartbeat_timeout_ms: u64,

    /// Ask the remote to load the module for the active aircraft on start.
    pub request_module_on_start: bool,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            remote_addr: None,
            listen_addr: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                DEFAULT_LISTEN_PORT,
            )),
            expected_driver: None,
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            request_module_on_start: true,
        }
    }
}

impl InterfaceConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> InterfaceConfigBuilder {
        InterfaceConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for zero intervals or timeouts, a blank driver name,
    /// or a driver name containing protocol separators.
    pub fn validate(&self) -> InterfaceResult<()> {
        if self.retry_interval_ms == 0 {
            return Err(InterfaceError::invalid_configuration(
                "retry_interval_ms must be positive",
            ));
        }
        if self.heartbeat_timeout_ms == 0 {
            return Err(InterfaceError::invalid_configuration(
                "heartbeat_timeout_ms must be positive",
            ));
        }
        if let Some(driver) = &self.expected_driver {
            if driver.trim().is_empty() {
                return Err(InterfaceError::invalid_configuration(
                    "expected_driver must not be blank",
                ));
            }
            if driver.contains(['\n', ':', '=']) {
                return Err(InterfaceError::invalid_configuration(
                    "expected_driver must not contain ':', '=' or newlines",
                ));
            }
        }
        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

/// Builder for [`InterfaceConfig`].
#[derive(Debug, Default)]
pub struct InterfaceConfigBuilder {
    config: InterfaceConfig,
}

impl InterfaceConfigBuilder {
    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.config.remote_addr = Some(addr);
        self
    }

    #[must_use]
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    #[must_use]
    pub fn expected_driver(mut self, driver: impl Into<String>) -> Self {
        self.config.expected_driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.config.retry_limit = limit;
        self
    }

    #[must_use]
    pub fn retry_interval_ms(mut self, ms: u64) -> Self {
        self.config.retry_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn heartbeat_timeout_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn request_module_on_start(mut self, enabled: bool) -> Self {
        self.config.request_module_on_start = enabled;
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn build(self) -> InterfaceResult<InterfaceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults() {
        let config = InterfaceConfig::default();
        assert_eq!(config.retry_limit, 10);
        assert_eq!(config.retry_interval(), Duration::from_secs(1));
        assert_eq!(config.heartbeat_timeout(), Duration::from_secs(5));
        assert!(config.request_module_on_start);
        assert!(config.remote_addr.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() -> TestResult {
        let config = InterfaceConfig::builder()
            .expected_driver("F-16C")
            .retry_limit(3)
            .retry_interval_ms(250)
            .remote_addr("127.0.0.1:9088".parse()?)
            .build()?;
        assert_eq!(config.expected_driver.as_deref(), Some("F-16C"));
        assert_eq!(config.retry_limit, 3);

        assert!(InterfaceConfig::builder().retry_interval_ms(0).build().is_err());
        assert!(InterfaceConfig::builder().expected_driver("  ").build().is_err());
        assert!(InterfaceConfig::builder().expected_driver("A:B").build().is_err());
        Ok(())
    }

    #[test]
    fn test_partial_yaml_uses_defaults() -> TestResult {
        let config: InterfaceConfig = serde_yaml::from_str("expected_driver: A-10C\nretry_limit: 2\n")?;
        assert_eq!(config.expected_driver.as_deref(), Some("A-10C"));
        assert_eq!(config.retry_limit, 2);
        assert_eq!(config.heartbeat_timeout_ms, DEFAULT_HEARTBEAT_TIMEOUT_MS);
        Ok(())
    }
}
