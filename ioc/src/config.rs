//! Container configuration, loadable from YAML.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How proxies are generated for objects matched by at least one advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyStrategy {
  /// Capability-surface proxy when the class declares an interface,
  /// subclass-style proxy otherwise.
  #[default]
  Auto,
  /// Always a capability-surface proxy.
  Interface,
  /// Always a subclass-style proxy.
  Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  #[serde(default)]
  pub proxy_strategy: ProxyStrategy,
  /// Expose singletons early to break circular references.
  #[serde(default = "default_true")]
  pub allow_circular_references: bool,
  /// Create non-lazy singletons during `refresh`.
  #[serde(default = "default_true")]
  pub eager_singletons: bool,
  /// Let a registration replace an existing descriptor of the same name.
  #[serde(default = "default_true")]
  pub allow_descriptor_overriding: bool,
}

fn default_true() -> bool {
  true
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      proxy_strategy: ProxyStrategy::Auto,
      allow_circular_references: true,
      eager_singletons: true,
      allow_descriptor_overriding: true,
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn missing_fields_take_defaults() {
    let config = ContainerConfig::from_yaml_str("proxy_strategy: class").unwrap();
    assert_eq!(config.proxy_strategy, ProxyStrategy::Class);
    assert!(config.allow_circular_references);
    assert!(config.eager_singletons);
    assert!(config.allow_descriptor_overriding);
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let result = ContainerConfig::from_yaml_str("proxy_stratgy: class");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
    let result = ContainerConfig::from_yaml_str("proxy_strategy: cglib");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
  }

  #[test]
  fn loads_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "allow_circular_references: false").unwrap();
    writeln!(file, "eager_singletons: false").unwrap();

    let config = ContainerConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(
      config,
      ContainerConfig {
        allow_circular_references: false,
        eager_singletons: false,
        ..ContainerConfig::default()
      }
    );
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ContainerConfig::from_yaml_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(Error::ConfigRead(_))));
  }
}
