//! Container settings
//!
//! Settings come from code, a TOML document, or both; `WEFT_DI_*`
//! environment variables override whatever was loaded.
//!
//! ```toml
//! verify_all_providers = false
//! max_depth = 100
//! default_lifecycle = "singleton"
//! ```

use crate::cycle_detection::MAX_RESOLUTION_DEPTH;
use crate::node::Lifecycle;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Prefix of the environment variables read by [`ContainerSettings::with_env_overrides`].
pub const ENV_PREFIX: &str = "WEFT_DI_";

/// Error type for settings sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Environment error: {key}: {message}")]
	Env { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSettings {
	/// Also prove providers no eager target reaches at compile
	pub verify_all_providers: bool,
	/// Longest dependency chain the cycle detector follows
	pub max_depth: usize,
	/// Lifecycle of providers that do not declare one
	pub default_lifecycle: Lifecycle,
}

impl Default for ContainerSettings {
	fn default() -> Self {
		Self {
			verify_all_providers: false,
			max_depth: MAX_RESOLUTION_DEPTH,
			default_lifecycle: Lifecycle::Singleton,
		}
	}
}

impl ContainerSettings {
	/// Parses settings from a TOML document; missing keys keep their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use weft_di::{ContainerSettings, Lifecycle};
	///
	/// let settings = ContainerSettings::from_toml_str("default_lifecycle = \"prototype\"").unwrap();
	/// assert_eq!(settings.default_lifecycle, Lifecycle::Prototype);
	/// assert!(!settings.verify_all_providers);
	/// ```
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(content)?)
	}

	/// Reads a TOML file. A missing file yields the defaults.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		if !path.exists() {
			tracing::debug!(path = %path.display(), "settings file not found, using defaults");
			return Ok(Self::default());
		}
		let content = fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Applies `WEFT_DI_*` variables from the process environment.
	pub fn with_env_overrides(self) -> Result<Self, SettingsError> {
		self.apply_env(|key| std::env::var(key).ok())
	}

	/// Applies overrides read through `lookup`, which maps a full variable
	/// name to its value.
	pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| {
			let key = format!("{ENV_PREFIX}{name}");
			lookup(&key).map(|value| (key, value))
		};

		if let Some((key, value)) = var("VERIFY_ALL_PROVIDERS") {
			self.verify_all_providers = parse_bool(&key, &value)?;
		}
		if let Some((key, value)) = var("MAX_DEPTH") {
			self.max_depth = value.trim().parse().map_err(|err| SettingsError::Env {
				key,
				message: format!("{err}"),
			})?;
		}
		if let Some((key, value)) = var("DEFAULT_LIFECYCLE") {
			self.default_lifecycle = value
				.parse()
				.map_err(|message| SettingsError::Env { key, message })?;
		}
		Ok(self)
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		other => Err(SettingsError::Env {
			key: key.to_string(),
			message: format!("expected a boolean, got `{other}`"),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;
	use std::io::Write;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	#[rstest]
	fn test_defaults() {
		// Act
		let settings = ContainerSettings::default();

		// Assert
		assert!(!settings.verify_all_providers);
		assert_eq!(settings.max_depth, 100);
		assert_eq!(settings.default_lifecycle, Lifecycle::Singleton);
	}

	#[rstest]
	fn test_toml_rejects_unknown_keys() {
		// Act
		let result = ContainerSettings::from_toml_str("max_dept = 3");

		// Assert
		assert!(matches!(result, Err(SettingsError::Toml(_))));
	}

	#[rstest]
	fn test_from_file() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "verify_all_providers = true\nmax_depth = 12").unwrap();

		// Act
		let settings = ContainerSettings::from_file(file.path()).unwrap();

		// Assert
		assert!(settings.verify_all_providers);
		assert_eq!(settings.max_depth, 12);
		assert_eq!(settings.default_lifecycle, Lifecycle::Singleton);
	}

	#[rstest]
	fn test_missing_file_uses_defaults() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();

		// Act
		let settings = ContainerSettings::from_file(dir.path().join("weft.toml")).unwrap();

		// Assert
		assert_eq!(settings, ContainerSettings::default());
	}

	#[rstest]
	#[case("yes", false)]
	#[case("ON", false)]
	#[case("1", false)]
	#[case("off", true)]
	#[case("0", true)]
	fn test_env_bool_forms(#[case] value: &str, #[case] inverted: bool) {
		// Act
		let settings = ContainerSettings {
			verify_all_providers: inverted,
			..ContainerSettings::default()
		}
		.apply_env(env(&[("WEFT_DI_VERIFY_ALL_PROVIDERS", value)]))
		.unwrap();

		// Assert
		assert_eq!(settings.verify_all_providers, !inverted);
	}

	#[rstest]
	fn test_env_overrides_file_values() {
		// Arrange
		let loaded = ContainerSettings::from_toml_str("max_depth = 12").unwrap();

		// Act
		let settings = loaded
			.apply_env(env(&[
				("WEFT_DI_MAX_DEPTH", "40"),
				("WEFT_DI_DEFAULT_LIFECYCLE", "Prototype"),
			]))
			.unwrap();

		// Assert
		assert_eq!(settings.max_depth, 40);
		assert_eq!(settings.default_lifecycle, Lifecycle::Prototype);
	}

	#[rstest]
	#[case("WEFT_DI_MAX_DEPTH", "deep")]
	#[case("WEFT_DI_VERIFY_ALL_PROVIDERS", "maybe")]
	#[case("WEFT_DI_DEFAULT_LIFECYCLE", "scoped")]
	fn test_env_invalid_values(#[case] key: &str, #[case] value: &str) {
		// Act
		let err = ContainerSettings::default()
			.apply_env(env(&[(key, value)]))
			.unwrap_err();

		// Assert
		assert!(matches!(err, SettingsError::Env { key: k, .. } if k == key));
	}
}
