//! Application options.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! prefix = "/api"
//! pool_size = 128
//! ```

use crate::{context::DEFAULT_NOT_FOUND_MESSAGE, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
	/// Prepended to every route registered through the app.
	pub prefix: String,

	/// Maximum number of idle request contexts kept for reuse.
	pub pool_size: usize,

	/// Body of the 404 response written for unmatched requests.
	pub not_found_message: String,

	/// Reported by [`App::version`](crate::App::version) and logged at startup.
	pub version: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			prefix: String::new(),
			pool_size: 64,
			not_found_message: DEFAULT_NOT_FOUND_MESSAGE.to_owned(),
			version: env!("CARGO_PKG_VERSION").to_owned(),
		}
	}
}

impl Config {
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(content)?)
	}

	/// Loads a TOML config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}
}
