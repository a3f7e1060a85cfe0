use thiserror::Error;

/// Why a route registration was rejected. A rejected registration leaves the router untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
	#[error("route path cannot be empty")]
	EmptyPath,

	#[error("route {method} {path} has no handlers")]
	NoHandlers { method: String, path: String },

	#[error("route {method} {path} is already registered")]
	Duplicate { method: String, path: String },
}

/// Why a route tree failed to build. Any of these makes the router unservable.
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("segment {segment:?} of {path}: missing closing ')' for regular expression")]
	UnclosedRegex { path: String, segment: String },

	#[error("segment {segment:?} of {path}: regular expression is empty or its ')' precedes '('")]
	EmptyRegex { path: String, segment: String },

	#[error("segment {segment:?} of {path}: invalid regular expression")]
	InvalidRegex {
		path: String,
		segment: String,
		#[source]
		source: regex::Error,
	},

	#[error("segment {segment:?} of {path}: validator list must be enclosed in '|...|'")]
	UnclosedValidators { path: String, segment: String },

	#[error("segment {segment:?} of {path}: validator list is empty")]
	EmptyValidators { path: String, segment: String },

	#[error("segment {segment:?} of {path}: validator {name:?} is not registered")]
	UnknownValidator {
		path: String,
		segment: String,
		name: String,
	},

	#[error("{method} routes: {source}")]
	Method {
		method: String,
		#[source]
		source: Box<BuildError>,
	},
}

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(#[from] toml::de::Error),
}
