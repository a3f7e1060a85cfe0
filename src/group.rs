use crate::{
	app::{App, METHOD_DELETE, METHOD_GET, METHOD_HEAD, METHOD_OPTIONS, METHOD_PATCH, METHOD_POST, METHOD_PUT},
	error::RegisterError,
	route::Handler,
};

/// Routes sharing a path prefix and group-level middleware.
///
/// Registrations are rewritten to `prefix + path` with the group middleware placed before the
/// route's own handlers, then forwarded to the [`App`].
pub struct Group<'a> {
	app: &'a mut App,
	prefix: String,
	middlewares: Vec<Handler>,
}

impl<'a> Group<'a> {
	pub fn new(app: &'a mut App, prefix: &str) -> Self {
		let prefix = if prefix.is_empty() || prefix.starts_with('/') {
			prefix.to_owned()
		} else {
			format!("/{}", prefix)
		};

		Self {
			app,
			prefix,
			middlewares: Vec::new(),
		}
	}

	/// Adds middleware to routes registered through this group from now on.
	pub fn use_middleware(&mut self, handler: Handler) -> &mut Self {
		self.middlewares.push(handler);
		self
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn register(&mut self, method: &str, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		let path = format!("{}{}", self.prefix, path);
		let chain = self.chain(handlers);
		self.app.register(method, &path, chain)?;
		Ok(self)
	}

	// group middleware first; no handlers stays no handlers so the router rejects it
	fn chain(&self, handlers: Vec<Handler>) -> Vec<Handler> {
		if handlers.is_empty() {
			return handlers;
		}

		let mut chain = Vec::with_capacity(self.middlewares.len() + handlers.len());
		chain.extend(self.middlewares.iter().cloned());
		chain.extend(handlers);
		chain
	}

	pub fn get(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_GET, path, handlers)
	}

	pub fn post(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_POST, path, handlers)
	}

	pub fn put(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_PUT, path, handlers)
	}

	pub fn delete(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_DELETE, path, handlers)
	}

	pub fn head(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_HEAD, path, handlers)
	}

	pub fn patch(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_PATCH, path, handlers)
	}

	pub fn options(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.register(METHOD_OPTIONS, path, handlers)
	}
}
