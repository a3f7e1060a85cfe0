use crate::{
	config::Config,
	context::{Context, Request, Response},
	error::{BuildError, RegisterError},
	group::Group,
	pool::Pool,
	route::{Handler, Validator},
	router::Router,
};
use std::{
	any::Any,
	panic::{self, AssertUnwindSafe},
	sync::Arc,
};
use tracing::{debug, error, info};

pub const METHOD_GET: &str = "GET";
pub const METHOD_POST: &str = "POST";
pub const METHOD_PUT: &str = "PUT";
pub const METHOD_DELETE: &str = "DELETE";
pub const METHOD_HEAD: &str = "HEAD";
pub const METHOD_PATCH: &str = "PATCH";
pub const METHOD_OPTIONS: &str = "OPTIONS";

/// An application: routes, global middleware and the per-request dispatch pipeline.
///
/// Register everything, call [`build`](App::build) once, then share the app (usually behind an
/// `Arc`) with whatever serves requests.
pub struct App {
	router: Router<Handler>,
	middlewares: Vec<Handler>,
	pool: Pool<Context>,
	config: Config,
}

impl Default for App {
	fn default() -> Self {
		Self::new(Config::default())
	}
}

impl App {
	pub fn new(config: Config) -> Self {
		let not_found_message: Arc<str> = Arc::from(config.not_found_message.as_str());
		let pool = Pool::new(config.pool_size, move || {
			Context::new(Arc::clone(&not_found_message))
		});

		let mut router = Router::default();
		router.prefix(&config.prefix);

		Self {
			router,
			middlewares: Vec::new(),
			pool,
			config,
		}
	}

	pub fn router(&self) -> &Router<Handler> {
		&self.router
	}

	pub fn router_mut(&mut self) -> &mut Router<Handler> {
		&mut self.router
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn version(&self) -> &str {
		&self.config.version
	}

	/// Sets the prefix for routes registered from now on.
	pub fn prefix(&mut self, prefix: &str) -> &mut Self {
		self.router.prefix(prefix);
		self
	}

	/// Adds middleware that runs for every request, before the route lookup.
	pub fn use_middleware(&mut self, handler: Handler) -> &mut Self {
		self.middlewares.push(handler);
		self
	}

	pub fn register_validator(&mut self, name: impl Into<String>, validator: Validator) -> &mut Self {
		self.router.register_validator(name, validator);
		self
	}

	pub fn register(&mut self, method: &str, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegisterError> {
		self.router.register(method, path, handlers)?;
		Ok(self)
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

	/// Starts a group of routes sharing `prefix` and group-level middleware.
	pub fn group(&mut self, prefix: &str) -> Group<'_> {
		Group::new(self, prefix)
	}

	/// Compiles every route. Serving an app whose build failed is not supported.
	pub fn build(&mut self) -> Result<(), BuildError> {
		self.router.build()?;
		info!(version = %self.config.version, "routes built");
		Ok(())
	}

	/// Runs one request through global middleware, the matched handler chain and the hooks.
	///
	/// A panicking handler turns into a 500 response; "end" hooks still run and the context
	/// still goes back to the pool.
	pub fn dispatch(&self, request: Request) -> Response {
		let mut ctx = self.pool.take();
		ctx.reset(request);

		if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.serve(&mut ctx))) {
			error!(
				method = %ctx.method(),
				path = %ctx.path(),
				panic = %panic_message(&*panic),
				"request handler panicked"
			);
			ctx.stop();
			ctx.take_response();
			ctx.set_status(500);
		}

		if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| ctx.run_end())) {
			error!(panic = %panic_message(&*panic), "end hook panicked");
		}

		ctx.take_response()
	}

	fn serve(&self, ctx: &mut Context) {
		for middleware in self.middlewares.iter() {
			middleware(ctx);
			if ctx.is_stopped() {
				return;
			}
		}

		let matched = self.router.lookup(ctx.method(), ctx.path()).map(|found| {
			let dynamics: Vec<(String, String)> = found
				.params
				.iter()
				.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
				.collect();
			(found.handlers, dynamics)
		});

		let (handlers, dynamics) = match matched {
			Some(matched) => matched,
			None => {
				debug!(method = %ctx.method(), path = %ctx.path(), "no route matched");
				ctx.not_found();
				return;
			}
		};

		for (key, value) in dynamics {
			ctx.set_dynamic(&key, value);
		}

		for handler in handlers {
			handler(ctx);
			if ctx.is_stopped() {
				return;
			}
		}

		ctx.run_after();
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
	if let Some(message) = panic.downcast_ref::<&str>() {
		*message
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.as_str()
	} else {
		"unknown panic"
	}
}
