use crate::route::Hook;
use std::{
	any::Any,
	collections::HashMap,
	fmt::{self, Debug, Formatter},
	sync::Arc,
};
use tracing::{error, warn};

pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "PAGE NOT FOUND";

/// An already parsed request as handed over by the hosting HTTP stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
	pub method: String,
	pub path: String,
	pub query: String,
	pub headers: Vec<(String, String)>,
	pub body: Vec<u8>,
}

impl Request {
	/// Creates a request from a method and a request target such as `/blog/1?draft=true`.
	pub fn new(method: impl Into<String>, target: &str) -> Self {
		let (path, query) = match target.find('?') {
			Some(at) => (&target[..at], &target[at + 1..]),
			None => (target, ""),
		};

		Self {
			method: method.into(),
			path: path.to_owned(),
			query: query.to_owned(),
			..Self::default()
		}
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();
		self
	}
}

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub headers: Vec<(String, String)>,
	pub body: Vec<u8>,
}

impl Default for Response {
	fn default() -> Self {
		Self {
			status: 200,
			headers: Vec::new(),
			body: Vec::new(),
		}
	}
}

/// Request-scoped state shared by middleware and handlers.
///
/// Contexts are pooled: every field is cleared by [`reset`](Context::reset) before a request
/// uses it.
pub struct Context {
	stopped: bool,
	request: Request,
	response: Response,
	dynamics: HashMap<String, String>,
	values: HashMap<String, Box<dyn Any + Send + Sync>>,
	afters: Vec<Hook>,
	ends: Vec<Hook>,
	not_found_message: Arc<str>,
}

impl Default for Context {
	fn default() -> Self {
		Self::new(Arc::from(DEFAULT_NOT_FOUND_MESSAGE))
	}
}

impl Debug for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("stopped", &self.stopped)
			.field("request", &self.request)
			.field("response", &self.response)
			.field("dynamics", &self.dynamics)
			.field("values", &self.values.keys().collect::<Vec<_>>())
			.field("afters", &self.afters.len())
			.field("ends", &self.ends.len())
			.finish()
	}
}

impl Context {
	pub fn new(not_found_message: Arc<str>) -> Self {
		Self {
			stopped: false,
			request: Request::default(),
			response: Response::default(),
			dynamics: HashMap::new(),
			values: HashMap::new(),
			afters: Vec::new(),
			ends: Vec::new(),
			not_found_message,
		}
	}

	/// Prepares a pooled context for a new request, dropping everything left by the previous one.
	pub fn reset(&mut self, request: Request) {
		self.stopped = false;
		self.request = request;
		if self.request.path.is_empty() {
			self.request.path.push('/');
		}

		self.response.status = 200;
		self.response.headers.clear();
		self.response.body.clear();
		self.dynamics.clear();
		self.values.clear();
		self.afters.clear();
		self.ends.clear();
	}

	pub fn request(&self) -> &Request {
		&self.request
	}

	pub fn method(&self) -> &str {
		&self.request.method
	}

	pub fn path(&self) -> &str {
		&self.request.path
	}

	pub fn query(&self) -> &str {
		&self.request.query
	}

	/// First request header named `name`, compared case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.request
			.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	pub fn body(&self) -> &[u8] {
		&self.request.body
	}

	/// Value of the dynamic segment `key`. A leading `:` is accepted, so `:id` and `id` are the
	/// same key.
	pub fn dynamic(&self, key: &str) -> Option<&str> {
		let key = key.strip_prefix(':').unwrap_or(key);
		self.dynamics.get(key).map(String::as_str)
	}

	pub fn set_dynamic(&mut self, key: &str, value: impl Into<String>) {
		let key = key.strip_prefix(':').unwrap_or(key);
		if key.is_empty() {
			warn!("ignoring dynamic parameter with an empty key");
			return;
		}

		self.dynamics.insert(key.to_owned(), value.into());
	}

	pub fn dynamics(&self) -> &HashMap<String, String> {
		&self.dynamics
	}

	pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
		self.values.get(key).and_then(|value| value.downcast_ref())
	}

	pub fn set_value<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
		self.values.insert(key.into(), Box::new(value));
	}

	pub fn status(&self) -> u16 {
		self.response.status
	}

	pub fn set_status(&mut self, status: u16) -> &mut Self {
		self.response.status = status;
		self
	}

	/// Sets a response header, replacing any previous value of the same name.
	pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
		let name = name.into();
		self.response
			.headers
			.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
		self.response.headers.push((name, value.into()));
		self
	}

	pub fn write(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
		self.response.body.extend_from_slice(bytes.as_ref());
		self
	}

	pub fn text(&mut self, status: u16, text: &str) -> &mut Self {
		self.set_status(status)
			.set_header("Content-Type", "text/plain; charset=utf-8")
			.write(text)
	}

	pub fn not_found(&mut self) {
		let message = Arc::clone(&self.not_found_message);
		self.response.body.clear();
		self.text(404, &message);
	}

	pub fn response(&self) -> &Response {
		&self.response
	}

	/// Moves the response out, leaving a fresh one behind.
	pub fn take_response(&mut self) -> Response {
		std::mem::take(&mut self.response)
	}

	/// Stops the dispatch: no further middleware, handler or "after" hook runs.
	pub fn stop(&mut self) {
		self.stopped = true;
	}

	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Appends a hook that runs once the handler chain completes without stopping.
	pub fn append_after(&mut self, hook: Hook) {
		self.afters.push(hook);
	}

	/// Appends a hook that runs at the end of every dispatch, stopped, failed or not.
	pub fn append_end(&mut self, hook: Hook) {
		self.ends.push(hook);
	}

	pub fn run_after(&mut self) {
		let hooks = std::mem::take(&mut self.afters);
		self.run_hooks(hooks, "after");
	}

	pub fn run_end(&mut self) {
		let hooks = std::mem::take(&mut self.ends);
		self.run_hooks(hooks, "end");
	}

	// last appended runs first; the first error skips the rest
	fn run_hooks(&mut self, hooks: Vec<Hook>, kind: &str) {
		for hook in hooks.into_iter().rev() {
			if let Err(e) = hook(self) {
				error!(kind, error = %e, "hook failed, skipping remaining hooks");
				return;
			}
		}
	}
}
