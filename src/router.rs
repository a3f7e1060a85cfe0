use crate::{
	error::{BuildError, RegisterError},
	route::Validator,
	tree::{RouteMatch, RouteTree},
};
use std::{
	collections::HashMap,
	fmt::{self, Debug, Formatter},
};
use tracing::{debug, error, warn};

/// Named validators available to dynamic segments such as `/:id|isNum|`.
#[derive(Clone, Default)]
pub struct Validators {
	inner: HashMap<String, Validator>,
}

impl Validators {
	/// Registers `validator` under `name`. The first registration of a name wins; later ones are
	/// ignored so repeated module initialization stays harmless.
	pub fn register(&mut self, name: impl Into<String>, validator: Validator) -> bool {
		let name = name.into();
		if self.inner.contains_key(&name) {
			warn!(%name, "validator already registered, ignoring");
			return false;
		}

		self.inner.insert(name, validator);
		true
	}

	pub fn get(&self, name: &str) -> Option<Validator> {
		self.inner.get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.inner.contains_key(name)
	}
}

impl Debug for Validators {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.inner.keys()).finish()
	}
}

/// Owns one [`RouteTree`] per HTTP method.
///
/// Routes are registered, then the router is built once; after that it is only read and can be
/// shared across threads.
#[derive(Debug)]
pub struct Router<H> {
	routes: HashMap<String, RouteTree<H>>,
	validators: Validators,
	prefix: String,
}

impl<H> Default for Router<H> {
	fn default() -> Self {
		Self {
			routes: HashMap::new(),
			validators: Validators::default(),
			prefix: String::new(),
		}
	}
}

impl<H> Router<H> {
	/// Sets the prefix prepended to routes registered from now on, e.g. with prefix `blog` the
	/// route `/user` becomes `/blog/user`. An empty prefix is ignored.
	pub fn prefix(&mut self, prefix: &str) -> &mut Self {
		if prefix.is_empty() {
			return self;
		}

		self.prefix = if prefix.starts_with('/') {
			prefix.to_owned()
		} else {
			format!("/{}", prefix)
		};
		self
	}

	pub fn current_prefix(&self) -> &str {
		&self.prefix
	}

	/// Registers the handler chain (route middleware first, terminal handler last) for a method
	/// and path.
	pub fn register(&mut self, method: &str, path: &str, handlers: Vec<H>) -> Result<(), RegisterError> {
		if path.is_empty() {
			return Err(RegisterError::EmptyPath);
		}

		let mut full_path = String::with_capacity(self.prefix.len() + path.len() + 1);
		full_path.push_str(self.prefix.trim_end_matches('/'));
		if !path.starts_with('/') {
			full_path.push('/');
		}
		full_path.push_str(path);

		if handlers.is_empty() {
			return Err(RegisterError::NoHandlers {
				method: method.to_owned(),
				path: full_path,
			});
		}

		let planted = self
			.routes
			.entry(method.to_owned())
			.or_default()
			.insert(&full_path, handlers);

		if !planted {
			return Err(RegisterError::Duplicate {
				method: method.to_owned(),
				path: full_path,
			});
		}

		debug!(%method, path = %full_path, "registered route");
		Ok(())
	}

	/// Compiles every method's tree. The first failure aborts; the router must not serve then.
	pub fn build(&mut self) -> Result<(), BuildError> {
		let validators = &self.validators;
		for (method, tree) in self.routes.iter_mut() {
			if let Err(e) = tree.build(validators) {
				error!(%method, error = %e, "failed to build routes");
				return Err(BuildError::Method {
					method: method.clone(),
					source: Box::new(e),
				});
			}

			debug!(%method, "built routes");
		}

		Ok(())
	}

	/// Finds the handler chain for `path`. An unknown method is a plain miss.
	pub fn lookup<'r, 'p>(&'r self, method: &str, path: &'p str) -> Option<RouteMatch<'r, 'p, H>> {
		self.routes.get(method)?.lookup(path)
	}

	pub fn register_validator(&mut self, name: impl Into<String>, validator: Validator) -> &mut Self {
		self.validators.register(name, validator);
		self
	}

	pub fn validator(&self, name: &str) -> Option<Validator> {
		self.validators.get(name)
	}

	pub fn tree(&self, method: &str) -> Option<&RouteTree<H>> {
		self.routes.get(method)
	}

	/// Drops every route so the router can be filled and built again. Validators and the prefix
	/// are kept.
	pub fn reset(&mut self) {
		for tree in self.routes.values_mut() {
			tree.reset();
		}
	}
}

#[cfg(test)]
mod test {
	use super::{Router, Validators};
	use crate::error::{BuildError, RegisterError};
	use std::sync::Arc;

	fn is_num(v: &str) -> bool {
		v.bytes().all(|b| b.is_ascii_digit())
	}

	fn less4(v: &str) -> bool {
		v.len() < 4
	}

	#[test]
	fn rejects_invalid_registrations() {
		let mut router = Router::default();
		router.prefix("").prefix("blog");
		assert_eq!(router.current_prefix(), "/blog");

		assert_eq!(router.register("GET", "", vec![1]), Err(RegisterError::EmptyPath));
		assert_eq!(
			router.register("GET", "/list", vec![]),
			Err(RegisterError::NoHandlers {
				method: "GET".into(),
				path: "/blog/list".into(),
			})
		);
		assert!(router.tree("GET").is_none());

		assert!(router.register("GET", "/list", vec![1]).is_ok());
		assert!(router.register("GET", "list", vec![2]).is_err());
		router.build().unwrap();
		assert_eq!(router.lookup("GET", "/blog/list").unwrap().handlers, &[1]);
	}

	#[test]
	fn prefix_applies_to_later_routes_only() {
		let mut router = Router::default();
		router.register("GET", "/before", vec![1]).unwrap();
		router.prefix("/api");
		router.register("GET", "/after", vec![2]).unwrap();
		router.build().unwrap();

		assert!(router.lookup("GET", "/before").is_some());
		assert!(router.lookup("GET", "/api/after").is_some());
		assert!(router.lookup("GET", "/after").is_none());
	}

	#[test]
	fn builds_with_validators() {
		let mut router = Router::default();
		router.register_validator("isNum", Arc::new(is_num));
		router.register_validator("isNum", Arc::new(is_num));
		router.register("GET", "/list/:id(\\d+)|isNum|", vec![1]).unwrap();

		assert!(router.build().is_ok());
	}

	#[test]
	fn build_failures() {
		for path in ["/list/:id(^\\d+$", "/list/:id|isNum", "/list/:id|unknownValidator|"].iter() {
			let mut router = Router::default();
			router.register_validator("isNum", Arc::new(is_num));
			router.register("GET", path, vec![1]).unwrap();

			match router.build() {
				Err(BuildError::Method { method, .. }) => assert_eq!(method, "GET"),
				other => panic!("{} built: {:?}", path, other),
			}
		}
	}

	#[test]
	fn lookup_with_regex_and_validator() {
		let mut router = Router::default();
		router.register_validator("less4", Arc::new(less4));
		router.register("GET", "/list/:id(\\d+)|less4|", vec![1]).unwrap();
		router.build().unwrap();

		let found = router.lookup("GET", "/list/101").unwrap();
		assert_eq!(found.params["id"], "101");

		assert!(router.lookup("GET", "/list/abcd").is_none());
		assert!(router.lookup("GET", "/list/1001").is_none());
		assert!(router.lookup("POST", "/list/101").is_none());
	}

	#[test]
	fn regex_constraint() {
		let mut router = Router::default();
		router.register("GET", "/list/:id(^\\d+$)", vec![1]).unwrap();
		router.build().unwrap();

		assert_eq!(router.lookup("GET", "/list/42").unwrap().params["id"], "42");
		assert!(router.lookup("GET", "/list/abc").is_none());
		assert!(router.lookup("GET", "/list/4a2").is_none());
	}

	#[test]
	fn first_validator_wins() {
		let mut router = Router::default();
		router.register_validator("isNum", Arc::new(is_num));
		router.register_validator("isNum", Arc::new(|_: &str| true));
		router.register("GET", "/user/:id|isNum|", vec![1]).unwrap();
		router.build().unwrap();

		assert!(router.lookup("GET", "/user/12").is_some());
		assert!(router.lookup("GET", "/user/ab").is_none());
	}

	#[test]
	fn validator_registry() {
		let mut validators = Validators::default();
		assert!(!validators.contains("isNum"));
		assert!(validators.register("isNum", Arc::new(is_num)));
		assert!(!validators.register("isNum", Arc::new(|_: &str| true)));
		assert!(validators.contains("isNum"));

		let check = validators.get("isNum").unwrap();
		assert!(check("42"));
		assert!(!check("x"));
	}

	#[test]
	fn rejects_duplicate_routes() {
		let mut router = Router::default();
		router.register("GET", "/a", vec![1]).unwrap();
		assert_eq!(
			router.register("GET", "/a", vec![2]),
			Err(RegisterError::Duplicate {
				method: "GET".into(),
				path: "/a".into(),
			})
		);
		router.register("POST", "/a", vec![3]).unwrap();
		router.build().unwrap();

		assert_eq!(router.lookup("GET", "/a").unwrap().handlers, &[1]);
		assert_eq!(router.lookup("POST", "/a").unwrap().handlers, &[3]);
	}

	#[test]
	fn static_routes_have_no_params() {
		let mut router = Router::default();
		let paths = ["/", "/account/v1/signup", "/account/v1/signin", "/account/v1/signout"];
		for (i, path) in paths.iter().enumerate() {
			router.register("POST", path, vec![i]).unwrap();
		}
		router.build().unwrap();

		for (i, path) in paths.iter().enumerate() {
			let found = router.lookup("POST", path).unwrap();
			assert_eq!(found.handlers, &[i]);
			assert!(found.params.is_empty());
		}
	}
}
