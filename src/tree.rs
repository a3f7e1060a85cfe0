use crate::{
	error::BuildError,
	node::{Params, RouteNode},
	route::split_path,
	router::Validators,
};

/// The result of a successful lookup.
#[derive(Debug, PartialEq)]
pub struct RouteMatch<'r, 'p, H> {
	/// Route-level middleware followed by the terminal handler.
	pub handlers: &'r [H],
	/// Captured dynamic segments; empty when the route has none.
	pub params: Params<'r, 'p>,
}

/// The compressed trie of a single HTTP method.
#[derive(Debug)]
pub struct RouteTree<H> {
	root: RouteNode<H>,
}

impl<H> Default for RouteTree<H> {
	fn default() -> Self {
		Self {
			root: RouteNode::default(),
		}
	}
}

impl<H> RouteTree<H> {
	/// Adds a route. Returns `false` and leaves the tree untouched when `handlers` is empty or
	/// the path is already taken.
	pub fn insert(&mut self, path: &str, handlers: Vec<H>) -> bool {
		let segments = split_path(path);
		self.root.put(path, &segments, 0, handlers)
	}

	pub fn build(&mut self, validators: &Validators) -> Result<(), BuildError> {
		self.root.build(validators)
	}

	pub fn lookup<'r, 'p>(&'r self, path: &'p str) -> Option<RouteMatch<'r, 'p, H>> {
		let mut params = None;
		let handlers = self.root.lookup(path, &mut params)?;

		Some(RouteMatch {
			handlers,
			params: params.unwrap_or_default(),
		})
	}

	/// Finds a top-level node by exact path, falling back to the (possibly merged) root.
	pub fn child(&self, path: &str) -> Option<&RouteNode<H>> {
		self.root
			.child(path)
			.or_else(|| Some(&self.root).filter(|root| root.path() == path))
	}

	pub fn children(&self) -> &[RouteNode<H>] {
		self.root.children()
	}

	pub fn root(&self) -> &RouteNode<H> {
		&self.root
	}

	pub fn reset(&mut self) {
		self.root.reset();
	}
}
