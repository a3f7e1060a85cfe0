use crate::{
	error::BuildError,
	route::{Flags, Validator},
	router::Validators,
};
use regex::Regex;
use std::{
	collections::HashMap,
	fmt::{self, Debug, Formatter},
};

/// Parameters captured by a lookup. Keys borrow the tree, values borrow the looked-up path.
pub type Params<'r, 'p> = HashMap<&'r str, &'p str>;

/// One node of a per-method compressed trie.
///
/// A node starts out owning a single raw segment such as `/blog`, `/:id(^\d+$)|isNum|` or `/*`.
/// [`build`](RouteNode::build) compiles the constraints of dynamic segments and folds chains of
/// handler-less static nodes into one, after which the node is only read.
pub struct RouteNode<H> {
	full_path: String,
	path: String,
	handlers: Vec<H>,
	validators: Vec<Validator>,
	flags: Flags,
	dynamic_name: String,
	dynamic_num: usize,
	pattern: Option<Regex>,
	children: Vec<RouteNode<H>>,
}

impl<H> Default for RouteNode<H> {
	fn default() -> Self {
		Self {
			full_path: String::new(),
			path: String::new(),
			handlers: Vec::new(),
			validators: Vec::new(),
			flags: Flags::STATIC,
			dynamic_name: String::new(),
			dynamic_num: 0,
			pattern: None,
			children: Vec::new(),
		}
	}
}

impl<H> Debug for RouteNode<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteNode")
			.field("path", &self.path)
			.field("full_path", &self.full_path)
			.field("flags", &self.flags)
			.field("dynamic_name", &self.dynamic_name)
			.field("dynamic_num", &self.dynamic_num)
			.field("pattern", &self.pattern)
			.field("validators", &self.validators.len())
			.field("handlers", &self.handlers.len())
			.field("children", &self.children)
			.finish()
	}
}

impl<H> RouteNode<H> {
	fn with_segment(segment: &str) -> Self {
		Self {
			path: segment.to_owned(),
			flags: Flags::of_segment(segment),
			..Self::default()
		}
	}

	/// Plants `handlers` at the node reached by `segments[depth..]`, creating nodes on the way.
	///
	/// Returns `false` without touching the tree when `handlers` is empty or when the terminal
	/// node already carries handlers, including a wildcard that absorbs the new registration.
	pub fn put(&mut self, full_path: &str, segments: &[String], depth: usize, handlers: Vec<H>) -> bool {
		if handlers.is_empty() {
			return false;
		}

		if depth >= segments.len() || self.is_wildcard() {
			if self.is_handler() {
				return false;
			}

			self.full_path = full_path.to_owned();
			self.handlers = handlers;
			return true;
		}

		let segment = &segments[depth];
		let index = match self
			.children
			.iter()
			.position(|child| child.path == *segment || child.is_wildcard())
		{
			Some(index) => index,
			None => {
				self.children.push(RouteNode::with_segment(segment));
				self.children.len() - 1
			}
		};

		self.children[index].put(full_path, segments, depth + 1, handlers)
	}

	/// Compiles regular expressions and validators, merges static chains and counts the dynamic
	/// parameters of the subtree. Stops at the first failing node.
	pub fn build(&mut self, validators: &Validators) -> Result<(), BuildError> {
		if self.is_wildcard() {
			return Ok(());
		}

		if self.is_dynamic() {
			self.parse_regex()?;
			self.parse_validators(validators)?;
			self.parse_dynamic_name();
		}

		self.merge();

		for child in self.children.iter_mut() {
			child.build(validators)?;
		}

		self.count_dynamic_num();
		Ok(())
	}

	// e.g. /:id(^\d+$)
	fn parse_regex(&mut self) -> Result<(), BuildError> {
		let start = match self.path.find('(') {
			Some(start) => start,
			None => return Ok(()),
		};

		let end = match self.path.find(')') {
			Some(end) => end,
			None => return Err(BuildError::UnclosedRegex {
				path: self.full_path.clone(),
				segment: self.path.clone(),
			}),
		};

		if start + 1 >= end {
			return Err(BuildError::EmptyRegex {
				path: self.full_path.clone(),
				segment: self.path.clone(),
			});
		}

		let expression = format!("^(?:{})$", &self.path[start + 1..end]);
		let pattern = Regex::new(&expression).map_err(|source| BuildError::InvalidRegex {
			path: self.full_path.clone(),
			segment: self.path.clone(),
			source,
		})?;

		self.pattern = Some(pattern);
		self.flags.insert(Flags::REGEXP);
		Ok(())
	}

	// e.g. /:id|isNum|less4|
	fn parse_validators(&mut self, validators: &Validators) -> Result<(), BuildError> {
		let start = match self.path.find('|') {
			Some(start) => start,
			None => return Ok(()),
		};

		let end = match self.path.rfind('|') {
			Some(end) if end != start => end,
			_ => return Err(BuildError::UnclosedValidators {
				path: self.full_path.clone(),
				segment: self.path.clone(),
			}),
		};

		let names = &self.path[start + 1..end];
		if names.split('|').any(str::is_empty) {
			return Err(BuildError::EmptyValidators {
				path: self.full_path.clone(),
				segment: self.path.clone(),
			});
		}

		let mut resolved = Vec::new();
		for name in names.split('|') {
			match validators.get(name) {
				Some(validator) => resolved.push(validator),
				None => return Err(BuildError::UnknownValidator {
					path: self.full_path.clone(),
					segment: self.path.clone(),
					name: name.to_owned(),
				}),
			}
		}

		self.validators = resolved;
		self.flags.insert(Flags::VALIDATOR);
		Ok(())
	}

	// /:id(^\d+$)|less4| => id
	fn parse_dynamic_name(&mut self) {
		let rest = self.path.get(2..).unwrap_or_default();
		let end = rest.find(|c: char| c == '|' || c == '(').unwrap_or_else(|| rest.len());
		self.dynamic_name = rest[..end].to_owned();
	}

	fn merge(&mut self) {
		while self.children.len() == 1
			&& self.flags.is_static()
			&& !self.is_handler()
			&& self.children[0].is_static()
		{
			let child = match self.children.pop() {
				Some(child) => child,
				None => return,
			};

			self.path.push_str(&child.path);
			self.flags.insert(child.flags);
			self.full_path = child.full_path;
			self.handlers = child.handlers;
			self.children = child.children;
		}
	}

	fn count_dynamic_num(&mut self) {
		let deepest = self
			.children
			.iter()
			.map(|child| child.dynamic_num)
			.max()
			.unwrap_or(0);

		self.dynamic_num = if self.is_dynamic() { deepest + 1 } else { deepest };
	}

	/// Finds the handlers for `path`, binding dynamic segments into `params`.
	///
	/// `params` is allocated on the first binding. Bindings made on a branch that later fails are
	/// left in place; only the branch that succeeds is returned.
	pub fn lookup<'r, 'p>(&'r self, path: &'p str, params: &mut Option<Params<'r, 'p>>) -> Option<&'r [H]> {
		if self.is_wildcard() {
			return self.matched();
		}

		if self.is_dynamic() {
			return self.lookup_dynamic(path, params);
		}

		self.lookup_static(path, params)
	}

	fn lookup_static<'r, 'p>(&'r self, path: &'p str, params: &mut Option<Params<'r, 'p>>) -> Option<&'r [H]> {
		if self.path == path {
			return self.matched();
		}

		// /users must not match /user, nor /user match /users
		let rest = match path.strip_prefix(self.path.as_str()) {
			Some(rest) if rest.starts_with('/') => rest,
			_ => return None,
		};

		self.children
			.iter()
			.find_map(|child| child.lookup(rest, params))
	}

	fn lookup_dynamic<'r, 'p>(&'r self, path: &'p str, params: &mut Option<Params<'r, 'p>>) -> Option<&'r [H]> {
		let body = path.strip_prefix('/')?;
		let (value, rest) = match body.find('/') {
			Some(end) => body.split_at(end),
			None => (body, ""),
		};

		if !self.accepts(value) {
			return None;
		}

		params
			.get_or_insert_with(|| HashMap::with_capacity(self.dynamic_num))
			.insert(self.dynamic_name.as_str(), value);

		if rest.is_empty() {
			return self.matched();
		}

		self.children
			.iter()
			.find_map(|child| child.lookup(rest, params))
	}

	fn accepts(&self, value: &str) -> bool {
		if let Some(pattern) = &self.pattern {
			if !pattern.is_match(value) {
				return false;
			}
		}

		self.validators.iter().all(|validator| validator(value))
	}

	fn matched(&self) -> Option<&[H]> {
		if self.handlers.is_empty() {
			None
		} else {
			Some(&self.handlers)
		}
	}

	/// Finds a direct child owning exactly `path`.
	pub fn child(&self, path: &str) -> Option<&RouteNode<H>> {
		self.children.iter().find(|child| child.path == path)
	}

	pub fn children(&self) -> &[RouteNode<H>] {
		&self.children
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	/// The registration path that planted this node's handlers, if any.
	pub fn full_path(&self) -> &str {
		&self.full_path
	}

	pub fn handlers(&self) -> &[H] {
		&self.handlers
	}

	pub fn flags(&self) -> Flags {
		self.flags
	}

	pub fn dynamic_name(&self) -> &str {
		&self.dynamic_name
	}

	pub fn dynamic_num(&self) -> usize {
		self.dynamic_num
	}

	pub fn is_static(&self) -> bool {
		self.flags.is_static()
	}

	pub fn is_dynamic(&self) -> bool {
		self.flags.contains(Flags::DYNAMIC)
	}

	pub fn is_wildcard(&self) -> bool {
		self.flags.contains(Flags::WILDCARD)
	}

	pub fn is_regexp(&self) -> bool {
		self.flags.contains(Flags::REGEXP)
	}

	pub fn is_validator(&self) -> bool {
		self.flags.contains(Flags::VALIDATOR)
	}

	pub fn is_handler(&self) -> bool {
		!self.handlers.is_empty()
	}

	/// Clears the node back to an empty static root.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}
