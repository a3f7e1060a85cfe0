use crate::Context;
use std::{
	fmt::{self, Debug, Formatter},
	ops::BitOr,
	sync::Arc,
};

/// Marks a dynamic segment, e.g. `/user/:name`.
pub const DYNAMIC_CHARACTER: u8 = b':';

/// Marks a wildcard segment, e.g. `/static/*`.
pub const WILDCARD_CHARACTER: u8 = b'*';

/// A route handler or route-level middleware.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// A named predicate over a single captured path component.
pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A hook appended to a context during dispatch. Hooks run last-appended-first and the first
/// error stops the remaining hooks of the same list.
pub type Hook = Box<dyn FnOnce(&mut Context) -> anyhow::Result<()> + Send>;

/// Wraps a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
	F: Fn(&mut Context) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Wraps a closure as a [`Validator`].
pub fn validator<F>(f: F) -> Validator
where
	F: Fn(&str) -> bool + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Wraps a closure as a [`Hook`].
pub fn hook<F>(f: F) -> Hook
where
	F: FnOnce(&mut Context) -> anyhow::Result<()> + Send + 'static,
{
	Box::new(f)
}

/// Capability bits of a route node.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
	pub const STATIC: Flags = Flags(0);
	pub const DYNAMIC: Flags = Flags(1 << 1);
	pub const WILDCARD: Flags = Flags(1 << 2);
	pub const REGEXP: Flags = Flags(1 << 3);
	pub const VALIDATOR: Flags = Flags(1 << 4);

	/// Derives the initial flags of a raw segment from its second character.
	pub fn of_segment(segment: &str) -> Self {
		match segment.as_bytes().get(1) {
			Some(&DYNAMIC_CHARACTER) => Flags::DYNAMIC,
			Some(&WILDCARD_CHARACTER) => Flags::WILDCARD,
			_ => Flags::STATIC,
		}
	}

	pub fn contains(self, other: Flags) -> bool {
		self.0 & other.0 == other.0 && other.0 != 0
	}

	pub fn insert(&mut self, other: Flags) {
		self.0 |= other.0;
	}

	pub fn is_static(self) -> bool {
		self.0 == 0
	}

	pub fn bits(self) -> u8 {
		self.0
	}
}

impl BitOr for Flags {
	type Output = Flags;

	fn bitor(self, rhs: Flags) -> Flags {
		Flags(self.0 | rhs.0)
	}
}

impl Debug for Flags {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.is_static() {
			return write!(f, "STATIC");
		}

		let names = [
			(Flags::DYNAMIC, "DYNAMIC"),
			(Flags::WILDCARD, "WILDCARD"),
			(Flags::REGEXP, "REGEXP"),
			(Flags::VALIDATOR, "VALIDATOR"),
		];
		let mut first = true;
		for (flag, name) in names.iter() {
			if self.contains(*flag) {
				if !first {
					write!(f, " | ")?;
				}
				write!(f, "{}", name)?;
				first = false;
			}
		}
		Ok(())
	}
}

/// Splits a registration path into `/`-prefixed segments.
///
/// Empty fragments are dropped, so `//a` yields `["/a"]`, and nothing after a wildcard segment
/// is kept. The root path `/` is the single segment `["/"]`.
///
/// ```
/// use sprig::split_path;
///
/// assert_eq!(split_path("/blog/:id/*/ignored"), vec!["/blog", "/:id", "/*"]);
/// assert_eq!(split_path("/"), vec!["/"]);
/// ```
pub fn split_path(path: &str) -> Vec<String> {
	if path == "/" {
		return vec!["/".to_owned()];
	}

	let mut out = Vec::new();
	for fragment in path.split('/') {
		if fragment.is_empty() {
			continue;
		}

		out.push(format!("/{}", fragment));
		if fragment.as_bytes()[0] == WILDCARD_CHARACTER {
			break;
		}
	}
	out
}
