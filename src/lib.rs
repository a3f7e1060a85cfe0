//! A compressed-trie HTTP router with regex and validator constrained parameters.
//!
//! ```
//! use sprig::{handler, validator, App, Request};
//!
//! let mut app = App::default();
//! app.register_validator("isNum", validator(|v| v.bytes().all(|b| b.is_ascii_digit())));
//! app.get("/blog/:id|isNum|", vec![handler(|ctx| {
//! 	let id = ctx.dynamic("id").unwrap_or_default().to_owned();
//! 	ctx.text(200, &id);
//! })])
//! .unwrap();
//! app.build().unwrap();
//!
//! let res = app.dispatch(Request::new("GET", "/blog/1001"));
//! assert_eq!(res.body, b"1001");
//! assert_eq!(app.dispatch(Request::new("GET", "/blog/abc")).status, 404);
//! ```
//!
//! Route paths are made of `/`-separated segments:
//!
//! - `/blog` matches literally.
//! - `/:id` captures one path component as `id`.
//! - `/:id(^\d+$)` only captures components the regular expression fully matches.
//! - `/:id|isNum|less4|` only captures components every named validator accepts. Validators are
//!   registered on the router before it is built.
//! - `/*` matches the rest of the path and must come last.
//!
//! Each HTTP method gets its own tree. Registration happens up front, [`App::build`] compiles
//! every tree once and the app is read-only afterwards, so lookups need no locking.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod group;
pub mod node;
pub mod pool;
/// Handler types, node flags and path splitting.
pub mod route;
/// Contains the per-method route trees and the validator registry.
pub mod router;
pub mod tree;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::*;

pub use app::App;
pub use config::Config;
pub use context::{Context, Request, Response};
pub use error::{BuildError, ConfigError, RegisterError};
pub use group::Group;
pub use node::{Params, RouteNode};
pub use route::*;
pub use router::{Router, Validators};
pub use tree::{RouteMatch, RouteTree};
