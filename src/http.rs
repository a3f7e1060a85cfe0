use crate::{App, Request, Response};
use anyhow::{Error, Result};
use hyper::{
	body::{self, Body},
	header::{HeaderName, HeaderValue},
	service::Service,
	Server, StatusCode,
};
use std::{
	convert::Infallible,
	future::{ready, Future, Ready},
	net::SocketAddr,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};
use tracing::{info, warn};

pub use hyper;

fn default_error_handler(e: Error) -> hyper::Response<Body> {
	let mut res = hyper::Response::new(Body::from(e.to_string()));
	*res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
	res
}

/// A function that can convert an error into a response.
pub type ErrorHandler = fn(e: Error) -> hyper::Response<Body>;

/// Serves a built [`App`] through hyper.
///
/// ```no_run
/// use sprig::{handler, App, HttpApp};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
/// 	let mut app = App::default();
/// 	app.get("/", vec![handler(|ctx| {
/// 		ctx.text(200, "hello");
/// 	})])?;
/// 	app.build()?;
///
/// 	HttpApp::from(app).run(([127, 0, 0, 1], 3000).into()).await
/// }
/// ```
#[derive(Clone)]
pub struct HttpApp {
	app: Arc<App>,
	internal_error: ErrorHandler,
}

impl From<App> for HttpApp {
	fn from(app: App) -> Self {
		Self::from(Arc::new(app))
	}
}

impl From<Arc<App>> for HttpApp {
	fn from(app: Arc<App>) -> Self {
		Self {
			app,
			internal_error: default_error_handler,
		}
	}
}

impl HttpApp {
	/// Replaces the handler used when a request body cannot be read.
	pub fn internal_error_handler(mut self, handler: ErrorHandler) -> Self {
		self.internal_error = handler;
		self
	}

	pub fn app(&self) -> &App {
		&self.app
	}

	/// Binds `addr` and serves until the server fails.
	pub async fn run(self, addr: SocketAddr) -> Result<()> {
		info!(version = %self.app.version(), %addr, "listening on http://{}", addr);
		Server::try_bind(&addr)?.serve(self).await?;
		Ok(())
	}
}

impl<T> Service<T> for HttpApp {
	type Response = RouteHandler;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, _: T) -> Self::Future {
		ready(Ok(RouteHandler {
			app: Arc::clone(&self.app),
			internal_error: self.internal_error,
		}))
	}
}

/// Responsible for handling the actual HTTP requests from hyper.
pub struct RouteHandler {
	app: Arc<App>,
	internal_error: ErrorHandler,
}

impl Service<hyper::Request<Body>> for RouteHandler {
	type Response = hyper::Response<Body>;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: hyper::Request<Body>) -> Self::Future {
		let app = Arc::clone(&self.app);
		let internal_error = self.internal_error;

		Box::pin(async move {
			let response = match into_request(req).await {
				Ok(request) => into_response(app.dispatch(request)),
				Err(e) => internal_error(e),
			};
			Ok(response)
		})
	}
}

async fn into_request(req: hyper::Request<Body>) -> Result<Request> {
	let (parts, body) = req.into_parts();
	let body = body::to_bytes(body).await?;

	let mut request = Request::new(parts.method.as_str(), parts.uri.path());
	request.query = parts.uri.query().unwrap_or_default().to_owned();
	request.headers = parts
		.headers
		.iter()
		.filter_map(|(name, value)| {
			value
				.to_str()
				.ok()
				.map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect();
	request.body = body.to_vec();
	Ok(request)
}

fn into_response(response: Response) -> hyper::Response<Body> {
	let mut res = hyper::Response::new(Body::from(response.body));
	*res.status_mut() = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	let headers = res.headers_mut();
	for (name, value) in response.headers {
		match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
			(Ok(name), Ok(value)) => {
				headers.append(name, value);
			}
			_ => warn!(%name, "dropping invalid response header"),
		}
	}
	res
}
