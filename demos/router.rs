use sprig::{handler, hook, validator, App, Config, HttpApp};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
		.init();

	let config = match std::env::args().nth(1) {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};

	let mut app = App::new(config);
	app.register_validator("isNum", validator(|v| v.bytes().all(|b| b.is_ascii_digit())));

	app.use_middleware(handler(|ctx| {
		let started = Instant::now();
		ctx.append_end(hook(move |ctx| {
			tracing::info!(
				method = %ctx.method(),
				path = %ctx.path(),
				status = ctx.status(),
				elapsed = ?started.elapsed(),
				"request"
			);
			Ok(())
		}));
	}));

	app.get("/", vec![handler(|ctx| {
		ctx.text(200, "hello");
	})])?;
	app.get("/blog/:id|isNum|", vec![handler(|ctx| {
		let id = ctx.dynamic("id").unwrap_or_default().to_owned();
		ctx.text(200, &format!("blog {}", id));
	})])?;

	{
		let mut account = app.group("/account");
		account.use_middleware(handler(|ctx| {
			if ctx.header("Authorization").is_none() {
				ctx.text(401, "unauthorized");
				ctx.stop();
			}
		}));
		account
			.post("/v1/signin", vec![handler(|ctx| {
				ctx.text(200, "signed in");
			})])?
			.post("/v1/signout", vec![handler(|ctx| {
				ctx.text(200, "signed out");
			})])?;
	}

	app.get("/static/*", vec![handler(|ctx| {
		let file = ctx.path().trim_start_matches("/static/").to_owned();
		ctx.text(200, &file);
	})])?;

	app.build()?;
	HttpApp::from(app).run(([127, 0, 0, 1], 3000).into()).await
}
