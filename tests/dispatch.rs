use sprig::{handler, hook, validator, App, Context, Request};
use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
	thread,
};

fn counter() -> Arc<AtomicUsize> {
	Arc::new(AtomicUsize::new(0))
}

fn counting(count: &Arc<AtomicUsize>) -> sprig::Handler {
	let count = Arc::clone(count);
	handler(move |_: &mut Context| {
		count.fetch_add(1, Ordering::SeqCst);
	})
}

#[test]
fn middleware_can_stop_before_routing() {
	let route_calls = counter();
	let end_calls = counter();

	let mut app = App::default();
	let ends = Arc::clone(&end_calls);
	app.use_middleware(handler(move |ctx| {
		let ends = Arc::clone(&ends);
		ctx.append_end(hook(move |_| {
			ends.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));

		if ctx.method() == "GET" && ctx.path() == "/blocked" {
			ctx.text(403, "blocked");
			ctx.stop();
		}
	}));
	app.get("/blocked", vec![counting(&route_calls)]).unwrap();
	app.get("/open", vec![counting(&route_calls)]).unwrap();
	app.build().unwrap();

	let res = app.dispatch(Request::new("GET", "/blocked"));
	assert_eq!(res.status, 403);
	assert_eq!(route_calls.load(Ordering::SeqCst), 0);
	assert_eq!(end_calls.load(Ordering::SeqCst), 1);

	app.dispatch(Request::new("GET", "/open"));
	assert_eq!(route_calls.load(Ordering::SeqCst), 1);
	assert_eq!(end_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn handler_chain_stops_and_skips_after_hooks() {
	let order = Arc::new(Mutex::new(Vec::new()));

	let push = |tag: &'static str, stop: bool| {
		let order = Arc::clone(&order);
		handler(move |ctx: &mut Context| {
			order.lock().unwrap().push(tag);
			let after = Arc::clone(&order);
			ctx.append_after(hook(move |_| {
				after.lock().unwrap().push("after");
				Ok(())
			}));
			if stop {
				ctx.stop();
			}
		})
	};

	let mut app = App::default();
	app.get("/stop", vec![push("auth", true), push("handler", false)]).unwrap();
	app.get("/go", vec![push("auth", false), push("handler", false)]).unwrap();
	app.build().unwrap();

	app.dispatch(Request::new("GET", "/stop"));
	assert_eq!(*order.lock().unwrap(), vec!["auth"]);

	order.lock().unwrap().clear();
	app.dispatch(Request::new("GET", "/go"));
	assert_eq!(*order.lock().unwrap(), vec!["auth", "handler", "after", "after"]);
}

#[test]
fn end_hooks_run_in_reverse_order() {
	let order = Arc::new(Mutex::new(Vec::new()));
	let mut app = App::default();

	let hooks = Arc::clone(&order);
	app.get("/", vec![handler(move |ctx| {
		for i in 0..3 {
			let hooks = Arc::clone(&hooks);
			ctx.append_end(hook(move |_| {
				hooks.lock().unwrap().push(i);
				Ok(())
			}));
		}
	})])
	.unwrap();
	app.build().unwrap();

	app.dispatch(Request::new("GET", "/"));
	assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
}

#[test]
fn not_found_still_runs_end_hooks() {
	let end_calls = counter();
	let ends = Arc::clone(&end_calls);

	let mut app = App::default();
	app.use_middleware(handler(move |ctx| {
		let ends = Arc::clone(&ends);
		ctx.append_end(hook(move |_| {
			ends.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));
	}));
	app.build().unwrap();

	let res = app.dispatch(Request::new("DELETE", "/missing"));
	assert_eq!(res.status, 404);
	assert_eq!(res.body, b"PAGE NOT FOUND");
	assert_eq!(end_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn panics_are_recovered() {
	let end_calls = counter();
	let ends = Arc::clone(&end_calls);

	let mut app = App::default();
	app.get("/boom", vec![handler(move |ctx| {
		let ends = Arc::clone(&ends);
		ctx.append_end(hook(move |_| {
			ends.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));
		ctx.write("partial");
		panic!("handler exploded");
	})])
	.unwrap();
	app.get("/fine", vec![handler(|ctx| {
		ctx.text(200, "fine");
	})])
	.unwrap();
	app.build().unwrap();

	let res = app.dispatch(Request::new("GET", "/boom"));
	assert_eq!(res.status, 500);
	assert!(res.body.is_empty());
	assert_eq!(end_calls.load(Ordering::SeqCst), 1);

	let res = app.dispatch(Request::new("GET", "/fine"));
	assert_eq!(res.status, 200);
	assert_eq!(res.body, b"fine");
}

#[test]
fn params_reach_the_context() {
	let mut app = App::default();
	app.register_validator("isNum", validator(|v| v.bytes().all(|b| b.is_ascii_digit())));
	app.get("/user/:id|isNum|/post/:slug(^[a-z-]+$)", vec![handler(|ctx| {
		let body = format!(
			"{}/{}",
			ctx.dynamic("id").unwrap_or_default(),
			ctx.dynamic(":slug").unwrap_or_default()
		);
		ctx.text(200, &body);
	})])
	.unwrap();
	app.get("/static/*", vec![handler(|ctx| {
		let count = ctx.dynamics().len();
		ctx.text(200, &count.to_string());
	})])
	.unwrap();
	app.build().unwrap();

	let res = app.dispatch(Request::new("GET", "/user/7/post/hello-world"));
	assert_eq!(res.body, b"7/hello-world");
	assert_eq!(app.dispatch(Request::new("GET", "/user/x/post/hello")).status, 404);
	assert_eq!(app.dispatch(Request::new("GET", "/user/7/post/Hello")).status, 404);

	let res = app.dispatch(Request::new("GET", "/static/css/site.css"));
	assert_eq!(res.body, b"0");
}

#[test]
fn pooled_contexts_do_not_leak_between_requests() {
	let mut app = App::default();
	app.get("/set/:id", vec![handler(|ctx| {
		ctx.set_value("seen", true);
		ctx.set_header("X-Set", "1");
		ctx.write("set");
	})])
	.unwrap();
	app.get("/check", vec![handler(|ctx| {
		let seen = ctx.value::<bool>("seen").is_some() || ctx.dynamic("id").is_some();
		ctx.text(200, if seen { "leaked" } else { "clean" });
	})])
	.unwrap();
	app.build().unwrap();

	app.dispatch(Request::new("GET", "/set/1"));
	let res = app.dispatch(Request::new("GET", "/check"));
	assert_eq!(res.body, b"clean");
	assert!(res.headers.iter().all(|(name, _)| name != "X-Set"));
}

#[test]
fn unknown_validator_fails_the_build() {
	let mut app = App::default();
	app.get("/list/:id|unknownValidator|", vec![handler(|_| {})]).unwrap();
	assert!(app.build().is_err());
}

#[test]
fn concurrent_dispatch() {
	let mut app = App::default();
	app.get("/item/:id", vec![handler(|ctx| {
		let id = ctx.dynamic("id").unwrap_or_default().to_owned();
		ctx.text(200, &id);
	})])
	.unwrap();
	app.build().unwrap();
	let app = Arc::new(app);

	let workers: Vec<_> = (0..8)
		.map(|worker| {
			let app = Arc::clone(&app);
			thread::spawn(move || {
				for i in 0..200 {
					let id = format!("{}-{}", worker, i);
					let res = app.dispatch(Request::new("GET", &format!("/item/{}", id)));
					assert_eq!(res.body, id.as_bytes());
				}
			})
		})
		.collect();

	for worker in workers {
		worker.join().unwrap();
	}
}
