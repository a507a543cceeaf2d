//! Nested routers, activation strategies, and title composition.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wayfinder::{
	ActivationDecision, ActivationStrategy, HandlerModule, HandlerRef, HistoryAdapter,
	InMemoryHistory, NavigationInstruction, NavigationOptions, NavigationTrigger, RouteConfig,
	RouteParams, Router, handler_factory,
};

#[derive(Default)]
struct Log(Mutex<Vec<String>>);

impl Log {
	fn push(&self, entry: impl Into<String>) {
		self.0.lock().unwrap().push(entry.into());
	}

	fn entries(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}

	fn count_of(&self, entry: &str) -> usize {
		self.entries().iter().filter(|e| *e == entry).count()
	}
}

struct Recorder {
	name: &'static str,
	log: Arc<Log>,
}

#[async_trait]
impl HandlerModule for Recorder {
	async fn can_activate(
		&self,
		_params: &RouteParams,
		_config: &RouteConfig,
		_instruction: &NavigationInstruction,
	) -> ActivationDecision {
		self.log.push(format!("{}:can_activate", self.name));
		ActivationDecision::Allow
	}

	async fn activate(
		&self,
		_params: &RouteParams,
		_config: &RouteConfig,
		_instruction: &NavigationInstruction,
	) -> anyhow::Result<()> {
		self.log.push(format!("{}:activate", self.name));
		Ok(())
	}

	async fn deactivate(&self) {
		self.log.push(format!("{}:deactivate", self.name));
	}
}

fn recorder(name: &'static str, log: &Arc<Log>) -> HandlerRef {
	let log = log.clone();
	handler_factory(name, move || {
		Arc::new(Recorder {
			name,
			log: log.clone(),
		}) as _
	})
}

fn counting_recorder(
	name: &'static str,
	log: &Arc<Log>,
	created: &Arc<AtomicUsize>,
) -> HandlerRef {
	let log = log.clone();
	let created = created.clone();
	handler_factory(name, move || {
		created.fetch_add(1, Ordering::SeqCst);
		Arc::new(Recorder {
			name,
			log: log.clone(),
		}) as _
	})
}

#[tokio::test]
async fn test_wildcard_remainder_resolves_in_child_router() {
	let log = Arc::new(Log::default());
	let history = Arc::new(InMemoryHistory::new());
	let root = Router::new(history.clone());
	root.configure(|table| {
		table.register(
			RouteConfig::new("app/*rest", recorder("app", &log))?
				.with_name("app")
				.with_title("App"),
		)
	})
	.unwrap();

	let child = root.child("default");
	child
		.configure(|table| {
			table.register(
				RouteConfig::new("settings", recorder("settings", &log))?.with_title("Settings"),
			)?;
			table.register(
				RouteConfig::new("profile/:id", recorder("profile", &log))?.with_title("Profile"),
			)
		})
		.unwrap();

	let outcome = root
		.navigate("app/settings", NavigationOptions::default())
		.await;

	assert!(outcome.is_success());
	// Guards run root-to-leaf across the whole plan, then activations.
	assert_eq!(
		log.entries(),
		vec![
			"app:can_activate",
			"settings:can_activate",
			"app:activate",
			"settings:activate",
		]
	);

	let root_instruction = root.current_instruction().unwrap();
	let child_instruction = child.current_instruction().unwrap();
	assert_eq!(root_instruction.path(), "app/settings");
	assert_eq!(child_instruction.path(), "settings");
	assert_eq!(
		root_instruction.params().get("rest"),
		Some(&"settings".to_string())
	);

	// The tree is linked both ways.
	assert!(Arc::ptr_eq(
		root_instruction.child().unwrap(),
		&child_instruction
	));
	assert!(Arc::ptr_eq(
		&child_instruction.parent().unwrap(),
		&root_instruction
	));

	// Titles compose child-first.
	assert_eq!(history.title(), "Settings | App");
}

#[tokio::test]
async fn test_child_params_stay_local_to_their_node() {
	let log = Arc::new(Log::default());
	let root = Router::new(Arc::new(InMemoryHistory::new()));
	root.configure(|table| {
		table.register(RouteConfig::new("app/*rest", recorder("app", &log))?)
	})
	.unwrap();
	let child = root.child("default");
	child
		.configure(|table| {
			table.register(RouteConfig::new("profile/:id", recorder("profile", &log))?)
		})
		.unwrap();

	assert!(
		root.navigate("app/profile/9?tab=info", NavigationOptions::default())
			.await
			.is_success()
	);

	let root_instruction = root.current_instruction().unwrap();
	let child_instruction = child.current_instruction().unwrap();
	assert!(root_instruction.params().get("id").is_none());
	assert_eq!(child_instruction.params().get("id"), Some(&"9".to_string()));
	// Query params are shared by every node of the tree.
	assert_eq!(
		root_instruction.query_params().get("tab"),
		Some(&"info".to_string())
	);
	assert_eq!(
		child_instruction.query_params().get("tab"),
		Some(&"info".to_string())
	);
}

#[tokio::test]
async fn test_unmatched_child_remainder_fails_whole_navigation() {
	let log = Arc::new(Log::default());
	let root = Router::new(Arc::new(InMemoryHistory::new()));
	root.configure(|table| {
		table.register(RouteConfig::new("app/*rest", recorder("app", &log))?)
	})
	.unwrap();
	let child = root.child("default");
	child
		.configure(|table| {
			table.register(RouteConfig::new("settings", recorder("settings", &log))?)
		})
		.unwrap();

	let outcome = root
		.navigate("app/no/such/page", NavigationOptions::default())
		.await;

	assert!(!outcome.is_success());
	assert!(root.current_instruction().is_none());
	assert!(child.current_instruction().is_none());
	// Nothing activated anywhere.
	assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_replace_strategy_builds_fresh_instances() {
	let log = Arc::new(Log::default());
	let created = Arc::new(AtomicUsize::new(0));
	let router = Router::new(Arc::new(InMemoryHistory::new()));
	router
		.configure(|table| {
			table.register(RouteConfig::new(
				"users/:id",
				counting_recorder("users", &log, &created),
			)?)
		})
		.unwrap();

	router.navigate("users/1", NavigationOptions::default()).await;
	router.navigate("users/2", NavigationOptions::default()).await;

	assert_eq!(created.load(Ordering::SeqCst), 2);
	assert_eq!(log.count_of("users:activate"), 2);
	// The first instance was torn down when the second navigation committed.
	assert_eq!(log.count_of("users:deactivate"), 1);
}

#[tokio::test]
async fn test_invoke_lifecycle_reuses_the_instance() {
	let log = Arc::new(Log::default());
	let created = Arc::new(AtomicUsize::new(0));
	let router = Router::new(Arc::new(InMemoryHistory::new()));
	router
		.configure(|table| {
			table.register(
				RouteConfig::new("users/:id", counting_recorder("users", &log, &created))?
					.with_activation_strategy(ActivationStrategy::InvokeLifecycle),
			)
		})
		.unwrap();

	router.navigate("users/1", NavigationOptions::default()).await;
	router.navigate("users/2", NavigationOptions::default()).await;

	// One instance, two lifecycle runs, nothing torn down.
	assert_eq!(created.load(Ordering::SeqCst), 1);
	assert_eq!(log.count_of("users:activate"), 2);
	assert_eq!(log.count_of("users:deactivate"), 0);
	assert_eq!(
		router.current_instruction().unwrap().params().get("id"),
		Some(&"2".to_string())
	);
}

#[tokio::test]
async fn test_sibling_viewports_activate_in_declaration_order() {
	let log = Arc::new(Log::default());
	let router = Router::new(Arc::new(InMemoryHistory::new()));
	router
		.configure(|table| {
			table.register(
				RouteConfig::new("split", recorder("main", &log))?
					.with_viewport("sidebar", recorder("sidebar", &log)),
			)
		})
		.unwrap();

	assert!(
		router
			.navigate("split", NavigationOptions::default())
			.await
			.is_success()
	);
	assert_eq!(
		log.entries(),
		vec![
			"main:can_activate",
			"sidebar:can_activate",
			"main:activate",
			"sidebar:activate",
		]
	);
}

#[tokio::test]
async fn test_refresh_reruns_current_url_without_pushing() {
	let log = Arc::new(Log::default());
	let history = Arc::new(InMemoryHistory::new());
	let router = Router::new(history.clone());
	router
		.configure(|table| table.register(RouteConfig::new("home", recorder("home", &log))?))
		.unwrap();

	router.navigate("home", NavigationOptions::default()).await;
	let refreshed = router.refresh().await.unwrap();

	assert!(refreshed.is_success());
	assert_eq!(log.count_of("home:activate"), 2);
	assert_eq!(history.back_len(), 0);
	assert!(router.navigation_flags().is_navigating_refresh);
}

#[tokio::test]
async fn test_refresh_before_any_navigation_is_none() {
	let router = Router::new(Arc::new(InMemoryHistory::new()));
	assert!(router.refresh().await.is_none());
}

#[tokio::test]
async fn test_location_changed_does_not_touch_history() {
	let log = Arc::new(Log::default());
	let history = Arc::new(InMemoryHistory::new());
	let router = Router::new(history.clone());
	router
		.configure(|table| table.register(RouteConfig::new("home", recorder("home", &log))?))
		.unwrap();

	let outcome = router
		.location_changed("home", NavigationTrigger::Forward)
		.await;

	assert!(outcome.is_success());
	assert!(history.current().is_none());
	assert!(router.navigation_flags().is_navigating_forward);
}

#[tokio::test]
async fn test_child_lookup_is_idempotent() {
	let root = Router::new(Arc::new(InMemoryHistory::new()));
	let a = root.child("default");
	let b = root.child("default");
	assert!(Arc::ptr_eq(&a, &b));
	assert!(Arc::ptr_eq(&a.root(), &root));
	assert!(root.is_root());
	assert!(!a.is_root());
}
