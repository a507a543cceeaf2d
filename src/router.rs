//! Router nodes: the hierarchy, navigation state, and the navigate API.
//!
//! A [`Router`] owns its route table, the currently committed instruction,
//! the live per-viewport handler instances, and its child routers (one per
//! named viewport). The root node additionally owns the authoritative
//! navigation-state flags and the supersession epoch; non-root nodes read
//! those through their parent chain.
//!
//! Navigations are never queued. A request that arrives while another is
//! in flight bumps the shared epoch; the older pipeline observes its stale
//! token at the next checkpoint and resolves as canceled ("superseded")
//! without committing anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::activation::ActiveViewport;
use crate::builder;
use crate::error::{NavigationError, RouterError};
use crate::events::{EventDispatcher, RouterEvent, Subscription};
use crate::handler::{NullRenderer, ViewRenderer};
use crate::history::{HistoryAdapter, NavigationTrigger};
use crate::instruction::NavigationInstruction;
use crate::params::{RouteParams, encode_query};
use crate::pipeline::{
	self, CancelReason, NavigationContext, NavigationToken, PipelineProvider, PipelineResult,
	PipelineStage, PipelineStep,
};
use crate::table::RouteTable;

/// Cross-navigation router configuration.
#[derive(Debug, Clone)]
pub struct RouterOptions {
	/// Redirect budget shared by `redirect_to` configs and guard-issued
	/// redirects within one logical navigation.
	pub max_redirects: usize,
	/// Optional per-step timeout; `None` leaves steps unbounded (a
	/// superseding navigation still cancels them).
	pub step_timeout: Option<Duration>,
	/// Separator used when composing document titles child-first.
	pub title_separator: String,
}

impl Default for RouterOptions {
	fn default() -> Self {
		Self {
			max_redirects: 10,
			step_timeout: None,
			title_separator: " | ".to_string(),
		}
	}
}

/// Navigation-state flags, authoritative on the root node only.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NavigationFlags {
	/// True from acceptance of a navigation until it resolves.
	pub is_navigating: bool,
	/// This is the first navigation this root has ever accepted.
	pub is_navigating_first: bool,
	/// Triggered by an explicit API call.
	pub is_navigating_new: bool,
	/// Triggered by the platform back button.
	pub is_navigating_back: bool,
	/// Triggered by the platform forward button.
	pub is_navigating_forward: bool,
	/// Re-running the current URL.
	pub is_navigating_refresh: bool,
	/// Synonym of `is_navigating_new` kept for call sites that ask the
	/// trigger question rather than the history-direction question.
	pub is_explicit_navigation: bool,
}

/// Per-call navigation options.
#[derive(Debug, Clone, Copy)]
pub struct NavigationOptions {
	/// Whether a successful navigation records a history entry.
	pub trigger_history: bool,
	/// Replace the current history entry instead of pushing a new one.
	pub replace: bool,
}

impl Default for NavigationOptions {
	fn default() -> Self {
		Self {
			trigger_history: true,
			replace: false,
		}
	}
}

/// How a navigation resolved. `navigate` never returns `Err`; resolution
/// failures and pipeline rejections land here and in the `Error` event.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
	/// The instruction tree was committed.
	Success(Arc<NavigationInstruction>),
	/// A guard refused or a newer navigation superseded this one.
	Canceled(CancelReason),
	/// Resolution or a pipeline step failed.
	Failed(Arc<NavigationError>),
}

impl NavigationOutcome {
	/// Whether the navigation committed.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}
}

/// One entry of the navigation menu derived from the route table.
///
/// Serializable so hosts can hand the menu straight to their templating
/// layer.
#[derive(Debug, Clone, Serialize)]
pub struct NavModelEntry {
	/// Route name, when the route is named.
	pub name: Option<String>,
	/// Title fragment.
	pub title: Option<String>,
	/// Generated href for parameterless named routes.
	pub href: Option<String>,
	/// Declared menu order.
	pub order: i32,
	/// Opaque settings from the route config.
	pub settings: serde_json::Map<String, Value>,
	/// Whether the route is the committed one.
	pub is_active: bool,
}

/// A node in the router hierarchy.
pub struct Router {
	pub(crate) table: RwLock<RouteTable>,
	pub(crate) children: RwLock<HashMap<String, Arc<Router>>>,
	pub(crate) active: RwLock<HashMap<String, ActiveViewport>>,
	current: RwLock<Option<Arc<NavigationInstruction>>>,
	parent: RwLock<Option<Weak<Router>>>,
	pipeline: Arc<PipelineProvider>,
	renderer: RwLock<Arc<dyn ViewRenderer>>,
	history: Arc<dyn HistoryAdapter>,
	events: EventDispatcher,
	options: RouterOptions,
	/// Supersession epoch, shared by the whole hierarchy.
	epoch: Arc<AtomicU64>,
	/// Root-only: authoritative navigation flags.
	flags: RwLock<NavigationFlags>,
	/// Root-only: whether any navigation was ever accepted.
	has_navigated: AtomicBool,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("table", &*self.table.read())
			.field("children", &self.children.read().keys().collect::<Vec<_>>())
			.field("is_root", &self.parent.read().is_none())
			.finish()
	}
}

impl Router {
	/// Creates a root router with default options.
	pub fn new(history: Arc<dyn HistoryAdapter>) -> Arc<Self> {
		Self::with_options(history, RouterOptions::default())
	}

	/// Creates a root router.
	pub fn with_options(history: Arc<dyn HistoryAdapter>, options: RouterOptions) -> Arc<Self> {
		Arc::new(Self {
			table: RwLock::new(RouteTable::new()),
			children: RwLock::new(HashMap::new()),
			active: RwLock::new(HashMap::new()),
			current: RwLock::new(None),
			parent: RwLock::new(None),
			pipeline: Arc::new(PipelineProvider::new()),
			renderer: RwLock::new(Arc::new(NullRenderer)),
			history,
			events: EventDispatcher::new(),
			options,
			epoch: Arc::new(AtomicU64::new(0)),
			flags: RwLock::new(NavigationFlags::default()),
			has_navigated: AtomicBool::new(false),
		})
	}

	/// Registers routes through a configuration closure.
	///
	/// Registration happens before navigation begins; the table is
	/// read-mostly afterwards.
	pub fn configure<F>(&self, configure: F) -> Result<(), RouterError>
	where
		F: FnOnce(&mut RouteTable) -> Result<(), RouterError>,
	{
		configure(&mut self.table.write())
	}

	/// Creates (or returns) the child router owning the named viewport.
	///
	/// Children are constructed and destroyed with their parent; the
	/// back-reference they hold is non-owning.
	pub fn child(self: &Arc<Self>, viewport: impl Into<String>) -> Arc<Router> {
		let viewport = viewport.into();
		let mut children = self.children.write();
		if let Some(existing) = children.get(&viewport) {
			return existing.clone();
		}
		let child = Arc::new(Router {
			table: RwLock::new(RouteTable::new()),
			children: RwLock::new(HashMap::new()),
			active: RwLock::new(HashMap::new()),
			current: RwLock::new(None),
			parent: RwLock::new(Some(Arc::downgrade(self))),
			pipeline: self.pipeline.clone(),
			renderer: RwLock::new(self.renderer.read().clone()),
			history: self.history.clone(),
			events: EventDispatcher::new(),
			options: self.options.clone(),
			epoch: self.epoch.clone(),
			flags: RwLock::new(NavigationFlags::default()),
			has_navigated: AtomicBool::new(false),
		});
		children.insert(viewport, child.clone());
		child
	}

	/// Walks parent references up to the root node.
	pub fn root(self: &Arc<Self>) -> Arc<Router> {
		let mut node = self.clone();
		loop {
			let parent = node.parent.read().as_ref().and_then(Weak::upgrade);
			match parent {
				Some(parent) => node = parent,
				None => return node,
			}
		}
	}

	/// Whether this node is the hierarchy root.
	pub fn is_root(&self) -> bool {
		self.parent.read().is_none()
	}

	/// Registers a custom pipeline step. The pipeline is shared by the
	/// whole hierarchy.
	pub fn add_pipeline_step(&self, stage: PipelineStage, step: Arc<dyn PipelineStep>) {
		self.pipeline.add_step(stage, step);
	}

	/// Installs the rendering collaborator for this node's viewports.
	pub fn set_renderer(&self, renderer: Arc<dyn ViewRenderer>) {
		*self.renderer.write() = renderer;
	}

	/// Subscribes to navigation events on the hierarchy root.
	pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
	where
		F: Fn(&RouterEvent) + Send + Sync + 'static,
	{
		self.root().events.subscribe(listener)
	}

	/// Disconnects an event listener.
	pub fn unsubscribe(self: &Arc<Self>, subscription: Subscription) -> bool {
		self.root().events.unsubscribe(subscription)
	}

	/// The committed instruction for this node, if any navigation has
	/// succeeded.
	pub fn current_instruction(&self) -> Option<Arc<NavigationInstruction>> {
		self.current.read().clone()
	}

	/// The authoritative navigation flags, read through the root.
	pub fn navigation_flags(self: &Arc<Self>) -> NavigationFlags {
		*self.root().flags.read()
	}

	/// Whether a navigation is currently in flight.
	pub fn is_navigating(self: &Arc<Self>) -> bool {
		self.navigation_flags().is_navigating
	}

	/// Generates an href for a named route.
	///
	/// Parameters not consumed by the pattern are appended as a query
	/// string, sorted for stability.
	pub fn generate(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
		let table = self.table.read();
		let path = table.generate(name, params)?;
		let consumed: Vec<String> = table
			.route_by_name(name)
			.map(|config| config.pattern().param_names().to_vec())
			.unwrap_or_default();
		let leftover: RouteParams = params
			.iter()
			.filter(|(key, _)| !consumed.contains(*key))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();
		if leftover.is_empty() {
			Ok(path)
		} else {
			Ok(format!("{path}?{}", encode_query(&leftover)))
		}
	}

	/// Derives the navigation menu from routes declaring a nav order.
	pub fn nav_model(&self) -> Vec<NavModelEntry> {
		let current = self.current_instruction();
		let table = self.table.read();
		let mut entries: Vec<NavModelEntry> = table
			.routes()
			.iter()
			.filter_map(|config| {
				let order = config.nav_order()?;
				let href = config.name().and_then(|name| {
					if config.pattern().requires_params() {
						None
					} else {
						table.generate(name, &RouteParams::new()).ok()
					}
				});
				let is_active = current
					.as_ref()
					.map(|instruction| Arc::ptr_eq(instruction.config(), config))
					.unwrap_or(false);
				Some(NavModelEntry {
					name: config.name().map(str::to_string),
					title: config.title().map(str::to_string),
					href,
					order,
					settings: config.settings().clone(),
					is_active,
				})
			})
			.collect();
		entries.sort_by_key(|entry| entry.order);
		entries
	}

	/// Navigates to a URL (path plus optional query).
	///
	/// Resolution failures and pipeline rejections resolve the returned
	/// outcome; they are additionally reported through events and never
	/// propagate as panics or `Err`.
	pub async fn navigate(
		self: &Arc<Self>,
		url: &str,
		options: NavigationOptions,
	) -> NavigationOutcome {
		self.run_navigation(url, NavigationTrigger::Explicit, options)
			.await
	}

	/// Navigates to a named route with parameters.
	///
	/// # Errors
	///
	/// Misuse (`UnknownRoute`, `MissingParam`) is a synchronous error,
	/// returned before any pipeline work starts.
	pub async fn navigate_to_route(
		self: &Arc<Self>,
		name: &str,
		params: &RouteParams,
		options: NavigationOptions,
	) -> Result<NavigationOutcome, RouterError> {
		let url = self.generate(name, params)?;
		Ok(self.navigate(&url, options).await)
	}

	/// Steps the history back one entry and navigates to it. Returns
	/// `None` when there is nothing to go back to.
	///
	/// The adapter entry is restored when the navigation does not commit,
	/// so a canceled or failed back navigation leaves URL and mounted
	/// state in agreement.
	pub async fn navigate_back(self: &Arc<Self>) -> Option<NavigationOutcome> {
		let root = self.root();
		let url = root.history.back()?;
		let outcome = root
			.run_navigation(
				&url,
				NavigationTrigger::Back,
				NavigationOptions {
					trigger_history: false,
					replace: false,
				},
			)
			.await;
		if !outcome.is_success() {
			let _ = root.history.forward();
		}
		Some(outcome)
	}

	/// Re-runs the pipeline for the current URL. Returns `None` when
	/// nothing has been navigated to yet.
	pub async fn refresh(self: &Arc<Self>) -> Option<NavigationOutcome> {
		let root = self.root();
		let url = root
			.current_instruction()
			.map(|instruction| instruction.url().to_string())
			.or_else(|| root.history.current())?;
		Some(
			root.run_navigation(
				&url,
				NavigationTrigger::Refresh,
				NavigationOptions {
					trigger_history: false,
					replace: false,
				},
			)
			.await,
		)
	}

	/// Entry point for history adapters reporting a platform URL change.
	pub async fn location_changed(
		self: &Arc<Self>,
		url: &str,
		trigger: NavigationTrigger,
	) -> NavigationOutcome {
		self.root()
			.run_navigation(
				url,
				trigger,
				NavigationOptions {
					trigger_history: false,
					replace: false,
				},
			)
			.await
	}

	async fn run_navigation(
		self: &Arc<Self>,
		url: &str,
		trigger: NavigationTrigger,
		options: NavigationOptions,
	) -> NavigationOutcome {
		let root = self.root();
		let token = NavigationToken::next(&root.epoch);
		root.begin(trigger);
		debug!(url, ?trigger, "navigation accepted");
		root.events.emit(&RouterEvent::Processing {
			url: url.to_string(),
		});

		let outcome = self.pipeline_loop(&root, url, &token, trigger, options).await;

		root.finish(&token);
		match &outcome {
			NavigationOutcome::Success(instruction) => {
				debug!(url = instruction.url(), "navigation committed");
				root.events.emit(&RouterEvent::Success {
					instruction: instruction.clone(),
				});
			}
			NavigationOutcome::Canceled(reason) => {
				debug!(url, %reason, "navigation canceled");
				root.events.emit(&RouterEvent::Canceled {
					url: url.to_string(),
					reason: reason.clone(),
				});
			}
			NavigationOutcome::Failed(error) => {
				warn!(url, error = %error, "navigation failed");
				root.events.emit(&RouterEvent::Error {
					url: url.to_string(),
					error: error.clone(),
				});
			}
		}
		root.events.emit(&RouterEvent::Complete {
			url: url.to_string(),
		});
		outcome
	}

	async fn pipeline_loop(
		self: &Arc<Self>,
		root: &Arc<Router>,
		url: &str,
		token: &NavigationToken,
		trigger: NavigationTrigger,
		options: NavigationOptions,
	) -> NavigationOutcome {
		let mut target = url.to_string();
		let mut hops = 0usize;
		loop {
			if !token.is_current() {
				return NavigationOutcome::Canceled(CancelReason::Superseded);
			}

			let builder::BuiltNavigation {
				instruction,
				plan,
				resolved_url,
			} = match builder::build(self, &target, root.options.max_redirects, &mut hops) {
				Ok(built) => built,
				Err(error) => return NavigationOutcome::Failed(Arc::new(error)),
			};

			let ctx = NavigationContext {
				url: resolved_url,
				instruction: instruction.clone(),
				plan,
				token: token.clone(),
				renderer: self.renderer.read().clone(),
			};

			match pipeline::run(&root.pipeline, root.options.step_timeout, &ctx).await {
				PipelineResult::Completed => {
					if self.commit(root, &ctx, trigger, options).await {
						return NavigationOutcome::Success(instruction);
					}
					return NavigationOutcome::Canceled(CancelReason::Superseded);
				}
				PipelineResult::Canceled(reason) => {
					return NavigationOutcome::Canceled(reason);
				}
				PipelineResult::Redirected(redirect_target) => {
					hops += 1;
					if hops > root.options.max_redirects {
						return NavigationOutcome::Failed(Arc::new(
							NavigationError::RedirectLoop {
								url: url.to_string(),
								limit: root.options.max_redirects,
							},
						));
					}
					debug!(from = %target, to = %redirect_target, "pipeline redirected");
					target = redirect_target;
				}
				PipelineResult::Rejected(error) => {
					return NavigationOutcome::Failed(Arc::new(error));
				}
			}
		}
	}

	/// Commits a completed pipeline. Returns whether the commit happened.
	///
	/// The token check and the state swap for the whole tree contain no
	/// await point, so a concurrent navigation observes either the old
	/// tree or the new one, never a half-committed mix. Displaced
	/// instances are removed from router state by the swap; only this run
	/// holds them afterwards, so their teardown hooks run exactly once
	/// regardless of later supersession.
	async fn commit(
		self: &Arc<Self>,
		root: &Arc<Router>,
		ctx: &NavigationContext,
		trigger: NavigationTrigger,
		options: NavigationOptions,
	) -> bool {
		if !ctx.token.is_current() {
			return false;
		}

		let mut displaced = Vec::new();
		for entry in &ctx.plan {
			{
				let mut active = entry.node.active.write();
				for viewport in entry.instruction.viewports() {
					if let Some(previous) = viewport.previous() {
						displaced.push(previous.clone());
					}
					active.insert(
						viewport.name().to_string(),
						ActiveViewport {
							handler: viewport.handler().clone(),
							component: viewport.component().clone(),
						},
					);
				}
			}
			*entry.node.current.write() = Some(entry.instruction.clone());
		}

		// The URL bar moves only after the pipeline fully completes, so a
		// canceled navigation never leaves URL and state divergent.
		if self.is_root() && options.trigger_history {
			match trigger {
				NavigationTrigger::Explicit => {
					if options.replace {
						root.history.replace(&ctx.url);
					} else {
						root.history.push(&ctx.url);
					}
				}
				NavigationTrigger::Refresh => root.history.replace(&ctx.url),
				// The adapter already repositioned itself.
				NavigationTrigger::Back | NavigationTrigger::Forward => {}
			}
		}

		if let Some(title) = ctx
			.instruction
			.compose_title(&root.options.title_separator)
		{
			root.history.set_title(&title);
		}

		// Leaf-to-root, matching the deactivation-guard order.
		for component in displaced.iter().rev() {
			component.deactivate().await;
		}

		true
	}

	/// Root-only: computes the flag set for an accepted navigation.
	fn begin(&self, trigger: NavigationTrigger) {
		let first = !self.has_navigated.swap(true, Ordering::SeqCst);
		let explicit = trigger == NavigationTrigger::Explicit;
		*self.flags.write() = NavigationFlags {
			is_navigating: true,
			is_navigating_first: first,
			is_navigating_new: explicit,
			is_navigating_back: trigger == NavigationTrigger::Back,
			is_navigating_forward: trigger == NavigationTrigger::Forward,
			is_navigating_refresh: trigger == NavigationTrigger::Refresh,
			is_explicit_navigation: explicit,
		};
	}

	/// Root-only: closes the navigation window unless a newer navigation
	/// already owns it.
	fn finish(&self, token: &NavigationToken) {
		if token.is_current() {
			self.flags.write().is_navigating = false;
		}
	}
}
