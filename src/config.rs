//! Route configuration.
//!
//! A [`RouteConfig`] maps a compiled pattern to the handler(s) it activates,
//! plus navigation metadata. Configs are built with a consuming builder and
//! are immutable once registered in a [`RouteTable`](crate::table::RouteTable).

use serde_json::Value;

use crate::activation::ActivationStrategy;
use crate::error::RouterError;
use crate::handler::HandlerRef;
use crate::pattern::RoutePattern;

/// Name of the viewport a single-target route activates into.
pub const DEFAULT_VIEWPORT: &str = "default";

/// One viewport the route targets.
pub struct ViewportTarget {
	/// Viewport name; [`DEFAULT_VIEWPORT`] for single-target routes.
	pub name: String,
	/// Factory for the handler activated into this viewport.
	pub handler: HandlerRef,
}

impl std::fmt::Debug for ViewportTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ViewportTarget")
			.field("name", &self.name)
			.field("handler", &self.handler.type_name())
			.finish()
	}
}

/// A pattern-to-handler mapping with optional metadata.
pub struct RouteConfig {
	pattern: RoutePattern,
	name: Option<String>,
	title: Option<String>,
	nav_order: Option<i32>,
	settings: serde_json::Map<String, Value>,
	/// Targets in declaration order. Declaration order is load-bearing:
	/// it decides which viewport's guard failure wins a stage.
	viewports: Vec<ViewportTarget>,
	activation_strategy: Option<ActivationStrategy>,
	redirect_to: Option<String>,
}

impl std::fmt::Debug for RouteConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteConfig")
			.field("pattern", &self.pattern.raw())
			.field("name", &self.name)
			.field("viewports", &self.viewports)
			.field("redirect_to", &self.redirect_to)
			.finish()
	}
}

impl RouteConfig {
	/// Creates a route that activates `handler` into the default viewport.
	///
	/// # Errors
	///
	/// Fails when the pattern does not compile; registration never defers
	/// pattern errors to match time.
	pub fn new(pattern: &str, handler: HandlerRef) -> Result<Self, RouterError> {
		Ok(Self::with_pattern(RoutePattern::compile(pattern)?)
			.with_viewport(DEFAULT_VIEWPORT, handler))
	}

	/// Creates a route from a pre-built regex pattern.
	pub fn from_regex(regex: regex::Regex, handler: HandlerRef) -> Self {
		Self::with_pattern(RoutePattern::from_regex(regex)).with_viewport(DEFAULT_VIEWPORT, handler)
	}

	/// Creates a redirecting route: matching it restarts resolution against
	/// `target` instead of activating anything.
	pub fn redirect(pattern: &str, target: impl Into<String>) -> Result<Self, RouterError> {
		let mut config = Self::with_pattern(RoutePattern::compile(pattern)?);
		config.redirect_to = Some(target.into());
		Ok(config)
	}

	fn with_pattern(pattern: RoutePattern) -> Self {
		Self {
			pattern,
			name: None,
			title: None,
			nav_order: None,
			settings: serde_json::Map::new(),
			viewports: Vec::new(),
			activation_strategy: None,
			redirect_to: None,
		}
	}

	/// Sets the unique lookup name used by `generate`/`navigate_to_route`.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the document title fragment contributed on activation.
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Makes the route visible in the navigation model with the given order.
	pub fn with_nav_order(mut self, order: i32) -> Self {
		self.nav_order = Some(order);
		self
	}

	/// Attaches an opaque setting carried through to instructions and the
	/// navigation model.
	pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
		self.settings.insert(key.into(), value);
		self
	}

	/// Adds an additional viewport target.
	pub fn with_viewport(mut self, name: impl Into<String>, handler: HandlerRef) -> Self {
		self.viewports.push(ViewportTarget {
			name: name.into(),
			handler,
		});
		self
	}

	/// Forces the activation strategy for every viewport of this route.
	pub fn with_activation_strategy(mut self, strategy: ActivationStrategy) -> Self {
		self.activation_strategy = Some(strategy);
		self
	}

	/// Returns the compiled pattern.
	pub fn pattern(&self) -> &RoutePattern {
		&self.pattern
	}

	/// Returns the route name, if any.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns the title fragment, if any.
	pub fn title(&self) -> Option<&str> {
		self.title.as_deref()
	}

	/// Returns the navigation-model order; `None` means hidden.
	pub fn nav_order(&self) -> Option<i32> {
		self.nav_order
	}

	/// Returns the settings map.
	pub fn settings(&self) -> &serde_json::Map<String, Value> {
		&self.settings
	}

	/// Returns the viewport targets in declaration order.
	pub fn viewports(&self) -> &[ViewportTarget] {
		&self.viewports
	}

	/// Returns the forced activation strategy, if any.
	pub fn activation_strategy(&self) -> Option<ActivationStrategy> {
		self.activation_strategy
	}

	/// Returns the redirect target, if this is a redirecting route.
	pub fn redirect_to(&self) -> Option<&str> {
		self.redirect_to.as_deref()
	}
}
