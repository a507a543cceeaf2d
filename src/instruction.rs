//! Navigation instructions.
//!
//! A [`NavigationInstruction`] is the immutable result of resolving a URL
//! against a route table: matched params, decoded query, one
//! [`ViewportInstruction`] per targeted viewport, and (for wildcard
//! matches consumed by a nested router) a child instruction. Instructions
//! are built fresh per navigation attempt and swapped in wholesale on
//! commit; they are never mutated in place.

use std::sync::{Arc, OnceLock, Weak};

use crate::activation::ActivationStrategy;
use crate::config::RouteConfig;
use crate::handler::{HandlerModule, HandlerRef};
use crate::params::RouteParams;

/// Activation work for one viewport, exclusively owned by its parent
/// instruction.
pub struct ViewportInstruction {
	/// The viewport this activates into.
	pub(crate) name: String,
	/// Factory behind the target handler.
	pub(crate) handler: HandlerRef,
	/// Resolved reuse-vs-replace decision.
	pub(crate) strategy: ActivationStrategy,
	/// The instance the pipeline runs lifecycle hooks on: freshly
	/// constructed for `Replace`, the retained one for `InvokeLifecycle`.
	pub(crate) component: Arc<dyn HandlerModule>,
	/// The instance displaced by a `Replace`, torn down on commit.
	pub(crate) previous: Option<Arc<dyn HandlerModule>>,
}

impl ViewportInstruction {
	/// The viewport name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The handler factory targeted at this viewport.
	pub fn handler(&self) -> &HandlerRef {
		&self.handler
	}

	/// The resolved activation strategy.
	pub fn strategy(&self) -> ActivationStrategy {
		self.strategy
	}

	/// The component instance this navigation activates.
	pub fn component(&self) -> &Arc<dyn HandlerModule> {
		&self.component
	}

	/// The displaced previous instance, if the strategy is `Replace` and
	/// the viewport was occupied.
	pub fn previous(&self) -> Option<&Arc<dyn HandlerModule>> {
		self.previous.as_ref()
	}
}

impl std::fmt::Debug for ViewportInstruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ViewportInstruction")
			.field("name", &self.name)
			.field("handler", &self.handler.type_name())
			.field("strategy", &self.strategy)
			.field("has_previous", &self.previous.is_some())
			.finish()
	}
}

/// The immutable description of one resolved navigation for one router
/// node, linked into a tree for nested routers.
pub struct NavigationInstruction {
	/// The full requested URL (path plus query) that produced this tree.
	pub(crate) url: String,
	/// The normalized path portion this node matched.
	pub(crate) path: String,
	/// Decoded query parameters, shared by every node of the tree.
	pub(crate) query_params: RouteParams,
	/// Parameters captured by this node's pattern.
	pub(crate) params: RouteParams,
	/// The matched route configuration.
	pub(crate) config: Arc<RouteConfig>,
	/// Per-viewport activation work, in the config's declaration order.
	pub(crate) viewports: Vec<ViewportInstruction>,
	/// Non-owning back-reference for lookups; set once at assembly.
	pub(crate) parent: OnceLock<Weak<NavigationInstruction>>,
	/// Owned child instruction for a nested router, if the match left a
	/// wildcard remainder.
	pub(crate) child: Option<Arc<NavigationInstruction>>,
	/// The viewport whose child router owns `child`.
	pub(crate) child_viewport: Option<String>,
}

impl NavigationInstruction {
	/// The full requested URL.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// The normalized path this node matched.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Decoded query parameters.
	pub fn query_params(&self) -> &RouteParams {
		&self.query_params
	}

	/// Parameters captured by the pattern.
	pub fn params(&self) -> &RouteParams {
		&self.params
	}

	/// The matched route configuration.
	pub fn config(&self) -> &Arc<RouteConfig> {
		&self.config
	}

	/// Per-viewport activation work.
	pub fn viewports(&self) -> &[ViewportInstruction] {
		&self.viewports
	}

	/// The parent instruction, when this node is part of a nested tree.
	pub fn parent(&self) -> Option<Arc<NavigationInstruction>> {
		self.parent.get().and_then(Weak::upgrade)
	}

	/// The child instruction for a nested router.
	pub fn child(&self) -> Option<&Arc<NavigationInstruction>> {
		self.child.as_ref()
	}

	/// The viewport whose nested router resolved the child instruction.
	pub fn child_viewport(&self) -> Option<&str> {
		self.child_viewport.as_deref()
	}

	/// Composes the document title for this subtree, child-first.
	///
	/// `"Settings | Admin"` for a child titled `Settings` under a parent
	/// titled `Admin`. Untitled nodes contribute nothing.
	pub fn compose_title(&self, separator: &str) -> Option<String> {
		let mut fragments = Vec::new();
		let mut node = Some(self);
		while let Some(current) = node {
			if let Some(title) = current.config.title() {
				fragments.push(title.to_string());
			}
			node = current.child.as_deref();
		}
		fragments.reverse();
		if fragments.is_empty() {
			None
		} else {
			Some(fragments.join(separator))
		}
	}
}

impl std::fmt::Debug for NavigationInstruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NavigationInstruction")
			.field("url", &self.url)
			.field("path", &self.path)
			.field("params", &self.params)
			.field("viewports", &self.viewports)
			.field("has_child", &self.child.is_some())
			.finish()
	}
}
