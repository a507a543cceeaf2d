//! Activation strategy resolution.
//!
//! Per viewport, a navigation either constructs a fresh handler instance
//! (`Replace`) or keeps the existing one and re-runs its lifecycle with the
//! new parameters (`InvokeLifecycle`). The resolver defaults to `Replace`
//! whenever the answer is ambiguous.

use std::sync::Arc;

use crate::config::RouteConfig;
use crate::handler::{HandlerModule, HandlerRef};

/// The reuse-vs-replace decision for one viewport across navigations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStrategy {
	/// Construct a fresh handler instance; deactivate the previous one.
	Replace,
	/// Keep the existing instance; re-run `can_activate`/`activate` on it.
	InvokeLifecycle,
}

/// The handler currently occupying a viewport.
#[derive(Clone)]
pub struct ActiveViewport {
	/// Factory that produced the instance; compared by pointer identity.
	pub handler: HandlerRef,
	/// The live instance.
	pub component: Arc<dyn HandlerModule>,
}

impl std::fmt::Debug for ActiveViewport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActiveViewport")
			.field("handler", &self.handler.type_name())
			.finish()
	}
}

/// Resolves the strategy for one viewport.
///
/// A previous instance produced by a different factory always means
/// `Replace`. With an identical factory, either the route configuration or
/// the retained instance itself may opt into `InvokeLifecycle`.
pub fn resolve(
	previous: Option<&ActiveViewport>,
	config: &RouteConfig,
	target: &HandlerRef,
) -> ActivationStrategy {
	let Some(previous) = previous else {
		return ActivationStrategy::Replace;
	};
	if !Arc::ptr_eq(&previous.handler, target) {
		return ActivationStrategy::Replace;
	}

	if config.activation_strategy() == Some(ActivationStrategy::InvokeLifecycle) {
		return ActivationStrategy::InvokeLifecycle;
	}
	if previous.component.determine_activation_strategy()
		== Some(ActivationStrategy::InvokeLifecycle)
	{
		return ActivationStrategy::InvokeLifecycle;
	}

	ActivationStrategy::Replace
}
