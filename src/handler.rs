//! Handler module capability traits.
//!
//! A handler module is the loadable unit a route activates into a viewport.
//! Its lifecycle hooks are optional capabilities: every method has a
//! permissive default, so implementors override only what they need and
//! call sites stay uniform (no downcasting, no base type).

use std::sync::Arc;

use async_trait::async_trait;

use crate::activation::ActivationStrategy;
use crate::config::RouteConfig;
use crate::instruction::NavigationInstruction;
use crate::params::RouteParams;

/// Decision returned by [`HandlerModule::can_activate`].
#[derive(Debug)]
pub enum ActivationDecision {
	/// Proceed with activation.
	Allow,
	/// Cancel the navigation; the previous instruction stays current.
	Deny(Option<String>),
	/// Abort this navigation and restart against the given path.
	Redirect(String),
}

impl From<bool> for ActivationDecision {
	fn from(allowed: bool) -> Self {
		if allowed { Self::Allow } else { Self::Deny(None) }
	}
}

/// The lifecycle capability interface of an activated component.
///
/// All hooks default to "allow everything, do nothing"; a handler that
/// implements none of them is valid.
#[async_trait]
pub trait HandlerModule: Send + Sync {
	/// Activation guard, run before any state is touched. Returning
	/// [`ActivationDecision::Deny`] cancels the navigation; returning
	/// [`ActivationDecision::Redirect`] restarts it against another path.
	async fn can_activate(
		&self,
		_params: &RouteParams,
		_config: &RouteConfig,
		_instruction: &NavigationInstruction,
	) -> ActivationDecision {
		ActivationDecision::Allow
	}

	/// Activation proper: load data, prepare state. An error rejects the
	/// navigation and is reported through the `Error` event.
	async fn activate(
		&self,
		_params: &RouteParams,
		_config: &RouteConfig,
		_instruction: &NavigationInstruction,
	) -> anyhow::Result<()> {
		Ok(())
	}

	/// Deactivation guard for the currently active instance. Returning
	/// `false` cancels the navigation that would tear this instance down.
	async fn can_deactivate(&self) -> bool {
		true
	}

	/// Teardown hook, called after a successful navigation replaces this
	/// instance.
	async fn deactivate(&self) {}

	/// Lets a retained instance vote on its own reuse strategy. `None`
	/// defers to the route configuration and the resolver default.
	fn determine_activation_strategy(&self) -> Option<ActivationStrategy> {
		None
	}
}

/// Shared reference to a handler factory.
pub type HandlerRef = Arc<dyn HandlerFactory>;

/// Constructs handler module instances for a route target.
///
/// Factory identity (pointer equality of the [`HandlerRef`]) is what the
/// activation strategy resolver compares across navigations.
pub trait HandlerFactory: Send + Sync {
	/// Creates a fresh handler instance.
	fn create(&self) -> Arc<dyn HandlerModule>;

	/// A short label for logs and debug output.
	fn type_name(&self) -> &str {
		"handler"
	}
}

struct FnFactory<F> {
	create: F,
	name: String,
}

impl<F> HandlerFactory for FnFactory<F>
where
	F: Fn() -> Arc<dyn HandlerModule> + Send + Sync,
{
	fn create(&self) -> Arc<dyn HandlerModule> {
		(self.create)()
	}

	fn type_name(&self) -> &str {
		&self.name
	}
}

/// Wraps a constructor closure as a [`HandlerRef`].
pub fn handler_factory<F>(name: impl Into<String>, create: F) -> HandlerRef
where
	F: Fn() -> Arc<dyn HandlerModule> + Send + Sync + 'static,
{
	Arc::new(FnFactory {
		create,
		name: name.into(),
	})
}

/// External rendering collaborator.
///
/// The router never mounts views itself; after the pipeline's pre-render
/// work succeeds it hands each viewport's component to the renderer.
#[async_trait]
pub trait ViewRenderer: Send + Sync {
	/// Mounts `component` into the named viewport.
	async fn render(
		&self,
		viewport: &str,
		component: &Arc<dyn HandlerModule>,
		instruction: &NavigationInstruction,
	) -> anyhow::Result<()>;
}

/// Renderer that mounts nothing. Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct NullRenderer;

#[async_trait]
impl ViewRenderer for NullRenderer {
	async fn render(
		&self,
		_viewport: &str,
		_component: &Arc<dyn HandlerModule>,
		_instruction: &NavigationInstruction,
	) -> anyhow::Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Plain;

	#[async_trait]
	impl HandlerModule for Plain {}

	#[tokio::test]
	async fn test_default_hooks_are_permissive() {
		let module = Plain;
		assert!(module.can_deactivate().await);
		assert!(module.determine_activation_strategy().is_none());
	}

	#[test]
	fn test_activation_decision_from_bool() {
		assert!(matches!(ActivationDecision::from(true), ActivationDecision::Allow));
		assert!(matches!(
			ActivationDecision::from(false),
			ActivationDecision::Deny(None)
		));
	}

	#[test]
	fn test_factory_identity() {
		let a = handler_factory("plain", || Arc::new(Plain) as Arc<dyn HandlerModule>);
		let b = handler_factory("plain", || Arc::new(Plain) as Arc<dyn HandlerModule>);
		assert!(Arc::ptr_eq(&a, &a.clone()));
		assert!(!Arc::ptr_eq(&a, &b));
	}
}
