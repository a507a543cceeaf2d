//! The staged navigation pipeline.
//!
//! Every accepted navigation runs the whole instruction tree through a
//! fixed stage order: `Authorize → PreActivate → PreRender → PostRender →
//! PostComplete`. Custom steps register per stage; the framework's
//! lifecycle work is interleaved at its stage:
//!
//! - `PreActivate`: `can_deactivate` on outgoing instances (leaf-to-root),
//!   then `can_activate` on incoming instances (root-to-leaf)
//! - `PreRender`: `activate` root-to-leaf
//! - `PostRender`: the external renderer mounts each viewport root-to-leaf
//!
//! A step reports back with a [`StepOutcome`] value; the executor is the
//! only interpreter of outcomes. There is no continuation callback to
//! mutate: cancellation, redirects and rejections are all plain data.
//!
//! Sibling-viewport tie-break: within a node, viewports are evaluated in
//! the route config's declaration order and the first non-`Continue`
//! outcome wins the stage.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::NavigationError;
use crate::handler::{ActivationDecision, ViewRenderer};
use crate::instruction::NavigationInstruction;
use crate::router::Router;

/// The fixed stages of the navigation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
	/// Cross-cutting authorization, before any lifecycle work.
	Authorize,
	/// Deactivation and activation guards.
	PreActivate,
	/// Activation proper (data loading).
	PreRender,
	/// Attaching components to the display.
	PostRender,
	/// After-commit hooks.
	PostComplete,
}

impl PipelineStage {
	pub(crate) const ALL: [Self; 5] = [
		Self::Authorize,
		Self::PreActivate,
		Self::PreRender,
		Self::PostRender,
		Self::PostComplete,
	];

	fn index(self) -> usize {
		match self {
			Self::Authorize => 0,
			Self::PreActivate => 1,
			Self::PreRender => 2,
			Self::PostRender => 3,
			Self::PostComplete => 4,
		}
	}
}

/// Why a navigation was canceled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
	/// An incoming handler's `can_activate` refused.
	Guard {
		/// The viewport whose guard refused.
		viewport: String,
		/// Optional human-readable reason supplied by the guard.
		reason: Option<String>,
	},
	/// An outgoing handler's `can_deactivate` refused.
	Deactivation {
		/// The viewport whose occupant refused to leave.
		viewport: String,
	},
	/// A newer navigation superseded this one.
	Superseded,
	/// A custom pipeline step canceled with its own reason.
	Other(String),
}

impl std::fmt::Display for CancelReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Guard { viewport, reason } => match reason {
				Some(reason) => write!(f, "guard refused in viewport '{viewport}': {reason}"),
				None => write!(f, "guard refused in viewport '{viewport}'"),
			},
			Self::Deactivation { viewport } => {
				write!(f, "occupant of viewport '{viewport}' refused to deactivate")
			}
			Self::Superseded => write!(f, "superseded"),
			Self::Other(reason) => write!(f, "{reason}"),
		}
	}
}

/// The outcome a pipeline step returns to the executor.
#[derive(Debug)]
pub enum StepOutcome {
	/// Proceed to the next step.
	Continue,
	/// Abort; the previous instruction stays current.
	Cancel(CancelReason),
	/// Abort and restart instruction building against the target path.
	Redirect(String),
	/// Abort with an error, reported through the `Error` event.
	Reject(anyhow::Error),
}

/// A custom pipeline step. Steps are registered per stage at configuration
/// time and must be stateless with respect to a single navigation.
#[async_trait]
pub trait PipelineStep: Send + Sync {
	/// Runs the step against the in-flight navigation.
	async fn run(&self, ctx: &NavigationContext) -> StepOutcome;
}

/// Validity token for one pipeline run.
///
/// A superseding navigation bumps the shared epoch; any step or commit
/// belonging to the older run observes a stale token and becomes a no-op.
/// This replaces mutable "current navigation" globals.
#[derive(Clone)]
pub struct NavigationToken {
	epoch: u64,
	counter: Arc<AtomicU64>,
}

impl NavigationToken {
	pub(crate) fn next(counter: &Arc<AtomicU64>) -> Self {
		let epoch = counter.fetch_add(1, Ordering::SeqCst) + 1;
		Self {
			epoch,
			counter: counter.clone(),
		}
	}

	/// Whether this token still names the newest navigation.
	pub fn is_current(&self) -> bool {
		self.counter.load(Ordering::SeqCst) == self.epoch
	}
}

impl std::fmt::Debug for NavigationToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NavigationToken")
			.field("epoch", &self.epoch)
			.field("is_current", &self.is_current())
			.finish()
	}
}

/// One router node's share of the navigation, root first.
pub struct PlanEntry {
	/// The node whose state this navigation would swap.
	pub node: Arc<Router>,
	/// The instruction resolved for that node.
	pub instruction: Arc<NavigationInstruction>,
}

/// Everything a pipeline step may inspect about the in-flight navigation.
pub struct NavigationContext {
	/// The resolved URL this run would commit: the root path after any
	/// `redirect_to` hops, plus the merged query.
	pub url: String,
	/// The root of the resolved instruction tree.
	pub instruction: Arc<NavigationInstruction>,
	/// The involved router nodes with their instructions, root-to-leaf.
	pub plan: Vec<PlanEntry>,
	/// Validity token for this run.
	pub token: NavigationToken,
	pub(crate) renderer: Arc<dyn ViewRenderer>,
}

/// The per-stage step registry shared by a router hierarchy.
#[derive(Default)]
pub struct PipelineProvider {
	steps: RwLock<[Vec<Arc<dyn PipelineStep>>; 5]>,
}

impl PipelineProvider {
	/// Creates a provider with no custom steps.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a custom step at the given stage. Within a stage, custom
	/// steps run in registration order, before the framework's lifecycle
	/// work for that stage.
	pub fn add_step(&self, stage: PipelineStage, step: Arc<dyn PipelineStep>) {
		self.steps.write()[stage.index()].push(step);
	}

	fn steps_for(&self, stage: PipelineStage) -> Vec<Arc<dyn PipelineStep>> {
		self.steps.read()[stage.index()].clone()
	}
}

impl std::fmt::Debug for PipelineProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let steps = self.steps.read();
		f.debug_struct("PipelineProvider")
			.field("custom_steps", &steps.iter().map(Vec::len).sum::<usize>())
			.finish()
	}
}

/// How a full pipeline run ended. Interpreted by the router, which owns
/// the commit and the event emission.
#[derive(Debug)]
pub(crate) enum PipelineResult {
	Completed,
	Canceled(CancelReason),
	Redirected(String),
	Rejected(NavigationError),
}

pub(crate) async fn run(
	provider: &PipelineProvider,
	step_timeout: Option<Duration>,
	ctx: &NavigationContext,
) -> PipelineResult {
	for stage in PipelineStage::ALL {
		if !ctx.token.is_current() {
			return PipelineResult::Canceled(CancelReason::Superseded);
		}
		trace!(?stage, url = %ctx.url, "entering pipeline stage");

		for step in provider.steps_for(stage) {
			if !ctx.token.is_current() {
				return PipelineResult::Canceled(CancelReason::Superseded);
			}
			let outcome = match bounded(step_timeout, step.run(ctx)).await {
				Ok(outcome) => outcome,
				Err(err) => return PipelineResult::Rejected(err),
			};
			match outcome {
				StepOutcome::Continue => {}
				StepOutcome::Cancel(reason) => return PipelineResult::Canceled(reason),
				StepOutcome::Redirect(target) => return PipelineResult::Redirected(target),
				StepOutcome::Reject(err) => {
					return PipelineResult::Rejected(NavigationError::Step(err));
				}
			}
		}

		let outcome = match stage {
			PipelineStage::PreActivate => pre_activate(step_timeout, ctx).await,
			PipelineStage::PreRender => activate_tree(step_timeout, ctx).await,
			PipelineStage::PostRender => render_tree(step_timeout, ctx).await,
			PipelineStage::Authorize | PipelineStage::PostComplete => Ok(StepOutcome::Continue),
		};
		match outcome {
			Ok(StepOutcome::Continue) => {}
			Ok(StepOutcome::Cancel(reason)) => return PipelineResult::Canceled(reason),
			Ok(StepOutcome::Redirect(target)) => return PipelineResult::Redirected(target),
			Ok(StepOutcome::Reject(err)) => {
				return PipelineResult::Rejected(NavigationError::Step(err));
			}
			Err(err) => return PipelineResult::Rejected(err),
		}
	}

	PipelineResult::Completed
}

/// Deactivation guards leaf-to-root, then activation guards root-to-leaf.
/// Outgoing occupants get the first say: there is no point asking a new
/// handler in when the old one will not leave.
async fn pre_activate(
	step_timeout: Option<Duration>,
	ctx: &NavigationContext,
) -> Result<StepOutcome, NavigationError> {
	for entry in ctx.plan.iter().rev() {
		for viewport in entry.instruction.viewports() {
			let Some(previous) = viewport.previous() else {
				continue;
			};
			if !ctx.token.is_current() {
				return Ok(StepOutcome::Cancel(CancelReason::Superseded));
			}
			let allowed = bounded(step_timeout, previous.can_deactivate()).await?;
			if !allowed {
				debug!(viewport = viewport.name(), "can_deactivate refused");
				return Ok(StepOutcome::Cancel(CancelReason::Deactivation {
					viewport: viewport.name().to_string(),
				}));
			}
		}
	}

	for entry in &ctx.plan {
		for viewport in entry.instruction.viewports() {
			if !ctx.token.is_current() {
				return Ok(StepOutcome::Cancel(CancelReason::Superseded));
			}
			let decision = bounded(
				step_timeout,
				viewport.component().can_activate(
					entry.instruction.params(),
					entry.instruction.config(),
					&entry.instruction,
				),
			)
			.await?;
			match decision {
				ActivationDecision::Allow => {}
				ActivationDecision::Deny(reason) => {
					debug!(viewport = viewport.name(), "can_activate refused");
					return Ok(StepOutcome::Cancel(CancelReason::Guard {
						viewport: viewport.name().to_string(),
						reason,
					}));
				}
				ActivationDecision::Redirect(target) => {
					return Ok(StepOutcome::Redirect(target));
				}
			}
		}
	}

	Ok(StepOutcome::Continue)
}

async fn activate_tree(
	step_timeout: Option<Duration>,
	ctx: &NavigationContext,
) -> Result<StepOutcome, NavigationError> {
	for entry in &ctx.plan {
		for viewport in entry.instruction.viewports() {
			if !ctx.token.is_current() {
				return Ok(StepOutcome::Cancel(CancelReason::Superseded));
			}
			let result = bounded(
				step_timeout,
				viewport.component().activate(
					entry.instruction.params(),
					entry.instruction.config(),
					&entry.instruction,
				),
			)
			.await?;
			if let Err(err) = result {
				return Ok(StepOutcome::Reject(err));
			}
		}
	}
	Ok(StepOutcome::Continue)
}

async fn render_tree(
	step_timeout: Option<Duration>,
	ctx: &NavigationContext,
) -> Result<StepOutcome, NavigationError> {
	for entry in &ctx.plan {
		for viewport in entry.instruction.viewports() {
			if !ctx.token.is_current() {
				return Ok(StepOutcome::Cancel(CancelReason::Superseded));
			}
			let result = bounded(
				step_timeout,
				ctx.renderer
					.render(viewport.name(), viewport.component(), &entry.instruction),
			)
			.await?;
			if let Err(err) = result {
				return Ok(StepOutcome::Reject(err));
			}
		}
	}
	Ok(StepOutcome::Continue)
}

/// Applies the configured per-step timeout, when one is set.
async fn bounded<F>(timeout: Option<Duration>, fut: F) -> Result<F::Output, NavigationError>
where
	F: std::future::Future,
{
	match timeout {
		None => Ok(fut.await),
		Some(limit) => tokio::time::timeout(limit, fut)
			.await
			.map_err(|_| NavigationError::StepTimeout(limit)),
	}
}
