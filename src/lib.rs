//! Client-side hierarchical navigation router.
//!
//! `wayfinder` resolves URLs against ordered route tables, builds an
//! immutable navigation instruction tree (recursing into nested routers
//! through wildcard remainders), and runs it through a staged async
//! pipeline of guards, activation hooks and rendering before committing
//! the result to router state and the host's history adapter.
//!
//! The pieces:
//!
//! - [`pattern`]: route pattern compilation (`:param`, `:param?`, `*rest`,
//!   opaque regex) and URL generation
//! - [`table`]: first-match-wins ordered route tables
//! - [`config`]: route configuration with viewports and metadata
//! - [`handler`]: the handler module lifecycle capability traits
//! - [`instruction`] / [`builder`]: instruction tree assembly
//! - [`pipeline`]: the staged executor with data-carrying step outcomes
//! - [`activation`]: the reuse-vs-replace strategy resolver
//! - [`router`]: the hierarchy, navigation driver and supersession
//! - [`events`], [`history`]: observation and the platform seam
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use wayfinder::{
//!     HandlerModule, InMemoryHistory, NavigationOptions, RouteConfig, Router,
//!     handler_factory,
//! };
//!
//! struct UsersPage;
//!
//! #[async_trait]
//! impl HandlerModule for UsersPage {}
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let router = Router::new(Arc::new(InMemoryHistory::new()));
//! router.configure(|table| {
//!     table.register(
//!         RouteConfig::new(
//!             "users/:id",
//!             handler_factory("users", || Arc::new(UsersPage) as _),
//!         )?
//!         .with_name("user_detail")
//!         .with_title("User"),
//!     )
//! })?;
//!
//! let outcome = router.navigate("users/42", NavigationOptions::default()).await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod history;
pub mod instruction;
pub mod params;
pub mod pattern;
pub mod pipeline;
pub mod router;
pub mod table;

pub use activation::{ActivationStrategy, ActiveViewport};
pub use config::{DEFAULT_VIEWPORT, RouteConfig, ViewportTarget};
pub use error::{NavigationError, RouterError};
pub use events::{EventDispatcher, RouterEvent, Subscription};
pub use handler::{
	ActivationDecision, HandlerFactory, HandlerModule, HandlerRef, NullRenderer, ViewRenderer,
	handler_factory,
};
pub use history::{HistoryAdapter, InMemoryHistory, NavigationTrigger};
pub use instruction::{NavigationInstruction, ViewportInstruction};
pub use params::{RouteParams, encode_query, normalize_path, parse_query, split_url};
pub use pattern::RoutePattern;
pub use pipeline::{
	CancelReason, NavigationContext, NavigationToken, PipelineProvider, PipelineStage,
	PipelineStep, PlanEntry, StepOutcome,
};
pub use router::{
	NavModelEntry, NavigationFlags, NavigationOptions, NavigationOutcome, Router, RouterOptions,
};
pub use table::{RouteRecognition, RouteTable};
