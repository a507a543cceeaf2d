//! Error types for route configuration and navigation.
//!
//! Configuration-time misuse (bad patterns, duplicate names, `generate`
//! with missing parameters) fails fast with [`RouterError`]. Navigation-time
//! failures are carried by [`NavigationError`] and surface as a failed
//! [`NavigationOutcome`](crate::router::NavigationOutcome) plus an `Error`
//! event; they are never thrown out of `navigate` directly.

use std::time::Duration;

use thiserror::Error;

/// Errors raised synchronously by route registration and URL generation.
#[derive(Debug, Error)]
pub enum RouterError {
	/// The pattern string could not be compiled.
	#[error("invalid route pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// The offending pattern source.
		pattern: String,
		/// Why compilation failed.
		reason: String,
	},

	/// A parameter name appears more than once in one pattern.
	#[error("duplicate parameter name '{name}' in pattern '{pattern}'")]
	DuplicateParam {
		/// The offending pattern source.
		pattern: String,
		/// The repeated parameter name.
		name: String,
	},

	/// A wildcard segment is followed by further segments.
	#[error("wildcard segment must be the final segment in pattern '{pattern}'")]
	WildcardNotLast {
		/// The offending pattern source.
		pattern: String,
	},

	/// Two routes in the same table share a name.
	#[error("duplicate route name '{0}'")]
	DuplicateRouteName(String),

	/// `generate`/`navigate_to_route` was called with an unregistered name.
	#[error("unknown route name '{0}'")]
	UnknownRoute(String),

	/// `generate` was called without a value for a required parameter.
	#[error("missing parameter '{param}' while generating route '{route}'")]
	MissingParam {
		/// The route name the caller asked for.
		route: String,
		/// The parameter that had no value.
		param: String,
	},

	/// The named route uses an opaque regex pattern and cannot be generated.
	#[error("route '{0}' uses a regex pattern and cannot be generated")]
	NotGenerateable(String),
}

/// Failures produced while resolving or pipelining a navigation.
#[derive(Debug, Error)]
pub enum NavigationError {
	/// No table entry matched and no unknown-route fallback is configured.
	#[error("no route matched '{0}' and no unknown-route handler is configured")]
	NoRouteMatched(String),

	/// A `redirect_to` chain or guard-issued redirect sequence exceeded the
	/// configured bound.
	#[error("redirect limit of {limit} exceeded while resolving '{url}'")]
	RedirectLoop {
		/// The URL whose resolution looped.
		url: String,
		/// The configured maximum number of redirect hops.
		limit: usize,
	},

	/// A pipeline step or lifecycle hook returned an error.
	#[error("pipeline step failed: {0}")]
	Step(#[source] anyhow::Error),

	/// A pipeline step exceeded the configured per-step timeout.
	#[error("pipeline step timed out after {0:?}")]
	StepTimeout(Duration),
}
