//! The ordered route table owned by one router scope.
//!
//! Matching is strictly first-match-wins in registration order; more
//! specific patterns must be registered before wildcard catch-alls. The
//! order dependence is a documented contract, not an accident.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::config::RouteConfig;
use crate::error::RouterError;
use crate::params::RouteParams;

/// A successful table lookup.
#[derive(Debug)]
pub struct RouteRecognition {
	/// The matched configuration.
	pub config: Arc<RouteConfig>,
	/// Parameters captured by the pattern.
	pub params: RouteParams,
	/// The wildcard remainder, when the pattern ends in `*name`. This is
	/// the portion a nested router resolves.
	pub rest: Option<String>,
}

/// An ordered collection of routes with name lookup and an optional
/// unknown-route fallback.
#[derive(Default)]
pub struct RouteTable {
	routes: Vec<Arc<RouteConfig>>,
	by_name: HashMap<String, usize>,
	unknown_route: Option<Arc<RouteConfig>>,
}

impl std::fmt::Debug for RouteTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteTable")
			.field("routes", &self.routes.len())
			.field("named", &self.by_name.keys().collect::<Vec<_>>())
			.field("has_unknown_route", &self.unknown_route.is_some())
			.finish()
	}
}

impl RouteTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a route, preserving registration order.
	///
	/// # Errors
	///
	/// Fails with [`RouterError::DuplicateRouteName`] when the config
	/// carries a name already present in this table.
	pub fn register(&mut self, config: RouteConfig) -> Result<(), RouterError> {
		if let Some(name) = config.name() {
			if self.by_name.contains_key(name) {
				return Err(RouterError::DuplicateRouteName(name.to_string()));
			}
			self.by_name.insert(name.to_string(), self.routes.len());
		}
		self.routes.push(Arc::new(config));
		Ok(())
	}

	/// Sets the fallback used when no registered route matches.
	pub fn set_unknown_route(&mut self, config: RouteConfig) {
		self.unknown_route = Some(Arc::new(config));
	}

	/// Returns the fallback config, if one is set.
	pub fn unknown_route(&self) -> Option<&Arc<RouteConfig>> {
		self.unknown_route.as_ref()
	}

	/// Matches a normalized path against the table in registration order.
	///
	/// Returns the first route whose pattern matches; the fallback is not
	/// consulted here (the instruction builder decides what a miss means).
	pub fn recognize(&self, path: &str) -> Option<RouteRecognition> {
		for config in &self.routes {
			if let Some(params) = config.pattern().matches(path) {
				trace!(pattern = config.pattern().raw(), path, "route matched");
				let rest = config
					.pattern()
					.wildcard_name()
					.and_then(|name| params.get(name).cloned());
				return Some(RouteRecognition {
					config: config.clone(),
					params,
					rest,
				});
			}
		}
		None
	}

	/// Generates a path for a named route by substituting `params`.
	///
	/// # Errors
	///
	/// [`RouterError::UnknownRoute`] when the name is unregistered;
	/// [`RouterError::MissingParam`] when a required value is absent;
	/// [`RouterError::NotGenerateable`] for regex-backed routes.
	pub fn generate(&self, name: &str, params: &RouteParams) -> Result<String, RouterError> {
		let index = self
			.by_name
			.get(name)
			.ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;
		self.routes[*index].pattern().generate(name, params)
	}

	/// Looks up a route by name.
	pub fn route_by_name(&self, name: &str) -> Option<&Arc<RouteConfig>> {
		self.by_name.get(name).map(|index| &self.routes[*index])
	}

	/// Returns all routes in registration order.
	pub fn routes(&self) -> &[Arc<RouteConfig>] {
		&self.routes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handler::{HandlerModule, HandlerRef, handler_factory};
	use async_trait::async_trait;

	struct Page;

	#[async_trait]
	impl HandlerModule for Page {}

	fn page() -> HandlerRef {
		handler_factory("page", || Arc::new(Page) as _)
	}

	fn table() -> RouteTable {
		let mut table = RouteTable::new();
		table
			.register(
				RouteConfig::new("users/:id", page())
					.unwrap()
					.with_name("user_detail"),
			)
			.unwrap();
		table
			.register(RouteConfig::new("users/me", page()).unwrap().with_name("me"))
			.unwrap();
		table
			.register(
				RouteConfig::new("files/*rest", page())
					.unwrap()
					.with_name("files"),
			)
			.unwrap();
		table
	}

	#[test]
	fn test_first_match_wins_in_registration_order() {
		// "users/me" is shadowed by "users/:id" because it registered later.
		let recognition = table().recognize("users/me").unwrap();
		assert_eq!(recognition.config.name(), Some("user_detail"));
		assert_eq!(recognition.params.get("id"), Some(&"me".to_string()));
	}

	#[test]
	fn test_wildcard_rest_extracted() {
		let recognition = table().recognize("files/a/b/c").unwrap();
		assert_eq!(recognition.config.name(), Some("files"));
		assert_eq!(recognition.rest.as_deref(), Some("a/b/c"));
	}

	#[test]
	fn test_no_match_returns_none() {
		assert!(table().recognize("missing").is_none());
	}

	#[test]
	fn test_duplicate_name_rejected() {
		let mut table = table();
		let result = table.register(
			RouteConfig::new("elsewhere", page())
				.unwrap()
				.with_name("user_detail"),
		);
		assert!(matches!(result, Err(RouterError::DuplicateRouteName(_))));
	}

	#[test]
	fn test_generate_round_trips_through_recognize() {
		let table = table();
		let mut params = RouteParams::new();
		params.insert("id".to_string(), "42".to_string());

		let path = table.generate("user_detail", &params).unwrap();
		assert_eq!(path, "users/42");

		let recognition = table.recognize(&path).unwrap();
		assert_eq!(recognition.config.name(), Some("user_detail"));
		assert_eq!(recognition.params, params);
	}

	#[test]
	fn test_generate_unknown_route() {
		assert!(matches!(
			table().generate("nope", &RouteParams::new()),
			Err(RouterError::UnknownRoute(_))
		));
	}

	#[test]
	fn test_unknown_route_fallback_stored() {
		let mut table = table();
		assert!(table.unknown_route().is_none());
		table.set_unknown_route(RouteConfig::new("*path", page()).unwrap());
		assert!(table.unknown_route().is_some());
	}
}
