//! Navigation instruction assembly.
//!
//! Turns a requested URL into an immutable instruction tree for a router
//! node, recursing into registered child routers when a wildcard match
//! leaves a remainder. Assembly is side-effect-free with respect to router
//! state: candidate handler instances are constructed, but nothing is
//! installed until the pipeline commits.

use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::activation::{self, ActivationStrategy};
use crate::error::NavigationError;
use crate::instruction::{NavigationInstruction, ViewportInstruction};
use crate::params::{RouteParams, encode_query, normalize_path, parse_query, split_url};
use crate::pipeline::PlanEntry;
use crate::router::Router;
use crate::table::{RouteRecognition, RouteTable};

/// The assembled result of resolving one navigation request.
pub(crate) struct BuiltNavigation {
	pub instruction: Arc<NavigationInstruction>,
	pub plan: Vec<PlanEntry>,
	/// The landing URL: the root node's resolved path after `redirect_to`
	/// hops, plus the merged query. This is what a successful run commits
	/// to history.
	pub resolved_url: String,
}

/// Resolves `url` against `node` and assembles the instruction tree plus
/// the flattened root-to-leaf plan.
///
/// `hops` is the shared redirect budget: `redirect_to` hops taken here and
/// guard-issued redirects taken by the caller draw from the same counter,
/// so config/guard redirect cycles cannot starve each other of the bound.
pub(crate) fn build(
	node: &Arc<Router>,
	url: &str,
	max_redirects: usize,
	hops: &mut usize,
) -> Result<BuiltNavigation, NavigationError> {
	let (raw_path, raw_query) = split_url(url);
	let mut query_params = raw_query.map(parse_query).unwrap_or_default();

	let instruction = build_node(
		node,
		normalize_path(raw_path),
		url,
		&mut query_params,
		max_redirects,
		hops,
	)?;
	let plan = collect_plan(node, &instruction);

	let query = encode_query(&query_params);
	let resolved_url = if query.is_empty() {
		instruction.path().to_string()
	} else {
		format!("{}?{}", instruction.path(), query)
	};
	Ok(BuiltNavigation {
		instruction,
		plan,
		resolved_url,
	})
}

fn build_node(
	node: &Arc<Router>,
	path: &str,
	url: &str,
	query_params: &mut RouteParams,
	max_redirects: usize,
	hops: &mut usize,
) -> Result<Arc<NavigationInstruction>, NavigationError> {
	let mut path = path.to_string();

	// Follow redirect_to configs, bounded to catch cycles.
	let recognition = loop {
		let table = node.table.read();
		let Some(recognition) = recognize(&table, &path) else {
			return Err(NavigationError::NoRouteMatched(url.to_string()));
		};
		match recognition.config.redirect_to() {
			None => break recognition,
			Some(target) => {
				*hops += 1;
				if *hops > max_redirects {
					return Err(NavigationError::RedirectLoop {
						url: url.to_string(),
						limit: max_redirects,
					});
				}
				debug!(from = %path, to = target, "following route redirect");
				let (target_path, target_query) = split_url(target);
				if let Some(target_query) = target_query {
					// Target query entries override the requested ones.
					for (key, value) in parse_query(target_query) {
						query_params.insert(key, value);
					}
				}
				path = normalize_path(target_path).to_string();
			}
		}
	};

	let viewports = {
		let active = node.active.read();
		recognition
			.config
			.viewports()
			.iter()
			.map(|target| {
				let previous = active.get(&target.name);
				let strategy = activation::resolve(previous, &recognition.config, &target.handler);
				// The resolver only picks InvokeLifecycle when a previous
				// occupant exists.
				let (component, displaced) = match (strategy, previous) {
					(ActivationStrategy::InvokeLifecycle, Some(previous)) => {
						(previous.component.clone(), None)
					}
					(_, previous) => (
						target.handler.create(),
						previous.map(|p| p.component.clone()),
					),
				};
				trace!(
					viewport = %target.name,
					handler = target.handler.type_name(),
					?strategy,
					"resolved viewport activation"
				);
				ViewportInstruction {
					name: target.name.clone(),
					handler: target.handler.clone(),
					strategy,
					component,
					previous: displaced,
				}
			})
			.collect::<Vec<_>>()
	};

	// A wildcard remainder destined for a nested router becomes a child
	// instruction, resolved against the child's own table.
	let child_target = recognition.rest.as_ref().and_then(|rest| {
		let children = node.children.read();
		recognition.config.viewports().iter().find_map(|target| {
			children
				.get(&target.name)
				.map(|child| (target.name.clone(), child.clone(), rest.clone()))
		})
	});

	let child = match &child_target {
		Some((_, child_node, rest)) => Some(build_node(
			child_node,
			normalize_path(rest),
			url,
			query_params,
			max_redirects,
			hops,
		)?),
		None => None,
	};

	let instruction = Arc::new(NavigationInstruction {
		url: url.to_string(),
		path,
		query_params: query_params.clone(),
		params: recognition.params,
		config: recognition.config,
		viewports,
		parent: OnceLock::new(),
		child,
		child_viewport: child_target.map(|(name, _, _)| name),
	});

	if let Some(child) = &instruction.child {
		// Back-reference is non-owning and set exactly once at assembly.
		let _ = child.parent.set(Arc::downgrade(&instruction));
	}

	Ok(instruction)
}

fn recognize(table: &RouteTable, path: &str) -> Option<RouteRecognition> {
	table.recognize(path).or_else(|| {
		table.unknown_route().map(|config| {
			let params = config.pattern().matches(path).unwrap_or_default();
			let rest = config
				.pattern()
				.wildcard_name()
				.and_then(|name| params.get(name).cloned());
			RouteRecognition {
				config: config.clone(),
				params,
				rest,
			}
		})
	})
}

/// Flattens the instruction tree into root-to-leaf plan entries paired
/// with their router nodes.
fn collect_plan(node: &Arc<Router>, instruction: &Arc<NavigationInstruction>) -> Vec<PlanEntry> {
	let mut plan = Vec::new();
	let mut node = node.clone();
	let mut instruction = instruction.clone();
	loop {
		plan.push(PlanEntry {
			node: node.clone(),
			instruction: instruction.clone(),
		});
		let Some(viewport) = instruction.child_viewport().map(str::to_string) else {
			break;
		};
		let Some(child_instruction) = instruction.child().cloned() else {
			break;
		};
		let Some(child_node) = node.children.read().get(&viewport).cloned() else {
			break;
		};
		node = child_node;
		instruction = child_instruction;
	}
	plan
}
