//! Route pattern compilation and matching.
//!
//! A pattern source is either a segment string or a pre-built regex.
//! Segment strings are split on `/` and each segment is classified:
//!
//! - `users` - literal, matched exactly (case-sensitive)
//! - `:id` - required capture, one non-`/` segment
//! - `:id?` - optional capture; when absent the key is omitted entirely
//! - `*rest` - greedy capture of the remaining path, `/` included; must be
//!   the final segment, and the path must actually continue past the
//!   literal prefix (`files/*rest` does not match `files`)
//!
//! Segment patterns compile to a single anchored regex with named capture
//! groups. A regex source bypasses segmentation and is matched against the
//! whole normalized path; its named groups populate the parameter map.

use std::collections::HashSet;

use crate::error::RouterError;
use crate::params::RouteParams;

/// Maximum allowed length for a pattern source string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of segments in a pattern.
const MAX_PATTERN_SEGMENTS: usize = 32;

/// Maximum allowed size for the compiled regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// One classified segment of a segment-string pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param(String),
	OptionalParam(String),
	Wildcard(String),
}

#[derive(Debug, Clone)]
enum PatternKind {
	/// Classified segments compiled into `regex`.
	Segments(Vec<Segment>),
	/// An opaque caller-supplied regex.
	Opaque,
}

/// A compiled route pattern.
///
/// Owned exclusively by the [`RouteConfig`](crate::config::RouteConfig)
/// that produced it; never mutated after compilation.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	/// The original pattern source (segment string or regex source).
	raw: String,
	kind: PatternKind,
	regex: regex::Regex,
	/// Capture names in the order they appear in the pattern.
	param_names: Vec<String>,
	/// Name of the trailing wildcard capture, if any.
	wildcard: Option<String>,
}

impl RoutePattern {
	/// Compiles a segment-string pattern.
	///
	/// # Errors
	///
	/// Fails at registration time (never at match time) when the pattern
	/// is oversized, a wildcard is not the final segment, a parameter name
	/// repeats, or the compiled regex is rejected.
	pub fn compile(pattern: &str) -> Result<Self, RouterError> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(RouterError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!("exceeds maximum length of {MAX_PATTERN_LENGTH} bytes"),
			});
		}

		let normalized = pattern.trim_matches('/');
		let segments = Self::classify(pattern, normalized)?;

		if segments.len() > MAX_PATTERN_SEGMENTS {
			return Err(RouterError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!("exceeds maximum of {MAX_PATTERN_SEGMENTS} segments"),
			});
		}

		let mut seen = HashSet::new();
		let mut param_names = Vec::new();
		let mut wildcard = None;
		for segment in &segments {
			let name = match segment {
				Segment::Literal(_) => continue,
				Segment::Param(name) | Segment::OptionalParam(name) => name,
				Segment::Wildcard(name) => {
					wildcard = Some(name.clone());
					name
				}
			};
			if !seen.insert(name.clone()) {
				return Err(RouterError::DuplicateParam {
					pattern: pattern.to_string(),
					name: name.clone(),
				});
			}
			param_names.push(name.clone());
		}

		let regex = Self::build_regex(pattern, &segments)?;

		Ok(Self {
			raw: pattern.to_string(),
			kind: PatternKind::Segments(segments),
			regex,
			param_names,
			wildcard,
		})
	}

	/// Wraps a caller-supplied regex as a pattern.
	///
	/// The regex is matched against the whole normalized path (no leading
	/// or trailing slash); named capture groups populate the parameter map.
	pub fn from_regex(regex: regex::Regex) -> Self {
		let param_names = regex
			.capture_names()
			.flatten()
			.map(|name| name.to_string())
			.collect();
		Self {
			raw: regex.as_str().to_string(),
			kind: PatternKind::Opaque,
			regex,
			param_names,
			wildcard: None,
		}
	}

	fn classify(pattern: &str, normalized: &str) -> Result<Vec<Segment>, RouterError> {
		let mut segments = Vec::new();
		if normalized.is_empty() {
			return Ok(segments);
		}

		let parts: Vec<&str> = normalized.split('/').collect();
		for (index, part) in parts.iter().enumerate() {
			let segment = if let Some(name) = part.strip_prefix(':') {
				let (name, optional) = match name.strip_suffix('?') {
					Some(name) => (name, true),
					None => (name, false),
				};
				Self::check_name(pattern, name)?;
				if optional {
					Segment::OptionalParam(name.to_string())
				} else {
					Segment::Param(name.to_string())
				}
			} else if let Some(name) = part.strip_prefix('*') {
				Self::check_name(pattern, name)?;
				if index != parts.len() - 1 {
					return Err(RouterError::WildcardNotLast {
						pattern: pattern.to_string(),
					});
				}
				Segment::Wildcard(name.to_string())
			} else {
				Segment::Literal((*part).to_string())
			};
			segments.push(segment);
		}
		Ok(segments)
	}

	fn check_name(pattern: &str, name: &str) -> Result<(), RouterError> {
		let valid = !name.is_empty()
			&& name
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_');
		if valid {
			Ok(())
		} else {
			Err(RouterError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!("invalid parameter name '{name}'"),
			})
		}
	}

	/// Builds one anchored regex for the whole pattern. Matching is done
	/// against `"/" + normalized_path` so every segment can carry its own
	/// leading separator; optional segments fold the separator into the
	/// optional group.
	fn build_regex(pattern: &str, segments: &[Segment]) -> Result<regex::Regex, RouterError> {
		let mut source = String::from("^");
		if segments.is_empty() {
			source.push('/');
		}
		for segment in segments {
			match segment {
				Segment::Literal(text) => {
					source.push('/');
					source.push_str(&regex::escape(text));
				}
				Segment::Param(name) => {
					source.push_str(&format!("/(?P<{name}>[^/]+)"));
				}
				Segment::OptionalParam(name) => {
					source.push_str(&format!("(?:/(?P<{name}>[^/]+))?"));
				}
				Segment::Wildcard(name) => {
					// The separator stays outside the capture, so the
					// remainder never starts with '/' and a bare prefix
					// does not match.
					source.push_str(&format!("/(?P<{name}>.+)"));
				}
			}
		}
		source.push('$');

		regex::RegexBuilder::new(&source)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| RouterError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: format!("failed to compile regex: {e}"),
			})
	}

	/// Attempts to match a normalized path against this pattern.
	///
	/// Absent optional parameters are omitted from the returned map.
	pub fn matches(&self, path: &str) -> Option<RouteParams> {
		let captures = match &self.kind {
			PatternKind::Segments(_) => {
				let probe = format!("/{path}");
				self.regex.captures(&probe).map(|caps| {
					self.param_names
						.iter()
						.filter_map(|name| {
							caps.name(name)
								.map(|m| (name.clone(), m.as_str().to_string()))
						})
						.collect()
				})
			}
			PatternKind::Opaque => self.regex.captures(path).map(|caps| {
				self.param_names
					.iter()
					.filter_map(|name| {
						caps.name(name)
							.map(|m| (name.clone(), m.as_str().to_string()))
					})
					.collect()
			}),
		};
		captures
	}

	/// Generates a path from this pattern by substituting parameters.
	///
	/// Optional parameters are included only when a value is supplied;
	/// wildcard parameters are treated as required. `route` names the
	/// route in error messages.
	pub fn generate(&self, route: &str, params: &RouteParams) -> Result<String, RouterError> {
		let segments = match &self.kind {
			PatternKind::Segments(segments) => segments,
			PatternKind::Opaque => {
				return Err(RouterError::NotGenerateable(route.to_string()));
			}
		};

		let mut parts: Vec<&str> = Vec::new();
		for segment in segments {
			match segment {
				Segment::Literal(text) => parts.push(text),
				Segment::Param(name) | Segment::Wildcard(name) => {
					let value = params.get(name).ok_or_else(|| RouterError::MissingParam {
						route: route.to_string(),
						param: name.clone(),
					})?;
					parts.push(value);
				}
				Segment::OptionalParam(name) => {
					if let Some(value) = params.get(name) {
						parts.push(value);
					}
				}
			}
		}
		Ok(parts.join("/"))
	}

	/// Returns the original pattern source.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Returns the capture names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Whether matching this pattern requires at least one parameter value.
	pub fn requires_params(&self) -> bool {
		match &self.kind {
			PatternKind::Segments(segments) => segments.iter().any(|s| {
				matches!(s, Segment::Param(_) | Segment::Wildcard(_))
			}),
			PatternKind::Opaque => !self.param_names.is_empty(),
		}
	}

	/// Whether the pattern ends in a greedy wildcard segment.
	pub fn has_wildcard(&self) -> bool {
		self.wildcard.is_some()
	}

	/// The name of the trailing wildcard capture, if any.
	pub fn wildcard_name(&self) -> Option<&str> {
		self.wildcard.as_deref()
	}
}

impl std::fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.raw)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_literal_pattern() {
		let pattern = RoutePattern::compile("users").unwrap();
		assert!(pattern.matches("users").is_some());
		assert!(pattern.matches("users/42").is_none());
		assert!(pattern.matches("Users").is_none());
		assert!(!pattern.requires_params());
	}

	#[test]
	fn test_root_pattern() {
		let pattern = RoutePattern::compile("").unwrap();
		assert!(pattern.matches("").is_some());
		assert!(pattern.matches("users").is_none());
	}

	#[test]
	fn test_required_param() {
		let pattern = RoutePattern::compile("users/:id").unwrap();
		let params = pattern.matches("users/42").unwrap();
		assert_eq!(params.get("id"), Some(&"42".to_string()));
		assert!(pattern.matches("users").is_none());
		assert!(pattern.requires_params());
	}

	#[test]
	fn test_optional_param_present_and_absent() {
		let pattern = RoutePattern::compile("users/:id?/detail").unwrap();

		let params = pattern.matches("users/42/detail").unwrap();
		assert_eq!(params.get("id"), Some(&"42".to_string()));

		let params = pattern.matches("users/detail").unwrap();
		assert_eq!(params.get("id"), None);
	}

	#[test]
	fn test_trailing_optional_param() {
		let pattern = RoutePattern::compile("users/:id?").unwrap();
		assert!(pattern.matches("users").is_some());
		assert_eq!(
			pattern.matches("users/42").unwrap().get("id"),
			Some(&"42".to_string())
		);
	}

	#[test]
	fn test_wildcard_captures_remainder() {
		let pattern = RoutePattern::compile("files/*rest").unwrap();
		let params = pattern.matches("files/a/b/c").unwrap();
		assert_eq!(params.get("rest"), Some(&"a/b/c".to_string()));
		assert_eq!(pattern.wildcard_name(), Some("rest"));
	}

	#[test]
	fn test_wildcard_requires_prefix_boundary() {
		let pattern = RoutePattern::compile("files/*rest").unwrap();
		assert!(pattern.matches("files").is_none());
		assert!(pattern.matches("filesystem").is_none());
	}

	#[test]
	fn test_wildcard_not_last_is_config_error() {
		let result = RoutePattern::compile("files/*rest/edit");
		assert!(matches!(result, Err(RouterError::WildcardNotLast { .. })));
	}

	#[test]
	fn test_duplicate_param_is_config_error() {
		let result = RoutePattern::compile("users/:id/posts/:id");
		assert!(matches!(result, Err(RouterError::DuplicateParam { .. })));
	}

	#[rstest]
	#[case(":")]
	#[case("*")]
	#[case(":bad-name")]
	fn test_invalid_param_name(#[case] pattern: &str) {
		assert!(matches!(
			RoutePattern::compile(pattern),
			Err(RouterError::InvalidPattern { .. })
		));
	}

	#[test]
	fn test_oversized_pattern_rejected() {
		let long = "a/".repeat(600);
		assert!(matches!(
			RoutePattern::compile(&long),
			Err(RouterError::InvalidPattern { .. })
		));
	}

	#[test]
	fn test_too_many_segments_rejected() {
		let pattern = vec!["seg"; 40].join("/");
		assert!(matches!(
			RoutePattern::compile(&pattern),
			Err(RouterError::InvalidPattern { .. })
		));
	}

	#[test]
	fn test_generate_round_trip() {
		let pattern = RoutePattern::compile("users/:id/posts/:post").unwrap();
		let mut params = RouteParams::new();
		params.insert("id".to_string(), "42".to_string());
		params.insert("post".to_string(), "7".to_string());

		let path = pattern.generate("user_post", &params).unwrap();
		assert_eq!(path, "users/42/posts/7");

		let matched = pattern.matches(&path).unwrap();
		assert_eq!(matched, params);
	}

	#[test]
	fn test_generate_optional_omitted() {
		let pattern = RoutePattern::compile("users/:id?/detail").unwrap();
		let path = pattern.generate("detail", &RouteParams::new()).unwrap();
		assert_eq!(path, "users/detail");
	}

	#[test]
	fn test_generate_missing_param() {
		let pattern = RoutePattern::compile("users/:id").unwrap();
		let result = pattern.generate("user", &RouteParams::new());
		assert!(matches!(
			result,
			Err(RouterError::MissingParam { ref param, .. }) if param == "id"
		));
	}

	#[test]
	fn test_regex_pattern() {
		let regex = regex::Regex::new(r"^reports/(?P<year>\d{4})$").unwrap();
		let pattern = RoutePattern::from_regex(regex);

		let params = pattern.matches("reports/2024").unwrap();
		assert_eq!(params.get("year"), Some(&"2024".to_string()));
		assert!(pattern.matches("reports/24").is_none());
	}

	#[test]
	fn test_regex_pattern_not_generateable() {
		let pattern = RoutePattern::from_regex(regex::Regex::new("^x$").unwrap());
		assert!(matches!(
			pattern.generate("x", &RouteParams::new()),
			Err(RouterError::NotGenerateable(_))
		));
	}

	#[test]
	fn test_literal_special_chars_escaped() {
		let pattern = RoutePattern::compile("api/v1.0").unwrap();
		assert!(pattern.matches("api/v1.0").is_some());
		assert!(pattern.matches("api/v1X0").is_none());
	}
}
