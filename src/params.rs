//! Parameter maps and URL helpers.
//!
//! Matched path parameters and decoded query parameters share one shape:
//! a string-to-string map. An absent optional parameter is an absent key,
//! never an empty string.

use std::collections::HashMap;

/// Parameters extracted from a matched path or a query string.
pub type RouteParams = HashMap<String, String>;

/// Splits a URL into its path and raw query portions.
///
/// The fragment portion, if present, is discarded; the router has no use
/// for in-page anchors.
pub fn split_url(url: &str) -> (&str, Option<&str>) {
	let url = url.split('#').next().unwrap_or(url);
	match url.split_once('?') {
		Some((path, query)) => (path, Some(query)),
		None => (url, None),
	}
}

/// Normalizes a path for matching: strips leading and trailing slashes.
///
/// The empty string is the root path.
pub fn normalize_path(path: &str) -> &str {
	path.trim_matches('/')
}

/// Decodes a raw query string into a parameter map.
///
/// Malformed input decodes to an empty map rather than failing the
/// navigation; a garbage query string is not a routing error.
pub fn parse_query(query: &str) -> RouteParams {
	serde_urlencoded::from_str::<Vec<(String, String)>>(query)
		.map(|pairs| pairs.into_iter().collect())
		.unwrap_or_default()
}

/// Encodes a parameter map back into a query string.
///
/// Keys are sorted so generated URLs are stable.
pub fn encode_query(params: &RouteParams) -> String {
	let mut pairs: Vec<(&String, &String)> = params.iter().collect();
	pairs.sort_by(|a, b| a.0.cmp(b.0));
	serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("users/42?tab=posts", "users/42", Some("tab=posts"))]
	#[case("users/42", "users/42", None)]
	#[case("users/42#section", "users/42", None)]
	#[case("?a=b", "", Some("a=b"))]
	fn test_split_url(#[case] url: &str, #[case] path: &str, #[case] query: Option<&str>) {
		assert_eq!(split_url(url), (path, query));
	}

	#[rstest]
	#[case("/users/42/", "users/42")]
	#[case("users/42", "users/42")]
	#[case("/", "")]
	#[case("", "")]
	fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(input), expected);
	}

	#[test]
	fn test_parse_query() {
		let params = parse_query("a=1&b=hello%20world");
		assert_eq!(params.get("a"), Some(&"1".to_string()));
		assert_eq!(params.get("b"), Some(&"hello world".to_string()));
	}

	#[test]
	fn test_parse_query_malformed_is_empty() {
		assert!(parse_query("%zz").is_empty());
	}

	#[test]
	fn test_encode_query_is_sorted() {
		let mut params = RouteParams::new();
		params.insert("b".to_string(), "2".to_string());
		params.insert("a".to_string(), "1".to_string());
		assert_eq!(encode_query(&params), "a=1&b=2");
	}
}
