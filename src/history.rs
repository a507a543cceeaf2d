//! History adapter seam.
//!
//! The platform URL bar and back/forward state belong to a host-supplied
//! adapter; the router only tells it what the committed URL and title are,
//! and only after a navigation's pipeline fully completes. The in-memory
//! adapter here is the headless analogue used by tests and non-browser
//! hosts.

use parking_lot::Mutex;

/// What kind of event triggered a navigation. The root router derives its
/// navigation-state flags from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
	/// An explicit API call (`navigate`, `navigate_to_route`).
	Explicit,
	/// The platform's back button / `navigate_back`.
	Back,
	/// The platform's forward button.
	Forward,
	/// Re-running the pipeline for the current URL.
	Refresh,
}

/// Translates committed navigations to platform URL/history mutations.
pub trait HistoryAdapter: Send + Sync {
	/// The URL the platform currently shows, if any.
	fn current(&self) -> Option<String>;

	/// Pushes a new entry onto the history stack.
	fn push(&self, url: &str);

	/// Replaces the current entry without growing the stack.
	fn replace(&self, url: &str);

	/// Steps back one entry; returns the URL that becomes current.
	fn back(&self) -> Option<String>;

	/// Steps forward one entry; returns the URL that becomes current.
	fn forward(&self) -> Option<String>;

	/// Sets the document title.
	fn set_title(&self, title: &str);
}

#[derive(Debug, Default)]
struct HistoryState {
	back: Vec<String>,
	current: Option<String>,
	forward: Vec<String>,
	title: String,
}

/// In-memory history stack with back/forward support.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
	state: Mutex<HistoryState>,
}

impl InMemoryHistory {
	/// Creates an empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// The current document title.
	pub fn title(&self) -> String {
		self.state.lock().title.clone()
	}

	/// Number of entries behind the current one.
	pub fn back_len(&self) -> usize {
		self.state.lock().back.len()
	}
}

impl HistoryAdapter for InMemoryHistory {
	fn current(&self) -> Option<String> {
		self.state.lock().current.clone()
	}

	fn push(&self, url: &str) {
		let mut state = self.state.lock();
		if let Some(current) = state.current.take() {
			state.back.push(current);
		}
		state.current = Some(url.to_string());
		// A fresh push invalidates the forward stack.
		state.forward.clear();
	}

	fn replace(&self, url: &str) {
		self.state.lock().current = Some(url.to_string());
	}

	fn back(&self) -> Option<String> {
		let mut state = self.state.lock();
		let previous = state.back.pop()?;
		if let Some(current) = state.current.take() {
			state.forward.push(current);
		}
		state.current = Some(previous.clone());
		Some(previous)
	}

	fn forward(&self) -> Option<String> {
		let mut state = self.state.lock();
		let next = state.forward.pop()?;
		if let Some(current) = state.current.take() {
			state.back.push(current);
		}
		state.current = Some(next.clone());
		Some(next)
	}

	fn set_title(&self, title: &str) {
		self.state.lock().title = title.to_string();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_push_back_forward() {
		let history = InMemoryHistory::new();
		history.push("a");
		history.push("b");
		history.push("c");

		assert_eq!(history.current().as_deref(), Some("c"));
		assert_eq!(history.back().as_deref(), Some("b"));
		assert_eq!(history.back().as_deref(), Some("a"));
		assert_eq!(history.back(), None);
		assert_eq!(history.forward().as_deref(), Some("b"));
		assert_eq!(history.current().as_deref(), Some("b"));
	}

	#[test]
	fn test_push_clears_forward_stack() {
		let history = InMemoryHistory::new();
		history.push("a");
		history.push("b");
		history.back();
		history.push("c");

		assert_eq!(history.forward(), None);
		assert_eq!(history.current().as_deref(), Some("c"));
	}

	#[test]
	fn test_replace_keeps_stack_depth() {
		let history = InMemoryHistory::new();
		history.push("a");
		history.push("b");
		history.replace("b2");

		assert_eq!(history.current().as_deref(), Some("b2"));
		assert_eq!(history.back_len(), 1);
		assert_eq!(history.back().as_deref(), Some("a"));
	}

	#[test]
	fn test_title() {
		let history = InMemoryHistory::new();
		history.set_title("Users | App");
		assert_eq!(history.title(), "Users | App");
	}
}
