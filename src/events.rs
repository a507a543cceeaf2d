//! Router lifecycle events.
//!
//! Observers subscribe callbacks on the root router; every accepted
//! navigation emits `Processing`, then exactly one of `Success`,
//! `Canceled` or `Error`, then `Complete`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::NavigationError;
use crate::instruction::NavigationInstruction;
use crate::pipeline::CancelReason;

/// A navigation lifecycle event.
#[derive(Clone)]
pub enum RouterEvent {
	/// A navigation was accepted for pipelining.
	Processing {
		/// The requested URL.
		url: String,
	},
	/// The pipeline completed and the instruction became current.
	Success {
		/// The committed instruction tree.
		instruction: Arc<NavigationInstruction>,
	},
	/// A guard rejected the navigation or it was superseded.
	Canceled {
		/// The requested URL.
		url: String,
		/// Why the navigation was canceled.
		reason: CancelReason,
	},
	/// Resolution or a pipeline step failed.
	Error {
		/// The requested URL.
		url: String,
		/// The underlying failure.
		error: Arc<NavigationError>,
	},
	/// Terminal bookkeeping event, emitted after any of the three
	/// outcomes above.
	Complete {
		/// The requested URL.
		url: String,
	},
}

impl std::fmt::Debug for RouterEvent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Processing { url } => f.debug_struct("Processing").field("url", url).finish(),
			Self::Success { instruction } => f
				.debug_struct("Success")
				.field("url", &instruction.url())
				.finish(),
			Self::Canceled { url, reason } => f
				.debug_struct("Canceled")
				.field("url", url)
				.field("reason", reason)
				.finish(),
			Self::Error { url, error } => f
				.debug_struct("Error")
				.field("url", url)
				.field("error", &error.to_string())
				.finish(),
			Self::Complete { url } => f.debug_struct("Complete").field("url", url).finish(),
		}
	}
}

type Listener = Arc<dyn Fn(&RouterEvent) + Send + Sync>;

/// Handle returned by [`EventDispatcher::subscribe`]; pass it back to
/// [`EventDispatcher::unsubscribe`] to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

/// Synchronous listener registry.
#[derive(Default)]
pub struct EventDispatcher {
	listeners: RwLock<Vec<(u64, Listener)>>,
	next_id: AtomicU64,
}

impl EventDispatcher {
	/// Creates an empty dispatcher.
	pub fn new() -> Self {
		Self::default()
	}

	/// Connects a listener; it is invoked inline for every event.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&RouterEvent) + Send + Sync + 'static,
	{
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.listeners.write().push((id, Arc::new(listener)));
		Subscription(id)
	}

	/// Disconnects a listener. Returns whether anything was removed.
	pub fn unsubscribe(&self, subscription: Subscription) -> bool {
		let mut listeners = self.listeners.write();
		let before = listeners.len();
		listeners.retain(|(id, _)| *id != subscription.0);
		listeners.len() < before
	}

	/// Emits an event to every connected listener.
	pub fn emit(&self, event: &RouterEvent) {
		// Clone out so listeners may subscribe/unsubscribe re-entrantly.
		let listeners: Vec<Listener> = self
			.listeners
			.read()
			.iter()
			.map(|(_, l)| l.clone())
			.collect();
		for listener in listeners {
			listener(event);
		}
	}
}

impl std::fmt::Debug for EventDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventDispatcher")
			.field("listeners", &self.listeners.read().len())
			.finish()
	}
}
