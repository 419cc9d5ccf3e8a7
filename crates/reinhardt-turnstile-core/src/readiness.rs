//! Global readiness gate.
//!
//! The remote script signals that `window.turnstile` is usable by calling a
//! global function whose name is passed in the script URL. [`ReadinessGate`]
//! owns that handshake: one entry per load-callback name, moving through
//! [`ReadinessState::Unloaded`] → [`ReadinessState::Loading`] →
//! [`ReadinessState::Ready`]. `Ready` is terminal.
//!
//! Waiters are plain `FnOnce` listeners or futures from [`ReadinessGate::wait`].
//! They are drained exactly once, outside of any internal borrow, so a waiter
//! may freely call back into the gate.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;

use crate::callback::Callback;
use crate::host::Window;
use crate::{debug_log, warn_log};

/// Load state of one load-callback name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadinessState {
	/// Nobody asked for this name yet.
	#[default]
	Unloaded,
	/// The global callback is registered and has not fired.
	Loading,
	/// The widget API is usable.
	Ready,
}

type ReadyListener = Box<dyn FnOnce()>;

#[derive(Default)]
struct GateEntry {
	state: ReadinessState,
	waiters: Vec<ReadyListener>,
	window: Option<Weak<dyn Window>>,
}

thread_local! {
	static GLOBAL_GATE: ReadinessGate = ReadinessGate::new();
}

/// Keyed "become ready" service.
///
/// Cloning yields another handle to the same gate.
#[derive(Clone, Default)]
pub struct ReadinessGate {
	entries: Rc<RefCell<HashMap<String, GateEntry>>>,
}

impl ReadinessGate {
	/// Creates an isolated gate.
	pub fn new() -> Self {
		Self::default()
	}

	/// The gate shared by every component on this thread.
	pub fn global() -> Self {
		GLOBAL_GATE.with(Clone::clone)
	}

	/// Current state of `name`.
	pub fn state(&self, name: &str) -> ReadinessState {
		self.entries
			.borrow()
			.get(name)
			.map(|entry| entry.state)
			.unwrap_or_default()
	}

	/// Whether `name` is ready.
	pub fn is_ready(&self, name: &str) -> bool {
		self.state(name) == ReadinessState::Ready
	}

	/// Registers the global load callback for `name` on first call.
	///
	/// Later calls, and calls after the name became ready, do nothing.
	/// Returns the state after the call.
	pub fn request(&self, name: &str, window: &Rc<dyn Window>) -> ReadinessState {
		if self.state(name) != ReadinessState::Unloaded {
			return self.state(name);
		}

		let weak_gate = Rc::downgrade(&self.entries);
		let callback_name = name.to_string();
		let callback = Callback::new(move |()| {
			if let Some(entries) = weak_gate.upgrade() {
				ReadinessGate { entries }.resolve(&callback_name);
			}
		});

		if let Err(err) = window.set_global_callback(name, callback) {
			warn_log!("failed to register turnstile load callback {}: {}", name, err);
			return ReadinessState::Unloaded;
		}

		let mut entries = self.entries.borrow_mut();
		let entry = entries.entry(name.to_string()).or_default();
		entry.state = ReadinessState::Loading;
		entry.window = Some(Rc::downgrade(window));
		debug_log!("waiting for turnstile load callback {}", name);
		ReadinessState::Loading
	}

	/// Flips `name` to ready and notifies every waiter.
	///
	/// Removes the global callback registered by [`request`](Self::request).
	/// Resolving an already ready name is a no-op.
	pub fn resolve(&self, name: &str) {
		let (waiters, window) = {
			let mut entries = self.entries.borrow_mut();
			let entry = entries.entry(name.to_string()).or_default();
			if entry.state == ReadinessState::Ready {
				return;
			}
			entry.state = ReadinessState::Ready;
			(std::mem::take(&mut entry.waiters), entry.window.take())
		};

		if let Some(window) = window.and_then(|w| w.upgrade()) {
			window.remove_global_callback(name);
		}

		debug_log!("turnstile ready for {} ({} waiters)", name, waiters.len());
		for waiter in waiters {
			waiter();
		}
	}

	/// Abandons a pending `name`: deletes its global load callback, drops its
	/// waiters and returns it to [`ReadinessState::Unloaded`].
	///
	/// A ready name is left untouched. A later [`request`](Self::request)
	/// registers the callback again.
	pub fn release(&self, name: &str) {
		let (waiters, window) = {
			let mut entries = self.entries.borrow_mut();
			let Some(entry) = entries.get_mut(name) else {
				return;
			};
			if entry.state == ReadinessState::Ready {
				return;
			}
			entry.state = ReadinessState::Unloaded;
			(std::mem::take(&mut entry.waiters), entry.window.take())
		};

		if let Some(window) = window.and_then(|w| w.upgrade()) {
			window.remove_global_callback(name);
		}
		debug_log!("released turnstile load callback {} ({} waiters)", name, waiters.len());
		drop(waiters);
	}

	/// Number of listeners still waiting for `name`.
	pub fn waiter_count(&self, name: &str) -> usize {
		self.entries
			.borrow()
			.get(name)
			.map_or(0, |entry| entry.waiters.len())
	}

	/// Fallback readiness: resolves `name` when the script tag is present and
	/// the widget API is already detectable, even though the load callback
	/// never fired (the script was loaded earlier or injected by hand).
	///
	/// Returns whether `name` is ready afterwards.
	pub fn mark_ready_if_detected(&self, name: &str, script_present: bool, window: &dyn Window) -> bool {
		if self.is_ready(name) {
			return true;
		}
		if script_present && window.turnstile().is_some() {
			self.resolve(name);
			return true;
		}
		false
	}

	/// Runs `listener` once `name` is ready (immediately if it already is).
	pub fn on_ready(&self, name: &str, listener: impl FnOnce() + 'static) {
		{
			let mut entries = self.entries.borrow_mut();
			let entry = entries.entry(name.to_string()).or_default();
			if entry.state != ReadinessState::Ready {
				entry.waiters.push(Box::new(listener));
				return;
			}
		}
		listener();
	}

	/// Resolves once `name` is ready.
	///
	/// Fails only if the gate is dropped while the name is still pending.
	pub async fn wait(&self, name: &str) -> Result<(), oneshot::Canceled> {
		let (tx, rx) = oneshot::channel();
		self.on_ready(name, move || {
			let _ = tx.send(());
		});
		rx.await
	}
}

impl fmt::Debug for ReadinessGate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let entries = self.entries.borrow();
		let mut states: Vec<_> = entries
			.iter()
			.map(|(name, entry)| (name.clone(), entry.state))
			.collect();
		states.sort_by(|a, b| a.0.cmp(&b.0));
		f.debug_struct("ReadinessGate").field("entries", &states).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockTurnstile, MockWindow};
	use rstest::{fixture, rstest};
	use serial_test::serial;
	use std::cell::Cell;

	#[fixture]
	fn window() -> MockWindow {
		MockWindow::new()
	}

	fn as_window(window: &MockWindow) -> Rc<dyn Window> {
		Rc::new(window.clone())
	}

	#[rstest]
	fn test_state_machine(window: MockWindow) {
		let gate = ReadinessGate::new();
		let host = as_window(&window);

		assert_eq!(gate.state("cb"), ReadinessState::Unloaded);
		assert_eq!(gate.request("cb", &host), ReadinessState::Loading);
		assert!(window.has_callback("cb"));

		assert!(window.fire_callback("cb"));

		assert_eq!(gate.state("cb"), ReadinessState::Ready);
		assert!(!window.has_callback("cb"));
		assert_eq!(gate.request("cb", &host), ReadinessState::Ready);
	}

	#[rstest]
	fn test_waiters_fire_once(window: MockWindow) {
		let gate = ReadinessGate::new();
		let count = Rc::new(Cell::new(0));
		for _ in 0..3 {
			let count = Rc::clone(&count);
			gate.on_ready("cb", move || count.set(count.get() + 1));
		}
		gate.request("cb", &as_window(&window));

		gate.resolve("cb");
		gate.resolve("cb");

		assert_eq!(count.get(), 3);
	}

	#[rstest]
	fn test_listener_after_ready_runs_immediately() {
		let gate = ReadinessGate::new();
		gate.resolve("cb");
		let ran = Rc::new(Cell::new(false));
		gate.on_ready("cb", {
			let ran = Rc::clone(&ran);
			move || ran.set(true)
		});
		assert!(ran.get());
	}

	#[rstest]
	fn test_names_are_independent(window: MockWindow) {
		let gate = ReadinessGate::new();
		let host = as_window(&window);
		gate.request("a", &host);
		gate.request("b", &host);

		window.fire_callback("a");

		assert!(gate.is_ready("a"));
		assert_eq!(gate.state("b"), ReadinessState::Loading);
	}

	#[rstest]
	#[case(false, false, false)]
	#[case(true, false, false)]
	#[case(false, true, false)]
	#[case(true, true, true)]
	fn test_fallback_needs_script_and_api(
		window: MockWindow,
		#[case] script_present: bool,
		#[case] api_loaded: bool,
		#[case] expected: bool,
	) {
		if api_loaded {
			window.install_turnstile(MockTurnstile::new());
		}
		let gate = ReadinessGate::new();
		assert_eq!(gate.mark_ready_if_detected("cb", script_present, &window), expected);
		assert_eq!(gate.is_ready("cb"), expected);
	}

	#[rstest]
	fn test_waiter_may_reenter_gate() {
		let gate = ReadinessGate::new();
		let inner = gate.clone();
		let state = Rc::new(Cell::new(ReadinessState::Unloaded));
		gate.on_ready("cb", {
			let state = Rc::clone(&state);
			move || state.set(inner.state("cb"))
		});
		gate.resolve("cb");
		assert_eq!(state.get(), ReadinessState::Ready);
	}

	#[rstest]
	fn test_release_forgets_pending_name(window: MockWindow) {
		let gate = ReadinessGate::new();
		let host = as_window(&window);
		gate.request("cb", &host);
		let ran = Rc::new(Cell::new(false));
		gate.on_ready("cb", {
			let ran = Rc::clone(&ran);
			move || ran.set(true)
		});
		assert_eq!(gate.waiter_count("cb"), 1);

		gate.release("cb");

		assert_eq!(gate.state("cb"), ReadinessState::Unloaded);
		assert_eq!(gate.waiter_count("cb"), 0);
		assert!(!window.has_callback("cb"));

		// Registering again works and the dropped waiter never runs.
		assert_eq!(gate.request("cb", &host), ReadinessState::Loading);
		assert!(window.fire_callback("cb"));
		assert!(gate.is_ready("cb"));
		assert!(!ran.get());
	}

	#[rstest]
	fn test_release_keeps_ready_name(window: MockWindow) {
		let gate = ReadinessGate::new();
		gate.request("cb", &as_window(&window));
		window.fire_callback("cb");

		gate.release("cb");

		assert!(gate.is_ready("cb"));
	}

	#[rstest]
	fn test_debug_lists_names_in_order(window: MockWindow) {
		let gate = ReadinessGate::new();
		let host = as_window(&window);
		gate.request("b", &host);
		gate.resolve("a");

		assert_eq!(
			format!("{:?}", gate),
			"ReadinessGate { entries: [(\"a\", Ready), (\"b\", Loading)] }"
		);
	}

	#[tokio::test]
	async fn test_wait_resolves_after_callback() {
		let window = MockWindow::new();
		let gate = ReadinessGate::new();
		gate.request("cb", &as_window(&window));

		let waiting = gate.wait("cb");
		window.fire_callback("cb");

		assert_eq!(waiting.await, Ok(()));
	}

	#[rstest]
	#[serial(readiness_gate)]
	fn test_global_gate_is_shared() {
		let name = "global-shared-test";
		ReadinessGate::global().resolve(name);
		assert!(ReadinessGate::global().is_ready(name));
	}
}
