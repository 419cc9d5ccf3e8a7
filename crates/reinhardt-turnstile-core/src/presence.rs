//! Script presence observer.
//!
//! Answers "is a script element with this id in the document", whoever put it
//! there. This is weaker than readiness: the tag can exist while the remote
//! script is still downloading or executing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::DomError;
use crate::host::{Document, Observation};

type PresenceListener = Box<dyn FnOnce()>;

struct PresenceInner {
	script_id: String,
	present: Cell<bool>,
	listeners: RefCell<Vec<PresenceListener>>,
	observation: RefCell<Option<Observation>>,
}

impl PresenceInner {
	fn mark_present(&self) {
		if self.present.replace(true) {
			return;
		}
		// Once true the signal stays true, nothing left to watch.
		let observation = self.observation.borrow_mut().take();
		drop(observation);

		let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
		for listener in listeners {
			listener();
		}
	}
}

/// A one-shot "script tag present" signal.
///
/// Starts `false`, becomes and stays `true` once the element exists, and
/// notifies each listener exactly once.
#[derive(Clone)]
pub struct ScriptPresence {
	inner: Rc<PresenceInner>,
}

impl ScriptPresence {
	/// Starts watching `document` for an element with `script_id`.
	///
	/// Subscribes to subtree mutations first and then checks synchronously,
	/// so an element that already exists is reported immediately.
	pub fn observe(document: &Rc<dyn Document>, script_id: impl Into<String>) -> Result<Self, DomError> {
		let inner = Rc::new(PresenceInner {
			script_id: script_id.into(),
			present: Cell::new(false),
			listeners: RefCell::new(Vec::new()),
			observation: RefCell::new(None),
		});

		// The document is held strongly; the cycle through its observer list
		// ends when the observation is dropped.
		let weak_inner: Weak<PresenceInner> = Rc::downgrade(&inner);
		let watched = Rc::clone(document);
		let observation = document.observe_mutations(Rc::new(move || {
			let Some(inner) = weak_inner.upgrade() else {
				return;
			};
			if watched.contains_element(&inner.script_id) {
				inner.mark_present();
			}
		}))?;
		*inner.observation.borrow_mut() = Some(observation);

		if document.contains_element(&inner.script_id) {
			inner.mark_present();
		}

		Ok(Self { inner })
	}

	/// Id being watched.
	pub fn script_id(&self) -> &str {
		&self.inner.script_id
	}

	/// Current value of the signal.
	pub fn is_present(&self) -> bool {
		self.inner.present.get()
	}

	/// Whether the mutation subscription is still active.
	pub fn is_observing(&self) -> bool {
		self.inner.observation.borrow().is_some()
	}

	/// Runs `listener` once the script is present (immediately if it already is).
	pub fn on_present(&self, listener: impl FnOnce() + 'static) {
		if self.is_present() {
			listener();
		} else {
			self.inner.listeners.borrow_mut().push(Box::new(listener));
		}
	}
}

impl fmt::Debug for ScriptPresence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScriptPresence")
			.field("script_id", &self.inner.script_id)
			.field("present", &self.inner.present.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockDocument;
	use rstest::rstest;

	fn as_document(document: &MockDocument) -> Rc<dyn Document> {
		Rc::new(document.clone())
	}

	#[rstest]
	fn test_existing_element_is_reported_immediately() {
		let document = MockDocument::new();
		document.insert_element("s1");

		let presence = ScriptPresence::observe(&as_document(&document), "s1").unwrap();

		assert!(presence.is_present());
		assert!(!presence.is_observing());
		assert_eq!(document.observer_count(), 0);
	}

	#[rstest]
	fn test_later_insertion_flips_signal_and_notifies_once() {
		let document = MockDocument::new();
		let presence = ScriptPresence::observe(&as_document(&document), "s1").unwrap();
		let notified = Rc::new(Cell::new(0));
		presence.on_present({
			let notified = Rc::clone(&notified);
			move || notified.set(notified.get() + 1)
		});

		assert!(!presence.is_present());
		document.insert_element("unrelated");
		assert!(!presence.is_present());

		document.insert_element("s1");
		document.insert_element("another");

		assert!(presence.is_present());
		assert_eq!(notified.get(), 1);
		assert_eq!(document.observer_count(), 0);
	}

	#[rstest]
	fn test_stays_true_after_removal() {
		let document = MockDocument::new();
		let presence = ScriptPresence::observe(&as_document(&document), "s1").unwrap();
		document.insert_element("s1");
		document.remove_element("s1");

		assert!(presence.is_present());
	}

	#[rstest]
	fn test_observer_released_when_presence_dropped() {
		let document = MockDocument::new();
		let presence = ScriptPresence::observe(&as_document(&document), "s1").unwrap();
		assert_eq!(document.observer_count(), 1);

		drop(presence);

		assert_eq!(document.observer_count(), 0);
	}

	#[rstest]
	fn test_listener_after_presence_runs_immediately() {
		let document = MockDocument::new();
		document.insert_element("s1");
		let presence = ScriptPresence::observe(&as_document(&document), "s1").unwrap();
		let ran = Rc::new(Cell::new(false));
		presence.on_present({
			let ran = Rc::clone(&ran);
			move || ran.set(true)
		});
		assert!(ran.get());
	}
}
