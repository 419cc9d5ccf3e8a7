//! Per-instance widget handle.

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::WidgetId;

/// Local record of the widget owned by one component instance.
///
/// Holds at most one live identifier. Never shared between instances, even
/// when several widgets share one page and one remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetHandle {
	id: Option<WidgetId>,
	solved: bool,
	last_token: Option<String>,
}

pub(crate) type SharedWidgetHandle = Rc<RefCell<WidgetHandle>>;

impl WidgetHandle {
	/// Live widget identifier.
	pub fn id(&self) -> Option<&WidgetId> {
		self.id.as_ref()
	}

	/// Whether a success callback fired since the last reset or removal.
	pub fn is_solved(&self) -> bool {
		self.solved
	}

	/// Token delivered by the last success callback.
	pub fn last_token(&self) -> Option<&str> {
		self.last_token.as_deref()
	}

	pub(crate) fn assign(&mut self, id: WidgetId) {
		self.id = Some(id);
	}

	pub(crate) fn mark_solved(&mut self, token: String) {
		self.solved = true;
		self.last_token = Some(token);
	}

	pub(crate) fn clear_solved(&mut self) {
		self.solved = false;
		self.last_token = None;
	}

	/// Drops the identifier and the solved state, returning the old id.
	pub(crate) fn invalidate(&mut self) -> Option<WidgetId> {
		self.clear_solved();
		self.id.take()
	}
}
