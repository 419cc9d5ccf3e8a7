//! The `Turnstile` component.
//!
//! A framework binding drives [`Turnstile`] from its own lifecycle:
//!
//! 1. Build it with [`Turnstile::new`] and emit [`Turnstile::container`].
//! 2. Call [`Turnstile::mount`] once the container element exists.
//! 3. Call [`Turnstile::update`] with the new props on every re-render.
//! 4. Call [`Turnstile::unmount`] (or drop it) when the container goes away.
//!
//! The owner talks to the widget through [`Turnstile::handle`].

use std::fmt;
use std::rc::Rc;

use crate::controller::{Controller, LifecycleState};
use crate::handle::TurnstileHandle;
use crate::host::{Document, WidgetId, Window};
use crate::props::TurnstileProps;
use crate::readiness::ReadinessGate;
use crate::script::ScriptIdentity;
use crate::style::ContainerStyle;

/// Host services a component runs against.
#[derive(Clone)]
pub struct Environment {
	/// The document holding the container.
	pub document: Rc<dyn Document>,
	/// The global scope.
	pub window: Rc<dyn Window>,
	/// Readiness gate shared with the other components of the page.
	pub gate: ReadinessGate,
}

impl Environment {
	/// Environment using the thread's shared [`ReadinessGate::global`].
	pub fn new(document: Rc<dyn Document>, window: Rc<dyn Window>) -> Self {
		Self::with_gate(document, window, ReadinessGate::global())
	}

	/// Environment with an explicit gate.
	pub fn with_gate(document: Rc<dyn Document>, window: Rc<dyn Window>, gate: ReadinessGate) -> Self {
		Self {
			document,
			window,
			gate,
		}
	}
}

impl fmt::Debug for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Environment")
			.field("gate", &self.gate)
			.finish_non_exhaustive()
	}
}

/// Declarative description of the container element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerView {
	/// Element tag.
	pub tag: String,
	/// Element id.
	pub id: String,
	/// Inline style.
	pub style: ContainerStyle,
	/// Extra attributes, in insertion order.
	pub attributes: Vec<(String, String)>,
}

impl ContainerView {
	/// Renders the empty container as HTML, for server-side output.
	pub fn to_html(&self) -> String {
		let mut html = format!(
			"<{} id=\"{}\" style=\"{}\"",
			self.tag,
			escape_attr(&self.id),
			escape_attr(&self.style.to_css())
		);
		for (name, value) in &self.attributes {
			html.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
		}
		html.push_str(&format!("></{}>", self.tag));
		html
	}
}

fn escape_attr(value: &str) -> String {
	value
		.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

/// A Turnstile widget instance.
pub struct Turnstile {
	controller: Rc<Controller>,
}

impl Turnstile {
	/// Creates an unmounted instance.
	pub fn new(props: TurnstileProps, env: Environment) -> Self {
		Self {
			controller: Controller::new(props, env),
		}
	}

	/// The container element to emit.
	pub fn container(&self) -> ContainerView {
		let props = self.controller.props();
		ContainerView {
			tag: props.tag,
			id: self.controller.container_id().to_string(),
			style: self.controller.style(),
			attributes: props.attributes,
		}
	}

	/// The container exists: inject, observe and render once ready.
	pub fn mount(&self) {
		self.controller.mount();
	}

	/// Applies new props; re-renders the live widget if its configuration changed.
	///
	/// The container id, `inject_script` and the script options are fixed by
	/// [`Turnstile::new`]. Changing them here only logs a warning.
	pub fn update(&self, props: TurnstileProps) {
		self.controller.update(props);
	}

	/// Removes the live widget, stops observing and releases a pending load
	/// callback. Idempotent.
	pub fn unmount(&self) {
		self.controller.unmount();
	}

	/// Imperative handle.
	pub fn handle(&self) -> TurnstileHandle {
		TurnstileHandle::new(&self.controller)
	}

	/// Lifecycle state.
	pub fn state(&self) -> LifecycleState {
		self.controller.state()
	}

	/// Live widget identifier.
	pub fn widget_id(&self) -> Option<WidgetId> {
		self.controller.widget().id().cloned()
	}

	/// Whether the live widget has been solved since its last reset.
	pub fn is_solved(&self) -> bool {
		self.controller.widget().is_solved()
	}

	/// Whether this instance's script tag is in the document.
	pub fn is_script_present(&self) -> bool {
		self.controller.script_present()
	}

	/// Script id and load-callback name of this instance.
	pub fn script_identity(&self) -> &ScriptIdentity {
		self.controller.identity()
	}
}

impl Drop for Turnstile {
	fn drop(&mut self) {
		self.controller.unmount();
	}
}

impl fmt::Debug for Turnstile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Turnstile")
			.field("container_id", &self.controller.container_id())
			.field("state", &self.controller.state())
			.field("widget", &self.controller.widget())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::options::{TurnstileOptions, WidgetSize};
	use crate::testing::{MockDocument, MockWindow};
	use rstest::rstest;

	fn env() -> Environment {
		Environment::with_gate(
			Rc::new(MockDocument::new()),
			Rc::new(MockWindow::new()),
			ReadinessGate::new(),
		)
	}

	#[rstest]
	fn test_container_defaults() {
		let turnstile = Turnstile::new(TurnstileProps::new("site"), env());
		let view = turnstile.container();

		assert_eq!(view.tag, "div");
		assert_eq!(view.id, "cf-turnstile");
		assert_eq!(view.style, ContainerStyle::NORMAL);
		assert_eq!(
			view.to_html(),
			"<div id=\"cf-turnstile\" style=\"width: 300px; height: 65px\"></div>"
		);
	}

	#[rstest]
	fn test_container_custom_tag_and_attributes() {
		let props = TurnstileProps::new("site")
			.with_id("signup")
			.with_tag("section")
			.with_attribute("class", "captcha \"box\"")
			.with_options(TurnstileOptions::default().with_size(WidgetSize::Compact));
		let view = Turnstile::new(props, env()).container();

		assert_eq!(
			view.to_html(),
			"<section id=\"signup\" style=\"width: 130px; height: 120px\" class=\"captcha &quot;box&quot;\"></section>"
		);
	}

	#[rstest]
	fn test_handle_detaches_on_drop() {
		let turnstile = Turnstile::new(TurnstileProps::new("site"), env());
		let handle = turnstile.handle();
		assert!(handle.is_attached());

		drop(turnstile);

		assert!(!handle.is_attached());
		assert_eq!(
			handle.render(),
			Err(crate::error::TurnstileError::Detached)
		);
	}
}
