//! Shared page fixture for the integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use reinhardt_turnstile_core::testing::{MockDocument, MockTurnstile, MockWindow};
use reinhardt_turnstile_core::{Environment, ReadinessGate, Turnstile, TurnstileProps};

/// Test site key that always passes.
pub const TEST_PASS: &str = "1x00000000000000000000AA";

/// One page: a document, a window, the widget API and an isolated gate.
pub struct Page {
	pub document: MockDocument,
	pub window: MockWindow,
	pub api: MockTurnstile,
	pub gate: ReadinessGate,
}

impl Page {
	pub fn new() -> Self {
		let document = MockDocument::new();
		let api = MockTurnstile::with_document(&document);
		Self {
			document,
			window: MockWindow::new(),
			api,
			gate: ReadinessGate::new(),
		}
	}

	pub fn env(&self) -> Environment {
		Environment::with_gate(
			Rc::new(self.document.clone()),
			Rc::new(self.window.clone()),
			self.gate.clone(),
		)
	}

	/// Creates a component, inserts its container and mounts it.
	pub fn mount(&self, props: TurnstileProps) -> Turnstile {
		let turnstile = Turnstile::new(props, self.env());
		self.document.insert_element(turnstile.container().id);
		turnstile.mount();
		turnstile
	}

	/// The remote script finished loading for `turnstile`.
	pub fn load_script(&self, turnstile: &Turnstile) -> bool {
		self.window
			.load(self.api.clone(), &turnstile.script_identity().onload_name)
	}

	/// Mounts and loads in one step.
	pub fn mount_loaded(&self, props: TurnstileProps) -> Turnstile {
		let turnstile = self.mount(props);
		self.load_script(&turnstile);
		turnstile
	}
}
