//! In-memory host for tests.
//!
//! [`MockDocument`], [`MockWindow`] and [`MockTurnstile`] implement the host
//! traits over `Rc<RefCell<..>>` state, so a test can drive the whole widget
//! lifecycle without a browser: insert elements, fire the global load
//! callback, solve or expire widgets, and inspect every remote call.
//!
//! # Example
//!
//! ```ignore
//! use reinhardt_turnstile_core::testing::{MockDocument, MockTurnstile, MockWindow};
//!
//! let document = MockDocument::new();
//! let window = MockWindow::new();
//! let api = MockTurnstile::with_document(&document);
//!
//! window.load(api.clone(), "onloadTurnstileCallback__cf-turnstile");
//! api.solve_all("XXXX.DUMMY.TOKEN.XXXX");
//! ```
//!
//! Every mock invokes user callbacks after releasing its own borrows, so
//! callbacks may call back into the mock.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::callback::Callback;
use crate::error::{ApiError, DomError};
use crate::host::{Document, Observation, ScriptElement, TurnstileApi, WidgetId, Window};
use crate::params::RenderParams;
use crate::style::ContainerStyle;

/// Token the test site keys always produce.
pub const DUMMY_TOKEN: &str = "XXXX.DUMMY.TOKEN.XXXX";

#[derive(Default)]
struct DocumentState {
	elements: BTreeSet<String>,
	scripts: Vec<ScriptElement>,
	styles: HashMap<String, ContainerStyle>,
	observers: Vec<(usize, Rc<dyn Fn()>)>,
	load_listeners: Vec<(usize, String, Rc<dyn Fn()>)>,
	next_observer: usize,
}

/// Mock document.
///
/// Elements are tracked by id only. Every insertion or removal notifies the
/// active mutation observers.
#[derive(Clone, Default)]
pub struct MockDocument {
	state: Rc<RefCell<DocumentState>>,
}

impl MockDocument {
	/// Create an empty document.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a document that already contains elements with `ids`.
	pub fn with_elements<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let document = Self::new();
		document
			.state
			.borrow_mut()
			.elements
			.extend(ids.into_iter().map(Into::into));
		document
	}

	/// Insert an element and notify observers.
	pub fn insert_element(&self, id: impl Into<String>) {
		let inserted = self.state.borrow_mut().elements.insert(id.into());
		if inserted {
			self.notify();
		}
	}

	/// Remove an element and notify observers.
	pub fn remove_element(&self, id: &str) {
		let removed = self.state.borrow_mut().elements.remove(id);
		if removed {
			self.notify();
		}
	}

	/// Whether an element with `id` exists.
	pub fn has_element(&self, id: &str) -> bool {
		self.state.borrow().elements.contains(id)
	}

	/// Scripts appended so far, in order.
	pub fn scripts(&self) -> Vec<ScriptElement> {
		self.state.borrow().scripts.clone()
	}

	/// Number of appended scripts with `id`.
	pub fn script_count(&self, id: &str) -> usize {
		self.state
			.borrow()
			.scripts
			.iter()
			.filter(|script| script.id == id)
			.count()
	}

	/// Simulates a load failure of the script with `id`.
	///
	/// Returns `false` if no such script exists.
	pub fn fail_script(&self, id: &str) -> bool {
		let on_error = {
			let state = self.state.borrow();
			match state.scripts.iter().find(|script| script.id == id) {
				Some(script) => script.on_error.clone(),
				None => return false,
			}
		};
		if let Some(on_error) = on_error {
			on_error.call(());
		}
		true
	}

	/// Simulates the script with `id` finishing its download and execution.
	///
	/// Fires the load listeners of that element. Returns `false` if no such
	/// element exists.
	pub fn complete_script(&self, id: &str) -> bool {
		let listeners: Vec<Rc<dyn Fn()>> = {
			let state = self.state.borrow();
			if !state.elements.contains(id) {
				return false;
			}
			state
				.load_listeners
				.iter()
				.filter(|(_, script_id, _)| script_id == id)
				.map(|(_, _, listener)| Rc::clone(listener))
				.collect()
		};
		for listener in listeners {
			listener();
		}
		true
	}

	/// Number of active script-load listeners.
	pub fn load_listener_count(&self) -> usize {
		self.state.borrow().load_listeners.len()
	}

	/// Last style applied to `container_id`.
	pub fn style_of(&self, container_id: &str) -> Option<ContainerStyle> {
		self.state.borrow().styles.get(container_id).copied()
	}

	/// Number of active mutation observers.
	pub fn observer_count(&self) -> usize {
		self.state.borrow().observers.len()
	}

	fn notify(&self) {
		let observers: Vec<Rc<dyn Fn()>> = self
			.state
			.borrow()
			.observers
			.iter()
			.map(|(_, observer)| Rc::clone(observer))
			.collect();
		for observer in observers {
			observer();
		}
	}
}

impl Document for MockDocument {
	fn contains_element(&self, id: &str) -> bool {
		self.has_element(id)
	}

	fn contains_script_src(&self, src: &str) -> bool {
		self.state
			.borrow()
			.scripts
			.iter()
			.any(|script| script.src == src)
	}

	fn append_script(&self, script: ScriptElement) -> Result<(), DomError> {
		{
			let mut state = self.state.borrow_mut();
			state.elements.insert(script.id.clone());
			state.scripts.push(script);
		}
		self.notify();
		Ok(())
	}

	fn set_container_style(
		&self,
		container_id: &str,
		style: &ContainerStyle,
	) -> Result<(), DomError> {
		let mut state = self.state.borrow_mut();
		if !state.elements.contains(container_id) {
			return Err(DomError::Operation(format!(
				"element #{} not found",
				container_id
			)));
		}
		state.styles.insert(container_id.to_string(), *style);
		Ok(())
	}

	fn observe_mutations(&self, on_mutation: Rc<dyn Fn()>) -> Result<Observation, DomError> {
		let id = {
			let mut state = self.state.borrow_mut();
			let id = state.next_observer;
			state.next_observer += 1;
			state.observers.push((id, on_mutation));
			id
		};
		let weak = Rc::downgrade(&self.state);
		Ok(Observation::new(move || {
			if let Some(state) = weak.upgrade() {
				state.borrow_mut().observers.retain(|(other, _)| *other != id);
			}
		}))
	}

	fn observe_script_load(
		&self,
		script_id: &str,
		on_load: Rc<dyn Fn()>,
	) -> Result<Observation, DomError> {
		let id = {
			let mut state = self.state.borrow_mut();
			if !state.elements.contains(script_id) {
				return Ok(Observation::detached());
			}
			let id = state.next_observer;
			state.next_observer += 1;
			state.load_listeners.push((id, script_id.to_string(), on_load));
			id
		};
		let weak = Rc::downgrade(&self.state);
		Ok(Observation::new(move || {
			if let Some(state) = weak.upgrade() {
				state
					.borrow_mut()
					.load_listeners
					.retain(|(other, _, _)| *other != id);
			}
		}))
	}
}

impl fmt::Debug for MockDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("MockDocument")
			.field("elements", &state.elements)
			.field("scripts", &state.scripts.len())
			.field("observers", &state.observers.len())
			.field("load_listeners", &state.load_listeners.len())
			.finish()
	}
}

/// A call received by [`MockTurnstile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
	/// `render(container)`
	Render(String),
	/// `execute(container)`
	Execute(String),
	/// `reset(id)`
	Reset(WidgetId),
	/// `remove(id)`
	Remove(WidgetId),
	/// `getResponse(id)`
	GetResponse(WidgetId),
	/// `isExpired(id)`
	IsExpired(WidgetId),
}

struct MockWidget {
	container: String,
	params: RenderParams,
	token: Option<String>,
	expired: bool,
}

#[derive(Default)]
struct TurnstileState {
	widgets: BTreeMap<WidgetId, MockWidget>,
	calls: Vec<ApiCall>,
	next_id: usize,
	document: Option<MockDocument>,
	reset_failure: Option<String>,
	render_failure: Option<String>,
}

/// Mock `window.turnstile`.
///
/// Widget ids are `cf-chl-widget-<n>`. When built with
/// [`with_document`](Self::with_document), rendered widgets appear in the
/// document as elements with their id and disappear on removal.
#[derive(Clone, Default)]
pub struct MockTurnstile {
	state: Rc<RefCell<TurnstileState>>,
}

impl MockTurnstile {
	/// Create a detached mock API.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a mock API that mirrors widgets into `document`.
	pub fn with_document(document: &MockDocument) -> Self {
		let api = Self::new();
		api.state.borrow_mut().document = Some(document.clone());
		api
	}

	/// Every call received so far.
	pub fn calls(&self) -> Vec<ApiCall> {
		self.state.borrow().calls.clone()
	}

	/// Number of `render` calls.
	pub fn render_count(&self) -> usize {
		self.count(|call| matches!(call, ApiCall::Render(_)))
	}

	/// Number of `remove` calls.
	pub fn remove_count(&self) -> usize {
		self.count(|call| matches!(call, ApiCall::Remove(_)))
	}

	/// Forget recorded calls.
	pub fn clear_calls(&self) {
		self.state.borrow_mut().calls.clear();
	}

	/// Ids of widgets that were rendered and not removed.
	pub fn live_widgets(&self) -> Vec<WidgetId> {
		self.state.borrow().widgets.keys().cloned().collect()
	}

	/// Parameters a live widget was rendered with.
	pub fn params_of(&self, id: &WidgetId) -> Option<RenderParams> {
		self.state
			.borrow()
			.widgets
			.get(id)
			.map(|widget| widget.params.clone())
	}

	/// Container a live widget was rendered into.
	pub fn container_of(&self, id: &WidgetId) -> Option<String> {
		self.state
			.borrow()
			.widgets
			.get(id)
			.map(|widget| widget.container.clone())
	}

	/// Solves a widget: stores `token` and fires its success callback.
	///
	/// Returns `false` if the widget is not live.
	pub fn solve(&self, id: &WidgetId, token: &str) -> bool {
		let success = {
			let mut state = self.state.borrow_mut();
			let Some(widget) = state.widgets.get_mut(id) else {
				return false;
			};
			widget.token = Some(token.to_string());
			widget.expired = false;
			widget.params.callbacks.success.clone()
		};
		if let Some(success) = success {
			success.call(token.to_string());
		}
		true
	}

	/// Solves every live widget with `token`.
	pub fn solve_all(&self, token: &str) {
		for id in self.live_widgets() {
			self.solve(&id, token);
		}
	}

	/// Expires a widget's token and fires its expire callback.
	pub fn expire(&self, id: &WidgetId) -> bool {
		let expired = {
			let mut state = self.state.borrow_mut();
			let Some(widget) = state.widgets.get_mut(id) else {
				return false;
			};
			widget.expired = true;
			widget.params.callbacks.expired.clone()
		};
		if let Some(expired) = expired {
			expired.call(());
		}
		true
	}

	/// Fires a widget's error callback with `code`.
	pub fn fail(&self, id: &WidgetId, code: &str) -> bool {
		let error = {
			let state = self.state.borrow();
			let Some(widget) = state.widgets.get(id) else {
				return false;
			};
			widget.params.callbacks.error.clone()
		};
		if let Some(error) = error {
			error.call(code.to_string());
		}
		true
	}

	/// Makes every following `reset` raise `message` (or stop raising).
	pub fn set_reset_failure(&self, message: Option<&str>) {
		self.state.borrow_mut().reset_failure = message.map(str::to_string);
	}

	/// Makes every following `render` raise `message` (or stop raising).
	pub fn set_render_failure(&self, message: Option<&str>) {
		self.state.borrow_mut().render_failure = message.map(str::to_string);
	}

	fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
		self.state
			.borrow()
			.calls
			.iter()
			.filter(|call| predicate(call))
			.count()
	}

	fn record(&self, call: ApiCall) {
		self.state.borrow_mut().calls.push(call);
	}

	fn unknown(id: &WidgetId) -> ApiError {
		ApiError::Exception(format!("unknown widget {}", id))
	}
}

impl TurnstileApi for MockTurnstile {
	fn render(&self, container_id: &str, params: &RenderParams) -> Result<WidgetId, ApiError> {
		self.record(ApiCall::Render(container_id.to_string()));
		let (id, document) = {
			let mut state = self.state.borrow_mut();
			if let Some(message) = &state.render_failure {
				return Err(ApiError::Exception(message.clone()));
			}
			state.next_id += 1;
			let id = WidgetId::new(format!("cf-chl-widget-{}", state.next_id));
			state.widgets.insert(
				id.clone(),
				MockWidget {
					container: container_id.to_string(),
					params: params.clone(),
					token: None,
					expired: false,
				},
			);
			(id, state.document.clone())
		};
		if let Some(document) = document {
			document.insert_element(id.as_str());
		}
		Ok(id)
	}

	fn execute(&self, container_id: &str, _params: &RenderParams) -> Result<(), ApiError> {
		self.record(ApiCall::Execute(container_id.to_string()));
		let state = self.state.borrow();
		if state
			.widgets
			.values()
			.any(|widget| widget.container == container_id)
		{
			Ok(())
		} else {
			Err(ApiError::Exception(format!(
				"no widget in container {}",
				container_id
			)))
		}
	}

	fn reset(&self, widget_id: &WidgetId) -> Result<(), ApiError> {
		self.record(ApiCall::Reset(widget_id.clone()));
		let mut state = self.state.borrow_mut();
		if let Some(message) = &state.reset_failure {
			return Err(ApiError::Exception(message.clone()));
		}
		let widget = state
			.widgets
			.get_mut(widget_id)
			.ok_or_else(|| Self::unknown(widget_id))?;
		widget.token = None;
		widget.expired = false;
		Ok(())
	}

	fn remove(&self, widget_id: &WidgetId) -> Result<(), ApiError> {
		self.record(ApiCall::Remove(widget_id.clone()));
		let document = {
			let mut state = self.state.borrow_mut();
			if state.widgets.remove(widget_id).is_none() {
				return Err(Self::unknown(widget_id));
			}
			state.document.clone()
		};
		if let Some(document) = document {
			document.remove_element(widget_id.as_str());
		}
		Ok(())
	}

	fn get_response(&self, widget_id: &WidgetId) -> Result<Option<String>, ApiError> {
		self.record(ApiCall::GetResponse(widget_id.clone()));
		let state = self.state.borrow();
		let widget = state
			.widgets
			.get(widget_id)
			.ok_or_else(|| Self::unknown(widget_id))?;
		Ok(widget.token.clone())
	}

	fn is_expired(&self, widget_id: &WidgetId) -> Result<bool, ApiError> {
		self.record(ApiCall::IsExpired(widget_id.clone()));
		let state = self.state.borrow();
		let widget = state
			.widgets
			.get(widget_id)
			.ok_or_else(|| Self::unknown(widget_id))?;
		Ok(widget.expired)
	}
}

impl fmt::Debug for MockTurnstile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("MockTurnstile")
			.field("widgets", &state.widgets.keys().collect::<Vec<_>>())
			.field("calls", &state.calls.len())
			.finish()
	}
}

#[derive(Default)]
struct WindowState {
	turnstile: Option<MockTurnstile>,
	callbacks: HashMap<String, Callback>,
}

/// Mock global scope.
#[derive(Clone, Default)]
pub struct MockWindow {
	state: Rc<RefCell<WindowState>>,
}

impl MockWindow {
	/// Create a window without the widget API.
	pub fn new() -> Self {
		Self::default()
	}

	/// Defines `window.turnstile`.
	pub fn install_turnstile(&self, turnstile: MockTurnstile) {
		self.state.borrow_mut().turnstile = Some(turnstile);
	}

	/// Deletes `window.turnstile`.
	pub fn uninstall_turnstile(&self) {
		self.state.borrow_mut().turnstile = None;
	}

	/// Whether a global callback named `name` is defined.
	pub fn has_callback(&self, name: &str) -> bool {
		self.state.borrow().callbacks.contains_key(name)
	}

	/// Names of the defined global callbacks.
	pub fn callback_names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.state.borrow().callbacks.keys().cloned().collect();
		names.sort();
		names
	}

	/// Invokes the global callback `name`, as the remote script does on load.
	///
	/// Returns `false` if no such callback is defined.
	pub fn fire_callback(&self, name: &str) -> bool {
		let callback = self.state.borrow().callbacks.get(name).cloned();
		match callback {
			Some(callback) => {
				callback.call(());
				true
			}
			None => false,
		}
	}

	/// Simulates the remote script finishing: defines `window.turnstile` and
	/// calls the load callback `onload_name`.
	pub fn load(&self, turnstile: MockTurnstile, onload_name: &str) -> bool {
		self.install_turnstile(turnstile);
		self.fire_callback(onload_name)
	}
}

impl Window for MockWindow {
	fn turnstile(&self) -> Option<Rc<dyn TurnstileApi>> {
		self.state
			.borrow()
			.turnstile
			.clone()
			.map(|api| Rc::new(api) as Rc<dyn TurnstileApi>)
	}

	fn set_global_callback(&self, name: &str, callback: Callback) -> Result<(), DomError> {
		self.state
			.borrow_mut()
			.callbacks
			.insert(name.to_string(), callback);
		Ok(())
	}

	fn remove_global_callback(&self, name: &str) {
		self.state.borrow_mut().callbacks.remove(name);
	}
}

impl fmt::Debug for MockWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("MockWindow")
			.field("turnstile", &state.turnstile.is_some())
			.field("callbacks", &state.callbacks.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::props::TurnstileProps;
	use crate::widget::WidgetHandle;
	use rstest::rstest;
	use std::cell::Cell;

	fn params() -> RenderParams {
		let handle = Rc::new(RefCell::new(WidgetHandle::default()));
		RenderParams::build(&TurnstileProps::new("site"), &handle)
	}

	#[rstest]
	fn test_observation_drop_unsubscribes() {
		let document = MockDocument::new();
		let hits = Rc::new(Cell::new(0));
		let observation = document
			.observe_mutations(Rc::new({
				let hits = Rc::clone(&hits);
				move || hits.set(hits.get() + 1)
			}))
			.unwrap();

		document.insert_element("a");
		drop(observation);
		document.insert_element("b");

		assert_eq!(hits.get(), 1);
		assert_eq!(document.observer_count(), 0);
	}

	#[rstest]
	fn test_script_load_listener_fires_for_its_element() {
		let document = MockDocument::with_elements(["s1", "s2"]);
		let hits = Rc::new(Cell::new(0));
		let observation = document
			.observe_script_load(
				"s1",
				Rc::new({
					let hits = Rc::clone(&hits);
					move || hits.set(hits.get() + 1)
				}),
			)
			.unwrap();

		assert!(document.complete_script("s2"));
		assert_eq!(hits.get(), 0);
		assert!(document.complete_script("s1"));
		assert_eq!(hits.get(), 1);

		drop(observation);
		assert_eq!(document.load_listener_count(), 0);
		assert!(!document.complete_script("missing"));
	}

	#[rstest]
	fn test_script_load_on_missing_element_is_detached() {
		let document = MockDocument::new();
		let _observation = document
			.observe_script_load("s1", Rc::new(|| {}))
			.unwrap();
		assert_eq!(document.load_listener_count(), 0);
	}

	#[rstest]
	fn test_style_requires_container() {
		let document = MockDocument::with_elements(["box"]);
		assert!(
			document
				.set_container_style("missing", &ContainerStyle::NORMAL)
				.is_err()
		);
		document
			.set_container_style("box", &ContainerStyle::COMPACT)
			.unwrap();
		assert_eq!(document.style_of("box"), Some(ContainerStyle::COMPACT));
	}

	#[rstest]
	fn test_render_mirrors_widget_into_document() {
		let document = MockDocument::new();
		let api = MockTurnstile::with_document(&document);

		let id = api.render("box", &params()).unwrap();
		assert_eq!(id.as_str(), "cf-chl-widget-1");
		assert!(document.has_element("cf-chl-widget-1"));

		api.remove(&id).unwrap();
		assert!(!document.has_element("cf-chl-widget-1"));
		assert!(api.remove(&id).is_err());
	}

	#[rstest]
	fn test_solve_and_reset() {
		let api = MockTurnstile::new();
		let id = api.render("box", &params()).unwrap();

		assert_eq!(api.get_response(&id).unwrap(), None);
		assert!(api.solve(&id, DUMMY_TOKEN));
		assert_eq!(api.get_response(&id).unwrap().as_deref(), Some(DUMMY_TOKEN));

		api.reset(&id).unwrap();
		assert_eq!(api.get_response(&id).unwrap(), None);
	}

	#[rstest]
	fn test_window_callbacks() {
		let window = MockWindow::new();
		let fired = Rc::new(Cell::new(false));
		window
			.set_global_callback(
				"cb",
				Callback::new({
					let fired = Rc::clone(&fired);
					move |()| fired.set(true)
				}),
			)
			.unwrap();

		assert_eq!(window.callback_names(), vec!["cb".to_string()]);
		assert!(window.fire_callback("cb"));
		assert!(fired.get());
		assert!(!window.fire_callback("other"));
		assert!(window.turnstile().is_none());
	}
}
