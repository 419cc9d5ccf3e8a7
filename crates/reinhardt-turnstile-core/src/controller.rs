//! Widget lifecycle controller.
//!
//! One [`Controller`] per mounted component. It owns the widget handle, the
//! built render parameters and the lifecycle state, and is the only place
//! that calls the remote API.
//!
//! The controller lives in an `Rc`; every listener it registers (presence,
//! readiness) captures a `Weak` so dropping the component releases it. No
//! `RefCell` borrow is held across a remote call or a user callback, because
//! both may re-enter the controller.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::component::Environment;
use crate::error::{ApiError, ResponseError, TurnstileError};
use crate::host::{Document, Observation, TurnstileApi, WidgetId, Window};
use crate::options::Execution;
use crate::params::RenderParams;
use crate::presence::ScriptPresence;
use crate::props::TurnstileProps;
use crate::readiness::ReadinessGate;
use crate::script::{DEFAULT_CONTAINER_ID, ScriptIdentity, inject_script};
use crate::style::ContainerStyle;
use crate::widget::{SharedWidgetHandle, WidgetHandle};
use crate::{debug_log, warn_log};

/// Lifecycle state of one component instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
	/// No container yet.
	#[default]
	Uninitialized,
	/// Container mounted, widget API not ready or nothing rendered yet.
	AwaitingScript,
	/// A widget identifier is assigned.
	Rendered,
	/// The widget was removed; the container is still mounted.
	Removed,
	/// The container was unmounted.
	TornDown,
}

/// Outcome of comparing two render-parameter fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
	/// Nothing to do.
	Keep,
	/// Remove the live widget and render a new one.
	Rerender,
}

/// Decides whether a configuration change needs a re-render.
///
/// Only a live widget whose fingerprint changed is re-rendered; without a
/// live widget the next render picks up the new parameters anyway.
pub fn reconcile(previous: &str, next: &str, has_live_widget: bool) -> ReconcileAction {
	if has_live_widget && previous != next {
		ReconcileAction::Rerender
	} else {
		ReconcileAction::Keep
	}
}

pub(crate) struct Controller {
	document: Rc<dyn Document>,
	window: Rc<dyn Window>,
	gate: ReadinessGate,
	identity: ScriptIdentity,
	container_id: String,
	handle: SharedWidgetHandle,
	props: RefCell<TurnstileProps>,
	params: RefCell<RenderParams>,
	fingerprint: RefCell<String>,
	/// Style derived from the options, used to detect option changes.
	resolved_style: Cell<ContainerStyle>,
	/// Style last applied to the container.
	style: Cell<ContainerStyle>,
	state: Cell<LifecycleState>,
	first_rendered: Cell<bool>,
	presence: RefCell<Option<ScriptPresence>>,
	/// Re-checks fallback readiness while the tag exists but the gate is pending.
	fallback_watch: RefCell<Vec<Observation>>,
	weak_self: Weak<Controller>,
}

impl Controller {
	pub(crate) fn new(props: TurnstileProps, env: Environment) -> Rc<Self> {
		let container_id = props
			.id
			.clone()
			.unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string());
		let identity =
			ScriptIdentity::for_container(&container_id, &props.script_options, props.inject_script);
		let handle: SharedWidgetHandle = Rc::new(RefCell::new(WidgetHandle::default()));
		let params = RenderParams::build(&props, &handle);
		let fingerprint = fingerprint_of(&params, props.rerender_on_callback_change);
		let style = resolve_style(&props);

		Rc::new_cyclic(|weak_self| Self {
			document: env.document,
			window: env.window,
			gate: env.gate,
			identity,
			container_id,
			handle,
			props: RefCell::new(props),
			params: RefCell::new(params),
			fingerprint: RefCell::new(fingerprint),
			resolved_style: Cell::new(style),
			style: Cell::new(style),
			state: Cell::new(LifecycleState::Uninitialized),
			first_rendered: Cell::new(false),
			presence: RefCell::new(None),
			fallback_watch: RefCell::new(Vec::new()),
			weak_self: weak_self.clone(),
		})
	}

	pub(crate) fn container_id(&self) -> &str {
		&self.container_id
	}

	pub(crate) fn identity(&self) -> &ScriptIdentity {
		&self.identity
	}

	pub(crate) fn state(&self) -> LifecycleState {
		self.state.get()
	}

	pub(crate) fn style(&self) -> ContainerStyle {
		self.style.get()
	}

	pub(crate) fn widget(&self) -> WidgetHandle {
		self.handle.borrow().clone()
	}

	pub(crate) fn props(&self) -> TurnstileProps {
		self.props.borrow().clone()
	}

	pub(crate) fn script_present(&self) -> bool {
		self.presence
			.borrow()
			.as_ref()
			.is_some_and(ScriptPresence::is_present)
	}

	/// Container mounted: start loading and render once ready.
	pub(crate) fn mount(&self) {
		if self.state.get() != LifecycleState::Uninitialized {
			return;
		}
		self.state.set(LifecycleState::AwaitingScript);
		self.apply_style(self.resolved_style.get());

		let onload = self.identity.onload_name.as_str();
		self.gate.request(onload, &self.window);

		let inject = self.props.borrow().inject_script;
		if inject && !self.gate.is_ready(onload) {
			let script_options = self.props.borrow().script_options.clone();
			if let Err(err) = inject_script(&*self.document, &self.identity, &script_options) {
				warn_log!("failed to inject turnstile script: {}", err);
			}
		}

		match ScriptPresence::observe(&self.document, self.identity.script_id.clone()) {
			Ok(presence) => {
				*self.presence.borrow_mut() = Some(presence.clone());
				let weak = self.weak_self.clone();
				presence.on_present(move || {
					if let Some(controller) = weak.upgrade() {
						controller.on_script_present();
					}
				});
			}
			Err(err) => warn_log!("failed to observe turnstile script: {}", err),
		}

		let weak = self.weak_self.clone();
		self.gate.on_ready(onload, move || {
			if let Some(controller) = weak.upgrade() {
				controller.on_gate_ready();
			}
		});
	}

	fn on_gate_ready(&self) {
		self.stop_fallback_watch();
		self.try_initial_render();
	}

	fn on_script_present(&self) {
		if self.state.get() == LifecycleState::TornDown {
			return;
		}
		debug_log!("turnstile script {} present", self.identity.script_id);
		let on_load_script = self.props.borrow().callbacks.on_load_script.clone();
		if let Some(on_load_script) = on_load_script {
			on_load_script.call(());
		}
		self.check_fallback_readiness();
		if !self.gate.is_ready(&self.identity.onload_name) {
			self.watch_fallback();
		}
		self.try_initial_render();
	}

	/// The tag can appear before the script has run. Until the gate is ready,
	/// re-check on every later mutation and once the script element loads.
	fn watch_fallback(&self) {
		if !self.fallback_watch.borrow().is_empty() {
			return;
		}
		let weak = self.weak_self.clone();
		let recheck: Rc<dyn Fn()> = Rc::new(move || {
			if let Some(controller) = weak.upgrade() {
				controller.recheck_fallback();
			}
		});

		let mut observations = Vec::with_capacity(2);
		match self.document.observe_mutations(Rc::clone(&recheck)) {
			Ok(observation) => observations.push(observation),
			Err(err) => warn_log!("failed to observe document for turnstile: {}", err),
		}
		match self
			.document
			.observe_script_load(&self.identity.script_id, recheck)
		{
			Ok(observation) => observations.push(observation),
			Err(err) => warn_log!("failed to observe turnstile script load: {}", err),
		}
		*self.fallback_watch.borrow_mut() = observations;
	}

	fn recheck_fallback(&self) {
		if self.state.get() == LifecycleState::TornDown {
			return;
		}
		// Resolving the gate runs `on_gate_ready`, which ends the watch.
		self.check_fallback_readiness();
	}

	fn stop_fallback_watch(&self) {
		let observations = std::mem::take(&mut *self.fallback_watch.borrow_mut());
		drop(observations);
	}

	fn check_fallback_readiness(&self) {
		let present = self.script_present();
		self.gate
			.mark_ready_if_detected(&self.identity.onload_name, present, &*self.window);
	}

	/// First render of this mount, guarded by the first-rendered latch.
	fn try_initial_render(&self) {
		if self.state.get() != LifecycleState::AwaitingScript || self.first_rendered.get() {
			return;
		}
		if !self.gate.is_ready(&self.identity.onload_name) {
			return;
		}
		let Some(api) = self.window.turnstile() else {
			return;
		};
		if !self.document.contains_element(&self.container_id) {
			return;
		}
		if self.props.borrow().site_key.is_empty() {
			warn_log!("{}", TurnstileError::MissingSiteKey);
			return;
		}

		self.first_rendered.set(true);
		if let Err(err) = self.render_with(&*api) {
			warn_log!("failed to render turnstile widget: {}", err);
		}
	}

	fn render_with(&self, api: &dyn TurnstileApi) -> Result<WidgetId, TurnstileError> {
		let params = self.params.borrow().clone();
		let id = api.render(&self.container_id, &params)?;
		self.handle.borrow_mut().assign(id.clone());
		self.state.set(LifecycleState::Rendered);
		self.apply_style(self.resolved_style.get());
		debug_log!("rendered turnstile widget {}", id);
		self.fire_widget_load(&id);
		Ok(id)
	}

	fn fire_widget_load(&self, id: &WidgetId) {
		let on_widget_load = self.props.borrow().callbacks.on_widget_load.clone();
		if let Some(on_widget_load) = on_widget_load {
			on_widget_load.call(id.clone());
		}
	}

	/// New props from the owner's update cycle.
	///
	/// `id`, `inject_script` and `script_options` are fixed at construction;
	/// changes to them are ignored with a warning.
	pub(crate) fn update(&self, props: TurnstileProps) {
		if self.state.get() == LifecycleState::TornDown {
			return;
		}
		self.warn_on_fixed_changes(&props);
		let params = RenderParams::build(&props, &self.handle);
		let next = fingerprint_of(&params, props.rerender_on_callback_change);
		let resolved = resolve_style(&props);
		let previous = self.fingerprint.replace(next.clone());
		*self.props.borrow_mut() = props;
		*self.params.borrow_mut() = params;

		if resolved != self.resolved_style.replace(resolved)
			&& self.state.get() != LifecycleState::Uninitialized
		{
			self.apply_style(resolved);
		}

		let live = self.handle.borrow().id().cloned();
		if let (ReconcileAction::Rerender, Some(old)) =
			(reconcile(&previous, &next, live.is_some()), live)
		{
			self.rerender(old);
		}

		self.check_fallback_readiness();
		self.try_initial_render();
	}

	fn warn_on_fixed_changes(&self, next: &TurnstileProps) {
		let container_id = next.id.as_deref().unwrap_or(DEFAULT_CONTAINER_ID);
		let identity =
			ScriptIdentity::for_container(container_id, &next.script_options, next.inject_script);
		let inject_changed = self.props.borrow().inject_script != next.inject_script;
		if container_id != self.container_id || identity != self.identity || inject_changed {
			warn_log!(
				"turnstile #{}: id, inject_script and script_options cannot change after construction; remount to apply them",
				self.container_id
			);
		}
	}

	fn rerender(&self, old: WidgetId) {
		let Some(api) = self.window.turnstile() else {
			warn_log!("{}", TurnstileError::ApiUnavailable);
			return;
		};
		if self.document.contains_element(old.as_str()) {
			if let Err(err) = api.remove(&old) {
				warn_log!("failed to remove turnstile widget {}: {}", old, err);
			}
		}
		self.handle.borrow_mut().invalidate();

		let params = self.params.borrow().clone();
		match api.render(&self.container_id, &params) {
			Ok(id) => {
				self.handle.borrow_mut().assign(id.clone());
				self.state.set(LifecycleState::Rendered);
				debug_log!("re-rendered turnstile widget {} -> {}", old, id);
				if self.document.contains_element(id.as_str()) {
					self.fire_widget_load(&id);
				}
			}
			Err(err) => {
				self.state.set(LifecycleState::Removed);
				warn_log!("failed to re-render turnstile widget: {}", err);
			}
		}
	}

	fn api(&self) -> Result<Rc<dyn TurnstileApi>, TurnstileError> {
		self.window.turnstile().ok_or(TurnstileError::ApiUnavailable)
	}

	fn require_container(&self) -> Result<(), TurnstileError> {
		match self.state.get() {
			LifecycleState::Uninitialized | LifecycleState::TornDown => {
				Err(TurnstileError::ContainerMissing)
			}
			_ if !self.document.contains_element(&self.container_id) => {
				Err(TurnstileError::ContainerMissing)
			}
			_ => Ok(()),
		}
	}

	fn live_id(&self) -> Result<WidgetId, TurnstileError> {
		self.handle
			.borrow()
			.id()
			.cloned()
			.ok_or(TurnstileError::NotRendered)
	}

	fn execution(&self) -> Execution {
		self.params.borrow().execution
	}

	/// Explicit `render()`.
	pub(crate) fn render(&self) -> Result<WidgetId, TurnstileError> {
		report("render", self.try_render())
	}

	fn try_render(&self) -> Result<WidgetId, TurnstileError> {
		let api = self.api()?;
		self.require_container()?;
		if let Some(id) = self.handle.borrow().id() {
			return Err(TurnstileError::AlreadyRendered(id.to_string()));
		}
		if self.props.borrow().site_key.is_empty() {
			return Err(TurnstileError::MissingSiteKey);
		}
		self.first_rendered.set(true);
		self.render_with(&*api)
	}

	/// Explicit `execute()`.
	pub(crate) fn execute(&self) -> Result<(), TurnstileError> {
		report("execute", self.try_execute())
	}

	fn try_execute(&self) -> Result<(), TurnstileError> {
		if self.execution() != Execution::Execute {
			return Err(TurnstileError::ExecutionMode);
		}
		let api = self.api()?;
		self.require_container()?;
		self.live_id()?;
		let params = self.params.borrow().clone();
		api.execute(&self.container_id, &params)?;
		let size = self.props.borrow().options.size();
		self.apply_style(ContainerStyle::for_size(size));
		Ok(())
	}

	/// Explicit `reset()`. Remote failures are logged, not returned.
	pub(crate) fn reset(&self) -> Result<(), TurnstileError> {
		report("reset", self.try_reset())
	}

	fn try_reset(&self) -> Result<(), TurnstileError> {
		let api = self.api()?;
		self.require_container()?;
		let id = self.live_id()?;
		self.handle.borrow_mut().clear_solved();
		if self.execution() == Execution::Execute {
			self.apply_style(ContainerStyle::INVISIBLE);
		}
		if let Err(err) = api.reset(&id) {
			warn_log!("Failed to reset Turnstile widget {}: {}", id, err);
		}
		Ok(())
	}

	/// Explicit `remove()`. Local state is cleared before the remote call.
	pub(crate) fn remove(&self) -> Result<(), TurnstileError> {
		report("remove", self.try_remove())
	}

	fn try_remove(&self) -> Result<(), TurnstileError> {
		let api = self.api()?;
		self.require_container()?;
		let id = self.live_id()?;
		self.apply_style(ContainerStyle::INVISIBLE);
		self.handle.borrow_mut().invalidate();
		self.state.set(LifecycleState::Removed);
		if let Err(err) = api.remove(&id) {
			warn_log!("Failed to remove Turnstile widget {}: {}", id, err);
		}
		Ok(())
	}

	pub(crate) fn get_response(&self) -> Result<Option<String>, TurnstileError> {
		report("getResponse", self.with_live_widget(|api, id| api.get_response(id)))
	}

	pub(crate) fn is_expired(&self) -> Result<bool, TurnstileError> {
		report("isExpired", self.with_live_widget(|api, id| api.is_expired(id)))
	}

	fn with_live_widget<T>(
		&self,
		read: impl FnOnce(&dyn TurnstileApi, &WidgetId) -> Result<T, ApiError>,
	) -> Result<T, TurnstileError> {
		let api = self.api()?;
		let id = self.live_id()?;
		Ok(read(&*api, &id)?)
	}

	/// One step of the response poll. `None` means "not yet".
	pub(crate) fn poll_response(&self) -> Option<Result<String, ResponseError>> {
		if self.state.get() == LifecycleState::TornDown {
			return Some(Err(ResponseError::Unmounted));
		}
		let (solved, id) = {
			let handle = self.handle.borrow();
			(handle.is_solved(), handle.id().cloned())
		};
		if !solved {
			return None;
		}
		let (Some(api), Some(id)) = (self.window.turnstile(), id) else {
			return None;
		};
		match api.get_response(&id) {
			Ok(Some(token)) if !token.is_empty() => Some(Ok(token)),
			Ok(_) => Some(Err(ResponseError::NoResponse)),
			Err(err) => Some(Err(ResponseError::Failed(err))),
		}
	}

	/// Container unmounted. Safe to call in any state, any number of times.
	pub(crate) fn unmount(&self) {
		if self.state.get() == LifecycleState::TornDown {
			return;
		}
		let live = self.handle.borrow_mut().invalidate();
		if let Some(id) = live {
			match self.window.turnstile() {
				Some(api) => {
					if let Err(err) = api.remove(&id) {
						warn_log!("failed to remove turnstile widget {} on unmount: {}", id, err);
					}
				}
				None => warn_log!("{}", TurnstileError::ApiUnavailable),
			}
		}
		let presence = self.presence.borrow_mut().take();
		drop(presence);
		self.stop_fallback_watch();
		self.gate.release(&self.identity.onload_name);
		self.state.set(LifecycleState::TornDown);
	}

	fn apply_style(&self, style: ContainerStyle) {
		self.style.set(style);
		if let Err(err) = self.document.set_container_style(&self.container_id, &style) {
			warn_log!("failed to style turnstile container {}: {}", self.container_id, err);
		}
	}
}

fn resolve_style(props: &TurnstileProps) -> ContainerStyle {
	let options = &props.options;
	ContainerStyle::resolve(options.size(), options.appearance(), options.execution())
}

fn fingerprint_of(params: &RenderParams, include_callbacks: bool) -> String {
	params.fingerprint(include_callbacks).unwrap_or_else(|err| {
		warn_log!("{}", TurnstileError::from(err));
		String::new()
	})
}

fn report<T>(operation: &str, result: Result<T, TurnstileError>) -> Result<T, TurnstileError> {
	if let Err(err) = &result {
		warn_log!("turnstile.{}: {}", operation, err);
	}
	result
}
