//! Reinhardt Turnstile Core - Cloudflare Turnstile widget lifecycle
//!
//! Framework-agnostic engine that loads the Turnstile script, waits for the
//! global widget API, renders exactly one widget per container, keeps it in
//! sync with its configuration and exposes an imperative handle.
//!
//! ## Architecture
//!
//! - [`script`]: script identity derivation and idempotent injection
//! - [`presence`]: "script tag present" signal over DOM mutations
//! - [`readiness`]: keyed `unloaded -> loading -> ready` gate around the
//!   global load callback
//! - [`params`]: render parameters built from the props, plus fingerprinting
//! - [`style`]: container box for the size/appearance/execution modes
//! - [`controller`]: per-instance lifecycle state machine and reconciliation
//! - [`component`]: the [`Turnstile`] component a framework binding drives
//! - [`handle`]: the imperative [`TurnstileHandle`]
//! - [`host`]: the `Document`/`Window`/`TurnstileApi` seams
//! - [`testing`]: in-memory host for tests
//! - [`verify`]: siteverify request/response types
//!
//! The browser implementation of [`host`] lives in `reinhardt-turnstile-web`.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_turnstile_core::{Environment, Turnstile, TurnstileProps};
//!
//! let turnstile = Turnstile::new(
//!     TurnstileProps::new("1x00000000000000000000AA")
//!         .on_success(|token: String| info_log!("token {}", token)),
//!     Environment::new(document, window),
//! );
//! // emit turnstile.container(), then once it is in the DOM:
//! turnstile.mount();
//!
//! let token = turnstile.handle().get_response_promise().await?;
//! ```

pub mod callback;
pub mod component;
pub mod controller;
pub mod error;
pub mod handle;
pub mod host;
pub mod logging;
pub mod options;
pub mod params;
pub mod presence;
pub mod props;
pub mod readiness;
pub mod script;
pub mod style;
pub mod testing;
pub mod verify;
pub mod widget;

mod time;

pub use callback::Callback;
pub use component::{ContainerView, Environment, Turnstile};
pub use controller::{LifecycleState, ReconcileAction, reconcile};
pub use error::{ApiError, DomError, ResponseError, TurnstileError};
pub use handle::{DEFAULT_RESPONSE_RETRY_INTERVAL, DEFAULT_RESPONSE_TIMEOUT, TurnstileHandle};
pub use host::{Document, Observation, ScriptElement, TurnstileApi, WidgetId, Window};
pub use options::{
	AppendTarget, Appearance, Execution, RefreshMode, RetryMode, ScriptOptions, Theme,
	TurnstileOptions, WidgetSize,
};
pub use params::{RenderParams, WidgetCallbacks};
pub use presence::ScriptPresence;
pub use props::{TurnstileCallbacks, TurnstileProps};
pub use readiness::{ReadinessGate, ReadinessState};
pub use script::{InjectOutcome, SCRIPT_URL, ScriptIdentity, inject_script};
pub use style::{ContainerStyle, Dimension};
pub use verify::{SiteVerifyErrorCode, SiteVerifyRequest, SiteVerifyResponse};
pub use widget::WidgetHandle;

#[doc(hidden)]
pub mod __private {
	pub use tracing;
	#[cfg(target_arch = "wasm32")]
	pub use web_sys;
}
