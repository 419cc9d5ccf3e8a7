//! # Reinhardt Turnstile
//!
//! Cloudflare Turnstile for Reinhardt frontends: loads the remote script once
//! per page, renders a widget into a container once the global API is ready,
//! keeps it in sync with changing props, and tears it down on unmount.
//!
//! ## Feature Flags
//!
//! - `web` - browser host over `web-sys` (`reinhardt_turnstile::web`)
//! - `debug-logs` - verbose lifecycle logging (debug builds only)
//!
//! ## Example
//!
//! ```rust,ignore
//! use reinhardt_turnstile::prelude::*;
//!
//! let props = TurnstileProps::new("1x00000000000000000000AA")
//!     .with_options(TurnstileOptions::default().with_theme(Theme::Dark));
//! let turnstile = Turnstile::new(props, reinhardt_turnstile::web::browser_environment()?);
//! turnstile.mount();
//!
//! let token = turnstile.handle().get_response_promise().await?;
//! ```
//!
//! Without the `web` feature the lifecycle can be driven against any
//! [`Document`]/[`Window`] implementation, e.g. the in-memory hosts in
//! [`testing`].

pub use reinhardt_turnstile_core::*;

/// Browser host (`BrowserDocument`, `BrowserWindow`, `BrowserTurnstile`).
#[cfg(feature = "web")]
pub use reinhardt_turnstile_web as web;

/// Commonly used types.
pub mod prelude {
	pub use reinhardt_turnstile_core::{
		Callback, ContainerStyle, Environment, LifecycleState, ResponseError, ScriptOptions,
		Theme, Turnstile, TurnstileCallbacks, TurnstileError, TurnstileHandle, TurnstileOptions,
		TurnstileProps, WidgetSize,
	};
}
