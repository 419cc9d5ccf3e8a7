//! Logging abstraction layer for reinhardt-turnstile
//!
//! The widget lifecycle reports every recoverable condition (missing API,
//! missing container, precondition violations, remote exceptions) as a log
//! line instead of a panic, so these macros must work on both targets.
//!
//! ## Macro Overview
//!
//! | Macro | Condition | WASM | Non-WASM |
//! |-------|-----------|------|----------|
//! | `debug_log!` | `debug-logs` feature + `debug_assertions` | `console.debug` | `tracing::debug!` |
//! | `info_log!` | `debug_assertions` | `console.info` | `tracing::info!` |
//! | `warn_log!` | Always | `console.warn` | `tracing::warn!` |
//! | `error_log!` | Always | `console.error` | `tracing::error!` |
//!
//! Native output goes through `tracing` under the `reinhardt_turnstile`
//! target, so applications pick it up with whatever subscriber they install.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_turnstile_core::{debug_log, warn_log};
//!
//! debug_log!("widget {} rendered", id);
//! warn_log!("Turnstile has not been loaded");
//! ```

/// Logs a debug message (requires `debug-logs` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-logs", target_arch = "wasm32"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::debug_1(&format!($($arg)*).into());
	}};
}

/// Logs a debug message (requires `debug-logs` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(
	debug_assertions,
	feature = "debug-logs",
	not(target_arch = "wasm32")
))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::debug!(target: "reinhardt_turnstile", "{}", format!($($arg)*));
	}};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-logs")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs an info message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, target_arch = "wasm32"))]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::info_1(&format!($($arg)*).into());
	}};
}

/// Logs an info message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::info!(target: "reinhardt_turnstile", "{}", format!($($arg)*));
	}};
}

/// No-op info_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! info_log {
	($($arg:tt)*) => {{}};
}

/// Logs a warning message.
///
/// Warnings are kept in release builds: they are the only signal a caller
/// gets for non-fatal misuse of the widget handle.
///
/// # Example
///
/// ```ignore
/// warn_log!("Turnstile has not been loaded or widget already rendered");
/// ```
#[macro_export]
#[cfg(target_arch = "wasm32")]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::warn_1(&format!($($arg)*).into());
	}};
}

/// Logs a warning message.
#[macro_export]
#[cfg(not(target_arch = "wasm32"))]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::warn!(target: "reinhardt_turnstile", "{}", format!($($arg)*));
	}};
}

/// Logs an error message.
///
/// # Example
///
/// ```ignore
/// error_log!("Error loading turnstile script: {}", id);
/// ```
#[macro_export]
#[cfg(target_arch = "wasm32")]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::web_sys::console::error_1(&format!($($arg)*).into());
	}};
}

/// Logs an error message.
#[macro_export]
#[cfg(not(target_arch = "wasm32"))]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::error!(target: "reinhardt_turnstile", "{}", format!($($arg)*));
	}};
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	// Import macros from crate root
	use crate::{debug_log, error_log, info_log, warn_log};

	#[rstest]
	fn test_logging_macros_compile() {
		debug_log!("Debug message: {}", 42);
		info_log!("Info message: {}", "test");
		warn_log!("Warning message: {:?}", vec![1, 2, 3]);
		error_log!("Error message: {}", "error");
	}

	#[rstest]
	fn test_logging_macros_no_args() {
		debug_log!("Simple debug");
		info_log!("Simple info");
		warn_log!("Simple warning");
		error_log!("Simple error");
	}
}
