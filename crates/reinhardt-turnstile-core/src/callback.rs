//! Callback type shared by the component props and the widget API.
//!
//! Widget callbacks are invoked by the remote script on the UI thread, so
//! [`Callback`] is a single-threaded `Rc` wrapper. Cloning it keeps the same
//! identity, which is what [`Callback::identity`] exposes for the
//! "re-render on callback change" comparison.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_turnstile_core::Callback;
//!
//! let on_success = Callback::new(|token: String| {
//!     log!("solved: {}", token);
//! });
//! ```

use std::rc::Rc;

/// A cloneable callback wrapper.
///
/// `Callback` wraps a function in an `Rc`, making it cheaply cloneable while
/// providing a stable identity that does not change when the owning props are
/// rebuilt from clones.
///
/// ## Type Parameters
///
/// - `Args`: The argument type the callback receives (defaults to `()`)
/// - `Ret`: The return type of the callback (defaults to `()`)
pub struct Callback<Args = (), Ret = ()> {
	inner: Rc<dyn Fn(Args) -> Ret + 'static>,
}

impl<Args, Ret> Callback<Args, Ret> {
	/// Creates a new Callback from a function or closure.
	///
	/// # Example
	///
	/// ```ignore
	/// let handler = Callback::new(|code: String| {
	///     warn_log!("widget error {}", code);
	/// });
	/// ```
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(Args) -> Ret + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Calls the callback with the given arguments.
	pub fn call(&self, args: Args) -> Ret {
		(self.inner)(args)
	}

	/// Returns an identity token for this callback.
	///
	/// Two callbacks share an identity only when one is a clone of the other.
	pub fn identity(&self) -> usize {
		Rc::as_ptr(&self.inner) as *const () as usize
	}

	/// Returns `true` if both callbacks wrap the same function allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.identity() == other.identity()
	}
}

impl<Args, Ret> Clone for Callback<Args, Ret> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<Args, Ret> std::fmt::Debug for Callback<Args, Ret> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Callback")
			.field("inner", &"<function>")
			.finish()
	}
}

impl<F, Args, Ret> From<F> for Callback<Args, Ret>
where
	F: Fn(Args) -> Ret + 'static,
{
	fn from(f: F) -> Self {
		Self::new(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;

	#[test]
	fn test_callback_creation() {
		let callback = Callback::new(|_: i32| 42);
		assert_eq!(callback.call(0), 42);
	}

	#[test]
	fn test_callback_clone_keeps_identity() {
		let callback1 = Callback::new(|x: i32| x * 2);
		let callback2 = callback1.clone();

		assert_eq!(callback1.call(5), 10);
		assert_eq!(callback2.call(5), 10);
		assert!(callback1.ptr_eq(&callback2));
		assert_eq!(callback1.identity(), callback2.identity());
	}

	#[test]
	fn test_distinct_callbacks_differ() {
		let a = Callback::new(|_: ()| {});
		let b = Callback::new(|_: ()| {});
		assert!(!a.ptr_eq(&b));
	}

	#[test]
	fn test_callback_with_captured_state() {
		let counter = Rc::new(RefCell::new(0));
		let callback = Callback::new({
			let counter = Rc::clone(&counter);
			move |increment: i32| {
				*counter.borrow_mut() += increment;
			}
		});

		callback.call(1);
		callback.call(2);
		callback.call(3);

		assert_eq!(*counter.borrow(), 6);
	}

	#[test]
	fn test_callback_debug() {
		let callback = Callback::new(|_: ()| {});
		let debug_str = format!("{:?}", callback);
		assert!(debug_str.contains("Callback"));
	}
}
