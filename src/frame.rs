//! Cooperative suspension points: the next rendering frame, a fixed pause and per-frame polling.

use crate::error::{BenchError, Result};
use core::convert::TryFrom;
use js_sys::Promise;
use tracing::error;
use wasm_bindgen_futures::JsFuture;

pub(crate) fn window() -> Result<web_sys::Window> {
	web_sys::window().ok_or(BenchError::NoWindow)
}

/// The current high resolution time in milliseconds.
///
/// # Errors
///
/// Iff there is no `window` or it has no `performance`.
pub fn now() -> Result<f64> {
	Ok(window()?.performance().ok_or(BenchError::NoWindow)?.now())
}

/// Resolves at the next animation frame, i.e. after the browser had a chance to lay out and paint.
///
/// # Errors
///
/// Iff there is no `window` or the callback can't be scheduled.
pub async fn next_frame() -> Result<()> {
	let window = window()?;
	let mut scheduled = Ok(0);
	let promise = Promise::new(&mut |resolve, _reject| scheduled = window.request_animation_frame(&resolve));
	scheduled?;
	JsFuture::from(promise).await?;
	Ok(())
}

/// Resolves after `ms` milliseconds, giving the browser room for housekeeping.
///
/// # Errors
///
/// Iff there is no `window` or the timeout can't be scheduled.
pub async fn sleep(ms: u32) -> Result<()> {
	let window = window()?;
	let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
	let mut scheduled = Ok(0);
	let promise = Promise::new(&mut |resolve, _reject| scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout));
	scheduled?;
	JsFuture::from(promise).await?;
	Ok(())
}

/// Calls `probe` once per animation frame until it returns [`Some`].
///
/// A found value is handed out one frame later, so the page that produced it has been rendered.
/// Returns [`None`] iff `timeout_ms` elapsed first. Without timeout this waits indefinitely.
///
/// # Errors
///
/// Iff frames can't be scheduled.
pub async fn wait_for<T>(mut probe: impl FnMut() -> Option<T>, timeout_ms: Option<f64>) -> Result<Option<T>> {
	let deadline = match timeout_ms {
		Some(timeout_ms) => Some(now()? + timeout_ms),
		None => None,
	};
	loop {
		if let Some(found) = probe() {
			next_frame().await?;
			return Ok(Some(found));
		}
		if let Some(deadline) = deadline {
			if now()? >= deadline {
				return Ok(None);
			}
		}
		next_frame().await?;
	}
}

/// Logs instead of propagating. For callbacks that have nowhere to return an error to.
pub(crate) fn log_error(context: &str, result: Result<impl Sized, impl Into<BenchError>>) {
	if let Err(error) = result {
		error!("{}: {}", context, error.into());
	}
}
