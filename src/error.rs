use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong while setting up or running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
	#[error("No global `window` available")]
	NoWindow,

	#[error("No `document` available")]
	NoDocument,

	/// A DOM call threw. The payload is the [`Debug`] rendering of the thrown [`JsValue`].
	#[error("DOM operation failed: {0}")]
	Dom(String),

	#[error("Tag {0:?} is already registered")]
	AlreadyRegistered(String),

	/// Registered tag names must be valid custom element names (lowercase ASCII, containing a `-`).
	#[error("Invalid custom element tag name {0:?}")]
	InvalidTagName(String),

	#[error("Unknown strategy {0:?}")]
	UnknownStrategy(String),

	#[error("Invalid parameter {key}={value}: expected {expected}")]
	InvalidParam { key: String, value: String, expected: &'static str },

	#[error("Strategy {strategy} belongs to group {expected}, but this page hosts group {found}")]
	GroupMismatch { strategy: &'static str, expected: &'static str, found: &'static str },

	#[error("Sandbox for {case} did not expose {selector:?} within {timeout_ms} ms")]
	SandboxTimeout { case: String, selector: &'static str, timeout_ms: f64 },

	#[error("A suite run is already in progress")]
	SuiteBusy,
}

pub type Result<T, E = BenchError> = core::result::Result<T, E>;

impl From<JsValue> for BenchError {
	fn from(value: JsValue) -> Self {
		Self::Dom(format!("{:?}", value))
	}
}

impl From<BenchError> for JsValue {
	fn from(error: BenchError) -> Self {
		JsValue::from_str(&error.to_string())
	}
}
