use crate::error::{BenchError, Result};
use core::fmt;
use hashbrown::HashMap;
use tracing::{instrument, trace};
use wasm_bindgen::JsValue;

/// Populates a freshly connected unit. The counterpart of a custom element's `connectedCallback`.
pub type Construct = Box<dyn Fn(&web_sys::Document, &web_sys::Element) -> Result<(), JsValue>>;

/// Tag name → [`Construct`] lookup, owned by whoever renders ticks.
///
/// This stands in for the document-global `customElements` registry:
/// Elements are created as plain (unknown) elements with their custom tag name
/// and "upgraded" through [`TickRegistry::connect`] once they are attached to a connected parent.
/// Each harness owns its own instance, so independent harnesses (and tests) don't observe each other's definitions.
#[derive(Default)]
pub struct TickRegistry {
	definitions: HashMap<String, Construct>,
}

impl fmt::Debug for TickRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.definitions.keys()).finish()
	}
}

impl TickRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with every built-in tick element defined.
	///
	/// # Errors
	///
	/// Iff building shared state (the `<template>`) fails.
	pub fn with_ticks(document: &web_sys::Document) -> Result<Self> {
		let mut registry = Self::new();
		crate::ticks::define_all(&mut registry, document)?;
		Ok(registry)
	}

	/// # Errors
	///
	/// [`BenchError::InvalidTagName`] unless `tag` is a valid custom element name,
	/// [`BenchError::AlreadyRegistered`] if it is defined already.
	#[instrument(skip(construct))]
	pub fn define(&mut self, tag: &str, construct: Construct) -> Result<()> {
		if !is_valid_custom_element_name(tag) {
			return Err(BenchError::InvalidTagName(tag.to_owned()));
		}
		if self.definitions.contains_key(tag) {
			return Err(BenchError::AlreadyRegistered(tag.to_owned()));
		}
		self.definitions.insert(tag.to_owned(), construct);
		Ok(())
	}

	#[must_use]
	pub fn is_defined(&self, tag: &str) -> bool {
		self.definitions.contains_key(tag)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	/// Runs the [`Construct`] registered for `element`'s local name.
	///
	/// Returns whether a definition was found. Unregistered elements are left alone.
	///
	/// # Errors
	///
	/// Iff the [`Construct`] throws.
	pub fn connect(&self, document: &web_sys::Document, element: &web_sys::Element) -> Result<bool> {
		match self.definitions.get(element.local_name().as_str()) {
			Some(construct) => {
				construct(document, element)?;
				Ok(true)
			}
			None => {
				trace!("No definition for <{}>.", element.local_name());
				Ok(false)
			}
		}
	}
}

/// A simplified check for [valid custom element names](https://html.spec.whatwg.org/multipage/custom-elements.html#valid-custom-element-name).
fn is_valid_custom_element_name(tag: &str) -> bool {
	tag.starts_with(|c: char| c.is_ascii_lowercase())
		&& tag.contains('-')
		&& tag.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}
