use crate::registry::TickRegistry;
use core::slice;
use lignin::{DomRef, ThreadBound};
use tracing::{error, trace, trace_span, warn};
use wasm_bindgen::{JsCast, UnwrapThrowExt};

const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Creates DOM nodes from [`lignin`] VDOM.
///
/// This is the creation half of a DOM differ: There is no previous VDOM to compare against, every node is new.
/// Elements with a tag name defined in the (optional) [`TickRegistry`] are upgraded once they are attached to a
/// connected parent. Ones created under a detached parent (e.g. a [***DocumentFragment***](https://developer.mozilla.org/en-US/docs/Web/API/DocumentFragment))
/// are collected instead; see [`VdomRenderer::into_pending`].
///
/// Event bindings aren't supported and are skipped with a warning.
#[derive(Debug)]
pub struct VdomRenderer<'r> {
	document: web_sys::Document,
	registry: Option<&'r TickRegistry>,
	pending: Vec<web_sys::Element>,
}

impl<'r> VdomRenderer<'r> {
	#[must_use]
	pub fn new(document: web_sys::Document, registry: Option<&'r TickRegistry>) -> Self {
		Self {
			document,
			registry,
			pending: Vec::new(),
		}
	}

	/// Registered elements that were rendered while detached and still have to be connected, in document order.
	#[must_use]
	pub fn into_pending(self) -> Vec<web_sys::Element> {
		self.pending
	}

	/// Appends DOM nodes for `vdom` to `parent`'s ***childNodes***.
	///
	/// Returns the number of DOM nodes appended directly to `parent`.
	pub fn append_child_nodes(&mut self, parent: &web_sys::Node, vdom: &[lignin::Node<'_, ThreadBound>], depth_limit: usize) -> usize {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return 0;
		}

		let mut appended = 0;
		for new_node in vdom {
			appended += match *new_node {
				lignin::Node::Comment { comment, dom_binding } => {
					let dom_comment = self.document.create_comment(comment);
					if let Err(error) = parent.append_child(dom_comment.as_ref()) {
						error!("Failed to append comment: {:?}", error);
						continue;
					}
					if let Some(dom_binding) = dom_binding {
						dom_binding.call(DomRef::Added(&dom_comment.into()))
					}
					1
				}

				lignin::Node::HtmlElement { element, dom_binding } => {
					let &lignin::Element { name, creation_options, .. } = element;
					let dom_element = match match creation_options.is() {
						Some(is) => self.document.create_element_with_str(name, is),
						None => self.document.create_element(name),
					} {
						Ok(element) => element,
						Err(error) => {
							error!("Failed to create HTML element: {:?}", error);
							continue;
						}
					};
					if !self.populate(parent, &dom_element, element, depth_limit) {
						continue;
					}
					if let Some(dom_binding) = dom_binding {
						dom_binding.call(DomRef::Added(&dom_element.dyn_into::<web_sys::HtmlElement>().unwrap_throw().into()))
					}
					1
				}

				lignin::Node::MathMlElement { element, dom_binding } => {
					let &lignin::Element { name, creation_options, .. } = element;
					let dom_element = match match creation_options.is() {
						Some(is) => self.document.create_element_ns_with_str(Some(MATHML_NAMESPACE), name, is),
						None => self.document.create_element_ns(Some(MATHML_NAMESPACE), name),
					} {
						Ok(element) => element,
						Err(error) => {
							error!("Failed to create MathML element: {:?}", error);
							continue;
						}
					};
					if !self.populate(parent, &dom_element, element, depth_limit) {
						continue;
					}
					if let Some(dom_binding) = dom_binding {
						dom_binding.call(DomRef::Added(&dom_element.into()))
					}
					1
				}

				lignin::Node::SvgElement { element, dom_binding } => {
					let &lignin::Element { name, creation_options, .. } = element;
					let dom_element = match match creation_options.is() {
						Some(is) => self.document.create_element_ns_with_str(Some(SVG_NAMESPACE), name, is),
						None => self.document.create_element_ns(Some(SVG_NAMESPACE), name),
					} {
						Ok(element) => element,
						Err(error) => {
							error!("Failed to create SVG element: {:?}", error);
							continue;
						}
					};
					if !self.populate(parent, &dom_element, element, depth_limit) {
						continue;
					}
					if let Some(dom_binding) = dom_binding {
						dom_binding.call(DomRef::Added(&dom_element.dyn_into::<web_sys::SvgElement>().unwrap_throw().into()))
					}
					1
				}

				lignin::Node::Memoized { state_key, content } => {
					trace!("Creating memoized (state key {})", state_key);
					self.append_child_nodes(parent, slice::from_ref(content), depth_limit - 1)
				}

				lignin::Node::Multi(nodes) => {
					// Skips the `depth_limit` check one level down if there are no items at all.
					if nodes.is_empty() {
						0
					} else {
						self.append_child_nodes(parent, nodes, depth_limit - 1)
					}
				}

				lignin::Node::Keyed(reorderable_fragments) => reorderable_fragments
					.iter()
					.map(|reorderable_fragment| {
						let span = trace_span!("Creating keyed fragment", dom_key = reorderable_fragment.dom_key);
						let _enter = span.enter();
						self.append_child_nodes(parent, slice::from_ref(&reorderable_fragment.content), depth_limit - 1)
					})
					.sum::<usize>(),

				lignin::Node::Text { text, dom_binding } => {
					let dom_text = self.document.create_text_node(text);
					if let Err(error) = parent.append_child(dom_text.as_ref()) {
						error!("Failed to append text: {:?}", error);
						continue;
					}
					if let Some(dom_binding) = dom_binding {
						dom_binding.call(DomRef::Added(&dom_text.into()))
					}
					1
				}

				lignin::Node::RemnantSite(_) => {
					error!("Remnant sites can't be rendered; Skipping.");
					0
				}
			};
		}
		appended
	}

	/// Sets attributes and content, appends `dom_element` to `parent` and upgrades it if it's registered.
	///
	/// Returns `false` iff `dom_element` couldn't be appended.
	fn populate(&mut self, parent: &web_sys::Node, dom_element: &web_sys::Element, element: &lignin::Element<'_, ThreadBound>, depth_limit: usize) -> bool {
		for &lignin::Attribute { name, value } in element.attributes {
			if let Err(error) = dom_element.set_attribute(name, value) {
				error!("Could not add attribute {:?}={:?}: {:?}", name, value, error);
			}
		}
		if !element.event_bindings.is_empty() {
			warn!("Ignoring {} event binding(s) on <{}>.", element.event_bindings.len(), element.name);
		}

		if !matches!(element.content, lignin::Node::Multi(nodes) if nodes.is_empty()) {
			self.append_child_nodes(dom_element.as_ref(), slice::from_ref(&element.content), depth_limit - 1);
		}

		if let Err(error) = parent.append_child(dom_element.as_ref()) {
			error!("Failed to append <{}>: {:?}", element.name, error);
			return false;
		}

		if let Some(registry) = self.registry {
			if registry.is_defined(&dom_element.local_name()) {
				if parent.is_connected() {
					if let Err(error) = registry.connect(&self.document, dom_element) {
						error!("Failed to connect <{}>: {}", element.name, error);
					}
				} else {
					self.pending.push(dom_element.clone());
				}
			}
		}
		true
	}
}
