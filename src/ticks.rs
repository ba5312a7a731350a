//! The units each strategy renders.
//!
//! Every variant produces the same visible result, a `<span>` containing `.` followed by a space,
//! so that only the way of getting it into the document differs.

use crate::{
	error::Result,
	registry::{Construct, TickRegistry},
	strategy::Strategy,
	vdom::VdomRenderer,
};
use lignin::{ElementCreationOptions, Node, ThreadBound};
use tracing::instrument;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlTemplateElement, ShadowRoot, ShadowRootInit, ShadowRootMode};

pub const TICK_HTML: &str = "<span>.</span> ";
pub const TICK_TEXT: &str = ". ";

/// Enough for `<span>` → text.
pub const TICK_DEPTH_LIMIT: usize = 3;

/// Defines every `x-tick-*` element in `registry`.
///
/// # Errors
///
/// Iff the shared `<template>` can't be created or a tag is defined already.
#[instrument(skip(registry))]
pub fn define_all(registry: &mut TickRegistry, document: &web_sys::Document) -> Result<()> {
	let template = document.create_element("template")?.dyn_into::<HtmlTemplateElement>().map_err(JsValue::from)?;
	template.set_inner_html(TICK_HTML);

	let definitions: [(Strategy, Construct); 7] = [
		(
			Strategy::InnerHtml,
			construct(|_, element| {
				element.set_inner_html(TICK_HTML);
				Ok(())
			}),
		),
		(Strategy::Append, construct(|document, element| append_span(document, element))),
		(
			Strategy::Shadowed,
			construct(|_, element| {
				open_shadow(element)?.set_inner_html(TICK_HTML);
				Ok(())
			}),
		),
		(Strategy::ShadowedAppend, construct(|document, element| append_span(document, open_shadow(element)?.as_ref()))),
		(
			Strategy::Lignin,
			construct(|document, element| {
				let shadow_root = open_shadow(element)?;
				render_lignin_tick(document, &shadow_root);
				Ok(())
			}),
		),
		(
			Strategy::Template,
			construct(move |_, element| {
				element.append_child(&template.content().clone_node_with_deep(true)?)?;
				Ok(())
			}),
		),
		(
			Strategy::TextContent,
			construct(|_, element| {
				element.set_text_content(Some(TICK_TEXT));
				Ok(())
			}),
		),
	];

	for (strategy, construct) in definitions {
		if let Some(tag) = strategy.tag_name() {
			registry.define(tag, construct)?;
		}
	}
	Ok(())
}

/// The unit of [`Strategy::Direct`]: a bare, already populated `<span>`.
///
/// # Errors
///
/// Iff element creation throws.
pub fn create_direct(document: &web_sys::Document) -> Result<web_sys::Element> {
	let span = document.create_element("span")?;
	span.set_text_content(Some(TICK_TEXT));
	Ok(span)
}

fn construct(f: impl Fn(&web_sys::Document, &web_sys::Element) -> Result<(), JsValue> + 'static) -> Construct {
	Box::new(f)
}

fn append_span(document: &web_sys::Document, parent: &web_sys::Node) -> Result<(), JsValue> {
	let span = document.create_element("span")?;
	span.set_text_content(Some(TICK_TEXT));
	parent.append_child(&span)?;
	Ok(())
}

fn open_shadow(element: &web_sys::Element) -> Result<ShadowRoot, JsValue> {
	element.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))
}

fn render_lignin_tick(document: &web_sys::Document, shadow_root: &ShadowRoot) {
	let span = lignin::Element {
		name: "span",
		creation_options: ElementCreationOptions::new(),
		attributes: &[],
		content: Node::Text { text: ".", dom_binding: None },
		event_bindings: &[],
	};
	let vdom: [Node<'_, ThreadBound>; 2] = [Node::HtmlElement { element: &span, dom_binding: None }, Node::Text { text: " ", dom_binding: None }];
	VdomRenderer::new(document.clone(), None).append_child_nodes(shadow_root.as_ref(), &vdom, TICK_DEPTH_LIMIT);
}
