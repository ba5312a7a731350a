#![cfg(target_arch = "wasm32")]

use lignin::{Attribute, Element, ElementCreationOptions, Node, ReorderableFragment, ThreadBound};
use lignin_dom_bench::{registry::TickRegistry, vdom::VdomRenderer};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

use web_root_::{document, fresh_root};

#[wasm_bindgen_test]
fn nested_elements() {
	lignin_dom_bench::app::init_logging();
	let root = fresh_root();

	let attributes = [Attribute { name: "class", value: "tick" }];
	let span = Element {
		name: "span",
		creation_options: ElementCreationOptions::new(),
		attributes: &attributes,
		content: Node::Text { text: ".", dom_binding: None },
		event_bindings: &[],
	};
	let vdom: [Node<'_, ThreadBound>; 3] = [
		Node::Comment { comment: "ticks", dom_binding: None },
		Node::HtmlElement { element: &span, dom_binding: None },
		Node::Text { text: " ", dom_binding: None },
	];

	let mut renderer = VdomRenderer::new(document(), None);
	assert_eq!(renderer.append_child_nodes(root.as_ref(), &vdom, 3), 3);
	assert_eq!(root.inner_html(), r#"<!--ticks--><span class="tick">.</span> "#);
	assert!(renderer.into_pending().is_empty());
}

#[wasm_bindgen_test]
fn fragments_flatten() {
	let root = fresh_root();
	let texts = [Node::Text { text: "a", dom_binding: None }, Node::Text { text: "b", dom_binding: None }];
	let keyed = [
		ReorderableFragment { dom_key: 0, content: Node::Text { text: "c", dom_binding: None } },
		ReorderableFragment { dom_key: 1, content: Node::Multi(&texts) },
	];
	let vdom: [Node<'_, ThreadBound>; 2] = [Node::Multi(&texts), Node::Keyed(&keyed)];

	let appended = VdomRenderer::new(document(), None).append_child_nodes(root.as_ref(), &vdom, 4);
	assert_eq!(appended, 5);
	assert_eq!(root.text_content().unwrap(), "abcab");
}

#[wasm_bindgen_test]
fn depth_limit_stops_rendering() {
	let root = fresh_root();
	let span = Element {
		name: "span",
		creation_options: ElementCreationOptions::new(),
		attributes: &[],
		content: Node::Text { text: ".", dom_binding: None },
		event_bindings: &[],
	};
	let vdom: [Node<'_, ThreadBound>; 1] = [Node::HtmlElement { element: &span, dom_binding: None }];

	VdomRenderer::new(document(), None).append_child_nodes(root.as_ref(), &vdom, 1);
	assert_eq!(root.inner_html(), "<span></span>");
}

#[wasm_bindgen_test]
fn registered_elements_upgrade_when_connected() {
	let document = document();
	let registry = TickRegistry::with_ticks(&document).unwrap();
	let tick = Element {
		name: "x-tick-append",
		creation_options: ElementCreationOptions::new(),
		attributes: &[],
		content: Node::Multi(&[]),
		event_bindings: &[],
	};
	let vdom: Vec<Node<'_, ThreadBound>> = vec![Node::HtmlElement { element: &tick, dom_binding: None }; 3];

	let root = fresh_root();
	let mut renderer = VdomRenderer::new(document.clone(), Some(&registry));
	renderer.append_child_nodes(root.as_ref(), &vdom, 3);
	assert!(renderer.into_pending().is_empty());
	assert_eq!(root.inner_html(), "<x-tick-append><span>. </span></x-tick-append>".repeat(3));

	let detached = document.create_document_fragment();
	let mut renderer = VdomRenderer::new(document.clone(), Some(&registry));
	renderer.append_child_nodes(detached.as_ref(), &vdom, 3);
	let pending = renderer.into_pending();
	assert_eq!(pending.len(), 3);
	assert!(pending.iter().all(|unit| unit.child_nodes().length() == 0));
}
