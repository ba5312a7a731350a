//! Page entry points.
//!
//! Each group page calls [`mount_harness`]; the suite page calls [`mount_suite`].

use crate::{
	error::{BenchError, Result},
	frame::{self, log_error},
	harness::{Harness, RUN_ID},
	params::{RunConfig, DEFAULT_MAX_COUNT},
	sandbox::IframeSandbox,
	strategy::{Strategy, StrategyGroup},
	suite::{AggregateResult, Suite, SuiteObserver, SuiteState},
};
use std::{rc::Rc, sync::Once};
use tracing::{error, info, Level};
use tracing_wasm::WASMLayerConfigBuilder;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use wasm_bindgen_futures::spawn_local;

static INIT_LOGGING: Once = Once::new();

/// Installs the console subscriber. Events below `INFO` are discarded so that logging doesn't skew measurements.
pub fn init_logging() {
	INIT_LOGGING.call_once(|| tracing_wasm::set_as_global_default_with_config(WASMLayerConfigBuilder::new().set_max_level(Level::INFO).build()));
}

/// Mounts the single-run harness for `group` into `root`.
///
/// Without a `run` parameter in the fragment there is one button per strategy plus a `buffered` toggle.
/// With one, the page instead exposes a hidden `#run` button that runs the configured strategy.
///
/// # Errors
///
/// Iff the fragment is malformed, names a strategy of another group, or the DOM can't be set up.
#[wasm_bindgen]
pub fn mount_harness(root: web_sys::Element, group: &str) -> Result<(), JsValue> {
	init_logging();
	let group: StrategyGroup = group.parse()?;
	let config = RunConfig::from_location(DEFAULT_MAX_COUNT)?;
	if let Some(strategy) = config.run {
		if strategy.group() != group {
			return Err(BenchError::GroupMismatch {
				strategy: strategy.name(),
				expected: strategy.group().name(),
				found: group.name(),
			}
			.into());
		}
	}
	reload_on_hash_change()?;

	let document = root.owner_document().ok_or(BenchError::NoDocument)?;
	let controls = document.create_element("div")?;
	root.append_child(&controls)?;
	let harness = Harness::new(root, config)?;

	match config.run {
		Some(strategy) => {
			let button = button(&document, RUN_ID, strategy, &harness)?;
			button.set_id(RUN_ID);
			button.set_attribute("hidden", "")?;
			controls.append_child(&button)?;
		}
		None => {
			for strategy in group.strategies() {
				let button = button(&document, strategy.name(), strategy, &harness)?;
				controls.append_child(&button)?;
				controls.insert_adjacent_text("beforeend", " ")?;
			}
			buffered_toggle(&document, &controls, &harness)?;
		}
	}
	info!("Mounted {} harness with {:?}", group, config);
	Ok(())
}

fn button(document: &web_sys::Document, text: &str, strategy: Strategy, harness: &Rc<Harness>) -> Result<web_sys::Element> {
	let button = document.create_element("button")?;
	button.set_text_content(Some(text));
	let harness = Rc::clone(harness);
	let on_click = Closure::wrap(Box::new(move |_: web_sys::Event| log_error("Run failed", harness.run(strategy))) as Box<dyn FnMut(_)>);
	button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
	on_click.forget();
	Ok(button)
}

fn buffered_toggle(document: &web_sys::Document, controls: &web_sys::Element, harness: &Rc<Harness>) -> Result<()> {
	let checkbox = document.create_element("input")?.dyn_into::<web_sys::HtmlInputElement>().map_err(JsValue::from)?;
	checkbox.set_type("checkbox");
	checkbox.set_id("buffered");
	checkbox.set_checked(harness.buffered());
	let harness = Rc::clone(harness);
	let target = checkbox.clone();
	let on_input = Closure::wrap(Box::new(move |_: web_sys::Event| harness.set_buffered(target.checked())) as Box<dyn FnMut(_)>);
	checkbox.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
	on_input.forget();
	controls.append_child(&checkbox)?;

	let label = document.create_element("label")?.dyn_into::<web_sys::HtmlLabelElement>().map_err(JsValue::from)?;
	label.set_html_for("buffered");
	label.set_text_content(Some("buffered"));
	label.set_title("buffered in a document fragment before appending to the main DOM");
	controls.append_child(&label)?;
	Ok(())
}

/// A changed configuration gets a fresh page.
fn reload_on_hash_change() -> Result<()> {
	let window = frame::window()?;
	let location = window.location();
	let on_hash_change = Closure::wrap(Box::new(move |_: web_sys::Event| log_error("Reload failed", location.reload())) as Box<dyn FnMut(_)>);
	window.add_event_listener_with_callback("hashchange", on_hash_change.as_ref().unchecked_ref())?;
	on_hash_change.forget();
	Ok(())
}

/// Mounts the suite runner into `root`: A Run button, a progress label, the sandbox host and the result log.
///
/// # Errors
///
/// Iff the DOM can't be set up.
#[wasm_bindgen]
pub fn mount_suite(root: web_sys::Element) -> Result<(), JsValue> {
	init_logging();
	let document = root.owner_document().ok_or(BenchError::NoDocument)?;

	let run = document.create_element("button")?.dyn_into::<web_sys::HtmlButtonElement>().map_err(JsValue::from)?;
	run.set_text_content(Some("Run"));
	run.set_attribute("style", "margin-right: 0.5em; margin-bottom: 1em;")?;
	root.append_child(&run)?;
	let label = document.create_element("label")?;
	root.append_child(&label)?;
	let frames = document.create_element("div")?;
	root.append_child(&frames)?;
	let log = document.create_element("div")?;
	root.append_child(&log)?;

	let suite = Rc::new(Suite::default());
	let button = run.clone();
	let on_click = Closure::wrap(Box::new(move |_: web_sys::Event| {
		if !suite.state().is_ready() {
			return;
		}
		let suite = Rc::clone(&suite);
		let button = button.clone();
		let mut sandbox = IframeSandbox::new(frames.clone());
		let mut observer = DomObserver {
			document: document.clone(),
			label: label.clone(),
			log: log.clone(),
		};
		spawn_local(async move {
			button.set_disabled(true);
			observer.log.set_inner_html("");
			if let Err(error) = suite.run_all(&mut sandbox, &mut observer).await {
				error!("Suite run failed: {}", error);
				observer.label.set_text_content(Some(&format!("failed: {}", error)));
			}
			button.set_disabled(false);
		});
	}) as Box<dyn FnMut(_)>);
	run.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
	on_click.forget();
	Ok(())
}

struct DomObserver {
	document: web_sys::Document,
	label: web_sys::Element,
	log: web_sys::Element,
}

impl SuiteObserver for DomObserver {
	fn progress(&mut self, _state: SuiteState, label: &str) {
		self.label.set_text_content(Some(label));
	}

	fn result(&mut self, result: &AggregateResult) {
		let line = match self.document.create_element("p") {
			Ok(line) => line,
			Err(error) => return error!("Could not log result: {:?}", error),
		};
		line.set_text_content(Some(&result.to_string()));
		log_error("Could not log result", self.log.append_child(&line));
	}
}
