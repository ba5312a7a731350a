#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use lignin_dom_bench::{
	error::BenchError,
	sandbox::IframeSandbox,
	strategy::Strategy,
	suite::{Sandbox, Suite, SuiteConfig, TestCase},
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Blob, BlobPropertyBag, Url};

wasm_bindgen_test_configure!(run_in_browser);

use web_root_::fresh_root;

/// Same-origin stand-in for a group page.
/// Its `#run` control records the frame's fragment in the parent and adds `#done`.
const STAND_IN: &str = r#"<!DOCTYPE html><button id="run" hidden onclick="
	parent.sandboxFragments.push(location.hash);
	var done = document.createElement('div');
	done.id = 'done';
	done.hidden = true;
	document.body.appendChild(done);
">run</button>"#;

const FRAGMENTS: &str = "sandboxFragments";

/// A `blob:` address of [`STAND_IN`], ending in `#` so that appended sandbox addresses become its fragment.
fn stand_in_base() -> String {
	let mut options = BlobPropertyBag::new();
	options.type_("text/html");
	let blob = Blob::new_with_str_sequence_and_options(&Array::of1(&JsValue::from_str(STAND_IN)), &options).unwrap();
	format!("{}#", Url::create_object_url_with_blob(&blob).unwrap())
}

fn reset_fragments() {
	Reflect::set(&window().unwrap(), &FRAGMENTS.into(), &Array::new()).unwrap();
}

fn fragments() -> Vec<String> {
	Reflect::get(&window().unwrap(), &FRAGMENTS.into())
		.unwrap()
		.dyn_into::<Array>()
		.unwrap()
		.iter()
		.map(|fragment| fragment.as_string().unwrap())
		.collect()
}

fn config(timeout_ms: f64) -> SuiteConfig {
	SuiteConfig {
		element_count: 3,
		iterations: 2,
		pause_ms: 0,
		sandbox_timeout_ms: Some(timeout_ms),
		..SuiteConfig::default()
	}
}

#[wasm_bindgen_test]
async fn missing_run_control_times_out() {
	lignin_dom_bench::app::init_logging();
	let host = fresh_root();
	let mut sandbox = IframeSandbox::with_base(host.clone(), "nonexistent/".into());
	let case = TestCase::new(Strategy::Append);

	let error = sandbox.run(&case, &config(50.0)).await.unwrap_err();
	assert!(matches!(error, BenchError::SandboxTimeout { selector: "run", .. }), "{}", error);
	assert_eq!(host.child_element_count(), 0);
}

#[wasm_bindgen_test]
async fn each_run_gets_a_fresh_frame() {
	lignin_dom_bench::app::init_logging();
	reset_fragments();
	let host = fresh_root();
	let mut sandbox = IframeSandbox::with_base(host.clone(), stand_in_base());
	let case = TestCase::new(Strategy::Append).buffered();
	let config = config(5000.0);

	for _ in 0..2 {
		let elapsed = sandbox.run(&case, &config).await.unwrap();
		assert!(elapsed >= 0.0);
		assert_eq!(host.child_element_count(), 0);
	}
	assert_eq!(fragments(), vec![format!("#{}", case.address(3)); 2]);
}

#[wasm_bindgen_test]
async fn suite_drives_frames() {
	lignin_dom_bench::app::init_logging();
	reset_fragments();
	let host = fresh_root();
	let mut sandbox = IframeSandbox::with_base(host.clone(), stand_in_base());
	let cases = vec![TestCase::new(Strategy::Direct).norender(), TestCase::new(Strategy::Vdom)];
	let suite = Suite::new(cases.clone(), config(5000.0));

	let results = suite.run_all(&mut sandbox, &mut ()).await.unwrap();
	assert_eq!(results.iter().map(|result| result.case).collect::<Vec<_>>(), cases);
	assert_eq!(host.child_element_count(), 0);

	// One warmup and two measured runs per case.
	let addresses: Vec<String> = cases.iter().map(|case| format!("#{}", case.address(3))).collect();
	let expected = vec![
		addresses[0].clone(),
		addresses[1].clone(),
		addresses[0].clone(),
		addresses[0].clone(),
		addresses[1].clone(),
		addresses[1].clone(),
	];
	assert_eq!(fragments(), expected);
}
