use crate::{
	error::{BenchError, Result},
	frame,
	harness::{DONE_ID, RUN_ID},
	suite::{Sandbox, SuiteConfig, TestCase},
};
use futures::{future::LocalBoxFuture, FutureExt};
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};

/// Runs each [`TestCase`] in a fresh `<iframe>`, so no state survives between runs.
///
/// Timing starts when the sandbox's `#run` control is clicked and ends once its `#done` marker exists
/// and a layout read on its body has forced any deferred layout.
#[derive(Debug)]
pub struct IframeSandbox {
	host: web_sys::Element,
	base: String,
}

impl IframeSandbox {
	/// Frames are appended to `host`, with addresses relative to the current page.
	#[must_use]
	pub fn new(host: web_sys::Element) -> Self {
		Self::with_base(host, String::new())
	}

	/// Like [`IframeSandbox::new`], but with `base` prepended to every sandbox address.
	#[must_use]
	pub fn with_base(host: web_sys::Element, base: String) -> Self {
		Self { host, base }
	}

	#[instrument(skip(self, config))]
	async fn run_once(&self, case: &TestCase, config: &SuiteConfig) -> Result<f64> {
		let document = self.host.owner_document().ok_or(BenchError::NoDocument)?;
		let frame = document.create_element("iframe")?.dyn_into::<web_sys::HtmlIFrameElement>().map_err(JsValue::from)?;
		// `scrolling` is deprecated, but there's no other way to hide the frame's scroll bars.
		frame.set_attribute("scrolling", "no")?;
		self.host.append_child(&frame)?;
		let frame = Attached(frame);

		let address = format!("{}{}", self.base, case.address(config.element_count));
		trace!("Loading {}", address);
		frame.0.set_src(&address);

		let run = wait_for_selector(&frame.0, RUN_ID, case, config.sandbox_timeout_ms).await?;
		let run = run.dyn_into::<web_sys::HtmlElement>().map_err(JsValue::from)?;
		let start = frame::now()?;
		run.click();
		wait_for_selector(&frame.0, DONE_ID, case, config.sandbox_timeout_ms).await?;

		// Some browsers defer layout past the marker's appearance.
		if let Some(body) = frame.0.content_document().and_then(|document| document.body()) {
			body.get_bounding_client_rect();
		}
		Ok(frame::now()? - start)
	}
}

impl Sandbox for IframeSandbox {
	fn run<'a>(&'a mut self, case: &'a TestCase, config: &'a SuiteConfig) -> LocalBoxFuture<'a, Result<f64>> {
		self.run_once(case, config).boxed_local()
	}

	fn pause(&mut self, ms: u32) -> LocalBoxFuture<'_, Result<()>> {
		frame::sleep(ms).boxed_local()
	}
}

/// Removes the frame when the run ends, successfully or not.
struct Attached(web_sys::HtmlIFrameElement);

impl Drop for Attached {
	fn drop(&mut self) {
		self.0.remove();
	}
}

async fn wait_for_selector(frame: &web_sys::HtmlIFrameElement, id: &'static str, case: &TestCase, timeout_ms: Option<f64>) -> Result<web_sys::Element> {
	let selector = format!("#{}", id);
	let probe = || frame.content_document().and_then(|document| document.query_selector(&selector).ok().flatten());
	frame::wait_for(probe, timeout_ms).await?.ok_or_else(|| BenchError::SandboxTimeout {
		case: case.to_string(),
		selector: id,
		timeout_ms: timeout_ms.unwrap_or(f64::INFINITY),
	})
}
