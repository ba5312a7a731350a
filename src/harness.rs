use crate::{
	error::{BenchError, Result},
	frame,
	params::RunConfig,
	registry::TickRegistry,
	stats,
	strategy::{Strategy, StrategyGroup},
	ticks::{self, TICK_DEPTH_LIMIT, TICK_TEXT},
	vdom::VdomRenderer,
};
use core::cell::Cell;
use lignin::{ElementCreationOptions, Node, ThreadBound};
use std::rc::Rc;
use tracing::{debug, error, info, instrument};
use wasm_bindgen::{closure::Closure, JsCast};

/// Id of the hidden control an orchestrator clicks to start an automatic run.
pub const RUN_ID: &str = "run";

/// Id of the marker that appears once all units are constructed (and attached, unless `norender`).
pub const DONE_ID: &str = "done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
	pub strategy: Strategy,
	pub constructed: u32,
	/// Units placed into the live container. Zero with `norender`.
	pub attached: u32,
	pub buffered: bool,
	pub norender: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	Started(RunReport),
	/// Another run was still waiting for its measurement frame.
	Ignored,
}

/// Renders ticks into a container it owns and times how long the browser takes until the next frame.
///
/// A run constructs (and, unless `norender`, attaches) all units synchronously, appends the `#done` marker
/// and then suspends until the next animation frame, where the elapsed time is taken.
/// Until that frame fires the harness counts as in flight and further [`Harness::run`] calls are ignored.
#[derive(Debug)]
pub struct Harness {
	document: web_sys::Document,
	root: web_sys::Element,
	status: web_sys::Element,
	container: web_sys::Element,
	registry: TickRegistry,
	config: RunConfig,
	buffered: Cell<bool>,
	in_flight: Cell<bool>,
	last_elapsed_ms: Cell<Option<f64>>,
}

impl Harness {
	/// Appends a status line and the tick container to `root`.
	///
	/// # Errors
	///
	/// Iff `root` has no owner document or element creation fails.
	#[instrument]
	pub fn new(root: web_sys::Element, config: RunConfig) -> Result<Rc<Self>> {
		let document = root.owner_document().ok_or(BenchError::NoDocument)?;
		let status = document.create_element("p")?;
		let container = document.create_element("div")?;
		root.append_child(&status)?;
		root.append_child(&container)?;
		let registry = TickRegistry::with_ticks(&document)?;
		Ok(Rc::new(Self {
			document,
			root,
			status,
			container,
			registry,
			config,
			buffered: Cell::new(config.buffered),
			in_flight: Cell::new(false),
			last_elapsed_ms: Cell::new(None),
		}))
	}

	#[must_use]
	pub fn config(&self) -> &RunConfig {
		&self.config
	}

	/// Whether this harness was configured with a strategy to run on demand (see [`RUN_ID`]).
	#[must_use]
	pub fn is_automatic(&self) -> bool {
		self.config.run.is_some()
	}

	#[must_use]
	pub fn container(&self) -> &web_sys::Element {
		&self.container
	}

	#[must_use]
	pub fn status(&self) -> &web_sys::Element {
		&self.status
	}

	#[must_use]
	pub fn registry(&self) -> &TickRegistry {
		&self.registry
	}

	#[must_use]
	pub fn buffered(&self) -> bool {
		self.buffered.get()
	}

	pub fn set_buffered(&self, buffered: bool) {
		self.buffered.set(buffered);
	}

	#[must_use]
	pub fn is_in_flight(&self) -> bool {
		self.in_flight.get()
	}

	/// Elapsed time of the last measured run.
	#[must_use]
	pub fn last_elapsed_ms(&self) -> Option<f64> {
		self.last_elapsed_ms.get()
	}

	#[must_use]
	pub fn done_marker(&self) -> Option<web_sys::Element> {
		self.root.query_selector(&format!("#{}", DONE_ID)).ok().flatten()
	}

	/// Starts a run unless one is in flight.
	///
	/// # Errors
	///
	/// Iff a DOM operation fails. The harness accepts new runs afterwards.
	#[instrument(skip(self))]
	pub fn run(self: &Rc<Self>, strategy: Strategy) -> Result<RunOutcome> {
		if self.in_flight.replace(true) {
			debug!("Ignoring run request while another run is in flight.");
			return Ok(RunOutcome::Ignored);
		}

		let started = self.render(strategy).and_then(|(report, start)| {
			self.schedule_measurement(report, start)?;
			Ok(report)
		});
		match started {
			Ok(report) => Ok(RunOutcome::Started(report)),
			Err(error) => {
				self.in_flight.set(false);
				Err(error)
			}
		}
	}

	fn render(&self, strategy: Strategy) -> Result<(RunReport, f64)> {
		if let Some(marker) = self.done_marker() {
			marker.remove();
		}
		self.status.set_text_content(None);
		self.container.set_inner_html("");

		let report = RunReport {
			strategy,
			constructed: self.config.max_count,
			attached: if self.config.norender { 0 } else { self.config.max_count },
			buffered: self.buffered.get(),
			norender: self.config.norender,
		};

		let start = frame::now()?;
		match strategy.group() {
			StrategyGroup::Vanilla => self.render_units(&report)?,
			StrategyGroup::Vdom => self.render_vdom(&report)?,
		}

		let done = self.document.create_element("div")?;
		done.set_id(DONE_ID);
		done.set_attribute("hidden", "")?;
		self.root.append_child(&done)?;
		Ok((report, start))
	}

	/// One unit per iteration, connected as soon as it's attached.
	fn render_units(&self, report: &RunReport) -> Result<()> {
		let document = &self.document;
		let tag = report.strategy.tag_name();
		let staging = if report.buffered && !report.norender {
			Some(document.create_document_fragment())
		} else {
			None
		};
		let mut staged = Vec::new();

		for _ in 0..report.constructed {
			let unit = match tag {
				Some(tag) => document.create_element(tag)?,
				None => ticks::create_direct(document)?,
			};
			if report.norender {
				continue;
			}
			match &staging {
				Some(staging) => {
					staging.append_child(&unit)?;
					if tag.is_some() {
						staged.push(unit);
					}
				}
				None => {
					self.container.append_child(&unit)?;
					if tag.is_some() {
						self.registry.connect(document, &unit)?;
					}
				}
			}
		}

		if let Some(staging) = staging {
			self.container.append_child(&staging)?;
			for unit in &staged {
				self.registry.connect(document, unit)?;
			}
		}
		Ok(())
	}

	/// All units as one VDOM tree, materialized in one pass.
	fn render_vdom(&self, report: &RunReport) -> Result<()> {
		let element = match report.strategy.tag_name() {
			Some(tag) => lignin::Element {
				name: tag,
				creation_options: ElementCreationOptions::new(),
				attributes: &[],
				content: Node::Multi(&[]),
				event_bindings: &[],
			},
			None => lignin::Element {
				name: "span",
				creation_options: ElementCreationOptions::new(),
				attributes: &[],
				content: Node::Text { text: TICK_TEXT, dom_binding: None },
				event_bindings: &[],
			},
		};
		let vdom: Vec<Node<'_, ThreadBound>> = vec![Node::HtmlElement { element: &element, dom_binding: None }; report.constructed as usize];

		let mut renderer = VdomRenderer::new(self.document.clone(), Some(&self.registry));
		if report.norender {
			let detached = self.document.create_document_fragment();
			renderer.append_child_nodes(detached.as_ref(), &vdom, TICK_DEPTH_LIMIT);
		} else if report.buffered {
			let staging = self.document.create_document_fragment();
			renderer.append_child_nodes(staging.as_ref(), &vdom, TICK_DEPTH_LIMIT);
			self.container.append_child(&staging)?;
			for unit in renderer.into_pending() {
				self.registry.connect(&self.document, &unit)?;
			}
		} else {
			renderer.append_child_nodes(self.container.as_ref(), &vdom, TICK_DEPTH_LIMIT);
		}
		Ok(())
	}

	fn schedule_measurement(self: &Rc<Self>, report: RunReport, start: f64) -> Result<()> {
		let this = Rc::clone(self);
		let callback = Closure::once_into_js(move |_timestamp: f64| this.measure(&report, start));
		frame::window()?.request_animation_frame(callback.unchecked_ref())?;
		Ok(())
	}

	fn measure(&self, report: &RunReport, start: f64) {
		self.in_flight.set(false);
		let elapsed = match frame::now() {
			Ok(now) => now - start,
			Err(error) => return error!("Could not take measurement: {}", error),
		};
		self.last_elapsed_ms.set(Some(elapsed));

		let throughput = stats::throughput(report.constructed, elapsed);
		info!(strategy = report.strategy.name(), count = report.constructed, elapsed, ?throughput, "Measured run");
		if !self.is_automatic() {
			self.status.set_text_content(Some(&format!(
				"{} {} {} components in {:.1} ms ({} ticks/ms)",
				report.constructed,
				report.strategy,
				if report.buffered { "buffered" } else { "" },
				elapsed,
				stats::format_throughput(throughput)
			)));
		}
	}
}
