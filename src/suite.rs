//! Runs every [`TestCase`] in isolated sandboxes, once to warm up and then repeatedly to measure.

use crate::{
	error::{BenchError, Result},
	params::{ParamValue, RunParams},
	stats,
	strategy::{Strategy, StrategyGroup},
};
use core::{cell::Cell, fmt};
use futures::future::LocalBoxFuture;
use tracing::{info, instrument};

/// Elements created per sandboxed run.
pub const ELEMENT_COUNT: u32 = 50_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunOptions {
	pub buffered: bool,
	pub norender: bool,
}

/// One benchmarked configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestCase {
	pub strategy: Strategy,
	pub options: RunOptions,
}

impl TestCase {
	#[must_use]
	pub const fn new(strategy: Strategy) -> Self {
		Self {
			strategy,
			options: RunOptions { buffered: false, norender: false },
		}
	}

	#[must_use]
	pub fn buffered(mut self) -> Self {
		self.options.buffered = true;
		self
	}

	#[must_use]
	pub fn norender(mut self) -> Self {
		self.options.norender = true;
		self
	}

	#[must_use]
	pub fn group(&self) -> StrategyGroup {
		self.strategy.group()
	}

	/// The fragment a sandbox decodes its configuration from. Unset flags are left out.
	#[must_use]
	pub fn fragment(&self, max_count: u32) -> String {
		let mut params = RunParams::new();
		params.insert("test", ParamValue::Str(self.group().name().to_owned()));
		params.insert("run", ParamValue::Str(self.strategy.name().to_owned()));
		if self.options.buffered {
			params.insert("buffered", ParamValue::Bool(true));
		}
		if self.options.norender {
			params.insert("norender", ParamValue::Bool(true));
		}
		params.insert("maxCount", ParamValue::Number(f64::from(max_count)));
		params.encode()
	}

	/// The sandbox page address, relative to the suite page.
	#[must_use]
	pub fn address(&self, max_count: u32) -> String {
		format!("{}#{}", self.group().page(), self.fragment(max_count))
	}

	/// The benchmark list, in reporting order.
	#[must_use]
	pub fn suite() -> Vec<Self> {
		vec![
			// rendered (vanilla)
			Self::new(Strategy::InnerHtml),
			Self::new(Strategy::Append),
			Self::new(Strategy::Append).buffered(),
			Self::new(Strategy::Shadowed),
			Self::new(Strategy::ShadowedAppend),
			Self::new(Strategy::Lignin),
			Self::new(Strategy::Template),
			Self::new(Strategy::TextContent),
			Self::new(Strategy::Direct),
			// rendered (vdom)
			Self::new(Strategy::Vdom),
			Self::new(Strategy::WebComponent),
			// not rendered (vanilla)
			Self::new(Strategy::Append).norender(),
			Self::new(Strategy::Shadowed).norender(),
			Self::new(Strategy::Lignin).norender(),
			Self::new(Strategy::Direct).norender(),
		]
	}
}

impl fmt::Display for TestCase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} {} {}",
			self.group(),
			self.strategy,
			if self.options.norender { "(norender)" } else { "" },
			if self.options.buffered { "(buffered)" } else { "" },
		)
	}
}

/// One timed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
	pub case: TestCase,
	pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
	pub case: TestCase,
	/// Geometric mean of the measured runs.
	pub mean_elapsed_ms: f64,
	/// Elements per millisecond at [`AggregateResult::mean_elapsed_ms`].
	pub throughput: Option<u64>,
}

impl AggregateResult {
	/// Aggregates `measurements`, which must all belong to `case`. [`None`] if there are none.
	#[must_use]
	pub fn from_measurements(case: TestCase, measurements: &[Measurement], element_count: u32) -> Option<Self> {
		debug_assert!(measurements.iter().all(|m| m.case == case));
		let elapsed: Vec<f64> = measurements.iter().map(|m| m.elapsed_ms).collect();
		let mean_elapsed_ms = stats::geomean(&elapsed)?;
		Some(Self {
			case,
			mean_elapsed_ms,
			throughput: stats::throughput(element_count, mean_elapsed_ms),
		})
	}
}

impl fmt::Display for AggregateResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} {} {} - elements/ms: {}",
			self.case.group(),
			self.case.strategy,
			if self.case.options.norender { "norender" } else { "" },
			if self.case.options.buffered { "buffered" } else { "" },
			stats::format_throughput(self.throughput),
		)
	}
}

#[derive(Debug, Clone)]
pub struct SuiteConfig {
	pub element_count: u32,
	/// Discarded runs per case before any measurement.
	pub warmup_rounds: usize,
	/// Measured runs per case.
	pub iterations: usize,
	/// Pause before each case's measured runs.
	pub pause_ms: u32,
	/// Upper bound for each wait on a sandbox. [`None`] waits indefinitely.
	pub sandbox_timeout_ms: Option<f64>,
}

impl Default for SuiteConfig {
	fn default() -> Self {
		Self {
			element_count: ELEMENT_COUNT,
			warmup_rounds: 1,
			iterations: 10,
			pause_ms: 500,
			sandbox_timeout_ms: None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteState {
	Idle,
	Warmup { case: usize },
	Measuring { case: usize, iteration: usize },
	Done,
}

impl SuiteState {
	/// Whether a new suite run may start.
	#[must_use]
	pub fn is_ready(self) -> bool {
		matches!(self, Self::Idle | Self::Done)
	}
}

/// Executes a [`TestCase`] in isolation from every other run.
pub trait Sandbox {
	/// Runs `case` once in a fresh context and returns the elapsed time in milliseconds.
	fn run<'a>(&'a mut self, case: &'a TestCase, config: &'a SuiteConfig) -> LocalBoxFuture<'a, Result<f64>>;

	/// Idles for `ms` milliseconds.
	fn pause(&mut self, ms: u32) -> LocalBoxFuture<'_, Result<()>>;
}

/// Progress reporting. Every method defaults to doing nothing.
pub trait SuiteObserver {
	fn progress(&mut self, _state: SuiteState, _label: &str) {}
	fn result(&mut self, _result: &AggregateResult) {}
}

impl SuiteObserver for () {}

#[derive(Debug)]
pub struct Suite {
	cases: Vec<TestCase>,
	config: SuiteConfig,
	state: Cell<SuiteState>,
}

impl Default for Suite {
	fn default() -> Self {
		Self::new(TestCase::suite(), SuiteConfig::default())
	}
}

impl Suite {
	#[must_use]
	pub fn new(cases: Vec<TestCase>, config: SuiteConfig) -> Self {
		Self {
			cases,
			config,
			state: Cell::new(SuiteState::Idle),
		}
	}

	#[must_use]
	pub fn cases(&self) -> &[TestCase] {
		&self.cases
	}

	#[must_use]
	pub fn config(&self) -> &SuiteConfig {
		&self.config
	}

	#[must_use]
	pub fn state(&self) -> SuiteState {
		self.state.get()
	}

	/// Warms up with every case, then measures each case in order. Strictly sequential.
	///
	/// # Errors
	///
	/// [`BenchError::SuiteBusy`] if a run is already in progress.
	/// Any sandbox error aborts the whole run; the suite becomes [`SuiteState::Idle`] again.
	pub async fn run_all<S: Sandbox, O: SuiteObserver>(&self, sandbox: &mut S, observer: &mut O) -> Result<Vec<AggregateResult>> {
		if !self.state.get().is_ready() {
			return Err(BenchError::SuiteBusy);
		}
		self.state.set(SuiteState::Warmup { case: 0 });

		let results = self.drive(sandbox, observer).await;
		self.state.set(if results.is_ok() { SuiteState::Done } else { SuiteState::Idle });
		if results.is_ok() {
			observer.progress(SuiteState::Done, "done");
		}
		results
	}

	#[instrument(skip(self, sandbox, observer))]
	async fn drive<S: Sandbox, O: SuiteObserver>(&self, sandbox: &mut S, observer: &mut O) -> Result<Vec<AggregateResult>> {
		for (i, case) in self.cases.iter().enumerate() {
			let state = SuiteState::Warmup { case: i };
			self.state.set(state);
			observer.progress(state, &format!("Warming up {}...", case));
			for _ in 0..self.config.warmup_rounds {
				sandbox.run(case, &self.config).await?;
			}
		}

		let mut results = Vec::with_capacity(self.cases.len());
		for (i, case) in self.cases.iter().enumerate() {
			let state = SuiteState::Measuring { case: i, iteration: 0 };
			self.state.set(state);
			observer.progress(state, &format!("Running {}...", case));
			sandbox.pause(self.config.pause_ms).await?;

			let mut measurements = Vec::with_capacity(self.config.iterations);
			for iteration in 0..self.config.iterations {
				self.state.set(SuiteState::Measuring { case: i, iteration });
				let elapsed_ms = sandbox.run(case, &self.config).await?;
				measurements.push(Measurement { case: *case, elapsed_ms });
			}

			if let Some(result) = AggregateResult::from_measurements(*case, &measurements, self.config.element_count) {
				info!("{}", result);
				observer.result(&result);
				results.push(result);
			}
		}
		Ok(results)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::{executor::block_on, FutureExt};

	#[derive(Debug, PartialEq)]
	enum Call {
		Run(TestCase),
		Pause(u32),
	}

	/// Answers each run of case `i` with `i + 1` ms, optionally failing at the `fail_at`th run.
	struct Recording<'s> {
		cases: Vec<TestCase>,
		calls: Vec<Call>,
		fail_at: Option<usize>,
		reentrant: Option<&'s Suite>,
		reentrant_outcome: Option<Result<Vec<AggregateResult>>>,
	}

	impl<'s> Recording<'s> {
		fn new(cases: &[TestCase]) -> Self {
			Self {
				cases: cases.to_vec(),
				calls: Vec::new(),
				fail_at: None,
				reentrant: None,
				reentrant_outcome: None,
			}
		}

		fn runs(&self) -> Vec<TestCase> {
			self.calls
				.iter()
				.filter_map(|call| match call {
					Call::Run(case) => Some(*case),
					Call::Pause(_) => None,
				})
				.collect()
		}
	}

	impl<'s> Sandbox for Recording<'s> {
		fn run<'a>(&'a mut self, case: &'a TestCase, _config: &'a SuiteConfig) -> LocalBoxFuture<'a, Result<f64>> {
			async move {
				self.calls.push(Call::Run(*case));
				if let Some(suite) = self.reentrant.take() {
					let mut nested = Recording::new(&[]);
					self.reentrant_outcome = suite.run_all(&mut nested, &mut ()).now_or_never();
				}
				if Some(self.runs().len()) == self.fail_at {
					return Err(BenchError::SandboxTimeout {
						case: case.to_string(),
						selector: "#done",
						timeout_ms: 1.0,
					});
				}
				#[allow(clippy::cast_precision_loss)]
				let elapsed = (self.cases.iter().position(|c| c == case).unwrap() + 1) as f64;
				Ok(elapsed)
			}
			.boxed_local()
		}

		fn pause(&mut self, ms: u32) -> LocalBoxFuture<'_, Result<()>> {
			self.calls.push(Call::Pause(ms));
			async { Ok(()) }.boxed_local()
		}
	}

	#[derive(Default)]
	struct Log {
		labels: Vec<String>,
		lines: Vec<String>,
	}

	impl SuiteObserver for Log {
		fn progress(&mut self, _state: SuiteState, label: &str) {
			self.labels.push(label.to_owned());
		}

		fn result(&mut self, result: &AggregateResult) {
			self.lines.push(result.to_string());
		}
	}

	#[test]
	fn warmup_once_then_ten_measured_runs_in_order() {
		let suite = Suite::default();
		let cases = suite.cases().to_vec();
		assert_eq!(cases.len(), 15);
		assert_eq!(suite.config().element_count, ELEMENT_COUNT);
		assert_eq!((suite.config().warmup_rounds, suite.config().iterations), (1, 10));
		let mut sandbox = Recording::new(&cases);
		let mut log = Log::default();

		let results = block_on(suite.run_all(&mut sandbox, &mut log)).unwrap();

		let mut expected = Vec::new();
		expected.extend(cases.iter().map(|&case| Call::Run(case)));
		for &case in &cases {
			expected.push(Call::Pause(500));
			expected.extend((0..10).map(|_| Call::Run(case)));
		}
		assert_eq!(sandbox.calls, expected);

		assert_eq!(results.iter().map(|r| r.case).collect::<Vec<_>>(), cases);
		assert_eq!(suite.state(), SuiteState::Done);
		assert_eq!(log.labels.first().map(String::as_str), Some("Warming up vanilla innerhtml  ..."));
		assert_eq!(log.labels.last().map(String::as_str), Some("done"));
		assert_eq!(log.lines.len(), 15);
	}

	#[test]
	fn results_use_geomean_throughput() {
		let suite = Suite::default();
		let cases = suite.cases().to_vec();
		let mut sandbox = Recording::new(&cases);
		let mut log = Log::default();

		let results = block_on(suite.run_all(&mut sandbox, &mut log)).unwrap();

		// Case 3 (vanilla append buffered) always takes 3 ms.
		assert!((results[2].mean_elapsed_ms - 3.0).abs() < 1e-9);
		assert_eq!(results[2].throughput, Some((50_000.0f64 / 3.0).round() as u64));
		assert_eq!(log.lines[2], "vanilla append  buffered - elements/ms: 16667");
		assert_eq!(log.lines[11], "vanilla append norender  - elements/ms: 4167");
	}

	#[test]
	fn sandbox_failure_aborts() {
		let cases = TestCase::suite();
		let suite = Suite::new(cases.clone(), SuiteConfig::default());
		let mut sandbox = Recording::new(&cases);
		sandbox.fail_at = Some(3);

		let error = block_on(suite.run_all(&mut sandbox, &mut ())).unwrap_err();
		assert!(matches!(error, BenchError::SandboxTimeout { .. }));
		assert_eq!(sandbox.runs(), cases[..3].to_vec());
		assert_eq!(suite.state(), SuiteState::Idle);

		// A failed suite can be started again.
		let mut sandbox = Recording::new(&cases);
		assert!(block_on(suite.run_all(&mut sandbox, &mut ())).is_ok());
	}

	#[test]
	fn trigger_while_running_is_rejected() {
		let cases = vec![TestCase::new(Strategy::Direct)];
		let suite = Suite::new(cases.clone(), SuiteConfig::default());
		let mut sandbox = Recording::new(&cases);
		sandbox.reentrant = Some(&suite);

		block_on(suite.run_all(&mut sandbox, &mut ())).unwrap();
		assert!(matches!(sandbox.reentrant_outcome, Some(Err(BenchError::SuiteBusy))));
		assert_eq!(sandbox.runs().len(), 11);
	}

	#[test]
	fn fragments() {
		assert_eq!(TestCase::new(Strategy::Append).buffered().fragment(50_000), "test=vanilla,run=append,buffered=true,maxCount=50000");
		assert_eq!(TestCase::new(Strategy::WebComponent).address(10), "vdom/index.html#test=vdom,run=webcomponent,maxCount=10");
		assert_eq!(TestCase::new(Strategy::Direct).norender().to_string(), "vanilla direct (norender) ");
	}
}
