//! Aggregation of timed runs.

/// The geometric mean of `measurements`, or [`None`] if there are none.
///
/// Computed in log space over a sorted copy, so the result does not depend on the order of `measurements`
/// and long products can't overflow. A zero measurement yields zero.
#[must_use]
pub fn geomean(measurements: &[f64]) -> Option<f64> {
	if measurements.is_empty() {
		return None;
	}

	let mut sorted = measurements.to_vec();
	sorted.sort_by(f64::total_cmp);

	#[allow(clippy::cast_precision_loss)]
	let n = sorted.len() as f64;
	Some((sorted.iter().map(|m| m.ln()).sum::<f64>() / n).exp())
}

/// Elements per millisecond, rounded to the nearest integer.
///
/// [`None`] if `elapsed_ms` isn't a positive finite duration.
#[must_use]
pub fn throughput(count: u32, elapsed_ms: f64) -> Option<u64> {
	if !(elapsed_ms.is_finite() && elapsed_ms > 0.0) {
		return None;
	}
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	Some((f64::from(count) / elapsed_ms).round() as u64)
}

/// Formats [`throughput`] for display.
#[must_use]
pub fn format_throughput(throughput: Option<u64>) -> String {
	throughput.map_or_else(|| "n/a".to_owned(), |t| t.to_string())
}
