//! Run configuration carried in a page's URL fragment.
//!
//! The suite addresses each sandbox as `<group>/index.html#key=value,key=value,…`.
//! [`RunParams`] is the loosely typed view of such a fragment, [`RunConfig`] the checked one the harness consumes.

use crate::{
	error::{BenchError, Result},
	strategy::Strategy,
};
use core::fmt;
use tracing::{instrument, trace, warn};

/// Element count of a standalone run.
pub const DEFAULT_MAX_COUNT: u32 = 100_000;

/// A coerced fragment value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
	Bool(bool),
	Number(f64),
	Str(String),
}

impl ParamValue {
	/// Coerces a raw value: `true`/`false` become booleans, anything JavaScript's `Number(…)` accepts becomes a number.
	#[must_use]
	pub fn coerce(raw: &str) -> Self {
		match raw {
			"true" => Self::Bool(true),
			"false" => Self::Bool(false),
			_ => parse_js_number(raw).map_or_else(|| Self::Str(raw.to_owned()), Self::Number),
		}
	}
}

impl fmt::Display for ParamValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{}", b),
			#[allow(clippy::cast_possible_truncation)]
			Self::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => write!(f, "{}", *n as i64),
			Self::Number(n) if n.is_infinite() => f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" }),
			Self::Number(n) => write!(f, "{}", n),
			Self::Str(s) => f.write_str(s),
		}
	}
}

/// Mirrors `Number(string)` for the forms that can show up in a hand-edited fragment.
fn parse_js_number(raw: &str) -> Option<f64> {
	let s = raw.trim();
	if s.is_empty() {
		return Some(0.0);
	}

	match s {
		"Infinity" | "+Infinity" => return Some(f64::INFINITY),
		"-Infinity" => return Some(f64::NEG_INFINITY),
		_ => (),
	}

	let radix = match s.get(..2) {
		Some("0x") | Some("0X") => Some(16),
		Some("0o") | Some("0O") => Some(8),
		Some("0b") | Some("0B") => Some(2),
		_ => None,
	};
	if let Some(radix) = radix {
		// `from_str_radix` takes a sign, `Number(…)` doesn't after the prefix.
		let digits = &s[2..];
		if digits.starts_with('+') {
			return None;
		}
		#[allow(clippy::cast_precision_loss)]
		return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
	}

	// `f64::from_str` also takes `inf` and `NaN`, which `Number(…)` doesn't.
	if !s.bytes().any(|b| b.is_ascii_digit()) || !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
		return None;
	}
	s.parse().ok()
}

/// Decoded `key=value` pairs, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunParams(Vec<(String, ParamValue)>);

impl RunParams {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Decodes a fragment, with or without its leading `#`.
	///
	/// Only the text between the first and second `=` of a segment is used as its value.
	/// Later duplicates replace earlier values.
	#[must_use]
	#[instrument]
	pub fn decode(fragment: &str) -> Self {
		let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
		let mut params = Self::new();
		for segment in fragment.split(',').filter(|segment| !segment.is_empty()) {
			let mut parts = segment.split('=');
			let key = parts.next().unwrap_or_default();
			match parts.next() {
				Some(value) => params.insert(key, ParamValue::coerce(value)),
				None => warn!("Ignoring fragment segment without value: {:?}", segment),
			}
		}
		params
	}

	pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
		let key = key.into();
		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => *slot = value,
			None => self.0.push((key, value)),
		}
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&ParamValue> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The canonical `key=value,…` form, without leading `#`.
	#[must_use]
	pub fn encode(&self) -> String {
		self.0.iter().map(|(key, value)| format!("{}={}", key, value)).collect::<Vec<_>>().join(",")
	}
}

/// Checked settings of one single-run harness instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
	/// `Some` selects automatic mode: the page runs this strategy when its hidden `#run` control is clicked.
	pub run: Option<Strategy>,
	/// Stage units in a detached fragment and attach them with one bulk append.
	pub buffered: bool,
	/// Construct units but never attach them.
	pub norender: bool,
	pub max_count: u32,
}

impl Default for RunConfig {
	fn default() -> Self {
		Self {
			run: None,
			buffered: false,
			norender: false,
			max_count: DEFAULT_MAX_COUNT,
		}
	}
}

impl RunConfig {
	/// # Errors
	///
	/// [`BenchError::UnknownStrategy`] for an unrecognised `run`,
	/// [`BenchError::InvalidParam`] for mistyped values or a `maxCount` that isn't a positive 32-bit integer.
	#[instrument]
	pub fn from_params(params: &RunParams, default_max_count: u32) -> Result<Self> {
		let mut config = Self { max_count: default_max_count, ..Self::default() };
		for (key, value) in params.iter() {
			match key {
				"run" => {
					config.run = match value {
						ParamValue::Bool(false) => None,
						ParamValue::Str(name) => Some(name.parse()?),
						_ => return Err(invalid(key, value, "a strategy name or `false`")),
					}
				}
				"buffered" => config.buffered = flag(key, value)?,
				"norender" => config.norender = flag(key, value)?,
				"maxCount" => {
					config.max_count = match *value {
						#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
						ParamValue::Number(n) if n.fract() == 0.0 && n >= 1.0 && n <= f64::from(u32::MAX) => n as u32,
						_ => return Err(invalid(key, value, "a positive integer")),
					}
				}
				_ => trace!("Ignoring unrecognised parameter {}={}", key, value),
			}
		}
		Ok(config)
	}

	/// Reads the current page's `location.hash`.
	///
	/// # Errors
	///
	/// See [`RunConfig::from_params`]. Also fails outside a browsing context.
	pub fn from_location(default_max_count: u32) -> Result<Self> {
		let hash = web_sys::window().ok_or(BenchError::NoWindow)?.location().hash()?;
		Self::from_params(&RunParams::decode(&hash), default_max_count)
	}
}

fn flag(key: &str, value: &ParamValue) -> Result<bool> {
	match *value {
		ParamValue::Bool(b) => Ok(b),
		_ => Err(invalid(key, value, "`true` or `false`")),
	}
}

fn invalid(key: &str, value: &ParamValue, expected: &'static str) -> BenchError {
	BenchError::InvalidParam {
		key: key.to_owned(),
		value: value.to_string(),
		expected,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_coerces_types() {
		let params = RunParams::decode("run=append,maxCount=1000,norender=true");
		assert_eq!(params.len(), 3);
		assert_eq!(params.get("run"), Some(&ParamValue::Str("append".to_owned())));
		assert_eq!(params.get("maxCount"), Some(&ParamValue::Number(1000.0)));
		assert_eq!(params.get("norender"), Some(&ParamValue::Bool(true)));
	}

	#[test]
	fn decode_strips_hash_and_skips_junk() {
		let params = RunParams::decode("#a=false,,b,c=x=y,a=0x10");
		assert_eq!(params.get("a"), Some(&ParamValue::Number(16.0)));
		assert_eq!(params.get("b"), None);
		assert_eq!(params.get("c"), Some(&ParamValue::Str("x".to_owned())));
		assert!(RunParams::decode("").is_empty());
		assert!(RunParams::decode("#").is_empty());
	}

	#[test]
	fn numbers_follow_js() {
		assert_eq!(ParamValue::coerce(""), ParamValue::Number(0.0));
		assert_eq!(ParamValue::coerce(" 12 "), ParamValue::Number(12.0));
		assert_eq!(ParamValue::coerce("1e3"), ParamValue::Number(1000.0));
		assert_eq!(ParamValue::coerce("-Infinity"), ParamValue::Number(f64::NEG_INFINITY));
		assert_eq!(ParamValue::coerce("inf"), ParamValue::Str("inf".to_owned()));
		assert_eq!(ParamValue::coerce("NaN"), ParamValue::Str("NaN".to_owned()));
		assert_eq!(ParamValue::coerce("1.2.3"), ParamValue::Str("1.2.3".to_owned()));
		assert_eq!(ParamValue::coerce("0x+10"), ParamValue::Str("0x+10".to_owned()));
		assert_eq!(ParamValue::coerce("0b-1"), ParamValue::Str("0b-1".to_owned()));
		assert_eq!(ParamValue::coerce("0B101"), ParamValue::Number(5.0));
		assert_eq!(ParamValue::coerce("shadowed-append"), ParamValue::Str("shadowed-append".to_owned()));
	}

	#[test]
	fn encode_is_canonical() {
		let params = RunParams::decode("test=vanilla,run=append,buffered=true,maxCount=50000");
		assert_eq!(params.encode(), "test=vanilla,run=append,buffered=true,maxCount=50000");
		assert_eq!(RunParams::decode(&params.encode()), params);

		let mut params = RunParams::new();
		params.insert("ratio", ParamValue::Number(0.5));
		assert_eq!(params.encode(), "ratio=0.5");
	}

	#[test]
	fn config_from_params() {
		let config = RunConfig::from_params(&RunParams::decode("test=vanilla,run=append,maxCount=1000,norender=true"), DEFAULT_MAX_COUNT).unwrap();
		assert_eq!(
			config,
			RunConfig {
				run: Some(Strategy::Append),
				buffered: false,
				norender: true,
				max_count: 1000,
			}
		);

		let manual = RunConfig::from_params(&RunParams::decode("run=false"), 40).unwrap();
		assert_eq!(manual.run, None);
		assert_eq!(manual.max_count, 40);
	}

	#[test]
	fn config_rejects_bad_values() {
		assert!(matches!(
			RunConfig::from_params(&RunParams::decode("run=lit"), DEFAULT_MAX_COUNT),
			Err(BenchError::UnknownStrategy(_))
		));
		for fragment in &["maxCount=0", "maxCount=1.5", "maxCount=-3", "maxCount=many", "buffered=1", "run=true"] {
			assert!(
				matches!(RunConfig::from_params(&RunParams::decode(fragment), DEFAULT_MAX_COUNT), Err(BenchError::InvalidParam { .. })),
				"{}",
				fragment
			);
		}
	}
}
