#![doc(html_root_url = "https://docs.rs/lignin-dom-bench/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Browser micro-benchmarks for DOM rendering strategies.
//!
//! A [`harness::Harness`] renders a configurable number of ticks with one [`strategy::Strategy`] and measures
//! the time until the next rendering frame. A [`suite::Suite`] runs every [`suite::TestCase`] in its own
//! [`sandbox::IframeSandbox`], warming up once and then aggregating ten measured runs per case by geometric mean.

pub use lignin;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
pub mod error;
pub mod frame;
pub mod harness;
pub mod params;
pub mod registry;
pub mod sandbox;
pub mod stats;
pub mod strategy;
pub mod suite;
pub mod ticks;
pub mod vdom;

pub use error::{BenchError, Result};
