use crate::error::BenchError;
use core::{fmt, str::FromStr};

/// The page a [`Strategy`] runs on.
///
/// Every group is served as its own document (`<group>/index.html`), so strategies that need different setup never share a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyGroup {
	/// Direct DOM manipulation, one unit per loop iteration.
	Vanilla,
	/// The whole tick list is described as a single [`lignin`] tree and materialized in one pass.
	Vdom,
}

impl StrategyGroup {
	pub const ALL: [Self; 2] = [Self::Vanilla, Self::Vdom];

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::Vanilla => "vanilla",
			Self::Vdom => "vdom",
		}
	}

	/// Strategies hosted by this group's page, in button order.
	#[must_use]
	pub fn strategies(self) -> impl Iterator<Item = Strategy> {
		Strategy::ALL.iter().copied().filter(move |strategy| strategy.group() == self)
	}

	/// Address of this group's page, relative to the suite page.
	#[must_use]
	pub fn page(self) -> String {
		format!("{}/index.html", self.name())
	}
}

impl fmt::Display for StrategyGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for StrategyGroup {
	type Err = BenchError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|group| group.name() == s)
			.ok_or_else(|| BenchError::UnknownStrategy(s.to_owned()))
	}
}

/// One way of putting a tick (`<span>.</span> `) on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
	InnerHtml,
	Append,
	Shadowed,
	ShadowedAppend,
	/// Per-element [`lignin`] component rendered into its own shadow root.
	Lignin,
	Template,
	TextContent,
	/// A bare `<span>`, no wrapper element.
	Direct,
	/// A `<span>` per tick inside one shared VDOM tree.
	Vdom,
	/// An `<x-tick-append>` per tick inside one shared VDOM tree.
	WebComponent,
}

impl Strategy {
	pub const ALL: [Self; 10] = [
		Self::InnerHtml,
		Self::Append,
		Self::Shadowed,
		Self::ShadowedAppend,
		Self::Lignin,
		Self::Template,
		Self::TextContent,
		Self::Direct,
		Self::Vdom,
		Self::WebComponent,
	];

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::InnerHtml => "innerhtml",
			Self::Append => "append",
			Self::Shadowed => "shadowed",
			Self::ShadowedAppend => "shadowed-append",
			Self::Lignin => "lignin",
			Self::Template => "template",
			Self::TextContent => "textcontent",
			Self::Direct => "direct",
			Self::Vdom => "vdom",
			Self::WebComponent => "webcomponent",
		}
	}

	#[must_use]
	pub fn group(self) -> StrategyGroup {
		match self {
			Self::Vdom | Self::WebComponent => StrategyGroup::Vdom,
			_ => StrategyGroup::Vanilla,
		}
	}

	/// The custom element each unit is created as, if any.
	///
	/// [`Strategy::Vdom`] and [`Strategy::Direct`] create plain `<span>`s.
	/// [`Strategy::WebComponent`] reuses [`Strategy::Append`]'s element.
	#[must_use]
	pub fn tag_name(self) -> Option<&'static str> {
		match self {
			Self::InnerHtml => Some("x-tick-innerhtml"),
			Self::Append | Self::WebComponent => Some("x-tick-append"),
			Self::Shadowed => Some("x-tick-shadowed"),
			Self::ShadowedAppend => Some("x-tick-shadowed-append"),
			Self::Lignin => Some("x-tick-lignin"),
			Self::Template => Some("x-tick-template"),
			Self::TextContent => Some("x-tick-textcontent"),
			Self::Direct | Self::Vdom => None,
		}
	}
}

impl fmt::Display for Strategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Strategy {
	type Err = BenchError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.iter()
			.copied()
			.find(|strategy| strategy.name() == s)
			.ok_or_else(|| BenchError::UnknownStrategy(s.to_owned()))
	}
}
