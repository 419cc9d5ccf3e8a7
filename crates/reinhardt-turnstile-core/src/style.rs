//! Container style resolver.
//!
//! The widget mounts asynchronously, so the container reserves the box the
//! widget will occupy to keep the page from jumping.

use std::fmt;

use crate::options::{Appearance, Execution, WidgetSize};

/// One CSS length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
	/// Pixels.
	Px(u32),
	/// Percentage of the parent.
	Percent(u32),
	/// `auto`
	Auto,
	/// `fit-content`
	FitContent,
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Px(0) => f.write_str("0"),
			Self::Px(px) => write!(f, "{}px", px),
			Self::Percent(pct) => write!(f, "{}%", pct),
			Self::Auto => f.write_str("auto"),
			Self::FitContent => f.write_str("fit-content"),
		}
	}
}

/// Reserved layout box for the widget container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStyle {
	/// `width`
	pub width: Dimension,
	/// `height`
	pub height: Dimension,
	/// `overflow`, if set.
	pub overflow: Option<&'static str>,
	/// `display`, if set.
	pub display: Option<&'static str>,
}

impl ContainerStyle {
	/// `normal` widget: 300x65.
	pub const NORMAL: Self = Self::fixed(Dimension::Px(300), Dimension::Px(65));

	/// `compact` widget: 130x120.
	pub const COMPACT: Self = Self::fixed(Dimension::Px(130), Dimension::Px(120));

	/// `flexible` widget: full width, 65px high.
	pub const FLEXIBLE: Self = Self::fixed(Dimension::Percent(100), Dimension::Px(65));

	/// Invisible widget: 0x0, clipped.
	pub const INVISIBLE: Self = Self {
		width: Dimension::Px(0),
		height: Dimension::Px(0),
		overflow: Some("hidden"),
		display: None,
	};

	/// `interaction-only` appearance: shrink to whatever the widget needs.
	pub const INTERACTION_ONLY: Self = Self {
		width: Dimension::FitContent,
		height: Dimension::Auto,
		overflow: None,
		display: Some("flex"),
	};

	const fn fixed(width: Dimension, height: Dimension) -> Self {
		Self {
			width,
			height,
			overflow: None,
			display: None,
		}
	}

	/// Box of a rendered widget of the given size.
	pub fn for_size(size: WidgetSize) -> Self {
		match size {
			WidgetSize::Normal => Self::NORMAL,
			WidgetSize::Compact => Self::COMPACT,
			WidgetSize::Flexible => Self::FLEXIBLE,
			WidgetSize::Invisible => Self::INVISIBLE,
		}
	}

	/// Resolves the box for the current modes.
	///
	/// `execute` mode always starts from the invisible box; it grows only once
	/// `execute()` is called.
	pub fn resolve(size: WidgetSize, appearance: Appearance, execution: Execution) -> Self {
		if execution == Execution::Execute {
			return Self::INVISIBLE;
		}
		if appearance == Appearance::InteractionOnly {
			return Self::INTERACTION_ONLY;
		}
		Self::for_size(size)
	}

	/// `(property, value)` pairs, unset properties included with `None`.
	pub fn properties(&self) -> [(&'static str, Option<String>); 4] {
		[
			("width", Some(self.width.to_string())),
			("height", Some(self.height.to_string())),
			("overflow", self.overflow.map(str::to_string)),
			("display", self.display.map(str::to_string)),
		]
	}

	/// Inline CSS declaration, e.g. `width: 300px; height: 65px`.
	pub fn to_css(&self) -> String {
		self.properties()
			.into_iter()
			.filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
			.collect::<Vec<_>>()
			.join("; ")
	}
}

impl Default for ContainerStyle {
	fn default() -> Self {
		Self::NORMAL
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(WidgetSize::Normal, ContainerStyle::NORMAL)]
	#[case(WidgetSize::Compact, ContainerStyle::COMPACT)]
	#[case(WidgetSize::Flexible, ContainerStyle::FLEXIBLE)]
	#[case(WidgetSize::Invisible, ContainerStyle::INVISIBLE)]
	fn test_render_mode_uses_size_box(#[case] size: WidgetSize, #[case] expected: ContainerStyle) {
		assert_eq!(
			ContainerStyle::resolve(size, Appearance::Always, Execution::Render),
			expected
		);
	}

	#[rstest]
	fn test_compact_box_is_130_by_120() {
		let style = ContainerStyle::resolve(WidgetSize::Compact, Appearance::Always, Execution::Render);
		assert_eq!(style.width, Dimension::Px(130));
		assert_eq!(style.height, Dimension::Px(120));
	}

	#[rstest]
	fn test_execute_mode_is_invisible_for_every_size(
		#[values(
			WidgetSize::Normal,
			WidgetSize::Compact,
			WidgetSize::Flexible,
			WidgetSize::Invisible
		)]
		size: WidgetSize,
		#[values(Appearance::Always, Appearance::Execute, Appearance::InteractionOnly)]
		appearance: Appearance,
	) {
		assert_eq!(
			ContainerStyle::resolve(size, appearance, Execution::Execute),
			ContainerStyle::INVISIBLE
		);
	}

	#[rstest]
	fn test_interaction_only_fits_content() {
		let style =
			ContainerStyle::resolve(WidgetSize::Normal, Appearance::InteractionOnly, Execution::Render);
		assert_eq!(style, ContainerStyle::INTERACTION_ONLY);
		assert_eq!(style.to_css(), "width: fit-content; height: auto; display: flex");
	}

	#[rstest]
	#[case(ContainerStyle::NORMAL, "width: 300px; height: 65px")]
	#[case(ContainerStyle::INVISIBLE, "width: 0; height: 0; overflow: hidden")]
	#[case(ContainerStyle::FLEXIBLE, "width: 100%; height: 65px")]
	fn test_to_css(#[case] style: ContainerStyle, #[case] expected: &str) {
		assert_eq!(style.to_css(), expected);
	}
}
