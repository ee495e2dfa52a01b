//! Caption text: font selection, advance measurement and line layout.
//!
//! Layout only needs widths, so it works against the [`TextMeasure`] trait.
//! [`FontFace`] measures with real glyph advances; [`EstimatedMetrics`]
//! stands in when the environment has no fonts at all.

mod font;
mod layout;

pub use font::{EstimatedMetrics, FontFace, FontLibrary};
pub use layout::{font_size_for_width, wrap_words, TextLayout};

/// Measures the rendered advance width of a run of text.
pub trait TextMeasure {
    /// Returns the width in pixels of `text` set at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f32) -> f32;
}
