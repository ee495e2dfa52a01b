//! Greedy caption wrapping and bottom-up line placement.

use crate::profile::TextSettings;

use super::TextMeasure;

/// Font size for an image of the given width.
///
/// Scales with the width and stays within the configured bounds.
pub fn font_size_for_width(width: u32, settings: &TextSettings) -> f32 {
    (width as f32 / settings.width_divisor).clamp(settings.min_font_size, settings.max_font_size)
}

/// Wraps `caption` into lines no wider than `max_width` where possible.
///
/// Single pass, no look-ahead: each word is appended to the current line
/// unless the joined candidate measures wider than `max_width`, in which
/// case the current line is committed and the word starts the next one.
/// A word that is wider than `max_width` on its own still gets its own
/// line and is never split.
///
/// A caption with no words yields exactly one empty line.
pub fn wrap_words(
    caption: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut words = caption.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();

    for word in words {
        let candidate = format!("{current} {word}");
        if measure.measure(&candidate, font_size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    lines.push(current);

    lines
}

// ============================================================================
// TextLayout
// ============================================================================

/// The wrapped caption and where its lines go.
///
/// `lines` are in reading order. Drawing walks them bottom-up: the last line
/// sits on the bottom baseline and each earlier line one `line_height`
/// above the previous.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub line_height: f32,

    /// X position where every line starts.
    pub left: f32,

    /// Baseline of the bottom line.
    pub bottom_baseline: f32,

    /// Wrapped lines in reading order.
    pub lines: Vec<String>,
}

impl TextLayout {
    /// Lays out `caption` for a canvas of `width` x `height`.
    pub fn compute(
        caption: &str,
        width: u32,
        height: u32,
        settings: &TextSettings,
        measure: &dyn TextMeasure,
    ) -> Self {
        let font_size = font_size_for_width(width, settings);
        let max_width = width as f32 - settings.horizontal_padding;
        let lines = wrap_words(caption, max_width, font_size, measure);

        Self {
            font_size,
            line_height: font_size * settings.line_height,
            left: settings.left_margin,
            bottom_baseline: height as f32 - settings.bottom_margin,
            lines,
        }
    }

    /// Yields `(x, baseline_y, line)` from the bottom line upward.
    pub fn placements(&self) -> impl Iterator<Item = (f32, f32, &str)> + '_ {
        self.lines.iter().rev().enumerate().map(move |(i, line)| {
            (
                self.left,
                self.bottom_baseline - i as f32 * self.line_height,
                line.as_str(),
            )
        })
    }

    /// True when there is nothing to draw.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }
}
