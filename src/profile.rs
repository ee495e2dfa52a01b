//! Serializable style profile for the compositing pipeline.
//!
//! A [`StyleProfile`] captures every presentation tunable in a format that
//! can be kept in a JSON file and loaded at startup. The defaults reproduce
//! the stock look: a 250px white scrim, 24-48px captions and a logo box of
//! 150x80.
//!
//! # Example
//!
//! ```
//! use caption_renderer::{GradientSettings, GradientStop, StyleProfile};
//!
//! let profile = StyleProfile::new().with_gradient(GradientSettings {
//!     height: 200,
//!     stops: vec![
//!         GradientStop::white(0.0, 0.95),
//!         GradientStop::white(0.7, 0.7),
//!         GradientStop::white(1.0, 0.0),
//!     ],
//! });
//! profile.validate().unwrap();
//!
//! let json = profile.to_json().unwrap();
//! let restored = StyleProfile::from_json(&json).unwrap();
//! assert_eq!(restored.gradient.height, 200);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to read style profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid style profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid style profile: {0}")]
    Invalid(String),
}

impl ProfileError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

// ============================================================================
// Gradient Settings
// ============================================================================

/// One colour stop of the scrim gradient.
///
/// Offset 0 is the bottom edge of the image, offset 1 the top of the band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientStop {
    /// Position along the band (0.0-1.0).
    pub offset: f32,

    /// RGB colour of the stop.
    pub color: [u8; 3],

    /// Opacity of the stop (0.0-1.0).
    pub alpha: f32,
}

impl GradientStop {
    pub fn new(offset: f32, color: [u8; 3], alpha: f32) -> Self {
        Self {
            offset,
            color,
            alpha,
        }
    }

    pub fn white(offset: f32, alpha: f32) -> Self {
        Self::new(offset, [255, 255, 255], alpha)
    }
}

/// Settings for the bottom scrim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientSettings {
    /// Height of the band in pixels, measured up from the bottom edge.
    pub height: u32,

    /// Colour stops ordered from bottom (offset 0) to top (offset 1).
    pub stops: Vec<GradientStop>,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            height: 250,
            stops: vec![GradientStop::white(0.0, 1.0), GradientStop::white(1.0, 0.0)],
        }
    }
}

// ============================================================================
// Text Settings
// ============================================================================

/// Settings for caption layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextSettings {
    /// Font families tried in order before the generic sans-serif family.
    pub font_families: Vec<String>,

    /// Font size is `image width / width_divisor`, then clamped.
    pub width_divisor: f32,
    pub min_font_size: f32,
    pub max_font_size: f32,

    /// Line advance as a multiple of the font size.
    pub line_height: f32,

    /// X position where every line starts.
    pub left_margin: f32,

    /// Distance from the bottom edge to the baseline of the bottom line.
    pub bottom_margin: f32,

    /// Total horizontal space excluded from the wrap width.
    pub horizontal_padding: f32,

    /// Opaque fill colour of the caption.
    pub color: [u8; 3],
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            font_families: ["Noto Sans", "DejaVu Sans", "Liberation Sans", "FreeSans"]
                .into_iter()
                .map(String::from)
                .collect(),
            width_divisor: 15.0,
            min_font_size: 24.0,
            max_font_size: 48.0,
            line_height: 1.2,
            left_margin: 50.0,
            bottom_margin: 50.0,
            horizontal_padding: 100.0,
            color: [0, 0, 0],
        }
    }
}

// ============================================================================
// Logo Settings
// ============================================================================

/// Settings for logo placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogoSettings {
    pub max_width: f32,
    pub max_height: f32,

    /// Inset from the right and bottom edges.
    pub margin: f32,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            max_width: 150.0,
            max_height: 80.0,
            margin: 30.0,
        }
    }
}

// ============================================================================
// StyleProfile
// ============================================================================

/// All presentation tunables of the pipeline.
///
/// # JSON Format
///
/// ```json
/// {
///   "gradient": {
///     "height": 250,
///     "stops": [
///       { "offset": 0.0, "color": [255, 255, 255], "alpha": 1.0 },
///       { "offset": 1.0, "color": [255, 255, 255], "alpha": 0.0 }
///     ]
///   },
///   "text": { "minFontSize": 24.0, "maxFontSize": 48.0 },
///   "logo": { "maxWidth": 150.0, "maxHeight": 80.0, "margin": 30.0 },
///   "jpegQuality": 95
/// }
/// ```
///
/// Missing sections fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleProfile {
    pub gradient: GradientSettings,
    pub text: TextSettings,
    pub logo: LogoSettings,
    pub jpeg_quality: u8,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            gradient: GradientSettings::default(),
            text: TextSettings::default(),
            logo: LogoSettings::default(),
            jpeg_quality: 95,
        }
    }
}

impl StyleProfile {
    /// Creates a profile with the stock settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gradient(mut self, gradient: GradientSettings) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_text(mut self, text: TextSettings) -> Self {
        self.text = text;
        self
    }

    pub fn with_logo(mut self, logo: LogoSettings) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Checks the invariants the renderer relies on.
    ///
    /// The scrim must fade out going up: the bottom stop has to be more
    /// opaque than the top stop.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let gradient = &self.gradient;
        if gradient.height == 0 {
            return Err(ProfileError::invalid("gradient height must be positive"));
        }
        if gradient.stops.len() < 2 {
            return Err(ProfileError::invalid("gradient needs at least two stops"));
        }
        for stop in &gradient.stops {
            if !(0.0..=1.0).contains(&stop.offset) || !(0.0..=1.0).contains(&stop.alpha) {
                return Err(ProfileError::invalid(
                    "gradient offsets and alphas must be within 0.0-1.0",
                ));
            }
        }
        if gradient.stops.windows(2).any(|w| w[1].offset < w[0].offset) {
            return Err(ProfileError::invalid("gradient offsets must be ascending"));
        }
        let (first, last) = (&gradient.stops[0], &gradient.stops[gradient.stops.len() - 1]);
        if first.alpha <= last.alpha {
            return Err(ProfileError::invalid(
                "bottom gradient stop must be more opaque than the top stop",
            ));
        }

        let text = &self.text;
        if text.min_font_size <= 0.0 || text.min_font_size > text.max_font_size {
            return Err(ProfileError::invalid("font size bounds are inverted or not positive"));
        }
        if text.width_divisor <= 0.0 || text.line_height <= 0.0 {
            return Err(ProfileError::invalid("width divisor and line height must be positive"));
        }

        if self.logo.max_width <= 0.0 || self.logo.max_height <= 0.0 {
            return Err(ProfileError::invalid("logo bounds must be positive"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ProfileError::invalid("JPEG quality must be within 1-100"));
        }

        Ok(())
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads and validates a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path)?;
        let profile = Self::from_json(&json)?;
        profile.validate()?;
        Ok(profile)
    }
}

// ============================================================================
// Tests
// ============================================================================
