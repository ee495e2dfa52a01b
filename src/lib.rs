//! caption-renderer: captioned image compositing over HTTP
//!
//! This crate takes an uploaded image and a caption, lays a white gradient
//! scrim over the bottom of the image, draws the caption as wrapped lines
//! anchored to the bottom-left, optionally composites a remotely fetched logo
//! in the bottom-right corner, and returns the result as a JPEG.
//!
//! # Example
//!
//! ```no_run
//! use caption_renderer::{Compositor, FontLibrary, LogoFetcher, RenderRequest, StyleProfile};
//! use std::time::Duration;
//!
//! # async fn run(png: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let profile = StyleProfile::default();
//! let fonts = FontLibrary::system(&profile.text.font_families);
//! let fetcher = LogoFetcher::new(Duration::from_secs(10))?;
//! let compositor = Compositor::new(profile, fonts, fetcher);
//!
//! let output = compositor
//!     .render(RenderRequest::new(png).with_caption("Hello World"))
//!     .await?;
//! assert_eq!(output.layout.lines, vec!["Hello World".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! # Style Profiles
//!
//! Every tunable of the pipeline (gradient stops, font bounds, logo box,
//! JPEG quality) lives in a serializable [`StyleProfile`]:
//!
//! ```
//! use caption_renderer::StyleProfile;
//!
//! let json = StyleProfile::default().to_json().unwrap();
//! let restored = StyleProfile::from_json(&json).unwrap();
//! assert_eq!(restored.jpeg_quality, 95);
//! ```

mod compositor;
mod error;
mod fetch;
mod layer;
mod profile;
mod surface;
mod text;

pub mod config;
pub mod server;

pub use compositor::{Compositor, RenderOutput, RenderRequest, DEFAULT_CAPTION};
pub use error::ComposeError;
pub use fetch::{LogoError, LogoFetcher, DEFAULT_MAX_LOGO_BYTES};
pub use layer::{
    fit_within, CaptionLayer, GradientSpec, LayerEffect, LayerPipeline, LogoLayer,
    LogoPlacement, RenderContext, ScrimLayer,
};
pub use profile::{
    GradientSettings, GradientStop, LogoSettings, ProfileError, StyleProfile, TextSettings,
};
pub use surface::{Canvas, LogoAsset, SizePx, SourceImage};
pub use text::{
    font_size_for_width, wrap_words, EstimatedMetrics, FontFace, FontLibrary, TextLayout, TextMeasure,
};
