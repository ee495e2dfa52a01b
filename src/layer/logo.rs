//! Logo layer: fit the fetched logo into its box and place it bottom-right.

use image::imageops::{self, FilterType};

use super::svg::composite_over;
use super::{LayerEffect, RenderContext};
use crate::error::ComposeResult;
use crate::profile::LogoSettings;
use crate::surface::{LogoAsset, SizePx};

/// Where the logo ended up on the canvas.
///
/// `x`/`y` may be negative when the canvas is smaller than logo plus margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Scales `(width, height)` down to fit a `max_width x max_height` box.
///
/// The height is clamped first; the width is then clamped against the
/// already scaled size. Both steps scale both axes, so the aspect ratio is
/// kept. Sizes already inside the box are returned unchanged.
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    let (mut w, mut h) = (width, height);
    if h > max_height {
        let ratio = max_height / h;
        w *= ratio;
        h *= ratio;
    }
    if w > max_width {
        let ratio = max_width / w;
        w *= ratio;
        h *= ratio;
    }
    (w, h)
}

/// Draws a fetched logo at a fixed inset from the bottom-right corner.
///
/// # Emitted Properties
///
/// - [`LogoPlacement`]: the rectangle the logo was drawn into.
#[derive(Debug, Clone)]
pub struct LogoLayer<'a> {
    pub asset: LogoAsset,
    pub settings: &'a LogoSettings,
}

impl<'a> LogoLayer<'a> {
    pub fn new(asset: LogoAsset, settings: &'a LogoSettings) -> Self {
        Self { asset, settings }
    }

    /// Pixel size of the logo after fitting, never below 1x1.
    pub fn fitted_size(&self) -> SizePx {
        let original = self.asset.original_size();
        let (w, h) = fit_within(
            original.width as f32,
            original.height as f32,
            self.settings.max_width,
            self.settings.max_height,
        );
        SizePx::new((w.round() as u32).max(1), (h.round() as u32).max(1))
    }

    /// Placement on a canvas of the given size.
    pub fn placement(&self, canvas: SizePx) -> LogoPlacement {
        let size = self.fitted_size();
        let margin = self.settings.margin;
        LogoPlacement {
            x: (canvas.width as f32 - size.width as f32 - margin).round() as i32,
            y: (canvas.height as f32 - size.height as f32 - margin).round() as i32,
            width: size.width,
            height: size.height,
        }
    }
}

impl LayerEffect for LogoLayer<'_> {
    fn transform(&self, ctx: &mut RenderContext) -> ComposeResult<()> {
        let placement = self.placement(ctx.canvas.dimensions());

        let resized = if self.asset.original_size() == SizePx::new(placement.width, placement.height)
        {
            self.asset.data.clone()
        } else {
            imageops::resize(
                &self.asset.data,
                placement.width,
                placement.height,
                FilterType::Lanczos3,
            )
        };

        composite_over(&mut ctx.canvas.data, &resized, placement.x, placement.y);
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext) {
        let placement = self.placement(ctx.canvas.dimensions());
        ctx.set(placement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SourceImage;
    use image::{Rgba, RgbaImage};

    fn assert_fits(w: f32, h: f32) {
        let (fw, fh) = fit_within(w, h, 150.0, 80.0);
        assert!(fw <= 150.0 + 1e-3, "{w}x{h} -> width {fw}");
        assert!(fh <= 80.0 + 1e-3, "{w}x{h} -> height {fh}");
        assert!((fw / fh - w / h).abs() < 1e-3, "{w}x{h} aspect changed");
    }

    #[test]
    fn small_logo_is_untouched() {
        assert_eq!(fit_within(100.0, 50.0, 150.0, 80.0), (100.0, 50.0));
    }

    #[test]
    fn tall_logo_is_height_clamped() {
        let (w, h) = fit_within(100.0, 200.0, 150.0, 80.0);
        assert!((w - 40.0).abs() < 1e-4);
        assert!((h - 80.0).abs() < 1e-4);
    }

    #[test]
    fn wide_logo_is_width_clamped() {
        assert_eq!(fit_within(300.0, 60.0, 150.0, 80.0), (150.0, 30.0));
    }

    #[test]
    fn large_logo_clamps_height_then_width() {
        // Height clamp: 300x100 -> 240x80. Width clamp: 240x80 -> 150x50.
        let (w, h) = fit_within(300.0, 100.0, 150.0, 80.0);
        assert!((w - 150.0).abs() < 1e-4);
        assert!((h - 50.0).abs() < 1e-4);
    }

    #[test]
    fn fit_holds_for_assorted_sizes() {
        for (w, h) in [
            (1.0, 1.0),
            (150.0, 80.0),
            (151.0, 80.0),
            (150.0, 81.0),
            (1000.0, 10.0),
            (10.0, 1000.0),
            (640.0, 480.0),
            (333.0, 77.0),
        ] {
            assert_fits(w, h);
        }
    }

    #[test]
    fn placement_is_inset_from_bottom_right() {
        let settings = LogoSettings::default();
        let layer = LogoLayer::new(LogoAsset::new(RgbaImage::new(300, 100)), &settings);

        assert_eq!(layer.fitted_size(), SizePx::new(150, 50));
        assert_eq!(
            layer.placement(SizePx::new(800, 600)),
            LogoPlacement {
                x: 620,
                y: 520,
                width: 150,
                height: 50
            }
        );
    }

    #[test]
    fn fitted_size_never_collapses_to_zero() {
        let settings = LogoSettings::default();
        let layer = LogoLayer::new(LogoAsset::new(RgbaImage::new(2000, 1)), &settings);
        assert_eq!(layer.fitted_size(), SizePx::new(150, 1));
    }

    #[test]
    fn logo_is_composited_and_placement_emitted() {
        let settings = LogoSettings::default();
        let logo = RgbaImage::from_pixel(300, 100, Rgba([255, 0, 0, 255]));
        let layer = LogoLayer::new(LogoAsset::new(logo), &settings);

        let base = RgbaImage::from_pixel(800, 600, Rgba([0, 0, 255, 255]));
        let mut ctx = RenderContext::new(SourceImage::from_rgba(base).into_canvas());
        layer.apply(&mut ctx).unwrap();

        let placement = *ctx.get::<LogoPlacement>().unwrap();
        assert_eq!((placement.x, placement.y), (620, 520));

        let data = &ctx.canvas.data;
        let inside = data.get_pixel(695, 545);
        assert!(inside[0] > 250 && inside[2] < 5, "inside the logo: {inside:?}");
        assert_eq!(data.get_pixel(619, 545).0, [0, 0, 255, 255], "left of the logo");
        assert_eq!(data.get_pixel(780, 590).0, [0, 0, 255, 255], "inside the margin");
    }

    #[test]
    fn translucent_logo_blends_with_canvas() {
        let settings = LogoSettings::default();
        let logo = RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 128]));
        let layer = LogoLayer::new(LogoAsset::new(logo), &settings);

        let base = RgbaImage::from_pixel(400, 300, Rgba([0, 0, 255, 255]));
        let mut ctx = RenderContext::new(SourceImage::from_rgba(base).into_canvas());
        layer.apply(&mut ctx).unwrap();

        // Logo spans (270, 220)..(370, 270).
        let p = ctx.canvas.data.get_pixel(320, 245).0;
        assert!(p[0].abs_diff(128) <= 1, "red half-blended: {p:?}");
        assert!(p[2].abs_diff(127) <= 1, "blue half-visible: {p:?}");
        assert_eq!(p[3], 255);
    }
}
