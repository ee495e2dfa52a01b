//! Bottom gradient scrim.

use image::{Rgba, RgbaImage};
use palette::{LinSrgba, Mix, Srgba};

use super::svg::composite_over;
use super::{LayerEffect, RenderContext};
use crate::error::ComposeResult;
use crate::profile::{GradientSettings, GradientStop};

// ============================================================================
// GradientSpec
// ============================================================================

/// A vertical gradient anchored to the bottom edge.
///
/// Offset 0 is the bottom row of the image, offset 1 is `height` pixels
/// above it. Stops are interpolated in linear light.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub height: u32,
    stops: Vec<(f32, LinSrgba)>,
}

impl GradientSpec {
    /// Builds a gradient from profile settings.
    ///
    /// Stops are sorted by offset. An empty stop list yields a fully
    /// transparent gradient.
    pub fn from_settings(settings: &GradientSettings) -> Self {
        let mut stops: Vec<_> = settings.stops.iter().map(stop_color).collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            height: settings.height,
            stops,
        }
    }

    /// Colour at position `t` (0 = bottom, 1 = top), linearly interpolated
    /// between the surrounding stops.
    pub fn sample(&self, t: f32) -> LinSrgba {
        let t = t.clamp(0.0, 1.0);
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return LinSrgba::new(0.0, 0.0, 0.0, 0.0);
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.0 {
                let span = hi.0 - lo.0;
                if span <= f32::EPSILON {
                    return hi.1;
                }
                return lo.1.mix(hi.1, (t - lo.0) / span);
            }
        }
        last.1
    }

    /// Renders the band for a canvas of `width` x `canvas_height`.
    ///
    /// The band is `min(height, canvas_height)` rows tall; row colours are
    /// sampled at pixel centres so that the bottom row sits just above
    /// offset 0.
    pub fn render_band(&self, width: u32, canvas_height: u32) -> RgbaImage {
        let band_height = self.height.min(canvas_height);
        let top = canvas_height - band_height;
        let mut band = RgbaImage::new(width, band_height);

        for row in 0..band_height {
            let y = top + row;
            let t = (canvas_height as f32 - (y as f32 + 0.5)) / self.height as f32;
            let pixel = to_rgba8(self.sample(t));
            for x in 0..width {
                band.put_pixel(x, row, pixel);
            }
        }

        band
    }
}

fn stop_color(stop: &GradientStop) -> (f32, LinSrgba) {
    let [r, g, b] = stop.color;
    (
        stop.offset,
        Srgba::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            stop.alpha.clamp(0.0, 1.0),
        )
        .into_linear(),
    )
}

fn to_rgba8(color: LinSrgba) -> Rgba<u8> {
    let color: Srgba = Srgba::from_linear(color);
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([
        channel(color.red),
        channel(color.green),
        channel(color.blue),
        channel(color.alpha),
    ])
}

// ============================================================================
// ScrimLayer
// ============================================================================

/// Alpha-blends the gradient band over the bottom of the canvas.
#[derive(Debug, Clone)]
pub struct ScrimLayer {
    pub gradient: GradientSpec,
}

impl ScrimLayer {
    pub fn new(settings: &GradientSettings) -> Self {
        Self {
            gradient: GradientSpec::from_settings(settings),
        }
    }
}

impl LayerEffect for ScrimLayer {
    fn transform(&self, ctx: &mut RenderContext) -> ComposeResult<()> {
        let (width, height) = (ctx.canvas.width(), ctx.canvas.height());
        let band = self.gradient.render_band(width, height);
        let top = height - band.height();
        composite_over(&mut ctx.canvas.data, &band, 0, top as i32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SourceImage;

    fn three_stop() -> GradientSettings {
        GradientSettings {
            height: 200,
            stops: vec![
                GradientStop::white(0.0, 0.95),
                GradientStop::white(0.7, 0.7),
                GradientStop::white(1.0, 0.0),
            ],
        }
    }

    #[test]
    fn sample_hits_stops_exactly() {
        let gradient = GradientSpec::from_settings(&three_stop());
        assert!((gradient.sample(0.0).alpha - 0.95).abs() < 1e-6);
        assert!((gradient.sample(0.7).alpha - 0.7).abs() < 1e-6);
        assert!((gradient.sample(1.0).alpha - 0.0).abs() < 1e-6);
    }

    #[test]
    fn sample_interpolates_between_stops() {
        let gradient = GradientSpec::from_settings(&GradientSettings::default());
        assert!((gradient.sample(0.25).alpha - 0.75).abs() < 1e-5);
        assert!((gradient.sample(0.5).red - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sample_clamps_outside_range() {
        let gradient = GradientSpec::from_settings(&GradientSettings::default());
        assert_eq!(gradient.sample(-1.0), gradient.sample(0.0));
        assert_eq!(gradient.sample(2.0), gradient.sample(1.0));
    }

    #[test]
    fn unsorted_stops_are_ordered() {
        let settings = GradientSettings {
            height: 100,
            stops: vec![GradientStop::white(1.0, 0.0), GradientStop::white(0.0, 1.0)],
        };
        let gradient = GradientSpec::from_settings(&settings);
        assert!((gradient.sample(0.0).alpha - 1.0).abs() < 1e-6);
    }

    #[test]
    fn band_is_full_width_and_fades_upward() {
        let gradient = GradientSpec::from_settings(&GradientSettings::default());
        let band = gradient.render_band(80, 600);

        assert_eq!((band.width(), band.height()), (80, 250));
        let bottom = band.get_pixel(0, band.height() - 1)[3];
        let top = band.get_pixel(0, 0)[3];
        assert!(bottom > top, "bottom alpha {bottom} should exceed top alpha {top}");
        assert!(bottom >= 254);
        assert!(top <= 1);
        assert_eq!(band.get_pixel(0, 100), band.get_pixel(79, 100));
    }

    #[test]
    fn band_is_clipped_to_short_images() {
        let gradient = GradientSpec::from_settings(&GradientSettings::default());
        let band = gradient.render_band(10, 100);
        assert_eq!(band.height(), 100);
        // The top row of a short image is still partway down the fade.
        assert!(band.get_pixel(0, 0)[3] > 100);
    }

    #[test]
    fn scrim_brightens_bottom_only() {
        let base = RgbaImage::from_pixel(50, 400, Rgba([20, 20, 20, 255]));
        let mut ctx = RenderContext::new(SourceImage::from_rgba(base).into_canvas());

        ScrimLayer::new(&GradientSettings::default())
            .apply(&mut ctx)
            .unwrap();

        let data = &ctx.canvas.data;
        assert_eq!(data.get_pixel(25, 100).0, [20, 20, 20, 255], "above the band");
        assert!(data.get_pixel(25, 399)[0] > 250, "bottom row is near white");
        assert!(data.get_pixel(25, 399)[0] > data.get_pixel(25, 200)[0]);
        assert_eq!(data.get_pixel(25, 399)[3], 255, "blending keeps the base opaque");
    }
}
