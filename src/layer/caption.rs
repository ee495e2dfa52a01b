//! Caption layer: wrap the caption and draw it bottom-up.

use std::cell::OnceCell;
use std::fmt::Write as _;

use resvg::usvg::{FontResolver, Options};

use super::svg::{composite_over, escape_xml, hex_color, render_svg};
use super::{LayerEffect, RenderContext};
use crate::error::ComposeResult;
use crate::profile::TextSettings;
use crate::text::{FontFace, FontLibrary, TextLayout};

// ============================================================================
// CaptionLayer
// ============================================================================

/// Draws the caption as wrapped lines anchored to the bottom-left.
///
/// Layout measures with the library's primary face; rasterisation goes
/// through usvg with the font resolver pinned to that same face. Wrapping
/// sums unkerned advances while usvg applies kerning, so a drawn line can
/// differ from its measured width by a few pixels. Glyphs the face lacks
/// fall back to other installed faces.
///
/// The layout is computed once per layer and reused by drawing and
/// emission.
///
/// # Emitted Properties
///
/// - [`TextLayout`]: the wrapped lines and their baselines.
pub struct CaptionLayer<'a> {
    pub text: &'a str,
    pub settings: &'a TextSettings,
    pub fonts: &'a FontLibrary,
    layout: OnceCell<TextLayout>,
}

impl<'a> CaptionLayer<'a> {
    pub fn new(text: &'a str, settings: &'a TextSettings, fonts: &'a FontLibrary) -> Self {
        Self {
            text,
            settings,
            fonts,
            layout: OnceCell::new(),
        }
    }

    /// Lays the caption out for a canvas of the given size.
    ///
    /// The first call fixes the layout; the canvas never changes size
    /// within a render.
    pub fn layout(&self, width: u32, height: u32) -> &TextLayout {
        self.layout.get_or_init(|| {
            TextLayout::compute(
                self.text,
                width,
                height,
                self.settings,
                self.fonts.measurer(),
            )
        })
    }

    /// Builds the SVG document that draws `layout`.
    fn build_svg(&self, layout: &TextLayout, face: &FontFace, width: u32, height: u32) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let family = escape_xml(face.family());
        let fill = hex_color(self.settings.color);

        for (x, y, line) in layout.placements() {
            if line.is_empty() {
                continue;
            }
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" fill="{fill}" dominant-baseline="text-after-edge">{text}</text>"#,
                size = layout.font_size,
                text = escape_xml(line),
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

impl LayerEffect for CaptionLayer<'_> {
    fn transform(&self, ctx: &mut RenderContext) -> ComposeResult<()> {
        let (width, height) = (ctx.canvas.width(), ctx.canvas.height());
        let layout = self.layout(width, height);
        if layout.is_blank() {
            return Ok(());
        }

        let Some(face) = self.fonts.primary() else {
            tracing::warn!(
                lines = layout.lines.len(),
                "no font face available; caption not drawn"
            );
            return Ok(());
        };

        let svg = self.build_svg(layout, face, width, height);
        let face_id = face.id();
        let options = Options {
            fontdb: self.fonts.database(),
            font_resolver: FontResolver {
                select_font: Box::new(move |_, _| Some(face_id)),
                select_fallback: FontResolver::default_fallback_selector(),
            },
            ..Options::default()
        };

        let text_image = render_svg(&svg, width, height, &options)?;
        composite_over(&mut ctx.canvas.data, &text_image, 0, 0);
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext) {
        let layout = self.layout(ctx.canvas.width(), ctx.canvas.height());
        tracing::debug!(
            font_size = layout.font_size,
            lines = layout.lines.len(),
            "caption laid out"
        );
        ctx.set(layout.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SourceImage;
    use image::{Rgba, RgbaImage};

    fn context(width: u32, height: u32) -> RenderContext {
        let base = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        RenderContext::new(SourceImage::from_rgba(base).into_canvas())
    }

    #[test]
    fn emits_layout_without_fonts() {
        let settings = TextSettings::default();
        let fonts = FontLibrary::empty();
        let mut ctx = context(800, 600);

        CaptionLayer::new("Hello World", &settings, &fonts)
            .apply(&mut ctx)
            .unwrap();

        let layout = ctx.get::<TextLayout>().unwrap();
        assert_eq!(layout.lines, vec!["Hello World"]);
        assert_eq!(layout.bottom_baseline, 550.0);
        // Nothing drawn without a face.
        assert!(ctx.canvas.data.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn layout_is_computed_once_and_emitted() {
        let settings = TextSettings::default();
        let fonts = FontLibrary::empty();
        let layer = CaptionLayer::new("Hello World", &settings, &fonts);

        let first: *const TextLayout = layer.layout(800, 600);
        let second: *const TextLayout = layer.layout(800, 600);
        assert_eq!(first, second);

        let mut ctx = context(800, 600);
        layer.apply(&mut ctx).unwrap();
        assert_eq!(ctx.get::<TextLayout>(), Some(layer.layout(800, 600)));
    }

    #[test]
    fn blank_caption_draws_nothing() {
        let settings = TextSettings::default();
        let fonts = FontLibrary::system(&settings.font_families);
        let mut ctx = context(300, 200);

        CaptionLayer::new("  \n ", &settings, &fonts)
            .apply(&mut ctx)
            .unwrap();

        assert!(ctx.get::<TextLayout>().unwrap().is_blank());
        assert!(ctx.canvas.data.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn caption_ink_lands_above_bottom_margin() {
        let settings = TextSettings::default();
        let fonts = FontLibrary::system(&settings.font_families);
        // Environments without fonts cannot draw.
        if fonts.primary().is_none() {
            return;
        }
        let mut ctx = context(800, 600);

        CaptionLayer::new("Hello World", &settings, &fonts)
            .apply(&mut ctx)
            .unwrap();

        let dark = |x: u32, y: u32| ctx.canvas.data.get_pixel(x, y)[0] < 128;
        let inked_rows: Vec<u32> = (0..600)
            .filter(|&y| (0..800).any(|x| dark(x, y)))
            .collect();

        assert!(!inked_rows.is_empty(), "caption should leave ink");
        assert!(*inked_rows.last().unwrap() <= 552, "ink sits on the bottom row baseline");
        assert!(*inked_rows.first().unwrap() >= 550 - 60, "single line of text");
        assert!((0..600).all(|y| !dark(49, y)), "nothing left of the margin");
    }

    #[test]
    fn svg_escapes_caption_markup() {
        let settings = TextSettings::default();
        let fonts = FontLibrary::system(&settings.font_families);
        let Some(face) = fonts.primary() else {
            return;
        };
        let layer = CaptionLayer::new("<b>&</b>", &settings, &fonts);
        let layout = layer.layout(800, 600);

        let svg = layer.build_svg(layout, face, 800, 600);
        assert!(svg.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert!(svg.contains(r#"y="550""#));
        assert!(svg.contains(r##"fill="#000000""##));
    }
}
