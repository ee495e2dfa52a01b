//! Captioning engine: one request in, one JPEG out.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{ComposeError, ComposeResult};
use crate::fetch::LogoFetcher;
use crate::layer::{
    CaptionLayer, LayerPipeline, LogoLayer, LogoPlacement, RenderContext, ScrimLayer,
};
use crate::profile::StyleProfile;
use crate::surface::{LogoAsset, SizePx, SourceImage};
use crate::text::{FontLibrary, TextLayout};

/// Caption used when the request supplies none.
pub const DEFAULT_CAPTION: &str = "Default Text";

// ============================================================================
// Requests and Outputs
// ============================================================================

/// Everything one render needs from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Raw bytes of the uploaded image.
    pub image: Vec<u8>,

    pub caption: String,

    /// Absolute HTTP(S) URL of a logo to composite.
    pub logo_url: Option<String>,
}

impl RenderRequest {
    /// A request with the default caption and no logo.
    pub fn new(image: impl Into<Vec<u8>>) -> Self {
        Self {
            image: image.into(),
            caption: DEFAULT_CAPTION.to_string(),
            logo_url: None,
        }
    }

    /// Sets the caption. An empty caption keeps the default.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        let caption = caption.into();
        if !caption.is_empty() {
            self.caption = caption;
        }
        self
    }

    /// Sets the logo URL. An empty URL means no logo.
    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.logo_url = (!url.is_empty()).then_some(url);
        self
    }
}

/// The encoded result plus what the layers computed along the way.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub jpeg: Vec<u8>,
    pub size: SizePx,
    pub layout: TextLayout,

    /// `None` when no logo was requested or the fetch failed.
    pub logo: Option<LogoPlacement>,
}

// ============================================================================
// Compositor
// ============================================================================

/// The captioning engine.
///
/// Holds only read-only state (style profile, font library, HTTP client), so
/// a single instance is cloned into every request handler and renders run
/// fully in parallel.
///
/// # Pipeline
///
/// 1. Decode the upload and draw it onto a canvas
/// 2. **Scrim** - white gradient over the bottom band
/// 3. **Logo** - fetched, fitted and placed bottom-right, if requested
/// 4. **Caption** - wrapped lines drawn bottom-up
/// 5. Encode the canvas as JPEG
#[derive(Debug, Clone)]
pub struct Compositor {
    profile: Arc<StyleProfile>,
    fonts: Arc<FontLibrary>,
    fetcher: LogoFetcher,
}

impl Compositor {
    pub fn new(profile: StyleProfile, fonts: FontLibrary, fetcher: LogoFetcher) -> Self {
        Self {
            profile: Arc::new(profile),
            fonts: Arc::new(fonts),
            fetcher,
        }
    }

    pub fn profile(&self) -> &StyleProfile {
        &self.profile
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Renders a request end to end.
    ///
    /// The logo fetch is the only await point; the pixel work after it runs
    /// on the blocking thread pool.
    #[instrument(
        level = "info",
        skip_all,
        fields(bytes = request.image.len(), logo = request.logo_url.is_some())
    )]
    pub async fn render(&self, request: RenderRequest) -> ComposeResult<RenderOutput> {
        let source = SourceImage::decode(&request.image)?;
        debug!(width = source.width(), height = source.height(), "image decoded");

        let logo = match request.logo_url.as_deref() {
            Some(url) => self.fetcher.fetch(url).await,
            None => None,
        };

        let compositor = self.clone();
        tokio::task::spawn_blocking(move || compositor.compose(source, &request.caption, logo))
            .await
            .map_err(|e| ComposeError::Task(e.to_string()))?
    }

    /// Runs the layer pipeline over an already decoded image.
    pub fn compose(
        &self,
        source: SourceImage,
        caption: &str,
        logo: Option<LogoAsset>,
    ) -> ComposeResult<RenderOutput> {
        let mut ctx = RenderContext::new(source.into_canvas());

        let pipeline = LayerPipeline {
            scrim: ScrimLayer::new(&self.profile.gradient),
            logo: logo.map(|asset| LogoLayer::new(asset, &self.profile.logo)),
            caption: CaptionLayer::new(caption, &self.profile.text, &self.fonts),
        };
        pipeline.render(&mut ctx)?;

        let jpeg = ctx.canvas.encode_jpeg(self.profile.jpeg_quality)?;
        let size = ctx.canvas.dimensions();
        let logo = ctx.take::<LogoPlacement>();
        let layout = pipeline.caption.layout(size.width, size.height).clone();

        Ok(RenderOutput {
            jpeg,
            size,
            layout,
            logo,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
