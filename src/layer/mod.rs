//! Layer infrastructure for caption compositing.
//!
//! Each layer draws one stage of the output onto the canvas carried by a
//! [`RenderContext`]. Layers run in a fixed order and may emit typed
//! properties (the computed [`TextLayout`](crate::TextLayout), the
//! [`LogoPlacement`]) for callers to inspect after the render.
//!
//! # Pipeline
//!
//! ```text
//! Source image (drawn at 0,0)
//!     │
//!     ▼
//! ┌─────────┐
//! │  Scrim  │ ◄── white gradient over the bottom band
//! └────┬────┘
//!      │
//!      ▼
//! ┌─────────┐
//! │  Logo   │ ◄── optional, bottom-right inset; emits LogoPlacement
//! └────┬────┘
//!      │
//!      ▼
//! ┌─────────┐
//! │ Caption │ ◄── wrapped lines from the bottom up; emits TextLayout
//! └─────────┘
//! ```

pub mod caption;
pub mod logo;
pub mod scrim;
pub mod svg;

pub use caption::CaptionLayer;
pub use logo::{fit_within, LogoLayer, LogoPlacement};
pub use scrim::{GradientSpec, ScrimLayer};

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::error::ComposeResult;
use crate::surface::Canvas;

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the rendering pipeline.
///
/// Holds the canvas being drawn on and a typed property bag that layers
/// write to in [`LayerEffect::emit`].
///
/// # Example
///
/// ```ignore
/// // A layer emits a property
/// ctx.set(LogoPlacement { x: 620, y: 520, width: 150, height: 50 });
///
/// // The caller reads it back after the render
/// if let Some(placement) = ctx.get::<LogoPlacement>() {
///     // Use the placement...
/// }
/// ```
pub struct RenderContext {
    /// The canvas being processed through the pipeline.
    pub canvas: Canvas,

    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RenderContext {
    /// Creates a new render context around the given canvas.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            properties: HashMap::new(),
        }
    }

    /// Sets a typed property.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a typed property set by a layer.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    /// Removes and returns a typed property.
    pub fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.properties
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if a property has been set.
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }
}

// ============================================================================
// Layer Trait
// ============================================================================

/// A single drawing stage.
///
/// [`transform`](Self::transform) draws onto `ctx.canvas`;
/// [`emit`](Self::emit) publishes whatever the stage computed. Keeping the
/// two apart gives property emission one canonical place.
pub trait LayerEffect {
    /// Draws this layer onto the canvas in the render context.
    fn transform(&self, ctx: &mut RenderContext) -> ComposeResult<()>;

    /// Emits properties for callers. Called after a successful transform.
    fn emit(&self, _ctx: &mut RenderContext) {}

    /// Runs [`transform`](Self::transform) then [`emit`](Self::emit).
    fn apply(&self, ctx: &mut RenderContext) -> ComposeResult<()> {
        self.transform(ctx)?;
        self.emit(ctx);
        Ok(())
    }
}

// ============================================================================
// Layer Pipeline
// ============================================================================

/// The ordered layers of one render.
///
/// Built per request; borrows the shared profile and font library.
pub struct LayerPipeline<'a> {
    /// Bottom gradient.
    pub scrim: ScrimLayer,

    /// Logo in the bottom-right corner, if one was fetched.
    pub logo: Option<LogoLayer<'a>>,

    /// Caption text, drawn last so it sits above the scrim and logo.
    pub caption: CaptionLayer<'a>,
}

impl LayerPipeline<'_> {
    /// Applies every layer in order. The first error aborts the render.
    pub fn render(&self, ctx: &mut RenderContext) -> ComposeResult<()> {
        self.scrim.apply(ctx)?;
        if let Some(logo) = &self.logo {
            logo.apply(ctx)?;
        }
        self.caption.apply(ctx)
    }
}
