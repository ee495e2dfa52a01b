//! Font discovery and glyph advance measurement.

use std::sync::Arc;

use resvg::usvg::fontdb::{Database, Family, Query, ID};

use super::TextMeasure;

// ============================================================================
// FontFace
// ============================================================================

/// The face selected for captions.
///
/// Holds a copy of the face data so measurement does not need to go back
/// through the database for every candidate line.
#[derive(Clone)]
pub struct FontFace {
    id: ID,
    family: String,
    data: Arc<[u8]>,
    index: u32,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("index", &self.index)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl FontFace {
    /// Loads the face with the given id out of the database.
    ///
    /// Returns `None` if the id is unknown or its data is not a parseable
    /// OpenType face.
    pub fn load(db: &Database, id: ID) -> Option<Self> {
        let family = db
            .face(id)?
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        let (data, index) = db.with_face_data(id, |data, index| (Arc::<[u8]>::from(data), index))?;
        ttf_parser::Face::parse(&data, index).ok()?;

        Some(Self {
            id,
            family,
            data,
            index,
        })
    }

    pub fn id(&self) -> ID {
        self.id
    }

    /// The family name the face reports for itself.
    pub fn family(&self) -> &str {
        &self.family
    }
}

impl TextMeasure for FontFace {
    /// Sums horizontal advances of each character's glyph.
    ///
    /// Characters the face has no glyph for advance by the `.notdef` glyph.
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = ttf_parser::Face::parse(&self.data, self.index) else {
            return EstimatedMetrics::default().measure(text, font_size);
        };

        let units_per_em = face.units_per_em() as f32;
        let units: u32 = text
            .chars()
            .map(|c| {
                let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
                face.glyph_hor_advance(glyph).unwrap_or(0) as u32
            })
            .sum();

        units as f32 * font_size / units_per_em
    }
}

// ============================================================================
// EstimatedMetrics
// ============================================================================

/// Fixed-ratio width estimate used when no font face is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedMetrics {
    /// Advance of every character as a fraction of the font size.
    pub em_ratio: f32,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self { em_ratio: 0.55 }
    }
}

impl TextMeasure for EstimatedMetrics {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.em_ratio
    }
}

static ESTIMATED: EstimatedMetrics = EstimatedMetrics { em_ratio: 0.55 };

// ============================================================================
// FontLibrary
// ============================================================================

/// The font database plus the face chosen for captions.
///
/// Built once at startup and shared read-only between requests.
pub struct FontLibrary {
    db: Arc<Database>,
    primary: Option<FontFace>,
}

impl FontLibrary {
    /// Loads system fonts and selects the caption face.
    pub fn system(families: &[String]) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        Self::from_database(db, families)
    }

    /// Selects the caption face from an already populated database.
    pub fn from_database(db: Database, families: &[String]) -> Self {
        let primary = select_face(&db, families).and_then(|id| FontFace::load(&db, id));
        tracing::debug!(
            faces = db.len(),
            family = primary.as_ref().map(FontFace::family),
            "font library ready"
        );
        Self {
            db: Arc::new(db),
            primary,
        }
    }

    /// A library with no faces at all.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(Database::new()),
            primary: None,
        }
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    /// The caption face, if the environment has any font.
    pub fn primary(&self) -> Option<&FontFace> {
        self.primary.as_ref()
    }

    /// The measurer layout should use.
    pub fn measurer(&self) -> &dyn TextMeasure {
        match &self.primary {
            Some(face) => face as &dyn TextMeasure,
            None => &ESTIMATED,
        }
    }
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("faces", &self.db.len())
            .field("primary", &self.primary)
            .finish()
    }
}

/// Picks the first available face from the priority list.
///
/// Falls back to the generic sans-serif family, then to any face at all.
fn select_face(db: &Database, families: &[String]) -> Option<ID> {
    let by_name = families.iter().find_map(|name| {
        db.query(&Query {
            families: &[Family::Name(name)],
            ..Query::default()
        })
    });

    by_name
        .or_else(|| {
            db.query(&Query {
                families: &[Family::SansSerif],
                ..Query::default()
            })
        })
        .or_else(|| db.faces().next().map(|face| face.id))
}
