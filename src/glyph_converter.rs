//! Glyph substitution maps derived from the layout tables.
//!
//! A converter is built once from a decoded `GSUB` (or `mort`) table and holds no reference to
//! it afterwards.

use rustc_hash::FxHashMap;

use crate::gsub::{GsubTable, LigatureSubstitution, SingleSubstitution};
use crate::tables::mort::MortTable;
use crate::tag;

/// Maps a glyph to a single replacement glyph.
///
/// Glyphs without a replacement convert to themselves.
#[derive(Debug, Clone, Default)]
pub struct SingleGlyphConverter {
    substitutions: FxHashMap<u16, u16>,
}

impl SingleGlyphConverter {
    pub fn new() -> Self {
        SingleGlyphConverter::default()
    }

    /// Build the vertical alternates map of a font.
    ///
    /// The `vert` feature of the `kana` script is used, preceded by `vrt2` when `advanced` is set.
    /// When the font has no `GSUB` table, or neither feature is found, the first vertical
    /// substitution subtable of the `mort` table is used instead.
    pub fn vertical(
        gsub: Option<&GsubTable>,
        mort: Option<&MortTable>,
        advanced: bool,
    ) -> SingleGlyphConverter {
        let features: &[(u32, u32)] = if advanced {
            &[(tag::KANA, tag::VRT2), (tag::KANA, tag::VERT)]
        } else {
            &[(tag::KANA, tag::VERT)]
        };

        let mut converter = SingleGlyphConverter::new();
        match gsub.and_then(|gsub| gsub.first_feature_lookups(features)) {
            Some(lookups) => {
                for lookup in lookups {
                    converter.extend(&lookup.subtables.single);
                }
            }
            None => {
                if let Some(substitutions) = mort.and_then(MortTable::vertical_substitutions) {
                    converter.extend(substitutions);
                }
            }
        }
        converter
    }

    /// Map `glyph` to `substitute_glyph`, replacing any earlier mapping of `glyph`.
    pub fn insert(&mut self, glyph: u16, substitute_glyph: u16) {
        self.substitutions.insert(glyph, substitute_glyph);
    }

    fn extend(&mut self, substitutions: &[SingleSubstitution]) {
        for substitution in substitutions {
            self.insert(substitution.glyph, substitution.substitute_glyph);
        }
    }

    pub fn can_convert(&self, glyph: u16) -> bool {
        self.substitutions.contains_key(&glyph)
    }

    /// The replacement for `glyph`, or `glyph` itself when there is none.
    pub fn convert(&self, glyph: u16) -> u16 {
        self.substitutions.get(&glyph).copied().unwrap_or(glyph)
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Maps sequences of glyphs to ligature glyphs.
///
/// To find the ligature starting at a glyph, take `ligature_max_length` glyphs from the run and
/// test them with `can_convert`, dropping the last glyph on each failure. A run shortened to one
/// glyph has no ligature.
#[derive(Debug, Clone, Default)]
pub struct LigatureGlyphConverter {
    ligatures: FxHashMap<Vec<u16>, u16>,
    max_lengths: FxHashMap<u16, usize>,
}

impl LigatureGlyphConverter {
    pub fn new() -> Self {
        LigatureGlyphConverter::default()
    }

    /// Collect the ligatures of the `liga` feature, from the `kana` script or failing that the
    /// `latn` script.
    pub fn from_gsub(gsub: &GsubTable) -> LigatureGlyphConverter {
        let mut converter = LigatureGlyphConverter::new();
        if let Some(lookups) =
            gsub.first_feature_lookups(&[(tag::KANA, tag::LIGA), (tag::LATN, tag::LIGA)])
        {
            for lookup in lookups {
                for ligature in &lookup.subtables.ligature {
                    converter.add(ligature);
                }
            }
        }
        converter
    }

    /// Register a ligature. A sequence that is already known maps to the new ligature glyph.
    pub fn add(&mut self, ligature: &LigatureSubstitution) {
        let components = &ligature.component_glyphs;
        let Some(&first) = components.first() else {
            return;
        };
        let max_length = self.max_lengths.entry(first).or_insert(0);
        *max_length = (*max_length).max(components.len());
        self.ligatures
            .insert(components.clone(), ligature.ligature_glyph);
    }

    /// Whether any ligature starts with `glyph`.
    pub fn has_ligature(&self, glyph: u16) -> bool {
        self.max_lengths.contains_key(&glyph)
    }

    /// Length of the longest ligature starting with `glyph`, 1 when there is none.
    pub fn ligature_max_length(&self, glyph: u16) -> usize {
        self.max_lengths.get(&glyph).copied().unwrap_or(1)
    }

    pub fn can_convert(&self, glyphs: &[u16]) -> bool {
        self.ligatures.contains_key(glyphs)
    }

    pub fn convert(&self, glyphs: &[u16]) -> Option<u16> {
        self.ligatures.get(glyphs).copied()
    }

    pub fn len(&self) -> usize {
        self.ligatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ligatures.is_empty()
    }
}
