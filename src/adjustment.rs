//! Positioning adjustments derived from the `GPOS` table, expressed in ems.

use rustc_hash::FxHashMap;

use crate::gpos::{GposTable, PairAdjustment, SingleAdjustment};
use crate::layout::ValueRecord;
use crate::tag;

/// Adjustment of a glyph relative to the em square.
///
/// X is positive to the right and Y positive upwards. Drawing at 10mm, an `x_placement` of -0.1
/// shifts the glyph 1mm left and an `x_advance` of -0.2 narrows its advance by 2mm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionInfo {
    pub x_placement: f64,
    pub y_placement: f64,
    pub x_advance: f64,
    pub y_advance: f64,
}

impl PositionInfo {
    pub fn from_value_record(value_record: &ValueRecord, units_per_em: u16) -> PositionInfo {
        let units_per_em = f64::from(units_per_em);
        PositionInfo {
            x_placement: f64::from(value_record.x_placement) / units_per_em,
            y_placement: f64::from(value_record.y_placement) / units_per_em,
            x_advance: f64::from(value_record.x_advance) / units_per_em,
            y_advance: f64::from(value_record.y_advance) / units_per_em,
        }
    }
}

/// Per-glyph adjustments, such as proportional or half-width metrics.
#[derive(Debug, Clone, Default)]
pub struct SingleAdjustmentMetrics {
    adjustments: FxHashMap<u16, PositionInfo>,
}

impl SingleAdjustmentMetrics {
    pub fn new() -> Self {
        SingleAdjustmentMetrics::default()
    }

    /// Collect the single adjustments of `feature_tag` in the `kana` script.
    pub fn from_gpos(
        gpos: &GposTable,
        feature_tag: u32,
        units_per_em: u16,
    ) -> SingleAdjustmentMetrics {
        let mut metrics = SingleAdjustmentMetrics::new();
        if let Some(lookups) = gpos.first_feature_lookups(&[(tag::KANA, feature_tag)]) {
            for lookup in lookups {
                for adjustment in &lookup.subtables.single {
                    metrics.add(adjustment, units_per_em);
                }
            }
        }
        metrics
    }

    /// Record an adjustment, replacing any earlier one for the same glyph.
    pub fn add(&mut self, adjustment: &SingleAdjustment, units_per_em: u16) {
        self.adjustments.insert(
            adjustment.glyph,
            PositionInfo::from_value_record(&adjustment.value_record, units_per_em),
        );
    }

    pub fn has_adjustment(&self, glyph: u16) -> bool {
        self.adjustments.contains_key(&glyph)
    }

    /// The adjustment for `glyph`, all zero when there is none.
    pub fn adjustment(&self, glyph: u16) -> PositionInfo {
        self.adjustments.get(&glyph).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }
}

/// Adjustments applied to pairs of adjacent glyphs, such as kerning.
#[derive(Debug, Clone, Default)]
pub struct PairAdjustmentMetrics {
    adjustments: FxHashMap<(u16, u16), (PositionInfo, PositionInfo)>,
}

impl PairAdjustmentMetrics {
    pub fn new() -> Self {
        PairAdjustmentMetrics::default()
    }

    /// Collect the pair adjustments of the `kern` feature, from the `kana` script or failing that
    /// the `latn` script.
    pub fn from_gpos(gpos: &GposTable, units_per_em: u16) -> PairAdjustmentMetrics {
        let mut metrics = PairAdjustmentMetrics::new();
        if let Some(lookups) =
            gpos.first_feature_lookups(&[(tag::KANA, tag::KERN), (tag::LATN, tag::KERN)])
        {
            for lookup in lookups {
                for adjustment in &lookup.subtables.pair {
                    metrics.add(adjustment, units_per_em);
                }
            }
        }
        metrics
    }

    /// Record an adjustment, replacing any earlier one for the same pair.
    pub fn add(&mut self, adjustment: &PairAdjustment, units_per_em: u16) {
        self.adjustments.insert(
            (adjustment.first_glyph, adjustment.second_glyph),
            (
                PositionInfo::from_value_record(&adjustment.first_value_record, units_per_em),
                PositionInfo::from_value_record(&adjustment.second_value_record, units_per_em),
            ),
        );
    }

    pub fn has_adjustment(&self, first_glyph: u16, second_glyph: u16) -> bool {
        self.adjustments.contains_key(&(first_glyph, second_glyph))
    }

    /// The adjustment of the first glyph of the pair, all zero when there is none.
    pub fn first_adjustment(&self, first_glyph: u16, second_glyph: u16) -> PositionInfo {
        self.adjustments
            .get(&(first_glyph, second_glyph))
            .map(|&(first, _)| first)
            .unwrap_or_default()
    }

    /// The adjustment of the second glyph of the pair, all zero when there is none.
    pub fn second_adjustment(&self, first_glyph: u16, second_glyph: u16) -> PositionInfo {
        self.adjustments
            .get(&(first_glyph, second_glyph))
            .map(|&(_, second)| second)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }
}
