//! Fixed lookup tables: colors, gradients and glyphs.
//!
//! The tables are plain immutable values handed to the composer and the
//! signature generator, so alternative palettes can be injected without
//! touching generation code. Every lookup has a defined fallback.

use crate::params::{Emotion, StatisticKind, Subspecialty, TermCategory};
use crate::rarity::RarityTier;
use crate::scene::{Glyph, Gradient, OverlayShape};
use std::collections::BTreeMap;

/// Used when a table has no entry and no fallback entry either.
pub const NEUTRAL: &str = "#9ca3af";

/// Base hue for research constellation nodes (amber).
pub const HUE_RESEARCH: f64 = 42.0;

/// Convert HSL to hex color string.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    // Normalize hue to 0-360
    let h = ((h % 360.0) + 360.0) % 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let r = ((r + m) * 255.0).round() as u8;
    let g = ((g + m) * 255.0).round() as u8;
    let b = ((b + m) * 255.0).round() as u8;

    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub root: String,
    pub trunk: String,
    pub emotions: BTreeMap<Emotion, String>,
    pub statistics: BTreeMap<StatisticKind, String>,
    pub categories: BTreeMap<TermCategory, String>,
    pub gradients: BTreeMap<Subspecialty, Gradient>,
    pub symbols: BTreeMap<Subspecialty, Glyph>,
    pub overlays: BTreeMap<Emotion, OverlayShape>,
    pub overlay_fallback: OverlayShape,
    pub tiers: BTreeMap<RarityTier, String>,
    pub watermark: String,
}

fn table<K: Ord, V>(entries: impl IntoIterator<Item = (K, V)>) -> BTreeMap<K, V> {
    entries.into_iter().collect()
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            root: "#6b4423".to_string(),
            trunk: "#5c3a1e".to_string(),
            emotions: table([
                (Emotion::Hope, "#7ed957".to_string()),
                (Emotion::Confidence, "#3b82f6".to_string()),
                (Emotion::Breakthrough, "#f59e0b".to_string()),
                (Emotion::Healing, "#10b981".to_string()),
                (Emotion::Tension, "#ef4444".to_string()),
                (Emotion::Uncertainty, "#8b5cf6".to_string()),
            ]),
            statistics: table([
                (StatisticKind::PValue, "#e74c3c".to_string()),
                (StatisticKind::ConfidenceInterval, "#3498db".to_string()),
                (StatisticKind::Percentage, "#2ecc71".to_string()),
                (StatisticKind::SampleSize, "#9b59b6".to_string()),
                (StatisticKind::OddsRatio, "#f39c12".to_string()),
                (StatisticKind::Other, "#95a5a6".to_string()),
            ]),
            categories: table([
                (TermCategory::Procedures, "#2563eb".to_string()),
                (TermCategory::Anatomy, "#dc2626".to_string()),
                (TermCategory::Outcomes, "#059669".to_string()),
                (TermCategory::Research, "#7c3aed".to_string()),
            ]),
            gradients: table(
                [
                    (Subspecialty::SportsMedicine, "#1e3a5f", "#0a1628"),
                    (Subspecialty::ShoulderElbow, "#2d1b4e", "#120a24"),
                    (Subspecialty::HandWrist, "#1f3d36", "#0b1a17"),
                    (Subspecialty::HipKnee, "#3d2b1f", "#1a110b"),
                    (Subspecialty::FootAnkle, "#1b3b4e", "#081822"),
                    (Subspecialty::Spine, "#3b1f2b", "#180b11"),
                    (Subspecialty::Trauma, "#4a1c1c", "#1f0909"),
                    (Subspecialty::Pediatrics, "#24414e", "#0e1d24"),
                    (Subspecialty::Oncology, "#2e2e4a", "#10101f"),
                ]
                .map(|(s, center, edge)| {
                    (
                        s,
                        Gradient {
                            center: center.to_string(),
                            edge: edge.to_string(),
                        },
                    )
                }),
            ),
            symbols: table([
                (Subspecialty::SportsMedicine, Glyph::Star),
                (Subspecialty::ShoulderElbow, Glyph::Hexagon),
                (Subspecialty::HandWrist, Glyph::Pentagon),
                (Subspecialty::HipKnee, Glyph::Circle),
                (Subspecialty::FootAnkle, Glyph::Triangle),
                (Subspecialty::Spine, Glyph::Cross),
                (Subspecialty::Trauma, Glyph::Diamond),
                (Subspecialty::Pediatrics, Glyph::Square),
                (Subspecialty::Oncology, Glyph::Octagon),
            ]),
            overlays: table([
                (Emotion::Hope, OverlayShape::Star),
                (Emotion::Confidence, OverlayShape::Square),
                (Emotion::Breakthrough, OverlayShape::Diamond),
                (Emotion::Healing, OverlayShape::Circle),
                (Emotion::Tension, OverlayShape::Triangle),
                (Emotion::Uncertainty, OverlayShape::Hexagon),
            ]),
            overlay_fallback: OverlayShape::Circle,
            tiers: table([
                (RarityTier::Common, "#9e9e9e".to_string()),
                (RarityTier::Uncommon, "#4caf50".to_string()),
                (RarityTier::Rare, "#2196f3".to_string()),
                (RarityTier::Legendary, "#ff9800".to_string()),
            ]),
            watermark: "#ffffff".to_string(),
        }
    }
}

impl Palette {
    pub fn emotion(&self, emotion: Emotion) -> &str {
        self.emotions.get(&emotion).map_or(NEUTRAL, String::as_str)
    }

    pub fn statistic(&self, kind: StatisticKind) -> &str {
        self.statistics
            .get(&kind)
            .or_else(|| self.statistics.get(&StatisticKind::Other))
            .map_or(NEUTRAL, String::as_str)
    }

    pub fn category(&self, category: TermCategory) -> &str {
        self.categories.get(&category).map_or(NEUTRAL, String::as_str)
    }

    /// Background gradient, falling back to the sports-medicine pair.
    pub fn gradient(&self, subspecialty: Subspecialty) -> Gradient {
        self.gradients
            .get(&subspecialty)
            .or_else(|| self.gradients.get(&Subspecialty::SportsMedicine))
            .cloned()
            .unwrap_or_else(|| Gradient {
                center: NEUTRAL.to_string(),
                edge: "#000000".to_string(),
            })
    }

    /// Subspecialty symbol, falling back to the sports-medicine shape.
    pub fn symbol(&self, subspecialty: Subspecialty) -> Glyph {
        self.symbols
            .get(&subspecialty)
            .or_else(|| self.symbols.get(&Subspecialty::SportsMedicine))
            .copied()
            .unwrap_or(Glyph::Star)
    }

    pub fn overlay(&self, emotion: Emotion) -> OverlayShape {
        self.overlays
            .get(&emotion)
            .copied()
            .unwrap_or(self.overlay_fallback)
    }

    pub fn tier(&self, tier: RarityTier) -> &str {
        self.tiers.get(&tier).map_or(NEUTRAL, String::as_str)
    }

    /// Research node color: amber, brighter with impact.
    pub fn research_node(&self, impact: f64) -> String {
        hsl_to_hex(HUE_RESEARCH, 0.9, 0.45 + impact.clamp(0.0, 1.0) * 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_hex(0.0, 1.0, 0.5), "#ff0000");
        assert_eq!(hsl_to_hex(120.0, 1.0, 0.5), "#00ff00");
        assert_eq!(hsl_to_hex(240.0, 1.0, 0.5), "#0000ff");
        assert_eq!(hsl_to_hex(-120.0, 1.0, 0.5), "#0000ff");
        assert_eq!(hsl_to_hex(0.0, 0.0, 1.0), "#ffffff");
    }

    #[test]
    fn default_tables_are_complete() {
        let p = Palette::default();
        assert_eq!(p.emotions.len(), 6);
        assert_eq!(p.gradients.len(), 9);
        assert_eq!(p.symbols.len(), 9);
        assert_eq!(p.overlays.len(), 6);
        assert_eq!(p.tiers.len(), 4);
    }

    #[test]
    fn missing_entries_fall_back() {
        let mut p = Palette::default();
        p.gradients.remove(&Subspecialty::Spine);
        p.symbols.remove(&Subspecialty::Spine);
        p.overlays.remove(&Emotion::Tension);
        p.statistics.remove(&StatisticKind::OddsRatio);

        assert_eq!(
            p.gradient(Subspecialty::Spine),
            p.gradient(Subspecialty::SportsMedicine)
        );
        assert_eq!(p.symbol(Subspecialty::Spine), Glyph::Star);
        assert_eq!(p.overlay(Emotion::Tension), OverlayShape::Circle);
        assert_eq!(p.statistic(StatisticKind::OddsRatio), "#95a5a6");
    }
}
