//! Pattern metrics computed from a composed scene.
//!
//! Everything here is a pure function of the scene. Signature marks are
//! ignored, so the metrics are the same before and after the signature is
//! attached, and degenerate scenes yield fixed defaults instead of errors.

use crate::scene::{ClusterShape, ElementKind, Scene, VisualElement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendered primitive an element is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Path,
    Polygon,
    Network,
    Circle,
    Ellipse,
    Glyph,
}

impl Shape {
    pub fn of(element: &VisualElement) -> Shape {
        match element {
            VisualElement::Root(_)
            | VisualElement::Trunk(_)
            | VisualElement::Branch(_)
            | VisualElement::DataStream(_) => Shape::Path,
            VisualElement::MedicalCluster(c) => match c.shape {
                ClusterShape::Polygon { .. } => Shape::Polygon,
                ClusterShape::Network { .. } => Shape::Network,
            },
            VisualElement::ResearchNode(_) | VisualElement::SignatureMark(_) => Shape::Circle,
            VisualElement::EmotionalField(_) => Shape::Ellipse,
            VisualElement::SubspecialtySymbol(_) => Shape::Glyph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScheme {
    Monochromatic,
    Analogous,
    Triadic,
    Polychromatic,
}

impl ColorScheme {
    pub fn from_distinct(colors: usize) -> Self {
        match colors {
            0..=3 => ColorScheme::Monochromatic,
            4..=5 => ColorScheme::Analogous,
            6..=8 => ColorScheme::Triadic,
            _ => ColorScheme::Polychromatic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDistribution {
    pub left_count: usize,
    pub right_count: usize,
    pub balance_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionBalance {
    pub horizontal: f64,
    pub vertical: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationComplexity {
    pub count: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMetadata {
    pub tree_complexity: usize,
    pub branch_distribution: BranchDistribution,
    pub color_scheme: ColorScheme,
    pub color_harmony: f64,
    pub composition_balance: CompositionBalance,
    pub dominant_shapes: BTreeMap<Shape, usize>,
    pub pattern_complexity: f64,
    pub organic_ratio: f64,
    pub animation_complexity: AnimationComplexity,
    pub element_count: usize,
    pub distinct_colors: usize,
}

/// Computes [`PatternMetadata`] for a scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn analyze(&self, scene: &Scene) -> PatternMetadata {
        let elements: Vec<&VisualElement> = scene
            .elements
            .iter()
            .filter(|e| e.kind() != ElementKind::SignatureMark)
            .collect();
        let total = elements.len();

        let mut kinds: BTreeMap<ElementKind, usize> = BTreeMap::new();
        let mut shapes: BTreeMap<Shape, usize> = BTreeMap::new();
        let mut colors: BTreeMap<String, usize> = BTreeMap::new();
        let mut animated = 0;
        for element in &elements {
            *kinds.entry(element.kind()).or_default() += 1;
            *shapes.entry(Shape::of(element)).or_default() += 1;
            *colors
                .entry(element.style().color.to_ascii_lowercase())
                .or_default() += 1;
            if element.style().animation.is_some() {
                animated += 1;
            }
        }
        let count = |kind| kinds.get(&kind).copied().unwrap_or(0);

        let distinct_colors = colors.len();
        let color_harmony = match colors.values().max() {
            Some(&max) if total > 0 => max as f64 / total as f64,
            _ => 0.0,
        };

        let organic =
            count(ElementKind::Root) + count(ElementKind::Branch) + count(ElementKind::EmotionalField);
        let geometric = count(ElementKind::Trunk) + count(ElementKind::ResearchNode);
        let organic_ratio = if organic + geometric == 0 {
            0.0
        } else {
            organic as f64 / (organic + geometric) as f64
        };

        let metadata = PatternMetadata {
            tree_complexity: count(ElementKind::Root) + count(ElementKind::Branch),
            branch_distribution: branch_distribution(&elements),
            color_scheme: ColorScheme::from_distinct(distinct_colors),
            color_harmony,
            composition_balance: composition_balance(scene, &elements),
            dominant_shapes: shapes,
            pattern_complexity: pattern_complexity(kinds.len(), total),
            organic_ratio,
            animation_complexity: AnimationComplexity {
                count: animated,
                ratio: if total == 0 {
                    0.0
                } else {
                    animated as f64 / total as f64
                },
            },
            element_count: total,
            distinct_colors,
        };
        tracing::debug!(
            elements = total,
            colors = distinct_colors,
            complexity = metadata.pattern_complexity,
            "scene analyzed"
        );
        metadata
    }
}

/// `distinct types / sqrt(total / distinct types)`.
pub fn pattern_complexity(types: usize, total: usize) -> f64 {
    if types == 0 || total == 0 {
        return 0.0;
    }
    let types = types as f64;
    types / (total as f64 / types).sqrt()
}

/// Branches pointing into (90°, 270°) lean left, everything else right.
fn branch_distribution(elements: &[&VisualElement]) -> BranchDistribution {
    let (mut left, mut right) = (0, 0);
    for element in elements {
        if let VisualElement::Branch(branch) = element {
            let angle = branch.path.angle.rem_euclid(360.0);
            if angle > 90.0 && angle < 270.0 {
                left += 1;
            } else {
                right += 1;
            }
        }
    }
    BranchDistribution {
        left_count: left,
        right_count: right,
        balance_ratio: right as f64 / left.max(1) as f64,
    }
}

/// `1 − |a − b| / (a + b)`, or 1 for an empty axis.
fn axis_balance(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum <= 0.0 || !sum.is_finite() {
        return 1.0;
    }
    (1.0 - (a - b).abs() / sum).clamp(0.0, 1.0)
}

/// Area-weighted balance around the canvas center. Elements sitting exactly
/// on an axis count half to each side.
fn composition_balance(scene: &Scene, elements: &[&VisualElement]) -> CompositionBalance {
    let center = scene.center();
    let (mut left, mut right, mut top, mut bottom) = (0.0, 0.0, 0.0, 0.0);

    for element in elements {
        let area = element.area();
        if !area.is_finite() || area <= 0.0 {
            continue;
        }
        let anchor = element.anchor();
        split(anchor.x - center.x, area, &mut left, &mut right);
        split(anchor.y - center.y, area, &mut top, &mut bottom);
    }

    let horizontal = axis_balance(left, right);
    let vertical = axis_balance(top, bottom);
    CompositionBalance {
        horizontal,
        vertical,
        overall: (horizontal + vertical) / 2.0,
    }
}

fn split(offset: f64, area: f64, before: &mut f64, after: &mut f64) {
    const EPSILON: f64 = 1e-9;
    if offset < -EPSILON {
        *before += area;
    } else if offset > EPSILON {
        *after += area;
    } else {
        *before += area / 2.0;
        *after += area / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SceneComposer;
    use crate::params::{GenerationParameters, TermCategory, TermStat};
    use crate::scene::{Gradient, Mark, MarkKind, Point, Style};

    fn empty_scene() -> Scene {
        Scene::new(
            400.0,
            400.0,
            Gradient {
                center: "#000000".into(),
                edge: "#000000".into(),
            },
        )
    }

    fn with_categories(n: usize) -> Scene {
        let mut p = GenerationParameters::default();
        for category in TermCategory::ALL.into_iter().take(n) {
            p.medical_terms
                .entry(category)
                .or_default()
                .insert("term".into(), TermStat { count: 2, weight: 2.0 });
        }
        SceneComposer::default().compose(&p, 5).scene
    }

    #[test]
    fn empty_scene_has_defined_defaults() {
        let m = PatternAnalyzer.analyze(&empty_scene());
        assert_eq!(m.tree_complexity, 0);
        assert_eq!(m.color_scheme, ColorScheme::Monochromatic);
        assert_eq!(m.color_harmony, 0.0);
        assert_eq!(m.composition_balance.overall, 1.0);
        assert_eq!(m.pattern_complexity, 0.0);
        assert_eq!(m.organic_ratio, 0.0);
        assert_eq!(m.animation_complexity.ratio, 0.0);
        assert_eq!(m.branch_distribution.balance_ratio, 0.0);
    }

    #[test]
    fn symmetric_branches_balance_to_one() {
        for n in [2, 4] {
            let m = PatternAnalyzer.analyze(&with_categories(n));
            assert_eq!(m.branch_distribution.left_count, n / 2);
            assert_eq!(m.branch_distribution.right_count, n / 2);
            assert_eq!(m.branch_distribution.balance_ratio, 1.0);
        }
    }

    #[test]
    fn odd_branch_count_tilts_left() {
        // Leans of -60, -20 and +20 degrees.
        let m = PatternAnalyzer.analyze(&with_categories(3));
        assert_eq!(m.branch_distribution.left_count, 2);
        assert_eq!(m.branch_distribution.right_count, 1);
        assert_eq!(m.branch_distribution.balance_ratio, 0.5);
    }

    #[test]
    fn color_scheme_thresholds() {
        assert_eq!(ColorScheme::from_distinct(3), ColorScheme::Monochromatic);
        assert_eq!(ColorScheme::from_distinct(4), ColorScheme::Analogous);
        assert_eq!(ColorScheme::from_distinct(5), ColorScheme::Analogous);
        assert_eq!(ColorScheme::from_distinct(8), ColorScheme::Triadic);
        assert_eq!(ColorScheme::from_distinct(9), ColorScheme::Polychromatic);
    }

    #[test]
    fn pattern_complexity_formula() {
        assert_eq!(pattern_complexity(0, 0), 0.0);
        assert!((pattern_complexity(4, 16) - 2.0).abs() < 1e-12);
        assert!((pattern_complexity(1, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn signature_marks_do_not_change_metrics() {
        let scene = with_categories(2);
        let before = PatternAnalyzer.analyze(&scene);
        let mut marked = scene.clone();
        marked.elements.push(VisualElement::SignatureMark(Mark {
            mark: MarkKind::Particle,
            center: Point::new(10.0, 10.0),
            size: 2.0,
            style: Style::new("#123456", 1.0),
        }));
        assert_eq!(PatternAnalyzer.analyze(&marked), before);
    }

    #[test]
    fn roots_only_tree_is_fully_organic() {
        let scene = SceneComposer::default()
            .compose(&GenerationParameters::default(), 1)
            .scene;
        let m = PatternAnalyzer.analyze(&scene);
        assert_eq!(m.organic_ratio, 1.0);
        assert_eq!(m.tree_complexity, 4);
        // Uneven root fan plus a corner symbol.
        assert!(m.composition_balance.horizontal < 1.0);
        assert_eq!(m.element_count, 5);
    }
}
