//! The Andry tree: roots, trunk, knowledge branches and term clusters.

use super::{GenerationError, Layer, LayerContext, MAX_CLUSTER_POINTS};
use crate::params::TermCategory;
use crate::scene::{
    AnimationKind, Branch, Cluster, ClusterShape, Point, Stroke, Style, VisualElement,
};

/// Longest branch, in reference units, so the canopy stays on the canvas.
const MAX_BRANCH_LENGTH: f64 = 200.0;

/// Radial roots fanning downward from the tree base.
///
/// Count is `floor(evidence × 5) + 2`; reach is `30 + evidence × 50`,
/// shortened for the first roots so the fan reads as uneven growth.
pub struct RootLayer;

impl RootLayer {
    pub fn root_count(evidence_strength: f64) -> usize {
        (evidence_strength.clamp(0.0, 1.0) * 5.0).floor() as usize + 2
    }
}

impl Layer for RootLayer {
    fn name(&self) -> &'static str {
        "roots"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let evidence = ctx.params.evidence_strength;
        if !evidence.is_finite() {
            return Err(GenerationError::Layer {
                layer: self.name(),
                reason: "evidence strength is not a number".to_string(),
            });
        }

        let layout = ctx.layout;
        let n = Self::root_count(evidence);
        let reach = (30.0 + evidence * 50.0) * layout.scale;
        let thickness = (1.5 + evidence * 2.5) * layout.scale;

        let roots = (0..n)
            .map(|i| {
                // Fan from 180° (left) through 90° (down) to 0° (right).
                let angle = 180.0 - (i as f64 / (n - 1) as f64) * 180.0;
                let distance = reach * (0.7 + 0.3 * (i + 1) as f64 / n as f64);
                let end = layout.base.polar(angle, distance);
                let mid = layout.base.polar(angle, distance * 0.5);
                let control = Point::new(mid.x, mid.y + 8.0 * layout.scale);

                VisualElement::Root(Stroke {
                    start: layout.base,
                    control,
                    end,
                    angle,
                    thickness,
                    style: Style::new(ctx.palette.root.clone(), 0.85),
                })
            })
            .collect();

        Ok(roots)
    }
}

/// Trunk plus one knowledge branch per non-empty term category.
///
/// Branch `i` of `k` leans `(i / k) × 120 − 60` degrees from vertical and
/// is `40 + terms × 10` long. Branch tips are recorded for the cluster layer.
pub struct CanopyLayer;

impl CanopyLayer {
    pub fn branch_angle(index: usize, count: usize) -> f64 {
        (index as f64 / count.max(1) as f64) * 120.0 - 60.0
    }

    pub fn branch_length(term_count: u32) -> f64 {
        (40.0 + term_count as f64 * 10.0).min(MAX_BRANCH_LENGTH)
    }
}

impl Layer for CanopyLayer {
    fn name(&self) -> &'static str {
        "canopy"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let categories = ctx.params.active_categories();
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let layout = ctx.layout;
        let density = ctx.params.technical_density.clamp(0.0, 1.0);
        let mut elements = Vec::with_capacity(categories.len() + 1);

        let sway = (density - 0.5) * 10.0 * layout.scale;
        elements.push(VisualElement::Trunk(Stroke {
            start: layout.base,
            control: Point::new(
                layout.base.x + sway,
                (layout.base.y + layout.crown.y) / 2.0,
            ),
            end: layout.crown,
            angle: 270.0,
            thickness: (4.0 + density * 6.0) * layout.scale,
            style: Style::new(ctx.palette.trunk.clone(), 0.95),
        }));

        let k = categories.len();
        for (index, category) in categories.into_iter().enumerate() {
            let lean = Self::branch_angle(index, k);
            let angle = 270.0 + lean;
            let length = Self::branch_length(ctx.params.term_count(category)) * layout.scale;
            let end = layout.crown.polar(angle, length);
            let control = layout.crown.polar(angle - lean * 0.15, length * 0.55);

            ctx.branch_tips.insert(category, (end, angle));
            elements.push(VisualElement::Branch(Branch {
                category,
                path: Stroke {
                    start: layout.crown,
                    control,
                    end,
                    angle,
                    thickness: (2.0 + density * 2.0) * layout.scale,
                    style: Style::new(ctx.palette.category(category), 0.9).animated(
                        AnimationKind::Sway,
                        2.0 * layout.scale,
                        5.0 + index as f64,
                    ),
                },
            }));
        }

        Ok(elements)
    }
}

/// Term clusters at the branch tips: procedures become polygons with
/// `count + 3` sides, anatomy terms become ring networks of `count` nodes.
pub struct ClusterLayer;

impl ClusterLayer {
    fn capped(term: &str, points: u32) -> u32 {
        if points > MAX_CLUSTER_POINTS {
            tracing::warn!(term, points, cap = MAX_CLUSTER_POINTS, "cluster truncated");
        }
        points.min(MAX_CLUSTER_POINTS)
    }
}

impl Layer for ClusterLayer {
    fn name(&self) -> &'static str {
        "clusters"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let scale = ctx.layout.scale;
        let mut elements = Vec::new();

        for category in [TermCategory::Procedures, TermCategory::Anatomy] {
            let Some(&(tip, angle)) = ctx.branch_tips.get(&category) else {
                continue;
            };
            let terms: Vec<(&str, u32)> = ctx
                .params
                .terms(category)
                .map(|(name, stat)| (name, stat.count))
                .collect();
            let m = terms.len();
            let color = ctx.palette.category(category).to_string();

            for (j, (term, count)) in terms.into_iter().enumerate() {
                let center = if m == 1 {
                    tip
                } else {
                    let spread = (j as f64 - (m - 1) as f64 / 2.0) * 35.0;
                    tip.polar(angle + spread, 28.0 * scale)
                };

                let shape = match category {
                    TermCategory::Procedures => {
                        let sides = Self::capped(term, count.saturating_add(3));
                        ClusterShape::Polygon {
                            sides,
                            radius: 15.0 * scale,
                            rotation: -90.0,
                        }
                    }
                    _ => {
                        let n = Self::capped(term, count) as usize;
                        let ring_radius = (12.0 + n.min(24) as f64 * 0.5) * scale;
                        let nodes: Vec<Point> = (0..n)
                            .map(|i| center.polar(-90.0 + i as f64 * 360.0 / n as f64, ring_radius))
                            .collect();
                        let links = match n {
                            0 | 1 => Vec::new(),
                            2 => vec![(0, 1)],
                            _ => (0..n).map(|i| (i, (i + 1) % n)).collect(),
                        };
                        ClusterShape::Network {
                            ring_radius,
                            node_radius: 2.5 * scale,
                            nodes,
                            links,
                        }
                    }
                };

                let style = match shape {
                    // Breathes from radius 15 to 20.
                    ClusterShape::Polygon { .. } => Style::new(color.clone(), 0.7).animated(
                        AnimationKind::Pulse,
                        5.0 * scale,
                        3.0,
                    ),
                    ClusterShape::Network { .. } => Style::new(color.clone(), 0.8).animated(
                        AnimationKind::Twinkle,
                        0.3,
                        4.0,
                    ),
                };

                elements.push(VisualElement::MedicalCluster(Cluster {
                    category,
                    term: term.to_string(),
                    center,
                    shape,
                    style,
                }));
            }
        }

        Ok(elements)
    }
}
