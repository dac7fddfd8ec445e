//! Statistical data streams and the research constellation.

use super::{GenerationError, Layer, LayerContext};
use crate::scene::{AnimationKind, Point, ResearchNode, Stream, Style, VisualElement};
use rand::Rng;

/// Most citations drawn as constellation nodes.
pub const MAX_CONSTELLATION_NODES: usize = 8;

/// How far forward (in constellation order) each node links.
const LINK_REACH: usize = 2;

/// One curved stream per statistic, stacked top to bottom across the canvas.
pub struct StreamLayer;

impl StreamLayer {
    pub fn thickness(significance: f64) -> f64 {
        (significance * 3.0).max(1.0)
    }
}

impl Layer for StreamLayer {
    fn name(&self) -> &'static str {
        "streams"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let layout = ctx.layout;
        let stats = &ctx.params.statistical_data;
        let n = stats.len();
        let mut elements = Vec::with_capacity(n);
        let mut skipped = Vec::new();

        for (index, stat) in stats.iter().enumerate() {
            if !stat.value.is_finite() || !stat.significance.is_finite() {
                skipped.push(GenerationError::MalformedStatistic {
                    index,
                    reason: format!(
                        "value {} / significance {} is not finite",
                        stat.value, stat.significance
                    ),
                });
                continue;
            }

            let significance = stat.significance.clamp(0.0, 1.0);
            let y = layout.height * (0.15 + 0.7 * (index + 1) as f64 / (n + 1) as f64);
            let start = Point::new(layout.width * 0.05, y);
            let end = Point::new(
                layout.width * 0.95,
                y + (significance - 0.5) * 40.0 * layout.scale,
            );
            let bend = (stat.value.abs() + 1.0).ln().min(5.0) * 8.0 * layout.scale;
            let sign = if index % 2 == 0 { -1.0 } else { 1.0 };
            let mid = start.midpoint(end);

            elements.push(VisualElement::DataStream(Stream {
                statistic: stat.kind,
                start,
                control: Point::new(mid.x, mid.y + sign * bend),
                end,
                thickness: Self::thickness(significance) * layout.scale,
                style: Style::new(ctx.palette.statistic(stat.kind), 0.3 + significance * 0.5)
                    .animated(AnimationKind::Flow, 1.0, 4.0 + index as f64 * 0.5),
            }));
        }

        for error in skipped {
            ctx.skip(error);
        }
        Ok(elements)
    }
}

/// Research citations as a small linked constellation above the canopy.
///
/// Node placement jitter comes from the context's seeded RNG, so the same
/// parameters always land the nodes in the same place.
pub struct ConstellationLayer;

impl ConstellationLayer {
    /// Forward links of node `index` among `count` nodes.
    pub fn links(index: usize, count: usize) -> Vec<usize> {
        let last = (index + LINK_REACH).min(count.saturating_sub(1));
        (index + 1..=last).collect()
    }
}

impl Layer for ConstellationLayer {
    fn name(&self) -> &'static str {
        "constellation"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let layout = ctx.layout;
        let mut valid = Vec::with_capacity(MAX_CONSTELLATION_NODES);
        let mut skipped = Vec::new();

        for (index, citation) in ctx.params.research_citations.iter().enumerate() {
            if valid.len() == MAX_CONSTELLATION_NODES {
                break;
            }
            if !citation.importance.is_finite() || !citation.impact.is_finite() {
                skipped.push(GenerationError::MalformedCitation {
                    index,
                    reason: "importance or impact is not finite".to_string(),
                });
                continue;
            }
            valid.push(citation);
        }

        let m = valid.len();
        let mut elements = Vec::with_capacity(m);
        for (i, citation) in valid.into_iter().enumerate() {
            let importance = citation.importance.clamp(0.0, 1.0);
            let impact = citation.impact.clamp(0.0, 1.0);
            let jitter = 8.0 * layout.scale;
            let center = Point::new(
                layout.center.x
                    + (i as f64 - (m as f64 - 1.0) / 2.0) * 38.0 * layout.scale
                    + ctx.rng.gen_range(-jitter..=jitter),
                layout.height * 0.12
                    + (i % 2) as f64 * 20.0 * layout.scale
                    + ctx.rng.gen_range(-jitter..=jitter),
            );

            elements.push(VisualElement::ResearchNode(ResearchNode {
                index: i,
                center,
                radius: (2.0 + importance * 3.0) * layout.scale,
                links: Self::links(i, m),
                style: Style::new(ctx.palette.research_node(impact), 0.6 + impact * 0.4)
                    .animated(AnimationKind::Twinkle, 0.4, 2.0 + i as f64 * 0.3),
            }));
        }

        for error in skipped {
            ctx.skip(error);
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_thickness_has_a_floor() {
        assert_eq!(StreamLayer::thickness(0.0), 1.0);
        assert_eq!(StreamLayer::thickness(0.2), 1.0);
        assert_eq!(StreamLayer::thickness(1.0), 3.0);
    }

    #[test]
    fn constellation_links_reach_two_ahead() {
        assert_eq!(ConstellationLayer::links(0, 8), vec![1, 2]);
        assert_eq!(ConstellationLayer::links(6, 8), vec![7]);
        assert!(ConstellationLayer::links(7, 8).is_empty());
        assert!(ConstellationLayer::links(0, 1).is_empty());
    }

    #[test]
    fn links_never_self_or_duplicate() {
        for count in 1..=8 {
            for i in 0..count {
                let links = ConstellationLayer::links(i, count);
                assert!(links.iter().all(|&j| j > i && j - i <= 2 && j < count));
            }
        }
    }
}
