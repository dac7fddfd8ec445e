//! Emotional fields and the subspecialty symbol.

use super::{GenerationError, Layer, LayerContext};
use crate::params::Emotion;
use crate::scene::{AnimationKind, Field, Point, Style, Symbol, VisualElement};

/// Emotions weaker than this get no field.
pub const FIELD_THRESHOLD: f64 = 0.1;

/// One translucent ellipse per sufficiently intense emotion, arranged in a
/// ring around the canvas center.
pub struct FieldLayer;

impl FieldLayer {
    pub fn radii(intensity: f64) -> (f64, f64) {
        (30.0 + intensity * 50.0, 20.0 + intensity * 30.0)
    }

    fn slot(emotion: Emotion) -> f64 {
        Emotion::ALL
            .iter()
            .position(|e| *e == emotion)
            .unwrap_or_default() as f64
    }
}

impl Layer for FieldLayer {
    fn name(&self) -> &'static str {
        "fields"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let layout = ctx.layout;
        let mut elements = Vec::new();
        let mut skipped = Vec::new();

        for (&emotion, &intensity) in &ctx.params.emotional_mix {
            if !intensity.is_finite() {
                skipped.push(GenerationError::MalformedEmotion {
                    emotion: emotion.as_str().to_string(),
                    reason: "intensity is not finite".to_string(),
                });
                continue;
            }
            if intensity < FIELD_THRESHOLD {
                continue;
            }

            let intensity = intensity.min(1.0);
            let (rx, ry) = Self::radii(intensity);
            elements.push(VisualElement::EmotionalField(Field {
                emotion,
                center: layout
                    .center
                    .polar(-90.0 + Self::slot(emotion) * 60.0, 70.0 * layout.scale),
                radius_x: rx * layout.scale,
                radius_y: ry * layout.scale,
                intensity,
                style: Style::new(ctx.palette.emotion(emotion), 0.12 + intensity * 0.2)
                    .animated(AnimationKind::Breathe, intensity * 0.1, 6.0),
            }));
        }

        for error in skipped {
            ctx.skip(error);
        }
        Ok(elements)
    }
}

/// The subspecialty glyph in the top-right corner.
pub struct SymbolLayer;

impl Layer for SymbolLayer {
    fn name(&self) -> &'static str {
        "symbol"
    }

    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError> {
        let layout = ctx.layout;
        let subspecialty = ctx.params.subspecialty;

        Ok(vec![VisualElement::SubspecialtySymbol(Symbol {
            subspecialty,
            glyph: ctx.palette.symbol(subspecialty),
            center: Point::new(layout.width - 40.0 * layout.scale, 40.0 * layout.scale),
            size: 14.0 * layout.scale,
            style: Style::new(ctx.palette.watermark.clone(), 0.55).animated(
                AnimationKind::Rotate,
                360.0,
                30.0,
            ),
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SceneComposer;
    use crate::params::{GenerationParameters, Subspecialty};
    use crate::scene::{ElementKind, Glyph};

    #[test]
    fn field_radii_follow_intensity() {
        assert_eq!(FieldLayer::radii(0.0), (30.0, 20.0));
        assert_eq!(FieldLayer::radii(1.0), (80.0, 50.0));
    }

    #[test]
    fn every_emotion_above_threshold_gets_a_field() {
        let mut p = GenerationParameters::default();
        for emotion in Emotion::ALL {
            p.emotional_mix.insert(emotion, 0.5);
        }
        p.emotional_mix.insert(Emotion::Tension, 0.05);
        let scene = SceneComposer::default().compose(&p, 3).scene;
        assert_eq!(scene.count(ElementKind::EmotionalField), 5);
    }

    #[test]
    fn symbol_follows_subspecialty() {
        let mut p = GenerationParameters::default();
        p.subspecialty = Subspecialty::Spine;
        let scene = SceneComposer::default().compose(&p, 3).scene;
        let glyph = scene.elements.iter().find_map(|e| match e {
            VisualElement::SubspecialtySymbol(s) => Some(s.glyph),
            _ => None,
        });
        assert_eq!(glyph, Some(Glyph::Cross));
    }
}
