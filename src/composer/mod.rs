//! Scene composition: expands parameters into an ordered scene.
//!
//! Each layer adds one family of elements on top of the previous ones:
//! roots, the canopy (trunk and knowledge branches), medical term
//! clusters, statistical data streams, the research constellation,
//! emotional fields and the subspecialty symbol. A layer that fails is
//! skipped as a whole; the rest of the scene is still composed.

pub mod data;
pub mod emotion;
pub mod tree;

use crate::palette::Palette;
use crate::params::{GenerationParameters, TermCategory};
use crate::scene::{Point, Scene, VisualElement};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Reference canvas size the geometry constants are expressed in.
pub const REFERENCE_SIZE: f64 = 400.0;

/// Upper bound on polygon sides and network nodes per cluster.
pub const MAX_CLUSTER_POINTS: u32 = 64;

/// An element or layer that could not be built. Recoverable: the
/// offending part is left out of the scene.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("statistic #{index} skipped: {reason}")]
    MalformedStatistic { index: usize, reason: String },

    #[error("citation #{index} skipped: {reason}")]
    MalformedCitation { index: usize, reason: String },

    #[error("emotional field for {emotion} skipped: {reason}")]
    MalformedEmotion { emotion: String, reason: String },

    #[error("{layer} layer skipped: {reason}")]
    Layer { layer: &'static str, reason: String },
}

/// Anchor points shared by the layers.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    /// Geometry multiplier relative to the reference canvas.
    pub scale: f64,
    pub center: Point,
    /// Where roots start and the trunk begins.
    pub base: Point,
    /// Top of the trunk, where branches start.
    pub crown: Point,
}

impl Layout {
    pub fn new(width: f64, height: f64) -> Self {
        let scale = width.min(height) / REFERENCE_SIZE;
        let center = Point::new(width / 2.0, height / 2.0);
        Self {
            width,
            height,
            scale,
            center,
            base: Point::new(center.x, center.y + 110.0 * scale),
            crown: Point::new(center.x, center.y + 30.0 * scale),
        }
    }
}

/// State handed from layer to layer while composing one scene.
pub struct LayerContext<'a> {
    pub params: &'a GenerationParameters,
    pub palette: &'a Palette,
    pub layout: Layout,
    pub rng: StdRng,
    /// Branch tip and absolute direction per category, filled by the canopy.
    pub branch_tips: BTreeMap<TermCategory, (Point, f64)>,
    /// Element-scoped failures collected while building.
    pub skipped: Vec<GenerationError>,
}

impl LayerContext<'_> {
    pub fn skip(&mut self, error: GenerationError) {
        tracing::warn!(%error, "element skipped");
        self.skipped.push(error);
    }
}

/// One family of scene elements.
pub trait Layer {
    /// Name of this layer, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Build the layer's elements. An `Err` drops the whole layer.
    fn build(&self, ctx: &mut LayerContext<'_>) -> Result<Vec<VisualElement>, GenerationError>;
}

/// A composed scene plus whatever was left out of it.
#[derive(Debug, Clone)]
pub struct Composition {
    pub scene: Scene,
    pub skipped: Vec<GenerationError>,
}

#[derive(Debug, Clone)]
pub struct SceneComposer {
    pub width: f64,
    pub height: f64,
    pub palette: Palette,
}

impl Default for SceneComposer {
    fn default() -> Self {
        Self {
            width: REFERENCE_SIZE,
            height: REFERENCE_SIZE,
            palette: Palette::default(),
        }
    }
}

impl SceneComposer {
    pub fn new(width: f64, height: f64, palette: Palette) -> Self {
        Self {
            width,
            height,
            palette,
        }
    }

    fn layers() -> [&'static dyn Layer; 7] {
        [
            &tree::RootLayer,
            &tree::CanopyLayer,
            &tree::ClusterLayer,
            &data::StreamLayer,
            &data::ConstellationLayer,
            &emotion::FieldLayer,
            &emotion::SymbolLayer,
        ]
    }

    /// Compose the scene for `params`. Identical parameters and seed
    /// always give an identical scene.
    pub fn compose(&self, params: &GenerationParameters, seed: u64) -> Composition {
        let layout = Layout::new(self.width, self.height);
        let mut scene = Scene::new(
            self.width,
            self.height,
            self.palette.gradient(params.subspecialty),
        );
        let mut ctx = LayerContext {
            params,
            palette: &self.palette,
            layout,
            rng: StdRng::seed_from_u64(seed),
            branch_tips: BTreeMap::new(),
            skipped: Vec::new(),
        };

        for layer in Self::layers() {
            match layer.build(&mut ctx) {
                Ok(elements) => {
                    tracing::debug!(layer = layer.name(), count = elements.len(), "layer built");
                    scene.elements.extend(elements);
                }
                Err(error) => ctx.skip(error),
            }
        }

        Composition {
            scene,
            skipped: ctx.skipped,
        }
    }
}
