//! Andry - Deterministic generative art from medical content analysis.
//!
//! Content-analysis scores (evidence strength, terminology, statistics,
//! citations, emotional tone) grow an "Andry tree": roots, branches, term
//! clusters, data streams and emotional fields, finished with a signature
//! and serialized to SVG with the full metadata embedded.

pub mod analysis;
pub mod composer;
pub mod config;
pub mod error;
pub mod palette;
pub mod params;
pub mod pipeline;
pub mod rarity;
pub mod scene;
pub mod signature;
pub mod svg;

pub use analysis::{PatternAnalyzer, PatternMetadata};
pub use composer::SceneComposer;
pub use config::EngineConfig;
pub use error::{ArtError, ArtResult};
pub use params::{GenerationParameters, ParameterExtractor};
pub use pipeline::{Artwork, ArtworkHistory, Engine};
pub use rarity::{RarityScore, RarityTier, UniquenessFactors};
pub use scene::{Scene, VisualElement};
pub use signature::Signature;
pub use svg::{extract_metadata, Metadata};
