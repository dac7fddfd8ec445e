//! The full generation pipeline and the artwork records it produces.

use crate::analysis::{PatternAnalyzer, PatternMetadata};
use crate::composer::{SceneComposer, REFERENCE_SIZE};
use crate::config::EngineConfig;
use crate::error::{ArtError, ArtResult};
use crate::palette::Palette;
use crate::params::{CategoryWeights, GenerationParameters, InputIssue, ParameterExtractor};
use crate::rarity::{RarityScore, RarityScorer, RarityTier, UniquenessFactors};
use crate::scene::Scene;
use crate::signature::{Signature, SignatureGenerator};
use crate::svg::{Metadata, VectorSerializer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One generated artwork. Never mutated: regeneration produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub parameters: GenerationParameters,
    pub scene: Scene,
    pub pattern_metadata: PatternMetadata,
    pub uniqueness_factors: UniquenessFactors,
    pub rarity_score: RarityScore,
    pub rarity_tier: RarityTier,
    pub signature: Signature,
    pub vector_document: String,
    pub seed: u64,
    pub created_at: DateTime<Utc>,
    pub version: u32,
}

impl Artwork {
    /// Download name: `{id}_{title-slug}.svg`.
    pub fn file_name(&self, title: &str) -> String {
        format!("{}_{}.svg", self.id, slug(title))
    }

    /// Download name for a regenerated artwork, keeping the title of the
    /// document it came from: `{id}_{title}-v{version}.svg`.
    pub fn revision_file_name(&self, previous: &Metadata, previous_stem: &str) -> String {
        let title = previous_stem
            .strip_prefix(&format!("{}_", previous.artwork_id))
            .unwrap_or(previous_stem);
        let title = title
            .strip_suffix(&format!("-v{}", previous.version))
            .unwrap_or(title);
        self.file_name(&format!("{}-v{}", title, self.version))
    }

    /// The record embedded in [`Artwork::vector_document`].
    pub fn metadata(&self) -> Metadata {
        Metadata {
            artwork_id: self.id.clone(),
            version: self.version,
            algorithm_version: self.parameters.algorithm_version.clone(),
            seed: self.seed,
            parameters: self.parameters.clone(),
            pattern_metadata: self.pattern_metadata.clone(),
            uniqueness_factors: self.uniqueness_factors,
            rarity_score: self.rarity_score,
            rarity_tier: self.rarity_tier,
            signature_id: self.signature.id.clone(),
        }
    }
}

/// Lowercase ASCII slug; runs of other characters collapse into one `-`.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "artwork".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Runs the six stages: extract, compose, analyze, score, sign, serialize.
///
/// Holds only immutable tables, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct Engine {
    extractor: ParameterExtractor,
    composer: SceneComposer,
    analyzer: PatternAnalyzer,
    scorer: RarityScorer,
    signer: SignatureGenerator,
    serializer: VectorSerializer,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(
            REFERENCE_SIZE,
            REFERENCE_SIZE,
            Palette::default(),
            CategoryWeights::default(),
        )
    }
}

impl Engine {
    pub fn new(width: f64, height: f64, palette: Palette, weights: CategoryWeights) -> Self {
        Self {
            extractor: ParameterExtractor::new(weights),
            composer: SceneComposer::new(width, height, palette.clone()),
            analyzer: PatternAnalyzer,
            scorer: RarityScorer,
            signer: SignatureGenerator::new(palette),
            serializer: VectorSerializer,
        }
    }

    /// Build an engine from validated configuration.
    pub fn from_config(config: &EngineConfig) -> ArtResult<Self> {
        config.validate()?;
        let mut engine = Self::new(
            config.canvas.width as f64,
            config.canvas.height as f64,
            Palette::default(),
            CategoryWeights::from(&config.generator.weights),
        );
        engine.extractor = engine
            .extractor
            .with_algorithm_version(config.generator.algorithm_version.clone());
        Ok(engine)
    }

    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }

    /// Extract parameters from a raw record, then generate version 1.
    pub fn generate_from_json(
        &self,
        input: Option<&Value>,
        created_at: DateTime<Utc>,
    ) -> ArtResult<(Artwork, Vec<InputIssue>)> {
        let extraction = self.extractor.extract(input)?;
        let artwork = self.generate(extraction.parameters, created_at)?;
        Ok((artwork, extraction.issues))
    }

    /// Generate version 1 with the seed derived from the parameters.
    pub fn generate(
        &self,
        params: GenerationParameters,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        let seed = params.seed();
        self.build(params, seed, 1, created_at)
    }

    /// Generate version 1 with an explicit seed.
    pub fn generate_seeded(
        &self,
        params: GenerationParameters,
        seed: u64,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        self.build(params, seed, 1, created_at)
    }

    /// Re-run a stored artwork's parameters under a new algorithm version.
    /// The result is `previous.version + 1`; `previous` is left untouched.
    pub fn regenerate(
        &self,
        previous: &Artwork,
        algorithm_version: &str,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        self.revise(
            previous.parameters.clone(),
            previous.version,
            algorithm_version,
            created_at,
        )
    }

    /// Like [`Engine::regenerate`], starting from metadata read out of a
    /// vector document.
    pub fn regenerate_from_metadata(
        &self,
        previous: &Metadata,
        algorithm_version: &str,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        self.revise(
            previous.parameters.clone(),
            previous.version,
            algorithm_version,
            created_at,
        )
    }

    fn revise(
        &self,
        mut params: GenerationParameters,
        previous_version: u32,
        algorithm_version: &str,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        let algorithm_version = algorithm_version.trim();
        if algorithm_version.is_empty() {
            return Err(ArtError::invalid_input("algorithm version must not be empty"));
        }
        let version = previous_version
            .checked_add(1)
            .ok_or_else(|| ArtError::invalid_input("artwork version overflow"))?;
        params.algorithm_version = algorithm_version.to_string();
        let seed = params.seed();
        self.build(params, seed, version, created_at)
    }

    #[tracing::instrument(level = "debug", skip(self, params, created_at))]
    fn build(
        &self,
        params: GenerationParameters,
        seed: u64,
        version: u32,
        created_at: DateTime<Utc>,
    ) -> ArtResult<Artwork> {
        let composition = self.composer.compose(&params, seed);
        if !composition.skipped.is_empty() {
            tracing::warn!(
                skipped = composition.skipped.len(),
                "scene composed with skipped elements"
            );
        }
        let mut scene = composition.scene;

        let pattern = self.analyzer.analyze(&scene);
        let (factors, score) = self.scorer.score(&pattern, &params);
        let signature = self
            .signer
            .generate(&params, seed, score, scene.width, scene.height);
        let marks = signature.marks(&scene);
        scene.elements.extend(marks);

        let mut artwork = Artwork {
            id: signature.id.clone(),
            parameters: params,
            scene,
            pattern_metadata: pattern,
            uniqueness_factors: factors,
            rarity_score: score,
            rarity_tier: score.tier(),
            signature,
            vector_document: String::new(),
            seed,
            created_at,
            version,
        };
        artwork.vector_document =
            self.serializer
                .render(&artwork.scene, &artwork.signature, &artwork.metadata())?;

        tracing::info!(
            id = %artwork.id,
            version,
            score = %artwork.rarity_score,
            tier = %artwork.rarity_tier,
            elements = artwork.scene.elements.len(),
            "artwork generated"
        );
        Ok(artwork)
    }
}

/// Append-only version list for one content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkHistory {
    versions: Vec<Artwork>,
}

impl ArtworkHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next version. Versions must increase.
    pub fn push(&mut self, artwork: Artwork) -> ArtResult<()> {
        if let Some(latest) = self.versions.last() {
            if artwork.version <= latest.version {
                return Err(ArtError::invalid_input(format!(
                    "version {} does not follow {}",
                    artwork.version, latest.version
                )));
            }
        }
        self.versions.push(artwork);
        Ok(())
    }

    pub fn latest(&self) -> Option<&Artwork> {
        self.versions.last()
    }

    pub fn get(&self, version: u32) -> Option<&Artwork> {
        self.versions.iter().find(|a| a.version == version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn slugs_are_filename_safe() {
        assert_eq!(slug("Rotator Cuff: A Review!"), "rotator-cuff-a-review");
        assert_eq!(slug("  --  "), "artwork");
        assert_eq!(slug("ACL"), "acl");
    }

    #[test]
    fn file_name_combines_id_and_title() {
        let artwork = Engine::default()
            .generate(GenerationParameters::default(), at(0))
            .unwrap();
        let name = artwork.file_name("Shoulder Study");
        assert_eq!(name, format!("{}_shoulder-study.svg", artwork.id));
    }

    #[test]
    fn config_sets_canvas_and_default_version() {
        let mut config = EngineConfig::default();
        config.canvas.width = 800;
        config.generator.algorithm_version = "2.1.0".to_string();
        let engine = Engine::from_config(&config).unwrap();

        let (artwork, _) = engine
            .generate_from_json(Some(&serde_json::json!({ "evidenceStrength": 0.5 })), at(0))
            .unwrap();
        assert_eq!(artwork.scene.width, 800.0);
        assert_eq!(artwork.parameters.algorithm_version, "2.1.0");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.canvas.height = 0;
        assert!(matches!(
            Engine::from_config(&config),
            Err(ArtError::Other(_))
        ));
    }

    #[test]
    fn explicit_seed_matches_derived_seed() {
        let engine = Engine::default();
        let params = GenerationParameters::sample(11);
        let derived = engine.generate(params.clone(), at(0)).unwrap();
        let seeded = engine.generate_seeded(params.clone(), params.seed(), at(0)).unwrap();
        let other = engine.generate_seeded(params, 1, at(0)).unwrap();
        assert_eq!(derived, seeded);
        assert_eq!(other.seed, 1);
    }

    #[test]
    fn revision_names_keep_the_original_title() {
        let engine = Engine::default();
        let v1 = engine
            .generate(GenerationParameters::sample(5), at(1))
            .unwrap();
        let v1_name = v1.file_name("Shoulder Study");
        let v1_stem = v1_name.trim_end_matches(".svg");

        let v2 = engine.regenerate(&v1, "1.1.0", at(2)).unwrap();
        let v2_name = v2.revision_file_name(&v1.metadata(), v1_stem);
        assert_eq!(v2_name, format!("{}_shoulder-study-v2.svg", v2.id));

        let v3 = engine.regenerate(&v2, "1.2.0", at(3)).unwrap();
        let v3_name = v3.revision_file_name(&v2.metadata(), v2_name.trim_end_matches(".svg"));
        assert_eq!(v3_name, format!("{}_shoulder-study-v3.svg", v3.id));

        assert_eq!(
            v2.revision_file_name(&v1.metadata(), "renamed"),
            format!("{}_renamed-v2.svg", v2.id)
        );
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn missing_input_fails_before_generation() {
        let err = Engine::default().generate_from_json(None, at(0)).unwrap_err();
        assert!(matches!(err, ArtError::InputMissing(_)));
    }

    #[test]
    fn regeneration_bumps_version_and_keeps_previous() {
        let engine = Engine::default();
        let first = engine
            .generate(GenerationParameters::sample(3), at(10))
            .unwrap();
        let snapshot = first.clone();
        let second = engine.regenerate(&first, "1.1.0", at(20)).unwrap();

        assert_eq!(first, snapshot);
        assert_eq!(second.version, 2);
        assert_eq!(second.parameters.algorithm_version, "1.1.0");
        assert_eq!(second.created_at, at(20));
        assert!(engine.regenerate(&first, "  ", at(30)).is_err());
    }

    #[test]
    fn history_is_append_only() {
        let engine = Engine::default();
        let v1 = engine
            .generate(GenerationParameters::default(), at(1))
            .unwrap();
        let v2 = engine.regenerate(&v1, "2.0.0", at(2)).unwrap();

        let mut history = ArtworkHistory::new();
        history.push(v1.clone()).unwrap();
        history.push(v2).unwrap();
        assert!(history.push(v1).is_err());
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().map(|a| a.version), Some(2));
        assert_eq!(history.get(1).map(|a| a.version), Some(1));
        assert!(history.get(3).is_none());
    }
}
