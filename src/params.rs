//! Content-analysis parameters that drive art generation.
//!
//! Converts a loosely shaped analysis record (JSON from the content-analysis
//! service) into normalized [`GenerationParameters`]. Extraction never fails
//! on a bad field: out-of-range numbers are clamped, unknown names fall back
//! to defaults and malformed list entries are skipped. Every such correction
//! is reported as an [`InputIssue`].

use crate::error::{ArtError, ArtResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_EVIDENCE_STRENGTH: f64 = 0.5;
pub const DEFAULT_TECHNICAL_DENSITY: f64 = 0.5;
pub const DEFAULT_SIGNIFICANCE: f64 = 0.5;
pub const DEFAULT_CITATION_SCORE: f64 = 0.5;
pub const DEFAULT_ALGORITHM_VERSION: &str = "1.0.0";

/// Normalize an enum spelling: `Sports_Medicine`, `sports-medicine` and
/// `sportsMedicine` all become `sportsmedicine`.
fn fold_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Orthopaedic subspecialty of the analysed content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum Subspecialty {
    #[default]
    SportsMedicine,
    ShoulderElbow,
    HandWrist,
    HipKnee,
    FootAnkle,
    Spine,
    Trauma,
    Pediatrics,
    Oncology,
}

impl Subspecialty {
    pub const ALL: [Subspecialty; 9] = [
        Subspecialty::SportsMedicine,
        Subspecialty::ShoulderElbow,
        Subspecialty::HandWrist,
        Subspecialty::HipKnee,
        Subspecialty::FootAnkle,
        Subspecialty::Spine,
        Subspecialty::Trauma,
        Subspecialty::Pediatrics,
        Subspecialty::Oncology,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Subspecialty::SportsMedicine => "sportsMedicine",
            Subspecialty::ShoulderElbow => "shoulderElbow",
            Subspecialty::HandWrist => "handWrist",
            Subspecialty::HipKnee => "hipKnee",
            Subspecialty::FootAnkle => "footAnkle",
            Subspecialty::Spine => "spine",
            Subspecialty::Trauma => "trauma",
            Subspecialty::Pediatrics => "pediatrics",
            Subspecialty::Oncology => "oncology",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold_name(raw);
        Self::ALL
            .into_iter()
            .find(|s| fold_name(s.as_str()) == folded)
    }
}

/// Emotional tone detected in the content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum Emotion {
    Hope,
    #[default]
    Confidence,
    Breakthrough,
    Healing,
    Tension,
    Uncertainty,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Hope,
        Emotion::Confidence,
        Emotion::Breakthrough,
        Emotion::Healing,
        Emotion::Tension,
        Emotion::Uncertainty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Hope => "hope",
            Emotion::Confidence => "confidence",
            Emotion::Breakthrough => "breakthrough",
            Emotion::Healing => "healing",
            Emotion::Tension => "tension",
            Emotion::Uncertainty => "uncertainty",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold_name(raw);
        Self::ALL.into_iter().find(|e| e.as_str() == folded)
    }
}

/// Category of medical terminology found in the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TermCategory {
    Procedures,
    Anatomy,
    Outcomes,
    Research,
}

impl TermCategory {
    pub const ALL: [TermCategory; 4] = [
        TermCategory::Procedures,
        TermCategory::Anatomy,
        TermCategory::Outcomes,
        TermCategory::Research,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TermCategory::Procedures => "procedures",
            TermCategory::Anatomy => "anatomy",
            TermCategory::Outcomes => "outcomes",
            TermCategory::Research => "research",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold_name(raw);
        Self::ALL.into_iter().find(|c| c.as_str() == folded)
    }
}

/// Fixed significance multiplier per term category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryWeights {
    pub procedures: f64,
    pub anatomy: f64,
    pub outcomes: f64,
    pub research: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            procedures: 1.0,
            anatomy: 0.8,
            outcomes: 1.0,
            research: 1.0,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: TermCategory) -> f64 {
        match category {
            TermCategory::Procedures => self.procedures,
            TermCategory::Anatomy => self.anatomy,
            TermCategory::Outcomes => self.outcomes,
            TermCategory::Research => self.research,
        }
    }
}

/// Occurrences of a single term and its weighted significance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStat {
    pub count: u32,
    /// `count × category weight`.
    pub weight: f64,
}

pub type MedicalTerms = BTreeMap<TermCategory, BTreeMap<String, TermStat>>;

/// Kind of statistic mentioned in the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatisticKind {
    PValue,
    ConfidenceInterval,
    Percentage,
    SampleSize,
    OddsRatio,
    #[serde(other)]
    Other,
}

impl StatisticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatisticKind::PValue => "pValue",
            StatisticKind::ConfidenceInterval => "confidenceInterval",
            StatisticKind::Percentage => "percentage",
            StatisticKind::SampleSize => "sampleSize",
            StatisticKind::OddsRatio => "oddsRatio",
            StatisticKind::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold_name(raw);
        [
            StatisticKind::PValue,
            StatisticKind::ConfidenceInterval,
            StatisticKind::Percentage,
            StatisticKind::SampleSize,
            StatisticKind::OddsRatio,
            StatisticKind::Other,
        ]
        .into_iter()
        .find(|k| fold_name(k.as_str()) == folded)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    #[serde(rename = "type")]
    pub kind: StatisticKind,
    pub value: f64,
    pub significance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub importance: f64,
    pub impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Canonical, fully populated input to the generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub evidence_strength: f64,
    pub technical_density: f64,
    pub subspecialty: Subspecialty,
    pub dominant_emotion: Emotion,
    pub emotional_mix: BTreeMap<Emotion, f64>,
    pub medical_terms: MedicalTerms,
    pub statistical_data: Vec<Statistic>,
    pub research_citations: Vec<Citation>,
    pub algorithm_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<NaiveDate>,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            evidence_strength: DEFAULT_EVIDENCE_STRENGTH,
            technical_density: DEFAULT_TECHNICAL_DENSITY,
            subspecialty: Subspecialty::default(),
            dominant_emotion: Emotion::default(),
            emotional_mix: BTreeMap::new(),
            medical_terms: TermCategory::ALL
                .into_iter()
                .map(|c| (c, BTreeMap::new()))
                .collect(),
            statistical_data: Vec::new(),
            research_citations: Vec::new(),
            algorithm_version: DEFAULT_ALGORITHM_VERSION.to_string(),
            analysis_date: None,
        }
    }
}

impl GenerationParameters {
    /// Terms recorded for a category (empty when the category is absent).
    pub fn terms(&self, category: TermCategory) -> impl Iterator<Item = (&str, &TermStat)> {
        self.medical_terms
            .get(&category)
            .into_iter()
            .flat_map(|terms| terms.iter().map(|(name, stat)| (name.as_str(), stat)))
    }

    /// Summed term counts for a category.
    pub fn term_count(&self, category: TermCategory) -> u32 {
        self.terms(category)
            .fold(0u32, |acc, (_, stat)| acc.saturating_add(stat.count))
    }

    /// Categories with at least one term, in category order.
    pub fn active_categories(&self) -> Vec<TermCategory> {
        TermCategory::ALL
            .into_iter()
            .filter(|c| self.terms(*c).next().is_some())
            .collect()
    }

    /// Deterministic seed derived from every field.
    /// Same parameters always produce the same art.
    pub fn seed(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.evidence_strength.to_le_bytes());
        hasher.update(self.technical_density.to_le_bytes());
        hasher.update(self.subspecialty.as_str().as_bytes());
        hasher.update(self.dominant_emotion.as_str().as_bytes());
        for (emotion, intensity) in &self.emotional_mix {
            hasher.update(emotion.as_str().as_bytes());
            hasher.update(intensity.to_le_bytes());
        }
        for (category, terms) in &self.medical_terms {
            hasher.update(category.as_str().as_bytes());
            for (term, stat) in terms {
                hasher.update(term.as_bytes());
                hasher.update(stat.count.to_le_bytes());
            }
        }
        for stat in &self.statistical_data {
            hasher.update(stat.kind.as_str().as_bytes());
            hasher.update(stat.value.to_le_bytes());
            hasher.update(stat.significance.to_le_bytes());
        }
        for citation in &self.research_citations {
            hasher.update(citation.importance.to_le_bytes());
            hasher.update(citation.impact.to_le_bytes());
        }
        hasher.update(self.algorithm_version.as_bytes());
        if let Some(date) = self.analysis_date {
            hasher.update(date.to_string().as_bytes());
        }
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash[0..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create sample parameters for demo purposes.
    pub fn sample(seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let weights = CategoryWeights::default();

        const TERMS: [(TermCategory, &[&str]); 4] = [
            (
                TermCategory::Procedures,
                &["arthroscopy", "tenotomy", "osteotomy", "fixation"],
            ),
            (
                TermCategory::Anatomy,
                &["shoulder", "rotatorCuff", "meniscus", "acl"],
            ),
            (
                TermCategory::Outcomes,
                &["painScore", "returnToSport", "rangeOfMotion"],
            ),
            (
                TermCategory::Research,
                &["randomized", "cohort", "metaAnalysis"],
            ),
        ];

        let mut medical_terms: MedicalTerms = BTreeMap::new();
        for (category, names) in TERMS {
            let mut terms = BTreeMap::new();
            if rng.gen_bool(0.75) {
                for name in names.iter() {
                    if !rng.gen_bool(0.4) {
                        continue;
                    }
                    let count = rng.gen_range(1..12u32);
                    terms.insert(
                        name.to_string(),
                        TermStat {
                            count,
                            weight: count as f64 * weights.weight(category),
                        },
                    );
                }
            }
            medical_terms.insert(category, terms);
        }

        let mut emotional_mix = BTreeMap::new();
        for emotion in Emotion::ALL {
            if rng.gen_bool(0.6) {
                emotional_mix.insert(emotion, rng.gen_range(0.0..1.0));
            }
        }

        let kinds = [
            StatisticKind::PValue,
            StatisticKind::ConfidenceInterval,
            StatisticKind::Percentage,
            StatisticKind::SampleSize,
            StatisticKind::OddsRatio,
        ];
        let statistical_data = (0..rng.gen_range(0..5))
            .map(|_| Statistic {
                kind: kinds[rng.gen_range(0..kinds.len())],
                value: rng.gen_range(0.0..100.0),
                significance: rng.gen_range(0.0..1.0),
                context: None,
            })
            .collect();

        let research_citations = (0..rng.gen_range(0..10))
            .map(|_| Citation {
                importance: rng.gen_range(0.0..1.0),
                impact: rng.gen_range(0.0..1.0),
                context: None,
            })
            .collect();

        Self {
            evidence_strength: rng.gen_range(0.0..1.0),
            technical_density: rng.gen_range(0.0..1.0),
            subspecialty: Subspecialty::ALL[rng.gen_range(0..Subspecialty::ALL.len())],
            dominant_emotion: Emotion::ALL[rng.gen_range(0..Emotion::ALL.len())],
            emotional_mix,
            medical_terms,
            statistical_data,
            research_citations,
            algorithm_version: DEFAULT_ALGORITHM_VERSION.to_string(),
            analysis_date: None,
        }
    }
}

/// A correction applied while reading the raw analysis record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputIssue {
    #[error("{field}: {value} clamped to {clamped}")]
    Clamped {
        field: String,
        value: f64,
        clamped: f64,
    },
    #[error("{field}: missing, using default")]
    Defaulted { field: String },
    #[error("{field}: unrecognized value {value:?}, using default")]
    Unrecognized { field: String, value: String },
    #[error("{field}: entry skipped ({reason})")]
    Skipped { field: String, reason: String },
}

impl InputIssue {
    pub fn field(&self) -> &str {
        match self {
            InputIssue::Clamped { field, .. }
            | InputIssue::Defaulted { field }
            | InputIssue::Unrecognized { field, .. }
            | InputIssue::Skipped { field, .. } => field,
        }
    }
}

/// Extracted parameters plus every correction made along the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub parameters: GenerationParameters,
    pub issues: Vec<InputIssue>,
}

/// Reads raw analysis records into [`GenerationParameters`].
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    pub weights: CategoryWeights,
    /// Used when the record carries no `algorithmVersion`.
    pub algorithm_version: String,
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new(CategoryWeights::default())
    }
}

impl ParameterExtractor {
    pub fn new(weights: CategoryWeights) -> Self {
        Self {
            weights,
            algorithm_version: DEFAULT_ALGORITHM_VERSION.to_string(),
        }
    }

    pub fn with_algorithm_version(mut self, version: impl Into<String>) -> Self {
        self.algorithm_version = version.into();
        self
    }

    /// Parse JSON text, then extract.
    pub fn extract_str(&self, input: &str) -> ArtResult<Extraction> {
        if input.trim().is_empty() {
            return Err(ArtError::input_missing("analysis record is empty"));
        }
        let value: Value = serde_json::from_str(input)
            .map_err(|e| ArtError::invalid_input(format!("failed to parse analysis JSON: {e}")))?;
        self.extract(Some(&value))
    }

    /// Extract parameters from a raw analysis record.
    ///
    /// Fails only when the record is absent (`None` or JSON `null`) or is not
    /// a JSON object.
    pub fn extract(&self, input: Option<&Value>) -> ArtResult<Extraction> {
        let obj = match input {
            None | Some(Value::Null) => {
                return Err(ArtError::input_missing("no generation parameters supplied"));
            }
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                return Err(ArtError::invalid_input(format!(
                    "analysis record must be an object, got {}",
                    json_type(other)
                )));
            }
        };

        let mut reader = Reader::default();

        let evidence_strength =
            reader.unit(obj, "evidenceStrength", DEFAULT_EVIDENCE_STRENGTH, true);
        let technical_density =
            reader.unit(obj, "technicalDensity", DEFAULT_TECHNICAL_DENSITY, true);
        let subspecialty = reader.named(obj, "subspecialty", Subspecialty::parse);
        let dominant_emotion = reader.named(obj, "dominantEmotion", Emotion::parse);
        let emotional_mix = reader.emotional_mix(obj);
        let medical_terms = reader.medical_terms(obj, &self.weights);
        let statistical_data = reader.statistics(obj);
        let research_citations = reader.citations(obj);
        let algorithm_version = reader.algorithm_version(obj, &self.algorithm_version);
        let analysis_date = reader.analysis_date(obj);

        for issue in &reader.issues {
            tracing::warn!(%issue, "input corrected");
        }

        Ok(Extraction {
            parameters: GenerationParameters {
                evidence_strength,
                technical_density,
                subspecialty,
                dominant_emotion,
                emotional_mix,
                medical_terms,
                statistical_data,
                research_citations,
                algorithm_version,
                analysis_date,
            },
            issues: reader.issues,
        })
    }
}

/// Extract with the default category weights.
pub fn extract(input: Option<&Value>) -> ArtResult<Extraction> {
    ParameterExtractor::default().extract(input)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Look a key up by its camelCase name, accepting the snake_case spelling too.
fn lookup<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match obj.get(key) {
        Some(Value::Null) | None => obj
            .get(&snake_case(key))
            .filter(|v| !v.is_null()),
        found => found,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

#[derive(Default)]
struct Reader {
    issues: Vec<InputIssue>,
}

impl Reader {
    fn clamp_unit(&mut self, field: &str, value: f64) -> f64 {
        let clamped = value.clamp(0.0, 1.0);
        if clamped != value {
            self.issues.push(InputIssue::Clamped {
                field: field.to_string(),
                value,
                clamped,
            });
        }
        clamped
    }

    fn unit(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        default: f64,
        report_missing: bool,
    ) -> f64 {
        match lookup(obj, key) {
            None => {
                if report_missing {
                    self.issues.push(InputIssue::Defaulted {
                        field: key.to_string(),
                    });
                }
                default
            }
            Some(value) => match as_number(value) {
                Some(v) => self.clamp_unit(key, v),
                None => {
                    self.issues.push(InputIssue::Unrecognized {
                        field: key.to_string(),
                        value: value.to_string(),
                    });
                    default
                }
            },
        }
    }

    fn named<T: Default>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> T {
        match lookup(obj, key) {
            None => {
                self.issues.push(InputIssue::Defaulted {
                    field: key.to_string(),
                });
                T::default()
            }
            Some(value) => match value.as_str().and_then(&parse) {
                Some(parsed) => parsed,
                None => {
                    self.issues.push(InputIssue::Unrecognized {
                        field: key.to_string(),
                        value: value.to_string(),
                    });
                    T::default()
                }
            },
        }
    }

    fn emotional_mix(&mut self, obj: &Map<String, Value>) -> BTreeMap<Emotion, f64> {
        let mut mix = BTreeMap::new();
        let Some(value) = lookup(obj, "emotionalMix") else {
            return mix;
        };
        let Some(entries) = value.as_object() else {
            self.issues.push(InputIssue::Unrecognized {
                field: "emotionalMix".to_string(),
                value: value.to_string(),
            });
            return mix;
        };

        for (name, intensity) in entries {
            let field = format!("emotionalMix.{name}");
            let Some(emotion) = Emotion::parse(name) else {
                self.issues.push(InputIssue::Unrecognized {
                    field,
                    value: name.clone(),
                });
                continue;
            };
            match as_number(intensity) {
                Some(v) => {
                    let v = self.clamp_unit(&field, v);
                    mix.insert(emotion, v);
                }
                None => self.issues.push(InputIssue::Skipped {
                    field,
                    reason: format!("intensity is {}", json_type(intensity)),
                }),
            }
        }
        mix
    }

    fn medical_terms(&mut self, obj: &Map<String, Value>, weights: &CategoryWeights) -> MedicalTerms {
        let mut terms: MedicalTerms = TermCategory::ALL
            .into_iter()
            .map(|c| (c, BTreeMap::new()))
            .collect();

        let Some(value) = lookup(obj, "medicalTerms") else {
            return terms;
        };
        let Some(categories) = value.as_object() else {
            self.issues.push(InputIssue::Unrecognized {
                field: "medicalTerms".to_string(),
                value: value.to_string(),
            });
            return terms;
        };

        for (name, entries) in categories {
            let Some(category) = TermCategory::parse(name) else {
                self.issues.push(InputIssue::Unrecognized {
                    field: "medicalTerms".to_string(),
                    value: name.clone(),
                });
                continue;
            };
            let Some(entries) = entries.as_object() else {
                self.issues.push(InputIssue::Skipped {
                    field: format!("medicalTerms.{name}"),
                    reason: format!("expected object, got {}", json_type(entries)),
                });
                continue;
            };

            let bucket = terms.entry(category).or_default();
            for (term, raw) in entries {
                let field = format!("medicalTerms.{name}.{term}");
                // Either `{ "count": n, ... }` or a bare count.
                let count = match raw {
                    Value::Object(fields) => fields.get("count").and_then(as_number),
                    other => as_number(other),
                };
                let Some(count) = count else {
                    self.issues.push(InputIssue::Skipped {
                        field,
                        reason: "missing count".to_string(),
                    });
                    continue;
                };
                let count = count.floor().clamp(0.0, u32::MAX as f64) as u32;
                if count == 0 {
                    self.issues.push(InputIssue::Skipped {
                        field,
                        reason: "zero occurrences".to_string(),
                    });
                    continue;
                }
                bucket.insert(
                    term.clone(),
                    TermStat {
                        count,
                        weight: count as f64 * weights.weight(category),
                    },
                );
            }
        }
        terms
    }

    fn entries<'a>(&mut self, obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
        match lookup(obj, key) {
            None => &[],
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.issues.push(InputIssue::Unrecognized {
                    field: key.to_string(),
                    value: other.to_string(),
                });
                &[]
            }
        }
    }

    fn statistics(&mut self, obj: &Map<String, Value>) -> Vec<Statistic> {
        let mut out = Vec::new();
        for (i, entry) in self.entries(obj, "statisticalData").iter().enumerate() {
            let field = format!("statisticalData[{i}]");
            let Some(fields) = entry.as_object() else {
                self.issues.push(InputIssue::Skipped {
                    field,
                    reason: format!("expected object, got {}", json_type(entry)),
                });
                continue;
            };
            let Some(value) = fields.get("value").and_then(as_number) else {
                self.issues.push(InputIssue::Skipped {
                    field,
                    reason: "missing numeric value".to_string(),
                });
                continue;
            };
            let kind = match fields.get("type").and_then(Value::as_str) {
                Some(raw) => StatisticKind::parse(raw).unwrap_or_else(|| {
                    self.issues.push(InputIssue::Unrecognized {
                        field: format!("{field}.type"),
                        value: raw.to_string(),
                    });
                    StatisticKind::Other
                }),
                None => StatisticKind::Other,
            };
            let significance =
                self.unit(fields, "significance", DEFAULT_SIGNIFICANCE, false);
            out.push(Statistic {
                kind,
                value,
                significance,
                context: fields
                    .get("context")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        out
    }

    fn citations(&mut self, obj: &Map<String, Value>) -> Vec<Citation> {
        let mut out = Vec::new();
        for (i, entry) in self.entries(obj, "researchCitations").iter().enumerate() {
            let Some(fields) = entry.as_object() else {
                self.issues.push(InputIssue::Skipped {
                    field: format!("researchCitations[{i}]"),
                    reason: format!("expected object, got {}", json_type(entry)),
                });
                continue;
            };
            out.push(Citation {
                importance: self.unit(fields, "importance", DEFAULT_CITATION_SCORE, false),
                impact: self.unit(fields, "impact", DEFAULT_CITATION_SCORE, false),
                context: fields
                    .get("context")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        out
    }

    fn algorithm_version(&mut self, obj: &Map<String, Value>, default: &str) -> String {
        match lookup(obj, "algorithmVersion") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                self.issues.push(InputIssue::Unrecognized {
                    field: "algorithmVersion".to_string(),
                    value: other.to_string(),
                });
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    fn analysis_date(&mut self, obj: &Map<String, Value>) -> Option<NaiveDate> {
        let value = lookup(obj, "analysisDate")?;
        // Accept plain dates and RFC 3339 timestamps.
        let parsed = value
            .as_str()
            .and_then(|s| s.get(0..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        if parsed.is_none() {
            self.issues.push(InputIssue::Unrecognized {
                field: "analysisDate".to_string(),
                value: value.to_string(),
            });
        }
        parsed
    }
}

impl fmt::Display for GenerationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} (evidence {:.2}, density {:.2}, {} categories, {} statistics, {} citations)",
            self.subspecialty.as_str(),
            self.dominant_emotion.as_str(),
            self.evidence_strength,
            self.technical_density,
            self.active_categories().len(),
            self.statistical_data.len(),
            self.research_citations.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_json(value: Value) -> Extraction {
        extract(Some(&value)).unwrap()
    }

    #[test]
    fn missing_record_is_an_error() {
        assert!(matches!(extract(None), Err(ArtError::InputMissing(_))));
        assert!(matches!(
            extract(Some(&Value::Null)),
            Err(ArtError::InputMissing(_))
        ));
        assert!(matches!(
            extract(Some(&json!([1, 2]))),
            Err(ArtError::InvalidInput(_))
        ));
    }

    #[test]
    fn unparseable_text_is_invalid_input() {
        let extractor = ParameterExtractor::default();
        assert!(matches!(
            extractor.extract_str("{ not json"),
            Err(ArtError::InvalidInput(_))
        ));
        assert!(matches!(
            extractor.extract_str("   "),
            Err(ArtError::InputMissing(_))
        ));
    }

    #[test]
    fn empty_object_takes_documented_defaults() {
        let out = extract_json(json!({}));
        let p = out.parameters;
        assert_eq!(p.evidence_strength, 0.5);
        assert_eq!(p.technical_density, 0.5);
        assert_eq!(p.dominant_emotion, Emotion::Confidence);
        assert_eq!(p.subspecialty, Subspecialty::SportsMedicine);
        assert_eq!(p.algorithm_version, "1.0.0");
        assert_eq!(p.medical_terms.len(), 4);
        assert!(p.medical_terms.values().all(|t| t.is_empty()));
        assert!(out
            .issues
            .iter()
            .any(|i| matches!(i, InputIssue::Defaulted { field } if field == "evidenceStrength")));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let out = extract_json(json!({
            "evidenceStrength": 1.7,
            "technicalDensity": -0.3,
            "emotionalMix": { "hope": 4.0 }
        }));
        assert_eq!(out.parameters.evidence_strength, 1.0);
        assert_eq!(out.parameters.technical_density, 0.0);
        assert_eq!(out.parameters.emotional_mix[&Emotion::Hope], 1.0);
        assert!(out.issues.iter().any(|i| matches!(
            i,
            InputIssue::Clamped { field, value, clamped }
                if field == "evidenceStrength" && *value == 1.7 && *clamped == 1.0
        )));
    }

    #[test]
    fn unrecognized_enums_fall_back() {
        let out = extract_json(json!({
            "subspecialty": "cardiology",
            "dominantEmotion": "boredom"
        }));
        assert_eq!(out.parameters.subspecialty, Subspecialty::SportsMedicine);
        assert_eq!(out.parameters.dominant_emotion, Emotion::Confidence);
        assert_eq!(
            out.issues
                .iter()
                .filter(|i| matches!(i, InputIssue::Unrecognized { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn enum_names_are_case_and_separator_insensitive() {
        assert_eq!(
            Subspecialty::parse("shoulder_elbow"),
            Some(Subspecialty::ShoulderElbow)
        );
        assert_eq!(
            Subspecialty::parse("Hip-Knee"),
            Some(Subspecialty::HipKnee)
        );
        assert_eq!(Emotion::parse("HOPE"), Some(Emotion::Hope));
        assert_eq!(StatisticKind::parse("p_value"), Some(StatisticKind::PValue));
    }

    #[test]
    fn term_weights_use_category_multipliers() {
        let out = extract_json(json!({
            "medicalTerms": {
                "procedures": { "tenotomy": { "count": 8 } },
                "anatomy": { "shoulder": { "count": 15, "weight": 99.0 } },
                "outcomes": { "painScore": 2 }
            }
        }));
        let p = out.parameters;
        let tenotomy = p.medical_terms[&TermCategory::Procedures]["tenotomy"];
        let shoulder = p.medical_terms[&TermCategory::Anatomy]["shoulder"];
        assert_eq!(tenotomy.count, 8);
        assert_eq!(tenotomy.weight, 8.0);
        assert_eq!(shoulder.count, 15);
        assert!((shoulder.weight - 12.0).abs() < 1e-9);
        assert_eq!(p.term_count(TermCategory::Outcomes), 2);
        assert_eq!(
            p.active_categories(),
            vec![
                TermCategory::Procedures,
                TermCategory::Anatomy,
                TermCategory::Outcomes
            ]
        );
    }

    #[test]
    fn malformed_list_entries_are_skipped_individually() {
        let out = extract_json(json!({
            "statisticalData": [
                { "type": "pValue", "value": 0.01, "significance": 0.9 },
                "garbage",
                { "type": "percentage" },
                { "type": "hazardRatio", "value": 1.4, "significance": 2.0, "context": "HR" }
            ],
            "researchCitations": [ { "importance": 0.8, "impact": 0.4 }, 7 ]
        }));
        let p = out.parameters;
        assert_eq!(p.statistical_data.len(), 2);
        assert_eq!(p.statistical_data[1].kind, StatisticKind::Other);
        assert_eq!(p.statistical_data[1].significance, 1.0);
        assert_eq!(p.statistical_data[1].context.as_deref(), Some("HR"));
        assert_eq!(p.research_citations.len(), 1);
        assert_eq!(
            out.issues
                .iter()
                .filter(|i| matches!(i, InputIssue::Skipped { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let out = extract_json(json!({ "evidence_strength": 0.85, "dominant_emotion": "hope" }));
        assert_eq!(out.parameters.evidence_strength, 0.85);
        assert_eq!(out.parameters.dominant_emotion, Emotion::Hope);
    }

    #[test]
    fn record_version_wins_over_extractor_default() {
        let extractor = ParameterExtractor::default().with_algorithm_version("3.0.0");
        let defaulted = extractor.extract(Some(&json!({}))).unwrap();
        assert_eq!(defaulted.parameters.algorithm_version, "3.0.0");
        let explicit = extractor
            .extract(Some(&json!({ "algorithmVersion": "1.2.0" })))
            .unwrap();
        assert_eq!(explicit.parameters.algorithm_version, "1.2.0");
    }

    #[test]
    fn analysis_date_accepts_timestamps() {
        let out = extract_json(json!({ "analysisDate": "2024-03-15T10:00:00Z" }));
        assert_eq!(
            out.parameters.analysis_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        let out = extract_json(json!({ "analysisDate": "soon" }));
        assert_eq!(out.parameters.analysis_date, None);
    }

    #[test]
    fn seed_is_stable_and_sensitive() {
        let a = GenerationParameters::sample(7);
        let b = GenerationParameters::sample(7);
        assert_eq!(a, b);
        assert_eq!(a.seed(), b.seed());

        let mut c = a.clone();
        c.algorithm_version = "2.0.0".to_string();
        assert_ne!(a.seed(), c.seed());
    }

    #[test]
    fn parameters_survive_json() {
        let p = GenerationParameters::sample(11);
        let text = serde_json::to_string(&p).unwrap();
        let back: GenerationParameters = serde_json::from_str(&text).unwrap();
        assert_eq!(p, back);
    }
}
