use std::fs;

use andry_art::params::{Emotion, TermCategory};
use andry_art::scene::{ClusterShape, ElementKind, VisualElement};
use andry_art::{extract_metadata, ArtError, ArtworkHistory, Engine, GenerationParameters};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn load(name: &str) -> GenerationParameters {
    let text = fs::read_to_string(format!("tests/data/{name}")).unwrap();
    Engine::default()
        .extractor()
        .extract_str(&text)
        .unwrap()
        .parameters
}

#[test]
fn shoulder_elbow_scenario() {
    let params = load("shoulder_elbow.json");
    let artwork = Engine::default()
        .generate(params, Utc.timestamp_opt(0, 0).unwrap())
        .unwrap();
    let scene = &artwork.scene;

    assert_eq!(scene.count(ElementKind::Root), 6);
    assert_eq!(scene.count(ElementKind::Branch), 2);

    let clusters: Vec<_> = scene
        .elements
        .iter()
        .filter_map(|e| match e {
            VisualElement::MedicalCluster(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(clusters.len(), 2);

    let tenotomy = clusters.iter().find(|c| c.term == "tenotomy").unwrap();
    assert_eq!(tenotomy.category, TermCategory::Procedures);
    assert!(matches!(tenotomy.shape, ClusterShape::Polygon { sides: 11, .. }));

    let shoulder = clusters.iter().find(|c| c.term == "shoulder").unwrap();
    match &shoulder.shape {
        ClusterShape::Network { nodes, .. } => assert_eq!(nodes.len(), 15),
        other => panic!("expected a network, got {other:?}"),
    }

    assert_eq!(artwork.pattern_metadata.branch_distribution.balance_ratio, 1.0);
    assert_eq!(artwork.pattern_metadata.tree_complexity, 8);
    assert_eq!(artwork.rarity_tier, artwork.rarity_score.tier());
}

#[test]
fn documents_are_byte_identical() {
    let params = load("full_record.json");
    let a = Engine::default()
        .generate(params.clone(), Utc.timestamp_opt(100, 0).unwrap())
        .unwrap();
    let b = Engine::default()
        .generate(params, Utc.timestamp_opt(999_999, 0).unwrap())
        .unwrap();

    assert_eq!(a.vector_document, b.vector_document);
    assert_eq!(a.signature, b.signature);
    assert_eq!(a.id, b.id);
}

#[test]
fn metadata_round_trips_through_the_document() {
    for name in ["shoulder_elbow.json", "full_record.json"] {
        let artwork = Engine::default()
            .generate(load(name), Utc::now())
            .unwrap();
        let extracted = extract_metadata(&artwork.vector_document).unwrap();
        assert_eq!(extracted, artwork.metadata(), "{name}");
        assert_eq!(extracted.signature_id, artwork.signature.id);
    }
}

#[test]
fn full_record_builds_every_layer() {
    let params = load("full_record.json");
    assert!(params.analysis_date.is_some());
    let artwork = Engine::default().generate(params, Utc::now()).unwrap();
    let scene = &artwork.scene;

    assert_eq!(scene.count(ElementKind::Trunk), 1);
    assert_eq!(scene.count(ElementKind::Branch), 4);
    assert_eq!(scene.count(ElementKind::DataStream), 3);
    assert_eq!(scene.count(ElementKind::ResearchNode), 3);
    // Tension at 0.09 stays below the field threshold.
    assert_eq!(scene.count(ElementKind::EmotionalField), 2);
    assert_eq!(scene.count(ElementKind::SubspecialtySymbol), 1);
    assert!(scene.count(ElementKind::SignatureMark) > 0);
    assert!(artwork.id.starts_with("AT-20240502-"));

    let kinds: Vec<ElementKind> = scene.elements.iter().map(|e| e.kind()).collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
}

#[test]
fn out_of_range_input_is_clamped() {
    let engine = Engine::default();
    let (artwork, issues) = engine
        .generate_from_json(
            Some(&json!({ "evidenceStrength": 3.2, "technicalDensity": -1 })),
            Utc::now(),
        )
        .unwrap();
    assert_eq!(artwork.parameters.evidence_strength, 1.0);
    assert_eq!(artwork.parameters.technical_density, 0.0);
    assert_eq!(artwork.scene.count(ElementKind::Root), 7);
    assert!(issues.iter().any(|i| i.field() == "evidenceStrength"));
}

#[test]
fn missing_input_is_fatal() {
    let engine = Engine::default();
    assert!(matches!(
        engine.generate_from_json(None, Utc::now()),
        Err(ArtError::InputMissing(_))
    ));
    assert!(matches!(
        engine.generate_from_json(Some(&serde_json::Value::Null), Utc::now()),
        Err(ArtError::InputMissing(_))
    ));
}

#[test]
fn emotion_threshold_holds_end_to_end() {
    let engine = Engine::default();
    for (intensity, fields) in [(0.09, 0), (0.10, 1)] {
        let mut params = GenerationParameters::default();
        params.emotional_mix.insert(Emotion::Healing, intensity);
        let artwork = engine.generate(params, Utc::now()).unwrap();
        assert_eq!(
            artwork.scene.count(ElementKind::EmotionalField),
            fields,
            "{intensity}"
        );
    }
}

#[test]
fn regeneration_from_document_appends_a_version() {
    let engine = Engine::default();
    let first = engine
        .generate(load("shoulder_elbow.json"), Utc::now())
        .unwrap();
    let metadata = extract_metadata(&first.vector_document).unwrap();
    let second = engine
        .regenerate_from_metadata(&metadata, "1.1.0", Utc::now())
        .unwrap();

    assert_eq!(second.version, 2);
    assert_eq!(second.parameters.algorithm_version, "1.1.0");
    assert_eq!(
        extract_metadata(&second.vector_document).unwrap().version,
        2
    );
    assert_eq!(second.scene.count(ElementKind::Root), 6);

    let mut history = ArtworkHistory::new();
    history.push(first).unwrap();
    history.push(second).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.latest().unwrap().parameters.algorithm_version, "1.1.0");
    assert_eq!(history.get(1).unwrap().parameters.algorithm_version, "1.0.0");
}

#[test]
fn every_fixture_renders_valid_svg() {
    for entry in fs::read_dir("tests/data").unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let text = fs::read_to_string(&path).unwrap();
        let artwork = Engine::default()
            .generate_from_json(Some(&serde_json::from_str(&text).unwrap()), Utc::now())
            .unwrap()
            .0;
        let doc = roxmltree::Document::parse(&artwork.vector_document).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "svg");
    }
}

#[test]
fn awkward_text_never_yields_an_unreadable_document() {
    let samples = [
        "ten\u{1}otomy",
        "x\u{FFFE}y",
        "\u{FFFF}",
        "nul\u{0}byte",
        "tab\there",
        "line\r\nbreak",
        "<&>\"'",
        "]]><!--",
        "épaule 肩 🦴",
        "del\u{7f}\u{85}\u{2028}",
    ];
    let engine = Engine::default();
    for text in samples {
        let term = |count: u32| {
            let mut entries = serde_json::Map::new();
            entries.insert(text.to_string(), json!({ "count": count }));
            serde_json::Value::Object(entries)
        };
        let record = json!({
            "evidenceStrength": 0.6,
            "medicalTerms": { "procedures": term(3), "anatomy": term(4) },
            "statisticalData": [{ "type": "pValue", "value": 0.01, "context": text }],
            "researchCitations": [{ "importance": 0.5, "impact": 0.5, "context": text }]
        });
        match engine.generate_from_json(Some(&record), Utc::now()) {
            Ok((artwork, _)) => {
                let extracted = extract_metadata(&artwork.vector_document)
                    .unwrap_or_else(|e| panic!("{text:?}: {e}"));
                assert_eq!(extracted, artwork.metadata(), "{text:?}");
                assert!(artwork.parameters.terms(TermCategory::Procedures).any(|(t, _)| t == text));
            }
            Err(err) => assert!(matches!(err, ArtError::Serialization(_)), "{text:?}: {err}"),
        }
    }
}
