//! SVG rendering with embedded, machine-readable metadata.
//!
//! Every `id` in the document is suffixed with the artwork id so several
//! artworks can be inlined on one page. The metadata record is stored as
//! JSON inside `<metadata><andry:artwork>` and can be read back with
//! [`extract_metadata`].

use crate::analysis::PatternMetadata;
use crate::error::{ArtError, ArtResult};
use crate::params::GenerationParameters;
use crate::rarity::{RarityScore, RarityTier, UniquenessFactors};
use crate::scene::{
    regular_polygon, star, ClusterShape, Glyph, MarkKind, Point, Scene, Style, VisualElement,
};
use crate::signature::Signature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// XML namespace of the embedded metadata element.
pub const ANDRY_NS: &str = "https://andry.art/ns/artwork/1";

const WATERMARK_COLOR: &str = "#ffffff";

/// Everything a downstream reader needs without re-running generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub artwork_id: String,
    /// Artwork version, 1 for the first generation.
    pub version: u32,
    pub algorithm_version: String,
    pub seed: u64,
    pub parameters: GenerationParameters,
    pub pattern_metadata: PatternMetadata,
    pub uniqueness_factors: UniquenessFactors,
    pub rarity_score: RarityScore,
    pub rarity_tier: RarityTier,
    pub signature_id: String,
}

/// Whether `c` may appear in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escape text for XML content and attribute values.
///
/// Whitespace controls become character references so attribute values
/// keep them; characters XML cannot carry become U+FFFD.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if !is_xml_char(c) => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    out
}

/// Reduce an artwork id to characters that are safe inside XML ids.
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "artwork".to_string()
    } else {
        cleaned
    }
}

/// Format a coordinate with at most two decimals. Non-finite numbers cannot
/// be written to the document.
fn num(value: f64) -> ArtResult<String> {
    if !value.is_finite() {
        return Err(ArtError::serialization(format!(
            "non-finite number {value} in scene"
        )));
    }
    let mut s = format!("{:.2}", value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    Ok(s)
}

fn points(pts: &[Point]) -> ArtResult<String> {
    let mut out = String::new();
    for (i, p) in pts.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write!(out, "{},{}", num(p.x)?, num(p.y)?)?;
    }
    Ok(out)
}

fn curve(start: Point, control: Point, end: Point) -> ArtResult<String> {
    Ok(format!(
        "M{} {} Q{} {} {} {}",
        num(start.x)?,
        num(start.y)?,
        num(control.x)?,
        num(control.y)?,
        num(end.x)?,
        num(end.y)?
    ))
}

/// Opacity plus the static animation descriptor, if any.
fn paint(style: &Style) -> ArtResult<String> {
    let mut out = format!(r#" opacity="{}""#, num(style.opacity)?);
    if let Some(animation) = &style.animation {
        write!(
            out,
            r#" data-animation="{}" data-amplitude="{}" data-period="{}""#,
            animation.kind.as_str(),
            num(animation.amplitude)?,
            num(animation.period)?
        )?;
    }
    Ok(out)
}

/// Renders scenes to SVG 1.1 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorSerializer;

impl VectorSerializer {
    pub fn render(
        &self,
        scene: &Scene,
        signature: &Signature,
        metadata: &Metadata,
    ) -> ArtResult<String> {
        let suffix = sanitize_id(&metadata.artwork_id);
        let json = encode_metadata(metadata)?;
        let s = scene.width.min(scene.height) / crate::composer::REFERENCE_SIZE;
        let (w, h) = (num(scene.width)?, num(scene.height)?);

        let mut out = String::with_capacity(8 * 1024);
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" id="andry-{suffix}" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        )?;
        writeln!(out, "  <title>Andry Tree {}</title>", escape_xml(&signature.id))?;
        writeln!(out, "  <metadata>")?;
        writeln!(
            out,
            r#"    <andry:artwork xmlns:andry="{ANDRY_NS}">{}</andry:artwork>"#,
            escape_xml(&json)
        )?;
        writeln!(out, "  </metadata>")?;

        writeln!(out, "  <defs>")?;
        writeln!(
            out,
            r#"    <radialGradient id="bg-{suffix}" cx="50%" cy="45%" r="75%">"#
        )?;
        writeln!(
            out,
            r#"      <stop offset="0%" stop-color="{}"/>"#,
            escape_xml(&scene.background.center)
        )?;
        writeln!(
            out,
            r#"      <stop offset="100%" stop-color="{}"/>"#,
            escape_xml(&scene.background.edge)
        )?;
        writeln!(out, "    </radialGradient>")?;
        writeln!(
            out,
            r#"    <filter id="glow-{suffix}" x="-50%" y="-50%" width="200%" height="200%">"#
        )?;
        writeln!(
            out,
            r#"      <feGaussianBlur stdDeviation="{}"/>"#,
            num(3.0 * s)?
        )?;
        writeln!(out, "    </filter>")?;
        writeln!(out, "  </defs>")?;

        writeln!(
            out,
            r#"  <rect id="background-{suffix}" width="100%" height="100%" fill="url(#bg-{suffix})"/>"#
        )?;

        // Link endpoints for the constellation.
        let stars: BTreeMap<usize, Point> = scene
            .elements
            .iter()
            .filter_map(|e| match e {
                VisualElement::ResearchNode(n) => Some((n.index, n.center)),
                _ => None,
            })
            .collect();

        writeln!(out, r#"  <g id="scene-{suffix}">"#)?;
        for element in &scene.elements {
            out.push_str("    ");
            write_element(&mut out, element, &suffix, &stars)?;
            out.push('\n');
        }
        writeln!(out, "  </g>")?;

        writeln!(
            out,
            r#"  <text id="watermark-{suffix}" x="{}" y="{}" font-family="monospace" font-size="{}" fill="{WATERMARK_COLOR}" opacity="0.35">Andry Tree v{} · {}</text>"#,
            num(8.0 * s)?,
            num(scene.height - 8.0 * s)?,
            num(9.0 * s)?,
            escape_xml(&metadata.algorithm_version),
            escape_xml(&signature.id)
        )?;
        out.push_str("</svg>\n");
        verify_document(&out, metadata)?;

        tracing::debug!(bytes = out.len(), id = %metadata.artwork_id, "svg rendered");
        Ok(out)
    }
}

/// Encode metadata as JSON that XML can carry verbatim.
///
/// Characters outside the XML character set can only sit inside JSON
/// strings, where a `\uXXXX` escape decodes back to the same character.
fn encode_metadata(metadata: &Metadata) -> ArtResult<String> {
    let json = serde_json::to_string(metadata)
        .map_err(|e| ArtError::serialization(format!("failed to encode metadata: {e}")))?;
    if json.chars().all(is_xml_char) {
        return Ok(json);
    }
    let mut out = String::with_capacity(json.len() + 16);
    for c in json.chars() {
        if is_xml_char(c) {
            out.push(c);
        } else {
            write!(out, "\\u{:04x}", c as u32)?;
        }
    }
    Ok(out)
}

/// The finished document must parse and give back exactly `metadata`.
/// Non-finite numbers become `null` in JSON, so they fail here too.
fn verify_document(svg: &str, metadata: &Metadata) -> ArtResult<()> {
    let recovered = extract_metadata(svg).map_err(|e| {
        ArtError::serialization(format!("rendered document is unreadable: {e}"))
    })?;
    if recovered != *metadata {
        return Err(ArtError::serialization(
            "embedded metadata does not round-trip",
        ));
    }
    Ok(())
}

fn write_glyph(
    out: &mut String,
    class: &str,
    glyph: Glyph,
    center: Point,
    size: f64,
    fill: &str,
    style: &Style,
) -> ArtResult<()> {
    match glyph.outline(center, size) {
        None => write!(
            out,
            r#"<circle class="{class}" cx="{}" cy="{}" r="{}" {fill}{}/>"#,
            num(center.x)?,
            num(center.y)?,
            num(size)?,
            paint(style)?
        )?,
        Some(outline) => write!(
            out,
            r#"<polygon class="{class}" points="{}" {fill}{}/>"#,
            points(&outline)?,
            paint(style)?
        )?,
    }
    Ok(())
}

fn write_element(
    out: &mut String,
    element: &VisualElement,
    suffix: &str,
    stars: &BTreeMap<usize, Point>,
) -> ArtResult<()> {
    match element {
        VisualElement::Root(stroke) | VisualElement::Trunk(stroke) => {
            write!(
                out,
                r#"<path class="{}" d="{}" stroke="{}" stroke-width="{}" fill="none" stroke-linecap="round"{}/>"#,
                element.kind().as_str(),
                curve(stroke.start, stroke.control, stroke.end)?,
                escape_xml(&stroke.style.color),
                num(stroke.thickness)?,
                paint(&stroke.style)?
            )?;
        }
        VisualElement::Branch(branch) => {
            let path = &branch.path;
            write!(
                out,
                r#"<path class="branch branch-{}" d="{}" stroke="{}" stroke-width="{}" fill="none" stroke-linecap="round"{}/>"#,
                branch.category.as_str(),
                curve(path.start, path.control, path.end)?,
                escape_xml(&path.style.color),
                num(path.thickness)?,
                paint(&path.style)?
            )?;
        }
        VisualElement::MedicalCluster(cluster) => {
            let color = escape_xml(&cluster.style.color);
            let term = escape_xml(&cluster.term);
            match &cluster.shape {
                ClusterShape::Polygon {
                    sides,
                    radius,
                    rotation,
                } => {
                    let outline = regular_polygon(cluster.center, *radius, *sides, *rotation);
                    write!(
                        out,
                        r#"<polygon class="cluster cluster-{}" data-term="{term}" points="{}" fill="{color}" fill-opacity="0.35" stroke="{color}" stroke-width="1.5"{}/>"#,
                        cluster.category.as_str(),
                        points(&outline)?,
                        paint(&cluster.style)?
                    )?;
                }
                ClusterShape::Network {
                    node_radius,
                    nodes,
                    links,
                    ..
                } => {
                    write!(
                        out,
                        r#"<g class="cluster cluster-{}" data-term="{term}"{}>"#,
                        cluster.category.as_str(),
                        paint(&cluster.style)?
                    )?;
                    for &(a, b) in links {
                        if let (Some(p), Some(q)) = (nodes.get(a), nodes.get(b)) {
                            write!(
                                out,
                                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-width="0.8"/>"#,
                                num(p.x)?,
                                num(p.y)?,
                                num(q.x)?,
                                num(q.y)?
                            )?;
                        }
                    }
                    for node in nodes {
                        write!(
                            out,
                            r#"<circle cx="{}" cy="{}" r="{}" fill="{color}"/>"#,
                            num(node.x)?,
                            num(node.y)?,
                            num(*node_radius)?
                        )?;
                    }
                    out.push_str("</g>");
                }
            }
        }
        VisualElement::DataStream(stream) => {
            write!(
                out,
                r#"<path class="stream stream-{}" d="{}" stroke="{}" stroke-width="{}" fill="none" stroke-dasharray="6 4"{}/>"#,
                stream.statistic.as_str(),
                curve(stream.start, stream.control, stream.end)?,
                escape_xml(&stream.style.color),
                num(stream.thickness)?,
                paint(&stream.style)?
            )?;
        }
        VisualElement::ResearchNode(node) => {
            let color = escape_xml(&node.style.color);
            write!(out, r#"<g class="research-node"{}>"#, paint(&node.style)?)?;
            for target in node.links.iter().filter_map(|j| stars.get(j)) {
                write!(
                    out,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-width="0.6" stroke-opacity="0.5"/>"#,
                    num(node.center.x)?,
                    num(node.center.y)?,
                    num(target.x)?,
                    num(target.y)?
                )?;
            }
            write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{color}" filter="url(#glow-{suffix})"/><circle cx="{}" cy="{}" r="{}" fill="{color}"/></g>"#,
                num(node.center.x)?,
                num(node.center.y)?,
                num(node.radius * 1.6)?,
                num(node.center.x)?,
                num(node.center.y)?,
                num(node.radius)?
            )?;
        }
        VisualElement::EmotionalField(field) => {
            write!(
                out,
                r#"<ellipse class="field field-{}" cx="{}" cy="{}" rx="{}" ry="{}" fill="{}" filter="url(#glow-{suffix})"{}/>"#,
                field.emotion.as_str(),
                num(field.center.x)?,
                num(field.center.y)?,
                num(field.radius_x)?,
                num(field.radius_y)?,
                escape_xml(&field.style.color),
                paint(&field.style)?
            )?;
        }
        VisualElement::SubspecialtySymbol(symbol) => {
            let fill = format!(
                r#"fill="none" stroke="{}" stroke-width="1.5""#,
                escape_xml(&symbol.style.color)
            );
            let class = format!("symbol symbol-{}", symbol.subspecialty.as_str());
            write_glyph(
                out,
                &class,
                symbol.glyph,
                symbol.center,
                symbol.size,
                &fill,
                &symbol.style,
            )?;
        }
        VisualElement::SignatureMark(mark) => {
            let color = escape_xml(&mark.style.color);
            match &mark.mark {
                MarkKind::Ring { thickness } => write!(
                    out,
                    r#"<circle class="signature-ring" cx="{}" cy="{}" r="{}" fill="none" stroke="{color}" stroke-width="{}"{}/>"#,
                    num(mark.center.x)?,
                    num(mark.center.y)?,
                    num(mark.size)?,
                    num(*thickness)?,
                    paint(&mark.style)?
                )?,
                MarkKind::Particle => write!(
                    out,
                    r#"<circle class="signature-particle" cx="{}" cy="{}" r="{}" fill="{color}"{}/>"#,
                    num(mark.center.x)?,
                    num(mark.center.y)?,
                    num(mark.size)?,
                    paint(&mark.style)?
                )?,
                MarkKind::Overlay { shape } => write_glyph(
                    out,
                    "signature-overlay",
                    shape.glyph(),
                    mark.center,
                    mark.size,
                    &format!(r#"fill="{color}""#),
                    &mark.style,
                )?,
                MarkKind::RaritySymbol { tier } => write!(
                    out,
                    r#"<polygon class="rarity rarity-{}" points="{}" fill="{color}"{}/>"#,
                    tier.as_str(),
                    points(&star(mark.center, mark.size, mark.size * 0.45, 4))?,
                    paint(&mark.style)?
                )?,
            }
        }
    }
    Ok(())
}

/// Recover the metadata record from a rendered document.
pub fn extract_metadata(svg: &str) -> ArtResult<Metadata> {
    let doc = roxmltree::Document::parse(svg)
        .map_err(|e| ArtError::extraction(format!("failed to parse svg xml: {e}")))?;
    let node = doc
        .descendants()
        .find(|n| n.has_tag_name((ANDRY_NS, "artwork")))
        .ok_or_else(|| ArtError::extraction("missing andry:artwork metadata element"))?;
    let json = node
        .text()
        .ok_or_else(|| ArtError::extraction("andry:artwork element is empty"))?;
    serde_json::from_str(json)
        .map_err(|e| ArtError::extraction(format!("failed to decode metadata json: {e}")))
}
