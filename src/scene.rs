//! The scene graph: typed visual elements in draw order.

use crate::params::{Emotion, StatisticKind, Subspecialty, TermCategory};
use crate::rarity::RarityTier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `distance` from `self` along `angle_deg` (SVG coordinates, y down).
    pub fn polar(self, angle_deg: f64, distance: f64) -> Self {
        let rad = angle_deg.to_radians();
        Self {
            x: self.x + rad.cos() * distance,
            y: self.y + rad.sin() * distance,
        }
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Vertices of a regular polygon, first vertex at `rotation_deg`.
pub fn regular_polygon(center: Point, radius: f64, sides: u32, rotation_deg: f64) -> Vec<Point> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| center.polar(rotation_deg + i as f64 * 360.0 / sides as f64, radius))
        .collect()
}

/// Alternating outer/inner vertices of a star.
pub fn star(center: Point, outer: f64, inner: f64, points: u32) -> Vec<Point> {
    let points = points.max(3);
    let step = 180.0 / points as f64;
    (0..points * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            center.polar(-90.0 + i as f64 * step, r)
        })
        .collect()
}

/// Shapes available for symbols and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Glyph {
    Circle,
    Triangle,
    Square,
    Diamond,
    Pentagon,
    Hexagon,
    Octagon,
    Star,
    Cross,
}

impl Glyph {
    /// Outline vertices fitting a box of half-size `size`; `None` for circles.
    pub fn outline(self, center: Point, size: f64) -> Option<Vec<Point>> {
        let points = match self {
            Glyph::Circle => return None,
            Glyph::Triangle => regular_polygon(center, size, 3, -90.0),
            Glyph::Square => regular_polygon(center, size * std::f64::consts::SQRT_2, 4, 45.0),
            Glyph::Diamond => regular_polygon(center, size, 4, -90.0),
            Glyph::Pentagon => regular_polygon(center, size, 5, -90.0),
            Glyph::Hexagon => regular_polygon(center, size, 6, 0.0),
            Glyph::Octagon => regular_polygon(center, size, 8, 22.5),
            Glyph::Star => star(center, size, size * 0.45, 5),
            Glyph::Cross => {
                let a = size;
                let b = size / 3.0;
                [
                    (-b, -a),
                    (b, -a),
                    (b, -b),
                    (a, -b),
                    (a, b),
                    (b, b),
                    (b, a),
                    (-b, a),
                    (-b, b),
                    (-a, b),
                    (-a, -b),
                    (-b, -b),
                ]
                .into_iter()
                .map(|(dx, dy)| Point::new(center.x + dx, center.y + dy))
                .collect()
            }
        };
        Some(points)
    }
}

/// Center glyph of a signature overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayShape {
    Circle,
    Square,
    Star,
    Hexagon,
    Triangle,
    Diamond,
}

impl OverlayShape {
    pub fn glyph(self) -> Glyph {
        match self {
            OverlayShape::Circle => Glyph::Circle,
            OverlayShape::Square => Glyph::Square,
            OverlayShape::Star => Glyph::Star,
            OverlayShape::Hexagon => Glyph::Hexagon,
            OverlayShape::Triangle => Glyph::Triangle,
            OverlayShape::Diamond => Glyph::Diamond,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationKind {
    Pulse,
    Sway,
    Flow,
    Twinkle,
    Breathe,
    Rotate,
}

impl AnimationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationKind::Pulse => "pulse",
            AnimationKind::Sway => "sway",
            AnimationKind::Flow => "flow",
            AnimationKind::Twinkle => "twinkle",
            AnimationKind::Breathe => "breathe",
            AnimationKind::Rotate => "rotate",
        }
    }
}

/// Static animation parameters. Timing and easing belong to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub kind: AnimationKind,
    pub amplitude: f64,
    /// Seconds per cycle.
    pub period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Hex color, e.g. `#3b82f6`.
    pub color: String,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
}

impl Style {
    pub fn new(color: impl Into<String>, opacity: f64) -> Self {
        Self {
            color: color.into(),
            opacity,
            animation: None,
        }
    }

    pub fn animated(mut self, kind: AnimationKind, amplitude: f64, period: f64) -> Self {
        self.animation = Some(Animation {
            kind,
            amplitude,
            period,
        });
        self
    }
}

/// A quadratic curve from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub start: Point,
    pub control: Point,
    pub end: Point,
    /// Absolute direction in degrees, SVG coordinates.
    pub angle: f64,
    pub thickness: f64,
    pub style: Style,
}

impl Stroke {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub category: TermCategory,
    pub path: Stroke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClusterShape {
    Polygon {
        sides: u32,
        radius: f64,
        rotation: f64,
    },
    Network {
        ring_radius: f64,
        node_radius: f64,
        nodes: Vec<Point>,
        links: Vec<(usize, usize)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub category: TermCategory,
    pub term: String,
    pub center: Point,
    pub shape: ClusterShape,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub statistic: StatisticKind,
    pub start: Point,
    pub control: Point,
    pub end: Point,
    pub thickness: f64,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchNode {
    /// Position within the constellation.
    pub index: usize,
    pub center: Point,
    pub radius: f64,
    /// Constellation indices this node links forward to.
    pub links: Vec<usize>,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub emotion: Emotion,
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    pub intensity: f64,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub subspecialty: Subspecialty,
    pub glyph: Glyph,
    pub center: Point,
    pub size: f64,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MarkKind {
    Ring { thickness: f64 },
    Particle,
    Overlay { shape: OverlayShape },
    RaritySymbol { tier: RarityTier },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub mark: MarkKind,
    pub center: Point,
    /// Radius for rings and particles, half-size for glyphs.
    pub size: f64,
    pub style: Style,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Root,
    Trunk,
    Branch,
    MedicalCluster,
    DataStream,
    ResearchNode,
    EmotionalField,
    SubspecialtySymbol,
    SignatureMark,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Root => "root",
            ElementKind::Trunk => "trunk",
            ElementKind::Branch => "branch",
            ElementKind::MedicalCluster => "medicalCluster",
            ElementKind::DataStream => "dataStream",
            ElementKind::ResearchNode => "researchNode",
            ElementKind::EmotionalField => "emotionalField",
            ElementKind::SubspecialtySymbol => "subspecialtySymbol",
            ElementKind::SignatureMark => "signatureMark",
        }
    }
}

/// One drawable element of the artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualElement {
    Root(Stroke),
    Trunk(Stroke),
    Branch(Branch),
    MedicalCluster(Cluster),
    DataStream(Stream),
    ResearchNode(ResearchNode),
    EmotionalField(Field),
    SubspecialtySymbol(Symbol),
    SignatureMark(Mark),
}

impl VisualElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            VisualElement::Root(_) => ElementKind::Root,
            VisualElement::Trunk(_) => ElementKind::Trunk,
            VisualElement::Branch(_) => ElementKind::Branch,
            VisualElement::MedicalCluster(_) => ElementKind::MedicalCluster,
            VisualElement::DataStream(_) => ElementKind::DataStream,
            VisualElement::ResearchNode(_) => ElementKind::ResearchNode,
            VisualElement::EmotionalField(_) => ElementKind::EmotionalField,
            VisualElement::SubspecialtySymbol(_) => ElementKind::SubspecialtySymbol,
            VisualElement::SignatureMark(_) => ElementKind::SignatureMark,
        }
    }

    pub fn style(&self) -> &Style {
        match self {
            VisualElement::Root(s) | VisualElement::Trunk(s) => &s.style,
            VisualElement::Branch(b) => &b.path.style,
            VisualElement::MedicalCluster(c) => &c.style,
            VisualElement::DataStream(s) => &s.style,
            VisualElement::ResearchNode(n) => &n.style,
            VisualElement::EmotionalField(f) => &f.style,
            VisualElement::SubspecialtySymbol(s) => &s.style,
            VisualElement::SignatureMark(m) => &m.style,
        }
    }

    /// Visual center of mass used for composition balance.
    pub fn anchor(&self) -> Point {
        match self {
            VisualElement::Root(s) | VisualElement::Trunk(s) => s.start.midpoint(s.end),
            VisualElement::Branch(b) => b.path.start.midpoint(b.path.end),
            VisualElement::MedicalCluster(c) => c.center,
            VisualElement::DataStream(s) => s.start.midpoint(s.end),
            VisualElement::ResearchNode(n) => n.center,
            VisualElement::EmotionalField(f) => f.center,
            VisualElement::SubspecialtySymbol(s) => s.center,
            VisualElement::SignatureMark(m) => m.center,
        }
    }

    /// Approximate painted area.
    pub fn area(&self) -> f64 {
        use std::f64::consts::PI;
        match self {
            VisualElement::Root(s) | VisualElement::Trunk(s) => s.length() * s.thickness,
            VisualElement::Branch(b) => b.path.length() * b.path.thickness,
            VisualElement::MedicalCluster(c) => match &c.shape {
                ClusterShape::Polygon { radius, .. } => PI * radius * radius,
                ClusterShape::Network { ring_radius, .. } => PI * ring_radius * ring_radius,
            },
            VisualElement::DataStream(s) => s.start.distance(s.end) * s.thickness,
            VisualElement::ResearchNode(n) => PI * n.radius * n.radius,
            VisualElement::EmotionalField(f) => PI * f.radius_x * f.radius_y,
            VisualElement::SubspecialtySymbol(s) => 4.0 * s.size * s.size,
            VisualElement::SignatureMark(m) => PI * m.size * m.size,
        }
    }
}

/// Radial background gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub center: String,
    pub edge: String,
}

/// Ordered visual elements plus canvas and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Gradient,
    /// Back-to-front draw order.
    pub elements: Vec<VisualElement>,
}

impl Scene {
    pub fn new(width: f64, height: f64, background: Gradient) -> Self {
        Self {
            width,
            height,
            background,
            elements: Vec::new(),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_follows_svg_axes() {
        let o = Point::new(0.0, 0.0);
        let down = o.polar(90.0, 10.0);
        assert!(down.x.abs() < 1e-9);
        assert!((down.y - 10.0).abs() < 1e-9);
        let left = o.polar(180.0, 10.0);
        assert!((left.x + 10.0).abs() < 1e-9);
    }

    #[test]
    fn polygons_have_requested_vertex_count() {
        let pts = regular_polygon(Point::new(5.0, 5.0), 15.0, 11, 0.0);
        assert_eq!(pts.len(), 11);
        for p in &pts {
            assert!((p.distance(Point::new(5.0, 5.0)) - 15.0).abs() < 1e-9);
        }
        assert_eq!(star(Point::new(0.0, 0.0), 10.0, 4.0, 5).len(), 10);
        assert!(Glyph::Circle.outline(Point::new(0.0, 0.0), 4.0).is_none());
        assert_eq!(
            Glyph::Cross
                .outline(Point::new(0.0, 0.0), 6.0)
                .map(|p| p.len()),
            Some(12)
        );
    }

    #[test]
    fn elements_serialize_with_kind_tag() {
        let el = VisualElement::ResearchNode(ResearchNode {
            index: 0,
            center: Point::new(1.0, 2.0),
            radius: 3.5,
            links: vec![1, 2],
            style: Style::new("#fbbf24", 0.8),
        });
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["kind"], "researchNode");
        let back: VisualElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }
}
