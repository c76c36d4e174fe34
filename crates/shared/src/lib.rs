use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod config;

pub use config::{CreativityTable, MetricWeights, ModeSpeeds, ProfileSettings, WayClassTable};

// ============================================================================
// Geometry primitives
// ============================================================================

/// 2D point in drawing space (pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Geographic point in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Geographic bounding box (south/west/north/east, degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Box spanning `radius_km` in every direction around `center`.
    ///
    /// Uses the equirectangular approximation (111.32 km per degree of latitude),
    /// which is accurate enough for city-scale search areas.
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let dlat = radius_km / 111.32;
        let cos_lat = center.lat.to_radians().cos().abs().max(1e-6);
        let dlon = radius_km / (111.32 * cos_lat);
        Self {
            south: center.lat - dlat,
            west: center.lon - dlon,
            north: center.lat + dlat,
            east: center.lon + dlon,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }
}

/// Axis-aligned bounding box in drawing space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn max_dimension(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn min_dimension(&self) -> f64 {
        self.width().min(self.height())
    }

    pub fn center(&self) -> Point2D {
        Point2D::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

// ============================================================================
// Drawing input
// ============================================================================

/// One continuous input motion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point2D>,
}

impl Stroke {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }
}

/// All strokes of one freehand shape, in input order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Drawing {
    pub strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    /// Single-stroke drawing from `(x, y)` pairs
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            strokes: vec![Stroke::new(
                points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            )],
        }
    }

    /// All strokes concatenated into one ordered sequence
    pub fn flatten(&self) -> Vec<Point2D> {
        self.strokes
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }
}

// ============================================================================
// Shape features
// ============================================================================

/// Vertex of the flattened drawing whose interior angle qualifies as a corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    /// Index into the flattened point sequence
    pub index: usize,
    pub point: Point2D,
    /// Interior angle in degrees (180 = straight)
    pub angle_deg: f64,
    /// Interior angle below 90°
    pub sharp: bool,
}

/// Mirror-match fractions about the centroid axes, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Symmetry {
    /// Mirror across the horizontal axis
    pub horizontal: f64,
    /// Mirror across the vertical axis
    pub vertical: f64,
}

/// Cosmetic shape label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeClass {
    Circle,
    Rectangle,
    Triangle,
    Line,
    Curve,
    Zigzag,
    Spiral,
    Complex,
}

impl ShapeClass {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeClass::Circle => "circle",
            ShapeClass::Rectangle => "rectangle",
            ShapeClass::Triangle => "triangle",
            ShapeClass::Line => "line",
            ShapeClass::Curve => "curve",
            ShapeClass::Zigzag => "zigzag",
            ShapeClass::Spiral => "spiral",
            ShapeClass::Complex => "complex",
        }
    }
}

impl std::fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification result; never used for matching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class: ShapeClass,
    pub confidence: f64,
}

/// Geometric description of a drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    pub bounding_box: BoundingBox,
    pub centroid: Point2D,
    /// Width / height of the bounding box
    pub aspect_ratio: f64,
    /// Polyline length of the flattened drawing, pixels
    pub total_length: f64,
    pub corners: Vec<Corner>,
    /// Menger curvature per interior triple (normalized frame)
    pub curvature: Vec<f64>,
    pub is_closed: bool,
    pub complexity: f64,
    pub symmetry: Symmetry,
    /// Flattened points in the unit square, aspect ratio preserved
    pub normalized_path: Vec<Point2D>,
    pub classification: Classification,
    pub point_count: usize,
}

impl ShapeFeatures {
    pub fn sharp_turns(&self) -> usize {
        self.corners.iter().filter(|c| c.sharp).count()
    }

    /// Path length in units of the larger bounding-box side
    pub fn normalized_length(&self) -> f64 {
        let max_dim = self.bounding_box.max_dimension();
        if max_dim > 0.0 {
            self.total_length / max_dim
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> ShapeSummary {
        ShapeSummary {
            class: self.classification.class,
            class_confidence: self.classification.confidence,
            is_closed: self.is_closed,
            corner_count: self.corners.len(),
            sharp_turns: self.sharp_turns(),
            aspect_ratio: self.aspect_ratio,
            complexity: self.complexity,
            symmetry: self.symmetry,
        }
    }
}

/// Compact, serializable digest of `ShapeFeatures` (used for prompts and UI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSummary {
    pub class: ShapeClass,
    pub class_confidence: f64,
    pub is_closed: bool,
    pub corner_count: usize,
    pub sharp_turns: usize,
    pub aspect_ratio: f64,
    pub complexity: f64,
    pub symmetry: Symmetry,
}

impl ShapeSummary {
    /// One-sentence prose description of the shape
    pub fn describe(&self) -> String {
        let closure = if self.is_closed { "closed" } else { "open" };
        let orientation = if self.aspect_ratio > 1.3 {
            "wide"
        } else if self.aspect_ratio < 0.77 {
            "tall"
        } else {
            "roughly square"
        };
        format!(
            "A {} {} {} with {} corner(s), complexity {:.2}",
            closure, orientation, self.class, self.corner_count, self.complexity
        )
    }
}

// ============================================================================
// Routes and candidates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Walking,
    Cycling,
    Driving,
}

impl TransportMode {
    pub fn label(&self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
            TransportMode::Driving => "driving",
        }
    }

    pub fn all() -> &'static [TransportMode] {
        &[TransportMode::Walking, TransportMode::Cycling, TransportMode::Driving]
    }
}

/// Weighting policy trading point-wise fidelity for holistic resemblance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativityProfile {
    Strict,
    #[default]
    Balanced,
    Creative,
}

impl CreativityProfile {
    pub fn all() -> &'static [CreativityProfile] {
        &[
            CreativityProfile::Strict,
            CreativityProfile::Balanced,
            CreativityProfile::Creative,
        ]
    }
}

/// Externally supplied path geometry (street segment, track, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub points: Vec<GeoPoint>,
}

impl RawGeometry {
    /// Way class from the `highway` tag
    pub fn way_class(&self) -> Option<&str> {
        self.tags.get("highway").map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.7 {
            ConfidenceTier::High
        } else if confidence >= 0.4 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

/// Where a route came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    #[default]
    Matched,
    Heuristic,
    Synthetic,
    Ai,
}

/// Ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub route_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub duration_min: f64,
    #[serde(default)]
    pub similarity_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometric_similarity: Option<f64>,
    #[serde(default)]
    pub path: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_issues: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_tier: Option<ConfidenceTier>,
    #[serde(default)]
    pub source: RouteSource,
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    Geometric,
    Ai,
}

/// Stage of the fallback chain that produced the routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStage {
    Primary,
    Degraded,
    Synthetic,
    Ai,
}

/// Geocoder answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub display_name: String,
    pub center: GeoPoint,
    pub bounds: GeoBounds,
    #[serde(default)]
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub drawing: Drawing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub features: ShapeFeatures,
    pub summary: ShapeSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub drawing: Drawing,
    /// Free-text place name
    pub location: String,
    /// Skips geocoding when present
    #[serde(default)]
    pub center: Option<GeoPoint>,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub creativity: CreativityProfile,
    #[serde(default)]
    pub strategy: SearchStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_id: String,
    pub location: ResolvedLocation,
    pub stage: FallbackStage,
    pub shape: ShapeSummary,
    pub routes: Vec<Route>,
}

/// Error payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(val: &T) {
        let json = serde_json::to_string(val).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(*val, back);
    }

    fn sample_route() -> Route {
        Route {
            route_name: "Harbour loop".to_string(),
            description: "A closed rectangle".to_string(),
            distance_km: 4.2,
            duration_min: 50.0,
            similarity_score: 0.812,
            geometric_similarity: Some(0.8),
            path: vec![GeoPoint::new(52.5, 13.4), GeoPoint::new(52.51, 13.41)],
            matching_issues: None,
            confidence_tier: Some(ConfidenceTier::High),
            source: RouteSource::Matched,
        }
    }

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_from_points() {
        let pts = vec![
            Point2D::new(10.0, 5.0),
            Point2D::new(-2.0, 8.0),
            Point2D::new(4.0, -1.0),
        ];
        let b = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(b.min_x, -2.0);
        assert_eq!(b.max_x, 10.0);
        assert_eq!(b.min_y, -1.0);
        assert_eq!(b.max_y, 8.0);
        assert_eq!(b.width(), 12.0);
        assert_eq!(b.height(), 9.0);
        assert_eq!(b.max_dimension(), 12.0);
        assert_eq!(b.min_dimension(), 9.0);
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_drawing_flatten_preserves_order() {
        let drawing = Drawing::new(vec![
            Stroke::new(vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)]),
            Stroke::new(vec![Point2D::new(2.0, 0.0)]),
        ]);
        let flat = drawing.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(drawing.point_count(), 3);
        assert_eq!(flat[2], Point2D::new(2.0, 0.0));
    }

    #[test]
    fn test_geo_bounds_around() {
        let center = GeoPoint::new(0.0, 0.0);
        let b = GeoBounds::around(center, 111.32);
        assert!((b.north - 1.0).abs() < 1e-9);
        assert!((b.south + 1.0).abs() < 1e-9);
        assert!((b.east - 1.0).abs() < 1e-9);
        assert!(b.contains(&center));
        assert!(!b.contains(&GeoPoint::new(2.0, 0.0)));
        assert_eq!(b.center(), center);
    }

    #[test]
    fn test_confidence_tier_thresholds() {
        assert_eq!(ConfidenceTier::from_confidence(0.9), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.7), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.5), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.1), ConfidenceTier::Low);
    }

    #[test]
    fn test_route_serializes_camel_case() {
        let route = sample_route();
        roundtrip(&route);
        let json = serde_json::to_string(&route).unwrap();
        assert!(json.contains(r#""routeName":"Harbour loop""#));
        assert!(json.contains(r#""similarityScore":0.812"#));
        assert!(!json.contains("matchingIssues"));
    }

    #[test]
    fn test_route_accepts_minimal_ai_payload() {
        let json = r#"{"routeName":"River walk","distanceKm":3.5,"similarityScore":0.6}"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.route_name, "River walk");
        assert!(route.path.is_empty());
        assert_eq!(route.source, RouteSource::Matched);
        assert!(route.geometric_similarity.is_none());
    }

    #[test]
    fn test_enums_serde() {
        assert_eq!(serde_json::to_string(&TransportMode::Cycling).unwrap(), r#""cycling""#);
        assert_eq!(serde_json::to_string(&CreativityProfile::Strict).unwrap(), r#""strict""#);
        assert_eq!(serde_json::to_string(&ShapeClass::Zigzag).unwrap(), r#""zigzag""#);
        assert_eq!(serde_json::to_string(&FallbackStage::Degraded).unwrap(), r#""degraded""#);
        roundtrip(&SearchStrategy::Ai);
        roundtrip(&RouteSource::Synthetic);
    }

    #[test]
    fn test_search_request_defaults() {
        let json = r#"{
            "drawing": { "strokes": [ { "points": [ {"x": 0, "y": 0}, {"x": 10, "y": 10} ] } ] },
            "location": "Berlin"
        }"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.mode, TransportMode::Walking);
        assert_eq!(req.creativity, CreativityProfile::Balanced);
        assert_eq!(req.strategy, SearchStrategy::Geometric);
        assert!(req.center.is_none());
        assert_eq!(req.drawing.point_count(), 2);
    }

    #[test]
    fn test_raw_geometry_tolerates_missing_fields() {
        let geom: RawGeometry = serde_json::from_str("{}").unwrap();
        assert!(geom.points.is_empty());
        assert!(geom.way_class().is_none());

        let mut tags = BTreeMap::new();
        tags.insert("highway".to_string(), "footway".to_string());
        let geom = RawGeometry { name: None, tags, points: vec![] };
        assert_eq!(geom.way_class(), Some("footway"));
        roundtrip(&geom);
    }

    #[test]
    fn test_error_body_omits_empty_lists() {
        let body = ErrorBody {
            kind: "location_not_found".to_string(),
            message: "No match for 'Atlantis'".to_string(),
            issues: vec![],
            recommendations: vec![],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("issues"));
        roundtrip(&body);
    }

    #[test]
    fn test_shape_summary_describe() {
        let summary = ShapeSummary {
            class: ShapeClass::Rectangle,
            class_confidence: 0.8,
            is_closed: true,
            corner_count: 4,
            sharp_turns: 0,
            aspect_ratio: 1.0,
            complexity: 0.35,
            symmetry: Symmetry::default(),
        };
        let text = summary.describe();
        assert!(text.contains("closed"));
        assert!(text.contains("rectangle"));
        assert!(text.contains("4 corner"));
        roundtrip(&summary);
    }
}
