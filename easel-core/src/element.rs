//! Canvas elements - the drawable objects of a canvas session.
//!
//! Every element has an id and a position. Geometry and style fields live on
//! the [`ElementKind`] variant they belong to, so a brush never carries line
//! endpoints and a circle never carries stroke points.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::CombinedAsset;
use crate::error::{CanvasError, CanvasResult};

/// Unique identifier for an element within a canvas session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fieldless discriminant of [`ElementKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Placed image.
    Image,
    /// Text label.
    Text,
    /// Solid rectangle.
    Rect,
    /// Dashed selection rectangle.
    Dashed,
    /// Numbered marker.
    Number,
    /// Human pose figure.
    Human,
    /// Freehand brush stroke.
    Brush,
    /// Eraser stroke.
    Eraser,
    /// Arrow between two points.
    Arrow,
    /// Ellipse.
    Circle,
    /// Straight line between two points.
    Line,
}

impl ElementType {
    /// Every element type, in wire order.
    pub const ALL: [Self; 11] = [
        Self::Image,
        Self::Text,
        Self::Rect,
        Self::Dashed,
        Self::Number,
        Self::Human,
        Self::Brush,
        Self::Eraser,
        Self::Arrow,
        Self::Circle,
        Self::Line,
    ];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
            Self::Rect => "rect",
            Self::Dashed => "dashed",
            Self::Number => "number",
            Self::Human => "human",
            Self::Brush => "brush",
            Self::Eraser => "eraser",
            Self::Arrow => "arrow",
            Self::Circle => "circle",
            Self::Line => "line",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific content of an element, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ElementKind {
    /// A placed image.
    Image {
        /// Image URL.
        src: String,
    },

    /// A text label.
    Text {
        /// Text content.
        text: String,
        /// Font size in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
        /// Font family name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        /// Text color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },

    /// A solid rectangle.
    Rect {
        /// Fill color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        /// Outline color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },

    /// A dashed rectangle, used to mark regions.
    Dashed {
        /// Outline color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        /// Dash and gap lengths.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        stroke_dash_array: Vec<f64>,
    },

    /// A numbered marker.
    Number {
        /// Number shown in the marker.
        value: u32,
        /// Marker color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },

    /// A human figure in a preset pose.
    Human {
        /// Pose key understood by the generation backend.
        pose_id: String,
        /// Preview image URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thumbnail: Option<String>,
    },

    /// A freehand brush stroke.
    Brush {
        /// Stroke path.
        points: Vec<Point>,
        /// Stroke width in pixels.
        stroke_width: f64,
        /// Stroke color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },

    /// An eraser stroke.
    Eraser {
        /// Stroke path.
        points: Vec<Point>,
        /// Stroke width in pixels.
        stroke_width: f64,
    },

    /// An arrow pointing from start to end.
    Arrow {
        /// Start X.
        start_x: f64,
        /// Start Y.
        start_y: f64,
        /// End X (arrow head).
        end_x: f64,
        /// End Y (arrow head).
        end_y: f64,
        /// Line color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },

    /// An ellipse.
    Circle {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
        /// Fill color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        /// Outline color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },

    /// A straight line.
    Line {
        /// Start X.
        start_x: f64,
        /// Start Y.
        start_y: f64,
        /// End X.
        end_x: f64,
        /// End Y.
        end_y: f64,
        /// Line color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },
}

impl ElementKind {
    /// The discriminant of this kind.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Image { .. } => ElementType::Image,
            Self::Text { .. } => ElementType::Text,
            Self::Rect { .. } => ElementType::Rect,
            Self::Dashed { .. } => ElementType::Dashed,
            Self::Number { .. } => ElementType::Number,
            Self::Human { .. } => ElementType::Human,
            Self::Brush { .. } => ElementType::Brush,
            Self::Eraser { .. } => ElementType::Eraser,
            Self::Arrow { .. } => ElementType::Arrow,
            Self::Circle { .. } => ElementType::Circle,
            Self::Line { .. } => ElementType::Line,
        }
    }
}

/// Size, scale and rotation shared by all element types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    /// Width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Horizontal scale factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    /// Vertical scale factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Opacity between 0 and 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// A drawable object on a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    /// Unique identifier within the session.
    pub id: ElementId,
    /// X position (pixels from left).
    pub left: f64,
    /// Y position (pixels from top).
    pub top: f64,
    /// Shared size and transform fields.
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Type-specific content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl CanvasElement {
    /// Create a new element with a fresh id at the given position.
    #[must_use]
    pub fn new(kind: ElementKind, left: f64, top: f64) -> Self {
        Self {
            id: ElementId::new(),
            left,
            top,
            geometry: Geometry::default(),
            kind,
        }
    }

    /// Create an element for a library entry placed at the given position.
    ///
    /// Images become `image` elements; poses become `human` elements.
    #[must_use]
    pub fn from_asset(asset: &CombinedAsset, left: f64, top: f64) -> Self {
        let kind = match asset {
            CombinedAsset::Image(image) => ElementKind::Image {
                src: image.url().to_string(),
            },
            CombinedAsset::Pose(pose) => ElementKind::Human {
                pose_id: pose.pose_id().to_string(),
                thumbnail: Some(pose.thumbnail().to_string()),
            },
        };
        Self::new(kind, left, top)
    }

    /// Replace the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set width and height.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.geometry.width = Some(width);
        self.geometry.height = Some(height);
        self
    }

    /// The element's type.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Move the element to a new position.
    pub fn move_to(&mut self, left: f64, top: f64) {
        self.left = left;
        self.top = top;
    }

    /// Stroke path, for brush and eraser strokes.
    #[must_use]
    pub fn points(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Brush { points, .. } | ElementKind::Eraser { points, .. } => {
                Some(points.as_slice())
            }
            _ => None,
        }
    }

    /// Stroke width, for brush and eraser strokes.
    #[must_use]
    pub fn stroke_width(&self) -> Option<f64> {
        match &self.kind {
            ElementKind::Brush { stroke_width, .. } | ElementKind::Eraser { stroke_width, .. } => {
                Some(*stroke_width)
            }
            _ => None,
        }
    }

    /// Start and end points, for lines and arrows.
    #[must_use]
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match self.kind {
            ElementKind::Arrow {
                start_x,
                start_y,
                end_x,
                end_y,
                ..
            }
            | ElementKind::Line {
                start_x,
                start_y,
                end_x,
                end_y,
                ..
            } => Some((Point::new(start_x, start_y), Point::new(end_x, end_y))),
            _ => None,
        }
    }

    /// Horizontal and vertical radius, for circles.
    #[must_use]
    pub fn radii(&self) -> Option<(f64, f64)> {
        match self.kind {
            ElementKind::Circle {
                radius_x, radius_y, ..
            } => Some((radius_x, radius_y)),
            _ => None,
        }
    }

    /// Image URL, for image elements.
    #[must_use]
    pub fn image_source(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image { src } => Some(src),
            _ => None,
        }
    }

    /// Point an image element at a new URL, e.g. a generated result.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if this is not an image element.
    pub fn set_image_source(&mut self, url: impl Into<String>) -> CanvasResult<()> {
        match &mut self.kind {
            ElementKind::Image { src } => {
                *src = url.into();
                Ok(())
            }
            other => Err(CanvasError::InvalidOperation(format!(
                "cannot set image source on {} element {}",
                other.element_type(),
                self.id
            ))),
        }
    }
}

/// MIME type used when a file's format is unknown.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// GIF image.
    Gif,
    /// WebP image.
    WebP,
    /// SVG vector image.
    Svg,
}

impl ImageFormat {
    /// Detect the format from a file extension (case-insensitive, no dot).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Detect the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type for `content-type` headers.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Svg => "image/svg+xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, Pose};
    use serde_json::json;

    #[test]
    fn test_element_ids_are_unique() {
        assert_ne!(ElementId::new(), ElementId::new());
    }

    #[test]
    fn test_circle_exposes_only_radii() {
        let circle = CanvasElement::new(
            ElementKind::Circle {
                radius_x: 40.0,
                radius_y: 20.0,
                fill: None,
                stroke: Some("#ff0000".into()),
            },
            10.0,
            10.0,
        );
        assert_eq!(circle.radii(), Some((40.0, 20.0)));
        assert!(circle.points().is_none());
        assert!(circle.endpoints().is_none());
        assert!(circle.stroke_width().is_none());
    }

    #[test]
    fn test_circle_wire_format() {
        let circle = CanvasElement::new(
            ElementKind::Circle {
                radius_x: 40.0,
                radius_y: 20.0,
                fill: None,
                stroke: None,
            },
            1.0,
            2.0,
        )
        .with_id("c1");
        let value = serde_json::to_value(&circle).expect("serialize");
        assert_eq!(
            value,
            json!({"id": "c1", "left": 1.0, "top": 2.0, "type": "circle", "radiusX": 40.0, "radiusY": 20.0})
        );
    }

    #[test]
    fn test_brush_parses_from_wire() {
        let element: CanvasElement = serde_json::from_value(json!({
            "id": "b1",
            "type": "brush",
            "left": 0,
            "top": 5,
            "opacity": 0.5,
            "points": [{"x": 1, "y": 2}, {"x": 3, "y": 4}],
            "strokeWidth": 8,
            "stroke": "#000"
        }))
        .expect("deserialize");

        assert_eq!(element.element_type(), ElementType::Brush);
        assert_eq!(element.geometry.opacity, Some(0.5));
        assert_eq!(element.points().map(<[Point]>::len), Some(2));
        assert_eq!(element.stroke_width(), Some(8.0));
        assert!(element.radii().is_none());
    }

    #[test]
    fn test_line_and_arrow_endpoints() {
        let line: CanvasElement = serde_json::from_value(json!({
            "id": "l1", "type": "line", "left": 0, "top": 0,
            "startX": 0, "startY": 0, "endX": 10, "endY": 20
        }))
        .expect("deserialize");
        assert_eq!(
            line.endpoints(),
            Some((Point::new(0.0, 0.0), Point::new(10.0, 20.0)))
        );
        assert!(line.points().is_none());

        let arrow = CanvasElement::new(
            ElementKind::Arrow {
                start_x: 1.0,
                start_y: 1.0,
                end_x: 2.0,
                end_y: 2.0,
                stroke: None,
            },
            0.0,
            0.0,
        );
        assert!(arrow.endpoints().is_some());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<CanvasElement, _> = serde_json::from_value(json!({
            "id": "x", "type": "polygon", "left": 0, "top": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_element_type_wire_names_match_serde() {
        for ty in ElementType::ALL {
            let value = serde_json::to_value(ty).expect("serialize");
            assert_eq!(value, json!(ty.as_str()));
        }
    }

    #[test]
    fn test_from_asset_image_and_pose() {
        let image = CanvasElement::from_asset(
            &Asset::new(1, "Pic", "https://x/pic.png").into(),
            5.0,
            6.0,
        );
        assert_eq!(image.image_source(), Some("https://x/pic.png"));
        assert_eq!((image.left, image.top), (5.0, 6.0));

        let human = CanvasElement::from_asset(
            &Pose::new(2, "Run", "running", "https://x/run.png").into(),
            0.0,
            0.0,
        );
        match &human.kind {
            ElementKind::Human { pose_id, .. } => assert_eq!(pose_id, "running"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_set_image_source() {
        let mut image = CanvasElement::new(
            ElementKind::Image {
                src: "https://x/old.png".into(),
            },
            0.0,
            0.0,
        );
        image
            .set_image_source("https://x/new.png")
            .expect("image element");
        assert_eq!(image.image_source(), Some("https://x/new.png"));

        let mut text = CanvasElement::new(
            ElementKind::Text {
                text: "hi".into(),
                font_size: None,
                font_family: None,
                fill: None,
            },
            0.0,
            0.0,
        );
        assert!(matches!(
            text.set_image_source("https://x/new.png"),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_image_format_detection() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("txt"), None);
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/ref.webp")).map(ImageFormat::mime_type),
            Some("image/webp")
        );
        assert_eq!(ImageFormat::from_path(Path::new("/tmp/noext")), None);
    }
}
