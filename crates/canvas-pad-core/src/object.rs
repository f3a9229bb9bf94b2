/// Canvas objects: shapes, text boxes, and images.
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use canvas_pad_config::HexColor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::TextBox;

/// Edge length, in pixels, that newly placed images are scaled to.
pub const IMAGE_PLACEMENT_EDGE: f64 = 150.0;

/// Vector shapes offered by the shape catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    Circle,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Rect, ShapeKind::Circle, ShapeKind::Triangle];

    /// Builds the shape with its catalog defaults.
    pub fn build(self) -> CanvasObject {
        let (left, kind) = match self {
            Self::Rect => (
                100.0,
                ObjectKind::Rect {
                    width: 80.0,
                    height: 60.0,
                    fill: HexColor::rgb(0x4A, 0x90, 0xE2),
                },
            ),
            Self::Circle => (
                140.0,
                ObjectKind::Circle {
                    radius: 40.0,
                    fill: HexColor::rgb(0x7E, 0xD3, 0x21),
                },
            ),
            Self::Triangle => (
                100.0,
                ObjectKind::Triangle {
                    width: 80.0,
                    height: 100.0,
                    fill: HexColor::rgb(0xD0, 0x02, 0x1B),
                },
            ),
        };
        CanvasObject::new(left, 100.0, kind)
    }
}

impl FromStr for ShapeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Ok(Self::Rect),
            "circle" => Ok(Self::Circle),
            "triangle" => Ok(Self::Triangle),
            other => bail!("unknown shape: {other} (expected rect, circle or triangle)"),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
        })
    }
}

/// What an object is, with its kind-specific geometry and paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Rect {
        width: f64,
        height: f64,
        fill: HexColor,
    },
    Circle {
        radius: f64,
        fill: HexColor,
    },
    Triangle {
        width: f64,
        height: f64,
        fill: HexColor,
    },
    Textbox(TextBox),
    Image {
        src: String,
        width: f64,
        height: f64,
        scale_x: f64,
        scale_y: f64,
    },
}

impl ObjectKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Circle { .. } => "circle",
            Self::Triangle { .. } => "triangle",
            Self::Textbox(_) => "textbox",
            Self::Image { .. } => "image",
        }
    }
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasObject {
    pub id: Uuid,
    pub left: f64,
    pub top: f64,
    /// 0.0 (transparent) to 1.0 (opaque). Independent of any fill color.
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    pub kind: ObjectKind,
}

fn full_opacity() -> f64 {
    1.0
}

impl CanvasObject {
    pub fn new(left: f64, top: f64, kind: ObjectKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            left,
            top,
            opacity: 1.0,
            kind,
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(100.0, 100.0, ObjectKind::Textbox(TextBox::new(text)))
    }

    /// An image scaled so it renders at the standard placement size.
    pub fn image(src: &str, natural_width: u32, natural_height: u32) -> anyhow::Result<Self> {
        if natural_width == 0 || natural_height == 0 {
            bail!("image has no pixels ({natural_width}x{natural_height})");
        }
        let (width, height) = (f64::from(natural_width), f64::from(natural_height));
        Ok(Self::new(
            100.0,
            100.0,
            ObjectKind::Image {
                src: src.to_string(),
                width,
                height,
                scale_x: IMAGE_PLACEMENT_EDGE / width,
                scale_y: IMAGE_PLACEMENT_EDGE / height,
            },
        ))
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn as_text(&self) -> Option<&TextBox> {
        match &self.kind {
            ObjectKind::Textbox(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBox> {
        match &mut self.kind {
            ObjectKind::Textbox(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ObjectKind::Image { .. })
    }
}
