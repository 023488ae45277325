use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const HIGHLIGHTER_WIDTH: f32 = 15.0;
const HIGHLIGHTER_ALPHA: f32 = 0.3;
const ERASER_WIDTH: f32 = 20.0;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An opaque RGB stroke colour, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const NEON: Rgb = Rgb {
        r: 0x00,
        g: 0xf2,
        b: 0xff,
    };
}

impl FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tools and strokes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pointer,
    Pen,
    Highlighter,
    Eraser,
}

impl Tool {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Pen => "pen",
            Self::Highlighter => "highlighter",
            Self::Eraser => "eraser",
        }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pointer" => Ok(Self::Pointer),
            "pen" => Ok(Self::Pen),
            "highlighter" => Ok(Self::Highlighter),
            "eraser" => Ok(Self::Eraser),
            other => Err(format!("unknown tool {other:?}")),
        }
    }
}

/// How a stroke combines with what is already on the annotation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Paint over existing pixels.
    SourceOver,
    /// Remove existing pixels (destination-out).
    Erase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgb,
    /// Line width in pixels.
    pub width: f32,
    /// Stroke opacity 0.0..=1.0.
    pub alpha: f32,
    pub mode: BlendMode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One straight piece of a freehand stroke, with round caps and joins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub style: StrokeStyle,
}

// ---------------------------------------------------------------------------
// Drawing state
// ---------------------------------------------------------------------------

/// Pointer-driven freehand drawing state for the annotation layer.
///
/// Turns pointer down/move/up events into line segments styled for the
/// active tool. The pointer tool never draws.
#[derive(Debug, Clone)]
pub struct AnnotationState {
    tool: Tool,
    pen_color: Rgb,
    pen_size: f32,
    drawing: bool,
    last: Point,
}

impl Default for AnnotationState {
    fn default() -> Self {
        Self::new(Rgb::NEON, 2.0)
    }
}

impl AnnotationState {
    pub fn new(pen_color: Rgb, pen_size: f32) -> Self {
        Self {
            tool: Tool::Pointer,
            pen_color,
            pen_size: pen_size.max(0.5),
            drawing: false,
            last: Point::new(0.0, 0.0),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if tool == Tool::Pointer {
            self.drawing = false;
        }
    }

    pub fn pen_color(&self) -> Rgb {
        self.pen_color
    }

    pub fn set_pen_color(&mut self, color: Rgb) {
        self.pen_color = color;
    }

    pub fn pen_size(&self) -> f32 {
        self.pen_size
    }

    pub fn set_pen_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 {
            self.pen_size = size;
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Style for the active tool, or `None` for the pointer.
    pub fn style(&self) -> Option<StrokeStyle> {
        match self.tool {
            Tool::Pointer => None,
            Tool::Pen => Some(StrokeStyle {
                color: self.pen_color,
                width: self.pen_size,
                alpha: 1.0,
                mode: BlendMode::SourceOver,
            }),
            Tool::Highlighter => Some(StrokeStyle {
                color: self.pen_color,
                width: HIGHLIGHTER_WIDTH,
                alpha: HIGHLIGHTER_ALPHA,
                mode: BlendMode::SourceOver,
            }),
            Tool::Eraser => Some(StrokeStyle {
                color: self.pen_color,
                width: ERASER_WIDTH,
                alpha: 1.0,
                mode: BlendMode::Erase,
            }),
        }
    }

    pub fn start(&mut self, at: Point) {
        if self.tool == Tool::Pointer {
            return;
        }
        self.drawing = true;
        self.last = at;
    }

    /// Extend the current stroke to `to`.
    pub fn draw_to(&mut self, to: Point) -> Option<Segment> {
        if !self.drawing {
            return None;
        }
        let style = self.style()?;
        let segment = Segment {
            from: self.last,
            to,
            style,
        };
        self.last = to;
        Some(segment)
    }

    pub fn stop(&mut self) {
        self.drawing = false;
    }
}
