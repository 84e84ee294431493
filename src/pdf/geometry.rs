use lopdf::Object;
use serde::Serialize;

/// Rectangle in PDF user space (points), normalized so that
/// `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PdfRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PdfRect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        PdfRect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// A box with no area (or non-finite corners) is treated as absent.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
            || ![self.x0, self.y0, self.x1, self.y1]
                .iter()
                .all(|v| v.is_finite())
    }

    /// Parses a `[llx lly urx ury]` array. Returns `None` for anything else.
    pub fn from_array(items: &[Object]) -> Option<Self> {
        if items.len() != 4 {
            return None;
        }
        let mut v = [0f32; 4];
        for (slot, obj) in v.iter_mut().zip(items) {
            *slot = match obj {
                Object::Integer(i) => *i as f32,
                Object::Real(f) => *f,
                _ => return None,
            };
        }
        Some(PdfRect::new(v[0], v[1], v[2], v[3]))
    }

    /// Overlap of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &PdfRect) -> Option<PdfRect> {
        let r = PdfRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (!r.is_empty()).then_some(r)
    }

    pub fn to_object(self) -> Object {
        let num = |v: f32| {
            if v.fract() == 0.0 && v.abs() < i32::MAX as f32 {
                Object::Integer(v as i64)
            } else {
                Object::Real(v)
            }
        };
        Object::Array(vec![num(self.x0), num(self.y0), num(self.x1), num(self.y1)])
    }
}

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageBoxes {
    /// MediaBox.
    pub content: PdfRect,
    /// CropBox as written in the document, if any. May be empty or reach
    /// outside the MediaBox.
    pub crop: Option<PdfRect>,
    /// `/Rotate` in degrees clockwise: 0, 90, 180 or 270.
    pub rotation: u16,
}

impl PageBoxes {
    pub fn new(content: PdfRect, crop: Option<PdfRect>) -> Self {
        PageBoxes {
            content,
            crop,
            rotation: 0,
        }
    }

    /// Sets the page rotation. Negative values and multiples of 360 wrap;
    /// anything not a multiple of 90 is rounded down to one, as viewers do.
    pub fn with_rotation(mut self, degrees: i64) -> Self {
        let wrapped = degrees.rem_euclid(360);
        self.rotation = (wrapped - wrapped % 90) as u16;
        self
    }

    /// Visible area: the crop box clipped to the content box when that
    /// leaves any area, otherwise the content box.
    pub fn effective(&self) -> PdfRect {
        self.usable_crop().unwrap_or(self.content)
    }

    /// Crop box worth writing to a rebuilt page, clipped to the content box.
    pub fn usable_crop(&self) -> Option<PdfRect> {
        self.crop.and_then(|c| c.intersect(&self.content))
    }

    /// Whether the page is displayed with width and height swapped.
    pub fn is_quarter_turn(&self) -> bool {
        self.rotation % 180 == 90
    }
}
