use serde::{Deserialize, Serialize};

/// Width and height (in percent) a drawn rectangle must exceed to count as a
/// deliberate annotation rather than a stray click.
pub const MIN_INTENTIONAL_EXTENT: f32 = 2.0;

const IMAGE_EXTENT: f32 = 100.0;
const BOUNDS_TOLERANCE: f32 = 1e-3;

/// Axis-aligned rectangle in percent-of-image units.
///
/// All coordinates are in `[0, 100]`: `(x, y)` is the top-left corner and the
/// rectangle never extends past the right or bottom edge of the image. The
/// fields are private so that every value in circulation has been validated by
/// [`BoundingBox::new`].
///
/// # Example
///
/// ```
/// use wallyfit_engine::BoundingBox;
///
/// let drag = BoundingBox::from_corners((60.0, 10.0), (40.0, 30.0)).unwrap();
/// assert_eq!(drag.x(), 40.0);
/// assert_eq!(drag.width(), 20.0);
/// assert!(drag.is_intentional());
///
/// assert!(BoundingBox::new(90.0, 0.0, 20.0, 5.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundingBoxRepr", into = "BoundingBoxRepr")]
pub struct BoundingBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BoundingBoxError {
    #[display("bounding box coordinates must be finite")]
    NonFinite,
    #[display("bounding box origin ({x}, {y}) is negative")]
    NegativeOrigin { x: f32, y: f32 },
    #[display("bounding box extent {width}x{height} is negative")]
    NegativeExtent { width: f32, height: f32 },
    #[display("bounding box extends past the image (right {right}, bottom {bottom})")]
    OutOfBounds { right: f32, bottom: f32 },
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, BoundingBoxError> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return Err(BoundingBoxError::NonFinite);
        }
        if x < 0.0 || y < 0.0 {
            return Err(BoundingBoxError::NegativeOrigin { x, y });
        }
        if width < 0.0 || height < 0.0 {
            return Err(BoundingBoxError::NegativeExtent { width, height });
        }
        let (right, bottom) = (x + width, y + height);
        if right > IMAGE_EXTENT + BOUNDS_TOLERANCE || bottom > IMAGE_EXTENT + BOUNDS_TOLERANCE {
            return Err(BoundingBoxError::OutOfBounds { right, bottom });
        }
        Ok(Self {
            x,
            y,
            width: width.min(IMAGE_EXTENT - x),
            height: height.min(IMAGE_EXTENT - y),
        })
    }

    /// Builds the rectangle spanned by a drag from `start` to `end`.
    ///
    /// Points outside the image are clamped to its edges, so any finite drag
    /// produces a valid rectangle.
    pub fn from_corners(start: (f32, f32), end: (f32, f32)) -> Result<Self, BoundingBoxError> {
        let clamp = |v: f32| v.clamp(0.0, IMAGE_EXTENT);
        let (x1, y1) = (clamp(start.0), clamp(start.1));
        let (x2, y2) = (clamp(end.0), clamp(end.1));
        Self::new(x1.min(x2), y1.min(y2), (x1 - x2).abs(), (y1 - y2).abs())
    }

    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Returns whether the rectangle is large enough to be a deliberate
    /// annotation (both extents greater than [`MIN_INTENTIONAL_EXTENT`]).
    #[must_use]
    pub fn is_intentional(&self) -> bool {
        self.width > MIN_INTENTIONAL_EXTENT && self.height > MIN_INTENTIONAL_EXTENT
    }

    /// Moves the rectangle, keeping it inside the image.
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            x: (self.x + dx).clamp(0.0, IMAGE_EXTENT - self.width),
            y: (self.y + dy).clamp(0.0, IMAGE_EXTENT - self.height),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BoundingBoxRepr {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl TryFrom<BoundingBoxRepr> for BoundingBox {
    type Error = BoundingBoxError;

    fn try_from(repr: BoundingBoxRepr) -> Result<Self, Self::Error> {
        Self::new(repr.x, repr.y, repr.width, repr.height)
    }
}

impl From<BoundingBox> for BoundingBoxRepr {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
        }
    }
}
