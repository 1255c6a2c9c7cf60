/// Screen-space rectangle, y pointing down (`min` is the top-left corner).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Rect {
    /// Bounds accumulator that any point will replace.
    pub const EMPTY_BOUNDS: Self = Self {
        min: [f32::MAX / 2.0, f32::MAX / 2.0],
        max: [f32::MIN / 2.0, f32::MIN / 2.0],
    };

    pub const fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    pub fn from_min_size(min: [f32; 2], size: [f32; 2]) -> Self {
        Self {
            min,
            max: [min[0] + size[0], min[1] + size[1]],
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min[0]
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min[1]
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max[0]
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max[1]
    }

    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }

    /// False for [`Rect::EMPTY_BOUNDS`] and anything inverted.
    pub fn is_valid(&self) -> bool {
        self.min[0] <= self.max[0] && self.min[1] <= self.max[1]
    }

    pub fn include_point(&mut self, p: [f32; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn include_rect(&mut self, other: &Rect) {
        self.include_point(other.min);
        self.include_point(other.max);
    }
}

/// UV rectangle (normalized texture coords).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UvRect {
    pub const fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }
}
