//! Free-space bookkeeping for one cache texture.
//!
//! Row-based shelf packer:
//! - The texture is partitioned into horizontal shelves (rows).
//! - A glyph goes into the first shelf that is tall enough and still has room,
//!   left to right; otherwise a new shelf is opened below the last one.
//! - Every glyph reserves `border` pixels on all four sides. Reserved rectangles
//!   never overlap, so neighbouring glyphs never bleed into each other.
//!
//! Shelves are never reclaimed individually, only the latest placement can be
//! undone. The owning texture clears the whole packer when it is evicted.

/// Atlas coordinates in pixels (top-left origin).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasPx {
    pub x: u32,
    pub y: u32,
}

impl AtlasPx {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in atlas pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasRectPx {
    pub min: AtlasPx,
    pub size: [u32; 2],
}

impl AtlasRectPx {
    pub const fn new(min: AtlasPx, size: [u32; 2]) -> Self {
        Self { min, size }
    }

    #[inline]
    pub const fn width(self) -> u32 {
        self.size[0]
    }

    #[inline]
    pub const fn height(self) -> u32 {
        self.size[1]
    }

    #[inline]
    pub const fn max_x(self) -> u32 {
        self.min.x + self.size[0]
    }

    #[inline]
    pub const fn max_y(self) -> u32 {
        self.min.y + self.size[1]
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.min.x < other.max_x()
            && other.min.x < self.max_x()
            && self.min.y < other.max_y()
            && other.min.y < self.max_y()
    }

    /// Smallest rectangle covering both.
    pub fn union(self, other: Self) -> Self {
        let min = AtlasPx::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y));
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(min, [max_x - min.x, max_y - min.y])
    }
}

/// A single shelf (row) in the texture.
#[derive(Copy, Clone, Debug)]
struct Shelf {
    y: u32,
    height: u32,
    x_cursor: u32,
}

#[derive(Clone, Debug)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    border: u32,

    shelves: Vec<Shelf>,
    next_shelf_y: u32,
    used_area: u64,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32, border: u32) -> Self {
        Self {
            width,
            height,
            border,
            shelves: Vec::new(),
            next_shelf_y: 0,
            used_area: 0,
        }
    }

    #[inline]
    pub const fn border(&self) -> u32 {
        self.border
    }

    /// Forget every placement.
    pub fn clear(&mut self) {
        self.shelves.clear();
        self.next_shelf_y = 0;
        self.used_area = 0;
    }

    /// Reserve room for a `glyph_w` x `glyph_h` bitmap.
    ///
    /// Returns the reserved rectangle, border included, or `None` when the glyph
    /// does not fit anywhere.
    pub fn fit(&mut self, glyph_w: u32, glyph_h: u32) -> Option<AtlasRectPx> {
        let border = self.border.saturating_mul(2);
        let reserved_w = glyph_w.saturating_add(border);
        let reserved_h = glyph_h.saturating_add(border);

        if reserved_w > self.width || reserved_h > self.height {
            return None;
        }

        // Existing shelves first, top to bottom.
        for shelf in &mut self.shelves {
            if reserved_h <= shelf.height && shelf.x_cursor.saturating_add(reserved_w) <= self.width
            {
                let min = AtlasPx::new(shelf.x_cursor, shelf.y);
                shelf.x_cursor += reserved_w;
                self.used_area += u64::from(reserved_w) * u64::from(reserved_h);
                return Some(AtlasRectPx::new(min, [reserved_w, reserved_h]));
            }
        }

        if self.next_shelf_y.saturating_add(reserved_h) > self.height {
            return None;
        }

        let shelf = Shelf {
            y: self.next_shelf_y,
            height: reserved_h,
            x_cursor: reserved_w,
        };
        self.next_shelf_y += reserved_h;
        self.shelves.push(shelf);
        self.used_area += u64::from(reserved_w) * u64::from(reserved_h);

        Some(AtlasRectPx::new(AtlasPx::new(0, shelf.y), [reserved_w, reserved_h]))
    }

    /// Give back `rect` if it is the most recent reservation of its shelf.
    ///
    /// An emptied bottom shelf is dropped as well. Returns whether anything was undone.
    pub fn unreserve(&mut self, rect: AtlasRectPx) -> bool {
        let Some(index) = self
            .shelves
            .iter()
            .position(|shelf| shelf.y == rect.min.y && shelf.x_cursor == rect.max_x())
        else {
            return false;
        };

        let shelf_count = self.shelves.len();
        let shelf = &mut self.shelves[index];
        shelf.x_cursor -= rect.width();
        self.used_area -= u64::from(rect.width()) * u64::from(rect.height());
        if shelf.x_cursor == 0 && index + 1 == shelf_count {
            self.next_shelf_y = shelf.y;
            self.shelves.pop();
        }
        true
    }

    /// Pixels covered by reserved rectangles.
    #[inline]
    pub const fn used_area(&self) -> u64 {
        self.used_area
    }

    /// Pixels not covered by any reserved rectangle.
    #[inline]
    pub const fn free_area(&self) -> u64 {
        self.width as u64 * self.height as u64 - self.used_area
    }
}
