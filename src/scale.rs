use serde::{Deserialize, Serialize};

/// Scale a logical value to device pixels, truncating toward zero.
///
/// Results outside the `i32` range saturate at its ends.
pub fn scaled(value: i32, scale: f32) -> i32 {
    let v = value as f32 * scale;
    if v.is_nan() {
        0
    } else if v >= i32::MAX as f32 {
        i32::MAX
    } else if v <= i32::MIN as f32 {
        i32::MIN
    } else {
        v as i32
    }
}

/// Integer pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Integer pixel extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Rectangle in integer pixels (origin + extent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Centre point, using integer halving of the extent.
    pub fn center(&self) -> Point {
        Point::new(self.x + (self.width >> 1), self.y + (self.height >> 1))
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x < self.x.saturating_add(self.width)
            && p.y >= self.y
            && p.y < self.y.saturating_add(self.height)
    }
}

/// Maps logical geometry to device pixels for one rebuild cycle.
///
/// Built from the current [`RenderConfig`](crate::config::RenderConfig) every
/// time a widget rebuilds; never kept across rebuilds since the UI scale
/// setting may change in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    scale: f32,
}

impl Default for ScaleContext {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl ScaleContext {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn factor(&self) -> f32 {
        self.scale
    }

    pub fn value(&self, v: i32) -> i32 {
        scaled(v, self.scale)
    }

    pub fn point(&self, p: Point) -> Point {
        Point::new(self.value(p.x), self.value(p.y))
    }

    pub fn size(&self, s: Size) -> Size {
        Size::new(self.value(s.width), self.value(s.height))
    }

    pub fn rect(&self, r: Rect) -> Rect {
        Rect::new(
            self.value(r.x),
            self.value(r.y),
            self.value(r.width),
            self.value(r.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_truncates() {
        assert_eq!(scaled(45, 1.5), 67);
        assert_eq!(scaled(30, 1.5), 45);
        assert_eq!(scaled(7, 0.5), 3);
        assert_eq!(scaled(0, 2.0), 0);
        assert_eq!(scaled(100, 1.0), 100);
    }

    #[test]
    fn test_scaled_matches_floor() {
        let scales = [0.5f32, 0.75, 1.0, 1.1, 1.25, 1.33, 1.5, 2.0];
        for &s in &scales {
            for v in 0..500 {
                let expected = (v as f32 * s).floor() as i32;
                assert_eq!(scaled(v, s), expected, "v={} s={}", v, s);
            }
        }
    }

    #[test]
    fn test_scaled_monotonic() {
        let scales = [0.5f32, 0.9, 1.0, 1.3, 1.75, 2.0];
        for &s in &scales {
            let mut previous = scaled(0, s);
            for v in 1..1000 {
                let current = scaled(v, s);
                assert!(current >= previous, "not monotonic at v={} s={}", v, s);
                previous = current;
            }
        }
    }

    #[test]
    fn test_scaled_saturates() {
        assert_eq!(scaled(i32::MAX, 2.0), i32::MAX);
        assert_eq!(scaled(i32::MAX, 1.0), i32::MAX);
        assert_eq!(scaled(i32::MIN, 1.5), i32::MIN);
        assert_eq!(scaled(1_500_000_000, 1.5), i32::MAX);
    }

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(10, 10, 20, 5);
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(29, 14)));
        assert!(!r.contains(Point::new(30, 14)));
        assert!(!r.contains(Point::new(29, 15)));
        assert!(!r.contains(Point::new(9, 12)));
    }

    #[test]
    fn test_context_scales_rect() {
        let ctx = ScaleContext::new(1.5);
        let r = ctx.rect(Rect::new(105, 162, 70, 19));
        assert_eq!(r, Rect::new(157, 243, 105, 28));
        assert_eq!(r.center(), Point::new(157 + 52, 243 + 14));
    }
}
