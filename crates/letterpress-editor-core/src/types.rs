//! Geometry shared between the core and the platform layer.
//!
//! All coordinates are CSS pixels relative to the viewport, as reported by
//! `getBoundingClientRect`.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Top-left corner for a box of `size` placed `offset` below `anchor`,
/// flipped above when it would overflow the bottom of `viewport`, centered
/// horizontally and kept inside the viewport.
pub fn place_near(anchor: Rect, size: Size, viewport: Size, offset: f64) -> Point {
    let below = anchor.bottom() + offset;
    let y = if below + size.height > viewport.height {
        (anchor.y - offset - size.height).max(0.0)
    } else {
        below
    };
    let max_x = (viewport.width - size.width).max(0.0);
    let x = (anchor.center_x() - size.width / 2.0).clamp(0.0, max_x);
    Point::new(x, y)
}

/// Top-left corner for a box of `size` placed `offset` to the left of
/// `anchor`, vertically centered on it.
pub fn place_beside(anchor: Rect, size: Size, offset: f64) -> Point {
    let x = (anchor.x - offset - size.width).max(0.0);
    let y = (anchor.center_y() - size.height / 2.0).max(0.0);
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn test_place_below() {
        let anchor = Rect::new(100.0, 100.0, 200.0, 20.0);
        let at = place_near(anchor, Size::new(120.0, 40.0), VIEWPORT, 10.0);
        assert_eq!(at, Point::new(140.0, 130.0));
    }

    #[test]
    fn test_flip_above_on_overflow() {
        let anchor = Rect::new(100.0, 560.0, 200.0, 20.0);
        let at = place_near(anchor, Size::new(120.0, 40.0), VIEWPORT, 10.0);
        assert_eq!(at, Point::new(140.0, 510.0));
    }

    #[test]
    fn test_clamp_horizontally() {
        let anchor = Rect::new(0.0, 100.0, 10.0, 20.0);
        assert_eq!(
            place_near(anchor, Size::new(120.0, 40.0), VIEWPORT, 10.0).x,
            0.0
        );
        let anchor = Rect::new(790.0, 100.0, 10.0, 20.0);
        assert_eq!(
            place_near(anchor, Size::new(120.0, 40.0), VIEWPORT, 10.0).x,
            680.0
        );
    }

    #[test]
    fn test_place_beside() {
        let anchor = Rect::new(200.0, 100.0, 400.0, 20.0);
        let at = place_beside(anchor, Size::new(60.0, 30.0), 40.0);
        assert_eq!(at, Point::new(100.0, 95.0));
        let at = place_beside(Rect::new(10.0, 0.0, 10.0, 10.0), Size::new(60.0, 30.0), 40.0);
        assert_eq!(at, Point::new(0.0, 0.0));
    }
}
