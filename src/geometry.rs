use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True unless the two boxes are separated by at least `pad` on some axis.
    pub fn intersects(&self, other: &Rect, pad: f64) -> bool {
        !(self.right() + pad <= other.x
            || other.right() + pad <= self.x
            || self.bottom() + pad <= other.y
            || other.bottom() + pad <= self.y)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x && other.right() <= self.right() && other.y >= self.y && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 500.0,
        }
    }
}

/// Linear map from a value domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        // degenerate domain sits in the middle of the range
        let t = if span == 0.0 { 0.5 } else { (v - d0) / span };
        r0 + t * (r1 - r0)
    }
}

/// Evenly spaced bands with uniform inner/outer padding, centred in the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    pub count: usize,
    pub range: (f64, f64),
    pub padding: f64,
}

impl BandScale {
    pub fn new(count: usize, range: (f64, f64), padding: f64) -> Self {
        Self {
            count,
            range,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    pub fn step(&self) -> f64 {
        let n = self.count as f64;
        let (r0, r1) = self.range;
        (r1 - r0) / (n - self.padding + self.padding * 2.0).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Left edge of band `i`.
    pub fn start(&self, i: usize) -> f64 {
        let n = self.count as f64;
        let (r0, r1) = self.range;
        let step = self.step();
        let offset = (r1 - r0 - step * (n - self.padding)) * 0.5;
        r0 + offset + step * i as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_keeps_boxes_apart() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(12.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b, 0.0));
        assert!(!a.intersects(&b, 2.0));
        assert!(a.intersects(&b, 3.0));
        assert!(a.intersects(&a, 0.0));
    }

    #[test]
    fn containment_is_inclusive() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!outer.contains(&Rect::centered(9.0, 5.0, 4.0, 2.0)));
    }

    #[test]
    fn linear_scale_inverts_and_handles_flat_domain() {
        let y = LinearScale::new((0.0, 10.0), (500.0, 0.0));
        assert_eq!(y.map(0.0), 500.0);
        assert_eq!(y.map(10.0), 0.0);
        assert_eq!(y.map(5.0), 250.0);
        let flat = LinearScale::new((3.0, 3.0), (0.0, 100.0));
        assert_eq!(flat.map(3.0), 50.0);
    }

    #[test]
    fn band_scale_fills_range_symmetrically() {
        let x = BandScale::new(4, (0.0, 410.0), 0.1);
        let step = x.step();
        assert!((step - 100.0).abs() < 1e-9);
        assert!((x.bandwidth() - 90.0).abs() < 1e-9);
        assert!((x.start(0) - 10.0).abs() < 1e-9);
        assert!((x.start(3) + x.bandwidth() - 400.0).abs() < 1e-9);
    }
}
