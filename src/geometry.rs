/// Axis-aligned box in world pixels. Touching edges do not count as overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn from_center(x: f32, y: f32, width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self {
            min_x: x - hw,
            min_y: y - hh,
            max_x: x + hw,
            max_y: y + hh,
        }
    }

    /// Square bounds of a circle, `[x-r, x+r] × [y-r, y+r]`.
    pub fn from_radius(x: f32, y: f32, radius: f32) -> Self {
        Self::from_center(x, y, radius * 2.0, radius * 2.0)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_both_axes() {
        let a = Aabb::from_center(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Aabb::from_center(8.0, 8.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Aabb::from_center(8.0, 30.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Aabb::from_center(30.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::from_center(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_center(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn radius_box_is_square() {
        let b = Aabb::from_radius(100.0, 50.0, 12.0);
        assert_eq!(b.width(), 24.0);
        assert_eq!(b.height(), 24.0);
        assert_eq!(b.center_x(), 100.0);
        assert_eq!(b.center_y(), 50.0);
    }
}
