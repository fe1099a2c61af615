/// Viewport size in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Per-axis scale that maps the unit disc onto the largest centred circle.
    ///
    /// Clip space is stretched to the viewport, so the longer axis is shrunk by the
    /// aspect ratio. Invalid viewports yield `(1.0, 1.0)`.
    pub fn fit_unit_circle(self) -> (f32, f32) {
        if !self.is_valid() {
            return (1.0, 1.0);
        }
        if self.width >= self.height {
            (self.height / self.width, 1.0)
        } else {
            (1.0, self.width / self.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_viewport_is_unscaled() {
        assert_eq!(Viewport::new(300.0, 300.0).fit_unit_circle(), (1.0, 1.0));
    }

    #[test]
    fn wide_viewport_shrinks_x() {
        assert_eq!(Viewport::new(800.0, 400.0).fit_unit_circle(), (0.5, 1.0));
    }

    #[test]
    fn tall_viewport_shrinks_y() {
        assert_eq!(Viewport::new(400.0, 800.0).fit_unit_circle(), (1.0, 0.5));
    }

    #[test]
    fn degenerate_viewport_falls_back() {
        assert!(!Viewport::new(0.0, 10.0).is_valid());
        assert_eq!(Viewport::new(0.0, 10.0).fit_unit_circle(), (1.0, 1.0));
        assert_eq!(Viewport::new(f32::NAN, 10.0).fit_unit_circle(), (1.0, 1.0));
    }
}
