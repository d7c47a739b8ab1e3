use super::canvas::{Canvas, Rgb};

/// Drawing operations the fireworks need, in world units.
pub trait Surface {
    /// Wipe the whole surface back to the night sky.
    fn clear(&mut self);

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb, alpha: f64);

    /// Glow around a point, `blur` being the halo radius.
    fn glow(&mut self, x: f64, y: f64, blur: f64, color: Rgb, alpha: f64);

    /// Connected line through `points`.
    fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Rgb, alpha: f64);
}

/// Peak intensity of a full-opacity glow halo.
const GLOW_STRENGTH: f64 = 0.35;

/// A [`Surface`] over a terminal [`Canvas`], `scale` world units per pixel.
pub struct Viewport<'a> {
    canvas: &'a mut Canvas,
    scale: f64,
}

impl<'a> Viewport<'a> {
    pub fn new(canvas: &'a mut Canvas, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Viewport { canvas, scale }
    }

    #[inline]
    fn to_px(&self, v: f64) -> f64 {
        v / self.scale
    }
}

impl Surface for Viewport<'_> {
    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb, alpha: f64) {
        let (x, y, r) = (self.to_px(x), self.to_px(y), self.to_px(radius));
        self.canvas.fill_disc(x, y, r, color, alpha);
    }

    fn glow(&mut self, x: f64, y: f64, blur: f64, color: Rgb, alpha: f64) {
        let (x, y, r) = (self.to_px(x), self.to_px(y), self.to_px(blur));
        self.canvas.glow(x, y, r, color, GLOW_STRENGTH * alpha.clamp(0.0, 1.0));
    }

    fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Rgb, alpha: f64) {
        let width = self.to_px(width);
        let px: Vec<(f64, f64)> = points
            .iter()
            .map(|&(x, y)| (self.to_px(x), self.to_px(y)))
            .collect();
        match px.as_slice() {
            [] => {}
            [only] => self.canvas.stroke_line(*only, *only, width, color, alpha),
            _ => {
                for pair in px.windows(2) {
                    self.canvas.stroke_line(pair[0], pair[1], width, color, alpha);
                }
            }
        }
    }
}

#[cfg(test)]
pub mod recording {
    //! A [`Surface`] that records draw calls instead of rasterising them.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear,
        Circle { x: f64, y: f64, radius: f64, color: Rgb, alpha: f64 },
        Glow { x: f64, y: f64, blur: f64, color: Rgb },
        Path { points: Vec<(f64, f64)>, width: f64, color: Rgb },
    }

    #[derive(Default)]
    pub struct RecordingSurface {
        pub ops: Vec<Op>,
    }

    impl RecordingSurface {
        pub fn circles(&self) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Circle { .. }))
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb, alpha: f64) {
            self.ops.push(Op::Circle { x, y, radius, color, alpha });
        }

        fn glow(&mut self, x: f64, y: f64, blur: f64, color: Rgb, _alpha: f64) {
            self.ops.push(Op::Glow { x, y, blur, color });
        }

        fn stroke_path(&mut self, points: &[(f64, f64)], width: f64, color: Rgb, _alpha: f64) {
            self.ops.push(Op::Path { points: points.to_vec(), width, color });
        }
    }
}
