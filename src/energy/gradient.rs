//! Gradient-based energy formulas.

use crate::energy::window::WindowRead;

/// How reader values around a pixel are reduced to one energy value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GradientKind {
    /// Absolute horizontal derivative.
    #[default]
    XAbs,
    /// Mean of the absolute horizontal and vertical derivatives.
    SumAbs,
    /// Euclidean norm of the gradient.
    Norm,
    /// Zero everywhere; only the energy bias counts.
    Null,
}

impl GradientKind {
    /// Window radius the formula reads.
    pub fn radius(&self) -> usize {
        match self {
            GradientKind::Null => 0,
            _ => 1,
        }
    }

    /// Stable lowercase name, as used in config files.
    pub fn name(&self) -> &'static str {
        match self {
            GradientKind::XAbs => "xabs",
            GradientKind::SumAbs => "sumabs",
            GradientKind::Norm => "norm",
            GradientKind::Null => "null",
        }
    }

    /// Evaluates the gradient at the window centre `(x, y)` of a `width x height` image.
    pub(crate) fn evaluate<W: WindowRead + ?Sized>(
        &self,
        window: &W,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> f32 {
        let mut total = 0.0;
        for c in 0..window.channels() {
            total += match self {
                GradientKind::XAbs => derivative(window, c, (1, 0), x, width).abs(),
                GradientKind::SumAbs => {
                    let dx = derivative(window, c, (1, 0), x, width);
                    let dy = derivative(window, c, (0, 1), y, height);
                    (dx.abs() + dy.abs()) / 2.0
                }
                GradientKind::Norm => {
                    let dx = derivative(window, c, (1, 0), x, width);
                    let dy = derivative(window, c, (0, 1), y, height);
                    (dx * dx + dy * dy).sqrt()
                }
                GradientKind::Null => 0.0,
            };
        }
        total
    }
}

/// Central difference along `axis`, one-sided at the borders.
#[inline]
fn derivative<W: WindowRead + ?Sized>(
    window: &W,
    channel: usize,
    axis: (isize, isize),
    pos: usize,
    extent: usize,
) -> f32 {
    let (ax, ay) = axis;
    if extent < 2 {
        0.0
    } else if pos == 0 {
        window.read(ax, ay, channel) - window.read(0, 0, channel)
    } else if pos + 1 == extent {
        window.read(0, 0, channel) - window.read(-ax, -ay, channel)
    } else {
        (window.read(ax, ay, channel) - window.read(-ax, -ay, channel)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp;

    impl WindowRead for Ramp {
        fn radius(&self) -> usize {
            1
        }
        fn channels(&self) -> usize {
            1
        }
        fn read(&self, dx: isize, dy: isize, _channel: usize) -> f32 {
            dx as f32 * 0.5 + dy as f32 * 0.25
        }
    }

    #[test]
    fn derivatives_are_one_sided_at_borders() {
        assert_eq!(GradientKind::XAbs.evaluate(&Ramp, 0, 1, 3, 3), 0.5);
        assert_eq!(GradientKind::XAbs.evaluate(&Ramp, 1, 1, 3, 3), 0.5);
        assert_eq!(GradientKind::XAbs.evaluate(&Ramp, 0, 0, 1, 3), 0.0);
        assert_eq!(GradientKind::SumAbs.evaluate(&Ramp, 1, 2, 3, 3), 0.375);
        assert_eq!(GradientKind::Norm.evaluate(&Ramp, 1, 1, 3, 1), 0.5);
        assert_eq!(GradientKind::Null.evaluate(&Ramp, 1, 1, 3, 3), 0.0);
    }
}
