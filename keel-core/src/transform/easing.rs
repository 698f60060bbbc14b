//! Easing curves.
//!
//! Every style is defined by its `In` curve; `Out` and `InOut` are derived:
//!
//! ```text
//! Out(t)   = 1 - In(1 - t)
//! InOut(t) = In(2t) / 2               for t < 0.5
//!          = 1 - In(2 - 2t) / 2       otherwise
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shape of an easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EasingStyle {
    Linear,
    Sine,
    #[default]
    Quad,
    Cubic,
    Quart,
    Quint,
    Exponential,
    Circular,
    Back,
    Bounce,
    Elastic,
}

/// Which end of the curve the shape applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EasingDirection {
    In,
    #[default]
    Out,
    InOut,
}

impl EasingStyle {
    fn ease_in(self, t: f64) -> f64 {
        match self {
            EasingStyle::Linear => t,
            EasingStyle::Sine => 1.0 - (t * PI / 2.0).cos(),
            EasingStyle::Quad => t * t,
            EasingStyle::Cubic => t * t * t,
            EasingStyle::Quart => t.powi(4),
            EasingStyle::Quint => t.powi(5),
            EasingStyle::Exponential => {
                if t == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            EasingStyle::Circular => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EasingStyle::Back => {
                const C1: f64 = 1.70158;
                const C3: f64 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            EasingStyle::Bounce => 1.0 - bounce_out(1.0 - t),
            EasingStyle::Elastic => {
                const C4: f64 = 2.0 * PI / 3.0;
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin()
                }
            }
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Map linear progress `alpha` to eased progress.
///
/// `alpha` is clamped to `[0, 1]`, and the endpoints map exactly to `0` and
/// `1` for every style. Values in between may overshoot for `Back` and
/// `Elastic`.
pub fn ease(alpha: f64, style: EasingStyle, direction: EasingDirection) -> f64 {
    if alpha.is_nan() || alpha <= 0.0 {
        return 0.0;
    }
    if alpha >= 1.0 {
        return 1.0;
    }

    match direction {
        EasingDirection::In => style.ease_in(alpha),
        EasingDirection::Out => 1.0 - style.ease_in(1.0 - alpha),
        EasingDirection::InOut => {
            if alpha < 0.5 {
                style.ease_in(alpha * 2.0) / 2.0
            } else {
                1.0 - style.ease_in(2.0 - alpha * 2.0) / 2.0
            }
        }
    }
}

/// Interpolate a number between `from` and `to`.
pub fn ease_number(
    alpha: f64,
    from: f64,
    to: f64,
    style: EasingStyle,
    direction: EasingDirection,
) -> f64 {
    from + (to - from) * ease(alpha, style, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: [EasingStyle; 11] = [
        EasingStyle::Linear,
        EasingStyle::Sine,
        EasingStyle::Quad,
        EasingStyle::Cubic,
        EasingStyle::Quart,
        EasingStyle::Quint,
        EasingStyle::Exponential,
        EasingStyle::Circular,
        EasingStyle::Back,
        EasingStyle::Bounce,
        EasingStyle::Elastic,
    ];

    const DIRECTIONS: [EasingDirection; 3] = [
        EasingDirection::In,
        EasingDirection::Out,
        EasingDirection::InOut,
    ];

    #[test]
    fn endpoints_are_exact() {
        for style in STYLES {
            for direction in DIRECTIONS {
                assert_eq!(ease(0.0, style, direction), 0.0, "{style:?} {direction:?}");
                assert_eq!(ease(1.0, style, direction), 1.0, "{style:?} {direction:?}");
            }
        }
    }

    #[test]
    fn out_of_range_alpha_is_clamped() {
        assert_eq!(ease(-3.0, EasingStyle::Back, EasingDirection::Out), 0.0);
        assert_eq!(ease(7.0, EasingStyle::Elastic, EasingDirection::In), 1.0);
    }

    #[test]
    fn quad_matches_closed_form() {
        assert!((ease(0.5, EasingStyle::Quad, EasingDirection::In) - 0.25).abs() < 1e-12);
        assert!((ease(0.5, EasingStyle::Quad, EasingDirection::Out) - 0.75).abs() < 1e-12);
        assert!((ease(0.5, EasingStyle::Quad, EasingDirection::InOut) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn monotonic_styles_stay_in_range() {
        let monotonic = [
            EasingStyle::Linear,
            EasingStyle::Sine,
            EasingStyle::Quad,
            EasingStyle::Cubic,
            EasingStyle::Quart,
            EasingStyle::Quint,
            EasingStyle::Exponential,
            EasingStyle::Circular,
            EasingStyle::Bounce,
        ];

        for style in monotonic {
            for direction in DIRECTIONS {
                for step in 0..=20 {
                    let value = ease(step as f64 / 20.0, style, direction);
                    assert!((0.0..=1.0).contains(&value), "{style:?} {direction:?} {value}");
                }
            }
        }
    }

    #[test]
    fn ease_number_interpolates() {
        let value = ease_number(0.5, 10.0, 20.0, EasingStyle::Linear, EasingDirection::In);
        assert_eq!(value, 15.0);
    }

    #[test]
    fn styles_deserialize_from_names() {
        let style: EasingStyle = serde_json::from_str(r#""Elastic""#).unwrap();
        assert_eq!(style, EasingStyle::Elastic);
    }
}
