/// Easing applied to keyframe progress.
///
/// Every non-linear ease is one ease-in curve from a [`Family`] used forwards (`In*`), mirrored
/// (`Out*`), or both halves joined at `t = 0.5` (`InOut*`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InSine,
    OutSine,
    InOutSine,
    InExpo,
    OutExpo,
    InOutExpo,
}

#[derive(Clone, Copy)]
enum Family {
    Quad,
    Cubic,
    Sine,
    Expo,
}

#[derive(Clone, Copy)]
enum Shape {
    In,
    Out,
    InOut,
}

impl Family {
    fn ease_in(self, t: f64) -> f64 {
        match self {
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Sine => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Self::Expo if t <= 0.0 => 0.0,
            Self::Expo => 2f64.powf(10.0 * t - 10.0),
        }
    }
}

impl Ease {
    fn parts(self) -> Option<(Family, Shape)> {
        let parts = match self {
            Self::Linear => return None,
            Self::InQuad => (Family::Quad, Shape::In),
            Self::OutQuad => (Family::Quad, Shape::Out),
            Self::InOutQuad => (Family::Quad, Shape::InOut),
            Self::InCubic => (Family::Cubic, Shape::In),
            Self::OutCubic => (Family::Cubic, Shape::Out),
            Self::InOutCubic => (Family::Cubic, Shape::InOut),
            Self::InSine => (Family::Sine, Shape::In),
            Self::OutSine => (Family::Sine, Shape::Out),
            Self::InOutSine => (Family::Sine, Shape::InOut),
            Self::InExpo => (Family::Expo, Shape::In),
            Self::OutExpo => (Family::Expo, Shape::Out),
            Self::InOutExpo => (Family::Expo, Shape::InOut),
        };
        Some(parts)
    }

    /// Map progress `t` (clamped to `[0, 1]`) through this ease. Endpoints are preserved.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let Some((family, shape)) = self.parts() else {
            return t;
        };
        let v = match shape {
            Shape::In => family.ease_in(t),
            Shape::Out => 1.0 - family.ease_in(1.0 - t),
            Shape::InOut if t < 0.5 => family.ease_in(2.0 * t) / 2.0,
            Shape::InOut => 1.0 - family.ease_in(2.0 - 2.0 * t) / 2.0,
        };
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
