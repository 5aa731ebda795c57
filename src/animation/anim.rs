use serde::{Deserialize, Serialize};

use crate::{
    animation::ease::Ease,
    animation::proc::ProcScalar,
    foundation::core::{Fps, FrameIndex, TimelinePos},
    foundation::error::{PdfShapeError, PdfShapeResult},
};

#[derive(Clone, Copy, Debug)]
/// Sampling context provided to curve evaluators.
pub struct SampleCtx {
    /// Item-local frame, already clamped into the item duration.
    pub frame: FrameIndex,
    /// Item duration in frames.
    pub duration: u64,
    /// Timeline frame rate.
    pub fps: Fps,
}

impl SampleCtx {
    /// Item progress in `[0, 1]` at `frame`.
    pub fn progress(self) -> f64 {
        if self.duration <= 1 {
            return 0.0;
        }
        (self.frame.0 as f64 / (self.duration - 1) as f64).clamp(0.0, 1.0)
    }

    fn with_frame(mut self, frame: FrameIndex) -> Self {
        self.frame = frame;
        self
    }
}

impl From<TimelinePos> for SampleCtx {
    fn from(pos: TimelinePos) -> Self {
        Self {
            frame: pos.sample_frame(),
            duration: pos.duration,
            fps: pos.fps,
        }
    }
}

/// Read-only curve interface consumed by the parameter sampler.
///
/// Implementations must be pure: the same position always yields the same value.
pub trait Curve {
    /// Instantaneous value at `pos`.
    fn value_at(&self, pos: TimelinePos) -> f64;
}

/// Scalar animation curve: keyframed, procedural, or an expression over other curves.
///
/// In JSON a bare number is a constant; everything else is externally tagged
/// (`{"keyframes": {...}}`, `{"procedural": {...}}`, `{"expr": {...}}`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anim {
    /// Piecewise animation defined by explicit keyframes.
    Keyframes(Keyframes),
    /// Deterministic procedural source.
    Procedural(ProcScalar),
    /// Expression composed from other curves.
    Expr(Expr),
}

impl<'de> Deserialize<'de> for Anim {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Tagged {
            Keyframes(Keyframes),
            Procedural(ProcScalar),
            Expr(Expr),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Constant(f64),
            Tagged(Tagged),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Constant(v) => Self::constant(v),
            Repr::Tagged(Tagged::Keyframes(k)) => Self::Keyframes(k),
            Repr::Tagged(Tagged::Procedural(p)) => Self::Procedural(p),
            Repr::Tagged(Tagged::Expr(e)) => Self::Expr(e),
        })
    }
}

impl Anim {
    /// Build a constant curve that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::Keyframes(Keyframes {
            keys: vec![Keyframe {
                frame: FrameIndex(0),
                value,
                ease: Ease::Linear,
            }],
            mode: InterpMode::Hold,
            default: None,
        })
    }

    /// Build a linear two-key ramp.
    pub fn linear(from: (u64, f64), to: (u64, f64)) -> Self {
        Self::Keyframes(Keyframes {
            keys: vec![
                Keyframe {
                    frame: FrameIndex(from.0),
                    value: from.1,
                    ease: Ease::Linear,
                },
                Keyframe {
                    frame: FrameIndex(to.0),
                    value: to.1,
                    ease: Ease::Linear,
                },
            ],
            mode: InterpMode::Linear,
            default: None,
        })
    }

    /// Sample the curve at the given context.
    pub fn sample(&self, ctx: SampleCtx) -> PdfShapeResult<f64> {
        match self {
            Self::Keyframes(kf) => kf.sample(ctx),
            Self::Procedural(p) => Ok(p.sample(ctx)),
            Self::Expr(expr) => expr.sample(ctx),
        }
    }

    /// Validate static invariants for this curve tree.
    pub fn validate(&self) -> PdfShapeResult<()> {
        match self {
            Self::Keyframes(kf) => kf.validate(),
            Self::Procedural(_) => Ok(()),
            Self::Expr(expr) => expr.validate(),
        }
    }

    /// Value used when sampling fails: the first key, the default, or 0.
    fn fallback(&self) -> f64 {
        match self {
            Self::Keyframes(kf) => kf
                .keys
                .first()
                .map(|k| k.value)
                .or(kf.default)
                .unwrap_or(0.0),
            Self::Procedural(_) => 0.0,
            Self::Expr(expr) => expr.primary().fallback(),
        }
    }
}

impl Curve for Anim {
    fn value_at(&self, pos: TimelinePos) -> f64 {
        match self.sample(SampleCtx::from(pos)) {
            Ok(v) if v.is_finite() => v,
            Ok(v) => {
                tracing::warn!(value = v, frame = pos.frame.0, "curve produced a non-finite value");
                self.fallback()
            }
            Err(err) => {
                tracing::warn!(error = %err, frame = pos.frame.0, "curve sampling failed");
                self.fallback()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Keyframed curve with optional default value.
pub struct Keyframes {
    /// Keyframes sorted by `frame`.
    pub keys: Vec<Keyframe>,
    /// Interpolation mode between adjacent keyframes.
    #[serde(default)]
    pub mode: InterpMode,
    /// Value used when `keys` is empty.
    #[serde(default)]
    pub default: Option<f64>,
}

impl Keyframes {
    /// Validate keyframe ordering and default/fallback requirements.
    pub fn validate(&self) -> PdfShapeResult<()> {
        if self.keys.is_empty() && self.default.is_none() {
            return Err(PdfShapeError::animation(
                "Keyframes must have at least one key or a default value",
            ));
        }
        if !self.keys.windows(2).all(|w| w[0].frame.0 <= w[1].frame.0) {
            return Err(PdfShapeError::animation(
                "Keyframes keys must be sorted by frame",
            ));
        }
        Ok(())
    }

    /// Sample keyframed value in item-local time.
    pub fn sample(&self, ctx: SampleCtx) -> PdfShapeResult<f64> {
        if self.keys.is_empty() {
            return self
                .default
                .ok_or_else(|| PdfShapeError::animation("Keyframes has no keys and no default"));
        }

        let f = ctx.frame.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);

        if idx == 0 {
            return Ok(self.keys[0].value);
        }
        if idx >= self.keys.len() {
            return Ok(self.keys[self.keys.len() - 1].value);
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 {
            return Ok(a.value);
        }

        let t = ((f - a.frame.0) as f64) / (denom as f64);
        let te = a.ease.apply(t);
        match self.mode {
            InterpMode::Hold => Ok(a.value),
            InterpMode::Linear => Ok(a.value + (b.value - a.value) * te),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One keyframe in a keyframed curve.
pub struct Keyframe {
    /// Item-local frame index for this key.
    pub frame: FrameIndex,
    /// Value at `frame`.
    pub value: f64,
    /// Easing function applied toward the next keyframe.
    #[serde(default)]
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Interpolation strategy between keyframes.
pub enum InterpMode {
    /// Hold the previous key value until the next keyframe.
    Hold,
    /// Interpolate between keyframes using [`Ease`].
    #[default]
    Linear,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Composable curve expression operators.
pub enum Expr {
    /// Delay a curve by `by` frames.
    Delay {
        /// Inner curve.
        inner: Box<Anim>,
        /// Delay amount in frames.
        by: u64,
    },
    /// Remap time by multiplying the local frame index by `factor`.
    Speed {
        /// Inner curve.
        inner: Box<Anim>,
        /// Time scale factor (`> 0`).
        factor: f64,
    },
    /// Reverse local time over the item duration.
    Reverse {
        /// Inner curve.
        inner: Box<Anim>,
    },
    /// Loop local time over `period` frames.
    Loop {
        /// Inner curve.
        inner: Box<Anim>,
        /// Loop period in frames (`> 0`).
        period: u64,
        /// Loop mapping strategy.
        #[serde(default)]
        mode: LoopMode,
    },
    /// Blend two curves with animated blend factor `t`.
    Mix {
        /// First input curve.
        a: Box<Anim>,
        /// Second input curve.
        b: Box<Anim>,
        /// Blend factor curve in `[0, 1]`.
        t: Box<Anim>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Looping strategy used by [`Expr::Loop`].
pub enum LoopMode {
    /// Wrap at the period boundary.
    #[default]
    Repeat,
    /// Bounce forward/backward across the period.
    PingPong,
}

impl Expr {
    /// Validate expression-specific invariants recursively.
    pub fn validate(&self) -> PdfShapeResult<()> {
        match self {
            Self::Delay { inner, by: _ } | Self::Reverse { inner } => inner.validate(),
            Self::Speed { inner, factor } => {
                if !factor.is_finite() || *factor <= 0.0 {
                    return Err(PdfShapeError::animation("Speed factor must be > 0"));
                }
                inner.validate()
            }
            Self::Loop { inner, period, .. } => {
                if *period == 0 {
                    return Err(PdfShapeError::animation("Loop period must be > 0"));
                }
                inner.validate()
            }
            Self::Mix { a, b, t } => {
                a.validate()?;
                b.validate()?;
                t.validate()
            }
        }
    }

    fn primary(&self) -> &Anim {
        match self {
            Self::Delay { inner, .. }
            | Self::Speed { inner, .. }
            | Self::Reverse { inner }
            | Self::Loop { inner, .. } => inner,
            Self::Mix { a, .. } => a,
        }
    }

    /// Sample this expression by remapping local frame coordinates.
    pub fn sample(&self, ctx: SampleCtx) -> PdfShapeResult<f64> {
        match self {
            Self::Delay { inner, by } => {
                let f = ctx.frame.0;
                inner.sample(ctx.with_frame(FrameIndex(f.saturating_sub(*by))))
            }
            Self::Speed { inner, factor } => {
                if *factor <= 0.0 {
                    return Err(PdfShapeError::animation("Speed factor must be > 0"));
                }
                let f = ctx.frame.0 as f64;
                let mapped = FrameIndex((f * factor).floor().max(0.0) as u64);
                inner.sample(ctx.with_frame(mapped))
            }
            Self::Reverse { inner } => {
                let max = ctx.duration.saturating_sub(1);
                let f = ctx.frame.0.min(max);
                inner.sample(ctx.with_frame(FrameIndex(max - f)))
            }
            Self::Loop {
                inner,
                period,
                mode,
            } => {
                if *period == 0 {
                    return Err(PdfShapeError::animation("Loop period must be > 0"));
                }
                let f = ctx.frame.0;
                let mapped = match mode {
                    LoopMode::Repeat => f % period,
                    LoopMode::PingPong => {
                        if *period == 1 {
                            0
                        } else {
                            // u128 so huge periods cannot overflow the bounce length
                            let cycle = 2 * (u128::from(*period) - 1);
                            let pos = u128::from(f) % cycle;
                            let bounced = if pos < u128::from(*period) {
                                pos
                            } else {
                                cycle - pos
                            };
                            u64::try_from(bounced).unwrap_or(u64::MAX)
                        }
                    }
                };
                inner.sample(ctx.with_frame(FrameIndex(mapped)))
            }
            Self::Mix { a, b, t } => {
                let tt = t.sample(ctx)?.clamp(0.0, 1.0);
                let av = a.sample(ctx)?;
                let bv = b.sample(ctx)?;
                Ok(av + (bv - av) * tt)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
