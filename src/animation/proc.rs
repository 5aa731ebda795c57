use crate::animation::anim::SampleCtx;
use crate::animation::ease::Ease;

/// Deterministic procedural scalar sources.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcScalar {
    /// `offset + amp * sin(2π * freq_hz * t + phase)` with `t` in seconds.
    Sine {
        amp: f64,
        freq_hz: f64,
        #[serde(default)]
        phase: f64,
        #[serde(default)]
        offset: f64,
    },
    /// Attack/decay/sustain/release envelope in frames, peaking at 1.0.
    Envelope {
        attack: u64,
        decay: u64,
        sustain: f64,
        release: u64,
    },
    /// Eased ramp from `from` to `to` across the whole item duration.
    Ramp {
        from: f64,
        to: f64,
        #[serde(default)]
        ease: Ease,
    },
}

impl ProcScalar {
    pub(crate) fn sample(&self, ctx: SampleCtx) -> f64 {
        let frame = ctx.frame.0;
        match *self {
            Self::Sine {
                amp,
                freq_hz,
                phase,
                offset,
            } => {
                let secs = ctx.fps.frames_to_secs(frame);
                offset + amp * (std::f64::consts::TAU * freq_hz * secs + phase).sin()
            }
            Self::Envelope {
                attack,
                decay,
                sustain,
                release,
            } => {
                let f = frame;
                if attack > 0 && f < attack {
                    f as f64 / attack as f64
                } else if decay > 0 && f < attack.saturating_add(decay) {
                    let u = (f - attack) as f64 / decay as f64;
                    1.0 + (sustain - 1.0) * u
                } else if release > 0 && f < attack.saturating_add(decay).saturating_add(release)
                {
                    let u = (f - attack - decay) as f64 / release as f64;
                    sustain * (1.0 - u)
                } else {
                    0.0
                }
            }
            Self::Ramp { from, to, ease } => {
                let t = ease.apply(ctx.progress());
                from + (to - from) * t
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/proc.rs"]
mod tests;
