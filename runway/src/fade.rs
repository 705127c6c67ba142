use crate::ItemId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    #[default]
    SmoothStep,
    EaseInOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
        }
    }
}

/// One frame of a cross-fade, applied through `ViewFactory::set_fade`.
///
/// `scale_y` is a vertical scale relative to the node's own size.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FadeFrame {
    pub opacity: f32,
    pub scale_y: f32,
}

impl FadeFrame {
    pub const IDENTITY: Self = Self {
        opacity: 1.0,
        scale_y: 1.0,
    };
}

/// A retired tombstone fading out over the content that replaced it.
#[derive(Debug)]
pub(crate) struct CrossFade<N> {
    pub(crate) tombstone: N,
    pub(crate) item: ItemId,
    pub(crate) started_ms: u64,
    /// Last position written to the tombstone.
    pub(crate) top: Option<u64>,
}

impl<N> CrossFade<N> {
    pub(crate) fn progress(&self, now_ms: u64, duration_ms: u64) -> f32 {
        if duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        (elapsed as f32 / duration_ms as f32).clamp(0.0, 1.0)
    }
}

/// Frames for the tombstone and the incoming node at eased progress `t`.
///
/// The tombstone grows (or shrinks) towards the real node's height while fading out; the real
/// node starts at the tombstone's size and settles at its own.
pub(crate) fn crossfade_frames(
    t: f32,
    tombstone_height: u32,
    real_height: u32,
) -> (FadeFrame, FadeFrame) {
    let tomb = tombstone_height.max(1) as f32;
    let real = if real_height == 0 { tomb } else { real_height as f32 };

    let tomb_scale = 1.0 + (real / tomb - 1.0) * t;
    let real_scale = tomb / real + (1.0 - tomb / real) * t;

    (
        FadeFrame {
            opacity: 1.0 - t,
            scale_y: tomb_scale,
        },
        FadeFrame {
            opacity: t,
            scale_y: real_scale,
        },
    )
}
