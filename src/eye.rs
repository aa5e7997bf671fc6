use crate::assets::TextureProvider;
use crate::scale::{Point, ScaleContext, Size};

/// Container graphic of corpses.
pub const CORPSE_GRAPHIC: u16 = 0x0009;

/// First of the two consecutive eye frames.
pub const EYE_BASE_GRAPHIC: u16 = 0x0045;

pub const EYE_FLIP_INTERVAL_MS: f64 = 750.0;

/// Logical position of the eye inside the corpse window.
pub const EYE_POSITION: Point = Point::new(45, 30);

/// Two-frame blink timer for the corpse eye.
///
/// Driven by the elapsed time passed to [`tick`](Self::tick); it never reads
/// a clock itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorpseEyeAnimator {
    frame: u16,
    next_flip_ms: f64,
}

impl CorpseEyeAnimator {
    /// Animator whose first flip is due one interval after `now_ms`.
    pub fn starting_at(now_ms: f64) -> Self {
        Self {
            frame: 0,
            next_flip_ms: now_ms + EYE_FLIP_INTERVAL_MS,
        }
    }

    pub fn frame(&self) -> u16 {
        self.frame
    }

    pub fn graphic(&self) -> u16 {
        EYE_BASE_GRAPHIC + self.frame
    }

    pub fn next_flip_ms(&self) -> f64 {
        self.next_flip_ms
    }

    /// Advance to `now_ms`. Returns the new eye graphic when the frame flipped.
    pub fn tick(&mut self, now_ms: f64) -> Option<u16> {
        if now_ms < self.next_flip_ms {
            return None;
        }

        self.frame ^= 1;
        self.next_flip_ms = now_ms + EYE_FLIP_INTERVAL_MS;
        Some(self.graphic())
    }
}

/// The eye sprite shown on corpse windows.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeIcon {
    pub graphic: u16,
    pub position: Point,
    pub size: Size,
    pub visible: bool,
}

impl EyeIcon {
    /// Eye at its base frame, sized from the base sprite.
    pub fn build(textures: &dyn TextureProvider, ctx: ScaleContext) -> Self {
        let size = textures
            .gump_size(EYE_BASE_GRAPHIC)
            .map(|s| ctx.size(s))
            .unwrap_or(Size::ZERO);

        Self {
            graphic: EYE_BASE_GRAPHIC,
            position: ctx.point(EYE_POSITION),
            size,
            visible: true,
        }
    }

    /// Switch frame and resize from the texture now being drawn.
    ///
    /// Frames differ slightly in natural size; sizing from the live texture
    /// keeps flips from accumulating scale error. Keeps the old size when the
    /// texture is unavailable.
    pub fn show_frame(&mut self, graphic: u16, textures: &dyn TextureProvider, ctx: ScaleContext) {
        self.graphic = graphic;
        if let Some(natural) = textures.gump_size(graphic) {
            self.size = ctx.size(natural);
        }
    }
}
