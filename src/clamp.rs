use crate::assets::Texture;
use crate::config::RenderConfig;
use crate::definitions::InteriorBounds;
use crate::scale::{Point, Size};

/// Places item icons inside a container's interior bounds.
///
/// Only containment in the frame is enforced; two items may still overlap.
pub struct BoundsClamper;

impl BoundsClamper {
    /// Final on-screen position of an item assigned to `logical`.
    ///
    /// `texture` is the item's display texture, `bounds` the container's
    /// unscaled interior bounds.
    pub fn place(
        logical: Point,
        texture: Option<Texture>,
        bounds: &InteriorBounds,
        config: &RenderConfig,
    ) -> Point {
        let ctx = config.scale_context();
        let position = ctx.point(logical);
        let footprint = Self::footprint(texture, config);

        Self::clamp(position, footprint, &bounds.scaled(ctx))
    }

    /// On-screen footprint of a texture, or `None` if it cannot be drawn.
    pub fn footprint(texture: Option<Texture>, config: &RenderConfig) -> Option<Size> {
        let texture = texture.filter(|t| !t.disposed)?;

        if config.scale_items_inside_containers {
            Some(config.scale_context().size(texture.size()))
        } else {
            Some(texture.size())
        }
    }

    /// Clamp a device-space position into device-space `bounds`.
    ///
    /// Without a footprint the item is anchored at the bounds origin. An item
    /// wider than the interior ends up with its far edge on the bounds edge,
    /// which may put its near edge before the origin; only the final floor at
    /// zero applies after that.
    pub fn clamp(position: Point, footprint: Option<Size>, bounds: &InteriorBounds) -> Point {
        let (mut x, mut y) = match footprint {
            Some(size) => (
                Self::clamp_axis(position.x, size.width, bounds.left, bounds.right),
                Self::clamp_axis(position.y, size.height, bounds.top, bounds.bottom),
            ),
            None => (bounds.left, bounds.top),
        };

        if x < 0 {
            x = 0;
        }
        if y < 0 {
            y = 0;
        }

        Point::new(x, y)
    }

    fn clamp_axis(position: i32, extent: i32, near: i32, far: i32) -> i32 {
        let mut p = position;
        if p < near {
            p = near;
        }
        if p.saturating_add(extent) > far {
            p = far.saturating_sub(extent);
        }
        p
    }
}
