//! Y-derived draw ordering
//!
//! Anything that opts in with `depth_from_y` gets its draw order recomputed
//! from its vertical world position every frame, after all position updates.
//! The rendering collaborator consumes the resulting key; nothing here draws.

/// Capability interface for objects participating in depth sorting.
///
/// Objects without a meaningful position fall back to their physical body's
/// y, then to zero.
pub trait DepthSortable {
    /// Vertical world position, if the object has one
    fn depth_y(&self) -> Option<f32>;

    /// Fallback y taken from the physical body
    fn body_y(&self) -> Option<f32> {
        None
    }

    /// Whether draw order should track y
    fn depth_from_y(&self) -> bool;

    /// Offset added on top of y
    fn depth_offset(&self) -> f32 {
        0.0
    }

    /// Store the computed draw-order key
    fn set_draw_order(&mut self, order: f32);
}

/// Assigns draw order from vertical position for every flagged object
pub struct DepthSorter;

impl DepthSorter {
    /// Recompute draw order for each object with `depth_from_y` set.
    ///
    /// Each object's key is independent, so iteration order is irrelevant.
    /// Must run after all position-mutating updates for the frame.
    pub fn apply<'a, I>(objects: I)
    where
        I: IntoIterator<Item = &'a mut dyn DepthSortable>,
    {
        for object in objects {
            if !object.depth_from_y() {
                continue;
            }
            let y = object.depth_y().or_else(|| object.body_y()).unwrap_or(0.0);
            let offset = object.depth_offset();
            object.set_draw_order(y + offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sprite {
        y: Option<f32>,
        body_y: Option<f32>,
        flagged: bool,
        offset: f32,
        draw_order: f32,
    }

    impl Sprite {
        fn at(y: f32) -> Self {
            Self {
                y: Some(y),
                body_y: None,
                flagged: true,
                offset: 0.0,
                draw_order: 0.0,
            }
        }
    }

    impl DepthSortable for Sprite {
        fn depth_y(&self) -> Option<f32> {
            self.y
        }

        fn body_y(&self) -> Option<f32> {
            self.body_y
        }

        fn depth_from_y(&self) -> bool {
            self.flagged
        }

        fn depth_offset(&self) -> f32 {
            self.offset
        }

        fn set_draw_order(&mut self, order: f32) {
            self.draw_order = order;
        }
    }

    #[test]
    fn test_order_tracks_y_plus_offset() {
        let mut a = Sprite::at(120.0);
        let mut b = Sprite::at(64.0);
        b.offset = 8.0;

        DepthSorter::apply([
            &mut a as &mut dyn DepthSortable,
            &mut b as &mut dyn DepthSortable,
        ]);

        assert_eq!(a.draw_order, 120.0);
        assert_eq!(b.draw_order, 72.0);
    }

    #[test]
    fn test_unflagged_untouched() {
        let mut sprite = Sprite::at(99.0);
        sprite.flagged = false;
        sprite.draw_order = -5.0;

        DepthSorter::apply([&mut sprite as &mut dyn DepthSortable]);
        assert_eq!(sprite.draw_order, -5.0);
    }

    #[test]
    fn test_body_fallback_then_zero() {
        let mut body_only = Sprite::at(0.0);
        body_only.y = None;
        body_only.body_y = Some(40.0);

        let mut bare = Sprite::at(0.0);
        bare.y = None;
        bare.draw_order = 123.0;

        DepthSorter::apply([
            &mut body_only as &mut dyn DepthSortable,
            &mut bare as &mut dyn DepthSortable,
        ]);

        assert_eq!(body_only.draw_order, 40.0);
        assert_eq!(bare.draw_order, 0.0);
    }
}
