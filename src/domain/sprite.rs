/// A positioned, animated instance.
///
/// Animation frames are shared with the template through `Arc`; each sprite
/// keeps its own playhead per animation so clones animate independently.

use std::sync::Arc;

use glam::Vec2;

use super::animation::{AnimationSet, Playhead};
use super::image::Image;

#[derive(Clone, Debug)]
pub struct Sprite {
    /// Top-left corner, world pixels.
    pub pos: Vec2,
    /// Pixels per millisecond.
    pub vel: Vec2,
    anims: Arc<AnimationSet>,
    current: usize,
    playheads: Vec<Playhead>,
}

impl Sprite {
    pub fn new(anims: Arc<AnimationSet>) -> Self {
        let playheads = vec![Playhead::default(); anims.len()];
        Sprite { pos: Vec2::ZERO, vel: Vec2::ZERO, anims, current: 0, playheads }
    }

    pub fn animation_name(&self) -> &str {
        self.anims.get(self.current).name()
    }

    /// Current animation name mentions "left", ignoring case.
    pub fn faces_left(&self) -> bool {
        self.animation_name().to_uppercase().contains("LEFT")
    }

    pub fn faces_right(&self) -> bool {
        self.animation_name().to_uppercase().contains("RIGHT")
    }

    /// Switch animation by name. The playhead of the target animation is
    /// kept as it was. Unknown names leave the current animation in place.
    pub fn set_animation(&mut self, name: &str) -> bool {
        match self.anims.index_of(name) {
            Some(idx) => {
                self.current = idx;
                true
            }
            None => {
                tracing::warn!(animation = name, "no such animation, keeping '{}'", self.animation_name());
                false
            }
        }
    }

    /// Switch to `name` if it differs from the current animation, otherwise
    /// advance. Returns true when the animation changed.
    pub fn switch_or_advance(&mut self, name: Option<&str>, dt: u64) -> bool {
        if let Some(name) = name {
            if name != self.animation_name() && self.anims.index_of(name).is_some() {
                return self.set_animation(name);
            }
        }
        self.advance(dt);
        false
    }

    pub fn advance(&mut self, dt: u64) {
        let anim = self.anims.get(self.current);
        self.playheads[self.current].advance(anim, dt);
    }

    pub fn playhead(&self) -> Playhead {
        self.playheads[self.current]
    }

    pub fn image(&self) -> &Arc<Image> {
        let anim = self.anims.get(self.current);
        &anim.frames()[self.playheads[self.current].frame_index].image
    }

    pub fn width(&self) -> u32 { self.image().width() }
    pub fn height(&self) -> u32 { self.image().height() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::Animation;

    fn two_anims() -> Arc<AnimationSet> {
        let a = Arc::new(Image::solid(2, 2, [0, 0, 0]));
        let b = Arc::new(Image::solid(4, 4, [0, 0, 0]));
        Arc::new(AnimationSet::new(vec![
            Animation::new("left", vec![(a.clone(), 50), (a.clone(), 50)]).unwrap(),
            Animation::still("right", b),
        ]).unwrap())
    }

    #[test]
    fn first_animation_is_initial() {
        let s = Sprite::new(two_anims());
        assert_eq!(s.animation_name(), "left");
        assert!(s.faces_left());
        assert_eq!(s.width(), 2);
    }

    #[test]
    fn unknown_animation_keeps_current() {
        let mut s = Sprite::new(two_anims());
        assert!(!s.set_animation("deadLeft"));
        assert_eq!(s.animation_name(), "left");
    }

    #[test]
    fn clones_have_independent_playheads() {
        let mut a = Sprite::new(two_anims());
        let b = a.clone();
        a.advance(60);
        assert_eq!(a.playhead().frame_index, 1);
        assert_eq!(b.playhead().frame_index, 0);
    }

    #[test]
    fn switch_replaces_advance() {
        let mut s = Sprite::new(two_anims());
        assert!(s.switch_or_advance(Some("right"), 500));
        assert_eq!(s.animation_name(), "right");
        assert_eq!(s.height(), 4);
        assert!(!s.switch_or_advance(Some("right"), 500));
    }
}
