/// Motion helpers shared by the player and creature passes.
///
/// Integration is axis-separated: X is resolved and committed before Y is
/// integrated from the updated X, so a sprite sliding along a wall still
/// falls and a sprite landing on a floor still slides.

use glam::Vec2;

use super::collision::{tile_collision, tiles_to_pixels};
use super::sprite::Sprite;
use super::tile::TileGrid;

/// Vertical acceleration for one frame. `thrust` opposes gravity.
pub fn apply_gravity(vel: &mut Vec2, gravity: f32, thrust: f32, dt: f32) {
    vel.y += (gravity - thrust) * dt;
}

/// Result of one axis step.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AxisStep {
    pub pos: Vec2,
    /// A tile blocked the move and `pos` was snapped against it.
    pub blocked: bool,
}

/// Move along X. On a tile hit the sprite is snapped flush against the tile
/// face it was approaching.
pub fn step_x(tiles: &TileGrid, tile_size: u32, s: &Sprite, dt: f32) -> AxisStep {
    let mut pos = s.pos;
    pos.x += s.vel.x * dt;
    match tile_collision(tiles, tile_size, s, pos) {
        Some((tx, _)) => {
            if s.vel.x > 0.0 {
                pos.x = tiles_to_pixels(tx, tile_size) - s.width() as f32;
            } else if s.vel.x < 0.0 {
                pos.x = tiles_to_pixels(tx + 1, tile_size);
            }
            AxisStep { pos, blocked: true }
        }
        None => AxisStep { pos, blocked: false },
    }
}

/// Move along Y from the sprite's current (already X-resolved) position.
pub fn step_y(tiles: &TileGrid, tile_size: u32, s: &Sprite, dt: f32) -> AxisStep {
    let mut pos = s.pos;
    pos.y += s.vel.y * dt;
    match tile_collision(tiles, tile_size, s, pos) {
        Some((_, ty)) => {
            if s.vel.y > 0.0 {
                pos.y = tiles_to_pixels(ty, tile_size) - s.height() as f32;
            } else if s.vel.y < 0.0 {
                pos.y = tiles_to_pixels(ty + 1, tile_size);
            }
            AxisStep { pos, blocked: true }
        }
        None => AxisStep { pos, blocked: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::domain::animation::{Animation, AnimationSet};
    use crate::domain::image::Image;

    fn block(w: u32, h: u32, x: f32, y: f32, vel: Vec2) -> Sprite {
        let img = Arc::new(Image::solid(w, h, [0, 0, 0]));
        let set = AnimationSet::new(vec![Animation::still("right", img)]).unwrap();
        let mut s = Sprite::new(Arc::new(set));
        s.pos = Vec2::new(x, y);
        s.vel = vel;
        s
    }

    /// A 10x6 grid, tile size 32, only (5, 3) solid.
    fn grid() -> TileGrid {
        let mut g = TileGrid::new(10, 6);
        g.set(5, 3, 'A');
        g
    }

    #[test]
    fn moving_right_snaps_right_edge_to_tile_face() {
        let s = block(20, 20, 130.0, 100.0, Vec2::new(0.35, 0.0));
        let step = step_x(&grid(), 32, &s, 50.0);
        assert!(step.blocked);
        assert_eq!(step.pos.x + 20.0, 5.0 * 32.0);
    }

    #[test]
    fn moving_left_snaps_to_tile_right_face() {
        let s = block(20, 20, 200.0, 100.0, Vec2::new(-0.35, 0.0));
        let step = step_x(&grid(), 32, &s, 50.0);
        assert!(step.blocked);
        assert_eq!(step.pos.x, 6.0 * 32.0);
    }

    #[test]
    fn falling_lands_on_tile_top() {
        let s = block(20, 20, 165.0, 60.0, Vec2::new(0.0, 0.5));
        let step = step_y(&grid(), 32, &s, 40.0);
        assert!(step.blocked);
        assert_eq!(step.pos.y, 3.0 * 32.0 - 20.0);
    }

    #[test]
    fn rising_hits_tile_bottom() {
        let s = block(20, 20, 165.0, 140.0, Vec2::new(0.0, -0.5));
        let step = step_y(&grid(), 32, &s, 40.0);
        assert!(step.blocked);
        assert_eq!(step.pos.y, 4.0 * 32.0);
    }

    #[test]
    fn open_air_moves_freely() {
        let s = block(20, 20, 10.0, 10.0, Vec2::new(0.1, 0.0));
        let step = step_x(&grid(), 32, &s, 100.0);
        assert!(!step.blocked);
        assert_eq!(step.pos.x, 20.0);
    }

    #[test]
    fn thrust_cancels_gravity() {
        let mut v = Vec2::ZERO;
        apply_gravity(&mut v, 0.002, 0.002, 16.0);
        assert_eq!(v.y, 0.0);
        apply_gravity(&mut v, 0.002, 0.0, 10.0);
        assert!((v.y - 0.02).abs() < 1e-6);
    }
}
