/// Collision queries.
///
/// Broad phase is an integer-rounded AABB test; the pixel test only runs
/// for pairs that pass it. Tile collision sweeps the union of the old and
/// candidate boxes so fast sprites cannot tunnel through a tile.

use glam::Vec2;

use super::entity::{Entity, Player, PLAYER_ID};
use super::sprite::Sprite;
use super::tile::TileGrid;

/// Round to the nearest pixel, halves going up.
pub fn round_px(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

pub fn tiles_to_pixels(tile: i32, tile_size: u32) -> f32 {
    (tile as f32 * tile_size as f32).floor()
}

pub fn pixels_to_tiles(px: f32, tile_size: u32) -> i32 {
    (px / tile_size as f32).floor() as i32
}

/// Anything that can take part in sprite-vs-sprite collision.
pub trait Collider {
    fn id(&self) -> u32;
    fn sprite(&self) -> &Sprite;
    /// Creatures outside NORMAL are ignored by every collision query.
    fn is_interactive(&self) -> bool;
}

impl Collider for Entity {
    fn id(&self) -> u32 { self.id }
    fn sprite(&self) -> &Sprite { &self.sprite }
    fn is_interactive(&self) -> bool {
        self.creature().map_or(true, |c| c.life.is_normal())
    }
}

impl Collider for Player {
    fn id(&self) -> u32 { PLAYER_ID }
    fn sprite(&self) -> &Sprite { &self.sprite }
    fn is_interactive(&self) -> bool { self.life.is_normal() }
}

/// Integer rectangle `(x, y, w, h)` of the sprite's current frame.
fn rect(s: &Sprite) -> (i32, i32, i32, i32) {
    (round_px(s.pos.x), round_px(s.pos.y), s.width() as i32, s.height() as i32)
}

// ══════════════════════════════════════════════════════════════
// Broad phase
// ══════════════════════════════════════════════════════════════

pub fn is_collision(a: &dyn Collider, b: &dyn Collider) -> bool {
    if a.id() == b.id() { return false; }
    if !a.is_interactive() || !b.is_interactive() { return false; }
    let (ax, ay, aw, ah) = rect(a.sprite());
    let (bx, by, bw, bh) = rect(b.sprite());
    ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
}

/// Index of the first entity `s` overlaps, in collection order. Entities
/// already marked for removal are skipped.
pub fn sprite_collision(s: &dyn Collider, entities: &[Entity]) -> Option<usize> {
    entities.iter().position(|e| !e.removed && is_collision(s, e))
}

// ══════════════════════════════════════════════════════════════
// Narrow phase
// ══════════════════════════════════════════════════════════════

/// Pixel-exact test: true once some pixel of the overlap is opaque in both
/// frames. Disjoint rectangles return before any pixel is read.
pub fn pixel_collision(a: &Sprite, b: &Sprite) -> bool {
    let (ax, ay, aw, ah) = rect(a);
    let (bx, by, bw, bh) = rect(b);
    let left = ax.max(bx);
    let right = (ax + aw).min(bx + bw);
    let top = ay.max(by);
    let bottom = (ay + ah).min(by + bh);
    if left >= right || top >= bottom { return false; }

    let (ia, ib) = (a.image(), b.image());
    for y in top..bottom {
        for x in left..right {
            if ia.is_opaque((x - ax) as u32, (y - ay) as u32)
                && ib.is_opaque((x - bx) as u32, (y - by) as u32)
            {
                return true;
            }
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Tiles
// ══════════════════════════════════════════════════════════════

/// First solid tile touched by moving `s` to `candidate`, scanning the
/// swept box row by row.
pub fn tile_collision(
    tiles: &TileGrid,
    tile_size: u32,
    s: &Sprite,
    candidate: Vec2,
) -> Option<(i32, i32)> {
    let from = s.pos.min(candidate);
    let to = s.pos.max(candidate);
    let from_x = pixels_to_tiles(from.x, tile_size);
    let from_y = pixels_to_tiles(from.y, tile_size);
    let to_x = pixels_to_tiles(to.x + s.width() as f32 - 1.0, tile_size);
    let to_y = pixels_to_tiles(to.y + s.height() as f32 - 1.0, tile_size);

    for y in from_y..=to_y {
        for x in from_x..=to_x {
            if tiles.is_solid(x, y) {
                return Some((x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::domain::animation::{Animation, AnimationSet};
    use crate::domain::entity::{Body, Creature, CreatureKind, EntityKind, Lifecycle};
    use crate::domain::image::Image;

    fn sprite_of(img: Image, x: f32, y: f32) -> Sprite {
        let set = AnimationSet::new(vec![Animation::still("left", Arc::new(img))]).unwrap();
        let mut s = Sprite::new(Arc::new(set));
        s.pos = Vec2::new(x, y);
        s
    }

    fn opaque(w: u32, h: u32, x: f32, y: f32) -> Sprite {
        sprite_of(Image::solid(w, h, [255, 0, 0]), x, y)
    }

    fn faint(w: u32, h: u32, x: f32, y: f32) -> Sprite {
        let px = vec![[255, 255, 255, 19]; (w * h) as usize];
        sprite_of(Image::new(w, h, px), x, y)
    }

    /// Open grid with a single block at (5, 3).
    fn block_grid() -> TileGrid {
        let mut g = TileGrid::new(10, 6);
        g.set(5, 3, 'A');
        g
    }

    // ── helpers ──

    #[test]
    fn tile_pixel_conversion_floors() {
        assert_eq!(tiles_to_pixels(5, 32), 160.0);
        assert_eq!(pixels_to_tiles(159.9, 32), 4);
        assert_eq!(pixels_to_tiles(-0.1, 32), -1);
        assert_eq!(round_px(2.5), 3);
        assert_eq!(round_px(-0.5), 0);
    }

    // ── pixel collision ──

    #[test]
    fn full_overlap_of_opaque_images_collides() {
        assert!(pixel_collision(&opaque(10, 10, 0.0, 0.0), &opaque(10, 10, 0.0, 0.0)));
    }

    #[test]
    fn disjoint_rectangles_do_not_collide() {
        assert!(!pixel_collision(&opaque(10, 10, 0.0, 0.0), &opaque(10, 10, 10.0, 0.0)));
        assert!(!pixel_collision(&opaque(10, 10, 0.0, 0.0), &opaque(10, 10, 0.0, -10.0)));
    }

    #[test]
    fn faint_pixels_never_collide() {
        assert!(!pixel_collision(&faint(10, 10, 0.0, 0.0), &opaque(10, 10, 3.0, 3.0)));
    }

    #[test]
    fn last_row_and_column_are_scanned() {
        let rows: Vec<String> = vec!["....".into(), "....".into(), "...#".into()];
        let a = sprite_of(Image::from_mask(&rows, 1, [1, 1, 1]), 0.0, 0.0);
        let b = opaque(1, 1, 3.0, 2.0);
        assert!(pixel_collision(&a, &b));
    }

    #[test]
    fn pixel_test_uses_rounded_positions() {
        // 9.6 rounds to 10: touching edges, no overlap
        assert!(!pixel_collision(&opaque(10, 10, 0.0, 0.0), &opaque(10, 10, 9.6, 0.0)));
        assert!(pixel_collision(&opaque(10, 10, 0.0, 0.0), &opaque(10, 10, 9.4, 0.0)));
    }

    // ── tiles ──

    #[test]
    fn rightward_sweep_hits_block() {
        let g = block_grid();
        let s = opaque(32, 32, 100.0, 96.0);
        assert_eq!(tile_collision(&g, 32, &s, Vec2::new(140.0, 96.0)), Some((5, 3)));
    }

    #[test]
    fn sweep_catches_thin_crossing() {
        let mut g = TileGrid::new(20, 4);
        g.set(10, 0, 'A');
        let s = opaque(8, 8, 0.0, 0.0);
        // Jumps well past column 10 in one step
        assert_eq!(tile_collision(&g, 32, &s, Vec2::new(500.0, 0.0)), Some((10, 0)));
    }

    #[test]
    fn left_of_map_is_a_wall() {
        let g = block_grid();
        let s = opaque(16, 16, 2.0, 40.0);
        assert_eq!(tile_collision(&g, 32, &s, Vec2::new(-3.0, 40.0)), Some((-1, 1)));
    }

    #[test]
    fn above_map_is_open() {
        let g = block_grid();
        let s = opaque(16, 16, 40.0, 2.0);
        assert_eq!(tile_collision(&g, 32, &s, Vec2::new(40.0, -50.0)), None);
    }

    #[test]
    fn scan_is_row_major() {
        let mut g = TileGrid::new(4, 4);
        g.set(2, 0, 'A');
        g.set(0, 1, 'B');
        let s = opaque(96, 64, 0.0, 0.0);
        assert_eq!(tile_collision(&g, 32, &s, Vec2::ZERO), Some((2, 0)));
    }

    // ── broad phase ──

    fn decoration(id: u32, sprite: Sprite) -> Entity {
        Entity { id, kind: EntityKind::Sprite, sprite, body: Body::Decoration, removed: false }
    }

    #[test]
    fn broad_phase_ignores_self_and_touching_edges() {
        let a = decoration(1, opaque(10, 10, 0.0, 0.0));
        assert!(!is_collision(&a, &a));
        let b = decoration(2, opaque(10, 10, 10.0, 0.0));
        assert!(!is_collision(&a, &b));
        let c = decoration(3, opaque(10, 10, 9.0, 9.0));
        assert!(is_collision(&a, &c));
    }

    #[test]
    fn dying_creatures_are_not_collidable() {
        let a = decoration(1, opaque(10, 10, 0.0, 0.0));
        let mut grub = decoration(2, opaque(10, 10, 0.0, 0.0));
        grub.body = Body::Creature(Creature {
            kind: CreatureKind::Grub,
            life: Lifecycle::new(1000),
            max_speed: 0.05,
        });
        assert!(is_collision(&a, &grub));
        grub.kill();
        assert!(!is_collision(&a, &grub));
    }

    #[test]
    fn removed_entities_are_skipped() {
        let a = decoration(1, opaque(10, 10, 0.0, 0.0));
        let mut hit = decoration(2, opaque(10, 10, 0.0, 0.0));
        let other = decoration(3, opaque(10, 10, 5.0, 0.0));
        hit.removed = true;
        assert_eq!(sprite_collision(&a, &[hit, other]), Some(1));
    }
}
