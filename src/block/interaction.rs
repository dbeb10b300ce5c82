//! Mining and placing blocks with the mouse.
//!
//! Left click breaks the targeted block (resolved by the world's DDA
//! raycast) and banks its drop; right click places the selected hotbar
//! block against the hit face, refusing cells that intersect the player.
//! All writes go through `World::set_block`, which owns the remesh, light,
//! batch, water and leaf-decay fan-out.

use crate::block::{Block, BlockType};
use crate::world::World;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use std::collections::HashMap;

/// Reach for mining/placing, in blocks.
const INTERACT_RANGE: f32 = 5.0;
/// Eye-to-feet extent used for the placement intersection guard.
const PLAYER_HEIGHT: f32 = 1.7;

/// Placeable block selection; keys 1–9 pick a slot.
#[derive(Resource)]
pub struct Hotbar {
    pub slots: [BlockType; 9],
    pub selected: usize,
}

impl Default for Hotbar {
    fn default() -> Self {
        Hotbar {
            slots: [
                BlockType::Stone,
                BlockType::Dirt,
                BlockType::Sand,
                BlockType::OakWood,
                BlockType::Glass,
                BlockType::Glowstone,
                BlockType::StoneBrick,
                BlockType::Water,
                BlockType::Cactus,
            ],
            selected: 0,
        }
    }
}

/// Mined-block tally. There is no crafting; this is the loot sink.
#[derive(Resource, Default)]
pub struct Inventory {
    pub counts: HashMap<BlockType, u32>,
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct BlockInteractionCtx<'w, 's> {
    pub mouse: Res<'w, ButtonInput<MouseButton>>,
    pub keys: Res<'w, ButtonInput<KeyCode>>,
    pub world: Option<ResMut<'w, World>>,
    pub hotbar: ResMut<'w, Hotbar>,
    pub inventory: ResMut<'w, Inventory>,
    pub camera_query: Query<'w, 's, &'static Transform, With<Camera3d>>,
    pub window_query: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
}

#[allow(clippy::needless_pass_by_value)]
pub fn block_interaction(mut ctx: BlockInteractionCtx<'_, '_>) {
    let Some(mut world) = ctx.world else {
        return;
    };
    let Ok(window) = ctx.window_query.get_single() else {
        return;
    };
    if window.cursor.grab_mode != CursorGrabMode::Locked {
        return;
    }
    let Ok(camera) = ctx.camera_query.get_single() else {
        return;
    };

    for (i, key) in [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ]
    .into_iter()
    .enumerate()
    {
        if ctx.keys.just_pressed(key) {
            ctx.hotbar.selected = i;
        }
    }

    let origin = camera.translation;
    let direction = *camera.forward();
    let Some(hit) = world.raycast(origin, direction, INTERACT_RANGE) else {
        return;
    };

    if ctx.mouse.just_pressed(MouseButton::Left) {
        let kind = world.get_block(hit.cell.x, hit.cell.y, hit.cell.z).kind;
        if kind != BlockType::Bedrock && kind != BlockType::Air {
            if world.set_block(hit.cell.x, hit.cell.y, hit.cell.z, Block::AIR).is_some() {
                if let Some(stack) = kind.drop_for() {
                    *ctx.inventory.counts.entry(stack.kind).or_insert(0) += stack.count;
                }
            }
        }
    }

    if ctx.mouse.just_pressed(MouseButton::Right) {
        let place = hit.adjacent_cell();
        if hit.normal == IVec3::ZERO {
            return; // origin inside a block; nowhere sensible to place
        }

        // Refuse cells overlapping the player's body column.
        #[allow(clippy::cast_possible_truncation)]
        let (px, pz) = (origin.x.floor() as i32, origin.z.floor() as i32);
        #[allow(clippy::cast_possible_truncation)]
        let head = origin.y.floor() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let feet = (origin.y - PLAYER_HEIGHT).floor() as i32;
        let intersects =
            place.x == px && place.z == pz && place.y >= feet && place.y <= head;
        if intersects {
            return;
        }

        let target = world.get_block(place.x, place.y, place.z);
        if target.kind.is_solid() && target.kind != BlockType::Water {
            return;
        }
        let kind = ctx.hotbar.slots[ctx.hotbar.selected];
        let block = if kind == BlockType::Water {
            Block::water(0, false)
        } else {
            Block::of(kind)
        };
        world.set_block(place.x, place.y, place.z, block);
    }
}
