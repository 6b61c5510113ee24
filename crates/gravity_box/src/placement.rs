use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use game_helpers::input::PointerInput;
use game_helpers::{WINDOW_HEIGHT, WINDOW_WIDTH};

use crate::levels::LevelCatalog;
use crate::simulation::{
    AttemptState, GameState, LevelEntity, PLANK_FRICTION, PLANK_RESTITUTION,
};

pub struct PlacementPlugin;

pub const PLANK_SIZE: Vec2 = Vec2::new(60.0, 10.0);
/// Single key-press rotation step, degrees.
pub const ROTATE_STEP_DEGREES: f32 = 5.0;
/// Continuous rotation while a key or on-screen button is held, degrees per
/// update tick.
pub const ROTATE_HOLD_DEGREES: f32 = 2.0;

const PLANK_COLOR: Color = Color::srgb(0.8, 0.65, 0.35);

// Pointer presses outside this band belong to the HUD, not the board.
const PLAY_AREA_HALF_WIDTH: f32 = WINDOW_WIDTH / 2.0 - 10.0;
const PLAY_AREA_TOP: f32 = WINDOW_HEIGHT / 2.0 - 80.0;
const PLAY_AREA_BOTTOM: f32 = -WINDOW_HEIGHT / 2.0 + 60.0;

#[derive(Component)]
pub struct Plank;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Ordered record of the planks placed this attempt, plus the held-rotation
/// flags driven by the HUD's rotate buttons.
#[derive(Resource, Default)]
pub struct Placement {
    planks: Vec<Entity>,
    rotate_left_held: bool,
    rotate_right_held: bool,
}

impl Placement {
    pub fn count(&self) -> u32 {
        self.planks.len() as u32
    }

    pub fn last_placed(&self) -> Option<Entity> {
        self.planks.last().copied()
    }

    pub fn set_hold(&mut self, direction: RotateDirection, active: bool) {
        match direction {
            RotateDirection::Left => self.rotate_left_held = active,
            RotateDirection::Right => self.rotate_right_held = active,
        }
    }

    pub fn held(&self, direction: RotateDirection) -> bool {
        match direction {
            RotateDirection::Left => self.rotate_left_held,
            RotateDirection::Right => self.rotate_right_held,
        }
    }

    fn push(&mut self, plank: Entity) {
        self.planks.push(plank);
    }

    fn reset(&mut self) {
        self.planks.clear();
        self.rotate_left_held = false;
        self.rotate_right_held = false;
    }
}

/// What a pointer-down during placement should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    AddPlank,
    MoveLast,
    Ignore,
}

/// Below quota a press adds a plank; at quota it repositions the most recent
/// one instead.
pub const fn pointer_action(placed: u32, quota: u32) -> PointerAction {
    if placed < quota {
        PointerAction::AddPlank
    } else if placed > 0 {
        PointerAction::MoveLast
    } else {
        PointerAction::Ignore
    }
}

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Placement>()
            .add_systems(OnEnter(GameState::Placing), reset_placement)
            .add_systems(
                Update,
                (handle_pointer, rotate_step, rotate_hold)
                    .chain()
                    .run_if(in_state(GameState::Placing)),
            );
    }
}

/// Plank entities do not survive an attempt, so the ordering record starts
/// empty on every placement phase.
fn reset_placement(mut placement: ResMut<Placement>) {
    placement.reset();
}

fn in_play_area(position: Vec2) -> bool {
    position.x.abs() <= PLAY_AREA_HALF_WIDTH
        && position.y <= PLAY_AREA_TOP
        && position.y >= PLAY_AREA_BOTTOM
}

fn handle_pointer(
    mut commands: Commands,
    pointer: PointerInput,
    mut placement: ResMut<Placement>,
    attempt: Res<AttemptState>,
    mut planks: Query<&mut Transform, With<Plank>>,
) {
    let Some(position) = pointer.just_pressed_world() else {
        return;
    };
    if !in_play_area(position) {
        return;
    }

    let quota = LevelCatalog::get(attempt.level).plank_quota;
    match pointer_action(placement.count(), quota) {
        PointerAction::AddPlank => {
            let plank = commands
                .spawn((
                    Sprite {
                        color: PLANK_COLOR,
                        custom_size: Some(PLANK_SIZE),
                        ..default()
                    },
                    Transform::from_xyz(position.x, position.y, 0.0),
                    RigidBody::Fixed,
                    Collider::cuboid(PLANK_SIZE.x / 2.0, PLANK_SIZE.y / 2.0),
                    Friction::coefficient(PLANK_FRICTION),
                    Restitution::coefficient(PLANK_RESTITUTION),
                    crate::collision::BodyRole::Plank,
                    Plank,
                    LevelEntity,
                ))
                .id();
            placement.push(plank);
            info!("plank {}/{} placed", placement.count(), quota);
        }
        PointerAction::MoveLast => {
            // Reposition only; the angle the player dialed in stays.
            if let Some(entity) = placement.last_placed() {
                if let Ok(mut transform) = planks.get_mut(entity) {
                    transform.translation.x = position.x;
                    transform.translation.y = position.y;
                }
            }
        }
        PointerAction::Ignore => {}
    }
}

fn rotate_last(
    placement: &Placement,
    planks: &mut Query<&mut Transform, With<Plank>>,
    degrees: f32,
) {
    if degrees.abs() < f32::EPSILON {
        return;
    }
    let Some(entity) = placement.last_placed() else {
        return;
    };
    if let Ok(mut transform) = planks.get_mut(entity) {
        transform.rotate_z(degrees.to_radians());
    }
}

/// Single key-press rotation, kept alongside the held variant for
/// accessibility.
fn rotate_step(
    keys: Res<ButtonInput<KeyCode>>,
    placement: Res<Placement>,
    mut planks: Query<&mut Transform, With<Plank>>,
) {
    let mut degrees = 0.0;
    if keys.just_pressed(KeyCode::ArrowLeft) {
        degrees += ROTATE_STEP_DEGREES;
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        degrees -= ROTATE_STEP_DEGREES;
    }
    rotate_last(&placement, &mut planks, degrees);
}

/// Smooth rotation while arrow keys, A/D, or the on-screen buttons are held.
fn rotate_hold(
    keys: Res<ButtonInput<KeyCode>>,
    placement: Res<Placement>,
    mut planks: Query<&mut Transform, With<Plank>>,
) {
    let mut degrees = 0.0;
    if keys.pressed(KeyCode::ArrowLeft)
        || keys.pressed(KeyCode::KeyA)
        || placement.held(RotateDirection::Left)
    {
        degrees += ROTATE_HOLD_DEGREES;
    }
    if keys.pressed(KeyCode::ArrowRight)
        || keys.pressed(KeyCode::KeyD)
        || placement.held(RotateDirection::Right)
    {
        degrees -= ROTATE_HOLD_DEGREES;
    }
    rotate_last(&placement, &mut planks, degrees);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presses_add_until_quota_then_move() {
        assert_eq!(pointer_action(0, 2), PointerAction::AddPlank, "first press");
        assert_eq!(
            pointer_action(1, 2),
            PointerAction::AddPlank,
            "second press"
        );
        assert_eq!(
            pointer_action(2, 2),
            PointerAction::MoveLast,
            "press at quota repositions"
        );
    }

    #[test]
    fn zero_quota_ignores_presses() {
        assert_eq!(
            pointer_action(0, 0),
            PointerAction::Ignore,
            "nothing to add or move"
        );
    }

    #[test]
    fn plank_count_never_exceeds_quota() {
        for quota in 1..=3 {
            let mut placed = 0;
            for _ in 0..20 {
                if pointer_action(placed, quota) == PointerAction::AddPlank {
                    placed += 1;
                }
                assert!(placed <= quota, "quota {quota} exceeded");
            }
            assert_eq!(placed, quota, "quota {quota} should be reachable");
        }
    }

    #[test]
    fn hold_flags_track_start_and_stop() {
        let mut placement = Placement::default();
        placement.set_hold(RotateDirection::Left, true);
        assert!(placement.held(RotateDirection::Left), "left should be held");
        assert!(
            !placement.held(RotateDirection::Right),
            "right should be idle"
        );
        placement.set_hold(RotateDirection::Left, false);
        assert!(
            !placement.held(RotateDirection::Left),
            "left should be released"
        );
    }

    #[test]
    fn reset_forgets_planks_and_holds() {
        let mut placement = Placement::default();
        placement.push(Entity::from_raw(1));
        placement.set_hold(RotateDirection::Right, true);
        placement.reset();
        assert_eq!(placement.count(), 0, "plank record should be empty");
        assert!(
            placement.last_placed().is_none(),
            "no last-placed plank after reset"
        );
        assert!(
            !placement.held(RotateDirection::Right),
            "hold flags should clear"
        );
    }

    #[test]
    fn hud_band_is_outside_the_play_area() {
        assert!(in_play_area(Vec2::ZERO), "center of the board is placeable");
        assert!(
            !in_play_area(Vec2::new(0.0, PLAY_AREA_BOTTOM - 20.0)),
            "bottom button strip is not placeable"
        );
        assert!(
            !in_play_area(Vec2::new(0.0, PLAY_AREA_TOP + 20.0)),
            "top HUD strip is not placeable"
        );
    }
}
