use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::simulation::{AttemptState, GameState, LevelCompleteEvent};

/// What a physics body is, for collision interpretation.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyRole {
    Ball,
    Basket,
    Obstacle,
    Plank,
}

/// The ball's center must be this far above the basket sensor's center for a
/// contact to count as a catch. Rejects grazes from the side or below, which
/// the sensor's overlap geometry would otherwise let through.
pub const WIN_TOLERANCE: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Win,
    NoOp,
}

/// Decides whether a collision-start pair is the ball entering the basket
/// from above. Pure, and independent of which body came first in the pair.
pub fn interpret(a: (BodyRole, f32), b: (BodyRole, f32)) -> Verdict {
    let (ball_y, basket_y) = match (a, b) {
        ((BodyRole::Ball, ball_y), (BodyRole::Basket, basket_y))
        | ((BodyRole::Basket, basket_y), (BodyRole::Ball, ball_y)) => (ball_y, basket_y),
        _ => return Verdict::NoOp,
    };
    if ball_y > basket_y + WIN_TOLERANCE {
        Verdict::Win
    } else {
        Verdict::NoOp
    }
}

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            read_collisions.run_if(in_state(GameState::Simulating)),
        );
    }
}

/// Drains the engine's collision-start events and applies the win verdict.
fn read_collisions(
    mut events: EventReader<CollisionEvent>,
    bodies: Query<(&BodyRole, &GlobalTransform)>,
    mut attempt: ResMut<AttemptState>,
    mut level_complete: EventWriter<LevelCompleteEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for event in events.read() {
        let CollisionEvent::Started(first, second, _) = event else {
            continue;
        };
        if !attempt.level_active {
            continue;
        }
        let (Ok((role_a, transform_a)), Ok((role_b, transform_b))) =
            (bodies.get(*first), bodies.get(*second))
        else {
            continue;
        };
        let verdict = interpret(
            (*role_a, transform_a.translation().y),
            (*role_b, transform_b.translation().y),
        );
        if verdict == Verdict::Win {
            let points = attempt.register_win();
            info!("ball entered basket from above (+{points})");
            level_complete.send(LevelCompleteEvent {
                level: attempt.level,
                score: attempt.score,
            });
            next_state.set(GameState::LevelComplete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_well_above_sensor_wins() {
        let verdict = interpret((BodyRole::Ball, 10.0), (BodyRole::Basket, 0.0));
        assert_eq!(verdict, Verdict::Win, "10 units above is beyond tolerance");
    }

    #[test]
    fn ball_below_sensor_is_ignored() {
        let verdict = interpret((BodyRole::Ball, -10.0), (BodyRole::Basket, 0.0));
        assert_eq!(verdict, Verdict::NoOp, "contact from below must not win");
    }

    #[test]
    fn ball_within_tolerance_is_ignored() {
        let verdict = interpret((BodyRole::Ball, 3.0), (BodyRole::Basket, 0.0));
        assert_eq!(
            verdict,
            Verdict::NoOp,
            "a graze inside the tolerance band must not win"
        );
    }

    #[test]
    fn verdict_ignores_pair_order() {
        let forward = interpret((BodyRole::Ball, 10.0), (BodyRole::Basket, 0.0));
        let swapped = interpret((BodyRole::Basket, 0.0), (BodyRole::Ball, 10.0));
        assert_eq!(forward, swapped, "verdict must not depend on body order");
    }

    #[test]
    fn other_role_pairs_are_ignored() {
        let pairs = [
            ((BodyRole::Ball, 50.0), (BodyRole::Obstacle, 0.0)),
            ((BodyRole::Ball, 50.0), (BodyRole::Plank, 0.0)),
            ((BodyRole::Plank, 50.0), (BodyRole::Basket, 0.0)),
            ((BodyRole::Obstacle, 50.0), (BodyRole::Obstacle, 0.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(
                interpret(a, b),
                Verdict::NoOp,
                "only ball-basket pairs may win ({a:?} vs {b:?})"
            );
        }
    }
}
