use core::time::Duration;

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::levels::LevelCatalog;
use crate::placement::Plank;
use crate::progression;
use crate::screen::Circle;

pub struct SimulationPlugin;

// Gameplay tuning. The win tolerance and stillness numbers are deliberate
// configuration, not derived quantities.
pub const BALL_RADIUS: f32 = 10.0;
pub const BALL_RESTITUTION: f32 = 0.9;
pub const BALL_FRICTION: f32 = 0.005;
pub const PLANK_RESTITUTION: f32 = 0.6;
pub const PLANK_FRICTION: f32 = 0.2;
pub const BASKET_SIZE: Vec2 = Vec2::new(60.0, 14.0);
/// The sensor is deliberately much smaller than the basket sprite so a
/// visually-near miss does not count as a catch.
pub const SENSOR_SIZE: Vec2 = Vec2::new(14.0, 8.0);
pub const SENSOR_DROP: f32 = 3.0;
pub const SPAWN_HEIGHT: f32 = 280.0;
pub const SPAWN_JITTER: f32 = 20.0;
/// Below this the ball has left the play area for good.
pub const FLOOR_BOUND: f32 = -340.0;
pub const STILLNESS_TIMEOUT: Duration = Duration::from_millis(3000);
pub const STILLNESS_THRESHOLD: f32 = 1.0;
pub const RETRY_DELAY: Duration = Duration::from_millis(500);
/// Extra gravity per level beyond the first.
pub const GRAVITY_STEP: f32 = 0.2;

const BALL_COLOR: Color = Color::srgb(0.95, 0.55, 0.1);
const BASKET_COLOR: Color = Color::srgb(0.55, 0.35, 0.15);
const OBSTACLE_COLOR: Color = Color::srgb(0.45, 0.45, 0.5);

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
pub enum GameState {
    #[default]
    Welcome,
    Placing,
    Simulating,
    BallLost,
    LevelComplete,
    GameOver,
}

/// Everything spawned for the current level; torn down in one sweep.
#[derive(Component)]
pub struct LevelEntity;

#[derive(Component)]
pub struct Ball;

#[derive(Component)]
pub struct Basket;

#[derive(Component)]
pub struct BasketSensor;

#[derive(Component)]
pub struct Obstacle;

/// Fired by the HUD's play button once the player is done placing planks.
#[derive(Event)]
pub struct StartGame;

#[derive(Event)]
pub struct LevelCompleteEvent {
    pub level: u32,
    pub score: u32,
}

#[derive(Event)]
pub struct LevelFailedEvent {
    pub level: u32,
    pub score: u32,
}

#[derive(Event)]
pub struct BallLostEvent {
    pub balls_remaining: u32,
    pub score: u32,
}

/// How a failed attempt resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOutcome {
    /// Balls remain: same level, same obstacles, planks cleared.
    Retry,
    /// No balls left.
    GameOver,
}

#[derive(Resource, Debug)]
pub struct AttemptState {
    pub level: u32,
    pub score: u32,
    pub balls_remaining: u32,
    pub level_active: bool,
    pub simulation_started: bool,
}

impl Default for AttemptState {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            balls_remaining: 0,
            level_active: false,
            simulation_started: false,
        }
    }
}

impl AttemptState {
    pub fn begin_attempt(&mut self) {
        self.simulation_started = true;
        self.level_active = true;
    }

    /// Resolves a failed attempt: burns one ball and reports whether the
    /// level continues or the game is over.
    pub fn register_fail(&mut self) -> FailOutcome {
        self.level_active = false;
        self.simulation_started = false;
        self.balls_remaining = self.balls_remaining.saturating_sub(1);
        if self.balls_remaining == 0 {
            FailOutcome::GameOver
        } else {
            FailOutcome::Retry
        }
    }

    /// Resolves a won attempt and returns the points awarded.
    pub fn register_win(&mut self) -> u32 {
        self.level_active = false;
        self.simulation_started = false;
        let points = progression::points_for(self.level);
        self.score += points;
        points
    }
}

/// Watches the ball for the stillness fail condition: any displacement above
/// the threshold re-arms the window from zero, and the elapse is reported
/// exactly once.
#[derive(Component, Debug)]
pub struct MotionTracker {
    last_position: Vec2,
    still_for: Timer,
}

impl MotionTracker {
    pub fn new(start: Vec2) -> Self {
        Self {
            last_position: start,
            still_for: Timer::new(STILLNESS_TIMEOUT, TimerMode::Once),
        }
    }

    pub fn observe(&mut self, position: Vec2, delta: Duration) -> bool {
        if position.distance(self.last_position) > STILLNESS_THRESHOLD {
            self.still_for.reset();
        }
        self.last_position = position;
        self.still_for.tick(delta).just_finished()
    }
}

#[derive(Resource)]
struct RetryDelay(Timer);

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(100.0))
            .init_resource::<AttemptState>()
            .add_event::<StartGame>()
            .add_event::<LevelCompleteEvent>()
            .add_event::<LevelFailedEvent>()
            .add_event::<BallLostEvent>()
            .add_systems(OnEnter(GameState::Placing), setup_level)
            .add_systems(Update, launch_ball.run_if(in_state(GameState::Placing)))
            .add_systems(
                Update,
                (watch_ball_motion, watch_out_of_bounds)
                    .chain()
                    .run_if(in_state(GameState::Simulating)),
            )
            .add_systems(OnEnter(GameState::BallLost), arm_retry_delay)
            .add_systems(
                Update,
                finish_retry_delay.run_if(in_state(GameState::BallLost)),
            )
            .add_systems(OnEnter(GameState::LevelComplete), despawn_ball)
            .add_systems(OnEnter(GameState::GameOver), despawn_ball)
            .add_systems(OnExit(GameState::LevelComplete), teardown_level)
            .add_systems(OnExit(GameState::GameOver), teardown_level);
    }
}

/// Brings up the level geometry on a fresh entry. On a same-level retry the
/// basket and obstacles are still alive and everything is left untouched;
/// `balls_remaining` keeps its decremented value.
fn setup_level(
    mut commands: Commands,
    mut attempt: ResMut<AttemptState>,
    baskets: Query<Entity, With<Basket>>,
) {
    if !baskets.is_empty() {
        return;
    }

    let config = LevelCatalog::get(attempt.level);
    attempt.balls_remaining = config.ball_quota;
    attempt.level_active = false;
    attempt.simulation_started = false;
    info!(
        "entering level {} ({} planks, {} balls)",
        attempt.level, config.plank_quota, config.ball_quota
    );

    commands.spawn((
        Sprite {
            color: BASKET_COLOR,
            custom_size: Some(BASKET_SIZE),
            ..default()
        },
        Transform::from_xyz(config.basket.x, config.basket.y, 0.0),
        Basket,
        LevelEntity,
    ));

    // Non-solid catch region: overlap detection only, no deflection.
    commands.spawn((
        Transform::from_xyz(config.basket.x, config.basket.y - SENSOR_DROP, 0.0),
        Collider::cuboid(SENSOR_SIZE.x / 2.0, SENSOR_SIZE.y / 2.0),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        crate::collision::BodyRole::Basket,
        BasketSensor,
        LevelEntity,
    ));

    for spec in config.obstacles {
        commands.spawn((
            Sprite {
                color: OBSTACLE_COLOR,
                custom_size: Some(spec.size),
                ..default()
            },
            Transform::from_xyz(spec.position.x, spec.position.y, 0.0)
                .with_rotation(Quat::from_rotation_z(spec.angle_degrees.to_radians())),
            RigidBody::Fixed,
            Collider::cuboid(spec.size.x / 2.0, spec.size.y / 2.0),
            Friction::coefficient(PLANK_FRICTION),
            Restitution::coefficient(PLANK_RESTITUTION),
            crate::collision::BodyRole::Obstacle,
            Obstacle,
            LevelEntity,
        ));
    }
}

/// Start transition: drops the ball and hands the level over to the physics
/// world. Placement systems stop running the moment the state flips, which is
/// what freezes the planks.
fn launch_ball(
    mut commands: Commands,
    mut events: EventReader<StartGame>,
    mut attempt: ResMut<AttemptState>,
    balls: Query<Entity, With<Ball>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    // At most one live ball, ever.
    for entity in &balls {
        commands.entity(entity).despawn_recursive();
    }

    let spawn_x = fastrand::f32().mul_add(2.0 * SPAWN_JITTER, -SPAWN_JITTER);
    let gravity = (attempt.level.saturating_sub(1) as f32).mul_add(GRAVITY_STEP, 1.0);
    commands.spawn((
        Transform::from_xyz(spawn_x, SPAWN_HEIGHT, 0.0),
        RigidBody::Dynamic,
        Collider::ball(BALL_RADIUS),
        Restitution::coefficient(BALL_RESTITUTION),
        Friction::coefficient(BALL_FRICTION),
        GravityScale(gravity),
        Velocity::zero(),
        ActiveEvents::COLLISION_EVENTS,
        Ball,
        crate::collision::BodyRole::Ball,
        Circle {
            radius: BALL_RADIUS,
            color: BALL_COLOR,
        },
        MotionTracker::new(Vec2::new(spawn_x, SPAWN_HEIGHT)),
        LevelEntity,
    ));

    attempt.begin_attempt();
    info!("simulation started (gravity scale {gravity})");
    next_state.set(GameState::Simulating);
}

/// Shared fail path for the stillness and out-of-bounds detectors.
fn fail_attempt(
    attempt: &mut AttemptState,
    ball_lost: &mut EventWriter<BallLostEvent>,
    level_failed: &mut EventWriter<LevelFailedEvent>,
    next_state: &mut NextState<GameState>,
) {
    match attempt.register_fail() {
        FailOutcome::Retry => {
            info!("ball lost, {} remaining", attempt.balls_remaining);
            ball_lost.send(BallLostEvent {
                balls_remaining: attempt.balls_remaining,
                score: attempt.score,
            });
            next_state.set(GameState::BallLost);
        }
        FailOutcome::GameOver => {
            info!("no balls remaining, game over");
            level_failed.send(LevelFailedEvent {
                level: attempt.level,
                score: attempt.score,
            });
            next_state.set(GameState::GameOver);
        }
    }
}

fn watch_ball_motion(
    time: Res<Time>,
    mut balls: Query<(&Transform, &mut MotionTracker), With<Ball>>,
    mut attempt: ResMut<AttemptState>,
    mut ball_lost: EventWriter<BallLostEvent>,
    mut level_failed: EventWriter<LevelFailedEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !attempt.level_active {
        return;
    }
    let Ok((transform, mut tracker)) = balls.get_single_mut() else {
        return;
    };
    if tracker.observe(transform.translation.truncate(), time.delta()) {
        info!("ball came to rest outside the basket");
        fail_attempt(
            &mut attempt,
            &mut ball_lost,
            &mut level_failed,
            &mut next_state,
        );
    }
}

fn watch_out_of_bounds(
    balls: Query<&Transform, With<Ball>>,
    mut attempt: ResMut<AttemptState>,
    mut ball_lost: EventWriter<BallLostEvent>,
    mut level_failed: EventWriter<LevelFailedEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !attempt.level_active {
        return;
    }
    let Ok(transform) = balls.get_single() else {
        return;
    };
    if transform.translation.y < FLOOR_BOUND {
        info!("ball fell out of the play area");
        fail_attempt(
            &mut attempt,
            &mut ball_lost,
            &mut level_failed,
            &mut next_state,
        );
    }
}

fn arm_retry_delay(mut commands: Commands) {
    commands.insert_resource(RetryDelay(Timer::new(RETRY_DELAY, TimerMode::Once)));
}

/// After the short ball-lost pause, clears the attempt's planks and ball and
/// re-enters placement. Basket and obstacles survive so the next try can
/// begin immediately.
fn finish_retry_delay(
    time: Res<Time>,
    mut commands: Commands,
    delay: Option<ResMut<RetryDelay>>,
    mut attempt: ResMut<AttemptState>,
    cleanup: Query<Entity, Or<(With<Ball>, With<Plank>)>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Some(mut delay) = delay else {
        return;
    };
    if !delay.0.tick(time.delta()).just_finished() {
        return;
    }
    for entity in &cleanup {
        commands.entity(entity).despawn_recursive();
    }
    attempt.simulation_started = false;
    attempt.level_active = false;
    commands.remove_resource::<RetryDelay>();
    next_state.set(GameState::Placing);
}

fn despawn_ball(mut commands: Commands, balls: Query<Entity, With<Ball>>) {
    for entity in &balls {
        commands.entity(entity).despawn_recursive();
    }
}

/// Removes every entity owned by the current level. Safe to run on any exit
/// path, any number of times.
pub fn teardown_level(mut commands: Commands, entities: Query<Entity, With<LevelEntity>>) {
    for entity in &entities {
        commands.entity(entity).despawn_recursive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_attempt_flags_flip_on_begin_and_resolve() {
        let mut attempt = AttemptState {
            balls_remaining: 3,
            ..default()
        };
        attempt.begin_attempt();
        assert!(attempt.level_active, "attempt should be active");
        assert!(attempt.simulation_started, "simulation should be running");

        attempt.register_win();
        assert!(!attempt.level_active, "win should deactivate the level");
        assert!(
            !attempt.simulation_started,
            "win should resolve the attempt"
        );
    }

    #[test]
    fn fail_with_balls_left_requests_retry() {
        let mut attempt = AttemptState {
            balls_remaining: 3,
            ..default()
        };
        attempt.begin_attempt();
        assert_eq!(
            attempt.register_fail(),
            FailOutcome::Retry,
            "two balls should remain"
        );
        assert_eq!(attempt.balls_remaining, 2, "one ball should be burned");
    }

    #[test]
    fn fail_on_last_ball_is_game_over() {
        let mut attempt = AttemptState {
            balls_remaining: 1,
            ..default()
        };
        attempt.begin_attempt();
        assert_eq!(
            attempt.register_fail(),
            FailOutcome::GameOver,
            "last ball should end the level"
        );
        assert_eq!(attempt.balls_remaining, 0, "no balls should remain");
    }

    #[test]
    fn register_fail_never_underflows_balls() {
        let mut attempt = AttemptState::default();
        assert_eq!(
            attempt.register_fail(),
            FailOutcome::GameOver,
            "zero balls is terminal"
        );
        assert_eq!(attempt.balls_remaining, 0, "count must stay at zero");
    }

    #[test]
    fn win_awards_level_scaled_points() {
        let mut attempt = AttemptState {
            level: 3,
            score: 300,
            balls_remaining: 2,
            ..default()
        };
        let points = attempt.register_win();
        assert_eq!(points, 300, "level 3 pays 300 points");
        assert_eq!(attempt.score, 600, "points should accumulate");
    }

    #[test]
    fn teardown_sweeps_the_level_and_tolerates_reruns() {
        use bevy::ecs::system::RunSystemOnce;

        fn live_level_entities(world: &mut World) -> usize {
            world
                .query_filtered::<Entity, With<LevelEntity>>()
                .iter(world)
                .count()
        }

        let mut world = World::new();
        world.spawn((Basket, LevelEntity));
        world.spawn((BasketSensor, LevelEntity));
        world.spawn((Obstacle, LevelEntity));
        world.spawn((Ball, LevelEntity));

        world
            .run_system_once(teardown_level)
            .expect("teardown should run");
        assert_eq!(
            live_level_entities(&mut world),
            0,
            "every level entity should be swept"
        );

        // A second sweep over the already-empty level must be a no-op.
        world
            .run_system_once(teardown_level)
            .expect("teardown should rerun on an empty level");
        assert_eq!(
            live_level_entities(&mut world),
            0,
            "rerunning teardown should leave the world empty"
        );
    }

    #[test]
    fn stillness_fires_after_full_quiet_window() {
        let mut tracker = MotionTracker::new(Vec2::ZERO);
        let tick = Duration::from_millis(100);
        let mut fired = 0;
        for _ in 0..40 {
            // Sub-threshold jiggle must not re-arm the window.
            if tracker.observe(Vec2::new(0.5, 0.0), tick) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1, "stillness timeout should fire exactly once");
    }

    #[test]
    fn movement_rearms_the_stillness_window() {
        let mut tracker = MotionTracker::new(Vec2::ZERO);
        let tick = Duration::from_millis(100);
        for step in 0..29 {
            // Keep moving well past the threshold every tick.
            let position = Vec2::new(step as f32 * 5.0, 0.0);
            assert!(
                !tracker.observe(position, tick),
                "a moving ball must never trip the stillness timeout"
            );
        }
        // Now hold still; one tick of the window has already elapsed since
        // the last movement, so 28 more keep it just short of the timeout.
        let resting = Vec2::new(28.0 * 5.0, 0.0);
        for _ in 0..28 {
            assert!(
                !tracker.observe(resting, tick),
                "timeout should not fire before the full window elapses"
            );
        }
        assert!(
            tracker.observe(resting, tick),
            "timeout should fire once the full window elapses"
        );
    }
}
