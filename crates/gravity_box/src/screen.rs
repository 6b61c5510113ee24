use bevy::prelude::*;
use game_helpers::floating_text::{animate_floating_text, spawn_floating_text};
use game_helpers::input::PointerInput;

use crate::placement::{Placement, RotateDirection};
use crate::progression::{HighScore, next_level, points_for};
use crate::simulation::{AttemptState, Basket, GameState, LevelCompleteEvent, StartGame};

pub struct ScreenPlugin;

const TITLE_COLOR: Color = Color::WHITE;
const WIN_COLOR: Color = Color::srgb(0.2, 0.8, 0.35);
const FAIL_COLOR: Color = Color::srgb(0.85, 0.2, 0.2);
const POINTS_COLOR: Color = Color::srgb(0.9, 0.75, 0.2);
const PLAY_BUTTON_COLOR: Color = Color::srgb(0.15, 0.65, 0.3);
const ROTATE_BUTTON_COLOR: Color = Color::srgb(0.1, 0.55, 0.8);
const MENU_BUTTON_COLOR: Color = Color::srgb(0.35, 0.38, 0.42);

/// Circle gizmo visual for round bodies (the ball).
#[derive(Component)]
pub struct Circle {
    pub radius: f32,
    pub color: Color,
}

#[derive(Component)]
struct WelcomeScreen;

#[derive(Component)]
struct GameHud;

#[derive(Component)]
enum HudText {
    Level,
    Score,
    Best,
    Balls,
}

/// HUD controls that only exist during the placement phase.
#[derive(Component)]
struct PlacingControls;

#[derive(Component)]
struct PlayButton;

#[derive(Component)]
struct RotateLeftButton;

#[derive(Component)]
struct RotateRightButton;

#[derive(Component)]
struct BallLostScreen;

#[derive(Component)]
struct LevelCompleteScreen;

#[derive(Component)]
struct GameOverScreen;

#[derive(Component)]
struct NextLevelButton;

#[derive(Component)]
struct RestartLevelButton;

#[derive(Component)]
struct RetryButton;

#[derive(Component)]
struct MenuButton;

impl Plugin for ScreenPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            try_spawn_welcome_screen.run_if(in_state(GameState::Welcome)),
        )
        .add_systems(
            Update,
            handle_welcome_input.run_if(in_state(GameState::Welcome)),
        )
        .add_systems(OnExit(GameState::Welcome), despawn_screen::<WelcomeScreen>)
        .add_systems(OnEnter(GameState::Welcome), despawn_screen::<GameHud>)
        .add_systems(
            Update,
            (try_spawn_hud, update_hud).run_if(not(in_state(GameState::Welcome))),
        )
        .add_systems(OnEnter(GameState::Placing), spawn_placing_controls)
        .add_systems(
            OnExit(GameState::Placing),
            despawn_screen::<PlacingControls>,
        )
        .add_systems(
            Update,
            (handle_play_button, drive_rotate_buttons).run_if(in_state(GameState::Placing)),
        )
        .add_systems(
            Update,
            try_spawn_ball_lost.run_if(in_state(GameState::BallLost)),
        )
        .add_systems(OnExit(GameState::BallLost), despawn_screen::<BallLostScreen>)
        .add_systems(
            Update,
            (try_spawn_level_complete, handle_level_complete_buttons)
                .run_if(in_state(GameState::LevelComplete)),
        )
        .add_systems(
            OnExit(GameState::LevelComplete),
            despawn_screen::<LevelCompleteScreen>,
        )
        .add_systems(
            Update,
            (try_spawn_game_over, handle_game_over_buttons).run_if(in_state(GameState::GameOver)),
        )
        .add_systems(
            OnExit(GameState::GameOver),
            despawn_screen::<GameOverScreen>,
        )
        .add_systems(Update, (render_circles, pop_win_points, animate_floating_text));
    }
}

fn despawn_screen<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_label(
    commands: &mut Commands,
    markers: impl Bundle,
    text: &str,
    size: f32,
    color: Color,
    position: Vec2,
) {
    commands.spawn((
        Text2d::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
        TextLayout::new_with_justify(JustifyText::Center),
        Transform::from_xyz(position.x, position.y, 1.0),
        markers,
    ));
}

fn spawn_button(
    commands: &mut Commands,
    markers: impl Bundle,
    label: &str,
    background: Color,
    node: Node,
) {
    commands
        .spawn((Button, node, BackgroundColor(background), markers))
        .with_children(|parent| {
            parent.spawn((
                Text::new(label),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn button_node(left: f32, bottom: f32, width: f32, height: f32) -> Node {
    Node {
        position_type: PositionType::Absolute,
        left: Val::Px(left),
        bottom: Val::Px(bottom),
        width: Val::Px(width),
        height: Val::Px(height),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    }
}

fn pressed(interaction: &Interaction) -> bool {
    *interaction == Interaction::Pressed
}

// --- Welcome ---

fn try_spawn_welcome_screen(mut commands: Commands, query: Query<&WelcomeScreen>) {
    if !query.is_empty() {
        return;
    }
    spawn_label(
        &mut commands,
        WelcomeScreen,
        "Gravity Box",
        40.0,
        TITLE_COLOR,
        Vec2::new(0.0, 160.0),
    );
    spawn_label(
        &mut commands,
        WelcomeScreen,
        "Place planks, tilt them,\nand guide the ball\ninto the basket",
        22.0,
        TITLE_COLOR,
        Vec2::new(0.0, 30.0),
    );
    spawn_label(
        &mut commands,
        WelcomeScreen,
        "Tap to start",
        28.0,
        TITLE_COLOR,
        Vec2::new(0.0, -160.0),
    );
}

fn handle_welcome_input(
    pointer: PointerInput,
    mut attempt: ResMut<AttemptState>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if pointer.just_pressed_world().is_some() {
        *attempt = AttemptState::default();
        next_state.set(GameState::Placing);
    }
}

// --- HUD ---

fn try_spawn_hud(mut commands: Commands, query: Query<&GameHud>) {
    if !query.is_empty() {
        return;
    }
    spawn_label(
        &mut commands,
        (GameHud, HudText::Level),
        "Level 1",
        18.0,
        TITLE_COLOR,
        Vec2::new(-120.0, 300.0),
    );
    spawn_label(
        &mut commands,
        (GameHud, HudText::Score),
        "Score: 0",
        18.0,
        TITLE_COLOR,
        Vec2::new(0.0, 300.0),
    );
    spawn_label(
        &mut commands,
        (GameHud, HudText::Best),
        "Best: 0",
        18.0,
        POINTS_COLOR,
        Vec2::new(120.0, 300.0),
    );
    spawn_label(
        &mut commands,
        (GameHud, HudText::Balls),
        "Balls: 3",
        16.0,
        FAIL_COLOR,
        Vec2::new(0.0, 275.0),
    );
}

fn update_hud(
    attempt: Res<AttemptState>,
    best: Res<HighScore>,
    mut texts: Query<(&mut Text2d, &HudText), With<GameHud>>,
) {
    for (mut text, kind) in &mut texts {
        let updated = match kind {
            HudText::Level => format!("Level {}", attempt.level),
            HudText::Score => format!("Score: {}", attempt.score),
            HudText::Best => format!("Best: {}", best.0),
            HudText::Balls => format!("Balls: {}", attempt.balls_remaining),
        };
        if text.0 != updated {
            text.0 = updated;
        }
    }
}

// --- Placement controls ---

fn spawn_placing_controls(mut commands: Commands) {
    spawn_button(
        &mut commands,
        (PlacingControls, PlayButton),
        "Play",
        PLAY_BUTTON_COLOR,
        button_node(130.0, 12.0, 100.0, 40.0),
    );
    spawn_button(
        &mut commands,
        (PlacingControls, RotateLeftButton),
        "Rotate L",
        ROTATE_BUTTON_COLOR,
        button_node(10.0, 12.0, 100.0, 40.0),
    );
    spawn_button(
        &mut commands,
        (PlacingControls, RotateRightButton),
        "Rotate R",
        ROTATE_BUTTON_COLOR,
        button_node(250.0, 12.0, 100.0, 40.0),
    );
}

fn handle_play_button(
    interactions: Query<&Interaction, (Changed<Interaction>, With<PlayButton>)>,
    mut start: EventWriter<StartGame>,
) {
    if interactions.iter().any(pressed) {
        start.send(StartGame);
    }
}

/// Press-and-hold on the rotate buttons maps straight onto the placement
/// hold flags, same as holding a rotation key.
fn drive_rotate_buttons(
    left: Query<&Interaction, With<RotateLeftButton>>,
    right: Query<&Interaction, With<RotateRightButton>>,
    mut placement: ResMut<Placement>,
) {
    placement.set_hold(RotateDirection::Left, left.iter().any(pressed));
    placement.set_hold(RotateDirection::Right, right.iter().any(pressed));
}

// --- Ball lost ---

fn try_spawn_ball_lost(
    mut commands: Commands,
    attempt: Res<AttemptState>,
    query: Query<&BallLostScreen>,
) {
    if !query.is_empty() {
        return;
    }
    spawn_label(
        &mut commands,
        BallLostScreen,
        "Ball lost",
        36.0,
        FAIL_COLOR,
        Vec2::new(0.0, 120.0),
    );
    spawn_label(
        &mut commands,
        BallLostScreen,
        &format!("{} left", attempt.balls_remaining),
        22.0,
        TITLE_COLOR,
        Vec2::new(0.0, 75.0),
    );
}

// --- Level complete ---

fn try_spawn_level_complete(
    mut commands: Commands,
    attempt: Res<AttemptState>,
    query: Query<&LevelCompleteScreen>,
) {
    if !query.is_empty() {
        return;
    }
    spawn_label(
        &mut commands,
        LevelCompleteScreen,
        "Level complete",
        36.0,
        WIN_COLOR,
        Vec2::new(0.0, 130.0),
    );
    spawn_label(
        &mut commands,
        LevelCompleteScreen,
        &format!("+{} points", points_for(attempt.level)),
        26.0,
        POINTS_COLOR,
        Vec2::new(0.0, 80.0),
    );
    spawn_button(
        &mut commands,
        (LevelCompleteScreen, NextLevelButton),
        "Next level",
        PLAY_BUTTON_COLOR,
        button_node(25.0, 220.0, 140.0, 44.0),
    );
    spawn_button(
        &mut commands,
        (LevelCompleteScreen, RestartLevelButton),
        "Restart level",
        ROTATE_BUTTON_COLOR,
        button_node(195.0, 220.0, 140.0, 44.0),
    );
}

fn handle_level_complete_buttons(
    next: Query<&Interaction, (Changed<Interaction>, With<NextLevelButton>)>,
    restart: Query<&Interaction, (Changed<Interaction>, With<RestartLevelButton>)>,
    mut attempt: ResMut<AttemptState>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if next.iter().any(pressed) {
        match next_level(attempt.level) {
            Some(level) => {
                attempt.level = level;
                next_state.set(GameState::Placing);
            }
            // All levels cleared; back to the menu.
            None => next_state.set(GameState::Welcome),
        }
    } else if restart.iter().any(pressed) {
        attempt.score = 0;
        next_state.set(GameState::Placing);
    }
}

// --- Game over ---

fn try_spawn_game_over(
    mut commands: Commands,
    attempt: Res<AttemptState>,
    query: Query<&GameOverScreen>,
) {
    if !query.is_empty() {
        return;
    }
    spawn_label(
        &mut commands,
        GameOverScreen,
        "Game over",
        36.0,
        FAIL_COLOR,
        Vec2::new(0.0, 130.0),
    );
    spawn_label(
        &mut commands,
        GameOverScreen,
        &format!("Final score: {}", attempt.score),
        24.0,
        TITLE_COLOR,
        Vec2::new(0.0, 80.0),
    );
    spawn_button(
        &mut commands,
        (GameOverScreen, RetryButton),
        "Try again",
        ROTATE_BUTTON_COLOR,
        button_node(25.0, 220.0, 140.0, 44.0),
    );
    spawn_button(
        &mut commands,
        (GameOverScreen, MenuButton),
        "Main menu",
        MENU_BUTTON_COLOR,
        button_node(195.0, 220.0, 140.0, 44.0),
    );
}

fn handle_game_over_buttons(
    retry: Query<&Interaction, (Changed<Interaction>, With<RetryButton>)>,
    menu: Query<&Interaction, (Changed<Interaction>, With<MenuButton>)>,
    mut attempt: ResMut<AttemptState>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if retry.iter().any(pressed) {
        // Same level over from scratch: score resets, ball quota refills on
        // the fresh level entry.
        attempt.score = 0;
        next_state.set(GameState::Placing);
    } else if menu.iter().any(pressed) {
        next_state.set(GameState::Welcome);
    }
}

// --- World-space effects ---

fn render_circles(query: Query<(&Transform, &Circle)>, mut gizmos: Gizmos) {
    for (transform, circle) in &query {
        gizmos.circle_2d(
            transform.translation.truncate(),
            circle.radius,
            circle.color,
        );
    }
}

fn pop_win_points(
    mut commands: Commands,
    mut events: EventReader<LevelCompleteEvent>,
    baskets: Query<&Transform, With<Basket>>,
) {
    for event in events.read() {
        let position = baskets
            .get_single()
            .map_or(Vec2::ZERO, |transform| transform.translation.truncate());
        spawn_floating_text(
            &mut commands,
            position + Vec2::new(0.0, 30.0),
            &format!("+{}", points_for(event.level)),
            WIN_COLOR,
        );
    }
}
