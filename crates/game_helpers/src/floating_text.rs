use core::time::Duration;

use bevy::prelude::*;

/// A short-lived score popup that drifts upwards while shrinking away.
#[derive(Component)]
pub struct FloatingText {
    timer: Timer,
    start: Vec2,
}

pub fn spawn_floating_text(commands: &mut Commands, position: Vec2, text: &str, color: Color) {
    commands.spawn((
        Text2d::new(text),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(color),
        TextLayout::new_with_justify(JustifyText::Center),
        Transform::from_xyz(position.x, position.y, 5.0),
        FloatingText {
            timer: Timer::new(Duration::from_secs(1), TimerMode::Once),
            start: position,
        },
    ));
}

pub fn animate_floating_text(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut FloatingText)>,
) {
    for (entity, mut transform, mut floating) in &mut query {
        floating.timer.tick(time.delta());
        let progress = floating.timer.fraction();

        transform.translation.y = 50.0f32.mul_add(progress, floating.start.y);
        transform.scale = Vec3::splat(1.0 - progress);

        if floating.timer.finished() {
            commands.entity(entity).despawn();
        }
    }
}
