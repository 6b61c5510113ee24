use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Unified mouse and touch pointer lookup.
///
/// Wraps the input resources a pointer-driven system needs so call sites ask
/// one parameter for "where did the player press" instead of threading four
/// queries around.
#[derive(SystemParam)]
pub struct PointerInput<'w, 's> {
    mouse: Res<'w, ButtonInput<MouseButton>>,
    touches: Res<'w, Touches>,
    windows: Query<'w, 's, &'static Window>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform)>,
}

impl PointerInput<'_, '_> {
    /// Screen position of a press that started this frame.
    pub fn just_pressed_screen(&self) -> Option<Vec2> {
        if self.mouse.just_pressed(MouseButton::Left) {
            self.windows.get_single().ok()?.cursor_position()
        } else {
            self.touches
                .iter_just_pressed()
                .next()
                .map(bevy::input::touch::Touch::position)
        }
    }

    /// Screen position of a press that is currently held.
    pub fn pressed_screen(&self) -> Option<Vec2> {
        if self.mouse.pressed(MouseButton::Left) {
            self.windows.get_single().ok()?.cursor_position()
        } else {
            self.touches
                .iter()
                .next()
                .map(bevy::input::touch::Touch::position)
        }
    }

    /// World position of a press that started this frame.
    pub fn just_pressed_world(&self) -> Option<Vec2> {
        self.to_world(self.just_pressed_screen()?)
    }

    /// World position of a press that is currently held.
    pub fn pressed_world(&self) -> Option<Vec2> {
        self.to_world(self.pressed_screen()?)
    }

    fn to_world(&self, screen: Vec2) -> Option<Vec2> {
        let (camera, camera_transform) = self.cameras.get_single().ok()?;
        camera
            .viewport_to_world(camera_transform, screen)
            .map(|ray| ray.origin.truncate())
            .ok()
    }
}
