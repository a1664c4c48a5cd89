use bevy::input::mouse::AccumulatedMouseScroll;
use bevy::prelude::*;

/// Camera that looks at the origin from `distance` and can slowly orbit it
#[derive(Component)]
pub struct OrbitCamera {
    pub distance: f32,
    pub orbiting: bool,
    /// Radians per second, 0.01 - 0.25
    pub speed: f32,
    /// Which axes the orbit turns about (x, y, z)
    pub axes: [bool; 3],
}

impl OrbitCamera {
    pub const SPEED_RANGE: (f32, f32) = (0.01, 0.25);

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(Self::SPEED_RANGE.0, Self::SPEED_RANGE.1);
    }

    /// Rotation applied over `dt` seconds, or None when nothing should move
    pub fn orbit_step(&self, dt: f32) -> Option<Quat> {
        if !self.orbiting || !self.axes.contains(&true) {
            return None;
        }
        let angle = self.speed * dt;
        let [x, y, z] = self.axes.map(|on| if on { angle } else { 0.0 });
        Some(Quat::from_euler(EulerRot::XYZ, x, y, z))
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            distance: 400.0,
            orbiting: false,
            speed: 0.05,
            axes: [false, true, false],
        }
    }
}

/// Spawn the 3D camera looking down at the disk from above and to the side
pub fn spawn_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    let pos = Vec3::new(0.0, 0.6, 1.0).normalize() * orbit.distance;

    info!("Camera spawned at ({:.0}, {:.0}, {:.0})", pos.x, pos.y, pos.z);

    commands.spawn((
        Camera3d::default(),
        IsDefaultUiCamera,
        Transform::from_translation(pos).looking_at(Vec3::ZERO, Vec3::Y),
        orbit,
    ));
}

/// Orbit the origin when enabled; scroll changes the distance
pub fn orbit_camera_system(
    time: Res<Time>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut Transform, &mut OrbitCamera)>,
) {
    let Ok((mut transform, mut cam)) = query.get_single_mut() else {
        return;
    };

    let scroll = mouse_scroll.delta.y;
    if scroll != 0.0 {
        cam.distance = (cam.distance * (1.0 - scroll * 0.1)).clamp(5.0, 50_000.0);
    }

    let mut offset = transform.translation;
    if let Some(rotation) = cam.orbit_step(time.delta_secs()) {
        offset = rotation * offset;
    }
    let offset = offset.try_normalize().unwrap_or(Vec3::Z) * cam.distance;

    // Keep "up" sensible when the orbit passes over a pole
    let up = if offset.normalize().dot(Vec3::Y).abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    *transform = Transform::from_translation(offset).looking_at(Vec3::ZERO, up);
}

/// [O] toggle orbit, [X]/[Y]/[Z] toggle axes, [,]/[.] orbit speed
pub fn orbit_controls(keyboard: Res<ButtonInput<KeyCode>>, mut query: Query<&mut OrbitCamera>) {
    let Ok(mut cam) = query.get_single_mut() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::KeyO) {
        cam.orbiting = !cam.orbiting;
        info!("Camera orbit {}", if cam.orbiting { "on" } else { "off" });
    }
    for (i, key) in [KeyCode::KeyX, KeyCode::KeyY, KeyCode::KeyZ].into_iter().enumerate() {
        if keyboard.just_pressed(key) {
            cam.axes[i] = !cam.axes[i];
        }
    }
    if keyboard.just_pressed(KeyCode::Period) {
        let speed = cam.speed + 0.01;
        cam.set_speed(speed);
    }
    if keyboard.just_pressed(KeyCode::Comma) {
        let speed = cam.speed - 0.01;
        cam.set_speed(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_off_or_no_axes_does_nothing() {
        let mut cam = OrbitCamera::default();
        assert!(cam.orbit_step(1.0).is_none());
        cam.orbiting = true;
        cam.axes = [false; 3];
        assert!(cam.orbit_step(1.0).is_none());
    }

    #[test]
    fn test_orbit_about_y_keeps_height() {
        let cam = OrbitCamera { orbiting: true, speed: 0.25, ..OrbitCamera::default() };
        let rotation = cam.orbit_step(1.0).unwrap();
        let moved = rotation * Vec3::new(100.0, 30.0, 0.0);
        assert!((moved.y - 30.0).abs() < 1e-3);
        assert!((moved.length() - Vec3::new(100.0, 30.0, 0.0).length()).abs() < 1e-3);
    }

    #[test]
    fn test_speed_clamped() {
        let mut cam = OrbitCamera::default();
        cam.set_speed(5.0);
        assert_eq!(cam.speed, 0.25);
        cam.set_speed(0.0);
        assert_eq!(cam.speed, 0.01);
    }
}
