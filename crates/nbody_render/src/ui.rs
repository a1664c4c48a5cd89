use bevy::prelude::*;
use nbody_core::{SimConfig, SimulationType};
use nbody_sim::{AutoRestart, SimCommand, SimSettings, Telemetry};

/// Marker for the HUD text
#[derive(Component)]
pub struct HudText;

/// Spawn the HUD overlay
pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("N-Body"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(0.85, 0.9, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

/// Format large numbers in human-readable form
fn fmt_count(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        format!("{}", n)
    }
}

/// HUD frame counter for throttling
#[derive(Resource, Default)]
pub struct HudThrottle {
    pub frame: u32,
}

pub fn hud_text(telemetry: &Telemetry, config: &SimConfig, auto_minutes: f32) -> String {
    let mut lines = vec![
        format!("Particles: {}", fmt_count(telemetry.particle_count)),
        format!("FPS: {:.0}", telemetry.fps),
        format!(
            "{} | Epoch {} | Step {} | {}",
            config.sim_type.name(),
            telemetry.epoch,
            telemetry.steps,
            if telemetry.gpu { "GPU" } else { "CPU" }
        ),
    ];
    if telemetry.auto_mode {
        lines.push(format!("Auto Mode: ON ({:.1} min)", auto_minutes));
    }
    if telemetry.paused {
        lines.push("[PAUSED]".to_string());
    }
    lines.push(String::new());
    lines.push("[R] Restart  [Space] Pause  [A] Auto mode  [[ / ]] Interval".to_string());
    lines.push("[Tab] Type  [K] Random colors  [O] Orbit  [X/Y/Z] Orbit axes  [,/.] Orbit speed".to_string());
    if config.use_random_colors {
        lines.push("[C] New colors".to_string());
    }
    lines.join("\n")
}

/// Update HUD text every 10th frame (string formatting is expensive)
pub fn update_hud(
    telemetry: Res<Telemetry>,
    settings: Res<SimSettings>,
    auto: Res<AutoRestart>,
    mut throttle: ResMut<HudThrottle>,
    mut hud_query: Query<&mut Text, With<HudText>>,
) {
    throttle.frame = throttle.frame.wrapping_add(1);
    if throttle.frame % 10 != 0 {
        return;
    }
    if let Ok(mut text) = hud_query.get_single_mut() {
        **text = hud_text(&telemetry, &settings, auto.interval().as_secs_f32() / 60.0);
    }
}

/// Next type in the picker order
pub fn next_sim_type(current: SimulationType) -> SimulationType {
    let all = SimulationType::ALL;
    let i = all.iter().position(|t| *t == current).unwrap_or(0);
    all[(i + 1) % all.len()]
}

/// Keyboard bindings for the simulation
pub fn sim_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    auto: Res<AutoRestart>,
    mut settings: ResMut<SimSettings>,
    mut commands: EventWriter<SimCommand>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        commands.send(SimCommand::Restart);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        commands.send(SimCommand::TogglePause);
    }
    if keyboard.just_pressed(KeyCode::KeyC) && settings.use_random_colors {
        commands.send(SimCommand::RegenerateColors);
    }
    if keyboard.just_pressed(KeyCode::KeyA) {
        commands.send(SimCommand::ToggleAutoMode);
    }
    if keyboard.just_pressed(KeyCode::KeyK) {
        commands.send(SimCommand::SetUseRandomColors(!settings.use_random_colors));
    }

    let minutes = auto.interval().as_secs_f32() / 60.0;
    if keyboard.just_pressed(KeyCode::BracketRight) {
        commands.send(SimCommand::SetAutoInterval(minutes + 0.5));
    }
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        commands.send(SimCommand::SetAutoInterval(minutes - 0.5));
    }

    if keyboard.just_pressed(KeyCode::Tab) {
        settings.sim_type = next_sim_type(settings.sim_type);
        info!("Simulation type: {}", settings.sim_type.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hud_shows_auto_mode_only_when_on() {
        let config = SimConfig::default();
        let mut telemetry = Telemetry { particle_count: 20_000, fps: 59.6, ..Telemetry::default() };
        let text = hud_text(&telemetry, &config, 3.0);
        assert!(text.contains("Particles: 20.0K"));
        assert!(text.contains("FPS: 60"));
        assert!(!text.contains("Auto Mode: ON"));

        telemetry.auto_mode = true;
        assert!(hud_text(&telemetry, &config, 3.0).contains("Auto Mode: ON (3.0 min)"));
    }

    #[test]
    fn test_new_colors_hint_follows_toggle() {
        let mut config = SimConfig::default();
        let telemetry = Telemetry::default();
        assert!(!hud_text(&telemetry, &config, 3.0).contains("[C] New colors"));
        config.use_random_colors = true;
        assert!(hud_text(&telemetry, &config, 3.0).contains("[C] New colors"));
    }

    #[test]
    fn test_type_cycle_wraps() {
        assert_eq!(next_sim_type(SimulationType::Galaxy), SimulationType::Collision);
        assert_eq!(next_sim_type(SimulationType::Collision), SimulationType::Universe);
        assert_eq!(next_sim_type(SimulationType::Universe), SimulationType::Galaxy);
    }

    #[test]
    fn test_fmt_count() {
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(100_000), "100.0K");
    }
}
