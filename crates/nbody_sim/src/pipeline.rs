use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::render::renderer::{RenderDevice, RenderQueue};
use nbody_core::SimConfig;
use nbody_gpu::GpuStepper;

use crate::auto_restart::AutoRestart;
use crate::clock::StepClock;
use crate::engine::Simulation;

/// User-editable configuration. The UI writes here; the engine picks the change up
/// between steps.
#[derive(Resource, Debug, Clone, Default, Deref, DerefMut)]
pub struct SimSettings(pub SimConfig);

/// Requests from the keyboard or UI
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    Restart,
    TogglePause,
    RegenerateColors,
    ToggleAutoMode,
    SetAutoInterval(f32),
    SetUseRandomColors(bool),
}

/// Values shown in the HUD
#[derive(Resource, Debug, Clone, Default)]
pub struct Telemetry {
    pub fps: f64,
    pub particle_count: usize,
    pub auto_mode: bool,
    pub paused: bool,
    pub epoch: u32,
    pub steps: u64,
    pub gpu: bool,
}

/// Where steps run. Starts on the GPU when a render device is present and drops
/// to the CPU for the rest of the run on the first failure.
#[derive(Resource, Default)]
pub enum ComputeBackend {
    #[default]
    Cpu,
    Gpu(GpuStepper),
}

impl ComputeBackend {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Gpu(_))
    }
}

#[derive(Resource, Default, Deref, DerefMut)]
pub struct SimClock(pub StepClock);

/// Set `use_gpu` to false to keep every step on the CPU
pub struct SimulationPlugin {
    pub use_gpu: bool,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self { use_gpu: true }
    }
}

#[derive(Resource, Clone, Copy)]
struct GpuRequested(bool);

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
            app.add_plugins(FrameTimeDiagnosticsPlugin);
        }

        let settings = app
            .world_mut()
            .get_resource_or_insert_with(SimSettings::default)
            .clone();
        let auto = AutoRestart::new(settings.auto_restart_minutes);

        app.insert_resource(Simulation::new(&settings))
            .insert_resource(auto)
            .insert_resource(GpuRequested(self.use_gpu))
            .init_resource::<ComputeBackend>()
            .init_resource::<SimClock>()
            .init_resource::<Telemetry>()
            .add_event::<SimCommand>()
            .add_systems(Startup, select_backend)
            .add_systems(
                Update,
                (
                    handle_commands,
                    sync_settings,
                    auto_restart_tick,
                    simulation_tick,
                    update_telemetry,
                )
                    .chain(),
            );
    }
}

fn select_backend(
    requested: Res<GpuRequested>,
    device: Option<Res<RenderDevice>>,
    mut backend: ResMut<ComputeBackend>,
    sim: Res<Simulation>,
) {
    if !requested.0 {
        info!("Compute backend: CPU ({} particles)", sim.particle_count());
        return;
    }
    match device {
        Some(device) => {
            *backend = ComputeBackend::Gpu(GpuStepper::new(&device, nbody_core::MAX_PARTICLES as usize));
            info!("Compute backend: GPU ({} particles)", sim.particle_count());
        }
        None => warn!("No render device, stepping on the CPU"),
    }
}

fn handle_commands(
    mut commands: EventReader<SimCommand>,
    mut sim: ResMut<Simulation>,
    mut auto: ResMut<AutoRestart>,
    mut settings: ResMut<SimSettings>,
) {
    for command in commands.read() {
        match *command {
            SimCommand::Restart => sim.restart(),
            SimCommand::TogglePause => {
                let paused = sim.toggle_pause();
                info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            SimCommand::RegenerateColors => {
                // Only meaningful with a random palette
                if sim.config().use_random_colors {
                    sim.regenerate_colors();
                }
            }
            SimCommand::ToggleAutoMode => {
                if auto.toggle() {
                    info!("Auto mode on, restarting every {:?}", auto.interval());
                    sim.restart();
                } else {
                    info!("Auto mode off");
                }
            }
            SimCommand::SetAutoInterval(minutes) => {
                auto.set_interval_minutes(minutes);
                settings.set_auto_restart_minutes(minutes);
            }
            SimCommand::SetUseRandomColors(enabled) => settings.use_random_colors = enabled,
        }
    }
}

fn sync_settings(settings: Res<SimSettings>, mut sim: ResMut<Simulation>, mut auto: ResMut<AutoRestart>) {
    if settings.is_changed() && !settings.is_added() {
        sim.apply_config(&settings);
        auto.set_interval_minutes(settings.auto_restart_minutes);
    }
}

fn auto_restart_tick(time: Res<Time<Real>>, mut auto: ResMut<AutoRestart>, mut sim: ResMut<Simulation>) {
    if auto.tick(time.delta()) {
        info!("Auto mode: restarting");
        sim.restart();
    }
}

fn simulation_tick(
    time: Res<Time<Real>>,
    mut clock: ResMut<SimClock>,
    mut sim: ResMut<Simulation>,
    mut backend: ResMut<ComputeBackend>,
    device: Option<Res<RenderDevice>>,
    queue: Option<Res<RenderQueue>>,
) {
    let steps = clock.advance(time.delta_secs_f64());
    if sim.is_paused() {
        return;
    }

    for _ in 0..steps {
        let gpu_result = match (&mut *backend, device.as_deref(), queue.as_deref()) {
            (ComputeBackend::Gpu(gpu), Some(device), Some(queue)) => Some(sim.tick_gpu(gpu, device, queue)),
            _ => None,
        };

        match gpu_result {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                warn!("GPU step failed, falling back to CPU: {}", err);
                *backend = ComputeBackend::Cpu;
                sim.tick();
            }
            None => sim.tick(),
        }
    }
}

fn update_telemetry(
    diagnostics: Res<DiagnosticsStore>,
    sim: Res<Simulation>,
    auto: Res<AutoRestart>,
    backend: Res<ComputeBackend>,
    mut telemetry: ResMut<Telemetry>,
) {
    if let Some(fps) = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
    {
        telemetry.fps = fps;
    }
    telemetry.particle_count = sim.particle_count();
    telemetry.auto_mode = auto.is_enabled();
    telemetry.paused = sim.is_paused();
    telemetry.epoch = sim.epoch();
    telemetry.steps = sim.step_count();
    telemetry.gpu = backend.is_gpu();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(SimSettings(SimConfig { particle_count: 1_000, ..SimConfig::default() }))
            .add_plugins(SimulationPlugin { use_gpu: false });
        app.update();
        app
    }

    fn send(app: &mut App, command: SimCommand) {
        app.world_mut().send_event(command);
        app.update();
    }

    #[test]
    fn test_plugin_starts_simulation() {
        let app = test_app();
        let sim = app.world().resource::<Simulation>();
        assert_eq!(sim.particle_count(), 1_000);
        assert_eq!(sim.epoch(), 1);
        assert!(!app.world().resource::<ComputeBackend>().is_gpu());
    }

    #[test]
    fn test_restart_command() {
        let mut app = test_app();
        send(&mut app, SimCommand::Restart);
        assert_eq!(app.world().resource::<Simulation>().epoch(), 2);
    }

    #[test]
    fn test_pause_command() {
        let mut app = test_app();
        send(&mut app, SimCommand::TogglePause);
        assert!(app.world().resource::<Simulation>().is_paused());
        assert!(app.world().resource::<Telemetry>().paused);
    }

    #[test]
    fn test_auto_mode_restarts_on_enable_and_expiry() {
        let mut app = test_app();
        send(&mut app, SimCommand::SetAutoInterval(1.0));
        send(&mut app, SimCommand::ToggleAutoMode);
        assert_eq!(app.world().resource::<Simulation>().epoch(), 2);
        assert!(app.world().resource::<Telemetry>().auto_mode);

        // Run the timer down to its last nanosecond; the next real frame expires it
        let fired = app
            .world_mut()
            .resource_mut::<AutoRestart>()
            .tick(Duration::from_secs(60) - Duration::from_nanos(1));
        assert!(!fired);
        app.update();
        assert_eq!(app.world().resource::<Simulation>().epoch(), 3);

        send(&mut app, SimCommand::ToggleAutoMode);
        assert!(!app.world().resource::<AutoRestart>().is_enabled());
        app.update();
        assert_eq!(app.world().resource::<Simulation>().epoch(), 3);
    }

    #[test]
    fn test_colors_only_regenerate_with_random_palette() {
        let mut app = test_app();
        let before = app.world().resource::<Simulation>().palette().clone();
        send(&mut app, SimCommand::RegenerateColors);
        assert_eq!(app.world().resource::<Simulation>().palette(), &before);

        send(&mut app, SimCommand::SetUseRandomColors(true));
        let random = app.world().resource::<Simulation>().palette().clone();
        assert_ne!(random, before);
        send(&mut app, SimCommand::RegenerateColors);
        assert_ne!(app.world().resource::<Simulation>().palette(), &random);
        assert_eq!(app.world().resource::<Simulation>().epoch(), 1);
    }

    #[test]
    fn test_settings_change_regenerates() {
        let mut app = test_app();
        app.world_mut().resource_mut::<SimSettings>().particle_count = 2_000;
        app.update();
        let sim = app.world().resource::<Simulation>();
        assert_eq!(sim.particle_count(), 2_000);
        assert_eq!(sim.epoch(), 2);
    }

    #[test]
    fn test_interval_edit_on_settings_reaches_timer() {
        let mut app = test_app();
        send(&mut app, SimCommand::ToggleAutoMode);

        app.world_mut().resource_mut::<SimSettings>().auto_restart_minutes = 2.0;
        app.update();
        let auto = app.world().resource::<AutoRestart>();
        assert_eq!(auto.interval(), Duration::from_secs(120));
        assert!(auto.remaining().is_some_and(|left| left <= Duration::from_secs(120)));
        assert_eq!(app.world().resource::<Simulation>().epoch(), 2);

        app.world_mut().resource_mut::<SimSettings>().auto_restart_minutes = 60.0;
        app.update();
        assert_eq!(app.world().resource::<AutoRestart>().interval(), Duration::from_secs(600));
    }
}
