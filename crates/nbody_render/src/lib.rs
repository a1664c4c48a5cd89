pub mod camera;
pub mod particles;
pub mod plugin;
pub mod ui;

pub use plugin::NBodyRenderPlugin;
