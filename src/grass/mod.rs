//! Procedural grass: a square field split into tiles, each filled with a
//! jittered grid of blades and drawn at one of two detail levels.

pub mod config;
pub mod core;
pub mod error;
pub mod field;
pub mod instancing;
pub mod loading;
pub mod lod;
pub mod noise;
pub mod placement;
pub mod plugin;
pub mod render;
pub mod systems;

pub use config::GrassSettings;
pub use error::{ConfigError, FieldBuildError, MeshLoadError, SettingsLoadError};
pub use field::{build_field, FieldLayout, GrassField};
pub use plugin::{CameraViewChanged, GrassPlugin, GrassViewer};
