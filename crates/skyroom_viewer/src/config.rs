use std::path::PathBuf;

use serde::Deserialize;
use skyroom_app::{AppConfig, Camera, Vec3};
use skyroom_renderer::RoomTexturePaths;

/// Contents of `skyroom.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub app: AppConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Width, height and depth of the room.
    pub room: [f32; 3],
    pub cut_window: bool,
    pub textures: TextureConfig,
    /// Equirectangular environment image.
    pub hdr: PathBuf,
    pub cubemap_size: u32,
    /// Load WGSL from here and hot-reload it; embedded shaders when unset.
    pub shader_dir: Option<PathBuf>,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            room: [10.0, 3.0, 10.0],
            cut_window: true,
            textures: TextureConfig::default(),
            hdr: PathBuf::from("assets/hdr/sky.hdr"),
            cubemap_size: 512,
            shader_dir: None,
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn room_size(&self) -> Vec3 {
        Vec3::from_array(self.room)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub floor: Option<PathBuf>,
    pub wall: Option<PathBuf>,
    pub ceiling: Option<PathBuf>,
    pub glass: Option<PathBuf>,
    pub painting1: Option<PathBuf>,
    pub painting2: Option<PathBuf>,
}

impl From<&TextureConfig> for RoomTexturePaths {
    fn from(config: &TextureConfig) -> Self {
        Self {
            floor: config.floor.clone(),
            wall: config.wall.clone(),
            ceiling: config.ceiling.clone(),
            glass: config.glass.clone(),
            painting1: config.painting1.clone(),
            painting2: config.painting2.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse movement.
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.6, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }
}

impl CameraConfig {
    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::from_yaw_pitch(Vec3::from_array(self.position), self.yaw, self.pitch, self.fov, aspect)
    }
}
