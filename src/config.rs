use crate::interaction::drag::HighlightPolicy;
use crate::scene::{Color, ColorParseError};
use glam::Vec3;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "SHADEBOX_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid color in config: {0}")]
    Color(#[from] ColorParseError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// `#rrggbb` clear color behind the scene.
    pub background: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "shadebox".to_string(),
            width: 1280,
            height: 720,
            background: "#9a90c0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            near: 1.0,
            far: 1000.0,
            position: [0.0, 0.0, 16.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub highlight: HighlightPolicy,
    pub highlight_color: String,
    pub orbit_enabled: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            highlight: HighlightPolicy::Persist,
            highlight_color: "#aaaaaa".to_string(),
            orbit_enabled: true,
        }
    }
}

/// A glTF file to load in the background at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl AssetEntry {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("asset")
                .to_string()
        })
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl SandboxConfig {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text, &path.display().to_string())?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Config path from the first CLI argument, else the environment.
    pub fn locate(mut args: impl Iterator<Item = String>, env: Option<String>) -> Option<PathBuf> {
        args.next()
            .or(env)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Load from the located path, or fall back to defaults when none is given.
    pub fn resolve() -> Result<Self, ConfigError> {
        let located = Self::locate(
            std::env::args().skip(1),
            std::env::var(CONFIG_ENV_VAR).ok(),
        );
        match located {
            Some(path) => Self::load(&path),
            None => {
                log::info!("config: using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn highlight_color(&self) -> Result<Color, ConfigError> {
        Ok(Color::from_hex(&self.interaction.highlight_color)?)
    }

    pub fn background(&self) -> Result<Color, ConfigError> {
        Ok(Color::from_hex(&self.window.background)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_starting_view() {
        let config = SandboxConfig::default();
        assert_eq!(config.camera.fov_y_deg, 45.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 16.0]);
        assert_eq!(config.interaction.highlight, HighlightPolicy::Persist);
        assert_eq!(config.highlight_color().unwrap().to_hex(), "#aaaaaa");
        assert!(config.assets.is_empty());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = SandboxConfig::from_json(
            r#"{
                "window": { "width": 800 },
                "interaction": { "highlight": "clear_on_drag" },
                "assets": [{ "path": "models/castle.gltf", "scale": 5.0 }]
            }"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.interaction.highlight, HighlightPolicy::ClearOnDrag);
        assert!(config.interaction.orbit_enabled);
        assert_eq!(config.assets[0].display_name(), "castle");
        assert_eq!(config.assets[0].scale, 5.0);
        assert_eq!(config.assets[0].position(), Vec3::ZERO);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(
            SandboxConfig::from_json("{ not json", "inline"),
            Err(ConfigError::Parse { .. })
        ));
        let mut config = SandboxConfig::default();
        config.window.background = "purple".to_string();
        assert!(matches!(config.background(), Err(ConfigError::Color(_))));
    }

    #[test]
    fn cli_argument_wins_over_environment() {
        let args = vec!["a.json".to_string()].into_iter();
        assert_eq!(
            SandboxConfig::locate(args, Some("b.json".into())),
            Some(PathBuf::from("a.json"))
        );
        assert_eq!(
            SandboxConfig::locate(std::iter::empty(), Some("b.json".into())),
            Some(PathBuf::from("b.json"))
        );
        assert_eq!(SandboxConfig::locate(std::iter::empty(), None), None);
    }
}
