// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serializable settings for constructing a graphics context.

use super::adapter::GraphicsBackendType;
use super::selection::BackendSelectionConfig;
use crate::math::Rgba8;
use crate::renderer::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which device implementation drives the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Retained-mode backend on top of wgpu.
    #[default]
    Wgpu,
    /// Immediate-mode OpenGL backend.
    Gl,
    /// No GPU; records commands only.
    Headless,
}

/// Settings read once when a context is built. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    /// The device implementation.
    pub backend: BackendKind,
    /// Whether presentation waits for vertical sync.
    pub vsync: bool,
    /// Colour used by `clear()` until changed.
    pub clear_colour: Rgba8,
    /// Clamp for the device's maximum texture size, if any.
    pub max_texture_dimensions: Option<u32>,
    /// Initial framebuffer size in pixels.
    pub initial_size: (u32, u32),
    /// Native APIs tried by the wgpu backend, most preferred first.
    /// An empty list means the platform default order.
    pub preferred_backends: Vec<GraphicsBackendType>,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            vsync: true,
            clear_colour: Rgba8::BLACK,
            max_texture_dimensions: None,
            initial_size: (1280, 720),
            preferred_backends: Vec::new(),
        }
    }
}

impl GraphicsSettings {
    /// Parses settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the adapter selection config for the wgpu backend.
    pub fn backend_selection(&self) -> BackendSelectionConfig {
        let mut config = BackendSelectionConfig::default();
        if !self.preferred_backends.is_empty() {
            config.preferred_backends = self.preferred_backends.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = GraphicsSettings::from_json_str(r#"{ "backend": "Headless" }"#).unwrap();
        assert_eq!(settings.backend, BackendKind::Headless);
        assert!(settings.vsync);
        assert_eq!(settings.initial_size, (1280, 720));
        assert_eq!(settings.max_texture_dimensions, None);
    }

    #[test]
    fn full_document_parses() {
        let json = r#"{
            "backend": "Gl",
            "vsync": false,
            "clear_colour": { "r": 10, "g": 20, "b": 30, "a": 255 },
            "max_texture_dimensions": 1024,
            "initial_size": [640, 480],
            "preferred_backends": ["OpenGL", "Vulkan"]
        }"#;
        let settings = GraphicsSettings::from_json_str(json).unwrap();
        assert_eq!(settings.backend, BackendKind::Gl);
        assert!(!settings.vsync);
        assert_eq!(settings.clear_colour, Rgba8::rgb(10, 20, 30));
        assert_eq!(settings.max_texture_dimensions, Some(1024));
        assert_eq!(settings.initial_size, (640, 480));
        assert_eq!(
            settings.backend_selection().preferred_backends,
            vec![GraphicsBackendType::OpenGL, GraphicsBackendType::Vulkan]
        );
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = GraphicsSettings::from_json_str(r#"{ "backend": "Direct3D9" }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphics.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(GraphicsSettings::default().to_json_string().unwrap().as_bytes())
            .unwrap();

        assert_eq!(
            GraphicsSettings::load(&path).unwrap(),
            GraphicsSettings::default()
        );

        let err = GraphicsSettings::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
