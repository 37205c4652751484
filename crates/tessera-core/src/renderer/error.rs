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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Misuse of the command surface (unbalanced matrix stacks, drawing without a bound
//! buffer, mismatched vertex formats, bad frame bracketing) is a programming error
//! and panics instead of producing one of these values.

use crate::renderer::api::PixelFormat;
use std::fmt;
use std::path::PathBuf;

/// A failure reported by the underlying graphics device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not allocate memory for a resource.
    OutOfMemory,
    /// The device was lost (driver reset, GPU removed). Requires reinitialization.
    DeviceLost,
    /// Any other backend-specific failure.
    Backend(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfMemory => write!(f, "The graphics device ran out of memory."),
            DeviceError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
            DeviceError::Backend(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A recoverable error raised while creating a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// The file a texture was to be loaded from does not exist.
    NotFound(PathBuf),
    /// The pixel data cannot be uploaded: unsupported layout, wrong length, zero size or undecodable.
    UnsupportedFormat(String),
    /// The texture is larger than the device (or configured) maximum.
    DimensionTooLarge {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Maximum width and height accepted.
        max: (u32, u32),
    },
    /// The device failed while creating the resource.
    Device(DeviceError),
}

impl ResourceError {
    /// Shorthand for an [`ResourceError::UnsupportedFormat`] about a pixel format.
    pub fn unsupported_pixel_format(format: PixelFormat) -> Self {
        ResourceError::UnsupportedFormat(format!(
            "pixel format {format:?} is not supported by this backend"
        ))
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound(path) => {
                write!(f, "Resource not found: '{}'", path.display())
            }
            ResourceError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {msg}"),
            ResourceError::DimensionTooLarge { width, height, max } => write!(
                f,
                "Texture of {width}x{height} exceeds the maximum of {}x{}",
                max.0, max.1
            ),
            ResourceError::Device(err) => write!(f, "Device error during resource creation: {err}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for ResourceError {
    fn from(err: DeviceError) -> Self {
        ResourceError::Device(err)
    }
}

/// A high-level error raised by frame control, screenshots or backend construction.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred during the initialization of the graphics backend.
    InitializationFailed(String),
    /// Failed to acquire the next frame from the surface.
    SurfaceAcquisitionFailed(String),
    /// Reading back, resizing or writing a screenshot failed.
    Screenshot {
        /// Destination path of the screenshot.
        path: PathBuf,
        /// What went wrong.
        details: String,
    },
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// The device failed.
    Device(DeviceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics backend: {msg}")
            }
            RenderError::SurfaceAcquisitionFailed(msg) => {
                write!(f, "Failed to acquire surface for rendering: {msg}")
            }
            RenderError::Screenshot { path, details } => {
                write!(f, "Failed to take screenshot '{}': {details}", path.display())
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Device(err) => write!(f, "Graphics device failure: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            RenderError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        RenderError::Device(err)
    }
}

/// An error raised while loading [`GraphicsSettings`](crate::renderer::api::GraphicsSettings).
#[derive(Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The settings document is not valid JSON for the settings schema.
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "Failed to read settings from '{}': {source}", path.display())
            }
            SettingsError::Parse(err) => write!(f, "Failed to parse settings: {err}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn dimension_error_display() {
        let err = ResourceError::DimensionTooLarge {
            width: 4096,
            height: 16,
            max: (2048, 2048),
        };
        assert_eq!(
            format!("{err}"),
            "Texture of 4096x16 exceeds the maximum of 2048x2048"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn device_error_chains_through_resource_and_render_errors() {
        let res_err: ResourceError = DeviceError::OutOfMemory.into();
        let render_err: RenderError = res_err.into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Device error during resource creation: The graphics device ran out of memory."
        );
        let source = render_err.source().expect("resource error source");
        assert!(source.source().is_some());
    }

    #[test]
    fn device_lost_converts_to_render_error() {
        let err: RenderError = DeviceError::DeviceLost.into();
        assert!(matches!(err, RenderError::Device(DeviceError::DeviceLost)));
    }

    #[test]
    fn settings_parse_error_wraps_serde() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(format!("{err}").starts_with("Failed to parse settings:"));
        assert!(err.source().is_some());
    }
}
