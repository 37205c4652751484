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

//! Frame bracketing, presentation settings and screenshots.

use super::GraphicsContext;
use crate::renderer::api::{FrameStats, PixelFormat};
use crate::renderer::error::RenderError;
use image::imageops::FilterType;
use std::path::Path;

impl GraphicsContext {
    /// Starts a frame and resets the per-frame counters.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin_frame(&mut self) {
        assert!(!self.in_frame, "begin_frame called twice without end_frame");
        self.in_frame = true;
        self.stats = FrameStats {
            frame_number: self.stats.frame_number + 1,
            ..FrameStats::default()
        };
        self.device.begin_frame();
    }

    /// Finishes the frame and presents it.
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn end_frame(&mut self) -> Result<(), RenderError> {
        assert!(self.in_frame, "end_frame called without begin_frame");
        self.in_frame = false;
        log::trace!(
            "Frame {} ended: {} draw calls, {} vertices",
            self.stats.frame_number,
            self.stats.draw_calls,
            self.stats.vertices
        );
        self.device.end_frame().inspect_err(|e| {
            log::error!("Failed to end frame {}: {e}", self.stats.frame_number);
        })
    }

    /// Returns `true` between `begin_frame` and `end_frame`.
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Counters of the current (or last) frame.
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    /// Enables or disables waiting for vertical sync.
    pub fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        self.device.set_vsync(enabled);
    }

    /// Whether vertical sync is requested.
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// Tells the device the framebuffer changed size. Zero sizes are ignored.
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {width}x{height}");
            return;
        }
        log::info!("Framebuffer resized to {width}x{height}");
        self.framebuffer_size = (width, height);
        self.device.on_window_resize(width, height);
    }

    /// The framebuffer size last reported through `on_window_resize`.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer_size
    }

    /// Reads back the current render target and writes it to `path` as a PNG of
    /// `width` x `height` pixels, resampling if the target has a different size.
    pub fn take_screenshot(
        &mut self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let path = path.as_ref();
        let fail = |details: String| RenderError::Screenshot {
            path: path.to_path_buf(),
            details,
        };
        if width == 0 || height == 0 {
            return Err(fail(format!("invalid screenshot size {width}x{height}")));
        }

        let frame = self.device.read_framebuffer()?;
        if frame.format != PixelFormat::Rgba8 {
            return Err(fail(format!(
                "device returned {:?} pixels, expected Rgba8",
                frame.format
            )));
        }
        let (src_w, src_h) = (frame.width, frame.height);
        let mut image = image::RgbaImage::from_raw(src_w, src_h, frame.pixels)
            .ok_or_else(|| fail(format!("read back buffer does not hold {src_w}x{src_h} pixels")))?;
        if (src_w, src_h) != (width, height) {
            image = image::imageops::resize(&image, width, height, FilterType::Triangle);
        }

        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| fail(e.to_string()))?;
        log::info!(
            "Screenshot saved to '{}' ({width}x{height})",
            path.display()
        );
        Ok(())
    }

    /// Logs backend-specific details about the device.
    pub fn log_api_info(&self) {
        let info = self.device.info();
        log::info!(
            "Graphics device: {} ({:?}, {:?})",
            info.name,
            info.backend_type,
            info.device_type
        );
        let (w, h) = self.max_texture_dimensions();
        log::info!("Max texture size: {w}x{h}");
        self.device.log_api_info();
    }
}
