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

use anyhow::{anyhow, Result};
use wgpu::Adapter;

/// Colour format of offscreen render targets.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Where frames are rendered to.
#[derive(Debug)]
pub enum RenderTarget {
    /// A caller-created surface, presented at the end of every frame.
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        readable: bool,
    },
    /// A texture owned by the context, for rendering without a window.
    Offscreen { texture: wgpu::Texture },
}

/// Holds the core wgpu state objects required for rendering.
///
/// It is initialized with a pre-selected adapter and a render target; creating
/// windows and surfaces is left to the caller.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub target: RenderTarget,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_device_type: wgpu::DeviceType,
    pub device_limits: wgpu::Limits,
}

impl WgpuGraphicsContext {
    /// Initializes a context rendering into an offscreen RGBA8 texture.
    pub async fn new_offscreen(adapter: Adapter, width: u32, height: u32) -> Result<Self> {
        log::info!("Initializing offscreen wgpu graphics context ({width}x{height})...");
        let (device, queue) = Self::request_device(&adapter).await?;
        let texture = Self::create_offscreen_texture(&device, width, height);
        Ok(Self::assemble(
            adapter,
            device,
            queue,
            RenderTarget::Offscreen { texture },
        ))
    }

    /// Initializes a context presenting to an already-created surface.
    ///
    /// The surface must come from the same `wgpu::Instance` as the adapter.
    pub async fn with_surface(
        adapter: Adapter,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        log::info!("Initializing wgpu graphics context for a surface ({width}x{height})...");
        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Vertex colours and textures are used as-is, so prefer a linear format.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("The surface is not compatible with the adapter"))?;
        let readable = surface_caps.usages.contains(wgpu::TextureUsages::COPY_SRC);
        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if readable {
            usage |= wgpu::TextureUsages::COPY_SRC;
        } else {
            log::warn!("Surface does not support COPY_SRC; screenshots will be unavailable");
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: Self::present_mode(&surface_caps.present_modes, vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {:?}, {:?}",
            config.format,
            config.present_mode
        );

        Ok(Self::assemble(
            adapter,
            device,
            queue,
            RenderTarget::Surface {
                surface,
                config,
                readable,
            },
        ))
    }

    async fn request_device(adapter: &Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        let adapter_info = adapter.get_info();
        log::info!(
            "Using provided graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Tessera Logical Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));
        Ok((device, queue))
    }

    fn assemble(
        adapter: Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: RenderTarget,
    ) -> Self {
        let info = adapter.get_info();
        let device_limits = device.limits();
        Self {
            adapter,
            device,
            queue,
            target,
            adapter_name: info.name,
            adapter_backend: info.backend,
            adapter_device_type: info.device_type,
            device_limits,
        }
    }

    fn create_offscreen_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tessera Offscreen Target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    fn present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
        if vsync {
            return wgpu::PresentMode::Fifo;
        }
        [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
            .into_iter()
            .find(|m| available.contains(m))
            .unwrap_or(wgpu::PresentMode::Fifo) // Fifo is guaranteed to be supported
    }

    /// Resizes the render target. Zero sizes are ignored.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            log::warn!(
                "WgpuGraphicsContext: Ignoring resize request to zero dimensions: {new_width}x{new_height}"
            );
            return;
        }
        log::info!("WgpuGraphicsContext: Resizing render target to {new_width}x{new_height}");
        match &mut self.target {
            RenderTarget::Surface {
                surface, config, ..
            } => {
                config.width = new_width;
                config.height = new_height;
                surface.configure(&self.device, config);
            }
            RenderTarget::Offscreen { texture } => {
                *texture = Self::create_offscreen_texture(&self.device, new_width, new_height);
            }
        }
    }

    /// Switches between vsync'd and unthrottled presentation. No effect offscreen.
    pub fn set_vsync(&mut self, vsync: bool) {
        if let RenderTarget::Surface {
            surface, config, ..
        } = &mut self.target
        {
            let caps = surface.get_capabilities(&self.adapter);
            config.present_mode = Self::present_mode(&caps.present_modes, vsync);
            surface.configure(&self.device, config);
            log::info!("Present mode set to {:?}", config.present_mode);
        }
    }

    /// Returns the size of the render target.
    pub fn size(&self) -> (u32, u32) {
        match &self.target {
            RenderTarget::Surface { config, .. } => (config.width, config.height),
            RenderTarget::Offscreen { texture } => (texture.width(), texture.height()),
        }
    }

    /// Colour format of the render target.
    pub fn colour_format(&self) -> wgpu::TextureFormat {
        match &self.target {
            RenderTarget::Surface { config, .. } => config.format,
            RenderTarget::Offscreen { .. } => OFFSCREEN_FORMAT,
        }
    }

    /// Whether the render target can be copied back to the CPU.
    pub fn supports_readback(&self) -> bool {
        match &self.target {
            RenderTarget::Surface { readable, .. } => *readable,
            RenderTarget::Offscreen { .. } => true,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_always_uses_fifo() {
        let available = [wgpu::PresentMode::Immediate, wgpu::PresentMode::Fifo];
        assert_eq!(
            WgpuGraphicsContext::present_mode(&available, true),
            wgpu::PresentMode::Fifo
        );
        assert_eq!(
            WgpuGraphicsContext::present_mode(&available, false),
            wgpu::PresentMode::Immediate
        );
        assert_eq!(
            WgpuGraphicsContext::present_mode(&[wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Fifo
        );
    }
}
