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

//! Graphics backend selection with fallback support.
//!
//! Native APIs are tried in order of preference (Vulkan, DX12 on Windows, Metal on
//! macOS) and selection falls back to whatever adapter wgpu offers if none of them
//! yields one.
//!
//! This module implements the GraphicsBackendSelector trait for wgpu.

use super::conversions::{backend_to_type, device_type_to_type, type_to_backend};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Instant;
use wgpu::{Adapter, Backend, DeviceType, Instance};

use tessera_core::renderer::{
    api::{BackendSelectionConfig, BackendSelectionResult, GraphicsAdapterInfo, GraphicsBackendType},
    traits::GraphicsBackendSelector,
};

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        #[allow(unreachable_patterns)]
        _ => "Empty",
    }
}

/// wgpu implementation of the GraphicsBackendSelector trait.
///
/// Surfaces for the selected adapter must be created from [`Self::instance`].
#[derive(Debug)]
pub struct WgpuBackendSelector {
    instance: Instance,
}

impl Default for WgpuBackendSelector {
    fn default() -> Self {
        Self::new(Instance::new(wgpu::InstanceDescriptor::default()))
    }
}

impl WgpuBackendSelector {
    /// Create a new wgpu backend selector with a shared instance.
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }

    /// The instance adapters are enumerated from.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Convert wgpu adapter info to our generic GraphicsAdapterInfo.
    fn adapter_to_info(adapter: &Adapter) -> GraphicsAdapterInfo {
        let info = adapter.get_info();
        GraphicsAdapterInfo {
            name: info.name.clone(),
            backend_type: backend_to_type(info.backend),
            device_type: device_type_to_type(info.device_type),
        }
    }

    /// Lower is better.
    fn device_rank(device_type: DeviceType, prefer_discrete: bool) -> u8 {
        match (device_type, prefer_discrete) {
            (DeviceType::DiscreteGpu, true) | (DeviceType::IntegratedGpu, false) => 0,
            (DeviceType::IntegratedGpu, true) | (DeviceType::DiscreteGpu, false) => 1,
            (DeviceType::VirtualGpu, _) => 2,
            (DeviceType::Other, _) => 3,
            (DeviceType::Cpu, _) => 4,
        }
    }

    /// Try to get the best adapter for a specific backend type.
    fn try_backend(&self, backend_type: GraphicsBackendType, prefer_discrete: bool) -> Result<Adapter> {
        if !self.is_backend_supported(backend_type) {
            return Err(anyhow!("{backend_type:?} is not available on this platform"));
        }
        let backend = type_to_backend(backend_type);

        let adapter = self
            .instance
            .enumerate_adapters(wgpu::Backends::from(backend))
            .into_iter()
            .min_by_key(|a| Self::device_rank(a.get_info().device_type, prefer_discrete))
            .ok_or_else(|| anyhow!("No {} adapter found", backend_name(backend)))?;

        log::info!(
            "✓ {:?} backend succeeded with adapter: \"{}\"",
            backend_type,
            adapter.get_info().name
        );
        Ok(adapter)
    }
}

#[async_trait]
impl GraphicsBackendSelector<Adapter> for WgpuBackendSelector {
    type Error = String;

    async fn select_backend(
        &self,
        config: &BackendSelectionConfig,
    ) -> Result<BackendSelectionResult<Adapter>, Self::Error> {
        let start_time = Instant::now();
        let mut attempted_backends = Vec::new();

        log::info!("Starting wgpu backend selection process...");

        for &backend_type in &config.preferred_backends {
            if start_time.elapsed() > config.timeout {
                log::warn!("Backend selection timed out after {:?}", config.timeout);
                break;
            }
            attempted_backends.push(backend_type);
            log::info!("Attempting to initialize {backend_type:?} backend...");

            match self.try_backend(backend_type, config.prefer_discrete_gpu) {
                Ok(adapter) => {
                    let adapter_info = Self::adapter_to_info(&adapter);
                    let selection_time_ms = start_time.elapsed().as_millis() as u64;

                    log::info!(
                        "Successfully selected {:?} backend with adapter: \"{}\" (Device: {:?})",
                        backend_type,
                        adapter_info.name,
                        adapter_info.device_type,
                    );

                    return Ok(BackendSelectionResult {
                        adapter,
                        adapter_info,
                        selection_time_ms,
                        attempted_backends,
                    });
                }
                Err(e) => {
                    // Log failure and continue to next backend
                    log::warn!("Failed to initialize {backend_type:?} backend: {e}");
                }
            }
        }

        log::info!("No preferred backend available, asking wgpu for any adapter...");
        let power_preference = if config.prefer_discrete_gpu {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = self
            .instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                format!("All backend attempts failed. Attempted: {attempted_backends:?}")
            })?;

        let adapter_info = Self::adapter_to_info(&adapter);
        attempted_backends.push(adapter_info.backend_type);
        log::info!(
            "Fell back to adapter \"{}\" ({:?})",
            adapter_info.name,
            adapter_info.backend_type
        );
        Ok(BackendSelectionResult {
            adapter,
            adapter_info,
            selection_time_ms: start_time.elapsed().as_millis() as u64,
            attempted_backends,
        })
    }

    async fn list_adapters(
        &self,
        backend_type: GraphicsBackendType,
    ) -> Result<Vec<GraphicsAdapterInfo>, Self::Error> {
        if !self.is_backend_supported(backend_type) {
            return Ok(Vec::new());
        }
        let backends = wgpu::Backends::from(type_to_backend(backend_type));
        Ok(self
            .instance
            .enumerate_adapters(backends)
            .iter()
            .map(Self::adapter_to_info)
            .collect())
    }

    fn is_backend_supported(&self, backend_type: GraphicsBackendType) -> bool {
        match backend_type {
            GraphicsBackendType::Vulkan => {
                cfg!(any(target_os = "windows", target_os = "linux", target_os = "android"))
            }
            GraphicsBackendType::Dx12 => cfg!(target_os = "windows"),
            GraphicsBackendType::Metal => cfg!(any(target_os = "macos", target_os = "ios")),
            GraphicsBackendType::OpenGL => true, // Generally available on most platforms
            GraphicsBackendType::WebGpu => cfg!(target_arch = "wasm32"),
            GraphicsBackendType::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_function() {
        assert_eq!(backend_name(Backend::Vulkan), "Vulkan");
        assert_eq!(backend_name(Backend::Metal), "Metal");
        assert_eq!(backend_name(Backend::Dx12), "DirectX 12");
        assert_eq!(backend_name(Backend::Gl), "OpenGL");
    }

    #[test]
    fn discrete_gpus_rank_first_when_preferred() {
        let rank = WgpuBackendSelector::device_rank;
        assert!(rank(DeviceType::DiscreteGpu, true) < rank(DeviceType::IntegratedGpu, true));
        assert!(rank(DeviceType::IntegratedGpu, false) < rank(DeviceType::DiscreteGpu, false));
        assert!(rank(DeviceType::VirtualGpu, true) < rank(DeviceType::Cpu, true));
    }

    #[test]
    fn unknown_backend_is_never_supported() {
        let selector = WgpuBackendSelector::new(Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::empty(),
            ..Default::default()
        }));
        assert!(!selector.is_backend_supported(GraphicsBackendType::Unknown));
        assert!(selector.is_backend_supported(GraphicsBackendType::OpenGL));
    }
}
