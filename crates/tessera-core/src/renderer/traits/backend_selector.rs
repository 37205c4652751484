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

use crate::renderer::api::{
    BackendSelectionConfig, BackendSelectionResult, GraphicsAdapterInfo, GraphicsBackendType,
};
use async_trait::async_trait;

/// Discovers the adapters of a retained-mode API and picks one.
///
/// Adapter enumeration can be slow, so selection is asynchronous. The implementation
/// in `tessera-infra` wraps `wgpu`.
#[async_trait]
pub trait GraphicsBackendSelector<TAdapter> {
    /// The error type returned if selection fails.
    type Error: std::fmt::Debug + std::fmt::Display + Send + Sync + 'static;

    /// Selects the best adapter, trying `config.preferred_backends` in order and
    /// falling back to any available native API.
    async fn select_backend(
        &self,
        config: &BackendSelectionConfig,
    ) -> Result<BackendSelectionResult<TAdapter>, Self::Error>;

    /// Lists all adapters available through one native API.
    async fn list_adapters(
        &self,
        backend_type: GraphicsBackendType,
    ) -> Result<Vec<GraphicsAdapterInfo>, Self::Error>;

    /// Returns `true` if the native API can exist on this platform at all.
    fn is_backend_supported(&self, backend_type: GraphicsBackendType) -> bool;
}
