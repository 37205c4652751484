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

//! Opaque handles to device resources.
//!
//! Every handle is a backend-assigned integer. The value `0` is reserved as the
//! "none" sentinel: backends never hand it out, deleting it is a no-op, and every
//! delete operation resets the caller's handle to it.

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub usize);

        impl $name {
            /// The "no resource" sentinel.
            pub const NONE: Self = Self(0);

            /// Returns `true` if this is the [`Self::NONE`] sentinel.
            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            /// Returns `true` if this refers to a resource.
            #[inline]
            pub const fn is_some(self) -> bool {
                self.0 != 0
            }
        }
    };
}

resource_handle!(
    /// An opaque handle to an uploaded 2D texture.
    TextureId
);

resource_handle!(
    /// An opaque handle to an immutable vertex buffer.
    VertexBufferId
);

resource_handle!(
    /// An opaque handle to a vertex buffer whose contents are replaced on every draw.
    DynamicVertexBufferId
);

resource_handle!(
    /// An opaque handle to an immutable buffer of 16-bit indices.
    IndexBufferId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_handle_is_none() {
        assert_eq!(TextureId::default(), TextureId::NONE);
        assert!(IndexBufferId::default().is_none());
        assert!(VertexBufferId(3).is_some());
    }
}
