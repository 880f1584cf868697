//! Resource objects
//!
//! Each resource owns its native handles. Resources are created and destroyed
//! through the [`Device`](crate::Device), which hands out the typed ids below.

mod index_buffer;
mod sampler;
mod shader;
mod stage_surface;
mod texture;
mod vertex_buffer;
mod zstencil;

pub use index_buffer::*;
pub use sampler::*;
pub use shader::*;
pub use stage_surface::*;
pub use texture::*;
pub use vertex_buffer::*;
pub use zstencil::*;

pub(crate) use texture::copy_with;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// Raw id value, unique per device.
            pub fn raw(&self) -> u64 {
                self.0
            }
        }
    };
}

resource_id!(
    /// Handle to a texture owned by a device
    TextureId
);
resource_id!(
    /// Handle to a vertex buffer owned by a device
    VertexBufferId
);
resource_id!(
    /// Handle to an index buffer owned by a device
    IndexBufferId
);
resource_id!(
    /// Handle to a shader owned by a device
    ShaderId
);
resource_id!(
    /// Handle to a sampler state owned by a device
    SamplerId
);
resource_id!(
    /// Handle to a stage surface owned by a device
    StageSurfaceId
);
resource_id!(
    /// Handle to a depth/stencil buffer owned by a device
    ZStencilId
);
resource_id!(
    /// Handle to a swap chain owned by a device
    SwapChainId
);
