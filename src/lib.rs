//! GL Subsystem - An OpenGL-class rendering device core
//!
//! This crate owns the device-side state of a hardware renderer:
//! - **Format translation**: generic color, depth and shader enums to native GL tokens
//! - **Resources**: 2D and cube textures, vertex and index buffers, shaders with
//!   parameter tables, samplers, staging surfaces, depth/stencil buffers and swap chains
//! - **Bound state**: texture and sampler units, render target, current shaders
//!
//! Every native call goes through the [`backend::GlBackend`] trait. The bundled
//! [`backend::DummyBackend`] keeps resources in memory and is what the tests use.
//!
//! # Features
//! - Dirty-tracked shader parameters with implicit `ViewProj` / `World` matrices
//! - Dynamic resources updated in place through unpack buffers
//! - Texture copies over `ARB_copy_image`, `NV_copy_image` or a framebuffer blit

pub mod backend;
pub mod device;
pub mod error;
pub mod resources;
pub mod swap_chain;

pub use device::Device;
pub use error::{GraphicsError, GraphicsResult};
pub use swap_chain::SwapChain;

use backend::CopyType;

/// Number of texture and sampler units a device exposes.
pub const MAX_TEXTURES: usize = 8;

/// Configuration for creating a [`Device`]
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Force a texture copy path instead of probing extensions
    pub copy_type_override: Option<CopyType>,
    /// Upper bound for sampler anisotropy
    pub max_anisotropy: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            copy_type_override: None,
            max_anisotropy: 16,
        }
    }
}
