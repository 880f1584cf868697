//! Graphics device.
//!
//! The [`Device`] owns the platform context and every resource created through
//! it. It records which resources are bound for the next draw and negotiates the
//! texture copy path once at creation.
//!
//! # Thread Safety
//!
//! A device belongs to the thread that owns its native context. All methods take
//! `&mut self` and there is no internal locking.
//!
//! # Example
//!
//! ```
//! use gl_subsystem::backend::{ColorFormat, DummyBackend, InitData};
//! use gl_subsystem::resources::TextureDescriptor;
//! use gl_subsystem::{Device, DeviceConfig};
//!
//! let info = InitData::new(640, 480);
//! let mut device = Device::new(DummyBackend::new(), &info, DeviceConfig::default())?;
//! let desc = TextureDescriptor::new_2d(64, 64, ColorFormat::Rgba);
//! let texture = device.create_texture(&desc, None)?;
//! device.load_texture(Some(texture), 0)?;
//! assert_eq!(device.cur_texture(0)?, Some(texture));
//! # Ok::<(), gl_subsystem::GraphicsError>(())
//! ```

mod bound;
mod resources;
mod shader;

pub use bound::BoundSlots;

use std::collections::HashMap;
use std::fmt::Debug;

use glam::Mat4;

use crate::backend::gl;
use crate::backend::{CopyRegion, CopyType, GlBackend, InitData, PlatformHandle};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{
    copy_with, IndexBuffer, IndexBufferId, SamplerId, SamplerState, Shader, ShaderId,
    StageSurface, StageSurfaceId, SwapChainId, Texture, TextureId, TextureKind, VertexBuffer,
    VertexBufferId, ZStencilBuffer, ZStencilId,
};
use crate::swap_chain::SwapChain;
use crate::{DeviceConfig, MAX_TEXTURES};

/// Extension names probed during copy-type negotiation.
pub const ARB_COPY_IMAGE: &str = "GL_ARB_copy_image";
pub const NV_COPY_IMAGE: &str = "GL_NV_copy_image";

/// Number of faces of a cube render target.
pub const CUBE_SIDES: u32 = 6;

/// The rendering device
pub struct Device<B: GlBackend> {
    backend: B,
    config: DeviceConfig,
    platform: PlatformHandle,
    copy_type: CopyType,
    next_id: u64,

    // Resource tables
    textures: HashMap<TextureId, Texture>,
    vertex_buffers: HashMap<VertexBufferId, VertexBuffer>,
    index_buffers: HashMap<IndexBufferId, IndexBuffer>,
    shaders: HashMap<ShaderId, Shader>,
    samplers: HashMap<SamplerId, SamplerState>,
    stage_surfaces: HashMap<StageSurfaceId, StageSurface>,
    zstencils: HashMap<ZStencilId, ZStencilBuffer>,
    swap_chains: HashMap<SwapChainId, SwapChain>,

    // Bound state
    cur_textures: BoundSlots<TextureId, MAX_TEXTURES>,
    cur_samplers: BoundSlots<SamplerId, MAX_TEXTURES>,
    cur_render_texture: Option<TextureId>,
    cur_render_side: u32,
    cur_zstencil: Option<ZStencilId>,
    cur_vertex_buffer: Option<VertexBufferId>,
    cur_index_buffer: Option<IndexBufferId>,
    cur_vertex_shader: Option<ShaderId>,
    cur_pixel_shader: Option<ShaderId>,
    cur_swap: Option<SwapChainId>,
    cur_view_proj: Mat4,
    cur_world: Mat4,
}

impl<B: GlBackend> Device<B> {
    /// Create the platform context and its primary swap chain.
    pub fn new(mut backend: B, info: &InitData, config: DeviceConfig) -> GraphicsResult<Self> {
        let platform = backend.create_platform_context(info)?;
        let swap = match SwapChain::create(&mut backend, info) {
            Ok(swap) => swap,
            Err(err) => {
                log::warn!("Failed to create primary swap chain: {err}");
                backend.destroy_platform_context(platform);
                return Err(err);
            }
        };

        let copy_type = Self::negotiate_copy_type(&backend, &config);
        log::info!(
            "Created device on {} ({}x{}, copy type {:?})",
            backend.name(),
            info.cx,
            info.cy,
            copy_type
        );

        let mut device = Self {
            backend,
            config,
            platform,
            copy_type,
            next_id: 0,
            textures: HashMap::new(),
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            shaders: HashMap::new(),
            samplers: HashMap::new(),
            stage_surfaces: HashMap::new(),
            zstencils: HashMap::new(),
            swap_chains: HashMap::new(),
            cur_textures: BoundSlots::new(),
            cur_samplers: BoundSlots::new(),
            cur_render_texture: None,
            cur_render_side: 0,
            cur_zstencil: None,
            cur_vertex_buffer: None,
            cur_index_buffer: None,
            cur_vertex_shader: None,
            cur_pixel_shader: None,
            cur_swap: None,
            cur_view_proj: Mat4::IDENTITY,
            cur_world: Mat4::IDENTITY,
        };
        let id = SwapChainId(device.next_id());
        device.swap_chains.insert(id, swap);
        device.cur_swap = Some(id);
        Ok(device)
    }

    fn negotiate_copy_type(backend: &B, config: &DeviceConfig) -> CopyType {
        if let Some(copy_type) = config.copy_type_override {
            return copy_type;
        }
        if backend.has_extension(ARB_COPY_IMAGE) {
            CopyType::Arb
        } else if backend.has_extension(NV_COPY_IMAGE) {
            CopyType::Nv
        } else {
            CopyType::FboBlit
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn platform(&self) -> PlatformHandle {
        self.platform
    }

    /// Copy path chosen at creation.
    pub fn copy_type(&self) -> CopyType {
        self.copy_type
    }

    // Resource lookup

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(&id)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&IndexBuffer> {
        self.index_buffers.get(&id)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(&id)
    }

    pub fn sampler(&self, id: SamplerId) -> Option<&SamplerState> {
        self.samplers.get(&id)
    }

    pub fn stage_surface(&self, id: StageSurfaceId) -> Option<&StageSurface> {
        self.stage_surfaces.get(&id)
    }

    pub fn zstencil(&self, id: ZStencilId) -> Option<&ZStencilBuffer> {
        self.zstencils.get(&id)
    }

    pub fn swap_chain(&self, id: SwapChainId) -> Option<&SwapChain> {
        self.swap_chains.get(&id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn index_buffer_count(&self) -> usize {
        self.index_buffers.len()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    pub fn stage_surface_count(&self) -> usize {
        self.stage_surfaces.len()
    }

    pub fn zstencil_count(&self) -> usize {
        self.zstencils.len()
    }

    pub fn swap_chain_count(&self) -> usize {
        self.swap_chains.len()
    }

    /// Total number of live resources, swap chains included.
    pub fn resource_count(&self) -> usize {
        self.texture_count()
            + self.vertex_buffer_count()
            + self.index_buffer_count()
            + self.shader_count()
            + self.sampler_count()
            + self.stage_surface_count()
            + self.zstencil_count()
            + self.swap_chain_count()
    }

    // Bound state

    pub fn cur_texture(&self, unit: usize) -> GraphicsResult<Option<TextureId>> {
        self.cur_textures.get(unit)
    }

    pub fn cur_sampler(&self, unit: usize) -> GraphicsResult<Option<SamplerId>> {
        self.cur_samplers.get(unit)
    }

    pub fn cur_textures(&self) -> &BoundSlots<TextureId, MAX_TEXTURES> {
        &self.cur_textures
    }

    pub fn cur_samplers(&self) -> &BoundSlots<SamplerId, MAX_TEXTURES> {
        &self.cur_samplers
    }

    pub fn render_target(&self) -> Option<TextureId> {
        self.cur_render_texture
    }

    /// Cube face of the render target. Zero for 2D targets.
    pub fn render_side(&self) -> u32 {
        self.cur_render_side
    }

    pub fn zstencil_target(&self) -> Option<ZStencilId> {
        self.cur_zstencil
    }

    pub fn cur_vertex_buffer(&self) -> Option<VertexBufferId> {
        self.cur_vertex_buffer
    }

    pub fn cur_index_buffer(&self) -> Option<IndexBufferId> {
        self.cur_index_buffer
    }

    pub fn cur_vertex_shader(&self) -> Option<ShaderId> {
        self.cur_vertex_shader
    }

    pub fn cur_pixel_shader(&self) -> Option<ShaderId> {
        self.cur_pixel_shader
    }

    pub fn cur_swap_chain(&self) -> Option<SwapChainId> {
        self.cur_swap
    }

    pub fn view_projection(&self) -> Mat4 {
        self.cur_view_proj
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.cur_world
    }

    // Binding

    pub fn load_texture(&mut self, texture: Option<TextureId>, unit: usize) -> GraphicsResult<()> {
        if let Some(id) = texture {
            Self::require(&self.textures, id)?;
        }
        self.cur_textures.set(unit, texture)?;
        log::trace!("Bound texture {:?} to unit {}", texture, unit);
        Ok(())
    }

    pub fn load_sampler(&mut self, sampler: Option<SamplerId>, unit: usize) -> GraphicsResult<()> {
        if let Some(id) = sampler {
            Self::require(&self.samplers, id)?;
        }
        self.cur_samplers.set(unit, sampler)?;
        log::trace!("Bound sampler {:?} to unit {}", sampler, unit);
        Ok(())
    }

    pub fn load_vertex_buffer(&mut self, buffer: Option<VertexBufferId>) -> GraphicsResult<()> {
        if let Some(id) = buffer {
            Self::require(&self.vertex_buffers, id)?;
        }
        self.cur_vertex_buffer = buffer;
        Ok(())
    }

    pub fn load_index_buffer(&mut self, buffer: Option<IndexBufferId>) -> GraphicsResult<()> {
        if let Some(id) = buffer {
            Self::require(&self.index_buffers, id)?;
        }
        self.cur_index_buffer = buffer;
        Ok(())
    }

    pub fn load_swap_chain(&mut self, swap: Option<SwapChainId>) -> GraphicsResult<()> {
        if let Some(id) = swap {
            Self::require(&self.swap_chains, id)?;
        }
        self.cur_swap = swap;
        Ok(())
    }

    /// Render into a 2D render-target texture, or back into the swap chain.
    pub fn set_render_target(&mut self, texture: Option<TextureId>) -> GraphicsResult<()> {
        if let Some(id) = texture {
            let tex = Self::require(&self.textures, id)?;
            if tex.is_cube() {
                return Err(GraphicsError::CapabilityMismatch(format!(
                    "{id:?} is a cube texture, use set_cube_render_target"
                )));
            }
            if !tex.is_render_target() {
                return Err(GraphicsError::CapabilityMismatch(format!(
                    "{id:?} was not created as a render target"
                )));
            }
        }
        self.cur_render_texture = texture;
        self.cur_render_side = 0;
        log::trace!("Render target set to {:?}", texture);
        Ok(())
    }

    /// Render into one face of a cube render-target texture.
    pub fn set_cube_render_target(
        &mut self,
        texture: Option<TextureId>,
        side: u32,
    ) -> GraphicsResult<()> {
        let Some(id) = texture else {
            self.cur_render_texture = None;
            self.cur_render_side = 0;
            return Ok(());
        };
        if side >= CUBE_SIDES {
            return Err(GraphicsError::InvalidParameter(format!(
                "cube side {side} out of range"
            )));
        }
        let tex = Self::require(&self.textures, id)?;
        if !tex.is_cube() || !tex.is_render_target() {
            return Err(GraphicsError::CapabilityMismatch(format!(
                "{id:?} is not a cube render target"
            )));
        }
        self.cur_render_texture = Some(id);
        self.cur_render_side = side;
        log::trace!("Render target set to {:?} side {}", id, side);
        Ok(())
    }

    pub fn set_zstencil_target(&mut self, zstencil: Option<ZStencilId>) -> GraphicsResult<()> {
        if let Some(id) = zstencil {
            Self::require(&self.zstencils, id)?;
        }
        self.cur_zstencil = zstencil;
        Ok(())
    }

    pub fn set_view_projection(&mut self, matrix: Mat4) {
        self.cur_view_proj = matrix;
    }

    pub fn set_world_matrix(&mut self, matrix: Mat4) {
        self.cur_world = matrix;
    }

    // Swap chain

    fn current_swap_chain(&mut self) -> GraphicsResult<&mut SwapChain> {
        let id = self.cur_swap.ok_or_else(|| {
            GraphicsError::InvalidHandle("no swap chain loaded".to_string())
        })?;
        self.swap_chains
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::InvalidHandle(format!("{id:?}")))
    }

    /// Present the current swap chain.
    pub fn present(&mut self) -> GraphicsResult<()> {
        let window = self.current_swap_chain()?.window();
        self.backend.present(window)?;
        Ok(())
    }

    /// Resize the current swap chain.
    pub fn resize(&mut self, cx: u32, cy: u32) -> GraphicsResult<()> {
        if cx == 0 || cy == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "invalid size {cx}x{cy}"
            )));
        }
        let id = self.cur_swap.ok_or_else(|| {
            GraphicsError::InvalidHandle("no swap chain loaded".to_string())
        })?;
        let swap = self
            .swap_chains
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::InvalidHandle(format!("{id:?}")))?;
        swap.resize(&mut self.backend, cx, cy)?;
        log::debug!("Resized swap chain {:?} to {}x{}", id, cx, cy);
        Ok(())
    }

    // Drawing

    /// Record the loaded shaders' texture bindings and upload their parameters.
    ///
    /// Only parameters with an assigned texture touch the texture units, so a
    /// texture bound with [`load_texture`](Device::load_texture) stays bound
    /// when the shader leaves that unit unassigned. Both stages number their
    /// units from 0; assigning different textures to the same unit from the
    /// two stages fails with `CapabilityMismatch`.
    ///
    /// Called by the draw dispatcher before each draw. Returns the number of
    /// uniform uploads issued.
    pub fn prepare_draw(&mut self) -> GraphicsResult<usize> {
        let vertex = self.cur_vertex_shader.ok_or_else(|| {
            GraphicsError::InvalidParameter("no vertex shader loaded".to_string())
        })?;
        let pixel = self.cur_pixel_shader.ok_or_else(|| {
            GraphicsError::InvalidParameter("no pixel shader loaded".to_string())
        })?;

        let vertex_shader = Self::require(&self.shaders, vertex)?;
        let pixel_shader = Self::require(&self.shaders, pixel)?;
        let mut assigned = BoundSlots::<TextureId, MAX_TEXTURES>::new();
        for (unit, texture) in vertex_shader
            .texture_bindings()
            .chain(pixel_shader.texture_bindings())
        {
            let (unit, Some(texture)) = (unit as usize, texture) else {
                continue;
            };
            match assigned.get(unit)? {
                Some(other) if other != texture => {
                    return Err(GraphicsError::CapabilityMismatch(format!(
                        "texture unit {unit} assigned {other:?} and {texture:?}"
                    )));
                }
                _ => assigned.set(unit, Some(texture))?,
            }
        }
        for (unit, texture) in assigned.iter() {
            if texture.is_some() {
                self.cur_textures.set(unit, texture)?;
            }
        }

        let mut uploads = 0;
        for id in [vertex, pixel] {
            let shader = self
                .shaders
                .get_mut(&id)
                .ok_or_else(|| GraphicsError::InvalidHandle(format!("{id:?}")))?;
            uploads += shader.upload_dirty(&mut self.backend, &self.cur_view_proj, &self.cur_world);
        }
        Ok(uploads)
    }

    /// Copy level 0 of `src` into `dst` along the negotiated copy path.
    pub fn copy_texture(&mut self, dst: TextureId, src: TextureId) -> GraphicsResult<()> {
        let src_tex = Self::require(&self.textures, src)?;
        let dst_tex = Self::require(&self.textures, dst)?;
        let (TextureKind::Texture2d { width, height, .. }, TextureKind::Texture2d { .. }) =
            (*src_tex.kind(), *dst_tex.kind())
        else {
            return Err(GraphicsError::CapabilityMismatch(
                "only 2D textures can be copied".to_string(),
            ));
        };
        if src_tex.format() != dst_tex.format() || src_tex.size() != dst_tex.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "cannot copy {:?} {:?} into {:?} {:?}",
                src_tex.format(),
                src_tex.size(),
                dst_tex.format(),
                dst_tex.size()
            )));
        }

        let region = CopyRegion {
            src: src_tex.name(),
            src_target: gl::TEXTURE_2D,
            dst: dst_tex.name(),
            dst_target: gl::TEXTURE_2D,
            width,
            height,
        };
        copy_with(&mut self.backend, self.copy_type, &region)?;
        Ok(())
    }

    fn require<K, V>(table: &HashMap<K, V>, id: K) -> GraphicsResult<&V>
    where
        K: std::hash::Hash + Eq + Debug,
    {
        table
            .get(&id)
            .ok_or_else(|| GraphicsError::InvalidHandle(format!("{id:?}")))
    }
}

impl<B: GlBackend> Drop for Device<B> {
    fn drop(&mut self) {
        let backend = &mut self.backend;
        for (_, texture) in self.textures.drain() {
            texture.release(backend);
        }
        for (_, vb) in self.vertex_buffers.drain() {
            vb.release(backend);
        }
        for (_, ib) in self.index_buffers.drain() {
            ib.release(backend);
        }
        for (_, shader) in self.shaders.drain() {
            shader.release(backend);
        }
        for (_, stage) in self.stage_surfaces.drain() {
            stage.release(backend);
        }
        for (_, zs) in self.zstencils.drain() {
            zs.release(backend);
        }
        for (_, swap) in self.swap_chains.drain() {
            swap.release(backend);
        }
        self.samplers.clear();
        backend.destroy_platform_context(self.platform);
        log::info!("Destroyed device on {}", backend.name());
    }
}

impl<B: GlBackend> Debug for Device<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("backend", &self.backend.name())
            .field("copy_type", &self.copy_type)
            .field("resources", &self.resource_count())
            .field("render_target", &self.cur_render_texture)
            .field("cur_swap", &self.cur_swap)
            .finish()
    }
}
