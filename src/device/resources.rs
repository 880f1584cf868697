//! Resource creation, update and destruction.
//!
//! Destroying a resource unbinds it from every slot that still refers to it.

use std::sync::Arc;

use super::Device;
use crate::backend::{ColorFormat, GlBackend, InitData, SamplerInfo, ShaderType, ZStencilFormat};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{
    IndexBuffer, IndexBufferId, IndexData, SamplerId, SamplerState, Shader, ShaderId,
    StageSurface, StageSurfaceId, SwapChainId, Texture, TextureDescriptor, TextureId, VbData,
    VertexBuffer, VertexBufferId, ZStencilBuffer, ZStencilId,
};
use crate::swap_chain::SwapChain;

fn invalid_handle(id: impl std::fmt::Debug) -> GraphicsError {
    GraphicsError::InvalidHandle(format!("{id:?}"))
}

impl<B: GlBackend> Device<B> {
    // Creation

    /// Create a 2D or cube texture.
    ///
    /// `data` holds one image per face and level, face-major. With
    /// `BUILD_MIPMAPS` only level 0 of each face is supplied.
    pub fn create_texture(
        &mut self,
        desc: &TextureDescriptor,
        data: Option<&[&[u8]]>,
    ) -> GraphicsResult<TextureId> {
        let texture = Texture::create(&mut self.backend, desc, data)?;
        let id = TextureId(self.next_id());
        log::debug!(
            "Created texture {:?} {:?}: {:?} {:?}, {} levels",
            id,
            desc.label,
            desc.dimension,
            desc.format,
            texture.levels()
        );
        self.textures.insert(id, texture);
        Ok(id)
    }

    /// Create a vertex buffer. The caller may keep its own clone of `data`.
    pub fn create_vertex_buffer(
        &mut self,
        data: Arc<VbData>,
        dynamic: bool,
    ) -> GraphicsResult<VertexBufferId> {
        let vb = VertexBuffer::create(&mut self.backend, data, dynamic)?;
        let id = VertexBufferId(self.next_id());
        log::debug!(
            "Created vertex buffer {:?}: {} vertices, dynamic={}",
            id,
            vb.data().num_vertices(),
            dynamic
        );
        self.vertex_buffers.insert(id, vb);
        Ok(id)
    }

    pub fn create_index_buffer(
        &mut self,
        data: IndexData,
        dynamic: bool,
    ) -> GraphicsResult<IndexBufferId> {
        let ib = IndexBuffer::create(&mut self.backend, &data, dynamic)?;
        let id = IndexBufferId(self.next_id());
        log::debug!(
            "Created index buffer {:?}: {} indices, dynamic={}",
            id,
            ib.count(),
            dynamic
        );
        self.index_buffers.insert(id, ib);
        Ok(id)
    }

    /// Compile a shader and build its parameter table.
    pub fn create_shader(&mut self, source: &str, ty: ShaderType) -> GraphicsResult<ShaderId> {
        let shader = Shader::create(&mut self.backend, source, ty, self.config.max_anisotropy)?;
        let id = ShaderId(self.next_id());
        log::debug!(
            "Created {:?} shader {:?}: {} params",
            ty,
            id,
            shader.params().len()
        );
        self.shaders.insert(id, shader);
        Ok(id)
    }

    /// Resolve a sampler description. Anisotropy is clamped to the device limit.
    pub fn create_sampler(&mut self, info: &SamplerInfo) -> GraphicsResult<SamplerId> {
        let state = SamplerState::new(info, self.config.max_anisotropy);
        let id = SamplerId(self.next_id());
        log::debug!("Created sampler {:?}: {:?}", id, state.info);
        self.samplers.insert(id, state);
        Ok(id)
    }

    pub fn create_stage_surface(
        &mut self,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> GraphicsResult<StageSurfaceId> {
        let stage = StageSurface::create(&mut self.backend, width, height, format)?;
        let id = StageSurfaceId(self.next_id());
        log::debug!(
            "Created stage surface {:?}: {}x{} {:?}",
            id,
            width,
            height,
            format
        );
        self.stage_surfaces.insert(id, stage);
        Ok(id)
    }

    pub fn create_zstencil(
        &mut self,
        width: u32,
        height: u32,
        format: ZStencilFormat,
    ) -> GraphicsResult<ZStencilId> {
        let zs = ZStencilBuffer::create(&mut self.backend, width, height, format)?;
        let id = ZStencilId(self.next_id());
        log::debug!(
            "Created depth/stencil buffer {:?}: {}x{} {:?}",
            id,
            width,
            height,
            format
        );
        self.zstencils.insert(id, zs);
        Ok(id)
    }

    /// Create an additional swap chain. It is not loaded.
    pub fn create_swap_chain(&mut self, info: &InitData) -> GraphicsResult<SwapChainId> {
        let swap = SwapChain::create(&mut self.backend, info)?;
        let id = SwapChainId(self.next_id());
        self.swap_chains.insert(id, swap);
        Ok(id)
    }

    // Update

    /// Re-upload level 0 of a dynamic 2D texture.
    pub fn update_texture(&mut self, id: TextureId, data: &[u8]) -> GraphicsResult<()> {
        let texture = self.textures.get_mut(&id).ok_or_else(|| invalid_handle(id))?;
        texture.update(&mut self.backend, data)?;
        log::trace!("Updated texture {:?}", id);
        Ok(())
    }

    /// Overwrite a dynamic vertex buffer with data of the same layout.
    pub fn update_vertex_buffer(
        &mut self,
        id: VertexBufferId,
        data: Arc<VbData>,
    ) -> GraphicsResult<()> {
        let vb = self
            .vertex_buffers
            .get_mut(&id)
            .ok_or_else(|| invalid_handle(id))?;
        vb.update(&mut self.backend, data)?;
        log::trace!("Updated vertex buffer {:?}", id);
        Ok(())
    }

    /// Overwrite a dynamic index buffer with indices of the same type and count.
    pub fn update_index_buffer(
        &mut self,
        id: IndexBufferId,
        data: &IndexData,
    ) -> GraphicsResult<()> {
        let ib = self
            .index_buffers
            .get_mut(&id)
            .ok_or_else(|| invalid_handle(id))?;
        ib.update(&mut self.backend, data)?;
        log::trace!("Updated index buffer {:?}", id);
        Ok(())
    }

    // Stage surfaces

    /// Copy a 2D texture into a stage surface for readback.
    pub fn stage_texture(
        &mut self,
        stage: StageSurfaceId,
        src: TextureId,
    ) -> GraphicsResult<()> {
        let texture = self.textures.get(&src).ok_or_else(|| invalid_handle(src))?;
        let surface = self
            .stage_surfaces
            .get_mut(&stage)
            .ok_or_else(|| invalid_handle(stage))?;
        surface.stage(&mut self.backend, self.copy_type, texture)
    }

    /// Map the staged pixels. Returns the data and its row pitch.
    ///
    /// May stall until the GPU has finished the transfer.
    pub fn map_stage_surface(&mut self, stage: StageSurfaceId) -> GraphicsResult<(&[u8], usize)> {
        let surface = self
            .stage_surfaces
            .get_mut(&stage)
            .ok_or_else(|| invalid_handle(stage))?;
        surface.map(&mut self.backend)
    }

    pub fn unmap_stage_surface(&mut self, stage: StageSurfaceId) -> GraphicsResult<()> {
        self.stage_surfaces
            .get_mut(&stage)
            .ok_or_else(|| invalid_handle(stage))?
            .unmap()
    }

    // Destruction

    pub fn destroy_texture(&mut self, id: TextureId) -> GraphicsResult<()> {
        let texture = self.textures.remove(&id).ok_or_else(|| invalid_handle(id))?;
        texture.release(&mut self.backend);

        let unbound = self.cur_textures.clear_matching(id);
        if self.cur_render_texture == Some(id) {
            self.cur_render_texture = None;
            self.cur_render_side = 0;
        }
        for shader in self.shaders.values_mut() {
            shader.clear_texture(id);
        }
        log::debug!("Destroyed texture {:?} (unbound from {} units)", id, unbound);
        Ok(())
    }

    pub fn destroy_vertex_buffer(&mut self, id: VertexBufferId) -> GraphicsResult<()> {
        let vb = self
            .vertex_buffers
            .remove(&id)
            .ok_or_else(|| invalid_handle(id))?;
        vb.release(&mut self.backend);
        if self.cur_vertex_buffer == Some(id) {
            self.cur_vertex_buffer = None;
        }
        log::debug!("Destroyed vertex buffer {:?}", id);
        Ok(())
    }

    pub fn destroy_index_buffer(&mut self, id: IndexBufferId) -> GraphicsResult<()> {
        let ib = self
            .index_buffers
            .remove(&id)
            .ok_or_else(|| invalid_handle(id))?;
        ib.release(&mut self.backend);
        if self.cur_index_buffer == Some(id) {
            self.cur_index_buffer = None;
        }
        log::debug!("Destroyed index buffer {:?}", id);
        Ok(())
    }

    pub fn destroy_shader(&mut self, id: ShaderId) -> GraphicsResult<()> {
        let shader = self.shaders.remove(&id).ok_or_else(|| invalid_handle(id))?;
        shader.release(&mut self.backend);
        if self.cur_vertex_shader == Some(id) {
            self.cur_vertex_shader = None;
        }
        if self.cur_pixel_shader == Some(id) {
            self.cur_pixel_shader = None;
        }
        log::debug!("Destroyed shader {:?}", id);
        Ok(())
    }

    pub fn destroy_sampler(&mut self, id: SamplerId) -> GraphicsResult<()> {
        self.samplers.remove(&id).ok_or_else(|| invalid_handle(id))?;
        self.cur_samplers.clear_matching(id);
        log::debug!("Destroyed sampler {:?}", id);
        Ok(())
    }

    pub fn destroy_stage_surface(&mut self, id: StageSurfaceId) -> GraphicsResult<()> {
        let stage = self
            .stage_surfaces
            .remove(&id)
            .ok_or_else(|| invalid_handle(id))?;
        stage.release(&mut self.backend);
        log::debug!("Destroyed stage surface {:?}", id);
        Ok(())
    }

    pub fn destroy_zstencil(&mut self, id: ZStencilId) -> GraphicsResult<()> {
        let zs = self.zstencils.remove(&id).ok_or_else(|| invalid_handle(id))?;
        zs.release(&mut self.backend);
        if self.cur_zstencil == Some(id) {
            self.cur_zstencil = None;
        }
        log::debug!("Destroyed depth/stencil buffer {:?}", id);
        Ok(())
    }

    pub fn destroy_swap_chain(&mut self, id: SwapChainId) -> GraphicsResult<()> {
        let swap = self
            .swap_chains
            .remove(&id)
            .ok_or_else(|| invalid_handle(id))?;
        swap.release(&mut self.backend);
        if self.cur_swap == Some(id) {
            self.cur_swap = None;
        }
        log::debug!("Destroyed swap chain {:?}", id);
        Ok(())
    }
}
