//! Shader binding and parameter operations.

use super::Device;
use crate::backend::{GlBackend, ShaderType};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{ParamRef, Shader, ShaderId, TextureId};

impl<B: GlBackend> Device<B> {
    fn shader_entry(&mut self, id: ShaderId) -> GraphicsResult<&mut Shader> {
        self.shaders
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::InvalidHandle(format!("{id:?}")))
    }

    fn check_stage(&self, shader: Option<ShaderId>, stage: ShaderType) -> GraphicsResult<()> {
        let Some(id) = shader else {
            return Ok(());
        };
        let shader = Self::require(&self.shaders, id)?;
        if shader.shader_type() != stage {
            return Err(GraphicsError::CapabilityMismatch(format!(
                "{id:?} is a {:?} shader, expected {:?}",
                shader.shader_type(),
                stage
            )));
        }
        Ok(())
    }

    /// Select the vertex shader for the next draw.
    ///
    /// Parameters keep their values; call [`reset_shader_params`] to start from
    /// the declared defaults.
    ///
    /// [`reset_shader_params`]: Device::reset_shader_params
    pub fn load_vertex_shader(&mut self, shader: Option<ShaderId>) -> GraphicsResult<()> {
        self.check_stage(shader, ShaderType::Vertex)?;
        self.cur_vertex_shader = shader;
        log::trace!("Loaded vertex shader {:?}", shader);
        Ok(())
    }

    /// Select the pixel shader for the next draw.
    pub fn load_pixel_shader(&mut self, shader: Option<ShaderId>) -> GraphicsResult<()> {
        self.check_stage(shader, ShaderType::Pixel)?;
        self.cur_pixel_shader = shader;
        log::trace!("Loaded pixel shader {:?}", shader);
        Ok(())
    }

    /// Mutable access for the typed setters on [`Shader`].
    pub fn shader_mut(&mut self, id: ShaderId) -> GraphicsResult<&mut Shader> {
        self.shader_entry(id)
    }

    /// Write a parameter's raw value and mark it dirty.
    pub fn set_shader_param<'a>(
        &mut self,
        shader: ShaderId,
        param: impl Into<ParamRef<'a>>,
        value: &[u8],
    ) -> GraphicsResult<()> {
        self.shader_entry(shader)?.set_param(param, value)
    }

    /// Point a texture parameter at a texture, or clear it.
    pub fn set_shader_texture<'a>(
        &mut self,
        shader: ShaderId,
        param: impl Into<ParamRef<'a>>,
        texture: Option<TextureId>,
    ) -> GraphicsResult<()> {
        if let Some(id) = texture {
            Self::require(&self.textures, id)?;
        }
        self.shader_entry(shader)?.set_texture(param.into(), texture)
    }

    /// Push dirty parameters and the implicit matrices to the GPU.
    ///
    /// Returns the number of uniform uploads issued.
    pub fn upload_shader_params(&mut self, shader: ShaderId) -> GraphicsResult<usize> {
        let entry = self
            .shaders
            .get_mut(&shader)
            .ok_or_else(|| GraphicsError::InvalidHandle(format!("{shader:?}")))?;
        Ok(entry.upload_dirty(&mut self.backend, &self.cur_view_proj, &self.cur_world))
    }

    /// Restore every parameter to its declared default.
    pub fn reset_shader_params(&mut self, shader: ShaderId) -> GraphicsResult<()> {
        self.shader_entry(shader)?.reset_to_default();
        log::trace!("Reset params of shader {:?}", shader);
        Ok(())
    }
}
