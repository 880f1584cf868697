//! Shaders and parameter binding
//!
//! Every parameter keeps its last-set value next to its declared default and a
//! dirty flag. [`Shader::upload_dirty`] pushes only dirty values, except for the
//! implicit `viewproj` and `world` matrices which are refreshed on every call.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::backend::conversion::convert_shader_type;
use crate::backend::gl::GLint;
use crate::backend::{CompiledProgram, GlBackend, GlName, ParamDecl, ShaderParamType, ShaderType};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{SamplerState, TextureId};
use crate::MAX_TEXTURES;

/// Selects a shader parameter by position or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ParamRef<'_> {
    fn from(index: usize) -> Self {
        ParamRef::Index(index)
    }
}

impl<'a> From<&'a str> for ParamRef<'a> {
    fn from(name: &'a str) -> Self {
        ParamRef::Name(name)
    }
}

/// One uniform declared by a shader
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParam {
    name: String,
    ty: ShaderParamType,
    location: GLint,
    texture_unit: Option<u32>,
    sampler: Option<usize>,
    array_count: u32,
    texture: Option<TextureId>,
    cur_value: Vec<u8>,
    def_value: Vec<u8>,
    changed: bool,
}

impl ShaderParam {
    fn from_decl(
        decl: ParamDecl,
        texture_unit: Option<u32>,
        sampler: Option<usize>,
    ) -> GraphicsResult<Self> {
        let size = decl.ty.size() * decl.array_count as usize;
        let def_value = match (texture_unit, decl.default_value.is_empty()) {
            // Texture parameters upload their unit
            (Some(unit), _) => (unit as i32).to_le_bytes().to_vec(),
            (None, true) => vec![0; size],
            (None, false) if decl.default_value.len() == size => decl.default_value,
            (None, false) => {
                return Err(GraphicsError::SizeMismatch {
                    what: format!("default value of '{}'", decl.name),
                    expected: size,
                    actual: decl.default_value.len(),
                })
            }
        };

        Ok(Self {
            name: decl.name,
            ty: decl.ty,
            location: decl.location,
            texture_unit,
            sampler,
            array_count: decl.array_count,
            texture: None,
            cur_value: def_value.clone(),
            def_value,
            changed: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ShaderParamType {
        self.ty
    }

    /// Native uniform location.
    pub fn location(&self) -> GLint {
        self.location
    }

    /// Texture unit assigned to a texture parameter.
    pub fn texture_unit(&self) -> Option<u32> {
        self.texture_unit
    }

    /// Index of the declared sampler used by a texture parameter.
    pub fn sampler(&self) -> Option<usize> {
        self.sampler
    }

    pub fn array_count(&self) -> u32 {
        self.array_count
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn value(&self) -> &[u8] {
        &self.cur_value
    }

    pub fn default_value(&self) -> &[u8] {
        &self.def_value
    }

    pub fn is_dirty(&self) -> bool {
        self.changed
    }

    /// Expected value size in bytes.
    pub fn size(&self) -> usize {
        self.ty.size() * self.array_count as usize
    }
}

/// A compiled shader program with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    program: GlName,
    ty: ShaderType,
    samplers: Vec<SamplerState>,
    params: Vec<ShaderParam>,
    viewproj: Option<usize>,
    world: Option<usize>,
}

impl Shader {
    /// Compile `source` and build the parameter table.
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        source: &str,
        ty: ShaderType,
        max_anisotropy: u32,
    ) -> GraphicsResult<Self> {
        let compiled = backend.compile_program(source, convert_shader_type(ty))?;
        let program = compiled.program;
        Self::from_compiled(compiled, ty, max_anisotropy).inspect_err(|err| {
            log::warn!("Discarding program {:?}: {err}", program);
            backend.delete_program(program);
        })
    }

    fn from_compiled(
        compiled: CompiledProgram,
        ty: ShaderType,
        max_anisotropy: u32,
    ) -> GraphicsResult<Self> {
        let samplers: Vec<SamplerState> = compiled
            .samplers
            .iter()
            .map(|info| SamplerState::new(info, max_anisotropy))
            .collect();

        let mut params = Vec::with_capacity(compiled.params.len());
        let mut next_unit = 0u32;
        for decl in compiled.params {
            let (texture_unit, sampler) = if decl.ty == ShaderParamType::Texture {
                if next_unit as usize >= MAX_TEXTURES {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "shader declares more than {MAX_TEXTURES} textures"
                    )));
                }
                let unit = next_unit;
                next_unit += 1;
                let sampler = ((unit as usize) < samplers.len()).then_some(unit as usize);
                (Some(unit), sampler)
            } else {
                (None, None)
            };
            params.push(ShaderParam::from_decl(decl, texture_unit, sampler)?);
        }

        let viewproj = Self::find_matrix(&params, "viewproj")?;
        let world = Self::find_matrix(&params, "world")?;

        Ok(Self {
            program: compiled.program,
            ty,
            samplers,
            params,
            viewproj,
            world,
        })
    }

    fn find_matrix(params: &[ShaderParam], name: &str) -> GraphicsResult<Option<usize>> {
        let Some(index) = params
            .iter()
            .position(|param| param.name.eq_ignore_ascii_case(name))
        else {
            return Ok(None);
        };
        let param = &params[index];
        if param.ty != ShaderParamType::Matrix4x4 || param.array_count != 1 {
            return Err(GraphicsError::InvalidParameter(format!(
                "'{}' must be a single 4x4 matrix",
                param.name
            )));
        }
        Ok(Some(index))
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        backend.delete_program(self.program);
    }

    fn resolve(&self, param: ParamRef<'_>) -> GraphicsResult<usize> {
        match param {
            ParamRef::Index(index) if index < self.params.len() => Ok(index),
            ParamRef::Index(index) => Err(GraphicsError::InvalidParameter(format!(
                "parameter index {index} out of range ({} params)",
                self.params.len()
            ))),
            ParamRef::Name(name) => self
                .params
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| GraphicsError::InvalidParameter(format!("no parameter '{name}'"))),
        }
    }

    /// Look up a parameter index by name or index.
    pub fn param_index<'a>(&self, param: impl Into<ParamRef<'a>>) -> GraphicsResult<usize> {
        self.resolve(param.into())
    }

    /// Write a parameter's current value and mark it dirty.
    pub fn set_param<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: &[u8],
    ) -> GraphicsResult<()> {
        let index = self.resolve(param.into())?;
        let param = &mut self.params[index];
        if param.ty == ShaderParamType::Texture {
            return Err(GraphicsError::InvalidParameter(format!(
                "'{}' is a texture parameter",
                param.name
            )));
        }
        if value.len() != param.size() {
            return Err(GraphicsError::SizeMismatch {
                what: format!("param '{}'", param.name),
                expected: param.size(),
                actual: value.len(),
            });
        }
        param.cur_value.copy_from_slice(value);
        param.changed = true;
        log::trace!("Shader {:?}: set '{}'", self.program, param.name);
        Ok(())
    }

    pub fn set_bool<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: bool,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&(value as i32)))
    }

    pub fn set_float<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: f32,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&value))
    }

    pub fn set_int<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: i32,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&value))
    }

    pub fn set_vec2<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: Vec2,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&value))
    }

    pub fn set_vec3<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: Vec3,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&value))
    }

    pub fn set_vec4<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: Vec4,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(&value))
    }

    pub fn set_matrix4<'a>(
        &mut self,
        param: impl Into<ParamRef<'a>>,
        value: &Mat4,
    ) -> GraphicsResult<()> {
        self.set_param(param, bytemuck::bytes_of(value))
    }

    /// Point a texture parameter at a texture. The device checks the id.
    pub(crate) fn set_texture(
        &mut self,
        param: ParamRef<'_>,
        texture: Option<TextureId>,
    ) -> GraphicsResult<()> {
        let index = self.resolve(param)?;
        let param = &mut self.params[index];
        if param.ty != ShaderParamType::Texture {
            return Err(GraphicsError::InvalidParameter(format!(
                "'{}' is not a texture parameter",
                param.name
            )));
        }
        param.texture = texture;
        param.changed = true;
        Ok(())
    }

    /// Forget every reference to a destroyed texture.
    pub(crate) fn clear_texture(&mut self, texture: TextureId) {
        for param in &mut self.params {
            if param.texture == Some(texture) {
                param.texture = None;
            }
        }
    }

    /// Push every dirty value plus the implicit matrices. Returns the upload count.
    pub(crate) fn upload_dirty<B: GlBackend>(
        &mut self,
        backend: &mut B,
        viewproj: &Mat4,
        world: &Mat4,
    ) -> usize {
        for (index, matrix) in [(self.viewproj, viewproj), (self.world, world)] {
            if let Some(param) = index.map(|index| &mut self.params[index]) {
                param.cur_value.copy_from_slice(bytemuck::bytes_of(matrix));
                param.changed = true;
            }
        }

        let mut uploads = 0;
        for param in self.params.iter_mut().filter(|param| param.changed) {
            let (ty, count) = match param.ty {
                ShaderParamType::Texture => (ShaderParamType::Int, 1),
                ty => (ty, param.array_count),
            };
            backend.set_uniform(self.program, param.location, ty, count, &param.cur_value);
            param.changed = false;
            uploads += 1;
        }
        log::trace!("Shader {:?}: uploaded {} params", self.program, uploads);
        uploads
    }

    /// Restore every declared default and mark it dirty.
    pub(crate) fn reset_to_default(&mut self) {
        for param in &mut self.params {
            param.cur_value.copy_from_slice(&param.def_value);
            param.texture = None;
            param.changed = true;
        }
    }

    pub fn program(&self) -> GlName {
        self.program
    }

    pub fn shader_type(&self) -> ShaderType {
        self.ty
    }

    pub fn samplers(&self) -> &[SamplerState] {
        &self.samplers
    }

    pub fn params(&self) -> &[ShaderParam] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&ShaderParam> {
        self.params.get(index)
    }

    pub fn param_by_name(&self, name: &str) -> Option<&ShaderParam> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn viewproj(&self) -> Option<&ShaderParam> {
        self.viewproj.map(|index| &self.params[index])
    }

    pub fn world(&self) -> Option<&ShaderParam> {
        self.world.map(|index| &self.params[index])
    }

    /// `(unit, texture)` for every texture parameter.
    pub fn texture_bindings(&self) -> impl Iterator<Item = (u32, Option<TextureId>)> + '_ {
        self.params
            .iter()
            .filter_map(|param| param.texture_unit.map(|unit| (unit, param.texture)))
    }
}
