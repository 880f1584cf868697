//! Dummy native backend for testing and headless use.
//!
//! This backend performs no GPU work. It keeps every native object in memory so
//! that image contents, buffer contents and uniform uploads can be inspected.
//! It can also simulate driver limits: missing extensions, rejected internal
//! formats and a cap on live buffers.

use std::collections::{HashMap, HashSet};

use crate::backend::gl::{self, GLenum, GLint};
use crate::backend::traits::*;
use crate::backend::types::*;

#[derive(Debug, Clone)]
struct DummyImage {
    internal_format: GLenum,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct DummyTexture {
    target: GLenum,
    images: HashMap<(GLenum, u32), DummyImage>,
    mipmaps_generated: u32,
}

#[derive(Debug, Clone)]
struct DummyBuffer {
    usage: GLenum,
    data: Vec<u8>,
}

/// Dummy native backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_name: u32,
    next_handle: u64,

    contexts: HashSet<PlatformHandle>,
    windows: HashMap<WindowHandle, (u32, u32)>,
    presents: usize,
    extensions: HashSet<String>,

    programs: HashSet<GlName>,
    uniforms: HashMap<(GlName, GLint), Vec<u8>>,
    upload_log: Vec<(GlName, GLint)>,

    textures: HashMap<GlName, DummyTexture>,
    buffers: HashMap<GlName, DummyBuffer>,
    renderbuffers: HashMap<GlName, (GLenum, u32, u32)>,
    copies: Vec<CopyType>,

    rejected_formats: HashSet<GLenum>,
    buffer_limit: Option<usize>,
}

impl DummyBackend {
    /// Create a new dummy backend with no extensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise driver extensions.
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions
            .extend(extensions.iter().map(|ext| ext.to_string()));
        self
    }

    /// Make the driver reject an internal format at allocation time.
    pub fn reject_internal_format(mut self, format: GLenum) -> Self {
        self.rejected_formats.insert(format);
        self
    }

    /// Fail buffer generation once `limit` buffers are alive.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn live_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_renderbuffers(&self) -> usize {
        self.renderbuffers.len()
    }

    /// Total number of live native objects, contexts and windows included.
    pub fn live_object_count(&self) -> usize {
        self.live_contexts()
            + self.live_windows()
            + self.live_programs()
            + self.live_textures()
            + self.live_buffers()
            + self.live_renderbuffers()
    }

    /// Last value uploaded to a program location.
    pub fn uniform(&self, program: GlName, location: GLint) -> Option<&[u8]> {
        self.uniforms
            .get(&(program, location))
            .map(|value| value.as_slice())
    }

    /// Every uniform upload in order.
    pub fn upload_log(&self) -> &[(GlName, GLint)] {
        &self.upload_log
    }

    pub fn upload_count(&self) -> usize {
        self.upload_log.len()
    }

    pub fn clear_upload_log(&mut self) {
        self.upload_log.clear();
    }

    /// Copy paths taken, in order.
    pub fn copies(&self) -> &[CopyType] {
        &self.copies
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn window_size(&self, window: WindowHandle) -> Option<(u32, u32)> {
        self.windows.get(&window).copied()
    }

    /// Contents of one image level of a texture.
    pub fn texture_image(&self, texture: GlName, target: GLenum, level: u32) -> Option<&[u8]> {
        self.textures
            .get(&texture)
            .and_then(|tex| tex.images.get(&(target, level)))
            .map(|image| image.data.as_slice())
    }

    /// Internal format and size of one image level.
    pub fn texture_level_info(
        &self,
        texture: GlName,
        target: GLenum,
        level: u32,
    ) -> Option<(GLenum, u32, u32)> {
        self.textures
            .get(&texture)
            .and_then(|tex| tex.images.get(&(target, level)))
            .map(|image| (image.internal_format, image.width, image.height))
    }

    /// Number of times mipmaps were generated for a texture.
    pub fn mipmap_generations(&self, texture: GlName) -> u32 {
        self.textures
            .get(&texture)
            .map_or(0, |tex| tex.mipmaps_generated)
    }

    pub fn buffer_contents(&self, buffer: GlName) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|buf| buf.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: GlName) -> Option<GLenum> {
        self.buffers.get(&buffer).map(|buf| buf.usage)
    }

    fn alloc_name(&mut self) -> GlName {
        self.next_name += 1;
        GlName(self.next_name)
    }

    fn alloc_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn copy_region(&mut self, kind: CopyType, region: &CopyRegion) -> BackendResult<()> {
        let data = self
            .textures
            .get(&region.src)
            .and_then(|tex| tex.images.get(&(region.src_target, 0)))
            .map(|image| image.data.clone())
            .ok_or_else(|| {
                BackendError::TextureCreationFailed(format!(
                    "copy source {:?} has no level 0",
                    region.src
                ))
            })?;
        let image = self
            .textures
            .get_mut(&region.dst)
            .and_then(|tex| tex.images.get_mut(&(region.dst_target, 0)))
            .ok_or_else(|| {
                BackendError::TextureCreationFailed(format!(
                    "copy destination {:?} has no level 0",
                    region.dst
                ))
            })?;
        image.data = data;
        self.copies.push(kind);
        log::trace!(
            "DummyBackend: {:?} copy {:?} -> {:?} ({}x{})",
            kind,
            region.src,
            region.dst,
            region.width,
            region.height
        );
        Ok(())
    }
}

impl GlBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_platform_context(&mut self, info: &InitData) -> BackendResult<PlatformHandle> {
        let handle = PlatformHandle(self.alloc_handle());
        self.contexts.insert(handle);
        log::trace!(
            "DummyBackend: created platform context {:?} on adapter {}",
            handle,
            info.adapter
        );
        Ok(handle)
    }

    fn destroy_platform_context(&mut self, platform: PlatformHandle) {
        self.contexts.remove(&platform);
    }

    fn create_window_surface(&mut self, info: &InitData) -> BackendResult<WindowHandle> {
        if info.cx == 0 || info.cy == 0 {
            return Err(BackendError::SurfaceCreationFailed(format!(
                "invalid surface size {}x{}",
                info.cx, info.cy
            )));
        }
        let handle = WindowHandle(self.alloc_handle());
        self.windows.insert(handle, (info.cx, info.cy));
        log::trace!("DummyBackend: created window surface {:?}", handle);
        Ok(handle)
    }

    fn destroy_window_surface(&mut self, window: WindowHandle) {
        self.windows.remove(&window);
    }

    fn resize_window_surface(&mut self, window: WindowHandle, cx: u32, cy: u32) {
        if let Some(size) = self.windows.get_mut(&window) {
            *size = (cx, cy);
        }
    }

    fn present(&mut self, window: WindowHandle) -> BackendResult<()> {
        if !self.windows.contains_key(&window) {
            return Err(BackendError::DeviceLost);
        }
        self.presents += 1;
        Ok(())
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    fn compile_program(&mut self, source: &str, stage: GLenum) -> BackendResult<CompiledProgram> {
        let (params, samplers) = parse_uniforms(source)?;
        let program = self.alloc_name();
        self.programs.insert(program);
        log::trace!(
            "DummyBackend: linked program {:?} (stage {:#x}, {} params)",
            program,
            stage,
            params.len()
        );
        Ok(CompiledProgram {
            program,
            params,
            samplers,
        })
    }

    fn delete_program(&mut self, program: GlName) {
        self.programs.remove(&program);
        self.uniforms.retain(|(owner, _), _| *owner != program);
    }

    fn set_uniform(
        &mut self,
        program: GlName,
        location: GLint,
        ty: ShaderParamType,
        count: u32,
        data: &[u8],
    ) {
        log::trace!(
            "DummyBackend: uniform {:?}@{} {:?}[{}] ({} bytes)",
            program,
            location,
            ty,
            count,
            data.len()
        );
        self.uniforms.insert((program, location), data.to_vec());
        self.upload_log.push((program, location));
    }

    fn gen_texture(&mut self, target: GLenum) -> BackendResult<GlName> {
        let name = self.alloc_name();
        self.textures.insert(
            name,
            DummyTexture {
                target,
                images: HashMap::new(),
                mipmaps_generated: 0,
            },
        );
        Ok(name)
    }

    fn tex_image_2d(&mut self, texture: GlName, image: &TexImage<'_>) -> BackendResult<()> {
        if self.rejected_formats.contains(&image.internal_format) {
            return Err(BackendError::TextureCreationFailed(format!(
                "internal format {:#x} not supported by driver",
                image.internal_format
            )));
        }
        let tex = self.textures.get_mut(&texture).ok_or_else(|| {
            BackendError::TextureCreationFailed(format!("unknown texture {texture:?}"))
        })?;
        log::trace!(
            "DummyBackend: tex_image_2d {:?} target={:#x} level={} {}x{} (texture target {:#x})",
            texture,
            image.target,
            image.level,
            image.width,
            image.height,
            tex.target
        );
        tex.images.insert(
            (image.target, image.level),
            DummyImage {
                internal_format: image.internal_format,
                width: image.width,
                height: image.height,
                data: image.data.map(|data| data.to_vec()).unwrap_or_default(),
            },
        );
        Ok(())
    }

    fn tex_sub_image_2d_from_buffer(
        &mut self,
        texture: GlName,
        image: &TexImage<'_>,
        unpack_buffer: GlName,
    ) -> BackendResult<()> {
        let data = self
            .buffers
            .get(&unpack_buffer)
            .map(|buf| buf.data.clone())
            .ok_or_else(|| {
                BackendError::TextureCreationFailed(format!(
                    "unknown unpack buffer {unpack_buffer:?}"
                ))
            })?;
        let level = self
            .textures
            .get_mut(&texture)
            .and_then(|tex| tex.images.get_mut(&(image.target, image.level)))
            .ok_or_else(|| {
                BackendError::TextureCreationFailed(format!(
                    "texture {texture:?} level {} not specified",
                    image.level
                ))
            })?;
        level.data = data;
        Ok(())
    }

    fn generate_mipmap(&mut self, _target: GLenum, texture: GlName) {
        if let Some(tex) = self.textures.get_mut(&texture) {
            tex.mipmaps_generated += 1;
        }
    }

    fn delete_texture(&mut self, texture: GlName) {
        self.textures.remove(&texture);
    }

    fn copy_image_sub_data(&mut self, region: &CopyRegion) -> BackendResult<()> {
        self.copy_region(CopyType::Arb, region)
    }

    fn copy_image_sub_data_nv(&mut self, region: &CopyRegion) -> BackendResult<()> {
        self.copy_region(CopyType::Nv, region)
    }

    fn blit_framebuffer(&mut self, region: &CopyRegion) -> BackendResult<()> {
        self.copy_region(CopyType::FboBlit, region)
    }

    fn get_tex_image_to_buffer(
        &mut self,
        texture: GlName,
        target: GLenum,
        _format: GLenum,
        _ty: GLenum,
        pack_buffer: GlName,
    ) -> BackendResult<()> {
        let data = self
            .textures
            .get(&texture)
            .and_then(|tex| tex.images.get(&(target, 0)))
            .map(|image| image.data.clone())
            .ok_or_else(|| {
                BackendError::ReadbackFailed(format!("texture {texture:?} has no level 0"))
            })?;
        let buffer = self.buffers.get_mut(&pack_buffer).ok_or_else(|| {
            BackendError::ReadbackFailed(format!("unknown pack buffer {pack_buffer:?}"))
        })?;
        buffer.data = data;
        Ok(())
    }

    fn gen_buffer(&mut self) -> BackendResult<GlName> {
        if let Some(limit) = self.buffer_limit {
            if self.buffers.len() >= limit {
                return Err(BackendError::OutOfMemory);
            }
        }
        let name = self.alloc_name();
        self.buffers.insert(
            name,
            DummyBuffer {
                usage: gl::STATIC_DRAW,
                data: Vec::new(),
            },
        );
        Ok(name)
    }

    fn buffer_data(
        &mut self,
        target: GLenum,
        buffer: GlName,
        data: &[u8],
        usage: GLenum,
    ) -> BackendResult<()> {
        let buf = self.buffers.get_mut(&buffer).ok_or_else(|| {
            BackendError::BufferCreationFailed(format!("unknown buffer {buffer:?}"))
        })?;
        log::trace!(
            "DummyBackend: buffer_data {:?} target={:#x} len={}",
            buffer,
            target,
            data.len()
        );
        buf.data = data.to_vec();
        buf.usage = usage;
        Ok(())
    }

    fn buffer_sub_data(
        &mut self,
        _target: GLenum,
        buffer: GlName,
        offset: usize,
        data: &[u8],
    ) -> BackendResult<()> {
        let buf = self.buffers.get_mut(&buffer).ok_or_else(|| {
            BackendError::BufferCreationFailed(format!("unknown buffer {buffer:?}"))
        })?;
        let end = offset + data.len();
        if end > buf.data.len() {
            return Err(BackendError::BufferCreationFailed(format!(
                "write of {} bytes at {} exceeds buffer size {}",
                data.len(),
                offset,
                buf.data.len()
            )));
        }
        buf.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&mut self, _target: GLenum, buffer: GlName) -> BackendResult<Vec<u8>> {
        self.buffers
            .get(&buffer)
            .map(|buf| buf.data.clone())
            .ok_or_else(|| BackendError::ReadbackFailed(format!("unknown buffer {buffer:?}")))
    }

    fn delete_buffer(&mut self, buffer: GlName) {
        self.buffers.remove(&buffer);
    }

    fn gen_renderbuffer(&mut self) -> BackendResult<GlName> {
        let name = self.alloc_name();
        self.renderbuffers.insert(name, (gl::INVALID, 0, 0));
        Ok(name)
    }

    fn renderbuffer_storage(
        &mut self,
        renderbuffer: GlName,
        internal_format: GLenum,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        if self.rejected_formats.contains(&internal_format) {
            return Err(BackendError::RenderbufferCreationFailed(format!(
                "depth format {internal_format:#x} not supported by driver"
            )));
        }
        let storage = self.renderbuffers.get_mut(&renderbuffer).ok_or_else(|| {
            BackendError::RenderbufferCreationFailed(format!(
                "unknown renderbuffer {renderbuffer:?}"
            ))
        })?;
        *storage = (internal_format, width, height);
        Ok(())
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GlName) {
        self.renderbuffers.remove(&renderbuffer);
    }
}

/// Parse `uniform <type> <name>[N] = v0, v1, ...;` declarations.
///
/// Locations are assigned in declaration order. Texture uniforms also declare a
/// default sampler.
fn parse_uniforms(source: &str) -> BackendResult<(Vec<ParamDecl>, Vec<SamplerInfo>)> {
    if source.trim().is_empty() {
        return Err(BackendError::ShaderCreationFailed(
            "empty shader source".to_string(),
        ));
    }

    let mut params = Vec::new();
    let mut samplers = Vec::new();

    for line in source.lines() {
        let Some(decl) = line.trim().strip_prefix("uniform ") else {
            continue;
        };
        let decl = decl.trim_end().trim_end_matches(';');
        let (decl, default) = match decl.split_once('=') {
            Some((decl, default)) => (decl.trim(), Some(default.trim())),
            None => (decl.trim(), None),
        };

        let mut parts = decl.split_whitespace();
        let (Some(type_name), Some(name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(BackendError::ShaderCreationFailed(format!(
                "malformed uniform declaration: {line}"
            )));
        };

        let ty = match type_name {
            "bool" => ShaderParamType::Bool,
            "float" => ShaderParamType::Float,
            "int" => ShaderParamType::Int,
            "vec2" => ShaderParamType::Vec2,
            "vec3" => ShaderParamType::Vec3,
            "vec4" => ShaderParamType::Vec4,
            "ivec2" => ShaderParamType::Int2,
            "ivec3" => ShaderParamType::Int3,
            "ivec4" => ShaderParamType::Int4,
            "mat4" => ShaderParamType::Matrix4x4,
            "sampler2D" | "samplerCube" => ShaderParamType::Texture,
            other => {
                return Err(BackendError::ShaderCreationFailed(format!(
                    "unsupported uniform type '{other}'"
                )))
            }
        };

        let (name, array_count) = match name.split_once('[') {
            Some((name, count)) => {
                let count = count
                    .trim_end_matches(']')
                    .parse::<u32>()
                    .ok()
                    .filter(|count| *count > 0)
                    .ok_or_else(|| {
                        BackendError::ShaderCreationFailed(format!(
                            "invalid array size in: {line}"
                        ))
                    })?;
                (name, count)
            }
            None => (name, 1),
        };

        let size = ty.size() * array_count as usize;
        let default_value = match default {
            Some(values) if ty != ShaderParamType::Texture => {
                let bytes = parse_default(ty, values).ok_or_else(|| {
                    BackendError::ShaderCreationFailed(format!("invalid default value in: {line}"))
                })?;
                if bytes.len() != size {
                    return Err(BackendError::ShaderCreationFailed(format!(
                        "default value of '{name}' has {} bytes, expected {size}",
                        bytes.len()
                    )));
                }
                bytes
            }
            _ => Vec::new(),
        };

        if ty == ShaderParamType::Texture {
            samplers.push(SamplerInfo::default());
        }

        params.push(ParamDecl {
            name: name.to_string(),
            ty,
            location: params.len() as GLint,
            array_count,
            default_value,
        });
    }

    Ok((params, samplers))
}

fn parse_default(ty: ShaderParamType, values: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    for value in values.split(',').map(str::trim) {
        let word = match ty {
            ShaderParamType::Float
            | ShaderParamType::Vec2
            | ShaderParamType::Vec3
            | ShaderParamType::Vec4
            | ShaderParamType::Matrix4x4 => value.parse::<f32>().ok()?.to_le_bytes(),
            ShaderParamType::Bool => match value {
                "true" => 1i32.to_le_bytes(),
                "false" => 0i32.to_le_bytes(),
                _ => return None,
            },
            _ => value.parse::<i32>().ok()?.to_le_bytes(),
        };
        bytes.extend_from_slice(&word);
    }
    Some(bytes)
}
