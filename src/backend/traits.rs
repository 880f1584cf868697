//! Native backend abstraction
//!
//! [`GlBackend`] is the boundary between the resource core and the native API.
//! It groups the platform layer, the shader compiler and the GL object calls the
//! device issues. Everything behind it is opaque to the core.

use crate::backend::gl::{GLenum, GLint};
use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to initialize platform context: {0}")]
    InitializationFailed(String),
    #[error("Failed to create window surface: {0}")]
    SurfaceCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Failed to create renderbuffer: {0}")]
    RenderbufferCreationFailed(String),
    #[error("Failed to create shader: {0}")]
    ShaderCreationFailed(String),
    #[error("Failed to read back GPU data: {0}")]
    ReadbackFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Name of a native GL object (texture, buffer, renderbuffer, program)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlName(pub u32);

/// Handle to a native platform context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformHandle(pub u64);

/// Handle to a native window surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// A parameter declared by a compiled program
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ShaderParamType,
    pub location: GLint,
    pub array_count: u32,
    /// Declared default value; empty means zero-initialized.
    pub default_value: Vec<u8>,
}

/// Output of the shader compiler collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub program: GlName,
    pub params: Vec<ParamDecl>,
    pub samplers: Vec<SamplerInfo>,
}

/// One image level specification
#[derive(Debug, Clone, Copy)]
pub struct TexImage<'a> {
    /// `TEXTURE_2D` or a cube face target.
    pub target: GLenum,
    pub level: u32,
    pub internal_format: GLenum,
    pub width: u32,
    pub height: u32,
    pub format: GLenum,
    pub ty: GLenum,
    pub data: Option<&'a [u8]>,
}

/// Source and destination of a texture-to-texture copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRegion {
    pub src: GlName,
    pub src_target: GLenum,
    pub dst: GlName,
    pub dst_target: GLenum,
    pub width: u32,
    pub height: u32,
}

/// Main native backend trait
///
/// All calls happen on the thread that owns the context.
pub trait GlBackend {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    // Platform

    /// Create the rendering context for a device
    fn create_platform_context(&mut self, info: &InitData) -> BackendResult<PlatformHandle>;

    /// Destroy a rendering context
    fn destroy_platform_context(&mut self, platform: PlatformHandle);

    /// Create a window surface for a swap chain
    fn create_window_surface(&mut self, info: &InitData) -> BackendResult<WindowHandle>;

    /// Destroy a window surface
    fn destroy_window_surface(&mut self, window: WindowHandle);

    /// Resize a window surface's back buffers
    fn resize_window_surface(&mut self, window: WindowHandle, cx: u32, cy: u32);

    /// Present a window surface
    fn present(&mut self, window: WindowHandle) -> BackendResult<()>;

    /// Check whether the driver exposes an extension
    fn has_extension(&self, name: &str) -> bool;

    // Shader compilation

    /// Compile and link a program for one stage
    fn compile_program(&mut self, source: &str, stage: GLenum) -> BackendResult<CompiledProgram>;

    /// Delete a linked program
    fn delete_program(&mut self, program: GlName);

    /// Upload a uniform value to a program location
    fn set_uniform(
        &mut self,
        program: GlName,
        location: GLint,
        ty: ShaderParamType,
        count: u32,
        data: &[u8],
    );

    // Textures

    /// Generate a texture name for a target
    fn gen_texture(&mut self, target: GLenum) -> BackendResult<GlName>;

    /// Specify one image level of a texture
    fn tex_image_2d(&mut self, texture: GlName, image: &TexImage<'_>) -> BackendResult<()>;

    /// Re-specify an image level from a pixel unpack buffer
    fn tex_sub_image_2d_from_buffer(
        &mut self,
        texture: GlName,
        image: &TexImage<'_>,
        unpack_buffer: GlName,
    ) -> BackendResult<()>;

    /// Generate the mip chain of a texture
    fn generate_mipmap(&mut self, target: GLenum, texture: GlName);

    /// Delete a texture
    fn delete_texture(&mut self, texture: GlName);

    /// Copy via `glCopyImageSubData`
    fn copy_image_sub_data(&mut self, region: &CopyRegion) -> BackendResult<()>;

    /// Copy via `glCopyImageSubDataNV`
    fn copy_image_sub_data_nv(&mut self, region: &CopyRegion) -> BackendResult<()>;

    /// Copy via framebuffer blit
    fn blit_framebuffer(&mut self, region: &CopyRegion) -> BackendResult<()>;

    /// Read level 0 of a texture into a pixel pack buffer
    fn get_tex_image_to_buffer(
        &mut self,
        texture: GlName,
        target: GLenum,
        format: GLenum,
        ty: GLenum,
        pack_buffer: GlName,
    ) -> BackendResult<()>;

    // Buffers

    /// Generate a buffer name
    fn gen_buffer(&mut self) -> BackendResult<GlName>;

    /// Allocate buffer storage with initial contents
    fn buffer_data(
        &mut self,
        target: GLenum,
        buffer: GlName,
        data: &[u8],
        usage: GLenum,
    ) -> BackendResult<()>;

    /// Overwrite part of a buffer's existing storage
    fn buffer_sub_data(
        &mut self,
        target: GLenum,
        buffer: GlName,
        offset: usize,
        data: &[u8],
    ) -> BackendResult<()>;

    /// Map a buffer for reading and copy out its contents
    ///
    /// May stall until the GPU has finished writing the buffer.
    fn read_buffer(&mut self, target: GLenum, buffer: GlName) -> BackendResult<Vec<u8>>;

    /// Delete a buffer
    fn delete_buffer(&mut self, buffer: GlName);

    // Renderbuffers

    /// Generate a renderbuffer name
    fn gen_renderbuffer(&mut self) -> BackendResult<GlName>;

    /// Allocate renderbuffer storage
    fn renderbuffer_storage(
        &mut self,
        renderbuffer: GlName,
        internal_format: GLenum,
        width: u32,
        height: u32,
    ) -> BackendResult<()>;

    /// Delete a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: GlName);
}

/// Lets a device borrow a backend that outlives it.
impl<T: GlBackend + ?Sized> GlBackend for &mut T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn create_platform_context(&mut self, info: &InitData) -> BackendResult<PlatformHandle> {
        (**self).create_platform_context(info)
    }

    fn destroy_platform_context(&mut self, platform: PlatformHandle) {
        (**self).destroy_platform_context(platform)
    }

    fn create_window_surface(&mut self, info: &InitData) -> BackendResult<WindowHandle> {
        (**self).create_window_surface(info)
    }

    fn destroy_window_surface(&mut self, window: WindowHandle) {
        (**self).destroy_window_surface(window)
    }

    fn resize_window_surface(&mut self, window: WindowHandle, cx: u32, cy: u32) {
        (**self).resize_window_surface(window, cx, cy)
    }

    fn present(&mut self, window: WindowHandle) -> BackendResult<()> {
        (**self).present(window)
    }

    fn has_extension(&self, name: &str) -> bool {
        (**self).has_extension(name)
    }

    fn compile_program(&mut self, source: &str, stage: GLenum) -> BackendResult<CompiledProgram> {
        (**self).compile_program(source, stage)
    }

    fn delete_program(&mut self, program: GlName) {
        (**self).delete_program(program)
    }

    fn set_uniform(
        &mut self,
        program: GlName,
        location: GLint,
        ty: ShaderParamType,
        count: u32,
        data: &[u8],
    ) {
        (**self).set_uniform(program, location, ty, count, data)
    }

    fn gen_texture(&mut self, target: GLenum) -> BackendResult<GlName> {
        (**self).gen_texture(target)
    }

    fn tex_image_2d(&mut self, texture: GlName, image: &TexImage<'_>) -> BackendResult<()> {
        (**self).tex_image_2d(texture, image)
    }

    fn tex_sub_image_2d_from_buffer(
        &mut self,
        texture: GlName,
        image: &TexImage<'_>,
        unpack_buffer: GlName,
    ) -> BackendResult<()> {
        (**self).tex_sub_image_2d_from_buffer(texture, image, unpack_buffer)
    }

    fn generate_mipmap(&mut self, target: GLenum, texture: GlName) {
        (**self).generate_mipmap(target, texture)
    }

    fn delete_texture(&mut self, texture: GlName) {
        (**self).delete_texture(texture)
    }

    fn copy_image_sub_data(&mut self, region: &CopyRegion) -> BackendResult<()> {
        (**self).copy_image_sub_data(region)
    }

    fn copy_image_sub_data_nv(&mut self, region: &CopyRegion) -> BackendResult<()> {
        (**self).copy_image_sub_data_nv(region)
    }

    fn blit_framebuffer(&mut self, region: &CopyRegion) -> BackendResult<()> {
        (**self).blit_framebuffer(region)
    }

    fn get_tex_image_to_buffer(
        &mut self,
        texture: GlName,
        target: GLenum,
        format: GLenum,
        ty: GLenum,
        pack_buffer: GlName,
    ) -> BackendResult<()> {
        (**self).get_tex_image_to_buffer(texture, target, format, ty, pack_buffer)
    }

    fn gen_buffer(&mut self) -> BackendResult<GlName> {
        (**self).gen_buffer()
    }

    fn buffer_data(
        &mut self,
        target: GLenum,
        buffer: GlName,
        data: &[u8],
        usage: GLenum,
    ) -> BackendResult<()> {
        (**self).buffer_data(target, buffer, data, usage)
    }

    fn buffer_sub_data(
        &mut self,
        target: GLenum,
        buffer: GlName,
        offset: usize,
        data: &[u8],
    ) -> BackendResult<()> {
        (**self).buffer_sub_data(target, buffer, offset, data)
    }

    fn read_buffer(&mut self, target: GLenum, buffer: GlName) -> BackendResult<Vec<u8>> {
        (**self).read_buffer(target, buffer)
    }

    fn delete_buffer(&mut self, buffer: GlName) {
        (**self).delete_buffer(buffer)
    }

    fn gen_renderbuffer(&mut self) -> BackendResult<GlName> {
        (**self).gen_renderbuffer()
    }

    fn renderbuffer_storage(
        &mut self,
        renderbuffer: GlName,
        internal_format: GLenum,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        (**self).renderbuffer_storage(renderbuffer, internal_format, width, height)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GlName) {
        (**self).delete_renderbuffer(renderbuffer)
    }
}
