//! Stage surfaces for GPU to CPU readback
//!
//! A stage surface owns a texture and a pixel-pack buffer. Staging copies a
//! source texture into the stage texture along the device's copy path, then
//! reads it into the pack buffer. Mapping copies the pack buffer out and may
//! stall until the GPU has finished.

use crate::backend::gl;
use crate::backend::{
    ColorFormat, CopyRegion, CopyType, GlBackend, GlFormatTriple, GlName, TexImage,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::copy_with;
use crate::resources::{Texture, TextureKind};

/// A readback target
#[derive(Debug, Clone, PartialEq)]
pub struct StageSurface {
    format: ColorFormat,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    triple: GlFormatTriple,
    texture: GlName,
    pack_buffer: GlName,
    mapped: Option<Vec<u8>>,
}

impl StageSurface {
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> GraphicsResult<Self> {
        let triple = GlFormatTriple::resolve(format).ok_or_else(|| {
            log::warn!("Rejecting stage surface with unsupported format {:?}", format);
            GraphicsError::UnsupportedFormat(format!("{format:?}"))
        })?;
        if format.is_compressed() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "{format:?} cannot be staged"
            )));
        }
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "stage surface dimensions cannot be zero".to_string(),
            ));
        }

        let texture = backend.gen_texture(gl::TEXTURE_2D)?;
        let image = TexImage {
            target: gl::TEXTURE_2D,
            level: 0,
            internal_format: triple.internal,
            width,
            height,
            format: triple.external,
            ty: triple.component,
            data: None,
        };
        if let Err(err) = backend.tex_image_2d(texture, &image) {
            log::warn!("Stage texture allocation failed: {err}");
            backend.delete_texture(texture);
            return Err(err.into());
        }

        let size = format.level_size(width, height);
        let pack_buffer = match backend.gen_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                backend.delete_texture(texture);
                return Err(err.into());
            }
        };
        let zeroed = vec![0; size];
        if let Err(err) =
            backend.buffer_data(gl::PIXEL_PACK_BUFFER, pack_buffer, &zeroed, gl::STREAM_READ)
        {
            log::warn!("Stage pack buffer allocation failed: {err}");
            backend.delete_buffer(pack_buffer);
            backend.delete_texture(texture);
            return Err(err.into());
        }

        Ok(Self {
            format,
            width,
            height,
            bytes_per_pixel: format.bits_per_pixel() / 8,
            triple,
            texture,
            pack_buffer,
            mapped: None,
        })
    }

    /// Copy a 2D texture of matching format and size into the pack buffer.
    pub(crate) fn stage<B: GlBackend>(
        &mut self,
        backend: &mut B,
        copy_type: CopyType,
        src: &Texture,
    ) -> GraphicsResult<()> {
        let TextureKind::Texture2d { width, height, .. } = *src.kind() else {
            return Err(GraphicsError::CapabilityMismatch(
                "only 2D textures can be staged".to_string(),
            ));
        };
        if src.format() != self.format {
            return Err(GraphicsError::InvalidParameter(format!(
                "source format {:?} does not match stage format {:?}",
                src.format(),
                self.format
            )));
        }
        if (width, height) != (self.width, self.height) {
            return Err(GraphicsError::InvalidParameter(format!(
                "source size {}x{} does not match stage size {}x{}",
                width, height, self.width, self.height
            )));
        }

        let region = CopyRegion {
            src: src.name(),
            src_target: gl::TEXTURE_2D,
            dst: self.texture,
            dst_target: gl::TEXTURE_2D,
            width,
            height,
        };
        copy_with(backend, copy_type, &region)?;
        backend.get_tex_image_to_buffer(
            self.texture,
            gl::TEXTURE_2D,
            self.triple.external,
            self.triple.component,
            self.pack_buffer,
        )?;
        Ok(())
    }

    /// Read back the staged pixels. Returns the data and its row pitch.
    pub(crate) fn map<B: GlBackend>(
        &mut self,
        backend: &mut B,
    ) -> GraphicsResult<(&[u8], usize)> {
        if self.mapped.is_some() {
            return Err(GraphicsError::InvalidParameter(
                "stage surface is already mapped".to_string(),
            ));
        }
        let data = backend.read_buffer(gl::PIXEL_PACK_BUFFER, self.pack_buffer)?;
        let linesize = self.linesize();
        let data = self.mapped.insert(data);
        Ok((data.as_slice(), linesize))
    }

    pub(crate) fn unmap(&mut self) -> GraphicsResult<()> {
        self.mapped.take().map(|_| ()).ok_or_else(|| {
            GraphicsError::InvalidParameter("stage surface is not mapped".to_string())
        })
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        backend.delete_buffer(self.pack_buffer);
        backend.delete_texture(self.texture);
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    pub fn triple(&self) -> GlFormatTriple {
        self.triple
    }

    pub fn texture(&self) -> GlName {
        self.texture
    }

    pub fn pack_buffer(&self) -> GlName {
        self.pack_buffer
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped.is_some()
    }

    /// Bytes per row.
    pub fn linesize(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }
}
