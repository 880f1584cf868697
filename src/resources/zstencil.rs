//! Depth/stencil buffer resource

use crate::backend::conversion::convert_zstencil_format;
use crate::backend::gl::{self, GLenum};
use crate::backend::{GlBackend, GlName, ZStencilFormat};
use crate::error::{GraphicsError, GraphicsResult};

/// A depth/stencil renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZStencilBuffer {
    buffer: GlName,
    format: ZStencilFormat,
    gl_format: GLenum,
    width: u32,
    height: u32,
}

impl ZStencilBuffer {
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        width: u32,
        height: u32,
        format: ZStencilFormat,
    ) -> GraphicsResult<Self> {
        let gl_format = convert_zstencil_format(format);
        if gl_format == gl::INVALID {
            log::warn!("Rejecting depth/stencil buffer with format {:?}", format);
            return Err(GraphicsError::UnsupportedFormat(format!("{format:?}")));
        }
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "depth/stencil dimensions cannot be zero".to_string(),
            ));
        }

        let buffer = backend.gen_renderbuffer()?;
        if let Err(err) = backend.renderbuffer_storage(buffer, gl_format, width, height) {
            log::warn!("Depth/stencil allocation failed: {err}");
            backend.delete_renderbuffer(buffer);
            return Err(err.into());
        }

        Ok(Self {
            buffer,
            format,
            gl_format,
            width,
            height,
        })
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        backend.delete_renderbuffer(self.buffer);
    }

    pub fn buffer(&self) -> GlName {
        self.buffer
    }

    pub fn format(&self) -> ZStencilFormat {
        self.format
    }

    pub fn gl_format(&self) -> GLenum {
        self.gl_format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    #[test]
    fn test_none_format_is_unsupported() {
        let mut backend = DummyBackend::new();
        let err = ZStencilBuffer::create(&mut backend, 64, 64, ZStencilFormat::None).unwrap_err();
        assert!(matches!(err, GraphicsError::UnsupportedFormat(_)));
        assert_eq!(backend.live_renderbuffers(), 0);
    }

    #[test]
    fn test_driver_rejection_releases_renderbuffer() {
        let mut backend = DummyBackend::new().reject_internal_format(gl::DEPTH32F_STENCIL8);
        let err =
            ZStencilBuffer::create(&mut backend, 64, 64, ZStencilFormat::Z32FS8X24).unwrap_err();
        assert!(matches!(err, GraphicsError::Backend(_)));
        assert_eq!(backend.live_renderbuffers(), 0);
    }

    #[test]
    fn test_create() {
        let mut backend = DummyBackend::new();
        let zs = ZStencilBuffer::create(&mut backend, 320, 200, ZStencilFormat::Z24S8).unwrap();
        assert_eq!(zs.gl_format(), gl::DEPTH24_STENCIL8);
        assert_eq!(zs.size(), (320, 200));
        zs.release(&mut backend);
        assert_eq!(backend.live_renderbuffers(), 0);
    }
}
