//! Swap chain / window surface
//!
//! The window surface itself is owned by the platform layer behind
//! [`GlBackend`]. A swap chain keeps the surface handle together with the
//! parameters it was created from. A non-`None` `zsformat` gives the swap chain
//! its own depth/stencil buffer sized to the back buffers.

use crate::backend::{GlBackend, GlFormatTriple, InitData, WindowHandle, ZStencilFormat};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::ZStencilBuffer;

#[derive(Debug, Clone, PartialEq)]
pub struct SwapChain {
    window: WindowHandle,
    zstencil: Option<ZStencilBuffer>,
    info: InitData,
}

impl SwapChain {
    pub(crate) fn create<B: GlBackend>(backend: &mut B, info: &InitData) -> GraphicsResult<Self> {
        if GlFormatTriple::resolve(info.format).is_none() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "{:?} back buffer",
                info.format
            )));
        }
        if info.format.is_compressed() {
            return Err(GraphicsError::CapabilityMismatch(format!(
                "{:?} cannot be a back buffer format",
                info.format
            )));
        }
        if info.num_backbuffers == 0 {
            return Err(GraphicsError::InvalidParameter(
                "swap chain needs at least one back buffer".to_string(),
            ));
        }

        let window = backend.create_window_surface(info)?;
        let zstencil = match Self::create_zstencil(backend, info.cx, info.cy, info.zsformat) {
            Ok(zstencil) => zstencil,
            Err(err) => {
                log::warn!("Swap chain depth/stencil allocation failed: {err}");
                backend.destroy_window_surface(window);
                return Err(err);
            }
        };
        log::debug!(
            "Created swap chain {:?}: {}x{} {:?}",
            window,
            info.cx,
            info.cy,
            info.format
        );
        Ok(Self {
            window,
            zstencil,
            info: info.clone(),
        })
    }

    fn create_zstencil<B: GlBackend>(
        backend: &mut B,
        cx: u32,
        cy: u32,
        format: ZStencilFormat,
    ) -> GraphicsResult<Option<ZStencilBuffer>> {
        if format == ZStencilFormat::None {
            return Ok(None);
        }
        ZStencilBuffer::create(backend, cx, cy, format).map(Some)
    }

    /// Resize the back buffers. The depth/stencil buffer is reallocated first,
    /// so a failure leaves the swap chain at its old size.
    pub(crate) fn resize<B: GlBackend>(
        &mut self,
        backend: &mut B,
        cx: u32,
        cy: u32,
    ) -> GraphicsResult<()> {
        let zstencil = Self::create_zstencil(backend, cx, cy, self.info.zsformat)?;
        if let Some(old) = std::mem::replace(&mut self.zstencil, zstencil) {
            old.release(backend);
        }
        self.info.cx = cx;
        self.info.cy = cy;
        backend.resize_window_surface(self.window, cx, cy);
        Ok(())
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        if let Some(zstencil) = &self.zstencil {
            zstencil.release(backend);
        }
        backend.destroy_window_surface(self.window);
    }

    pub fn window(&self) -> WindowHandle {
        self.window
    }

    /// Depth/stencil buffer created from `InitData::zsformat`.
    pub fn zstencil(&self) -> Option<&ZStencilBuffer> {
        self.zstencil.as_ref()
    }

    pub fn info(&self) -> &InitData {
        &self.info
    }

    pub fn size(&self) -> (u32, u32) {
        (self.info.cx, self.info.cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{gl, ColorFormat, DummyBackend};

    #[test]
    fn test_create_and_resize() {
        let mut backend = DummyBackend::new();
        let mut swap = SwapChain::create(&mut backend, &InitData::new(640, 480)).unwrap();
        assert_eq!(backend.window_size(swap.window()), Some((640, 480)));

        swap.resize(&mut backend, 800, 600).unwrap();
        assert_eq!(swap.size(), (800, 600));
        assert!(swap.zstencil().is_none());
        assert_eq!(backend.window_size(swap.window()), Some((800, 600)));

        swap.release(&mut backend);
        assert_eq!(backend.live_windows(), 0);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut backend = DummyBackend::new();
        let info = InitData {
            format: ColorFormat::Unknown,
            ..InitData::new(640, 480)
        };
        assert!(matches!(
            SwapChain::create(&mut backend, &info),
            Err(GraphicsError::UnsupportedFormat(_))
        ));
        assert_eq!(backend.live_windows(), 0);
    }

    #[test]
    fn test_zstencil_follows_back_buffers() {
        let mut backend = DummyBackend::new();
        let info = InitData::new(640, 480).with_zstencil(ZStencilFormat::Z24S8);
        let mut swap = SwapChain::create(&mut backend, &info).unwrap();
        assert_eq!(swap.zstencil().map(ZStencilBuffer::size), Some((640, 480)));
        assert_eq!(backend.live_renderbuffers(), 1);

        swap.resize(&mut backend, 320, 200).unwrap();
        assert_eq!(swap.zstencil().map(ZStencilBuffer::size), Some((320, 200)));
        assert_eq!(backend.live_renderbuffers(), 1);

        swap.release(&mut backend);
        assert_eq!(backend.live_object_count(), 0);
    }

    #[test]
    fn test_zstencil_failure_releases_window() {
        let mut backend = DummyBackend::new().reject_internal_format(gl::DEPTH24_STENCIL8);
        let info = InitData::new(640, 480).with_zstencil(ZStencilFormat::Z24S8);
        assert!(matches!(
            SwapChain::create(&mut backend, &info),
            Err(GraphicsError::Backend(_))
        ));
        assert_eq!(backend.live_object_count(), 0);
    }
}
