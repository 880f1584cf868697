//! Generic (backend-independent) enumerations and descriptors

use bitflags::bitflags;
use raw_window_handle::RawWindowHandle;

/// Generic color format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    #[default]
    Unknown,
    A8,
    R8,
    Rgba,
    Bgrx,
    Bgra,
    R10G10B10A2,
    Rgba16,
    R16,
    Rgba16F,
    Rgba32F,
    Rg16F,
    Rg32F,
    R16F,
    R32F,
    Dxt1,
    Dxt3,
    Dxt5,
}

impl ColorFormat {
    /// Every format with a native equivalent, in declaration order.
    pub const ALL: [ColorFormat; 17] = [
        ColorFormat::A8,
        ColorFormat::R8,
        ColorFormat::Rgba,
        ColorFormat::Bgrx,
        ColorFormat::Bgra,
        ColorFormat::R10G10B10A2,
        ColorFormat::Rgba16,
        ColorFormat::R16,
        ColorFormat::Rgba16F,
        ColorFormat::Rgba32F,
        ColorFormat::Rg16F,
        ColorFormat::Rg32F,
        ColorFormat::R16F,
        ColorFormat::R32F,
        ColorFormat::Dxt1,
        ColorFormat::Dxt3,
        ColorFormat::Dxt5,
    ];

    /// Maps a raw enumeration value; anything out of range becomes `Unknown`.
    pub fn from_raw(value: u32) -> Self {
        match value {
            1..=17 => Self::ALL[(value - 1) as usize],
            _ => ColorFormat::Unknown,
        }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            ColorFormat::Unknown => 0,
            ColorFormat::A8 | ColorFormat::R8 => 8,
            ColorFormat::R16 | ColorFormat::R16F => 16,
            ColorFormat::Rgba
            | ColorFormat::Bgrx
            | ColorFormat::Bgra
            | ColorFormat::R10G10B10A2
            | ColorFormat::Rg16F
            | ColorFormat::R32F => 32,
            ColorFormat::Rgba16 | ColorFormat::Rgba16F | ColorFormat::Rg32F => 64,
            ColorFormat::Rgba32F => 128,
            ColorFormat::Dxt1 => 4,
            ColorFormat::Dxt3 | ColorFormat::Dxt5 => 8,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(
            self,
            ColorFormat::Dxt1 | ColorFormat::Dxt3 | ColorFormat::Dxt5
        )
    }

    /// Byte size of one image level. Compressed formats are stored in 4x4 blocks.
    pub fn level_size(&self, width: u32, height: u32) -> usize {
        let (width, height) = (width as usize, height as usize);
        if self.is_compressed() {
            let blocks = width.div_ceil(4) * height.div_ceil(4);
            blocks * 16 * self.bits_per_pixel() as usize / 8
        } else {
            width * height * self.bits_per_pixel() as usize / 8
        }
    }
}

/// Generic depth/stencil format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZStencilFormat {
    #[default]
    None,
    Z16,
    Z24S8,
    Z32F,
    Z32FS8X24,
}

impl ZStencilFormat {
    pub fn from_raw(value: u32) -> Self {
        match value {
            1 => ZStencilFormat::Z16,
            2 => ZStencilFormat::Z24S8,
            3 => ZStencilFormat::Z32F,
            4 => ZStencilFormat::Z32FS8X24,
            _ => ZStencilFormat::None,
        }
    }
}

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    Pixel,
}

/// Sampler filter. Composite variants pick min/mag/mip behavior independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleFilter {
    #[default]
    Point,
    Linear,
    Anisotropic,
    MinMagPointMipLinear,
    MinPointMagLinearMipPoint,
    MinPointMagMipLinear,
    MinLinearMagMipPoint,
    MinLinearMagPointMipLinear,
    MinMagLinearMipPoint,
}

impl SampleFilter {
    pub const ALL: [SampleFilter; 9] = [
        SampleFilter::Point,
        SampleFilter::Linear,
        SampleFilter::Anisotropic,
        SampleFilter::MinMagPointMipLinear,
        SampleFilter::MinPointMagLinearMipPoint,
        SampleFilter::MinPointMagMipLinear,
        SampleFilter::MinLinearMagMipPoint,
        SampleFilter::MinLinearMagPointMipLinear,
        SampleFilter::MinMagLinearMipPoint,
    ];
}

/// Texture coordinate address mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    Wrap,
    Clamp,
    Mirror,
    Border,
    MirrorOnce,
}

/// Generic sampler description, resolved into a [`SamplerState`] at creation.
///
/// [`SamplerState`]: crate::resources::SamplerState
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerInfo {
    pub filter: SampleFilter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub max_anisotropy: u32,
}

impl Default for SamplerInfo {
    fn default() -> Self {
        Self {
            filter: SampleFilter::Linear,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
            address_w: AddressMode::Clamp,
            max_anisotropy: 1,
        }
    }
}

impl SamplerInfo {
    pub fn with_filter(mut self, filter: SampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_u = mode;
        self.address_v = mode;
        self.address_w = mode;
        self
    }

    pub fn with_anisotropy(mut self, level: u32) -> Self {
        self.max_anisotropy = level;
        self
    }
}

/// Type tag of a shader parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderParamType {
    Bool,
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Int2,
    Int3,
    Int4,
    Matrix4x4,
    Texture,
}

impl ShaderParamType {
    /// Size in bytes of a single element of this type.
    pub fn size(&self) -> usize {
        match self {
            ShaderParamType::Bool
            | ShaderParamType::Float
            | ShaderParamType::Int
            | ShaderParamType::Texture => 4,
            ShaderParamType::Vec2 | ShaderParamType::Int2 => 8,
            ShaderParamType::Vec3 | ShaderParamType::Int3 => 12,
            ShaderParamType::Vec4 | ShaderParamType::Int4 => 16,
            ShaderParamType::Matrix4x4 => 64,
        }
    }
}

/// Inter-context texture copy strategy, negotiated once per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyType {
    /// `GL_ARB_copy_image`
    Arb,
    /// `GL_NV_copy_image`
    Nv,
    /// Framebuffer blit fallback
    FboBlit,
}

bitflags! {
    /// Texture creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// Generate the mip chain whenever level 0 is uploaded.
        const BUILD_MIPMAPS = 1 << 0;
        /// Updatable through a pixel unpack buffer.
        const DYNAMIC = 1 << 1;
        /// Usable as a render target.
        const RENDER_TARGET = 1 << 2;
    }
}

impl Default for TextureFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Platform surface initialization parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    pub window: Option<RawWindowHandle>,
    pub cx: u32,
    pub cy: u32,
    pub num_backbuffers: u32,
    pub format: ColorFormat,
    pub zsformat: ZStencilFormat,
    pub adapter: u32,
}

impl Default for InitData {
    fn default() -> Self {
        Self {
            window: None,
            cx: 1280,
            cy: 720,
            num_backbuffers: 1,
            format: ColorFormat::Bgra,
            zsformat: ZStencilFormat::None,
            adapter: 0,
        }
    }
}

impl InitData {
    pub fn new(cx: u32, cy: u32) -> Self {
        Self {
            cx,
            cy,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window: RawWindowHandle) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_zstencil(mut self, zsformat: ZStencilFormat) -> Self {
        self.zsformat = zsformat;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_out_of_range() {
        assert_eq!(ColorFormat::from_raw(0), ColorFormat::Unknown);
        assert_eq!(ColorFormat::from_raw(3), ColorFormat::Rgba);
        assert_eq!(ColorFormat::from_raw(17), ColorFormat::Dxt5);
        assert_eq!(ColorFormat::from_raw(999), ColorFormat::Unknown);
        assert_eq!(ZStencilFormat::from_raw(42), ZStencilFormat::None);
    }

    #[test]
    fn test_level_size() {
        assert_eq!(ColorFormat::Rgba.level_size(4, 4), 64);
        assert_eq!(ColorFormat::R16.level_size(3, 3), 18);
        // One 4x4 block even for a 1x1 level
        assert_eq!(ColorFormat::Dxt1.level_size(1, 1), 8);
        assert_eq!(ColorFormat::Dxt5.level_size(8, 4), 32);
    }

    #[test]
    fn test_texture_flags() {
        let flags = TextureFlags::DYNAMIC | TextureFlags::RENDER_TARGET;
        assert!(flags.contains(TextureFlags::DYNAMIC));
        assert!(!flags.contains(TextureFlags::BUILD_MIPMAPS));
        assert!(TextureFlags::default().is_empty());
        assert_eq!(flags - TextureFlags::DYNAMIC, TextureFlags::RENDER_TARGET);
    }
}
