//! Type conversions between generic formats and native GL tokens.
//!
//! Every function here is total: inputs with no native equivalent map to
//! [`gl::INVALID`]. Call sites go through [`GlFormatTriple::resolve`] so the
//! sentinel never reaches a native call.

use super::gl::{self, GLenum};
use super::types::{
    AddressMode, ColorFormat, SampleFilter, SamplerInfo, ShaderType, ZStencilFormat,
};
use crate::resources::SamplerState;

/// Convert a color format to its native transfer (external) format.
pub fn convert_format(format: ColorFormat) -> GLenum {
    match format {
        ColorFormat::A8 => gl::RED,
        ColorFormat::R8 => gl::RED,
        ColorFormat::Rgba => gl::RGBA,
        ColorFormat::Bgrx => gl::BGR,
        ColorFormat::Bgra => gl::BGRA,
        ColorFormat::R10G10B10A2 => gl::RGBA,
        ColorFormat::Rgba16 => gl::RGBA,
        ColorFormat::R16 => gl::RED,
        ColorFormat::Rgba16F => gl::RGBA,
        ColorFormat::Rgba32F => gl::RGBA,
        ColorFormat::Rg16F => gl::RG,
        ColorFormat::Rg32F => gl::RG,
        ColorFormat::R16F => gl::RED,
        ColorFormat::R32F => gl::RED,
        ColorFormat::Dxt1 => gl::RGB,
        ColorFormat::Dxt3 => gl::RGBA,
        ColorFormat::Dxt5 => gl::RGBA,
        ColorFormat::Unknown => gl::INVALID,
    }
}

/// Convert a color format to its native storage (internal) format.
pub fn convert_internal_format(format: ColorFormat) -> GLenum {
    match format {
        // Alpha-only data lives in the red channel
        ColorFormat::A8 => gl::R8,
        ColorFormat::R8 => gl::R8,
        ColorFormat::Rgba => gl::RGBA8,
        ColorFormat::Bgrx => gl::RGBA8,
        ColorFormat::Bgra => gl::RGBA8,
        ColorFormat::R10G10B10A2 => gl::RGB10_A2,
        ColorFormat::Rgba16 => gl::RGBA16,
        ColorFormat::R16 => gl::R16,
        ColorFormat::Rgba16F => gl::RGBA16F,
        ColorFormat::Rgba32F => gl::RGBA32F,
        ColorFormat::Rg16F => gl::RG16F,
        ColorFormat::Rg32F => gl::RG32F,
        ColorFormat::R16F => gl::R16F,
        ColorFormat::R32F => gl::R32F,
        ColorFormat::Dxt1 => gl::COMPRESSED_RGBA_S3TC_DXT1_EXT,
        ColorFormat::Dxt3 => gl::COMPRESSED_RGBA_S3TC_DXT3_EXT,
        ColorFormat::Dxt5 => gl::COMPRESSED_RGBA_S3TC_DXT5_EXT,
        ColorFormat::Unknown => gl::INVALID,
    }
}

/// Convert a color format to its native per-component data type.
pub fn convert_format_type(format: ColorFormat) -> GLenum {
    match format {
        ColorFormat::A8
        | ColorFormat::R8
        | ColorFormat::Rgba
        | ColorFormat::Bgrx
        | ColorFormat::Bgra => gl::UNSIGNED_BYTE,
        ColorFormat::R10G10B10A2 => gl::UNSIGNED_INT_10_10_10_2,
        ColorFormat::Rgba16 | ColorFormat::R16 => gl::UNSIGNED_SHORT,
        ColorFormat::Rgba16F | ColorFormat::Rg16F | ColorFormat::R16F => gl::UNSIGNED_SHORT,
        ColorFormat::Rgba32F | ColorFormat::Rg32F | ColorFormat::R32F => gl::FLOAT,
        ColorFormat::Dxt1 | ColorFormat::Dxt3 | ColorFormat::Dxt5 => gl::UNSIGNED_BYTE,
        ColorFormat::Unknown => gl::INVALID,
    }
}

/// Convert a depth/stencil format to its native renderbuffer format.
pub fn convert_zstencil_format(format: ZStencilFormat) -> GLenum {
    match format {
        ZStencilFormat::Z16 => gl::DEPTH_COMPONENT16,
        ZStencilFormat::Z24S8 => gl::DEPTH24_STENCIL8,
        ZStencilFormat::Z32F => gl::DEPTH_COMPONENT32F,
        ZStencilFormat::Z32FS8X24 => gl::DEPTH32F_STENCIL8,
        ZStencilFormat::None => gl::INVALID,
    }
}

/// Convert a shader stage to its native shader type.
pub fn convert_shader_type(ty: ShaderType) -> GLenum {
    match ty {
        ShaderType::Vertex => gl::VERTEX_SHADER,
        ShaderType::Pixel => gl::FRAGMENT_SHADER,
    }
}

/// Expand a sample filter into its `(min_filter, mag_filter)` pair.
pub fn convert_filter(filter: SampleFilter) -> (GLenum, GLenum) {
    match filter {
        SampleFilter::Anisotropic => (gl::LINEAR_MIPMAP_LINEAR, gl::LINEAR),
        SampleFilter::Point => (gl::NEAREST_MIPMAP_NEAREST, gl::NEAREST),
        SampleFilter::Linear => (gl::LINEAR_MIPMAP_LINEAR, gl::LINEAR),
        SampleFilter::MinMagPointMipLinear => (gl::NEAREST_MIPMAP_LINEAR, gl::NEAREST),
        SampleFilter::MinPointMagLinearMipPoint => (gl::NEAREST_MIPMAP_NEAREST, gl::LINEAR),
        SampleFilter::MinPointMagMipLinear => (gl::NEAREST_MIPMAP_LINEAR, gl::LINEAR),
        SampleFilter::MinLinearMagMipPoint => (gl::LINEAR_MIPMAP_NEAREST, gl::NEAREST),
        SampleFilter::MinLinearMagPointMipLinear => (gl::LINEAR_MIPMAP_LINEAR, gl::NEAREST),
        SampleFilter::MinMagLinearMipPoint => (gl::LINEAR_MIPMAP_NEAREST, gl::LINEAR),
    }
}

/// Convert an address mode to its native wrap mode.
pub fn convert_address_mode(mode: AddressMode) -> GLenum {
    match mode {
        AddressMode::Wrap => gl::REPEAT,
        AddressMode::Clamp => gl::CLAMP,
        AddressMode::Mirror => gl::MIRRORED_REPEAT,
        AddressMode::Border => gl::CLAMP_TO_BORDER,
        AddressMode::MirrorOnce => gl::MIRROR_CLAMP_EXT,
    }
}

/// Resolve a generic sampler description into native sampler state.
pub fn convert_sampler_info(info: &SamplerInfo) -> SamplerState {
    let (min_filter, mag_filter) = convert_filter(info.filter);
    SamplerState {
        info: *info,
        min_filter,
        mag_filter,
        address_u: convert_address_mode(info.address_u),
        address_v: convert_address_mode(info.address_v),
        address_w: convert_address_mode(info.address_w),
        max_anisotropy: info.max_anisotropy,
    }
}

/// The three native tokens derived from one color format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlFormatTriple {
    /// Transfer format.
    pub external: GLenum,
    /// Storage format.
    pub internal: GLenum,
    /// Per-component data type.
    pub component: GLenum,
}

impl GlFormatTriple {
    /// Resolve all three tokens, or `None` if any of them is the sentinel.
    pub fn resolve(format: ColorFormat) -> Option<Self> {
        let triple = Self {
            external: convert_format(format),
            internal: convert_internal_format(format),
            component: convert_format_type(format),
        };
        let valid = triple.external != gl::INVALID
            && triple.internal != gl::INVALID
            && triple.component != gl::INVALID;
        valid.then_some(triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Bits per channel declared by a sized internal format (None for compressed).
    fn internal_channel_bits(internal: GLenum) -> Option<u32> {
        match internal {
            gl::R8 | gl::RGBA8 => Some(8),
            gl::R16 | gl::RGBA16 | gl::R16F | gl::RG16F | gl::RGBA16F => Some(16),
            gl::R32F | gl::RG32F | gl::RGBA32F => Some(32),
            _ => None,
        }
    }

    #[test]
    fn test_every_format_resolves_consistently() {
        for format in ColorFormat::ALL {
            let triple = GlFormatTriple::resolve(format)
                .unwrap_or_else(|| panic!("{format:?} should resolve"));

            let component_bits = match triple.component {
                gl::UNSIGNED_BYTE => Some(8),
                gl::UNSIGNED_SHORT => Some(16),
                gl::FLOAT => Some(32),
                gl::UNSIGNED_INT_10_10_10_2 => None,
                other => panic!("unexpected component type {other:#x}"),
            };

            if format.is_compressed() {
                assert_eq!(triple.component, gl::UNSIGNED_BYTE);
                continue;
            }
            if let (Some(bits), Some(declared)) =
                (component_bits, internal_channel_bits(triple.internal))
            {
                assert_eq!(bits, declared, "{format:?}");
            }
        }
    }

    #[test]
    fn test_unknown_format_is_sentinel() {
        for raw in [0, 18, 255, u32::MAX] {
            let format = ColorFormat::from_raw(raw);
            assert_eq!(convert_format(format), gl::INVALID);
            assert_eq!(convert_internal_format(format), gl::INVALID);
            assert_eq!(convert_format_type(format), gl::INVALID);
            assert!(GlFormatTriple::resolve(format).is_none());
        }
        assert_eq!(
            convert_zstencil_format(ZStencilFormat::from_raw(99)),
            gl::INVALID
        );
    }

    #[rstest]
    #[case(ColorFormat::A8, gl::RED, gl::R8, gl::UNSIGNED_BYTE)]
    #[case(ColorFormat::Rgba, gl::RGBA, gl::RGBA8, gl::UNSIGNED_BYTE)]
    #[case(ColorFormat::Bgrx, gl::BGR, gl::RGBA8, gl::UNSIGNED_BYTE)]
    #[case(ColorFormat::Bgra, gl::BGRA, gl::RGBA8, gl::UNSIGNED_BYTE)]
    #[case(ColorFormat::R10G10B10A2, gl::RGBA, gl::RGB10_A2, gl::UNSIGNED_INT_10_10_10_2)]
    #[case(ColorFormat::Rgba16F, gl::RGBA, gl::RGBA16F, gl::UNSIGNED_SHORT)]
    #[case(ColorFormat::Rg32F, gl::RG, gl::RG32F, gl::FLOAT)]
    #[case(ColorFormat::Dxt1, gl::RGB, gl::COMPRESSED_RGBA_S3TC_DXT1_EXT, gl::UNSIGNED_BYTE)]
    fn test_format_triple(
        #[case] format: ColorFormat,
        #[case] external: GLenum,
        #[case] internal: GLenum,
        #[case] component: GLenum,
    ) {
        assert_eq!(
            GlFormatTriple::resolve(format),
            Some(GlFormatTriple {
                external,
                internal,
                component
            })
        );
    }

    #[test]
    fn test_filter_table_is_total() {
        for filter in SampleFilter::ALL {
            let (min, mag) = convert_filter(filter);
            assert_ne!(min, gl::INVALID);
            assert!(mag == gl::NEAREST || mag == gl::LINEAR);
            assert_eq!(convert_filter(filter), (min, mag));
        }
    }

    #[test]
    fn test_anisotropic_matches_linear() {
        assert_eq!(
            convert_filter(SampleFilter::Anisotropic),
            convert_filter(SampleFilter::Linear)
        );
        assert_eq!(
            convert_filter(SampleFilter::Point),
            (gl::NEAREST_MIPMAP_NEAREST, gl::NEAREST)
        );
    }

    #[rstest]
    #[case(SampleFilter::MinMagPointMipLinear, gl::NEAREST_MIPMAP_LINEAR, gl::NEAREST)]
    #[case(SampleFilter::MinPointMagLinearMipPoint, gl::NEAREST_MIPMAP_NEAREST, gl::LINEAR)]
    #[case(SampleFilter::MinPointMagMipLinear, gl::NEAREST_MIPMAP_LINEAR, gl::LINEAR)]
    #[case(SampleFilter::MinLinearMagMipPoint, gl::LINEAR_MIPMAP_NEAREST, gl::NEAREST)]
    #[case(SampleFilter::MinLinearMagPointMipLinear, gl::LINEAR_MIPMAP_LINEAR, gl::NEAREST)]
    #[case(SampleFilter::MinMagLinearMipPoint, gl::LINEAR_MIPMAP_NEAREST, gl::LINEAR)]
    fn test_composite_filters(
        #[case] filter: SampleFilter,
        #[case] min: GLenum,
        #[case] mag: GLenum,
    ) {
        assert_eq!(convert_filter(filter), (min, mag));
    }

    #[test]
    fn test_sampler_info_conversion() {
        let info = SamplerInfo::default()
            .with_filter(SampleFilter::Point)
            .with_address_mode(AddressMode::Mirror)
            .with_anisotropy(4);
        let state = convert_sampler_info(&info);
        assert_eq!(state.min_filter, gl::NEAREST_MIPMAP_NEAREST);
        assert_eq!(state.mag_filter, gl::NEAREST);
        assert_eq!(state.address_u, gl::MIRRORED_REPEAT);
        assert_eq!(state.address_w, gl::MIRRORED_REPEAT);
        assert_eq!(state.max_anisotropy, 4);
    }

    #[test]
    fn test_shader_and_depth_tokens() {
        assert_eq!(convert_shader_type(ShaderType::Vertex), gl::VERTEX_SHADER);
        assert_eq!(convert_shader_type(ShaderType::Pixel), gl::FRAGMENT_SHADER);
        assert_eq!(
            convert_zstencil_format(ZStencilFormat::Z24S8),
            gl::DEPTH24_STENCIL8
        );
        assert_eq!(convert_address_mode(AddressMode::MirrorOnce), gl::MIRROR_CLAMP_EXT);
    }
}
