//! Sampler state resource

use crate::backend::gl::GLenum;
use crate::backend::SamplerInfo;

/// Immutable sampler state with every native token resolved at creation.
///
/// Built by [`convert_sampler_info`](crate::backend::conversion::convert_sampler_info).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    /// The generic description this state was resolved from.
    pub info: SamplerInfo,
    pub min_filter: GLenum,
    pub mag_filter: GLenum,
    pub address_u: GLenum,
    pub address_v: GLenum,
    pub address_w: GLenum,
    pub max_anisotropy: u32,
}

impl SamplerState {
    /// Resolve a description, clamping its anisotropy to `max_anisotropy`.
    pub fn new(info: &SamplerInfo, max_anisotropy: u32) -> Self {
        let info = SamplerInfo {
            max_anisotropy: info.max_anisotropy.clamp(1, max_anisotropy.max(1)),
            ..*info
        };
        crate::backend::conversion::convert_sampler_info(&info)
    }
}
