//! Texture resources (2D and cube)

use crate::backend::gl::{self, GLenum};
use crate::backend::{
    BackendResult, ColorFormat, CopyRegion, CopyType, GlBackend, GlFormatTriple, GlName,
    TexImage, TextureFlags,
};
use crate::error::{GraphicsError, GraphicsResult};

/// Shape of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDimension {
    D2 { width: u32, height: u32 },
    /// Six square faces of equal size.
    Cube { size: u32 },
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub dimension: TextureDimension,
    pub format: ColorFormat,
    /// Mip level count. Zero means a full chain.
    pub levels: u32,
    pub flags: TextureFlags,
}

impl TextureDescriptor {
    pub fn new_2d(width: u32, height: u32, format: ColorFormat) -> Self {
        Self {
            label: None,
            dimension: TextureDimension::D2 { width, height },
            format,
            levels: 1,
            flags: TextureFlags::empty(),
        }
    }

    pub fn new_cube(size: u32, format: ColorFormat) -> Self {
        Self {
            label: None,
            dimension: TextureDimension::Cube { size },
            format,
            levels: 1,
            flags: TextureFlags::empty(),
        }
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_flags(mut self, flags: TextureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Largest edge of the base level.
    fn max_extent(&self) -> u32 {
        match self.dimension {
            TextureDimension::D2 { width, height } => width.max(height),
            TextureDimension::Cube { size } => size,
        }
    }

    /// Number of levels down to 1x1.
    pub fn full_chain_levels(&self) -> u32 {
        u32::BITS - self.max_extent().max(1).leading_zeros()
    }

    /// Level count with the full-chain shorthand resolved.
    pub fn mip_levels(&self) -> u32 {
        if self.levels == 0 {
            self.full_chain_levels()
        } else {
            self.levels
        }
    }

    fn face_count(&self) -> u32 {
        match self.dimension {
            TextureDimension::D2 { .. } => 1,
            TextureDimension::Cube { .. } => 6,
        }
    }

    /// Size of one face at a mip level.
    pub fn level_extent(&self, level: u32) -> (u32, u32) {
        let (width, height) = match self.dimension {
            TextureDimension::D2 { width, height } => (width, height),
            TextureDimension::Cube { size } => (size, size),
        };
        let shrink = |edge: u32| edge.checked_shr(level).unwrap_or(0).max(1);
        (shrink(width), shrink(height))
    }
}

/// Data shared by every texture kind
#[derive(Debug, Clone, PartialEq)]
pub struct TextureCommon {
    pub label: Option<String>,
    pub format: ColorFormat,
    pub triple: GlFormatTriple,
    pub name: GlName,
    pub levels: u32,
    pub is_dynamic: bool,
    pub is_render_target: bool,
    pub gen_mipmaps: bool,
}

/// Kind-specific texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Texture2d {
        width: u32,
        height: u32,
        /// Staging buffer for dynamic updates.
        unpack_buffer: Option<GlName>,
    },
    Cube {
        size: u32,
    },
}

/// A texture resource
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    common: TextureCommon,
    kind: TextureKind,
}

impl Texture {
    /// Validate the descriptor and data, then allocate the native texture.
    ///
    /// `data` holds one image per face and level, face-major. When mipmaps are
    /// generated only level 0 of each face is supplied.
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        desc: &TextureDescriptor,
        data: Option<&[&[u8]]>,
    ) -> GraphicsResult<Self> {
        let triple = GlFormatTriple::resolve(desc.format).ok_or_else(|| {
            log::warn!("Rejecting texture with unsupported format {:?}", desc.format);
            GraphicsError::UnsupportedFormat(format!("{:?}", desc.format))
        })?;

        let (width, height) = match desc.dimension {
            TextureDimension::D2 { width, height } => (width, height),
            TextureDimension::Cube { size } => (size, size),
        };
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let is_cube = matches!(desc.dimension, TextureDimension::Cube { .. });
        let is_dynamic = desc.flags.contains(TextureFlags::DYNAMIC);
        let is_render_target = desc.flags.contains(TextureFlags::RENDER_TARGET);
        let gen_mipmaps = desc.flags.contains(TextureFlags::BUILD_MIPMAPS);
        let levels = desc.mip_levels();
        if levels > desc.full_chain_levels() {
            return Err(GraphicsError::InvalidParameter(format!(
                "{} levels requested, a {}x{} texture has at most {}",
                levels,
                width,
                height,
                desc.full_chain_levels()
            )));
        }

        if is_cube && is_dynamic {
            return Err(GraphicsError::CapabilityMismatch(
                "cube textures cannot be dynamic".to_string(),
            ));
        }
        if desc.format.is_compressed() && (is_render_target || is_dynamic) {
            return Err(GraphicsError::CapabilityMismatch(format!(
                "{:?} cannot be a render target or dynamic",
                desc.format
            )));
        }

        if let Some(images) = data {
            Self::validate_data(desc, levels, gen_mipmaps, images)?;
        }

        let target = if is_cube {
            gl::TEXTURE_CUBE_MAP
        } else {
            gl::TEXTURE_2D
        };
        let name = backend.gen_texture(target)?;

        let unpack_buffer = Self::specify_levels(backend, name, desc, triple, levels, data)
            .and_then(|()| {
                if gen_mipmaps && data.is_some() {
                    backend.generate_mipmap(target, name);
                }
                if is_dynamic {
                    Self::create_unpack_buffer(backend, desc.format.level_size(width, height))
                        .map(Some)
                } else {
                    Ok(None)
                }
            });
        let unpack_buffer = match unpack_buffer {
            Ok(buffer) => buffer,
            Err(err) => {
                log::warn!("Texture allocation failed: {err}");
                backend.delete_texture(name);
                return Err(err.into());
            }
        };

        let kind = match desc.dimension {
            TextureDimension::D2 { width, height } => TextureKind::Texture2d {
                width,
                height,
                unpack_buffer,
            },
            TextureDimension::Cube { size } => TextureKind::Cube { size },
        };

        Ok(Self {
            common: TextureCommon {
                label: desc.label.clone(),
                format: desc.format,
                triple,
                name,
                levels,
                is_dynamic,
                is_render_target,
                gen_mipmaps,
            },
            kind,
        })
    }

    fn validate_data(
        desc: &TextureDescriptor,
        levels: u32,
        gen_mipmaps: bool,
        images: &[&[u8]],
    ) -> GraphicsResult<()> {
        let per_face = if gen_mipmaps { 1 } else { levels };
        let expected_images = desc
            .face_count()
            .checked_mul(per_face)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("{levels} levels")))?
            as usize;
        if images.len() != expected_images {
            return Err(GraphicsError::InvalidParameter(format!(
                "expected {} images, got {}",
                expected_images,
                images.len()
            )));
        }

        for (index, image) in images.iter().enumerate() {
            let level = index as u32 % per_face;
            let (width, height) = desc.level_extent(level);
            let expected = desc.format.level_size(width, height);
            if image.len() != expected {
                return Err(GraphicsError::SizeMismatch {
                    what: format!("texture image {index} (level {level})"),
                    expected,
                    actual: image.len(),
                });
            }
        }
        Ok(())
    }

    fn specify_levels<B: GlBackend>(
        backend: &mut B,
        name: GlName,
        desc: &TextureDescriptor,
        triple: GlFormatTriple,
        levels: u32,
        data: Option<&[&[u8]]>,
    ) -> BackendResult<()> {
        let gen_mipmaps = desc.flags.contains(TextureFlags::BUILD_MIPMAPS);
        let per_face = if gen_mipmaps { 1 } else { levels };

        for face in 0..desc.face_count() {
            let target = match desc.dimension {
                TextureDimension::D2 { .. } => gl::TEXTURE_2D,
                TextureDimension::Cube { .. } => gl::cube_face_target(face),
            };
            for level in 0..levels {
                let (width, height) = desc.level_extent(level);
                let image_data = data.and_then(|images| {
                    (level < per_face).then(|| images[(face * per_face + level) as usize])
                });
                backend.tex_image_2d(
                    name,
                    &TexImage {
                        target,
                        level,
                        internal_format: triple.internal,
                        width,
                        height,
                        format: triple.external,
                        ty: triple.component,
                        data: image_data,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn create_unpack_buffer<B: GlBackend>(backend: &mut B, size: usize) -> BackendResult<GlName> {
        let buffer = backend.gen_buffer()?;
        if let Err(err) =
            backend.buffer_data(gl::PIXEL_UNPACK_BUFFER, buffer, &vec![0; size], gl::STREAM_DRAW)
        {
            backend.delete_buffer(buffer);
            return Err(err);
        }
        Ok(buffer)
    }

    /// Re-upload level 0 of a dynamic 2D texture through its unpack buffer.
    pub(crate) fn update<B: GlBackend>(
        &mut self,
        backend: &mut B,
        data: &[u8],
    ) -> GraphicsResult<()> {
        let TextureKind::Texture2d {
            width,
            height,
            unpack_buffer,
        } = self.kind
        else {
            return Err(GraphicsError::CapabilityMismatch(
                "only 2D textures can be updated".to_string(),
            ));
        };
        let Some(unpack_buffer) = unpack_buffer.filter(|_| self.common.is_dynamic) else {
            return Err(GraphicsError::CapabilityMismatch(
                "texture was not created dynamic".to_string(),
            ));
        };

        let expected = self.common.format.level_size(width, height);
        if data.len() != expected {
            return Err(GraphicsError::SizeMismatch {
                what: "texture update".to_string(),
                expected,
                actual: data.len(),
            });
        }

        backend.buffer_sub_data(gl::PIXEL_UNPACK_BUFFER, unpack_buffer, 0, data)?;
        backend.tex_sub_image_2d_from_buffer(
            self.common.name,
            &TexImage {
                target: gl::TEXTURE_2D,
                level: 0,
                internal_format: self.common.triple.internal,
                width,
                height,
                format: self.common.triple.external,
                ty: self.common.triple.component,
                data: None,
            },
            unpack_buffer,
        )?;
        if self.common.gen_mipmaps {
            backend.generate_mipmap(gl::TEXTURE_2D, self.common.name);
        }
        Ok(())
    }

    /// Release all native objects.
    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        if let TextureKind::Texture2d {
            unpack_buffer: Some(buffer),
            ..
        } = self.kind
        {
            backend.delete_buffer(buffer);
        }
        backend.delete_texture(self.common.name);
    }

    pub fn common(&self) -> &TextureCommon {
        &self.common
    }

    pub fn kind(&self) -> &TextureKind {
        &self.kind
    }

    pub fn format(&self) -> ColorFormat {
        self.common.format
    }

    pub fn triple(&self) -> GlFormatTriple {
        self.common.triple
    }

    /// Native texture name.
    pub fn name(&self) -> GlName {
        self.common.name
    }

    pub fn levels(&self) -> u32 {
        self.common.levels
    }

    pub fn is_dynamic(&self) -> bool {
        self.common.is_dynamic
    }

    pub fn is_render_target(&self) -> bool {
        self.common.is_render_target
    }

    pub fn gen_mipmaps(&self) -> bool {
        self.common.gen_mipmaps
    }

    pub fn is_cube(&self) -> bool {
        matches!(self.kind, TextureKind::Cube { .. })
    }

    pub fn label(&self) -> Option<&str> {
        self.common.label.as_deref()
    }

    /// Base level size. Cube textures report their edge size twice.
    pub fn size(&self) -> (u32, u32) {
        match self.kind {
            TextureKind::Texture2d { width, height, .. } => (width, height),
            TextureKind::Cube { size } => (size, size),
        }
    }

    /// Native target of the texture object.
    pub fn target(&self) -> GLenum {
        match self.kind {
            TextureKind::Texture2d { .. } => gl::TEXTURE_2D,
            TextureKind::Cube { .. } => gl::TEXTURE_CUBE_MAP,
        }
    }
}

/// Copy level 0 between two textures along the negotiated path.
pub(crate) fn copy_with<B: GlBackend>(
    backend: &mut B,
    copy_type: CopyType,
    region: &CopyRegion,
) -> BackendResult<()> {
    log::trace!("Copying texture via {:?}", copy_type);
    match copy_type {
        CopyType::Arb => backend.copy_image_sub_data(region),
        CopyType::Nv => backend.copy_image_sub_data_nv(region),
        CopyType::FboBlit => backend.blit_framebuffer(region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    #[test]
    fn test_mip_levels() {
        let desc = TextureDescriptor::new_2d(256, 64, ColorFormat::Rgba).with_levels(0);
        assert_eq!(desc.mip_levels(), 9);
        assert_eq!(desc.level_extent(8), (1, 1));
        assert_eq!(desc.level_extent(2), (64, 16));

        let desc = TextureDescriptor::new_cube(1, ColorFormat::Rgba).with_levels(0);
        assert_eq!(desc.mip_levels(), 1);
        assert_eq!(desc.level_extent(40), (1, 1));
    }

    #[test]
    fn test_levels_past_full_chain_rejected() {
        let mut backend = DummyBackend::new();
        for levels in [4, 40, u32::MAX] {
            let desc = TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba).with_levels(levels);
            assert!(matches!(
                Texture::create(&mut backend, &desc, None),
                Err(GraphicsError::InvalidParameter(_))
            ));
        }
        assert_eq!(backend.live_object_count(), 0);

        let desc = TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba).with_levels(3);
        assert_eq!(Texture::create(&mut backend, &desc, None).unwrap().levels(), 3);
    }

    #[test]
    fn test_create_2d_with_levels() {
        let mut backend = DummyBackend::new();
        let level0 = vec![1u8; 4 * 4 * 4];
        let level1 = vec![2u8; 2 * 2 * 4];
        let desc = TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba).with_levels(2);

        let images = [level0.as_slice(), level1.as_slice()];
        let texture = Texture::create(&mut backend, &desc, Some(&images[..])).unwrap();
        assert_eq!(texture.levels(), 2);
        assert_eq!(
            backend.texture_image(texture.name(), gl::TEXTURE_2D, 1),
            Some(&level1[..])
        );
        assert_eq!(backend.mipmap_generations(texture.name()), 0);
    }

    #[test]
    fn test_create_cube_generates_mipmaps() {
        let mut backend = DummyBackend::new();
        let faces: Vec<Vec<u8>> = (0..6).map(|face| vec![face as u8; 8 * 8]).collect();
        let faces: Vec<&[u8]> = faces.iter().map(|face| face.as_slice()).collect();
        let desc = TextureDescriptor::new_cube(8, ColorFormat::R8)
            .with_levels(0)
            .with_flags(TextureFlags::BUILD_MIPMAPS);

        let texture = Texture::create(&mut backend, &desc, Some(faces.as_slice())).unwrap();
        assert!(texture.is_cube());
        assert_eq!(texture.levels(), 4);
        assert_eq!(
            backend.texture_image(texture.name(), gl::cube_face_target(5), 0),
            Some(&[5u8; 64][..])
        );
        assert_eq!(backend.mipmap_generations(texture.name()), 1);
    }

    #[test]
    fn test_wrong_image_size_allocates_nothing() {
        let mut backend = DummyBackend::new();
        let desc = TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba);
        let short = vec![0u8; 15];

        let err = Texture::create(&mut backend, &desc, Some(&[short.as_slice()][..])).unwrap_err();
        assert!(matches!(err, GraphicsError::SizeMismatch { expected: 64, .. }));
        assert_eq!(backend.live_object_count(), 0);
    }

    #[test]
    fn test_driver_rejection_cleans_up() {
        let mut backend = DummyBackend::new().reject_internal_format(gl::RGBA16F);
        let desc = TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba16F)
            .with_flags(TextureFlags::DYNAMIC);

        let err = Texture::create(&mut backend, &desc, None).unwrap_err();
        assert!(matches!(err, GraphicsError::Backend(_)));
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_update_static_texture_fails() {
        let mut backend = DummyBackend::new();
        let desc = TextureDescriptor::new_2d(2, 2, ColorFormat::Rgba);
        let mut texture = Texture::create(&mut backend, &desc, None).unwrap();

        assert!(matches!(
            texture.update(&mut backend, &[0; 16]),
            Err(GraphicsError::CapabilityMismatch(_))
        ));
    }

    #[test]
    fn test_update_dynamic_texture() {
        let mut backend = DummyBackend::new();
        let desc = TextureDescriptor::new_2d(2, 2, ColorFormat::Rgba)
            .with_flags(TextureFlags::DYNAMIC | TextureFlags::BUILD_MIPMAPS);
        let mut texture = Texture::create(&mut backend, &desc, None).unwrap();

        let pixels: Vec<u8> = (0..16).collect();
        texture.update(&mut backend, &pixels).unwrap();
        assert_eq!(
            backend.texture_image(texture.name(), gl::TEXTURE_2D, 0),
            Some(&pixels[..])
        );
        assert_eq!(backend.mipmap_generations(texture.name()), 1);

        assert!(matches!(
            texture.update(&mut backend, &pixels[..8]),
            Err(GraphicsError::SizeMismatch { .. })
        ));

        texture.release(&mut backend);
        assert_eq!(backend.live_object_count(), 0);
    }
}
