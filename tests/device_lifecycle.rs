//! Device integration tests against the in-memory backend.
//!
//! # Test Categories
//!
//! - **Texture Tests**: creation, binding, dynamic updates, copies and readback
//! - **Buffer Tests**: vertex and index buffers, static versus dynamic
//! - **Shader Tests**: parameter dirty tracking and defaults
//! - **Lifecycle Tests**: failure cleanup and device teardown

mod common;

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use rstest::rstest;

use common::{create_device, test_pattern, PIXEL_SOURCE, VERTEX_SOURCE};
use gl_subsystem::backend::{
    gl, ColorFormat, CopyType, DummyBackend, GlFormatTriple, InitData, ShaderType, TextureFlags,
    ZStencilFormat,
};
use gl_subsystem::resources::{IndexData, TextureDescriptor, VbData};
use gl_subsystem::{Device, DeviceConfig, GraphicsError};

// ============================================================================
// Texture Tests
// ============================================================================

#[test]
fn test_rgba_texture_bind_and_destroy() {
    let mut device = create_device(DummyBackend::new());
    let pixels = test_pattern(64, 64);
    let texture = device
        .create_texture(
            &TextureDescriptor::new_2d(64, 64, ColorFormat::Rgba),
            Some(&[pixels.as_slice()][..]),
        )
        .unwrap();

    assert_eq!(
        device.texture(texture).unwrap().triple(),
        GlFormatTriple {
            external: gl::RGBA,
            internal: gl::RGBA8,
            component: gl::UNSIGNED_BYTE,
        }
    );

    device.load_texture(Some(texture), 0).unwrap();
    assert_eq!(device.cur_texture(0).unwrap(), Some(texture));

    device.destroy_texture(texture).unwrap();
    assert_eq!(device.cur_texture(0).unwrap(), None);
    assert_eq!(device.backend().live_textures(), 0);
    assert!(matches!(
        device.load_texture(Some(texture), 0),
        Err(GraphicsError::InvalidHandle(_))
    ));
}

#[test]
fn test_dynamic_texture_update() {
    let mut device = create_device(DummyBackend::new());
    let desc = TextureDescriptor::new_2d(8, 8, ColorFormat::Rgba)
        .with_flags(TextureFlags::DYNAMIC | TextureFlags::BUILD_MIPMAPS)
        .with_levels(0);
    let texture = device.create_texture(&desc, None).unwrap();

    let pixels = test_pattern(8, 8);
    device.update_texture(texture, &pixels).unwrap();

    let name = device.texture(texture).unwrap().name();
    let backend = device.backend();
    assert_eq!(backend.texture_image(name, gl::TEXTURE_2D, 0), Some(pixels.as_slice()));
    assert_eq!(backend.mipmap_generations(name), 1);

    assert!(matches!(
        device.update_texture(texture, &pixels[..16]),
        Err(GraphicsError::SizeMismatch { .. })
    ));
}

#[test]
fn test_static_texture_rejects_update() {
    let mut device = create_device(DummyBackend::new());
    let texture = device
        .create_texture(&TextureDescriptor::new_2d(4, 4, ColorFormat::Rgba), None)
        .unwrap();
    assert!(matches!(
        device.update_texture(texture, &test_pattern(4, 4)),
        Err(GraphicsError::CapabilityMismatch(_))
    ));
}

#[rstest]
#[case::arb(&["GL_ARB_copy_image"], CopyType::Arb)]
#[case::nv(&["GL_NV_copy_image"], CopyType::Nv)]
#[case::blit(&[], CopyType::FboBlit)]
fn test_copy_texture_uses_negotiated_path(#[case] extensions: &[&str], #[case] expected: CopyType) {
    let mut device = create_device(DummyBackend::new().with_extensions(extensions));
    let pixels = test_pattern(16, 16);
    let desc = TextureDescriptor::new_2d(16, 16, ColorFormat::Rgba);
    let src = device
        .create_texture(&desc, Some(&[pixels.as_slice()][..]))
        .unwrap();
    let dst = device.create_texture(&desc, None).unwrap();

    device.copy_texture(dst, src).unwrap();

    let dst_name = device.texture(dst).unwrap().name();
    assert_eq!(device.backend().copies(), &[expected]);
    assert_eq!(
        device.backend().texture_image(dst_name, gl::TEXTURE_2D, 0),
        Some(pixels.as_slice())
    );
}

#[test]
fn test_copy_texture_rejects_mismatched_size() {
    let mut device = create_device(DummyBackend::new());
    let src = device
        .create_texture(&TextureDescriptor::new_2d(16, 16, ColorFormat::Rgba), None)
        .unwrap();
    let dst = device
        .create_texture(&TextureDescriptor::new_2d(8, 8, ColorFormat::Rgba), None)
        .unwrap();
    assert!(device.copy_texture(dst, src).is_err());
    assert!(device.backend().copies().is_empty());
}

#[test]
fn test_stage_surface_readback() {
    let mut device = create_device(DummyBackend::new());
    let pixels = test_pattern(32, 16);
    let texture = device
        .create_texture(
            &TextureDescriptor::new_2d(32, 16, ColorFormat::Rgba),
            Some(&[pixels.as_slice()][..]),
        )
        .unwrap();
    let stage = device
        .create_stage_surface(32, 16, ColorFormat::Rgba)
        .unwrap();

    device.stage_texture(stage, texture).unwrap();
    let (data, linesize) = device.map_stage_surface(stage).unwrap();
    assert_eq!(linesize, 32 * 4);
    assert_eq!(data, pixels.as_slice());

    assert!(device.map_stage_surface(stage).is_err());
    device.unmap_stage_surface(stage).unwrap();
    assert!(device.unmap_stage_surface(stage).is_err());
}

#[test]
fn test_cube_texture_faces() {
    let mut device = create_device(DummyBackend::new());
    let faces: Vec<Vec<u8>> = (0..6).map(|face| vec![face as u8; 4 * 4 * 4]).collect();
    let face_refs: Vec<&[u8]> = faces.iter().map(Vec::as_slice).collect();
    let cube = device
        .create_texture(
            &TextureDescriptor::new_cube(4, ColorFormat::Rgba),
            Some(face_refs.as_slice()),
        )
        .unwrap();

    let name = device.texture(cube).unwrap().name();
    for (face, expected) in faces.iter().enumerate() {
        assert_eq!(
            device
                .backend()
                .texture_image(name, gl::cube_face_target(face as u32), 0),
            Some(expected.as_slice())
        );
    }

    let dynamic =
        TextureDescriptor::new_cube(4, ColorFormat::Rgba).with_flags(TextureFlags::DYNAMIC);
    assert!(matches!(
        device.create_texture(&dynamic, None),
        Err(GraphicsError::CapabilityMismatch(_))
    ));
}

// ============================================================================
// Buffer Tests
// ============================================================================

fn triangle() -> VbData {
    VbData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
        .with_normals(vec![Vec3::Z; 3])
        .with_tex_coords(2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
}

#[test]
fn test_dynamic_vertex_buffer_update() {
    let mut device = create_device(DummyBackend::new());
    let vb = device
        .create_vertex_buffer(Arc::new(triangle()), true)
        .unwrap();
    device.load_vertex_buffer(Some(vb)).unwrap();

    let moved = VbData::new(vec![Vec3::ONE, Vec3::X, Vec3::Y])
        .with_normals(vec![Vec3::Z; 3])
        .with_tex_coords(2, vec![0.0; 6]);
    device.update_vertex_buffer(vb, Arc::new(moved)).unwrap();

    let points = device.vertex_buffer(vb).unwrap().vertex_buffer();
    let contents = device.backend().buffer_contents(points).unwrap();
    assert_eq!(&contents[..12], bytemuck::bytes_of(&Vec3::ONE));

    // Dropping the normals changes the layout
    let reshaped = VbData::new(vec![Vec3::ONE, Vec3::X, Vec3::Y]);
    assert!(device.update_vertex_buffer(vb, Arc::new(reshaped)).is_err());

    device.destroy_vertex_buffer(vb).unwrap();
    assert_eq!(device.cur_vertex_buffer(), None);
}

#[test]
fn test_static_buffers_reject_update() {
    let mut device = create_device(DummyBackend::new());
    let vb = device
        .create_vertex_buffer(Arc::new(triangle()), false)
        .unwrap();
    assert!(matches!(
        device.update_vertex_buffer(vb, Arc::new(triangle())),
        Err(GraphicsError::CapabilityMismatch(_))
    ));

    let ib = device
        .create_index_buffer(IndexData::U16(vec![0, 1, 2]), false)
        .unwrap();
    assert!(matches!(
        device.update_index_buffer(ib, &IndexData::U16(vec![2, 1, 0])),
        Err(GraphicsError::CapabilityMismatch(_))
    ));
}

#[test]
fn test_dynamic_index_buffer_update() {
    let mut device = create_device(DummyBackend::new());
    let ib = device
        .create_index_buffer(IndexData::U32(vec![0, 1, 2]), true)
        .unwrap();
    assert_eq!(device.index_buffer(ib).unwrap().index_type(), gl::UNSIGNED_INT);

    device
        .update_index_buffer(ib, &IndexData::U32(vec![2, 1, 0]))
        .unwrap();
    let buffer = device.index_buffer(ib).unwrap().buffer();
    assert_eq!(
        device.backend().buffer_contents(buffer),
        Some(bytemuck::cast_slice::<u32, u8>(&[2, 1, 0]))
    );

    assert!(matches!(
        device.update_index_buffer(ib, &IndexData::U32(vec![0, 1])),
        Err(GraphicsError::SizeMismatch { .. })
    ));
}

// ============================================================================
// Shader Tests
// ============================================================================

#[test]
fn test_shader_params_upload_only_when_dirty() {
    let mut device = create_device(DummyBackend::new());
    let vs = device
        .create_shader(VERTEX_SOURCE, ShaderType::Vertex)
        .unwrap();

    // Every param starts dirty
    assert_eq!(device.upload_shader_params(vs).unwrap(), 3);
    // Only the implicit matrices follow
    assert_eq!(device.upload_shader_params(vs).unwrap(), 2);

    device.shader_mut(vs).unwrap().set_float("scale", 0.5).unwrap();
    device.backend_mut().clear_upload_log();
    assert_eq!(device.upload_shader_params(vs).unwrap(), 3);

    let shader = device.shader(vs).unwrap();
    let scale = shader.param_by_name("scale").unwrap();
    assert_eq!(
        device.backend().uniform(shader.program(), scale.location()),
        Some(bytemuck::bytes_of(&0.5f32))
    );
    assert_eq!(device.backend().upload_count(), 3);
}

#[test]
fn test_shader_matrices_follow_device() {
    let mut device = create_device(DummyBackend::new());
    let vs = device
        .create_shader(VERTEX_SOURCE, ShaderType::Vertex)
        .unwrap();
    let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    device.set_world_matrix(world);
    device.upload_shader_params(vs).unwrap();

    let shader = device.shader(vs).unwrap();
    let location = shader.world().unwrap().location();
    assert_eq!(
        device.backend().uniform(shader.program(), location),
        Some(bytemuck::bytes_of(&world))
    );
}

#[test]
fn test_shader_reset_restores_defaults() {
    let mut device = create_device(DummyBackend::new());
    let ps = device.create_shader(PIXEL_SOURCE, ShaderType::Pixel).unwrap();
    let defaults: Vec<Vec<u8>> = device
        .shader(ps)
        .unwrap()
        .params()
        .iter()
        .map(|param| param.value().to_vec())
        .collect();

    let shader = device.shader_mut(ps).unwrap();
    shader.set_vec4("tint", Vec4::ZERO).unwrap();
    shader.set_float(1usize, 1.0).unwrap();
    device.upload_shader_params(ps).unwrap();
    device.reset_shader_params(ps).unwrap();

    let shader = device.shader(ps).unwrap();
    for (param, default) in shader.params().iter().zip(&defaults) {
        assert_eq!(param.value(), default.as_slice(), "param '{}'", param.name());
        assert!(param.is_dirty());
    }
    assert_eq!(
        shader.param_by_name("tint").unwrap().value(),
        bytemuck::cast_slice::<f32, u8>(&[1.0, 0.5, 0.25, 1.0])
    );
}

#[test]
fn test_shader_param_size_checked() {
    let mut device = create_device(DummyBackend::new());
    let ps = device.create_shader(PIXEL_SOURCE, ShaderType::Pixel).unwrap();
    assert!(matches!(
        device.set_shader_param(ps, "gamma", &[0u8; 8]),
        Err(GraphicsError::SizeMismatch { .. })
    ));
    assert!(matches!(
        device.set_shader_param(ps, "missing", &[0u8; 4]),
        Err(GraphicsError::InvalidParameter(_))
    ));
    device
        .set_shader_param(ps, "gamma", bytemuck::bytes_of(&1.8f32))
        .unwrap();
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_failed_create_leaves_no_resources() {
    let backend = DummyBackend::new().reject_internal_format(gl::RGBA8);
    let mut device = create_device(backend);
    let objects = device.backend().live_object_count();
    let resources = device.resource_count();

    let result =
        device.create_texture(&TextureDescriptor::new_2d(16, 16, ColorFormat::Rgba), None);
    assert!(matches!(result, Err(GraphicsError::Backend(_))));

    let result = device.create_stage_surface(16, 16, ColorFormat::Rgba);
    assert!(result.is_err());

    let result =
        device.create_texture(&TextureDescriptor::new_2d(16, 16, ColorFormat::Unknown), None);
    assert!(matches!(result, Err(GraphicsError::UnsupportedFormat(_))));

    assert_eq!(device.backend().live_object_count(), objects);
    assert_eq!(device.resource_count(), resources);
}

#[test]
fn test_buffer_exhaustion_releases_partial_streams() {
    // Three streams against a limit of two
    let mut device = create_device(DummyBackend::new().with_buffer_limit(2));
    let objects = device.backend().live_object_count();

    let result = device.create_vertex_buffer(Arc::new(triangle()), false);
    assert!(matches!(result, Err(GraphicsError::Backend(_))));
    assert_eq!(device.backend().live_buffers(), 0);
    assert_eq!(device.backend().live_object_count(), objects);
    assert_eq!(device.vertex_buffer_count(), 0);
}

#[test]
fn test_destroy_everything_leaves_platform() {
    let mut device = create_device(DummyBackend::new());
    let texture = device
        .create_texture(
            &TextureDescriptor::new_2d(8, 8, ColorFormat::Bgra).with_flags(TextureFlags::DYNAMIC),
            None,
        )
        .unwrap();
    let vb = device
        .create_vertex_buffer(Arc::new(triangle()), true)
        .unwrap();
    let ib = device
        .create_index_buffer(IndexData::U16(vec![0, 1, 2]), false)
        .unwrap();
    let vs = device
        .create_shader(VERTEX_SOURCE, ShaderType::Vertex)
        .unwrap();
    let stage = device.create_stage_surface(8, 8, ColorFormat::Bgra).unwrap();
    let zs = device
        .create_zstencil(8, 8, ZStencilFormat::Z24S8)
        .unwrap();
    let swap = device.create_swap_chain(&InitData::new(64, 64)).unwrap();
    device.set_zstencil_target(Some(zs)).unwrap();

    device.destroy_texture(texture).unwrap();
    device.destroy_vertex_buffer(vb).unwrap();
    device.destroy_index_buffer(ib).unwrap();
    device.destroy_shader(vs).unwrap();
    device.destroy_stage_surface(stage).unwrap();
    device.destroy_zstencil(zs).unwrap();
    device.destroy_swap_chain(swap).unwrap();

    assert_eq!(device.zstencil_target(), None);
    // Only the context and the primary window remain
    assert_eq!(device.resource_count(), 1);
    assert_eq!(device.backend().live_object_count(), 2);
    assert!(matches!(
        device.destroy_texture(texture),
        Err(GraphicsError::InvalidHandle(_))
    ));
}

#[test]
fn test_anisotropy_clamped_by_config() {
    use gl_subsystem::backend::SamplerInfo;

    let config = DeviceConfig {
        max_anisotropy: 4,
        ..Default::default()
    };
    let mut device = Device::new(DummyBackend::new(), &InitData::new(64, 64), config).unwrap();
    let sampler = device
        .create_sampler(&SamplerInfo::default().with_anisotropy(16))
        .unwrap();
    assert_eq!(device.sampler(sampler).unwrap().max_anisotropy, 4);

    device.load_sampler(Some(sampler), 3).unwrap();
    device.destroy_sampler(sampler).unwrap();
    assert_eq!(device.cur_sampler(3).unwrap(), None);
}

#[test]
fn test_drop_releases_native_objects() {
    common::init_logging();
    let mut backend = DummyBackend::new();
    {
        let mut device =
            Device::new(&mut backend, &InitData::new(64, 64), DeviceConfig::default()).unwrap();
        let texture = device
            .create_texture(
                &TextureDescriptor::new_2d(8, 8, ColorFormat::Rgba)
                    .with_flags(TextureFlags::DYNAMIC),
                None,
            )
            .unwrap();
        device.create_vertex_buffer(Arc::new(triangle()), false).unwrap();
        device
            .create_index_buffer(IndexData::U32(vec![0, 1, 2]), true)
            .unwrap();
        device.create_shader(PIXEL_SOURCE, ShaderType::Pixel).unwrap();
        device.create_stage_surface(8, 8, ColorFormat::Rgba).unwrap();
        device.create_zstencil(8, 8, ZStencilFormat::Z16).unwrap();
        device.create_swap_chain(&InitData::new(32, 32)).unwrap();
        device.load_texture(Some(texture), 2).unwrap();

        assert!(device.backend().live_object_count() > 2);
    }
    assert_eq!(backend.live_object_count(), 0);
}
