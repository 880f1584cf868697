//! Shared helpers for device integration tests.

use gl_subsystem::backend::{DummyBackend, InitData};
use gl_subsystem::{Device, DeviceConfig};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

pub const VERTEX_SOURCE: &str = "\
uniform mat4 ViewProj;
uniform mat4 World;
uniform float scale = 2.0;
";

pub const PIXEL_SOURCE: &str = "\
uniform vec4 tint = 1.0, 0.5, 0.25, 1.0;
uniform float gamma = 2.2;
uniform sampler2D diffuse;
";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn create_device(backend: DummyBackend) -> Device<DummyBackend> {
    init_logging();
    Device::new(backend, &InitData::new(WIDTH, HEIGHT), DeviceConfig::default())
        .expect("Failed to create device")
}

/// Deterministic RGBA pattern of `width * height` pixels.
pub fn test_pattern(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4).map(|i| (i % 251) as u8).collect()
}
