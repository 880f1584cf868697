//! Vertex buffer resource

use std::sync::Arc;

use glam::Vec3;

use crate::backend::gl::{self, GLenum};
use crate::backend::{BackendResult, GlBackend, GlName};
use crate::error::{GraphicsError, GraphicsResult};

/// One texture coordinate channel
#[derive(Debug, Clone, PartialEq)]
pub struct TexCoordArray {
    /// Components per vertex, 1 to 4.
    pub width: u32,
    pub data: Vec<f32>,
}

/// Raw vertex data, shared between the caller and the vertex buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VbData {
    pub points: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec3>>,
    /// Packed RGBA8 per vertex.
    pub colors: Option<Vec<u32>>,
    pub tvarray: Vec<TexCoordArray>,
}

impl VbData {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tangents(mut self, tangents: Vec<Vec3>) -> Self {
        self.tangents = Some(tangents);
        self
    }

    pub fn with_colors(mut self, colors: Vec<u32>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_tex_coords(mut self, width: u32, data: Vec<f32>) -> Self {
        self.tvarray.push(TexCoordArray { width, data });
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.points.len()
    }

    /// Byte views of the attribute streams: points, normals, tangents, colors.
    fn streams(&self) -> [(&'static str, Option<&[u8]>); 4] {
        [
            ("points", Some(bytemuck::cast_slice(&self.points))),
            ("normals", self.normals.as_deref().map(bytemuck::cast_slice)),
            ("tangents", self.tangents.as_deref().map(bytemuck::cast_slice)),
            ("colors", self.colors.as_deref().map(bytemuck::cast_slice)),
        ]
    }

    fn validate(&self) -> GraphicsResult<()> {
        let count = self.num_vertices();
        if count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "vertex data has no points".to_string(),
            ));
        }

        let optional_lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("tangents", self.tangents.as_ref().map(Vec::len)),
            ("colors", self.colors.as_ref().map(Vec::len)),
        ];
        for (what, len) in optional_lengths {
            if let Some(len) = len.filter(|len| *len != count) {
                return Err(GraphicsError::SizeMismatch {
                    what: what.to_string(),
                    expected: count,
                    actual: len,
                });
            }
        }

        for (channel, tv) in self.tvarray.iter().enumerate() {
            if !(1..=4).contains(&tv.width) {
                return Err(GraphicsError::InvalidParameter(format!(
                    "texture coordinate channel {channel} has width {}",
                    tv.width
                )));
            }
            let expected = count * tv.width as usize;
            if tv.data.len() != expected {
                return Err(GraphicsError::SizeMismatch {
                    what: format!("texture coordinate channel {channel}"),
                    expected,
                    actual: tv.data.len(),
                });
            }
        }
        Ok(())
    }
}

/// A vertex buffer resource
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    data: Arc<VbData>,
    dynamic: bool,
    vertex_buffer: GlName,
    normal_buffer: Option<GlName>,
    tangent_buffer: Option<GlName>,
    color_buffer: Option<GlName>,
    uv_buffers: Vec<GlName>,
}

impl VertexBuffer {
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        data: Arc<VbData>,
        dynamic: bool,
    ) -> GraphicsResult<Self> {
        data.validate()?;

        let usage = if dynamic {
            gl::DYNAMIC_DRAW
        } else {
            gl::STATIC_DRAW
        };

        let mut created = Vec::new();
        match Self::create_streams(backend, data, dynamic, usage, &mut created) {
            Ok(vb) => Ok(vb),
            Err(err) => {
                log::warn!("Vertex buffer allocation failed: {err}");
                for buffer in created {
                    backend.delete_buffer(buffer);
                }
                Err(err.into())
            }
        }
    }

    fn create_streams<B: GlBackend>(
        backend: &mut B,
        data: Arc<VbData>,
        dynamic: bool,
        usage: GLenum,
        created: &mut Vec<GlName>,
    ) -> BackendResult<Self> {
        let vertex_buffer = Self::create_stream(
            backend,
            bytemuck::cast_slice(&data.points),
            usage,
            created,
        )?;
        let normal_buffer = Self::create_optional_stream(
            backend,
            data.normals.as_deref().map(bytemuck::cast_slice),
            usage,
            created,
        )?;
        let tangent_buffer = Self::create_optional_stream(
            backend,
            data.tangents.as_deref().map(bytemuck::cast_slice),
            usage,
            created,
        )?;
        let color_buffer = Self::create_optional_stream(
            backend,
            data.colors.as_deref().map(bytemuck::cast_slice),
            usage,
            created,
        )?;

        let mut uv_buffers = Vec::with_capacity(data.tvarray.len());
        for tv in &data.tvarray {
            let bytes = bytemuck::cast_slice(&tv.data);
            uv_buffers.push(Self::create_stream(backend, bytes, usage, created)?);
        }

        Ok(Self {
            data,
            dynamic,
            vertex_buffer,
            normal_buffer,
            tangent_buffer,
            color_buffer,
            uv_buffers,
        })
    }

    fn create_optional_stream<B: GlBackend>(
        backend: &mut B,
        bytes: Option<&[u8]>,
        usage: GLenum,
        created: &mut Vec<GlName>,
    ) -> BackendResult<Option<GlName>> {
        bytes
            .map(|bytes| Self::create_stream(backend, bytes, usage, created))
            .transpose()
    }

    fn create_stream<B: GlBackend>(
        backend: &mut B,
        bytes: &[u8],
        usage: GLenum,
        created: &mut Vec<GlName>,
    ) -> BackendResult<GlName> {
        let buffer = backend.gen_buffer()?;
        created.push(buffer);
        backend.buffer_data(gl::ARRAY_BUFFER, buffer, bytes, usage)?;
        Ok(buffer)
    }

    /// Overwrite the existing streams with new data of the same layout.
    pub(crate) fn update<B: GlBackend>(
        &mut self,
        backend: &mut B,
        data: Arc<VbData>,
    ) -> GraphicsResult<()> {
        if !self.dynamic {
            return Err(GraphicsError::CapabilityMismatch(
                "vertex buffer was not created dynamic".to_string(),
            ));
        }
        data.validate()?;

        let old_streams = self.data.streams();
        let new_streams = data.streams();
        for ((what, old), (_, new)) in old_streams.iter().zip(new_streams.iter()) {
            let expected = old.map_or(0, <[u8]>::len);
            let actual = new.map_or(0, <[u8]>::len);
            if expected != actual {
                return Err(GraphicsError::SizeMismatch {
                    what: what.to_string(),
                    expected,
                    actual,
                });
            }
        }
        if self.data.tvarray.len() != data.tvarray.len() {
            return Err(GraphicsError::SizeMismatch {
                what: "texture coordinate channels".to_string(),
                expected: self.data.tvarray.len(),
                actual: data.tvarray.len(),
            });
        }
        for (channel, (old, new)) in self.data.tvarray.iter().zip(&data.tvarray).enumerate() {
            if old.width != new.width {
                return Err(GraphicsError::SizeMismatch {
                    what: format!("texture coordinate channel {channel} width"),
                    expected: old.width as usize,
                    actual: new.width as usize,
                });
            }
        }

        let buffers = [
            Some(self.vertex_buffer),
            self.normal_buffer,
            self.tangent_buffer,
            self.color_buffer,
        ];
        for (buffer, (_, bytes)) in buffers.into_iter().zip(new_streams) {
            if let (Some(buffer), Some(bytes)) = (buffer, bytes) {
                backend.buffer_sub_data(gl::ARRAY_BUFFER, buffer, 0, bytes)?;
            }
        }
        for (buffer, tv) in self.uv_buffers.iter().zip(&data.tvarray) {
            backend.buffer_sub_data(gl::ARRAY_BUFFER, *buffer, 0, bytemuck::cast_slice(&tv.data))?;
        }

        self.data = data;
        Ok(())
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        for buffer in self.native_buffers() {
            backend.delete_buffer(buffer);
        }
    }

    /// Every native buffer owned by this vertex buffer.
    pub fn native_buffers(&self) -> Vec<GlName> {
        [
            Some(self.vertex_buffer),
            self.normal_buffer,
            self.tangent_buffer,
            self.color_buffer,
        ]
        .into_iter()
        .flatten()
        .chain(self.uv_buffers.iter().copied())
        .collect()
    }

    pub fn data(&self) -> &Arc<VbData> {
        &self.data
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn vertex_buffer(&self) -> GlName {
        self.vertex_buffer
    }

    pub fn normal_buffer(&self) -> Option<GlName> {
        self.normal_buffer
    }

    pub fn tangent_buffer(&self) -> Option<GlName> {
        self.tangent_buffer
    }

    pub fn color_buffer(&self) -> Option<GlName> {
        self.color_buffer
    }

    pub fn uv_buffers(&self) -> &[GlName] {
        &self.uv_buffers
    }
}
