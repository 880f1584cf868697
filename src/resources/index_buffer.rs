//! Index buffer resource

use crate::backend::gl::{self, GLenum};
use crate::backend::{GlBackend, GlName};
use crate::error::{GraphicsError, GraphicsResult};

/// Index data in one of the two supported widths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native element type.
    pub fn index_type(&self) -> GLenum {
        match self {
            IndexData::U16(_) => gl::UNSIGNED_SHORT,
            IndexData::U32(_) => gl::UNSIGNED_INT,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

/// An index buffer resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuffer {
    buffer: GlName,
    index_type: GLenum,
    count: usize,
    dynamic: bool,
}

impl IndexBuffer {
    pub(crate) fn create<B: GlBackend>(
        backend: &mut B,
        data: &IndexData,
        dynamic: bool,
    ) -> GraphicsResult<Self> {
        if data.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "index buffer cannot be empty".to_string(),
            ));
        }

        let usage = if dynamic {
            gl::DYNAMIC_DRAW
        } else {
            gl::STATIC_DRAW
        };
        let buffer = backend.gen_buffer()?;
        if let Err(err) =
            backend.buffer_data(gl::ELEMENT_ARRAY_BUFFER, buffer, data.as_bytes(), usage)
        {
            log::warn!("Index buffer allocation failed: {err}");
            backend.delete_buffer(buffer);
            return Err(err.into());
        }

        Ok(Self {
            buffer,
            index_type: data.index_type(),
            count: data.len(),
            dynamic,
        })
    }

    pub(crate) fn update<B: GlBackend>(
        &mut self,
        backend: &mut B,
        data: &IndexData,
    ) -> GraphicsResult<()> {
        if !self.dynamic {
            return Err(GraphicsError::CapabilityMismatch(
                "index buffer was not created dynamic".to_string(),
            ));
        }
        if data.index_type() != self.index_type || data.len() != self.count {
            return Err(GraphicsError::SizeMismatch {
                what: "index buffer update".to_string(),
                expected: self.size_in_bytes(),
                actual: data.as_bytes().len(),
            });
        }
        backend.buffer_sub_data(gl::ELEMENT_ARRAY_BUFFER, self.buffer, 0, data.as_bytes())?;
        Ok(())
    }

    pub(crate) fn release<B: GlBackend>(&self, backend: &mut B) {
        backend.delete_buffer(self.buffer);
    }

    pub fn buffer(&self) -> GlName {
        self.buffer
    }

    pub fn index_type(&self) -> GLenum {
        self.index_type
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    fn size_in_bytes(&self) -> usize {
        let width = if self.index_type == gl::UNSIGNED_SHORT { 2 } else { 4 };
        self.count * width
    }
}
