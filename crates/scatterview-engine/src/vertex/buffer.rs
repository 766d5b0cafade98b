use std::sync::atomic::{AtomicU64, Ordering};

use crate::render::{DrawTarget, RenderStates};

use super::{PrimitiveType, Vertex};

/// Update-frequency hint handed to the renderer with every draw.
///
/// Renderers may keep device-side copies of `Dynamic` and `Static` buffers
/// across frames, keyed by `VertexBuffer::id` and refreshed when
/// `VertexBuffer::revision` changes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Rewritten every frame; uploaded per draw.
    #[default]
    Stream,
    /// Changes often; the device copy is rewritten in place when it fits.
    Dynamic,
    /// Rarely changes; the device copy is rebuilt on change only.
    Static,
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A run of vertices owned by a trace.
///
/// The buffer only touches the GPU through `draw`, which must be called from
/// inside a trace overlay (i.e. on the GPU thread).
#[derive(Debug)]
pub struct VertexBuffer {
    id: u64,
    revision: u64,
    kind: PrimitiveType,
    usage: BufferUsage,
    records: Vec<Vertex>,
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new(PrimitiveType::default())
    }
}

/// Clones get their own identity so renderer caches never alias.
impl Clone for VertexBuffer {
    fn clone(&self) -> Self {
        Self {
            id: next_id(),
            revision: 0,
            kind: self.kind,
            usage: self.usage,
            records: self.records.clone(),
        }
    }
}

impl VertexBuffer {
    pub fn new(kind: PrimitiveType) -> Self {
        Self { id: next_id(), revision: 0, kind, usage: BufferUsage::default(), records: Vec::new() }
    }

    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveType {
        self.kind
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Process-unique identity of this buffer.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bumped by every mutation of kind or contents.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replaces primitive kind and contents.
    pub fn set_points(&mut self, kind: PrimitiveType, records: impl Into<Vec<Vertex>>) {
        self.kind = kind;
        self.records = records.into();
        self.touch();
    }

    /// Grows or shrinks to `len` records; new records are zeroed.
    pub fn resize(&mut self, len: usize) {
        if len != self.records.len() {
            self.records.resize(len, Vertex::default());
            self.touch();
        }
    }

    /// Overwrites `records` starting at `offset`.
    ///
    /// Returns `false` without writing anything if the range does not fit.
    pub fn update(&mut self, offset: usize, records: &[Vertex]) -> bool {
        let Some(end) = offset.checked_add(records.len()) else { return false };
        let Some(dst) = self.records.get_mut(offset..end) else { return false };
        dst.copy_from_slice(records);
        self.touch();
        true
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vertex] {
        &self.records
    }

    /// Mutable access to the records. Counts as a change.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Vertex] {
        self.touch();
        &mut self.records
    }

    /// Draws the buffer into the frame currently being rendered.
    pub fn draw(&self, target: &mut dyn DrawTarget, states: &RenderStates) {
        if self.records.is_empty() {
            return;
        }
        target.draw_buffer(self, states);
    }
}
