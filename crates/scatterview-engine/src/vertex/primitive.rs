use bytemuck::{Pod, Zeroable};

/// One vertex: position in data/transformed space plus straight-alpha color.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// How a run of vertices is assembled into primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    #[default]
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl PrimitiveType {
    /// GPU topology used after `expand`.
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
            PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveType::Triangles | PrimitiveType::TriangleFan | PrimitiveType::Quads => {
                wgpu::PrimitiveTopology::TriangleList
            }
            PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Rewrites fans and quads as triangle lists. Other kinds pass through.
    ///
    /// Trailing vertices that do not form a full quad are dropped.
    pub fn expand(self, vertices: &[Vertex]) -> Vec<Vertex> {
        match self {
            PrimitiveType::TriangleFan => {
                let Some((&hub, rest)) = vertices.split_first() else {
                    return Vec::new();
                };
                rest.windows(2).flat_map(|w| [hub, w[0], w[1]]).collect()
            }
            PrimitiveType::Quads => vertices
                .chunks_exact(4)
                .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
                .collect(),
            _ => vertices.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex::new([x, 0.0, 0.0], [1.0; 4])
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 28);
    }

    #[test]
    fn fan_expands_around_first_vertex() {
        let out = PrimitiveType::TriangleFan.expand(&[v(0.0), v(1.0), v(2.0), v(3.0)]);
        let xs: Vec<f32> = out.iter().map(|p| p.position[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn quads_expand_and_drop_partial() {
        let input: Vec<Vertex> = (0..6).map(|i| v(i as f32)).collect();
        let out = PrimitiveType::Quads.expand(&input);
        assert_eq!(out.len(), 6);
        assert_eq!(out[5].position[0], 3.0);
    }

    #[test]
    fn degenerate_fan_is_empty() {
        assert!(PrimitiveType::TriangleFan.expand(&[]).is_empty());
        assert!(PrimitiveType::TriangleFan.expand(&[v(0.0), v(1.0)]).is_empty());
    }
}
