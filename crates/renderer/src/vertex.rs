//! Vertex types and layouts for rendering.

use bytemuck::{Pod, Zeroable};

/// Lit mesh vertex with position, normal and a per-vertex color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn with_color(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Per-instance model matrix, base tint and emissive glow.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceData {
    /// Model matrix (4x4, column major)
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// Emission rgb; w unused.
    pub emission: [f32; 4],
}

impl InstanceData {
    pub fn new(model: [[f32; 4]; 4], color: [f32; 4]) -> Self {
        Self {
            model,
            color,
            emission: [0.0; 4],
        }
    }

    pub fn with_emission(mut self, emission: [f32; 3]) -> Self {
        self.emission = [emission[0], emission[1], emission[2], 0.0];
        self
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self::new(glam::Mat4::IDENTITY.to_cols_array_2d(), [1.0, 1.0, 1.0, 1.0])
    }
}

/// Screen-space vertex for the 2D overlay (NDC position + color).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Builds overlay geometry (panels, gauge bars, crosshair) in pixel
/// coordinates with the origin at the top-left of the window.
pub struct OverlayBuilder {
    pub vertices: Vec<OverlayVertex>,
    pub indices: Vec<u32>,
    screen_w: f32,
    screen_h: f32,
}

impl OverlayBuilder {
    pub fn new(screen_w: f32, screen_h: f32) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            screen_w: screen_w.max(1.0),
            screen_h: screen_h.max(1.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn px_to_ndc(&self, px: f32, py: f32) -> [f32; 2] {
        [
            (px / self.screen_w) * 2.0 - 1.0,
            1.0 - (py / self.screen_h) * 2.0,
        ]
    }

    /// Solid rectangle. Coordinates in pixels.
    pub fn add_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let tl = self.px_to_ndc(x, y);
        let br = self.px_to_ndc(x + w, y + h);
        let base = self.vertices.len() as u32;
        for position in [[tl[0], tl[1]], [br[0], tl[1]], [br[0], br[1]], [tl[0], br[1]]] {
            self.vertices.push(OverlayVertex { position, color });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Horizontal gauge: dark track, a fill up to `fraction` and an
    /// optional marker line at `marker` (both 0..1, clamped).
    pub fn add_gauge(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fraction: f32,
        marker: Option<f32>,
        color: [f32; 4],
    ) {
        self.add_rect(x, y, w, h, [0.05, 0.05, 0.05, 0.7]);
        self.add_rect(x, y, w * fraction.clamp(0.0, 1.0), h, color);
        if let Some(m) = marker {
            let mx = x + w * m.clamp(0.0, 1.0);
            self.add_rect(mx - 1.0, y - 2.0, 2.0, h + 4.0, [1.0, 1.0, 1.0, 0.9]);
        }
    }

    /// Small plus-shaped crosshair centred on the screen.
    pub fn add_crosshair(&mut self, size: f32, thickness: f32, color: [f32; 4]) {
        let cx = self.screen_w * 0.5;
        let cy = self.screen_h * 0.5;
        self.add_rect(cx - size, cy - thickness * 0.5, size * 2.0, thickness, color);
        self.add_rect(cx - thickness * 0.5, cy - size, thickness, size * 2.0, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_covers_struct() {
        let layout = InstanceData::layout();
        assert_eq!(layout.array_stride, 96);
        assert_eq!(layout.attributes.len(), 6);
        assert_eq!(layout.attributes[5].offset, 80);
    }

    #[test]
    fn rect_maps_screen_corners_to_ndc() {
        let mut overlay = OverlayBuilder::new(200.0, 100.0);
        overlay.add_rect(0.0, 0.0, 200.0, 100.0, [1.0; 4]);
        assert_eq!(overlay.vertices.len(), 4);
        assert_eq!(overlay.indices.len(), 6);
        assert_eq!(overlay.vertices[0].position, [-1.0, 1.0]);
        assert_eq!(overlay.vertices[2].position, [1.0, -1.0]);
    }

    #[test]
    fn empty_fill_is_skipped() {
        let mut overlay = OverlayBuilder::new(200.0, 100.0);
        overlay.add_gauge(10.0, 10.0, 100.0, 8.0, 0.0, None, [0.0, 1.0, 0.0, 1.0]);
        // track only
        assert_eq!(overlay.vertices.len(), 4);
    }

    #[test]
    fn gauge_fill_is_clamped() {
        let mut overlay = OverlayBuilder::new(200.0, 100.0);
        overlay.add_gauge(0.0, 0.0, 100.0, 10.0, 3.0, Some(0.5), [1.0; 4]);
        assert_eq!(overlay.vertices.len(), 12);
        // fill quad's right edge sits at the track's right edge
        assert_eq!(overlay.vertices[5].position[0], overlay.vertices[1].position[0]);
    }

    #[test]
    fn crosshair_is_two_bars() {
        let mut overlay = OverlayBuilder::new(640.0, 480.0);
        overlay.add_crosshair(6.0, 2.0, [1.0; 4]);
        assert_eq!(overlay.indices.len(), 12);
        assert!(!overlay.is_empty());
    }
}
