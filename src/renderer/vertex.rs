//! Vertex types and palette for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    /// `0xRRGGBB` to linear-ish RGBA
    pub const fn rgb(hex: u32) -> [f32; 4] {
        [
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
            1.0,
        ]
    }

    pub const fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
        [color[0], color[1], color[2], alpha]
    }

    pub const BACKGROUND: [f32; 4] = rgb(0x000033);
    pub const BORDER: [f32; 4] = rgb(0x0044cc);
    pub const GRID: [f32; 4] = [1.0, 1.0, 1.0, 0.04];

    pub const PLAYER: [f32; 4] = rgb(0x00aaff);
    pub const PLAYER_ENERGIZED: [f32; 4] = rgb(0xff9900);
    pub const PLAYER_PLASMA_HALO: [f32; 4] = [0.0, 0.67, 1.0, 0.3];

    pub const BULLET: [f32; 4] = rgb(0xffffff);
    pub const PLASMA: [f32; 4] = rgb(0x00aaff);

    pub const HEAD: [f32; 4] = rgb(0x00ff00);
    pub const BODY: [f32; 4] = rgb(0x00cc00);
    pub const ARMOR_RIM: [f32; 4] = rgb(0xffd700);
    pub const METALLIC: [[f32; 4]; 4] = [
        rgb(0xa9a9a9),
        rgb(0xc0c0c0),
        rgb(0xd3d3d3),
        rgb(0xb8b8b8),
    ];

    pub const SPIDER: [f32; 4] = rgb(0xff0000);
    pub const CHEWING: [f32; 4] = rgb(0xffff00);

    pub const POWERUP: [f32; 4] = rgb(0x00ffff);
    pub const GOLD: [f32; 4] = rgb(0xffd700);
    pub const CYAN: [f32; 4] = rgb(0x00ffff);

    /// Egg colour sets; a block draws its cells from one set
    pub const EGG_COLORS: [[[f32; 4]; 4]; 5] = [
        [rgb(0x8b4513), rgb(0xa52a2a), rgb(0xcd853f), rgb(0xd2691e)],
        [rgb(0x6b8e23), rgb(0x556b2f), rgb(0x808000), rgb(0x9acd32)],
        [rgb(0x4682b4), rgb(0x5f9ea0), rgb(0x6495ed), rgb(0x87ceeb)],
        [rgb(0x9370db), rgb(0x8a2be2), rgb(0x9932cc), rgb(0xba55d3)],
        [rgb(0xff6347), rgb(0xff4500), rgb(0xff7f50), rgb(0xffa07a)],
    ];
}
