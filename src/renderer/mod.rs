//! WebGPU rendering module
//!
//! The scene builder flattens the session into coloured triangles in game
//! coordinates; the pipeline maps them to the viewport and draws.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::build_frame;
pub use vertex::Vertex;
