pub mod mesh;
pub mod primitives;
pub mod room;
pub mod vertex;

pub use mesh::{Mesh, MeshData};
pub use room::{PaintingLayout, PaintingPlacement, RoomGeometry, WindowOpening};
pub use vertex::Vertex;
