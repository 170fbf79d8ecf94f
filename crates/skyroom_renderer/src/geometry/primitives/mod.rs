mod cube;

pub use cube::{cube, cube_data};
