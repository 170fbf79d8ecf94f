pub mod program;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use program::{ProgramDesc, ShaderProgram};

/// WGSL sources compiled into the binary.
pub mod builtin {
    pub const ROOM: &str = include_str!("../../../../assets/shaders/room.wgsl");
    pub const SKYBOX: &str = include_str!("../../../../assets/shaders/skybox.wgsl");
    pub const EQUIRECT_TO_CUBEMAP: &str =
        include_str!("../../../../assets/shaders/equirect_to_cubemap.wgsl");
}

/// Where a program's WGSL comes from.  Only `File` sources hot-reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    Embedded(&'static str),
    File(PathBuf),
}

impl ShaderSource {
    /// `dir/file_name` when a shader directory is configured, `embedded`
    /// otherwise.
    pub fn from_dir_or(dir: Option<&Path>, file_name: &str, embedded: &'static str) -> Self {
        match dir {
            Some(dir) => ShaderSource::File(dir.join(file_name)),
            None => ShaderSource::Embedded(embedded),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ShaderSource::Embedded(_) => None,
            ShaderSource::File(path) => Some(path),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader '{label}' failed to compile: {message}")]
    Compile { label: String, message: String },
    /// The module compiled but no pipeline could be built from it (missing
    /// entry point, vertex inputs or bindings that do not match the layout).
    #[error("shader '{label}' failed to link: {message}")]
    Link { label: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_declare_both_entry_points() {
        for src in [builtin::ROOM, builtin::SKYBOX, builtin::EQUIRECT_TO_CUBEMAP] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }

    #[test]
    fn shader_dir_selects_file_source() {
        let src = ShaderSource::from_dir_or(Some(Path::new("shaders")), "room.wgsl", builtin::ROOM);
        assert_eq!(src.path(), Some(Path::new("shaders").join("room.wgsl").as_path()));
        let src = ShaderSource::from_dir_or(None, "room.wgsl", builtin::ROOM);
        assert_eq!(src, ShaderSource::Embedded(builtin::ROOM));
    }
}
