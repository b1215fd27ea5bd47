use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Shader pipeline stage a compile diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Startup failures. Every variant is fatal: the viewer never enters its
/// render loop once one of these has been produced.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to initialize {stage}: {message}")]
    ContextInit { stage: &'static str, message: String },

    #[error("failed to compile {stage} shader of program `{program}`:\n{log}")]
    ShaderCompile {
        program: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("failed to link program `{program}`:\n{log}")]
    ShaderLink { program: String, log: String },

    #[error("failed to load texture {}", .path.display())]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "unsupported channel layout in {}: {channels} channel(s), expected 3 or 4",
        .path.display()
    )]
    UnsupportedChannelLayout { path: PathBuf, channels: u8 },

    #[error(
        "pixel buffer for {} holds {actual} byte(s), expected {expected}",
        .path.display()
    )]
    PixelBufferSize {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error(
        "texture {} is {width}x{height}, larger than the device limit of {max}",
        .path.display()
    )]
    TextureTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

impl ViewerError {
    pub fn context(stage: &'static str, err: impl fmt::Display) -> Self {
        Self::ContextInit {
            stage,
            message: err.to_string(),
        }
    }
}
