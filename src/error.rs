/// Error types.
///
/// `AssetError` covers everything that can go wrong while turning the
/// manifest and level files into templates and maps. Those failures are
/// fatal for the load. `GameError` is what the frame loop can return.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("sprite '{template}' has unknown type '{tag}'")]
    UnknownEntityKind { template: String, tag: String },
    #[error("sprite '{template}' references unknown image '{image}'")]
    MissingImage { template: String, image: String },
    #[error("image '{image}' ({width}x{height}) cannot be split into {rows}x{cols}")]
    BadSheet {
        image: String,
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },
    #[error("image '{0}' needs either `solid` or `mask`")]
    BadImage(String),
    #[error("sprite '{template}' animation '{animation}' has no frames")]
    EmptyAnimation { template: String, animation: String },
    #[error("sprite '{template}' animation '{animation}' has a non-positive frame duration")]
    BadFrameDuration { template: String, animation: String },
    #[error("sprite '{0}' has no animations")]
    NoAnimations(String),
    #[error("unknown sprite template '{0}'")]
    UnknownTemplate(String),
    #[error("level {level} line {line}: character '{ch}' has no mapping")]
    UnmappedLevelChar { level: usize, line: usize, ch: char },
    #[error("level {0} has no player spawn")]
    MissingPlayerSpawn(usize),
    #[error("player template '{0}' is not of type Player")]
    PlayerTemplateKind(String),
    #[error("level {level}: template '{template}' is a Player but not placed with '0'")]
    UnexpectedPlayer { level: usize, template: String },
    #[error("mapping key '{0}' must be a single character")]
    BadMapping(String),
    #[error("manifest lists no levels")]
    NoLevels,
    #[error("asset loader thread exited without a result")]
    LoaderGone,
}

#[derive(Debug, Error)]
pub enum GameError {
    /// The stop action was triggered. Not a failure, but it ends the loop.
    #[error("stopped by request")]
    Stopped,
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
