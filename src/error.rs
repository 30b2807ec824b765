/// Recoverable error types.
///
/// Nothing in here ends a session: the dispatcher logs these and moves
/// on to the next inbound message.

use thiserror::Error;

use crate::domain::tiles::Sheet;

/// An inbound message that could not be turned into a `Command`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has no \"op\" field")]
    MissingOp,

    #[error("unknown operation: {0}")]
    UnknownOp(String),

    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u64 },

    #[error("malformed arguments for {op}: {source}")]
    Malformed {
        op: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportError {
    #[error("viewport size must be positive, got {cols}x{rows}")]
    NonPositive { cols: i32, rows: i32 },

    #[error("viewport {cols}x{rows} exceeds the {max}-cell limit")]
    TooLarge { cols: i32, rows: i32, max: usize },

    #[error("viewport {cols}x{rows} overflows the pixel range")]
    Overflow { cols: i32, rows: i32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("region size must be positive, got {cols}x{rows}")]
    NonPositive { cols: i32, rows: i32 },

    #[error("region {cols}x{rows} exceeds the {max}-cell limit")]
    TooLarge { cols: i32, rows: i32, max: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("no viewport allocated; resize_viewport must come first")]
    NoViewport,

    #[error("no {sheet:?} sprite for tile {id}")]
    UnknownTile { sheet: Sheet, id: u32 },

    #[error("cell ({x}, {y}) is outside the viewport")]
    OutsideViewport { x: i32, y: i32 },

    #[error("draw offset at cell ({x}, {y}) overflows the pixel range")]
    Overflow { x: i32, y: i32 },
}

/// Why the dispatcher refused a decoded command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Tile(#[from] TileError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("options not set, wanted option: {0}")]
    NotSet(String),

    #[error("option doesn't exist: {0}")]
    Missing(String),
}
