/// Inbound protocol: a closed vocabulary of drawing and state operations.
///
/// Each message is one JSON object tagged by `"op"`, with an optional
/// `"v"` protocol version:
///
/// ```text
/// {"op":"goto","x":1,"y":3,"region":"msg"}
/// {"op":"put_string","text":"You hit the goblin."}
/// {"op":"draw_cell","x":4,"y":2,"bg":1043,"fg":77,"actors":[{"part":12}]}
/// ```
///
/// Arguments are typed and checked at decode time; anything that does
/// not fit is a `ProtocolError`, never executed.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::options::OptionMap;
use crate::domain::terminal::{Layer, Region};
use crate::error::ProtocolError;

pub const PROTOCOL_VERSION: u64 = 1;

/// Every `op` tag `Command` accepts.
pub const OPS: &[&str] = &[
    "goto",
    "put_char",
    "put_string",
    "clear_region",
    "set_fg",
    "set_bg",
    "set_layer",
    "resize_region",
    "resize_viewport",
    "draw_background",
    "draw_foreground",
    "draw_actor",
    "draw_cell",
    "set_options",
    "clear_options",
    "update_watchers",
    "post_message",
    "clear_chat",
    "ping",
    "connection_closed",
    "login_failed",
];

/// One player-doll part drawn on top of a cell.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActorPart {
    pub part: u32,
    #[serde(default)]
    pub dx: i32,
    #[serde(default)]
    pub dy: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Goto {
        x: i32,
        y: i32,
        #[serde(default)]
        region: Region,
    },
    PutChar { ch: char },
    PutString { text: String },
    ClearRegion,
    SetFg { color: u8 },
    SetBg { color: u8 },
    SetLayer { layer: Layer },
    ResizeRegion { region: Region, cols: i32, rows: i32 },
    ResizeViewport { cols: i32, rows: i32 },
    DrawBackground { x: i32, y: i32, tile: u32 },
    DrawForeground { x: i32, y: i32, tile: u32 },
    DrawActor {
        x: i32,
        y: i32,
        part: u32,
        #[serde(default)]
        dx: i32,
        #[serde(default)]
        dy: i32,
    },
    /// Background, then optional foreground, then actors, in that order.
    DrawCell {
        x: i32,
        y: i32,
        bg: u32,
        #[serde(default)]
        fg: Option<u32>,
        #[serde(default)]
        actors: Vec<ActorPart>,
    },
    SetOptions { options: OptionMap },
    ClearOptions,
    UpdateWatchers { count: u32, names: String },
    PostMessage { text: String },
    ClearChat,
    Ping,
    ConnectionClosed { reason: String },
    LoginFailed,
}

impl Command {
    /// The wire tag this command decodes from.
    pub fn op(&self) -> &'static str {
        match self {
            Command::Goto { .. } => "goto",
            Command::PutChar { .. } => "put_char",
            Command::PutString { .. } => "put_string",
            Command::ClearRegion => "clear_region",
            Command::SetFg { .. } => "set_fg",
            Command::SetBg { .. } => "set_bg",
            Command::SetLayer { .. } => "set_layer",
            Command::ResizeRegion { .. } => "resize_region",
            Command::ResizeViewport { .. } => "resize_viewport",
            Command::DrawBackground { .. } => "draw_background",
            Command::DrawForeground { .. } => "draw_foreground",
            Command::DrawActor { .. } => "draw_actor",
            Command::DrawCell { .. } => "draw_cell",
            Command::SetOptions { .. } => "set_options",
            Command::ClearOptions => "clear_options",
            Command::UpdateWatchers { .. } => "update_watchers",
            Command::PostMessage { .. } => "post_message",
            Command::ClearChat => "clear_chat",
            Command::Ping => "ping",
            Command::ConnectionClosed { .. } => "connection_closed",
            Command::LoginFailed => "login_failed",
        }
    }
}

pub fn decode(raw: &str) -> Result<Command, ProtocolError> {
    let mut value: Value = serde_json::from_str(raw).map_err(ProtocolError::Json)?;
    let obj = value.as_object_mut().ok_or(ProtocolError::NotAnObject)?;

    if let Some(v) = obj.remove("v") {
        let found = v.as_u64().unwrap_or(0);
        if found != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion {
                found,
                expected: PROTOCOL_VERSION,
            });
        }
    }

    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingOp)?
        .to_string();
    if !OPS.contains(&op.as_str()) {
        return Err(ProtocolError::UnknownOp(op));
    }

    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { op, source })
}
