/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.config/webtiles-term` (or an explicit `--config` path).
/// Falls back to sensible defaults if the file is missing or incomplete.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

// ── Public Config Structs ──

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub viewport: ViewportConfig,
    pub text: TextConfig,
    pub chat: ChatConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct ViewportConfig {
    pub cell_width: i32,
    pub cell_height: i32,
    pub tile_flag_mask: u32,
    /// Sprites per row for the built-in uniform atlas layout.
    pub atlas_columns: u32,
    /// Largest `cols * rows` a `resize_viewport` may ask for.
    pub max_viewport_cells: usize,
}

#[derive(Clone, Debug)]
pub struct TextConfig {
    pub crt_cols: usize,
    pub crt_rows: usize,
    pub stat_cols: usize,
    pub stat_rows: usize,
    pub msg_cols: usize,
    pub msg_rows: usize,
    pub default_fg: u8,
    pub default_bg: u8,
    /// Largest `cols * rows` a `resize_region` may ask for.
    pub max_region_cells: usize,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub toggle_key: char,
    pub dismiss_hint: String,
    pub unread_suffix: String,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    viewport: TomlViewport,
    #[serde(default)]
    text: TomlText,
    #[serde(default)]
    chat: TomlChat,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlViewport {
    #[serde(default = "default_cell_size")]
    cell_width: i32,
    #[serde(default = "default_cell_size")]
    cell_height: i32,
    #[serde(default = "default_flag_mask")]
    tile_flag_mask: u32,
    #[serde(default = "default_atlas_columns")]
    atlas_columns: u32,
    #[serde(default = "default_max_cells")]
    max_viewport_cells: usize,
}

#[derive(Deserialize, Debug)]
struct TomlText {
    #[serde(default = "default_crt_cols")]
    crt_cols: usize,
    #[serde(default = "default_crt_rows")]
    crt_rows: usize,
    #[serde(default = "default_stat_cols")]
    stat_cols: usize,
    #[serde(default = "default_stat_rows")]
    stat_rows: usize,
    #[serde(default = "default_crt_cols")]
    msg_cols: usize,
    #[serde(default = "default_msg_rows")]
    msg_rows: usize,
    #[serde(default = "default_fg")]
    default_fg: u8,
    #[serde(default)]
    default_bg: u8,
    #[serde(default = "default_max_cells")]
    max_region_cells: usize,
}

#[derive(Deserialize, Debug)]
struct TomlChat {
    #[serde(default = "default_toggle_key")]
    toggle_key: char,
    #[serde(default = "default_dismiss_hint")]
    dismiss_hint: String,
    #[serde(default = "default_unread_suffix")]
    unread_suffix: String,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

fn default_cell_size() -> i32 { 32 }
fn default_flag_mask() -> u32 { 0x7FF }
fn default_atlas_columns() -> u32 { 64 }
fn default_max_cells() -> usize { 1 << 16 }
fn default_crt_cols() -> usize { 80 }
fn default_crt_rows() -> usize { 24 }
fn default_stat_cols() -> usize { 40 }
fn default_stat_rows() -> usize { 12 }
fn default_msg_rows() -> usize { 6 }
fn default_fg() -> u8 { 16 }
fn default_toggle_key() -> char { '_' }
fn default_dismiss_hint() -> String { "(Esc: back to game)".into() }
fn default_unread_suffix() -> String { " (Press _)".into() }
fn default_log_file() -> String { "webtiles-term.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlViewport {
    fn default() -> Self {
        TomlViewport {
            cell_width: default_cell_size(),
            cell_height: default_cell_size(),
            tile_flag_mask: default_flag_mask(),
            atlas_columns: default_atlas_columns(),
            max_viewport_cells: default_max_cells(),
        }
    }
}

impl Default for TomlText {
    fn default() -> Self {
        TomlText {
            crt_cols: default_crt_cols(),
            crt_rows: default_crt_rows(),
            stat_cols: default_stat_cols(),
            stat_rows: default_stat_rows(),
            msg_cols: default_crt_cols(),
            msg_rows: default_msg_rows(),
            default_fg: default_fg(),
            default_bg: 0,
            max_region_cells: default_max_cells(),
        }
    }
}

impl Default for TomlChat {
    fn default() -> Self {
        TomlChat {
            toggle_key: default_toggle_key(),
            dismiss_hint: default_dismiss_hint(),
            unread_suffix: default_unread_suffix(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ClientConfig::from_toml(TomlConfig::default()).viewport
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        ClientConfig::from_toml(TomlConfig::default()).text
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        ClientConfig::from_toml(TomlConfig::default()).chat
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        ClientConfig::from_toml(TomlConfig::default()).log
    }
}

// ── Loading ──

impl ClientConfig {
    /// Load config from `explicit`, or search for `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    ///
    /// Runs before logging is up, so problems come back as messages
    /// for the caller to report instead of being logged here.
    pub fn load(explicit: Option<&Path>) -> (Self, Vec<String>) {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => candidate_dirs()
                .iter()
                .map(|d| d.join("config.toml"))
                .find(|p| p.exists()),
        };
        let mut warnings = Vec::new();
        let toml_cfg = match path.map(|p| read_toml(&p)) {
            Some(Ok(cfg)) => cfg,
            Some(Err(msg)) => {
                warnings.push(msg);
                TomlConfig::default()
            }
            None => TomlConfig::default(),
        };
        (Self::from_toml(toml_cfg), warnings)
    }

    /// Parse a config document. Parse errors fall back to defaults.
    pub fn from_toml_str(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => Self::from_toml(cfg),
            Err(e) => {
                warn!("config.toml parse error, using defaults: {e}");
                Self::from_toml(TomlConfig::default())
            }
        }
    }

    fn from_toml(t: TomlConfig) -> Self {
        let defaults = TomlViewport::default();
        // Non-positive cell sizes fall back to the default.
        let cell_width = if t.viewport.cell_width > 0 { t.viewport.cell_width } else { defaults.cell_width };
        let cell_height = if t.viewport.cell_height > 0 { t.viewport.cell_height } else { defaults.cell_height };

        ClientConfig {
            viewport: ViewportConfig {
                cell_width,
                cell_height,
                tile_flag_mask: t.viewport.tile_flag_mask,
                atlas_columns: t.viewport.atlas_columns,
                max_viewport_cells: t.viewport.max_viewport_cells,
            },
            text: TextConfig {
                crt_cols: t.text.crt_cols,
                crt_rows: t.text.crt_rows,
                stat_cols: t.text.stat_cols,
                stat_rows: t.text.stat_rows,
                msg_cols: t.text.msg_cols,
                msg_rows: t.text.msg_rows,
                default_fg: t.text.default_fg,
                default_bg: t.text.default_bg,
                max_region_cells: t.text.max_region_cells,
            },
            chat: ChatConfig {
                toggle_key: t.chat.toggle_key,
                dismiss_hint: t.chat.dismiss_hint,
                unread_suffix: t.chat.unread_suffix,
            },
            log: LogConfig {
                file: PathBuf::from(t.log.file),
                level: t.log.level,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. ~/.config/webtiles-term
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".config/webtiles-term");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    dirs
}

fn read_toml(path: &Path) -> Result<TomlConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}, using defaults: {e}", path.display()))?;
    toml::from_str::<TomlConfig>(&text)
        .map_err(|e| format!("{} parse error, using defaults: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = ClientConfig::from_toml_str("");
        assert_eq!(cfg.viewport.cell_width, 32);
        assert_eq!(cfg.viewport.tile_flag_mask, 0x7FF);
        assert_eq!(cfg.text.default_fg, 16);
        assert_eq!(cfg.chat.toggle_key, '_');
        assert_eq!(cfg.chat.unread_suffix, " (Press _)");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = ClientConfig::from_toml_str(
            "[viewport]\ncell_width = 16\n\n[chat]\ndismiss_hint = \"(Esc to close)\"\n",
        );
        assert_eq!((cfg.viewport.cell_width, cfg.viewport.cell_height), (16, 32));
        assert_eq!(cfg.chat.dismiss_hint, "(Esc to close)");
        assert_eq!(cfg.chat.unread_suffix, " (Press _)");
    }

    #[test]
    fn non_positive_cell_size_falls_back() {
        let cfg = ClientConfig::from_toml_str("[viewport]\ncell_height = 0\n");
        assert_eq!(cfg.viewport.cell_height, 32);
    }

    #[test]
    fn unreadable_file_is_reported_not_logged() {
        let path = std::env::temp_dir().join("webtiles-term-missing-dir/config.toml");
        let (cfg, warnings) = ClientConfig::load(Some(&path));
        assert_eq!(cfg.text.crt_cols, 80);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("could not read"), "{}", warnings[0]);
    }

    #[test]
    fn cell_limits_default_and_override() {
        let cfg = ClientConfig::from_toml_str("[text]\nmax_region_cells = 4000\n");
        assert_eq!(cfg.text.max_region_cells, 4000);
        assert_eq!(cfg.viewport.max_viewport_cells, 1 << 16);
    }

    #[test]
    fn broken_document_gives_defaults() {
        let cfg = ClientConfig::from_toml_str("[text\ncrt_cols = ");
        assert_eq!(cfg.text.crt_cols, 80);
        assert_eq!(cfg.log.file, PathBuf::from("webtiles-term.log"));
    }
}
