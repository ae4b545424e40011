//! 錯誤類型
//!
//! - `ConfigError`: 建構時的設定錯誤（牌型分數表、Joker 定義、格子尺寸）
//! - `EngineError`: 引擎對外的統一錯誤

use std::path::PathBuf;

use thiserror::Error;

use crate::game::hand_types::HandId;

/// 設定錯誤（建構時拋出，不可恢復）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hand score table is missing an entry for {0:?}")]
    MissingHandScore(HandId),

    #[error("unknown hand category: {0:?}")]
    UnknownHandCategory(String),

    #[error("invalid grid dimensions {rows}x{cols} (every line must hold {line_len} cards)")]
    InvalidGridDimensions {
        rows: usize,
        cols: usize,
        line_len: usize,
    },

    #[error("malformed joker {id:?}: {reason}")]
    MalformedJoker { id: String, reason: String },

    #[error("deck must contain at least one card")]
    EmptyDeck,

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

impl ConfigError {
    pub(crate) fn malformed(id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedJoker {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// 引擎錯誤
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("simulation cancelled ({requested} samples requested)")]
    Cancelled { requested: usize },
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
