//! Grid Poker 計分引擎
//!
//! 5×5 格子上的 10 條線（5 行 + 5 列）各自視為一手 5 張撲克牌計分，
//! 經過 Joker 管線得到 chips × mult，再由 Monte Carlo 評估器估算凍結/購買決策的期望分數。
//!
//! - `game`: 卡牌、格子、牌型判定、Joker 定義與管線、設定
//! - `service`: 計分協調、Monte Carlo 模擬、AI 決策
//! - `error`: 錯誤類型

pub mod error;
pub mod game;
pub mod service;

pub use error::{ConfigError, EngineError, Result};
