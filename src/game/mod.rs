//! 遊戲核心模組
//!
//! - `constants`: 遊戲常量
//! - `cards`: 卡牌定義
//! - `decks`: 牌組與抽牌分佈
//! - `grid`: 5×5 格子與 10 條線
//! - `hand_types`: 牌型定義
//! - `config`: 牌型分數表與引擎設定
//! - `scoring`: 牌型判定（含環繞順子）
//! - `joker_def`: Joker 定義（觸發條件 × 效果）
//! - `joker`: Joker 管線與成長狀態
//! - `shop`: 商店視圖

pub mod constants;
pub mod cards;
pub mod decks;
pub mod grid;
pub mod hand_types;
pub mod config;
pub mod scoring;
pub mod joker_def;
pub mod joker;
pub mod shop;

pub use constants::*;
pub use cards::{Card, standard_deck, card_index, parse_cards, SPADE, DIAMOND, HEART, CLUB, ACE, JACK, QUEEN, KING};
pub use decks::{Deck, DrawDistribution};
pub use grid::{Grid, Line, LineId};
pub use hand_types::{HandId, HandResult};
pub use config::{GameConfig, HandScore, HandScoreTable};
pub use scoring::{classify, evaluate, contributing_cards, Classification, ClassificationCache};
pub use joker_def::{
    CardFilter, Effect, GrowPer, Growth, JokerRecord, JokerSpec, Rarity, Trigger,
    load_jokers_json, parse_jokers_json, standard_jokers,
};
pub use joker::{GrowthPass, GrowthState, JokerContribution, JokerPipeline, LineOutcome};
pub use shop::{ShopOffer, ShopView};
