//! Joker 定義系統 - 聲明式效果模板
//!
//! ```text
//! JokerSpec = 元數據 + 觸發條件 × 效果 (+ per_card) (+ 成長)
//! ```
//!
//! 所有 Joker 都由同一個管線解釋（見 `joker.rs`），建構時即驗證。
//! `JokerRecord` 是資料表的列格式，可從 JSON 載入後轉成 `JokerSpec`。

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::cards::{Card, ACE, CLUB, DIAMOND, HEART, JACK, KING, QUEEN, SPADE};
use super::hand_types::HandId;
use crate::error::ConfigError;

// ============================================================================
// 卡牌過濾器
// ============================================================================

/// 卡牌過濾條件
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardFilter {
    /// 特定花色
    Suit(u8),

    /// 點數集合（Ace = 1）
    Ranks(Vec<u8>),

    /// 人頭牌（J, Q, K）
    FaceCard,

    /// 偶數牌（2, 4, 6, 8, 10）
    Even,

    /// 奇數牌（A, 3, 5, 7, 9）
    Odd,

    /// 任意卡牌
    Any,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        match self {
            Self::Suit(s) => card.suit() == *s,
            Self::Ranks(ranks) => ranks.contains(&card.rank()),
            Self::FaceCard => card.is_face(),
            Self::Even => card.is_even(),
            Self::Odd => card.is_odd(),
            Self::Any => true,
        }
    }

    /// 一張隨機牌符合條件的機率（標準牌組）
    pub fn frequency(&self) -> f64 {
        match self {
            Self::Suit(_) => 0.25,
            Self::Ranks(ranks) => ranks.len() as f64 / 13.0,
            Self::FaceCard => 3.0 / 13.0,
            Self::Even => 5.0 / 13.0,
            Self::Odd => 5.0 / 13.0,
            Self::Any => 1.0,
        }
    }

    fn validate(&self, id: &str) -> Result<(), ConfigError> {
        match self {
            Self::Suit(s) if *s > CLUB => Err(ConfigError::malformed(id, format!("suit {s} out of range"))),
            Self::Ranks(ranks) if ranks.is_empty() => {
                Err(ConfigError::malformed(id, "rank condition has an empty rank set"))
            }
            Self::Ranks(ranks) if ranks.iter().any(|r| !(ACE..=KING).contains(r)) => {
                Err(ConfigError::malformed(id, format!("rank set {ranks:?} out of range")))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CardFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suit(s) => write!(f, "{}", suit_name(*s)),
            Self::Ranks(ranks) => {
                let names: Vec<&str> = ranks
                    .iter()
                    .map(|&r| Card::try_new(r, SPADE).map_or("?", |c| c.rank_str()))
                    .collect();
                write!(f, "{}", names.join(" or "))
            }
            Self::FaceCard => write!(f, "face"),
            Self::Even => write!(f, "even rank"),
            Self::Odd => write!(f, "odd rank"),
            Self::Any => write!(f, "any"),
        }
    }
}

fn suit_name(suit: u8) -> &'static str {
    match suit {
        SPADE => "Spade",
        DIAMOND => "Diamond",
        HEART => "Heart",
        CLUB => "Club",
        _ => "?",
    }
}

fn parse_suit(value: &str) -> Option<u8> {
    match value.trim().to_ascii_lowercase().as_str() {
        "s" | "spade" | "spades" | "♠" => Some(SPADE),
        "d" | "diamond" | "diamonds" | "♦" => Some(DIAMOND),
        "h" | "heart" | "hearts" | "♥" => Some(HEART),
        "c" | "club" | "clubs" | "♣" => Some(CLUB),
        _ => None,
    }
}

fn parse_rank(value: &str) -> Option<u8> {
    match value.trim().to_ascii_uppercase().as_str() {
        "A" | "1" => Some(ACE),
        "T" | "10" => Some(10),
        "J" => Some(JACK),
        "Q" => Some(QUEEN),
        "K" => Some(KING),
        digits => digits.parse::<u8>().ok().filter(|n| (2..=9).contains(n)),
    }
}

// ============================================================================
// 觸發條件與效果
// ============================================================================

/// 觸發條件
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// 無條件觸發
    Always,

    /// 牌型匹配
    HandType(HandId),

    /// 線上任一張牌符合（per_card 時按張數計）
    Card(CardFilter),

    /// 由左至右第一張符合的牌（只觸發一次）
    FirstMatching(CardFilter),
}

/// 效果
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    Chips(i64),
    Mult(i64),
    /// 乘法 Mult（結果向零截斷為整數）
    XMult(f64),
    ChipsAndMult { chips: i64, mult: i64 },
}

impl Effect {
    pub fn is_multiplicative(&self) -> bool {
        matches!(self, Effect::XMult(_))
    }

    pub fn adds_chips(&self) -> bool {
        matches!(self, Effect::Chips(_) | Effect::ChipsAndMult { .. })
    }

    pub fn adds_mult(&self) -> bool {
        matches!(self, Effect::Mult(_) | Effect::ChipsAndMult { .. })
    }

    /// 加上成長值後的效果（只作用於加法效果）
    pub fn boosted(&self, bonus: i64) -> Effect {
        match *self {
            Effect::Chips(c) => Effect::Chips(c.saturating_add(bonus)),
            Effect::Mult(m) => Effect::Mult(m.saturating_add(bonus)),
            Effect::ChipsAndMult { chips, mult } => Effect::ChipsAndMult {
                chips: chips.saturating_add(bonus),
                mult: mult.saturating_add(bonus),
            },
            Effect::XMult(x) => Effect::XMult(x),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Chips(c) => write!(f, "+{c} Chips"),
            Effect::Mult(m) => write!(f, "+{m} Mult"),
            Effect::XMult(x) => write!(f, "×{x} Mult"),
            Effect::ChipsAndMult { chips, mult } => write!(f, "+{chips} Chips and +{mult} Mult"),
        }
    }
}

/// 成長計數器的累加時機
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowPer {
    /// 每條觸發的線立即累加
    Line,
    /// 每次計分（10 條線）至多累加一次，計分結束時提交
    Hand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Growth {
    pub step: i64,
    pub per: GrowPer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "common" | "" => Some(Rarity::Common),
            "uncommon" => Some(Rarity::Uncommon),
            "rare" => Some(Rarity::Rare),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }
}

// ============================================================================
// JokerSpec
// ============================================================================

/// 驗證過的 Joker 定義
#[derive(Clone, Debug, PartialEq)]
pub struct JokerSpec {
    pub id: String,
    pub name: String,
    pub trigger: Trigger,
    pub effect: Effect,
    /// 效果乘以符合條件的牌數（只允許 `Trigger::Card`）
    pub per_card: bool,
    /// 成長型 Joker：效果加上計數器值
    pub growth: Option<Growth>,
    pub rarity: Rarity,
    pub cost: i64,
    pub sell_value: i64,
}

const DEFAULT_COST: i64 = 4;

fn default_sell_value(cost: i64) -> i64 {
    (cost / 2).max(1)
}

impl JokerSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger: Trigger, effect: Effect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
            effect,
            per_card: false,
            growth: None,
            rarity: Rarity::Common,
            cost: DEFAULT_COST,
            sell_value: default_sell_value(DEFAULT_COST),
        }
    }

    pub fn per_card(mut self) -> Self {
        self.per_card = true;
        self
    }

    pub fn growing(mut self, step: i64, per: GrowPer) -> Self {
        self.growth = Some(Growth { step, per });
        self
    }

    /// 設定價格，同時重設賣價為 max(1, cost / 2)
    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self.sell_value = default_sell_value(cost);
        self
    }

    pub fn with_sell_value(mut self, sell_value: i64) -> Self {
        self.sell_value = sell_value;
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let id = self.id.as_str();

        match &self.trigger {
            Trigger::Card(filter) | Trigger::FirstMatching(filter) => filter.validate(id)?,
            Trigger::Always | Trigger::HandType(_) => {}
        }

        if self.per_card && !matches!(self.trigger, Trigger::Card(_)) {
            return Err(ConfigError::malformed(id, "per_card requires a card condition"));
        }

        if let Effect::XMult(factor) = self.effect {
            if !factor.is_finite() || factor < 0.0 {
                return Err(ConfigError::malformed(id, format!("invalid multiplier {factor}")));
            }
        }

        if let Some(growth) = self.growth {
            if self.effect.is_multiplicative() {
                return Err(ConfigError::malformed(id, "growth is not supported on a multiplicative effect"));
            }
            if growth.step < 0 {
                return Err(ConfigError::malformed(id, format!("negative growth step {}", growth.step)));
            }
        }

        if self.cost < 0 || self.sell_value < 0 {
            return Err(ConfigError::malformed(id, "cost and sell value must be non-negative"));
        }

        Ok(())
    }

    /// 說明文字（成長型以計數器為 0 顯示）
    pub fn description(&self) -> String {
        self.description_with_growth(0)
    }

    /// 說明文字，成長型顯示目前累積值
    pub fn description_with_growth(&self, current: i64) -> String {
        if let Some(growth) = self.growth {
            let kind = match self.effect {
                Effect::Chips(_) => "Chips",
                Effect::Mult(_) => "Mult",
                _ => "Chips and Mult",
            };
            return match &self.trigger {
                Trigger::HandType(hand) => format!(
                    "Gains +{} {kind} per {} scored (currently +{current})",
                    growth.step,
                    hand.name()
                ),
                _ => format!("Gains +{} {kind} (currently +{current})", growth.step),
            };
        }

        match &self.trigger {
            Trigger::Always => self.effect.to_string(),
            Trigger::HandType(hand) => format!("{} if hand is a {}", self.effect, hand.name()),
            Trigger::Card(filter) if self.per_card => {
                format!("{} per {filter} card scored", self.effect)
            }
            Trigger::Card(filter) => format!("{} if line has a {filter} card", self.effect),
            Trigger::FirstMatching(filter) => {
                format!("First {filter} card in each line gives {}", self.effect)
            }
        }
    }
}

// ============================================================================
// 資料表列格式
// ============================================================================

/// 加成值：數字或 "20c4m" 這類複合格式
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BonusValue {
    Number(f64),
    Text(String),
}

impl BonusValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            BonusValue::Number(n) => Some(*n),
            BonusValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Joker 資料表的一列
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JokerRecord {
    pub id: String,
    pub name: String,
    /// "instant" 或 "growing"
    #[serde(default)]
    pub effect_type: String,
    /// "always" 或 "on_scored"
    #[serde(default)]
    pub trigger: String,
    /// "", "hand_type", "suit", "rank", "card_type", "rank_parity", "card_position"
    #[serde(default)]
    pub condition_type: String,
    #[serde(default)]
    pub condition_value: String,
    /// "+m", "+c", "Xm", "++"
    pub bonus_type: String,
    pub bonus_value: BonusValue,
    #[serde(default)]
    pub per_card: bool,
    /// "line" 或 "hand"
    #[serde(default)]
    pub grow_per: Option<String>,
    #[serde(default)]
    pub rarity: String,
    #[serde(default = "default_record_cost")]
    pub cost: i64,
    #[serde(default)]
    pub sell_value: Option<i64>,
    #[serde(default)]
    pub notes: String,
}

fn default_record_cost() -> i64 {
    DEFAULT_COST
}

impl JokerRecord {
    fn condition(&self) -> Result<Trigger, ConfigError> {
        let id = self.id.as_str();
        let value = self.condition_value.trim();
        let lowered = value.to_ascii_lowercase();

        let trigger = match self.condition_type.trim() {
            "" => Trigger::Always,
            "hand_type" => Trigger::HandType(
                HandId::from_name(value).ok_or_else(|| ConfigError::UnknownHandCategory(value.to_string()))?,
            ),
            "suit" => Trigger::Card(CardFilter::Suit(
                parse_suit(value).ok_or_else(|| ConfigError::malformed(id, format!("unknown suit {value:?}")))?,
            )),
            "rank" => {
                let ranks = value
                    .split('|')
                    .filter(|r| !r.trim().is_empty())
                    .map(|r| parse_rank(r).ok_or_else(|| ConfigError::malformed(id, format!("unknown rank {r:?}"))))
                    .collect::<Result<Vec<_>, _>>()?;
                Trigger::Card(CardFilter::Ranks(ranks))
            }
            "card_type" if lowered == "face" => Trigger::Card(CardFilter::FaceCard),
            "card_type" if lowered == "any" => Trigger::Card(CardFilter::Any),
            "rank_parity" if lowered == "even" => Trigger::Card(CardFilter::Even),
            "rank_parity" if lowered == "odd" => Trigger::Card(CardFilter::Odd),
            "card_position" if lowered == "first_face" => Trigger::FirstMatching(CardFilter::FaceCard),
            other => {
                return Err(ConfigError::malformed(
                    id,
                    format!("unknown condition {other:?} = {value:?}"),
                ))
            }
        };
        Ok(trigger)
    }

    fn effect(&self) -> Result<Effect, ConfigError> {
        let id = self.id.as_str();
        let number = || {
            self.bonus_value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConfigError::malformed(id, format!("bad bonus value {:?}", self.bonus_value)))
        };

        let effect = match self.bonus_type.trim() {
            "+m" => Effect::Mult(number()? as i64),
            "+c" => Effect::Chips(number()? as i64),
            "Xm" | "xm" => Effect::XMult(number()?),
            "++" => {
                let text = match &self.bonus_value {
                    BonusValue::Text(s) => s.trim().to_ascii_lowercase(),
                    BonusValue::Number(_) => String::new(),
                };
                let parsed = text
                    .strip_suffix('m')
                    .and_then(|rest| rest.split_once('c'))
                    .and_then(|(c, m)| Some((c.parse().ok()?, m.parse().ok()?)));
                let (chips, mult) = parsed
                    .ok_or_else(|| ConfigError::malformed(id, format!("bad combined bonus {text:?}")))?;
                Effect::ChipsAndMult { chips, mult }
            }
            other => return Err(ConfigError::malformed(id, format!("unknown bonus type {other:?}"))),
        };
        Ok(effect)
    }
}

impl TryFrom<JokerRecord> for JokerSpec {
    type Error = ConfigError;

    fn try_from(record: JokerRecord) -> Result<Self, Self::Error> {
        let id = record.id.as_str();

        let trigger = match record.trigger.trim().to_ascii_lowercase().as_str() {
            "always" => Trigger::Always,
            "" | "on_scored" => record.condition()?,
            other => return Err(ConfigError::malformed(id, format!("unknown trigger {other:?}"))),
        };
        let mut effect = record.effect()?;

        // 複合加成對卡牌條件一律按張數計
        let per_card = record.per_card
            || (matches!(effect, Effect::ChipsAndMult { .. }) && matches!(trigger, Trigger::Card(_)));

        let growth = match record.effect_type.trim().to_ascii_lowercase().as_str() {
            "" | "instant" => None,
            "growing" => {
                let per = match record.grow_per.as_deref().map(str::trim) {
                    Some("line") => GrowPer::Line,
                    Some("hand") => GrowPer::Hand,
                    other => {
                        return Err(ConfigError::malformed(id, format!("unknown grow_per {other:?}")))
                    }
                };
                // 加成值即每次成長量，起始效果為 0
                let step = match effect {
                    Effect::Chips(v) | Effect::Mult(v) => v,
                    _ => return Err(ConfigError::malformed(id, "growth needs a +c or +m bonus")),
                };
                effect = effect.boosted(-step);
                Some(Growth { step, per })
            }
            other => return Err(ConfigError::malformed(id, format!("unknown effect type {other:?}"))),
        };

        let rarity = Rarity::from_name(&record.rarity)
            .ok_or_else(|| ConfigError::malformed(id, format!("unknown rarity {:?}", record.rarity)))?;

        let spec = JokerSpec {
            id: record.id.clone(),
            name: record.name.clone(),
            trigger,
            effect,
            per_card,
            growth,
            rarity,
            cost: record.cost,
            sell_value: record.sell_value.unwrap_or_else(|| default_sell_value(record.cost)),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// 解析 JSON 陣列形式的 Joker 資料表
pub fn parse_jokers_json(json: &str) -> Result<Vec<JokerSpec>, ConfigError> {
    let records: Vec<JokerRecord> = serde_json::from_str(json)?;
    records.into_iter().map(JokerSpec::try_from).collect()
}

/// 從檔案載入 Joker 資料表
pub fn load_jokers_json<P: AsRef<Path>>(path: P) -> Result<Vec<JokerSpec>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let jokers = parse_jokers_json(&content)?;
    log::debug!("loaded {} jokers from {}", jokers.len(), path.display());
    Ok(jokers)
}

// ============================================================================
// 內建 Joker 表
// ============================================================================

/// 內建 Joker 目錄（商店預設貨源）
pub fn standard_jokers() -> Vec<JokerSpec> {
    use CardFilter as F;
    use Effect as E;
    use Trigger as T;

    vec![
        JokerSpec::new("j_001", "Joker", T::Always, E::Mult(4)).with_cost(2),
        JokerSpec::new("j_002", "Greedy Joker", T::Card(F::Suit(DIAMOND)), E::Mult(3)).per_card().with_cost(5),
        JokerSpec::new("j_003", "Lusty Joker", T::Card(F::Suit(HEART)), E::Mult(3)).per_card().with_cost(5),
        JokerSpec::new("j_004", "Wrathful Joker", T::Card(F::Suit(SPADE)), E::Mult(3)).per_card().with_cost(5),
        JokerSpec::new("j_005", "Gluttonous Joker", T::Card(F::Suit(CLUB)), E::Mult(3)).per_card().with_cost(5),
        JokerSpec::new("j_006", "Jolly Joker", T::HandType(HandId::Pair), E::Mult(8)).with_cost(3),
        JokerSpec::new("j_007", "Zany Joker", T::HandType(HandId::ThreeKind), E::Mult(12)).with_cost(4),
        JokerSpec::new("j_008", "Mad Joker", T::HandType(HandId::TwoPair), E::Mult(10)).with_cost(4),
        JokerSpec::new("j_009", "Crazy Joker", T::HandType(HandId::Straight), E::Mult(12)).with_cost(4),
        JokerSpec::new("j_010", "Droll Joker", T::HandType(HandId::Flush), E::Mult(10)).with_cost(4),
        JokerSpec::new("j_011", "Sly Joker", T::HandType(HandId::Pair), E::Chips(50)).with_cost(3),
        JokerSpec::new("j_012", "Wily Joker", T::HandType(HandId::ThreeKind), E::Chips(100)).with_cost(4),
        JokerSpec::new("j_013", "Clever Joker", T::HandType(HandId::TwoPair), E::Chips(80)).with_cost(4),
        JokerSpec::new("j_014", "Devious Joker", T::HandType(HandId::Straight), E::Chips(100)).with_cost(4),
        JokerSpec::new("j_015", "Crafty Joker", T::HandType(HandId::Flush), E::Chips(80)).with_cost(4),
        JokerSpec::new("j_016", "Scary Face", T::Card(F::FaceCard), E::Chips(30)).per_card().with_cost(4),
        JokerSpec::new("j_017", "Even Steven", T::Card(F::Even), E::Mult(4)).per_card().with_cost(4),
        JokerSpec::new("j_018", "Odd Todd", T::Card(F::Odd), E::Chips(31)).per_card().with_cost(4),
        JokerSpec::new("j_019", "Fibonacci", T::Card(F::Ranks(vec![ACE, 2, 3, 5, 8])), E::Mult(8))
            .per_card()
            .with_cost(8)
            .with_rarity(Rarity::Uncommon),
        JokerSpec::new("j_020", "Scholar", T::Card(F::Ranks(vec![ACE])), E::ChipsAndMult { chips: 20, mult: 4 })
            .per_card()
            .with_cost(4),
        JokerSpec::new("j_021", "Walkie Talkie", T::Card(F::Ranks(vec![10, 4])), E::ChipsAndMult { chips: 10, mult: 4 })
            .per_card()
            .with_cost(4),
        JokerSpec::new("j_022", "Photograph", T::FirstMatching(F::FaceCard), E::XMult(2.0)).with_cost(5),
        JokerSpec::new("j_023", "Cavendish", T::Always, E::XMult(3.0))
            .with_cost(4)
            .with_rarity(Rarity::Uncommon),
        JokerSpec::new("j_024", "Runner", T::HandType(HandId::Straight), E::Chips(0))
            .growing(15, GrowPer::Line)
            .with_cost(5),
        JokerSpec::new("j_025", "Green Joker", T::Always, E::Mult(0))
            .growing(1, GrowPer::Hand)
            .with_cost(4),
        JokerSpec::new("j_026", "Spare Trousers", T::HandType(HandId::TwoPair), E::Mult(0))
            .growing(2, GrowPer::Line)
            .with_cost(6)
            .with_rarity(Rarity::Uncommon),
    ]
}

// ============================================================================
// 單元測試
// ============================================================================
