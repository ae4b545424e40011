//! 牌型定義

use serde::{Deserialize, Serialize};

/// 牌型 ID
///
/// 變體順序即強弱順序（HighCard 最弱，FiveKind 最強）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandId {
    HighCard,
    Pair,
    TwoPair,
    ThreeKind,
    Straight,
    Flush,
    FullHouse,
    FourKind,
    StraightFlush,
    RoyalFlush,
    FiveKind, // 5 張相同點數（抽牌放回時才可能出現）
}

pub const HAND_TYPE_COUNT: usize = 11;

impl HandId {
    pub const ALL: [HandId; HAND_TYPE_COUNT] = [
        HandId::HighCard,
        HandId::Pair,
        HandId::TwoPair,
        HandId::ThreeKind,
        HandId::Straight,
        HandId::Flush,
        HandId::FullHouse,
        HandId::FourKind,
        HandId::StraightFlush,
        HandId::RoyalFlush,
        HandId::FiveKind,
    ];

    /// 預設的基礎 chips 和 mult
    pub fn base_values(&self) -> (i64, i64) {
        match self {
            HandId::HighCard => (5, 1),
            HandId::Pair => (10, 2),
            HandId::TwoPair => (20, 2),
            HandId::ThreeKind => (30, 3),
            HandId::Straight => (30, 4),
            HandId::Flush => (35, 4),
            HandId::FullHouse => (40, 4),
            HandId::FourKind => (60, 7),
            HandId::StraightFlush => (100, 8),
            HandId::RoyalFlush => (100, 8),
            HandId::FiveKind => (120, 12),
        }
    }

    pub fn to_index(&self) -> usize {
        *self as usize
    }

    /// 顯示名稱（也是設定檔中的 key）
    pub fn name(&self) -> &'static str {
        match self {
            HandId::HighCard => "High Card",
            HandId::Pair => "One Pair",
            HandId::TwoPair => "Two Pair",
            HandId::ThreeKind => "Three of a Kind",
            HandId::Straight => "Straight",
            HandId::Flush => "Flush",
            HandId::FullHouse => "Full House",
            HandId::FourKind => "Four of a Kind",
            HandId::StraightFlush => "Straight Flush",
            HandId::RoyalFlush => "Royal Flush",
            HandId::FiveKind => "Five of a Kind",
        }
    }

    /// 從名稱解析，接受 "One Pair" / "Pair" 等別名，不分大小寫
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let id = match normalized.as_str() {
            "highcard" => HandId::HighCard,
            "pair" | "onepair" => HandId::Pair,
            "twopair" => HandId::TwoPair,
            "threeofakind" | "threekind" | "trips" => HandId::ThreeKind,
            "straight" => HandId::Straight,
            "flush" => HandId::Flush,
            "fullhouse" => HandId::FullHouse,
            "fourofakind" | "fourkind" | "quads" => HandId::FourKind,
            "straightflush" => HandId::StraightFlush,
            "royalflush" => HandId::RoyalFlush,
            "fiveofakind" | "fivekind" => HandId::FiveKind,
            _ => return None,
        };
        Some(id)
    }

    /// 五張牌全部參與牌型
    pub fn uses_all_cards(&self) -> bool {
        matches!(
            self,
            HandId::Straight
                | HandId::Flush
                | HandId::FullHouse
                | HandId::StraightFlush
                | HandId::RoyalFlush
                | HandId::FiveKind
        )
    }
}

/// 單條線的牌型判定結果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandResult {
    pub id: HandId,
    pub base_chips: i64,
    pub base_mult: i64,
    /// 順子為循環連續段的頂端牌值，其餘為最大牌值（Ace = 14）
    pub high_value: u8,
}

impl HandResult {
    /// 計算原始分數（不含 Joker 效果）
    pub fn raw_score(&self) -> i64 {
        self.base_chips * self.base_mult
    }
}

// ============================================================================
// 單元測試
// ============================================================================
