//! 卡牌定義

use std::fmt;
use std::str::FromStr;

use super::constants::{DECK_SIZE, RANK_COUNT, SUIT_COUNT};
use crate::error::EngineError;

// ============================================================================
// 花色常量
// ============================================================================

pub const SPADE: u8 = 0;
pub const DIAMOND: u8 = 1;
pub const HEART: u8 = 2;
pub const CLUB: u8 = 3;

pub const ACE: u8 = 1;
pub const JACK: u8 = 11;
pub const QUEEN: u8 = 12;
pub const KING: u8 = 13;

const SUIT_CHARS: [char; SUIT_COUNT] = ['S', 'D', 'H', 'C'];
const SUIT_SYMBOLS: [char; SUIT_COUNT] = ['♠', '♦', '♥', '♣'];

/// 一張牌；欄位私有，建構時即保證點數與花色合法
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    rank: u8, // 1..=13 (Ace = 1)
    suit: u8, // 0..=3
}

impl Card {
    /// 以常量建立
    ///
    /// # Panics
    /// 點數不在 1..=13 或花色不在 0..4 時 panic；執行期輸入請用 `try_new`。
    pub const fn new(rank: u8, suit: u8) -> Self {
        assert!(rank >= 1 && rank <= KING, "rank out of range");
        assert!((suit as usize) < SUIT_COUNT, "suit out of range");
        Self { rank, suit }
    }

    pub fn try_new(rank: u8, suit: u8) -> Result<Self, EngineError> {
        if !(ACE..=KING).contains(&rank) {
            return Err(EngineError::invalid(format!("rank out of range: {rank}")));
        }
        if suit as usize >= SUIT_COUNT {
            return Err(EngineError::invalid(format!("suit out of range: {suit}")));
        }
        Ok(Self { rank, suit })
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn suit(&self) -> u8 {
        self.suit
    }

    /// 比較用點數值（Ace = 14）
    pub fn value(&self) -> u8 {
        if self.rank == ACE {
            14
        } else {
            self.rank
        }
    }

    /// 13 格循環上的位置：2 -> 0, ..., K -> 11, A -> 12
    ///
    /// 環繞順子在此循環上判定，A 同時與 K 和 2 相鄰。
    pub fn cycle_index(&self) -> u8 {
        (self.rank + 11) % 13
    }

    /// 是否為面牌 (J, Q, K)
    pub fn is_face(&self) -> bool {
        self.rank >= JACK && self.rank <= KING
    }

    /// 偶數牌（2, 4, 6, 8, 10）
    pub fn is_even(&self) -> bool {
        matches!(self.rank, 2 | 4 | 6 | 8 | 10)
    }

    /// 奇數牌（A, 3, 5, 7, 9）
    pub fn is_odd(&self) -> bool {
        matches!(self.rank, 1 | 3 | 5 | 7 | 9)
    }

    pub fn rank_str(&self) -> &'static str {
        match self.rank {
            1 => "A",
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            9 => "9",
            10 => "T",
            11 => "J",
            12 => "Q",
            _ => "K",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = SUIT_SYMBOLS.get(self.suit as usize).copied().unwrap_or('?');
        write!(f, "{}{}", self.rank_str(), symbol)
    }
}

/// 解析 "AS", "TD", "10H", "qc" 這類牌碼
impl FromStr for Card {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars: Vec<char> = s.chars().collect();
        let suit_char = chars
            .pop()
            .ok_or_else(|| EngineError::invalid("empty card code"))?
            .to_ascii_uppercase();
        let suit = match suit_char {
            'S' | '♠' => SPADE,
            'D' | '♦' => DIAMOND,
            'H' | '♥' => HEART,
            'C' | '♣' => CLUB,
            _ => return Err(EngineError::invalid(format!("bad suit in card code {s:?}"))),
        };
        let rank_part: String = chars.into_iter().collect::<String>().to_ascii_uppercase();
        let rank = match rank_part.as_str() {
            "A" | "1" => ACE,
            "T" | "10" => 10,
            "J" => JACK,
            "Q" => QUEEN,
            "K" => KING,
            digits => match digits.parse::<u8>() {
                Ok(n) if (2..=9).contains(&n) => n,
                _ => return Err(EngineError::invalid(format!("bad rank in card code {s:?}"))),
            },
        };
        Card::try_new(rank, suit)
    }
}

/// 花色字元（S/D/H/C）
pub fn suit_char(suit: u8) -> char {
    SUIT_CHARS.get(suit as usize).copied().unwrap_or('?')
}

/// 創建標準 52 張牌組
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in 0..SUIT_COUNT as u8 {
        for rank in ACE..=KING {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

/// 獲取卡片在 52 張牌組中的索引
pub fn card_index(card: Card) -> usize {
    (card.suit as usize * RANK_COUNT) + (card.rank as usize - 1)
}

/// 解析空白分隔的牌碼列表
pub fn parse_cards(codes: &str) -> Result<Vec<Card>, EngineError> {
    codes.split_whitespace().map(str::parse).collect()
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_card_value_ace_high() {
        assert_eq!(Card::new(1, SPADE).value(), 14);
        assert_eq!(Card::new(13, SPADE).value(), 13);
        assert_eq!(Card::new(2, HEART).value(), 2);
    }

    #[test]
    fn test_cycle_index_wraps_ace_between_king_and_two() {
        assert_eq!(Card::new(2, SPADE).cycle_index(), 0);
        assert_eq!(Card::new(13, SPADE).cycle_index(), 11);
        assert_eq!(Card::new(1, SPADE).cycle_index(), 12);
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert_eq!(Card::try_new(ACE, SPADE).unwrap(), Card::new(ACE, SPADE));
        assert!(Card::try_new(0, SPADE).is_err());
        assert!(Card::try_new(14, SPADE).is_err());
        assert!(Card::try_new(ACE, 7).is_err());

        let card = Card::try_new(QUEEN, CLUB).unwrap();
        assert_eq!((card.rank(), card.suit()), (QUEEN, CLUB));
    }

    #[test]
    #[should_panic(expected = "suit out of range")]
    fn test_new_panics_on_bad_suit() {
        let _ = Card::new(ACE, 7);
    }

    #[test]
    fn test_face_and_parity() {
        assert!(Card::new(11, CLUB).is_face());
        assert!(Card::new(13, CLUB).is_face());
        assert!(!Card::new(1, CLUB).is_face());
        assert!(Card::new(10, CLUB).is_even());
        assert!(Card::new(1, CLUB).is_odd());
        assert!(!Card::new(12, CLUB).is_even());
        assert!(!Card::new(12, CLUB).is_odd());
    }

    #[test]
    fn test_parse_card_codes() {
        assert_eq!("AS".parse::<Card>().unwrap(), Card::new(1, SPADE));
        assert_eq!("td".parse::<Card>().unwrap(), Card::new(10, DIAMOND));
        assert_eq!("10H".parse::<Card>().unwrap(), Card::new(10, HEART));
        assert_eq!("7C".parse::<Card>().unwrap(), Card::new(7, CLUB));
        assert!("1X".parse::<Card>().is_err());
        assert!("ZS".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }

    #[test]
    fn test_display_round_trip_symbols() {
        assert_eq!(Card::new(1, SPADE).to_string(), "A♠");
        assert_eq!(Card::new(10, HEART).to_string(), "T♥");
        assert_eq!("T♥".parse::<Card>().unwrap(), Card::new(10, HEART));
        assert_eq!(suit_char(DIAMOND), 'D');
    }

    #[test]
    fn test_standard_deck_and_index() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 52);

        let mut seen = HashSet::new();
        for card in deck {
            let idx = card_index(card);
            assert!(seen.insert(idx));
        }
        assert_eq!(seen.len(), 52);
    }
}
