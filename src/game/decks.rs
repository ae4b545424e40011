//! 牌組與抽牌分佈
//!
//! 格子上的牌一律「抽後放回」：牌組本身不會因抽牌而減少，
//! 所以同一張牌可以同時出現在多個格子。

use rand::rngs::StdRng;
use rand::Rng;

use super::cards::{standard_deck, Card};
use crate::error::ConfigError;

/// 抽牌分佈
///
/// 由回合流程提供給格子發牌與 Monte Carlo 模擬使用；
/// 模擬會跨執行緒共用同一個分佈，因此要求 `Send + Sync`。
pub trait DrawDistribution: Send + Sync {
    /// 抽一張牌（放回）
    fn draw_with_replacement(&self, rng: &mut StdRng) -> Card;
}

/// 玩家的牌組（在其組成上均勻抽牌）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 標準 52 張牌組
    pub fn standard() -> Self {
        Self {
            cards: standard_deck(),
        }
    }

    /// 自訂組成，空牌組為設定錯誤
    pub fn with_cards(cards: Vec<Card>) -> Result<Self, ConfigError> {
        if cards.is_empty() {
            return Err(ConfigError::EmptyDeck);
        }
        Ok(Self { cards })
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// 移除一張指定的牌，回傳是否找到
    ///
    /// 牌組至少保留一張牌，移除最後一張回傳 `EmptyDeck`。
    pub fn remove_card(&mut self, card: Card) -> Result<bool, ConfigError> {
        let Some(pos) = self.cards.iter().position(|c| *c == card) else {
            return Ok(false);
        };
        if self.cards.len() == 1 {
            return Err(ConfigError::EmptyDeck);
        }
        self.cards.remove(pos);
        Ok(true)
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

impl DrawDistribution for Deck {
    fn draw_with_replacement(&self, rng: &mut StdRng) -> Card {
        // cards 非空由建構保證
        self.cards[rng.gen_range(0..self.cards.len())]
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{HEART, SPADE};
    use rand::SeedableRng;

    #[test]
    fn test_standard_deck_size() {
        assert_eq!(Deck::standard().size(), 52);
        assert_eq!(Deck::default(), Deck::standard());
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert!(matches!(Deck::with_cards(vec![]), Err(ConfigError::EmptyDeck)));
    }

    #[test]
    fn test_draw_is_with_replacement() {
        let deck = Deck::with_cards(vec![Card::new(1, SPADE)]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(deck.draw_with_replacement(&mut rng), Card::new(1, SPADE));
        }
        assert_eq!(deck.size(), 1);
    }

    #[test]
    fn test_add_and_remove_card() {
        let mut deck = Deck::with_cards(vec![Card::new(2, HEART)]).unwrap();
        deck.add_card(Card::new(3, HEART));
        assert_eq!(deck.size(), 2);

        assert!(deck.remove_card(Card::new(2, HEART)).unwrap());
        assert!(!deck.remove_card(Card::new(9, HEART)).unwrap());
        assert!(matches!(
            deck.remove_card(Card::new(3, HEART)),
            Err(ConfigError::EmptyDeck)
        ));
        assert_eq!(deck.size(), 1);
    }

    #[test]
    fn test_draw_covers_composition() {
        let deck = Deck::with_cards(vec![Card::new(2, HEART), Card::new(3, HEART)]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<Card> = (0..200).map(|_| deck.draw_with_replacement(&mut rng)).collect();
        assert!(draws.contains(&Card::new(2, HEART)));
        assert!(draws.contains(&Card::new(3, HEART)));
    }
}
