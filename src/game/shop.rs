//! 商店視圖
//!
//! 商店的交易與刷新由外部回合流程負責；這裡只描述 AI 決策需要看到的內容。

use super::joker_def::JokerSpec;

/// 商店物品
#[derive(Clone, Debug, PartialEq)]
pub struct ShopOffer {
    pub joker: JokerSpec,
    pub cost: i64,
}

impl ShopOffer {
    /// 以 Joker 定價上架
    pub fn new(joker: JokerSpec) -> Self {
        let cost = joker.cost;
        Self { joker, cost }
    }

    pub fn with_cost(joker: JokerSpec, cost: i64) -> Self {
        Self { joker, cost }
    }
}

/// 商店當前狀態（唯讀）
#[derive(Clone, Debug, PartialEq)]
pub struct ShopView {
    pub offers: Vec<ShopOffer>,
    pub reroll_cost: i64,
    pub money: i64,
}

impl ShopView {
    pub fn new(offers: Vec<ShopOffer>, reroll_cost: i64, money: i64) -> Self {
        Self {
            offers,
            reroll_cost,
            money,
        }
    }

    pub fn can_afford(&self, index: usize) -> bool {
        self.offers.get(index).is_some_and(|o| o.cost <= self.money)
    }

    pub fn can_reroll(&self) -> bool {
        self.reroll_cost <= self.money
    }

    /// 買得起的物品索引
    pub fn affordable(&self) -> impl Iterator<Item = usize> + '_ {
        self.offers
            .iter()
            .enumerate()
            .filter(|(_, o)| o.cost <= self.money)
            .map(|(i, _)| i)
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::joker_def::{Effect, Trigger};

    fn offer(cost: i64) -> ShopOffer {
        ShopOffer::new(JokerSpec::new("j", "J", Trigger::Always, Effect::Mult(4)).with_cost(cost))
    }

    #[test]
    fn test_affordability() {
        let shop = ShopView::new(vec![offer(3), offer(8), offer(5)], 5, 5);
        assert!(shop.can_afford(0));
        assert!(!shop.can_afford(1));
        assert!(!shop.can_afford(7));
        assert!(shop.can_reroll());
        assert_eq!(shop.affordable().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_offer_price_from_joker() {
        assert_eq!(offer(6).cost, 6);
        let discounted = ShopOffer::with_cost(offer(6).joker, 2);
        assert_eq!(discounted.cost, 2);
    }
}
