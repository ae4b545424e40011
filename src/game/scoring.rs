//! 牌型判定
//!
//! 單條線 5 張牌的牌型判定與基礎計分。
//! 順子在 13 格循環上判定，所以 Q-K-A-2-3 也算順子。

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::cards::Card;
use super::config::HandScoreTable;
use super::constants::{LINE_LEN, RANK_COUNT, SUIT_COUNT};
use super::hand_types::{HandId, HandResult};
use crate::error::{EngineError, Result};

/// 與分數表無關的判定結果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub id: HandId,
    pub high_value: u8,
}

fn check_line_len(line: &[Card]) -> Result<()> {
    if line.len() != LINE_LEN {
        return Err(EngineError::invalid(format!(
            "a line holds exactly {LINE_LEN} cards, got {}",
            line.len()
        )));
    }
    Ok(())
}

/// 13 格循環位置 -> 點數值（0 -> 2, ..., 11 -> K, 12 -> A = 14）
fn cycle_value(index: usize) -> u8 {
    index as u8 + 2
}

/// 判定牌型
pub fn classify(line: &[Card]) -> Result<Classification> {
    check_line_len(line)?;

    let mut rank_counts = [0u8; RANK_COUNT]; // 以循環位置為索引
    let mut suit_counts = [0u8; SUIT_COUNT];
    for card in line {
        rank_counts[card.cycle_index() as usize] += 1;
        suit_counts[card.suit() as usize] += 1;
    }

    let is_flush = suit_counts.iter().any(|&n| n as usize == LINE_LEN);
    let straight_top = check_straight(&rank_counts);
    let high_card = line.iter().map(Card::value).max().unwrap_or(0);

    let mut count_values: Vec<u8> = rank_counts.iter().copied().filter(|&n| n > 0).collect();
    count_values.sort_unstable_by(|a, b| b.cmp(a));

    let id = if count_values.first() == Some(&5) {
        HandId::FiveKind
    } else if is_flush && straight_top.is_some() {
        if is_royal(&rank_counts) {
            HandId::RoyalFlush
        } else {
            HandId::StraightFlush
        }
    } else if count_values.first() == Some(&4) {
        HandId::FourKind
    } else if count_values.first() == Some(&3) && count_values.get(1) == Some(&2) {
        HandId::FullHouse
    } else if is_flush {
        HandId::Flush
    } else if straight_top.is_some() {
        HandId::Straight
    } else if count_values.first() == Some(&3) {
        HandId::ThreeKind
    } else if count_values.first() == Some(&2) && count_values.get(1) == Some(&2) {
        HandId::TwoPair
    } else if count_values.first() == Some(&2) {
        HandId::Pair
    } else {
        HandId::HighCard
    };

    let high_value = straight_top.map(cycle_value).unwrap_or(high_card);
    Ok(Classification { id, high_value })
}

/// 判定牌型並查表得到基礎 chips / mult
pub fn evaluate(line: &[Card], table: &HandScoreTable) -> Result<HandResult> {
    let classification = classify(line)?;
    Ok(with_table(classification, table))
}

pub(crate) fn with_table(classification: Classification, table: &HandScoreTable) -> HandResult {
    let score = table.get(classification.id);
    HandResult {
        id: classification.id,
        base_chips: score.chips,
        base_mult: score.mult,
        high_value: classification.high_value,
    }
}

/// 循環順子檢查，回傳連續段頂端的循環位置
///
/// 需要 5 個不同點數佔據循環上連續的 5 格。
pub fn check_straight(rank_counts: &[u8; RANK_COUNT]) -> Option<usize> {
    let distinct = rank_counts.iter().filter(|&&n| n > 0).count();
    if distinct != LINE_LEN {
        return None;
    }
    (0..RANK_COUNT)
        .find(|&start| (0..LINE_LEN).all(|k| rank_counts[(start + k) % RANK_COUNT] > 0))
        .map(|start| (start + LINE_LEN - 1) % RANK_COUNT)
}

/// 點數正好是 T-J-Q-K-A（循環位置 8..=12）
pub fn is_royal(rank_counts: &[u8; RANK_COUNT]) -> bool {
    rank_counts[8] > 0      // 10
        && rank_counts[9] > 0   // J
        && rank_counts[10] > 0  // Q
        && rank_counts[11] > 0  // K
        && rank_counts[12] > 0 // A
}

/// 組成牌型的牌在線上的位置（用於高亮）
///
/// 5 張牌型回傳全部；對子/三條/四條回傳相同點數的組；高牌回傳最大的一張。
pub fn contributing_cards(line: &[Card], id: HandId) -> Vec<usize> {
    if id.uses_all_cards() {
        return (0..line.len()).collect();
    }

    let mut rank_counts = [0u8; 14];
    for card in line {
        rank_counts[card.rank() as usize] += 1;
    }

    let group_size = match id {
        HandId::FourKind => 4,
        HandId::ThreeKind => 3,
        HandId::Pair | HandId::TwoPair => 2,
        _ => {
            // HighCard
            let best = line
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| a.value().cmp(&b.value()).then(ib.cmp(ia)));
            return best.map(|(i, _)| vec![i]).unwrap_or_default();
        }
    };

    line.iter()
        .enumerate()
        .filter(|(_, c)| rank_counts[c.rank() as usize] == group_size)
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// 判定快取
// ============================================================================

/// 牌型判定快取
///
/// 以排序後的 5 張牌為 key，Monte Carlo 的各個 worker 共用同一份。
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entries: DashMap<[Card; LINE_LEN], Classification>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, line: &[Card]) -> Result<Classification> {
        check_line_len(line)?;
        let mut key = [Card::new(1, 0); LINE_LEN];
        key.copy_from_slice(line);
        key.sort_unstable();

        if let Some(hit) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let classification = classify(&key)?;
        self.entries.insert(key, classification);
        Ok(classification)
    }

    pub fn evaluate(&self, line: &[Card], table: &HandScoreTable) -> Result<HandResult> {
        Ok(with_table(self.classify(line)?, table))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (命中, 未命中)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{parse_cards, CLUB, DIAMOND, HEART, SPADE};
    use proptest::prelude::*;

    fn make_cards(ranks_suits: &[(u8, u8)]) -> Vec<Card> {
        ranks_suits.iter().map(|&(r, s)| Card::new(r, s)).collect()
    }

    fn hand(codes: &str) -> Classification {
        classify(&parse_cards(codes).unwrap()).unwrap()
    }

    #[test]
    fn test_high_card() {
        let cards = make_cards(&[(2, 0), (4, 1), (6, 2), (8, 3), (10, 0)]);
        let result = evaluate(&cards, &HandScoreTable::default()).unwrap();
        assert_eq!(result.id, HandId::HighCard);
        assert_eq!(result.base_chips, 5);
        assert_eq!(result.base_mult, 1);
        assert_eq!(result.high_value, 10);
    }

    #[test]
    fn test_pair_and_two_pair() {
        assert_eq!(hand("2S 2D 6H 8C TS").id, HandId::Pair);
        assert_eq!(hand("2S 2D 8H 8C TS").id, HandId::TwoPair);
        let result = evaluate(&parse_cards("2S 2D 6H 8C TS").unwrap(), &HandScoreTable::default()).unwrap();
        assert_eq!((result.base_chips, result.base_mult), (10, 2));
    }

    #[test]
    fn test_trips_full_house_quads() {
        assert_eq!(hand("7S 7D 7H 2C 9S").id, HandId::ThreeKind);
        assert_eq!(hand("7S 7D 7H 9C 9S").id, HandId::FullHouse);
        assert_eq!(hand("7S 7D 7H 7C 9S").id, HandId::FourKind);
    }

    #[test]
    fn test_five_of_a_kind_beats_four() {
        let result = hand("QS QD QH QC QS");
        assert_eq!(result.id, HandId::FiveKind);
        assert_eq!(result.high_value, 12);
    }

    #[test]
    fn test_straight_flush_not_flush() {
        assert_eq!(hand("5H 6H 7H 8H 9H").id, HandId::StraightFlush);
        assert_eq!(hand("2H 6H 7H 8H 9H").id, HandId::Flush);
        assert_eq!(hand("TS JS QS KS AS").id, HandId::RoyalFlush);
        // 環繞同花順不是皇家同花順
        assert_eq!(hand("QD KD AD 2D 3D").id, HandId::StraightFlush);
    }

    #[test]
    fn test_wrap_around_straights() {
        let wheel = hand("AS 2D 3H 4C 5S");
        assert_eq!(wheel.id, HandId::Straight);
        assert_eq!(wheel.high_value, 5);

        let broadway = hand("TS JD QH KC AS");
        assert_eq!(broadway.id, HandId::Straight);
        assert_eq!(broadway.high_value, 14);

        let wrap = hand("QS KD AH 2C 3S");
        assert_eq!(wrap.id, HandId::Straight);
        assert_eq!(wrap.high_value, 3);

        assert_eq!(hand("2S 3D 5H 6C 7S").id, HandId::HighCard);
        assert_eq!(hand("JS QD KH AC 3S").id, HandId::HighCard);
    }

    #[test]
    fn test_line_length_checked() {
        let four = make_cards(&[(2, SPADE), (3, SPADE), (4, SPADE), (5, SPADE)]);
        assert!(matches!(classify(&four), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_contributing_cards() {
        let cards = parse_cards("9S KD 9H 2C 4S").unwrap();
        assert_eq!(contributing_cards(&cards, HandId::Pair), vec![0, 2]);

        let cards = parse_cards("9S KD 9H KC 4S").unwrap();
        assert_eq!(contributing_cards(&cards, HandId::TwoPair), vec![0, 1, 2, 3]);

        let cards = parse_cards("9S KD AH 2C 4S").unwrap();
        assert_eq!(contributing_cards(&cards, HandId::HighCard), vec![2]);

        let cards = parse_cards("AS 2D 3H 4C 5S").unwrap();
        assert_eq!(contributing_cards(&cards, HandId::Straight), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_custom_table() {
        let table = HandScoreTable::default().with_score(HandId::Flush, 50, 5).unwrap();
        let cards = make_cards(&[(2, DIAMOND), (5, DIAMOND), (9, DIAMOND), (11, DIAMOND), (13, DIAMOND)]);
        let result = evaluate(&cards, &table).unwrap();
        assert_eq!(result.raw_score(), 250);
    }

    #[test]
    fn test_cache_matches_direct_classification() {
        let cache = ClassificationCache::new();
        let a = make_cards(&[(9, HEART), (9, CLUB), (3, SPADE), (4, SPADE), (13, DIAMOND)]);
        let b = make_cards(&[(13, DIAMOND), (4, SPADE), (9, CLUB), (3, SPADE), (9, HEART)]);
        assert_eq!(cache.classify(&a).unwrap(), classify(&a).unwrap());
        assert_eq!(cache.classify(&b).unwrap(), classify(&b).unwrap());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (1, 1));
        cache.clear();
        assert!(cache.is_empty());
    }

    fn line_strategy() -> impl Strategy<Value = Vec<Card>> {
        prop::collection::vec((1u8..=13, 0u8..4), LINE_LEN)
            .prop_map(|v| v.into_iter().map(|(r, s)| Card::new(r, s)).collect())
    }

    proptest! {
        #[test]
        fn classification_is_permutation_invariant(
            (line, shuffled) in line_strategy().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            prop_assert_eq!(classify(&line).unwrap(), classify(&shuffled).unwrap());
        }

        #[test]
        fn consecutive_cycle_positions_make_a_straight(start in 0usize..13, suits in prop::array::uniform5(0u8..4)) {
            let cards: Vec<Card> = (0..LINE_LEN)
                .map(|k| {
                    let idx = (start + k) % 13;
                    let rank = if idx == 12 { 1 } else { idx as u8 + 2 };
                    Card::new(rank, suits[k])
                })
                .collect();
            let result = classify(&cards).unwrap();
            prop_assert!(result.id >= HandId::Straight);
            prop_assert!(result.id != HandId::FullHouse && result.id != HandId::FourKind);
            prop_assert_eq!(result.high_value, cycle_value((start + 4) % 13));
        }
    }
}
