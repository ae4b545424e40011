//! 凍結候選生成
//!
//! 以幾個直覺規則當種子（不凍結、同行/列最大對子、同花最大兩張、最大單張、最大兩張），
//! 再補上其餘的對子與同花組合，去重後截到上限。

use std::collections::HashSet;

use crate::game::{Card, Grid};

/// 候選的來源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    NoFreeze,
    AlignedPair,
    SuitedPair,
    HighSingle,
    HighTwo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FreezeCandidate {
    pub cells: Vec<(usize, usize)>,
    pub kind: CandidateKind,
}

impl FreezeCandidate {
    fn new(mut cells: Vec<(usize, usize)>, kind: CandidateKind, max_freezes: usize) -> Self {
        cells.truncate(max_freezes);
        Self { cells, kind }
    }

    /// 與順序無關的比較 key
    pub fn key(&self) -> Vec<(usize, usize)> {
        let mut key = self.cells.clone();
        key.sort_unstable();
        key
    }

    pub fn same_cells(&self, cells: &[(usize, usize)]) -> bool {
        let mut other = cells.to_vec();
        other.sort_unstable();
        self.key() == other
    }
}

fn cards_with_pos(grid: &Grid) -> Vec<(Card, usize, usize)> {
    grid.cells().map(|(r, c, card)| (card, r, c)).collect()
}

/// 同行或同列的所有對子，依點數值由大到小（同值保持掃描順序）
pub fn aligned_pairs(grid: &Grid) -> Vec<[(usize, usize); 2]> {
    let cards = cards_with_pos(grid);
    let mut pairs: Vec<(u8, [(usize, usize); 2])> = Vec::new();
    for (i, &(a, r1, c1)) in cards.iter().enumerate() {
        for &(b, r2, c2) in &cards[i + 1..] {
            if a.rank() == b.rank() && (r1 == r2 || c1 == c2) {
                pairs.push((a.value(), [(r1, c1), (r2, c2)]));
            }
        }
    }
    pairs.sort_by(|x, y| y.0.cmp(&x.0));
    pairs.into_iter().map(|(_, p)| p).collect()
}

/// 點數最大的同行/列對子
pub fn best_aligned_pair(grid: &Grid) -> Option<[(usize, usize); 2]> {
    aligned_pairs(grid).into_iter().next()
}

/// 每個花色最大的兩張，依兩張點數和由大到小
pub fn suited_pairs(grid: &Grid) -> Vec<[(usize, usize); 2]> {
    let cards = cards_with_pos(grid);
    let mut by_suit: Vec<(u32, [(usize, usize); 2])> = Vec::new();
    for suit in 0..4u8 {
        let mut items: Vec<&(Card, usize, usize)> = cards.iter().filter(|(c, _, _)| c.suit() == suit).collect();
        if items.len() < 2 {
            continue;
        }
        items.sort_by(|a, b| b.0.value().cmp(&a.0.value()));
        let sum = items[0].0.value() as u32 + items[1].0.value() as u32;
        by_suit.push((sum, [(items[0].1, items[0].2), (items[1].1, items[1].2)]));
    }
    by_suit.sort_by(|x, y| y.0.cmp(&x.0));
    by_suit.into_iter().map(|(_, p)| p).collect()
}

/// 最大兩張點數和最高的同花組合
pub fn best_suited_pair(grid: &Grid) -> Option<[(usize, usize); 2]> {
    suited_pairs(grid).into_iter().next()
}

/// 點數最大的格子，由大到小
fn highest_cells(grid: &Grid) -> Vec<(usize, usize)> {
    let mut cards = cards_with_pos(grid);
    cards.sort_by(|a, b| b.0.value().cmp(&a.0.value()));
    cards.into_iter().map(|(_, r, c)| (r, c)).collect()
}

/// 若候選包含兩張相同點數的牌，回傳該點數值
pub fn pair_value(grid: &Grid, cells: &[(usize, usize)]) -> Option<u8> {
    let cards: Vec<Card> = cells.iter().filter_map(|&(r, c)| grid.card(r, c).ok()).collect();
    cards
        .iter()
        .enumerate()
        .flat_map(|(i, a)| cards[i + 1..].iter().filter(move |b| b.rank() == a.rank()).map(move |_| a.value()))
        .max()
}

/// 生成凍結候選
///
/// 第一個一定是「不凍結」；每個候選最多 `max_freezes` 格，總數不超過 `cap`。
pub fn generate_freeze_candidates(grid: &Grid, max_freezes: usize, cap: usize) -> Vec<FreezeCandidate> {
    let mut seeds = vec![FreezeCandidate::new(Vec::new(), CandidateKind::NoFreeze, max_freezes)];

    if max_freezes > 0 {
        let aligned = aligned_pairs(grid);
        let suited = suited_pairs(grid);
        let highest = highest_cells(grid);

        if let Some(pair) = aligned.first() {
            seeds.push(FreezeCandidate::new(pair.to_vec(), CandidateKind::AlignedPair, max_freezes));
        }
        if let Some(pair) = suited.first() {
            seeds.push(FreezeCandidate::new(pair.to_vec(), CandidateKind::SuitedPair, max_freezes));
        }
        if let Some(&top) = highest.first() {
            seeds.push(FreezeCandidate::new(vec![top], CandidateKind::HighSingle, max_freezes));
        }
        if highest.len() > 1 && max_freezes >= 2 {
            seeds.push(FreezeCandidate::new(highest[..2].to_vec(), CandidateKind::HighTwo, max_freezes));
        }

        // 擴充：其餘對子與同花組合
        for pair in aligned.iter().skip(1) {
            seeds.push(FreezeCandidate::new(pair.to_vec(), CandidateKind::AlignedPair, max_freezes));
        }
        for pair in suited.iter().skip(1) {
            seeds.push(FreezeCandidate::new(pair.to_vec(), CandidateKind::SuitedPair, max_freezes));
        }
    }

    let mut seen = HashSet::new();
    seeds
        .into_iter()
        .filter(|cand| seen.insert(cand.key()))
        .take(cap)
        .collect()
}

// ============================================================================
// 單元測試
// ============================================================================
