//! AI 決策代理
//!
//! - `NormalAgent`: 固定規則（凍結對子/同花，買第一張加法 Joker）
//! - `SmartAgent`: 以 Monte Carlo 期望分數排序凍結候選，商店以估值加權決定買/賣/刷新

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::candidates::{
    best_aligned_pair, best_suited_pair, generate_freeze_candidates, pair_value, FreezeCandidate,
};
use super::simulation::{CancelToken, Simulator};
use super::valuation::{JokerValuator, ShopWeights};
use crate::error::Result;
use crate::game::{
    ClassificationCache, DrawDistribution, Effect, GameConfig, Grid, GrowthState, JokerPipeline, ShopView,
    BUY_THRESHOLD, CANDIDATE_CAP, DEFAULT_SAMPLES, REROLL_MIN_VALUE, SELL_THRESHOLD,
};

// ============================================================================
// 決策上下文
// ============================================================================

/// 代理做決策時看到的唯讀狀態
#[derive(Clone)]
pub struct DecisionContext<'a> {
    pub grid: &'a Grid,
    pub config: &'a GameConfig,
    pub pipeline: &'a JokerPipeline,
    pub growth: &'a GrowthState,
    pub dist: &'a dyn DrawDistribution,
    pub samples: usize,
    pub hands_remaining: u32,
    /// 上一手的凍結格子（EV 相同時優先保留）
    pub previous_frozen: Vec<(usize, usize)>,
    pub cache: Option<&'a ClassificationCache>,
    pub cancel: Option<CancelToken>,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        grid: &'a Grid,
        config: &'a GameConfig,
        pipeline: &'a JokerPipeline,
        growth: &'a GrowthState,
        dist: &'a dyn DrawDistribution,
    ) -> Self {
        Self {
            grid,
            config,
            pipeline,
            growth,
            dist,
            samples: DEFAULT_SAMPLES,
            hands_remaining: config.hands_per_round,
            previous_frozen: Vec::new(),
            cache: None,
            cancel: None,
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_hands_remaining(mut self, hands: u32) -> Self {
        self.hands_remaining = hands;
        self
    }

    pub fn with_previous_frozen(mut self, cells: Vec<(usize, usize)>) -> Self {
        self.previous_frozen = cells;
        self
    }

    pub fn with_cache(mut self, cache: &'a ClassificationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn has_free_slot(&self) -> bool {
        self.pipeline.len() < self.config.joker_slots
    }

    pub fn simulator(&self) -> Simulator<'a> {
        let mut sim = Simulator::new(self.config, self.pipeline, self.growth, self.dist);
        if let Some(cache) = self.cache {
            sim = sim.with_cache(cache);
        }
        if let Some(token) = &self.cancel {
            sim = sim.with_cancel(token.clone());
        }
        sim
    }
}

// ============================================================================
// 商店動作
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopAction {
    /// 購買商店第 i 個物品
    Buy(usize),
    /// 賣掉第 i 張已擁有的 Joker
    Sell(usize),
    Reroll,
    None,
}

impl ShopAction {
    /// `("buy", i)` / `("sell", i)` / `("reroll", -1)` / `("none", -1)`
    pub fn as_pair(&self) -> (&'static str, i64) {
        match *self {
            ShopAction::Buy(i) => ("buy", i as i64),
            ShopAction::Sell(i) => ("sell", i as i64),
            ShopAction::Reroll => ("reroll", -1),
            ShopAction::None => ("none", -1),
        }
    }
}

impl fmt::Display for ShopAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (action, index) = self.as_pair();
        write!(f, "({action}, {index})")
    }
}

// ============================================================================
// 代理介面
// ============================================================================

pub trait DecisionAgent {
    /// 建議凍結的格子（最多 `config.max_freezes` 格）
    fn recommend_freezes(&mut self, ctx: &DecisionContext<'_>, rng: &mut StdRng) -> Result<Vec<(usize, usize)>>;

    /// 建議一個商店動作
    fn recommend_shop_action(
        &mut self,
        ctx: &DecisionContext<'_>,
        shop: &ShopView,
        rng: &mut StdRng,
    ) -> Result<ShopAction>;

    /// 最後一次決策的說明
    fn explain_last_decision(&self) -> &str;
}

// ============================================================================
// NormalAgent
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct NormalAgent {
    last_explanation: String,
}

impl NormalAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionAgent for NormalAgent {
    fn recommend_freezes(&mut self, ctx: &DecisionContext<'_>, _rng: &mut StdRng) -> Result<Vec<(usize, usize)>> {
        let max = ctx.config.max_freezes;
        let (mut cells, reason) = if max == 0 {
            (Vec::new(), "freezing disabled")
        } else if let Some(pair) = best_aligned_pair(ctx.grid) {
            (pair.to_vec(), "aligned pair")
        } else if let Some(pair) = best_suited_pair(ctx.grid) {
            (pair.to_vec(), "suited pair")
        } else {
            (Vec::new(), "nothing worth keeping")
        };
        cells.truncate(max);
        self.last_explanation = format!("Freeze {cells:?} ({reason})");
        Ok(cells)
    }

    fn recommend_shop_action(
        &mut self,
        ctx: &DecisionContext<'_>,
        shop: &ShopView,
        _rng: &mut StdRng,
    ) -> Result<ShopAction> {
        if ctx.has_free_slot() {
            let additive = shop
                .affordable()
                .find(|&i| matches!(shop.offers[i].joker.effect, Effect::Chips(_) | Effect::Mult(_)));
            if let Some(i) = additive {
                self.last_explanation = format!("Buy {} (first affordable additive joker)", shop.offers[i].joker.name);
                return Ok(ShopAction::Buy(i));
            }
        }
        if shop.can_reroll() {
            self.last_explanation = "Reroll".to_string();
            return Ok(ShopAction::Reroll);
        }
        self.last_explanation = "No beneficial action".to_string();
        Ok(ShopAction::None)
    }

    fn explain_last_decision(&self) -> &str {
        &self.last_explanation
    }
}

// ============================================================================
// SmartAgent
// ============================================================================

/// 已評估的凍結候選
#[derive(Clone, Debug, PartialEq)]
pub struct RankedFreeze {
    pub candidate: FreezeCandidate,
    pub ev: f64,
}

#[derive(Clone, Debug)]
pub struct SmartAgent {
    pub weights: ShopWeights,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub reroll_min_value: f64,
    last_explanation: String,
}

impl Default for SmartAgent {
    fn default() -> Self {
        Self {
            weights: ShopWeights::default(),
            buy_threshold: BUY_THRESHOLD,
            sell_threshold: SELL_THRESHOLD,
            reroll_min_value: REROLL_MIN_VALUE,
            last_explanation: String::new(),
        }
    }
}

impl SmartAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: ShopWeights) -> Self {
        self.weights = weights;
        self
    }

    /// 以期望分數排序所有候選（由高到低）
    ///
    /// 所有候選共用同一個種子。EV 相同時，先取上一手的凍結集合，
    /// 再取含有最大對子的候選，其餘維持生成順序。
    pub fn rank_freezes(&self, ctx: &DecisionContext<'_>, rng: &mut StdRng) -> Result<Vec<RankedFreeze>> {
        let sim = ctx.simulator();
        let seed: u64 = rng.gen();

        let candidates = generate_freeze_candidates(ctx.grid, ctx.config.max_freezes, CANDIDATE_CAP);
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let mut trial_rng = StdRng::seed_from_u64(seed);
            let ev = sim.expected_score(ctx.grid, &candidate.cells, ctx.samples, &mut trial_rng)?;
            let previous = !ctx.previous_frozen.is_empty() && candidate.same_cells(&ctx.previous_frozen);
            let pair = pair_value(ctx.grid, &candidate.cells);
            scored.push((RankedFreeze { candidate, ev }, previous, pair));
        }

        scored.sort_by(|a, b| {
            b.0.ev
                .total_cmp(&a.0.ev)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| b.2.cmp(&a.2))
        });
        Ok(scored.into_iter().map(|(ranked, _, _)| ranked).collect())
    }
}

impl DecisionAgent for SmartAgent {
    fn recommend_freezes(&mut self, ctx: &DecisionContext<'_>, rng: &mut StdRng) -> Result<Vec<(usize, usize)>> {
        if ctx.config.max_freezes == 0 {
            self.last_explanation = "Freeze [] (freezing disabled)".to_string();
            return Ok(Vec::new());
        }

        let ranked = self.rank_freezes(ctx, rng)?;
        let (cells, ev) = ranked
            .first()
            .map(|r| (r.candidate.cells.clone(), r.ev))
            .unwrap_or_default();
        self.last_explanation = format!(
            "Freeze EV picked {cells:?} with EV={ev:.1} over {} candidates",
            ranked.len()
        );
        log::debug!("smart agent: {}", self.last_explanation);
        Ok(cells)
    }

    fn recommend_shop_action(
        &mut self,
        ctx: &DecisionContext<'_>,
        shop: &ShopView,
        rng: &mut StdRng,
    ) -> Result<ShopAction> {
        let mut best: Option<(usize, f64)> = None;
        let mut weakest: Option<(usize, f64)> = None;

        if !shop.offers.is_empty() || !ctx.pipeline.is_empty() {
            let valuator = JokerValuator::new(
                ctx.simulator(),
                ctx.grid,
                ctx.samples,
                self.weights,
                ctx.hands_remaining,
                rng,
            )?;
            for (i, offer) in shop.offers.iter().enumerate() {
                let value = valuator.offer_value(&offer.joker, offer.cost)?;
                if best.map_or(true, |(_, v)| value > v) {
                    best = Some((i, value));
                }
            }
            for i in 0..ctx.pipeline.len() {
                let value = valuator.owned_value(i)?;
                if weakest.map_or(true, |(_, v)| value < v) {
                    weakest = Some((i, value));
                }
            }
        }

        let action = self.decide_shop(ctx, shop, best, weakest);
        log::debug!("smart agent: {} -> {}", self.last_explanation, action);
        Ok(action)
    }

    fn explain_last_decision(&self) -> &str {
        &self.last_explanation
    }
}

impl SmartAgent {
    fn decide_shop(
        &mut self,
        ctx: &DecisionContext<'_>,
        shop: &ShopView,
        best: Option<(usize, f64)>,
        weakest: Option<(usize, f64)>,
    ) -> ShopAction {
        if let Some((index, value)) = best.filter(|&(_, v)| v >= self.buy_threshold) {
            let offer = &shop.offers[index];
            if ctx.has_free_slot() && shop.can_afford(index) {
                self.last_explanation = format!("Buy {} (value={value:.2})", offer.joker.name);
                return ShopAction::Buy(index);
            }

            if let Some((owned, owned_value)) = weakest {
                let sell_value = ctx.pipeline.get(owned).map_or(0, |j| j.sell_value);
                if shop.money + sell_value >= offer.cost && value - owned_value >= self.sell_threshold {
                    self.last_explanation = format!(
                        "Sell idx {owned} (value={owned_value:.2}) to buy {} (value={value:.2})",
                        offer.joker.name
                    );
                    return ShopAction::Sell(owned);
                }
            }
        }

        let best_value = best.map_or(f64::NEG_INFINITY, |(_, v)| v);
        if shop.can_reroll() && (best.is_none() || best_value < self.reroll_min_value) {
            self.last_explanation = format!("Reroll (best_value={best_value:.2})");
            return ShopAction::Reroll;
        }

        self.last_explanation = "No beneficial action".to_string();
        ShopAction::None
    }
}

// ============================================================================
// 單元測試
// ============================================================================
