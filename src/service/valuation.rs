//! Joker 估值
//!
//! 兩個部分：
//! - `heuristic_value`: 只看定義的啟發式分數（稀有度、效果種類、觸發頻率、籌碼/倍率互補、成長潛力、價格）
//! - `JokerValuator`: 以 Monte Carlo 估算加入（或移除）一張 Joker 後每手期望分數的相對變化
//!
//! 商店決策使用兩者的加權和。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::simulation::Simulator;
use crate::error::Result;
use crate::game::{CardFilter, Effect, Grid, GrowthState, HandId, JokerPipeline, JokerSpec, Rarity, Trigger, HANDS_PER_ROUND};

// ============================================================================
// 啟發式
// ============================================================================

fn rarity_weight(rarity: Rarity) -> f64 {
    match rarity {
        Rarity::Common => 1.0,
        Rarity::Uncommon => 1.3,
        Rarity::Rare => 1.7,
        Rarity::Legendary => 2.5,
    }
}

fn effect_weight(effect: &Effect) -> f64 {
    match effect {
        Effect::Mult(_) => 1.2,
        Effect::Chips(_) => 0.9,
        Effect::XMult(_) => 1.8,
        Effect::ChipsAndMult { .. } => 1.3,
    }
}

/// 觸發條件的常見程度加成
fn trigger_weight(trigger: &Trigger) -> f64 {
    let frequent_filter = |f: &CardFilter| matches!(f, CardFilter::FaceCard | CardFilter::Even | CardFilter::Odd);
    match trigger {
        Trigger::Always => 0.6,
        Trigger::Card(CardFilter::Any) | Trigger::FirstMatching(CardFilter::Any) => 0.6,
        Trigger::HandType(HandId::Pair | HandId::TwoPair | HandId::ThreeKind) => 0.5,
        Trigger::Card(f) | Trigger::FirstMatching(f) if frequent_filter(f) => 0.5,
        _ => 0.15,
    }
}

fn boosts_mult(effect: &Effect) -> bool {
    matches!(effect, Effect::Mult(_) | Effect::XMult(_))
}

fn boosts_chips(effect: &Effect) -> bool {
    matches!(effect, Effect::Chips(_) | Effect::ChipsAndMult { .. })
}

/// 與已擁有 Joker 的籌碼/倍率互補加成
fn synergy(effect: &Effect, owned: &[JokerSpec]) -> f64 {
    let owned_mult = owned.iter().any(|j| boosts_mult(&j.effect));
    let owned_chips = owned.iter().any(|j| boosts_chips(&j.effect));
    let mut bonus = 0.0;
    if boosts_mult(effect) && owned_chips {
        bonus += 0.6;
    }
    if boosts_chips(effect) && owned_mult {
        bonus += 0.5;
    }
    bonus
}

/// 成長型 Joker 的加成：剩餘手數越多越接近 1.4 倍
fn growth_factor(spec: &JokerSpec, hands_remaining: u32) -> f64 {
    if spec.growth.is_none() {
        return 1.0;
    }
    let remaining = hands_remaining.min(HANDS_PER_ROUND) as f64;
    1.0 + 0.4 * remaining / HANDS_PER_ROUND as f64
}

fn heuristic_at_cost(spec: &JokerSpec, cost: i64, owned: &[JokerSpec], hands_remaining: u32) -> f64 {
    let base = rarity_weight(spec.rarity)
        * effect_weight(&spec.effect)
        * (1.0 + trigger_weight(&spec.trigger) + synergy(&spec.effect, owned));
    base * 10.0 / cost.max(1) as f64 * growth_factor(spec, hands_remaining)
}

/// 只看定義的 Joker 價值（越高越好）
pub fn heuristic_value(spec: &JokerSpec, owned: &[JokerSpec], hands_remaining: u32) -> f64 {
    heuristic_at_cost(spec, spec.cost, owned, hands_remaining)
}

// ============================================================================
// Monte Carlo 估值
// ============================================================================

/// 商店價值的權重
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShopWeights {
    /// 每單位價格的期望分數相對增幅
    pub ev_weight: f64,
    /// 啟發式分數
    pub heuristic_weight: f64,
}

impl Default for ShopWeights {
    fn default() -> Self {
        Self {
            ev_weight: 1.0,
            heuristic_weight: 0.01,
        }
    }
}

/// 以目前管線為基準，估算加入/移除 Joker 的價值
///
/// 所有評估共用同一個種子，比較的是同一批隨機格子上的分數差。
pub struct JokerValuator<'a> {
    sim: Simulator<'a>,
    grid: &'a Grid,
    samples: usize,
    seed: u64,
    baseline: f64,
    weights: ShopWeights,
    hands_remaining: u32,
}

impl<'a> JokerValuator<'a> {
    pub fn new(
        sim: Simulator<'a>,
        grid: &'a Grid,
        samples: usize,
        weights: ShopWeights,
        hands_remaining: u32,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let seed: u64 = rng.gen();
        let mut valuator = Self {
            sim,
            grid,
            samples,
            seed,
            baseline: 0.0,
            weights,
            hands_remaining,
        };
        valuator.baseline = valuator.expected_with(valuator.sim.pipeline(), valuator.sim.growth())?;
        Ok(valuator)
    }

    /// 目前管線每手的期望分數
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    fn expected_with(&self, pipeline: &JokerPipeline, growth: &GrowthState) -> Result<f64> {
        let sim: Simulator<'_> = self.sim.clone();
        let mut rng = StdRng::seed_from_u64(self.seed);
        sim.with_pipeline(pipeline, growth)
            .expected_score(self.grid, &[], self.samples, &mut rng)
    }

    fn relative(&self, delta: f64, cost: i64) -> f64 {
        delta / self.baseline.max(1.0) / cost.max(1) as f64
    }

    /// 加入 `spec` 後期望分數的相對增幅（除以價格）
    pub fn gain_per_cost(&self, spec: &JokerSpec, cost: i64) -> Result<f64> {
        let mut pipeline = self.sim.pipeline().clone();
        pipeline.push(spec.clone())?;
        let mut growth = self.sim.growth().clone();
        growth.push_slot();
        let with = self.expected_with(&pipeline, &growth)?;
        Ok(self.relative(with - self.baseline, cost))
    }

    /// 移除第 `index` 張 Joker 後損失的相對分數（除以其價格）
    pub fn loss_per_cost(&self, index: usize) -> Result<f64> {
        let mut pipeline = self.sim.pipeline().clone();
        let mut growth = self.sim.growth().clone();
        growth.remove_slot(index)?;
        let Some(spec) = pipeline.remove(index) else {
            return Ok(0.0);
        };
        let without = self.expected_with(&pipeline, &growth)?;
        Ok(self.relative(self.baseline - without, spec.cost))
    }

    /// 商店物品的綜合價值
    pub fn offer_value(&self, spec: &JokerSpec, cost: i64) -> Result<f64> {
        let ev = self.gain_per_cost(spec, cost)?;
        let heuristic = heuristic_at_cost(spec, cost, self.sim.pipeline().specs(), self.hands_remaining);
        Ok(self.weights.ev_weight * ev + self.weights.heuristic_weight * heuristic)
    }

    /// 已擁有 Joker 的綜合價值（以其他 Joker 為互補對象）
    pub fn owned_value(&self, index: usize) -> Result<f64> {
        let specs = self.sim.pipeline().specs();
        let Some(spec) = specs.get(index) else {
            return Ok(0.0);
        };
        let others: Vec<JokerSpec> = specs
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, j)| j.clone())
            .collect();
        let ev = self.loss_per_cost(index)?;
        let heuristic = heuristic_value(spec, &others, self.hands_remaining);
        Ok(self.weights.ev_weight * ev + self.weights.heuristic_weight * heuristic)
    }
}

// ============================================================================
// 單元測試
// ============================================================================
