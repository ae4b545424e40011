//! Joker 管線
//!
//! 依序對每條線套用所有 Joker：
//! - 加法效果 (+Chips / +Mult) 直接累加
//! - 乘法效果 (XMult) 乘上目前的 mult 並向零截斷，所以順序有影響
//! - 成長型 Joker 使用「累加前」的計數器值
//!
//! 計數器不放在 JokerSpec 裡，而是由外部的 `GrowthState` 持有，
//! 模擬時複製一份即可，不會動到真正的遊戲狀態。

use super::cards::Card;
use super::hand_types::HandResult;
use super::joker_def::{Effect, GrowPer, JokerSpec, Trigger};
use crate::error::{ConfigError, EngineError, Result};

// ============================================================================
// 成長狀態
// ============================================================================

/// 成長計數器，每個管線欄位一個
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowthState {
    counters: Vec<i64>,
}

impl GrowthState {
    pub fn new(slots: usize) -> Self {
        Self {
            counters: vec![0; slots],
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<i64> {
        self.counters.get(slot).copied()
    }

    pub fn values(&self) -> &[i64] {
        &self.counters
    }

    /// 全部歸零
    pub fn reset_all(&mut self) {
        self.counters.iter_mut().for_each(|c| *c = 0);
    }

    /// 新增欄位（對應管線新增 Joker）
    pub fn push_slot(&mut self) {
        self.counters.push(0);
    }

    /// 移除欄位（對應賣出 Joker，計數器一併丟棄）
    pub fn remove_slot(&mut self, slot: usize) -> Result<i64> {
        if slot >= self.counters.len() {
            return Err(EngineError::invalid(format!("no growth counter at slot {slot}")));
        }
        Ok(self.counters.remove(slot))
    }

    fn add(&mut self, slot: usize, step: i64) {
        if let Some(counter) = self.counters.get_mut(slot) {
            *counter = counter.saturating_add(step);
        }
    }
}

/// 一次計分中 `GrowPer::Hand` 的待提交旗標
#[derive(Clone, Debug, Default)]
pub struct GrowthPass {
    fired: Vec<bool>,
}

// ============================================================================
// 單條線的結果
// ============================================================================

/// 單一 Joker 對一條線的貢獻
#[derive(Clone, Debug, PartialEq)]
pub struct JokerContribution {
    pub slot: usize,
    /// 符合條件的牌數（非卡牌條件觸發時為 1）
    pub matched: usize,
    /// `FirstMatching` 觸發的牌位置
    pub position: Option<usize>,
    pub chips_delta: i64,
    pub mult_delta: i64,
    /// 本次使用的成長值
    pub growth_used: i64,
}

/// 單條線套用管線後的結果
#[derive(Clone, Debug, PartialEq)]
pub struct LineOutcome {
    pub contributions: Vec<JokerContribution>,
    /// 最終 chips / mult（已夾到 >= 0）
    pub chips: i64,
    pub mult: i64,
    pub score: i64,
}

/// 單一 Joker 的觸發檢查結果
struct Firing {
    times: usize,
    matched: usize,
    position: Option<usize>,
}

fn check_trigger(spec: &JokerSpec, line: &[Card], hand: &HandResult) -> Option<Firing> {
    let once = |position| Firing {
        times: 1,
        matched: 1,
        position,
    };
    match &spec.trigger {
        Trigger::Always => Some(once(None)),
        Trigger::HandType(id) => (hand.id == *id).then(|| once(None)),
        Trigger::Card(filter) => {
            let matched = line.iter().filter(|c| filter.matches(c)).count();
            (matched > 0).then(|| Firing {
                times: if spec.per_card { matched } else { 1 },
                matched,
                position: None,
            })
        }
        Trigger::FirstMatching(filter) => line
            .iter()
            .position(|c| filter.matches(c))
            .map(|pos| once(Some(pos))),
    }
}

/// 將效果套用 `times` 次到 (chips, mult)
pub fn apply_effect(effect: Effect, times: usize, chips: i64, mult: i64) -> (i64, i64) {
    let n = i64::try_from(times).unwrap_or(i64::MAX);
    let add = |base: i64, bonus: i64| base.saturating_add(bonus.saturating_mul(n));
    match effect {
        Effect::Chips(c) => (add(chips, c), mult),
        Effect::Mult(m) => (chips, add(mult, m)),
        Effect::ChipsAndMult { chips: c, mult: m } => (add(chips, c), add(mult, m)),
        Effect::XMult(x) => {
            let factor = x.powi(i32::try_from(times).unwrap_or(i32::MAX));
            (chips, (mult as f64 * factor).trunc() as i64)
        }
    }
}

/// 單一 Joker 對一條線的作用（不處理成長計數）
///
/// 回傳新的 (chips, mult)；條件不成立時原樣回傳。
pub fn apply_joker(
    spec: &JokerSpec,
    line: &[Card],
    hand: &HandResult,
    (chips, mult): (i64, i64),
    growth_value: i64,
) -> (i64, i64) {
    match check_trigger(spec, line, hand) {
        Some(firing) => {
            let effect = if spec.growth.is_some() {
                spec.effect.boosted(growth_value)
            } else {
                spec.effect
            };
            apply_effect(effect, firing.times, chips, mult)
        }
        None => (chips, mult),
    }
}

// ============================================================================
// 管線
// ============================================================================

/// 依序排列的 Joker（購買順序即套用順序）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JokerPipeline {
    jokers: Vec<JokerSpec>,
}

impl JokerPipeline {
    /// 建立並驗證每一個 Joker
    pub fn new(jokers: Vec<JokerSpec>) -> std::result::Result<Self, ConfigError> {
        for joker in &jokers {
            joker.validate()?;
        }
        Ok(Self { jokers })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, joker: JokerSpec) -> std::result::Result<(), ConfigError> {
        joker.validate()?;
        self.jokers.push(joker);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<JokerSpec> {
        (index < self.jokers.len()).then(|| self.jokers.remove(index))
    }

    pub fn len(&self) -> usize {
        self.jokers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jokers.is_empty()
    }

    pub fn specs(&self) -> &[JokerSpec] {
        &self.jokers
    }

    pub fn get(&self, index: usize) -> Option<&JokerSpec> {
        self.jokers.get(index)
    }

    /// 對應此管線的全新成長狀態
    pub fn new_growth_state(&self) -> GrowthState {
        GrowthState::new(self.jokers.len())
    }

    pub fn check_growth(&self, growth: &GrowthState) -> Result<()> {
        if growth.len() != self.jokers.len() {
            return Err(EngineError::invalid(format!(
                "growth state has {} counters but the pipeline holds {} jokers",
                growth.len(),
                self.jokers.len()
            )));
        }
        Ok(())
    }

    /// 開始一次計分（10 條線）
    pub fn begin_pass(&self) -> GrowthPass {
        GrowthPass {
            fired: vec![false; self.jokers.len()],
        }
    }

    /// 計分結束：每個觸發過的 `GrowPer::Hand` Joker 累加一次
    pub fn commit_pass(&self, pass: GrowthPass, growth: &mut GrowthState) {
        for (slot, fired) in pass.fired.into_iter().enumerate() {
            if !fired {
                continue;
            }
            if let Some(g) = self.jokers.get(slot).and_then(|j| j.growth) {
                growth.add(slot, g.step);
            }
        }
    }

    /// 對一條線依序套用全部 Joker
    pub fn apply_line(
        &self,
        line: &[Card],
        hand: &HandResult,
        growth: &mut GrowthState,
        pass: &mut GrowthPass,
    ) -> Result<LineOutcome> {
        self.check_growth(growth)?;

        let mut chips = hand.base_chips;
        let mut mult = hand.base_mult;
        let mut contributions = Vec::new();

        for (slot, spec) in self.jokers.iter().enumerate() {
            let Some(firing) = check_trigger(spec, line, hand) else {
                continue;
            };

            let growth_used = match spec.growth {
                Some(_) => growth.get(slot).unwrap_or(0),
                None => 0,
            };
            let effect = if spec.growth.is_some() {
                spec.effect.boosted(growth_used)
            } else {
                spec.effect
            };
            let (new_chips, new_mult) = apply_effect(effect, firing.times, chips, mult);

            contributions.push(JokerContribution {
                slot,
                matched: firing.matched,
                position: firing.position,
                chips_delta: new_chips.saturating_sub(chips),
                mult_delta: new_mult.saturating_sub(mult),
                growth_used,
            });
            chips = new_chips;
            mult = new_mult;

            if let Some(g) = spec.growth {
                match g.per {
                    GrowPer::Line => growth.add(slot, g.step),
                    GrowPer::Hand => {
                        if let Some(flag) = pass.fired.get_mut(slot) {
                            *flag = true;
                        }
                    }
                }
            }
        }

        let chips = chips.max(0);
        let mult = mult.max(0);
        Ok(LineOutcome {
            contributions,
            chips,
            mult,
            score: chips.saturating_mul(mult),
        })
    }
}

// ============================================================================
// 單元測試
// ============================================================================
