//! Monte Carlo 模擬
//!
//! 重抽所有未凍結的格子（抽後放回）並計分，重複 `samples` 次取平均。
//! 每次試驗都有自己的 RNG、格子複本和成長狀態複本，並行於 rayon 執行緒池。
//! 模擬只拿得到 `&GrowthState`，不可能改動真正的遊戲狀態。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::scoring::{score_grid_cached, NoEvents};
use crate::error::{EngineError, Result};
use crate::game::{ClassificationCache, DrawDistribution, GameConfig, Grid, GrowthState, JokerPipeline};

// ============================================================================
// 取消
// ============================================================================

/// 協作式取消旗標（可跨執行緒複製）
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ============================================================================
// 結果
// ============================================================================

/// 一批試驗的統計
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationSummary {
    pub mean: f64,
    /// 母體標準差
    pub std_dev: f64,
    pub min: i64,
    pub max: i64,
    /// 實際評估次數（沒有未凍結格子時為 1）
    pub samples: usize,
}

impl SimulationSummary {
    fn from_totals(totals: &[i64]) -> Self {
        let n = totals.len().max(1) as f64;
        let mean = totals.iter().map(|&t| t as f64).sum::<f64>() / n;
        let variance = totals
            .iter()
            .map(|&t| {
                let d = t as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: totals.iter().copied().min().unwrap_or(0),
            max: totals.iter().copied().max().unwrap_or(0),
            samples: totals.len(),
        }
    }
}

// ============================================================================
// 模擬器
// ============================================================================

/// 固定設定、管線、成長狀態與抽牌分佈的模擬器
#[derive(Clone)]
pub struct Simulator<'a> {
    config: &'a GameConfig,
    pipeline: &'a JokerPipeline,
    growth: &'a GrowthState,
    dist: &'a dyn DrawDistribution,
    cache: Option<&'a ClassificationCache>,
    cancel: Option<CancelToken>,
}

impl<'a> Simulator<'a> {
    pub fn new(
        config: &'a GameConfig,
        pipeline: &'a JokerPipeline,
        growth: &'a GrowthState,
        dist: &'a dyn DrawDistribution,
    ) -> Self {
        Self {
            config,
            pipeline,
            growth,
            dist,
            cache: None,
            cancel: None,
        }
    }

    /// 共用的牌型判定快取
    pub fn with_cache(mut self, cache: &'a ClassificationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 換一組管線/成長狀態（評估購買候選時使用）
    pub fn with_pipeline(mut self, pipeline: &'a JokerPipeline, growth: &'a GrowthState) -> Self {
        self.pipeline = pipeline;
        self.growth = growth;
        self
    }

    pub fn pipeline(&self) -> &'a JokerPipeline {
        self.pipeline
    }

    pub fn growth(&self) -> &'a GrowthState {
        self.growth
    }

    pub fn config(&self) -> &'a GameConfig {
        self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// 單一格子在目前凍結狀態下的確定分數（不動到成長狀態）
    pub fn score_once(&self, grid: &Grid) -> Result<i64> {
        let mut growth = self.growth.clone();
        let ledger = score_grid_cached(grid, self.pipeline, &mut growth, self.config, self.cache, &mut NoEvents)?;
        Ok(ledger.total)
    }

    /// 以 `frozen_cells` 作為凍結集合，跑 `samples` 次試驗
    pub fn simulate(
        &self,
        grid: &Grid,
        frozen_cells: &[(usize, usize)],
        samples: usize,
        rng: &mut StdRng,
    ) -> Result<SimulationSummary> {
        if samples == 0 {
            return Err(EngineError::invalid("samples must be at least 1"));
        }
        self.pipeline.check_growth(self.growth)?;

        let mut base = grid.clone();
        base.set_frozen_cells(frozen_cells)?;

        if self.is_cancelled() {
            return Err(EngineError::Cancelled { requested: samples });
        }

        // 全部凍結：結果是確定的，只需評估一次
        if base.unfrozen_count() == 0 {
            let total = self.score_once(&base)?;
            return Ok(SimulationSummary::from_totals(&[total]));
        }

        let seed: u64 = rng.gen();
        let totals: Vec<Option<i64>> = (0..samples)
            .into_par_iter()
            .map(|i| {
                if self.is_cancelled() {
                    return Ok(None);
                }
                let mut trial_rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let mut trial_grid = base.clone();
                trial_grid.redraw_unfrozen(self.dist, &mut trial_rng);
                self.score_once(&trial_grid).map(Some)
            })
            .collect::<Result<_>>()?;

        let totals: Vec<i64> = match totals.into_iter().collect::<Option<Vec<_>>>() {
            Some(totals) if !self.is_cancelled() => totals,
            _ => {
                log::debug!("simulation cancelled after request of {samples} samples");
                return Err(EngineError::Cancelled { requested: samples });
            }
        };

        let summary = SimulationSummary::from_totals(&totals);
        log::debug!(
            "simulated {} trials with {} frozen cells: mean {:.1} (sd {:.1}, {}..{})",
            samples,
            frozen_cells.len(),
            summary.mean,
            summary.std_dev,
            summary.min,
            summary.max
        );
        Ok(summary)
    }

    pub fn expected_score(
        &self,
        grid: &Grid,
        frozen_cells: &[(usize, usize)],
        samples: usize,
        rng: &mut StdRng,
    ) -> Result<f64> {
        Ok(self.simulate(grid, frozen_cells, samples, rng)?.mean)
    }
}

// ============================================================================
// 函式介面
// ============================================================================

/// 估算以 `frozen_cells` 凍結後重抽的期望總分
#[allow(clippy::too_many_arguments)]
pub fn estimate_expected_score(
    grid: &Grid,
    frozen_cells: &[(usize, usize)],
    config: &GameConfig,
    pipeline: &JokerPipeline,
    growth: &GrowthState,
    dist: &dyn DrawDistribution,
    samples: usize,
    rng: &mut StdRng,
) -> Result<f64> {
    Simulator::new(config, pipeline, growth, dist).expected_score(grid, frozen_cells, samples, rng)
}

/// 同 `estimate_expected_score`，但可被 `CancelToken` 中止
#[allow(clippy::too_many_arguments)]
pub fn estimate_with_cancel(
    grid: &Grid,
    frozen_cells: &[(usize, usize)],
    config: &GameConfig,
    pipeline: &JokerPipeline,
    growth: &GrowthState,
    dist: &dyn DrawDistribution,
    samples: usize,
    rng: &mut StdRng,
    cancel: &CancelToken,
) -> Result<f64> {
    Simulator::new(config, pipeline, growth, dist)
        .with_cancel(cancel.clone())
        .expected_score(grid, frozen_cells, samples, rng)
}

/// 完整統計版本
#[allow(clippy::too_many_arguments)]
pub fn simulate(
    grid: &Grid,
    frozen_cells: &[(usize, usize)],
    config: &GameConfig,
    pipeline: &JokerPipeline,
    growth: &GrowthState,
    dist: &dyn DrawDistribution,
    samples: usize,
    rng: &mut StdRng,
) -> Result<SimulationSummary> {
    Simulator::new(config, pipeline, growth, dist).simulate(grid, frozen_cells, samples, rng)
}

// ============================================================================
// 單元測試
// ============================================================================
