//! 計分服務
//!
//! 對格子的 10 條線（Row 0..5，然後 Col 0..5）逐一判定牌型並套用 Joker 管線，
//! 產生 `ScoreLedger`。除了提交成長計數外不修改任何狀態。

use crate::error::{EngineError, Result};
use crate::game::{
    Card, ClassificationCache, GameConfig, Grid, GrowthState, HandResult, JokerContribution,
    JokerPipeline, LineId, LINE_LEN,
};
use crate::game::scoring::{evaluate, with_table};

/// 單條線的計分明細
#[derive(Clone, Debug, PartialEq)]
pub struct LineScore {
    pub line: LineId,
    pub cards: [Card; LINE_LEN],
    pub hand: HandResult,
    pub contributions: Vec<JokerContribution>,
    /// 套用 Joker 後（夾到 >= 0）
    pub chips: i64,
    pub mult: i64,
    pub score: i64,
    /// 是否計入總分（top-K 模式下只有最高的 K 條）
    pub counted: bool,
}

impl LineScore {
    pub fn base_chips(&self) -> i64 {
        self.hand.base_chips
    }

    pub fn base_mult(&self) -> i64 {
        self.hand.base_mult
    }
}

/// 一次計分的完整結果
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreLedger {
    pub lines: Vec<LineScore>,
    pub total: i64,
}

impl ScoreLedger {
    pub fn line(&self, id: LineId) -> Option<&LineScore> {
        self.lines.iter().find(|l| l.line == id)
    }

    pub fn counted(&self) -> impl Iterator<Item = &LineScore> {
        self.lines.iter().filter(|l| l.counted)
    }

    /// 分數最高的線（同分取計分順序較前者）
    pub fn best_line(&self) -> Option<&LineScore> {
        self.lines
            .iter()
            .rev()
            .max_by_key(|l| l.score)
    }
}

// ============================================================================
// 計分事件
// ============================================================================

/// 計分事件接收端（由 UI / 事件匯流排實作）
pub trait ScoreEvents {
    fn line_scored(&mut self, _line: &LineScore) {}
    fn score_updated(&mut self, _total: i64) {}
}

/// 不接收任何事件
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl ScoreEvents for NoEvents {}

// ============================================================================
// 計分
// ============================================================================

/// 計算整個格子的分數
pub fn score_grid(
    grid: &Grid,
    pipeline: &JokerPipeline,
    growth: &mut GrowthState,
    config: &GameConfig,
) -> Result<ScoreLedger> {
    score_grid_with_events(grid, pipeline, growth, config, &mut NoEvents)
}

/// 計算整個格子的分數並發出事件
pub fn score_grid_with_events(
    grid: &Grid,
    pipeline: &JokerPipeline,
    growth: &mut GrowthState,
    config: &GameConfig,
    events: &mut dyn ScoreEvents,
) -> Result<ScoreLedger> {
    score_grid_cached(grid, pipeline, growth, config, None, events)
}

pub(crate) fn score_grid_cached(
    grid: &Grid,
    pipeline: &JokerPipeline,
    growth: &mut GrowthState,
    config: &GameConfig,
    cache: Option<&ClassificationCache>,
    events: &mut dyn ScoreEvents,
) -> Result<ScoreLedger> {
    if grid.rows() != config.grid_rows || grid.cols() != config.grid_cols {
        return Err(EngineError::invalid(format!(
            "grid is {}x{} but the configuration expects {}x{}",
            grid.rows(),
            grid.cols(),
            config.grid_rows,
            config.grid_cols
        )));
    }
    pipeline.check_growth(growth)?;

    let mut pass = pipeline.begin_pass();
    let mut lines = Vec::with_capacity(grid.rows() + grid.cols());

    for line in grid.lines() {
        let cards = line.to_array();
        let hand = match cache {
            Some(cache) => with_table(cache.classify(&cards)?, &config.hand_scores),
            None => evaluate(&cards, &config.hand_scores)?,
        };
        let outcome = pipeline.apply_line(&cards, &hand, growth, &mut pass)?;
        log::trace!(
            "{}: {:?} {}x{} = {}",
            line.id(),
            hand.id,
            outcome.chips,
            outcome.mult,
            outcome.score
        );
        lines.push(LineScore {
            line: line.id(),
            cards,
            hand,
            contributions: outcome.contributions,
            chips: outcome.chips,
            mult: outcome.mult,
            score: outcome.score,
            counted: true,
        });
    }

    pipeline.commit_pass(pass, growth);

    if let Some(k) = config.lines_scored {
        mark_top_lines(&mut lines, k);
    }

    let total = lines
        .iter()
        .filter(|l| l.counted)
        .fold(0i64, |acc, l| acc.saturating_add(l.score));
    for line in &lines {
        events.line_scored(line);
    }
    events.score_updated(total);

    Ok(ScoreLedger { lines, total })
}

/// 只保留最高的 K 條線（同分時 Row 先於 Col、索引小者優先）
fn mark_top_lines(lines: &mut [LineScore], k: usize) {
    let mut order: Vec<usize> = (0..lines.len()).collect();
    // 穩定排序：lines 本身已按 Row 0..5、Col 0..5 排列
    order.sort_by(|&a, &b| lines[b].score.cmp(&lines[a].score));
    for (rank, idx) in order.into_iter().enumerate() {
        lines[idx].counted = rank < k;
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CardFilter, Effect, GrowPer, HandId, JokerSpec, Trigger, DIAMOND};

    /// 每行都是對子、每列都是高牌
    const PAIR_ROWS: &str = "2S 2D 6H 9C KS / 5D 8H 8C JS 3D / 9H QC 4S 4D 6H / JC 5S KD 7H 7C / QS KD 2H 5C QS";

    fn jolly() -> JokerSpec {
        JokerSpec::new("jolly", "Jolly Joker", Trigger::HandType(HandId::Pair), Effect::Mult(8))
    }

    fn run(grid: &Grid, pipeline: &JokerPipeline, config: &GameConfig) -> ScoreLedger {
        let mut growth = pipeline.new_growth_state();
        score_grid(grid, pipeline, &mut growth, config).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        lines: Vec<LineId>,
        totals: Vec<i64>,
    }

    impl ScoreEvents for Recorder {
        fn line_scored(&mut self, line: &LineScore) {
            self.lines.push(line.line);
        }
        fn score_updated(&mut self, total: i64) {
            self.totals.push(total);
        }
    }

    #[test]
    fn test_pair_rows_without_jokers() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let ledger = run(&grid, &JokerPipeline::empty(), &GameConfig::default());
        for row in &ledger.lines[..5] {
            assert_eq!(row.hand.id, HandId::Pair);
            assert_eq!(row.score, 20);
        }
        for col in &ledger.lines[5..] {
            assert_eq!(col.hand.id, HandId::HighCard);
            assert_eq!(col.score, 5);
        }
        assert_eq!(ledger.total, 125);
    }

    #[test]
    fn test_jolly_joker_grid() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let pipeline = JokerPipeline::new(vec![jolly()]).unwrap();
        let ledger = run(&grid, &pipeline, &GameConfig::default());
        assert_eq!(ledger.total, 525);
        assert_eq!(ledger.lines[0].contributions.len(), 1);
        assert!(ledger.lines[5].contributions.is_empty());
    }

    #[test]
    fn test_diamond_flush_line() {
        let grid = Grid::parse(&PAIR_ROWS.replacen("2S 2D 6H 9C KS", "2D 5D 9D JD KD", 1)).unwrap();
        let greedy = JokerSpec::new("g", "Greedy", Trigger::Card(CardFilter::Suit(DIAMOND)), Effect::Mult(3))
            .per_card();
        let pipeline = JokerPipeline::new(vec![greedy]).unwrap();
        let ledger = run(&grid, &pipeline, &GameConfig::default());
        let row0 = ledger.line(LineId::Row(0)).unwrap();
        assert_eq!(row0.hand.id, HandId::Flush);
        assert_eq!((row0.base_chips(), row0.base_mult()), (35, 4));
        assert_eq!(row0.score, 665);
    }

    #[test]
    fn test_scoring_is_idempotent_without_growth() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let pipeline = JokerPipeline::new(vec![jolly()]).unwrap();
        let mut growth = pipeline.new_growth_state();
        let config = GameConfig::default();
        let first = score_grid(&grid, &pipeline, &mut growth, &config).unwrap();
        let second = score_grid(&grid, &pipeline, &mut growth, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(growth, pipeline.new_growth_state());
    }

    #[test]
    fn test_growth_is_monotonic() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let growing = JokerSpec::new("s", "Spare", Trigger::HandType(HandId::Pair), Effect::Mult(0))
            .growing(2, GrowPer::Line);
        let pipeline = JokerPipeline::new(vec![growing]).unwrap();
        let mut growth = pipeline.new_growth_state();
        let config = GameConfig::default();

        let mut last_total = 0;
        let mut last_counter = 0;
        for _ in 0..3 {
            let ledger = score_grid(&grid, &pipeline, &mut growth, &config).unwrap();
            let counter = growth.get(0).unwrap();
            assert!(ledger.total >= last_total);
            assert!(counter > last_counter);
            last_total = ledger.total;
            last_counter = counter;
        }
        // 5 條對子線 × 3 次計分 × 2
        assert_eq!(last_counter, 30);
    }

    #[test]
    fn test_hand_growth_committed_after_pass() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let green = JokerSpec::new("g", "Green", Trigger::Always, Effect::Mult(0)).growing(1, GrowPer::Hand);
        let pipeline = JokerPipeline::new(vec![green]).unwrap();
        let mut growth = pipeline.new_growth_state();
        let config = GameConfig::default();

        assert_eq!(score_grid(&grid, &pipeline, &mut growth, &config).unwrap().total, 125);
        assert_eq!(growth.get(0), Some(1));
        // 每條線 mult +1: 5 × 10 × 3 + 5 × 5 × 2
        assert_eq!(score_grid(&grid, &pipeline, &mut growth, &config).unwrap().total, 200);
    }

    #[test]
    fn test_top_k_lines() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let config = GameConfig {
            lines_scored: Some(3),
            ..GameConfig::default()
        };
        let ledger = run(&grid, &JokerPipeline::empty(), &config);
        assert_eq!(ledger.total, 60);
        let counted: Vec<LineId> = ledger.counted().map(|l| l.line).collect();
        assert_eq!(counted, vec![LineId::Row(0), LineId::Row(1), LineId::Row(2)]);
    }

    #[test]
    fn test_events_emitted_in_line_order() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let pipeline = JokerPipeline::empty();
        let mut growth = pipeline.new_growth_state();
        let mut recorder = Recorder::default();
        score_grid_with_events(&grid, &pipeline, &mut growth, &GameConfig::default(), &mut recorder).unwrap();
        assert_eq!(recorder.lines, LineId::all(5, 5));
        assert_eq!(recorder.totals, vec![125]);
    }

    #[test]
    fn test_mismatches_rejected() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let pipeline = JokerPipeline::new(vec![jolly()]).unwrap();
        let mut growth = GrowthState::new(3);
        assert!(matches!(
            score_grid(&grid, &pipeline, &mut growth, &GameConfig::default()),
            Err(EngineError::InvalidArgument(_))
        ));

        let config = GameConfig {
            grid_rows: 6,
            ..GameConfig::default()
        };
        let mut growth = pipeline.new_growth_state();
        assert!(matches!(
            score_grid(&grid, &pipeline, &mut growth, &config),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cached_scoring_matches_direct() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let pipeline = JokerPipeline::new(vec![jolly()]).unwrap();
        let config = GameConfig::default();
        let cache = ClassificationCache::new();
        let mut growth = pipeline.new_growth_state();
        let cached = score_grid_cached(&grid, &pipeline, &mut growth, &config, Some(&cache), &mut NoEvents).unwrap();
        assert_eq!(cached, run(&grid, &pipeline, &config));
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_best_line_prefers_earlier_on_tie() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let ledger = run(&grid, &JokerPipeline::empty(), &GameConfig::default());
        assert_eq!(ledger.best_line().map(|l| l.line), Some(LineId::Row(0)));
    }

    #[test]
    fn test_huge_multiplier_total_saturates() {
        let grid = Grid::parse(PAIR_ROWS).unwrap();
        let huge = JokerSpec::new("x", "X", Trigger::Always, Effect::XMult(1e18));
        huge.validate().unwrap();
        let pipeline = JokerPipeline::new(vec![huge]).unwrap();
        let ledger = run(&grid, &pipeline, &GameConfig::default());
        assert_eq!(ledger.total, i64::MAX);
        // Pair 行：10 × 2e18 超出 i64
        assert_eq!(ledger.line(LineId::Row(0)).map(|l| l.score), Some(i64::MAX));
    }
}
