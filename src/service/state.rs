//! 回合狀態管理
//!
//! 持有真正的遊戲狀態（格子、牌組、Joker 管線與成長計數器）。
//! 只有 `play_hand` 會推進成長計數器；AI 評估只拿到唯讀的 `DecisionContext`。

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::agent::DecisionContext;
use super::scoring::{score_grid_with_events, NoEvents, ScoreEvents, ScoreLedger};
use crate::error::{EngineError, Result};
use crate::game::{Deck, GameConfig, Grid, GrowthState, JokerPipeline, JokerSpec};

/// 單局遊戲狀態
pub struct RoundState {
    pub rng: StdRng,
    pub config: GameConfig,
    pub deck: Deck,
    pub grid: Grid,

    // Joker
    pub pipeline: JokerPipeline,
    pub growth: GrowthState,

    // 進度
    pub round: u32,
    pub hands_played: u32,
    pub round_score: i64,
    pub last_ledger: Option<ScoreLedger>,
    /// 新回合時把成長計數器歸零（預設保留）
    pub reset_growth_each_round: bool,
}

impl RoundState {
    pub fn new(config: GameConfig, deck: Deck, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = Grid::deal(config.grid_rows, config.grid_cols, &deck, &mut rng)?;
        Ok(Self {
            rng,
            config,
            deck,
            grid,
            pipeline: JokerPipeline::empty(),
            growth: GrowthState::new(0),
            round: 1,
            hands_played: 0,
            round_score: 0,
            last_ledger: None,
            reset_growth_each_round: false,
        })
    }

    pub fn with_jokers(mut self, jokers: Vec<JokerSpec>) -> Result<Self> {
        for joker in jokers {
            self.add_joker(joker)?;
        }
        Ok(self)
    }

    // ========================================================================
    // 回合
    // ========================================================================

    pub fn hands_remaining(&self) -> u32 {
        self.config.hands_per_round.saturating_sub(self.hands_played)
    }

    pub fn is_round_over(&self) -> bool {
        self.hands_remaining() == 0
    }

    /// 開始新回合：重發整個格子，清除凍結；Joker 保留
    pub fn start_round(&mut self) -> Result<()> {
        self.grid = Grid::deal(self.config.grid_rows, self.config.grid_cols, &self.deck, &mut self.rng)?;
        if self.reset_growth_each_round {
            self.growth.reset_all();
        }
        self.round += 1;
        self.hands_played = 0;
        self.round_score = 0;
        self.last_ledger = None;
        log::debug!("round {} started", self.round);
        Ok(())
    }

    // ========================================================================
    // 凍結
    // ========================================================================

    /// 以 `cells` 取代凍結集合
    pub fn freeze_cells(&mut self, cells: &[(usize, usize)]) -> Result<()> {
        if cells.len() > self.config.max_freezes {
            return Err(EngineError::invalid(format!(
                "cannot freeze {} cells (limit {})",
                cells.len(),
                self.config.max_freezes
            )));
        }
        self.grid.set_frozen_cells(cells)
    }

    /// 切換單一格子的凍結狀態，回傳切換後是否凍結
    pub fn toggle_freeze(&mut self, row: usize, col: usize) -> Result<bool> {
        let frozen = self.grid.is_frozen(row, col)?;
        if !frozen && self.grid.frozen_cells().len() >= self.config.max_freezes {
            return Err(EngineError::invalid(format!(
                "max freezes reached ({})",
                self.config.max_freezes
            )));
        }
        self.grid.toggle_freeze(row, col)
    }

    pub fn unfreeze_all(&mut self) {
        self.grid.clear_frozen();
    }

    // ========================================================================
    // 出手
    // ========================================================================

    /// 重抽未凍結的格子並計分（凍結保留到下一手）
    pub fn play_hand(&mut self) -> Result<ScoreLedger> {
        self.play_hand_with_events(&mut NoEvents)
    }

    pub fn play_hand_with_events(&mut self, events: &mut dyn ScoreEvents) -> Result<ScoreLedger> {
        if self.is_round_over() {
            return Err(EngineError::invalid("no hands left in this round"));
        }

        let redrawn = self.grid.redraw_unfrozen(&self.deck, &mut self.rng);
        let ledger = score_grid_with_events(&self.grid, &self.pipeline, &mut self.growth, &self.config, events)?;

        self.hands_played += 1;
        self.round_score = self.round_score.saturating_add(ledger.total);
        log::debug!(
            "hand {}/{} redrew {} cells and scored {} (round total {})",
            self.hands_played,
            self.config.hands_per_round,
            redrawn,
            ledger.total,
            self.round_score
        );
        self.last_ledger = Some(ledger.clone());
        Ok(ledger)
    }

    // ========================================================================
    // Joker
    // ========================================================================

    pub fn has_free_slot(&self) -> bool {
        self.pipeline.len() < self.config.joker_slots
    }

    /// 加入 Joker（新欄位的成長計數器從 0 開始）
    pub fn add_joker(&mut self, joker: JokerSpec) -> Result<()> {
        if !self.has_free_slot() {
            return Err(EngineError::invalid(format!(
                "all {} joker slots are taken",
                self.config.joker_slots
            )));
        }
        self.pipeline.push(joker)?;
        self.growth.push_slot();
        Ok(())
    }

    /// 移除第 `index` 張 Joker，回傳其定義
    pub fn sell_joker(&mut self, index: usize) -> Result<JokerSpec> {
        self.growth.remove_slot(index)?;
        self.pipeline
            .remove(index)
            .ok_or_else(|| EngineError::invalid(format!("no joker in slot {index}")))
    }

    /// 目前狀態的決策上下文（以本局牌組作為抽牌分佈）
    pub fn decision_context(&self) -> DecisionContext<'_> {
        DecisionContext::new(&self.grid, &self.config, &self.pipeline, &self.growth, &self.deck)
            .with_hands_remaining(self.hands_remaining())
            .with_previous_frozen(self.grid.frozen_cells())
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Card, CardFilter, Effect, GrowPer, Trigger, ACE, HEART};

    fn state() -> RoundState {
        RoundState::new(GameConfig::default(), Deck::standard(), 42).unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = state();
        assert_eq!(state.grid.rows(), 5);
        assert_eq!(state.grid.unfrozen_count(), 25);
        assert_eq!(state.hands_remaining(), 5);
        assert!(state.pipeline.is_empty());
        assert!(state.growth.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GameConfig {
            grid_rows: 4,
            ..GameConfig::default()
        };
        assert!(matches!(
            RoundState::new(config, Deck::standard(), 1),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_freeze_limits() {
        let mut state = state();
        state.freeze_cells(&[(0, 0), (1, 1)]).unwrap();
        assert_eq!(state.grid.frozen_cells(), vec![(0, 0), (1, 1)]);
        assert!(state.freeze_cells(&[(0, 0), (1, 1), (2, 2)]).is_err());
        assert!(state.toggle_freeze(3, 3).is_err());
        assert!(!state.toggle_freeze(1, 1).unwrap());
        assert!(state.toggle_freeze(3, 3).unwrap());
        assert!(state.toggle_freeze(9, 9).is_err());
        state.unfreeze_all();
        assert!(state.grid.frozen_cells().is_empty());
    }

    #[test]
    fn test_play_hand_keeps_frozen_cells() {
        let mut state = state();
        let kept = state.grid.card(2, 3).unwrap();
        state.freeze_cells(&[(2, 3)]).unwrap();
        let ledger = state.play_hand().unwrap();
        assert_eq!(state.grid.card(2, 3).unwrap(), kept);
        assert!(state.grid.is_frozen(2, 3).unwrap());
        assert_eq!(state.hands_played, 1);
        assert_eq!(state.round_score, ledger.total);
        assert_eq!(state.last_ledger.as_ref().map(|l| l.total), Some(ledger.total));
    }

    #[test]
    fn test_round_ends_after_all_hands() {
        let mut state = state();
        for _ in 0..5 {
            state.play_hand().unwrap();
        }
        assert!(state.is_round_over());
        assert!(state.play_hand().is_err());

        state.start_round().unwrap();
        assert_eq!(state.round, 2);
        assert_eq!(state.hands_played, 0);
        assert_eq!(state.round_score, 0);
        assert!(state.play_hand().is_ok());
    }

    #[test]
    fn test_joker_slots() {
        let mut state = state();
        state.config.joker_slots = 2;
        let joker = JokerSpec::new("j", "Joker", Trigger::Always, Effect::Mult(4));
        state.add_joker(joker.clone()).unwrap();
        state.add_joker(joker.clone()).unwrap();
        assert!(state.add_joker(joker).is_err());
        assert_eq!(state.growth.len(), 2);

        let sold = state.sell_joker(0).unwrap();
        assert_eq!(sold.id, "j");
        assert_eq!(state.pipeline.len(), 1);
        assert_eq!(state.growth.len(), 1);
        assert!(state.sell_joker(5).is_err());
    }

    #[test]
    fn test_growth_persists_across_rounds() {
        let deck = Deck::with_cards(vec![Card::new(ACE, HEART)]).unwrap();
        let grower = JokerSpec::new("g", "Grower", Trigger::Card(CardFilter::Suit(HEART)), Effect::Mult(0))
            .growing(1, GrowPer::Hand);
        let mut state = RoundState::new(GameConfig::default(), deck, 7)
            .unwrap()
            .with_jokers(vec![grower])
            .unwrap();

        state.play_hand().unwrap();
        state.play_hand().unwrap();
        assert_eq!(state.growth.values(), &[2]);
        state.start_round().unwrap();
        assert_eq!(state.growth.values(), &[2]);

        state.reset_growth_each_round = true;
        state.start_round().unwrap();
        assert_eq!(state.growth.values(), &[0]);
    }

    #[test]
    fn test_round_score_saturates() {
        let huge = JokerSpec::new("x", "X", Trigger::Always, Effect::XMult(1e18));
        let mut state = state().with_jokers(vec![huge]).unwrap();
        assert_eq!(state.play_hand().unwrap().total, i64::MAX);
        state.play_hand().unwrap();
        assert_eq!(state.round_score, i64::MAX);
    }

    #[test]
    fn test_decision_context_reflects_state() {
        let mut state = state();
        state.freeze_cells(&[(4, 4)]).unwrap();
        state.play_hand().unwrap();
        let ctx = state.decision_context();
        assert_eq!(ctx.hands_remaining, 4);
        assert_eq!(ctx.previous_frozen, vec![(4, 4)]);
        assert!(ctx.has_free_slot());
    }
}
