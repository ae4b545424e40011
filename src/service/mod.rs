//! 服務層模組
//!
//! 計分協調、Monte Carlo 模擬、凍結候選、Joker 估值、AI 決策與回合狀態

pub mod agent;
pub mod candidates;
pub mod scoring;
pub mod simulation;
pub mod state;
pub mod valuation;

pub use agent::{DecisionAgent, DecisionContext, NormalAgent, RankedFreeze, ShopAction, SmartAgent};
pub use candidates::{best_aligned_pair, best_suited_pair, generate_freeze_candidates, CandidateKind, FreezeCandidate};
pub use scoring::{score_grid, score_grid_with_events, LineScore, NoEvents, ScoreEvents, ScoreLedger};
pub use simulation::{
    estimate_expected_score, estimate_with_cancel, simulate, CancelToken, SimulationSummary, Simulator,
};
pub use state::RoundState;
pub use valuation::{heuristic_value, JokerValuator, ShopWeights};
