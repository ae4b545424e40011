//! 遊戲常量定義

// ============================================================================
// 格子常量
// ============================================================================

pub const LINE_LEN: usize = 5;           // 每條線 5 張牌
pub const GRID_ROWS: usize = 5;          // 預設行數
pub const GRID_COLS: usize = 5;          // 預設列數
pub const LINE_COUNT: usize = GRID_ROWS + GRID_COLS; // 10 條線

// ============================================================================
// 卡牌常量
// ============================================================================

pub const RANK_COUNT: usize = 13;
pub const SUIT_COUNT: usize = 4;
pub const DECK_SIZE: usize = RANK_COUNT * SUIT_COUNT;

// ============================================================================
// 回合規則常量
// ============================================================================

pub const JOKER_SLOTS: usize = 5;        // Joker 欄位數
pub const MAX_FREEZES: usize = 2;        // 每手最多凍結格數
pub const HANDS_PER_ROUND: u32 = 5;      // 每回合出手次數
pub const DEFAULT_REROLL_COST: i64 = 5;

// ============================================================================
// AI 評估常量
// ============================================================================

pub const DEFAULT_SAMPLES: usize = 200;  // Monte Carlo 預設取樣數
pub const CANDIDATE_CAP: usize = 24;     // 凍結候選上限
pub const BUY_THRESHOLD: f64 = 0.02;     // 購買最低價值
pub const SELL_THRESHOLD: f64 = 0.05;    // 賣舊買新最低淨增益
pub const REROLL_MIN_VALUE: f64 = 0.015; // 商店最佳價值低於此值時 reroll
