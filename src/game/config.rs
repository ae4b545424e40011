//! 遊戲設定
//!
//! `GameConfig` 可以直接用 `Default` 建立，或從 JSON 讀取；
//! 兩種方式都會在建構時驗證。

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants::{GRID_COLS, GRID_ROWS, HANDS_PER_ROUND, JOKER_SLOTS, LINE_COUNT, MAX_FREEZES};
use super::grid::validate_dimensions;
use super::hand_types::{HandId, HAND_TYPE_COUNT};
use crate::error::ConfigError;

// ============================================================================
// 牌型分數表
// ============================================================================

/// 單一牌型的基礎分數
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandScore {
    pub chips: i64,
    pub mult: i64,
}

/// 牌型分數表，涵蓋全部 11 種牌型
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandScoreTable {
    scores: [HandScore; HAND_TYPE_COUNT],
}

impl Default for HandScoreTable {
    fn default() -> Self {
        let mut scores = [HandScore { chips: 0, mult: 0 }; HAND_TYPE_COUNT];
        for id in HandId::ALL {
            let (chips, mult) = id.base_values();
            scores[id.to_index()] = HandScore { chips, mult };
        }
        Self { scores }
    }
}

impl HandScoreTable {
    /// 從「牌型名稱 → 分數」建立，必須覆蓋每一種牌型且每種只能出現一次（別名也算）
    pub fn from_map(entries: &BTreeMap<String, HandScore>) -> Result<Self, ConfigError> {
        let mut slots: [Option<HandScore>; HAND_TYPE_COUNT] = [None; HAND_TYPE_COUNT];
        for (name, score) in entries {
            let id = HandId::from_name(name)
                .ok_or_else(|| ConfigError::UnknownHandCategory(name.clone()))?;
            check_score(id, *score)?;
            let slot = &mut slots[id.to_index()];
            if slot.is_some() {
                return Err(ConfigError::InvalidSetting {
                    field: "hand_scores",
                    reason: format!("{name:?} repeats an entry for {}", id.name()),
                });
            }
            *slot = Some(*score);
        }

        let mut scores = [HandScore { chips: 0, mult: 0 }; HAND_TYPE_COUNT];
        for id in HandId::ALL {
            scores[id.to_index()] = slots[id.to_index()].ok_or(ConfigError::MissingHandScore(id))?;
        }
        Ok(Self { scores })
    }

    pub fn get(&self, id: HandId) -> HandScore {
        self.scores[id.to_index()]
    }

    /// 覆寫單一牌型
    pub fn with_score(mut self, id: HandId, chips: i64, mult: i64) -> Result<Self, ConfigError> {
        let score = HandScore { chips, mult };
        check_score(id, score)?;
        self.scores[id.to_index()] = score;
        Ok(self)
    }

    pub fn to_map(&self) -> BTreeMap<String, HandScore> {
        HandId::ALL
            .iter()
            .map(|id| (id.name().to_string(), self.get(*id)))
            .collect()
    }
}

fn check_score(id: HandId, score: HandScore) -> Result<(), ConfigError> {
    if score.chips < 0 || score.mult < 0 {
        return Err(ConfigError::InvalidSetting {
            field: "hand_scores",
            reason: format!(
                "{} has negative base score {}/{}",
                id.name(),
                score.chips,
                score.mult
            ),
        });
    }
    Ok(())
}

// ============================================================================
// GameConfig
// ============================================================================

/// 引擎設定
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub hand_scores: HandScoreTable,
    /// 只計入最高的 K 條線；`None` 為全部 10 條
    pub lines_scored: Option<usize>,
    pub max_freezes: usize,
    pub joker_slots: usize,
    pub hands_per_round: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_rows: GRID_ROWS,
            grid_cols: GRID_COLS,
            hand_scores: HandScoreTable::default(),
            lines_scored: None,
            max_freezes: MAX_FREEZES,
            joker_slots: JOKER_SLOTS,
            hands_per_round: HANDS_PER_ROUND,
        }
    }
}

/// JSON 形式，缺少的欄位取預設值
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
struct GameConfigFile {
    grid_rows: usize,
    grid_cols: usize,
    hand_scores: Option<BTreeMap<String, HandScore>>,
    lines_scored: Option<usize>,
    max_freezes: usize,
    joker_slots: usize,
    hands_per_round: u32,
}

impl Default for GameConfigFile {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            grid_rows: config.grid_rows,
            grid_cols: config.grid_cols,
            hand_scores: None,
            lines_scored: config.lines_scored,
            max_freezes: config.max_freezes,
            joker_slots: config.joker_slots,
            hands_per_round: config.hands_per_round,
        }
    }
}

impl GameConfig {
    /// 從檔案讀取
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        log::debug!("loading game config from {}", path.display());
        Self::from_json(&content)
    }

    /// 從 JSON 字串解析並驗證
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: GameConfigFile = serde_json::from_str(json)?;
        let hand_scores = match &file.hand_scores {
            Some(map) => HandScoreTable::from_map(map)?,
            None => HandScoreTable::default(),
        };
        let config = Self {
            grid_rows: file.grid_rows,
            grid_cols: file.grid_cols,
            hand_scores,
            lines_scored: file.lines_scored,
            max_freezes: file.max_freezes,
            joker_slots: file.joker_slots,
            hands_per_round: file.hands_per_round,
        };
        config.validate()?;
        Ok(config)
    }

    /// 序列化成 JSON（與 `from_json` 互通）
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let file = GameConfigFile {
            grid_rows: self.grid_rows,
            grid_cols: self.grid_cols,
            hand_scores: Some(self.hand_scores.to_map()),
            lines_scored: self.lines_scored,
            max_freezes: self.max_freezes,
            joker_slots: self.joker_slots,
            hands_per_round: self.hands_per_round,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.grid_rows, self.grid_cols)?;

        if let Some(k) = self.lines_scored {
            if k == 0 || k > LINE_COUNT {
                return Err(ConfigError::InvalidSetting {
                    field: "lines_scored",
                    reason: format!("must be between 1 and {LINE_COUNT}, got {k}"),
                });
            }
        }

        if self.max_freezes > self.grid_rows * self.grid_cols {
            return Err(ConfigError::InvalidSetting {
                field: "max_freezes",
                reason: format!("{} exceeds the number of cells", self.max_freezes),
            });
        }

        if self.hands_per_round == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "hands_per_round",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// 實際計入總分的線數
    pub fn counted_lines(&self) -> usize {
        self.lines_scored.unwrap_or(self.grid_rows + self.grid_cols)
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_all_categories() {
        let table = HandScoreTable::default();
        assert_eq!(table.get(HandId::Pair), HandScore { chips: 10, mult: 2 });
        assert_eq!(table.get(HandId::FiveKind), HandScore { chips: 120, mult: 12 });
        assert_eq!(table.to_map().len(), HAND_TYPE_COUNT);
    }

    #[test]
    fn test_missing_hand_score_rejected() {
        let mut map = HandScoreTable::default().to_map();
        map.remove("Five of a Kind");
        assert!(matches!(
            HandScoreTable::from_map(&map),
            Err(ConfigError::MissingHandScore(HandId::FiveKind))
        ));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut map = HandScoreTable::default().to_map();
        map.insert("Six of a Kind".to_string(), HandScore { chips: 1, mult: 1 });
        assert!(matches!(
            HandScoreTable::from_map(&map),
            Err(ConfigError::UnknownHandCategory(name)) if name == "Six of a Kind"
        ));
    }

    #[test]
    fn test_aliased_duplicate_rejected() {
        let mut map = HandScoreTable::default().to_map();
        map.insert("Pair".to_string(), HandScore { chips: 999, mult: 9 });
        assert!(matches!(
            HandScoreTable::from_map(&map),
            Err(ConfigError::InvalidSetting { field: "hand_scores", .. })
        ));

        let json = r#"{"hand_scores": {"Trips": {"chips": 30, "mult": 3}}}"#;
        let mut value: serde_json::Value = serde_json::from_str(json).unwrap();
        for (name, score) in HandScoreTable::default().to_map() {
            value["hand_scores"][name] = serde_json::to_value(score).unwrap();
        }
        assert!(GameConfig::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.counted_lines(), 10);
    }

    #[test]
    fn test_from_json_overrides() {
        let config = GameConfig::from_json(r#"{ "lines_scored": 3, "joker_slots": 4 }"#).unwrap();
        assert_eq!(config.lines_scored, Some(3));
        assert_eq!(config.joker_slots, 4);
        assert_eq!(config.counted_lines(), 3);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig {
            hand_scores: HandScoreTable::default()
                .with_score(HandId::Pair, 12, 3)
                .unwrap(),
            ..GameConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            GameConfig::from_json(r#"{ "grid_rows": 4 }"#),
            Err(ConfigError::InvalidGridDimensions { rows: 4, .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "lines_scored": 0 }"#),
            Err(ConfigError::InvalidSetting { field: "lines_scored", .. })
        ));
        assert!(matches!(
            GameConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(HandScoreTable::default().with_score(HandId::Flush, -1, 4).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            GameConfig::load("/nonexistent/joker_grid.json"),
            Err(ConfigError::Io(_, _))
        ));
    }
}
