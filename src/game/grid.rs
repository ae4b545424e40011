//! 5×5 格子與 10 條線
//!
//! 每個格子永遠有一張牌；凍結的格子在重抽時保留原牌。
//! 線的順序固定：Row 0..5，然後 Col 0..5。

use std::fmt;

use rand::rngs::StdRng;

use super::cards::{parse_cards, Card};
use super::constants::LINE_LEN;
use super::decks::DrawDistribution;
use crate::error::{ConfigError, EngineError, Result};

// ============================================================================
// LineId / Line
// ============================================================================

/// 線的識別（行或列）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineId {
    Row(usize),
    Col(usize),
}

impl LineId {
    /// 全部線，依計分順序
    pub fn all(rows: usize, cols: usize) -> Vec<LineId> {
        (0..rows)
            .map(LineId::Row)
            .chain((0..cols).map(LineId::Col))
            .collect()
    }

    /// 線上第 `k` 張牌的座標
    pub fn cell(&self, k: usize) -> (usize, usize) {
        match *self {
            LineId::Row(r) => (r, k),
            LineId::Col(c) => (k, c),
        }
    }

    /// 此線是否經過 (row, col)
    pub fn contains(&self, row: usize, col: usize) -> bool {
        match *self {
            LineId::Row(r) => r == row,
            LineId::Col(c) => c == col,
        }
    }

    pub fn is_row(&self) -> bool {
        matches!(self, LineId::Row(_))
    }

    pub fn index(&self) -> usize {
        match *self {
            LineId::Row(i) | LineId::Col(i) => i,
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Row(i) => write!(f, "Row {}", i + 1),
            LineId::Col(i) => write!(f, "Col {}", i + 1),
        }
    }
}

/// 一條線的唯讀視圖
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    grid: &'a Grid,
    id: LineId,
}

impl<'a> Line<'a> {
    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn len(&self) -> usize {
        match self.id {
            LineId::Row(_) => self.grid.cols,
            LineId::Col(_) => self.grid.rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Card> + 'a {
        let grid = self.grid;
        let id = self.id;
        (0..self.len()).map(move |k| {
            let (r, c) = id.cell(k);
            grid.cells[r * grid.cols + c]
        })
    }

    /// 複製成定長陣列（格子尺寸已保證每條線 5 張）
    pub fn to_array(&self) -> [Card; LINE_LEN] {
        let mut out = [Card::new(1, 0); LINE_LEN];
        for (slot, card) in out.iter_mut().zip(self.iter()) {
            *slot = card;
        }
        out
    }
}

// ============================================================================
// Grid
// ============================================================================

/// 格子：rows × cols 的牌與凍結遮罩（row-major）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Card>,
    frozen: Vec<bool>,
}

/// 每條線都必須正好 5 張牌
pub fn validate_dimensions(rows: usize, cols: usize) -> std::result::Result<(), ConfigError> {
    if rows != LINE_LEN || cols != LINE_LEN {
        return Err(ConfigError::InvalidGridDimensions {
            rows,
            cols,
            line_len: LINE_LEN,
        });
    }
    Ok(())
}

impl Grid {
    /// 由 row-major 牌列建立
    pub fn from_cards(rows: usize, cols: usize, cards: Vec<Card>) -> Result<Self> {
        validate_dimensions(rows, cols)?;
        if cards.len() != rows * cols {
            return Err(EngineError::invalid(format!(
                "grid {rows}x{cols} needs {} cards, got {}",
                rows * cols,
                cards.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            frozen: vec![false; cards.len()],
            cells: cards,
        })
    }

    /// 由逐行牌列建立
    pub fn from_rows(rows: Vec<Vec<Card>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(EngineError::invalid("grid rows have different lengths"));
        }
        Self::from_cards(n_rows, n_cols, rows.into_iter().flatten().collect())
    }

    /// 解析文字格子：每行一列（以換行或 `/` 分隔），牌碼以空白分隔
    pub fn parse(text: &str) -> Result<Self> {
        let rows = text
            .split(|c| c == '\n' || c == '/')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(parse_cards)
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(rows)
    }

    /// 從分佈發一整個新格子（無凍結）
    pub fn deal(
        rows: usize,
        cols: usize,
        dist: &dyn DrawDistribution,
        rng: &mut StdRng,
    ) -> Result<Self> {
        validate_dimensions(rows, cols)?;
        let cards = (0..rows * cols)
            .map(|_| dist.draw_with_replacement(rng))
            .collect();
        Self::from_cards(rows, cols, cards)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 檢查座標並回傳 row-major 索引
    pub fn check_cell(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(EngineError::invalid(format!(
                "cell ({row}, {col}) is outside the {}x{} grid",
                self.rows, self.cols
            )));
        }
        Ok(row * self.cols + col)
    }

    pub fn card(&self, row: usize, col: usize) -> Result<Card> {
        let idx = self.check_cell(row, col)?;
        Ok(self.cells[idx])
    }

    pub fn set_card(&mut self, row: usize, col: usize, card: Card) -> Result<()> {
        let idx = self.check_cell(row, col)?;
        self.cells[idx] = card;
        Ok(())
    }

    /// 全部牌與座標，row-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Card)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &card)| (i / cols, i % cols, card))
    }

    // ========================================================================
    // 凍結
    // ========================================================================

    pub fn is_frozen(&self, row: usize, col: usize) -> Result<bool> {
        let idx = self.check_cell(row, col)?;
        Ok(self.frozen[idx])
    }

    pub fn freeze(&mut self, row: usize, col: usize) -> Result<()> {
        let idx = self.check_cell(row, col)?;
        self.frozen[idx] = true;
        Ok(())
    }

    pub fn unfreeze(&mut self, row: usize, col: usize) -> Result<()> {
        let idx = self.check_cell(row, col)?;
        self.frozen[idx] = false;
        Ok(())
    }

    /// 切換凍結狀態，回傳新狀態
    pub fn toggle_freeze(&mut self, row: usize, col: usize) -> Result<bool> {
        let idx = self.check_cell(row, col)?;
        self.frozen[idx] = !self.frozen[idx];
        Ok(self.frozen[idx])
    }

    pub fn clear_frozen(&mut self) {
        self.frozen.iter_mut().for_each(|f| *f = false);
    }

    /// 以指定座標取代整個凍結集合（任一座標越界則不做任何修改）
    pub fn set_frozen_cells(&mut self, cells: &[(usize, usize)]) -> Result<()> {
        let indices = cells
            .iter()
            .map(|&(r, c)| self.check_cell(r, c))
            .collect::<Result<Vec<_>>>()?;
        self.clear_frozen();
        for idx in indices {
            self.frozen[idx] = true;
        }
        Ok(())
    }

    pub fn frozen_cells(&self) -> Vec<(usize, usize)> {
        self.frozen
            .iter()
            .enumerate()
            .filter(|(_, &f)| f)
            .map(|(i, _)| (i / self.cols, i % self.cols))
            .collect()
    }

    pub fn unfrozen_count(&self) -> usize {
        self.frozen.iter().filter(|&&f| !f).count()
    }

    /// 重抽所有未凍結的格子，回傳重抽數量
    pub fn redraw_unfrozen(&mut self, dist: &dyn DrawDistribution, rng: &mut StdRng) -> usize {
        let mut redrawn = 0;
        for (cell, &frozen) in self.cells.iter_mut().zip(self.frozen.iter()) {
            if !frozen {
                *cell = dist.draw_with_replacement(rng);
                redrawn += 1;
            }
        }
        redrawn
    }

    // ========================================================================
    // 線
    // ========================================================================

    pub fn line(&self, id: LineId) -> Result<Line<'_>> {
        let in_range = match id {
            LineId::Row(r) => r < self.rows,
            LineId::Col(c) => c < self.cols,
        };
        if !in_range {
            return Err(EngineError::invalid(format!("{id} is outside the grid")));
        }
        Ok(Line { grid: self, id })
    }

    /// 全部 10 條線（Row 0..5，Col 0..5）
    pub fn lines(&self) -> impl Iterator<Item = Line<'_>> + '_ {
        LineId::all(self.rows, self.cols)
            .into_iter()
            .map(move |id| Line { grid: self, id })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let idx = r * self.cols + c;
                let mark = if self.frozen[idx] { "*" } else { " " };
                write!(f, "{:>3}{}", self.cells[idx].to_string(), mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{CLUB, DIAMOND, HEART, SPADE};
    use crate::game::decks::Deck;
    use rand::SeedableRng;

    const SAMPLE: &str = "AS 2S 3S 4S 5S / AD 2D 3D 4D 5D / AH 2H 3H 4H 5H / AC 2C 3C 4C 5C / KS KD KH KC QS";

    #[test]
    fn test_parse_grid() {
        let grid = Grid::parse(SAMPLE).unwrap();
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.card(0, 0).unwrap(), Card::new(1, SPADE));
        assert_eq!(grid.card(4, 4).unwrap(), Card::new(12, SPADE));
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Grid::parse("AS 2S 3S 4S / AD 2D 3D 4D").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::InvalidGridDimensions { rows: 2, cols: 4, .. })
        ));
    }

    #[test]
    fn test_line_order_and_membership() {
        let grid = Grid::parse(SAMPLE).unwrap();
        let ids: Vec<LineId> = grid.lines().map(|l| l.id()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids[0], LineId::Row(0));
        assert_eq!(ids[5], LineId::Col(0));

        let col0: Vec<Card> = grid.line(LineId::Col(0)).unwrap().iter().collect();
        assert_eq!(
            col0,
            vec![
                Card::new(1, SPADE),
                Card::new(1, DIAMOND),
                Card::new(1, HEART),
                Card::new(1, CLUB),
                Card::new(13, SPADE)
            ]
        );

        // 每格屬於正好兩條線
        for r in 0..5 {
            for c in 0..5 {
                let count = LineId::all(5, 5).iter().filter(|l| l.contains(r, c)).count();
                assert_eq!(count, 2);
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::parse(SAMPLE).unwrap();
        assert!(grid.card(5, 0).is_err());
        assert!(grid.freeze(0, 5).is_err());
        assert!(grid.line(LineId::Row(5)).is_err());
        assert!(grid.set_frozen_cells(&[(0, 0), (9, 9)]).is_err());
        assert!(grid.frozen_cells().is_empty());
    }

    #[test]
    fn test_freeze_toggle() {
        let mut grid = Grid::parse(SAMPLE).unwrap();
        grid.freeze(1, 2).unwrap();
        assert!(grid.is_frozen(1, 2).unwrap());
        assert!(!grid.toggle_freeze(1, 2).unwrap());
        assert!(grid.toggle_freeze(3, 3).unwrap());
        assert_eq!(grid.frozen_cells(), vec![(3, 3)]);
        assert_eq!(grid.unfrozen_count(), 24);

        grid.set_frozen_cells(&[(0, 0), (4, 4)]).unwrap();
        assert_eq!(grid.frozen_cells(), vec![(0, 0), (4, 4)]);
    }

    #[test]
    fn test_redraw_keeps_frozen_cells() {
        let mut grid = Grid::parse(SAMPLE).unwrap();
        grid.set_frozen_cells(&[(0, 0), (2, 3)]).unwrap();
        let deck = Deck::with_cards(vec![Card::new(9, CLUB)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(grid.redraw_unfrozen(&deck, &mut rng), 23);
        assert_eq!(grid.card(0, 0).unwrap(), Card::new(1, SPADE));
        assert_eq!(grid.card(2, 3).unwrap(), Card::new(4, HEART));
        assert_eq!(grid.card(1, 1).unwrap(), Card::new(9, CLUB));
    }

    #[test]
    fn test_deal_fills_every_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::deal(5, 5, &Deck::standard(), &mut rng).unwrap();
        assert_eq!(grid.cells().count(), 25);
        assert!(grid.frozen_cells().is_empty());
        assert!(Grid::deal(4, 5, &Deck::standard(), &mut rng).is_err());
    }

    #[test]
    fn test_line_to_array() {
        let grid = Grid::parse(SAMPLE).unwrap();
        let row = grid.line(LineId::Row(4)).unwrap().to_array();
        assert_eq!(row[3], Card::new(13, CLUB));
        assert_eq!(LineId::Col(2).cell(4), (4, 2));
        assert_eq!(LineId::Row(2).to_string(), "Row 3");
    }
}
