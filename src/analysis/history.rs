//! Rolling spectral history (waterfall depth buffer)
//!
//! Row 0 is always the newest line. The backing store is sized for
//! `MAX_HISTORY_LINES` rows so changing the visible depth never reallocates;
//! only a bar-count change does.

use super::config::MAX_HISTORY_LINES;
use super::{try_zeroed, AnalysisError};

/// Bounded stack of display lines, newest first
#[derive(Clone, Debug)]
pub struct HistoryRing {
    /// `MAX_HISTORY_LINES * bar_count` values, row-major
    rows: Vec<f32>,
    bar_count: usize,
    /// Logical depth (rows in use)
    depth: usize,
    /// Lines pushed since the last reset, saturating at `depth`
    filled: usize,
}

impl HistoryRing {
    pub fn new(bar_count: usize, depth: usize) -> Result<Self, AnalysisError> {
        let len = MAX_HISTORY_LINES
            .checked_mul(bar_count)
            .ok_or(AnalysisError::BarCount(bar_count))?;
        Ok(Self {
            rows: try_zeroed(len)?,
            bar_count,
            depth: depth.clamp(1, MAX_HISTORY_LINES),
            filled: 0,
        })
    }

    /// Shift every row down by one and write `line` into row 0.
    ///
    /// `line` is truncated or zero-extended to the bar count.
    pub fn push(&mut self, line: &[f32]) {
        let bars = self.bar_count;
        if bars == 0 {
            return;
        }

        let used = self.depth * bars;
        self.rows.copy_within(0..used - bars, bars);

        let row0 = &mut self.rows[..bars];
        let n = line.len().min(bars);
        row0[..n].copy_from_slice(&line[..n]);
        row0[n..].iter_mut().for_each(|v| *v = 0.0);

        if self.filled < self.depth {
            self.filled += 1;
        }
    }

    /// Zero all rows and the fill counter
    pub fn reset(&mut self) {
        self.rows.iter_mut().for_each(|v| *v = 0.0);
        self.filled = 0;
    }

    /// Change the visible depth without reallocating.
    ///
    /// Rows exposed by growing are zeroed so stale data never reappears.
    pub fn set_depth(&mut self, depth: usize) {
        let depth = depth.clamp(1, MAX_HISTORY_LINES);
        if depth > self.depth {
            let bars = self.bar_count;
            self.rows[self.depth * bars..depth * bars]
                .iter_mut()
                .for_each(|v| *v = 0.0);
        }
        self.depth = depth;
        self.filled = self.filled.min(depth);
    }

    /// Row `k` (0 = newest), or `None` past the depth
    pub fn row(&self, k: usize) -> Option<&[f32]> {
        if k >= self.depth {
            return None;
        }
        let bars = self.bar_count;
        Some(&self.rows[k * bars..(k + 1) * bars])
    }

    /// Rows newest to oldest, `depth` of them
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.rows[..self.depth * self.bar_count].chunks(self.bar_count.max(1))
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn filled(&self) -> usize {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_push() {
        let mut ring = HistoryRing::new(4, 5).unwrap();
        ring.push(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(ring.row(0).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        for k in 1..5 {
            assert!(ring.row(k).unwrap().iter().all(|&v| v == 0.0));
        }
        assert_eq!(ring.filled(), 1);
    }

    #[test]
    fn test_shift_law_drops_oldest() {
        let depth = 3;
        let mut ring = HistoryRing::new(2, depth).unwrap();
        for i in 1..=depth + 1 {
            ring.push(&[i as f32, i as f32 * 10.0]);
        }

        assert_eq!(ring.row(0).unwrap(), &[4.0, 40.0]);
        assert_eq!(ring.row(1).unwrap(), &[3.0, 30.0]);
        assert_eq!(ring.row(2).unwrap(), &[2.0, 20.0]);
        assert!(ring.rows().all(|row| row != [1.0, 10.0]));
        assert_eq!(ring.filled(), depth);
    }

    #[test]
    fn test_zero_lines_fill_count() {
        let mut ring = HistoryRing::new(8, 3).unwrap();
        let zeros = [0.0; 8];
        for _ in 0..3 {
            ring.push(&zeros);
        }
        assert_eq!(ring.row(2).unwrap(), &zeros);
        assert_eq!(ring.filled(), 3);
    }

    #[test]
    fn test_reset() {
        let mut ring = HistoryRing::new(2, 2).unwrap();
        ring.push(&[1.0, 1.0]);
        ring.reset();
        assert_eq!(ring.filled(), 0);
        assert!(ring.rows().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn test_depth_change_keeps_store() {
        let mut ring = HistoryRing::new(2, 4).unwrap();
        for i in 0..4 {
            ring.push(&[i as f32; 2]);
        }
        ring.set_depth(2);
        assert_eq!(ring.filled(), 2);
        assert_eq!(ring.rows().count(), 2);
        assert!(ring.row(2).is_none());

        ring.set_depth(4);
        // Previously visible rows 2..4 come back zeroed
        assert_eq!(ring.row(3).unwrap(), &[0.0, 0.0]);
        assert_eq!(ring.row(0).unwrap(), &[3.0, 3.0]);
    }

    #[test]
    fn test_depth_bounded() {
        let mut ring = HistoryRing::new(1, MAX_HISTORY_LINES * 2).unwrap();
        assert_eq!(ring.depth(), MAX_HISTORY_LINES);
        ring.set_depth(0);
        assert_eq!(ring.depth(), 1);
        ring.push(&[5.0]);
        ring.push(&[6.0]);
        assert_eq!(ring.row(0).unwrap(), &[6.0]);
    }

    #[test]
    fn test_short_line_zero_extended() {
        let mut ring = HistoryRing::new(3, 2).unwrap();
        ring.push(&[1.0, 1.0, 1.0]);
        ring.push(&[2.0]);
        assert_eq!(ring.row(0).unwrap(), &[2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_oversized_store_is_an_error() {
        // Row count times bars overflows usize
        assert!(matches!(
            HistoryRing::new(usize::MAX / 4, 1),
            Err(AnalysisError::BarCount(_))
        ));
        // Fits in usize but not in the address space
        assert!(matches!(
            HistoryRing::new(usize::MAX / 1024, 1),
            Err(AnalysisError::Allocation(_))
        ));
    }
}
