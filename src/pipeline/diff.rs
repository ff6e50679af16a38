//! Line-level diff summaries for changed pages.
//!
//! Computes the shortest edit script between two normalized texts
//! (Myers, linear space) and reduces it to bounded lists of added and
//! removed lines. Lines the edit script keeps aligned are never reported,
//! so a moved line that still lines up is not shown as added + removed.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::models::DiffConfig;

/// Marker used when fingerprints differ but no line differs.
pub const NO_VISIBLE_CHANGES: &str = "(no visible text differences)";

/// Bounded account of what changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiffSummary {
    /// Added lines, truncated to the configured bound
    pub added: Vec<String>,
    /// Removed lines, truncated to the configured bound
    pub removed: Vec<String>,
    /// Number of added lines before truncation
    pub added_total: usize,
    /// Number of removed lines before truncation
    pub removed_total: usize,
}

impl DiffSummary {
    /// Check if any line was added or removed.
    pub fn has_changes(&self) -> bool {
        self.added_total > 0 || self.removed_total > 0
    }

    /// Added lines left out of `added`.
    pub fn added_omitted(&self) -> usize {
        self.added_total - self.added.len()
    }

    /// Removed lines left out of `removed`.
    pub fn removed_omitted(&self) -> usize {
        self.removed_total - self.removed.len()
    }

    /// Human-readable multi-line rendering.
    pub fn render(&self) -> String {
        if !self.has_changes() {
            return NO_VISIBLE_CHANGES.to_string();
        }

        let mut parts = Vec::new();
        parts.push(format!("ADDED ({} lines):", self.added_total));
        for line in &self.added {
            parts.push(format!("  + {}", line));
        }
        if self.added_omitted() > 0 {
            parts.push(format!("  ... and {} more lines", self.added_omitted()));
        }

        parts.push(format!("REMOVED ({} lines):", self.removed_total));
        for line in &self.removed {
            parts.push(format!("  - {}", line));
        }
        if self.removed_omitted() > 0 {
            parts.push(format!("  ... and {} more lines", self.removed_omitted()));
        }

        parts.join("\n")
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Calculator for diff summaries between snapshot contents.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    max_lines: usize,
    max_line_width: usize,
}

impl Default for DiffCalculator {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl DiffCalculator {
    /// Create a calculator with explicit bounds.
    pub fn new(max_lines: usize, max_line_width: usize) -> Self {
        Self {
            max_lines,
            max_line_width,
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new(config.max_lines, config.max_line_width)
    }

    /// Summarize the line changes from `previous` to `current`.
    pub fn calculate(&self, previous: &str, current: &str) -> DiffSummary {
        let old_lines: Vec<&str> = previous.lines().collect();
        let new_lines: Vec<&str> = current.lines().collect();
        let (old_kept, new_kept) = align_lines(&old_lines, &new_lines);

        let removed: Vec<&str> = old_lines
            .iter()
            .zip(&old_kept)
            .filter(|(_, kept)| !**kept)
            .map(|(line, _)| *line)
            .collect();
        let added: Vec<&str> = new_lines
            .iter()
            .zip(&new_kept)
            .filter(|(_, kept)| !**kept)
            .map(|(line, _)| *line)
            .collect();

        DiffSummary {
            added_total: added.len(),
            removed_total: removed.len(),
            added: self.bounded(&added),
            removed: self.bounded(&removed),
        }
    }

    fn bounded(&self, lines: &[&str]) -> Vec<String> {
        lines
            .iter()
            .take(self.max_lines)
            .map(|line| clip(line, self.max_line_width))
            .collect()
    }
}

/// Convenience function using default bounds.
pub fn summarize(previous: &str, current: &str) -> DiffSummary {
    DiffCalculator::default().calculate(previous, current)
}

fn clip(line: &str, width: usize) -> String {
    line.graphemes(true).take(width).collect()
}

/// Mark which lines on each side belong to the longest common subsequence.
fn align_lines<'a>(old: &[&'a str], new: &[&'a str]) -> (Vec<bool>, Vec<bool>) {
    // Intern lines so comparisons are integer compares.
    let mut ids: HashMap<&'a str, usize> = HashMap::new();
    let mut intern = |line: &'a str| -> usize {
        let next = ids.len();
        *ids.entry(line).or_insert(next)
    };
    let a: Vec<usize> = old.iter().map(|l| intern(*l)).collect();
    let b: Vec<usize> = new.iter().map(|l| intern(*l)).collect();

    let mut aligner = Aligner::new(&a, &b);
    aligner.conquer(0, a.len(), 0, b.len());
    (aligner.a_kept, aligner.b_kept)
}

struct Aligner<'a> {
    a: &'a [usize],
    b: &'a [usize],
    a_kept: Vec<bool>,
    b_kept: Vec<bool>,
    vf: Diagonals,
    vb: Diagonals,
}

impl<'a> Aligner<'a> {
    fn new(a: &'a [usize], b: &'a [usize]) -> Self {
        let d_max = max_d(a.len(), b.len());
        Self {
            a,
            b,
            a_kept: vec![false; a.len()],
            b_kept: vec![false; b.len()],
            vf: Diagonals::new(d_max),
            vb: Diagonals::new(d_max),
        }
    }

    fn keep(&mut self, x: usize, y: usize) {
        self.a_kept[x] = true;
        self.b_kept[y] = true;
    }

    fn conquer(&mut self, mut a_lo: usize, mut a_hi: usize, mut b_lo: usize, mut b_hi: usize) {
        while a_lo < a_hi && b_lo < b_hi && self.a[a_lo] == self.b[b_lo] {
            self.keep(a_lo, b_lo);
            a_lo += 1;
            b_lo += 1;
        }
        while a_lo < a_hi && b_lo < b_hi && self.a[a_hi - 1] == self.b[b_hi - 1] {
            self.keep(a_hi - 1, b_hi - 1);
            a_hi -= 1;
            b_hi -= 1;
        }
        if a_lo == a_hi || b_lo == b_hi {
            return;
        }

        if let Some((x, y)) = self.middle_snake(a_lo, a_hi, b_lo, b_hi) {
            let stuck = (x == a_lo && y == b_lo) || (x == a_hi && y == b_hi);
            if !stuck {
                self.conquer(a_lo, x, b_lo, y);
                self.conquer(x, a_hi, y, b_hi);
            }
        }
    }

    /// Split point of an optimal edit path through the given box.
    fn middle_snake(
        &mut self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> Option<(usize, usize)> {
        let n = (a_hi - a_lo) as isize;
        let m = (b_hi - b_lo) as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;

        self.vf.set(1, 0);
        self.vb.set(1, 0);

        let d_max = max_d(n as usize, m as usize) as isize;
        for d in 0..d_max {
            let mut k = d;
            while k >= -d {
                let mut x = if k == -d || (k != d && self.vf.get(k - 1) < self.vf.get(k + 1)) {
                    self.vf.get(k + 1)
                } else {
                    self.vf.get(k - 1) + 1
                };
                let mut y = x - k;
                let (x0, y0) = (x, y);
                while x < n && y < m && self.a[a_lo + x as usize] == self.b[b_lo + y as usize] {
                    x += 1;
                    y += 1;
                }
                self.vf.set(k, x);
                if odd
                    && (k - delta).abs() <= d - 1
                    && self.vf.get(k) + self.vb.get(-(k - delta)) >= n
                {
                    return Some((a_lo + x0 as usize, b_lo + y0 as usize));
                }
                k -= 2;
            }

            let mut k = d;
            while k >= -d {
                let mut x = if k == -d || (k != d && self.vb.get(k - 1) < self.vb.get(k + 1)) {
                    self.vb.get(k + 1)
                } else {
                    self.vb.get(k - 1) + 1
                };
                let mut y = x - k;
                while x < n
                    && y < m
                    && self.a[a_hi - 1 - x as usize] == self.b[b_hi - 1 - y as usize]
                {
                    x += 1;
                    y += 1;
                }
                self.vb.set(k, x);
                if !odd
                    && (k - delta).abs() <= d
                    && self.vb.get(k) + self.vf.get(-(k - delta)) >= n
                {
                    return Some((a_hi - x as usize, b_hi - y as usize));
                }
                k -= 2;
            }
        }
        None
    }
}

fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

/// Furthest-reaching x per diagonal, indexed by signed k.
struct Diagonals {
    offset: isize,
    v: Vec<isize>,
}

impl Diagonals {
    fn new(d_max: usize) -> Self {
        Self {
            offset: d_max as isize + 1,
            v: vec![0; 2 * d_max + 3],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.v[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.v[(k + self.offset) as usize] = x;
    }
}
