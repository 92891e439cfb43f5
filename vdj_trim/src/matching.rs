// Copyright (c) 2024 10x Genomics, Inc. All rights reserved.
//! Exact substring matching between two residue strings.

/// A common substring: `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Length of the common run of `a` and `b` starting at `i` and `j`.
fn run_len(a: &[u8], b: &[u8], i: usize, j: usize) -> usize {
    a[i..].iter().zip(&b[j..]).take_while(|(x, y)| x == y).count()
}

/// Longest common substring of `a` and `b`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`. If nothing matches the
/// result has length zero and both starts at zero.
pub fn longest_match(a: &[u8], b: &[u8]) -> Block {
    let mut best = Block::default();
    for i in 0..a.len() {
        for j in 0..b.len() {
            let len = run_len(a, b, i, j);
            if len > best.len {
                best = Block {
                    a_start: i,
                    b_start: j,
                    len,
                };
            }
        }
    }
    best
}

/// Longest common substring of `a` and `b` that starts with `anchor`, using the same tie
/// break as [`longest_match`].
pub fn longest_anchored_match(a: &[u8], b: &[u8], anchor: u8) -> Option<Block> {
    let mut best: Option<Block> = None;
    for i in (0..a.len()).filter(|&i| a[i] == anchor) {
        for j in (0..b.len()).filter(|&j| b[j] == anchor) {
            let len = run_len(a, b, i, j);
            if best.map_or(true, |blk| len > blk.len) {
                best = Some(Block {
                    a_start: i,
                    b_start: j,
                    len,
                });
            }
        }
    }
    best
}
