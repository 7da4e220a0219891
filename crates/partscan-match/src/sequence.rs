// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sequence similarity (Ratcliff/Obershelp "gestalt pattern matching").
//
// The similarity of `a` and `b` is `2·M / (|a| + |b|)` where `M` is the number
// of characters in the matching blocks found by repeatedly taking the longest
// common contiguous block and recursing on the pieces to its left and right.
// Among equally long blocks the one starting earliest in `a`, then earliest in
// `b`, wins, which keeps results deterministic.
//
// The matcher is built once for `b` (the identifier) and compared against many
// `a` values (the document tokens).

use std::collections::HashMap;

/// Sequences at least this long get the popular-element heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Character-level matcher with a fixed second sequence.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    b: Vec<char>,
    /// Character → ascending positions in `b`. Popular characters of long
    /// sequences are left out so they cannot seed a match.
    b2j: HashMap<char, Vec<usize>>,
    /// Character counts of `b`, for `quick_ratio`.
    b_counts: HashMap<char, usize>,
}

impl SequenceMatcher {
    pub fn new(b: &str) -> Self {
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            b2j.entry(*ch).or_default().push(j);
        }
        let b_counts = b2j.iter().map(|(ch, idxs)| (*ch, idxs.len())).collect();

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, idxs| idxs.len() <= ntest);
        }

        Self { b, b2j, b_counts }
    }

    /// Length of the fixed sequence, in characters.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Similarity of `a` to the fixed sequence, in `[0, 1]`.
    pub fn ratio(&self, a: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        score(self.matching_chars(&a), a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from character multisets alone.
    pub fn quick_ratio(&self, a: &str) -> f64 {
        let mut available = self.b_counts.clone();
        let mut matches = 0;
        let mut a_len = 0;
        for ch in a.chars() {
            a_len += 1;
            if let Some(count) = available.get_mut(&ch) {
                if *count > 0 {
                    *count -= 1;
                    matches += 1;
                }
            }
        }
        score(matches, a_len + self.b.len())
    }

    /// Upper bound on [`quick_ratio`](Self::quick_ratio) from lengths alone.
    pub fn real_quick_ratio(&self, a_len: usize) -> f64 {
        score(a_len.min(self.b.len()), a_len + self.b.len())
    }

    /// Total size of the matching blocks between `a` and the fixed sequence.
    pub fn matching_chars(&self, a: &[char]) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges, as
    /// `(i, j, k)`. `k == 0` when there is none.
    pub fn find_longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);

        // j2len[j] = length of the match ending at a[i-1], b[j].
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(ch) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0) + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }

        // Grow across characters the popular-element heuristic left out of b2j.
        while best_i > alo && best_j > blo && a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}

/// Similarity of two strings; `b` is the sequence the matcher is built on.
pub fn ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(b).ratio(a)
}

fn score(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}
