//! Character-level alignment between a learner's answer and the target.
//!
//! Matching blocks are found by recursively taking the longest common
//! contiguous run (Ratcliff/Obershelp), then turned into an edit script of
//! equal/insert/delete/replace opcodes.
//!
//! There is no "popular element" junk heuristic: characters that are
//! frequent in a long target (200+ characters) are still matched, so the
//! opcodes there can differ from matchers that discard them.

use std::collections::HashMap;
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One run of the edit script. `a` indexes the answer, `b` the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a: Range<usize>,
    pub b: Range<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    /// Present in both.
    Matched,
    /// Present in the target but missing from the answer.
    Missing,
    /// Present in the answer but not in the target.
    Extra,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffSpan {
    pub kind: SpanKind,
    pub text: String,
}

struct Matcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b_index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + std::hash::Hash> Matcher<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b_index: HashMap<&T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b_index.entry(item).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Longest run `a[i..i+k] == b[j..j+k]` inside the given windows.
    /// Ties go to the earliest `i`, then the earliest `j`.
    fn longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_len) = (a_lo, b_lo, 0);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            run_ending_at = next;
        }
        (best_i, best_j, best_len)
    }

    fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
            let (i, j, k) = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if k == 0 {
                continue;
            }
            blocks.push((i, j, k));
            if a_lo < i && b_lo < j {
                queue.push((a_lo, i, b_lo, j));
            }
            if i + k < a_hi && j + k < b_hi {
                queue.push((i + k, a_hi, j + k, b_hi));
            }
        }
        blocks.sort_unstable();

        // Merge blocks that touch end to end.
        let mut merged: Vec<(usize, usize, usize)> = Vec::with_capacity(blocks.len() + 1);
        for (i, j, k) in blocks {
            match merged.last_mut() {
                Some((pi, pj, pk)) if *pi + *pk == i && *pj + *pk == j => *pk += k,
                _ => merged.push((i, j, k)),
            }
        }
        merged.push((self.a.len(), self.b.len(), 0));
        merged
    }
}

/// Edit script turning `a` into `b`.
pub fn opcodes<T: Eq + std::hash::Hash>(a: &[T], b: &[T]) -> Vec<Opcode> {
    let matcher = Matcher::new(a, b);
    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    for (ai, bj, size) in matcher.matching_blocks() {
        let tag = match (i < ai, j < bj) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            ops.push(Opcode {
                tag,
                a: i..ai,
                b: j..bj,
            });
        }
        i = ai + size;
        j = bj + size;
        if size > 0 {
            ops.push(Opcode {
                tag: OpTag::Equal,
                a: ai..i,
                b: bj..j,
            });
        }
    }
    ops
}

/// Annotate `given` against `target`, comparing case-insensitively and
/// rendering each span in its original case.
pub fn annotate(given: &str, target: &str) -> Vec<DiffSpan> {
    let given_lower: Vec<char> = given.to_lowercase().chars().collect();
    let target_lower: Vec<char> = target.to_lowercase().chars().collect();
    let given_chars = display_chars(given, &given_lower);
    let target_chars = display_chars(target, &target_lower);

    let slice = |chars: &[char], range: &Range<usize>| chars[range.clone()].iter().collect::<String>();

    let mut spans = Vec::new();
    for op in opcodes(&given_lower, &target_lower) {
        match op.tag {
            OpTag::Equal => spans.push(DiffSpan {
                kind: SpanKind::Matched,
                text: slice(&target_chars, &op.b),
            }),
            OpTag::Insert => spans.push(DiffSpan {
                kind: SpanKind::Missing,
                text: slice(&target_chars, &op.b),
            }),
            OpTag::Delete => spans.push(DiffSpan {
                kind: SpanKind::Extra,
                text: slice(&given_chars, &op.a),
            }),
            OpTag::Replace => {
                spans.push(DiffSpan {
                    kind: SpanKind::Extra,
                    text: slice(&given_chars, &op.a),
                });
                spans.push(DiffSpan {
                    kind: SpanKind::Missing,
                    text: slice(&target_chars, &op.b),
                });
            }
        }
    }
    spans
}

/// Original-case characters when lowercasing kept the length, otherwise the
/// lowercase ones so indices stay aligned.
fn display_chars(original: &str, lowered: &[char]) -> Vec<char> {
    let chars: Vec<char> = original.chars().collect();
    if chars.len() == lowered.len() {
        chars
    } else {
        lowered.to_vec()
    }
}
