// 🔤 Name similarity - Ratcliff/Obershelp matching-blocks ratio
//
// ratio = 2 * M / T
//   M = characters covered by the matching blocks
//   T = total characters in both strings
//
// Matching blocks: take the longest common substring, then recurse on the
// pieces to its left and right. 1.0 means identical, 0.0 nothing in common.

use std::collections::HashMap;

/// Similarity of two names on a 0.0 - 1.0 scale.
///
/// Example:
/// ```
/// use fund_metadata_etl::similarity::ratio;
///
/// assert_eq!(ratio("abcd", "abcd"), 1.0);
/// assert!(ratio("ABC Groth Fund", "ABC Growth Fund") > 0.9);
/// ```
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Cheap upper bound on [`ratio`] from lengths alone
pub fn length_bound(a_len: usize, b_len: usize) -> f64 {
    let total = a_len + b_len;
    if total == 0 {
        return 1.0;
    }
    2.0 * a_len.min(b_len) as f64 / total as f64
}

/// Upper bound on [`ratio`] from shared characters, ignoring order
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let mut counts: HashMap<char, isize> = HashMap::new();
    for c in b.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let mut shared = 0;
    let mut a_len = 0;
    for c in a.chars() {
        a_len += 1;
        if let Some(n) = counts.get_mut(&c) {
            if *n > 0 {
                shared += 1;
            }
            *n -= 1;
        }
    }

    let total = a_len + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    2.0 * shared as f64 / total as f64
}

/// Sum of the matching block lengths
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;

        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common run inside a[alo..ahi] and b[blo..bhi].
///
/// Returns (i, j, k) with a[i..i+k] == b[j..j+k]. Among equally long runs the
/// one starting earliest in `a` wins, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);

    // prev[x + 1] = length of the run ending at a[i - 1], b[blo + x]
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let x = j - blo;
            if a[i] == b[j] {
                let k = prev[x] + 1;
                cur[x + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            } else {
                cur[x + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
