//! String similarity primitives
//!
//! All ratio functions return a similarity score in range [0.0, 1.0] where 1.0 means identical.

use ahash::AHashSet;

/// Jaccard index of the whitespace-delimited token sets.
///
/// Two token-less strings are considered identical (1.0).
pub fn jaccard_tokens(a: &str, b: &str) -> f64 {
    let tokens_a: AHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: AHashSet<&str> = b.split_whitespace().collect();
    jaccard_sets(&tokens_a, &tokens_b)
}

/// Jaccard index of two prebuilt token sets, 1.0 when both are empty
pub fn jaccard_sets(a: &AHashSet<&str>, b: &AHashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union.max(1) as f64
}

/// Length of the longest common subsequence of two char slices
pub fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Insertion/deletion edit distance (no substitutions) between two strings
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

/// `1 - distance / total_len`, 1.0 when both lengths are zero
#[inline]
fn normalized_similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        1.0
    } else {
        1.0 - distance as f64 / total_len as f64
    }
}

/// Token-set fuzzy ratio.
///
/// Tokens shared by both strings form a common prefix; the leftover tokens of
/// each side are sorted and compared with the indel ratio. The best of
/// `diff_a <-> diff_b`, `common <-> common + diff_a` and `common <-> common + diff_b`
/// is returned. Word order and repeated tokens do not matter, and a string
/// whose tokens are a subset of the other's scores 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: AHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: AHashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let mut common: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let mut diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let mut diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !common.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    common.sort_unstable();
    diff_ab.sort_unstable();
    diff_ba.sort_unstable();
    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");

    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let common_len = common.join(" ").chars().count();
    let separator = usize::from(common_len != 0);
    let common_ab_len = common_len + separator + ab_len;
    let common_ba_len = common_len + separator + ba_len;

    let diff_ratio = normalized_similarity(
        indel_distance(&diff_ab_joined, &diff_ba_joined),
        common_ab_len + common_ba_len,
    );
    if common_len == 0 {
        return diff_ratio;
    }

    // common vs common + leftovers: only the leftover part differs
    let common_ab_ratio = normalized_similarity(separator + ab_len, common_len + common_ab_len);
    let common_ba_ratio = normalized_similarity(separator + ba_len, common_len + common_ba_len);

    diff_ratio.max(common_ab_ratio).max(common_ba_ratio)
}

/// Longest common block `a[i..i+k] == b[j..j+k]` inside the given ranges.
///
/// Among equally long blocks the one starting earliest in `a`, then earliest in
/// `b`, wins.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run[j + 1] = length of the matching run ending at (i, j)
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            } else {
                cur[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    (best_i, best_j, best_k)
}

/// Total number of characters in the Ratcliff/Obershelp matching blocks
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![((0, a.len()), (0, b.len()))];
    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            pending.push(((i + k, ahi), (j + k, bhi)));
        }
    }
    total
}

/// Ratcliff/Obershelp sequence ratio `2 * M / T` over raw characters.
///
/// `M` counts characters in the recursively found longest common blocks,
/// `T` is the combined length. Two empty strings score 1.0.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}
