//! Execution order of compiled fields.
//!
//! Two passes, both stable: fields reading another field at the same array
//! depth go after it, then deeper array fields go before shallower ones.
//! Dependency cycles never fail; the first remaining field in input order
//! is placed and the pass moves on.

use crate::rules::Field;
use std::cmp::Reverse;

/// Order fields for execution.
pub fn order(fields: Vec<Field>) -> Vec<Field> {
    let n = fields.len();

    // For each field, indices of same-depth fields it must follow
    let after: Vec<Vec<usize>> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let depth = field.array_depth();
            fields
                .iter()
                .enumerate()
                .filter(|&(j, other)| {
                    j != i
                        && other.array_depth() == depth
                        && field.dependency_paths().any(|p| p == other.path_str())
                })
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut placed = vec![false; n];
    let mut sequence = Vec::with_capacity(n);
    while sequence.len() < n {
        let ready = (0..n).find(|&i| !placed[i] && after[i].iter().all(|&j| placed[j]));
        let Some(next) = ready.or_else(|| (0..n).find(|&i| !placed[i])) else {
            break;
        };
        if ready.is_none() {
            tracing::trace!(path = %fields[next].path_str(), "dependency cycle, keeping input order");
        }
        placed[next] = true;
        sequence.push(next);
    }

    let mut slots: Vec<Option<Field>> = fields.into_iter().map(Some).collect();
    let mut ordered: Vec<Field> = sequence
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect();

    ordered.sort_by_key(|field| Reverse(field.array_depth()));
    ordered
}
