// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered fold over a parent-indexed link table.
//!
//! Links are visited `0..N-1`. Because parents always precede children, the
//! value a visitor returns for link `i` is ready before any child of `i` is
//! visited. The same fold serves two purposes:
//!
//! * [`ScanMode::Structural`]: each visitor sees its parent's result, e.g.
//!   the parent's global transform during forward kinematics.
//! * [`ScanMode::Sequential`]: each visitor sees the previous link's result
//!   regardless of tree shape, e.g. a random key carried left to right.

use thiserror::Error;

/// Which earlier result a visitor receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Parent's result; roots receive the sentinel.
    Structural,
    /// Result of link `i - 1`; link 0 receives the sentinel.
    Sequential,
}

/// Fold failures detected before or during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A per-link array did not have one entry per link.
    #[error("per-link array has {found} entries, system has {links} links")]
    LengthMismatch {
        /// Number of links.
        links: usize,
        /// Entries supplied.
        found: usize,
    },
    /// A parent index did not precede its child.
    #[error("link {link} has parent {parent}; parents must precede children")]
    ParentOrder {
        /// Child index.
        link: usize,
        /// Parent index.
        parent: usize,
    },
}

/// Visits every link in index order, threading results along `mode`.
///
/// `extras` carries one caller-supplied static value per link (zip several
/// arrays into a tuple slice to pass more than one). The visitor gets
/// `(index, carried, extra)` and returns the link's result. Shape problems are
/// reported before the first visit; visitor errors stop the fold.
pub fn tree<R, X, E, F>(
    parents: &[Option<usize>],
    mode: ScanMode,
    sentinel: &R,
    extras: &[X],
    mut visit: F,
) -> Result<Vec<R>, E>
where
    E: From<ScanError>,
    F: FnMut(usize, &R, &X) -> Result<R, E>,
{
    if extras.len() != parents.len() {
        return Err(ScanError::LengthMismatch {
            links: parents.len(),
            found: extras.len(),
        }
        .into());
    }
    for (link, parent) in parents.iter().enumerate() {
        if let Some(p) = *parent {
            if p >= link {
                return Err(ScanError::ParentOrder { link, parent: p }.into());
            }
        }
    }

    let mut results: Vec<R> = Vec::with_capacity(parents.len());
    for (i, extra) in extras.iter().enumerate() {
        let carried_idx = match mode {
            ScanMode::Structural => parents[i],
            ScanMode::Sequential => i.checked_sub(1),
        };
        let carried = carried_idx.map_or(sentinel, |j| &results[j]);
        let out = visit(i, carried, extra)?;
        results.push(out);
    }
    Ok(results)
}
