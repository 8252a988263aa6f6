//! Solvers for the stable marriage and stable roommates problems.
//!
//! ```
//! use stable_matching::{solve_srp, MatchEntry};
//!
//! let entries = vec![
//!     MatchEntry::new("A", &["B", "C", "D"]),
//!     MatchEntry::new("B", &["A", "C", "D"]),
//!     MatchEntry::new("C", &["A", "B", "D"]),
//!     MatchEntry::new("D", &["A", "B", "C"]),
//! ];
//! let result = solve_srp(&entries).unwrap();
//! assert_eq!(result.partner_of("A"), Some("B"));
//! assert_eq!(result.to_csv(), "A,B\nB,A\nC,D\nD,C\n");
//! ```
pub mod error;
pub mod load;
pub mod member;
pub mod smp;
pub mod solution;
pub mod solver;
pub mod srp;
pub mod table;
pub mod validate;

#[cfg(test)]
mod testing;

pub use error::MatchError;
pub use smp::GaleShapleySolver;
pub use solution::{MatchResult, OutputFormat};
pub use solver::StableMatchingSolver;
pub use srp::IrvingSolver;
pub use table::{MatchEntry, PreferenceTable};

/// Stable marriage: matches every member of `group_a` with one of `group_b`,
/// optimal for `group_a`.
pub fn solve_smp(
    group_a: &[MatchEntry],
    group_b: &[MatchEntry],
) -> Result<MatchResult, MatchError> {
    GaleShapleySolver::new(group_a, group_b).solve()
}

/// Stable roommates: pairs up the members of `entries`, or reports that no
/// stable pairing exists.
pub fn solve_srp(entries: &[MatchEntry]) -> Result<MatchResult, MatchError> {
    IrvingSolver::new(entries).solve()
}
