use crate::error::MatchError;
use crate::member::MemberId;
use crate::solution::MatchResult;
use crate::table::PreferenceTable;
use crate::validate;
use tracing::trace;

pub trait StableMatchingSolver {
    /// Lower bound of the default cap on solver loop iterations.
    const MAX_ITERATIONS: u32 = 100_000;

    fn table(&self) -> &PreferenceTable;

    fn solve(&mut self) -> Result<MatchResult, MatchError>;

    #[inline]
    fn num_members(&self) -> usize {
        self.table().len()
    }

    /// Cap used when the caller passes none: `n * n + n` iterations for `n`
    /// members, which bounds every proposal and rotation of a solve, but never
    /// less than `MAX_ITERATIONS`.
    fn default_max_iterations(&self) -> u32 {
        let n = self.num_members() as u64;
        let scaled = n.saturating_mul(n).saturating_add(n);
        if scaled > u64::from(u32::MAX) {
            u32::MAX
        } else {
            (scaled as u32).max(Self::MAX_ITERATIONS)
        }
    }

    fn validate_input(&self) -> Result<(), MatchError> {
        validate::validate(self.table())
    }

    /// Fails with an internal error once `nits` has gone past `max_iterations`.
    fn check_iterations(&self, nits: u32, max_iterations: u32) -> Result<(), MatchError> {
        if nits > max_iterations {
            return Err(MatchError::Internal(format!(
                "solver did not converge after {} iterations",
                max_iterations
            )));
        }
        Ok(())
    }

    /// Debug-only check of the mutual rejection invariant after a solver phase.
    #[inline]
    fn debug_check_invariants(&self) {
        debug_assert!(
            self.table().rejections_are_mutual(),
            "rejections are not mutual:\n{}",
            self.table()
        );
    }
}

/// How the recipient of a proposal records acceptance and rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bookkeeping {
    /// Both sides record the match; used between the two marriage groups.
    Mutual,
    /// Only the recipient records whom it holds; roommates phase 1.
    OneSided,
}

/// Outcome of a single proposal, seen from the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Response {
    Accepted,
    /// accepted, replacing the previously held proposer
    Replaced(MemberId),
    Rejected,
}

/// `proposer` proposes to `recipient`, who keeps whichever proposal it ranks higher.
pub(crate) fn simulate_proposal(
    table: &mut PreferenceTable,
    proposer: MemberId,
    recipient: MemberId,
    bookkeeping: Bookkeeping,
) -> Response {
    trace!(
        "{} proposes to {}",
        table.name(proposer),
        table.name(recipient)
    );
    let current = table.member(recipient).current_proposer();
    let response = match current {
        None => Response::Accepted,
        Some(current) if table.member(recipient).would_prefer_proposal_from(proposer) => {
            Response::Replaced(current)
        }
        Some(_) => Response::Rejected,
    };

    match (response, bookkeeping) {
        (Response::Accepted, Bookkeeping::Mutual) => table.accept_mutually(recipient, proposer),
        (Response::Accepted, Bookkeeping::OneSided) => table.accept(recipient, proposer),
        (Response::Replaced(current), Bookkeeping::Mutual) => {
            table.reject_mutually(recipient, current);
            table.accept_mutually(recipient, proposer);
        }
        (Response::Replaced(current), Bookkeeping::OneSided) => {
            table.reject(recipient, current);
            table.accept(recipient, proposer);
        }
        (Response::Rejected, Bookkeeping::Mutual) => table.reject_mutually(recipient, proposer),
        (Response::Rejected, Bookkeeping::OneSided) => table.reject(recipient, proposer),
    }
    trace!("{} responds {:?}", table.name(recipient), response);
    response
}
