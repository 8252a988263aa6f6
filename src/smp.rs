use crate::error::MatchError;
use crate::solution::MatchResult;
use crate::solver::{simulate_proposal, Bookkeeping, StableMatchingSolver};
use crate::table::{MatchEntry, PreferenceTable};
use tracing::{debug, info};

/// Solver for the stable marriage problem
/// Which matches two equally sized groups with the Gale-Shapley algorithm,
/// members of the first group proposing to members of the second
///
/// Proposers act in insertion order, so the returned matching is the one
/// optimal for the first group.
#[derive(Debug, Clone)]
pub struct GaleShapleySolver {
    table: PreferenceTable,
    max_iterations: u32,

    pub nits: u32,
    pub nproposals: u32,
}

impl StableMatchingSolver for GaleShapleySolver {
    fn table(&self) -> &PreferenceTable {
        &self.table
    }

    #[inline]
    fn solve(&mut self) -> Result<MatchResult, MatchError> {
        self.solve_with_params(None)
    }
}

impl GaleShapleySolver {
    pub fn new(group_a: &[MatchEntry], group_b: &[MatchEntry]) -> GaleShapleySolver {
        Self::from_table(PreferenceTable::build_pair(group_a, group_b))
    }

    pub fn from_table(table: PreferenceTable) -> GaleShapleySolver {
        GaleShapleySolver {
            table,
            max_iterations: Self::MAX_ITERATIONS,
            nits: 0,
            nproposals: 0,
        }
    }

    pub fn solve_with_params(
        &mut self,
        max_iterations: Option<u32>,
    ) -> Result<MatchResult, MatchError> {
        self.validate_input()?;
        let default_max_iterations = self.default_max_iterations();
        self.max_iterations = max_iterations.unwrap_or(default_max_iterations);
        self.nits = 0;
        self.nproposals = 0;

        loop {
            let unmatched = self.table.unmatched_members(0);
            if unmatched.is_empty() {
                break;
            }
            self.nits += 1;
            self.check_iterations(self.nits, self.max_iterations)?;
            debug!("round {}: {} unmatched proposers", self.nits, unmatched.len());

            for proposer in unmatched {
                let recipient = self.table.member(proposer).first_preference().ok_or_else(|| {
                    MatchError::Internal(format!(
                        "'{}' has exhausted its preference list",
                        self.table.name(proposer)
                    ))
                })?;
                simulate_proposal(&mut self.table, proposer, recipient, Bookkeeping::Mutual);
                self.nproposals += 1;
            }
            self.debug_check_invariants();
        }

        let result = self.build_result()?;
        info!(
            "matched {} members in {} rounds, {} proposals",
            result.len(),
            self.nits,
            self.nproposals
        );
        Ok(result)
    }

    fn build_result(&self) -> Result<MatchResult, MatchError> {
        let mut result = MatchResult::new();
        for member in self.table.members() {
            let partner = member.current_proposer().ok_or_else(|| {
                MatchError::Internal(format!("'{}' was left without a partner", member.name()))
            })?;
            result
                .mapping
                .insert(member.name().to_owned(), self.table.name(partner).to_owned());
        }
        Ok(result)
    }
}
