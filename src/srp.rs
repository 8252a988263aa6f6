use crate::error::MatchError;
use crate::member::MemberId;
use crate::solution::MatchResult;
use crate::solver::{simulate_proposal, Bookkeeping, Response, StableMatchingSolver};
use crate::table::{MatchEntry, PreferenceTable};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, trace, warn};

/// Solver for the stable roommates problem
/// Which pairs up members of one even-sized group with Irving's algorithm
///
/// Phase 1 lets the first unmatched member propose until everybody holds a
/// proposal. Phase 2 drops everyone a member ranks below the proposal it
/// holds. Phase 3 eliminates rotations until every list has one entry left.
/// An exhausted list at any point means no stable matching exists.
#[derive(Debug, Clone)]
pub struct IrvingSolver {
    table: PreferenceTable,
    max_iterations: u32,
    // first member to search a rotation from
    seed: Option<MemberId>,

    // pairs rejected by rotation elimination, in order
    eliminated: Vec<(MemberId, MemberId)>,

    pub nits: u32,
    pub nproposals: u32,
    pub nrotations: u32,
}

impl StableMatchingSolver for IrvingSolver {
    fn table(&self) -> &PreferenceTable {
        &self.table
    }

    #[inline]
    fn solve(&mut self) -> Result<MatchResult, MatchError> {
        self.solve_with_params(None, None)
    }
}

impl IrvingSolver {
    pub fn new(entries: &[MatchEntry]) -> IrvingSolver {
        Self::from_table(PreferenceTable::build(entries))
    }

    pub fn from_table(table: PreferenceTable) -> IrvingSolver {
        IrvingSolver {
            table,
            max_iterations: Self::MAX_ITERATIONS,
            seed: None,
            eliminated: Vec::new(),
            nits: 0,
            nproposals: 0,
            nrotations: 0,
        }
    }

    /// Pairs rejected while eliminating rotations, as `(rejecting, rejected)`.
    pub fn eliminated_pairs(&self) -> &[(MemberId, MemberId)] {
        &self.eliminated
    }

    /// Solves with an optional member to start the first rotation search from
    /// and an optional cap on solver iterations.
    pub fn solve_with_params(
        &mut self,
        seed: Option<&str>,
        max_iterations: Option<u32>,
    ) -> Result<MatchResult, MatchError> {
        self.validate_input()?;
        let default_max_iterations = self.default_max_iterations();
        self.max_iterations = max_iterations.unwrap_or(default_max_iterations);
        self.set_seed(seed);
        self.nits = 0;
        self.nproposals = 0;
        self.nrotations = 0;
        self.eliminated.clear();

        let result = self.run();
        match &result {
            Ok(result) => info!(
                "matched {} roommates: {} proposals, {} rotations",
                result.len(),
                self.nproposals,
                self.nrotations
            ),
            Err(err) => info!("no matching after {} iterations: {}", self.nits, err),
        }
        result
    }

    fn set_seed(&mut self, seed: Option<&str>) {
        self.seed = seed.and_then(|name| {
            let id = self.table.find(name);
            if id.is_none() {
                warn!("ignoring unknown seed member '{}'", name);
            }
            id
        });
    }

    fn run(&mut self) -> Result<MatchResult, MatchError> {
        self.propose()?;
        debug!("after proposals:\n{}", self.table);
        self.reject_less_preferred()?;
        debug!("after rejections:\n{}", self.table);
        self.eliminate_rotations()?;
        debug!("after rotations:\n{}", self.table);
        self.build_result()
    }

    /// Phase 1: the first unmatched member proposes to its top choice, one
    /// proposal at a time, until every member holds a proposal.
    ///
    /// A proposal only changes the lists and slots of the proposer, the
    /// recipient and a displaced proposer, so only those three are rechecked.
    pub(crate) fn propose(&mut self) -> Result<(), MatchError> {
        if !self.table.is_stable() {
            return Err(MatchError::NoStableSolution);
        }
        let mut unmatched: BTreeSet<MemberId> =
            self.table.unmatched_members(0).into_iter().collect();

        while let Some(proposer) = unmatched.iter().next().copied() {
            self.nits += 1;
            self.check_iterations(self.nits, self.max_iterations)?;

            // a stable table has no empty lists
            let recipient = self.table.member(proposer).first_preference().ok_or_else(|| {
                MatchError::Internal(format!(
                    "'{}' has exhausted its preference list",
                    self.table.name(proposer)
                ))
            })?;
            let response =
                simulate_proposal(&mut self.table, proposer, recipient, Bookkeeping::OneSided);
            self.nproposals += 1;

            let displaced = match response {
                Response::Replaced(previous) => Some(previous),
                Response::Accepted | Response::Rejected => None,
            };
            for id in [proposer, recipient].iter().copied().chain(displaced) {
                if self.table.member(id).preference_list().is_empty() {
                    return Err(MatchError::NoStableSolution);
                }
                if self.table.current_acceptor(id).is_some() {
                    unmatched.remove(&id);
                } else {
                    unmatched.insert(id);
                }
            }
        }
        self.debug_check_invariants();
        Ok(())
    }

    /// Phase 2: every member drops everyone it ranks below its current proposer.
    pub(crate) fn reject_less_preferred(&mut self) -> Result<(), MatchError> {
        for id in 0..self.table.len() {
            let proposer = self.table.member(id).current_proposer().ok_or_else(|| {
                MatchError::Internal(format!(
                    "'{}' holds no proposal after the proposal phase",
                    self.table.name(id)
                ))
            })?;
            let less_preferred = self
                .table
                .member(id)
                .preference_list()
                .ranked_below(proposer)
                .to_vec();
            for other in less_preferred {
                self.table.reject_mutually(id, other);
            }
        }
        self.debug_check_invariants();
        if !self.table.is_stable() {
            return Err(MatchError::NoStableSolution);
        }
        Ok(())
    }

    /// Phase 3: find and eliminate rotations until every member has exactly
    /// one preference left.
    pub(crate) fn eliminate_rotations(&mut self) -> Result<(), MatchError> {
        let mut round = 0;
        while !self.table.is_complete() {
            self.nits += 1;
            self.check_iterations(self.nits, self.max_iterations)?;

            let start = self.rotation_start(round)?;
            let rotation = self.find_rotation(start)?;
            trace!(
                "rotation from {}: {:?}",
                self.table.name(start),
                rotation
                    .iter()
                    .map(|(x, y)| (self.table.name(*x), self.table.name(*y)))
                    .collect::<Vec<_>>()
            );
            self.eliminate_rotation(&rotation);
            self.nrotations += 1;
            self.debug_check_invariants();

            if !self.table.is_stable() {
                return Err(MatchError::NoStableSolution);
            }
            round += 1;
        }
        Ok(())
    }

    /// The seed on the first round if it still has a choice to make, otherwise
    /// the first member with at least two preferences.
    fn rotation_start(&self, round: usize) -> Result<MemberId, MatchError> {
        let has_choice = |id: &MemberId| self.table.member(*id).preference_list().len() >= 2;
        if round == 0 {
            if let Some(seed) = self.seed.filter(has_choice) {
                return Ok(seed);
            }
        }
        (0..self.table.len()).find(has_choice).ok_or_else(|| {
            MatchError::Internal("no member left with two or more preferences".to_owned())
        })
    }

    /// Follows `x -> y = second(x) -> x' = last(y)` from `start` until some x
    /// repeats. Returns the `(x, y)` pairs of the cycle, each `y` being the
    /// second preference of the previous pair's x.
    pub(crate) fn find_rotation(
        &self,
        start: MemberId,
    ) -> Result<Vec<(MemberId, MemberId)>, MatchError> {
        let mut xs = vec![start];
        let mut ys = Vec::new();
        let mut seen_at: HashMap<MemberId, usize> = HashMap::new();
        seen_at.insert(start, 0);

        loop {
            let x = xs[xs.len() - 1];
            let y = self.table.member(x).second_preference().ok_or_else(|| {
                MatchError::Internal(format!(
                    "'{}' has no second preference while searching a rotation",
                    self.table.name(x)
                ))
            })?;
            let next_x = self.table.member(y).last_preference().ok_or_else(|| {
                MatchError::Internal(format!(
                    "'{}' has an empty preference list while searching a rotation",
                    self.table.name(y)
                ))
            })?;
            xs.push(next_x);
            ys.push(y);

            // ys[i - 1] was reached from xs[i - 1] and leads to xs[i]
            if let Some(&first) = seen_at.get(&next_x) {
                return Ok(xs[first + 1..]
                    .iter()
                    .copied()
                    .zip(ys[first..].iter().copied())
                    .collect());
            }
            seen_at.insert(next_x, xs.len() - 1);
        }
    }

    /// Every y keeps nobody below the x it now receives a proposal from, which
    /// drops its pair partner x (its last choice) along with anyone else
    /// ranked lower. All drops are collected before any is applied.
    pub(crate) fn eliminate_rotation(&mut self, rotation: &[(MemberId, MemberId)]) {
        let len = rotation.len();
        let mut drops: Vec<(MemberId, MemberId)> = Vec::new();
        for (i, &(x, y)) in rotation.iter().enumerate() {
            let previous_x = rotation[(i + len - 1) % len].0;
            let list = self.table.member(y).preference_list();
            let below = match list.position(previous_x) {
                Some(idx) => list.members()[idx + 1..].to_vec(),
                None => vec![x],
            };
            for other in below {
                if !drops.contains(&(y, other)) && !drops.contains(&(other, y)) {
                    drops.push((y, other));
                }
            }
        }
        for (y, other) in drops {
            self.table.reject_mutually(y, other);
            self.eliminated.push((y, other));
        }
    }

    fn build_result(&self) -> Result<MatchResult, MatchError> {
        let mut result = MatchResult::new();
        for member in self.table.members() {
            let list = member.preference_list();
            let partner = match (list.len(), list.first()) {
                (1, Some(partner)) => partner,
                _ => {
                    return Err(MatchError::Internal(format!(
                        "'{}' does not have exactly one preference left",
                        member.name()
                    )))
                }
            };
            result
                .mapping
                .insert(member.name().to_owned(), self.table.name(partner).to_owned());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::IrvingSolver;
    use crate::error::MatchError;
    use crate::solution::MatchResult;
    use crate::solver::StableMatchingSolver;
    use crate::table::{MatchEntry, PreferenceTable};
    use crate::testing::{
        entries, has_blocking_pair, init, master_list_entries, member_names, random_entries,
        seeded_rng, stable_pairing_exists,
    };

    const STABLE: &[(&str, &[&str])] = &[
        ("A", &["B", "D", "F", "C", "E"]),
        ("B", &["D", "E", "F", "A", "C"]),
        ("C", &["D", "E", "F", "A", "B"]),
        ("D", &["F", "C", "A", "E", "B"]),
        ("E", &["F", "C", "D", "B", "A"]),
        ("F", &["A", "B", "D", "C", "E"]),
    ];

    const UNSTABLE: &[(&str, &[&str])] = &[
        ("A", &["B", "E", "C", "F", "D"]),
        ("B", &["C", "F", "E", "A", "D"]),
        ("C", &["E", "A", "F", "D", "B"]),
        ("D", &["B", "A", "C", "F", "E"]),
        ("E", &["A", "C", "D", "B", "F"]),
        ("F", &["C", "A", "E", "B", "D"]),
    ];

    // table after phases 1 and 2 for STABLE
    const REDUCED: &[(&str, &[&str])] = &[
        ("A", &["B", "F"]),
        ("B", &["E", "F", "A"]),
        ("C", &["D", "E"]),
        ("D", &["F", "C"]),
        ("E", &["C", "B"]),
        ("F", &["A", "B", "D"]),
    ];

    fn assert_mapping(result: &MatchResult, pairs: &[(&str, &str)]) {
        assert_eq!(result.len(), pairs.len() * 2);
        for (a, b) in pairs {
            assert_eq!(result.partner_of(a), Some(*b));
            assert_eq!(result.partner_of(b), Some(*a));
        }
    }

    fn preference_names(table: &PreferenceTable) -> Vec<(String, String)> {
        table
            .members()
            .iter()
            .map(|m| {
                let prefs = m
                    .preference_list()
                    .members()
                    .iter()
                    .map(|id| table.name(*id))
                    .collect::<Vec<_>>()
                    .join("");
                (m.name().to_owned(), prefs)
            })
            .collect()
    }

    fn expected(rows: &[(&str, &str)]) -> Vec<(String, String)> {
        rows.iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_solve() {
        init();
        let mut solver = IrvingSolver::new(&entries(STABLE));
        let result = solver.solve().unwrap();
        assert_mapping(&result, &[("A", "F"), ("B", "E"), ("C", "D")]);
        assert_eq!(solver.nrotations, 1);
    }

    #[test]
    fn test_solve_four_members() {
        let mut solver = IrvingSolver::new(&entries(&[
            ("A", &["B", "C", "D"]),
            ("B", &["A", "C", "D"]),
            ("C", &["A", "B", "D"]),
            ("D", &["A", "B", "C"]),
        ]));
        assert_mapping(&solver.solve().unwrap(), &[("A", "B"), ("C", "D")]);
    }

    #[test]
    fn test_no_stable_solution() {
        init();
        let mut solver = IrvingSolver::new(&entries(UNSTABLE));
        let err = solver.solve().unwrap_err();
        assert_eq!(err, MatchError::NoStableSolution);
        assert_eq!(err.to_string(), "No stable solution exists");
        assert!(!err.is_structural());
    }

    #[test]
    fn test_no_stable_solution_in_proposal_phase() {
        // everybody ranks D last and the others form a preference cycle
        let mut solver = IrvingSolver::new(&entries(&[
            ("A", &["B", "C", "D"]),
            ("B", &["C", "A", "D"]),
            ("C", &["A", "B", "D"]),
            ("D", &["A", "B", "C"]),
        ]));
        assert_eq!(solver.solve(), Err(MatchError::NoStableSolution));
    }

    #[test]
    fn test_duplicate_member_fails_before_solving() {
        let mut rows = STABLE.to_vec();
        rows[5] = ("A", &["A", "B", "D", "C", "E"]);
        let mut solver = IrvingSolver::new(&entries(&rows));
        let before = solver.table().to_string();
        assert_eq!(
            solver.solve(),
            Err(MatchError::DuplicateMember("A".to_owned()))
        );
        assert_eq!(solver.table().to_string(), before);
        assert_eq!(solver.nproposals, 0);
    }

    #[test]
    fn test_proposal_phase() {
        init();
        let mut solver = IrvingSolver::new(&entries(STABLE));
        solver.propose().unwrap();
        assert_eq!(
            preference_names(solver.table()),
            expected(&[
                ("A", "BDFCE"),
                ("B", "EFAC"),
                ("C", "DEFAB"),
                ("D", "FCAE"),
                ("E", "CDBA"),
                ("F", "ABDC"),
            ])
        );
        let table = solver.table();
        let proposer_of = |name: &str| {
            let id = table.find(name).unwrap();
            table.name(table.member(id).current_proposer().unwrap()).to_owned()
        };
        assert_eq!(proposer_of("A"), "F");
        assert_eq!(proposer_of("B"), "A");
        assert_eq!(proposer_of("C"), "E");
        assert_eq!(proposer_of("D"), "C");
        assert_eq!(proposer_of("E"), "B");
        assert_eq!(proposer_of("F"), "D");
        assert_eq!(solver.nproposals, 8);
    }

    #[test]
    fn test_rejection_phase() {
        let mut table = PreferenceTable::build(&entries(&[
            ("A", &["B", "D", "F", "C", "E"]),
            ("B", &["E", "F", "A", "C"]),
            ("C", &["D", "E", "F", "A", "B"]),
            ("D", &["F", "C", "A", "E"]),
            ("E", &["C", "D", "B", "A"]),
            ("F", &["A", "B", "D", "C"]),
        ]));
        for (member, proposer) in [(0, 5), (1, 0), (2, 4), (3, 2), (4, 1), (5, 3)].iter() {
            table.accept(*member, *proposer);
        }
        let mut solver = IrvingSolver::from_table(table);
        solver.reject_less_preferred().unwrap();
        assert_eq!(
            preference_names(solver.table()),
            expected(&[
                ("A", "BF"),
                ("B", "EFA"),
                ("C", "DE"),
                ("D", "FC"),
                ("E", "CB"),
                ("F", "ABD"),
            ])
        );
        assert!(solver.table().rejections_are_mutual());
    }

    #[test]
    fn test_find_rotation() {
        let solver = IrvingSolver::from_table(PreferenceTable::build(&entries(REDUCED)));
        let table = solver.table();
        let rotation = solver.find_rotation(table.find("A").unwrap()).unwrap();
        let names = rotation
            .iter()
            .map(|(x, y)| (table.name(*x), table.name(*y)))
            .collect::<Vec<_>>();
        assert_eq!(names, [("D", "F"), ("E", "C"), ("A", "B")]);
    }

    #[test]
    fn test_find_rotation_not_through_start() {
        // B -> second C -> last A, A -> second C -> last A closes on A
        let solver = IrvingSolver::from_table(PreferenceTable::build(&entries(&[
            ("A", &["B", "C"]),
            ("B", &["D", "C"]),
            ("C", &["B", "A"]),
            ("D", &["B"]),
        ])));
        let rotation = solver.find_rotation(1).unwrap();
        assert_eq!(rotation, [(0, 2)]);
    }

    #[test]
    fn test_rotation_elimination_with_any_seed() {
        init();
        for seed in ["A", "B", "C", "D", "E", "F"].iter() {
            let mut solver = IrvingSolver::from_table(PreferenceTable::build(&entries(REDUCED)));
            solver.set_seed(Some(seed));
            solver.eliminate_rotations().unwrap();
            assert_mapping(
                &solver.build_result().unwrap(),
                &[("A", "F"), ("B", "E"), ("C", "D")],
            );
        }
    }

    #[test]
    fn test_rotation_elimination_is_deterministic() {
        let run = |seed: Option<&str>| {
            let mut solver = IrvingSolver::from_table(PreferenceTable::build(&entries(REDUCED)));
            solver.set_seed(seed);
            solver.eliminate_rotations().unwrap();
            solver.eliminated_pairs().to_vec()
        };
        let from_a = run(Some("A"));
        assert_eq!(from_a, run(Some("A")));
        // F drops B and D, C drops E, B drops A
        assert_eq!(from_a, [(5, 1), (5, 3), (2, 4), (1, 0)]);
        assert_eq!(run(None), from_a);
    }

    #[test]
    fn test_unknown_seed_is_ignored() {
        let mut solver = IrvingSolver::new(&entries(STABLE));
        let result = solver.solve_with_params(Some("Z"), None).unwrap();
        assert_mapping(&result, &[("A", "F"), ("B", "E"), ("C", "D")]);
    }

    #[test]
    fn test_iteration_cap() {
        let mut solver = IrvingSolver::new(&entries(STABLE));
        match solver.solve_with_params(None, Some(3)) {
            Err(MatchError::Internal(msg)) => assert!(msg.contains("did not converge")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_random_instances_either_match_stably_or_fail() {
        init();
        let mut rng = seeded_rng(42);
        let mut solved = 0;
        let mut unsolvable = 0;
        for round in 0..200 {
            let size = 2 * (1 + round % 6);
            let names = member_names("m", size);
            let rows = random_entries(&mut rng, &names, &names);
            let mut solver = IrvingSolver::new(&rows);
            match solver.solve() {
                Ok(result) => {
                    assert_eq!(result.len(), size);
                    for (a, b) in result.mapping.iter() {
                        assert_ne!(a, b);
                        assert_eq!(result.partner_of(b), Some(a.as_str()));
                    }
                    let all: Vec<&MatchEntry> = rows.iter().collect();
                    assert!(!has_blocking_pair(&all, &result.mapping));
                    solved += 1;
                }
                Err(MatchError::NoStableSolution) => {
                    // exhaustive search is cheap up to 8 members
                    if size <= 8 {
                        assert!(!stable_pairing_exists(&rows), "missed a stable pairing");
                    }
                    unsolvable += 1
                }
                Err(err) => panic!("unexpected error {}", err),
            }
        }
        assert!(solved > 0);
        assert!(unsolvable > 0);
    }

    #[test]
    fn test_no_stable_solution_only_when_none_exists() {
        let mut rng = seeded_rng(11);
        for round in 0..300 {
            let size = 2 * (2 + round % 3);
            let names = member_names("m", size);
            let rows = random_entries(&mut rng, &names, &names);
            let solved = IrvingSolver::new(&rows).solve();
            assert_eq!(
                solved.is_ok(),
                stable_pairing_exists(&rows),
                "size {} round {}: {:?}",
                size,
                round,
                solved
            );
        }
    }

    #[test]
    fn test_default_iteration_cap_scales_with_size() {
        let small = IrvingSolver::new(&entries(STABLE));
        assert_eq!(small.default_max_iterations(), IrvingSolver::MAX_ITERATIONS);
        let large = IrvingSolver::new(&master_list_entries(&member_names("m", 500)));
        assert_eq!(large.default_max_iterations(), 250_500);
    }

    #[test]
    fn test_large_master_list() {
        // everybody ranks the others in the same order, so m0-m1, m2-m3, ...
        let names = member_names("m", 500);
        let mut solver = IrvingSolver::new(&master_list_entries(&names));
        let result = tracing::subscriber::with_default(
            tracing::subscriber::NoSubscriber::default(),
            || solver.solve(),
        )
        .unwrap();
        assert!(solver.nproposals > IrvingSolver::MAX_ITERATIONS);
        assert_eq!(result.len(), names.len());
        for pair in names.chunks(2) {
            assert_eq!(result.partner_of(&pair[0]), Some(pair[1].as_str()));
        }
    }
}
