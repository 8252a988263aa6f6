/// Stable handle of a member inside its `PreferenceTable` arena.
pub type MemberId = usize;

/// Ordered list of preferred members, most preferred first.
///
/// Lists only shrink while a solver runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceList {
    members: Vec<MemberId>,
}

impl PreferenceList {
    pub fn new(members: Vec<MemberId>) -> PreferenceList {
        PreferenceList { members }
    }

    #[inline]
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn contains(&self, member: MemberId) -> bool {
        self.members.contains(&member)
    }

    /// Rank of `member`; lower is more preferred.
    #[inline]
    pub fn position(&self, member: MemberId) -> Option<usize> {
        self.members.iter().position(|m| *m == member)
    }

    #[inline]
    pub fn first(&self) -> Option<MemberId> {
        self.members.first().copied()
    }

    #[inline]
    pub fn second(&self) -> Option<MemberId> {
        self.members.get(1).copied()
    }

    #[inline]
    pub fn last(&self) -> Option<MemberId> {
        self.members.last().copied()
    }

    /// Members ranked strictly below `member`, or an empty slice when it is not listed.
    pub fn ranked_below(&self, member: MemberId) -> &[MemberId] {
        match self.position(member) {
            Some(idx) => &self.members[idx + 1..],
            None => &[],
        }
    }

    /// Removes `member` keeping the relative order of the rest.
    /// Returns false if it was not listed.
    pub fn remove(&mut self, member: MemberId) -> bool {
        match self.position(member) {
            Some(idx) => {
                self.members.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    name: String,
    preference_list: PreferenceList,
    // who this member holds an accepted proposal from
    accepted_proposal_from: Option<MemberId>,
}

impl Member {
    pub fn new(name: &str) -> Member {
        Member {
            name: name.to_owned(),
            preference_list: PreferenceList::default(),
            accepted_proposal_from: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn preference_list(&self) -> &PreferenceList {
        &self.preference_list
    }

    pub(crate) fn preference_list_mut(&mut self) -> &mut PreferenceList {
        &mut self.preference_list
    }

    pub(crate) fn set_preference_list(&mut self, preference_list: PreferenceList) {
        self.preference_list = preference_list;
    }

    #[inline]
    pub fn first_preference(&self) -> Option<MemberId> {
        self.preference_list.first()
    }

    #[inline]
    pub fn second_preference(&self) -> Option<MemberId> {
        self.preference_list.second()
    }

    #[inline]
    pub fn last_preference(&self) -> Option<MemberId> {
        self.preference_list.last()
    }

    #[inline]
    pub fn current_proposer(&self) -> Option<MemberId> {
        self.accepted_proposal_from
    }

    #[inline]
    pub fn has_accepted_proposal(&self) -> bool {
        self.accepted_proposal_from.is_some()
    }

    pub(crate) fn set_current_proposer(&mut self, proposer: Option<MemberId>) {
        self.accepted_proposal_from = proposer;
    }

    /// Whether a proposal from `candidate` beats the one currently held.
    ///
    /// With no proposal held any candidate wins. A held proposer that has
    /// already dropped off the list loses to any listed candidate.
    pub fn would_prefer_proposal_from(&self, candidate: MemberId) -> bool {
        let current = match self.accepted_proposal_from {
            Some(current) => current,
            None => return true,
        };
        match (
            self.preference_list.position(candidate),
            self.preference_list.position(current),
        ) {
            (Some(idx_new), Some(idx_current)) => idx_new < idx_current,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
