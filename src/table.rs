use crate::member::{Member, MemberId, PreferenceList};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use tracing::trace;

/// Raw input record: a member name and its ranking of the other side, most
/// preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub name: String,
    pub preferences: Vec<String>,
}

impl MatchEntry {
    pub fn new(name: &str, preferences: &[&str]) -> MatchEntry {
        MatchEntry {
            name: name.to_owned(),
            preferences: preferences.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

/// Arena of members and their current preference lists.
///
/// A table holds one group (roommates) or two groups (marriage). Members of a
/// single group rank each other; members of a pair rank the opposite group.
#[derive(Debug, Clone)]
pub struct PreferenceTable {
    members: Vec<Member>,
    groups: Vec<Range<MemberId>>,
    // preference names that did not resolve to a member, by declaring member
    unresolved: Vec<(MemberId, String)>,
}

impl PreferenceTable {
    /// Builds a single-group table.
    pub fn build(entries: &[MatchEntry]) -> PreferenceTable {
        Self::build_groups(&[entries])
    }

    /// Builds a two-group table whose preferences cross-reference the other group.
    pub fn build_pair(entries_a: &[MatchEntry], entries_b: &[MatchEntry]) -> PreferenceTable {
        Self::build_groups(&[entries_a, entries_b])
    }

    pub(crate) fn build_groups(groups_entries: &[&[MatchEntry]]) -> PreferenceTable {
        let capacity = groups_entries.iter().map(|e| e.len()).sum();
        let mut table = PreferenceTable {
            members: Vec::with_capacity(capacity),
            groups: Vec::with_capacity(groups_entries.len()),
            unresolved: Vec::new(),
        };

        // first pass: instantiate every member and index names per group
        let mut lookups: Vec<HashMap<&str, MemberId>> = Vec::with_capacity(groups_entries.len());
        for entries in groups_entries.iter().copied() {
            let start = table.members.len();
            let mut lookup = HashMap::with_capacity(entries.len());
            for entry in entries.iter() {
                lookup.insert(entry.name.as_str(), table.members.len());
                table.members.push(Member::new(&entry.name));
            }
            table.groups.push(start..table.members.len());
            lookups.push(lookup);
        }

        // second pass: resolve preference names against the counterpart group
        for (group, entries) in groups_entries.iter().copied().enumerate() {
            let lookup = &lookups[table.counterpart_group(group)];
            let start = table.groups[group].start;
            for (offset, entry) in entries.iter().enumerate() {
                let id = start + offset;
                let mut resolved = Vec::with_capacity(entry.preferences.len());
                for name in entry.preferences.iter() {
                    match lookup.get(name.as_str()) {
                        Some(pref) => resolved.push(*pref),
                        None => table.unresolved.push((id, name.clone())),
                    }
                }
                table.members[id].set_preference_list(PreferenceList::new(resolved));
            }
        }
        table
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
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Member ids of one group, in insertion order.
    #[inline]
    pub fn group(&self, group: usize) -> Range<MemberId> {
        self.groups[group].clone()
    }

    pub fn group_of(&self, id: MemberId) -> usize {
        self.groups
            .iter()
            .position(|range| range.contains(&id))
            .unwrap_or(0)
    }

    /// The group whose members `group` ranks.
    #[inline]
    pub fn counterpart_group(&self, group: usize) -> usize {
        if self.groups.len() == 2 {
            1 - group
        } else {
            group
        }
    }

    /// Every member `id` is expected to rank exactly once.
    pub fn counterparts(&self, id: MemberId) -> impl Iterator<Item = MemberId> {
        self.group(self.counterpart_group(self.group_of(id)))
            .filter(move |other| *other != id)
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[inline]
    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id]
    }

    #[inline]
    pub fn name(&self, id: MemberId) -> &str {
        self.members[id].name()
    }

    /// Id of the last member declared under `name`.
    pub fn find(&self, name: &str) -> Option<MemberId> {
        self.members.iter().rposition(|m| m.name() == name)
    }

    /// Preference names that did not resolve to a member of the counterpart group.
    #[inline]
    pub fn unresolved(&self) -> &[(MemberId, String)] {
        &self.unresolved
    }

    /// The member that has accepted a proposal from `id`, found by scanning
    /// `id`'s own list for a slot pointing back at it.
    pub fn current_acceptor(&self, id: MemberId) -> Option<MemberId> {
        self.members[id]
            .preference_list()
            .members()
            .iter()
            .copied()
            .find(|them| self.members[*them].current_proposer() == Some(id))
    }

    #[inline]
    pub fn accept(&mut self, id: MemberId, proposer: MemberId) {
        self.members[id].set_current_proposer(Some(proposer));
    }

    pub fn accept_mutually(&mut self, id: MemberId, other: MemberId) {
        self.accept(id, other);
        self.accept(other, id);
    }

    /// Removes `id` and `other` from each other's lists and clears `id`'s
    /// accepted proposal if it came from `other`. `other`'s slot is untouched.
    pub fn reject(&mut self, id: MemberId, other: MemberId) {
        trace!("{} rejects {}", self.name(id), self.name(other));
        if self.members[id].current_proposer() == Some(other) {
            self.members[id].set_current_proposer(None);
        }
        self.members[id].preference_list_mut().remove(other);
        self.members[other].preference_list_mut().remove(id);
    }

    pub fn reject_mutually(&mut self, id: MemberId, other: MemberId) {
        self.reject(id, other);
        self.reject(other, id);
    }

    /// Members of `group` that nobody holds an accepted proposal from.
    pub fn unmatched_members(&self, group: usize) -> Vec<MemberId> {
        self.group(group)
            .filter(|id| self.current_acceptor(*id).is_none())
            .collect()
    }

    /// True while no preference list has been exhausted.
    pub fn is_stable(&self) -> bool {
        self.members.iter().all(|m| !m.preference_list().is_empty())
    }

    /// True when every member has exactly one preference left.
    pub fn is_complete(&self) -> bool {
        self.members.iter().all(|m| m.preference_list().len() == 1)
    }

    /// True if for every pair of counterparts either both list each other or neither does.
    pub fn rejections_are_mutual(&self) -> bool {
        let n = self.members.len();
        // listed[a * n + b]: a still lists b
        let mut listed = vec![false; n * n];
        for (a, member) in self.members.iter().enumerate() {
            for b in member.preference_list().members() {
                listed[a * n + *b] = true;
            }
        }
        (0..n).all(|a| {
            self.counterparts(a)
                .all(|b| listed[a * n + b] == listed[b * n + a])
        })
    }
}

impl fmt::Display for PreferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for member in self.members.iter() {
            let preferences = member
                .preference_list()
                .members()
                .iter()
                .map(|id| {
                    if member.current_proposer() == Some(*id) {
                        format!("'{}'+", self.name(*id))
                    } else {
                        format!("'{}'", self.name(*id))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "'{}'\t=>\t{}", member.name(), preferences)?;
        }
        Ok(())
    }
}
