use crate::error::MatchError;
use crate::member::MemberId;
use crate::table::PreferenceTable;
use std::collections::HashSet;
use tracing::debug;

/// Structural checks that gate every solve. Never mutates the table.
///
/// A single-group table must be non-empty, of even size, with unique
/// non-blank names and every member ranking all the others exactly once.
/// A two-group table must have disjoint groups of equal non-zero size, and
/// every member must rank the whole opposite group exactly once.
///
/// # Panics
///
/// Panics on tables with other than one or two groups, which no constructor
/// produces.
pub fn validate(table: &PreferenceTable) -> Result<(), MatchError> {
    match table.num_groups() {
        1 => validate_single(table),
        2 => validate_pair(table),
        n => panic!("expected exactly 1 or 2 preference tables, found {}", n),
    }
}

fn validate_single(table: &PreferenceTable) -> Result<(), MatchError> {
    validate_uniqueness(table, 0)?;
    let size = table.group(0).len();
    if size == 0 {
        return Err(MatchError::EmptyTable);
    }
    if size % 2 != 0 {
        return Err(MatchError::OddMemberCount(size));
    }
    validate_names(table)?;
    validate_symmetry(table)?;
    debug!("validated roommates table of {} members", size);
    Ok(())
}

fn validate_pair(table: &PreferenceTable) -> Result<(), MatchError> {
    validate_uniqueness(table, 0)?;
    validate_uniqueness(table, 1)?;
    validate_disjoint(table)?;
    let (size_a, size_b) = (table.group(0).len(), table.group(1).len());
    if size_a == 0 || size_b == 0 {
        return Err(MatchError::EmptyTable);
    }
    if size_a != size_b {
        return Err(MatchError::MismatchedSizes(size_a, size_b));
    }
    validate_names(table)?;
    validate_symmetry(table)?;
    debug!("validated marriage tables of {} members each", size_a);
    Ok(())
}

fn validate_uniqueness(table: &PreferenceTable, group: usize) -> Result<(), MatchError> {
    let mut seen = HashSet::with_capacity(table.group(group).len());
    for id in table.group(group) {
        let name = table.name(id);
        if !seen.insert(name) {
            return Err(MatchError::DuplicateMember(name.to_owned()));
        }
    }
    Ok(())
}

fn validate_disjoint(table: &PreferenceTable) -> Result<(), MatchError> {
    let names_a: HashSet<&str> = table.group(0).map(|id| table.name(id)).collect();
    match table.group(1).find(|id| names_a.contains(table.name(*id))) {
        Some(id) => Err(MatchError::SharedMember(table.name(id).to_owned())),
        None => Ok(()),
    }
}

fn validate_names(table: &PreferenceTable) -> Result<(), MatchError> {
    if table.members().iter().any(|m| m.name().is_empty()) {
        return Err(MatchError::BlankMember);
    }
    Ok(())
}

/// Each member must list every counterpart exactly once and nothing else.
fn validate_symmetry(table: &PreferenceTable) -> Result<(), MatchError> {
    let with_unknown: HashSet<MemberId> = table.unresolved().iter().map(|(id, _)| *id).collect();
    for id in 0..table.len() {
        if with_unknown.contains(&id) {
            return Err(MatchError::UnknownMember(table.name(id).to_owned()));
        }
        let mut actual = table.member(id).preference_list().members().to_vec();
        actual.sort_unstable();
        // counterparts come out of a range, hence already sorted
        let expected: Vec<MemberId> = table.counterparts(id).collect();
        if actual != expected {
            return Err(MatchError::IncompletePreferences(table.name(id).to_owned()));
        }
    }
    Ok(())
}
