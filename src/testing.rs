//! Fixtures shared by the unit tests.

use crate::table::MatchEntry;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

pub(crate) fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub(crate) fn entries(rows: &[(&str, &[&str])]) -> Vec<MatchEntry> {
    rows.iter()
        .map(|(name, preferences)| MatchEntry::new(name, preferences))
        .collect()
}

pub(crate) fn member_names(prefix: &str, size: usize) -> Vec<String> {
    (0..size).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Every member of `names` ranks all of `candidates` (minus itself) in random order.
pub(crate) fn random_entries(
    rng: &mut ChaCha8Rng,
    names: &[String],
    candidates: &[String],
) -> Vec<MatchEntry> {
    names
        .iter()
        .map(|name| {
            let mut preferences: Vec<String> =
                candidates.iter().filter(|c| *c != name).cloned().collect();
            preferences.shuffle(rng);
            MatchEntry {
                name: name.clone(),
                preferences,
            }
        })
        .collect()
}

pub(crate) fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Every member of `names` ranks the others in the order of `names`.
pub(crate) fn master_list_entries(names: &[String]) -> Vec<MatchEntry> {
    names
        .iter()
        .map(|name| MatchEntry {
            name: name.clone(),
            preferences: names.iter().filter(|c| *c != name).cloned().collect(),
        })
        .collect()
}

/// Whether two members prefer each other over the partners `mapping` gives them.
pub(crate) fn has_blocking_pair(
    all_entries: &[&MatchEntry],
    mapping: &BTreeMap<String, String>,
) -> bool {
    let rank = |entry: &MatchEntry, name: &str| entry.preferences.iter().position(|p| p == name);
    let find = |name: &str| all_entries.iter().find(|e| e.name == name).copied();
    all_entries.iter().any(|a| {
        let partner_a = &mapping[&a.name];
        a.preferences.iter().any(|b_name| {
            if b_name == partner_a {
                return false;
            }
            let b = match find(b_name) {
                Some(b) => b,
                None => return false,
            };
            let partner_b = &mapping[&b.name];
            rank(*a, b_name) < rank(*a, partner_a) && rank(b, &a.name) < rank(b, partner_b)
        })
    })
}

/// Whether any perfect pairing of a single group has no blocking pair, found
/// by trying all of them.
pub(crate) fn stable_pairing_exists(rows: &[MatchEntry]) -> bool {
    let all: Vec<&MatchEntry> = rows.iter().collect();
    let names: Vec<&str> = rows.iter().map(|e| e.name.as_str()).collect();
    any_stable_pairing(&all, &names, &mut BTreeMap::new())
}

fn any_stable_pairing(
    all_entries: &[&MatchEntry],
    remaining: &[&str],
    mapping: &mut BTreeMap<String, String>,
) -> bool {
    let (first, rest) = match remaining.split_first() {
        Some(split) => split,
        None => return !has_blocking_pair(all_entries, mapping),
    };
    for (i, partner) in rest.iter().enumerate() {
        let others: Vec<&str> = rest
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, name)| *name)
            .collect();
        mapping.insert(first.to_string(), partner.to_string());
        mapping.insert(partner.to_string(), first.to_string());
        if any_stable_pairing(all_entries, &others, mapping) {
            return true;
        }
    }
    false
}
