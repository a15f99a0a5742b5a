//! Invented-name pools, carried over verbatim from the original
//! implementation's `podcast_workflow.py` (ten names per gender bucket).

use std::collections::HashSet;

use podcast_core::Gender;

pub const MALE_INVENTED_NAMES: &[&str] = &[
    "Liam", "Noah", "Oliver", "Elijah", "James", "William", "Benjamin", "Lucas", "Henry",
    "Theodore",
];

pub const FEMALE_INVENTED_NAMES: &[&str] = &[
    "Olivia", "Emma", "Charlotte", "Amelia", "Sophia", "Isabella", "Ava", "Mia", "Evelyn", "Luna",
];

pub const NEUTRAL_INVENTED_NAMES: &[&str] = &[
    "Kai", "Rowan", "River", "Phoenix", "Sage", "Justice", "Remy", "Dakota", "Skyler", "Alexis",
];

fn pool_for(gender: Gender) -> &'static [&'static str] {
    match gender {
        Gender::Male => MALE_INVENTED_NAMES,
        Gender::Female => FEMALE_INVENTED_NAMES,
        Gender::Neutral => NEUTRAL_INVENTED_NAMES,
    }
}

/// Picks the next unused invented name for `gender`, falling back to a
/// numeric suffix (`Liam 2`) once the whole pool has been exhausted within
/// this task — spec.md §4.4 step 2.
pub fn next_invented_name(gender: Gender, used: &HashSet<String>) -> String {
    let pool = pool_for(gender);
    if let Some(name) = pool.iter().find(|n| !used.contains(**n)) {
        return name.to_string();
    }
    // Pool exhausted: reuse with a numeric suffix, trying each base name in
    // turn so two exhausted allocations in the same task don't collide.
    let mut suffix = 2;
    loop {
        for base in pool {
            let candidate = format!("{base} {suffix}");
            if !used.contains(&candidate) {
                return candidate;
            }
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_pool_falls_back_to_numeric_suffix() {
        let mut used: HashSet<String> = MALE_INVENTED_NAMES.iter().map(|s| s.to_string()).collect();
        let name = next_invented_name(Gender::Male, &used);
        assert_eq!(name, "Liam 2");
        used.insert(name);
        let next = next_invented_name(Gender::Male, &used);
        assert_eq!(next, "Noah 2");
    }

    #[test]
    fn fresh_pool_returns_first_name() {
        let used = HashSet::new();
        assert_eq!(next_invented_name(Gender::Female, &used), "Olivia");
    }
}
