//! Assignment engine: single-cycle derangement by rotating a shuffled list.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::DrawError;

/// One gifter → giftee pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub gifter: String,
    pub giftee: String,
}

/// The result of a draw.
///
/// Pairs are kept in the order the participants were supplied, which is also
/// the order notifications are sent in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Assignments {
    pairs: Vec<Pair>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Assignments {
    fn from_pairs(pairs: Vec<Pair>) -> Self {
        let index = pairs
            .iter()
            .enumerate()
            .map(|(i, p)| (p.gifter.clone(), i))
            .collect();
        Self { pairs, index }
    }

    /// The giftee drawn by `gifter`, if `gifter` took part.
    pub fn giftee_of(&self, gifter: &str) -> Option<&str> {
        self.index
            .get(gifter)
            .map(|&i| self.pairs[i].giftee.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of steps needed to get back to `start` by following the
    /// mapping. `None` if `start` is unknown or the walk never returns.
    pub fn cycle_len(&self, start: &str) -> Option<usize> {
        let mut current = start;
        for step in 1..=self.len() {
            current = self.giftee_of(current)?;
            if current == start {
                return Some(step);
            }
        }
        None
    }
}

/// Draw assignments for `names`, reproducibly when `seed` is given.
pub fn draw<S: AsRef<str>>(names: &[S], seed: Option<u64>) -> Result<Assignments, DrawError> {
    match seed {
        Some(seed) => draw_with_rng(names, &mut StdRng::seed_from_u64(seed)),
        None => draw_with_rng(names, &mut rand::thread_rng()),
    }
}

/// Draw assignments using the supplied random source.
///
/// Shuffles the names, then gives each person the next one in the shuffled
/// order (the last wraps to the first). The result always has no self-pairs
/// and forms one cycle through everybody.
pub fn draw_with_rng<S, R>(names: &[S], rng: &mut R) -> Result<Assignments, DrawError>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    validate(names)?;

    let mut shuffled: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    shuffled.shuffle(rng);

    let position: HashMap<&str, usize> = shuffled
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect();

    let pairs = names
        .iter()
        .map(|name| {
            let gifter = name.as_ref();
            let giftee = shuffled[(position[gifter] + 1) % shuffled.len()];
            Pair {
                gifter: gifter.to_string(),
                giftee: giftee.to_string(),
            }
        })
        .collect();

    Ok(Assignments::from_pairs(pairs))
}

fn validate<S: AsRef<str>>(names: &[S]) -> Result<(), DrawError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_ref()) {
            return Err(DrawError::DuplicateName {
                name: name.as_ref().to_string(),
            });
        }
    }
    if names.len() < 2 {
        return Err(DrawError::TooFewParticipants { count: names.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("person-{i}")).collect()
    }

    fn assert_single_cycle(names: &[String], assignments: &Assignments) {
        assert_eq!(assignments.len(), names.len());

        let giftees: HashSet<&str> = assignments.iter().map(|p| p.giftee.as_str()).collect();
        let expected: HashSet<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(giftees, expected, "mapping must be a bijection");

        for pair in assignments.iter() {
            assert_ne!(pair.gifter, pair.giftee, "self-pair for {}", pair.gifter);
        }

        // Walking n steps from any start visits everyone once and comes back.
        let start = names[0].as_str();
        let mut visited = HashSet::new();
        let mut current = start;
        for _ in 0..names.len() {
            assert!(visited.insert(current), "repeat before step n at {current}");
            current = assignments.giftee_of(current).unwrap();
        }
        assert_eq!(current, start);
        assert_eq!(assignments.cycle_len(start), Some(names.len()));
    }

    #[test]
    fn single_cycle_for_many_sizes_and_seeds() {
        for n in 2..=25 {
            let names = names(n);
            for seed in 0..20 {
                let assignments = draw(&names, Some(seed)).unwrap();
                assert_single_cycle(&names, &assignments);
            }
        }
    }

    #[test]
    fn unseeded_draw_is_valid() {
        let names = names(9);
        for _ in 0..50 {
            let assignments = draw(&names, None).unwrap();
            assert_single_cycle(&names, &assignments);
        }
    }

    #[test]
    fn same_seed_same_mapping() {
        let names = names(12);
        let first = draw(&names, Some(7)).unwrap();
        let second = draw(&names, Some(7)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn four_person_example_is_a_four_cycle() {
        let names: Vec<String> = ["Jesse", "Derek", "Angela", "Will"]
            .into_iter()
            .map(String::from)
            .collect();
        let assignments = draw(&names, Some(42)).unwrap();
        assert_single_cycle(&names, &assignments);
        for name in &names {
            assert_eq!(assignments.cycle_len(name), Some(4));
        }
    }

    #[test]
    fn two_people_swap() {
        let assignments = draw(&["a", "b"], Some(1)).unwrap();
        assert_eq!(assignments.giftee_of("a"), Some("b"));
        assert_eq!(assignments.giftee_of("b"), Some("a"));
    }

    #[test]
    fn pairs_follow_input_order() {
        let names = names(6);
        let assignments = draw(&names, Some(3)).unwrap();
        let gifters: Vec<&str> = assignments.iter().map(|p| p.gifter.as_str()).collect();
        let expected: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(gifters, expected);
    }

    #[test]
    fn empty_input_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(
            draw(&empty, Some(1)),
            Err(DrawError::TooFewParticipants { count: 0 })
        );
    }

    #[test]
    fn single_participant_rejected() {
        assert_eq!(
            draw(&["solo"], Some(1)),
            Err(DrawError::TooFewParticipants { count: 1 })
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        assert_eq!(
            draw(&["a", "b", "a"], None),
            Err(DrawError::DuplicateName { name: "a".into() })
        );
    }

    #[test]
    fn unknown_gifter_has_no_cycle() {
        let assignments = draw(&["a", "b", "c"], Some(5)).unwrap();
        assert_eq!(assignments.giftee_of("z"), None);
        assert_eq!(assignments.cycle_len("z"), None);
    }

    #[test]
    fn serializes_as_pair_list() {
        let assignments = draw(&["a", "b"], Some(1)).unwrap();
        let json = serde_json::to_value(&assignments).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert!(json[0].get("gifter").is_some());
        assert!(json[0].get("giftee").is_some());
    }
}
