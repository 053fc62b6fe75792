//! Lazy test-variant streams and the helpers shared by the generators.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::pattern::Pattern;

/// A lazily evaluated sequence of patterns. Restart by calling the
/// producing operation again; callers bound evaluation with `take(n)`.
pub type PatternStream = Box<dyn Iterator<Item = Pattern>>;

pub fn single(pattern: Pattern) -> PatternStream {
    Box::new(std::iter::once(pattern))
}

pub fn empty() -> PatternStream {
    Box::new(std::iter::empty())
}

pub fn from_vec(patterns: Vec<Pattern>) -> PatternStream {
    Box::new(patterns.into_iter())
}

/// Order-preserving list variants where `None` marks an absent optional
/// slot. Slots are zipped index-wise (wrapping shorter slots), so optional
/// slots appear all together or not at all. `[optional, required]` yields
/// `[both]` and `[required]`.
pub fn all_or_nothing_list_combinations<T: Clone + PartialEq>(
    slots: &[Vec<Option<T>>],
) -> Vec<Vec<T>> {
    let live: Vec<&Vec<Option<T>>> = slots.iter().filter(|s| !s.is_empty()).collect();
    let longest = live.iter().map(|s| s.len()).max().unwrap_or(0);
    if longest == 0 {
        return vec![Vec::new()];
    }
    let mut out: Vec<Vec<T>> = Vec::new();
    for i in 0..longest {
        let combo: Vec<T> = live
            .iter()
            .filter_map(|slot| slot[i % slot.len()].clone())
            .collect();
        if !out.contains(&combo) {
            out.push(combo);
        }
    }
    out
}

pub(crate) fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Number of repetitions for lists, rests and dictionaries.
pub(crate) fn random_count(min: usize, max: usize) -> usize {
    rand::thread_rng().gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_then_required_yields_two_lists() {
        let slots = vec![vec![Some("optional"), None], vec![Some("required")]];
        let combos = all_or_nothing_list_combinations(&slots);
        assert_eq!(combos.len(), 2);
        assert!(combos.contains(&vec!["optional", "required"]));
        assert!(combos.contains(&vec!["required"]));
    }

    #[test]
    fn no_slots_yields_the_empty_list() {
        let combos = all_or_nothing_list_combinations::<i32>(&[]);
        assert_eq!(combos, vec![Vec::<i32>::new()]);
    }

    #[test]
    fn random_strings_have_the_requested_length() {
        assert_eq!(random_string(12).chars().count(), 12);
    }
}
