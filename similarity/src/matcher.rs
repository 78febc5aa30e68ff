//! Pairwise element similarity.

use db::models::Element;
use std::collections::BTreeSet;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Decides how alike two elements are, on a scale from 0.0 to 1.0.
///
/// Implementations must be symmetric. Elements whose similarity reaches
/// [`ElementMatcher::threshold`] are treated as interchangeable for grading.
pub trait ElementMatcher: Send + Sync {
    fn similarity(&self, a: &Element, b: &Element) -> f64;

    fn threshold(&self) -> f64;
}

/// Compares element names by token overlap.
///
/// Elements of different types, or placed in a different context, never match.
#[derive(Debug, Clone)]
pub struct NameSimilarityMatcher {
    threshold: f64,
}

impl NameSimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl Default for NameSimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl ElementMatcher for NameSimilarityMatcher {
    fn similarity(&self, a: &Element, b: &Element) -> f64 {
        if a.element_type != b.element_type {
            return 0.0;
        }
        if tokens(&a.context) != tokens(&b.context) {
            return 0.0;
        }
        jaccard(&tokens(&a.name), &tokens(&b.name))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

fn tokens(value: &str) -> BTreeSet<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Element {
        Element::new("Class:x", "Class", name, "")
    }

    #[test]
    fn test_identical_names_ignore_case_and_punctuation() {
        let m = NameSimilarityMatcher::default();
        assert_eq!(m.similarity(&class("Car"), &class("car")), 1.0);
        assert_eq!(m.similarity(&class("Sports_Car"), &class("sports car")), 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let m = NameSimilarityMatcher::default();
        let sim = m.similarity(&class("Electric Car"), &class("Car"));
        assert!((sim - 0.5).abs() < f64::EPSILON);
        assert!(sim < m.threshold());
        assert!(sim >= NameSimilarityMatcher::new(0.5).threshold());
    }

    #[test]
    fn test_type_and_context_must_agree() {
        let m = NameSimilarityMatcher::default();
        let interface = Element::new("Interface:x", "Interface", "Car", "");
        assert_eq!(m.similarity(&class("Car"), &interface), 0.0);

        let a = Element::new("ClassAttribute:a", "ClassAttribute", "wheels", "Car");
        let b = Element::new("ClassAttribute:b", "ClassAttribute", "wheels", "Bus");
        assert_eq!(m.similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let m = NameSimilarityMatcher::default();
        let a = class("Parking Lot");
        let b = class("Lot");
        assert_eq!(m.similarity(&a, &b), m.similarity(&b, &a));
    }
}
