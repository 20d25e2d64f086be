//! Cartesian expansion of a parameter spec.
//!
//! Varying keys are enumerated in spec insertion order with the rightmost
//! varying key changing fastest (odometer order), so the same spec always
//! yields the same sequence of assignments.

use simsweep_types::{ParameterAssignment, ParameterSpec, Scalar, SpecError, SpecValue};
use tracing::debug;

/// A validated parameter space ready for enumeration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    spec: ParameterSpec,
    count: usize,
}

impl ParameterSpace {
    /// Validate a spec and compute its combination count.
    pub fn new(spec: ParameterSpec) -> Result<Self, SpecError> {
        let count = Self::count(&spec)?;
        debug!(
            keys = spec.len(),
            varying = spec.varying_keys().count(),
            count,
            "Parameter space resolved"
        );
        Ok(Self { spec, count })
    }

    /// Number of assignments a spec expands to, without materializing them.
    ///
    /// A spec without varying keys (including the empty spec) counts as one.
    pub fn count(spec: &ParameterSpec) -> Result<usize, SpecError> {
        spec.validate()?;
        spec.iter()
            .filter(|(_, v)| v.is_varying())
            .try_fold(1usize, |acc, (_, v)| acc.checked_mul(v.len()))
            .ok_or(SpecError::TooManyCombinations)
    }

    /// Expand a spec into its full ordered sequence of assignments.
    pub fn expand(spec: &ParameterSpec) -> Result<Vec<ParameterAssignment>, SpecError> {
        Ok(ParameterSpace::new(spec.clone())?.iter().collect())
    }

    /// The spec this space was built from.
    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    /// Number of assignments in the space.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false: even an empty spec yields one (no-op) assignment.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Lazily enumerate assignments in expansion order.
    pub fn iter(&self) -> Expansion<'_> {
        let radices = self
            .spec
            .iter()
            .filter(|(_, v)| v.is_varying())
            .map(|(_, v)| v.len())
            .collect::<Vec<_>>();
        Expansion {
            spec: &self.spec,
            digits: vec![0; radices.len()],
            radices,
            remaining: self.count,
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSpace {
    type Item = ParameterAssignment;
    type IntoIter = Expansion<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the assignments of a [`ParameterSpace`].
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    spec: &'a ParameterSpec,
    /// Current pick per varying key, in insertion order.
    digits: Vec<usize>,
    radices: Vec<usize>,
    remaining: usize,
}

impl Expansion<'_> {
    fn current(&self) -> ParameterAssignment {
        let mut digit = self.digits.iter();
        self.spec
            .iter()
            .map(|(key, value)| {
                let scalar: Scalar = match value {
                    SpecValue::Scalar(s) => s.clone(),
                    // validated non-empty; one digit per varying key
                    SpecValue::List(values) => {
                        let pick = digit.next().copied().unwrap_or(0);
                        values[pick].clone()
                    }
                };
                (key.to_string(), scalar)
            })
            .collect()
    }

    fn advance(&mut self) {
        for (digit, radix) in self.digits.iter_mut().zip(&self.radices).rev() {
            *digit += 1;
            if *digit < *radix {
                return;
            }
            *digit = 0;
        }
    }
}

impl Iterator for Expansion<'_> {
    type Item = ParameterAssignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let assignment = self.current();
        self.remaining -= 1;
        self.advance();
        Some(assignment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Expansion<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn picks(assignments: &[ParameterAssignment], keys: &[&str]) -> Vec<Vec<String>> {
        assignments
            .iter()
            .map(|a| {
                keys.iter()
                    .map(|k| a.get(k).map(ToString::to_string).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_odometer_order() {
        let spec = ParameterSpec::new()
            .with("A", "x")
            .with("B", SpecValue::list([1, 2]))
            .with("C", SpecValue::list([10, 20]));

        let assignments = ParameterSpace::expand(&spec).unwrap();

        assert_eq!(assignments.len(), 4);
        assert_eq!(
            picks(&assignments, &["B", "C"]),
            vec![
                vec!["1", "10"],
                vec!["1", "20"],
                vec!["2", "10"],
                vec!["2", "20"],
            ]
        );
        for a in &assignments {
            assert_eq!(a.get("A"), Some(&Scalar::from("x")));
            assert_eq!(a.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn test_no_varying_keys_yields_fixed_scalars() {
        let spec = ParameterSpec::new()
            .with("DUnit/DelayLength", "2")
            .with("gain", 1.5);

        let assignments = ParameterSpace::expand(&spec).unwrap();

        assert_eq!(assignments.len(), 1);
        let expected: ParameterAssignment =
            [("DUnit/DelayLength", Scalar::from("2")), ("gain", Scalar::from(1.5))]
                .into_iter()
                .collect();
        assert_eq!(assignments[0], expected);
    }

    #[test]
    fn test_empty_spec_yields_one_empty_assignment() {
        let assignments = ParameterSpace::expand(&ParameterSpec::new()).unwrap();
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].is_empty());
    }

    #[test]
    fn test_count_is_product_and_assignments_distinct() {
        let spec = ParameterSpec::new()
            .with("fixed", true)
            .with("a", SpecValue::list([1, 2, 3]))
            .with("b", SpecValue::list(["p", "q"]))
            .with("c", SpecValue::list([0.1, 0.2, 0.3, 0.4]));

        assert_eq!(ParameterSpace::count(&spec).unwrap(), 24);
        let assignments = ParameterSpace::expand(&spec).unwrap();
        assert_eq!(assignments.len(), 24);

        for (i, a) in assignments.iter().enumerate() {
            assert_eq!(a.len(), 4);
            assert_eq!(a.get("fixed"), Some(&Scalar::Bool(true)));
            for b in &assignments[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_expansion_is_reproducible() {
        let spec = ParameterSpec::new()
            .with("x", SpecValue::list([3, 1, 2]))
            .with("y", SpecValue::list(["b", "a"]));
        let first = ParameterSpace::expand(&spec).unwrap();
        let second = ParameterSpace::expand(&spec).unwrap();
        assert_eq!(first, second);
        // candidate order is taken as declared, never sorted
        assert_eq!(first[0].get("x"), Some(&Scalar::Int(3)));
        assert_eq!(first[0].get("y"), Some(&Scalar::from("b")));
    }

    #[test]
    fn test_empty_list_is_invalid() {
        let spec = ParameterSpec::new()
            .with("a", SpecValue::list([1, 2]))
            .with("b", SpecValue::List(vec![]));
        assert_eq!(
            ParameterSpace::expand(&spec).unwrap_err(),
            SpecError::EmptySequence { key: "b".into() }
        );
    }

    #[test]
    fn test_single_candidate_list_behaves_like_scalar() {
        let spec = ParameterSpec::new()
            .with("len", SpecValue::list(["2"]))
            .with("gain", SpecValue::list(["2", "1"]));
        let assignments = ParameterSpace::expand(&spec).unwrap();
        assert_eq!(assignments.len(), 2);
        assert!(assignments
            .iter()
            .all(|a| a.get("len") == Some(&Scalar::from("2"))));
    }

    #[test]
    fn test_lazy_iter_matches_expand() {
        let spec = ParameterSpec::new()
            .with("a", SpecValue::list([1, 2]))
            .with("b", SpecValue::list([1, 2, 3]));
        let space = ParameterSpace::new(spec.clone()).unwrap();
        let iter = space.iter();
        assert_eq!(iter.len(), 6);
        assert_eq!(iter.collect::<Vec<_>>(), ParameterSpace::expand(&spec).unwrap());
    }
}
