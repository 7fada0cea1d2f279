//! Per-mark energies.

use std::fmt;

use markforge_core::{MarkForgeError, Result};

use crate::sum::CompensatedSum;

/// One energy per mark, parallel to the configuration.
///
/// Position `i` always holds the energy of the mark at position `i` of the
/// owning configuration. The total is a compensated running sum, so
/// removing a large energy does not leave its rounding error behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyIndividual {
    energies: Vec<f64>,
    total: CompensatedSum,
}

impl EnergyIndividual {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the term from already scored energies, in configuration order.
    pub fn from_energies(energies: Vec<f64>) -> Self {
        let total = CompensatedSum::of(energies.iter().copied());
        Self { energies, total }
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.total.value()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.energies.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.energies
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.energies.iter().copied()
    }

    /// Appends the energy of a newly added mark.
    pub fn push(&mut self, energy: f64) {
        self.energies.push(energy);
        self.total.add(energy);
    }

    /// Re-inserts an energy at `index`; the inverse of [`remove`](Self::remove).
    pub fn insert(&mut self, index: usize, energy: f64) -> Result<()> {
        if index > self.energies.len() {
            return Err(self.out_of_range(index));
        }
        self.energies.insert(index, energy);
        self.total.add(energy);
        Ok(())
    }

    /// Removes and returns the energy at `index`.
    pub fn remove(&mut self, index: usize) -> Result<f64> {
        if index >= self.energies.len() {
            return Err(self.out_of_range(index));
        }
        let energy = self.energies.remove(index);
        self.total.sub(energy);
        Ok(energy)
    }

    /// Removes two energies, returned in argument order.
    pub fn remove_two(&mut self, index_a: usize, index_b: usize) -> Result<(f64, f64)> {
        if index_a == index_b {
            return Err(MarkForgeError::IdenticalIndices(index_a));
        }
        for index in [index_a, index_b] {
            if index >= self.energies.len() {
                return Err(self.out_of_range(index));
            }
        }
        let (high, low) = if index_a > index_b {
            (index_a, index_b)
        } else {
            (index_b, index_a)
        };
        let high_energy = self.energies.remove(high);
        let low_energy = self.energies.remove(low);
        self.total.sub(high_energy);
        self.total.sub(low_energy);

        if index_a > index_b {
            Ok((high_energy, low_energy))
        } else {
            Ok((low_energy, high_energy))
        }
    }

    /// Overwrites the energy at `index`, returning the previous value.
    pub fn exchange(&mut self, index: usize, energy: f64) -> Result<f64> {
        if index >= self.energies.len() {
            return Err(self.out_of_range(index));
        }
        let old = std::mem::replace(&mut self.energies[index], energy);
        self.total.sub(old);
        self.total.add(energy);
        Ok(old)
    }

    /// Sum of the stored energies, ignoring the cached total.
    pub fn recomputed_total(&self) -> f64 {
        CompensatedSum::of(self.energies.iter().copied()).value()
    }

    /// Replaces the cached total with a fresh sum.
    pub fn resync(&mut self) {
        self.total = CompensatedSum::of(self.energies.iter().copied());
    }

    fn out_of_range(&self, index: usize) -> MarkForgeError {
        MarkForgeError::IndexOutOfRange {
            index,
            len: self.energies.len(),
        }
    }
}

impl fmt::Display for EnergyIndividual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, energy) in self.energies.iter().enumerate() {
            writeln!(f, "{index}\t{energy:.6}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_remove() {
        let mut term = EnergyIndividual::new();
        term.push(1.0);
        term.push(2.5);
        term.push(-0.5);
        assert_eq!(term.len(), 3);
        assert_eq!(term.total(), 3.0);

        assert_eq!(term.remove(1).unwrap(), 2.5);
        assert_eq!(term.as_slice(), &[1.0, -0.5]);
        assert_eq!(term.total(), 0.5);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut term = EnergyIndividual::from_energies(vec![1.0]);
        let err = term.remove(3).unwrap_err();
        assert!(matches!(err, MarkForgeError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(term.total(), 1.0);
    }

    #[test]
    fn test_remove_two_argument_order() {
        let mut forward = EnergyIndividual::from_energies(vec![1.0, 2.0, 3.0, 4.0]);
        let mut backward = forward.clone();

        assert_eq!(forward.remove_two(1, 3).unwrap(), (2.0, 4.0));
        assert_eq!(backward.remove_two(3, 1).unwrap(), (4.0, 2.0));
        assert_eq!(forward, backward);
        assert_eq!(forward.as_slice(), &[1.0, 3.0]);
        assert_eq!(forward.total(), 4.0);
    }

    #[test]
    fn test_remove_two_rejects_identical() {
        let mut term = EnergyIndividual::from_energies(vec![1.0, 2.0]);
        assert!(matches!(
            term.remove_two(1, 1),
            Err(MarkForgeError::IdenticalIndices(1))
        ));
        assert_eq!(term.len(), 2);
    }

    #[test]
    fn test_exchange_and_insert() {
        let mut term = EnergyIndividual::from_energies(vec![1.0, 2.0]);
        assert_eq!(term.exchange(0, 5.0).unwrap(), 1.0);
        assert_eq!(term.total(), 7.0);

        term.insert(1, -3.0).unwrap();
        assert_eq!(term.as_slice(), &[5.0, -3.0, 2.0]);
        assert_eq!(term.total(), term.recomputed_total());
    }

    #[test]
    fn test_removing_large_energy_keeps_small_ones() {
        let mut term = EnergyIndividual::new();
        term.push(1e13);
        for _ in 0..50 {
            term.push(0.1);
        }
        term.remove(0).unwrap();
        assert!((term.total() - 5.0).abs() < 1e-12);
        assert!((term.total() - term.recomputed_total()).abs() < 1e-12);
    }

    #[test]
    fn test_display_lists_positions() {
        let term = EnergyIndividual::from_energies(vec![1.0, -2.0]);
        let dump = term.to_string();
        assert_eq!(dump, "0\t1.000000\n1\t-2.000000\n");
    }
}
