//! Scripted random source.

use markforge_core::RandomSource;

/// Replays a fixed list of uniform values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    position: usize,
}

impl ScriptedRandom {
    /// Creates a source replaying `values`. An empty script yields `0.0`.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }

    /// Number of values drawn so far.
    pub fn drawn(&self) -> usize {
        self.position
    }
}

impl RandomSource for ScriptedRandom {
    fn next_uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_and_cycles() {
        let mut random = ScriptedRandom::new([0.1, 0.7]);
        assert_eq!(random.next_uniform(), 0.1);
        assert_eq!(random.next_uniform(), 0.7);
        assert_eq!(random.next_uniform(), 0.1);
        assert_eq!(random.drawn(), 3);
    }
}
