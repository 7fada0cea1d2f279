//! Serializable energy snapshot.

use std::fmt;

/// Point-in-time summary of an [`EnergyBreakdown`](crate::EnergyBreakdown).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyTotals {
    pub total: f64,
    pub individual: f64,
    pub pairwise: f64,
    pub global: f64,
    pub mark_count: usize,
    pub edge_count: usize,
}

impl fmt::Display for EnergyTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={:.6} individual={:.6} pairwise={:.6} global={:.6} marks={} edges={}",
            self.total,
            self.individual,
            self.pairwise,
            self.global,
            self.mark_count,
            self.edge_count
        )
    }
}
