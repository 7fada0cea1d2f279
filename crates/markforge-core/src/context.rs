//! Explicit context handed to energy evaluators.
//!
//! Region-membership lookups and image dimensions travel with the context
//! instead of living in a process-wide registry, so evaluators stay pure and
//! can be exercised with fakes.

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::{MarkForgeError, Result};

/// Dimensions of the image a configuration is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Extent {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// A single-slice extent.
    pub fn planar(x: usize, y: usize) -> Self {
        Self::new(x, y, 1)
    }

    pub fn volume(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Returns true if the voxel position lies inside the extent.
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.x
            && (y as usize) < self.y
            && (z as usize) < self.z
    }
}

/// A named region of a mark (e.g. "inside", "shell") and its membership bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMembership {
    name: String,
    index: u8,
}

impl RegionMembership {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Bit flag identifying this region in a voxel membership byte.
    pub fn flag(&self) -> u8 {
        1 << self.index
    }
}

/// Lookup table of the regions evaluators may ask about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionMap {
    regions: Vec<RegionMembership>,
}

impl RegionMap {
    /// Maximum number of regions representable in a membership byte.
    pub const MAX_REGIONS: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a region, assigning it the next membership bit.
    pub fn with_region(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if self.regions.len() >= Self::MAX_REGIONS {
            return Err(MarkForgeError::Initialization(format!(
                "cannot register region '{name}': at most {} regions",
                Self::MAX_REGIONS
            )));
        }
        if self.by_name(&name).is_some() {
            return Err(MarkForgeError::Initialization(format!(
                "region '{name}' registered twice"
            )));
        }
        let index = self.regions.len() as u8;
        self.regions.push(RegionMembership { name, index });
        Ok(self)
    }

    pub fn by_name(&self, name: &str) -> Option<&RegionMembership> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn by_index(&self, index: u8) -> Option<&RegionMembership> {
        self.regions.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Names of all regions whose bit is set in `membership`.
    pub fn members_of(&self, membership: u8) -> impl Iterator<Item = &str> + '_ {
        self.regions
            .iter()
            .filter(move |r| membership & r.flag() != 0)
            .map(|r| r.name.as_str())
    }
}

/// Read-only data shared by every evaluator call.
///
/// Carries the image extent, the region map and an optional opaque payload
/// (voxel stacks, precomputed feature maps) that the core passes through
/// without interpreting. Cloning is cheap; the payload is shared.
#[derive(Clone, Default)]
pub struct EnergyContext {
    extent: Option<Extent>,
    regions: RegionMap,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl EnergyContext {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent: Some(extent),
            regions: RegionMap::default(),
            payload: None,
        }
    }

    pub fn with_regions(mut self, regions: RegionMap) -> Self {
        self.regions = regions;
        self
    }

    /// Attaches evaluator-specific data.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: Arc<T>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Returns the payload if it has type `T`.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl Debug for EnergyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyContext")
            .field("extent", &self.extent)
            .field("regions", &self.regions)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_contains() {
        let extent = Extent::planar(4, 3);
        assert_eq!(extent.volume(), 12);
        assert!(extent.contains(0, 0, 0));
        assert!(extent.contains(3, 2, 0));
        assert!(!extent.contains(4, 0, 0));
        assert!(!extent.contains(0, -1, 0));
        assert!(!extent.contains(0, 0, 1));
    }

    #[test]
    fn test_region_map_assigns_bits() {
        let regions = RegionMap::new()
            .with_region("inside")
            .unwrap()
            .with_region("shell")
            .unwrap();

        assert_eq!(regions.by_name("inside").unwrap().flag(), 0b01);
        assert_eq!(regions.by_name("shell").unwrap().flag(), 0b10);
        assert_eq!(regions.by_index(1).unwrap().name(), "shell");
        let members: Vec<_> = regions.members_of(0b11).collect();
        assert_eq!(members, vec!["inside", "shell"]);
    }

    #[test]
    fn test_region_map_rejects_duplicates_and_overflow() {
        let regions = RegionMap::new().with_region("inside").unwrap();
        assert!(regions.clone().with_region("inside").is_err());

        let mut full = RegionMap::new();
        for i in 0..RegionMap::MAX_REGIONS {
            full = full.with_region(format!("r{i}")).unwrap();
        }
        assert!(full.with_region("extra").is_err());
    }

    #[test]
    fn test_payload_downcast() {
        let ctx = EnergyContext::new(Extent::planar(2, 2)).with_payload(Arc::new(vec![1u8, 2, 3]));
        assert_eq!(ctx.payload::<Vec<u8>>().map(|v| v.len()), Some(3));
        assert!(ctx.payload::<String>().is_none());
        assert!(EnergyContext::default().payload::<Vec<u8>>().is_none());
    }
}
