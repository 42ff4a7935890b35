//! Bone Mapping Table
//!
//! A [`MappingTable`] pairs bone names of a *source* skeleton with bone names
//! of a *target* skeleton. Each bone appears in at most one entry on each
//! side. The table also carries a single global twist rotation that corrects
//! for differing bone-axis conventions between the two rigs.
//!
//! The `inverted` flag swaps the roles of the two columns without touching the
//! stored entries: lookups, edits and the twist are all seen through the flag.

use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

use crate::animation::skeleton::Skeleton;
use crate::errors::{MappingSide, PoseError, Result};

/// One source-bone/target-bone pair, in stored (non-inverted) orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneMapping {
    pub source: String,
    pub target: String,
}

/// Principal rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingTable {
    entries: Vec<BoneMapping>,
    twist: Quat,
    inverted: bool,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            twist: Quat::IDENTITY,
            inverted: false,
        }
    }
}

impl MappingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Orientation
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn toggle_invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// Source-side name of a stored entry, seen through the invert flag.
    #[inline]
    fn source_of<'a>(&self, entry: &'a BoneMapping) -> &'a str {
        if self.inverted {
            &entry.target
        } else {
            &entry.source
        }
    }

    #[inline]
    fn target_of<'a>(&self, entry: &'a BoneMapping) -> &'a str {
        if self.inverted {
            &entry.source
        } else {
            &entry.target
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    #[must_use]
    pub fn target_bone_for(&self, source_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| self.source_of(e) == source_name)
            .map(|e| self.target_of(e))
    }

    #[must_use]
    pub fn source_bone_for(&self, target_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| self.target_of(e) == target_name)
            .map(|e| self.source_of(e))
    }

    #[must_use]
    pub fn is_source_mapped(&self, source_name: &str) -> bool {
        self.target_bone_for(source_name).is_some()
    }

    #[must_use]
    pub fn is_target_mapped(&self, target_name: &str) -> bool {
        self.source_bone_for(target_name).is_some()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as `(source, target)` pairs, seen through the invert flag.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (self.source_of(e), self.target_of(e)))
    }

    /// Stored entries, ignoring the invert flag.
    #[must_use]
    pub fn entries(&self) -> &[BoneMapping] {
        &self.entries
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Adds a mapping. Fails with `Conflict` if either bone is already mapped.
    pub fn map(&mut self, source_name: &str, target_name: &str) -> Result<()> {
        if source_name.is_empty() || target_name.is_empty() {
            return Err(PoseError::InvalidArgument(
                "bone names in a mapping must not be empty".to_string(),
            ));
        }
        if self.is_source_mapped(source_name) {
            return Err(PoseError::Conflict {
                bone: source_name.to_string(),
                side: MappingSide::Source,
            });
        }
        if self.is_target_mapped(target_name) {
            return Err(PoseError::Conflict {
                bone: target_name.to_string(),
                side: MappingSide::Target,
            });
        }

        let (source, target) = if self.inverted {
            (target_name, source_name)
        } else {
            (source_name, target_name)
        };
        self.entries.push(BoneMapping {
            source: source.to_string(),
            target: target.to_string(),
        });
        log::debug!("Mapped '{source_name}' -> '{target_name}'");
        Ok(())
    }

    /// Removes the entry whose source side is `source_name`.
    pub fn unmap_source(&mut self, source_name: &str) -> Result<BoneMapping> {
        let index = self
            .entries
            .iter()
            .position(|e| self.source_of(e) == source_name)
            .ok_or_else(|| PoseError::NotFound(format!("mapping for source bone '{source_name}'")))?;
        log::debug!("Unmapped source bone '{source_name}'");
        Ok(self.entries.remove(index))
    }

    /// Removes the entry whose target side is `target_name`.
    pub fn unmap_target(&mut self, target_name: &str) -> Result<BoneMapping> {
        let index = self
            .entries
            .iter()
            .position(|e| self.target_of(e) == target_name)
            .ok_or_else(|| PoseError::NotFound(format!("mapping for target bone '{target_name}'")))?;
        log::debug!("Unmapped target bone '{target_name}'");
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Maps every identically named bone pair not yet mapped on either side.
    ///
    /// Returns the number of entries added.
    pub fn map_matching_names(&mut self, source: &Skeleton, target: &Skeleton) -> usize {
        let mut added = 0;
        for name in source.names() {
            if target.contains(name)
                && !self.is_source_mapped(name)
                && !self.is_target_mapped(name)
                && self.map(name, name).is_ok()
            {
                added += 1;
            }
        }
        added
    }

    // ========================================================================
    // Twist
    // ========================================================================

    /// The twist applied source-to-target, seen through the invert flag.
    #[must_use]
    pub fn twist(&self) -> Quat {
        if self.inverted {
            self.twist.inverse()
        } else {
            self.twist
        }
    }

    pub fn set_twist(&mut self, twist: Quat) -> Result<()> {
        if !twist.is_finite() || twist.length_squared() < 1e-12 {
            return Err(PoseError::InvalidArgument(format!(
                "twist {twist} is not a usable rotation"
            )));
        }
        self.store_twist(twist);
        Ok(())
    }

    /// Snaps every Euler angle of the twist to the nearest multiple of 90°.
    pub fn cardinalize_twist(&mut self) {
        let (x, y, z) = self.twist().to_euler(EulerRot::XYZ);
        self.store_twist(Quat::from_euler(EulerRot::XYZ, snap_angle(x), snap_angle(y), snap_angle(z)));
    }

    /// Snaps only the rotation about `axis` of the effective twist to the nearest multiple of 90°.
    pub fn snap_twist(&mut self, axis: Axis) {
        let (mut x, mut y, mut z) = self.twist().to_euler(EulerRot::XYZ);
        match axis {
            Axis::X => x = snap_angle(x),
            Axis::Y => y = snap_angle(y),
            Axis::Z => z = snap_angle(z),
        }
        self.store_twist(Quat::from_euler(EulerRot::XYZ, x, y, z));
    }

    /// Stores an effective twist through the invert flag.
    fn store_twist(&mut self, twist: Quat) {
        let twist = twist.normalize();
        self.twist = if self.inverted { twist.inverse() } else { twist };
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Fraction of `source` bones that have an entry on the source side.
    #[must_use]
    pub fn matches_source(&self, source: &Skeleton) -> f32 {
        match_fraction(source, |name| self.is_source_mapped(name))
    }

    /// Fraction of `target` bones that have an entry on the target side.
    #[must_use]
    pub fn matches_target(&self, target: &Skeleton) -> f32 {
        match_fraction(target, |name| self.is_target_mapped(name))
    }

    #[must_use]
    pub fn describe_source_match(&self, source: &Skeleton) -> String {
        format!(
            "{:.1}% matches the source skeleton",
            self.matches_source(source) * 100.0
        )
    }

    #[must_use]
    pub fn describe_target_match(&self, target: &Skeleton) -> String {
        format!(
            "{:.1}% matches the target skeleton",
            self.matches_target(target) * 100.0
        )
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a table, rejecting duplicate bones and empty names.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: MappingTable = serde_json::from_str(json)?;
        let mut table = MappingTable::default();
        for entry in &parsed.entries {
            table.map(&entry.source, &entry.target)?;
        }
        table.set_twist(parsed.twist)?;
        table.inverted = parsed.inverted;
        Ok(table)
    }
}

fn match_fraction<F: Fn(&str) -> bool>(skeleton: &Skeleton, mapped: F) -> f32 {
    let count = skeleton.bone_count();
    if count == 0 {
        return 0.0;
    }
    let matched = skeleton.names().filter(|&name| mapped(name)).count();
    matched as f32 / count as f32
}

fn snap_angle(angle: f32) -> f32 {
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_angle_rounds_to_quarter_turns() {
        assert!((snap_angle(0.7) - 0.0).abs() < 1e-6);
        assert!((snap_angle(0.9) - FRAC_PI_2).abs() < 1e-6);
        assert!((snap_angle(-2.5) + 2.0 * FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn inverted_twist_is_inverse() {
        let mut table = MappingTable::new();
        table.set_twist(Quat::from_rotation_x(0.4)).unwrap();
        table.toggle_invert();
        assert!(table.twist().dot(Quat::from_rotation_x(-0.4)) > 1.0 - 1e-6);
    }
}
