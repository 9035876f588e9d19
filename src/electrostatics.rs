// Electrostatics - Point charges, superposed field and pairwise Coulomb forces
// Positions are canvas units, charges are nanocoulombs, outputs are SI

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::ElectrostaticConfig;
use crate::vector::Vector2;

/// Nanocoulombs to coulombs
pub const NANO: f64 = 1e-9;

/// Largest grid `sample_grid` will build
pub const MAX_GRID_SAMPLES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChargeId(pub u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Charge {
    pub id: ChargeId,
    pub position: Vector2,
    /// Signed charge (nC)
    pub q: f64,
}

// =============================================================================
// CHARGE SET
// =============================================================================

/// Unordered set of charges keyed by id. Ids are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeSet {
    charges: Vec<Charge>,
    next_id: u32,
}

impl ChargeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Vector2, q: f64) -> ChargeId {
        let id = ChargeId(self.next_id);
        self.next_id += 1;
        self.charges.push(Charge { id, position, q });
        id
    }

    pub fn remove(&mut self, id: ChargeId) -> Option<Charge> {
        let index = self.charges.iter().position(|c| c.id == id)?;
        Some(self.charges.swap_remove(index))
    }

    /// Move a charge; returns false if the id is unknown.
    pub fn move_to(&mut self, id: ChargeId, position: Vector2) -> bool {
        match self.charges.iter_mut().find(|c| c.id == id) {
            Some(charge) => {
                charge.position = position;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.charges.clear();
    }

    pub fn get(&self, id: ChargeId) -> Option<&Charge> {
        self.charges.iter().find(|c| c.id == id)
    }

    pub fn as_slice(&self) -> &[Charge] {
        &self.charges
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }
}

// =============================================================================
// FIELD SOLVER
// =============================================================================

/// Electric field (N/C) at `point` from every charge.
///
/// Positive charges push the field away from themselves. Charges closer than
/// `min_distance` are skipped so a query on top of a charge stays finite.
pub fn field_at(point: Vector2, charges: &[Charge], config: &ElectrostaticConfig) -> Vector2 {
    let mut total = Vector2::zero();
    for charge in charges {
        let r_vec = point.sub(&charge.position);
        let r = r_vec.magnitude();
        if r < config.min_distance {
            continue;
        }
        let r_m = r * config.meters_per_unit;
        let magnitude = config.coulomb_constant * charge.q * NANO / (r_m * r_m);
        total = total.add(&r_vec.normalize().scale(magnitude));
    }
    total
}

/// Electric potential (V) at `point`, skipping charges under `min_distance`.
pub fn potential_at(point: Vector2, charges: &[Charge], config: &ElectrostaticConfig) -> f64 {
    charges
        .iter()
        .filter_map(|charge| {
            let r = point.distance(&charge.position);
            (r >= config.min_distance).then(|| {
                config.coulomb_constant * charge.q * NANO / (r * config.meters_per_unit)
            })
        })
        .sum()
}

/// Net Coulomb force (N) on `target` from every other charge.
///
/// Like signs repel, opposite signs attract. The target itself is excluded by
/// id, and coincident pairs contribute nothing to either side.
pub fn force_on(target: &Charge, charges: &[Charge], config: &ElectrostaticConfig) -> Vector2 {
    let mut total = Vector2::zero();
    for other in charges {
        if other.id == target.id {
            continue;
        }
        let r_vec = target.position.sub(&other.position);
        let r = r_vec.magnitude();
        if r < config.min_distance {
            continue;
        }
        let r_m = r * config.meters_per_unit;
        let magnitude =
            config.coulomb_constant * (target.q * NANO) * (other.q * NANO) / (r_m * r_m);
        total = total.add(&r_vec.normalize().scale(magnitude));
    }
    total
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChargeForce {
    pub id: ChargeId,
    pub force: Vector2,
}

pub fn all_forces(charges: &[Charge], config: &ElectrostaticConfig) -> Vec<ChargeForce> {
    charges
        .iter()
        .map(|c| ChargeForce {
            id: c.id,
            force: force_on(c, charges, config),
        })
        .collect()
}

// =============================================================================
// FIELD SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldSample {
    pub point: Vector2,
    pub field: Vector2,
}

/// Frozen copy of the charge set for one tick; queryable by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub charges: Vec<Charge>,
    pub config: ElectrostaticConfig,
}

impl FieldSnapshot {
    pub fn new(charges: &[Charge], config: &ElectrostaticConfig) -> Self {
        Self {
            charges: charges.to_vec(),
            config: config.clone(),
        }
    }

    pub fn field_at(&self, point: Vector2) -> Vector2 {
        field_at(point, &self.charges, &self.config)
    }

    pub fn potential_at(&self, point: Vector2) -> f64 {
        potential_at(point, &self.charges, &self.config)
    }

    /// Field vectors on a regular grid covering [0, width] x [0, height].
    pub fn sample_grid(&self, width: f64, height: f64, spacing: f64) -> Vec<FieldSample> {
        if !(spacing > 0.0) || !width.is_finite() || !height.is_finite() {
            return Vec::new();
        }
        let columns = ((width / spacing).floor() as usize).saturating_add(1);
        let rows = ((height / spacing).floor() as usize).saturating_add(1);
        let count = match columns.checked_mul(rows) {
            Some(count) if count <= MAX_GRID_SAMPLES => count,
            _ => {
                warn!("refusing {columns}x{rows} field grid (limit {MAX_GRID_SAMPLES} samples)");
                return Vec::new();
            }
        };
        let mut samples = Vec::with_capacity(count);
        for row in 0..rows {
            for col in 0..columns {
                let point = Vector2::new(col as f64 * spacing, row as f64 * spacing);
                samples.push(FieldSample {
                    point,
                    field: self.field_at(point),
                });
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> ElectrostaticConfig {
        ElectrostaticConfig::default()
    }

    fn dipole() -> ChargeSet {
        let mut set = ChargeSet::new();
        set.add(Vector2::new(300.0, 300.0), 2.0);
        set.add(Vector2::new(500.0, 300.0), -2.0);
        set
    }

    #[test]
    fn test_dipole_field_points_from_positive_to_negative() {
        let set = dipole();
        let e = field_at(Vector2::new(400.0, 300.0), set.as_slice(), &config());
        assert!(e.x > 0.0);
        assert!(e.y.abs() < 1e-9 * e.x);
        // 2 nC at 1 m contributes k * 2e-9 N/C; both charges add
        assert_relative_eq!(e.x, 2.0 * 8.987_551_792_3e9 * 2e-9, max_relative = 1e-12);
    }

    #[test]
    fn test_dipole_field_symmetric_about_midpoint() {
        let set = dipole();
        for &offset in &[10.0, 35.0, 80.0] {
            let left = field_at(Vector2::new(400.0 - offset, 300.0), set.as_slice(), &config());
            let right = field_at(Vector2::new(400.0 + offset, 300.0), set.as_slice(), &config());
            assert_relative_eq!(left.magnitude(), right.magnitude(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_superposition_is_linear() {
        let mut a = ChargeSet::new();
        a.add(Vector2::new(120.0, 80.0), 3.0);
        let mut b = ChargeSet::new();
        b.add(Vector2::new(40.0, 260.0), -1.5);
        let both = [a.as_slice()[0], b.as_slice()[0]];
        let p = Vector2::new(210.0, 190.0);
        let sum = field_at(p, a.as_slice(), &config()).add(&field_at(p, b.as_slice(), &config()));
        let joint = field_at(p, &both, &config());
        assert_relative_eq!(sum.x, joint.x, max_relative = 1e-12);
        assert_relative_eq!(sum.y, joint.y, max_relative = 1e-12);
    }

    #[test]
    fn test_query_on_charge_is_finite() {
        let set = dipole();
        let e = field_at(Vector2::new(300.0, 300.0), set.as_slice(), &config());
        assert!(e.is_finite());
        let v = potential_at(Vector2::new(300.0, 300.0), set.as_slice(), &config());
        assert!(v.is_finite());
    }

    #[test]
    fn test_newtons_third_law() {
        let mut set = ChargeSet::new();
        let a = set.add(Vector2::new(100.0, 100.0), 4.0);
        let b = set.add(Vector2::new(260.0, 175.0), -1.0);
        let fa = force_on(set.get(a).unwrap(), set.as_slice(), &config());
        let fb = force_on(set.get(b).unwrap(), set.as_slice(), &config());
        assert_relative_eq!(fa.x, -fb.x, max_relative = 1e-12);
        assert_relative_eq!(fa.y, -fb.y, max_relative = 1e-12);
    }

    #[test]
    fn test_like_charges_repel_opposites_attract() {
        let mut set = ChargeSet::new();
        let a = set.add(Vector2::new(0.0, 0.0), 1.0);
        set.add(Vector2::new(100.0, 0.0), 1.0);
        let f = force_on(set.get(a).unwrap(), set.as_slice(), &config());
        assert!(f.x < 0.0);

        let mut set = ChargeSet::new();
        let a = set.add(Vector2::new(0.0, 0.0), 1.0);
        set.add(Vector2::new(100.0, 0.0), -1.0);
        let f = force_on(set.get(a).unwrap(), set.as_slice(), &config());
        assert!(f.x > 0.0);
    }

    #[test]
    fn test_lone_charge_feels_no_force() {
        let mut set = ChargeSet::new();
        let a = set.add(Vector2::new(10.0, 10.0), 5.0);
        let f = force_on(set.get(a).unwrap(), set.as_slice(), &config());
        assert_eq!(f, Vector2::zero());
    }

    #[test]
    fn test_charge_set_ids_unique_after_remove() {
        let mut set = ChargeSet::new();
        let a = set.add(Vector2::zero(), 1.0);
        let b = set.add(Vector2::zero(), 1.0);
        assert!(set.remove(a).is_some());
        assert!(set.remove(a).is_none());
        let c = set.add(Vector2::zero(), 1.0);
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(set.move_to(b, Vector2::new(5.0, 5.0)));
        assert!(!set.move_to(a, Vector2::new(5.0, 5.0)));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_potential_zero_on_dipole_bisector() {
        let set = dipole();
        let v = potential_at(Vector2::new(400.0, 123.0), set.as_slice(), &config());
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn test_sample_grid_shape() {
        let snapshot = FieldSnapshot::new(dipole().as_slice(), &config());
        let grid = snapshot.sample_grid(800.0, 600.0, 100.0);
        assert_eq!(grid.len(), 9 * 7);
        assert!(grid.iter().all(|s| s.field.is_finite()));
        assert!(snapshot.sample_grid(800.0, 600.0, 0.0).is_empty());
    }

    #[test]
    fn test_oversized_grid_is_refused() {
        let snapshot = FieldSnapshot::new(dipole().as_slice(), &config());
        assert!(snapshot.sample_grid(1e12, 1e12, 1e-3).is_empty());
        assert!(snapshot.sample_grid(f64::MAX, 1.0, 1e-300).is_empty());
        // 1024 x 1024 sits exactly at the limit
        assert_eq!(snapshot.sample_grid(1023.0, 1023.0, 1.0).len(), MAX_GRID_SAMPLES);
    }
}
