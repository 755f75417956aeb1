//! Residue Components
//!
//! Decaying disease traces left on tiles and objects.

use bevy_ecs::prelude::*;
use std::collections::{BTreeMap, HashMap};

use contagion_events::DiseaseId;

use super::world::TileCoord;

/// Float tolerance for "fell to zero": absorbs rounding left over from
/// repeated `f32` subtraction, far below any meaningful deposit.
pub const RESIDUE_EPSILON: f32 = 1e-6;

/// Maximum intensity a single disease can reach at one site
pub const MAX_INTENSITY: f32 = 1.0;

/// A contaminated location or object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueSite {
    Tile(TileCoord),
    Object(Entity),
}

impl std::fmt::Display for ResidueSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResidueSite::Tile(tile) => write!(f, "tile({},{})", tile.x, tile.y),
            ResidueSite::Object(entity) => write!(f, "object({:?})", entity),
        }
    }
}

/// Disease intensities at one site
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueState {
    pub intensities: BTreeMap<DiseaseId, f32>,
}

impl ResidueState {
    pub fn intensity(&self, disease: &DiseaseId) -> f32 {
        self.intensities.get(disease).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// Add intensity, capped at [`MAX_INTENSITY`]. Returns the new value.
    pub fn deposit(&mut self, disease: DiseaseId, amount: f32) -> f32 {
        let entry = self.intensities.entry(disease).or_insert(0.0);
        *entry = (*entry + amount.max(0.0)).min(MAX_INTENSITY);
        *entry
    }

    /// Subtract intensity from one disease, dropping it once exhausted
    pub fn consume(&mut self, disease: &DiseaseId, amount: f32) {
        if let Some(value) = self.intensities.get_mut(disease) {
            *value -= amount.max(0.0);
            if *value <= RESIDUE_EPSILON {
                self.intensities.remove(disease);
            }
        }
    }

    /// Linear decay of every intensity
    pub fn decay(&mut self, amount: f32) {
        let amount = amount.max(0.0);
        self.intensities.retain(|_, value| {
            *value -= amount;
            *value > RESIDUE_EPSILON
        });
    }
}

/// Resource: every contaminated site in the world
#[derive(Resource, Debug, Clone, Default)]
pub struct ResidueStore {
    sites: HashMap<ResidueSite, ResidueState>,
}

impl ResidueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, site: &ResidueSite) -> Option<&ResidueState> {
        self.sites.get(site)
    }

    pub fn intensity(&self, site: &ResidueSite, disease: &DiseaseId) -> f32 {
        self.sites
            .get(site)
            .map(|state| state.intensity(disease))
            .unwrap_or(0.0)
    }

    /// Find-or-create the record at `site` and add intensity
    pub fn deposit(&mut self, site: ResidueSite, disease: DiseaseId, amount: f32) -> f32 {
        if amount <= 0.0 {
            return self.intensity(&site, &disease);
        }
        self.sites.entry(site).or_default().deposit(disease, amount)
    }

    pub fn consume(&mut self, site: &ResidueSite, disease: &DiseaseId, amount: f32) {
        if let Some(state) = self.sites.get_mut(site) {
            state.consume(disease, amount);
            if state.is_empty() {
                self.sites.remove(site);
            }
        }
    }

    /// Decay every site and drop the ones left empty
    pub fn decay(&mut self, amount: f32) {
        self.sites.retain(|_, state| {
            state.decay(amount);
            !state.is_empty()
        });
    }

    pub fn remove(&mut self, site: &ResidueSite) -> Option<ResidueState> {
        self.sites.remove(site)
    }

    /// Snapshot of one site's intensities, ordered by disease id
    pub fn intensities_at(&self, site: &ResidueSite) -> Vec<(DiseaseId, f32)> {
        self.sites
            .get(site)
            .map(|state| {
                state
                    .intensities
                    .iter()
                    .map(|(disease, value)| (disease.clone(), *value))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sites(&self) -> impl Iterator<Item = (&ResidueSite, &ResidueState)> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> ResidueSite {
        ResidueSite::Tile(TileCoord::new(3, 4))
    }

    #[test]
    fn test_deposit_caps_at_one() {
        let mut store = ResidueStore::new();
        let flu = DiseaseId::new("flu");
        store.deposit(tile(), flu.clone(), 0.7);
        let value = store.deposit(tile(), flu.clone(), 0.7);
        assert_eq!(value, 1.0);
        assert_eq!(store.intensity(&tile(), &flu), 1.0);
    }

    #[test]
    fn test_zero_deposit_creates_nothing() {
        let mut store = ResidueStore::new();
        store.deposit(tile(), DiseaseId::new("flu"), 0.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_small_deposits_survive() {
        let mut store = ResidueStore::new();
        let flu = DiseaseId::new("flu");
        store.deposit(tile(), flu.clone(), 5e-5);
        store.decay(1e-5);
        assert!((store.intensity(&tile(), &flu) - 4e-5).abs() < 1e-7);

        store.decay(4e-5);
        assert!(store.is_empty());
    }

    #[test]
    fn test_decay_removes_empty_sites() {
        let mut store = ResidueStore::new();
        let flu = DiseaseId::new("flu");
        let cold = DiseaseId::new("cold");
        store.deposit(tile(), flu.clone(), 0.2);
        store.deposit(tile(), cold.clone(), 0.5);

        store.decay(0.2);
        assert_eq!(store.intensity(&tile(), &flu), 0.0);
        assert!(store.get(&tile()).is_some());
        assert!((store.intensity(&tile(), &cold) - 0.3).abs() < 1e-6);

        store.decay(0.3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_consume_never_goes_negative() {
        let mut store = ResidueStore::new();
        let flu = DiseaseId::new("flu");
        store.deposit(tile(), flu.clone(), 0.1);
        store.consume(&tile(), &flu, 0.25);
        assert_eq!(store.intensity(&tile(), &flu), 0.0);
        assert!(store.get(&tile()).is_none());
    }
}
