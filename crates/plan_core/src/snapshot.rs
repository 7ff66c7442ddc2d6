//! World snapshots supplied by the simulation host.
//!
//! A snapshot mirrors what the host reports: signed integers, units and
//! depots mixed together, nothing validated. [`WorldSnapshot::validate`]
//! turns it into the typed entity lists that seed the root search node.
//!
//! **Note:** This module contains no IO. Scenario files are loaded by
//! `plan_tools`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::{
    Cargo, CargoKind, ResourceId, ResourceKind, ResourceNode, Stockpile, Unit, UnitId, UnitRole,
};
use crate::error::SnapshotError;
use crate::position::{MapExtents, Position};

/// A controlled unit as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Host unit id.
    pub id: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Worker or depot.
    pub role: UnitRole,
    /// Carried load, if any: kind and amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo: Option<(CargoKind, i64)>,
}

impl UnitSnapshot {
    /// An empty-handed worker.
    #[must_use]
    pub const fn worker(id: u32, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            role: UnitRole::Worker,
            cargo: None,
        }
    }

    /// A depot.
    #[must_use]
    pub const fn depot(id: u32, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            role: UnitRole::Depot,
            cargo: None,
        }
    }

    /// Give the unit a carried load.
    #[must_use]
    pub fn carrying(mut self, kind: CargoKind, amount: i64) -> Self {
        self.cargo = Some((kind, amount));
        self
    }
}

/// A resource node as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Host node id.
    pub id: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Gold mine or tree.
    pub kind: ResourceKind,
    /// Amount remaining.
    pub amount: i64,
}

impl ResourceSnapshot {
    /// Create a resource snapshot.
    #[must_use]
    pub const fn new(id: u32, x: i32, y: i32, kind: ResourceKind, amount: i64) -> Self {
        Self {
            id,
            x,
            y,
            kind,
            amount,
        }
    }
}

/// The player's running stockpile as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockpileSnapshot {
    /// Banked gold.
    pub gold: i64,
    /// Banked wood.
    pub wood: i64,
}

/// Everything the planner reads from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Map size.
    pub extents: MapExtents,
    /// Controlled workers and depots.
    pub units: Vec<UnitSnapshot>,
    /// Resource nodes on the map.
    pub resources: Vec<ResourceSnapshot>,
    /// Current stockpile (zero for a fresh plan).
    #[serde(default)]
    pub stockpile: StockpileSnapshot,
}

/// Typed, validated contents of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWorld {
    /// Map size.
    pub extents: MapExtents,
    /// Workers sorted by id.
    pub workers: Vec<Unit>,
    /// Depots sorted by id.
    pub depots: Vec<Unit>,
    /// Non-depleted nodes sorted by id.
    pub resources: Vec<ResourceNode>,
    /// Starting stockpile.
    pub stockpile: Stockpile,
    /// First id free for newly built workers.
    pub next_unit_id: u32,
}

impl WorldSnapshot {
    /// Create an empty snapshot for a map.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extents: MapExtents::new(width, height),
            units: Vec::new(),
            resources: Vec::new(),
            stockpile: StockpileSnapshot::default(),
        }
    }

    /// Add a unit.
    #[must_use]
    pub fn with_unit(mut self, unit: UnitSnapshot) -> Self {
        self.units.push(unit);
        self
    }

    /// Add a resource node.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceSnapshot) -> Self {
        self.resources.push(resource);
        self
    }

    /// Set the starting stockpile.
    #[must_use]
    pub fn with_stockpile(mut self, gold: i64, wood: i64) -> Self {
        self.stockpile = StockpileSnapshot { gold, wood };
        self
    }

    /// Check the snapshot and convert it into typed entities.
    ///
    /// Depleted nodes (amount zero) are dropped, they can never be harvested.
    ///
    /// # Errors
    ///
    /// Returns the first [`SnapshotError`] found.
    pub fn validate(&self, harvest_yield: u32) -> Result<ValidatedWorld, SnapshotError> {
        let extents = self.extents;
        if extents.width == 0 || extents.height == 0 {
            return Err(SnapshotError::EmptyMap {
                width: extents.width,
                height: extents.height,
            });
        }
        if i32::try_from(extents.width).is_err() || i32::try_from(extents.height).is_err() {
            return Err(SnapshotError::MapTooLarge {
                width: extents.width,
                height: extents.height,
            });
        }

        let stockpile = Stockpile::new(
            non_negative_stock("gold", self.stockpile.gold)?,
            non_negative_stock("wood", self.stockpile.wood)?,
        );

        let mut seen_units = HashSet::new();
        let mut workers = Vec::new();
        let mut depots = Vec::new();
        for snap in &self.units {
            let id = UnitId(snap.id);
            if !seen_units.insert(id) {
                return Err(SnapshotError::DuplicateUnit(id));
            }
            let position = Position::new(snap.x, snap.y);
            if !extents.contains(position) {
                return Err(SnapshotError::UnitOutOfBounds { unit: id, position });
            }

            let cargo = unit_cargo(id, snap, harvest_yield)?;
            let unit = Unit {
                id,
                position,
                role: snap.role,
                cargo,
            };
            match snap.role {
                UnitRole::Worker => workers.push(unit),
                UnitRole::Depot => depots.push(unit),
            }
        }
        if depots.is_empty() {
            return Err(SnapshotError::MissingDepot);
        }
        if workers.is_empty() {
            return Err(SnapshotError::MissingWorker);
        }

        let mut seen_resources = HashSet::new();
        let mut resources = Vec::new();
        for snap in &self.resources {
            let id = ResourceId(snap.id);
            if !seen_resources.insert(id) {
                return Err(SnapshotError::DuplicateResource(id));
            }
            let position = Position::new(snap.x, snap.y);
            if !extents.contains(position) {
                return Err(SnapshotError::ResourceOutOfBounds {
                    resource: id,
                    position,
                });
            }
            if snap.amount < 0 {
                return Err(SnapshotError::NegativeAmount {
                    resource: id,
                    amount: snap.amount,
                });
            }
            let remaining = u32::try_from(snap.amount).map_err(|_| SnapshotError::AmountTooLarge {
                resource: id,
                amount: snap.amount,
            })?;
            if remaining > 0 {
                resources.push(ResourceNode::new(id, position, snap.kind, remaining));
            }
        }

        workers.sort_by_key(|u| u.id);
        depots.sort_by_key(|u| u.id);
        resources.sort_by_key(|r| r.id);

        let next_unit_id = self
            .units
            .iter()
            .map(|u| u.id)
            .max()
            .map_or(0, |max| max.saturating_add(1));

        Ok(ValidatedWorld {
            extents,
            workers,
            depots,
            resources,
            stockpile,
            next_unit_id,
        })
    }
}

fn non_negative_stock(resource: &'static str, amount: i64) -> Result<u32, SnapshotError> {
    if amount < 0 {
        return Err(SnapshotError::NegativeStockpile { resource, amount });
    }
    u32::try_from(amount).map_err(|_| SnapshotError::StockpileTooLarge { resource, amount })
}

fn unit_cargo(
    id: UnitId,
    snap: &UnitSnapshot,
    harvest_yield: u32,
) -> Result<Option<Cargo>, SnapshotError> {
    let Some((kind, amount)) = snap.cargo else {
        return Ok(None);
    };
    if snap.role == UnitRole::Depot {
        return Err(SnapshotError::InvalidCargo {
            unit: id,
            reason: "depots cannot carry cargo".into(),
        });
    }
    if amount < 0 {
        return Err(SnapshotError::InvalidCargo {
            unit: id,
            reason: format!("negative amount {amount}"),
        });
    }
    if amount > i64::from(harvest_yield) {
        return Err(SnapshotError::InvalidCargo {
            unit: id,
            reason: format!("amount {amount} exceeds harvest yield {harvest_yield}"),
        });
    }
    Ok(u32::try_from(amount)
        .ok()
        .and_then(|amount| Cargo::new(kind, amount)))
}
