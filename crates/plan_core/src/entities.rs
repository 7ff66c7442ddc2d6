//! Planner entities: resource nodes, units, stockpiles and goals.
//!
//! Entities are plain values. Every mutator consumes `self` and returns a
//! new value, so a search node never observes a change made by another.
//! No entity refers to another; "worker at mine" is always recomputed from
//! positions.

use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Identifier for a unit or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a new unit ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Identifier for a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Create a new resource ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Host-side template a depot produces new workers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTemplateId(pub u32);

impl UnitTemplateId {
    /// Create a new template ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Kind of harvestable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Yields gold.
    GoldMine,
    /// Yields wood.
    Tree,
}

impl ResourceKind {
    /// All resource kinds, in planning order.
    pub const ALL: [Self; 2] = [Self::GoldMine, Self::Tree];

    /// The cargo a worker carries after harvesting this kind.
    #[must_use]
    pub const fn cargo_kind(self) -> CargoKind {
        match self {
            Self::GoldMine => CargoKind::Gold,
            Self::Tree => CargoKind::Wood,
        }
    }
}

/// Kind of cargo a worker carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CargoKind {
    /// Gold from a mine.
    Gold,
    /// Wood from a tree.
    Wood,
}

impl CargoKind {
    /// The node kind this cargo comes from.
    #[must_use]
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Gold => ResourceKind::GoldMine,
            Self::Wood => ResourceKind::Tree,
        }
    }
}

/// A non-empty load carried by a worker.
///
/// An empty hand is `Option::<Cargo>::None`, which makes
/// "amount > 0 iff kind is set" hold by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCargo")]
pub struct Cargo {
    kind: CargoKind,
    amount: u32,
}

/// Unchecked wire form of [`Cargo`].
#[derive(Deserialize)]
struct RawCargo {
    kind: CargoKind,
    amount: u32,
}

impl TryFrom<RawCargo> for Cargo {
    type Error = String;

    fn try_from(raw: RawCargo) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.amount).ok_or_else(|| format!("empty {:?} cargo", raw.kind))
    }
}

impl Cargo {
    /// Create a cargo load. Returns `None` for a zero amount.
    #[must_use]
    pub const fn new(kind: CargoKind, amount: u32) -> Option<Self> {
        if amount == 0 {
            None
        } else {
            Some(Self { kind, amount })
        }
    }

    /// Kind of the load.
    #[must_use]
    pub const fn kind(&self) -> CargoKind {
        self.kind
    }

    /// Amount carried, always positive.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }
}

/// A harvestable node as seen in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Node identifier.
    pub id: ResourceId,
    /// Cell the node occupies.
    pub position: Position,
    /// Gold mine or tree.
    pub kind: ResourceKind,
    /// Amount left in the node.
    pub remaining: u32,
}

impl ResourceNode {
    /// Create a new resource node.
    #[must_use]
    pub const fn new(
        id: ResourceId,
        position: Position,
        kind: ResourceKind,
        remaining: u32,
    ) -> Self {
        Self {
            id,
            position,
            kind,
            remaining,
        }
    }

    /// Check if this node is depleted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Take up to `requested` from the node.
    ///
    /// Returns the drained node and the amount actually taken, which is
    /// less than requested when the node is nearly depleted.
    #[must_use]
    pub fn with_amount_consumed(self, requested: u32) -> (Self, u32) {
        let taken = requested.min(self.remaining);
        let node = Self {
            remaining: self.remaining - taken,
            ..self
        };
        (node, taken)
    }
}

/// What a unit is in the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    /// Mobile gatherer.
    Worker,
    /// Fixed structure that accepts deposits and produces workers.
    Depot,
}

/// A worker or depot as seen in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unit identifier.
    pub id: UnitId,
    /// Current cell.
    pub position: Position,
    /// Worker or depot.
    pub role: UnitRole,
    /// Carried load. Always `None` for depots.
    pub cargo: Option<Cargo>,
}

impl Unit {
    /// Create an empty-handed worker.
    #[must_use]
    pub const fn worker(id: UnitId, position: Position) -> Self {
        Self {
            id,
            position,
            role: UnitRole::Worker,
            cargo: None,
        }
    }

    /// Create a depot.
    #[must_use]
    pub const fn depot(id: UnitId, position: Position) -> Self {
        Self {
            id,
            position,
            role: UnitRole::Depot,
            cargo: None,
        }
    }

    /// Check if the unit carries nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cargo.is_none()
    }

    /// The same unit standing on `position`.
    #[must_use]
    pub const fn with_position(self, position: Position) -> Self {
        Self { position, ..self }
    }

    /// The same unit carrying `cargo`.
    #[must_use]
    pub const fn with_cargo(self, cargo: Cargo) -> Self {
        Self {
            cargo: Some(cargo),
            ..self
        }
    }

    /// The same unit with empty hands.
    #[must_use]
    pub const fn without_cargo(self) -> Self {
        Self {
            cargo: None,
            ..self
        }
    }
}

/// Gold and wood banked by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stockpile {
    /// Banked gold.
    pub gold: u32,
    /// Banked wood.
    pub wood: u32,
}

impl Stockpile {
    /// Create a new stockpile.
    #[must_use]
    pub const fn new(gold: u32, wood: u32) -> Self {
        Self { gold, wood }
    }

    /// Amount banked for a resource kind.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::GoldMine => self.gold,
            ResourceKind::Tree => self.wood,
        }
    }

    /// Bank a cargo load.
    #[must_use]
    pub const fn deposit(self, cargo: Cargo) -> Self {
        match cargo.kind {
            CargoKind::Gold => Self {
                gold: self.gold.saturating_add(cargo.amount),
                ..self
            },
            CargoKind::Wood => Self {
                wood: self.wood.saturating_add(cargo.amount),
                ..self
            },
        }
    }

    /// Spend gold if available.
    ///
    /// Returns `None` if the stockpile cannot cover the price.
    #[must_use]
    pub const fn spend_gold(self, price: u32) -> Option<Self> {
        if self.gold >= price {
            Some(Self {
                gold: self.gold - price,
                ..self
            })
        } else {
            None
        }
    }
}

/// Stockpile thresholds that end the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Goal {
    /// Gold that must be banked.
    pub required_gold: u32,
    /// Wood that must be banked.
    pub required_wood: u32,
}

impl Goal {
    /// Create a new goal.
    #[must_use]
    pub const fn new(required_gold: u32, required_wood: u32) -> Self {
        Self {
            required_gold,
            required_wood,
        }
    }

    /// Threshold for a resource kind.
    #[must_use]
    pub const fn required(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::GoldMine => self.required_gold,
            ResourceKind::Tree => self.required_wood,
        }
    }

    /// `max(required - banked, 0)` for a resource kind.
    #[must_use]
    pub const fn deficit(&self, kind: ResourceKind, stockpile: &Stockpile) -> u32 {
        self.required(kind).saturating_sub(stockpile.amount(kind))
    }

    /// Check if both thresholds are met. Depends on the stockpile only.
    #[must_use]
    pub const fn is_met(&self, stockpile: &Stockpile) -> bool {
        stockpile.gold >= self.required_gold && stockpile.wood >= self.required_wood
    }
}
