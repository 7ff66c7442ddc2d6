//! Search nodes: owned snapshots of the planning world.
//!
//! A [`SearchNode`] holds everything needed to test the goal, enumerate
//! operators and estimate remaining cost. Collections are persistent
//! (`im::Vector`), so a successor clones in O(1) and only the entries an
//! operator touches are copied. Nodes are never mutated once handed out;
//! the `pub(crate)` mutators are used only by operator effects on a fresh
//! clone.
//!
//! # Determinism
//!
//! - Workers, depots and resources are kept sorted by id
//! - Operators are enumerated in a fixed order
//! - [`StateKey`] is built from sorted content, never from the operator path

use std::sync::Arc;

use im::Vector;

use crate::config::{DepletionPolicy, PlannerConfig};
use crate::entities::{Cargo, Goal, ResourceId, ResourceKind, ResourceNode, Stockpile, Unit, UnitId};
use crate::error::{PlannerError, Result};
use crate::operators::{Build, Deposit, Harvest, JointAction, MoveToBase, MoveToResource, Operator};
use crate::position::{MapExtents, Position};
use crate::snapshot::WorldSnapshot;

/// Structural identity of a node, used by the closed set.
///
/// Two nodes with equal keys are interchangeable for the rest of the
/// search regardless of how they were reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    workers: Vec<(UnitId, Position, Option<Cargo>)>,
    resources: Vec<(ResourceId, u32)>,
    stockpile: Stockpile,
}

/// One state in the forward search.
#[derive(Debug, Clone)]
pub struct SearchNode {
    extents: MapExtents,
    goal: Goal,
    rules: Arc<PlannerConfig>,
    stockpile: Stockpile,
    workers: Vector<Unit>,
    depots: Vector<Unit>,
    resources: Vector<ResourceNode>,
    cost: u32,
    path: Vector<Operator>,
    next_unit_id: u32,
}

impl SearchNode {
    /// Build the root node from a host snapshot.
    ///
    /// # Errors
    ///
    /// Returns `MalformedSnapshot` if the snapshot fails validation and
    /// `InvalidConfig` if the configuration cannot drive a search.
    pub fn root(snapshot: &WorldSnapshot, goal: Goal, config: &PlannerConfig) -> Result<Self> {
        if config.harvest_yield == 0 {
            return Err(PlannerError::InvalidConfig(
                "harvest_yield must be positive".into(),
            ));
        }
        let world = snapshot.validate(config.harvest_yield)?;

        Ok(Self {
            extents: world.extents,
            goal,
            rules: Arc::new(config.clone()),
            stockpile: world.stockpile,
            workers: world.workers.into_iter().collect(),
            depots: world.depots.into_iter().collect(),
            resources: world.resources.into_iter().collect(),
            cost: 0,
            path: Vector::new(),
            next_unit_id: world.next_unit_id,
        })
    }

    /// Map size.
    #[must_use]
    pub const fn extents(&self) -> MapExtents {
        self.extents
    }

    /// Stockpile thresholds for this search.
    #[must_use]
    pub const fn goal(&self) -> Goal {
        self.goal
    }

    /// Configuration shared by every node of one search.
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.rules
    }

    /// Banked gold and wood.
    #[must_use]
    pub const fn stockpile(&self) -> Stockpile {
        self.stockpile
    }

    /// Workers, sorted by id.
    #[must_use]
    pub fn workers(&self) -> &Vector<Unit> {
        &self.workers
    }

    /// Depots, sorted by id.
    #[must_use]
    pub fn depots(&self) -> &Vector<Unit> {
        &self.depots
    }

    /// Non-depleted resource nodes, sorted by id.
    #[must_use]
    pub fn resources(&self) -> &Vector<ResourceNode> {
        &self.resources
    }

    /// Accumulated path cost `g`.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Operators applied since the root, in execution order.
    #[must_use]
    pub fn path(&self) -> &Vector<Operator> {
        &self.path
    }

    /// Id the next built worker will receive.
    #[must_use]
    pub const fn next_unit_id(&self) -> u32 {
        self.next_unit_id
    }

    /// Look up a worker.
    #[must_use]
    pub fn worker(&self, id: UnitId) -> Option<&Unit> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Look up a depot.
    #[must_use]
    pub fn depot(&self, id: UnitId) -> Option<&Unit> {
        self.depots.iter().find(|d| d.id == id)
    }

    /// Look up a resource node that still holds something.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Depot nearest to `position`, lowest id on ties.
    #[must_use]
    pub fn nearest_depot(&self, position: Position) -> Option<&Unit> {
        self.depots
            .iter()
            .min_by_key(|d| (d.position.chebyshev_distance(position), d.id))
    }

    /// The depot a worker delivers to and departs from.
    #[must_use]
    pub fn home_depot(&self, worker: &Unit) -> Option<&Unit> {
        self.nearest_depot(worker.position)
    }

    /// Node of `kind` nearest to `position`, lowest id on ties.
    #[must_use]
    pub fn nearest_resource(
        &self,
        kind: ResourceKind,
        position: Position,
    ) -> Option<&ResourceNode> {
        self.resources
            .iter()
            .filter(|r| r.kind == kind)
            .min_by_key(|r| (r.position.chebyshev_distance(position), r.id))
    }

    /// Node of `kind` nearest to `position` that a Harvest could draw from
    /// under the active depletion policy.
    #[must_use]
    pub fn nearest_harvestable(
        &self,
        kind: ResourceKind,
        position: Position,
    ) -> Option<&ResourceNode> {
        let min_remaining = match self.rules.depletion {
            DepletionPolicy::Clamp => 1,
            DepletionPolicy::FullYieldOnly => self.rules.harvest_yield,
        };
        self.resources
            .iter()
            .filter(|r| r.kind == kind && r.remaining >= min_remaining)
            .min_by_key(|r| (r.position.chebyshev_distance(position), r.id))
    }

    /// Goal predicate. Reads the stockpile only.
    #[must_use]
    pub fn is_goal(&self) -> bool {
        self.goal.is_met(&self.stockpile)
    }

    /// Whether enough of every required kind exists to ever meet the goal.
    ///
    /// Counts the stockpile, carried cargo and every node's remaining amount.
    /// Building only spends gold, so it never turns an infeasible goal
    /// into a feasible one.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        ResourceKind::ALL.into_iter().all(|kind| {
            let banked = u64::from(self.stockpile.amount(kind));
            let carried: u64 = self
                .workers
                .iter()
                .filter_map(|w| w.cargo)
                .filter(|c| c.kind().resource_kind() == kind)
                .map(|c| u64::from(c.amount()))
                .sum();
            let in_nodes: u64 = self
                .resources
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| u64::from(r.remaining))
                .sum();
            banked + carried + in_nodes >= u64::from(self.goal.required(kind))
        })
    }

    /// Canonical structural key for duplicate detection.
    #[must_use]
    pub fn key(&self) -> StateKey {
        StateKey {
            workers: self
                .workers
                .iter()
                .map(|w| (w.id, w.position, w.cargo))
                .collect(),
            resources: self.resources.iter().map(|r| (r.id, r.remaining)).collect(),
            stockpile: self.stockpile,
        }
    }

    /// Every operator whose precondition holds in this node.
    ///
    /// Per worker: one move per resource class, one move to base, one
    /// harvest per node in reach, one deposit per depot in reach. Then one
    /// build per depot if building is enabled, then joint moves if enabled.
    #[must_use]
    pub fn applicable_operators(&self) -> Vec<Operator> {
        let mut ops = Vec::new();

        for worker in &self.workers {
            for kind in ResourceKind::ALL {
                if let Some(op) = MoveToResource::new(self, worker.id, kind) {
                    push_if_applicable(&mut ops, self, Operator::MoveToResource(op));
                }
            }
            if let Some(op) = MoveToBase::new(self, worker.id) {
                push_if_applicable(&mut ops, self, Operator::MoveToBase(op));
            }
            for resource in &self.resources {
                if let Some(op) = Harvest::new(self, worker.id, resource.id) {
                    push_if_applicable(&mut ops, self, Operator::Harvest(op));
                }
            }
            for depot in &self.depots {
                if let Some(op) = Deposit::new(self, worker.id, depot.id) {
                    push_if_applicable(&mut ops, self, Operator::Deposit(op));
                }
            }
        }

        if self.rules.build.enabled {
            for depot in &self.depots {
                if let Some(op) = Build::new(self, depot.id) {
                    push_if_applicable(&mut ops, self, Operator::Build(op));
                }
            }
        }

        if self.rules.joint_moves {
            for kind in ResourceKind::ALL {
                if let Some(op) = self.joint_departure(kind) {
                    push_if_applicable(&mut ops, self, Operator::Joint(op));
                }
            }
        }

        ops
    }

    /// Apply every applicable operator, one child each.
    ///
    /// # Errors
    ///
    /// Propagates a `PreconditionViolation`, which indicates a bug in
    /// operator enumeration.
    pub fn successors(&self) -> Result<Vec<SearchNode>> {
        self.applicable_operators()
            .iter()
            .map(|op| op.apply(self))
            .collect()
    }

    /// All idle, empty-handed workers at their depot leaving together.
    fn joint_departure(&self, kind: ResourceKind) -> Option<JointAction> {
        let moves: Vec<Operator> = self
            .workers
            .iter()
            .filter(|w| w.is_empty())
            .filter_map(|w| MoveToResource::new(self, w.id, kind))
            .map(Operator::MoveToResource)
            .filter(|op| op.precondition(self))
            .collect();
        if moves.len() < 2 {
            return None;
        }
        JointAction::new(moves).ok()
    }

    /// Check the invariants that must hold between a node and its child.
    ///
    /// Used by validation builds of the search and by plan replay in tests.
    ///
    /// # Errors
    ///
    /// Returns a description of the first broken invariant.
    pub fn check_successor(&self, child: &SearchNode) -> std::result::Result<(), String> {
        if child.cost < self.cost {
            return Err(format!("cost decreased from {} to {}", self.cost, child.cost));
        }
        if child.path.len() != self.path.len() + 1 {
            return Err(format!(
                "path grew from {} to {} steps",
                self.path.len(),
                child.path.len()
            ));
        }
        for node in &child.resources {
            match self.resource(node.id) {
                Some(before) if node.remaining <= before.remaining => {}
                Some(before) => {
                    return Err(format!(
                        "{} grew from {} to {}",
                        node.id, before.remaining, node.remaining
                    ))
                }
                None => return Err(format!("{} reappeared", node.id)),
            }
            if node.remaining == 0 {
                return Err(format!("{} kept in the active set while depleted", node.id));
            }
        }
        let harvest_yield = self.rules.harvest_yield;
        for worker in &child.workers {
            if let Some(cargo) = worker.cargo {
                if cargo.amount() > harvest_yield {
                    return Err(format!(
                        "{} carries {} (> yield {harvest_yield})",
                        worker.id,
                        cargo.amount()
                    ));
                }
            }
            if !child.extents.contains(worker.position) {
                return Err(format!("{} left the map at {}", worker.id, worker.position));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Effects. Only called by operators on a freshly cloned node.
    // ------------------------------------------------------------------

    pub(crate) fn replace_worker(&mut self, unit: Unit) {
        if let Some(index) = self.workers.iter().position(|w| w.id == unit.id) {
            self.workers.set(index, unit);
        }
    }

    pub(crate) fn add_worker(&mut self, unit: Unit) {
        let index = self.workers.iter().position(|w| w.id > unit.id);
        match index {
            Some(index) => self.workers.insert(index, unit),
            None => self.workers.push_back(unit),
        }
        self.next_unit_id = self.next_unit_id.max(unit.id.0.saturating_add(1));
    }

    /// Store a drained node, dropping it once depleted.
    pub(crate) fn replace_resource(&mut self, node: ResourceNode) {
        if let Some(index) = self.resources.iter().position(|r| r.id == node.id) {
            if node.is_depleted() {
                self.resources.remove(index);
            } else {
                self.resources.set(index, node);
            }
        }
    }

    pub(crate) fn set_stockpile(&mut self, stockpile: Stockpile) {
        self.stockpile = stockpile;
    }

    pub(crate) fn record(&mut self, op: Operator, cost: u32) {
        self.cost = self.cost.saturating_add(cost);
        self.path.push_back(op);
    }
}

fn push_if_applicable(ops: &mut Vec<Operator>, node: &SearchNode, op: Operator) {
    if op.precondition(node) {
        ops.push(op);
    }
}
