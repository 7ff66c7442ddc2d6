//! STRIPS operators over [`SearchNode`]s.
//!
//! Each operator is ground: it names the acting unit, its target and the
//! cells involved, all resolved against the node it was built from. An
//! operator has a precondition, a non-negative cost and an effect.
//! Applying it never mutates the parent; the effect runs on a clone.
//!
//! Move costs are the Chebyshev distances a host pathfinder would cover on
//! an open grid. Harvest and Deposit cost one step each. Build is free.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DepletionPolicy;
use crate::entities::{Cargo, ResourceId, ResourceKind, Unit, UnitId, UnitTemplateId};
use crate::error::{PlannerError, Result};
use crate::position::Position;
use crate::state::SearchNode;

/// Failure reason for a precondition or effect.
type Check = std::result::Result<(), &'static str>;

/// Search cost of a Harvest.
pub const HARVEST_COST: u32 = 1;

/// Search cost of a Deposit.
pub const DEPOSIT_COST: u32 = 1;

/// Send an empty worker from its depot to the nearest node of a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveToResource {
    /// Acting worker.
    pub unit: UnitId,
    /// Resource class requested.
    pub kind: ResourceKind,
    /// Harvestable node nearest to the depot.
    pub resource: ResourceId,
    /// Depot the worker departs from.
    pub depot: UnitId,
    /// Worker cell when the operator was built.
    pub from: Position,
    /// Cell of the target node.
    pub target: Position,
    /// Free cell next to the node where the worker ends up.
    pub destination: Position,
    /// Depot-to-node distance minus one.
    pub cost: u32,
}

impl MoveToResource {
    /// Resolve the move for `unit` toward the nearest `kind` node.
    ///
    /// The node is the one nearest to the worker's depot among those a
    /// Harvest could draw from. Returns `None` if the worker, its depot or
    /// any such node is missing.
    #[must_use]
    pub fn new(node: &SearchNode, unit: UnitId, kind: ResourceKind) -> Option<Self> {
        let worker = node.worker(unit)?;
        let depot = node.home_depot(worker)?;
        let target = node.nearest_harvestable(kind, depot.position)?;
        let destination = node
            .extents()
            .closest_neighbor(target.position, worker.position)?;

        Some(Self {
            unit,
            kind,
            resource: target.id,
            depot: depot.id,
            from: worker.position,
            target: target.position,
            destination,
            cost: depot
                .position
                .chebyshev_distance(target.position)
                .saturating_sub(1),
        })
    }

    fn check(&self, node: &SearchNode) -> Check {
        let worker = acting_worker(node, self.unit, self.from)?;
        let depot = node.home_depot(worker).ok_or("no depot")?;
        if !worker.position.is_adjacent(depot.position) {
            return Err("unit not adjacent to its depot");
        }
        if node.resource(self.resource).is_none() {
            return Err("resource depleted");
        }
        Ok(())
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        let worker = *node.worker(self.unit).ok_or("worker not found")?;
        node.replace_worker(worker.with_position(self.destination));
        Ok(())
    }
}

/// Send a worker back next to its depot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveToBase {
    /// Acting worker.
    pub unit: UnitId,
    /// Depot nearest to the worker.
    pub depot: UnitId,
    /// Worker cell when the operator was built.
    pub from: Position,
    /// Cell of the depot.
    pub target: Position,
    /// Free cell next to the depot where the worker ends up.
    pub destination: Position,
    /// Worker-to-depot distance.
    pub cost: u32,
}

impl MoveToBase {
    /// Resolve the move home for `unit`.
    ///
    /// Returns `None` if the worker or every depot is missing.
    #[must_use]
    pub fn new(node: &SearchNode, unit: UnitId) -> Option<Self> {
        let worker = node.worker(unit)?;
        let depot = node.home_depot(worker)?;
        let destination = node
            .extents()
            .closest_neighbor(depot.position, worker.position)?;

        Some(Self {
            unit,
            depot: depot.id,
            from: worker.position,
            target: depot.position,
            destination,
            cost: worker.position.chebyshev_distance(depot.position),
        })
    }

    fn check(&self, node: &SearchNode) -> Check {
        let worker = acting_worker(node, self.unit, self.from)?;
        let depot = node.home_depot(worker).ok_or("no depot")?;
        if worker.position.is_adjacent(depot.position) {
            return Err("unit already adjacent to its depot");
        }
        Ok(())
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        let worker = *node.worker(self.unit).ok_or("worker not found")?;
        node.replace_worker(worker.with_position(self.destination));
        Ok(())
    }
}

/// Take one yield from an adjacent node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Harvest {
    /// Acting worker.
    pub unit: UnitId,
    /// Node harvested.
    pub resource: ResourceId,
    /// Kind of the node.
    pub kind: ResourceKind,
    /// Worker cell.
    pub from: Position,
    /// Node cell.
    pub at: Position,
}

impl Harvest {
    /// Resolve a harvest of `resource` by `unit`.
    #[must_use]
    pub fn new(node: &SearchNode, unit: UnitId, resource: ResourceId) -> Option<Self> {
        let worker = node.worker(unit)?;
        let target = node.resource(resource)?;
        Some(Self {
            unit,
            resource,
            kind: target.kind,
            from: worker.position,
            at: target.position,
        })
    }

    fn check(&self, node: &SearchNode) -> Check {
        let worker = acting_worker(node, self.unit, self.from)?;
        let target = node.resource(self.resource).ok_or("resource depleted")?;
        if target.kind != self.kind {
            return Err("resource kind changed");
        }
        if !worker.position.is_adjacent(target.position) {
            return Err("unit not adjacent to resource");
        }
        if !worker.is_empty() {
            return Err("unit already carrying");
        }
        if node.goal().deficit(self.kind, &node.stockpile()) == 0 {
            return Err("stockpile already meets requirement");
        }
        if node.config().depletion == DepletionPolicy::FullYieldOnly
            && target.remaining < node.config().harvest_yield
        {
            return Err("resource holds less than one yield");
        }
        Ok(())
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        let worker = *node.worker(self.unit).ok_or("worker not found")?;
        let target = *node.resource(self.resource).ok_or("resource depleted")?;
        let (drained, taken) = target.with_amount_consumed(node.config().harvest_yield);
        let cargo = Cargo::new(self.kind.cargo_kind(), taken).ok_or("resource depleted")?;

        node.replace_resource(drained);
        node.replace_worker(worker.with_cargo(cargo));
        Ok(())
    }
}

/// Bank a worker's cargo at an adjacent depot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deposit {
    /// Acting worker.
    pub unit: UnitId,
    /// Receiving depot.
    pub depot: UnitId,
    /// Worker cell.
    pub from: Position,
    /// Depot cell.
    pub at: Position,
}

impl Deposit {
    /// Resolve a deposit by `unit` into `depot`.
    #[must_use]
    pub fn new(node: &SearchNode, unit: UnitId, depot: UnitId) -> Option<Self> {
        let worker = node.worker(unit)?;
        let target = node.depot(depot)?;
        Some(Self {
            unit,
            depot,
            from: worker.position,
            at: target.position,
        })
    }

    fn check(&self, node: &SearchNode) -> Check {
        let worker = acting_worker(node, self.unit, self.from)?;
        let depot = node.depot(self.depot).ok_or("depot not found")?;
        if !worker.position.is_adjacent(depot.position) {
            return Err("unit not adjacent to depot");
        }
        if worker.is_empty() {
            return Err("unit carries nothing");
        }
        Ok(())
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        let worker = *node.worker(self.unit).ok_or("worker not found")?;
        let cargo = worker.cargo.ok_or("unit carries nothing")?;
        node.set_stockpile(node.stockpile().deposit(cargo));
        node.replace_worker(worker.without_cargo());
        Ok(())
    }
}

/// Produce a new worker at a depot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Build {
    /// Producing depot.
    pub depot: UnitId,
    /// Depot cell, where the new worker appears.
    pub at: Position,
    /// Id the new worker receives.
    pub unit: UnitId,
    /// Host template to produce.
    pub template: UnitTemplateId,
    /// Gold spent.
    pub price: u32,
    /// Search cost.
    pub cost: u32,
}

impl Build {
    /// Resolve a build at `depot` using the node's build rules.
    #[must_use]
    pub fn new(node: &SearchNode, depot: UnitId) -> Option<Self> {
        let target = node.depot(depot)?;
        let rules = node.config().build;
        Some(Self {
            depot,
            at: target.position,
            unit: UnitId(node.next_unit_id()),
            template: rules.template,
            price: rules.price,
            cost: rules.cost,
        })
    }

    fn check(&self, node: &SearchNode) -> Check {
        if node.depot(self.depot).is_none() {
            return Err("depot not found");
        }
        if node.workers().len() >= node.config().build.worker_cap {
            return Err("worker cap reached");
        }
        if node.stockpile().gold < self.price {
            return Err("not enough gold");
        }
        if node.worker(self.unit).is_some() {
            return Err("new unit id already in use");
        }
        Ok(())
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        let stockpile = node.stockpile().spend_gold(self.price).ok_or("not enough gold")?;
        node.set_stockpile(stockpile);
        node.add_worker(Unit::worker(self.unit, self.at));
        Ok(())
    }
}

/// Operators for distinct units executed in one step.
///
/// All sub-preconditions are checked against the same parent. Effects are
/// applied in order and the step costs as much as its slowest member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointAction {
    actions: Vec<Operator>,
    cost: u32,
}

impl JointAction {
    /// Combine operators into one step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperator` for an empty list, a nested joint action,
    /// two operators acting on the same unit, or more than one Build.
    pub fn new(actions: Vec<Operator>) -> Result<Self> {
        if actions.is_empty() {
            return Err(PlannerError::InvalidOperator("empty joint action".into()));
        }
        let mut actors = Vec::with_capacity(actions.len());
        let mut builds = 0;
        for action in &actions {
            match action {
                Operator::Joint(_) => {
                    return Err(PlannerError::InvalidOperator("nested joint action".into()))
                }
                Operator::Build(_) => builds += 1,
                _ => {}
            }
            let actor = action.actor();
            if actors.contains(&actor) {
                return Err(PlannerError::InvalidOperator(format!(
                    "{actor} acts twice in one joint action"
                )));
            }
            actors.push(actor);
        }
        if builds > 1 {
            return Err(PlannerError::InvalidOperator(
                "more than one build in a joint action".into(),
            ));
        }

        let cost = actions.iter().map(Operator::cost).max().unwrap_or(0);
        Ok(Self { actions, cost })
    }

    /// Member operators, in application order.
    #[must_use]
    pub fn actions(&self) -> &[Operator] {
        &self.actions
    }

    /// Maximum member cost.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    fn check(&self, node: &SearchNode) -> Check {
        self.actions.iter().try_for_each(|action| action.check(node))
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        self.actions.iter().try_for_each(|action| action.effect(node))
    }
}

/// A ground planning operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Depot to nearest node of a kind.
    MoveToResource(MoveToResource),
    /// Back next to the depot.
    MoveToBase(MoveToBase),
    /// Fill empty hands from an adjacent node.
    Harvest(Harvest),
    /// Bank carried cargo.
    Deposit(Deposit),
    /// Produce a worker.
    Build(Build),
    /// Several of the above at once.
    Joint(JointAction),
}

impl Operator {
    /// Short operator name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveToResource(_) => "MoveToResource",
            Self::MoveToBase(_) => "MoveToBase",
            Self::Harvest(_) => "Harvest",
            Self::Deposit(_) => "Deposit",
            Self::Build(_) => "Build",
            Self::Joint(_) => "JointAction",
        }
    }

    /// The unit that acts. For Build this is the depot; for a joint action
    /// it is the first member's actor.
    #[must_use]
    pub fn actor(&self) -> UnitId {
        match self {
            Self::MoveToResource(op) => op.unit,
            Self::MoveToBase(op) => op.unit,
            Self::Harvest(op) => op.unit,
            Self::Deposit(op) => op.unit,
            Self::Build(op) => op.depot,
            Self::Joint(op) => op.actions.first().map_or(UnitId(0), Operator::actor),
        }
    }

    /// Search cost of the step.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        match self {
            Self::MoveToResource(op) => op.cost,
            Self::MoveToBase(op) => op.cost,
            Self::Harvest(_) => HARVEST_COST,
            Self::Deposit(_) => DEPOSIT_COST,
            Self::Build(op) => op.cost,
            Self::Joint(op) => op.cost,
        }
    }

    /// Check whether the operator applies to `node`.
    #[must_use]
    pub fn precondition(&self, node: &SearchNode) -> bool {
        self.check(node).is_ok()
    }

    /// Produce the successor node.
    ///
    /// The parent is left untouched. The child's cost grows by
    /// [`Operator::cost`] and its path gains this operator.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the precondition does not hold.
    pub fn apply(&self, parent: &SearchNode) -> Result<SearchNode> {
        self.check(parent).map_err(|reason| self.violation(reason))?;

        let mut child = parent.clone();
        self.effect(&mut child)
            .map_err(|reason| self.violation(reason))?;
        child.record(self.clone(), self.cost());
        Ok(child)
    }

    fn check(&self, node: &SearchNode) -> Check {
        match self {
            Self::MoveToResource(op) => op.check(node),
            Self::MoveToBase(op) => op.check(node),
            Self::Harvest(op) => op.check(node),
            Self::Deposit(op) => op.check(node),
            Self::Build(op) => op.check(node),
            Self::Joint(op) => op.check(node),
        }
    }

    fn effect(&self, node: &mut SearchNode) -> Check {
        match self {
            Self::MoveToResource(op) => op.effect(node),
            Self::MoveToBase(op) => op.effect(node),
            Self::Harvest(op) => op.effect(node),
            Self::Deposit(op) => op.effect(node),
            Self::Build(op) => op.effect(node),
            Self::Joint(op) => op.effect(node),
        }
    }

    fn violation(&self, reason: &str) -> PlannerError {
        PlannerError::PreconditionViolation {
            operator: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveToResource(op) => write!(
                f,
                "MoveToResource({}, {:?} {} at {}, to {}, cost {})",
                op.unit, op.kind, op.resource, op.target, op.destination, op.cost
            ),
            Self::MoveToBase(op) => write!(
                f,
                "MoveToBase({}, {} at {}, to {}, cost {})",
                op.unit, op.depot, op.target, op.destination, op.cost
            ),
            Self::Harvest(op) => write!(f, "Harvest({}, {:?} {})", op.unit, op.kind, op.resource),
            Self::Deposit(op) => write!(f, "Deposit({}, {})", op.unit, op.depot),
            Self::Build(op) => write!(f, "Build({} -> {}, {} gold)", op.depot, op.unit, op.price),
            Self::Joint(op) => {
                write!(f, "JointAction[")?;
                for (i, action) in op.actions.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{action}")?;
                }
                write!(f, "], cost {}", op.cost)
            }
        }
    }
}

/// The acting worker, which must still stand where the operator was built.
fn acting_worker(
    node: &SearchNode,
    unit: UnitId,
    from: Position,
) -> std::result::Result<&Unit, &'static str> {
    let worker = node.worker(unit).ok_or("worker not found")?;
    if worker.position != from {
        return Err("unit moved since the operator was built");
    }
    Ok(worker)
}
