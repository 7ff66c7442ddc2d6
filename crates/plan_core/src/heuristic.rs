//! Remaining-cost estimates for A*.
//!
//! The heuristic is a strategy behind the [`Heuristic`] trait so callers can
//! trade plan quality for search speed. Every estimate is zero on a goal
//! node and depends only on the node, never on the path that reached it.

use crate::config::HeuristicKind;
use crate::entities::ResourceKind;
use crate::state::SearchNode;

/// Estimate of the cost still needed to reach the goal.
pub trait Heuristic: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Non-negative estimate for `node`.
    fn estimate(&self, node: &SearchNode) -> u32;
}

/// Build the heuristic a config asks for.
#[must_use]
pub fn for_kind(kind: HeuristicKind) -> Box<dyn Heuristic> {
    match kind {
        HeuristicKind::TripDistance => Box::new(TripDistance),
        HeuristicKind::HarvestLowerBound => Box::new(HarvestLowerBound),
        HeuristicKind::Zero => Box::new(ZeroHeuristic),
    }
}

/// Round trips still needed for one kind.
fn trips_needed(node: &SearchNode, kind: ResourceKind) -> u32 {
    let deficit = node.goal().deficit(kind, &node.stockpile());
    deficit.div_ceil(node.config().harvest_yield.max(1))
}

/// Distance-weighted trip count.
///
/// For each kind with a deficit: the largest node-to-nearest-depot distance
/// of that kind, times two legs per remaining trip, plus one leg if an empty
/// worker already stands at a node of that kind. Guides the search quickly
/// but overestimates, so plans may be suboptimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripDistance;

impl TripDistance {
    fn farthest_node(node: &SearchNode, kind: ResourceKind) -> u32 {
        node.resources()
            .iter()
            .filter(|r| r.kind == kind)
            .filter_map(|r| {
                node.nearest_depot(r.position)
                    .map(|d| d.position.chebyshev_distance(r.position))
            })
            .max()
            .unwrap_or(0)
    }

    fn worker_at(node: &SearchNode, kind: ResourceKind) -> bool {
        node.workers().iter().filter(|w| w.is_empty()).any(|w| {
            node.resources()
                .iter()
                .any(|r| r.kind == kind && w.position.is_adjacent(r.position))
        })
    }
}

impl Heuristic for TripDistance {
    fn name(&self) -> &'static str {
        "trip-distance"
    }

    fn estimate(&self, node: &SearchNode) -> u32 {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let trips = trips_needed(node, kind);
                if trips == 0 {
                    return 0;
                }
                let legs = trips
                    .saturating_mul(2)
                    .saturating_add(u32::from(Self::worker_at(node, kind)));
                Self::farthest_node(node, kind).saturating_mul(legs)
            })
            .fold(0, u32::saturating_add)
    }
}

/// Harvest and deposit count.
///
/// Each remaining trip needs one Deposit, and one Harvest unless a worker
/// already carries a load of that kind. Both cost one step and are never
/// merged by generated joint actions, so the estimate never exceeds the
/// true remaining cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestLowerBound;

impl Heuristic for HarvestLowerBound {
    fn name(&self) -> &'static str {
        "harvest-lower-bound"
    }

    fn estimate(&self, node: &SearchNode) -> u32 {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                let trips = trips_needed(node, kind);
                let carried = node
                    .workers()
                    .iter()
                    .filter_map(|w| w.cargo)
                    .filter(|c| c.kind().resource_kind() == kind)
                    .count();
                let carried = u32::try_from(carried).unwrap_or(u32::MAX);
                trips.saturating_add(trips.saturating_sub(carried))
            })
            .fold(0, u32::saturating_add)
    }
}

/// Always zero. Turns A* into uniform-cost search.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn name(&self) -> &'static str {
        "zero"
    }

    fn estimate(&self, _node: &SearchNode) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::entities::{CargoKind, Goal};
    use crate::snapshot::{ResourceSnapshot, UnitSnapshot, WorldSnapshot};

    fn node(worker: UnitSnapshot, goal: Goal, stock: (i64, i64)) -> SearchNode {
        let snap = WorldSnapshot::new(10, 10)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(worker)
            .with_resource(ResourceSnapshot::new(10, 3, 0, ResourceKind::GoldMine, 1000))
            .with_resource(ResourceSnapshot::new(11, 5, 5, ResourceKind::GoldMine, 1000))
            .with_resource(ResourceSnapshot::new(20, 0, 4, ResourceKind::Tree, 1000))
            .with_stockpile(stock.0, stock.1);
        SearchNode::root(&snap, goal, &PlannerConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_at_goal() {
        let goal_node = node(UnitSnapshot::worker(2, 0, 0), Goal::new(100, 100), (100, 100));
        assert!(goal_node.is_goal());
        for kind in [
            HeuristicKind::TripDistance,
            HeuristicKind::HarvestLowerBound,
            HeuristicKind::Zero,
        ] {
            assert_eq!(for_kind(kind).estimate(&goal_node), 0);
        }
    }

    #[test]
    fn test_trip_distance() {
        // Gold: farthest mine at distance 5, two trips -> 5 * 4
        // Wood: tree at distance 4, one trip -> 4 * 2
        let n = node(UnitSnapshot::worker(2, 0, 0), Goal::new(200, 100), (0, 0));
        assert_eq!(TripDistance.estimate(&n), 28);

        // Empty worker next to the tree adds one leg for wood
        let n = node(UnitSnapshot::worker(2, 0, 3), Goal::new(200, 100), (0, 0));
        assert_eq!(TripDistance.estimate(&n), 20 + 12);
    }

    #[test]
    fn test_trip_distance_rounds_partial_trips_up() {
        let n = node(UnitSnapshot::worker(2, 0, 0), Goal::new(150, 0), (0, 0));
        assert_eq!(TripDistance.estimate(&n), 5 * 4);
    }

    #[test]
    fn test_harvest_lower_bound() {
        let n = node(UnitSnapshot::worker(2, 0, 0), Goal::new(200, 0), (0, 0));
        assert_eq!(HarvestLowerBound.estimate(&n), 4);

        // A carried load saves one harvest
        let loaded = UnitSnapshot::worker(2, 0, 0).carrying(CargoKind::Gold, 100);
        let n = node(loaded, Goal::new(200, 0), (0, 0));
        assert_eq!(HarvestLowerBound.estimate(&n), 3);
    }

    #[test]
    fn test_names() {
        assert_eq!(for_kind(HeuristicKind::TripDistance).name(), "trip-distance");
        assert_eq!(for_kind(HeuristicKind::Zero).name(), "zero");
    }
}
