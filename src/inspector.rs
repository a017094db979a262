// src/inspector.rs
//! Граф соседства территорий и компоненты связности
//!
//! Две области — соседи, если у них есть общий отрезок границы: пара соседних
//! id точек в кольце, без учёта направления. Сначала строится полный индекс
//! `отрезок -> области`, и только потом по нему извлекаются соседи, поэтому
//! порядок областей на результат не влияет.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;

use crate::model::{Area, ObjectId};

/// id области -> id соседних областей
pub type NeighborGraph = BTreeMap<ObjectId, BTreeSet<ObjectId>>;

/// id области -> номер компоненты связности
pub type ComponentMap = BTreeMap<ObjectId, usize>;

/// Граф соседства и разбиение на компоненты, всегда вычисляются вместе
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaRelations {
    pub neighbors: NeighborGraph,
    pub components: ComponentMap,
}

impl AreaRelations {
    /// Число рёбер графа соседства
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Участники каждой компоненты
    #[must_use]
    pub fn component_members(&self) -> BTreeMap<usize, Vec<ObjectId>> {
        let mut members: BTreeMap<usize, Vec<ObjectId>> = BTreeMap::new();
        for (&area, &component) in &self.components {
            members.entry(component).or_default().push(area);
        }
        members
    }

    /// Граф соседства в виде `petgraph` для обходов и экспорта
    #[must_use]
    pub fn to_graph(&self) -> UnGraph<ObjectId, ()> {
        let mut graph = UnGraph::new_undirected();
        let id_to_node: HashMap<ObjectId, NodeIndex> = self
            .neighbors
            .keys()
            .map(|&id| (id, graph.add_node(id)))
            .collect();

        for (&a, others) in &self.neighbors {
            for &b in others.iter().filter(|&&b| a < b) {
                graph.add_edge(id_to_node[&a], id_to_node[&b], ());
            }
        }
        graph
    }
}

/// Строит граф соседства и компоненты связности для набора областей
#[must_use]
pub fn inspect(areas: &[Area]) -> AreaRelations {
    // Фаза 1: индекс отрезков
    let mut index: HashMap<(ObjectId, ObjectId), Vec<usize>> = HashMap::new();
    for (i, area) in areas.iter().enumerate() {
        for ring in area.rings() {
            for (a, b) in ring.segments() {
                if a == b {
                    continue;
                }
                let owners = index.entry(segment_key(a, b)).or_default();
                if owners.last() != Some(&i) {
                    owners.push(i);
                }
            }
        }
    }

    // Фаза 2: пары соседей
    let mut neighbors: NeighborGraph = areas.iter().map(|a| (a.id, BTreeSet::new())).collect();
    let mut sets = UnionFind::<usize>::new(areas.len());
    let mut edges = HashSet::new();

    for owners in index.values().filter(|o| o.len() > 1) {
        for (k, &i) in owners.iter().enumerate() {
            for &j in &owners[k + 1..] {
                let (a, b) = (areas[i].id, areas[j].id);
                if a == b || !edges.insert(segment_key(a, b)) {
                    continue;
                }
                neighbors.entry(a).or_default().insert(b);
                neighbors.entry(b).or_default().insert(a);
                sets.union(i, j);
            }
        }
    }

    // Номера компонент по порядку первого появления
    let mut labels: HashMap<usize, usize> = HashMap::new();
    let components: ComponentMap = areas
        .iter()
        .enumerate()
        .map(|(i, area)| {
            let root = sets.find(i);
            let next = labels.len();
            (area.id, *labels.entry(root).or_insert(next))
        })
        .collect();

    tracing::debug!(
        areas = areas.len(),
        segments = index.len(),
        components = labels.len(),
        "inspected area relations"
    );

    AreaRelations {
        neighbors,
        components,
    }
}

fn segment_key(a: ObjectId, b: ObjectId) -> (ObjectId, ObjectId) {
    if a < b { (a, b) } else { (b, a) }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Polygon, Ring};

    /// Квадратная область по четырём id углов (против часовой)
    pub(crate) fn square_area(id: ObjectId, corners: [ObjectId; 4]) -> Area {
        let [a, b, c, d] = corners;
        Area {
            id,
            relation: 100 + id,
            level: 4,
            name: None,
            polygons: vec![Polygon {
                outer: Ring(vec![a, b, c, d, a]),
                inners: Vec::new(),
            }],
            members: Vec::new(),
        }
    }

    /// Сетка 2x2: точки 1..=9 построчно снизу вверх
    pub(crate) fn grid() -> Vec<Area> {
        vec![
            square_area(0, [1, 2, 5, 4]),
            square_area(1, [2, 3, 6, 5]),
            square_area(2, [4, 5, 8, 7]),
            square_area(3, [5, 6, 9, 8]),
        ]
    }

    #[test]
    fn grid_forms_a_four_cycle() {
        let relations = inspect(&grid());
        assert_eq!(relations.edge_count(), 4);
        assert_eq!(relations.neighbors[&0], BTreeSet::from([1, 2]));
        assert_eq!(relations.neighbors[&3], BTreeSet::from([1, 2]));
        assert_eq!(relations.component_count(), 1);
    }

    #[test]
    fn adjacency_is_symmetric() {
        let relations = inspect(&grid());
        for (a, others) in &relations.neighbors {
            for b in others {
                assert!(relations.neighbors[b].contains(a));
            }
        }
    }

    #[test]
    fn corner_contact_is_not_adjacency() {
        // 0 и 3 касаются только в точке 5
        let relations = inspect(&grid());
        assert!(!relations.neighbors[&0].contains(&3));
    }

    #[test]
    fn order_does_not_matter() {
        let mut reversed = grid();
        reversed.reverse();
        assert_eq!(inspect(&grid()).neighbors, inspect(&reversed).neighbors);
    }

    #[test]
    fn separate_islands_are_separate_components() {
        let mut areas = grid();
        areas.push(square_area(4, [20, 21, 22, 23]));
        let relations = inspect(&areas);
        assert_eq!(relations.component_count(), 2);
        assert!(relations.neighbors[&4].is_empty());
        // каждая область ровно в одной компоненте
        assert_eq!(relations.components.len(), areas.len());
        let members = relations.component_members();
        assert_eq!(members.values().map(Vec::len).sum::<usize>(), areas.len());
        assert_eq!(members[&relations.components[&4]], vec![4]);
    }

    #[test]
    fn petgraph_view_matches() {
        let graph = inspect(&grid()).to_graph();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
    }
}
