// src/assembler/composite.rs
//! Бонусные регионы
//!
//! Бонусный регион собирается так же, как территория, из собственных линий
//! отношения. Если они не замыкаются (или у отношения их нет), но отношение
//! перечисляет дочерние отношения, геометрия строится как объединение уже
//! собранных территорий этих отношений:
//! - все отрезки колец участников складываются в один набор;
//! - отрезок, встретившийся ровно в двух участниках, — внутренняя граница, он сокращается;
//! - оставшиеся направленные отрезки снова замыкаются в кольца.
//!
//! Кольца с положительной ориентацией становятся внешними, с отрицательной — дырами,
//! поэтому несвязные участники дают несколько многоугольников.

use std::collections::{BTreeSet, HashMap};

use crate::assembler::{
    AreaAssembler, Assembly, AssemblySource, build_polygons, next_area_id, probe_point, ring,
};
use crate::model::geometry::{ring_contains, signed_area};
use crate::model::{Area, Level, ObjectId, PointTable, Polygon, Relation};

/// Собирает бонусные регионы поверх уже собранных территорий
#[derive(Debug, Clone, Copy)]
pub struct CompositeAreaAssembler<'a> {
    source: AssemblySource<'a>,
    /// нижняя граница для id новых областей
    first_id: ObjectId,
}

impl<'a> CompositeAreaAssembler<'a> {
    #[must_use]
    pub fn new(source: AssemblySource<'a>) -> Self {
        Self { source, first_id: 0 }
    }

    /// Не выдавать id меньше `first_id`, даже если области с такими id
    /// уже удалены (например, фильтром)
    #[must_use]
    pub fn starting_at(mut self, first_id: ObjectId) -> Self {
        self.first_id = first_id;
        self
    }

    /// Все отношения ниже данного по дереву `subareas` (дети, внуки и т.д.)
    fn descendants(&self, relation: &Relation) -> BTreeSet<ObjectId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<ObjectId> = relation.subareas.clone();
        while let Some(id) = stack.pop() {
            if id == relation.id || !seen.insert(id) {
                continue;
            }
            if let Some(child) = self.source.relations.get(&id) {
                stack.extend(&child.subareas);
            }
        }
        seen
    }

    fn assemble_relation(&self, relation: &Relation, territories: &[Area]) -> Option<(Vec<Polygon>, Vec<ObjectId>)> {
        if let Some(polygons) = self.source.relation_polygons(relation) {
            let members = territories
                .iter()
                .filter(|t| lies_within(t, &polygons, self.source.points))
                .map(|t| t.id)
                .collect();
            return Some((polygons, members));
        }

        let descendants = self.descendants(relation);
        let members: Vec<&Area> = territories
            .iter()
            .filter(|t| descendants.contains(&t.relation))
            .collect();
        if members.is_empty() {
            return None;
        }
        let polygons = union_polygons(&members, self.source.points)?;
        Some((polygons, members.iter().map(|t| t.id).collect()))
    }
}

impl AreaAssembler for CompositeAreaAssembler<'_> {
    fn assemble(&self, existing: &[Area], levels: &[Level]) -> Assembly {
        let mut assembly = Assembly::default();
        let mut next_id = next_area_id(existing).max(self.first_id);
        let territories: Vec<Area> = existing
            .iter()
            .filter(|a| a.members.is_empty() && !levels.contains(&a.level))
            .cloned()
            .collect();

        for relation in self.source.relations_at(levels) {
            match self.assemble_relation(relation, &territories) {
                Some((polygons, members)) => {
                    if members.is_empty() {
                        tracing::debug!(relation = relation.id, "bonus region without territories");
                    }
                    assembly.areas.push(Area {
                        id: next_id,
                        relation: relation.id,
                        level: relation.level,
                        name: relation.name.clone(),
                        polygons,
                        members,
                    });
                    next_id += 1;
                }
                None => {
                    tracing::debug!(relation = relation.id, "bonus region cannot be assembled");
                    assembly.incomplete.insert(relation.id);
                }
            }
        }

        assembly
    }
}

/// Территория внутри региона: пробная точка её первого внешнего кольца
/// попадает во внешнее кольцо одного из многоугольников и не попадает в его дыры
fn lies_within(territory: &Area, polygons: &[Polygon], points: &PointTable) -> bool {
    let Some(ring) = territory.polygons.first().map(|p| &p.outer) else {
        return false;
    };
    let Some(coords) = ring.coordinates(points) else {
        return false;
    };

    polygons.iter().any(|polygon| {
        let Some(outer) = polygon.outer.coordinates(points) else {
            return false;
        };
        let Some(probe) = probe_point(ring, &coords, &polygon.outer) else {
            return false;
        };
        ring_contains(&outer, probe)
            && !polygon.inners.iter().any(|hole| {
                hole.coordinates(points)
                    .is_some_and(|h| ring_contains(&h, probe))
            })
    })
}

/// Объединение территорий через сокращение общих отрезков
fn union_polygons(members: &[&Area], points: &PointTable) -> Option<Vec<Polygon>> {
    let mut counts: HashMap<(ObjectId, ObjectId), usize> = HashMap::new();
    let mut segments: Vec<(ObjectId, ObjectId)> = Vec::new();
    for area in members {
        for ring in area.rings() {
            for (a, b) in ring.segments() {
                *counts.entry(segment_key(a, b)).or_insert(0) += 1;
                segments.push((a, b));
            }
        }
    }

    let boundary: Vec<Vec<ObjectId>> = segments
        .into_iter()
        .filter(|&(a, b)| counts[&segment_key(a, b)] == 1)
        .map(|(a, b)| vec![a, b])
        .collect();

    let closure = ring::close_rings(boundary, false);
    if !closure.is_complete() || closure.rings.is_empty() {
        return None;
    }

    let (outers, inners): (Vec<_>, Vec<_>) = closure.rings.into_iter().partition(|r| {
        r.coordinates(points)
            .is_some_and(|coords| signed_area(&coords) > 0.0)
    });
    if outers.is_empty() {
        return None;
    }
    build_polygons(outers, inners, points)
}

fn segment_key(a: ObjectId, b: ObjectId) -> (ObjectId, ObjectId) {
    if a < b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::DirectAreaAssembler;
    use crate::model::{Dataset, Line, Member, Point, Role};
    use approx::assert_relative_eq;

    /// Три квадрата 1x1 в ряд (отношения 1..=3, уровень 6) и отдельный квадрат 4 в стороне.
    /// Точки нижнего ряда 1..=4, верхнего 5..=8.
    fn row_dataset() -> Dataset {
        let mut points = Vec::new();
        for i in 0..4 {
            points.push(Point::new(1 + i, i as f64, 0.0));
            points.push(Point::new(5 + i, i as f64, 1.0));
        }
        points.extend([
            Point::new(20, 10.0, 0.0),
            Point::new(21, 11.0, 0.0),
            Point::new(22, 11.0, 1.0),
            Point::new(23, 10.0, 1.0),
        ]);

        let mut lines = vec![
            // вертикальные стороны 1-5, 2-6, 3-7, 4-8
            Line::new(100, vec![1, 5]),
            Line::new(101, vec![2, 6]),
            Line::new(102, vec![3, 7]),
            Line::new(103, vec![4, 8]),
            Line::new(130, vec![20, 21, 22, 23, 20]),
        ];
        for i in 0..3 {
            lines.push(Line::new(110 + i, vec![1 + i, 2 + i]));
            lines.push(Line::new(120 + i, vec![5 + i, 6 + i]));
        }

        let mut relations: Vec<Relation> = (0..3)
            .map(|i| Relation {
                id: 1 + i,
                level: 6,
                name: None,
                members: vec![
                    Member { line: 100 + i, role: Role::Outer },
                    Member { line: 101 + i, role: Role::Outer },
                    Member { line: 110 + i, role: Role::Outer },
                    Member { line: 120 + i, role: Role::Outer },
                ],
                subareas: Vec::new(),
            })
            .collect();
        relations.push(Relation {
            id: 4,
            level: 6,
            name: None,
            members: vec![Member { line: 130, role: Role::Outer }],
            subareas: Vec::new(),
        });

        Dataset::from_parts(points, lines, relations)
    }

    fn territories(data: &Dataset) -> Vec<Area> {
        DirectAreaAssembler::new(AssemblySource::from_dataset(data))
            .assemble(&[], &[6])
            .areas
    }

    #[test]
    fn union_of_adjacent_territories() {
        let mut data = row_dataset();
        data.relations.insert(
            50,
            Relation {
                id: 50,
                level: 4,
                name: Some("Row".into()),
                members: Vec::new(),
                subareas: vec![1, 2, 3],
            },
        );
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .assemble(&territories, &[4]);

        assert!(assembly.incomplete.is_empty());
        assert_eq!(assembly.areas.len(), 1);
        let bonus = &assembly.areas[0];
        assert_eq!(bonus.id, 4);
        assert_eq!(bonus.polygons.len(), 1);
        let outer = &bonus.polygons[0].outer;
        assert!(outer.is_closed());
        // 8 внешних отрезков прямоугольника 3x1, внутренние стороны сократились
        assert_eq!(outer.ids().len(), 9);
        assert_relative_eq!(bonus.size(&data.points), 3.0);
        assert_eq!(bonus.members.len(), 3);
    }

    #[test]
    fn subareas_are_collected_through_intermediate_levels() {
        let mut data = row_dataset();
        // 50 (уровень 4) -> 40, 41 (уровень 5) -> территории 1..=3; 40 ссылается обратно на 50
        for (id, level, subareas) in [(40, 5, vec![1, 2, 50]), (41, 5, vec![3]), (50, 4, vec![40, 41])] {
            data.relations.insert(
                id,
                Relation {
                    id,
                    level,
                    name: None,
                    members: Vec::new(),
                    subareas,
                },
            );
        }
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .assemble(&territories, &[4]);

        assert!(assembly.incomplete.is_empty());
        let bonus = &assembly.areas[0];
        assert_eq!(bonus.relation, 50);
        assert_eq!(bonus.members.len(), 3);
        assert_relative_eq!(bonus.size(&data.points), 3.0);
    }

    #[test]
    fn ids_start_at_requested_lower_bound() {
        let mut data = row_dataset();
        data.relations.insert(
            50,
            Relation {
                id: 50,
                level: 4,
                name: None,
                members: Vec::new(),
                subareas: vec![1],
            },
        );
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .starting_at(10)
            .assemble(&territories, &[4]);
        assert_eq!(assembly.areas[0].id, 10);
    }

    #[test]
    fn disjoint_members_give_several_polygons() {
        let mut data = row_dataset();
        data.relations.insert(
            50,
            Relation {
                id: 50,
                level: 4,
                name: None,
                members: Vec::new(),
                subareas: vec![1, 4],
            },
        );
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .assemble(&territories, &[4]);
        let bonus = &assembly.areas[0];
        assert_eq!(bonus.polygons.len(), 2);
        assert_relative_eq!(bonus.size(&data.points), 2.0);
    }

    #[test]
    fn own_boundary_collects_members_inside() {
        let mut data = row_dataset();
        // граница вокруг первых двух квадратов: 1-2-3-7-6-5-1
        data.lines.insert(140, Line::new(140, vec![1, 2, 3, 7, 6, 5, 1]));
        data.relations.insert(
            50,
            Relation {
                id: 50,
                level: 4,
                name: None,
                members: vec![Member { line: 140, role: Role::Outer }],
                subareas: Vec::new(),
            },
        );
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .assemble(&territories, &[4]);
        let bonus = &assembly.areas[0];
        let relations: Vec<ObjectId> = bonus
            .members
            .iter()
            .map(|id| territories.iter().find(|t| t.id == *id).unwrap().relation)
            .collect();
        assert_eq!(relations, vec![1, 2]);
    }

    #[test]
    fn without_boundary_or_subareas_is_incomplete() {
        let mut data = row_dataset();
        data.relations.insert(
            50,
            Relation {
                id: 50,
                level: 4,
                name: None,
                members: vec![Member { line: 110, role: Role::Outer }],
                subareas: Vec::new(),
            },
        );
        let territories = territories(&data);
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .assemble(&territories, &[4]);
        assert!(assembly.areas.is_empty());
        assert!(assembly.incomplete.contains(&50));
    }

    #[test]
    fn enclosed_gap_becomes_a_hole() {
        // кольцо из 8 квадратов вокруг пустого центра 3x3 сетки
        let mut points = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                points.push(Point::new(y * 4 + x, x as f64, y as f64));
            }
        }
        let id = |x: i64, y: i64| y * 4 + x;
        let mut areas = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                if x == 1 && y == 1 {
                    continue;
                }
                areas.push(Area {
                    id: areas.len() as ObjectId,
                    relation: 10 + id(x, y),
                    level: 6,
                    name: None,
                    polygons: vec![Polygon {
                        outer: crate::model::Ring(vec![
                            id(x, y),
                            id(x + 1, y),
                            id(x + 1, y + 1),
                            id(x, y + 1),
                            id(x, y),
                        ]),
                        inners: Vec::new(),
                    }],
                    members: Vec::new(),
                });
            }
        }
        let data = Dataset::from_parts(points, Vec::new(), Vec::new());
        let members: Vec<&Area> = areas.iter().collect();
        let polygons = union_polygons(&members, &data.points).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].inners.len(), 1);
        assert_relative_eq!(polygons[0].size(&data.points), 8.0);
    }
}
