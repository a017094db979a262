// src/assembler/mod.rs
//! Сборка областей из отношений
//!
//! Две стратегии реализуют один трейт [`AreaAssembler`] и используют общий
//! примитив замыкания колец ([`ring::close_rings`]):
//! - [`DirectAreaAssembler`] — территории из граничных линий отношения;
//! - [`CompositeAreaAssembler`] — бонусные регионы, в том числе как объединение
//!   уже собранных территорий.
//!
//! Область либо собирается полностью, либо не собирается вовсе: отношение,
//! внешние линии которого не замыкаются, попадает в список незавершённых.

pub mod composite;
pub mod direct;
pub mod ring;

use std::collections::BTreeSet;

pub use composite::CompositeAreaAssembler;
pub use direct::DirectAreaAssembler;

use crate::model::geometry::{centroid, ring_contains, signed_area};
use crate::model::{
    Area, Coordinate, Dataset, Level, LineTable, ObjectId, PointTable, Polygon, Relation,
    RelationTable, Ring, Role,
};

/// Результат работы сборщика
#[derive(Debug, Default)]
pub struct Assembly {
    pub areas: Vec<Area>,
    pub incomplete: BTreeSet<ObjectId>,
}

/// Общая способность собирать области для заданных уровней.
///
/// `existing` — уже собранные области: от них отсчитываются новые id,
/// а составная стратегия берёт из них территории-участники.
pub trait AreaAssembler {
    fn assemble(&self, existing: &[Area], levels: &[Level]) -> Assembly;
}

/// Таблицы, из которых собираются области (только чтение)
#[derive(Debug, Clone, Copy)]
pub struct AssemblySource<'a> {
    pub points: &'a PointTable,
    pub lines: &'a LineTable,
    pub relations: &'a RelationTable,
    /// отношения, уже отмеченные декодером как незавершённые
    pub skip: &'a BTreeSet<ObjectId>,
}

impl<'a> AssemblySource<'a> {
    #[must_use]
    pub fn from_dataset(data: &'a Dataset) -> Self {
        Self {
            points: &data.points,
            lines: &data.lines,
            relations: &data.relations,
            skip: &data.incomplete_relations,
        }
    }

    /// Отношения нужных уровней в порядке id
    pub fn relations_at<'l>(self, levels: &'l [Level]) -> impl Iterator<Item = &'a Relation> + 'l
    where
        'a: 'l,
    {
        let skip = self.skip;
        let relations = self.relations;
        relations
            .values()
            .filter(move |r| levels.contains(&r.level) && !skip.contains(&r.id))
    }

    /// Многоугольники отношения из его собственных линий.
    ///
    /// `None`, если внешняя граница не замыкается, ссылается на неизвестную
    /// линию или точку. Незамкнутые внутренние кольца отбрасываются.
    #[must_use]
    pub fn relation_polygons(&self, relation: &Relation) -> Option<Vec<Polygon>> {
        let outer_fragments = relation
            .lines_with_role(Role::Outer)
            .map(|id| self.lines.get(&id).map(|l| l.points.clone()))
            .collect::<Option<Vec<_>>>()?;
        let outer = ring::close_rings(outer_fragments, true);
        if !outer.is_complete() || outer.rings.is_empty() {
            return None;
        }

        let inner_fragments: Vec<Vec<ObjectId>> = relation
            .lines_with_role(Role::Inner)
            .filter_map(|id| self.lines.get(&id).map(|l| l.points.clone()))
            .collect();
        let inner = ring::close_rings(inner_fragments, true);
        if !inner.is_complete() {
            tracing::debug!(
                relation = relation.id,
                open = inner.open.len(),
                "dropping open inner chains"
            );
        }

        build_polygons(outer.rings, inner.rings, self.points)
    }
}

/// Следующий свободный id области
#[must_use]
pub fn next_area_id(existing: &[Area]) -> ObjectId {
    existing.iter().map(|a| a.id + 1).max().unwrap_or(0)
}

/// Ориентирует кольца (внешние — против часовой, внутренние — по часовой)
/// и раскладывает дыры по содержащим их внешним кольцам.
///
/// `None`, если у внешнего кольца нет координат. Дыра вне всех внешних колец
/// отбрасывается.
pub(crate) fn build_polygons(
    outers: Vec<Ring>,
    inners: Vec<Ring>,
    points: &PointTable,
) -> Option<Vec<Polygon>> {
    let mut polygons = Vec::with_capacity(outers.len());
    let mut outer_coords = Vec::with_capacity(outers.len());
    for mut outer in outers {
        let mut coords = outer.coordinates(points)?;
        if signed_area(&coords) < 0.0 {
            outer.reverse();
            coords.reverse();
        }
        outer_coords.push(coords);
        polygons.push(Polygon {
            outer,
            inners: Vec::new(),
        });
    }

    for mut inner in inners {
        let Some(mut coords) = inner.coordinates(points) else {
            continue;
        };
        if signed_area(&coords) > 0.0 {
            inner.reverse();
            coords.reverse();
        }

        // наименьшее внешнее кольцо, содержащее дыру
        let owner = polygons
            .iter()
            .zip(&outer_coords)
            .enumerate()
            .filter(|(_, (polygon, ring))| {
                probe_point(&inner, &coords, &polygon.outer)
                    .is_some_and(|probe| ring_contains(ring, probe))
            })
            .map(|(i, (_, ring))| (i, signed_area(ring)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        match owner {
            Some(i) => polygons[i].inners.push(inner),
            None => tracing::debug!(ring = ?inner.ids().first(), "inner ring outside of all outer rings"),
        }
    }

    Some(polygons)
}

/// Точка кольца `ring`, не лежащая на границе `boundary`; если все вершины общие —
/// центр масс кольца
pub(crate) fn probe_point(ring: &Ring, coords: &[Coordinate], boundary: &Ring) -> Option<Coordinate> {
    let shared: BTreeSet<ObjectId> = boundary.ids().iter().copied().collect();
    ring.ids()
        .iter()
        .zip(coords)
        .find(|(id, _)| !shared.contains(*id))
        .map(|(_, &c)| c)
        .or_else(|| centroid(coords))
}
