// src/model/mod.rs
//! Модель данных: точки, линии, отношения и собранные из них области
//!
//! Точки и линии хранятся в плоских таблицах по идентификатору. Всё остальное
//! (члены отношений, кольца областей) ссылается на них только по id.

pub mod geometry;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

pub use geometry::{Coordinate, Rectangle};

/// Идентификатор объекта. Знаковый и 64-битный: в OSM больше 2^31 узлов,
/// а отрицательные значения служат маркером недействительного объекта.
pub type ObjectId = i64;

/// Административный уровень (`admin_level` в OSM), допустимы значения 1–12
pub type Level = u8;

pub const MIN_LEVEL: Level = 1;
pub const MAX_LEVEL: Level = 12;

pub type PointTable = HashMap<ObjectId, Point>;
pub type LineTable = HashMap<ObjectId, Line>;
pub type RelationTable = BTreeMap<ObjectId, Relation>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: ObjectId,
    pub coordinate: Coordinate,
}

impl Point {
    #[must_use]
    pub fn new(id: ObjectId, x: f64, y: f64) -> Self {
        Self {
            id,
            coordinate: Coordinate::new(x, y),
        }
    }
}

/// Граничная линия — упорядоченная последовательность id точек (не менее двух)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: ObjectId,
    pub points: Vec<ObjectId>,
}

impl Line {
    #[must_use]
    pub fn new(id: ObjectId, points: Vec<ObjectId>) -> Self {
        Self { id, points }
    }

    /// Линия замкнута, если первая и последняя точки совпадают
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    #[must_use]
    pub fn first(&self) -> Option<ObjectId> {
        self.points.first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<ObjectId> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Outer,
    Inner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub line: ObjectId,
    pub role: Role,
}

/// Административная граница: набор линий с ролями
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: ObjectId,
    pub level: Level,
    #[serde(default)]
    pub name: Option<String>,
    pub members: Vec<Member>,
    /// id дочерних отношений (члены с ролью `subarea` в OSM)
    #[serde(default)]
    pub subareas: Vec<ObjectId>,
}

impl Relation {
    /// id линий с заданной ролью в исходном порядке
    pub fn lines_with_role(&self, role: Role) -> impl Iterator<Item = ObjectId> + '_ {
        self.members
            .iter()
            .filter(move |m| m.role == role)
            .map(|m| m.line)
    }
}

/// Замкнутое кольцо: id точек, первый равен последнему
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring(pub Vec<ObjectId>);

impl Ring {
    #[must_use]
    pub fn ids(&self) -> &[ObjectId] {
        &self.0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() > 3 && self.0.first() == self.0.last()
    }

    /// Пары соседних id — отрезки границы
    pub fn segments(&self) -> impl Iterator<Item = (ObjectId, ObjectId)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    /// Координаты кольца. `None`, если хотя бы одной точки нет в таблице.
    #[must_use]
    pub fn coordinates(&self, points: &PointTable) -> Option<Vec<Coordinate>> {
        self.0
            .iter()
            .map(|id| points.get(id).map(|p| p.coordinate))
            .collect()
    }

    #[must_use]
    pub fn signed_area(&self, points: &PointTable) -> f64 {
        self.coordinates(points)
            .map_or(0.0, |coords| geometry::signed_area(&coords))
    }

    pub fn reverse(&mut self) {
        self.0.reverse();
    }
}

/// Один связный многоугольник области: внешнее кольцо и его дыры
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub outer: Ring,
    pub inners: Vec<Ring>,
}

impl Polygon {
    /// Площадь без дыр
    #[must_use]
    pub fn size(&self, points: &PointTable) -> f64 {
        let outer = self.outer.signed_area(points).abs();
        let holes: f64 = self
            .inners
            .iter()
            .map(|r| r.signed_area(points).abs())
            .sum();
        outer - holes
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::once(&self.outer).chain(self.inners.iter())
    }
}

/// Собранная область: территория или бонусный регион
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: ObjectId,
    pub relation: ObjectId,
    pub level: Level,
    pub name: Option<String>,
    pub polygons: Vec<Polygon>,
    /// id территорий, входящих в бонусный регион (у территорий пусто)
    pub members: Vec<ObjectId>,
}

impl Area {
    /// Площадь области: сумма внешних колец минус дыры
    #[must_use]
    pub fn size(&self, points: &PointTable) -> f64 {
        self.polygons.iter().map(|p| p.size(points)).sum()
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons.iter().flat_map(Polygon::rings)
    }
}

/// Декодированный набор данных, с которым работает конвейер
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub points: PointTable,
    pub lines: LineTable,
    pub relations: RelationTable,
    /// отношения, которые декодер не смог разобрать структурно
    #[serde(default)]
    pub incomplete_relations: BTreeSet<ObjectId>,
}

impl Dataset {
    /// Dataset из списков; повторяющиеся id перезаписываются последним
    pub fn from_parts(
        points: impl IntoIterator<Item = Point>,
        lines: impl IntoIterator<Item = Line>,
        relations: impl IntoIterator<Item = Relation>,
    ) -> Self {
        Self {
            points: points.into_iter().map(|p| (p.id, p)).collect(),
            lines: lines.into_iter().map(|l| (l.id, l)).collect(),
            relations: relations.into_iter().map(|r| (r.id, r)).collect(),
            incomplete_relations: BTreeSet::new(),
        }
    }

    /// Границы текущих координат всех точек
    #[must_use]
    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_coordinates(self.points.values().map(|p| p.coordinate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_points() -> PointTable {
        [
            Point::new(1, 0.0, 0.0),
            Point::new(2, 4.0, 0.0),
            Point::new(3, 4.0, 4.0),
            Point::new(4, 0.0, 4.0),
            Point::new(5, 1.0, 1.0),
            Point::new(6, 1.0, 2.0),
            Point::new(7, 2.0, 2.0),
            Point::new(8, 2.0, 1.0),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect()
    }

    #[test]
    fn closed_line_detection() {
        assert!(Line::new(1, vec![1, 2, 3, 1]).is_closed());
        assert!(!Line::new(2, vec![1, 2, 3]).is_closed());
        assert!(!Line::new(3, vec![1, 1]).is_closed());
    }

    #[test]
    fn polygon_size_subtracts_holes() {
        let points = square_points();
        let polygon = Polygon {
            outer: Ring(vec![1, 2, 3, 4, 1]),
            inners: vec![Ring(vec![5, 6, 7, 8, 5])],
        };
        assert_relative_eq!(polygon.size(&points), 15.0);
    }

    #[test]
    fn ring_coordinates_missing_point() {
        let points = square_points();
        assert!(Ring(vec![1, 2, 99, 1]).coordinates(&points).is_none());
    }

    #[test]
    fn relation_roles_filter() {
        let relation = Relation {
            id: 1,
            level: 4,
            name: None,
            members: vec![
                Member { line: 10, role: Role::Outer },
                Member { line: 11, role: Role::Inner },
                Member { line: 12, role: Role::Outer },
            ],
            subareas: Vec::new(),
        };
        assert_eq!(relation.lines_with_role(Role::Outer).collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(relation.lines_with_role(Role::Inner).collect::<Vec<_>>(), vec![11]);
    }
}
