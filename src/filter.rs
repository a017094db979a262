// src/filter.rs
//! Фильтр мелких территорий
//!
//! Территория удаляется, если её площадь составляет меньше `tolerance` от
//! суммарной площади её компоненты связности. Площади считаются в текущей
//! системе координат (одной для всех областей).
//!
//! Освободившееся место соседям не передаётся, а компонента после фильтрации
//! может распасться. Если нужна связность, граф пересчитывается заново.

use std::collections::{BTreeSet, HashMap};

use crate::inspector::AreaRelations;
use crate::model::{Area, ObjectId, PointTable};

/// Итог фильтрации
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<Area>,
    pub removed: BTreeSet<ObjectId>,
}

/// Отбрасывает области с долей площади в компоненте меньше `tolerance`.
///
/// При `tolerance == 0` ничего не удаляется. Область без компоненты, а также
/// компонента нулевой площади не фильтруются.
#[must_use]
pub fn filter_areas(
    areas: Vec<Area>,
    relations: &AreaRelations,
    points: &PointTable,
    tolerance: f64,
) -> FilterOutcome {
    if tolerance <= 0.0 {
        return FilterOutcome {
            kept: areas,
            removed: BTreeSet::new(),
        };
    }

    let sizes: Vec<f64> = areas.iter().map(|a| a.size(points)).collect();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for (area, size) in areas.iter().zip(&sizes) {
        if let Some(&component) = relations.components.get(&area.id) {
            *totals.entry(component).or_insert(0.0) += size;
        }
    }

    let mut outcome = FilterOutcome::default();
    for (area, size) in areas.into_iter().zip(sizes) {
        let total = relations
            .components
            .get(&area.id)
            .and_then(|c| totals.get(c))
            .copied()
            .unwrap_or(0.0);

        if total > 0.0 && size / total < tolerance {
            tracing::debug!(area = area.id, ratio = size / total, "filtered out small area");
            outcome.removed.insert(area.id);
        } else {
            outcome.kept.push(area);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::inspect;
    use crate::inspector::tests::{grid, square_area};
    use crate::model::Point;

    /// Сетка с размерами клеток 1, 9, 9, 81 (колонки и строки по 0, 1, 10)
    fn grid_points() -> PointTable {
        let coords = [0.0, 1.0, 10.0];
        let mut points = PointTable::new();
        for (row, &y) in coords.iter().enumerate() {
            for (col, &x) in coords.iter().enumerate() {
                let id = (row * 3 + col + 1) as ObjectId;
                points.insert(id, Point::new(id, x, y));
            }
        }
        points
    }

    #[test]
    fn zero_tolerance_keeps_everything() {
        let areas = grid();
        let relations = inspect(&areas);
        let outcome = filter_areas(areas, &relations, &grid_points(), 0.0);
        assert_eq!(outcome.kept.len(), 4);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn removes_area_below_ratio() {
        let areas = grid();
        let relations = inspect(&areas);
        let outcome = filter_areas(areas, &relations, &grid_points(), 0.05);
        assert_eq!(outcome.removed, BTreeSet::from([0]));
        assert_eq!(outcome.kept.len(), 3);
    }

    #[test]
    fn ratio_exactly_at_tolerance_is_kept() {
        let areas = grid();
        let relations = inspect(&areas);
        // доля области 0 ровно 0.01
        let outcome = filter_areas(areas, &relations, &grid_points(), 0.01);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn ratio_is_per_component() {
        // отдельный островок 1x1 — единственный в своей компоненте, доля 1.0
        let mut areas = grid();
        areas.push(square_area(4, [20, 21, 22, 23]));
        let mut points = grid_points();
        for (id, x, y) in [(20, 50.0, 50.0), (21, 51.0, 50.0), (22, 51.0, 51.0), (23, 50.0, 51.0)] {
            points.insert(id, Point::new(id, x, y));
        }
        let relations = inspect(&areas);
        let outcome = filter_areas(areas, &relations, &points, 0.05);
        assert_eq!(outcome.removed, BTreeSet::from([0]));
        assert!(outcome.kept.iter().any(|a| a.id == 4));
    }
}
