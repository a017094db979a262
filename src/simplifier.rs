// src/simplifier.rs
//! Упрощение граничных линий (алгоритм Дугласа — Пекера)
//!
//! Работает в две фазы:
//! 1. **Решение** — для каждой линии независимо вычисляется набор сохраняемых точек.
//!    Общие точки (на которые ссылаются несколько линий) и концы линий служат
//!    неподвижными опорами: линия режется по ним, и упрощается каждый кусок отдельно.
//! 2. **Фиксация** — линии получают новые списки точек, а из общей таблицы удаляются
//!    только те точки, на которые больше не ссылается ни одна линия.
//!
//! Кольца не вырождаются: у замкнутой линии, а также у линии, чьи концы совпадают
//! с концами другой линии, остаётся не меньше трёх различных точек.
//!
//! Благодаря опорам общая граница двух соседних отношений упрощается одинаково
//! в обеих линиях, и поиск соседей после упрощения продолжает работать.

use std::collections::{HashMap, HashSet};

use geo::SimplifyIdx;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::model::geometry::point_to_segment_distance;
use crate::model::{Coordinate, Line, LineTable, ObjectId, PointTable};

/// Итог упрощения для отчёта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyReport {
    pub points_before: usize,
    pub points_after: usize,
}

/// Неподвижные точки и пары концов, общие для нескольких линий
#[derive(Debug, Default)]
struct Anchors {
    points: HashSet<ObjectId>,
    /// пары концов (без учёта направления), которые встречаются больше чем у одной линии
    doubled_ends: HashSet<(ObjectId, ObjectId)>,
}

impl Anchors {
    /// Сколько различных точек должно остаться у линии, чтобы её кольцо не выродилось
    fn min_distinct(&self, line: &Line) -> usize {
        match (line.first(), line.last()) {
            _ if line.is_closed() => 3,
            (Some(a), Some(b)) if self.doubled_ends.contains(&end_key(a, b)) => 3,
            _ => 2,
        }
    }
}

/// Упрощает все линии с допуском `tolerance`.
///
/// При `tolerance == 0` ничего не меняется. Линии, ссылающиеся на отсутствующие
/// точки, остаются как есть.
pub fn simplify(lines: &mut LineTable, points: &mut PointTable, tolerance: f64) -> SimplifyReport {
    let points_before = points.len();
    if tolerance <= 0.0 {
        return SimplifyReport {
            points_before,
            points_after: points_before,
        };
    }

    let anchors = collect_anchors(lines);

    // Фаза 1: решения по каждой линии, таблицы только читаются
    let decide = |line: &Line| -> Option<(ObjectId, Vec<ObjectId>)> {
        let retained = simplify_line(line, points, &anchors, tolerance)?;
        (retained.len() < line.points.len()).then_some((line.id, retained))
    };

    #[cfg(feature = "parallel")]
    let decisions: Vec<(ObjectId, Vec<ObjectId>)> =
        lines.par_iter().filter_map(|(_, line)| decide(line)).collect();
    #[cfg(not(feature = "parallel"))]
    let decisions: Vec<(ObjectId, Vec<ObjectId>)> =
        lines.values().filter_map(decide).collect();

    // Фаза 2: фиксация
    let mut dropped: HashSet<ObjectId> = HashSet::new();
    for (id, retained) in decisions {
        if let Some(line) = lines.get_mut(&id) {
            let kept: HashSet<ObjectId> = retained.iter().copied().collect();
            dropped.extend(line.points.iter().filter(|p| !kept.contains(*p)));
            line.points = retained;
        }
    }

    if !dropped.is_empty() {
        let still_used: HashSet<ObjectId> = lines
            .values()
            .flat_map(|l| l.points.iter().copied())
            .filter(|id| dropped.contains(id))
            .collect();
        for id in dropped.difference(&still_used) {
            points.remove(id);
        }
    }

    tracing::debug!(
        before = points_before,
        after = points.len(),
        tolerance,
        "simplified boundary lines"
    );

    SimplifyReport {
        points_before,
        points_after: points.len(),
    }
}

fn end_key(a: ObjectId, b: ObjectId) -> (ObjectId, ObjectId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Опоры: точки, на которые ссылается больше одной линии, и концы всех линий.
/// Заодно отмечаются пары концов, общие для нескольких линий.
fn collect_anchors(lines: &LineTable) -> Anchors {
    let mut usage: HashMap<ObjectId, usize> = HashMap::new();
    let mut ends: HashMap<(ObjectId, ObjectId), usize> = HashMap::new();
    let mut anchors = Anchors::default();
    for line in lines.values() {
        let distinct: HashSet<ObjectId> = line.points.iter().copied().collect();
        for id in distinct {
            *usage.entry(id).or_insert(0) += 1;
        }
        if let (Some(a), Some(b)) = (line.first(), line.last()) {
            anchors.points.extend([a, b]);
            if a != b {
                *ends.entry(end_key(a, b)).or_insert(0) += 1;
            }
        }
    }
    anchors.points.extend(
        usage
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(id, _)| id),
    );
    anchors.doubled_ends = ends
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(key, _)| key)
        .collect();
    anchors
}

/// Сохраняемые точки одной линии. `None`, если не хватает координат.
fn simplify_line(
    line: &Line,
    points: &PointTable,
    anchors: &Anchors,
    tolerance: f64,
) -> Option<Vec<ObjectId>> {
    if line.points.len() < 3 {
        return Some(line.points.clone());
    }
    let coords: Vec<Coordinate> = line
        .points
        .iter()
        .map(|id| points.get(id).map(|p| p.coordinate))
        .collect::<Option<_>>()?;

    let mut keep = vec![false; coords.len()];
    let last = coords.len() - 1;
    keep[0] = true;

    // Режем линию по опорным точкам и упрощаем каждый кусок
    let mut start = 0;
    for i in 1..=last {
        if i == last || anchors.points.contains(&line.points[i]) {
            let piece: geo::LineString<f64> =
                coords[start..=i].iter().copied().map(geo::Coord::from).collect();
            for index in piece.simplify_idx(&tolerance) {
                keep[start + index] = true;
            }
            start = i;
        }
    }

    keep_ring_shape(&line.points, &coords, &mut keep, anchors.min_distinct(line));

    Some(
        line.points
            .iter()
            .zip(keep)
            .filter_map(|(&id, k)| k.then_some(id))
            .collect(),
    )
}

/// Возвращает вершины, пока у линии не наберётся `min_distinct` различных точек.
/// Каждый раз берётся вершина, дальше всех отстоящая от отрезка между соседними
/// сохранёнными точками.
fn keep_ring_shape(ids: &[ObjectId], coords: &[Coordinate], keep: &mut [bool], min_distinct: usize) {
    loop {
        let distinct: HashSet<ObjectId> = ids
            .iter()
            .zip(keep.iter())
            .filter_map(|(&id, &k)| k.then_some(id))
            .collect();
        if distinct.len() >= min_distinct {
            return;
        }

        let mut best: Option<(usize, f64)> = None;
        let mut prev = 0;
        for i in 1..coords.len() {
            if !keep[i] {
                continue;
            }
            for j in prev + 1..i {
                let d = point_to_segment_distance(coords[j], coords[prev], coords[i]);
                if best.is_none_or(|(_, max)| d > max) {
                    best = Some((j, d));
                }
            }
            prev = i;
        }

        match best {
            Some((index, _)) => keep[index] = true,
            None => return,
        }
    }
}
