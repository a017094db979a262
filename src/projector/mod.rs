// src/projector/mod.rs
//! Проекции координат
//!
//! [`Projector`] держит исключительный доступ к таблице точек и применяет шаги
//! по одному: каждый шаг полностью проходит по всем точкам, прежде чем
//! начнётся следующий.

pub mod functions;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::model::{Coordinate, PointTable, Rectangle};

pub use functions::{
    Interval, IntervalProjection, MercatorProjection, RadianProjection, UnitProjection,
};

/// Один шаг проекции — чистая функция над парой координат
pub trait Projection: Sync {
    fn project(&self, c: Coordinate) -> Coordinate;
}

/// Применяет шаги проекции ко всем точкам таблицы на месте
#[derive(Debug)]
pub struct Projector<'a> {
    points: &'a mut PointTable,
}

impl<'a> Projector<'a> {
    pub fn new(points: &'a mut PointTable) -> Self {
        Self { points }
    }

    /// Применяет шаг ко всем точкам
    pub fn apply_projection<P: Projection + ?Sized>(&mut self, projection: &P) {
        #[cfg(feature = "parallel")]
        self.points
            .par_iter_mut()
            .for_each(|(_, p)| p.coordinate = projection.project(p.coordinate));

        #[cfg(not(feature = "parallel"))]
        for p in self.points.values_mut() {
            p.coordinate = projection.project(p.coordinate);
        }
    }

    /// Границы координат в их текущем состоянии
    #[must_use]
    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_coordinates(self.points.values().map(|p| p.coordinate))
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Размер карты в пикселях; нулевое измерение вычисляется по другому
/// с сохранением пропорций границ.
///
/// Для вырожденных границ недостающее измерение берётся равным заданному.
#[must_use]
pub fn resolve_dimensions(width: u32, height: u32, bounds: &Rectangle) -> (u32, u32) {
    let (bw, bh) = (bounds.width(), bounds.height());
    match (width, height) {
        (0, h) if bw > 0.0 && bh > 0.0 => (((bw / bh) * f64::from(h)).round().max(1.0) as u32, h),
        (0, h) => (h, h),
        (w, 0) if bw > 0.0 && bh > 0.0 => (w, ((bh / bw) * f64::from(w)).round().max(1.0) as u32),
        (w, 0) => (w, w),
        (w, h) => (w, h),
    }
}
