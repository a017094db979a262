// src/projector/functions.rs
//! Шаги проекции
//!
//! Каждый шаг — чистая функция над парой координат. Шаги не коммутируют:
//! порядок задаёт вызывающий код.

use std::f64::consts::FRAC_PI_4;

use crate::model::{Coordinate, Rectangle};
use crate::projector::Projection;

/// Предельная широта web-Mercator в радианах (≈85.0511°)
pub const MERCATOR_MAX_LATITUDE: f64 = 1.484_422_229_745_332_4;

/// Числовой интервал `[min, max]`. Допускается `min > max` (обратное направление).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.max - self.min
    }
}

/// Градусы -> радианы по обеим осям
#[derive(Debug, Clone, Copy, Default)]
pub struct RadianProjection;

impl Projection for RadianProjection {
    fn project(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(c.x.to_radians(), c.y.to_radians())
    }
}

/// Сферический Меркатор: (долгота, широта) в радианах -> (x, y) на единичной сфере.
///
/// Широта ограничивается ±[`MERCATOR_MAX_LATITUDE`], иначе полюса уходят в бесконечность.
#[derive(Debug, Clone, Copy, Default)]
pub struct MercatorProjection;

impl Projection for MercatorProjection {
    fn project(&self, c: Coordinate) -> Coordinate {
        let lat = c.y.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
        Coordinate::new(c.x, (FRAC_PI_4 + lat / 2.0).tan().ln())
    }
}

/// Перенос интервалов по осям на `[0, 1]`
#[derive(Debug, Clone, Copy)]
pub struct UnitProjection {
    inner: IntervalProjection,
}

impl UnitProjection {
    #[must_use]
    pub fn new(x: Interval, y: Interval) -> Self {
        let unit = Interval::new(0.0, 1.0);
        Self {
            inner: IntervalProjection::new(x, y, unit, unit),
        }
    }

    #[must_use]
    pub fn from_bounds(bounds: &Rectangle) -> Self {
        Self::new(
            Interval::new(bounds.min.x, bounds.max.x),
            Interval::new(bounds.min.y, bounds.max.y),
        )
    }
}

impl Projection for UnitProjection {
    fn project(&self, c: Coordinate) -> Coordinate {
        self.inner.project(c)
    }
}

/// Линейное отображение одного интервала на другой по каждой оси.
///
/// Вырожденный исходный интервал отображается в начало целевого.
#[derive(Debug, Clone, Copy)]
pub struct IntervalProjection {
    pub from_x: Interval,
    pub from_y: Interval,
    pub to_x: Interval,
    pub to_y: Interval,
}

impl IntervalProjection {
    #[must_use]
    pub fn new(from_x: Interval, from_y: Interval, to_x: Interval, to_y: Interval) -> Self {
        Self {
            from_x,
            from_y,
            to_x,
            to_y,
        }
    }
}

fn remap(value: f64, from: Interval, to: Interval) -> f64 {
    let length = from.length();
    if length.abs() < f64::EPSILON {
        return to.min;
    }
    to.min + (value - from.min) / length * to.length()
}

impl Projection for IntervalProjection {
    fn project(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(
            remap(c.x, self.from_x, self.to_x),
            remap(c.y, self.from_y, self.to_y),
        )
    }
}
