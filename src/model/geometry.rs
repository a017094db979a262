// src/model/geometry.rs
//! Плоская геометрия над парами координат
//!
//! Все функции работают в той системе координат, которая актуальна на момент вызова:
//! до проекции это долгота/широта в градусах, после — пиксели.

use geo::{Area, BoundingRect, Centroid, Contains, EuclideanDistance};
use serde::{Deserialize, Serialize};

/// Пара координат точки (x — долгота или горизонталь, y — широта или вертикаль)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::coord! { x: c.x, y: c.y }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::point! { x: c.x, y: c.y }
    }
}

/// Осевой ограничивающий прямоугольник
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Rectangle {
    /// Строит прямоугольник по набору координат. Пустой набор даёт `None`.
    pub fn from_coordinates<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let rect = coordinates
            .into_iter()
            .map(geo::Point::from)
            .collect::<geo::MultiPoint<f64>>()
            .bounding_rect()?;
        Some(Self {
            min: rect.min().into(),
            max: rect.max().into(),
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Кольцо как многоугольник `geo` без дыр (замыкается автоматически)
fn ring_polygon(ring: &[Coordinate]) -> geo::Polygon<f64> {
    let exterior: geo::LineString<f64> = ring.iter().copied().map(geo::Coord::from).collect();
    geo::Polygon::new(exterior, vec![])
}

/// Знаковая площадь многоугольника.
///
/// Положительна при обходе против часовой стрелки. Замыкающая точка
/// (совпадающая с первой) на результат не влияет.
#[must_use]
pub fn signed_area(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    ring_polygon(ring).signed_area()
}

/// Центр масс многоугольника. Для вырожденного кольца — центр самой ломаной.
#[must_use]
pub fn centroid(ring: &[Coordinate]) -> Option<Coordinate> {
    ring_polygon(ring)
        .centroid()
        .map(|p| Coordinate::new(p.x(), p.y()))
}

/// Точка строго внутри кольца (граница не считается)
#[must_use]
pub fn ring_contains(ring: &[Coordinate], point: Coordinate) -> bool {
    ring.len() >= 3 && ring_polygon(ring).contains(&geo::Point::from(point))
}

/// Расстояние от точки `p` до отрезка `a`–`b`.
///
/// Для отрезка нулевой длины — расстояние до точки `a`.
#[must_use]
pub fn point_to_segment_distance(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    geo::Point::from(p).euclidean_distance(&geo::Line::new(a, b))
}
