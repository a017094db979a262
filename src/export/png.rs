// src/export/png.rs
//! Превью карты в PNG
//!
//! Территории заливаются случайными, но воспроизводимыми цветами (сид — id области),
//! дыры закрашиваются фоном, границы обводятся тёмной линией.

use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;
use crate::model::{Area, Coordinate, PointTable, Ring};
use crate::pipeline::MapData;

const BACKGROUND: Rgba<u8> = Rgba([20, 20, 60, 255]); // тёмно-синий фон
const BORDER: Rgba<u8> = Rgba([30, 30, 30, 255]);

/// Воспроизводимый цвет территории
#[must_use]
pub fn area_color(area: &Area) -> Rgba<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(area.id as u64);
    Rgba([
        rng.gen_range(100..220),
        rng.gen_range(120..255),
        rng.gen_range(50..100),
        255,
    ])
}

/// Рисует территории карты. Координаты точек должны быть уже в пикселях.
#[must_use]
pub fn render_preview(map: &MapData) -> RgbaImage {
    let mut img: RgbaImage = ImageBuffer::from_pixel(map.width.max(1), map.height.max(1), BACKGROUND);
    let points = &map.data.points;

    for area in &map.territories {
        let color = area_color(area);
        for polygon in &area.polygons {
            if let Some(outer) = pixel_polygon(&polygon.outer, points) {
                draw_polygon_mut(&mut img, &outer, color);
            }
            for hole in &polygon.inners {
                if let Some(hole) = pixel_polygon(hole, points) {
                    draw_polygon_mut(&mut img, &hole, BACKGROUND);
                }
            }
        }
    }

    for ring in map.territories.iter().flat_map(Area::rings) {
        let Some(coords) = ring.coordinates(points) else {
            continue;
        };
        for w in coords.windows(2) {
            draw_line_segment_mut(&mut img, to_f32(w[0]), to_f32(w[1]), BORDER);
        }
    }

    img
}

pub fn save_preview_png(map: &MapData, path: &str) -> Result<()> {
    render_preview(map).save(path)?;
    Ok(())
}

fn to_f32(c: Coordinate) -> (f32, f32) {
    (c.x as f32, c.y as f32)
}

/// Кольцо в целых пикселях без повторов подряд и без замыкающей точки.
/// `None`, если остаётся меньше трёх вершин.
fn pixel_polygon(ring: &Ring, points: &PointTable) -> Option<Vec<Point<i32>>> {
    let mut pixels: Vec<Point<i32>> = ring
        .coordinates(points)?
        .into_iter()
        .map(|c| Point::new(c.x.round() as i32, c.y.round() as i32))
        .collect();
    pixels.dedup();
    while pixels.len() > 1 && pixels.first() == pixels.last() {
        pixels.pop();
    }
    (pixels.len() >= 3).then_some(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::inspect;
    use crate::inspector::tests::grid;
    use crate::model::Dataset;

    fn pixel_grid_map() -> MapData {
        let mut points = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                points.push(crate::model::Point::new(
                    row * 3 + col + 1,
                    col as f64 * 10.0,
                    row as f64 * 10.0,
                ));
            }
        }
        let territories = grid();
        let relations = inspect(&territories);
        MapData {
            data: Dataset::from_parts(points, Vec::new(), Vec::new()),
            territories,
            bonuses: Vec::new(),
            relations,
            width: 21,
            height: 21,
        }
    }

    #[test]
    fn colors_are_deterministic() {
        let area = &grid()[0];
        assert_eq!(area_color(area), area_color(area));
    }

    #[test]
    fn preview_fills_territories() {
        let map = pixel_grid_map();
        let img = render_preview(&map);
        assert_eq!(img.dimensions(), (21, 21));
        // центр первой клетки залит её цветом
        assert_eq!(*img.get_pixel(5, 5), area_color(&map.territories[0]));
    }

    #[test]
    fn degenerate_ring_is_skipped() {
        let map = pixel_grid_map();
        let ring = Ring(vec![1, 2, 1]);
        assert!(pixel_polygon(&ring, &map.data.points).is_none());
    }
}
