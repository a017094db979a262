// src/export/mod.rs
//! Экспорт готовой карты
//!
//! Не входит в конвейер: получает [`MapData`] с координатами в пикселях и
//! записывает метаданные (JSON) и превью (PNG).

pub mod png;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::geometry::{centroid, signed_area};
use crate::model::{Area, Coordinate, Level, ObjectId, PointTable};
use crate::pipeline::MapData;

#[derive(Debug, Clone, Serialize)]
pub struct TerritoryMetadata {
    pub id: ObjectId,
    pub relation: ObjectId,
    pub name: Option<String>,
    pub neighbors: Vec<ObjectId>,
    pub component: Option<usize>,
    /// точка для подписи: центр масс наибольшего внешнего кольца
    pub center: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BonusMetadata {
    pub id: ObjectId,
    pub relation: ObjectId,
    pub name: Option<String>,
    pub level: Level,
    pub members: Vec<ObjectId>,
}

/// Метаданные карты для игры
#[derive(Debug, Clone, Serialize)]
pub struct MapMetadata {
    pub width: u32,
    pub height: u32,
    pub territories: Vec<TerritoryMetadata>,
    pub bonuses: Vec<BonusMetadata>,
    pub incomplete_relations: Vec<ObjectId>,
}

impl MapMetadata {
    #[must_use]
    pub fn from_map(map: &MapData) -> Self {
        let territories = map
            .territories
            .iter()
            .map(|t| TerritoryMetadata {
                id: t.id,
                relation: t.relation,
                name: t.name.clone(),
                neighbors: map
                    .relations
                    .neighbors
                    .get(&t.id)
                    .map(|n| n.iter().copied().collect())
                    .unwrap_or_default(),
                component: map.relations.components.get(&t.id).copied(),
                center: center_point(t, &map.data.points),
            })
            .collect();

        let bonuses = map
            .bonuses
            .iter()
            .map(|b| BonusMetadata {
                id: b.id,
                relation: b.relation,
                name: b.name.clone(),
                level: b.level,
                members: b.members.clone(),
            })
            .collect();

        Self {
            width: map.width,
            height: map.height,
            territories,
            bonuses,
            incomplete_relations: map.data.incomplete_relations.iter().copied().collect(),
        }
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save_as_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Центр масс наибольшего по площади внешнего кольца
#[must_use]
pub fn center_point(area: &Area, points: &PointTable) -> Option<Coordinate> {
    area.polygons
        .iter()
        .filter_map(|p| p.outer.coordinates(points))
        .max_by(|a, b| {
            signed_area(a).abs().total_cmp(&signed_area(b).abs())
        })
        .and_then(|ring| centroid(&ring))
}
