// src/pipeline.rs
//! Конвейер построения карты
//!
//! Этапы выполняются строго по порядку, каждый получает полностью готовый
//! результат предыдущего:
//!
//! 1. упрощение линий (`&mut` линии и точки)
//! 2. сборка территорий (только чтение)
//! 3. граф соседства и компоненты (только чтение областей)
//! 4. фильтр мелких территорий, затем пересчёт графа
//! 5. сборка бонусных регионов (только чтение)
//! 6. проекции и масштабирование (`&mut` точки)
//!
//! Доступ к таблицам выражен заимствованиями: пока этап держит `&mut`,
//! никто другой таблицу не читает.
//!
//! Ход работы сообщается наблюдателю [`PipelineObserver`]; сам конвейер ничего не печатает.

use std::collections::BTreeSet;

use crate::assembler::{
    AreaAssembler, AssemblySource, CompositeAreaAssembler, DirectAreaAssembler, next_area_id,
};
use crate::config::MapmakerParams;
use crate::error::Result;
use crate::filter::filter_areas;
use crate::inspector::{AreaRelations, inspect};
use crate::model::{Area, Dataset, ObjectId};
use crate::projector::{
    Interval, IntervalProjection, MercatorProjection, Projector, RadianProjection, UnitProjection,
    resolve_dimensions,
};
use crate::simplifier::simplify;

/// Этап конвейера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Simplify,
    AssembleTerritories,
    InspectRelations,
    Filter,
    AssembleBonuses,
    Project,
    Scale,
}

/// Событие хода работы
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent<'a> {
    /// отношения, которые декодер не смог разобрать
    DecoderIncomplete(&'a BTreeSet<ObjectId>),
    Started(Stage),
    Simplified { before: usize, after: usize },
    TerritoriesAssembled { count: usize, incomplete: &'a BTreeSet<ObjectId> },
    RelationsInspected { edges: usize, components: usize },
    Filtered { before: usize, after: usize },
    BonusesAssembled { count: usize },
    Projected { points: usize },
    Scaled { width: u32, height: u32 },
}

/// Приёмник событий конвейера
pub trait PipelineObserver {
    fn on_event(&mut self, event: &PipelineEvent<'_>);
}

/// Наблюдатель, который ничего не делает
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&mut self, _event: &PipelineEvent<'_>) {}
}

/// Наблюдатель, пишущий события в `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::DecoderIncomplete(ids) => {
                tracing::warn!(?ids, "member ways missing for relations");
            }
            PipelineEvent::Started(stage) => tracing::info!(?stage, "stage started"),
            PipelineEvent::TerritoriesAssembled { count, incomplete } => {
                tracing::info!(count, incomplete = incomplete.len(), "territories assembled");
            }
            other => tracing::info!(event = ?other),
        }
    }
}

/// Результат конвейера, передаваемый экспорту
#[derive(Debug, Clone)]
pub struct MapData {
    pub data: Dataset,
    pub territories: Vec<Area>,
    pub bonuses: Vec<Area>,
    pub relations: AreaRelations,
    pub width: u32,
    pub height: u32,
}

impl MapData {
    /// Все области: сначала территории, затем бонусные регионы
    pub fn areas(&self) -> impl Iterator<Item = &Area> + '_ {
        self.territories.iter().chain(self.bonuses.iter())
    }
}

/// Запускает весь конвейер над декодированным набором данных.
///
/// Параметры проверяются до первого этапа; после этого конвейер не падает
/// из-за отдельных объектов, а пропускает их.
pub fn run(
    mut data: Dataset,
    params: &MapmakerParams,
    observer: &mut dyn PipelineObserver,
) -> Result<MapData> {
    params.validate()?;

    if !data.incomplete_relations.is_empty() {
        observer.on_event(&PipelineEvent::DecoderIncomplete(&data.incomplete_relations));
    }

    // 1. Упрощение
    if params.compression_tolerance > 0.0 {
        observer.on_event(&PipelineEvent::Started(Stage::Simplify));
        let report = simplify(&mut data.lines, &mut data.points, params.compression_tolerance);
        observer.on_event(&PipelineEvent::Simplified {
            before: report.points_before,
            after: report.points_after,
        });
    }

    // 2. Территории
    observer.on_event(&PipelineEvent::Started(Stage::AssembleTerritories));
    let assembly = DirectAreaAssembler::new(AssemblySource::from_dataset(&data))
        .assemble(&[], &[params.territory_level]);
    let mut territories = assembly.areas;
    // id удалённых фильтром территорий повторно не выдаются
    let first_bonus_id = next_area_id(&territories);
    observer.on_event(&PipelineEvent::TerritoriesAssembled {
        count: territories.len(),
        incomplete: &assembly.incomplete,
    });
    data.incomplete_relations.extend(assembly.incomplete);

    // 3. Соседи и компоненты
    observer.on_event(&PipelineEvent::Started(Stage::InspectRelations));
    let mut relations = inspect(&territories);
    observer.on_event(&PipelineEvent::RelationsInspected {
        edges: relations.edge_count(),
        components: relations.component_count(),
    });

    // 4. Фильтр и пересчёт графа
    if params.filter_tolerance > 0.0 {
        observer.on_event(&PipelineEvent::Started(Stage::Filter));
        let before = territories.len();
        let outcome = filter_areas(territories, &relations, &data.points, params.filter_tolerance);
        territories = outcome.kept;
        observer.on_event(&PipelineEvent::Filtered {
            before,
            after: territories.len(),
        });
        if !outcome.removed.is_empty() {
            relations = inspect(&territories);
            observer.on_event(&PipelineEvent::RelationsInspected {
                edges: relations.edge_count(),
                components: relations.component_count(),
            });
        }
    }

    // 5. Бонусные регионы
    let mut bonuses = Vec::new();
    if !params.bonus_levels.is_empty() {
        observer.on_event(&PipelineEvent::Started(Stage::AssembleBonuses));
        let assembly = CompositeAreaAssembler::new(AssemblySource::from_dataset(&data))
            .starting_at(first_bonus_id)
            .assemble(&territories, &params.bonus_levels);
        bonuses = assembly.areas;
        observer.on_event(&PipelineEvent::BonusesAssembled {
            count: bonuses.len(),
        });
        data.incomplete_relations.extend(assembly.incomplete);
    }

    // 6. Проекции
    observer.on_event(&PipelineEvent::Started(Stage::Project));
    let mut projector = Projector::new(&mut data.points);
    projector.apply_projection(&RadianProjection);
    projector.apply_projection(&MercatorProjection);
    observer.on_event(&PipelineEvent::Projected {
        points: projector.point_count(),
    });

    // Границы берутся из уже спроецированных точек
    observer.on_event(&PipelineEvent::Started(Stage::Scale));
    let (mut width, mut height) = (params.width, params.height);
    if let Some(bounds) = projector.bounds() {
        (width, height) = resolve_dimensions(width, height, &bounds);
        projector.apply_projection(&UnitProjection::from_bounds(&bounds));
        let unit = Interval::new(0.0, 1.0);
        // ось y переворачивается: север сверху
        projector.apply_projection(&IntervalProjection::new(
            unit,
            unit,
            Interval::new(0.0, f64::from(width)),
            Interval::new(f64::from(height), 0.0),
        ));
    } else {
        width = width.max(height);
        height = width;
    }
    observer.on_event(&PipelineEvent::Scaled { width, height });

    Ok(MapData {
        data,
        territories,
        bonuses,
        relations,
        width,
        height,
    })
}
