// src/config.rs
//! Конфигурация построения карты
//!
//! Этот модуль определяет параметры, которые управляют конвейером:
//! - административный уровень территорий и уровни бонусных регионов
//! - допуски упрощения линий и фильтрации мелких территорий
//! - размер итоговой карты в пикселях
//!
//! Параметры загружаются из TOML-файла и проверяются до запуска конвейера.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{Level, MAX_LEVEL, MIN_LEVEL};

/// Основные параметры построения карты
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapmakerParams {
    /// `admin_level` границ, из которых строятся территории (1–12)
    pub territory_level: Level,

    /// `admin_level` границ для бонусных регионов (пусто — без бонусов)
    #[serde(default)]
    pub bonus_levels: Vec<Level>,

    /// Ширина карты в пикселях (0 — вычисляется по высоте)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в пикселях (0 — вычисляется по ширине)
    #[serde(default)]
    pub height: u32,

    /// Допуск упрощения линий в единицах исходных координат (0 — без упрощения)
    #[serde(default)]
    pub compression_tolerance: f64,

    /// Минимальная доля площади территории в своей компоненте (0 — без фильтра)
    #[serde(default)]
    pub filter_tolerance: f64,
}

fn default_width() -> u32 {
    1000
}

impl MapmakerParams {
    /// Параметры с уровнем территорий и значениями по умолчанию для остального
    #[must_use]
    pub fn new(territory_level: Level) -> Self {
        Self {
            territory_level,
            bonus_levels: Vec::new(),
            width: default_width(),
            height: 0,
            compression_tolerance: 0.0,
            filter_tolerance: 0.0,
        }
    }

    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # europe.toml
    /// territory_level = 4
    /// bonus_levels = [2]
    /// width = 1600
    /// compression_tolerance = 0.01
    /// filter_tolerance = 0.005
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }

    /// Проверяет параметры; любая ошибка фатальна и останавливает запуск
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_level("territory_level", self.territory_level)?;
        for &level in &self.bonus_levels {
            validate_level("bonus_levels", level)?;
            if level == self.territory_level {
                return Err(ConfigError::BonusLevelIsTerritoryLevel(level));
            }
        }
        if self.width == 0 && self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        validate_tolerance("compression_tolerance", self.compression_tolerance)?;
        validate_tolerance("filter_tolerance", self.filter_tolerance)?;
        Ok(())
    }
}

fn validate_level(name: &'static str, value: Level) -> Result<(), ConfigError> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLevel { name, value })
    }
}

fn validate_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTolerance { name, value })
    }
}
