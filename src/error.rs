// src/error.rs
//! Ошибки построителя карт
//!
//! Фатальные ошибки возникают только до запуска конвейера (проверка параметров)
//! или при вводе-выводе. Аномалии данных (незамкнутые кольца и т.п.) ошибками
//! не считаются и обрабатываются на месте.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Level;

/// Ошибки проверки параметров запуска.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} = {value} is out of range [1, 12]")]
    InvalidLevel { name: &'static str, value: Level },

    #[error("bonus level {0} equals the territory level")]
    BonusLevelIsTerritoryLevel(Level),

    #[error("width and height cannot both be determined automatically")]
    InvalidDimensions,

    #[error("{name} = {value} must be a finite non-negative number")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("input file {0:?} does not exist or is not a file")]
    InputNotReadable(PathBuf),

    #[error("failed to read configuration: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Общая ошибка крейта.
#[derive(Debug, Error)]
pub enum MapmakerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapmakerError>;
