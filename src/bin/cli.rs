use clap::Parser;
use mapmaker::export::MapMetadata;
use mapmaker::export::png::save_preview_png;
use mapmaker::pipeline::Stage;
use mapmaker::{
    ConfigError, Dataset, Level, MapmakerParams, PipelineEvent, PipelineObserver, Result,
    TracingObserver, run,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Построитель карт территорий по границам OpenStreetMap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Декодированный набор данных (JSON)
    input: PathBuf,

    /// Путь к конфигурационному файлу в формате TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Префикс выходных файлов: <prefix>.json и <prefix>.preview.png
    #[arg(short, long, default_value = "map")]
    output: String,

    /// `admin_level` территорий (обязателен, если нет в конфигурации)
    #[arg(short, long)]
    territory_level: Option<Level>,

    /// `admin_level` бонусных регионов
    #[arg(short, long, num_args = 1..)]
    bonus_levels: Option<Vec<Level>>,

    /// Ширина карты (0 — по высоте)
    #[arg(short, long)]
    width: Option<u32>,

    /// Высота карты (0 — по ширине)
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Допуск упрощения линий
    #[arg(short, long)]
    compression_tolerance: Option<f64>,

    /// Минимальная доля площади территории в компоненте
    #[arg(short, long)]
    filter_tolerance: Option<f64>,

    /// Подробный лог через `tracing` вместо консольных сообщений
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Параметры из файла (если есть), поверх которых ложатся флаги
    fn params(&self) -> std::result::Result<MapmakerParams, ConfigError> {
        // без уровня территорий проверка параметров вернёт InvalidLevel
        let mut params = match &self.config {
            Some(path) => MapmakerParams::from_toml_file(path)?,
            None => MapmakerParams::new(self.territory_level.unwrap_or(0)),
        };
        if let Some(level) = self.territory_level {
            params.territory_level = level;
        }
        if let Some(levels) = &self.bonus_levels {
            params.bonus_levels.clone_from(levels);
        }
        if let Some(width) = self.width {
            params.width = width;
        }
        if let Some(height) = self.height {
            params.height = height;
        }
        if let Some(tolerance) = self.compression_tolerance {
            params.compression_tolerance = tolerance;
        }
        if let Some(tolerance) = self.filter_tolerance {
            params.filter_tolerance = tolerance;
        }
        Ok(params)
    }
}

/// Печатает ход работы в консоль
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn on_event(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::DecoderIncomplete(ids) => {
                println!("⚠️  Не удалось декодировать отношения: {ids:?}");
            }
            PipelineEvent::Started(stage) => println!("{}", stage_title(*stage)),
            PipelineEvent::Simplified { before, after } => {
                println!("   точек: {before} → {after}");
            }
            PipelineEvent::TerritoriesAssembled { count, incomplete } => {
                println!("   территорий: {count}");
                if !incomplete.is_empty() {
                    println!("⚠️  Незамкнутые границы у отношений: {incomplete:?}");
                }
            }
            PipelineEvent::RelationsInspected { edges, components } => {
                println!("   соседств: {edges}, компонент: {components}");
            }
            PipelineEvent::Filtered { before, after } => {
                println!("   территорий: {before} → {after}");
            }
            PipelineEvent::BonusesAssembled { count } => println!("   бонусных регионов: {count}"),
            PipelineEvent::Projected { points } => println!("   точек спроецировано: {points}"),
            PipelineEvent::Scaled { width, height } => println!("   размер карты: {width}×{height}"),
        }
    }
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Simplify => "✂️  Упрощение линий...",
        Stage::AssembleTerritories => "🧩 Сборка территорий...",
        Stage::InspectRelations => "🔗 Поиск соседей...",
        Stage::Filter => "🧹 Удаление мелких территорий...",
        Stage::AssembleBonuses => "🏆 Сборка бонусных регионов...",
        Stage::Project => "🌐 Проекция координат...",
        Stage::Scale => "📐 Масштабирование...",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "mapmaker=debug" } else { "mapmaker=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    if !cli.input.is_file() {
        return Err(ConfigError::InputNotReadable(cli.input.clone()).into());
    }

    println!("🔍 Загрузка конфигурации...");
    let params = cli.params()?;
    params.validate()?;

    println!("📂 Чтение данных из {:?}...", cli.input);
    let data: Dataset = serde_json::from_reader(BufReader::new(File::open(&cli.input)?))?;
    println!(
        "   точек: {}, линий: {}, отношений: {}",
        data.points.len(),
        data.lines.len(),
        data.relations.len()
    );

    let mut observer: Box<dyn PipelineObserver> = if cli.verbose {
        Box::new(TracingObserver)
    } else {
        Box::new(ConsoleObserver)
    };
    let map = run(data, &params, observer.as_mut())?;

    let metadata_path = format!("{}.json", cli.output);
    println!("Сохранение метаданных в {metadata_path}");
    MapMetadata::from_map(&map).save_as_json(&metadata_path)?;

    let preview_path = format!("{}.preview.png", cli.output);
    println!("Сохранение превью в {preview_path}");
    save_preview_png(&map, &preview_path)?;

    println!("\nГотово! Карта сохранена.");
    Ok(())
}
