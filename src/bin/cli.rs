use clap::Parser;
use std::path::PathBuf;

use cartogen::{Grid, LatticeTessellation, MapGenerationParams, World};

/// Генератор рельефа и гидрологии для фэнтезийных карт
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Путь для сохранения датасета JSON
    #[arg(short, long, default_value = "map.json")]
    output: PathBuf,

    /// Сохранить превью высот (height.png) и биомов (biomes.png)
    #[arg(short, long)]
    previews: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации из {path:?}...");
            MapGenerationParams::from_toml_file(path.to_str().ok_or("невалидный путь")?)?
        }
        None => {
            println!("🔍 Конфигурация не задана, используются значения по умолчанию");
            MapGenerationParams::default()
        }
    };

    println!(
        "Генерация карты {}×{} ({} ячеек, шаблон {:?})...",
        params.width, params.height, params.cells_desired, params.template_kind
    );
    let provider = LatticeTessellation::new(Grid::spacing_for(&params));
    let world = World::generate_with_builtin_climate(params, &provider)?;

    println!(
        "Суша: {} фич, рек: {}, ячеек Pack: {}",
        world.features.iter().filter(|f| f.land).count(),
        world.rivers.len(),
        world.pack.len()
    );

    println!("Сохранение датасета в {:?}", cli.output);
    let json = serde_json::to_string(&world.to_dataset())?;
    std::fs::write(&cli.output, json)?;

    if cli.previews {
        println!("Сохранение превью height.png и biomes.png");
        world.grid.save_as_png("height.png")?;
        world.save_biomes_png("biomes.png")?;
    }

    println!("\nГотово! Карта сгенерирована.");
    Ok(())
}
