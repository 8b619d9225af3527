// src/world.rs
//! Контекст полного прогона конвейера
//!
//! `World` владеет всеми буферами одного запроса генерации и прогоняет
//! стадии в единственно допустимом порядке: сетка → рельеф → климат →
//! фичи сетки → Pack → фичи Pack → реки → биомы. Стадии получают буферы по
//! исключительной ссылке, поэтому перепутать порядок или завести общее
//! изменяемое состояние между ними нельзя. Запрос атомарен: ошибка любой
//! стадии прерывает генерацию целиком, частичных датасетов не бывает.

use serde::{Deserialize, Serialize};

use crate::biomes::{self, Biome};
use crate::climate::{ClimateRaster, generate_climate};
use crate::config::MapGenerationParams;
use crate::error::GenerationError;
use crate::features::{self, Feature};
use crate::grid::{Grid, Point};
use crate::heightmap::{self, Template};
use crate::pack::Pack;
use crate::rivers::{self, River};
use crate::rng::{MapRng, Seed};
use crate::tessellation::Tessellate;

/// Результат одного запроса генерации
#[derive(Debug, Clone)]
pub struct World {
    pub params: MapGenerationParams,
    pub grid: Grid,
    /// Фичи крупной сетки (нужны при прореживании и диагностике)
    pub grid_features: Vec<Feature>,
    pub pack: Pack,
    /// Фичи выходного разрешения; id совпадает с индексом
    pub features: Vec<Feature>,
    pub rivers: Vec<River>,
}

impl World {
    /// Полный прогон конвейера с внешними растрами климата
    ///
    /// # Ошибки
    /// Вырожденные параметры и отсутствующие или неполные растры климата —
    /// жёсткие ошибки; до следующих стадий дело не доходит.
    pub fn generate(
        params: MapGenerationParams,
        provider: &dyn Tessellate,
        temperature: &[i8],
        precipitation: &[u8],
    ) -> Result<Self, GenerationError> {
        params.validate()?;
        let mut rng = MapRng::new(&params.seed);

        // === 1. Крупная сетка и тесселяция ===
        let mut grid = Grid::build(&params, &mut rng)?;
        let graph = provider.tessellate(&grid.points, &grid.boundary, grid.width, grid.height);

        // === 2. Рельеф по шаблону ===
        let template = Template::parse(&params.template_steps());
        heightmap::generate(&mut grid, &graph, &template, &mut rng);

        // === 3. Климат (внешний вход) ===
        grid.set_climate(temperature, precipitation)?;

        // === 4. Фичи сетки и плотная перетесселяция ===
        let grid_features = features::markup_grid(&mut grid, &graph);
        let mut pack = Pack::build(&grid, &graph, &grid_features, provider);
        let mut pack_features = features::markup_pack(&mut pack, &grid);

        // === 5. Реки, затем биомы: влажности нужен речной сток ===
        let rivers = rivers::generate(&mut pack, &grid, &mut pack_features, &params.rivers)?;
        biomes::classify(&mut pack, &grid)?;

        Ok(Self {
            params,
            grid,
            grid_features,
            pack,
            features: pack_features,
            rivers,
        })
    }

    /// Прогон со встроенной заглушкой климата (CLI и тесты)
    pub fn generate_with_builtin_climate(
        params: MapGenerationParams,
        provider: &dyn Tessellate,
    ) -> Result<Self, GenerationError> {
        params.validate()?;
        let (cells_x, cells_y) = Grid::dimensions_for(&params);
        let climate: ClimateRaster = generate_climate(&params.seed, cells_x, cells_y);
        Self::generate(params, provider, &climate.temperature, &climate.precipitation)
    }

    /// Нужен ли новый прогон для данных параметров
    #[must_use]
    pub fn should_regenerate(&self, params: &MapGenerationParams) -> bool {
        self.grid.should_regenerate(params)
    }

    /// Плоский сериализуемый срез результата
    #[must_use]
    pub fn to_dataset(&self) -> MapDataset {
        MapDataset {
            seed: self.params.seed.clone(),
            width: self.grid.width,
            height: self.grid.height,
            cells_desired: self.grid.cells_desired,
            points: self.pack.points.clone(),
            grid_cell: self.pack.grid_cell.clone(),
            heights: self.pack.heights.clone(),
            feature_ids: self.pack.feature_ids.clone(),
            river_ids: self.pack.river_ids.clone(),
            flux: self.pack.flux.clone(),
            biomes: self.pack.biomes.clone(),
            features: self.features.clone(),
            rivers: self.rivers.clone(),
        }
    }

    /// Превью биомов на растре крупной сетки (RGBA)
    #[must_use]
    pub fn biome_image(&self) -> Vec<u8> {
        // биом ячейки сетки — биом первой ссылающейся на неё ячейки Pack;
        // прореженная глубокая вода остаётся морем
        let mut per_grid = vec![Biome::Marine; self.grid.points.len()];
        let mut seen = vec![false; self.grid.points.len()];
        for (i, &g) in self.pack.grid_cell.iter().enumerate() {
            let g = g as usize;
            if !seen[g] {
                seen[g] = true;
                per_grid[g] = self.pack.biomes[i];
            }
        }
        per_grid
            .iter()
            .flat_map(|b| {
                let rgb = b.to_rgb();
                [rgb[0], rgb[1], rgb[2], 255]
            })
            .collect()
    }

    pub fn save_biomes_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let img: image::ImageBuffer<image::Rgba<u8>, Vec<u8>> = image::ImageBuffer::from_raw(
            self.grid.cells_x as u32,
            self.grid.cells_y as u32,
            self.biome_image(),
        )
        .ok_or("Failed to create image buffer")?;
        img.save(path)?;
        Ok(())
    }
}

/// Выходной датасет: только плоские массивы и целые id, без ссылок
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDataset {
    pub seed: Seed,
    pub width: f64,
    pub height: f64,
    pub cells_desired: usize,
    pub points: Vec<Point>,
    pub grid_cell: Vec<u32>,
    pub heights: Vec<u8>,
    pub feature_ids: Vec<u32>,
    pub river_ids: Vec<u32>,
    pub flux: Vec<f64>,
    pub biomes: Vec<Biome>,
    pub features: Vec<Feature>,
    pub rivers: Vec<River>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::LatticeTessellation;

    fn small_params() -> MapGenerationParams {
        MapGenerationParams {
            seed: Seed::Text("abc".into()),
            width: 50.0,
            height: 50.0,
            cells_desired: 200,
            template: vec!["Hill 1 50 50-50 50-50".into(), "Mask 1".into()],
            ..MapGenerationParams::default()
        }
    }

    fn provider(params: &MapGenerationParams) -> LatticeTessellation {
        LatticeTessellation::new(Grid::spacing_for(params))
    }

    #[test]
    fn pipeline_runs_end_to_end() {
        let params = small_params();
        let world =
            World::generate_with_builtin_climate(params.clone(), &provider(&params)).unwrap();

        assert!(!world.pack.is_empty());
        assert_eq!(world.pack.biomes.len(), world.pack.len());
        assert!(world.grid.heights.iter().all(|&h| h <= 100));
        assert!(!world.should_regenerate(&params));
    }

    #[test]
    fn missing_climate_is_a_hard_error() {
        let params = small_params();
        let err = World::generate(params.clone(), &provider(&params), &[], &[]);
        assert!(matches!(
            err,
            Err(GenerationError::MissingRaster { .. })
        ));
    }

    #[test]
    fn mismatched_climate_is_a_hard_error() {
        let params = small_params();
        let err = World::generate(params.clone(), &provider(&params), &[10; 3], &[5; 3]);
        assert!(matches!(
            err,
            Err(GenerationError::RasterSizeMismatch { .. })
        ));
    }
}
