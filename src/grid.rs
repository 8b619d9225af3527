// src/grid.rs
//! Построение крупной сетки
//!
//! Сетка — дрожащая квадратная решётка точек с шагом `spacing`, выведенным из
//! желаемого числа ячеек, плюс кольцо граничных точек для чистой обрезки
//! тесселяции. Эта стадия не может завершиться ошибкой при положительных
//! входах; вырожденные параметры отсекаются ещё в `config::validate`.

use image::{ImageBuffer, Luma};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::MapGenerationParams;
use crate::error::GenerationError;
use crate::rng::{MapRng, Seed};

/// Двумерная координата; неизменяема после размещения
pub type Point = (f64, f64);

/// Округление до `digits` знаков после запятой
#[must_use]
pub(crate) fn rn(v: f64, digits: i32) -> f64 {
    let m = 10f64.powi(digits);
    (v * m).round() / m
}

/// Крупная сетка с производными растрами
///
/// Растры высот/температуры/осадков индексируются так же, как `points`:
/// ячейка `(x, y)` решётки лежит по индексу `y * cells_x + x`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub seed: Seed,
    pub width: f64,
    pub height: f64,
    pub cells_desired: usize,
    pub spacing: f64,
    pub cells_x: usize,
    pub cells_y: usize,
    pub points: Vec<Point>,
    pub boundary: Vec<Point>,

    /// Высоты 0–100; < 20 — вода
    pub heights: Vec<u8>,
    /// Температура, °C (входной растр климата)
    pub temperature: Vec<i8>,
    /// Осадки (входной растр климата)
    pub precipitation: Vec<u8>,
    /// Id фичи для каждой ячейки (заполняется классификатором)
    pub feature_ids: Vec<u32>,
    /// Знаковое поле расстояния до берега (заполняется классификатором)
    pub distance_field: Vec<i8>,
}

impl Grid {
    /// Шаг решётки для данных параметров: `round(sqrt(w*h / cells), 2)`
    #[must_use]
    pub fn spacing_for(params: &MapGenerationParams) -> f64 {
        rn(
            (params.width * params.height / params.cells_desired as f64).sqrt(),
            2,
        )
    }

    /// Число ячеек решётки по каждой оси для данных параметров
    #[must_use]
    pub fn dimensions_for(params: &MapGenerationParams) -> (usize, usize) {
        let spacing = Self::spacing_for(params);
        (
            ((params.width + 0.5 * spacing - 1e-10) / spacing).floor() as usize,
            ((params.height + 0.5 * spacing - 1e-10) / spacing).floor() as usize,
        )
    }

    /// Строит дрожащую решётку точек и кольцо граничных точек
    pub fn build(params: &MapGenerationParams, rng: &mut MapRng) -> Result<Self, GenerationError> {
        params.validate()?;

        let spacing = Self::spacing_for(params);
        let (cells_x, cells_y) = Self::dimensions_for(params);

        // Дрожание: до 90% половины шага по каждой оси
        let jittering = (spacing / 2.0) * 0.9;
        let mut points = Vec::with_capacity(cells_x * cells_y);
        for yi in 0..cells_y {
            let y = spacing / 2.0 + yi as f64 * spacing;
            for xi in 0..cells_x {
                let x = spacing / 2.0 + xi as f64 * spacing;
                let jx = rng.range(-jittering, jittering);
                let jy = rng.range(-jittering, jittering);
                points.push((
                    rn((x + jx).clamp(0.0, params.width), 2),
                    rn((y + jy).clamp(0.0, params.height), 2),
                ));
            }
        }

        let boundary = boundary_points(params.width, params.height, spacing);
        let n = points.len();

        Ok(Self {
            seed: params.seed.clone(),
            width: params.width,
            height: params.height,
            cells_desired: params.cells_desired,
            spacing,
            cells_x,
            cells_y,
            points,
            boundary,
            heights: vec![0; n],
            temperature: Vec::new(),
            precipitation: Vec::new(),
            feature_ids: vec![0; n],
            distance_field: vec![0; n],
        })
    }

    /// Индекс ячейки решётки, содержащей точку `(x, y)`
    #[must_use]
    pub fn find_cell(&self, x: f64, y: f64) -> usize {
        let cx = ((x / self.spacing) as usize).min(self.cells_x - 1);
        let cy = ((y / self.spacing) as usize).min(self.cells_y - 1);
        cy * self.cells_x + cx
    }

    /// Предикат перегенерации: сравнение производных величин, не идентичности
    ///
    /// Возвращает `true`, если сид, размеры или желаемое число ячеек изменились
    /// относительно этой сетки и конвейер нужно запустить заново.
    #[must_use]
    pub fn should_regenerate(&self, params: &MapGenerationParams) -> bool {
        self.seed != params.seed
            || self.spacing != Self::spacing_for(params)
            || self.cells_desired != params.cells_desired
            || self.width != params.width
            || self.height != params.height
    }

    /// Принимает входные растры климата (внешняя стадия, здесь не моделируется)
    ///
    /// # Ошибки
    /// Пустой или неполный растр — жёсткая ошибка с указанием стадии и растра.
    pub fn set_climate(
        &mut self,
        temperature: &[i8],
        precipitation: &[u8],
    ) -> Result<(), GenerationError> {
        let expected = self.points.len();
        if temperature.is_empty() {
            return Err(GenerationError::MissingRaster {
                stage: "классификация биомов",
                raster: "temperature",
            });
        }
        if precipitation.is_empty() {
            return Err(GenerationError::MissingRaster {
                stage: "классификация биомов",
                raster: "precipitation",
            });
        }
        if temperature.len() != expected {
            return Err(GenerationError::RasterSizeMismatch {
                stage: "классификация биомов",
                raster: "temperature",
                got: temperature.len(),
                expected,
            });
        }
        if precipitation.len() != expected {
            return Err(GenerationError::RasterSizeMismatch {
                stage: "классификация биомов",
                raster: "precipitation",
                got: precipitation.len(),
                expected,
            });
        }
        self.temperature = temperature.to_vec();
        self.precipitation = precipitation.to_vec();
        Ok(())
    }

    /// Превью высот в оттенках серого (отладочный вывод, не картография)
    #[must_use]
    pub fn to_grayscale_image(&self) -> Vec<u8> {
        #[cfg(feature = "parallel")]
        let iter = self.heights.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = self.heights.iter();
        iter.map(|&h| (f64::from(h) * 2.55) as u8).collect()
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_raw(
            self.cells_x as u32,
            self.cells_y as u32,
            self.to_grayscale_image(),
        )
        .ok_or("Failed to create image buffer")?;
        img.save(path)?;
        Ok(())
    }
}

/// Кольцо граничных точек: шаг `2*spacing`, смещение наружу на `spacing`
///
/// Даёт тесселяции чистые якоря обрезки по всем четырём краям.
fn boundary_points(width: f64, height: f64, spacing: f64) -> Vec<Point> {
    let offset = rn(-spacing, 0);
    let b_spacing = spacing * 2.0;
    let w = width - offset * 2.0;
    let h = height - offset * 2.0;
    let number_x = ((w / b_spacing).ceil() - 1.0).max(1.0) as usize;
    let number_y = ((h / b_spacing).ceil() - 1.0).max(1.0) as usize;

    let mut points = Vec::with_capacity(2 * (number_x + number_y));
    for i in 0..number_x {
        let x = ((w * (i as f64 + 0.5)) / number_x as f64 + offset).ceil();
        points.push((x, offset));
        points.push((x, h + offset));
    }
    for i in 0..number_y {
        let y = ((h * (i as f64 + 0.5)) / number_y as f64 + offset).ceil();
        points.push((offset, y));
        points.push((w + offset, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Seed;

    fn params(width: f64, height: f64, cells: usize) -> MapGenerationParams {
        MapGenerationParams {
            width,
            height,
            cells_desired: cells,
            ..MapGenerationParams::default()
        }
    }

    #[test]
    fn spacing_and_cell_counts() {
        let p = params(50.0, 50.0, 200);
        // sqrt(2500 / 200) = 3.5355… → 3.54
        assert!((Grid::spacing_for(&p) - 3.54).abs() < 1e-9);

        let mut rng = MapRng::new(&Seed::Number(0));
        let grid = Grid::build(&p, &mut rng).unwrap();
        assert_eq!(grid.cells_x, 14);
        assert_eq!(grid.cells_y, 14);
        assert_eq!(grid.points.len(), 14 * 14);
    }

    #[test]
    fn points_stay_in_bounds() {
        let p = params(100.0, 60.0, 500);
        let mut rng = MapRng::new(&Seed::Number(3));
        let grid = Grid::build(&p, &mut rng).unwrap();
        for &(x, y) in &grid.points {
            assert!((0.0..=100.0).contains(&x));
            assert!((0.0..=60.0).contains(&y));
        }
        // граничное кольцо лежит снаружи карты
        assert!(grid.boundary.iter().any(|&(x, _)| x < 0.0));
    }

    #[test]
    fn regeneration_predicate_round_trip() {
        let p = params(100.0, 60.0, 500);
        let mut rng = MapRng::new(&Seed::Number(1));
        let grid = Grid::build(&p, &mut rng).unwrap();

        assert!(!grid.should_regenerate(&p));
        assert!(grid.should_regenerate(&params(100.0, 60.0, 600)));
        assert!(grid.should_regenerate(&params(120.0, 60.0, 500)));
        assert!(grid.should_regenerate(&params(100.0, 70.0, 500)));

        let reseeded = MapGenerationParams {
            seed: Seed::Text("abc".into()),
            ..p
        };
        assert!(grid.should_regenerate(&reseeded));
    }

    #[test]
    fn climate_rasters_validated() {
        let p = params(50.0, 50.0, 200);
        let mut rng = MapRng::new(&Seed::Number(0));
        let mut grid = Grid::build(&p, &mut rng).unwrap();
        let n = grid.points.len();

        assert!(grid.set_climate(&[], &vec![5; n]).is_err());
        assert!(grid.set_climate(&vec![10; n - 1], &vec![5; n]).is_err());
        assert!(grid.set_climate(&vec![10; n], &vec![5; n]).is_ok());
    }
}
