// src/biomes.rs
//! Классификация биомов
//!
//! Биом — чисто производная величина: высота, температура, влажность и
//! наличие реки однозначно задают его через фиксированную матрицу 5×26
//! (полоса влажности × полоса температуры). Перед матрицей идут четыре
//! приоритетных правила: море, ледник, жаркая пустыня, болото. Стадия
//! пишет только буфер биомов и ничего больше не трогает.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::grid::{Grid, rn};
use crate::pack::Pack;

/// Биом ячейки; порядковые номера стабильны и попадают в выходной датасет
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Biome {
    Marine,
    HotDesert,
    ColdDesert,
    Savanna,
    Grassland,
    TropicalSeasonalForest,
    TemperateDeciduousForest,
    TropicalRainforest,
    TemperateRainforest,
    Taiga,
    Tundra,
    Glacier,
    Wetland,
}

impl Biome {
    pub fn to_rgb(&self) -> [u8; 3] {
        match self {
            Biome::Marine => [70, 110, 171],
            Biome::HotDesert => [251, 226, 156],
            Biome::ColdDesert => [183, 210, 186],
            Biome::Savanna => [212, 255, 130],
            Biome::Grassland => [178, 214, 102],
            Biome::TropicalSeasonalForest => [182, 212, 94],
            Biome::TemperateDeciduousForest => [41, 187, 135],
            Biome::TropicalRainforest => [126, 176, 94],
            Biome::TemperateRainforest => [64, 155, 67],
            Biome::Taiga => [75, 111, 57],
            Biome::Tundra => [214, 217, 159],
            Biome::Glacier => [215, 227, 249],
            Biome::Wetland => [12, 200, 165],
        }
    }
}

use Biome::{
    ColdDesert as CD, Grassland as GR, HotDesert as HD, Savanna as SA, Taiga as TA,
    TemperateDeciduousForest as DF, TemperateRainforest as RF, TropicalRainforest as TR,
    TropicalSeasonalForest as SF, Tundra as TU,
};

/// Матрица биомов: строки — полосы влажности (сухо → влажно),
/// столбцы — полосы температуры (жарко → холодно, `20 - t`, 0..=25)
#[rustfmt::skip]
const BIOME_MATRIX: [[Biome; 26]; 5] = [
    [HD, HD, HD, HD, HD, HD, SA, SA, SA, SA, SA, SA, SA, SA, SA, SA, SA, SA, SA, SA, CD, CD, CD, CD, CD, CD],
    [SA, SA, SA, SA, SA, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, GR, TU, TU, TU, TU, TU, TU],
    [SF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, TA, TA, TA, TA, TA, TU, TU],
    [SF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, DF, TA, TA, TA, TA, TA, TA, TA, TU, TU],
    [TR, TR, TR, TR, TR, RF, RF, RF, RF, RF, RF, RF, RF, RF, RF, RF, RF, TA, TA, TA, TA, TA, TA, TA, TU, TU],
];

/// Назначает биом каждой ячейке Pack
///
/// # Ошибки
/// Растры климата обязаны быть загружены в сетку до вызова; их отсутствие —
/// жёсткая ошибка стадии, генерация не продолжается с частичными данными.
pub fn classify(pack: &mut Pack, grid: &Grid) -> Result<(), GenerationError> {
    if grid.temperature.is_empty() {
        return Err(GenerationError::MissingRaster {
            stage: "классификация биомов",
            raster: "temperature",
        });
    }
    if grid.precipitation.is_empty() {
        return Err(GenerationError::MissingRaster {
            stage: "классификация биомов",
            raster: "precipitation",
        });
    }

    for i in 0..pack.len() {
        let temperature = f64::from(grid.temperature[pack.grid_cell[i] as usize]);
        let moisture = if pack.is_land(i) {
            calculate_moisture(pack, grid, i)
        } else {
            0.0
        };
        pack.biomes[i] = get_biome(
            moisture,
            temperature,
            pack.heights[i],
            pack.river_ids[i] != 0,
        );
    }
    Ok(())
}

/// Влажность ячейки: осадки плюс бонус реки, усреднённые с осадками
/// соседей той же или большей высоты (вода вниз по склону не приходит)
fn calculate_moisture(pack: &Pack, grid: &Grid, i: usize) -> f64 {
    let mut moist = f64::from(grid.precipitation[pack.grid_cell[i] as usize]);
    if pack.river_ids[i] != 0 {
        moist += (pack.flux[i] / 10.0).max(2.0);
    }

    let mut values = vec![moist];
    for &c in &pack.neighbors[i] {
        let c = c as usize;
        if pack.is_land(c) && pack.heights[c] >= pack.heights[i] {
            values.push(f64::from(grid.precipitation[pack.grid_cell[c] as usize]));
        }
    }
    rn(4.0 + values.iter().sum::<f64>() / values.len() as f64, 1)
}

/// Приоритетные правила, затем матрица влажность × температура
#[must_use]
pub fn get_biome(moisture: f64, temperature: f64, height: u8, has_river: bool) -> Biome {
    if height < 20 {
        return Biome::Marine;
    }
    if temperature < -5.0 {
        return Biome::Glacier;
    }
    if temperature >= 25.0 && !has_river && moisture < 8.0 {
        return Biome::HotDesert;
    }
    if is_wetland(moisture, temperature, height) {
        return Biome::Wetland;
    }

    let moisture_band = ((moisture / 5.0).floor() as usize).min(4);
    let temperature_band = (20.0 - temperature).clamp(0.0, 25.0) as usize;
    BIOME_MATRIX[moisture_band][temperature_band]
}

/// Болота: мокрые низины и умеренно мокрые средние высоты, без мороза
fn is_wetland(moisture: f64, temperature: f64, height: u8) -> bool {
    if temperature <= -2.0 {
        return false;
    }
    if moisture > 40.0 && height < 25 {
        return true;
    }
    moisture > 24.0 && height > 24 && height < 60
}
