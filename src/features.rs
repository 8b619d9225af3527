// src/features.rs
//! Классификация фич: океаны, озёра, острова
//!
//! Однопроходная заливка по ячейкам одного состояния (суша↔суша, вода↔вода)
//! разбивает карту на связные компоненты; каждая ячейка принадлежит ровно
//! одной фиче, фича 0 всегда засевается из ячейки 0. Затем от берега в обе
//! стороны расслабляется знаковое поле расстояния. Высоты стадия только
//! читает — пишутся лишь метаданные фич и расстояний.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::pack::Pack;
use crate::tessellation::CellGraph;

/// Ячейка без контакта с берегом на всём связном пути
pub const UNMARKED: i8 = 0;
/// Суша, граничащая с водой
pub const LAND_COAST: i8 = 1;
/// Вода, граничащая с сушей
pub const WATER_COAST: i8 = -1;
/// Второе кольцо воды от берега
pub const DEEPER_WATER: i8 = -2;
/// Предел удаления вглубь суши
pub const MAX_INLAND: i8 = 127;
/// Нижний предел удаления в океан
pub const MIN_WATER: i8 = -10;
/// «Гавани нет» для внутренних ячеек
pub const NO_HAVEN: u32 = u32::MAX;

/// Тип связной компоненты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Ocean,
    Lake,
    Island,
}

/// Подгруппа суши по относительному размеру (пороги считаются от числа
/// ячеек крупной сетки, поэтому не зависят от разрешения Pack)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IslandGroup {
    Continent,
    Island,
    Isle,
    LakeIsland,
}

/// Производные данные озера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LakeData {
    /// Высота зеркала: минимум по береговым ячейкам минус 0.1
    pub surface_height: f64,
    /// Ячейки озера, касающиеся берега
    pub shoreline: Vec<u32>,
    /// Id впадающих рек
    pub inlets: Vec<u32>,
    /// Id вытекающей реки
    pub outlet: Option<u32>,
    /// Главный приток — с максимальным потоком среди впадающих
    pub primary_inlet: Option<u32>,
    pub max_inlet_flux: f64,
    /// Суммарный приток воды
    pub flux: f64,
    /// Оценка испарения с зеркала
    pub evaporation: f64,
}

/// Одна связная компонента ячеек одного состояния
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: u32,
    pub land: bool,
    /// Касается края карты (вода с границей — океан, не озеро)
    pub border: bool,
    pub kind: FeatureKind,
    pub cells: u32,
    pub first_cell: u32,
    pub group: Option<IslandGroup>,
    pub lake: Option<LakeData>,
}

struct Markup {
    feature_ids: Vec<u32>,
    distance: Vec<i8>,
    features: Vec<Feature>,
}

/// Заливка связных компонент явной очередью (без рекурсии: ячеек десятки тысяч)
fn markup(heights: &[u8], neighbors: &[Vec<u32>], near_border: &[bool]) -> Markup {
    let n = heights.len();
    let mut feature_ids = vec![u32::MAX; n];
    let mut distance = vec![UNMARKED; n];
    let mut features: Vec<Feature> = Vec::new();
    let mut queue = VecDeque::new();

    for seed in 0..n {
        if feature_ids[seed] != u32::MAX {
            continue;
        }
        let id = features.len() as u32;
        let land = heights[seed] >= 20;
        let mut border = false;
        let mut count = 0u32;

        feature_ids[seed] = id;
        queue.push_back(seed);
        while let Some(q) = queue.pop_front() {
            count += 1;
            if near_border[q] {
                border = true;
            }
            for &c in &neighbors[q] {
                let c = c as usize;
                let c_land = heights[c] >= 20;
                if land == c_land {
                    if feature_ids[c] == u32::MAX {
                        feature_ids[c] = id;
                        queue.push_back(c);
                    }
                } else if land {
                    // контакт суша-вода: метки побережья с обеих сторон
                    if distance[q] == UNMARKED {
                        distance[q] = LAND_COAST;
                    }
                    if distance[c] == UNMARKED {
                        distance[c] = WATER_COAST;
                    }
                }
            }
        }

        let kind = if land {
            FeatureKind::Island
        } else if border {
            FeatureKind::Ocean
        } else {
            FeatureKind::Lake
        };
        features.push(Feature {
            id,
            land,
            border,
            kind,
            cells: count,
            first_cell: seed as u32,
            group: None,
            lake: None,
        });
    }

    // Расслабление поля расстояния от береговых меток в обе стороны
    relax(&mut distance, heights, neighbors, LAND_COAST, MAX_INLAND, true);
    relax(&mut distance, heights, neighbors, WATER_COAST, MIN_WATER, false);

    Markup {
        feature_ids,
        distance,
        features,
    }
}

/// BFS от береговых меток: +1 за шаг вглубь суши либо −1 за шаг в воду
fn relax(
    distance: &mut [i8],
    heights: &[u8],
    neighbors: &[Vec<u32>],
    from: i8,
    limit: i8,
    land: bool,
) {
    let mut queue: VecDeque<usize> = (0..distance.len()).filter(|&i| distance[i] == from).collect();
    while let Some(q) = queue.pop_front() {
        let next = if land {
            distance[q].saturating_add(1).min(limit)
        } else {
            distance[q].saturating_sub(1).max(limit)
        };
        for &c in &neighbors[q] {
            let c = c as usize;
            if (heights[c] >= 20) != land || distance[c] != UNMARKED {
                continue;
            }
            distance[c] = next;
            queue.push_back(c);
        }
    }
}

/// Разметка крупной сетки (до построения Pack)
pub fn markup_grid(grid: &mut Grid, graph: &CellGraph) -> Vec<Feature> {
    let m = markup(&grid.heights, &graph.neighbors, &graph.near_border);
    grid.feature_ids = m.feature_ids;
    grid.distance_field = m.distance;
    m.features
}

/// Разметка Pack: фичи, гавани, озёра и группировка островов
pub fn markup_pack(pack: &mut Pack, grid: &Grid) -> Vec<Feature> {
    let m = markup(&pack.heights, &pack.neighbors, &pack.near_border);
    pack.feature_ids = m.feature_ids;
    pack.distance_field = m.distance;
    let mut features = m.features;

    define_havens(pack);
    group_islands(pack, grid, &mut features);
    define_lakes(pack, grid, &mut features);
    features
}

/// Гавань — ближайший водный сосед береговой суши; якорность — число
/// водных соседей. Равные расстояния разрешаются меньшим индексом.
fn define_havens(pack: &mut Pack) {
    for i in 0..pack.len() {
        if pack.distance_field[i] != LAND_COAST {
            continue;
        }
        let (x, y) = pack.points[i];
        let mut best = NO_HAVEN;
        let mut best_d = f64::INFINITY;
        let mut water = 0u32;
        for &c in &pack.neighbors[i] {
            let ci = c as usize;
            if pack.is_land(ci) {
                continue;
            }
            water += 1;
            let (cx, cy) = pack.points[ci];
            let d2 = (x - cx).powi(2) + (y - cy).powi(2);
            if d2 < best_d || (d2 == best_d && c < best) {
                best_d = d2;
                best = c;
            }
        }
        pack.haven[i] = best;
        pack.harbor[i] = water.min(255) as u8;
    }
}

/// Группировка суши: континент/остров/островок относительно крупной сетки,
/// остров в озере — отдельная группа
fn group_islands(pack: &Pack, grid: &Grid, features: &mut [Feature]) {
    let grid_cells = grid.points.len() as f64;

    // первая встреченная водная фича рядом с каждой сухопутной
    let mut adjacent_water: BTreeMap<u32, u32> = BTreeMap::new();
    for i in 0..pack.len() {
        if !pack.is_land(i) {
            continue;
        }
        let f = pack.feature_ids[i];
        if adjacent_water.contains_key(&f) {
            continue;
        }
        for &c in &pack.neighbors[i] {
            if !pack.is_land(c as usize) {
                adjacent_water.insert(f, pack.feature_ids[c as usize]);
                break;
            }
        }
    }

    let kinds: Vec<FeatureKind> = features.iter().map(|f| f.kind).collect();
    for feature in features.iter_mut() {
        if !feature.land {
            continue;
        }
        let in_lake = adjacent_water
            .get(&feature.id)
            .is_some_and(|&w| kinds.get(w as usize) == Some(&FeatureKind::Lake));
        feature.group = Some(if in_lake {
            IslandGroup::LakeIsland
        } else if f64::from(feature.cells) > grid_cells / 10.0 {
            IslandGroup::Continent
        } else if f64::from(feature.cells) > grid_cells / 1000.0 {
            IslandGroup::Island
        } else {
            IslandGroup::Isle
        });
    }
}

/// Высота зеркала, береговая линия и испарение для каждого озера
fn define_lakes(pack: &Pack, grid: &Grid, features: &mut [Feature]) {
    for feature in features.iter_mut() {
        if feature.kind != FeatureKind::Lake {
            continue;
        }

        let shoreline: Vec<u32> = (0..pack.len())
            .filter(|&i| {
                pack.feature_ids[i] == feature.id && pack.distance_field[i] == WATER_COAST
            })
            .map(|i| i as u32)
            .collect();

        // Мягкая деградация: без береговой линии берём высоту первой ячейки
        let surface_height = shoreline
            .iter()
            .map(|&i| f64::from(pack.heights[i as usize]))
            .fold(f64::INFINITY, f64::min);
        let surface_height = if surface_height.is_finite() {
            surface_height - 0.1
        } else {
            f64::from(pack.heights[feature.first_cell as usize])
        };

        let g = pack.grid_cell[feature.first_cell as usize] as usize;
        let t = grid.temperature.get(g).copied().unwrap_or(0);
        let evaporation = lake_evaporation(f64::from(t), surface_height, feature.cells);

        feature.lake = Some(LakeData {
            surface_height,
            shoreline,
            inlets: Vec::new(),
            outlet: None,
            primary_inlet: None,
            max_inlet_flux: 0.0,
            flux: 0.0,
            evaporation,
        });
    }
}

/// Оценка испарения с зеркала озера
fn lake_evaporation(temperature: f64, height: f64, cells: u32) -> f64 {
    let per_cell = ((700.0 * (temperature + 0.006 * height) / 50.0 + 75.0)
        / (80.0 - temperature.min(79.0)))
    .max(0.0);
    per_cell * f64::from(cells)
}
