// src/rivers.rs
//! Симуляция рек
//!
//! Вода разгоняется по рельефу строго сверху вниз: ячейки суши обходятся по
//! убыванию высоты (при равенстве — по id, чтобы порядок был детерминирован),
//! поэтому каждая ячейка принимает весь сток сверху до того, как отдаст его
//! ниже. Реки адресуются целыми id, начиная с 1; 0 означает «реки нет».
//! Слияния учитываются отдельным буфером confluences, чтобы приток не
//! считался дважды. После разгона короткие русла (< 3 ячеек) отбрасываются,
//! владение ячейками пересобирается только по суше, и при включённом
//! downcutting мощные потоки врезают свои русла в рельеф.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::RiverSettings;
use crate::error::GenerationError;
use crate::features::{Feature, LAND_COAST, NO_HAVEN};
use crate::grid::{Grid, rn};
use crate::pack::Pack;

/// Минимальная длина пути, при которой река сохраняется
const MIN_RIVER_CELLS: usize = 3;
/// Прогрессия ширины для первых контрольных точек русла
const LENGTH_PROGRESSION: [f64; 9] = [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0];
/// Предел врезания русла за один проход
const MAX_DOWNCUT: f64 = 5.0;

/// Контрольная точка русла после меандрирования
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPoint {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Одна река: путь по ячейкам плюс производные величины
///
/// `parent` — id реки, в которую эта впадает; 0 или собственный id означает
/// главное русло. `cells` хранит и замыкающую водную ячейку, но владение в
/// `Pack::river_ids` пересобирается только по суше.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct River {
    pub id: u32,
    pub source: u32,
    pub mouth: u32,
    pub discharge: f64,
    pub length: f64,
    pub width: f64,
    pub width_factor: f64,
    pub source_width: f64,
    pub parent: u32,
    pub cells: Vec<u32>,
    pub points: Vec<FlowPoint>,
}

/// Полный прогон симуляции рек над готовым Pack
///
/// # Ошибки
/// Требует растр осадков на крупной сетке; без него стадия завершается
/// жёсткой ошибкой, не доходя до разгона воды.
pub fn generate(
    pack: &mut Pack,
    grid: &Grid,
    features: &mut [Feature],
    settings: &RiverSettings,
) -> Result<Vec<River>, GenerationError> {
    if grid.precipitation.is_empty() {
        return Err(GenerationError::MissingRaster {
            stage: "симуляция рек",
            raster: "precipitation",
        });
    }

    let n = pack.len();
    pack.flux = vec![0.0; n];
    pack.confluences = vec![0.0; n];
    pack.river_ids = vec![0; n];

    // Поправка на разрешение: осадки заданы на эталонные 10 000 ячеек
    let modifier = (grid.cells_desired as f64 / 10_000.0).powf(0.25);
    let out_cells = lake_out_cells(pack, features);

    let mut river_cells: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    let mut parents: BTreeMap<u32, u32> = BTreeMap::new();
    let mut next_id: u32 = 1;

    // === 1. Разгон воды по рельефу ===
    let mut land: Vec<usize> = (0..n).filter(|&i| pack.is_land(i)).collect();
    land.sort_by_key(|&i| (Reverse(pack.heights[i]), i));

    for &i in &land {
        pack.flux[i] += f64::from(grid.precipitation[pack.grid_cell[i] as usize]) / modifier;

        // Перелив озёр, у которых эта ячейка — точка стока
        let mut drained: Vec<u32> = Vec::new();
        if let Some(lake_ids) = out_cells.get(&(i as u32)) {
            for &lf in lake_ids {
                let (lake_flux, evaporation, primary, inlets) = {
                    let Some(lake) = features[lf as usize].lake.as_ref() else {
                        continue;
                    };
                    (
                        lake.flux,
                        lake.evaporation,
                        lake.primary_inlet.unwrap_or(0),
                        lake.inlets.clone(),
                    )
                };
                if lake_flux <= evaporation {
                    continue;
                }
                let Some(lake_cell) = pack.neighbors[i]
                    .iter()
                    .copied()
                    .filter(|&c| {
                        pack.heights[c as usize] < 20 && pack.feature_ids[c as usize] == lf
                    })
                    .min()
                else {
                    continue;
                };
                let lc = lake_cell as usize;

                // Неиспарившаяся вода озера уходит через точку стока
                pack.flux[lc] += (lake_flux - evaporation).max(0.0);

                // Цепочки озёр сохраняют id главного притока
                if pack.river_ids[lc] != primary || primary == 0 {
                    let same = primary != 0
                        && pack.neighbors[lc]
                            .iter()
                            .any(|&c| pack.river_ids[c as usize] == primary);
                    let id = if same {
                        primary
                    } else {
                        let id = next_id;
                        next_id += 1;
                        id
                    };
                    pack.river_ids[lc] = id;
                    river_cells.entry(id).or_default().push(lake_cell);
                }
                let outlet = pack.river_ids[lc];
                if let Some(lake) = features[lf as usize].lake.as_mut() {
                    lake.outlet = Some(outlet);
                }
                let out_flux = pack.flux[lc];
                flow_down(
                    pack,
                    features,
                    &mut river_cells,
                    &mut parents,
                    i,
                    out_flux,
                    outlet,
                );
                // все притоки озера относятся к бассейну стока
                for inlet in inlets {
                    parents.insert(inlet, outlet);
                }
                drained.push(lf);
            }
        }

        // Приграничная ячейка: вода уходит за край карты
        if pack.near_border[i] && pack.river_ids[i] != 0 {
            continue;
        }

        // Ячейка стока: гавань для береговой суши, иначе самый низкий сосед
        // (для точек перелива — не возвращаясь в только что слитое озеро)
        let min = if !drained.is_empty() {
            lowest_neighbor(pack, i, &drained)
        } else if pack.distance_field[i] == LAND_COAST && pack.haven[i] != NO_HAVEN {
            Some(pack.haven[i] as usize)
        } else {
            lowest_neighbor(pack, i, &[])
        };
        let Some(min) = min else { continue };

        // Впадина или слабый сток: вода передаётся ниже без русла
        if pack.flux[i] < settings.min_flux_to_form_river
            || (pack.is_land(min) && pack.heights[min] >= pack.heights[i])
        {
            if pack.is_land(min) {
                pack.flux[min] += pack.flux[i];
            }
            continue;
        }

        if pack.river_ids[i] == 0 {
            pack.river_ids[i] = next_id;
            river_cells.entry(next_id).or_default().push(i as u32);
            next_id += 1;
        }
        let from_flux = pack.flux[i];
        let river = pack.river_ids[i];
        flow_down(
            pack,
            features,
            &mut river_cells,
            &mut parents,
            min,
            from_flux,
            river,
        );
    }

    // === 2. Сборка рек ===
    let kept: BTreeSet<u32> = river_cells
        .iter()
        .filter(|(_, cells)| cells.len() >= MIN_RIVER_CELLS)
        .map(|(&id, _)| id)
        .collect();
    let default_width_factor = rn(1.0 / modifier, 2);

    let mut rivers = Vec::with_capacity(kept.len());
    for (&id, cells) in &river_cells {
        if !kept.contains(&id) {
            continue;
        }
        let parent = match parents.get(&id) {
            Some(&p) if kept.contains(&p) => p,
            _ => 0,
        };
        // Главное русло шире притоков при том же потоке
        let width_factor = if parent == 0 || parent == id {
            rn(default_width_factor * 1.2, 2)
        } else {
            default_width_factor
        };

        let source = cells[0];
        let mouth = cells[cells.len() - 2];
        let meandered = add_meandering(pack, cells, settings.meandering);
        let discharge = rn(pack.flux[mouth as usize], 2);
        let length = approximate_length(&meandered);
        let width = get_width(get_offset(discharge, meandered.len(), width_factor, 0.0));
        let points = meandered
            .iter()
            .enumerate()
            .map(|(idx, &(x, y, flux))| FlowPoint {
                x: rn(x, 2),
                y: rn(y, 2),
                width: get_width(get_offset(flux, idx, width_factor, 0.0)),
            })
            .collect();

        rivers.push(River {
            id,
            source,
            mouth,
            discharge,
            length,
            width,
            width_factor,
            source_width: 0.0,
            parent,
            cells: cells.clone(),
            points,
        });
    }

    // === 3. Пересборка владения: только суша, вода рекам не принадлежит ===
    // Путь притока включает ячейку слияния, поэтому при переборе рек владение
    // восстанавливается по итогам разгона: ячейка остаётся за большим потоком.
    let flow_owner = std::mem::replace(&mut pack.river_ids, vec![0; n]);
    for river in &rivers {
        for &c in &river.cells {
            let c = c as usize;
            if pack.is_land(c) {
                pack.river_ids[c] = if kept.contains(&flow_owner[c]) {
                    flow_owner[c]
                } else {
                    river.id
                };
            }
        }
    }

    // === 4. Врезание русел ===
    if settings.downcutting {
        downcut(pack);
    }

    Ok(rivers)
}

/// Пропуск воды из ячейки в ячейку ниже с учётом слияний
///
/// Меньший из двух встретившихся потоков становится притоком большего, его
/// вклад пишется в `confluences`, а не в собственный сток ячейки. Вода
/// (высота < 20) завершает путь: для озёр записывается впадающая река.
fn flow_down(
    pack: &mut Pack,
    features: &mut [Feature],
    river_cells: &mut BTreeMap<u32, Vec<u32>>,
    parents: &mut BTreeMap<u32, u32>,
    to: usize,
    from_flux: f64,
    river: u32,
) {
    let to_flux = pack.flux[to] - pack.confluences[to];
    let to_river = pack.river_ids[to];

    if to_river != 0 && to_river != river {
        // слияние: при равенстве потоков пришедшая река уступает
        if from_flux > to_flux {
            pack.confluences[to] += pack.flux[to];
            if pack.is_land(to) {
                parents.insert(to_river, river);
            }
            pack.river_ids[to] = river;
        } else {
            pack.confluences[to] += from_flux;
            if pack.is_land(to) {
                parents.insert(river, to_river);
            }
        }
    } else {
        pack.river_ids[to] = river;
    }

    if pack.heights[to] < 20 {
        // вода: путь заканчивается в принимающем водоёме
        let f = pack.feature_ids[to] as usize;
        if let Some(lake) = features.get_mut(f).and_then(|feat| feat.lake.as_mut()) {
            if lake.primary_inlet.is_none() || from_flux > lake.max_inlet_flux {
                lake.primary_inlet = Some(river);
                lake.max_inlet_flux = from_flux;
            }
            lake.flux += from_flux;
            lake.inlets.push(river);
        }
    } else {
        pack.flux[to] += from_flux;
    }

    river_cells.entry(river).or_default().push(to as u32);
}

/// Самый низкий сосед по (высота, id); `exclude` — фичи, куда сток запрещён
fn lowest_neighbor(pack: &Pack, i: usize, exclude: &[u32]) -> Option<usize> {
    pack.neighbors[i]
        .iter()
        .map(|&c| c as usize)
        .filter(|&c| !exclude.contains(&pack.feature_ids[c]))
        .min_by_key(|&c| (pack.heights[c], c))
}

/// Точка перелива каждого озера: самый низкий сухопутный сосед берега
fn lake_out_cells(pack: &Pack, features: &[Feature]) -> BTreeMap<u32, Vec<u32>> {
    let mut out: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for feature in features {
        let Some(lake) = &feature.lake else { continue };
        let mut best: Option<(u8, u32)> = None;
        for &s in &lake.shoreline {
            for &c in &pack.neighbors[s as usize] {
                if pack.is_land(c as usize) {
                    let key = (pack.heights[c as usize], c);
                    if best.is_none_or(|b| key < b) {
                        best = Some(key);
                    }
                }
            }
        }
        if let Some((_, cell)) = best {
            out.entry(cell).or_default().push(feature.id);
        }
    }
    out
}

/// Врезание русел: мощный поток понижает свою ячейку относительно соседей выше
fn downcut(pack: &mut Pack) {
    for i in 0..pack.len() {
        if pack.heights[i] < 35 {
            continue;
        }
        let higher: Vec<usize> = pack.neighbors[i]
            .iter()
            .map(|&c| c as usize)
            .filter(|&c| pack.heights[c] > pack.heights[i])
            .collect();
        if higher.is_empty() {
            continue;
        }
        let avg = higher.iter().map(|&c| pack.flux[c]).sum::<f64>() / higher.len() as f64;
        if avg <= 0.0 {
            continue;
        }
        let factor = (pack.flux[i] / avg).floor();
        if factor >= 1.0 {
            pack.heights[i] -= factor.min(MAX_DOWNCUT) as u8;
        }
    }
}

/// Контрольные точки русла: между парами ячеек вставляется 0, 1 или 2
/// точки в зависимости от квадрата расстояния и затухающего коэффициента
/// меандра; смещение идёт перпендикулярно направлению отрезка
fn add_meandering(pack: &Pack, cells: &[u32], meandering: f64) -> Vec<(f64, f64, f64)> {
    let last = cells.len() - 1;
    // исток в воде (перелив озера) начинает петлять раньше
    let mut step: u32 = if pack.heights[cells[0] as usize] < 20 {
        1
    } else {
        10
    };

    let mut out = Vec::with_capacity(cells.len() * 2);
    let mut prev_flux = 0.0;
    for i in 0..=last {
        let c = cells[i] as usize;
        let (x1, y1) = pack.points[c];
        // замыкающая водная ячейка наследует поток устья
        let flux = if i == last { prev_flux } else { pack.flux[c] };
        prev_flux = flux;
        out.push((x1, y1, flux));
        if i == last {
            break;
        }

        let (x2, y2) = pack.points[cells[i + 1] as usize];
        let dist2 = (x2 - x1).powi(2) + (y2 - y1).powi(2);
        if dist2 <= 25.0 && cells.len() >= 6 {
            step += 1;
            continue;
        }

        let meander =
            meandering + 1.0 / f64::from(step) + (meandering - f64::from(step) / 100.0).max(0.0);
        let angle = (y2 - y1).atan2(x2 - x1);
        let sin_m = angle.sin() * meander;
        let cos_m = angle.cos() * meander;

        if step < 10 && (dist2 > 64.0 || (dist2 > 36.0 && cells.len() < 5)) {
            // длинный отрезок в начале пути: две дополнительные точки
            out.push((
                (x1 * 2.0 + x2) / 3.0 - sin_m,
                (y1 * 2.0 + y2) / 3.0 + cos_m,
                flux,
            ));
            out.push((
                (x1 + x2 * 2.0) / 3.0 + sin_m / 2.0,
                (y1 + y2 * 2.0) / 3.0 - cos_m / 2.0,
                flux,
            ));
        } else if dist2 > 25.0 || cells.len() < 6 {
            out.push(((x1 + x2) / 2.0 - sin_m, (y1 + y2) / 2.0 + cos_m, flux));
        }
        step += 1;
    }
    out
}

fn approximate_length(points: &[(f64, f64, f64)]) -> f64 {
    let sum = points
        .windows(2)
        .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
        .sum();
    rn(sum, 2)
}

/// Базовое смещение ширины: вклад длины (таблица прогрессии, затем линейный
/// член) плюс вклад потока, насыщающийся к единице
fn get_offset(flux: f64, point_number: usize, width_factor: f64, source_width: f64) -> f64 {
    let flux_term = (flux.max(0.0).powf(0.7) / 500.0).min(1.0);
    let progression = LENGTH_PROGRESSION
        .get(point_number)
        .copied()
        .unwrap_or(34.0);
    let length_term = point_number as f64 / 200.0 + progression / 200.0;
    width_factor * (length_term + flux_term) + source_width
}

fn get_width(offset: f64) -> f64 {
    rn((offset / 1.5).powf(1.8), 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::Biome;
    use crate::config::MapGenerationParams;
    use crate::features::{FeatureKind, LakeData};
    use crate::rng::{MapRng, Seed};

    /// Цепочка ячеек вдоль оси X с шагом 10
    fn chain_pack(heights: Vec<u8>) -> Pack {
        let n = heights.len();
        let points = (0..n).map(|i| (i as f64 * 10.0, 0.0)).collect();
        let neighbors = (0..n)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push((i - 1) as u32);
                }
                if i + 1 < n {
                    v.push((i + 1) as u32);
                }
                v
            })
            .collect();
        Pack {
            points,
            grid_cell: (0..n as u32).collect(),
            heights,
            neighbors,
            vertices_of_cell: vec![vec![]; n],
            near_border: vec![false; n],
            vertex_points: vec![],
            area: vec![1.0; n],
            feature_ids: vec![0; n],
            distance_field: vec![0; n],
            haven: vec![NO_HAVEN; n],
            harbor: vec![0; n],
            flux: vec![0.0; n],
            confluences: vec![0.0; n],
            river_ids: vec![0; n],
            biomes: vec![Biome::Marine; n],
        }
    }

    /// Эталонная сетка (10 000 ячеек, модификатор 1) с равномерными осадками
    fn flat_grid(prec: u8) -> Grid {
        let params = MapGenerationParams::default();
        let mut rng = MapRng::new(&Seed::Number(0));
        let mut grid = Grid::build(&params, &mut rng).unwrap();
        let n = grid.points.len();
        grid.set_climate(&vec![10; n], &vec![prec; n]).unwrap();
        grid
    }

    fn land_feature(id: u32) -> Feature {
        Feature {
            id,
            land: true,
            border: false,
            kind: FeatureKind::Island,
            cells: 1,
            first_cell: 0,
            group: None,
            lake: None,
        }
    }

    fn ocean_feature(id: u32) -> Feature {
        Feature {
            id,
            land: false,
            border: true,
            kind: FeatureKind::Ocean,
            cells: 1,
            first_cell: 0,
            group: None,
            lake: None,
        }
    }

    fn lake_feature(id: u32, shoreline: Vec<u32>, evaporation: f64) -> Feature {
        Feature {
            id,
            land: false,
            border: false,
            kind: FeatureKind::Lake,
            cells: shoreline.len() as u32,
            first_cell: shoreline[0],
            group: None,
            lake: Some(LakeData {
                surface_height: 9.9,
                shoreline,
                inlets: Vec::new(),
                outlet: None,
                primary_inlet: None,
                max_inlet_flux: 0.0,
                flux: 0.0,
                evaporation,
            }),
        }
    }

    fn no_downcut() -> RiverSettings {
        RiverSettings {
            downcutting: false,
            ..RiverSettings::default()
        }
    }

    #[test]
    fn ramp_forms_single_monotonic_river() {
        let mut pack = chain_pack(vec![80, 70, 60, 50, 40, 30, 10]);
        pack.feature_ids[6] = 1;
        let mut features = vec![land_feature(0), ocean_feature(1)];
        let grid = flat_grid(50);

        let rivers = generate(&mut pack, &grid, &mut features, &no_downcut()).unwrap();

        assert_eq!(rivers.len(), 1);
        let river = &rivers[0];
        assert_eq!(river.id, 1);
        assert_eq!(river.source, 0);
        assert_eq!(river.mouth, 5);
        assert_eq!(river.cells, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!((river.discharge - 300.0).abs() < 1e-9);
        assert_eq!(river.parent, 0);

        // высоты вдоль сухопутного пути не возрастают
        let land_path: Vec<u8> = river
            .cells
            .iter()
            .filter(|&&c| pack.is_land(c as usize))
            .map(|&c| pack.heights[c as usize])
            .collect();
        assert!(land_path.windows(2).all(|w| w[1] <= w[0]));

        // владение только по суше
        assert!((0..=5).all(|c| pack.river_ids[c] == 1));
        assert_eq!(pack.river_ids[6], 0);

        // шаг 10 между ячейками: по одной точке меандра на отрезок
        assert_eq!(river.points.len(), 7 + 6);
        assert!(river.length >= 60.0);
        assert!(river.width > 0.0);
    }

    #[test]
    fn weak_flow_is_forwarded_without_river() {
        let mut pack = chain_pack(vec![80, 70, 60, 10]);
        pack.feature_ids[3] = 1;
        let mut features = vec![land_feature(0), ocean_feature(1)];
        let grid = flat_grid(5);

        let rivers = generate(&mut pack, &grid, &mut features, &no_downcut()).unwrap();

        assert!(rivers.is_empty());
        assert!(pack.river_ids.iter().all(|&r| r == 0));
        // сток всё равно накапливается вниз по склону
        assert!((pack.flux[2] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn confluence_smaller_river_becomes_tributary() {
        // Y-образный сток: две ветви сливаются в ячейке 4
        let mut pack = chain_pack(vec![90, 80, 85, 75, 60, 40, 5]);
        pack.points = vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (0.0, 20.0),
            (10.0, 20.0),
            (20.0, 10.0),
            (30.0, 10.0),
            (40.0, 10.0),
        ];
        pack.neighbors = vec![
            vec![1],
            vec![0, 4],
            vec![3],
            vec![2, 4],
            vec![1, 3, 5],
            vec![4, 6],
            vec![5],
        ];
        pack.feature_ids[6] = 1;
        let mut features = vec![land_feature(0), ocean_feature(1)];
        let grid = flat_grid(50);

        let rivers = generate(&mut pack, &grid, &mut features, &no_downcut()).unwrap();

        assert_eq!(rivers.len(), 2);
        let main = rivers.iter().find(|r| r.id == 1).unwrap();
        let tributary = rivers.iter().find(|r| r.id == 2).unwrap();

        assert_eq!(main.cells, vec![0, 1, 4, 5, 6]);
        assert_eq!(main.parent, 0);
        assert_eq!(tributary.cells, vec![2, 3, 4]);
        assert_eq!(tributary.parent, 1);
        assert_eq!(tributary.mouth, 3);
        assert!(main.width_factor > tributary.width_factor);

        // сохранение потока в слиянии: приток учтён отдельно и ровно один раз
        assert!((pack.confluences[4] - 100.0).abs() < 1e-9);
        assert!((pack.flux[4] - 250.0).abs() < 1e-9); // 100 + 100 + свои осадки

        // владение после пересборки: слияние остаётся за большим потоком,
        // приток сохраняет собственные ячейки
        assert_eq!(pack.river_ids[4], 1);
        assert_eq!(pack.river_ids[3], 2);
        assert_eq!(pack.river_ids[1], 1);
    }

    #[test]
    fn tiny_rivers_are_discarded() {
        let mut pack = chain_pack(vec![50, 10]);
        pack.feature_ids[1] = 1;
        let mut features = vec![land_feature(0), ocean_feature(1)];
        let grid = flat_grid(50);

        let rivers = generate(&mut pack, &grid, &mut features, &no_downcut()).unwrap();

        assert!(rivers.is_empty());
        assert!(pack.river_ids.iter().all(|&r| r == 0));
    }

    #[test]
    fn downcutting_is_capped() {
        let mut pack = chain_pack(vec![90, 40, 5]);
        pack.feature_ids[2] = 1;
        let mut features = vec![land_feature(0), ocean_feature(1)];
        let mut grid = flat_grid(10);
        grid.precipitation[1] = 255; // ливень над ячейкой 1

        generate(&mut pack, &grid, &mut features, &RiverSettings::default()).unwrap();

        // поток 265 против среднего 10 у соседей выше: фактор 26, срез не более 5
        assert_eq!(pack.heights[1], 35);
        assert_eq!(pack.heights[0], 90);
    }

    #[test]
    fn lake_records_inlet_and_outlet() {
        // исток → озеро (ячейка 2) → точка перелива (ячейка 3) → океан
        let mut pack = chain_pack(vec![80, 50, 10, 30, 25, 5]);
        pack.feature_ids[2] = 1;
        pack.feature_ids[5] = 2;
        let mut features = vec![
            land_feature(0),
            lake_feature(1, vec![2], 5.0),
            ocean_feature(2),
        ];
        let grid = flat_grid(50);

        let rivers = generate(&mut pack, &grid, &mut features, &no_downcut()).unwrap();

        assert_eq!(rivers.len(), 1);
        let river = &rivers[0];
        assert_eq!(river.cells, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(river.source, 0);
        assert_eq!(river.mouth, 4);
        assert_eq!(river.parent, 1); // сквозь озеро река сохраняет идентичность

        let lake = features[1].lake.as_ref().unwrap();
        assert_eq!(lake.inlets, vec![1]);
        assert_eq!(lake.primary_inlet, Some(1));
        assert!((lake.max_inlet_flux - 100.0).abs() < 1e-9);
        assert!((lake.flux - 100.0).abs() < 1e-9);
        assert_eq!(lake.outlet, Some(1));

        // перелив: 100 притока минус 5 испарения плюс свои осадки
        assert!((pack.flux[3] - 145.0).abs() < 1e-9);
    }

    #[test]
    fn water_sourced_path_meanders_early() {
        let mut pack = chain_pack(vec![10, 50, 40]);
        pack.flux = vec![100.0, 120.0, 140.0];
        // шаг стартует с 1: два лишних сегмента на первой паре
        let meandered = add_meandering(&pack, &[0, 1, 2], 0.5);
        assert_eq!(meandered.len(), 3 + 2 + 2);

        let land_start = add_meandering(&pack, &[1, 2, 0], 0.5);
        assert_eq!(land_start.len(), 3 + 1 + 1);
    }

    #[test]
    fn width_grows_with_flux_and_length() {
        let wf = 1.2;
        assert!(get_offset(100.0, 0, wf, 0.0) < get_offset(400.0, 0, wf, 0.0));
        assert!(get_offset(100.0, 2, wf, 0.0) < get_offset(100.0, 40, wf, 0.0));
        // вклад потока насыщается к единице
        let saturated = get_offset(1e9, 0, wf, 0.0);
        assert!((saturated - wf * (1.0 / 200.0 + 1.0)).abs() < 1e-9);
        assert!(get_width(3.0) > get_width(1.5));
    }
}
