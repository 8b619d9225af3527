// src/pack.rs
//! Плотная перетесселяция для выходного разрешения
//!
//! Pack — производные данные: он никогда не переживает породившую его сетку и
//! перестраивается вместе с ней. Точки берутся из ячеек сетки с прореживанием
//! глубокой воды и уплотнением побережья, затем прогоняются через поставщика
//! тесселяции заново. Ячейки ссылаются на фичи и реки только целыми id.

use crate::biomes::Biome;
use crate::features::{DEEPER_WATER, Feature, FeatureKind, LAND_COAST, NO_HAVEN, WATER_COAST};
use crate::grid::{Grid, Point, rn};
use crate::tessellation::{CellGraph, Tessellate, cell_area};

/// Плотная сетка вывода с растрами всех последующих стадий
#[derive(Debug, Clone)]
pub struct Pack {
    pub points: Vec<Point>,
    /// Обратная ссылка на ячейку крупной сетки
    pub grid_cell: Vec<u32>,
    pub heights: Vec<u8>,
    pub neighbors: Vec<Vec<u32>>,
    pub vertices_of_cell: Vec<Vec<u32>>,
    pub near_border: Vec<bool>,
    pub vertex_points: Vec<Point>,
    pub area: Vec<f64>,

    /// Id фичи каждой ячейки (классификатор фич)
    pub feature_ids: Vec<u32>,
    /// Знаковое поле расстояния до берега (классификатор фич)
    pub distance_field: Vec<i8>,
    /// Ближайшая водная ячейка для береговой суши (классификатор фич)
    pub haven: Vec<u32>,
    /// Число водных соседей береговой суши (классификатор фич)
    pub harbor: Vec<u8>,

    /// Накопленный поток (симулятор рек)
    pub flux: Vec<f64>,
    /// Вклад притоков в слияниях, отдельно от собственного потока
    pub confluences: Vec<f64>,
    /// Id реки, владеющей ячейкой; 0 — реки нет (симулятор рек)
    pub river_ids: Vec<u32>,

    /// Биом каждой ячейки (классификатор биомов)
    pub biomes: Vec<Biome>,
}

impl Pack {
    /// Перетесселяция области сетки через внешнего поставщика
    #[must_use]
    pub fn build(
        grid: &Grid,
        graph: &CellGraph,
        grid_features: &[Feature],
        provider: &dyn Tessellate,
    ) -> Self {
        let spacing2 = grid.spacing * grid.spacing;
        let mut points = Vec::new();
        let mut grid_cell: Vec<u32> = Vec::new();
        let mut heights = Vec::new();

        for i in 0..grid.points.len() {
            let h = grid.heights[i];
            let t = grid.distance_field[i];

            // Глубокая вода прорежается: рендеру нужна не вся толща океана
            if h < 20 && t != WATER_COAST && t != DEEPER_WATER {
                continue;
            }
            if t == DEEPER_WATER {
                let f = grid.feature_ids[i] as usize;
                let in_lake = grid_features
                    .get(f)
                    .is_some_and(|feat| feat.kind == FeatureKind::Lake);
                if i % 4 == 0 || in_lake {
                    continue;
                }
            }

            let (x, y) = grid.points[i];
            points.push((x, y));
            grid_cell.push(i as u32);
            heights.push(h);

            // Уплотнение побережья: середины рёбер между соседями того же типа
            if t == LAND_COAST || t == WATER_COAST {
                if graph.near_border[i] {
                    continue;
                }
                for &e in &graph.neighbors[i] {
                    let e = e as usize;
                    if i > e {
                        continue;
                    }
                    if grid.distance_field[e] != t {
                        continue;
                    }
                    let (ex, ey) = grid.points[e];
                    let dist2 = (x - ex).powi(2) + (y - ey).powi(2);
                    if dist2 < spacing2 {
                        continue; // слишком близко друг к другу
                    }
                    points.push((rn((x + ex) / 2.0, 1), rn((y + ey) / 2.0, 1)));
                    grid_cell.push(i as u32);
                    heights.push(h);
                }
            }
        }

        let pg = provider.tessellate(&points, &grid.boundary, grid.width, grid.height);
        let n = points.len();
        let area = (0..n).map(|c| cell_area(&pg, c)).collect();

        Self {
            points,
            grid_cell,
            heights,
            neighbors: pg.neighbors,
            vertices_of_cell: pg.vertices_of_cell,
            near_border: pg.near_border,
            vertex_points: pg.vertex_points,
            area,
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

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Суша: высота ≥ 20
    #[must_use]
    pub fn is_land(&self, i: usize) -> bool {
        self.heights[i] >= 20
    }
}
