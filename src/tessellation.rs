// src/tessellation.rs
//! Интерфейс поставщика тесселяции
//!
//! Движок не строит диаграмму Вороного сам: он потребляет готовую смежность
//! через трейт [`Tessellate`] и считает её чистой функцией от набора точек.
//! В комплекте есть вырожденный поставщик [`LatticeTessellation`], который
//! выводит смежность из квадратных корзин решётки — его хватает для CLI и
//! тестов, а настоящий поставщик Вороного/Делоне подключается тем же трейтом.

use crate::grid::Point;

/// Смежность ячеек и вершины полигонов, выданные поставщиком тесселяции
#[derive(Debug, Clone)]
pub struct CellGraph {
    /// Точки-ячейки (копия входного набора)
    pub points: Vec<Point>,
    /// Соседние ячейки для каждой ячейки
    pub neighbors: Vec<Vec<u32>>,
    /// Вершины полигона каждой ячейки
    pub vertices_of_cell: Vec<Vec<u32>>,
    /// Касается ли ячейка края карты
    pub near_border: Vec<bool>,
    /// Координаты вершин
    pub vertex_points: Vec<Point>,
    /// Ячейки, сходящиеся в вершине
    pub vertex_cells: Vec<Vec<u32>>,
    /// Смежные вершины каждой вершины
    pub vertex_neighbors: Vec<Vec<u32>>,
}

/// Поставщик тесселяции: точки + граничное кольцо → смежность
pub trait Tessellate {
    fn tessellate(&self, points: &[Point], boundary: &[Point], width: f64, height: f64)
    -> CellGraph;
}

/// Вырожденный поставщик: смежность по корзинам квадратной решётки
///
/// Каждая точка попадает в корзину `spacing × spacing`; соседями считаются
/// точки той же и восьми окрестных корзин. Для недрожащей решётки с одной
/// точкой на корзину это в точности 8-связная решётка. Полигоны ячеек —
/// углы корзин, поэтому у уплотнённых наборов точек они совпадают: настоящие
/// полигоны даёт только внешний поставщик Вороного.
#[derive(Debug, Clone, Copy)]
pub struct LatticeTessellation {
    spacing: f64,
}

impl LatticeTessellation {
    #[must_use]
    pub fn new(spacing: f64) -> Self {
        Self { spacing }
    }
}

impl Tessellate for LatticeTessellation {
    fn tessellate(
        &self,
        points: &[Point],
        _boundary: &[Point],
        width: f64,
        height: f64,
    ) -> CellGraph {
        // Число корзин совпадает с формулой cells_x/cells_y крупной сетки,
        // иначе крайний ряд решётки не распознаётся как граничный
        let s = self.spacing;
        let bx = (((width + 0.5 * s - 1e-10) / s).floor() as usize).max(1);
        let by = (((height + 0.5 * s - 1e-10) / s).floor() as usize).max(1);

        let bucket_of = |x: f64, y: f64| -> (usize, usize) {
            (
                ((x / s) as usize).min(bx - 1),
                ((y / s) as usize).min(by - 1),
            )
        };

        // Раскладываем точки по корзинам
        let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); bx * by];
        for (i, &(x, y)) in points.iter().enumerate() {
            let (cx, cy) = bucket_of(x, y);
            buckets[cy * bx + cx].push(i as u32);
        }

        let mut neighbors = vec![Vec::new(); points.len()];
        let mut near_border = vec![false; points.len()];
        for (i, &(x, y)) in points.iter().enumerate() {
            let (cx, cy) = bucket_of(x, y);
            near_border[i] = cx == 0 || cy == 0 || cx == bx - 1 || cy == by - 1;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = cx as i64 + dx;
                    let ny = cy as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= bx as i64 || ny >= by as i64 {
                        continue;
                    }
                    for &p in &buckets[ny as usize * bx + nx as usize] {
                        if p as usize != i {
                            neighbors[i].push(p);
                        }
                    }
                }
            }
        }

        // Вершины — углы корзин; у точек одной корзины полигон общий
        let vx = bx + 1;
        let vertex_points: Vec<Point> = (0..(bx + 1) * (by + 1))
            .map(|v| {
                let cx = (v % vx) as f64;
                let cy = (v / vx) as f64;
                ((cx * s).min(width), (cy * s).min(height))
            })
            .collect();

        let corner_ids = |cx: usize, cy: usize| -> Vec<u32> {
            vec![
                (cy * vx + cx) as u32,
                (cy * vx + cx + 1) as u32,
                ((cy + 1) * vx + cx + 1) as u32,
                ((cy + 1) * vx + cx) as u32,
            ]
        };

        let mut vertices_of_cell = Vec::with_capacity(points.len());
        let mut vertex_cells: Vec<Vec<u32>> = vec![Vec::new(); vertex_points.len()];
        for &(x, y) in points {
            let (cx, cy) = bucket_of(x, y);
            let corners = corner_ids(cx, cy);
            for &v in &corners {
                vertex_cells[v as usize].push(vertices_of_cell.len() as u32);
            }
            vertices_of_cell.push(corners);
        }

        let mut vertex_neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_points.len()];
        for v in 0..vertex_points.len() {
            let cx = v % vx;
            let cy = v / vx;
            if cx > 0 {
                vertex_neighbors[v].push((v - 1) as u32);
            }
            if cx + 1 < vx {
                vertex_neighbors[v].push((v + 1) as u32);
            }
            if cy > 0 {
                vertex_neighbors[v].push((v - vx) as u32);
            }
            if v + vx < vertex_points.len() {
                vertex_neighbors[v].push((v + vx) as u32);
            }
        }

        CellGraph {
            points: points.to_vec(),
            neighbors,
            vertices_of_cell,
            near_border,
            vertex_points,
            vertex_cells,
            vertex_neighbors,
        }
    }
}

/// Площадь полигона ячейки по формуле шнуровки
#[must_use]
pub fn cell_area(graph: &CellGraph, cell: usize) -> f64 {
    let verts = &graph.vertices_of_cell[cell];
    if verts.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..verts.len() {
        let (x1, y1) = graph.vertex_points[verts[i] as usize];
        let (x2, y2) = graph.vertex_points[verts[(i + 1) % verts.len()] as usize];
        sum += x1 * y2 - x2 * y1;
    }
    (sum / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Недрожащая решётка 3×3 с шагом 1
    fn lattice3() -> (Vec<Point>, CellGraph) {
        let points: Vec<Point> = (0..9)
            .map(|i| (0.5 + (i % 3) as f64, 0.5 + (i / 3) as f64))
            .collect();
        let graph = LatticeTessellation::new(1.0).tessellate(&points, &[], 3.0, 3.0);
        (points, graph)
    }

    #[test]
    fn plain_lattice_has_eight_connectivity() {
        let (_, graph) = lattice3();
        assert_eq!(graph.neighbors[4].len(), 8); // центр
        assert_eq!(graph.neighbors[0].len(), 3); // угол
        assert!(graph.near_border[0]);
        assert!(!graph.near_border[4]);
    }

    #[test]
    fn cell_areas_match_bucket_size() {
        let (_, graph) = lattice3();
        for c in 0..9 {
            assert!((cell_area(&graph, c) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn densified_points_share_buckets() {
        // две точки в одной корзине становятся соседями
        let points = vec![(0.3, 0.3), (0.7, 0.7), (1.5, 0.5)];
        let graph = LatticeTessellation::new(1.0).tessellate(&points, &[], 2.0, 1.0);
        assert!(graph.neighbors[0].contains(&1));
        assert!(graph.neighbors[1].contains(&0));
        assert!(graph.neighbors[1].contains(&2));
    }
}
