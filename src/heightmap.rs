// src/heightmap.rs
//! Синтез рельефа
//!
//! Интерпретатор над упорядоченным списком операций (Hill, Pit, Range, Trough,
//! Strait, Mask, Invert, Add, Multiply, Smooth). Шаблоны — данные, не код:
//! строки вида «Hill 1 50 50-50 50-50» разбираются один раз в типизированные
//! операции, без условий и ветвлений — только последовательное применение.
//! Высоты всегда жёстко ограничены диапазоном [0, 100]; обход блобов ведётся
//! явной очередью, а не рекурсией.

use std::collections::VecDeque;

use crate::grid::Grid;
use crate::rng::MapRng;
use crate::tessellation::CellGraph;

/// Жёсткое ограничение высоты диапазоном [0, 100]
#[inline]
fn lim(v: f64) -> u8 {
    v.clamp(0.0, 100.0) as u8
}

/// Аргумент «число-или-интервал»: `"50"` — константа, `"30-60"` — равномерно
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumRange {
    pub min: f64,
    pub max: f64,
}

impl NumRange {
    /// Разбор строки; поддерживает отрицательные границы ("-20--10")
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(v) = s.parse::<f64>() {
            return Some(Self { min: v, max: v });
        }
        let bytes = s.as_bytes();
        for i in 1..bytes.len() {
            // разделитель — дефис не в первой позиции и не сразу после другого
            if bytes[i] == b'-' && bytes[i - 1] != b'-' {
                if let (Ok(min), Ok(max)) = (s[..i].parse::<f64>(), s[i + 1..].parse::<f64>()) {
                    return Some(Self { min, max });
                }
            }
        }
        None
    }

    /// Равномерная выборка из интервала
    pub fn draw(&self, rng: &mut MapRng) -> f64 {
        if (self.max - self.min).abs() < f64::EPSILON {
            self.min
        } else {
            rng.range(self.min, self.max)
        }
    }

    /// Выборка счётчика повторов: дробная часть — вероятность ещё одного
    pub fn draw_count(&self, rng: &mut MapRng) -> u32 {
        let v = self.draw(rng).max(0.0);
        let mut n = v.floor() as u32;
        if rng.probability(v.fract()) {
            n += 1;
        }
        n
    }
}

/// Фильтр высот для Add/Multiply: суша, всё или явная полоса
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightFilter {
    Land,
    All,
    Band { min: f64, max: f64 },
}

impl HeightFilter {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "land" => Some(Self::Land),
            "all" => Some(Self::All),
            _ => NumRange::parse(s).map(|r| Self::Band {
                min: r.min,
                max: r.max,
            }),
        }
    }

    fn bounds(self) -> (f64, f64) {
        match self {
            Self::Land => (20.0, 100.0),
            Self::All => (0.0, 100.0),
            Self::Band { min, max } => (min, max),
        }
    }
}

/// Направление пролива
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Vertical,
    Horizontal,
}

/// Оси зеркалирования для Invert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axes {
    X,
    Y,
    Both,
}

/// Одна типизированная операция шаблона
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Hill {
        count: NumRange,
        height: NumRange,
        range_x: NumRange,
        range_y: NumRange,
    },
    Pit {
        count: NumRange,
        height: NumRange,
        range_x: NumRange,
        range_y: NumRange,
    },
    Range {
        count: NumRange,
        height: NumRange,
        range_x: NumRange,
        range_y: NumRange,
    },
    Trough {
        count: NumRange,
        height: NumRange,
        range_x: NumRange,
        range_y: NumRange,
    },
    Strait {
        width: NumRange,
        direction: Direction,
    },
    Mask {
        power: f64,
    },
    Invert {
        chance: f64,
        axes: Axes,
    },
    Add {
        value: f64,
        filter: HeightFilter,
    },
    Multiply {
        factor: f64,
        filter: HeightFilter,
    },
    Smooth {
        factor: f64,
    },
}

/// Разобранный шаблон рельефа
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub steps: Vec<Operation>,
}

impl Template {
    /// Разбирает список строк; неизвестные и битые строки молча пропускаются
    #[must_use]
    pub fn parse(lines: &[String]) -> Self {
        let steps = lines.iter().filter_map(|l| parse_step(l)).collect();
        Self { steps }
    }
}

fn parse_step(line: &str) -> Option<Operation> {
    let mut it = line.split_whitespace();
    let name = it.next()?;
    let args: Vec<&str> = it.collect();

    let blob = |args: &[&str]| -> Option<(NumRange, NumRange, NumRange, NumRange)> {
        Some((
            NumRange::parse(args.first()?)?,
            NumRange::parse(args.get(1)?)?,
            NumRange::parse(args.get(2)?)?,
            NumRange::parse(args.get(3)?)?,
        ))
    };

    match name {
        "Hill" => blob(&args).map(|(count, height, range_x, range_y)| Operation::Hill {
            count,
            height,
            range_x,
            range_y,
        }),
        "Pit" => blob(&args).map(|(count, height, range_x, range_y)| Operation::Pit {
            count,
            height,
            range_x,
            range_y,
        }),
        "Range" => blob(&args).map(|(count, height, range_x, range_y)| Operation::Range {
            count,
            height,
            range_x,
            range_y,
        }),
        "Trough" => blob(&args).map(|(count, height, range_x, range_y)| Operation::Trough {
            count,
            height,
            range_x,
            range_y,
        }),
        "Strait" => {
            let width = NumRange::parse(args.first()?)?;
            let direction = match args.get(1).copied().unwrap_or("vertical") {
                "horizontal" => Direction::Horizontal,
                _ => Direction::Vertical,
            };
            Some(Operation::Strait { width, direction })
        }
        "Mask" => Some(Operation::Mask {
            power: args.first().and_then(|a| a.parse().ok()).unwrap_or(1.0),
        }),
        "Invert" => {
            let chance = args.first()?.parse().ok()?;
            let axes = match args.get(1).copied().unwrap_or("both") {
                "x" => Axes::X,
                "y" => Axes::Y,
                _ => Axes::Both,
            };
            Some(Operation::Invert { chance, axes })
        }
        "Add" => Some(Operation::Add {
            value: args.first()?.parse().ok()?,
            filter: HeightFilter::parse(args.get(1).copied().unwrap_or("all"))?,
        }),
        "Multiply" => Some(Operation::Multiply {
            factor: args.first()?.parse().ok()?,
            filter: HeightFilter::parse(args.get(1).copied().unwrap_or("all"))?,
        }),
        "Smooth" => Some(Operation::Smooth {
            factor: args.first().and_then(|a| a.parse().ok()).unwrap_or(2.0),
        }),
        _ => None, // неизвестная операция — мягкая деградация
    }
}

/// Экспонента радиального затухания: плотные сетки — медленнее спад
fn blob_power(cells_desired: usize) -> f64 {
    match cells_desired {
        ..=1_000 => 0.93,
        ..=2_000 => 0.95,
        ..=5_000 => 0.97,
        ..=10_000 => 0.98,
        ..=20_000 => 0.99,
        ..=30_000 => 0.991,
        ..=40_000 => 0.993,
        ..=50_000 => 0.994,
        ..=60_000 => 0.995,
        ..=70_000 => 0.9955,
        ..=80_000 => 0.996,
        ..=90_000 => 0.9964,
        _ => 0.9973,
    }
}

/// Экспонента затухания вдоль хребта/долины (резче радиальной)
fn line_power(cells_desired: usize) -> f64 {
    match cells_desired {
        ..=1_000 => 0.75,
        ..=2_000 => 0.77,
        ..=5_000 => 0.79,
        ..=10_000 => 0.81,
        ..=20_000 => 0.82,
        ..=30_000 => 0.83,
        ..=40_000 => 0.84,
        ..=50_000 => 0.86,
        ..=60_000 => 0.87,
        ..=70_000 => 0.88,
        ..=80_000 => 0.91,
        ..=90_000 => 0.92,
        _ => 0.93,
    }
}

/// Применяет шаблон к буферу высот сетки
pub fn generate(grid: &mut Grid, graph: &CellGraph, template: &Template, rng: &mut MapRng) {
    for step in &template.steps {
        match step {
            Operation::Hill {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..count.draw_count(rng) {
                    add_one_hill(grid, graph, rng, *height, *range_x, *range_y);
                }
            }
            Operation::Pit {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..count.draw_count(rng) {
                    add_one_pit(grid, graph, rng, *height, *range_x, *range_y);
                }
            }
            Operation::Range {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..count.draw_count(rng) {
                    add_one_line(grid, graph, rng, *height, *range_x, *range_y, 1.0);
                }
            }
            Operation::Trough {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..count.draw_count(rng) {
                    add_one_line(grid, graph, rng, *height, *range_x, *range_y, -1.0);
                }
            }
            Operation::Strait { width, direction } => {
                add_strait(grid, graph, rng, *width, *direction);
            }
            Operation::Mask { power } => mask(grid, *power),
            Operation::Invert { chance, axes } => invert(grid, rng, *chance, *axes),
            Operation::Add { value, filter } => modify(grid, *value, 1.0, *filter),
            Operation::Multiply { factor, filter } => modify(grid, 0.0, *factor, *filter),
            Operation::Smooth { factor } => smooth(grid, graph, *factor),
        }
    }
}

/// Точка внутри процентного окна карты
fn point_in_range(range: NumRange, length: f64, rng: &mut MapRng) -> f64 {
    rng.range(range.min / 100.0 * length, range.max / 100.0 * length)
}

fn add_one_hill(
    grid: &mut Grid,
    graph: &CellGraph,
    rng: &mut MapRng,
    height: NumRange,
    range_x: NumRange,
    range_y: NumRange,
) {
    let n = grid.heights.len();
    let power = blob_power(grid.cells_desired);
    let h = f64::from(lim(height.draw(rng)));

    // Подбор стартовой ячейки: бугор не должен срезаться ограничителем
    let mut limit = 0;
    let start = loop {
        let x = point_in_range(range_x, grid.width, rng);
        let y = point_in_range(range_y, grid.height, rng);
        let cell = grid.find_cell(x, y);
        limit += 1;
        if f64::from(grid.heights[cell]) + h <= 90.0 || limit >= 50 {
            break cell;
        }
    };

    let mut change = vec![0.0f64; n];
    change[start] = h;
    let mut queue = VecDeque::from([start]);
    while let Some(q) = queue.pop_front() {
        for &c in &graph.neighbors[q] {
            let c = c as usize;
            if change[c] != 0.0 {
                continue;
            }
            change[c] = change[q].powf(power) * rng.range(0.9, 1.1);
            if change[c] > 1.0 {
                queue.push_back(c);
            }
        }
    }

    for (h, &d) in grid.heights.iter_mut().zip(&change) {
        *h = lim(f64::from(*h) + d);
    }
}

fn add_one_pit(
    grid: &mut Grid,
    graph: &CellGraph,
    rng: &mut MapRng,
    height: NumRange,
    range_x: NumRange,
    range_y: NumRange,
) {
    let n = grid.heights.len();
    let power = blob_power(grid.cells_desired);
    let mut h = f64::from(lim(height.draw(rng)));

    // Яма копается только на суше
    let mut limit = 0;
    let start = loop {
        let x = point_in_range(range_x, grid.width, rng);
        let y = point_in_range(range_y, grid.height, rng);
        let cell = grid.find_cell(x, y);
        limit += 1;
        if grid.heights[cell] >= 20 || limit >= 50 {
            break cell;
        }
    };

    // Глубина убывает монотонно по мере расползания: степень берётся от
    // текущего значения, а не от буфера по ячейкам
    let mut used = vec![false; n];
    let mut queue = VecDeque::from([start]);
    while let Some(q) = queue.pop_front() {
        h = h.powf(power) * rng.range(0.9, 1.1);
        if h < 1.0 {
            return;
        }
        for &c in &graph.neighbors[q] {
            let c = c as usize;
            if used[c] {
                continue;
            }
            used[c] = true;
            grid.heights[c] = lim(f64::from(grid.heights[c]) - h * rng.range(0.9, 1.1));
            queue.push_back(c);
        }
    }
}

/// Жадный шаг к цели по соседям; иногда срезает вдвое, чтобы путь вилял
fn path_walk(
    graph: &CellGraph,
    used: &mut [bool],
    start: usize,
    end: usize,
    rng: &mut MapRng,
) -> Vec<usize> {
    let points = &graph.points;
    let mut path = vec![start];
    used[start] = true;
    let mut cur = start;
    while cur != end {
        let mut min_d = f64::INFINITY;
        let mut next = None;
        for &e in &graph.neighbors[cur] {
            let e = e as usize;
            if used[e] {
                continue;
            }
            let (ex, ey) = points[e];
            let (tx, ty) = points[end];
            let mut diff = (tx - ex).powi(2) + (ty - ey).powi(2);
            if rng.uniform() > 0.85 {
                diff /= 2.0;
            }
            if diff < min_d {
                min_d = diff;
                next = Some(e);
            }
        }
        let Some(e) = next else { return path };
        cur = e;
        path.push(cur);
        used[cur] = true;
    }
    path
}

fn add_one_line(
    grid: &mut Grid,
    graph: &CellGraph,
    rng: &mut MapRng,
    height: NumRange,
    range_x: NumRange,
    range_y: NumRange,
    sign: f64,
) {
    let n = grid.heights.len();
    let power = line_power(grid.cells_desired);
    let mut h = f64::from(lim(height.draw(rng)));

    // Стартовая точка; долина (sign < 0) начинается на суше
    let mut sx = point_in_range(range_x, grid.width, rng);
    let mut sy = point_in_range(range_y, grid.height, rng);
    if sign < 0.0 {
        let mut limit = 0;
        while grid.heights[grid.find_cell(sx, sy)] < 20 && limit < 50 {
            sx = point_in_range(range_x, grid.width, rng);
            sy = point_in_range(range_y, grid.height, rng);
            limit += 1;
        }
    }

    // Конечная точка: манхэттенское расстояние в правдоподобных пределах
    let max_dist = if sign > 0.0 {
        grid.width / 3.0
    } else {
        grid.width / 2.0
    };
    let mut limit = 0;
    let (ex, ey) = loop {
        let ex = rng.range(grid.width * 0.1, grid.width * 0.9);
        let ey = rng.range(grid.height * 0.15, grid.height * 0.85);
        let dist = (ey - sy).abs() + (ex - sx).abs();
        limit += 1;
        if (dist >= grid.width / 8.0 && dist <= max_dist) || limit >= 50 {
            break (ex, ey);
        }
    };

    let start = grid.find_cell(sx, sy);
    let end = grid.find_cell(ex, ey);
    let mut used = vec![false; n];
    let path = path_walk(graph, &mut used, start, end, rng);

    // Распространение от всего пути с затуханием line_power
    let mut queue: Vec<usize> = path;
    loop {
        let frontier = std::mem::take(&mut queue);
        for &i in &frontier {
            grid.heights[i] = lim(f64::from(grid.heights[i]) + sign * h * rng.range(0.85, 1.15));
        }
        h = h.powf(power) - 1.0;
        if h < 2.0 {
            break;
        }
        for &f in &frontier {
            for &c in &graph.neighbors[f] {
                let c = c as usize;
                if !used[c] {
                    used[c] = true;
                    queue.push(c);
                }
            }
        }
        if queue.is_empty() {
            break;
        }
    }
}

fn add_strait(
    grid: &mut Grid,
    graph: &CellGraph,
    rng: &mut MapRng,
    width: NumRange,
    direction: Direction,
) {
    let n = grid.heights.len();
    let mut w = width.draw(rng).min(grid.cells_x as f64 / 3.0);
    if w < 1.0 {
        if !rng.probability(w) {
            return;
        }
        w = 1.0;
    }
    let w = w.round() as u32;
    let vert = direction == Direction::Vertical;

    // Концы коридора прижаты к противоположным краям карты
    let (sx, sy, ex, ey) = if vert {
        let sx = rng.range(grid.width * 0.3, grid.width * 0.7);
        let ex = grid.width - sx - grid.width * 0.1 + rng.range(0.0, grid.width * 0.2);
        (sx, 5.0, ex, grid.height - 5.0)
    } else {
        let sy = rng.range(grid.height * 0.3, grid.height * 0.7);
        let ey = grid.height - sy - grid.height * 0.1 + rng.range(0.0, grid.height * 0.2);
        (5.0, sy, grid.width - 5.0, ey)
    };

    let start = grid.find_cell(sx, sy);
    let end = grid.find_cell(ex, ey);
    let mut used = vec![false; n];
    let mut frontier = path_walk(graph, &mut used, start, end, rng);

    // Коридор расширяется по кольцам соседей, пока не наберёт нужную ширину
    let step = 0.1 / f64::from(w);
    let mut remaining = w;
    while remaining > 0 {
        let exp = 0.9 - step * f64::from(remaining);
        let mut next = Vec::new();
        for &r in &frontier {
            for &e in &graph.neighbors[r] {
                let e = e as usize;
                if used[e] {
                    continue;
                }
                used[e] = true;
                next.push(e);
                let lowered = f64::from(grid.heights[e]).powf(exp);
                grid.heights[e] = if lowered > 100.0 { 5 } else { lim(lowered) };
            }
        }
        frontier = next;
        remaining -= 1;
    }
}

/// Маска силуэта: гасит высоты к краям карты (или к центру при power < 0)
fn mask(grid: &mut Grid, power: f64) {
    let factor = if power == 0.0 { 1.0 } else { power.abs() };
    for i in 0..grid.heights.len() {
        let (x, y) = grid.points[i];
        let nx = 2.0 * x / grid.width - 1.0; // -1 … 1
        let ny = 2.0 * y / grid.height - 1.0;
        let mut distance = (1.0 - nx * nx) * (1.0 - ny * ny); // 1 в центре, 0 на краю
        if power < 0.0 {
            distance = 1.0 - distance;
        }
        let h = f64::from(grid.heights[i]);
        grid.heights[i] = lim((h * (factor - 1.0) + h * distance) / factor);
    }
}

/// Зеркалирование буфера высот в растровом порядке
fn invert(grid: &mut Grid, rng: &mut MapRng, chance: f64, axes: Axes) {
    if !rng.probability(chance) {
        return;
    }
    let invert_x = axes != Axes::Y;
    let invert_y = axes != Axes::X;
    let (cx, cy) = (grid.cells_x, grid.cells_y);
    let old = grid.heights.clone();
    for i in 0..old.len() {
        let x = i % cx;
        let y = i / cx;
        let nx = if invert_x { cx - x - 1 } else { x };
        let ny = if invert_y { cy - y - 1 } else { y };
        grid.heights[i] = old[ny * cx + nx];
    }
}

/// Add/Multiply по фильтру высот; суша остаётся сушей
fn modify(grid: &mut Grid, add: f64, mult: f64, filter: HeightFilter) {
    let (min, max) = filter.bounds();
    let is_land = filter == HeightFilter::Land;
    for h in &mut grid.heights {
        let v = f64::from(*h);
        if v < min || v > max {
            continue;
        }
        let mut v = if add != 0.0 {
            if is_land { (v + add).max(20.0) } else { v + add }
        } else {
            v
        };
        if (mult - 1.0).abs() > f64::EPSILON {
            v = if is_land { (v - 20.0) * mult + 20.0 } else { v * mult };
        }
        *h = lim(v);
    }
}

/// Смешивает высоту ячейки со средним по ней и её соседям
fn smooth(grid: &mut Grid, graph: &CellGraph, factor: f64) {
    let old = grid.heights.clone();
    for i in 0..old.len() {
        let mut sum = f64::from(old[i]);
        let mut count = 1.0;
        for &c in &graph.neighbors[i] {
            sum += f64::from(old[c as usize]);
            count += 1.0;
        }
        let mean = sum / count;
        let h = f64::from(old[i]);
        grid.heights[i] = lim((h * (factor - 1.0) + mean) / factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapGenerationParams;
    use crate::rng::Seed;
    use crate::tessellation::{LatticeTessellation, Tessellate};

    fn test_grid(width: f64, height: f64, cells: usize, seed: u64) -> (Grid, CellGraph) {
        let params = MapGenerationParams {
            width,
            height,
            cells_desired: cells,
            ..MapGenerationParams::default()
        };
        let mut rng = MapRng::new(&Seed::Number(seed));
        let grid = Grid::build(&params, &mut rng).unwrap();
        let graph =
            LatticeTessellation::new(grid.spacing).tessellate(&grid.points, &grid.boundary, width, height);
        (grid, graph)
    }

    #[test]
    fn num_range_parsing() {
        assert_eq!(NumRange::parse("50"), Some(NumRange { min: 50.0, max: 50.0 }));
        assert_eq!(NumRange::parse("30-60"), Some(NumRange { min: 30.0, max: 60.0 }));
        assert_eq!(NumRange::parse("-10"), Some(NumRange { min: -10.0, max: -10.0 }));
        assert_eq!(
            NumRange::parse("-20--10"),
            Some(NumRange { min: -20.0, max: -10.0 })
        );
        assert_eq!(NumRange::parse("abc"), None);
    }

    #[test]
    fn unknown_operations_are_skipped() {
        let template = Template::parse(&[
            "Hill 1 50 50-50 50-50".into(),
            "Vulcanize 3 4 5".into(),
            "Mask 1".into(),
        ]);
        assert_eq!(template.steps.len(), 2);
    }

    #[test]
    fn fractional_count_is_probabilistic() {
        let r = NumRange::parse("0.5").unwrap();
        let mut rng = MapRng::new(&Seed::Number(11));
        let draws: Vec<u32> = (0..200).map(|_| r.draw_count(&mut rng)).collect();
        assert!(draws.iter().any(|&d| d == 0));
        assert!(draws.iter().any(|&d| d == 1));
        assert!(draws.iter().all(|&d| d <= 1));
    }

    #[test]
    fn hill_raises_heights_within_clamp() {
        let (mut grid, graph) = test_grid(50.0, 50.0, 200, 1);
        let template = Template::parse(&["Hill 1 90 50-50 50-50".into()]);
        let mut rng = MapRng::new(&Seed::Number(1));
        generate(&mut grid, &graph, &template, &mut rng);
        generate(&mut grid, &graph, &template, &mut rng);

        assert!(grid.heights.iter().any(|&h| h >= 20));
        assert!(grid.heights.iter().all(|&h| h <= 100));
    }

    #[test]
    fn mask_is_monotonic_and_zero_at_corners() {
        // Синтетическая сетка с точками ровно в углах и вдоль диагонали
        let (mut grid, _) = test_grid(50.0, 50.0, 200, 0);
        grid.points = vec![
            (0.0, 0.0),
            (5.0, 5.0),
            (12.0, 12.0),
            (20.0, 20.0),
            (25.0, 25.0),
            (50.0, 50.0),
        ];
        grid.heights = vec![100; 6];
        mask(&mut grid, 1.0);

        assert_eq!(grid.heights[0], 0); // угол
        assert_eq!(grid.heights[5], 0); // противоположный угол
        // строго убывает с удалением от центра
        assert!(grid.heights[4] > grid.heights[3]);
        assert!(grid.heights[3] > grid.heights[2]);
        assert!(grid.heights[2] > grid.heights[1]);
        assert!(grid.heights[1] > grid.heights[0]);
    }

    #[test]
    fn invert_remaps_raster_order() {
        let (mut grid, _) = test_grid(50.0, 50.0, 200, 0);
        grid.cells_x = 2;
        grid.cells_y = 2;
        grid.heights = vec![1, 2, 3, 4];

        let mut rng = MapRng::new(&Seed::Number(0));
        invert(&mut grid, &mut rng, 1.0, Axes::X);
        assert_eq!(grid.heights, vec![2, 1, 4, 3]);

        invert(&mut grid, &mut rng, 1.0, Axes::Both);
        assert_eq!(grid.heights, vec![3, 4, 1, 2]);
    }

    #[test]
    fn smooth_with_factor_one_is_pure_mean() {
        let (mut grid, graph) = test_grid(30.0, 30.0, 100, 2);
        let n = grid.heights.len();
        grid.heights = vec![0; n];
        grid.heights[0] = 90;

        let expected: Vec<u8> = (0..n)
            .map(|i| {
                let mut sum = f64::from(grid.heights[i]);
                let mut count = 1.0;
                for &c in &graph.neighbors[i] {
                    sum += f64::from(grid.heights[c as usize]);
                    count += 1.0;
                }
                (sum / count) as u8
            })
            .collect();
        smooth(&mut grid, &graph, 1.0);
        assert_eq!(grid.heights, expected);
    }

    #[test]
    fn pit_lowers_land() {
        let (mut grid, graph) = test_grid(50.0, 50.0, 200, 4);
        grid.heights = vec![50; grid.heights.len()];
        let template = Template::parse(&["Pit 1 30 40-60 40-60".into()]);
        let mut rng = MapRng::new(&Seed::Number(4));
        generate(&mut grid, &graph, &template, &mut rng);

        assert!(grid.heights.iter().any(|&h| h < 50));
        assert!(grid.heights.iter().all(|&h| h <= 100));
    }
}
