// src/climate.rs
//! Встроенный генератор климата
//!
//! Конвейер трактует климат как внешний вход: сетке нужны лишь два растра
//! (температура и осадки) на её ячейках. Этот модуль даёт автономную
//! заглушку для CLI и тестов: широтный градиент температуры, широтные пояса
//! осадков и шум поверх, без обратной связи с рельефом. Настоящая модель
//! климата подставляется теми же двумя растрами через `Grid::set_climate`.

use fastnoise_lite::FastNoiseLite;

use crate::rng::Seed;

/// Пара входных растров климата, индексированных как ячейки крупной сетки
#[derive(Debug, Clone)]
pub struct ClimateRaster {
    /// Температура, °C
    pub temperature: Vec<i8>,
    /// Осадки в условных единицах стока
    pub precipitation: Vec<u8>,
}

/// Генерирует растры климата для решётки `cells_x × cells_y`
#[must_use]
pub fn generate_climate(seed: &Seed, cells_x: usize, cells_y: usize) -> ClimateRaster {
    let mut temp_noise = FastNoiseLite::new();
    temp_noise.set_seed(Some(seed.to_u64().wrapping_add(500) as i32));
    temp_noise.set_frequency(Some(0.08));

    let mut prec_noise = FastNoiseLite::new();
    prec_noise.set_seed(Some(seed.to_u64().wrapping_add(9000) as i32));
    prec_noise.set_frequency(Some(0.05));

    let n = cells_x * cells_y;
    let mut temperature = Vec::with_capacity(n);
    let mut precipitation = Vec::with_capacity(n);

    let max_y = (cells_y.max(2) - 1) as f64;
    for y in 0..cells_y {
        // 0 — экватор (середина карты), 1 — полюса
        let lat = (y as f64 / max_y - 0.5).abs() * 2.0;
        let base_t = 28.0 - lat.powf(1.4) * 55.0;
        // влажные тропики, сухие субтропики, умеренные средние широты
        let base_p = if lat < 0.15 {
            24.0
        } else if lat < 0.35 {
            7.0
        } else if lat < 0.7 {
            16.0
        } else {
            8.0
        };

        for x in 0..cells_x {
            let tn = f64::from(temp_noise.get_noise_2d(x as f32, y as f32));
            let pn = f64::from(prec_noise.get_noise_2d(x as f32, y as f32));
            temperature.push((base_t + tn * 4.0).round().clamp(-30.0, 30.0) as i8);
            precipitation.push((base_p + pn * 6.0).round().clamp(2.0, 40.0) as u8);
        }
    }

    ClimateRaster {
        temperature,
        precipitation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasters_cover_the_lattice() {
        let climate = generate_climate(&Seed::Number(7), 20, 12);
        assert_eq!(climate.temperature.len(), 240);
        assert_eq!(climate.precipitation.len(), 240);
        assert!(climate.precipitation.iter().all(|&p| (2..=40).contains(&p)));
    }

    #[test]
    fn same_seed_same_climate() {
        let a = generate_climate(&Seed::Text("мир".into()), 30, 20);
        let b = generate_climate(&Seed::Text("мир".into()), 30, 20);
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.precipitation, b.precipitation);
    }

    #[test]
    fn equator_is_warmer_than_poles() {
        let climate = generate_climate(&Seed::Number(1), 10, 21);
        let equator = climate.temperature[10 * 10 + 5];
        let pole = climate.temperature[5];
        assert!(equator > pole);
    }
}
