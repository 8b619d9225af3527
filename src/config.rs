// src/config.rs
//! Конфигурация запроса генерации
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Размеры карты и целевое число ячеек
//! - Сид (число или строка)
//! - Шаблон рельефа: встроенный архетип или явный список операций
//! - Настройки симуляции рек
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки
//! через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::GenerationError;
use crate::rng::Seed;

/// Встроенный архетип шаблона рельефа
///
/// Определяет глобальную структуру карты: распределение суши/моря и форму
/// континентов. Явный список операций в конфиге имеет приоритет над архетипом.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum TemplateKind {
    /// Два крупных материка с проливом между ними
    #[default]
    Continents,
    /// Многочисленные острова и архипелаги, мало крупной суши
    Archipelago,
    /// Диагональный перешеек между морями
    Isthmus,
}

impl TemplateKind {
    /// Возвращает список операций архетипа («Имя арг арг …», по одной на строку)
    #[must_use]
    pub fn steps(self) -> Vec<String> {
        let steps: &[&str] = match self {
            TemplateKind::Continents => &[
                "Hill 1 80-85 75-80 40-60",
                "Hill 1 80-85 20-25 40-60",
                "Multiply 0.22 20-100",
                "Hill 5-6 15-20 25-75 20-82",
                "Range 0.8 30-60 5-15 20-45",
                "Range 0.8 30-60 83-95 20-45",
                "Trough 3-4 15-20 15-85 20-80",
                "Strait 2 vertical",
                "Smooth 2",
                "Pit 3-4 10-15 15-85 20-80",
                "Mask 4",
            ],
            TemplateKind::Archipelago => &[
                "Add 11 all",
                "Range 2-3 40-60 20-80 20-80",
                "Hill 5 15-20 10-90 30-70",
                "Hill 2 10-15 10-30 20-80",
                "Hill 2 10-15 60-90 20-80",
                "Smooth 3",
                "Trough 10 20-30 5-95 5-95",
                "Strait 2 vertical",
                "Strait 2 horizontal",
                "Mask 4",
            ],
            TemplateKind::Isthmus => &[
                "Hill 5-10 15-30 0-30 0-20",
                "Hill 5-10 15-30 10-50 20-40",
                "Hill 5-10 15-30 30-70 40-60",
                "Hill 5-10 15-30 50-90 60-80",
                "Hill 5-10 15-30 70-100 80-100",
                "Smooth 2",
                "Trough 4-8 15-30 0-30 0-20",
                "Trough 4-8 15-30 30-70 40-60",
                "Trough 4-8 15-30 70-100 80-100",
                "Invert 0.25 x",
                "Mask 1",
            ],
        };
        steps.iter().map(|s| (*s).to_string()).collect()
    }
}

/// Настройки симуляции рек
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverSettings {
    /// Минимальный накопленный поток, при котором возникает русло
    #[serde(default = "default_min_flux")]
    pub min_flux_to_form_river: f64,

    /// Углублять ли русла крупных рек (channel downcutting)
    #[serde(default = "default_downcutting")]
    pub downcutting: bool,

    /// Базовый коэффициент меандрирования (0 = прямые русла)
    #[serde(default = "default_meandering")]
    pub meandering: f64,
}

fn default_min_flux() -> f64 {
    30.0
}
fn default_downcutting() -> bool {
    true
}
fn default_meandering() -> f64 {
    0.5
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            min_flux_to_form_river: 30.0,
            downcutting: true,
            meandering: 0.5,
        }
    }
}

/// Основные параметры генерации
///
/// Полная конфигурация одного запроса. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapGenerationParams {
    /// Сид генератора случайных чисел (число или строка)
    #[serde(default)]
    pub seed: Seed,

    /// Ширина карты в условных единицах (по умолчанию 960)
    #[serde(default = "default_width")]
    pub width: f64,

    /// Высота карты в условных единицах (по умолчанию 540)
    #[serde(default = "default_height")]
    pub height: f64,

    /// Целевое число ячеек крупной сетки (по умолчанию 10 000)
    #[serde(default = "default_cells_desired")]
    pub cells_desired: usize,

    /// Архетип шаблона рельефа (используется, если `template` пуст)
    #[serde(default)]
    pub template_kind: TemplateKind,

    /// Явный список операций шаблона; неизвестные операции молча пропускаются
    #[serde(default)]
    pub template: Vec<String>,

    /// Настройки симуляции рек
    #[serde(default)]
    pub rivers: RiverSettings,
}

fn default_width() -> f64 {
    960.0
}
fn default_height() -> f64 {
    540.0
}
fn default_cells_desired() -> usize {
    10_000
}

impl Default for MapGenerationParams {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            width: 960.0,
            height: 540.0,
            cells_desired: 10_000,
            template_kind: TemplateKind::Continents,
            template: Vec::new(),
            rivers: RiverSettings::default(),
        }
    }
}

impl MapGenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Ошибки
    /// Возвращает ошибку, если файл не найден или содержит недопустимый формат.
    pub fn from_toml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }

    /// Проверяет предусловия запроса (вырожденные входы — жёсткая ошибка)
    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(self.width > 0.0) {
            return Err(GenerationError::InvalidParameter {
                name: "width",
                value: self.width,
            });
        }
        if !(self.height > 0.0) {
            return Err(GenerationError::InvalidParameter {
                name: "height",
                value: self.height,
            });
        }
        if self.cells_desired == 0 {
            return Err(GenerationError::InvalidParameter {
                name: "cells_desired",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Итоговый список операций шаблона: явный список либо архетип
    #[must_use]
    pub fn template_steps(&self) -> Vec<String> {
        if self.template.is_empty() {
            self.template_kind.steps()
        } else {
            self.template.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_with_defaults() {
        let params: MapGenerationParams = toml::from_str("seed = 42").unwrap();
        assert_eq!(params.seed, Seed::Number(42));
        assert_eq!(params.cells_desired, 10_000);
        assert_eq!(params.template_kind, TemplateKind::Continents);
        assert!((params.rivers.min_flux_to_form_river - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toml_seed_as_string() {
        let params: MapGenerationParams = toml::from_str("seed = \"abc\"").unwrap();
        assert_eq!(params.seed, Seed::Text("abc".into()));
    }

    #[test]
    fn explicit_template_wins_over_kind() {
        let params = MapGenerationParams {
            template: vec!["Hill 1 50 50-50 50-50".into()],
            ..MapGenerationParams::default()
        };
        assert_eq!(params.template_steps().len(), 1);
    }

    #[test]
    fn degenerate_params_fail_fast() {
        let bad = MapGenerationParams {
            cells_desired: 0,
            ..MapGenerationParams::default()
        };
        assert!(bad.validate().is_err());

        let bad = MapGenerationParams {
            width: -1.0,
            ..MapGenerationParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
