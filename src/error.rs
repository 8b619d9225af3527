use thiserror::Error;

/// Ошибки генерации карты
///
/// Жёсткими ошибками являются только нарушения предусловий публичных входов:
/// вырожденные параметры запроса и отсутствующие/неполные входные растры климата.
/// Все внутренние вырождения (неудачный подбор опорной точки, отсутствие береговой
/// линии у озера, неизвестная операция в шаблоне) обрабатываются мягкой деградацией
/// и до вызывающего кода не доходят.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Параметр запроса вне допустимой области
    #[error("построение сетки: параметр «{name}» должен быть положительным, получено {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Стадии не передан обязательный входной растр
    #[error("{stage}: отсутствует входной растр «{raster}»")]
    MissingRaster {
        stage: &'static str,
        raster: &'static str,
    },

    /// Длина входного растра не совпадает с числом ячеек сетки
    #[error("{stage}: растр «{raster}» содержит {got} значений, ожидалось {expected}")]
    RasterSizeMismatch {
        stage: &'static str,
        raster: &'static str,
        got: usize,
        expected: usize,
    },
}
