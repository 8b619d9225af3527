pub mod biomes;
pub mod climate;
pub mod config;
pub mod error;
pub mod features;
pub mod grid;
pub mod heightmap;
pub mod pack;
pub mod rivers;
pub mod rng;
pub mod tessellation;
pub mod world;

pub use biomes::Biome;
pub use config::{MapGenerationParams, RiverSettings, TemplateKind};
pub use error::GenerationError;
pub use features::{Feature, FeatureKind, IslandGroup};
pub use grid::{Grid, Point};
pub use pack::Pack;
pub use rivers::River;
pub use rng::{MapRng, Seed};
pub use tessellation::{CellGraph, LatticeTessellation, Tessellate};
pub use world::{MapDataset, World};
