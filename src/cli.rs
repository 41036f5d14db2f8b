use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser)]
#[command(name = "lumenpath")]
#[command(about = "Scene ingestion and BVH construction for a GPU path tracer")]
pub struct Args {
    /// OBJ model to load; a small procedural demo scene is used when omitted
    pub model: Option<String>,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Enclose the scene in a box with an emissive ceiling panel
    #[arg(long, help = "Enclose the scene in a box with an emissive ceiling panel")]
    pub enclosure: bool,

    /// Add an emissive sky plane above the scene
    #[arg(long, help = "Add an emissive sky plane above the scene")]
    pub sky_light: bool,

    /// Ceiling panel footprint as a fraction of the enclosure ceiling
    #[arg(long, default_value = "0.3", help = "Ceiling panel footprint as a fraction of the enclosure ceiling")]
    pub light_size: f32,

    /// Emission strength of synthesized light panels
    #[arg(long, default_value = "10.0", help = "Emission strength of synthesized light panels")]
    pub light_strength: f32,

    /// Enclosure padding as a fraction of the scene extent
    #[arg(long, default_value = "0.1", help = "Enclosure padding as a fraction of the scene extent")]
    pub padding: f32,

    /// Verify hierarchy structure after building (leaf coverage, containment)
    #[arg(long, help = "Verify hierarchy structure after building (leaf coverage, containment)")]
    pub check: bool,

    /// Write packed GPU buffers to <DUMP>.nodes / .triangles / .materials
    #[arg(short, long, help = "Write packed GPU buffers to <DUMP>.nodes / .triangles / .materials")]
    pub dump: Option<String>,
}
