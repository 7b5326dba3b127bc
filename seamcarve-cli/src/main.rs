use clap::Parser;
use seamcarve::image::io::{buffer_from_dynamic_image, buffer_to_dynamic_image};
use seamcarve::{
    EnergyKind, GradientKind, Grid, ResizeOrder, Resized, RigidityMask, Session, SessionConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Seamcarve CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EnergyKindConfig {
    Brightness,
    Luma,
    Rgba,
    Custom,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GradientConfig {
    Xabs,
    Sumabs,
    Norm,
    Null,
}

impl From<GradientConfig> for GradientKind {
    fn from(value: GradientConfig) -> Self {
        match value {
            GradientConfig::Xabs => GradientKind::XAbs,
            GradientConfig::Sumabs => GradientKind::SumAbs,
            GradientConfig::Norm => GradientKind::Norm,
            GradientConfig::Null => GradientKind::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ResizeOrderConfig {
    WidthFirst,
    HeightFirst,
    Interleaved,
}

impl From<ResizeOrderConfig> for ResizeOrder {
    fn from(value: ResizeOrderConfig) -> Self {
        match value {
            ResizeOrderConfig::WidthFirst => ResizeOrder::WidthFirst,
            ResizeOrderConfig::HeightFirst => ResizeOrder::HeightFirst,
            ResizeOrderConfig::Interleaved => ResizeOrder::Interleaved,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SessionConfigJson {
    energy_kind: EnergyKindConfig,
    /// Channel count for the custom reader; defaults to the image's.
    custom_channels: Option<usize>,
    gradient: GradientConfig,
    rigidity: f32,
    max_step: usize,
    max_enlargement_ratio: f32,
    caching_enabled: bool,
    resize_order: ResizeOrderConfig,
    side_switch_frequency: u32,
    parallel: bool,
}

impl Default for SessionConfigJson {
    fn default() -> Self {
        let cfg = SessionConfig::default();
        Self {
            energy_kind: EnergyKindConfig::Brightness,
            custom_channels: None,
            gradient: GradientConfig::Xabs,
            rigidity: cfg.rigidity,
            max_step: cfg.max_step,
            max_enlargement_ratio: cfg.max_enlargement_ratio,
            caching_enabled: cfg.caching_enabled,
            resize_order: ResizeOrderConfig::WidthFirst,
            side_switch_frequency: cfg.side_switch_frequency,
            parallel: cfg.parallel,
        }
    }
}

impl SessionConfigJson {
    fn to_config(&self, image_channels: usize) -> SessionConfig {
        let energy_kind = match self.energy_kind {
            EnergyKindConfig::Brightness => EnergyKind::Brightness,
            EnergyKindConfig::Luma => EnergyKind::Luma,
            EnergyKindConfig::Rgba => EnergyKind::Rgba,
            EnergyKindConfig::Custom => {
                EnergyKind::Custom(self.custom_channels.unwrap_or(image_channels))
            }
        };
        SessionConfig {
            energy_kind,
            gradient: self.gradient.into(),
            rigidity: self.rigidity,
            max_step: self.max_step,
            max_enlargement_ratio: self.max_enlargement_ratio,
            caching_enabled: self.caching_enabled,
            resize_order: self.resize_order.into(),
            side_switch_frequency: self.side_switch_frequency,
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    input_path: String,
    output_path: String,
    summary_path: Option<String>,
    /// Target width; 0 keeps the input width.
    width: usize,
    /// Target height; 0 keeps the input height.
    height: usize,
    /// Grey image whose bright pixels should survive carving.
    preserve_mask_path: Option<String>,
    /// Energy added for a fully white preserve-mask pixel.
    preserve_strength: f32,
    /// Grey image whose bright pixels should be carved away first.
    suppress_mask_path: Option<String>,
    /// Energy removed for a fully white suppress-mask pixel.
    suppress_strength: f32,
    /// Grey image scaling the rigidity per pixel (white = 1).
    rigidity_mask_path: Option<String>,
    session: SessionConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            output_path: String::new(),
            summary_path: None,
            width: 0,
            height: 0,
            preserve_mask_path: None,
            preserve_strength: 1000.0,
            suppress_mask_path: None,
            suppress_strength: 1000.0,
            rigidity_mask_path: None,
            session: SessionConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Size {
    width: usize,
    height: usize,
}

#[derive(Debug, Serialize)]
struct Summary {
    input: Size,
    output: Size,
    complete: bool,
    carved_depth: usize,
    elapsed_ms: f64,
}

fn load_grey_grid(
    path: &str,
    width: usize,
    height: usize,
    scale: f32,
) -> Result<Grid<f32>, Box<dyn std::error::Error>> {
    let grey = image::open(path)?.to_luma8();
    if grey.width() as usize != width || grey.height() as usize != height {
        return Err(format!("{path}: mask must be {width}x{height}").into());
    }
    let values = grey
        .as_raw()
        .iter()
        .map(|&v| f32::from(v) / 255.0 * scale)
        .collect();
    Ok(Grid::from_vec(width, height, values)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("seamcarve=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() || config.output_path.is_empty() {
        return Err("input_path and output_path must be set in the config".into());
    }

    let input = buffer_from_dynamic_image(&image::open(&config.input_path)?)?;
    let (in_w, in_h) = (input.width(), input.height());
    let width = if config.width == 0 { in_w } else { config.width };
    let height = if config.height == 0 { in_h } else { config.height };

    let session_config = config.session.to_config(input.channels());
    let mut session = Session::new(input, session_config)?;
    if let Some(path) = &config.preserve_mask_path {
        let bias = load_grey_grid(path, in_w, in_h, config.preserve_strength)?;
        session.set_energy_bias(Some(bias))?;
    }
    if let Some(path) = &config.suppress_mask_path {
        let weights = load_grey_grid(path, in_w, in_h, config.suppress_strength)?;
        session.set_suppression_mask(Some(weights))?;
    }
    if let Some(path) = &config.rigidity_mask_path {
        let factors = load_grey_grid(path, in_w, in_h, 1.0)?;
        session.set_rigidity_mask(Some(RigidityMask::new(factors)?))?;
    }

    let start = Instant::now();
    let resized = session.resize_to(width, height)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(width, height, elapsed_ms, "resize finished");

    let complete = matches!(resized, Resized::Complete(_));
    let output = resized.into_buffer();
    buffer_to_dynamic_image(&output)?.save(&config.output_path)?;

    let summary = Summary {
        input: Size {
            width: in_w,
            height: in_h,
        },
        output: Size {
            width: output.width(),
            height: output.height(),
        },
        complete,
        carved_depth: session.carved_depth(),
        elapsed_ms,
    };
    let json = serde_json::to_string_pretty(&summary)?;
    match config.summary_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
