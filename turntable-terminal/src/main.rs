/// Turntable Terminal Demo - a lit model spinning in the terminal
///
/// Renders a JSON model, an STL file or a cube. Q/ESC quits.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use turntable_core::{model, stl, MaterialTable, MeshData, SceneConfig};
use turntable_terminal::{logging, TerminalApp};

#[derive(Parser, Debug)]
#[command(name = "turntable-terminal")]
#[command(about = "Spin a lit 3D model in the terminal", long_about = None)]
struct Cli {
    /// Scene config (JSON); unspecified fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model file in assimp JSON format
    #[arg(long, conflicts_with = "stl")]
    model: Option<PathBuf>,

    /// Binary or ASCII STL file
    #[arg(long)]
    stl: Option<PathBuf>,

    /// Seconds per revolution, overrides the config file
    #[arg(long)]
    period: Option<f64>,

    /// Edge length of the cube shown when no model is given
    #[arg(long, default_value_t = 2.0)]
    cube_size: f32,

    /// Log filter, e.g. "debug" or "turntable_core=info"
    #[arg(long)]
    log: Option<String>,
}

fn load_meshes(cli: &Cli) -> Result<Vec<MeshData>> {
    if let Some(path) = &cli.model {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading model {}", path.display()))?;
        return model::parse_model(&text).with_context(|| format!("parsing {}", path.display()));
    }
    if let Some(path) = &cli.stl {
        let data =
            std::fs::read(path).with_context(|| format!("reading STL {}", path.display()))?;
        let mesh = stl::parse_stl(&data).with_context(|| format!("parsing {}", path.display()))?;
        return Ok(vec![mesh]);
    }
    Ok(vec![MeshData::cube(cli.cube_size)])
}

fn load_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SceneConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None if cli.model.is_none() => {
            // Single-mesh scenes would otherwise all get the car body color
            SceneConfig {
                materials: MaterialTable::solo(),
                ..SceneConfig::default()
            }
        }
        None => SceneConfig::default(),
    };

    if let Some(period) = cli.period {
        config.animation.period_seconds = period;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log.as_deref());

    let config = load_config(&cli)?;
    let meshes = load_meshes(&cli)?;
    log::info!("starting with {} meshes", meshes.len());

    let mut app = TerminalApp::new(config, &meshes)?;
    app.run()?;

    println!("Thank you for using Turntable!");
    Ok(())
}
