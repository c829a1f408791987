use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use heightmap_physics::settings::{self, PhysicsSettings};
use heightmap_physics::shape::{shape_chain, to_vec3};
use heightmap_physics::{HeightMapBuilder, HeightMapShape};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heightmap-tool")]
#[command(about = "Build and inspect height map collision shapes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the shape for a height map and print its statistics
    Build {
        /// JSON file with `width`, `depth` and `heights`
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Print the surface height at a point in shape space
    Sample {
        /// JSON file with `width`, `depth` and `heights`
        file: PathBuf,

        #[arg(allow_negative_numbers = true)]
        x: f32,

        #[arg(allow_negative_numbers = true)]
        z: f32,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(clap::Args)]
struct SettingsArgs {
    /// TOML settings file. Defaults come from HEIGHTMAP_ACTIVE_EDGE_THRESHOLD
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Active edge threshold in degrees, overrides the settings file
    #[arg(long)]
    threshold: Option<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { file, settings: args } => {
            settings::set_global(load_settings(&args)?);
            build(&file)?;
        }
        Commands::Sample {
            file,
            x,
            z,
            settings: args,
        } => {
            settings::set_global(load_settings(&args)?);
            sample(&file, x, z)?;
        }
    }

    Ok(())
}

fn load_settings(args: &SettingsArgs) -> Result<PhysicsSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings {}", path.display()))?;
            PhysicsSettings::from_toml_str(&source)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => PhysicsSettings::from_env()?,
    };

    if let Some(threshold) = args.threshold {
        settings = PhysicsSettings::new(threshold)?;
    }

    tracing::debug!(
        "Active edge threshold: {} degrees",
        settings.active_edge_threshold_degrees
    );
    Ok(settings)
}

fn load_height_map(path: &Path) -> Result<HeightMapShape> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read height map {}", path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse height map {}", path.display()))?;

    let mut height_map = HeightMapShape::new();
    height_map.add_owner(path.display().to_string());
    height_map
        .set_data(&data)
        .with_context(|| format!("Invalid height map {}", path.display()))?;

    Ok(height_map)
}

fn build(path: &Path) -> Result<()> {
    let height_map = load_height_map(path)?;
    println!("Grid: {}", height_map);

    let plan = HeightMapBuilder::new()
        .with_owners(height_map.owners_to_string())
        .plan(height_map.grid())?;
    let Some(plan) = plan else {
        println!("Empty height map, no shape");
        return Ok(());
    };
    println!(
        "Plan: {:?} (double-sided: {})",
        plan.strategy, plan.double_sided
    );

    let Some(shape) = height_map.try_shape()? else {
        bail!("Builder returned no shape for a non-empty grid");
    };

    let chain: Vec<String> = shape_chain(&shape)
        .iter()
        .map(|kind| format!("{:?}", kind))
        .collect();
    let aabb = shape.local_aabb();

    println!("Shape: {}", chain.join(" -> "));
    println!("Triangles: {}", shape.triangle_count());
    println!("Active edges: {}", shape.active_edge_count());
    println!(
        "Bounds: {} .. {}",
        to_vec3(&aabb.mins),
        to_vec3(&aabb.maxs)
    );

    Ok(())
}

fn sample(path: &Path, x: f32, z: f32) -> Result<()> {
    let height_map = load_height_map(path)?;
    let Some(shape) = height_map.try_shape()? else {
        bail!("Height map {} is empty", path.display());
    };

    match shape.height_at(x, z) {
        Some(height) => println!("{}", height),
        None => bail!("({}, {}) is outside the height map", x, z),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses() {
        let cli =
            Cli::try_parse_from(["heightmap-tool", "sample", "map.json", "-1.5", "2"]).unwrap();
        match cli.command {
            Commands::Sample { x, z, .. } => {
                assert_eq!(x, -1.5);
                assert_eq!(z, 2.0);
            }
            Commands::Build { .. } => panic!("Expected sample command"),
        }
    }

    #[test]
    fn test_load_height_map() {
        let file = write_file(r#"{ "width": 2, "depth": 2, "heights": [0, 1, 2, 3] }"#);
        let height_map = load_height_map(file.path()).unwrap();
        assert_eq!(height_map.to_string(), "{height_count=4 width=2 depth=2}");
        assert!(height_map.owners_to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_rejects_bad_payload() {
        let file = write_file(r#"{ "width": "2", "depth": 2, "heights": [] }"#);
        assert!(load_height_map(file.path()).is_err());
    }

    #[test]
    fn test_settings_precedence() {
        let file = write_file("active_edge_threshold_degrees = 30.0\n");
        let args = SettingsArgs {
            settings: Some(file.path().to_path_buf()),
            threshold: None,
        };
        assert_eq!(load_settings(&args).unwrap().active_edge_threshold_degrees, 30.0);

        let args = SettingsArgs {
            settings: Some(file.path().to_path_buf()),
            threshold: Some(10.0),
        };
        assert_eq!(load_settings(&args).unwrap().active_edge_threshold_degrees, 10.0);

        let args = SettingsArgs {
            settings: None,
            threshold: Some(400.0),
        };
        assert!(load_settings(&args).is_err());
    }
}
