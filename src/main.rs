//! Andry CLI - Generate Andry tree artworks from content-analysis records.

use andry_art::config::EngineConfig;
use andry_art::pipeline::{Artwork, Engine};
use andry_art::{extract_metadata, GenerationParameters};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "andry")]
#[command(about = "Generate Andry tree art from medical content analysis")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "andry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate one artwork from an analysis JSON file
    Generate {
        /// Analysis record (JSON)
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Title used in the default file name
        #[arg(short, long)]
        title: Option<String>,

        /// Width of the output
        #[arg(long)]
        width: Option<u32>,

        /// Height of the output
        #[arg(long)]
        height: Option<u32>,

        /// Also save the artwork record as JSON
        #[arg(long)]
        save_artwork: bool,
    },

    /// Print the metadata embedded in an SVG
    Extract {
        /// SVG produced by `generate`
        input: PathBuf,
    },

    /// Re-run an artwork under a new algorithm version
    Regenerate {
        /// SVG produced by `generate`
        input: PathBuf,

        /// New algorithm version
        #[arg(short, long)]
        algorithm_version: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate artworks for every JSON file in a directory
    Batch {
        /// Directory of analysis records
        input_dir: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Pause between exports in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Stop after this many records
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Generate artworks from sample parameters
    Showcase {
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seed for consistent results
        #[arg(short = 'S', long, default_value = "42")]
        seed: u64,

        /// Number of pieces
        #[arg(short, long, default_value = "6")]
        count: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("andry=info".parse()?)
                .add_directive("andry_art=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            title,
            width,
            height,
            save_artwork,
        } => {
            config.canvas.width = width.unwrap_or(config.canvas.width);
            config.canvas.height = height.unwrap_or(config.canvas.height);
            let engine = Engine::from_config(&config)?;

            let artwork = generate_file(&engine, &input)?;
            let title = title.unwrap_or_else(|| file_stem(&input));
            let output_path = match output {
                Some(path) => path,
                None => output_dir(&config)?.join(artwork.file_name(&title)),
            };
            save(&artwork, &output_path, save_artwork || config.output.save_artwork)?;
        }

        Commands::Extract { input } => {
            let svg = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let metadata = extract_metadata(&svg)?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }

        Commands::Regenerate {
            input,
            algorithm_version,
            output,
        } => {
            let svg = fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let previous = extract_metadata(&svg)?;
            let engine = Engine::from_config(&config)?;
            let artwork =
                engine.regenerate_from_metadata(&previous, &algorithm_version, Utc::now())?;

            println!(
                "Regenerated {} v{} -> {} v{}",
                previous.artwork_id, previous.version, artwork.id, artwork.version
            );
            let output_path = match output {
                Some(path) => path,
                None => output_dir(&config)?
                    .join(artwork.revision_file_name(&previous, &file_stem(&input))),
            };
            save(&artwork, &output_path, config.output.save_artwork)?;
        }

        Commands::Batch {
            input_dir,
            output_dir: out,
            delay_ms,
            max_items,
        } => {
            let delay = Duration::from_millis(delay_ms.unwrap_or(config.batch.delay_ms));
            let max_items = max_items.unwrap_or(config.batch.max_items);
            let out = match out {
                Some(dir) => dir,
                None => output_dir(&config)?,
            };
            fs::create_dir_all(&out)?;

            let mut inputs: Vec<PathBuf> = fs::read_dir(&input_dir)
                .with_context(|| format!("failed to list {}", input_dir.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            inputs.sort();

            let engine = Engine::from_config(&config)?;
            let total = inputs.len().min(max_items);
            println!("Generating {} artworks from {}...", total, input_dir.display());

            let mut failed = 0;
            for (i, input) in inputs.iter().take(max_items).enumerate() {
                if i > 0 && !delay.is_zero() {
                    thread::sleep(delay);
                }
                match generate_file(&engine, input) {
                    Ok(artwork) => {
                        let path = out.join(artwork.file_name(&file_stem(input)));
                        save(&artwork, &path, config.output.save_artwork)?;
                    }
                    Err(err) => {
                        failed += 1;
                        tracing::warn!(input = %input.display(), error = %err, "skipping record");
                    }
                }
            }
            println!("Done! {} of {} saved to {}", total - failed, total, out.display());
        }

        Commands::Showcase {
            output_dir: out,
            seed,
            count,
        } => {
            let out = match out {
                Some(dir) => dir,
                None => PathBuf::from(&config.output.directory).join("showcase"),
            };
            fs::create_dir_all(&out)?;

            let engine = Engine::from_config(&config)?;
            println!("Generating showcase with seed {}...", seed);
            for i in 0..count {
                let params = GenerationParameters::sample(seed.wrapping_add(i));
                println!("  {}", params);
                let artwork = engine.generate(params, Utc::now())?;
                let path = out.join(artwork.file_name(&format!("showcase-{i}")));
                save(&artwork, &path, false)?;
            }
            println!("Done! Showcase saved to {}", out.display());
        }
    }

    Ok(())
}

fn generate_file(engine: &Engine, input: &Path) -> Result<Artwork> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let extraction = engine.extractor().extract_str(&text)?;
    if !extraction.issues.is_empty() {
        println!(
            "  {} input corrections in {}",
            extraction.issues.len(),
            input.display()
        );
    }
    let artwork = engine.generate(extraction.parameters, Utc::now())?;
    Ok(artwork)
}

fn save(artwork: &Artwork, path: &Path, with_record: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &artwork.vector_document)?;
    println!(
        "Saved {} ({} {}) to {}",
        artwork.id,
        artwork.rarity_tier,
        artwork.rarity_score,
        path.display()
    );

    if with_record {
        let record_path = path.with_extension("json");
        fs::write(&record_path, serde_json::to_string_pretty(artwork)?)?;
        println!("Saved artwork record to {}", record_path.display());
    }
    Ok(())
}

fn output_dir(config: &EngineConfig) -> Result<PathBuf> {
    let dir = PathBuf::from(&config.output.directory);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artwork".to_string())
}
