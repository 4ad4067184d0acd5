//! CLI for Yulestudio - AI holiday photo composites.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use yulestudio::{
    compose, compose_preset, detect_media_type, DirectiveSet, GeminiService, GenerationState,
    PresetOptions, Studio, StyleBlock,
};

/// Default output filename stem; the extension follows the returned media
/// type.
const DEFAULT_OUTPUT_STEM: &str = "holiday_photo";

#[derive(Parser)]
#[command(name = "yulestudio")]
#[command(about = "Compose stylized holiday photos from reference shots via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a holiday composite from reference photos
    Generate(GenerateArgs),

    /// Print AI-suggested refinement directives for reference photos
    Suggest(SuggestArgs),

    /// Print the prompt that would be sent, without calling the service
    Preview(PreviewArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Reference photos (up to 10)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra directive text (repeatable)
    #[arg(short, long)]
    directive: Vec<String>,

    /// Run scene analysis first and adopt the suggestions
    #[arg(long)]
    suggest: bool,

    /// Use the fixed holiday preset instead of directives
    #[arg(long, conflicts_with_all = ["directive", "suggest"])]
    preset: bool,
}

#[derive(Args)]
struct SuggestArgs {
    /// Reference photos (up to 10)
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Args)]
struct PreviewArgs {
    /// Directive text (repeatable)
    #[arg(short, long)]
    directive: Vec<String>,

    /// Preview the fixed holiday preset
    #[arg(long, conflicts_with = "directive")]
    preset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await,
        Commands::Suggest(args) => suggest(args, cli.json).await,
        Commands::Preview(args) => preview(args, cli.json),
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;
    let mut studio = Studio::new(service);
    load_references(&mut studio, &args.images)?;

    if args.preset {
        studio.use_preset(PresetOptions::default());
    } else if args.suggest || (args.directive.is_empty() && studio.wants_auto_analysis()) {
        let directives = studio.analyze().await;
        eprintln!("Adopted {} suggested directives", directives.len());
    }
    for text in &args.directive {
        studio.add_custom_directive(text);
    }

    match studio.generate().await {
        GenerationState::Succeeded(photo) => {
            let output = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_OUTPUT_STEM}.{}", photo.extension())));
            photo.save(&output)?;

            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "output": output.display().to_string(),
                    "size_bytes": photo.size(),
                    "media_type": photo.media_type(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Saved composite: {} ({} bytes)",
                    output.display(),
                    photo.size()
                );
            }
            Ok(())
        }
        GenerationState::Failed { message } => anyhow::bail!("{message}"),
        _ => anyhow::bail!("generation ended in an unexpected state"),
    }
}

async fn suggest(args: SuggestArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;
    let mut studio = Studio::new(service);
    load_references(&mut studio, &args.images)?;

    let directives = studio.analyze().await;

    if json_output {
        let entries: Vec<_> = directives
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d.id,
                    "label": d.label,
                    "description": d.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if directives.is_empty() {
        println!("No suggestions available for these photos.");
    } else {
        for directive in directives {
            println!("{}: {}", directive.label, directive.description);
        }
    }

    Ok(())
}

fn preview(args: PreviewArgs, json_output: bool) -> anyhow::Result<()> {
    let style = StyleBlock::default();
    let prompt = if args.preset {
        compose_preset(&PresetOptions::default(), &style)
    } else {
        let mut directives = DirectiveSet::new();
        for text in &args.directive {
            directives.add_custom(text);
        }
        compose(directives.directives(), &style)
    };

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "prompt": prompt }))?
        );
    } else {
        println!("{prompt}");
    }

    Ok(())
}

fn load_references(studio: &mut Studio<GeminiService>, paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        let bytes = std::fs::read(path)?;
        let media_type = detect_media_type(&bytes)
            .or_else(|| media_type_from_extension(path))
            .ok_or_else(|| anyhow::anyhow!("unrecognized image format: {}", path.display()))?;
        studio.add_reference(&bytes, media_type)?;
    }
    Ok(())
}

fn media_type_from_extension(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
