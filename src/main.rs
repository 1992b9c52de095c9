use bananagen::logger::{self, LogLevel, LoggerConfig};
use bananagen::{AspectRatio, Config, DataUri, GenerationRequest, ModelTier, Resolution, Studio};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bananagen", version, about = "Generate images and manage their history")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an image and add it to history
    Generate {
        prompt: String,
        /// Configured model slot to use
        #[arg(long, default_value = "nano", conflicts_with = "model")]
        tier: String,
        /// Explicit model id, bypassing the configured slots
        #[arg(long)]
        model: Option<String>,
        /// 1:1, 3:4, 4:3, 9:16 or 16:9; omit for the provider default
        #[arg(long, default_value = "")]
        aspect: String,
        /// 1K, 2K or 4K
        #[arg(long, default_value = "1K")]
        resolution: String,
        /// Reference image file (png, jpg, webp, gif; at most 5 MiB)
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Inspect and manage stored images
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored images, newest first
    List,
    /// Delete images by id
    Delete { ids: Vec<String> },
    /// Delete every stored image
    Clear,
    /// Save images to a directory as banana-{id}.{ext}
    Export {
        ids: Vec<String>,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    let mut logger_config = LoggerConfig::new()
        .with_level(level)
        .with_json_output(cli.json_logs);
    if let Some(path) = &cli.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    if !dotenv_loaded {
        log::debug!("No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let studio = Studio::new(config).await?;

    match cli.command {
        Command::Generate {
            prompt,
            tier,
            model,
            aspect,
            resolution,
            reference,
        } => {
            let model = match model {
                Some(model) => model,
                None => {
                    let tier: ModelTier = tier.parse()?;
                    studio.config().generation.model_for(tier).to_string()
                }
            };

            let mut request = GenerationRequest::new(prompt, model)
                .with_aspect_ratio(aspect.parse::<AspectRatio>()?)
                .with_resolution(resolution.parse::<Resolution>()?);
            if let Some(path) = reference {
                request = request.with_reference_image(DataUri::from_file(path)?.to_string());
            }

            let item = studio.generate_and_store(request).await?;
            println!("{}", item.id);
            if item.image().is_inline() {
                log::info!("Image returned inline; use `history export {}` to save it", item.id);
            } else {
                println!("{}", item.image_url);
            }
        }
        Command::History { action } => match action {
            HistoryAction::List => {
                for item in studio.history().all().await? {
                    let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(item.timestamp)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    let image = if item.image().is_inline() {
                        "(inline)".to_string()
                    } else {
                        item.image_url.clone()
                    };
                    println!(
                        "{}  {}  {}  {}  {}",
                        item.id, when, item.params.model, item.params.prompt, image
                    );
                }
            }
            HistoryAction::Delete { ids } => {
                for result in studio.history().delete_batch(&ids).await? {
                    if result.success {
                        println!("deleted {}", result.id);
                    } else {
                        log::warn!("{}: {}", result.id, result.message.unwrap_or_default());
                    }
                }
            }
            HistoryAction::Clear => {
                let removed = studio.history().clear().await?;
                println!("removed {} items", removed);
            }
            HistoryAction::Export { ids, dir } => {
                for result in studio.export(&ids, &dir).await? {
                    match (result.path, result.error) {
                        (Some(path), _) => println!("{}", path.display()),
                        (None, error) => log::error!(
                            "{}: {}",
                            result.id,
                            error.unwrap_or_default()
                        ),
                    }
                }
            }
        },
    }

    Ok(())
}
