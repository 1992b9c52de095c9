use bananagen::{AspectRatio, Config, GenerationRequest, ModelTier, Resolution, Studio};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    bananagen::logger::init()?;
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found");
    }

    let config = Config::from_env();
    let model = config.generation.model_for(ModelTier::Pro).to_string();
    let studio = Studio::new(config).await?;

    let request = GenerationRequest::new(
        "A ripe banana floating above a neon city at night, cinematic lighting",
        model,
    )
    .with_aspect_ratio(AspectRatio::Landscape16x9)
    .with_resolution(Resolution::Res2K);

    let item = studio.generate_and_store(request).await?;
    println!("{} -> {} chars", item.id, item.image_url.len());

    Ok(())
}
