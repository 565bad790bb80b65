//! Basic video generation example.
//!
//! Run with: `cargo run --example generate_video`
//!
//! Requires `RUNWAYML_API_SECRET` environment variable.

use runwayviz::{estimate_cost, GenerationRequest, RunwayProvider, VideoTaskProvider};

#[tokio::main]
async fn main() -> runwayviz::Result<()> {
    let provider = RunwayProvider::from_env()?;

    let request = GenerationRequest::new("Ocean waves crashing on a rocky shore at sunset")
        .with_duration(5);

    println!(
        "Generating video, estimated cost ${:.2} (this may take a few minutes)...",
        estimate_cost(&request)
    );
    let result = provider.generate(&request).await?;

    match &result.asset_location {
        Some(location) => {
            if let Some(video) = provider.assets().resolve(location) {
                video.save("output.mp4")?;
                println!(
                    "Generated video: {} bytes, duration: {:?}",
                    video.size(),
                    result.duration_secs
                );
            }
            provider.assets().revoke(location);
        }
        None => println!("Generation failed: {:?}", result.error_message),
    }

    Ok(())
}
