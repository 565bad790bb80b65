//! CLI for RunwayViz - Runway ML video generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use runwayviz::{
    estimate_cost, AspectRatio, GenerationRequest, GenerationResult, Resolution, RunwayProvider,
    TimeoutPolicy, VideoModel, VideoTaskProvider,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "runwayviz")]
#[command(about = "Generate videos via the Runway ML API")]
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
    /// Generate a video and save it to a file
    Generate(GenerateArgs),

    /// Submit a generation task without waiting for it
    Submit(RequestArgs),

    /// Show the current status of a task
    Status(TaskArgs),

    /// Wait for a submitted task and save its video
    Wait(WaitArgs),

    /// Cancel a running task
    Cancel(TaskArgs),

    /// Estimate the price of a request in dollars
    Estimate(RequestArgs),
}

#[derive(Args)]
struct RequestArgs {
    /// The text prompt describing the video
    prompt: String,

    /// Model tier
    #[arg(short, long, value_enum, default_value = "fast")]
    model: ModelArg,

    /// Video duration in seconds (5 or 10)
    #[arg(short, long, default_value_t = 5)]
    duration: u32,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Resolution
    #[arg(long, value_enum, default_value = "720p")]
    resolution: ResolutionArg,

    /// Source image URL (image-to-video)
    #[arg(short, long)]
    image: Option<String>,

    /// Seed for reproducible generation
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Args)]
struct PollArgs {
    /// Seconds between status polls
    #[arg(long, default_value_t = 3)]
    poll_interval: u64,

    /// Maximum number of status polls
    #[arg(long, default_value_t = 100)]
    max_polls: u32,

    /// Cancel the remote task if polling times out
    #[arg(long)]
    cancel_on_timeout: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    request: RequestArgs,

    #[command(flatten)]
    poll: PollArgs,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct TaskArgs {
    /// Task id returned by `submit`
    task_id: String,
}

#[derive(Args)]
struct WaitArgs {
    /// Task id returned by `submit`
    task_id: String,

    #[command(flatten)]
    poll: PollArgs,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Fast,
    HighQuality,
    Creative,
}

impl From<ModelArg> for VideoModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => VideoModel::Fast,
            ModelArg::HighQuality => VideoModel::HighQuality,
            ModelArg::Creative => VideoModel::Creative,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "1:1")]
    Square,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Square => AspectRatio::Square,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    #[value(name = "720p")]
    Hd,
    #[value(name = "1080p")]
    FullHd,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Hd => Resolution::Hd,
            ResolutionArg::FullHd => Resolution::FullHd,
        }
    }
}

impl RequestArgs {
    fn to_request(&self) -> GenerationRequest {
        let mut request = GenerationRequest::new(&self.prompt)
            .with_model(self.model.into())
            .with_duration(self.duration)
            .with_aspect_ratio(self.aspect_ratio.into())
            .with_resolution(self.resolution.into());
        if let Some(image) = &self.image {
            request = request.with_source_image(image);
        }
        if let Some(seed) = self.seed {
            request = request.with_seed(seed);
        }
        request
    }
}

fn build_provider(poll: Option<&PollArgs>) -> anyhow::Result<RunwayProvider> {
    let mut builder = RunwayProvider::builder();
    if let Some(poll) = poll {
        builder = builder
            .poll_interval(Duration::from_secs(poll.poll_interval))
            .max_attempts(poll.max_polls);
        if poll.cancel_on_timeout {
            builder = builder.on_timeout(TimeoutPolicy::Cancel);
        }
    }
    Ok(builder.build()?)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("runwayviz=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Submit(args) => submit(args, cli.json).await?,
        Commands::Status(args) => status(args, cli.json).await?,
        Commands::Wait(args) => wait(args, cli.json).await?,
        Commands::Cancel(args) => cancel(args, cli.json).await?,
        Commands::Estimate(args) => estimate(args, cli.json)?,
    }

    Ok(())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let request = args.request.to_request();
    let provider = build_provider(Some(&args.poll))?;

    eprintln!("Generating video (this may take a few minutes)...");
    let result = provider.generate(&request).await?;
    report_result(&provider, &result, &args.output, json_output)
}

async fn submit(args: RequestArgs, json_output: bool) -> anyhow::Result<()> {
    let request = args.to_request();
    let provider = build_provider(None)?;
    let task_id = provider.submit(&request).await?;

    if json_output {
        let result = serde_json::json!({
            "task_id": task_id,
            "estimated_cost_usd": estimate_cost(&request),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Submitted task {}", task_id);
    }
    Ok(())
}

async fn status(args: TaskArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(None)?;
    let task = provider.task_status(&args.task_id).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("Task {}: {}", task.task_id, task.status);
        if let Some(url) = task.output.first() {
            println!("Output: {}", url);
        }
        if let Some(failure) = &task.failure {
            println!("Failure: {}", failure);
        }
    }
    Ok(())
}

async fn wait(args: WaitArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(Some(&args.poll))?;
    let result = provider.await_completion(&args.task_id).await?;
    report_result(&provider, &result, &args.output, json_output)
}

async fn cancel(args: TaskArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(None)?;
    provider.cancel(&args.task_id).await?;

    if json_output {
        let result = serde_json::json!({ "task_id": args.task_id, "cancelled": true });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Cancellation requested for task {}", args.task_id);
    }
    Ok(())
}

fn estimate(args: RequestArgs, json_output: bool) -> anyhow::Result<()> {
    let request = args.to_request();
    request.validate()?;
    let cost = estimate_cost(&request);

    if json_output {
        let result = serde_json::json!({
            "model": request.model.as_str(),
            "duration_secs": request.duration_secs,
            "estimated_cost_usd": cost,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} for {}s: ${:.2}",
            request.model, request.duration_secs, cost
        );
    }
    Ok(())
}

fn report_result(
    provider: &RunwayProvider,
    result: &GenerationResult,
    output: &Path,
    json_output: bool,
) -> anyhow::Result<()> {
    let Some(location) = &result.asset_location else {
        let reason = result
            .error_message
            .as_deref()
            .unwrap_or("video generation failed");
        if json_output {
            let body = serde_json::json!({
                "type": "video",
                "success": false,
                "task_id": result.task_id,
                "error": reason,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        anyhow::bail!("task {} failed: {}", result.task_id, reason);
    };

    let video = provider
        .assets()
        .resolve(location)
        .ok_or_else(|| anyhow::anyhow!("asset {} is no longer available", location))?;
    video.save(output)?;
    provider.assets().revoke(location);

    if json_output {
        let body = serde_json::json!({
            "type": "video",
            "success": true,
            "task_id": result.task_id,
            "output": output.display().to_string(),
            "size_bytes": video.size(),
            "mime_type": video.mime_type,
            "video_duration_secs": result.duration_secs,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!(
            "Generated video: {} ({} bytes) from task {}",
            output.display(),
            video.size(),
            result.task_id
        );
        if let Some(duration) = result.duration_secs {
            println!("Video duration: {}s", duration);
        }
    }
    Ok(())
}
