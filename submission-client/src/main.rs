use anyhow::Context;
use clap::Parser;
use service_core::models::ActivitySpec;
use std::path::PathBuf;
use submission_client::age::AgeStage;
use submission_client::{
    downscale, DownscaleOptions, ImagePayload, Locale, SubmissionClient, Wizard,
};

/// Suggest play activities for a toy photo and a baby's age.
#[derive(Debug, Parser)]
#[command(name = "playtime-submit", version, about)]
struct Args {
    /// Base URL of the relay.
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:3001")]
    relay_url: String,

    /// Age in months (0-36).
    #[arg(long)]
    age: u32,

    /// Toy photo (jpg, png or webp).
    #[arg(long)]
    image: PathBuf,

    #[arg(long, default_value_t = 800)]
    max_dimension: u32,

    /// JPEG quality used when downscaling.
    #[arg(long, default_value_t = 80)]
    quality: u8,

    /// Send the photo as-is.
    #[arg(long)]
    no_resize: bool,

    /// Print the activities as JSON.
    #[arg(long)]
    json: bool,
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

    let args = Args::parse();

    let mut image = ImagePayload::from_path(&args.image)
        .await
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    if !args.no_resize {
        image = downscale(
            &image,
            DownscaleOptions {
                max_dimension: args.max_dimension,
                quality: args.quality,
            },
        )?;
    }

    let client = SubmissionClient::new(&args.relay_url)?;
    let mut wizard = Wizard::new(Locale::English);
    wizard.select_age(args.age)?;

    if let Err(e) = wizard.submit_image(image, &client).await {
        anyhow::bail!(wizard.last_error().map(str::to_string).unwrap_or_else(|| e.to_string()));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(wizard.activities())?);
    } else {
        let stage = AgeStage::for_months(args.age);
        println!(
            "{} {} months · {} / {}\n",
            stage.icon(),
            args.age,
            stage.label_en(),
            stage.label_zh()
        );
        for activity in wizard.activities() {
            print_activity(activity);
        }
    }

    Ok(())
}

fn print_activity(activity: &ActivitySpec) {
    println!("== {} ({})", activity.name, activity.id);
    for (i, step) in activity.steps.iter().enumerate() {
        match &step.main_step_chinese {
            Some(title) => println!("  {}. [{}] {}", i + 1, title, step.instruction_english),
            None => println!("  {}. {}", i + 1, step.instruction_english),
        }
        println!("     {}", step.instruction_chinese);
    }
    if !activity.goals.is_empty() {
        println!("  Goals: {}", activity.goals.join("; "));
    }
    if !activity.safety_tips.is_empty() {
        println!("  Safety: {}", activity.safety_tips.join("; "));
    }
    println!();
}
