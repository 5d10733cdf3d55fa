use anyhow::Result;
use clap::{Parser, Subcommand};
use creatorlink::config::Config;
use creatorlink::seed::{self, SeedClicksRequest, SeedRequest};
use creatorlink::stats::today_in;
use creatorlink::storage;

#[derive(Parser)]
#[command(name = "creatorlink-admin")]
#[command(about = "CreatorLink load-test data CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every row from every table
    Reset {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
    /// Create an advertiser with campaigns, creators, channels and links
    Seed {
        #[arg(long, default_value = "seed@creatorlink.com")]
        email: String,
        #[arg(long, default_value_t = 1)]
        campaigns: usize,
        #[arg(long, default_value_t = 50)]
        creators: usize,
        #[arg(long, default_value_t = 20)]
        channels: usize,
        #[arg(long, default_value_t = 20)]
        links_per_creator: usize,
        /// Share of links created inactive, 0.0 to 0.99
        #[arg(long, default_value_t = 0.0)]
        inactive_ratio: f64,
        #[arg(long, default_value = "https://example.com")]
        landing_url: String,
    },
    /// Insert synthetic clicks on a campaign's active links
    SeedClicks {
        campaign_id: i64,
        total_rows: usize,
        #[arg(long, default_value_t = 5000)]
        batch_size: usize,
        #[arg(long, default_value_t = 90)]
        days_back_from: i64,
        #[arg(long, default_value_t = 30)]
        days_back_to: i64,
        #[arg(long, default_value_t = 0.2)]
        skew_ratio: f64,
        #[arg(long, default_value_t = 200)]
        hot_link_top_k: usize,
    },
    /// Print active slugs, one per line
    Slugs {
        #[arg(long, default_value_t = seed::DEFAULT_SLUG_LIMIT)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let storage = storage::open(&config.database).await?;
    let offset = config.stats.offset();

    match cli.command {
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("refusing to wipe the database without --yes");
            }
            let counts = seed::reset(&storage).await?;
            println!(
                "✓ Deleted {} clicks, {} links, {} campaigns, {} channels, {} creators, {} advertisers",
                counts.clicks,
                counts.tracking_links,
                counts.campaigns,
                counts.channels,
                counts.creators,
                counts.advertisers,
            );
        }
        Commands::Seed {
            email,
            campaigns,
            creators,
            channels,
            links_per_creator,
            inactive_ratio,
            landing_url,
        } => {
            let request = SeedRequest {
                user_email: email,
                campaigns,
                creators,
                channels,
                links_per_creator,
                inactive_link_ratio: inactive_ratio,
                landing_url,
                ..SeedRequest::default()
            };
            let result = seed::seed(&storage, &request, today_in(offset)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::SeedClicks {
            campaign_id,
            total_rows,
            batch_size,
            days_back_from,
            days_back_to,
            skew_ratio,
            hot_link_top_k,
        } => {
            let request = SeedClicksRequest {
                campaign_id,
                total_rows,
                batch_size,
                days_back_from,
                days_back_to,
                skew_ratio,
                hot_link_top_k,
            };
            let result = seed::seed_clicks(&storage, &request, today_in(offset), offset).await?;
            println!(
                "✓ Inserted {} clicks in {} ms",
                result.inserted, result.elapsed_ms
            );
        }
        Commands::Slugs { limit } => {
            for slug in seed::active_slugs(&storage, Some(limit)).await? {
                println!("{slug}");
            }
        }
    }

    Ok(())
}
