use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tagpulse::{
    Broadcaster, Store,
    seed::{ADMIN_EMAIL, DEFAULT_SEED, DEMO_EMAIL, SeedOptions, seed_demo},
};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Demo Data",
    commands: &[
        "tagpulse --backend redis seed            # Replace everything under the prefix with demo data",
        "tagpulse --backend redis seed --seed 7   # Use a different random seed",
    ],
}];

#[derive(Args)]
pub struct SeedArgs {
    /// Random seed; the same seed yields the same dataset
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

pub async fn handle_seed<S, B>(args: SeedArgs, app: &App<S, B>, output: &OutputManager) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    output.heading("Seeding demo data");
    let report = seed_demo(
        &app.content(),
        SeedOptions {
            seed: args.seed,
            now: Utc::now(),
        },
    )
    .await
    .context("Failed to seed demo data")?;

    output.success("Demo data loaded");
    output.display(&report)?;
    output.bullet(&format!("Admin: {ADMIN_EMAIL}"));
    output.bullet(&format!("Demo:  {DEMO_EMAIL}"));
    Ok(())
}
