use crate::{
    cli::globals::GlobalArgs,
    seed::SeedStore,
    totp::{Clock, SystemClock, TimeStepCodeEngine},
};
use anyhow::{anyhow, Result};
use chrono::DateTime;
use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub interval: u64,
    pub once: bool,
}

/// Execute the scheduled logging job.
///
/// Each tick reads the seed fresh, so a seed provisioned while the job runs is
/// picked up on the next line.
///
/// # Errors
/// With `--once`, returns an error if no line could be produced. The loop itself
/// only stops on Ctrl-C.
pub async fn execute(args: Args) -> Result<()> {
    let store: Arc<dyn SeedStore> = Arc::new(args.globals.seed_store());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if args.once {
        let line = read_line(Arc::clone(&store), Arc::clone(&clock)).await?;
        println!("{line}");
        return Ok(());
    }

    info!("Logging a code every {}s", args.interval);

    let mut ticker = interval(Duration::from_secs(args.interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match read_line(Arc::clone(&store), Arc::clone(&clock)).await {
                    Ok(line) => println!("{line}"),
                    Err(err) => error!("Could not produce a code: {err:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping code logger");
                return Ok(());
            }
        }
    }
}

/// [`code_line`] on the blocking pool, the store may hit the filesystem.
///
/// # Errors
/// Returns an error if the seed is missing or unusable.
pub async fn read_line(store: Arc<dyn SeedStore>, clock: Arc<dyn Clock>) -> Result<String> {
    tokio::task::spawn_blocking(move || code_line(store.as_ref(), clock.as_ref())).await?
}

/// One log line for the current instant: `YYYY-MM-DD HH:MM:SS - 2FA Code: NNNNNN` (UTC).
///
/// # Errors
/// Returns an error if the seed is missing or unusable.
pub fn code_line(store: &dyn SeedStore, clock: &dyn Clock) -> Result<String> {
    let seed = store.get()?;
    let engine = TimeStepCodeEngine::from_seed(&seed)?;

    let now = clock.now();
    let current = engine.generate_at(now);
    format_line(now, &current.code)
}

fn format_line(unix_time: u64, code: &str) -> Result<String> {
    let seconds = i64::try_from(unix_time)?;
    let timestamp =
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| anyhow!("timestamp out of range"))?;
    Ok(format!(
        "{} - 2FA Code: {code}",
        timestamp.format("%Y-%m-%d %H:%M:%S")
    ))
}
