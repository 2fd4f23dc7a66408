use super::dashboard::{print_crypto, print_rates, refresh_rates_with_spinner};
use super::ui::{StyleType, style_text};
use crate::core::notify::{Notifier, ThrottledNotifier};
use crate::core::rates::ApplicationState;
use crate::core::repository::RateRepository;
use crate::core::scheduler::PeriodicTask;
use crate::{App, SETTINGS_COLLECTION};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Prints notifications to the terminal.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, summary: &str) {
        println!("\n{}", style_text("Rates updated", StyleType::Title));
        for line in summary.lines() {
            println!("  {line}");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshJob {
    Rates,
    CryptoPrices,
}

async fn run_job(repository: &RateRepository, state: &mut ApplicationState, job: RefreshJob) {
    match job {
        RefreshJob::Rates => {
            // Failures are already reported and the last good rates stay on screen
            let _ = refresh_rates_with_spinner(repository, state).await;
            print_rates(state, repository.markets());
        }
        RefreshJob::CryptoPrices => {
            if let Err(e) = repository.refresh_crypto_prices(state).await {
                println!(
                    "{} {}",
                    style_text("Could not load crypto prices:", StyleType::Error),
                    e
                );
            }
            print_crypto(state, repository.markets());
        }
    }
}

/// Keeps the dashboard fresh until interrupted. Periodic triggers only enqueue
/// jobs; this loop runs them one at a time so refreshes never overlap.
pub async fn run(app: &App) -> Result<()> {
    let notifier = ThrottledNotifier::new(ConsoleNotifier, app.store.collection(SETTINGS_COLLECTION));
    let repository = app.repository(Some(Arc::new(notifier)))?;

    let mut state = ApplicationState::default();
    if repository.restore(&mut state).await {
        print_rates(&state, repository.markets());
    }
    run_job(&repository, &mut state, RefreshJob::Rates).await;
    run_job(&repository, &mut state, RefreshJob::CryptoPrices).await;

    let (tx, mut rx) = mpsc::channel(4);
    let schedule = &app.config.schedule;
    let tasks = vec![
        PeriodicTask::start("rates", schedule.rates_period(), tx.clone(), RefreshJob::Rates),
        PeriodicTask::start(
            "crypto",
            schedule.crypto_period(),
            tx,
            RefreshJob::CryptoPrices,
        ),
    ];
    info!(
        rates_minutes = schedule.rates_minutes,
        crypto_minutes = schedule.crypto_minutes,
        "Watching rates"
    );
    println!(
        "{}",
        style_text("Watching for updates, press Ctrl-C to stop", StyleType::Subtle)
    );

    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => run_job(&repository, &mut state, job).await,
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Could not listen for Ctrl-C");
                }
                break;
            }
        }
    }

    for task in tasks {
        task.stop().await;
    }
    Ok(())
}
