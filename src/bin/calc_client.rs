//! Terminal front end for the calculator backend
//!
//! Reads commands from stdin, one per line:
//!   initialSavings=2500   edit a field (debounced recalculation)
//!   calc                  calculate now
//!   retry                 re-send the last request
//!   quit

use std::sync::Arc;

use anyhow::{Context, Result};
use savings_calculator::client::{self, HttpTransport, OrchestratorConfig, ViewState};
use savings_calculator::Field;
use tokio::io::{AsyncBufReadExt, BufReader};

fn render(view: &ViewState) {
    for (field, message) in &view.field_errors {
        println!("  ! {}: {}", field, message);
    }
    if let Some(notice) = &view.notice {
        println!("  ! {}", notice);
    }
    if view.loading {
        println!("  Crunching numbers...");
        return;
    }
    if let Some(error) = &view.error {
        println!("  {}: {} (type 'retry' to try again)", error.title(), error.message);
        return;
    }
    if let Some(result) = &view.result {
        let s = &result.summary;
        println!(
            "  {} years: deposited ${:.2}, interest ${:.2}, final balance ${:.2}",
            s.years, s.total_deposited, s.total_interest_earned, s.final_balance
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let base_url =
        std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
    let transport = HttpTransport::new(&base_url).context("configuring backend transport")?;
    log::info!("Using backend at {}", transport.endpoint());

    let (handle, task) = client::spawn(Arc::new(transport), OrchestratorConfig::default());

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            render(&view);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "calc" => handle.calculate()?,
            "retry" => handle.retry()?,
            other => match other.split_once('=') {
                Some((key, value)) => match Field::from_key(key.trim()) {
                    Some(field) => handle.set_field(field, value.trim())?,
                    None => println!("  unknown field {:?}", key.trim()),
                },
                None => println!("  unknown command {:?}", other),
            },
        }
    }

    handle.shutdown()?;
    task.await?;
    printer.abort();
    Ok(())
}
