// ABOUTME: Demo data seeder for the habit tracking service
// ABOUTME: Creates a client, habit templates, two overlapping programmes and a week of completions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Demo data seeder.
//!
//! Usage:
//! ```bash
//! # Seed the configured database, anchoring the demo week on today
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific database and client
//! cargo run --bin seed-demo-data -- --database-url sqlite:./data/demo.db --client-id demo-client
//! ```

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta, Utc};
use clap::Parser;
use habit_coach_server::{
    auth::{Session, StaffRole},
    calendar::week_start,
    config::{DatabaseConfig, DatabaseUrl, HabitSettings},
    database::Database,
    logging,
    services::{CatalogService, HabitTrackingService},
};
use habit_core::dates::{format_date, parse_date, weekday_index};
use habit_core::models::{ClientId, NewProgramme, WeeklyFrequency};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "Habit tracking demo data seeder",
    long_about = "Populate the database with a demo client enrolled in two overlapping programmes"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Identifier of the demo client
    #[arg(long, default_value = "demo-client")]
    client_id: String,

    /// Monday of the seeded week (yyyy-MM-dd); defaults to the current week
    #[arg(long)]
    week_of: Option<String>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let mut logging_config = logging::LoggingConfig::from_env();
    if args.verbose {
        logging_config.level = "debug".to_owned();
    }
    logging_config.init()?;

    let mut db_config = DatabaseConfig::from_env()?;
    if let Some(url) = args.database_url.as_deref() {
        db_config.url = DatabaseUrl::parse_url(url)?;
    }
    db_config.auto_migrate = true;
    let database = Database::connect(&db_config)
        .await
        .with_context(|| format!("opening {}", db_config.url))?;

    let monday = match args.week_of.as_deref() {
        Some(text) => week_start(parse_date(text)?)?,
        None => week_start(Utc::now().date_naive())?,
    };

    let client_id = ClientId::parse(&args.client_id)?;
    let catalog = CatalogService::new(database.clone());
    catalog
        .create_client(&client_id, "Demo Client", Some("demo.client@example.com"))
        .await?;

    let water = catalog
        .create_habit(
            "Drink 2L of water",
            Some("Track each litre"),
            WeeklyFrequency::daily(2),
        )
        .await?;
    let walk = catalog
        .create_habit(
            "Walk 30 minutes",
            None,
            WeeklyFrequency::new([1, 0, 1, 0, 1, 0, 0]),
        )
        .await?;
    let stretch = catalog
        .create_habit("Evening stretch", None, WeeklyFrequency::daily(1))
        .await?;

    // Foundations runs the whole week; Mobility starts midweek and overlaps it
    let foundations = catalog
        .create_programme(&NewProgramme {
            human_id: format!("PRG-{}-F", format_date(monday)),
            name: "Foundations".to_owned(),
            start_date: monday,
            end_date: Some(monday + TimeDelta::days(27)),
            max_clients: Some(20),
            cost_cents: Some(4_900),
            notes: None,
            adhoc_data: None,
        })
        .await?;
    let mobility = catalog
        .create_programme(&NewProgramme {
            human_id: format!("PRG-{}-M", format_date(monday)),
            name: "Mobility".to_owned(),
            start_date: monday + TimeDelta::days(2),
            end_date: None,
            max_clients: None,
            cost_cents: None,
            notes: Some("Ongoing".to_owned()),
            adhoc_data: None,
        })
        .await?;

    let water_assignment = catalog
        .attach_habit(foundations.id, water.id, None, None)
        .await?;
    let walk_assignment = catalog
        .attach_habit(foundations.id, walk.id, None, None)
        .await?;
    let stretch_assignment = catalog
        .attach_habit(
            mobility.id,
            stretch.id,
            Some(WeeklyFrequency::new([1, 1, 1, 1, 1, 2, 2])),
            Some("Double up at weekends"),
        )
        .await?;

    catalog
        .enrol_client(&client_id, foundations.id, None, None)
        .await?;
    catalog
        .enrol_client(&client_id, mobility.id, Some("Added after intake"), None)
        .await?;

    let tracking = HabitTrackingService::new(Arc::new(database), HabitSettings::default());
    let trainer = Session::Staff {
        user_id: "demo-trainer".to_owned(),
        role: StaffRole::Trainer,
    };

    let mut written = 0_usize;
    for offset in 0..7 {
        let day = monday + TimeDelta::days(offset);
        let mut entries = vec![
            (water_assignment.id, demo_count(day, 2)),
            (walk_assignment.id, demo_count(day, 1)),
        ];
        if day >= mobility.start_date {
            entries.push((stretch_assignment.id, demo_count(day, 1)));
        }
        for (assignment, times_done) in entries {
            tracking
                .upsert_completion(&trainer, &client_id, assignment, day, times_done, None)
                .await?;
            written += 1;
        }
    }

    info!(
        client.id = %client_id,
        week_of = %format_date(monday),
        completions = written,
        "Demo data seeded"
    );
    println!(
        "Seeded client '{}' with programmes {} and {} and {} completions for the week of {}",
        client_id,
        foundations.human_id,
        mobility.human_id,
        written,
        format_date(monday)
    );
    Ok(())
}

/// Vary counts across the week so the calendar shows every tier
fn demo_count(day: NaiveDate, target: i64) -> i64 {
    let spread = i64::try_from(weekday_index(day)).unwrap_or(0);
    (target + 1 - spread % 3).max(0)
}
