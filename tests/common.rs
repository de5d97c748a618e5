// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, quiet logging and programme fixture builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `habit_coach_server`

use anyhow::Result;
use chrono::NaiveDate;
use habit_coach_server::{
    auth::{Session, StaffRole},
    config::HabitSettings,
    database::Database,
    services::{CatalogService, HabitTrackingService},
};
use habit_core::models::{ClientId, NewProgramme, Programme, ProgrammeHabit, WeeklyFrequency};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Calendar date shorthand
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Tracking service over `database` with default settings
pub fn tracking_service(database: &Database) -> HabitTrackingService {
    tracking_service_with(database, HabitSettings::default())
}

/// Tracking service over `database` with custom settings
pub fn tracking_service_with(database: &Database, settings: HabitSettings) -> HabitTrackingService {
    HabitTrackingService::new(Arc::new(database.clone()), settings)
}

/// Session acting as the given client
pub fn client_session(client_id: &ClientId) -> Session {
    Session::Client(client_id.clone())
}

/// Session acting as a trainer
pub fn trainer_session() -> Session {
    Session::Staff {
        user_id: "coach-1".to_owned(),
        role: StaffRole::Trainer,
    }
}

/// Register a client with a generated name
pub async fn seed_client(database: &Database, id: &str) -> Result<ClientId> {
    let client_id = ClientId::parse(id)?;
    CatalogService::new(database.clone())
        .create_client(&client_id, &format!("Client {id}"), None)
        .await?;
    Ok(client_id)
}

/// A programme with its attached habits, in attachment order
pub struct ProgrammeFixture {
    /// The programme
    pub programme: Programme,
    /// Assignments in the order the habits were given
    pub habits: Vec<ProgrammeHabit>,
}

impl ProgrammeFixture {
    /// Identifier of the n-th assignment
    pub fn habit_id(&self, index: usize) -> uuid::Uuid {
        self.habits[index].id
    }
}

/// Builder for a programme, its habits and its enrolments
pub struct ProgrammeBuilder {
    human_id: String,
    start: NaiveDate,
    end: Option<NaiveDate>,
    max_clients: Option<u32>,
    habits: Vec<(String, WeeklyFrequency)>,
    enrol: Vec<ClientId>,
}

impl ProgrammeBuilder {
    /// Programme running from `start` to `end` inclusive
    pub fn new(human_id: &str, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            human_id: human_id.to_owned(),
            start,
            end,
            max_clients: None,
            habits: Vec::new(),
            enrol: Vec::new(),
        }
    }

    /// Attach a new template with these frequencies
    pub fn habit(mut self, title: &str, frequency: [u32; 7]) -> Self {
        self.habits
            .push((title.to_owned(), WeeklyFrequency::new(frequency)));
        self
    }

    /// Cap enrolments
    pub const fn max_clients(mut self, max_clients: u32) -> Self {
        self.max_clients = Some(max_clients);
        self
    }

    /// Enrol a client once the programme exists
    pub fn enrol(mut self, client_id: &ClientId) -> Self {
        self.enrol.push(client_id.clone());
        self
    }

    /// Create everything through the catalog service
    pub async fn create(self, database: &Database) -> Result<ProgrammeFixture> {
        let catalog = CatalogService::new(database.clone());
        let programme = catalog
            .create_programme(&NewProgramme {
                human_id: self.human_id.clone(),
                name: format!("Programme {}", self.human_id),
                start_date: self.start,
                end_date: self.end,
                max_clients: self.max_clients,
                cost_cents: None,
                notes: None,
                adhoc_data: None,
            })
            .await?;

        let mut habits = Vec::with_capacity(self.habits.len());
        for (title, frequency) in &self.habits {
            let template = catalog.create_habit(title, None, *frequency).await?;
            habits.push(
                catalog
                    .attach_habit(programme.id, template.id, None, None)
                    .await?,
            );
        }
        for client_id in &self.enrol {
            catalog
                .enrol_client(client_id, programme.id, None, None)
                .await?;
        }

        Ok(ProgrammeFixture { programme, habits })
    }
}
