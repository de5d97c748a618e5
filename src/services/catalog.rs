// ABOUTME: Catalog maintenance used by trainer workflows and the demo seeder
// ABOUTME: Validates input before it reaches the store and maps store errors to AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::database::{Database, EnrolmentOutcome};
use crate::errors::{AppError, AppResult};
use habit_core::models::{
    Client, ClientId, Habit, NewProgramme, Programme, ProgrammeEnrolment, ProgrammeHabit,
    WeeklyFrequency,
};
use tracing::info;
use uuid::Uuid;

/// Trainer-side catalog operations
#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    /// Create a catalog service over the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a client under a caller-chosen identifier
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` for a blank name and `ResourceAlreadyExists` for a taken id
    pub async fn create_client(
        &self,
        id: &ClientId,
        name: &str,
        email: Option<&str>,
    ) -> AppResult<Client> {
        if name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        let client = self.db.create_client(id, name.trim(), email).await?;
        info!(client.id = %client.id, "Client created");
        Ok(client)
    }

    /// Create a habit template
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or an out-of-range frequency
    pub async fn create_habit(
        &self,
        title: &str,
        notes: Option<&str>,
        default_frequency: WeeklyFrequency,
    ) -> AppResult<Habit> {
        if title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        default_frequency.validate()?;
        Ok(self.db.create_habit(title.trim(), notes, default_frequency).await?)
    }

    /// Create a programme
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `end_date < start_date` and
    /// `ResourceAlreadyExists` when the human-readable id is taken
    pub async fn create_programme(&self, input: &NewProgramme) -> AppResult<Programme> {
        input.validate()?;
        let programme = self.db.create_programme(input).await?;
        info!(
            programme.id = %programme.id,
            programme.human_id = %programme.human_id,
            "Programme created"
        );
        Ok(programme)
    }

    /// Attach a template to a programme
    ///
    /// Without an override the template's default frequencies are copied in;
    /// later template edits do not reach the assignment.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for a missing programme or template and
    /// `InvalidInput` for a retired template
    pub async fn attach_habit(
        &self,
        programme_id: Uuid,
        habit_id: Uuid,
        frequency_override: Option<WeeklyFrequency>,
        notes: Option<&str>,
    ) -> AppResult<ProgrammeHabit> {
        let habit = self
            .db
            .get_habit(habit_id)
            .await?
            .ok_or_else(|| AppError::not_found("Habit").with_resource_id(habit_id.to_string()))?;
        if !habit.current {
            return Err(AppError::invalid_input(format!(
                "Habit '{}' is retired and cannot be attached",
                habit.title
            )));
        }
        if self.db.get_programme(programme_id).await?.is_none() {
            return Err(AppError::not_found("Programme").with_resource_id(programme_id.to_string()));
        }

        let frequency = frequency_override.unwrap_or(habit.default_frequency);
        frequency.validate()?;
        Ok(self
            .db
            .attach_habit(programme_id, habit_id, frequency, notes)
            .await?)
    }

    /// Retire or reactivate an assignment
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown assignment
    pub async fn set_programme_habit_current(
        &self,
        programme_habit_id: Uuid,
        current: bool,
    ) -> AppResult<()> {
        Ok(self
            .db
            .set_programme_habit_current(programme_habit_id, current)
            .await?)
    }

    /// Enrol a client; enrolling twice returns the existing enrolment
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown client or programme and
    /// `ValueOutOfRange` when the programme is full
    pub async fn enrol_client(
        &self,
        client_id: &ClientId,
        programme_id: Uuid,
        notes: Option<&str>,
        adhoc_data: Option<&serde_json::Value>,
    ) -> AppResult<ProgrammeEnrolment> {
        match self
            .db
            .enrol_client(client_id, programme_id, notes, adhoc_data)
            .await?
        {
            EnrolmentOutcome::Enrolled(enrolment) => {
                info!(client.id = %client_id, programme.id = %programme_id, "Client enrolled");
                Ok(enrolment)
            }
            EnrolmentOutcome::AlreadyEnrolled(enrolment) => Ok(enrolment),
            EnrolmentOutcome::Full { max_clients } => Err(AppError::out_of_range(format!(
                "Programme {programme_id} is full ({max_clients} clients)"
            ))
            .with_details(serde_json::json!({ "max_clients": max_clients }))),
        }
    }
}
