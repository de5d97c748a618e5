// ABOUTME: Store abstraction for the catalog and completion ledger used by the service layer
// ABOUTME: Database implements it; tests substitute slow or failing stores through the same trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AssignedHabit, Database};
use crate::errors::DatabaseError;
use async_trait::async_trait;
use chrono::NaiveDate;
use habit_core::dates::DateRange;
use habit_core::models::{
    ClientHabit, ClientId, CompletionKey, CompletionRecord, CompletionStep, ProgrammeView,
    UpsertCompletion,
};
use uuid::Uuid;

/// Reads and writes the service needs from persistent storage
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Enrolled programmes overlapping `[begin, finish]`, or active on `begin` without `finish`
    async fn programmes_for_client(
        &self,
        client_id: &ClientId,
        begin: NaiveDate,
        finish: Option<NaiveDate>,
    ) -> Result<Vec<ProgrammeView>, DatabaseError>;

    /// Ledger rows for the client in the range, ascending by day
    async fn completions_in_range(
        &self,
        client_id: &ClientId,
        range: &DateRange,
    ) -> Result<Vec<CompletionRecord>, DatabaseError>;

    /// Programme habit reachable through one of the client's enrolments
    async fn assigned_habit(
        &self,
        client_id: &ClientId,
        programme_habit_id: Uuid,
    ) -> Result<Option<AssignedHabit>, DatabaseError>;

    /// Atomic create-or-overwrite of one ledger row
    async fn upsert_completion(
        &self,
        request: &UpsertCompletion,
    ) -> Result<ClientHabit, DatabaseError>;

    /// Atomic increment, decrement or toggle of one ledger row
    async fn apply_completion_step(
        &self,
        key: &CompletionKey,
        step: CompletionStep,
        required: u32,
    ) -> Result<ClientHabit, DatabaseError>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
impl HabitStore for Database {
    async fn programmes_for_client(
        &self,
        client_id: &ClientId,
        begin: NaiveDate,
        finish: Option<NaiveDate>,
    ) -> Result<Vec<ProgrammeView>, DatabaseError> {
        Self::programmes_for_client(self, client_id, begin, finish).await
    }

    async fn completions_in_range(
        &self,
        client_id: &ClientId,
        range: &DateRange,
    ) -> Result<Vec<CompletionRecord>, DatabaseError> {
        Self::completions_in_range(self, client_id, range).await
    }

    async fn assigned_habit(
        &self,
        client_id: &ClientId,
        programme_habit_id: Uuid,
    ) -> Result<Option<AssignedHabit>, DatabaseError> {
        Self::assigned_habit(self, client_id, programme_habit_id).await
    }

    async fn upsert_completion(
        &self,
        request: &UpsertCompletion,
    ) -> Result<ClientHabit, DatabaseError> {
        Self::upsert_completion(self, request).await
    }

    async fn apply_completion_step(
        &self,
        key: &CompletionKey,
        step: CompletionStep,
        required: u32,
    ) -> Result<ClientHabit, DatabaseError> {
        Self::apply_completion_step(self, key, step, required).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Self::ping(self).await
    }
}
