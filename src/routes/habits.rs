// ABOUTME: Client habit routes for the programme catalog, completion ledger and calendar views
// ABOUTME: Parses path, query and body input into dates and delegates to the tracking service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Habit routes
//!
//! All dates on the wire are `yyyy-MM-dd`. Query boundaries may also be RFC
//! 3339 instants, which are normalized to a calendar date in the request's
//! timezone (`tz`, defaulting to the configured zone).

use super::AppContext;
use crate::aggregation::DaySummary;
use crate::auth::Session;
use crate::calendar::{MonthView, WeekView};
use crate::errors::{AppError, AppResult};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use chrono_tz::Tz;
use habit_core::dates::{parse_date_input, DateRange};
use habit_core::models::{ClientId, CompletionRecord, CompletionStep, ProgrammeView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Range and timezone query parameters
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// First day, inclusive
    pub begin: Option<String>,
    /// Last day, inclusive
    pub finish: Option<String>,
    /// IANA timezone used to normalize instants and resolve today
    pub tz: Option<String>,
}

/// Timezone-only query parameters
#[derive(Debug, Default, Deserialize)]
pub struct TimezoneQuery {
    /// IANA timezone
    pub tz: Option<String>,
}

/// Body of `PUT /api/clients/:client_id/completions`
#[derive(Debug, Deserialize)]
pub struct UpsertCompletionBody {
    /// Programme habit the completion counts against
    pub programme_habit_id: Uuid,
    /// Calendar day
    pub habit_date: String,
    /// Repetitions performed
    pub times_done: i64,
    /// Explicit flag; derived from `times_done` when omitted
    pub completed: Option<bool>,
    /// Timezone for instant-valued `habit_date`
    pub tz: Option<String>,
}

/// Body of `POST /api/clients/:client_id/completions/step`
#[derive(Debug, Deserialize)]
pub struct CompletionStepBody {
    /// Programme habit to adjust
    pub programme_habit_id: Uuid,
    /// Calendar day
    pub habit_date: String,
    /// Adjustment to apply
    pub step: CompletionStep,
    /// Timezone deciding today for the edit window
    pub tz: Option<String>,
}

/// Programmes overlapping the requested window
#[derive(Debug, Serialize)]
pub struct ProgrammesResponse {
    /// Client the catalog belongs to
    pub client_id: ClientId,
    /// Window start
    pub begin: NaiveDate,
    /// Window end, absent for single-day queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<NaiveDate>,
    /// Enrolled programmes with their current habits
    pub programmes: Vec<ProgrammeView>,
}

/// Ledger rows in the requested range
#[derive(Debug, Serialize)]
pub struct CompletionsResponse {
    /// Client the rows belong to
    pub client_id: ClientId,
    /// Requested range
    pub range: DateRange,
    /// Rows ascending by day
    pub completions: Vec<CompletionRecord>,
}

/// Day summaries for the requested range
#[derive(Debug, Serialize)]
pub struct DaysResponse {
    /// Client the summaries belong to
    pub client_id: ClientId,
    /// Requested range
    pub range: DateRange,
    /// Timezone used for `starts_at`
    pub timezone: String,
    /// One summary per day, ascending
    pub days: Vec<DaySummary>,
}

/// Week slices of the requested range
#[derive(Debug, Serialize)]
pub struct WeeksResponse {
    /// Client the weeks belong to
    pub client_id: ClientId,
    /// Requested range
    pub range: DateRange,
    /// Timezone used for `starts_at`
    pub timezone: String,
    /// Monday-first weeks
    pub weeks: Vec<WeekView>,
}

/// Month grid
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    /// Client the grid belongs to
    pub client_id: ClientId,
    /// Timezone deciding today and editability
    pub timezone: String,
    /// The grid
    #[serde(flatten)]
    pub month: MonthView,
}

/// Habit routes implementation
pub struct HabitRoutes;

impl HabitRoutes {
    /// Create all habit routes
    pub fn routes(context: AppContext) -> Router {
        Router::new()
            .route(
                "/api/clients/:client_id/programmes",
                get(Self::handle_programmes),
            )
            .route(
                "/api/clients/:client_id/completions",
                get(Self::handle_completions).put(Self::handle_upsert_completion),
            )
            .route(
                "/api/clients/:client_id/completions/step",
                post(Self::handle_completion_step),
            )
            .route("/api/clients/:client_id/days", get(Self::handle_days))
            .route("/api/clients/:client_id/weeks", get(Self::handle_weeks))
            .route(
                "/api/clients/:client_id/calendar/:year/:month",
                get(Self::handle_calendar),
            )
            .with_state(Arc::new(context))
    }

    /// GET /api/clients/:client_id/programmes - catalog for a day or window
    async fn handle_programmes(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Query(query): Query<RangeQuery>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let tz = context.tracking.resolve_timezone(query.tz.as_deref())?;
        let begin = required_date(query.begin.as_deref(), "begin", tz)?;
        let finish = optional_date(query.finish.as_deref(), tz)?;

        let programmes = context
            .tracking
            .programme_habits_for_client(&session, &client_id, begin, finish)
            .await?;

        Ok((
            StatusCode::OK,
            Json(ProgrammesResponse {
                client_id,
                begin,
                finish,
                programmes,
            }),
        ))
    }

    /// GET /api/clients/:client_id/completions - ledger rows in a range
    async fn handle_completions(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Query(query): Query<RangeQuery>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let (range, _) = resolve_range(&context, &query)?;

        let completions = context
            .tracking
            .completions_for_client(&session, &client_id, &range)
            .await?;

        Ok((
            StatusCode::OK,
            Json(CompletionsResponse {
                client_id,
                range,
                completions,
            }),
        ))
    }

    /// GET /api/clients/:client_id/days - one summary per day
    async fn handle_days(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Query(query): Query<RangeQuery>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let (range, tz) = resolve_range(&context, &query)?;

        let days = context
            .tracking
            .day_summaries(&session, &client_id, &range, tz)
            .await?;

        Ok((
            StatusCode::OK,
            Json(DaysResponse {
                client_id,
                range,
                timezone: tz.name().to_owned(),
                days,
            }),
        ))
    }

    /// GET /api/clients/:client_id/weeks - summaries sliced into weeks
    async fn handle_weeks(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Query(query): Query<RangeQuery>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let (range, tz) = resolve_range(&context, &query)?;

        let weeks = context
            .tracking
            .week_views(&session, &client_id, &range, tz)
            .await?;

        Ok((
            StatusCode::OK,
            Json(WeeksResponse {
                client_id,
                range,
                timezone: tz.name().to_owned(),
                weeks,
            }),
        ))
    }

    /// GET /api/clients/:client_id/calendar/:year/:month - month grid
    async fn handle_calendar(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path((client_id, year, month)): Path<(String, i32, u32)>,
        Query(query): Query<TimezoneQuery>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let tz = context.tracking.resolve_timezone(query.tz.as_deref())?;

        let month = context
            .tracking
            .month_view(&session, &client_id, year, month, tz)
            .await?;

        Ok((
            StatusCode::OK,
            Json(CalendarResponse {
                client_id,
                timezone: tz.name().to_owned(),
                month,
            }),
        ))
    }

    /// PUT /api/clients/:client_id/completions - create or overwrite one row
    async fn handle_upsert_completion(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Json(body): Json<UpsertCompletionBody>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let tz = context.tracking.resolve_timezone(body.tz.as_deref())?;
        let habit_date = parse_date_input(&body.habit_date, tz)?;

        let record = context
            .tracking
            .upsert_completion(
                &session,
                &client_id,
                body.programme_habit_id,
                habit_date,
                body.times_done,
                body.completed,
            )
            .await?;

        Ok((StatusCode::OK, Json(record)))
    }

    /// POST /api/clients/:client_id/completions/step - increment, decrement or toggle
    async fn handle_completion_step(
        State(context): State<Arc<AppContext>>,
        session: Session,
        Path(client_id): Path<String>,
        Json(body): Json<CompletionStepBody>,
    ) -> AppResult<impl IntoResponse> {
        let client_id = ClientId::parse(client_id)?;
        let tz = context.tracking.resolve_timezone(body.tz.as_deref())?;
        let habit_date = parse_date_input(&body.habit_date, tz)?;

        let record = context
            .tracking
            .apply_step(
                &session,
                &client_id,
                body.programme_habit_id,
                habit_date,
                body.step,
                tz,
            )
            .await?;

        Ok((StatusCode::OK, Json(record)))
    }
}

fn resolve_range(context: &AppContext, query: &RangeQuery) -> AppResult<(DateRange, Tz)> {
    let tz = context.tracking.resolve_timezone(query.tz.as_deref())?;
    let begin = required_date(query.begin.as_deref(), "begin", tz)?;
    let finish = required_date(query.finish.as_deref(), "finish", tz)?;
    Ok((context.tracking.range(begin, finish)?, tz))
}

fn required_date(value: Option<&str>, field: &'static str, tz: Tz) -> AppResult<NaiveDate> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(text) => parse_date_input(text, tz),
        None => Err(AppError::missing_field(field)),
    }
}

fn optional_date(value: Option<&str>, tz: Tz) -> AppResult<Option<NaiveDate>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|text| parse_date_input(text, tz))
        .transpose()
}
