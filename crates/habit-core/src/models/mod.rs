// ABOUTME: Domain models for programmes, habits, enrolments and the completion ledger
// ABOUTME: Re-exports the model types used by the store, aggregator and HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Client identity and profile
pub mod client;
/// Completion ledger rows and adjustments
pub mod completion;
/// Weekday-indexed target frequencies
pub mod frequency;
/// Programmes, habit templates, programme habits and enrolments
pub mod programme;

pub use client::{Client, ClientId};
pub use completion::{
    is_done, ClientHabit, CompletionKey, CompletionRecord, CompletionStep, UpsertCompletion,
};
pub use frequency::WeeklyFrequency;
pub use programme::{
    is_active_on, Habit, NewProgramme, Programme, ProgrammeEnrolment,
    ProgrammeHabit, ProgrammeHabitView, ProgrammeView,
};
