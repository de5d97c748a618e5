// ABOUTME: Integration tests for the programme catalog query and catalog maintenance
// ABOUTME: Covers interval overlap boundaries, unknown clients, retired habits and enrolment caps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use anyhow::Result;
use common::{
    client_session, create_test_database, date, seed_client, tracking_service, ProgrammeBuilder,
};
use habit_coach_server::services::CatalogService;
use habit_core::errors::ErrorCode;
use habit_core::models::{ClientId, NewProgramme, WeeklyFrequency};

#[tokio::test]
async fn test_single_anchor_day_includes_last_programme_day() -> Result<()> {
    let db = create_test_database().await?;
    let client = seed_client(&db, "c-overlap").await?;
    ProgrammeBuilder::new("PRG-1", date(2025, 1, 1), Some(date(2025, 1, 7)))
        .habit("Meditate", [1, 1, 1, 1, 1, 1, 1])
        .enrol(&client)
        .create(&db)
        .await?;

    let service = tracking_service(&db);
    let session = client_session(&client);

    let on_last_day = service
        .programme_habits_for_client(&session, &client, date(2025, 1, 7), None)
        .await?;
    assert_eq!(on_last_day.len(), 1);
    assert_eq!(on_last_day[0].habits.len(), 1);
    assert_eq!(on_last_day[0].habits[0].title, "Meditate");

    let day_after = service
        .programme_habits_for_client(&session, &client, date(2025, 1, 8), None)
        .await?;
    assert!(day_after.is_empty());

    let day_before = service
        .programme_habits_for_client(&session, &client, date(2024, 12, 31), None)
        .await?;
    assert!(day_before.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_window_overlap_rule() -> Result<()> {
    let db = create_test_database().await?;
    let client = seed_client(&db, "c-window").await?;
    ProgrammeBuilder::new("PRG-JAN", date(2025, 1, 1), Some(date(2025, 1, 31)))
        .habit("Walk", [1, 0, 1, 0, 1, 0, 0])
        .enrol(&client)
        .create(&db)
        .await?;
    ProgrammeBuilder::new("PRG-ONGOING", date(2025, 3, 1), None)
        .habit("Stretch", [1, 1, 1, 1, 1, 1, 1])
        .enrol(&client)
        .create(&db)
        .await?;

    let service = tracking_service(&db);
    let session = client_session(&client);

    // Window straddling the January programme's end
    let straddle = service
        .programme_habits_for_client(&session, &client, date(2025, 1, 31), Some(date(2025, 2, 5)))
        .await?;
    assert_eq!(straddle.len(), 1);
    assert_eq!(straddle[0].human_id, "PRG-JAN");

    // Gap between the programmes
    let gap = service
        .programme_habits_for_client(&session, &client, date(2025, 2, 1), Some(date(2025, 2, 28)))
        .await?;
    assert!(gap.is_empty());

    // Ongoing programme is active from its start onward
    let later = service
        .programme_habits_for_client(&session, &client, date(2030, 6, 1), None)
        .await?;
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].human_id, "PRG-ONGOING");
    assert!(later[0].end_date.is_none());

    // Both, ordered by start date
    let both = service
        .programme_habits_for_client(&session, &client, date(2025, 1, 15), Some(date(2025, 3, 15)))
        .await?;
    let ids: Vec<&str> = both.iter().map(|p| p.human_id.as_str()).collect();
    assert_eq!(ids, ["PRG-JAN", "PRG-ONGOING"]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_client_is_not_found_not_empty() -> Result<()> {
    let db = create_test_database().await?;
    let known = seed_client(&db, "c-known").await?;
    let ghost = ClientId::parse("c-ghost")?;
    let service = tracking_service(&db);

    let empty = service
        .programme_habits_for_client(&client_session(&known), &known, date(2025, 1, 1), None)
        .await?;
    assert!(empty.is_empty());

    let err = service
        .programme_habits_for_client(&common::trainer_session(), &ghost, date(2025, 1, 1), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_other_clients_programmes_are_not_visible() -> Result<()> {
    let db = create_test_database().await?;
    let alice = seed_client(&db, "alice").await?;
    let bob = seed_client(&db, "bob").await?;
    ProgrammeBuilder::new("PRG-A", date(2025, 1, 1), None)
        .habit("Read", [1, 1, 1, 1, 1, 1, 1])
        .enrol(&alice)
        .create(&db)
        .await?;

    let service = tracking_service(&db);
    let for_bob = service
        .programme_habits_for_client(&client_session(&bob), &bob, date(2025, 1, 2), None)
        .await?;
    assert!(for_bob.is_empty());

    let err = service
        .programme_habits_for_client(&client_session(&bob), &alice, date(2025, 1, 2), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn test_retired_assignments_leave_the_catalog() -> Result<()> {
    let db = create_test_database().await?;
    let client = seed_client(&db, "c-retire").await?;
    let fixture = ProgrammeBuilder::new("PRG-R", date(2025, 1, 1), None)
        .habit("Alpha", [1, 1, 1, 1, 1, 1, 1])
        .habit("Beta", [2, 2, 2, 2, 2, 2, 2])
        .enrol(&client)
        .create(&db)
        .await?;

    let catalog = CatalogService::new(db.clone());
    catalog
        .set_programme_habit_current(fixture.habit_id(0), false)
        .await?;

    let programmes = tracking_service(&db)
        .programme_habits_for_client(&client_session(&client), &client, date(2025, 1, 3), None)
        .await?;
    assert_eq!(programmes.len(), 1);
    let titles: Vec<&str> = programmes[0].habits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, ["Beta"]);
    assert_eq!(programmes[0].habits[0].frequency, WeeklyFrequency::daily(2));
    Ok(())
}

#[tokio::test]
async fn test_attach_copies_template_defaults_or_override() -> Result<()> {
    let db = create_test_database().await?;
    let catalog = CatalogService::new(db.clone());
    let template = catalog
        .create_habit("Push-ups", None, WeeklyFrequency::new([3, 0, 3, 0, 3, 0, 0]))
        .await?;
    let programme = catalog
        .create_programme(&NewProgramme {
            human_id: "PRG-COPY".to_owned(),
            name: "Copy".to_owned(),
            start_date: date(2025, 1, 1),
            end_date: None,
            max_clients: None,
            cost_cents: None,
            notes: None,
            adhoc_data: None,
        })
        .await?;

    let copied = catalog
        .attach_habit(programme.id, template.id, None, None)
        .await?;
    assert_eq!(copied.frequency, template.default_frequency);

    let override_frequency = WeeklyFrequency::daily(1);
    let overridden = catalog
        .attach_habit(programme.id, template.id, Some(override_frequency), Some("lighter"))
        .await?;
    assert_eq!(overridden.frequency, override_frequency);

    let missing = catalog
        .attach_habit(programme.id, uuid::Uuid::new_v4(), None, None)
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_programme_validation() -> Result<()> {
    let db = create_test_database().await?;
    let catalog = CatalogService::new(db);
    let mut input = NewProgramme {
        human_id: "PRG-BAD".to_owned(),
        name: "Backwards".to_owned(),
        start_date: date(2025, 2, 1),
        end_date: Some(date(2025, 1, 1)),
        max_clients: None,
        cost_cents: None,
        notes: None,
        adhoc_data: None,
    };
    assert_eq!(
        catalog.create_programme(&input).await.unwrap_err().code,
        ErrorCode::InvalidInput
    );

    input.end_date = None;
    catalog.create_programme(&input).await?;
    assert_eq!(
        catalog.create_programme(&input).await.unwrap_err().code,
        ErrorCode::ResourceAlreadyExists
    );
    Ok(())
}

#[tokio::test]
async fn test_enrolment_is_idempotent_and_capped() -> Result<()> {
    let db = create_test_database().await?;
    let first = seed_client(&db, "first").await?;
    let second = seed_client(&db, "second").await?;
    let fixture = ProgrammeBuilder::new("PRG-CAP", date(2025, 1, 1), None)
        .max_clients(1)
        .enrol(&first)
        .create(&db)
        .await?;

    let catalog = CatalogService::new(db.clone());
    let again = catalog
        .enrol_client(&first, fixture.programme.id, None, None)
        .await?;
    assert_eq!(again.client_id, first);

    let full = catalog
        .enrol_client(&second, fixture.programme.id, None, None)
        .await
        .unwrap_err();
    assert_eq!(full.code, ErrorCode::ValueOutOfRange);
    assert_eq!(full.context.details["max_clients"], 1);
    Ok(())
}
