// ABOUTME: Shared limits and defaults for habit scheduling and completion tracking
// ABOUTME: Values referenced by configuration defaults, validation and the calendar composer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Number of days in the past (relative to today) a completion may still be edited
pub const DEFAULT_EDIT_WINDOW_DAYS: u32 = 3;

/// Largest aggregation range accepted by default, in days
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 370;

/// Upper bound for any single weekday target frequency
pub const MAX_DAILY_FREQUENCY: u32 = 100;

/// Timezone used when neither the request nor the configuration names one
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Wire and storage format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days in a week, and the length of every weekly frequency array
pub const DAYS_PER_WEEK: usize = 7;

/// Earliest year a `yyyy-MM-dd` date can express
pub const MIN_SUPPORTED_YEAR: i32 = 1;

/// Latest year a `yyyy-MM-dd` date can express
pub const MAX_SUPPORTED_YEAR: i32 = 9999;
