// ABOUTME: Completion-rate tiers and their calendar colors
// ABOUTME: Tiers are ordered so a higher rate never maps to a worse tier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Display band for a day's completion rate, worst first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTier {
    /// Nothing completed, or nothing scheduled
    None,
    /// Below 40%
    Low,
    /// 40% up to 60%
    Fair,
    /// 60% up to 80%
    Good,
    /// 80% up to, but not including, 100%
    Strong,
    /// Every scheduled habit done
    Complete,
}

impl CompletionTier {
    /// Lower bounds of the partial tiers, best first
    const BANDS: [(f64, Self); 3] = [(0.8, Self::Strong), (0.6, Self::Good), (0.4, Self::Fair)];

    /// Tier for a rate in `[0, 1]`; out-of-range and NaN rates are clamped
    #[must_use]
    pub fn for_rate(rate: f64) -> Self {
        if rate.is_nan() || rate <= 0.0 {
            return Self::None;
        }
        if rate >= 1.0 {
            return Self::Complete;
        }
        Self::BANDS
            .iter()
            .find(|(floor, _)| rate >= *floor)
            .map_or(Self::Low, |(_, tier)| *tier)
    }

    /// Hex background color used by the calendar
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::None => "#e5e7eb",
            Self::Low => "#fecaca",
            Self::Fair => "#fde68a",
            Self::Good => "#d9f99d",
            Self::Strong => "#86efac",
            Self::Complete => "#22c55e",
        }
    }
}
