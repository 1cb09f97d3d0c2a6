//! Activity type reference data.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Catalog definition of a loggable activity type.
///
/// Rates and caps must be non-negative; a negative cap would make a capped
/// row both below zero and above its cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ActivityType {
    /// Activity type ID (also used as document ID)
    pub id: String,
    /// Display name (e.g. "Conference attendance")
    pub name: String,
    /// Grouping used in report summaries
    pub category: String,
    /// Credit earned per unit logged
    #[validate(range(min = 0.0))]
    pub credit_per_unit: f64,
    /// Most credit claimable from this type in one evaluation period
    #[validate(range(min = 0.0))]
    pub max_credit_per_period: f64,
}
