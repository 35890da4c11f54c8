//! Concert capacity record and its seat-count invariants.

use chrono::{DateTime, Utc};
use encore_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a concert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcertId(Uuid);

impl ConcertId {
    /// Creates a new random concert identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a concert identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConcertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConcertId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of a concert.
///
/// `SoldOut` is derived: it holds exactly when every seat is reserved and the
/// concert was not manually cancelled. `Cancelled` is terminal and only set
/// by an operator, never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcertStatus {
    /// Bookable; seats remain.
    Active,
    /// Every seat is reserved.
    SoldOut,
    /// Manually cancelled; no longer bookable.
    Cancelled,
}

impl ConcertStatus {
    /// Returns the stable string form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::SoldOut => "soldout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the storage string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "soldout" => Ok(Self::SoldOut),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Internal(format!(
                "unknown concert status '{other}'"
            ))),
        }
    }
}

/// A fixed-capacity bookable concert.
///
/// The seat counters are only mutated through [`Concert::apply_seat_delta`],
/// which keeps `0 <= reserved_seats <= total_seats` and the derived status in
/// agreement at all times. The `version` field is the optimistic-concurrency
/// token: stores reject a conditional write when it no longer matches the
/// value observed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concert {
    id: ConcertId,
    name: NonEmptyString,
    description: String,
    venue: String,
    starts_at: DateTime<Utc>,
    total_seats: u32,
    reserved_seats: u32,
    status: ConcertStatus,
    version: i64,
    created_at: DateTime<Utc>,
}

impl Concert {
    /// Creates a new concert with zero reserved seats.
    ///
    /// Fails validation when the name is empty or `total_seats` is zero.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        venue: impl Into<String>,
        starts_at: DateTime<Utc>,
        total_seats: u32,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if total_seats == 0 {
            return Err(AppError::Validation(
                "total seats must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            id: ConcertId::new(),
            name,
            description: description.into(),
            venue: venue.into(),
            starts_at,
            total_seats,
            reserved_seats: 0,
            status: ConcertStatus::Active,
            version: 0,
            created_at: Utc::now(),
        })
    }

    /// Rehydrates a concert from stored fields.
    ///
    /// Fails when the stored counters violate the seat bound, so a corrupted
    /// row can never circulate as a valid entity.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: ConcertId,
        name: NonEmptyString,
        description: String,
        venue: String,
        starts_at: DateTime<Utc>,
        total_seats: u32,
        reserved_seats: u32,
        status: ConcertStatus,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if total_seats == 0 || reserved_seats > total_seats {
            return Err(AppError::Internal(format!(
                "stored concert '{id}' has inconsistent seat counts \
                 ({reserved_seats}/{total_seats})"
            )));
        }

        Ok(Self {
            id,
            name,
            description,
            venue,
            starts_at,
            total_seats,
            reserved_seats,
            status,
            version,
            created_at,
        })
    }

    /// Returns the concert identifier.
    #[must_use]
    pub fn id(&self) -> ConcertId {
        self.id
    }

    /// Returns the concert name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the concert description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the venue name.
    #[must_use]
    pub fn venue(&self) -> &str {
        self.venue.as_str()
    }

    /// Returns when the concert starts.
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Returns the immutable total seat count.
    #[must_use]
    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    /// Returns the currently reserved seat count.
    #[must_use]
    pub fn reserved_seats(&self) -> u32 {
        self.reserved_seats
    }

    /// Returns the number of seats still available.
    #[must_use]
    pub fn available_seats(&self) -> u32 {
        self.total_seats - self.reserved_seats
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ConcertStatus {
        self.status
    }

    /// Returns the optimistic-concurrency token.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns when the concert record was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Applies a signed seat-count adjustment and recomputes the derived
    /// status, bumping the version token.
    ///
    /// Fails `SoldOut` when a positive delta would exceed the total and
    /// `Validation` when a negative delta would drop below zero (defensive;
    /// unreachable while the ledger invariants hold). No field changes on
    /// failure.
    pub fn apply_seat_delta(&mut self, delta: i32) -> AppResult<()> {
        let adjusted = i64::from(self.reserved_seats) + i64::from(delta);

        if adjusted > i64::from(self.total_seats) {
            return Err(AppError::SoldOut(format!(
                "concert '{}' has no seats left ({}/{})",
                self.id, self.reserved_seats, self.total_seats
            )));
        }

        if adjusted < 0 {
            return Err(AppError::Validation(format!(
                "reserved seats for concert '{}' cannot drop below zero",
                self.id
            )));
        }

        // adjusted is within [0, total_seats] which fits u32.
        self.reserved_seats = adjusted as u32;
        self.version += 1;

        if self.status != ConcertStatus::Cancelled {
            self.status = if self.reserved_seats == self.total_seats {
                ConcertStatus::SoldOut
            } else {
                ConcertStatus::Active
            };
        }

        Ok(())
    }

    /// Marks the concert as manually cancelled.
    pub fn mark_cancelled(&mut self) {
        self.status = ConcertStatus::Cancelled;
        self.version += 1;
    }
}
