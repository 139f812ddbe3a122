use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::customer::{normalize_notes, CustomerId};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub i64);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Party size. Always at least one guest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct GuestCount(i64);

impl GuestCount {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::InvalidArgument {
                field: "num_guests",
                message: format!("invalid number of guests: {value}"),
            });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for GuestCount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GuestCount> for i64 {
    fn from(value: GuestCount) -> Self {
        value.0
    }
}

/// Which customer a reservation belongs to. Moves from `Pending` to `Bound`
/// once and never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerBinding {
    Pending,
    Bound(CustomerId),
}

impl CustomerBinding {
    pub fn assign(&mut self, customer_id: CustomerId) -> Result<(), DomainError> {
        match self {
            Self::Pending => {
                *self = Self::Bound(customer_id);
                Ok(())
            }
            Self::Bound(current) => Err(DomainError::InvalidState(format!(
                "reservation is already assigned to customer {current}"
            ))),
        }
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::Pending => None,
            Self::Bound(id) => Some(*id),
        }
    }
}

/// A reservation that has not been written yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    customer: CustomerBinding,
    num_guests: GuestCount,
    start_at: NaiveDateTime,
    notes: String,
}

impl ReservationDraft {
    pub fn new(
        num_guests: i64,
        start_at: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            customer: CustomerBinding::Pending,
            num_guests: GuestCount::new(num_guests)?,
            start_at,
            notes: normalize_notes(notes),
        })
    }

    pub fn for_customer(
        customer_id: CustomerId,
        num_guests: i64,
        start_at: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        let mut draft = Self::new(num_guests, start_at, notes)?;
        draft.assign_customer(customer_id)?;
        Ok(draft)
    }

    pub fn customer(&self) -> CustomerBinding {
        self.customer
    }

    pub fn assign_customer(&mut self, customer_id: CustomerId) -> Result<(), DomainError> {
        self.customer.assign(customer_id)
    }

    pub fn num_guests(&self) -> GuestCount {
        self.num_guests
    }

    pub fn set_num_guests(&mut self, value: i64) -> Result<(), DomainError> {
        self.num_guests = GuestCount::new(value)?;
        Ok(())
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.start_at
    }

    pub fn set_start_at(&mut self, start_at: NaiveDateTime) {
        self.start_at = start_at;
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = normalize_notes(notes);
    }

    pub fn formatted_start_at(&self) -> String {
        format_start_at(&self.start_at)
    }

    /// Attaches the storage-assigned id. Fails while the customer is still pending.
    pub fn into_reservation(self, id: ReservationId) -> Result<Reservation, DomainError> {
        let customer_id = self.customer.customer_id().ok_or_else(|| {
            DomainError::InvalidState("reservation has no customer assigned".to_string())
        })?;
        Ok(Reservation {
            id,
            customer_id,
            num_guests: self.num_guests,
            start_at: self.start_at,
            notes: self.notes,
        })
    }
}

/// A stored reservation. Its customer is fixed for the life of the value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    customer_id: CustomerId,
    num_guests: GuestCount,
    start_at: NaiveDateTime,
    notes: String,
}

impl Reservation {
    pub fn new(
        id: ReservationId,
        customer_id: CustomerId,
        num_guests: i64,
        start_at: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        ReservationDraft::for_customer(customer_id, num_guests, start_at, notes)?
            .into_reservation(id)
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn num_guests(&self) -> GuestCount {
        self.num_guests
    }

    pub fn set_num_guests(&mut self, value: i64) -> Result<(), DomainError> {
        self.num_guests = GuestCount::new(value)?;
        Ok(())
    }

    pub fn start_at(&self) -> NaiveDateTime {
        self.start_at
    }

    pub fn set_start_at(&mut self, start_at: NaiveDateTime) {
        self.start_at = start_at;
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = normalize_notes(notes);
    }

    pub fn formatted_start_at(&self) -> String {
        format_start_at(&self.start_at)
    }
}

/// Renders `2021-03-03 17:30` as `March 3rd 2021, 5:30 pm`.
pub fn format_start_at(start_at: &NaiveDateTime) -> String {
    let day = start_at.day();
    format!(
        "{} {}{} {}",
        start_at.format("%B"),
        day,
        ordinal_suffix(day),
        start_at.format("%Y, %-I:%M %P")
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{
        format_start_at, CustomerBinding, GuestCount, Reservation, ReservationDraft, ReservationId,
    };
    use crate::domain::customer::CustomerId;
    use crate::errors::DomainError;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn formats_start_time_with_ordinal_day_and_twelve_hour_clock() {
        assert_eq!(format_start_at(&at(2021, 3, 3, 17, 30)), "March 3rd 2021, 5:30 pm");
        assert_eq!(format_start_at(&at(2021, 1, 1, 0, 5)), "January 1st 2021, 12:05 am");
        assert_eq!(format_start_at(&at(2022, 11, 22, 12, 0)), "November 22nd 2022, 12:00 pm");
        assert_eq!(format_start_at(&at(2023, 6, 11, 9, 45)), "June 11th 2023, 9:45 am");
        assert_eq!(format_start_at(&at(2023, 7, 13, 19, 0)), "July 13th 2023, 7:00 pm");
        assert_eq!(format_start_at(&at(2023, 8, 31, 21, 15)), "August 31st 2023, 9:15 pm");
    }

    #[test]
    fn guest_count_below_one_is_invalid_argument() {
        for value in [0, -1, i64::MIN] {
            let error = GuestCount::new(value).expect_err("guest count must be rejected");
            assert!(matches!(error, DomainError::InvalidArgument { field: "num_guests", .. }));
        }
        assert_eq!(GuestCount::new(1).map(GuestCount::get), Ok(1));
    }

    #[test]
    fn rejected_guest_count_leaves_previous_value_untouched() {
        let mut draft =
            ReservationDraft::new(4, at(2021, 3, 3, 17, 30), None).expect("valid draft");

        let result = draft.set_num_guests(0);

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
        assert_eq!(draft.num_guests().get(), 4);
    }

    #[test]
    fn construction_validates_guest_count() {
        let result = ReservationDraft::for_customer(CustomerId(1), 0, at(2021, 3, 3, 17, 30), None);
        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }

    #[test]
    fn customer_can_only_be_assigned_once() {
        let mut draft =
            ReservationDraft::new(2, at(2021, 3, 3, 17, 30), None).expect("valid draft");
        assert_eq!(draft.customer(), CustomerBinding::Pending);

        draft.assign_customer(CustomerId(7)).expect("first assignment succeeds");
        assert_eq!(draft.customer(), CustomerBinding::Bound(CustomerId(7)));

        let same = draft.assign_customer(CustomerId(7));
        let other = draft.assign_customer(CustomerId(8));

        assert!(matches!(same, Err(DomainError::InvalidState(_))));
        assert!(matches!(other, Err(DomainError::InvalidState(_))));
        assert_eq!(draft.customer().customer_id(), Some(CustomerId(7)));
    }

    #[test]
    fn unbound_draft_cannot_become_a_reservation() {
        let draft = ReservationDraft::new(2, at(2021, 3, 3, 17, 30), None).expect("valid draft");
        let result = draft.into_reservation(ReservationId(1));
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn reservation_setters_validate_and_normalize() {
        let mut reservation = Reservation::new(
            ReservationId(3),
            CustomerId(1),
            2,
            at(2021, 3, 3, 17, 30),
            Some("birthday".to_string()),
        )
        .expect("valid reservation");
        assert_eq!(reservation.notes(), "birthday");

        reservation.set_notes(None);
        assert_eq!(reservation.notes(), "");

        assert!(reservation.set_num_guests(-3).is_err());
        assert_eq!(reservation.num_guests().get(), 2);

        reservation.set_num_guests(6).expect("valid guest count");
        reservation.set_start_at(at(2021, 3, 4, 18, 0));
        assert_eq!(reservation.num_guests().get(), 6);
        assert_eq!(reservation.formatted_start_at(), "March 4th 2021, 6:00 pm");
    }
}
