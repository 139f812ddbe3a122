use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer fields supplied by a caller before the row exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    notes: String,
}

impl NewCustomer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone,
            notes: normalize_notes(notes),
        }
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = normalize_notes(notes);
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn into_customer(self, id: CustomerId) -> Customer {
        Customer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            notes: self.notes,
        }
    }
}

/// A restaurant customer as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    notes: String,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        NewCustomer::new(first_name, last_name, phone, notes).into_customer(id)
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = normalize_notes(notes);
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// A customer ranked by how many reservations they hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestCustomer {
    pub customer: Customer,
    pub reservation_count: i64,
}

/// Absent and empty notes are both stored as `""`.
pub fn normalize_notes(notes: Option<String>) -> String {
    notes.unwrap_or_default()
}

fn join_name(first: &str, last: &str) -> String {
    format!("{first} {last}")
}

#[cfg(test)]
mod tests {
    use super::{Customer, CustomerId, NewCustomer};

    #[test]
    fn full_name_joins_first_and_last_with_single_space() {
        let customer = Customer::new(CustomerId(1), "Ada", "Lovelace", None, None);
        assert_eq!(customer.full_name(), "Ada Lovelace");
    }

    #[test]
    fn absent_or_empty_notes_read_back_as_empty() {
        let mut customer = NewCustomer::new("Ada", "Lovelace", Some("555".to_string()), None);
        assert_eq!(customer.notes(), "");

        customer.set_notes(Some("window seat".to_string()));
        assert_eq!(customer.notes(), "window seat");

        customer.set_notes(Some(String::new()));
        assert_eq!(customer.notes(), "");

        customer.set_notes(None);
        assert_eq!(customer.notes(), "");
    }

    #[test]
    fn into_customer_keeps_fields_and_attaches_id() {
        let draft =
            NewCustomer::new("Grace", "Hopper", Some("555-0100".to_string()), Some("vip".into()));
        let customer = draft.clone().into_customer(CustomerId(42));

        assert_eq!(customer.id, CustomerId(42));
        assert_eq!(customer.first_name, draft.first_name);
        assert_eq!(customer.last_name, draft.last_name);
        assert_eq!(customer.phone, draft.phone);
        assert_eq!(customer.notes(), "vip");
    }
}
