pub mod config;
pub mod domain;
pub mod errors;

pub use domain::customer::{BestCustomer, Customer, CustomerId, NewCustomer};
pub use domain::reservation::{
    CustomerBinding, GuestCount, Reservation, ReservationDraft, ReservationId,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
