//! Rentals domain module.
//!
//! Equipment rented *from* suppliers: contract terms, status lifecycle, renewals
//! and overdue detection.

pub mod rental;

pub use rental::{
    NewRental, Rental, RentalChanges, RentalPeriod, RentalStatus, RentalWithSupplier, RenewRental,
    rental_days,
};
