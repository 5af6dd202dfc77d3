//! Leave entitlement engine: accrual, availability, request validation.

pub mod accrual;
pub mod attachment;
pub mod availability;
pub mod validation;
