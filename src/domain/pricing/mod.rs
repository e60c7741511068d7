pub mod artifact;
pub mod calendar;
pub mod record;
