//! Database query functions organized by domain.

pub mod books;
pub mod sessions;
pub mod users;
