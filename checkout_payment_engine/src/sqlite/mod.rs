//! SQLite backend for the checkout payment engine. Implements the trait contracts in [`crate::traits`] over a
//! `sqlx` connection pool.
pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
