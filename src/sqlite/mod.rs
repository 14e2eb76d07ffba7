// SQLite module - rusqlite-backed driver
//
// - config: opening the database file and applying the session encoding
// - params: conversion from `RowValues` to rusqlite values
// - query: result extraction and building
// - connection: the `DriverConnection` implementation

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use params::row_value_to_sqlite_value;
pub use query::build_result_set;
