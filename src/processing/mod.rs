pub mod csv_writer;
pub mod interpolation;
pub mod metrics;
pub mod summary;
