pub mod record;
pub mod sources;
