/// A type-erased error flowing through `error_caught`/`fire_error_caught`.
///
/// Individual middleware crates define their own `thiserror` enums for the
/// failures they can raise; this alias is what carries those across a
/// handler boundary once a caller only cares that *something* failed.
pub type PipelineError = Box<dyn std::error::Error + Send + Sync>;
