/// Identifier for a single generation run.
///
/// Runs live only in memory; a UUID keeps ids unguessable without
/// needing a database sequence.
pub type RunId = uuid::Uuid;
