use ingest_types::BatchStatus;

/// Ingestion-level status from its batches' statuses.
///
/// `completed` only when every batch is; otherwise `triggered` if any batch is
/// running; otherwise `yet_to_start`. A mix of `completed` and `yet_to_start`
/// with nothing running therefore reports `yet_to_start`, and so does an empty list.
pub fn aggregate_status<I>(statuses: I) -> BatchStatus
where
    I: IntoIterator<Item = BatchStatus>,
{
    let mut any = false;
    let mut all_completed = true;
    let mut any_triggered = false;
    for s in statuses {
        any = true;
        all_completed &= s == BatchStatus::Completed;
        any_triggered |= s == BatchStatus::Triggered;
    }
    if any && all_completed {
        BatchStatus::Completed
    } else if any_triggered {
        BatchStatus::Triggered
    } else {
        BatchStatus::YetToStart
    }
}
