use ingest_types::IngestError;

/// Partition `ids` into consecutive groups of `batch_size`; only the last may be shorter.
pub fn split_into_batches(ids: &[i64], batch_size: usize) -> Result<Vec<Vec<i64>>, IngestError> {
    if ids.is_empty() {
        return Err(IngestError::InvalidInput("ids must not be empty".to_string()));
    }
    if batch_size == 0 {
        return Err(IngestError::InvalidInput(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(ids.chunks(batch_size).map(<[i64]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_ids_make_two_batches() {
        let groups = split_into_batches(&[1, 2, 3, 4, 5], 3).unwrap();
        assert_eq!(groups, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn batch_count_is_ceiling_and_order_is_kept() {
        let ids: Vec<i64> = (1..=23).collect();
        for size in 1..=8 {
            let groups = split_into_batches(&ids, size).unwrap();
            assert_eq!(groups.len(), ids.len().div_ceil(size));
            assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= size));
            assert!(groups[..groups.len() - 1].iter().all(|g| g.len() == size));
            assert_eq!(groups.concat(), ids);
        }
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            split_into_batches(&[], 3),
            Err(IngestError::InvalidInput(_))
        ));
        assert!(split_into_batches(&[1], 0).is_err());
    }
}
