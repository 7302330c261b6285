// Validation helpers for operator-facing argument errors

/// Validate that an entry id argument is a positive integer
pub fn validate_entry_id(id_str: &str) -> Result<i64, String> {
    id_str
        .parse::<i64>()
        .map_err(|_| format!("Invalid entry ID: '{}'. Entry ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid entry ID: {}. Entry ID must be positive.", id))
            }
        })
}
