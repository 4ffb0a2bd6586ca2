use crate::domain::record::ExportRecord;

use super::ExportError;

pub(super) fn encode(records: &[ExportRecord]) -> Result<Vec<u8>, ExportError> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}
