use crate::domain::record::ExportRecord;

use super::{ExportError, LIST_DELIMITER};

/// Header comes from the first record; list values collapse into one cell.
pub(super) fn encode(records: &[ExportRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if let Some(first) = records.first() {
        writer.write_record(first.field_names())?;
    }

    for record in records {
        writer.write_record(record.values().map(|value| value.to_cell(LIST_DELIMITER)))?;
    }

    writer
        .into_inner()
        .map_err(|error| ExportError::Csv(csv::Error::from(error.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_lists_and_quotes_delimiters() {
        let records = vec![ExportRecord::new()
            .text("folder_name", "Work")
            .list(
                "included_chats",
                vec!["Backend".to_owned(), "Ops".to_owned()],
            )
            .flag("rule_groups", true)];

        let bytes = encode(&records).expect("csv should encode");
        let text = String::from_utf8(bytes).expect("utf-8");

        assert_eq!(
            text,
            "folder_name,included_chats,rule_groups\nWork,\"Backend, Ops\",True\n"
        );
    }

    #[test]
    fn keeps_non_ascii_names_verbatim() {
        let records = vec![ExportRecord::new().text("chat_name", "Привет 👋")];

        let text = String::from_utf8(encode(&records).expect("csv should encode")).expect("utf-8");

        assert!(text.contains("Привет 👋"));
    }
}
