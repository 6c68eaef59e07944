use super::*;

const CSV_METADATA_COLUMNS: [&str; 4] = ["name", "url", "source_category", "source_path"];

/// Writes `<stem>.json` and a BOM-prefixed `<stem>.csv`.
pub(super) fn write_exports<R>(
    export_dir: &Path,
    stem: &str,
    entries: &[DocumentEntry<R>],
) -> Result<(PathBuf, PathBuf)>
where
    R: RecordFields + Serialize + Default,
{
    ensure_directory(export_dir)?;

    let json_path = export_dir.join(format!("{stem}.json"));
    write_json_pretty(&json_path, &entries)?;

    let csv_path = export_dir.join(format!("{stem}.csv"));
    write_text_with_bom(&csv_path, &entries_to_csv(entries))?;

    info!(
        json = %json_path.display(),
        csv = %csv_path.display(),
        records = entries.len(),
        "wrote exports"
    );

    Ok((json_path, csv_path))
}

pub(super) fn csv_header<R: RecordFields + Default>() -> Vec<String> {
    CSV_METADATA_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain(
            R::default()
                .keyed_values()
                .into_iter()
                .map(|(key, _)| key.to_string()),
        )
        .collect()
}

pub(super) fn entries_to_csv<R: RecordFields + Default>(entries: &[DocumentEntry<R>]) -> String {
    let mut rows = vec![csv_header::<R>()];

    for entry in entries {
        let mut row = vec![
            entry.name.clone(),
            entry.url.clone(),
            entry.source_category.clone(),
            entry.source_path.clone(),
        ];
        row.extend(
            entry
                .record
                .keyed_values()
                .into_iter()
                .map(|(_, value)| value.to_string()),
        );
        rows.push(row);
    }

    let mut csv = table_to_csv(&rows);
    csv.push('\n');
    csv
}

fn table_to_csv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_csv_cell(cell))
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

pub(super) fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
