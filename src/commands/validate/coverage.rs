use super::*;

#[derive(Debug, Clone)]
pub(super) struct AuditedRecord {
    pub(super) doc_id: String,
    pub(super) name: String,
    pub(super) record: StructuredRecord,
}

#[derive(Debug, Serialize)]
pub(super) struct CoverageReport {
    pub(super) manifest_version: u32,
    pub(super) generated_at: String,
    pub(super) db_path: String,
    pub(super) min_populated: usize,
    pub(super) summary: CoverageSummary,
    pub(super) check_summary: QualitySummary,
    pub(super) checks: Vec<QualityCheck>,
    pub(super) key_coverage: Vec<KeyCoverage>,
    pub(super) flagged_records: Vec<FlaggedRecord>,
}

#[derive(Debug, Serialize)]
pub(super) struct CoverageSummary {
    pub(super) record_count: usize,
    pub(super) structured_count: usize,
    pub(super) flagged_count: usize,
    pub(super) mean_populated: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct QualitySummary {
    pub(super) total_checks: usize,
    pub(super) passed: usize,
    pub(super) failed: usize,
}

#[derive(Debug, Serialize, Clone)]
pub(super) struct QualityCheck {
    pub(super) check_id: String,
    pub(super) name: String,
    pub(super) result: String,
}

#[derive(Debug, Serialize)]
pub(super) struct KeyCoverage {
    pub(super) key: String,
    pub(super) populated_records: usize,
    pub(super) ratio: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct FlaggedRecord {
    pub(super) doc_id: String,
    pub(super) name: String,
    pub(super) populated_count: usize,
    pub(super) missing_keys: Vec<String>,
    pub(super) reasons: Vec<String>,
}

pub(super) fn load_audited_records(connection: &Connection) -> Result<Vec<AuditedRecord>> {
    let mut statement = connection.prepare(
        "
        SELECT
          doc_id, name,
          clinical_condition, lab_criteria, epidemiology_condition,
          reporting_definition, classification, specimen_collection,
          suspected_case, probable_case, confirmed_case, english_name
        FROM records
        ORDER BY doc_id ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        out.push(AuditedRecord {
            doc_id: row.get(0)?,
            name: row.get(1)?,
            record: StructuredRecord {
                clinical_condition: row.get(2)?,
                lab_criteria: row.get(3)?,
                epidemiology_condition: row.get(4)?,
                reporting_definition: row.get(5)?,
                classification: row.get(6)?,
                specimen_collection: row.get(7)?,
                suspected_case: row.get(8)?,
                probable_case: row.get(9)?,
                confirmed_case: row.get(10)?,
                english_name: row.get(11)?,
            },
        });
    }

    Ok(out)
}

pub(super) fn build_coverage_report(
    records: &[AuditedRecord],
    min_populated: usize,
) -> CoverageReport {
    let flagged_records = records
        .iter()
        .filter_map(|audited| flag_record(audited, min_populated))
        .collect::<Vec<FlaggedRecord>>();

    let record_count = records.len();
    let structured_count = records
        .iter()
        .filter(|audited| audited.record.has_structured_sections())
        .count();
    let populated_total: usize = records
        .iter()
        .map(|audited| audited.record.populated_count())
        .sum();

    let summary = CoverageSummary {
        record_count,
        structured_count,
        flagged_count: flagged_records.len(),
        mean_populated: ratio(populated_total, record_count),
    };

    let checks = build_quality_checks(&summary, &flagged_records, min_populated);

    CoverageReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        db_path: String::new(),
        min_populated,
        summary,
        check_summary: summarize_checks(&checks),
        checks,
        key_coverage: build_key_coverage(records),
        flagged_records,
    }
}

/// Returns `None` when the record passes every coverage rule.
pub(super) fn flag_record(audited: &AuditedRecord, min_populated: usize) -> Option<FlaggedRecord> {
    let record = &audited.record;
    let populated_count = record.populated_count();

    let mut reasons = Vec::new();
    if !record.has_structured_sections() {
        reasons.push("no structured sections".to_string());
    }
    if populated_count < min_populated {
        reasons.push(format!(
            "populated keys {populated_count} below minimum {min_populated}"
        ));
    }
    if reasons.is_empty() {
        return None;
    }

    let missing_keys = record
        .fields()
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key.to_string())
        .collect();

    Some(FlaggedRecord {
        doc_id: audited.doc_id.clone(),
        name: audited.name.clone(),
        populated_count,
        missing_keys,
        reasons,
    })
}

fn build_key_coverage(records: &[AuditedRecord]) -> Vec<KeyCoverage> {
    let mut counts = [0usize; StructuredRecord::KEY_COUNT];
    for audited in records {
        for (index, (_, value)) in audited.record.fields().iter().enumerate() {
            if !value.is_empty() {
                counts[index] += 1;
            }
        }
    }

    StructuredRecord::default()
        .fields()
        .iter()
        .zip(counts)
        .map(|((key, _), populated_records)| KeyCoverage {
            key: key.to_string(),
            populated_records,
            ratio: ratio(populated_records, records.len()),
        })
        .collect()
}

fn build_quality_checks(
    summary: &CoverageSummary,
    flagged_records: &[FlaggedRecord],
    min_populated: usize,
) -> Vec<QualityCheck> {
    let unstructured = flagged_records
        .iter()
        .filter(|flagged| flagged.reasons.iter().any(|reason| reason == "no structured sections"))
        .count();
    let below_minimum = flagged_records
        .iter()
        .filter(|flagged| flagged.populated_count < min_populated)
        .count();

    vec![
        quality_check("C-001", "records present", summary.record_count > 0),
        quality_check(
            "C-002",
            "every record has structured sections",
            unstructured == 0,
        ),
        quality_check(
            "C-003",
            &format!("every record populates at least {min_populated} keys"),
            below_minimum == 0,
        ),
    ]
}

fn quality_check(check_id: &str, name: &str, passed: bool) -> QualityCheck {
    QualityCheck {
        check_id: check_id.to_string(),
        name: name.to_string(),
        result: if passed { "pass" } else { "failed" }.to_string(),
    }
}

fn summarize_checks(checks: &[QualityCheck]) -> QualitySummary {
    let passed = checks.iter().filter(|check| check.result == "pass").count();
    let failed = checks
        .iter()
        .filter(|check| check.result == "failed")
        .count();

    QualitySummary {
        total_checks: checks.len(),
        passed,
        failed,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
