use super::*;
use crate::commands::ingest::{ensure_schema, upsert_records};
use crate::model::DiseaseEntry;
use crate::parse::{DocumentParser, RawDocument};

fn audited(doc_id: &str, text: &str) -> AuditedRecord {
    let parser = DocumentParser::new().expect("parser");
    AuditedRecord {
        doc_id: doc_id.to_string(),
        name: doc_id.to_string(),
        record: parser.parse(&RawDocument::new(doc_id, text)),
    }
}

const WELL_FORMED: &str = "登革熱（Dengue Fever）\n一、臨床條件\n發燒\n二、檢驗條件\n病毒分離\n三、流行病學條件\n旅遊史\n五、疾病分類\n（一）可能病例：符合臨床條件\n（二）確定病例：符合檢驗條件";

#[test]
fn well_formed_record_is_not_flagged() {
    let record = audited("登革熱", WELL_FORMED);
    assert!(record.record.populated_count() >= 3);
    assert!(flag_record(&record, 3).is_none());
}

#[test]
fn record_without_sections_is_flagged_with_all_missing_keys() {
    let record = audited("雜訊", "頁首\n內容無標題");
    let flagged = flag_record(&record, 3).expect("flagged");

    assert_eq!(flagged.populated_count, 0);
    assert_eq!(flagged.missing_keys.len(), StructuredRecord::KEY_COUNT);
    assert_eq!(flagged.reasons.len(), 2);
    assert_eq!(flagged.reasons[0], "no structured sections");
}

#[test]
fn sparse_record_is_flagged_only_for_threshold() {
    let record = audited("稀疏", "一、臨床條件\n發燒");
    let flagged = flag_record(&record, 3).expect("flagged");

    assert_eq!(flagged.populated_count, 1);
    assert_eq!(
        flagged.reasons,
        vec!["populated keys 1 below minimum 3".to_string()]
    );
    assert!(!flagged.missing_keys.iter().any(|key| key == "臨床條件"));
    assert!(flagged.missing_keys.iter().any(|key| key == "english_name"));

    assert!(flag_record(&record, 1).is_none());
}

#[test]
fn coverage_report_summarizes_keys_and_checks() {
    let records = vec![
        audited("登革熱", WELL_FORMED),
        audited("雜訊", "內容無標題"),
    ];
    let report = build_coverage_report(&records, 3);

    assert_eq!(report.summary.record_count, 2);
    assert_eq!(report.summary.structured_count, 1);
    assert_eq!(report.summary.flagged_count, 1);
    assert_eq!(report.flagged_records[0].doc_id, "雜訊");

    assert_eq!(report.key_coverage.len(), StructuredRecord::KEY_COUNT);
    assert_eq!(report.key_coverage[0].key, "臨床條件");
    assert_eq!(report.key_coverage[0].populated_records, 1);
    assert!((report.key_coverage[0].ratio - 0.5).abs() < f64::EPSILON);

    assert_eq!(report.check_summary.total_checks, 3);
    assert_eq!(report.check_summary.passed, 1);
    assert_eq!(report.check_summary.failed, 2);
    assert_eq!(report.checks[0].result, "pass");
}

#[test]
fn empty_database_fails_presence_check() {
    let report = build_coverage_report(&[], 3);

    assert_eq!(report.summary.flagged_count, 0);
    assert_eq!(report.summary.mean_populated, 0.0);
    assert_eq!(report.checks[0].check_id, "C-001");
    assert_eq!(report.checks[0].result, "failed");
}

#[test]
fn load_audited_records_reads_stored_columns() {
    let mut connection = Connection::open_in_memory().expect("in-memory db");
    ensure_schema(&connection).expect("schema");

    let record = audited("登革熱", WELL_FORMED);
    let entry = DiseaseEntry {
        doc_id: record.doc_id.clone(),
        name: record.name.clone(),
        url: String::new(),
        source_category: String::new(),
        source_path: "texts/登革熱.txt".to_string(),
        content: WELL_FORMED.to_string(),
        record: record.record.clone(),
    };
    upsert_records(&mut connection, &[entry], "2026-01-01T00:00:00Z").expect("records");

    let loaded = load_audited_records(&connection).expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].doc_id, "登革熱");
    assert_eq!(loaded[0].record, record.record);
}
