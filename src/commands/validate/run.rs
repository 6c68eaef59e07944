use super::*;

pub fn run(args: ValidateArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let coverage_report_path = args
        .coverage_report_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("coverage_report.json"));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DB_FILENAME));

    let connection = Connection::open_with_flags(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;

    let records = load_audited_records(&connection)?;
    let mut report = build_coverage_report(&records, args.min_populated);
    report.db_path = db_path.display().to_string();

    for flagged in &report.flagged_records {
        warn!(
            doc_id = %flagged.doc_id,
            populated = flagged.populated_count,
            reasons = %flagged.reasons.join("; "),
            "record flagged by coverage audit"
        );
    }

    write_json_pretty(&coverage_report_path, &report)?;

    info!(
        path = %coverage_report_path.display(),
        records = report.summary.record_count,
        flagged = report.summary.flagged_count,
        checks_passed = report.check_summary.passed,
        checks_failed = report.check_summary.failed,
        "wrote coverage report"
    );

    if args.fail_on_flagged && report.summary.flagged_count > 0 {
        bail!(
            "{} of {} records flagged by coverage audit; see {}",
            report.summary.flagged_count,
            report.summary.record_count,
            coverage_report_path.display()
        );
    }

    Ok(())
}
