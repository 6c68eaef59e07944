use super::*;

fn parser() -> DocumentParser {
    DocumentParser::new().expect("built-in patterns compile")
}

fn only_populated(sections: &Sections) -> Vec<(SectionKey, String)> {
    SectionKey::ALL
        .into_iter()
        .filter(|key| !sections.get(*key).is_empty())
        .map(|key| (key, sections.get(key).to_string()))
        .collect()
}

#[test]
fn normalize_collapses_quadrupled_glyphs() {
    assert_eq!(normalize("臨臨臨臨床床床床"), "臨床");
    assert_eq!(normalize("一一一一、、、、臨臨臨臨床床床床條條條條件件件件"), "一、臨床條件");
}

#[test]
fn normalize_leaves_short_runs_untouched() {
    assert_eq!(normalize("臨臨臨床"), "臨臨臨床");
    assert_eq!(normalize("aaaaa"), "aa");
}

#[test]
fn normalize_collapses_nested_runs_to_a_fixed_point() {
    assert_eq!(normalize(&"床".repeat(16)), "床");
}

#[test]
fn normalize_widens_ascii_punctuation() {
    assert_eq!(normalize("a,b:c;d!e?(f)"), "a，b：c；d！e？（f）");
}

#[test]
fn normalize_applies_compatibility_folding() {
    assert_eq!(normalize("ＳＡＲＳ"), "SARS");
    assert_eq!(normalize("\u{F900}"), "\u{8C48}");
    assert_eq!(normalize("（一）"), "（一）");
    assert_eq!(normalize("五．疾病分類"), "五.疾病分類");
}

#[test]
fn normalize_handles_empty_input() {
    assert_eq!(normalize(""), "");
}

#[test]
fn normalize_is_idempotent() {
    let samples = [
        "",
        "臨臨臨臨床床床床條件",
        "aaaaaaaaaaaaaaaaaaa",
        "....................",
        "嚴重急性呼吸道症候群(SARS)",
        "ＡＢＣ，ＤＥＦ：（ｇｈｉ）",
        "一、臨床條件\n\n\n\n發燒、咳嗽",
        "e\u{301}\u{301}\u{301}\u{301}\u{301}",
    ];

    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "sample: {sample:?}");
    }
}

#[test]
fn segment_splits_numbered_headers() {
    let sections = parser().segment("一、臨床條件\nfoo\n二、檢驗條件\nbar");

    assert_eq!(sections.get(SectionKey::ClinicalCondition), "foo");
    assert_eq!(sections.get(SectionKey::LabCriteria), "bar");
    assert_eq!(sections.get(SectionKey::EpidemiologyCondition), "");
    assert_eq!(sections.get(SectionKey::ReportingDefinition), "");
    assert_eq!(sections.get(SectionKey::Classification), "");
    assert_eq!(sections.get(SectionKey::SpecimenCollection), "");
}

#[test]
fn segment_accepts_marker_variants_and_alias() {
    let text = "壹、臨床條件：\nA\n2.檢驗條件\nB\n參 、 流行病學條件\nC\n四．通報定義:\nD\n五、病例分類\nE\n檢體採檢送驗事項\nF";
    let sections = parser().segment(&normalize(text));

    assert_eq!(sections.get(SectionKey::ClinicalCondition), "A");
    assert_eq!(sections.get(SectionKey::LabCriteria), "B");
    assert_eq!(sections.get(SectionKey::EpidemiologyCondition), "C");
    assert_eq!(sections.get(SectionKey::ReportingDefinition), "D");
    assert_eq!(sections.get(SectionKey::Classification), "E");
    assert_eq!(sections.get(SectionKey::SpecimenCollection), "F");
}

#[test]
fn segment_accepts_short_prefix_token_before_header() {
    let sections = parser().segment("五、SARS 疾病分類\n可能病例");
    assert_eq!(sections.get(SectionKey::Classification), "可能病例");
}

#[test]
fn segment_keeps_empty_sections_for_adjacent_headers() {
    let sections = parser().segment("一、臨床條件\n二、檢驗條件\nbar\n六、檢體採檢送驗事項");

    assert_eq!(sections.get(SectionKey::ClinicalCondition), "");
    assert_eq!(sections.get(SectionKey::LabCriteria), "bar");
    assert_eq!(sections.get(SectionKey::SpecimenCollection), "");
    assert_eq!(only_populated(&sections).len(), 1);
}

#[test]
fn segment_ignores_header_words_inside_sentences() {
    let text = "一、臨床條件\n符合臨床條件之病例\n需同時符合檢驗條件及流行病學條件\n二、檢驗條件說明如下\n結束";
    let sections = parser().segment(text);

    assert_eq!(
        sections.get(SectionKey::ClinicalCondition),
        "符合臨床條件之病例\n需同時符合檢驗條件及流行病學條件\n二、檢驗條件說明如下\n結束"
    );
    assert_eq!(sections.get(SectionKey::LabCriteria), "");
    assert_eq!(sections.get(SectionKey::EpidemiologyCondition), "");
}

#[test]
fn segment_rejects_ordinals_outside_vocabulary_markers() {
    let sections = parser().segment("七、臨床條件\nfoo");
    assert!(only_populated(&sections).is_empty());
}

#[test]
fn segment_without_headers_leaves_everything_empty() {
    let sections = parser().segment("這份文件沒有任何標題\n只有內容");
    assert_eq!(sections, Sections::default());
}

#[test]
fn segment_trims_sections_and_preserves_inner_breaks() {
    let sections = parser().segment("前言被忽略\n一、臨床條件\n  發燒  \n\n 咳嗽\n\n");
    assert_eq!(sections.get(SectionKey::ClinicalCondition), "發燒\n\n咳嗽");
}

#[test]
fn segment_is_deterministic() {
    let text = normalize("一、臨床條件\n發燒\n五、疾病分類\n(一)可能病例:符合臨床條件");
    let parser = parser();
    assert_eq!(parser.segment(&text), parser.segment(&text));
}

#[test]
fn classify_attributes_probable_before_suspected() {
    let text = "（一）可能病例：符合臨床條件\n（二）極可能病例：符合臨床條件及流行病學條件\n另需檢驗\n（三）確定病例：檢驗陽性";
    let cases = parser().classify_cases(text);

    assert_eq!(cases.suspected_case, "符合臨床條件");
    assert_eq!(cases.probable_case, "符合臨床條件及流行病學條件\n另需檢驗");
    assert_eq!(cases.confirmed_case, "檢驗陽性");
}

#[test]
fn classify_detects_probable_label_directly() {
    let classifier = CaseClassifier::new().expect("case patterns compile");

    let (category, rest) = classifier.detect_label("極可能病例：內容").expect("label");
    assert_eq!(category, CaseCategory::Probable);
    assert_eq!(rest, "內容");

    let (category, _) = classifier.detect_label("(2)可能病例").expect("label");
    assert_eq!(category, CaseCategory::Suspected);

    assert!(classifier.detect_label("符合可能病例定義者").is_none());
}

#[test]
fn classify_seeds_buffer_only_with_non_empty_remainder() {
    let cases = parser().classify_cases("1.確定病例:\n第一行\n第二行");
    assert_eq!(cases.confirmed_case, "第一行\n第二行");
    assert_eq!(cases.suspected_case, "");
    assert_eq!(cases.probable_case, "");
}

#[test]
fn classify_without_labels_returns_empty_definitions() {
    let cases = parser().classify_cases("本疾病不分類\n僅通報");
    assert_eq!(cases, CaseDefinitions::default());
}

#[test]
fn english_name_from_parenthesized_title() {
    let parser = parser();
    assert_eq!(parser.extract_english_name(&normalize("嚴重急性呼吸道症候群（SARS）")), "SARS");
    assert_eq!(parser.extract_english_name(&normalize("嚴重急性呼吸道症候群(SARS)")), "SARS");
}

#[test]
fn english_name_span_may_cross_lines() {
    let text = normalize("登革熱\n（Dengue\n  Fever，DF）\n一、臨床條件");
    assert_eq!(parser().extract_english_name(&text), "Dengue Fever,DF");
}

#[test]
fn english_name_skips_rejected_spans() {
    let text = normalize("疾病（A）（B型）（2024）\n（Measles）");
    assert_eq!(parser().extract_english_name(&text), "Measles");
}

#[test]
fn english_name_ignores_spans_after_head() {
    let text = "第一行\n第二行\n第三行\n第四行\n第五行\n第六行\n（Late Name）";
    assert_eq!(parser().extract_english_name(text), "");
}

#[test]
fn english_name_falls_back_to_latin_line() {
    let parser = parser();
    assert_eq!(parser.extract_english_name("慢性阻塞性肺病\nCOPD\n一、臨床條件"), "COPD");
    assert_eq!(
        parser.extract_english_name("疾病\nSevere Fever， Thrombocytopenia-Syndrome"),
        "Severe Fever, Thrombocytopenia-Syndrome"
    );
}

#[test]
fn english_name_fallback_skips_numbered_and_short_lines() {
    let parser = parser();
    assert_eq!(parser.extract_english_name("1.ABCD\nABC\n附件 ABCD"), "");
    assert_eq!(parser.extract_english_name("一、HIVS\nRabies"), "Rabies");
}

#[test]
fn english_name_empty_when_nothing_qualifies() {
    assert_eq!(parser().extract_english_name("狂犬病\n一、臨床條件\n發燒"), "");
    assert_eq!(parser().extract_english_name(""), "");
}

#[test]
fn parse_builds_complete_record() {
    let raw = [
        "傳染病病例定義",
        "嚴重急性呼吸道症候群(SARS)",
        "一一一一、、、、臨臨臨臨床床床床條條條條件件件件",
        "發燒及咳嗽",
        "二、檢驗條件",
        "檢體分離出病毒",
        "三、流行病學條件",
        "曾與病例接觸",
        "四、通報定義",
        "具臨床條件",
        "五、疾病分類",
        "(一)可能病例:",
        "符合臨床條件",
        "(二)極可能病例:符合臨床條件及流行病學條件",
        "(三)確定病例:符合檢驗條件",
        "六、檢體採檢送驗事項",
        "請參閱附件",
    ]
    .join("\n");

    let record = parser().parse(&RawDocument::new("sars", raw));

    assert_eq!(record.clinical_condition, "發燒及咳嗽");
    assert_eq!(record.lab_criteria, "檢體分離出病毒");
    assert_eq!(record.epidemiology_condition, "曾與病例接觸");
    assert_eq!(record.reporting_definition, "具臨床條件");
    assert!(record.classification.starts_with("（一）可能病例："));
    assert_eq!(record.specimen_collection, "請參閱附件");
    assert_eq!(record.suspected_case, "符合臨床條件");
    assert_eq!(record.probable_case, "符合臨床條件及流行病學條件");
    assert_eq!(record.confirmed_case, "符合檢驗條件");
    assert_eq!(record.english_name, "SARS");
    assert_eq!(record.populated_count(), StructuredRecord::KEY_COUNT);
    assert!(record.has_structured_sections());
}

#[test]
fn parse_empty_document_yields_all_keys_empty() {
    let record = parser().parse(&RawDocument::new("empty", ""));
    assert_eq!(record, StructuredRecord::default());
    assert_eq!(record.populated_count(), 0);
    assert!(!record.has_structured_sections());

    let value = serde_json::to_value(&record).expect("serialize record");
    let object = value.as_object().expect("record is an object");
    assert_eq!(object.len(), StructuredRecord::KEY_COUNT);
    for (key, _) in record.fields() {
        assert_eq!(object.get(key).and_then(|v| v.as_str()), Some(""), "key {key}");
    }
}

#[test]
fn parse_is_repeatable_for_the_same_document() {
    let parser = parser();
    let document = RawDocument::new("doc", "一、臨床條件\n發燒\n（COVID-19）");
    assert_eq!(parser.parse(&document), parser.parse(&document));
}

#[test]
fn classify_keeps_body_lines_that_start_with_a_label() {
    let cases = parser().classify_cases("（一）可能病例：A\n確定病例之接觸者須追蹤\n（二）確定病例：B");

    assert_eq!(cases.suspected_case, "A\n確定病例之接觸者須追蹤");
    assert_eq!(cases.probable_case, "");
    assert_eq!(cases.confirmed_case, "B");
}

#[test]
fn classify_accepts_bare_label_with_colon_or_alone() {
    let classifier = CaseClassifier::new().expect("case patterns compile");

    let (category, rest) = classifier.detect_label("確定病例：檢驗陽性").expect("label");
    assert_eq!(category, CaseCategory::Confirmed);
    assert_eq!(rest, "檢驗陽性");

    let (category, rest) = classifier.detect_label("可能病例").expect("label");
    assert_eq!(category, CaseCategory::Suspected);
    assert_eq!(rest, "");

    assert!(classifier.detect_label("確定病例之接觸者須追蹤").is_none());
    assert!(classifier.detect_label("極可能病例定義如下").is_none());
}

#[test]
fn english_name_prefers_the_enclosing_span() {
    let text = normalize("嚴重急性呼吸道症候群\n（Severe Acute Respiratory Syndrome, (SARS)）");
    assert_eq!(
        parser().extract_english_name(&text),
        "Severe Acute Respiratory Syndrome, （SARS）"
    );
}

#[test]
fn english_name_falls_back_to_nested_span_when_outer_is_chinese() {
    let text = normalize("疾病名稱（嚴重急性呼吸道症候群（SARS））");
    assert_eq!(parser().extract_english_name(&text), "SARS");
}

#[test]
fn english_name_accepts_accented_latin_letters() {
    let parser = parser();
    assert_eq!(
        parser.extract_english_name(&normalize("格林-巴利症候群\nGuillain-Barré Syndrome")),
        "Guillain-Barré Syndrome"
    );
    assert_eq!(
        parser.extract_english_name(&normalize("格林-巴利症候群（Guillain-Barré）")),
        "Guillain-Barré"
    );
}

#[test]
fn manual_headers_accept_english_gloss_and_high_ordinals() {
    let segmenter = ManualSegmenter::new().expect("manual patterns compile");
    let detect = |line: &str| segmenter.detect_header(&normalize(line));

    assert_eq!(detect("一、疾病概述（Disease description）"), Some(ManualSectionKey::Overview));
    assert_eq!(detect("二、致病原(Causative agent)"), Some(ManualSectionKey::Pathogen));
    assert_eq!(detect("拾、防疫措施"), Some(ManualSectionKey::ControlMeasures));
    assert_eq!(detect("十、防疫措施"), Some(ManualSectionKey::ControlMeasures));
    assert_eq!(detect("九.檢體採檢送驗事項"), Some(ManualSectionKey::SpecimenCollection));

    assert_eq!(detect("疾病概述"), None);
    assert_eq!(detect("三、流行病學概況說明"), None);
    assert_eq!(detect("一、疾病概述（疾病說明）"), None);
}

#[test]
fn manual_footers_are_recognized() {
    assert!(is_page_footer("2024年修訂"));
    assert!(is_page_footer("登革熱防治工作手冊－3"));
    assert!(is_page_footer(&normalize("登革熱防治工作手冊－3")));
    assert!(!is_page_footer("請參考工作手冊辦理"));
    assert!(!is_page_footer("修訂年份不詳"));
}

#[test]
fn parse_manual_splits_chapters_and_drops_footers() {
    let raw = [
        "登革熱防治工作手冊",
        "一、疾病概述（Disease description）",
        "登登登登革革革革熱熱熱熱為病毒感染",
        "登革熱防治工作手冊－1",
        "2023年修訂",
        "典型症狀為發燒",
        "二、致病原（Causative agent）",
        "登革病毒",
        "四、傳染窩",
        "十一、防疫措施",
        "病例通報",
    ]
    .join("\n");

    let record = parser().parse_manual(&RawDocument::new("dengue", raw));

    assert_eq!(record.overview, "登革熱為病毒感染\n典型症狀為發燒");
    assert_eq!(record.pathogen, "登革病毒");
    assert_eq!(record.reservoir, "");
    assert_eq!(record.control_measures, "病例通報");
    assert_eq!(record.populated_count(), 3);
    assert!(record.has_structured_sections());

    let value = serde_json::to_value(&record).expect("serialize manual");
    let object = value.as_object().expect("manual is an object");
    assert_eq!(object.len(), ManualRecord::KEY_COUNT);
    assert_eq!(object.get("致病原").and_then(|v| v.as_str()), Some("登革病毒"));
}

#[test]
fn parse_manual_without_headers_is_empty() {
    let record = parser().parse_manual(&RawDocument::new("none", "只有內容\n沒有章節"));
    assert_eq!(record, ManualRecord::default());
    assert!(!record.has_structured_sections());
}
