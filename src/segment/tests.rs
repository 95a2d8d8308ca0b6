use regex::RegexBuilder;

use super::boundary::{page_tag, tag_page};
use super::sections::page_offset;
use super::*;
use crate::rules::{RuleProvider, RulesFile, YearRuleSet};

const RULES: &str = r#"
{
  "years": {
    "17": {
      "front_matter_anchor": "ENGLISH CATALOGUE OF BOOKS",
      "appendix_anchor": "DIRECTORY OF.*?PUBLISHERS",
      "year_suffix_variants": ["17", "'17"]
    }
  }
}
"#;

const FRONT_MATTER: &str = "Preface\nintro text\n\u{c}Contents\n\u{c}Abbreviations\n\u{c}";

const BODY_PAGE_ONE: &str = "\nABBOTT—ADAMS\n\
Abbott (E. W.)-The Colliery official's friend.\n\
E. W. ABBOTT, Dec. '17\n\
Adams (H.)-Poems. Cr. 8vo. pp. 80\n\
MACMILLAN, Jan '17\n\
12\n";

const BODY_PAGE_TWO: &str = "ADAMS—BROWN\n\
1917\n\
Brown (A.)-First title. Jan '17 Clarke (B.)-Second title. Mar '17\n\
Davies (C.)-Sermons.\n\
8vo. LONGMANS, Feb.\n\
'17\n";

const APPENDIX: &str = "DIRECTORY OF\nLONDON PUBLISHERS\nMacmillan, St. Martin's St.\n";

fn rules() -> YearRuleSet {
    let rules: RulesFile = serde_json::from_str(RULES).expect("rules json should parse");
    RuleProvider::from_rules(rules)
        .rules_for("17")
        .expect("year 17 should compile")
}

fn segmenter() -> Segmenter {
    Segmenter::new(rules()).expect("segmenter should build")
}

fn catalogue() -> String {
    format!(
        "{FRONT_MATTER}ENGLISH CATALOGUE OF BOOKS{BODY_PAGE_ONE}\u{c}{BODY_PAGE_TWO}\u{c}{APPENDIX}"
    )
}

fn entry(text: &str, page: u32, document_page: i64) -> Entry {
    Entry {
        text: text.to_string(),
        page_number: Some(page),
        document_page_number: Some(document_page),
    }
}

fn non_whitespace(text: &str) -> String {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .collect()
}

#[test]
fn strip_removes_guide_words_year_headers_and_page_numbers() {
    let rules = rules();
    let cleaned = strip(
        "ABBOTT—ADAMS\n1917\nAbbott (E. W.)-Friend.\n## 12\n214\nE. W. ABBOTT, Dec. '17\n",
        &rules.header_noise_patterns,
    );

    assert_eq!(cleaned, "Abbott (E. W.)-Friend.\n\nE. W. ABBOTT, Dec. '17\n");
}

#[test]
fn strip_applies_patterns_to_the_output_of_earlier_ones() {
    let compile = |pattern: &str| {
        RegexBuilder::new(pattern)
            .multi_line(true)
            .build()
            .expect("pattern compiles")
    };
    let page = "Abbott (E. W.)-Friend.\n## 12\nE. W. ABBOTT, Dec. '17\n";
    let marker = compile(r"##.*$");
    let blank_line = compile(r"^\n");

    let in_order = strip(page, &[marker.clone(), blank_line.clone()]);
    let reversed = strip(page, &[blank_line, marker]);

    assert_eq!(in_order, "Abbott (E. W.)-Friend.\nE. W. ABBOTT, Dec. '17\n");
    assert_eq!(reversed, "Abbott (E. W.)-Friend.\n\nE. W. ABBOTT, Dec. '17\n");
}

#[test]
fn strip_without_matches_is_a_no_op() {
    let rules = rules();
    let page = "Smith (J.)-A book.\nJan '17\n";
    assert_eq!(strip(page, &rules.header_noise_patterns), page);
}

#[test]
fn split_sections_computes_page_offset_from_front_matter() {
    let text = catalogue();
    let sections = split_sections(&text, &rules()).expect("anchors present");

    assert_eq!(sections.front_matter, FRONT_MATTER);
    assert_eq!(sections.page_offset, 2);
    assert!(sections.entry_body.starts_with(BODY_PAGE_ONE));
    assert!(sections.appendix.starts_with("\nMacmillan"));
    assert_eq!(page_offset(""), -1);
    assert_eq!(page_offset("a\u{c}b"), 0);
}

#[test]
fn split_sections_requires_front_matter_anchor() {
    let text = catalogue().replace("ENGLISH CATALOGUE OF BOOKS", "ENGLISH CATALOGUE");
    let error = split_sections(&text, &rules()).expect_err("front anchor missing");

    match error {
        SegmentError::BoundaryNotFound {
            year,
            boundary,
            pattern,
        } => {
            assert_eq!(year, "17");
            assert_eq!(boundary, Boundary::FrontMatter);
            assert_eq!(pattern, "ENGLISH CATALOGUE OF BOOKS");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn split_sections_requires_appendix_anchor() {
    let text = catalogue().replace("DIRECTORY OF", "INDEX OF");
    let error = split_sections(&text, &rules()).expect_err("appendix anchor missing");

    assert!(matches!(
        error,
        SegmentError::BoundaryNotFound {
            boundary: Boundary::Appendix,
            ..
        }
    ));
    assert!(!error.is_configuration());
}

#[test]
fn segment_without_front_matter_anchor_produces_no_entries() {
    let result = segmenter().segment("Smith (J.)-A book.\nJan '17\n");
    assert!(matches!(
        result,
        Err(SegmentError::BoundaryNotFound {
            boundary: Boundary::FrontMatter,
            ..
        })
    ));
}

#[test]
fn to_pages_splits_strictly_on_form_feed() {
    assert_eq!(to_pages("a\u{c}\u{c}b\n"), vec!["a", "", "b\n"]);
}

#[test]
fn tag_page_stamps_each_line_ending_year_suffix() {
    let rules = rules();
    let tagged = tag_page(
        "Smith (J.)-A book.\nJan '17\nJones (K.)-Verse. Feb. 17.\n",
        &rules.entry_terminator,
        3,
        5,
    );

    let tag = page_tag(3, 5);
    assert_eq!(tag, "<PAGE_NUM:3><DOCUMENT_PAGE_NUM:5>");
    assert_eq!(
        tagged.text,
        format!(
            "Smith (J.)-A book.\nJan{tag} '17{ENTRY_CUT}\nJones (K.)-Verse. Feb.{tag} 17.{ENTRY_CUT}\n"
        )
    );
}

#[test]
fn tag_page_ignores_year_suffix_inside_a_line() {
    let rules = rules();
    let tagged = tag_page("Report for '17 and after\n", &rules.entry_terminator, 1, 1);
    assert!(!tagged.text.contains(ENTRY_CUT));
}

#[test]
fn single_entry_page_flattens_to_one_tagged_entry() {
    let rules = rules();
    let tagged = tag_pages(&["Smith (J.)-A book.\nJan '17\n"], &rules.entry_terminator, 0);
    let entries = EntryFlattener::new("17")
        .expect("flattener builds")
        .flatten(&tagged);

    assert_eq!(entries, vec![entry("Smith (J.)-A book. Jan '17", 1, 1)]);
}

#[test]
fn flatten_keeps_untagged_trailing_text_without_page_numbers() {
    let rules = rules();
    let tagged = tag_pages(
        &["Smith (J.)-A book.\nJan '17\nJones (K.)-A long\ntitle continued"],
        &rules.entry_terminator,
        0,
    );
    let entries = EntryFlattener::new("17")
        .expect("flattener builds")
        .flatten(&tagged);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].text, "Jones (K.)-A long title continued");
    assert_eq!(entries[1].page_number, None);
    assert_eq!(entries[1].document_page_number, None);
}

#[test]
fn merged_line_is_split_into_two_entries_sharing_page_tags() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");
    let merged = entry(
        "Brown (A.)-First title. Jan '17 Clarke (B.)-Second title. Mar '17",
        4,
        6,
    );

    let correction = corrector.correct(vec![merged]);

    assert_eq!(correction.merged_count, 1);
    assert!(correction.warnings.is_empty());
    assert_eq!(
        correction.entries,
        vec![
            entry("Brown (A.)-First title. Jan '17", 4, 6),
            entry("Clarke (B.)-Second title. Mar '17", 4, 6),
        ]
    );
}

#[test]
fn merged_line_without_space_after_date_is_split() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");
    let merged = entry(
        "Brown (A.)-First title. Jan '17Clarke (B.)-Second title. Mar '17",
        4,
        6,
    );

    assert!(corrector.is_merged(&merged.text));
    let correction = corrector.correct(vec![merged]);

    assert_eq!(correction.merged_count, 1);
    assert_eq!(
        correction.entries,
        vec![
            entry("Brown (A.)-First title. Jan '17", 4, 6),
            entry("Clarke (B.)-Second title. Mar '17", 4, 6),
        ]
    );
}

#[test]
fn date_followed_by_more_digits_is_not_a_merge() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");

    assert!(!corrector.is_merged("Smith (J.)-Letters, Jan 1755. Cr. 8vo. Feb '17"));
    assert!(!corrector.is_merged("Smith (J.)-Almanac for Jan. 175 pp. Feb '17"));
}

#[test]
fn date_at_end_of_entry_is_not_a_merge() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");

    assert!(!corrector.is_merged("Smith (J.)-A book. Jan '17"));
    assert!(!corrector.is_merged("Smith (J.)-A book. Sept. '17."));
    assert!(!corrector.is_merged("Smith (J.)-A book. Jan '18 Jones (K.)-Verse. Feb '18"));
    assert!(corrector.is_merged("Smith (J.)-A book. Dec. 17 Jones (K.)-Verse. Feb '17"));
}

#[test]
fn merged_entry_without_page_tag_is_split_with_warning() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");
    let untagged = Entry {
        text: "Brown (A.)-First. Jan '17 — Clarke (B.)-Second".to_string(),
        page_number: None,
        document_page_number: None,
    };

    let correction = corrector.correct(vec![untagged]);

    assert_eq!(correction.entries.len(), 2);
    assert_eq!(correction.entries[0].text, "Brown (A.)-First. Jan '17");
    assert_eq!(correction.entries[1].text, "Clarke (B.)-Second");
    assert!(correction.entries.iter().all(|entry| entry.page_number.is_none()));
    assert!(matches!(
        correction.warnings.as_slice(),
        [SegmentWarning::MissingPageTag { index: 0, .. }]
    ));
}

#[test]
fn second_merge_point_is_reported_not_split() {
    let corrector = LineMergeCorrector::new("17").expect("corrector builds");
    let correction = corrector.correct(vec![
        entry("Ames (A.)-Plays. Feb '17", 1, 3),
        entry("Abel (A.)-One. Jan '17 Bell (B.)-Two. Feb '17 Cole (C.)-Three. Mar '17", 1, 3),
    ]);

    assert_eq!(correction.merged_count, 1);
    assert_eq!(correction.entries.len(), 3);
    assert_eq!(correction.entries[1].text, "Abel (A.)-One. Jan '17");
    assert_eq!(
        correction.entries[2].text,
        "Bell (B.)-Two. Feb '17 Cole (C.)-Three. Mar '17"
    );
    match correction.warnings.as_slice() {
        [SegmentWarning::UnexpectedFragment { index, remainder }] => {
            assert_eq!(*index, 1);
            assert_eq!(remainder, &correction.entries[2].text);
        }
        other => panic!("unexpected warnings: {other:?}"),
    }
}

#[test]
fn segment_produces_ordered_entries_with_page_numbers() {
    let segmentation = segmenter().segment(&catalogue()).expect("segments");

    assert_eq!(
        segmentation.entries,
        vec![
            entry(
                "Abbott (E. W.)-The Colliery official's friend. E. W. ABBOTT, Dec. '17",
                1,
                3
            ),
            entry("Adams (H.)-Poems. Cr. 8vo. pp. 80 MACMILLAN, Jan '17", 1, 3),
            entry("Brown (A.)-First title. Jan '17", 2, 4),
            entry("Clarke (B.)-Second title. Mar '17", 2, 4),
            entry("Davies (C.)-Sermons. 8vo. LONGMANS, Feb. '17", 2, 4),
        ]
    );
    assert!(segmentation.warnings.is_empty());
}

#[test]
fn segment_stats_satisfy_count_and_offset_invariants() {
    let segmentation = segmenter().segment(&catalogue()).expect("segments");
    let stats = &segmentation.stats;

    assert_eq!(stats.page_offset, 2);
    assert_eq!(stats.page_count, 3);
    assert_eq!(stats.raw_entry_count, 4);
    assert_eq!(stats.merged_entry_count, 1);
    assert_eq!(stats.untagged_entry_count, 0);
    assert_eq!(
        stats.entry_count,
        stats.raw_entry_count + stats.merged_entry_count
    );
    assert_eq!(stats.entry_count, segmentation.entries.len());
    assert!((stats.merged_ratio() - 0.25).abs() < f64::EPSILON);

    for entry in &segmentation.entries {
        let page = i64::from(entry.page_number.expect("tagged"));
        let document_page = entry.document_page_number.expect("tagged");
        assert_eq!(document_page - page, stats.page_offset);
    }
}

#[test]
fn segment_conserves_entry_body_content() {
    let rules = rules();
    let text = catalogue();
    let sections = split_sections(&text, &rules).expect("anchors present");
    let expected = to_pages(sections.entry_body)
        .into_iter()
        .map(|page| non_whitespace(&strip(page, &rules.header_noise_patterns)))
        .collect::<String>();

    let segmentation = segmenter().segment(&text).expect("segments");
    let actual = segmentation
        .entries
        .iter()
        .map(|entry| non_whitespace(&entry.text))
        .collect::<String>();

    assert_eq!(actual, expected);
}
