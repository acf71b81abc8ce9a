use super::*;
use chrono::TimeZone;

fn sample_members() -> Vec<Member> {
    let created = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let updated = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    vec![
        Member {
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
            created_date: Timestamp::from_datetime(created),
            updated_date: Timestamp::from_datetime(created),
        },
        Member {
            name: "Tom & Jerry".into(),
            surname: "O'Neil, Jr".into(),
            email: "tj@example.com".into(),
            created_date: Timestamp::from_datetime(created),
            updated_date: Timestamp::from_datetime(updated),
        },
    ]
}

#[test]
fn export_of_empty_snapshot_is_refused() {
    let err = export_members(&[], ExportFormat::Csv).expect_err("empty");
    assert_eq!(err.to_string(), "No members to export");
}

#[test]
fn csv_export_has_header_iso_dates_and_quoting() {
    let csv = export_members(&sample_members(), ExportFormat::Csv).expect("csv");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "Name,Surname,Email,Created Date,Updated Date");
    assert_eq!(
        lines[1],
        "Ada,Lovelace,ada@example.com,2024-05-06T07:08:09.000Z,2024-05-06T07:08:09.000Z"
    );
    assert_eq!(
        lines[2],
        "Tom & Jerry,\"O'Neil, Jr\",tj@example.com,2024-05-06T07:08:09.000Z,2024-06-01T00:00:00.000Z"
    );
}

#[test]
fn json_export_is_the_member_array() {
    let json = export_members(&sample_members(), ExportFormat::Json).expect("json");
    let parsed: Vec<Member> = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed, sample_members());
    assert!(json.contains("\"createdDate\""));
}

#[test]
fn xml_export_escapes_text() {
    let xml = export_members(&sample_members(), ExportFormat::Xml).expect("xml");
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<members>\n"));
    assert!(xml.ends_with("</members>"));
    assert!(xml.contains("<name>Tom &amp; Jerry</name>"));
    assert!(xml.contains("<surname>O&apos;Neil, Jr</surname>"));
    assert!(xml.contains("<updatedDate>2024-06-01T00:00:00.000Z</updatedDate>"));
    assert_eq!(xml.matches("<member>").count(), 2);
}

#[test]
fn file_names_carry_the_date() {
    let date = NaiveDate::from_ymd_opt(2025, 2, 3).expect("date");
    assert_eq!(
        export_file_name(ExportFormat::Xml, date),
        "members_export_2025-02-03.xml"
    );
    assert_eq!(backup_file_name(date), "association_backup_2025-02-03.json");
}

#[test]
fn backup_document_shape_and_restore() {
    let taken_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let backup = BackupDocument::new(&sample_members(), taken_at);
    let json = backup.to_json().expect("json");

    let value: serde_json::Value = serde_json::from_str(&json).expect("value");
    assert_eq!(value["version"], "2.0");
    assert_eq!(value["metadata"]["totalMembers"], 2);
    assert_eq!(
        value["metadata"]["exportedBy"],
        "Association Management System"
    );
    assert_eq!(value["metadata"]["format"], "backup");

    let restored = parse_backup(&json).expect("restore");
    assert_eq!(restored.len(), 2);
    assert_eq!(restored[1].surname(), "O'Neil, Jr");
}

#[test]
fn csv_import_matches_columns_by_header() {
    let text = "\
EMAIL, Name ,Surname,Phone

grace@example.com,Grace,Hopper,555
\"alan@example.com\",Alan,\"Turing, OBE\",
,Nobody,Here,
";
    let import = parse_csv_import(text).expect("import");

    assert_eq!(import.members.len(), 2);
    assert_eq!(import.members[0].name(), "Grace");
    assert_eq!(import.members[0].email(), "grace@example.com");
    assert_eq!(import.members[1].surname(), "Turing, OBE");
    assert_eq!(import.skipped, vec!["line 5: All fields are required".to_string()]);
}

#[test]
fn csv_import_reports_missing_columns() {
    let err = parse_csv_import("name,mail\nAda,ada@example.com").expect_err("missing");
    assert_eq!(err.to_string(), "Missing required columns: surname, email");

    assert!(matches!(
        parse_csv_import("\n\n"),
        Err(TransferError::EmptyFile)
    ));
}

#[test]
fn only_csv_files_are_accepted() {
    assert!(ensure_csv_file_name(Path::new("members.CSV")).is_ok());
    assert!(matches!(
        ensure_csv_file_name(Path::new("members.json")),
        Err(TransferError::NotCsv)
    ));
    assert!(ensure_csv_file_name(Path::new("members")).is_err());
}

#[test]
fn quoted_cells_keep_commas_and_escaped_quotes() {
    let records = csv_records(r#"a,"b, c","say ""hi""""#);
    assert_eq!(
        records,
        vec![CsvRecord {
            line: 1,
            cells: vec!["a".to_string(), "b, c".to_string(), "say \"hi\"".to_string()],
        }]
    );
}

#[test]
fn quoted_line_breaks_stay_inside_the_record() {
    let records = csv_records("h1,h2\r\n\"two\nlines\",x\r\n\r\nlast,y");
    let lines: Vec<usize> = records.iter().map(|record| record.line).collect();
    assert_eq!(lines, vec![1, 2, 5]);
    assert_eq!(records[1].cells, vec!["two\nlines".to_string(), "x".to_string()]);
    assert_eq!(records[2].cells, vec!["last".to_string(), "y".to_string()]);
}

#[test]
fn csv_export_imports_back_with_awkward_cells() {
    let created = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let awkward = Member {
        name: "Ann \"Annie\"\nMarie".into(),
        surname: "Smith, Jr.".into(),
        email: "ann@example.com".into(),
        created_date: Timestamp::from_datetime(created),
        updated_date: Timestamp::from_datetime(created),
    };
    let mut members = vec![awkward];
    members.extend(sample_members());

    let csv = export_members(&members, ExportFormat::Csv).expect("csv");
    let import = parse_csv_import(&csv).expect("import");

    assert!(import.skipped.is_empty(), "skipped: {:?}", import.skipped);
    assert_eq!(import.members.len(), 3);
    assert_eq!(import.members[0].name(), "Ann \"Annie\"\nMarie");
    assert_eq!(import.members[0].surname(), "Smith, Jr.");
    assert_eq!(import.members[2].surname(), "O'Neil, Jr");
}

#[test]
fn skipped_rows_report_their_starting_line() {
    let text = "name,surname,email\n\"Multi\nLine\",,x@example.com\nBo,Lee,bo@example.com\n";
    let import = parse_csv_import(text).expect("import");
    assert_eq!(import.skipped, vec!["line 2: All fields are required".to_string()]);
    assert_eq!(import.members.len(), 1);
}
