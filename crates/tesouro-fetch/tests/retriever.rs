//! End-to-end retriever behavior against an in-memory source.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use futures::StreamExt;
use rust_decimal::Decimal;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;
use tesouro_fetch::{DownloadError, ErrorPolicy, Retriever, RetrieverConfig, YearSource};
use tesouro_types::{BondType, FormatVersion, QueryRange, TesouroError};

const HEADER: &str = "Titulo;Dia;Taxa Compra;Taxa Venda;PU Compra;PU Venda\n";

const LTN_2020: &str = "LTN 010123;03/01/2020;6,10;6,16;812,90;811,60\n\
                        LTN 010121;02/01/2020;4,55;4,61;955,12;954,70\n\
                        LTN 010123;02/01/2020;6,12;6,18;812,34;811,02\n";

const LTN_2021: &str = "LTN 010123;05/01/2021;2,97;3,03;970,11;969,86\n\
                        LTN 010123;04/01/2021;2,95;3,01;970,05;969,80\n";

const NTNB_2020: &str = "NTN-B 150535;02/01/2020;3,41;3,47;4.012,55;4.001,20\n";

/// In-memory source that counts attempts per `(bond type, year)`.
#[derive(Default)]
struct Fixture {
    files: HashMap<(BondType, i32), Bytes>,
    unavailable: HashSet<(BondType, i32)>,
    rejected: HashSet<(BondType, i32)>,
    attempts: Mutex<HashMap<(BondType, i32), u32>>,
}

impl Fixture {
    fn ltn() -> Self {
        Self::default()
            .with_file(BondType::Ltn, 2020, LTN_2020)
            .with_file(BondType::Ltn, 2021, LTN_2021)
    }

    fn with_file(mut self, bond_type: BondType, year: i32, rows: &str) -> Self {
        self.files
            .insert((bond_type, year), Bytes::from(format!("{HEADER}{rows}")));
        self
    }

    fn with_raw_file(mut self, bond_type: BondType, year: i32, content: impl Into<Bytes>) -> Self {
        self.files.insert((bond_type, year), content.into());
        self
    }

    fn with_rejected(mut self, bond_type: BondType, year: i32) -> Self {
        self.rejected.insert((bond_type, year));
        self
    }

    fn with_unavailable(mut self, bond_type: BondType, year: i32) -> Self {
        self.unavailable.insert((bond_type, year));
        self
    }

    fn attempts(&self, bond_type: BondType, year: i32) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(&(bond_type, year))
            .copied()
            .unwrap_or(0)
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl YearSource for Fixture {
    async fn fetch(&self, bond_type: BondType, year: i32) -> Result<Option<Bytes>, DownloadError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry((bond_type, year))
            .or_insert(0) += 1;

        if self.unavailable.contains(&(bond_type, year)) {
            return Err(DownloadError::ServerError { status: 503 });
        }
        if self.rejected.contains(&(bond_type, year)) {
            return Err(DownloadError::Rejected("access denied".to_string()));
        }
        Ok(self.files.get(&(bond_type, year)).cloned())
    }
}

fn config(max_retries: u32) -> RetrieverConfig {
    RetrieverConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 2,
        format: FormatVersion::CsvV1,
        ..Default::default()
    }
}

fn retriever(fixture: Fixture) -> Retriever<Fixture> {
    Retriever::with_source(fixture, config(2)).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_single_year_returns_that_years_records_sorted() {
    let retriever = retriever(Fixture::ltn());
    let table = retriever.get_data("LTN", 2020, 2020).await.unwrap();

    assert_eq!(table.len(), 3);
    let rows: Vec<_> = table
        .iter()
        .map(|r| (r.reference_date, r.asset_code.as_str(), r.price, r.yield_rate))
        .collect();
    assert_eq!(
        rows,
        vec![
            (date(2020, 1, 2), "LTN 010121", dec("955.12"), dec("4.55")),
            (date(2020, 1, 2), "LTN 010123", dec("812.34"), dec("6.12")),
            (date(2020, 1, 3), "LTN 010123", dec("812.90"), dec("6.10")),
        ]
    );
    assert_eq!(table.records()[1].ask_price, Some(dec("811.02")));
    assert_eq!(table.records()[1].ask_yield, Some(dec("6.18")));
    assert_eq!(table.records()[1].maturity, Some(date(2023, 1, 1)));
}

#[tokio::test]
async fn test_multi_year_range_returns_all_records_sorted() {
    let retriever = retriever(Fixture::ltn());
    let table = retriever.get_data("LTN", 2020, 2022).await.unwrap();

    assert_eq!(table.len(), 5);
    let dates: Vec<_> = table.iter().map(|r| r.reference_date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(table.first_date(), Some(date(2020, 1, 2)));
    assert_eq!(table.last_date(), Some(date(2021, 1, 5)));
    assert!(table.iter().all(|r| r.bond_type == BondType::Ltn));

    let range = QueryRange::new(BondType::Ltn, 2020, 2022).unwrap();
    assert!(table.iter().all(|r| range.contains(r.reference_date)));
}

#[tokio::test]
async fn test_year_without_file_is_empty_not_error() {
    let retriever = retriever(Fixture::ltn());
    let table = retriever.get_data("LTN", 2022, 2022).await.unwrap();
    assert!(table.is_empty());
    assert_eq!(retriever.source().attempts(BondType::Ltn, 2022), 1);
}

#[tokio::test]
async fn test_repeated_queries_are_identical() {
    let retriever = retriever(Fixture::ltn());
    let first = retriever.get_data("ltn", 2020, 2021).await.unwrap();
    let second = retriever.get_data("LTN", 2020, 2021).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_invalid_arguments_never_reach_the_source() {
    let retriever = retriever(Fixture::ltn());

    let err = retriever.get_data("LTN", 2021, 2020).await.unwrap_err();
    assert!(err.is_invalid_argument());

    let err = retriever.get_data("XYZ", 2020, 2020).await.unwrap_err();
    assert!(err.is_invalid_argument());

    let err = retriever.get_data("LTN", 1999, 2000).await.unwrap_err();
    assert!(err.is_invalid_argument());

    let err = retriever.get_data("LTN", 2020, 9999).await.unwrap_err();
    assert!(err.is_invalid_argument());

    assert_eq!(retriever.source().total_attempts(), 0);
}

#[tokio::test]
async fn test_unavailable_year_is_retried_twice_then_fails() {
    let fixture = Fixture::ltn().with_unavailable(BondType::Ltn, 2021);
    let retriever = retriever(fixture);

    let err = retriever.get_data("LTN", 2020, 2021).await.unwrap_err();
    match err {
        TesouroError::SourceUnavailable {
            bond_type,
            year,
            attempts,
            ..
        } => {
            assert_eq!(bond_type, BondType::Ltn);
            assert_eq!(year, 2021);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected SourceUnavailable, got {other}"),
    }
    assert_eq!(retriever.source().attempts(BondType::Ltn, 2021), 3);
}

#[tokio::test]
async fn test_malformed_file_is_a_parse_error() {
    let fixture = Fixture::ltn().with_raw_file(
        BondType::Ltn,
        2021,
        "Data;Valor\n04/01/2021;970,05\n".to_string(),
    );
    let retriever = retriever(fixture);

    let err = retriever.get_data("LTN", 2021, 2021).await.unwrap_err();
    assert!(err.is_parse());
    assert!(matches!(err, TesouroError::Parse { year: 2021, .. }));
    // Schema mismatches are not retried
    assert_eq!(retriever.source().attempts(BondType::Ltn, 2021), 1);
}

#[tokio::test]
async fn test_collect_all_reports_earliest_failed_year() {
    let fixture = Fixture::ltn()
        .with_unavailable(BondType::Ltn, 2021)
        .with_raw_file(BondType::Ltn, 2022, "garbage\n".to_string());
    let config = RetrieverConfig {
        error_policy: ErrorPolicy::CollectAll,
        concurrency: 1,
        ..config(0)
    };
    let retriever = Retriever::with_source(fixture, config).unwrap();

    let err = retriever.get_data("LTN", 2020, 2022).await.unwrap_err();
    assert!(matches!(err, TesouroError::SourceUnavailable { year: 2021, .. }));
    // Every year was still attempted
    for year in 2020..=2022 {
        assert_eq!(retriever.source().attempts(BondType::Ltn, year), 1);
    }
}

#[tokio::test]
async fn test_records_outside_range_are_dropped() {
    let fixture = Fixture::default().with_file(
        BondType::Ltn,
        2020,
        "LTN 010123;30/12/2019;6,40;6,46;790,00;789,00\n\
         LTN 010123;02/01/2020;6,12;6,18;812,34;811,02\n",
    );
    let retriever = retriever(fixture);

    let table = retriever.get_data("LTN", 2020, 2020).await.unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.first_date(), Some(date(2020, 1, 2)));
}

#[tokio::test]
async fn test_get_many_merges_bond_types() {
    let fixture = Fixture::ltn().with_file(BondType::NtnB, 2020, NTNB_2020);
    let retriever = retriever(fixture);

    let table = retriever
        .get_many(&[BondType::NtnB, BondType::Ltn], 2020, 2020)
        .await
        .unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.filter_bond(BondType::NtnB).count(), 1);

    let ntnb = table.filter_bond(BondType::NtnB).next().unwrap();
    assert_eq!(ntnb.asset_code, "NTN-B 150535");
    assert_eq!(ntnb.price, dec("4012.55"));
    assert_eq!(ntnb.maturity, Some(date(2035, 5, 15)));

    let err = retriever.get_many(&[], 2020, 2020).await.unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn test_year_stream_yields_one_batch_per_year() {
    let retriever = retriever(Fixture::ltn());
    let range = QueryRange::new(BondType::Ltn, 2020, 2022).unwrap();

    let mut counts: Vec<(i32, usize)> = retriever
        .year_stream(range)
        .map(|batch| {
            let batch = batch.unwrap();
            (batch.year, batch.len())
        })
        .collect()
        .await;
    counts.sort_unstable();
    assert_eq!(counts, vec![(2020, 3), (2021, 2), (2022, 0)]);
}

#[tokio::test]
async fn test_rejected_year_is_not_retried() {
    let fixture = Fixture::ltn().with_rejected(BondType::Ltn, 2021);
    let retriever = retriever(fixture);

    let err = retriever.get_data("LTN", 2021, 2021).await.unwrap_err();
    assert!(matches!(err, TesouroError::SourceUnavailable { attempts: 1, .. }));
    assert_eq!(retriever.source().attempts(BondType::Ltn, 2021), 1);
}

/// A workbook with one sheet per issue, dates as date cells and as text.
fn workbook(sheets: &[(&str, Vec<(&str, [f64; 4])>)]) -> Bytes {
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        sheet.write_string(0, 0, *name).unwrap();
        let header = ["Dia", "Taxa Compra Manhã", "Taxa Venda Manhã", "PU Compra Manhã", "PU Venda Manhã"];
        for (col, label) in header.iter().enumerate() {
            sheet.write_string(1, col as u16, *label).unwrap();
        }
        for (i, (day, values)) in rows.iter().enumerate() {
            let row = 2 + i as u32;
            if i % 2 == 0 {
                let date = NaiveDate::parse_from_str(day, "%d/%m/%Y").unwrap();
                let excel = ExcelDateTime::from_ymd(
                    date.year() as u16,
                    date.month() as u8,
                    date.day() as u8,
                )
                .unwrap();
                sheet.write_datetime_with_format(row, 0, &excel, &date_format).unwrap();
            } else {
                sheet.write_string(row, 0, *day).unwrap();
            }
            for (col, value) in values.iter().enumerate() {
                sheet.write_number(row, col as u16 + 1, *value).unwrap();
            }
        }
    }
    Bytes::from(workbook.save_to_buffer().unwrap())
}

#[tokio::test]
async fn test_workbook_source_end_to_end() {
    let ltn_2020 = workbook(&[
        (
            "LTN 010123",
            vec![
                ("03/01/2020", [6.10, 6.16, 812.90, 811.60]),
                ("02/01/2020", [6.12, 6.18, 812.34, 811.02]),
            ],
        ),
        ("LTN 010121", vec![("02/01/2020", [4.55, 4.61, 955.12, 954.70])]),
    ]);
    let ltn_2021 = workbook(&[("LTN 010123", vec![("04/01/2021", [2.95, 3.01, 970.05, 969.80])])]);

    let fixture = Fixture::default()
        .with_raw_file(BondType::Ltn, 2020, ltn_2020)
        .with_raw_file(BondType::Ltn, 2021, ltn_2021);
    let config = RetrieverConfig {
        format: FormatVersion::XlsV1,
        ..config(2)
    };
    let retriever = Retriever::with_source(fixture, config).unwrap();

    let table = retriever.get_data("LTN", 2020, 2021).await.unwrap();
    let rows: Vec<_> = table
        .iter()
        .map(|r| (r.reference_date, r.asset_code.as_str(), r.price))
        .collect();
    assert_eq!(
        rows,
        vec![
            (date(2020, 1, 2), "LTN 010121", dec("955.12")),
            (date(2020, 1, 2), "LTN 010123", dec("812.34")),
            (date(2020, 1, 3), "LTN 010123", dec("812.90")),
            (date(2021, 1, 4), "LTN 010123", dec("970.05")),
        ]
    );
    assert_eq!(table.records()[1].ask_yield, Some(dec("6.18")));
    assert_eq!(table.records()[0].maturity, Some(date(2021, 1, 1)));
}
