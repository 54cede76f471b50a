//! 로컬 CSV CSAT 소스.
//!
//! 헤더 이름은 공백 제거 후 대소문자 무시로 매칭하며 여러 별칭을 허용한다.
//! 행마다 별칭 열을 우선순위대로 살펴 첫 유효 값을 쓴다.
//! 형식이 맞지 않는 행은 경고 후 건너뛴다.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::csat::{CsatAccumulator, CsatSummary};
use ticketpulse_core::models::month::{MonthBucket, ReportWindow};
use ticketpulse_core::ports::csat_source::CsatSource;
use tracing::{debug, info, warn};

/// 만족도 백분율 열 별칭 (우선순위 순)
const PERCENT_ALIASES: &[&str] = &["csat_percent", "csat", "csat_pct", "csat_percentage"];

/// 날짜 열 별칭 (우선순위 순)
const DATE_ALIASES: &[&str] = &["date", "month"];

/// 소문자 헤더 이름 → 열 인덱스
struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        for (i, field) in headers.iter().enumerate() {
            // 중복 헤더는 첫 번째 열 우선
            indices.entry(field.trim().to_lowercase()).or_insert(i);
        }
        Self { indices }
    }

    /// 존재하는 별칭 열 (별칭 우선순위 순)
    fn resolve_all(&self, aliases: &[&str]) -> Vec<usize> {
        aliases
            .iter()
            .filter_map(|alias| self.indices.get(*alias).copied())
            .collect()
    }
}

/// 백분율 셀 파싱. 비었거나 `NaN`/비숫자/0-100 범위 밖이면 `None`.
fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| (0.0..=100.0).contains(v))
}

/// 행에서 우선순위대로 첫 유효 백분율
fn row_percent(record: &csv::StringRecord, columns: &[usize]) -> Option<f64> {
    columns
        .iter()
        .find_map(|&col| record.get(col).and_then(parse_percent))
}

/// 행에서 우선순위대로 첫 비어 있지 않은 날짜 셀
fn row_date<'r>(record: &'r csv::StringRecord, columns: &[usize]) -> Option<&'r str> {
    columns
        .iter()
        .filter_map(|&col| record.get(col))
        .find(|cell| !cell.trim().is_empty())
}

/// 행 통계
#[derive(Debug, Default)]
struct RowStats {
    rows: usize,
    skipped: usize,
    out_of_window: usize,
}

/// CSV 본문을 CSAT 요약으로 변환
///
/// 백분율 열이 없거나 유효한 행이 없으면 `Ok(None)`.
/// 날짜 열이 없으면 연간 평균에만 반영된다.
pub fn parse_csat_csv<R: Read>(
    reader: R,
    window: &ReportWindow,
) -> Result<Option<CsatSummary>, CoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| CoreError::Parse(format!("CSAT CSV 헤더 읽기 실패: {e}")))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);

    let percent_cols = columns.resolve_all(PERCENT_ALIASES);
    if percent_cols.is_empty() {
        warn!("CSAT CSV에 백분율 열 없음 (허용: {})", PERCENT_ALIASES.join(", "));
        return Ok(None);
    }
    let date_cols = columns.resolve_all(DATE_ALIASES);
    if date_cols.is_empty() {
        warn!("CSAT CSV에 날짜 열 없음, 연간 평균만 계산");
    }

    let window_months: BTreeSet<MonthBucket> = window.months().into_iter().collect();
    let mut acc = CsatAccumulator::new();
    let mut stats = RowStats::default();

    for (idx, result) in rdr.records().enumerate() {
        // 헤더가 1행
        let line = idx + 2;
        stats.rows += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("CSAT CSV {line}행 읽기 실패, 건너뜀: {e}");
                stats.skipped += 1;
                continue;
            }
        };

        let Some(percent) = row_percent(&record, &percent_cols) else {
            debug!("CSAT CSV {line}행: 백분율 없음, 건너뜀");
            stats.skipped += 1;
            continue;
        };

        let month = if date_cols.is_empty() {
            None
        } else {
            match row_date(&record, &date_cols).and_then(MonthBucket::parse_month) {
                Some(month) => Some(month),
                None => {
                    warn!("CSAT CSV {line}행: 날짜 형식 오류, 건너뜀");
                    stats.skipped += 1;
                    continue;
                }
            }
        };

        if let Some(month) = &month {
            if !window_months.contains(month) {
                stats.out_of_window += 1;
                continue;
            }
        }

        acc.add(percent, month);
    }

    info!(
        "CSAT CSV: {}행 중 {}행 사용 (건너뜀 {}, 윈도우 밖 {})",
        stats.rows,
        acc.len(),
        stats.skipped,
        stats.out_of_window
    );
    Ok(acc.finish())
}

/// CSV 파일 CSAT 소스: `CsatSource` 포트 구현
pub struct CsvCsatSource {
    path: PathBuf,
}

impl CsvCsatSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CsatSource for CsvCsatSource {
    fn name(&self) -> &'static str {
        "csv-file"
    }

    async fn load(&self, window: &ReportWindow) -> Result<Option<CsatSummary>, CoreError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("CSAT CSV 파일 없음: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(CoreError::Io(e)),
        };
        parse_csat_csv(std::io::BufReader::new(file), window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use ticketpulse_core::models::time::parse_timestamp;

    fn window() -> ReportWindow {
        ReportWindow::for_year(2025, parse_timestamp("2025-12-01T00:00:00Z").unwrap()).unwrap()
    }

    fn month(m: u32) -> MonthBucket {
        MonthBucket::from_ym(2025, m).unwrap()
    }

    fn parse(body: &str) -> Option<CsatSummary> {
        parse_csat_csv(body.as_bytes(), &window()).unwrap()
    }

    #[test]
    fn averages_per_month_and_year() {
        let summary = parse("date,csat_percent\n2025-01-10,90\n2025-01-20,80\n2025-02-01,100\n")
            .unwrap();
        assert_eq!(summary.monthly.get(&month(1)), Some(&85.0));
        assert_eq!(summary.monthly.get(&month(2)), Some(&100.0));
        assert_eq!(summary.yearly_average, 90.0);
    }

    #[test]
    fn headers_matched_case_insensitively_with_aliases() {
        let summary = parse(" Month , CSAT_Pct \n2025-03,70\n2025-03,80\n").unwrap();
        assert_eq!(summary.monthly.get(&month(3)), Some(&75.0));
    }

    #[test]
    fn bad_rows_are_skipped() {
        let summary = parse(
            "date,csat\n2025-01-01,\n2025-01-02,NaN\n2025-01-03,abc\nnot-a-date,50\n2025-01-04,60%\n",
        )
        .unwrap();
        assert_eq!(summary.yearly_average, 60.0);
        assert_eq!(summary.monthly.len(), 1);
    }

    #[test]
    fn out_of_range_percent_is_skipped() {
        let summary = parse("date,csat\n2025-01-01,340\n2025-01-02,-5\n2025-01-03,70\n").unwrap();
        assert_eq!(summary.yearly_average, 70.0);
    }

    #[test]
    fn later_alias_column_fills_empty_cells() {
        let summary = parse(
            "date,month,csat_percent,csat\n2025-01-10,,,80\n,2025-02,90,\n2025-03-01,,abc,60\n",
        )
        .unwrap();
        assert_eq!(summary.monthly.get(&month(1)), Some(&80.0));
        assert_eq!(summary.monthly.get(&month(2)), Some(&90.0));
        assert_eq!(summary.monthly.get(&month(3)), Some(&60.0));
        assert_eq!(summary.yearly_average, 76.67);
    }

    #[test]
    fn rows_outside_window_are_ignored() {
        let summary = parse("date,csat\n2024-12-31,10\n2025-05-01,90\n").unwrap();
        assert_eq!(summary.yearly_average, 90.0);
        assert!(!summary.monthly.contains_key(&MonthBucket::from_ym(2024, 12).unwrap()));
    }

    #[test]
    fn missing_percent_column_yields_none() {
        assert!(parse("date,score\n2025-01-01,5\n").is_none());
    }

    #[test]
    fn missing_date_column_counts_toward_year_only() {
        let summary = parse("csat_percentage\n80\n90\n").unwrap();
        assert_eq!(summary.yearly_average, 85.0);
        assert!(summary.monthly.is_empty());
    }

    #[test]
    fn no_valid_rows_yields_none() {
        assert!(parse("date,csat\n2025-01-01,\n").is_none());
    }

    #[tokio::test]
    async fn file_source_reads_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,csat_percent").unwrap();
        writeln!(file, "2025-04-15,88.5").unwrap();
        file.flush().unwrap();

        let source = CsvCsatSource::new(file.path());
        let summary = source.load(&window()).await.unwrap().unwrap();
        assert_eq!(summary.monthly.get(&month(4)), Some(&88.5));
        assert_eq!(source.name(), "csv-file");
    }

    #[tokio::test]
    async fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvCsatSource::new(dir.path().join("absent.csv"));
        assert!(source.load(&window()).await.unwrap().is_none());
    }
}
