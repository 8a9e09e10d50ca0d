//! Sub-region -> media market / state crosswalk.

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CatalogLoadError, Result};
use crate::models::CrosswalkRow;

/// Width of the state prefix on sub-region codes ("06" in "06037")
const STATE_PREFIX_LEN: usize = 2;

const COLUMNS: [&str; 6] = [
    "sub_region_code",
    "sub_region_name",
    "state_code",
    "state_numeric_id",
    "media_market_code",
    "media_market_name",
];

/// Crosswalk rows keyed by sub-region code, plus state id -> state code.
#[derive(Debug, Clone, Default)]
pub struct CrosswalkTable {
    rows: HashMap<String, CrosswalkRow>,
    states_by_numeric_id: HashMap<String, String>,
}

impl CrosswalkTable {
    /// Load a delimited crosswalk file (optionally gzipped).
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        info!("Loading crosswalk from {}", path.display());

        let file = File::open(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let table = Self::from_reader(reader, delimiter)?;
        if table.is_empty() {
            return Err(CatalogLoadError::EmptyCrosswalk(path.to_path_buf()));
        }
        Ok(table)
    }

    /// Parse crosswalk rows from any reader. Columns are located by header name.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut idx = [0usize; 6];
        for (slot, column) in idx.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or(CatalogLoadError::MissingColumn(column))?;
        }

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let field = |i: usize| record.get(idx[i]).unwrap_or_default().to_string();
            rows.push(CrosswalkRow {
                sub_region_code: field(0),
                sub_region_name: field(1),
                state_code: field(2),
                state_numeric_id: field(3),
                media_market_code: field(4),
                media_market_name: field(5),
            });
        }

        Ok(Self::from_rows(rows))
    }

    /// Build a table from rows. Rows without a sub-region or state code are
    /// skipped; a repeated sub-region code replaces the earlier row.
    pub fn from_rows(rows: impl IntoIterator<Item = CrosswalkRow>) -> Self {
        let mut table = Self::default();
        let mut skipped = 0usize;

        for mut row in rows {
            if row.sub_region_code.is_empty() || row.state_code.is_empty() {
                skipped += 1;
                continue;
            }
            row.state_numeric_id = normalize_numeric_id(&row.state_numeric_id);
            if !row.state_numeric_id.is_empty() {
                let previous = table
                    .states_by_numeric_id
                    .insert(row.state_numeric_id.clone(), row.state_code.clone());
                if let Some(previous) = previous.filter(|p| *p != row.state_code) {
                    warn!(
                        "State id {} maps to both {} and {}; keeping {}",
                        row.state_numeric_id, previous, row.state_code, row.state_code
                    );
                }
            }
            table.rows.insert(row.sub_region_code.clone(), row);
        }

        if skipped > 0 {
            debug!("Skipped {} crosswalk rows missing a sub-region or state code", skipped);
        }
        info!(
            "Crosswalk has {} sub-regions across {} states",
            table.rows.len(),
            table.states_by_numeric_id.len()
        );
        table
    }

    pub fn lookup(&self, sub_region_code: &str) -> Option<&CrosswalkRow> {
        self.rows.get(sub_region_code)
    }

    /// State code for a numeric state id such as "06" (or "6").
    pub fn state_for_numeric_prefix(&self, prefix: &str) -> Option<&str> {
        self.states_by_numeric_id
            .get(normalize_numeric_id(prefix).as_str())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Leading state digits of a sub-region code, if it starts with them.
pub fn numeric_prefix(sub_region_code: &str) -> Option<&str> {
    let prefix = sub_region_code.get(..STATE_PREFIX_LEN)?;
    prefix
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then_some(prefix)
}

/// Zero-pad purely numeric ids to the state prefix width; other ids pass through.
fn normalize_numeric_id(id: &str) -> String {
    let id = id.trim();
    if !id.is_empty() && id.len() < STATE_PREFIX_LEN && id.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>width$}", id, width = STATE_PREFIX_LEN)
    } else {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
sub_region_code,sub_region_name,state_code,state_numeric_id,media_market_code,media_market_name
06037,Los Angeles County,CA,06,803,Los Angeles
06075,San Francisco County,CA,6,807,San Francisco-Oakland-San Jose
36061,New York County,NY,36,501,New York
,Orphan,TX,48,623,Dallas-Ft. Worth
48113,Dallas County,,48,623,Dallas-Ft. Worth
36061,Manhattan,NY,36,501,New York City
";

    #[test]
    fn test_parse_rows() {
        let table = CrosswalkTable::from_reader(CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.len(), 3);

        let la = table.lookup("06037").unwrap();
        assert_eq!(la.media_market_code, "803");
        assert_eq!(la.media_market_name, "Los Angeles");
        assert_eq!(la.state_numeric_id, "06");
        assert!(table.lookup("99999").is_none());
    }

    #[test]
    fn test_skips_rows_missing_codes() {
        let table = CrosswalkTable::from_reader(CSV.as_bytes(), b',').unwrap();
        assert!(table.lookup("").is_none());
        assert!(table.lookup("48113").is_none());
        // The skipped rows must not register their state id either
        assert_eq!(table.state_for_numeric_prefix("48"), None);
    }

    #[test]
    fn test_duplicate_code_last_write_wins() {
        let table = CrosswalkTable::from_reader(CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.lookup("36061").unwrap().sub_region_name, "Manhattan");
    }

    #[test]
    fn test_state_for_numeric_prefix() {
        let table = CrosswalkTable::from_reader(CSV.as_bytes(), b',').unwrap();
        assert_eq!(table.state_for_numeric_prefix("06"), Some("CA"));
        assert_eq!(table.state_for_numeric_prefix("6"), Some("CA"));
        assert_eq!(table.state_for_numeric_prefix("36"), Some("NY"));
        assert_eq!(table.state_for_numeric_prefix("01"), None);
    }

    #[test]
    fn test_conflicting_state_id_keeps_last_row() {
        let csv = "sub_region_code,sub_region_name,state_code,state_numeric_id,media_market_code,media_market_name\n\
                   06037,Los Angeles,CA,06,803,Los Angeles\n\
                   06075,San Francisco,NV,6,807,San Francisco\n";
        let table = CrosswalkTable::from_reader(csv.as_bytes(), b',').unwrap();
        assert_eq!(table.state_for_numeric_prefix("06"), Some("NV"));
        // Rows themselves are untouched
        assert_eq!(table.lookup("06037").unwrap().state_code, "CA");
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("06037"), Some("06"));
        assert_eq!(numeric_prefix("6"), None);
        assert_eq!(numeric_prefix("CA-12"), None);
        assert_eq!(numeric_prefix("é1234"), None);
    }

    #[test]
    fn test_missing_column() {
        let err = CrosswalkTable::from_reader("sub_region_code,state_code\n1,CA\n".as_bytes(), b',')
            .unwrap_err();
        assert!(matches!(err, CatalogLoadError::MissingColumn("sub_region_name")));
    }

    #[test]
    fn test_tab_delimited_with_reordered_columns() {
        let tsv = "state_code\tmedia_market_name\tmedia_market_code\tsub_region_code\tstate_numeric_id\tsub_region_name\n\
                   WA\tSeattle-Tacoma\t819\t53033\t53\tKing County\n";
        let table = CrosswalkTable::from_reader(tsv.as_bytes(), b'\t').unwrap();
        let row = table.lookup("53033").unwrap();
        assert_eq!(row.state_code, "WA");
        assert_eq!(row.media_market_code, "819");
        assert_eq!(row.sub_region_name, "King County");
    }

    #[test]
    fn test_load_from_file_and_gzip() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("crosswalk.csv");
        std::fs::write(&plain, CSV).unwrap();
        assert_eq!(CrosswalkTable::load(&plain, b',').unwrap().len(), 3);

        let gz = dir.path().join("crosswalk.csv.gz");
        let mut encoder =
            flate2::write::GzEncoder::new(File::create(&gz).unwrap(), flate2::Compression::default());
        encoder.write_all(CSV.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(CrosswalkTable::load(&gz, b',').unwrap().len(), 3);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            CrosswalkTable::load(&missing, b','),
            Err(CatalogLoadError::Io { .. })
        ));

        let header_only = dir.path().join("empty.csv");
        std::fs::write(&header_only, COLUMNS.join(",")).unwrap();
        assert!(matches!(
            CrosswalkTable::load(&header_only, b','),
            Err(CatalogLoadError::EmptyCrosswalk(_))
        ));
    }
}
