use crate::domain::model::InputRecord;
use crate::utils::error::Result;
use std::path::Path;

/// 視為「缺值」的儲存格內容 (與 pandas 預設的 NA 字串相同)
const MISSING_SENTINELS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 依副檔名決定分隔字元：`.tsv` 用 tab，其他都當作 CSV
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(raw.to_string())
    }
}

#[derive(Debug, Default)]
struct ColumnIndex {
    email: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    company_name: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut index = Self::default();
        for (position, name) in headers.iter().enumerate() {
            let slot = match name.trim() {
                "email" => &mut index.email,
                "firstName" => &mut index.first_name,
                "lastName" => &mut index.last_name,
                "companyName" => &mut index.company_name,
                _ => continue,
            };
            // 重複欄名時以第一個為準
            if slot.is_none() {
                *slot = Some(position);
            }
        }
        index
    }

    fn read(&self, row: &csv::StringRecord) -> InputRecord {
        let field = |position: Option<usize>| {
            position
                .and_then(|p| row.get(p))
                .and_then(normalize_cell)
        };

        InputRecord {
            email: field(self.email),
            first_name: field(self.first_name),
            last_name: field(self.last_name),
            company_name: field(self.company_name),
        }
    }
}

/// Parses the contact table. Unknown columns are ignored and missing
/// columns leave the field absent on every row.
pub fn read_records(data: &[u8], delimiter: u8) -> Result<Vec<InputRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let columns = ColumnIndex::from_headers(reader.headers()?);
    tracing::debug!("Recognized input columns: {:?}", columns);

    let mut records = Vec::new();
    for row in reader.records() {
        records.push(columns.read(&row?));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_with_all_columns() {
        let data = b"email,firstName,lastName,companyName,notes\n\
a@b.com,Ada,Lovelace,Analytical,ignored\n\
,Grace,,Navy,\n";

        let records = read_records(data, b',').unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].email.as_deref(), Some("a@b.com"));
        assert_eq!(records[0].company_name.as_deref(), Some("Analytical"));
        assert_eq!(records[1].email, None);
        assert_eq!(records[1].first_name.as_deref(), Some("Grace"));
        assert_eq!(records[1].last_name, None);
    }

    #[test]
    fn test_missing_columns_are_absent() {
        let data = b"lastName,title\nHopper,Rear Admiral\n";

        let records = read_records(data, b',').unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, None);
        assert_eq!(records[0].first_name, None);
        assert_eq!(records[0].last_name.as_deref(), Some("Hopper"));
    }

    #[test]
    fn test_nan_sentinels_and_blank_cells_are_absent() {
        let data = b"email,firstName,lastName,companyName\nNaN,  ,null,N/A\n,,,\n";

        let records = read_records(data, b',').unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| *r == InputRecord::default()));
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        let data = b"email,firstName,lastName\nx@y.com\n";

        let records = read_records(data, b',').unwrap();

        assert_eq!(records[0].email.as_deref(), Some("x@y.com"));
        assert_eq!(records[0].last_name, None);
    }

    #[test]
    fn test_tab_delimited_input() {
        let data = b"firstName\tlastName\nAlan\tTuring\n";

        let records = read_records(data, delimiter_for(Path::new("people.TSV"))).unwrap();

        assert_eq!(records[0].first_name.as_deref(), Some("Alan"));
        assert_eq!(records[0].last_name.as_deref(), Some("Turing"));
        assert_eq!(delimiter_for(Path::new("people.csv")), b',');
    }
}
