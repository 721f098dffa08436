use crate::parser::ParsedTable;
use crate::types::{Record, ScrapeRequest};

pub const YEAR_FIELD: &str = "Ano";
pub const CATEGORY_FIELD: &str = "Categoria";
pub const SUBCATEGORY_FIELD: &str = "Subcategoria";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Row {row} has {found} cells but the header has {expected} columns")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Accumulates the rows of every year of one scrape.
///
/// The header is taken from the first table pushed and then kept for the rest
/// of the scrape, later header rows are ignored.
#[derive(Debug)]
pub struct RowAssembler {
    request: ScrapeRequest,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl RowAssembler {
    pub fn new(request: ScrapeRequest) -> Self {
        Self {
            request,
            header: None,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn push_table(&mut self, year: i32, table: ParsedTable) {
        let ParsedTable { header, rows } = table;

        if self.header.is_none() {
            let mut header = header;
            header.push(YEAR_FIELD.to_string());
            header.push(CATEGORY_FIELD.to_string());
            if self.request.subcategory().is_some() {
                header.push(SUBCATEGORY_FIELD.to_string());
            }
            log::debug!("Header fixed from {}: {:?}", year, header);
            self.header = Some(header);
        }

        let category = self.request.category();
        let subcategory = self.request.subcategory();

        self.rows.extend(rows.into_iter().map(|mut row| {
            row.push(year.to_string());
            row.push(category.key().to_string());
            if let Some(sub) = subcategory {
                row.push(sub.key().to_string());
            }
            row
        }));
    }

    pub fn into_records(self) -> Result<Vec<Record>, ExtractionError> {
        match self.header {
            Some(header) => build_records(&header, self.rows),
            None => Ok(Vec::new()),
        }
    }
}

/// Zips every row with the header. A row whose length differs from the
/// header is rejected rather than truncated or padded.
pub fn build_records(
    header: &[String],
    rows: Vec<Vec<String>>,
) -> Result<Vec<Record>, ExtractionError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != header.len() {
                return Err(ExtractionError::RowLengthMismatch {
                    row: i,
                    expected: header.len(),
                    found: row.len(),
                });
            }
            Ok(header.iter().cloned().zip(row).collect::<Record>())
        })
        .collect()
}
