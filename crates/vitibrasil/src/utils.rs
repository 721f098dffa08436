use std::collections::BTreeSet;

use crate::assembler::YEAR_FIELD;
use crate::types::{ScrapeOutcome, ScrapeRequest};

#[derive(Debug)]
pub struct ScrapeStats {
    pub records: usize,
    pub years_requested: usize,
    pub years_with_data: usize,
    pub failed_years: Vec<i32>,
}

impl ScrapeStats {
    pub fn from_outcome(request: &ScrapeRequest, outcome: &ScrapeOutcome) -> ScrapeStats {
        let years_with_data: BTreeSet<&str> = outcome
            .records
            .iter()
            .filter_map(|r| r.get(YEAR_FIELD).map(String::as_str))
            .collect();

        ScrapeStats {
            records: outcome.records.len(),
            years_requested: request.years().len(),
            years_with_data: years_with_data.len(),
            failed_years: outcome.failed_years.clone(),
        }
    }
}

impl std::fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Records:         {}", self.records)?;
        writeln!(f, "  Years requested: {}", self.years_requested)?;
        writeln!(f, "  Years with data: {}", self.years_with_data)?;
        if self.failed_years.is_empty() {
            writeln!(f, "  Failed years:    none")
        } else {
            let years = self
                .failed_years
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  Failed years:    {}", years)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, YearRange};

    fn row(year: &str) -> Record {
        Record::from([
            ("Produto".to_string(), "Tinto".to_string()),
            ("Ano".to_string(), year.to_string()),
        ])
    }

    #[test]
    fn test_stats_from_outcome() {
        let request = ScrapeRequest::new("producao", None, YearRange::new(2018, 2021)).unwrap();
        let outcome = ScrapeOutcome {
            records: vec![row("2018"), row("2018"), row("2020")],
            failed_years: vec![2019],
        };

        let stats = ScrapeStats::from_outcome(&request, &outcome);

        assert_eq!(stats.records, 3);
        assert_eq!(stats.years_requested, 4);
        assert_eq!(stats.years_with_data, 2);
        assert!(stats.to_string().contains("Failed years:    2019"));
    }
}
