use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_START_YEAR: i32 = 1970;
pub const DEFAULT_END_YEAR: i32 = 2023;

/// One output row: column name to cell value.
///
/// Keys serialize in sorted order, which is what consumers of the JSON API
/// have always received.
pub type Record = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(
        "Invalid category '{0}'. Accepted values: 'producao', 'processamento', 'comercializacao', 'importacao', 'exportacao'"
    )]
    InvalidCategory(String),
    #[error("Invalid subcategory '{subcategory}' for category '{category}'. Accepted values: {accepted}")]
    InvalidSubcategory {
        category: Category,
        subcategory: String,
        accepted: String,
    },
    #[error("Category '{category}' requires a subcategory. Accepted values: {accepted}")]
    MissingSubcategory { category: Category, accepted: String },
    #[error("Category '{category}' does not take a subcategory (got '{subcategory}')")]
    UnexpectedSubcategory {
        category: Category,
        subcategory: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Producao,
    Processamento,
    Comercializacao,
    Importacao,
    Exportacao,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Producao,
        Category::Processamento,
        Category::Comercializacao,
        Category::Importacao,
        Category::Exportacao,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Producao => "producao",
            Category::Processamento => "processamento",
            Category::Comercializacao => "comercializacao",
            Category::Importacao => "importacao",
            Category::Exportacao => "exportacao",
        }
    }

    /// The `opcao` query value the site uses for this report.
    pub fn option_code(&self) -> &'static str {
        match self {
            Category::Producao => "opt_02",
            Category::Processamento => "opt_03",
            Category::Comercializacao => "opt_04",
            Category::Importacao => "opt_05",
            Category::Exportacao => "opt_06",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Producao => "Produção",
            Category::Processamento => "Processamento",
            Category::Comercializacao => "Comercialização",
            Category::Importacao => "Importação",
            Category::Exportacao => "Exportação",
        }
    }

    /// Subcategories accepted by this category. Empty means the category
    /// takes none.
    pub fn subcategories(&self) -> &'static [Subcategory] {
        use Subcategory::*;

        match self {
            Category::Producao | Category::Comercializacao => &[],
            Category::Processamento => {
                &[Viniferas, AmericanasHibridas, UvasDeMesa, SemClassificacao]
            }
            Category::Importacao => &[VinhosDeMesa, Espumantes, UvasFrescas, UvasPassas, SucoDeUva],
            Category::Exportacao => &[VinhosDeMesa, Espumantes, UvasFrescas, SucoDeUva],
        }
    }

    pub fn has_subcategories(&self) -> bool {
        !self.subcategories().is_empty()
    }

    fn accepted_subcategories(&self) -> String {
        self.subcategories()
            .iter()
            .map(|s| format!("'{}'", s.key()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_string()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subcategory {
    Viniferas,
    AmericanasHibridas,
    UvasDeMesa,
    SemClassificacao,
    VinhosDeMesa,
    Espumantes,
    UvasFrescas,
    UvasPassas,
    SucoDeUva,
}

impl Subcategory {
    pub fn key(&self) -> &'static str {
        match self {
            Subcategory::Viniferas => "viniferas",
            Subcategory::AmericanasHibridas => "americanas_hibridas",
            Subcategory::UvasDeMesa => "uvas_de_mesa",
            Subcategory::SemClassificacao => "sem_classificacao",
            Subcategory::VinhosDeMesa => "vinhos_de_mesa",
            Subcategory::Espumantes => "espumantes",
            Subcategory::UvasFrescas => "uvas_frescas",
            Subcategory::UvasPassas => "uvas_passas",
            Subcategory::SucoDeUva => "suco_de_uva",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Subcategory::Viniferas => "Viníferas",
            Subcategory::AmericanasHibridas => "Americanas e Híbridas",
            Subcategory::UvasDeMesa => "Uvas de Mesa",
            Subcategory::SemClassificacao => "Sem Classificação",
            Subcategory::VinhosDeMesa => "Vinhos de Mesa",
            Subcategory::Espumantes => "Espumantes",
            Subcategory::UvasFrescas => "Uvas Frescas",
            Subcategory::UvasPassas => "Uvas Passas",
            Subcategory::SucoDeUva => "Suco de Uva",
        }
    }
}

impl Display for Subcategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A category and its subcategories, as listed to API and CLI users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub subcategories: Vec<SubcategoryInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryInfo {
    pub key: &'static str,
    pub label: &'static str,
}

impl From<Category> for CategoryInfo {
    fn from(category: Category) -> Self {
        Self {
            key: category.key(),
            label: category.label(),
            subcategories: category
                .subcategories()
                .iter()
                .map(|sub| SubcategoryInfo {
                    key: sub.key(),
                    label: sub.label(),
                })
                .collect(),
        }
    }
}

/// Every category in site order.
pub fn catalog() -> Vec<CategoryInfo> {
    Category::ALL.into_iter().map(CategoryInfo::from).collect()
}

/// Inclusive range of report years. `start > end` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.end) - i64::from(self.start) + 1) as usize
        }
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(DEFAULT_START_YEAR, DEFAULT_END_YEAR)
    }
}

impl Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A category, subcategory and year range that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeRequest {
    category: Category,
    subcategory: Option<Subcategory>,
    years: YearRange,
}

impl ScrapeRequest {
    pub fn new(
        category: &str,
        subcategory: Option<&str>,
        years: YearRange,
    ) -> Result<Self, ValidationError> {
        let category: Category = category.parse()?;
        let subcategory = Self::resolve_subcategory(category, subcategory)?;

        Ok(Self {
            category,
            subcategory,
            years,
        })
    }

    fn resolve_subcategory(
        category: Category,
        subcategory: Option<&str>,
    ) -> Result<Option<Subcategory>, ValidationError> {
        match (category.has_subcategories(), subcategory) {
            (false, None) => Ok(None),
            (false, Some(sub)) => Err(ValidationError::UnexpectedSubcategory {
                category,
                subcategory: sub.to_string(),
            }),
            (true, None) => Err(ValidationError::MissingSubcategory {
                category,
                accepted: category.accepted_subcategories(),
            }),
            (true, Some(sub)) => category
                .subcategories()
                .iter()
                .find(|s| s.key() == sub)
                .copied()
                .map(Some)
                .ok_or_else(|| ValidationError::InvalidSubcategory {
                    category,
                    subcategory: sub.to_string(),
                    accepted: category.accepted_subcategories(),
                }),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn subcategory(&self) -> Option<Subcategory> {
        self.subcategory
    }

    pub fn years(&self) -> YearRange {
        self.years
    }
}

impl Display for ScrapeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(sub) = self.subcategory {
            write!(f, "/{}", sub)?;
        }
        write!(f, " [{}]", self.years)
    }
}

/// Records extracted by a scrape, plus the years whose page could not be
/// fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub records: Vec<Record>,
    pub failed_years: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_category_key() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_parse_unknown_category() {
        let err = "invalid".parse::<Category>().unwrap_err();
        assert_eq!(err, ValidationError::InvalidCategory("invalid".into()));
    }

    #[test]
    fn test_request_without_subcategory() {
        let req = ScrapeRequest::new("producao", None, YearRange::new(2020, 2021))
            .expect("producao takes no subcategory");
        assert_eq!(req.category(), Category::Producao);
        assert_eq!(req.subcategory(), None);
    }

    #[test]
    fn test_request_with_subcategory() {
        let req = ScrapeRequest::new("processamento", Some("viniferas"), YearRange::default())
            .expect("viniferas is valid for processamento");
        assert_eq!(req.subcategory(), Some(Subcategory::Viniferas));
        assert_eq!(req.years(), YearRange::new(1970, 2023));
    }

    #[test]
    fn test_request_requires_subcategory() {
        let err = ScrapeRequest::new("importacao", None, YearRange::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingSubcategory {
                category: Category::Importacao,
                ..
            }
        ));
    }

    #[test]
    fn test_request_rejects_subcategory_of_other_category() {
        // uvas_passas is only imported, never exported
        let err =
            ScrapeRequest::new("exportacao", Some("uvas_passas"), YearRange::default()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSubcategory { .. }));
        assert!(err.to_string().contains("'suco_de_uva'"));
    }

    #[test]
    fn test_request_rejects_unexpected_subcategory() {
        let err = ScrapeRequest::new("comercializacao", Some("espumantes"), YearRange::default())
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnexpectedSubcategory { .. }));
    }

    #[test]
    fn test_catalog() {
        let catalog = catalog();

        let keys: Vec<_> = catalog.iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            ["producao", "processamento", "comercializacao", "importacao", "exportacao"]
        );
        let import = &catalog[3];
        assert_eq!(import.label, "Importação");
        assert_eq!(import.subcategories.len(), 5);
        assert_eq!(
            import.subcategories[3],
            SubcategoryInfo {
                key: "uvas_passas",
                label: "Uvas Passas",
            }
        );
        assert!(catalog[0].subcategories.is_empty());
    }

    #[test]
    fn test_year_range_len() {
        assert_eq!(YearRange::new(2020, 2022).len(), 3);
        assert_eq!(YearRange::new(2020, 2020).len(), 1);
        assert_eq!(YearRange::new(2023, 2020).len(), 0);
        assert!(YearRange::new(2023, 2020).years().next().is_none());
    }
}
