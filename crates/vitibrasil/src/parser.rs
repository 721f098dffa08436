use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static RE_NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("invalid regex: non word"));

static SEL_DATA_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.tb_base.tb_dados").expect("invalid selector: data table")
});

static SEL_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: row"));

static SEL_HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("invalid selector: header cell"));

static SEL_DATA_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: data cell"));

/// Header and data rows of a report table, with every cell normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Removes every character that is neither a word character nor whitespace.
/// Whitespace is kept as is.
pub fn normalize_text(text: &str) -> String {
    RE_NON_WORD.replace_all(text, "").into_owned()
}

fn cell_text(element: ElementRef) -> String {
    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<String>();
    normalize_text(&text)
}

/// Finds the `tb_base tb_dados` table in a report page.
///
/// Returns `None` when the page carries no such table, or when the table has
/// no rows at all. Row 0 is the header (`th` or `td` cells), every later row
/// contributes its `td` cells.
pub fn parse_report_table(html: &str) -> Option<ParsedTable> {
    let document = Html::parse_document(html);
    let table = document.select(&SEL_DATA_TABLE).next()?;

    let mut rows = table.select(&SEL_ROW);
    let header = rows
        .next()?
        .select(&SEL_HEADER_CELL)
        .map(cell_text)
        .collect();

    let rows = rows
        .map(|row| row.select(&SEL_DATA_CELL).map(cell_text).collect())
        .collect();

    Some(ParsedTable { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_text_strips_punctuation() {
        assert_eq!(normalize_text("Vinho-Tinto (2020)!"), "VinhoTinto 2020");
        assert_eq!(normalize_text("Quantidade (L.)"), "Quantidade L");
        assert_eq!(normalize_text("217.208.604"), "217208604");
    }

    #[test]
    fn test_normalize_text_keeps_whitespace_and_accents() {
        assert_eq!(normalize_text("Uvas  de\tMesa"), "Uvas  de\tMesa");
        assert_eq!(normalize_text("Espumantes / Suco_de_uva"), "Espumantes  Suco_de_uva");
        assert_eq!(normalize_text("Comercialização"), "Comercialização");
    }

    #[test]
    fn test_normalize_text_is_idempotent() {
        for input in ["Vinho-Tinto (2020)!", "  a.b,c  ", "", "Ñandú - 3,5%"] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once);
        }
    }

    #[test]
    fn test_parse_report_table_from_fixture() {
        let html = fs::read_to_string("fixtures/producao_2022.html")
            .expect("Failed to read fixture");

        let table = parse_report_table(&html).expect("Should find the data table");

        assert_eq!(table.header, vec!["Produto", "Quantidade L"]);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0], vec!["VINHO DE MESA", "217208604"]);
        assert_eq!(table.rows[1], vec!["Tinto", "174224052"]);
        assert_eq!(table.rows[4], vec!["Total", "457792870"]);
    }

    #[test]
    fn test_parse_report_table_missing() {
        let html = fs::read_to_string("fixtures/no_table.html").expect("Failed to read fixture");

        assert_eq!(parse_report_table(&html), None);
    }

    #[test]
    fn test_parse_report_table_requires_both_classes() {
        let html = r#"
            <table class="tb_base"><tr><th>A</th></tr><tr><td>x</td></tr></table>
            <table class="tb_dados"><tr><th>B</th></tr><tr><td>y</td></tr></table>
        "#;
        assert_eq!(parse_report_table(html), None);

        let html = r#"
            <table class="tb_base"><tr><th>A</th></tr></table>
            <table class="tb_dados tb_base extra"><tr><th>B</th></tr><tr><td>y</td></tr></table>
        "#;
        let table = parse_report_table(html).expect("class order should not matter");
        assert_eq!(table.header, vec!["B"]);
        assert_eq!(table.rows, vec![vec!["y".to_string()]]);
    }

    #[test]
    fn test_parse_report_table_data_rows_ignore_th() {
        let html = r#"
            <table class="tb_base tb_dados">
                <tr><td>Produto</td><th>Valor (US$)</th></tr>
                <tr><th>skip</th><td> Brasil </td><td> 1.000 </td></tr>
            </table>
        "#;
        let table = parse_report_table(html).expect("Should find the data table");

        assert_eq!(table.header, vec!["Produto", "Valor US"]);
        assert_eq!(table.rows, vec![vec!["Brasil".to_string(), "1000".to_string()]]);
    }

    #[test]
    fn test_parse_report_table_joins_trimmed_fragments() {
        let html = r#"
            <table class="tb_base tb_dados">
                <tr><th>País</th></tr>
                <tr><td> Nova <b> Zelândia </b></td></tr>
            </table>
        "#;
        let table = parse_report_table(html).expect("Should find the data table");

        assert_eq!(table.rows, vec![vec!["NovaZelândia".to_string()]]);
    }

    #[test]
    fn test_parse_report_table_without_rows() {
        let html = r#"<table class="tb_base tb_dados"></table>"#;
        assert_eq!(parse_report_table(html), None);
    }
}
