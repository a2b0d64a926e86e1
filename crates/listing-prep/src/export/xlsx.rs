//! Workbook rendering of a processed batch.

use super::plan::{ExportPlan, Highlight, RowStyle};
use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result};
use crate::pricing::{BAND_COLUMNS, ShippingTable};
use crate::types::{
    BASE_COLUMNS, BRAND, COST_PRICE, HANDLING_COST, ITEM_LOCATION, MAX_PRICE, MIN_PRICE,
    PRICE_COLUMNS, ProductRecord, QUANTITY, RETAIL_PRICE, SHIPPING_COST, SKU, TITLE, UPC, WEIGHT,
};
use crate::utils::column_letter;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

pub const DATA_SHEET: &str = "Consolidated Data";
pub const LEGEND_SHEET: &str = "ShippingLegend";

const PRICE_FORMAT: &str = "0.00";
const SHIPPING_FORMAT: &str = "0.0";

enum CellValue<'r> {
    Text(&'r str),
    Number(Option<f64>),
    Integer(u32),
}

#[derive(Clone, Copy)]
enum NumberStyle {
    General,
    Price,
    Shipping,
}

/// One format per (number style, highlight) pair.
struct CellFormats {
    header: Format,
    cells: Vec<((u8, Option<Highlight>), Format)>,
}

impl CellFormats {
    fn new() -> Self {
        let mut cells = Vec::new();
        for highlight in [None, Some(Highlight::MissingWeight), Some(Highlight::LowRetailPrice)] {
            for (key, num_format) in [(0u8, None), (1, Some(PRICE_FORMAT)), (2, Some(SHIPPING_FORMAT))] {
                let mut format = Format::new();
                if let Some(num_format) = num_format {
                    format = format.set_num_format(num_format);
                }
                if let Some(highlight) = highlight {
                    format = format.set_background_color(Color::RGB(highlight.fill_rgb()));
                }
                cells.push(((key, highlight), format));
            }
        }

        Self {
            header: Format::new().set_bold(),
            cells,
        }
    }

    fn get(&self, style: NumberStyle, highlight: Option<Highlight>) -> &Format {
        let key = match style {
            NumberStyle::General => 0,
            NumberStyle::Price => 1,
            NumberStyle::Shipping => 2,
        };
        self.cells
            .iter()
            .find(|(k, _)| *k == (key, highlight))
            .map(|(_, format)| format)
            .unwrap_or(&self.header)
    }
}

/// Renders a batch as a workbook: the data sheet plus, when a band table is
/// present, a `ShippingLegend` sheet the lookup formulas read from.
pub struct XlsxExporter<'a> {
    config: &'a ProcessingConfig,
    shipping: Option<&'a ShippingTable>,
}

impl<'a> XlsxExporter<'a> {
    pub fn new(config: &'a ProcessingConfig, shipping: Option<&'a ShippingTable>) -> Self {
        Self { config, shipping }
    }

    /// Build the plan for `records` and write the workbook.
    pub fn export(
        &self,
        records: &[ProductRecord],
        with_pricing: bool,
        path: impl AsRef<Path>,
    ) -> Result<ExportPlan> {
        let plan = ExportPlan::new(records, with_pricing, self.config.low_price_threshold);
        self.write(records, &plan, path)?;
        Ok(plan)
    }

    pub fn write(
        &self,
        records: &[ProductRecord],
        plan: &ExportPlan,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        if plan.rows.len() != records.len() {
            return Err(ProcessingError::Export(format!(
                "plan has {} rows for {} records",
                plan.rows.len(),
                records.len()
            )));
        }

        let headers = headers(plan.with_pricing);
        let formats = CellFormats::new();
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name(DATA_SHEET)?;
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
        }

        let formulas = self.formula_columns(&headers);
        for (idx, (record, style)) in records.iter().zip(&plan.rows).enumerate() {
            let row = idx as u32 + 1;
            self.write_row(sheet, row, &headers, record, *style, formulas.as_ref(), &formats)?;
        }

        if let Some(table) = self.shipping {
            let legend = workbook.add_worksheet();
            legend.set_name(LEGEND_SHEET)?;
            for (col, header) in BAND_COLUMNS.iter().enumerate() {
                legend.write_string_with_format(0, col as u16, *header, &formats.header)?;
            }
            for (idx, band) in table.bands().iter().enumerate() {
                let row = idx as u32 + 1;
                legend.write_number(row, 0, band.min_weight)?;
                legend.write_number(row, 1, band.max_weight)?;
                legend.write_number(row, 2, band.cost)?;
            }
        }

        workbook.save(path.as_ref())?;
        info!(
            "Wrote {} rows to {} ({} missing weight, {} low price)",
            records.len(),
            path.as_ref().display(),
            plan.count(Highlight::MissingWeight),
            plan.count(Highlight::LowRetailPrice)
        );
        Ok(())
    }

    /// Column letters the formulas reference, when price columns exist.
    fn formula_columns(&self, headers: &[&str]) -> Option<FormulaColumns> {
        let letter = |name: &str| headers.iter().position(|h| *h == name).map(column_letter);
        Some(FormulaColumns {
            cost: letter(COST_PRICE)?,
            handling: letter(HANDLING_COST)?,
            weight: letter(WEIGHT)?,
            shipping: letter(SHIPPING_COST)?,
            retail: letter(RETAIL_PRICE)?,
            min: letter(MIN_PRICE)?,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn write_row(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        headers: &[&str],
        record: &ProductRecord,
        style: RowStyle,
        formulas: Option<&FormulaColumns>,
        formats: &CellFormats,
    ) -> Result<()> {
        let excel_row = row + 1;

        for (col, header) in headers.iter().enumerate() {
            let col = col as u16;
            let number_style = match *header {
                SHIPPING_COST => NumberStyle::Shipping,
                COST_PRICE | HANDLING_COST | WEIGHT | RETAIL_PRICE | MIN_PRICE | MAX_PRICE => {
                    NumberStyle::Price
                }
                _ => NumberStyle::General,
            };
            let format = formats.get(number_style, style.highlight);

            if style.live_formulas
                && let Some(cols) = formulas
                && let Some(formula) = self.price_formula(header, cols, excel_row)
            {
                sheet.write_formula_with_format(row, col, formula.as_str(), format)?;
                continue;
            }

            match cell_value(record, header) {
                CellValue::Text(text) => {
                    sheet.write_string_with_format(row, col, text, format)?;
                }
                CellValue::Number(Some(value)) => {
                    sheet.write_number_with_format(row, col, value, format)?;
                }
                CellValue::Number(None) => {
                    sheet.write_blank(row, col, format)?;
                }
                CellValue::Integer(value) => {
                    sheet.write_number_with_format(row, col, value, format)?;
                }
            }
        }
        Ok(())
    }

    /// Spreadsheet formula for a price column of a missing-weight row.
    fn price_formula(&self, header: &str, c: &FormulaColumns, r: u32) -> Option<String> {
        let formula = match header {
            SHIPPING_COST => format!(
                "=IF(ISBLANK({w}{r}),\"\",ROUND(VLOOKUP({w}{r},{LEGEND_SHEET}!A:C,3,TRUE),1))",
                w = c.weight
            ),
            RETAIL_PRICE => format!(
                "=IF(AND({cp}{r}<>\"\",{h}{r}<>\"\",{s}{r}<>\"\"),ROUND(({cp}{r}+{h}{r}+{s}{r})*{m},2),\"\")",
                cp = c.cost,
                h = c.handling,
                s = c.shipping,
                m = self.config.retail_markup
            ),
            MIN_PRICE => format!("={}{}", c.retail, r),
            MAX_PRICE => format!(
                "=IF({mn}{r}<>\"\",ROUND({mn}{r}*{m},2),\"\")",
                mn = c.min,
                m = self.config.max_price_markup
            ),
            _ => return None,
        };
        Some(formula)
    }
}

struct FormulaColumns {
    cost: String,
    handling: String,
    weight: String,
    shipping: String,
    retail: String,
    min: String,
}

fn headers(with_pricing: bool) -> Vec<&'static str> {
    let mut headers = BASE_COLUMNS.to_vec();
    if with_pricing {
        headers.extend(PRICE_COLUMNS);
    }
    headers
}

fn cell_value<'r>(record: &'r ProductRecord, header: &str) -> CellValue<'r> {
    match header {
        TITLE => CellValue::Text(&record.title),
        BRAND => CellValue::Text(&record.brand),
        SKU => CellValue::Text(&record.sku),
        UPC => CellValue::Text(&record.upc),
        COST_PRICE => CellValue::Number(record.cost_price),
        HANDLING_COST => CellValue::Number(Some(record.handling_cost)),
        QUANTITY => CellValue::Integer(record.quantity),
        ITEM_LOCATION => CellValue::Text(&record.item_location),
        WEIGHT => CellValue::Number(record.weight_lb),
        SHIPPING_COST => CellValue::Number(record.shipping_cost()),
        RETAIL_PRICE => CellValue::Number(record.retail_price()),
        MIN_PRICE => CellValue::Number(record.pricing.and_then(|p| p.min_price)),
        MAX_PRICE => CellValue::Number(record.pricing.and_then(|p| p.max_price)),
        _ => CellValue::Number(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::ShippingBand;

    fn config() -> ProcessingConfig {
        ProcessingConfig::default()
    }

    fn columns() -> FormulaColumns {
        let headers = headers(true);
        XlsxExporter::new(&ProcessingConfig::default(), None)
            .formula_columns(&headers)
            .unwrap()
    }

    #[test]
    fn test_formula_columns_follow_layout() {
        let c = columns();
        assert_eq!(c.cost, "E");
        assert_eq!(c.handling, "F");
        assert_eq!(c.weight, "I");
        assert_eq!(c.shipping, "J");
        assert_eq!(c.retail, "K");
        assert_eq!(c.min, "L");
    }

    #[test]
    fn test_no_formula_columns_without_pricing() {
        let headers = headers(false);
        let config = config();
        assert!(XlsxExporter::new(&config, None).formula_columns(&headers).is_none());
    }

    #[test]
    fn test_price_formulas() {
        let config = config();
        let exporter = XlsxExporter::new(&config, None);
        let c = columns();

        assert_eq!(
            exporter.price_formula(SHIPPING_COST, &c, 7).unwrap(),
            "=IF(ISBLANK(I7),\"\",ROUND(VLOOKUP(I7,ShippingLegend!A:C,3,TRUE),1))"
        );
        assert_eq!(
            exporter.price_formula(RETAIL_PRICE, &c, 7).unwrap(),
            "=IF(AND(E7<>\"\",F7<>\"\",J7<>\"\"),ROUND((E7+F7+J7)*1.35,2),\"\")"
        );
        assert_eq!(exporter.price_formula(MIN_PRICE, &c, 7).unwrap(), "=K7");
        assert_eq!(
            exporter.price_formula(MAX_PRICE, &c, 7).unwrap(),
            "=IF(L7<>\"\",ROUND(L7*1.35,2),\"\")"
        );
        assert!(exporter.price_formula(TITLE, &c, 7).is_none());
    }

    #[test]
    fn test_export_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let config = config();
        let table = ShippingTable::new(vec![ShippingBand::new(0.0, 1.0, 5.0)], true).unwrap();

        let records = vec![ProductRecord {
            title: "Gift Card".to_string(),
            brand: "A".to_string(),
            sku: "1".to_string(),
            upc: "000000000001".to_string(),
            cost_price: Some(1.0),
            handling_cost: 0.75,
            quantity: 1,
            item_location: "WALMART".to_string(),
            weight_lb: None,
            pricing: Some(Default::default()),
        }];

        let plan = XlsxExporter::new(&config, Some(&table))
            .export(&records, true, &path)
            .unwrap();
        assert!(plan.rows[0].live_formulas);
        assert!(path.exists());
    }

    #[test]
    fn test_mismatched_plan_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config();
        let plan = ExportPlan {
            with_pricing: false,
            rows: vec![RowStyle::default()],
        };
        let err = XlsxExporter::new(&config, None)
            .write(&[], &plan, dir.path().join("out.xlsx"))
            .unwrap_err();
        assert_eq!(err.error_code(), "EXPORT_FAILED");
    }
}
