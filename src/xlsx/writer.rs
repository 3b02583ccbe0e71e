use crate::error::Result;
use crate::grouping::UnidentifiedRow;
use crate::model::{
    AggregatedRow, ChurnRisk, PotentialSource, RegionCoverage, RiskLevel, SummaryTotals,
};
use crate::pipeline::{AmbiguousAddress, AnalysisResult, UnresolvedAddress};
use rust_xlsxwriter::{
    ConditionalFormat3ColorScale, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use std::path::Path;

/// Write the analysis report to an Excel file
pub fn write_report_to_xlsx(result: &AnalysisResult, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, &result.rows, &result.totals)?;

    let coverage_sheet = workbook.add_worksheet();
    write_coverage_sheet(coverage_sheet, &result.coverage)?;

    let churn_sheet = workbook.add_worksheet();
    write_churn_sheet(churn_sheet, &result.churn)?;

    let unidentified_sheet = workbook.add_worksheet();
    write_unidentified_sheet(
        unidentified_sheet,
        &result.unidentified,
        &result.ambiguous,
        &result.unresolved,
    )?;

    workbook.save(path)?;
    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border_bottom(FormatBorder::Thin)
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Fact and potential per (manager, brand, region), totals at the bottom
fn write_summary_sheet(
    sheet: &mut Worksheet,
    rows: &[AggregatedRow],
    totals: &SummaryTotals,
) -> Result<()> {
    sheet.set_column_width(0, 24)?; // Manager
    sheet.set_column_width(1, 16)?; // Brand
    sheet.set_column_width(2, 28)?; // Region
    sheet.set_column_width(3, 12)?; // Fact
    sheet.set_column_width(4, 12)?; // Potential
    sheet.set_column_width(5, 12)?; // Growth
    sheet.set_column_width(6, 10)?; // Growth %
    sheet.set_column_width(7, 10)?; // Clients
    sheet.set_column_width(8, 12)?; // Potential TT
    sheet.set_column_width(9, 12)?; // Source

    let headers = [
        "Manager", "Brand", "Region",
        "Fact", "Potential", "Growth", "Growth %",
        "Clients", "Potential TT", "Source",
    ];
    write_headers(sheet, &headers)?;

    let left_format = Format::new().set_align(FormatAlign::Left);
    let center_format = Format::new().set_align(FormatAlign::Center);
    let volume_format = Format::new().set_align(FormatAlign::Right).set_num_format("#,##0.00");
    let pct_format = Format::new().set_align(FormatAlign::Right).set_num_format("0.0");

    for (row_idx, agg) in rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string_with_format(row, 0, &agg.manager, &left_format)?;
        sheet.write_string_with_format(row, 1, &agg.brand, &left_format)?;
        sheet.write_string_with_format(row, 2, &agg.region, &left_format)?;
        sheet.write_number_with_format(row, 3, agg.fact, &volume_format)?;
        sheet.write_number_with_format(row, 4, agg.potential, &volume_format)?;
        sheet.write_number_with_format(row, 5, agg.growth_potential, &volume_format)?;
        sheet.write_number_with_format(row, 6, agg.growth_rate, &pct_format)?;
        sheet.write_number_with_format(row, 7, agg.client_count as f64, &center_format)?;
        sheet.write_number_with_format(row, 8, agg.potential_tt_count as f64, &center_format)?;
        let source = match agg.potential_source {
            PotentialSource::External => "external",
            PotentialSource::Estimated => "estimated",
            PotentialSource::Mixed => "mixed",
        };
        sheet.write_string_with_format(row, 9, source, &center_format)?;
    }

    if !rows.is_empty() {
        sheet.autofilter(0, 0, rows.len() as u32, (headers.len() - 1) as u16)?;
    }

    // Totals block two rows below the table
    let total_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Right)
        .set_border_top(FormatBorder::Thin)
        .set_num_format("#,##0.00");
    let label_format = Format::new().set_bold().set_border_top(FormatBorder::Thin);
    let row = rows.len() as u32 + 2;
    sheet.write_string_with_format(row, 0, "Total", &label_format)?;
    sheet.write_number_with_format(row, 3, totals.fact, &total_format)?;
    sheet.write_number_with_format(row, 4, totals.potential, &total_format)?;
    sheet.write_number_with_format(row, 5, totals.growth_potential, &total_format)?;

    let counts = [
        ("Clients", totals.client_count as f64),
        ("Unidentified rows", totals.unidentified_count as f64),
        ("Dropped rows", totals.dropped_rows as f64),
        ("Potential clients", totals.potential_count as f64),
        ("Covered", totals.covered_count as f64),
        ("Coverage %", totals.coverage_pct),
    ];
    for (offset, (label, value)) in counts.iter().enumerate() {
        let r = row + 1 + offset as u32;
        sheet.write_string(r, 0, *label)?;
        sheet.write_number_with_format(r, 3, *value, &pct_format)?;
    }

    sheet.set_name("Summary")?;
    Ok(())
}

fn write_coverage_sheet(sheet: &mut Worksheet, coverage: &[RegionCoverage]) -> Result<()> {
    sheet.set_column_width(0, 32)?; // Region
    sheet.set_column_width(1, 10)?; // Active
    sheet.set_column_width(2, 12)?; // Potential
    sheet.set_column_width(3, 10)?; // Covered
    sheet.set_column_width(4, 12)?; // Coverage %
    sheet.set_column_width(5, 8)?; // Gap

    let headers = ["Region", "Active", "Potential", "Covered", "Coverage %", "Gap"];
    write_headers(sheet, &headers)?;

    let left_format = Format::new().set_align(FormatAlign::Left);
    let center_format = Format::new().set_align(FormatAlign::Center);
    let pct_format = Format::new().set_align(FormatAlign::Right).set_num_format("0.0");

    for (row_idx, region) in coverage.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string_with_format(row, 0, &region.region, &left_format)?;
        sheet.write_number_with_format(row, 1, region.active_count as f64, &center_format)?;
        sheet.write_number_with_format(row, 2, region.potential_count as f64, &center_format)?;
        sheet.write_number_with_format(row, 3, region.covered_count as f64, &center_format)?;
        sheet.write_number_with_format(row, 4, region.coverage_pct, &pct_format)?;
        sheet.write_number_with_format(row, 5, region.gap as f64, &center_format)?;
    }

    // Red (low) -> Yellow (mid) -> Green (high)
    if !coverage.is_empty() {
        let last_row = coverage.len() as u32;
        sheet.autofilter(0, 0, last_row, (headers.len() - 1) as u16)?;
        let scale = ConditionalFormat3ColorScale::new()
            .set_minimum_color("F8696B")
            .set_midpoint_color("FFEB84")
            .set_maximum_color("63BE7B");
        sheet.add_conditional_format(1, 4, last_row, 4, &scale)?;
    }

    sheet.set_name("Coverage")?;
    Ok(())
}

fn write_churn_sheet(sheet: &mut Worksheet, risks: &[ChurnRisk]) -> Result<()> {
    sheet.set_column_width(0, 32)?; // Client
    sheet.set_column_width(1, 24)?; // Manager
    sheet.set_column_width(2, 28)?; // Region
    sheet.set_column_width(3, 8)?; // Category
    sheet.set_column_width(4, 10)?; // Days silent
    sheet.set_column_width(5, 10)?; // Avg gap
    sheet.set_column_width(6, 10)?; // Drop %
    sheet.set_column_width(7, 8)?; // Score
    sheet.set_column_width(8, 10)?; // Level
    sheet.set_column_width(9, 60)?; // Factors

    let headers = [
        "Client", "Manager", "Region", "Category",
        "Days silent", "Avg gap", "Drop %", "Score", "Level", "Factors",
    ];
    write_headers(sheet, &headers)?;

    let left_format = Format::new().set_align(FormatAlign::Left);
    let center_format = Format::new().set_align(FormatAlign::Center);
    let number_format = Format::new().set_align(FormatAlign::Right).set_num_format("0.0");
    let critical_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_font_color("C00000");

    for (row_idx, risk) in risks.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string_with_format(row, 0, &risk.client_name, &left_format)?;
        sheet.write_string_with_format(row, 1, &risk.manager, &left_format)?;
        sheet.write_string_with_format(row, 2, &risk.region, &left_format)?;
        sheet.write_string_with_format(row, 3, risk.category.to_string(), &center_format)?;
        sheet.write_number_with_format(row, 4, risk.days_since_last_order as f64, &center_format)?;
        sheet.write_number_with_format(row, 5, risk.avg_gap_days, &number_format)?;
        sheet.write_number_with_format(row, 6, risk.volume_drop_pct, &number_format)?;
        sheet.write_number_with_format(row, 7, risk.score, &center_format)?;
        let level_format = if risk.level == RiskLevel::Critical {
            &critical_format
        } else {
            &center_format
        };
        sheet.write_string_with_format(row, 8, risk.level.to_string(), level_format)?;
        sheet.write_string_with_format(row, 9, risk.factors.join("; "), &left_format)?;
    }

    if !risks.is_empty() {
        sheet.autofilter(0, 0, risks.len() as u32, (headers.len() - 1) as u16)?;
    }

    sheet.set_name("Churn")?;
    Ok(())
}

/// Rows without a usable address, then addresses with ambiguous cities,
/// then addresses that matched no region
fn write_unidentified_sheet(
    sheet: &mut Worksheet,
    unidentified: &[UnidentifiedRow],
    ambiguous: &[AmbiguousAddress],
    unresolved: &[UnresolvedAddress],
) -> Result<()> {
    sheet.set_column_width(0, 8)?; // Line
    sheet.set_column_width(1, 24)?; // Manager
    sheet.set_column_width(2, 40)?; // Address
    sheet.set_column_width(3, 12)?; // Volume
    sheet.set_column_width(4, 40)?; // Reason

    write_headers(sheet, &["Line", "Manager", "Address", "Volume", "Reason"])?;

    let center_format = Format::new().set_align(FormatAlign::Center);
    let volume_format = Format::new().set_align(FormatAlign::Right).set_num_format("#,##0.00");

    let mut row = 1u32;
    for item in unidentified {
        sheet.write_number_with_format(row, 0, item.row.line_number as f64, &center_format)?;
        sheet.write_string(row, 1, &item.row.manager)?;
        sheet.write_string(row, 2, item.row.address.as_deref().unwrap_or(""))?;
        sheet.write_number_with_format(row, 3, item.row.volume, &volume_format)?;
        sheet.write_string(row, 4, &item.reason)?;
        row += 1;
    }

    for item in ambiguous {
        sheet.write_string(row, 2, &item.address)?;
        sheet.write_string(row, 4, format!("ambiguous city: {}", item.candidates.join(", ")))?;
        row += 1;
    }

    for item in unresolved {
        sheet.write_string(row, 1, &item.manager)?;
        sheet.write_string(row, 2, &item.address)?;
        sheet.write_number_with_format(row, 3, item.fact, &volume_format)?;
        sheet.write_string(row, 4, "region not resolved")?;
        row += 1;
    }

    sheet.set_name("Unidentified")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::{run_analysis, AnalysisInput};
    use calamine::{open_workbook_auto, Reader};

    #[test]
    fn test_report_has_all_sheets() {
        let cells: Vec<Vec<String>> = [
            ["Менеджер", "Адрес", "Объем", "Дата"],
            ["Иванов", "г. Москва, ул. Ленина 1", "100", "01.01.2024"],
            ["Иванов", "г. Москва, ул. Ленина 1", "80", "11.01.2024"],
            ["Петров", "", "5", ""],
            ["Петров", "ул. Неизвестная 12", "7", ""],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();
        let result =
            run_analysis(&AnalysisInput::from_cells(cells), &AnalysisConfig::default(), |_| {})
                .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report_to_xlsx(&result, &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "Coverage", "Churn", "Unidentified"]
        );

        let range = workbook.worksheet_range("Unidentified").unwrap();
        let reasons: Vec<String> = range.rows().skip(1).map(|r| r[4].to_string()).collect();
        assert_eq!(reasons, vec!["no address or coordinates", "region not resolved"]);
    }
}
