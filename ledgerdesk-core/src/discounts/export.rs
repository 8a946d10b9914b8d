use std::io::Write;

use rust_decimal::Decimal;

use crate::discounts::summary::DiscountSummary;
use crate::months::MonthKey;

const HEADER: [&str; 13] = [
    "Customer",
    "Start Month",
    "Posted Count",
    "Reconciled Count",
    "Missing Count",
    "Missing Months",
    "Duplicate Months",
    "Total Discounts",
    "Average Monthly Discount",
    "Active Months",
    "Monthly Rebate",
    "Q Rent",
    "B Rent",
];

/// Writes one CSV row per customer summary, preceded by a header row.
pub fn write_summaries_csv<W: Write>(
    summaries: &[DiscountSummary],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for summary in summaries {
        csv_writer.write_record([
            summary.customer_name.clone(),
            summary.start_month.to_string(),
            summary.posted_months.len().to_string(),
            summary.reconciled_months.len().to_string(),
            summary.missing_months.len().to_string(),
            join_months(&summary.missing_months),
            join_months(&summary.duplicate_months),
            summary.total_discounts.to_string(),
            summary.average_monthly_discount.to_string(),
            summary.active_months_count.to_string(),
            rate(summary.monthly_rebate),
            rate(summary.q_rent),
            rate(summary.b_rent),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Renders summaries into an in-memory CSV document.
pub fn summaries_to_csv(summaries: &[DiscountSummary]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    write_summaries_csv(summaries, &mut buffer)?;
    Ok(buffer)
}

fn join_months(months: &[MonthKey]) -> String {
    months
        .iter()
        .map(MonthKey::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn rate(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
