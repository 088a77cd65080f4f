//! Writes sample tender and estimate sheets for the dashboard.
//!
//! Usage: `generate_sample [OUTPUT_DIR]` (defaults to the working directory).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tender_dash::data::pipeline::format_grouped;

/// Whole-number string with `,` separators, as spreadsheets export them.
fn whole(v: f64) -> String {
    format_grouped(v, 0)
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One tender line, amounts in lakhs.
struct TenderRow {
    tn_no: String,
    work: String,
    contractor: String,
    as_lakhs: f64,
    cv_lakhs: f64,
    bt_pct: f64,
    status: String,
}

fn tender_rows(rng: &mut SimpleRng) -> Vec<TenderRow> {
    let contractors = ["Apex Builders", "Sri Ram Constructions", "Kaveri Infra", "Delta Works"];
    let works = ["Road resurfacing", "Drain repair", "Roof restoration", "Compound wall", "Culvert"];
    let statuses = ["Awarded", "Under evaluation", "Completed"];

    let mut rows = Vec::new();
    for tn in 1..=8 {
        let lots = 2 + (rng.next_u64() % 4) as usize;
        for _ in 0..lots {
            let as_lakhs = (rng.range(8.0, 120.0) * 100.0).round() / 100.0;
            let bt_pct = (rng.range(-12.0, 9.0) * 100.0).round() / 100.0;
            rows.push(TenderRow {
                tn_no: format!("TN-{tn:02}"),
                work: rng.pick(&works).to_string(),
                contractor: rng.pick(&contractors).to_string(),
                as_lakhs,
                cv_lakhs: (as_lakhs * (1.0 + bt_pct / 100.0) * 100.0).round() / 100.0,
                bt_pct,
                status: rng.pick(&statuses).to_string(),
            });
        }
    }
    rows
}

fn write_tender_csv(path: &Path, rows: &[TenderRow]) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "Sl.No", " TN No ", "Name of Work", "Contractor", "AS (L)", "EW", "BT", "BT Percentage",
        "GST", "Contingencies", "CV", "CV (L)", "Status",
    ])?;
    for (i, r) in rows.iter().enumerate() {
        let cv = r.cv_lakhs * 100_000.0;
        w.write_record([
            (i + 1).to_string(),
            r.tn_no.clone(),
            r.work.clone(),
            r.contractor.clone(),
            format!("{:.2}", r.as_lakhs),
            whole(r.as_lakhs * 70_000.0),
            whole(cv * 0.8),
            format!("{:.2}%", r.bt_pct),
            whole(cv * 0.18),
            whole(cv * 0.02),
            whole(cv),
            format!("{:.2}", r.cv_lakhs),
            r.status.clone(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_tender_parquet(path: &Path, rows: &[TenderRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("TN No", DataType::Utf8, false),
        Field::new("Name of Work", DataType::Utf8, false),
        Field::new("Contractor", DataType::Utf8, false),
        Field::new("AS (L)", DataType::Float64, false),
        Field::new("CV (L)", DataType::Float64, false),
        Field::new("Status", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.iter().map(|r| r.tn_no.as_str()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.work.as_str()).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.contractor.as_str()).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.as_lakhs).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.cv_lakhs).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.status.as_str()).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_estimate_csv(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let items = [
        ("Earthwork excavation", "cum", 420.0),
        ("PCC 1:4:8", "cum", 5200.0),
        ("RCC M20", "cum", 7800.0),
        ("Brick masonry", "cum", 6100.0),
        ("Plastering 12mm", "sqm", 310.0),
        ("Painting", "sqm", 145.0),
        ("Electrical fittings", "nos", 950.0),
    ];

    let mut w = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record(["Estimate for restoration of KU hostel block"])?;
    w.write_record(["Sl.No", "Items", "Qty", "Unit", "Rate", "Total Amt"])?;

    let mut n = 0;
    for (name, unit, rate) in items {
        let qty = (rng.range(5.0, 400.0) * 10.0).round() / 10.0;
        n += 1;
        w.write_record([
            n.to_string(),
            name.to_string(),
            format!("{qty:.1}"),
            unit.to_string(),
            format!("{rate:.2}"),
            whole(qty * rate),
        ])?;
    }
    for amount in [150_000.0, 85_000.0] {
        n += 1;
        w.write_record([
            n.to_string(),
            "Lumpsum".to_string(),
            String::new(),
            String::new(),
            String::new(),
            whole(amount),
        ])?;
    }
    w.flush()?;
    Ok(n)
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = tender_rows(&mut rng);

    let tender_csv = out_dir.join("restoration tender.csv");
    write_tender_csv(&tender_csv, &rows)?;
    let tender_pq = out_dir.join("restoration tender.parquet");
    write_tender_parquet(&tender_pq, &rows)?;
    println!("Wrote {} tender rows to {} and {}", rows.len(), tender_csv.display(), tender_pq.display());

    let estimate = out_dir.join("KU_Estimate Details.csv");
    let n = write_estimate_csv(&estimate, &mut rng)?;
    println!("Wrote {n} estimate items to {}", estimate.display());
    Ok(())
}
