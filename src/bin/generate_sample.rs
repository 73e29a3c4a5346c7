use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

/// Write a synthetic soil survey for trying out the calculator.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Cli {
    /// Output file; `.csv` or `.parquet`.
    #[arg(default_value = "sample_soil.csv")]
    output: PathBuf,

    /// Number of soil samples (rows).
    #[arg(long, default_value = "40")]
    samples: usize,

    /// PRNG seed.
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// (column name, mean, standard deviation, loading on the latent fertility factor)
const PARAMETERS: &[(&str, f64, f64, f64)] = &[
    ("pH", 6.6, 0.5, 0.3),
    ("Organic Carbon", 2.2, 0.8, 0.9),
    ("Nitrogen", 260.0, 70.0, 0.8),
    ("Phosphorus", 14.0, 5.0, 0.6),
    ("Potassium", 210.0, 60.0, 0.5),
    ("EC", 0.6, 0.25, -0.4),
    ("Bulk Density", 1.35, 0.12, -0.7),
    ("Microbial Activity", 55.0, 15.0, 0.7),
];

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One column per parameter. Each sample shares a latent fertility level so
/// the columns correlate the way field data does.
fn generate_columns(samples: usize, rng: &mut SimpleRng) -> Vec<Vec<f64>> {
    let mut columns = vec![Vec::with_capacity(samples); PARAMETERS.len()];
    for _ in 0..samples {
        let fertility = rng.gauss(0.0, 1.0);
        for (column, &(_, mean, sd, loading)) in columns.iter_mut().zip(PARAMETERS) {
            let noise = rng.gauss(0.0, 1.0) * (1.0 - loading * loading).sqrt();
            let value = mean + sd * (loading * fertility + noise);
            column.push((value.max(0.0) * 100.0).round() / 100.0);
        }
    }
    columns
}

fn write_csv(path: &Path, columns: &[Vec<f64>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(PARAMETERS.iter().map(|p| p.0))?;
    let rows = columns.first().map_or(0, Vec::len);
    for row in 0..rows {
        writer.write_record(columns.iter().map(|c| c[row].to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, columns: Vec<Vec<f64>>) -> Result<()> {
    let schema = Arc::new(Schema::new(
        PARAMETERS
            .iter()
            .map(|p| Field::new(p.0, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|c| Arc::new(Float64Array::from(c)) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let columns = generate_columns(cli.samples, &mut rng);

    let ext = cli
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&cli.output, &columns)?,
        "parquet" | "pq" => write_parquet(&cli.output, columns)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!(
        "Wrote {} soil samples ({} parameters each) to {}",
        cli.samples,
        PARAMETERS.len(),
        cli.output.display()
    );
    Ok(())
}
