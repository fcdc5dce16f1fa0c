use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use incubator_viewer::data::derive::HeaterSpec;
use incubator_viewer::data::events::{LID_CLOSE, LID_OPEN};

/// 2021-03-04 12:31:00 UTC
const START_NS: i64 = 1_614_861_060_000_000_000;
const STEP_S: f64 = 3.0;
const N_SAMPLES: usize = 1200;

/// Heat capacity of the air, box walls and heatbed, J/K.
const THERMAL_MASS: f64 = 1000.0;
/// Heat loss to the room, W/K.
const LOSS_LID_CLOSED: f64 = 2.0;
const LOSS_LID_OPEN: f64 = 6.0;

/// Bang-bang controller band, °C.
const LOWER_BOUND: f64 = 35.0;
const UPPER_BOUND: f64 = 37.0;

/// Sample indices at which the lid opens and closes.
const LID_OPEN_AT: usize = 400;
const LID_CLOSE_AT: usize = 500;

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

struct Run {
    time: Vec<i64>,
    t1: Vec<f64>,
    t2: Vec<f64>,
    t3: Vec<f64>,
    heater_on: Vec<bool>,
    fan_on: Vec<bool>,
}

fn simulate(rng: &mut SimpleRng) -> Run {
    let heater = HeaterSpec::default();
    let mut run = Run {
        time: Vec::with_capacity(N_SAMPLES),
        t1: Vec::with_capacity(N_SAMPLES),
        t2: Vec::with_capacity(N_SAMPLES),
        t3: Vec::with_capacity(N_SAMPLES),
        heater_on: Vec::with_capacity(N_SAMPLES),
        fan_on: Vec::with_capacity(N_SAMPLES),
    };

    let mut box_temp = 21.0;
    let mut heating = true;

    for i in 0..N_SAMPLES {
        let room = 21.0 + 0.5 * (i as f64 / N_SAMPLES as f64 * std::f64::consts::PI).sin();
        let lid_open = (LID_OPEN_AT..LID_CLOSE_AT).contains(&i);

        if box_temp >= UPPER_BOUND {
            heating = false;
        } else if box_temp <= LOWER_BOUND {
            heating = true;
        }

        run.time.push(START_NS + (i as f64 * STEP_S * 1e9) as i64);
        run.t1.push(room + rng.gauss(0.0, 0.05));
        run.t2.push(box_temp + rng.gauss(-0.2, 0.1));
        run.t3.push(box_temp + rng.gauss(0.2, 0.1));
        run.heater_on.push(heating);
        run.fan_on.push(true);

        let loss = if lid_open { LOSS_LID_OPEN } else { LOSS_LID_CLOSED };
        let power = if heating { heater.power() } else { 0.0 };
        box_temp += STEP_S * (power - loss * (box_temp - room)) / THERMAL_MASS;
    }

    run
}

fn write_parquet(run: &Run, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Int64, false),
        Field::new("t1", DataType::Float64, false),
        Field::new("t2", DataType::Float64, false),
        Field::new("t3", DataType::Float64, false),
        Field::new("heater_on", DataType::Boolean, false),
        Field::new("fan_on", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(run.time.clone())),
            Arc::new(Float64Array::from(run.t1.clone())),
            Arc::new(Float64Array::from(run.t2.clone())),
            Arc::new(Float64Array::from(run.t3.clone())),
            Arc::new(BooleanArray::from(run.heater_on.clone())),
            Arc::new(BooleanArray::from(run.fan_on.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Python-style booleans, as pandas writes them.
fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn write_csv(run: &Run, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["time", "t1", "t2", "t3", "heater_on", "fan_on"])?;
    for i in 0..run.time.len() {
        writer.write_record([
            run.time[i].to_string(),
            format!("{:.3}", run.t1[i]),
            format!("{:.3}", run.t2[i]),
            format!("{:.3}", run.t3[i]),
            py_bool(run.heater_on[i]).to_string(),
            py_bool(run.fan_on[i]).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_events(run: &Run, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["time", "event", "code"])?;
    writer.write_record([run.time[LID_OPEN_AT].to_string(), "Lid Opened".into(), LID_OPEN.into()])?;
    writer.write_record([run.time[LID_CLOSE_AT].to_string(), "Lid Closed".into(), LID_CLOSE.into()])?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let run = simulate(&mut rng);

    write_parquet(&run, "sample_incubator.parquet")?;
    write_csv(&run, "sample_incubator.csv")?;
    write_events(&run, "sample_events.csv")?;

    log::info!(
        "Wrote {} samples ({} s apart) to sample_incubator.parquet / .csv and 2 events to sample_events.csv",
        run.time.len(),
        STEP_S
    );
    println!("Open sample_incubator.parquet with time unit 'ns'; add sample_events.csv to see the lid opening.");
    Ok(())
}
