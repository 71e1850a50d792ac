use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Number of analogue rows emitted per reference day.
const ANALOGS_PER_DAY: usize = 5;

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

    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
        lo + (self.uniform() * (hi - lo + 1) as f64) as i32
    }

    /// Box–Muller.
    fn gauss(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mu + sigma * z
    }
}

fn main() -> std::io::Result<()> {
    let mut args = std::env::args().skip(1);
    let data_path: PathBuf = args
        .next()
        .unwrap_or_else(|| "sample_analogs.tsv".to_string())
        .into();
    let config_path: PathBuf = args
        .next()
        .unwrap_or_else(|| "sample_config.txt".to_string())
        .into();

    let mut rng = SimpleRng::new(20030601);

    let start = NaiveDate::from_ymd_opt(2003, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2004, 12, 31).unwrap();

    let mut data = String::from("dateRef\tdateAnlg\tDis\tCorr\n");
    let mut day = start;
    while day <= end {
        for _ in 0..ANALOGS_PER_DAY {
            let year = rng.range_i32(1948, 2016);
            let month = rng.range_i32(1, 12) as u32;
            let dom = rng.range_i32(1, 28) as u32;
            let analog = NaiveDate::from_ymd_opt(year, month, dom).unwrap_or(day);

            let dis = rng.gauss(1500.0, 420.0).max(0.0);
            let corr = rng.gauss(0.4, 0.3).clamp(-1.0, 1.0);

            let _ = writeln!(
                data,
                "{}\t{}\t{:.1}\t{:.2}",
                day.format("%Y%m%d"),
                analog.format("%Y%m%d"),
                dis,
                corr
            );
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    let config = "\
outputfile = sample_analogs.tsv
nanalog = 5
varname = \"slp\"
simsource = \"NCEP\"
archisource = \"NCEP\"
predictordom = \"-80.0,50.0,22.5,70.0\"
archiperiod = \"1948-01-01,2016-12-31\"
";

    std::fs::write(&data_path, data)?;
    std::fs::write(&config_path, config)?;

    println!(
        "Wrote {} and {}",
        data_path.display(),
        config_path.display()
    );
    Ok(())
}
