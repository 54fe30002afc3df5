// eonsim: Discrete-event simulator for elastic optical networks with p-cycle protection
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use clap::Parser;

use eonsim::{
    config::ScenarioConfig, experiment::Experiment, pcycle::SharingPolicy, rsa::RsaKind, sweep,
};

/// Simulate a scenario for all configured loads and store the results.
#[derive(Debug, Parser)]
struct Cli {
    /// Path to the JSON scenario
    config: String,
    /// Output path, where to store the generated JSON. The generated file will have the following
    /// filename: `{OUTPUT}/{RSA}_{SHARING}_{TIME}.json`
    output: String,
    /// RSA strategy. Overrides the scenario.
    #[clap(long)]
    rsa: Option<RsaKind>,
    /// How p-cycles share their band. Overrides the scenario.
    #[clap(long)]
    sharing: Option<SharingPolicy>,
    /// Seed of the traffic generator. Overrides the scenario.
    #[clap(short, long)]
    seed: Option<u64>,
    /// Number of workers to use in parallel. If not specified, it will use all available workers.
    #[clap(short, long)]
    threads: Option<usize>,
    /// Enable verbose output.
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let threads = args.threads.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    let mut config = ScenarioConfig::from_json_file(&args.config)?;
    if let Some(kind) = args.rsa {
        config.rsa.kind = kind;
    }
    if let Some(sharing) = args.sharing {
        config.rsa.sharing = sharing;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    let reports = sweep(&config);
    if reports.is_empty() {
        log::warn!("No run finished successfully!");
    }

    if args.verbose {
        println!("load     blocking  bw-blocking  jfi     hops   fragmentation  p-cycles");
        for r in &reports {
            println!(
                "{:<8} {:<9.4} {:<12.4} {:<7.4} {:<6.2} {:<14.4} {}",
                r.load,
                r.blocking_probability,
                r.bandwidth_blocking_ratio,
                r.jain_fairness_index,
                r.mean_hops,
                r.mean_fragmentation,
                r.peak_p_cycles
            );
        }
    }

    let path = Experiment {
        config: &config,
        data: &reports,
    }
    .write_json_with_timestamp(format!(
        "{}/{:?}_{:?}",
        args.output, config.rsa.kind, config.rsa.sharing
    ))?;
    log::info!("Results written to {}", path.display());

    Ok(())
}
