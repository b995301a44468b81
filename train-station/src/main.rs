use train_station::sim::{CycleInput, Driver, RunReport, Scenario, ScenarioSource};

const USAGE: &str = "\
Usage: train-station <scenario.json> [--json]
       train-station <passengers> <seats> [<passengers> <seats>]... [--json]

Runs boarding cycles until every passenger is seated or no further train is
scheduled. Each (passengers, seats) pair scripts one train; passengers left
standing by a full train are carried into the next cycle.";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json_output = if let Some(pos) = args.iter().position(|arg| arg == "--json") {
        args.remove(pos);
        true
    } else {
        false
    };

    let source = match parse_source(&args) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!();
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let driver = Driver::new(source);

    // Ctrl-C requests shutdown so blocked actors resolve as cancelled
    // instead of the process dying mid-protocol.
    let station = driver.station();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            station.shutdown();
        }
    });

    let report = driver.run().await.expect("boarding protocol failed");

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("report serializes")
        );
    } else {
        print_report(&report);
    }
}

/// Build the cycle source from a scenario file path or inline count pairs.
fn parse_source(args: &[String]) -> Result<ScenarioSource, String> {
    match args {
        [] => Err("expected a scenario file or (passengers, seats) pairs".to_string()),
        [path] if path.parse::<u32>().is_err() => {
            let scenario = Scenario::load(path).map_err(|e| e.to_string())?;
            Ok(scenario.into_source())
        }
        _ => {
            let counts: Vec<u32> = args
                .iter()
                .map(|arg| arg.parse::<u32>().map_err(|_| format!("not a count: {arg}")))
                .collect::<Result<_, _>>()?;
            if counts.len() % 2 != 0 {
                return Err("counts must come in (passengers, seats) pairs".to_string());
            }
            Ok(ScenarioSource::new(counts.chunks(2).map(|pair| CycleInput {
                passengers: pair[0],
                seats: pair[1],
            })))
        }
    }
}

fn print_report(report: &RunReport) {
    for record in &report.cycles {
        println!(
            "train {} departed ({:?}): {} boarded, {} seats unused, {} left waiting",
            record.cycle, record.reason, record.boarded, record.unused_seats, record.requeued
        );
    }
    println!(
        "{} passenger(s) boarded, {} cancelled, across {} train(s)",
        report.boarded,
        report.cancelled,
        report.cycles.len()
    );
}
