use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use qroute::{
    reinforcement::{initialize_planner, RouteSource},
    Route, RouteLog, RouterConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "qroute",
    version,
    about = "Warehouse route planning with Q-learning"
)]
struct Cli {
    /// Configuration file (json, yaml or toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible training runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// CSV file that computed routes are appended to
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Do not record routes
    #[arg(long, global = true, conflicts_with = "log")]
    no_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route between two locations
    Route { start: String, end: String },
    /// Route between two locations through a waypoint
    Via {
        start: String,
        end: String,
        via: String,
    },
    /// Route with priority locations shaping the rewards
    Priority {
        start: String,
        end: String,
        /// Priority locations, highest first
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
    },
    /// List the known locations and corridors
    Nodes,
    /// Menu-driven session on stdin
    Interactive,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    qroute::init_with_logger(std::io::stderr().is_terminal())?;

    let mut config =
        RouterConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(seed) = cli.seed {
        config.training.seed = Some(seed);
    }
    if let Some(path) = cli.log {
        config.log.path = path;
    }
    if cli.no_log {
        config.log.enabled = false;
    }

    let planner = initialize_planner(&config).context("Failed to build route planner")?;
    let log = config
        .log
        .enabled
        .then(|| RouteLog::new(config.log.path.clone()));

    match cli.command {
        Command::Route { start, end } => {
            let route = planner
                .compute_route(&start, &end)
                .with_context(|| format!("Failed to route {} to {}", start, end))?;
            report(&route, &start, &end, log.as_ref())?;
        }
        Command::Via { start, end, via } => {
            let route = planner
                .compute_route_via(&start, &end, &via)
                .with_context(|| format!("Failed to route {} to {} via {}", start, end, via))?;
            report(&route, &start, &end, log.as_ref())?;
        }
        Command::Priority {
            start,
            end,
            priority,
        } => {
            let priority = if priority.is_empty() {
                config.default_priorities.clone()
            } else {
                priority
            };
            let priorities: Vec<&str> = priority.iter().map(String::as_str).collect();
            let route = planner
                .compute_priority_route(&start, &end, &priorities)
                .with_context(|| format!("Failed to route {} to {}", start, end))?;
            report(&route, &start, &end, log.as_ref())?;
        }
        Command::Nodes => {
            let graph = planner.graph();
            println!("Locations: {}", graph.locations().join(", "));
            for (a, b) in graph.edges() {
                println!("{} - {}", a, b);
            }
        }
        Command::Interactive => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            run_interactive(&planner, log.as_ref(), stdin.lock(), stdout.lock())?;
        }
    }

    Ok(())
}

fn report(route: &Route, start: &str, end: &str, log: Option<&RouteLog>) -> Result<()> {
    println!("{}", route);
    record(route, start, end, log)
}

fn record(route: &Route, start: &str, end: &str, log: Option<&RouteLog>) -> Result<()> {
    if let Some(log) = log {
        log.append(route, start, end)
            .with_context(|| format!("Failed to record route in {}", log.path().display()))?;
        info!(path = %log.path().display(), "route recorded");
    }
    Ok(())
}

/// Read one trimmed, upper-cased answer; `None` at end of input
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<Option<String>> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_uppercase()))
}

fn run_interactive<R: BufRead, W: Write>(
    source: &dyn RouteSource,
    log: Option<&RouteLog>,
    mut input: R,
    mut output: W,
) -> Result<()> {
    loop {
        writeln!(output)?;
        writeln!(output, "1. Direct route")?;
        writeln!(output, "2. Route via waypoint")?;
        writeln!(output, "3. Quit")?;
        let Some(choice) = prompt(&mut input, &mut output, "Choice: ")? else {
            return Ok(());
        };

        let with_waypoint = match choice.as_str() {
            "1" => false,
            "2" => true,
            "3" => return Ok(()),
            other => {
                writeln!(output, "Unknown option: {}", other)?;
                continue;
            }
        };

        let Some(start) = prompt(&mut input, &mut output, "Start location: ")? else {
            return Ok(());
        };
        let via = if with_waypoint {
            let Some(via) = prompt(&mut input, &mut output, "Waypoint: ")? else {
                return Ok(());
            };
            Some(via)
        } else {
            None
        };
        let Some(end) = prompt(&mut input, &mut output, "End location: ")? else {
            return Ok(());
        };
        if start == end {
            warn!(location = %start, "start and end are the same location");
            writeln!(output, "Start and end must be different locations")?;
            continue;
        }

        let result = match via {
            Some(via) => source.route_via(&start, &end, &via),
            None => source.route(&start, &end),
        };

        match result {
            Ok(route) => {
                writeln!(output, "{}", route)?;
                record(&route, &start, &end, log)?;
            }
            Err(e) => writeln!(output, "Error: {}", e)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute::{RoutePlanner, RouterResult, TrainingConfig, WarehouseGraph};
    use std::io::Cursor;

    fn planner() -> RoutePlanner {
        RoutePlanner::new(
            WarehouseGraph::reference(),
            TrainingConfig {
                iterations: 5000,
                seed: Some(21),
                ..TrainingConfig::default()
            },
        )
        .unwrap()
    }

    fn session(source: &dyn RouteSource, log: Option<&RouteLog>, script: &str) -> String {
        let mut output = Vec::new();
        run_interactive(source, log, Cursor::new(script.to_string()), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_cli_parses_priority_list() {
        let args = ["qroute", "--seed", "4", "priority", "E", "A", "--priority", "A,D"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.seed, Some(4));
        match cli.command {
            Command::Priority { priority, .. } => assert_eq!(priority, ["A", "D"]),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["qroute", "--log", "x.csv", "--no-log", "nodes"]).is_err());
    }

    #[test]
    fn test_interactive_direct_route_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = RouteLog::new(dir.path().join("routes.csv"));
        let output = session(&planner(), Some(&log), "1\ne\na\n3\n");

        assert!(output.contains("E -> I -> J -> F -> B -> A"));
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_interactive_rejects_same_start_and_end() {
        let output = session(&planner(), None, "1\nB\nb\n");
        assert!(output.contains("Start and end must be different locations"));
    }

    #[test]
    fn test_interactive_reports_errors_and_continues() {
        struct Failing;
        impl RouteSource for Failing {
            fn route(&self, start: &str, _goal: &str) -> RouterResult<Route> {
                Err(qroute::RouterError::unknown_location(start))
            }
            fn route_via(&self, start: &str, goal: &str, _via: &str) -> RouterResult<Route> {
                self.route(start, goal)
            }
        }

        let output = session(&Failing, None, "9\n2\nX\nA\nB\n3\n");
        assert!(output.contains("Unknown option: 9"));
        assert!(output.contains("Error: Unknown location: X"));
    }

    #[test]
    fn test_interactive_asks_waypoint_before_end() {
        struct Echo;
        impl RouteSource for Echo {
            fn route(&self, start: &str, goal: &str) -> RouterResult<Route> {
                Route::new(vec![start.to_string(), goal.to_string()])
            }
            fn route_via(&self, start: &str, goal: &str, via: &str) -> RouterResult<Route> {
                Route::new(vec![start.to_string(), via.to_string(), goal.to_string()])
            }
        }

        let output = session(&Echo, None, "2\ne\nj\nl\n3\n");
        assert!(output.contains("Start location: Waypoint: End location: "));
        assert!(output.contains("E -> J -> L"));
    }
}
