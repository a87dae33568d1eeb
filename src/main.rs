use std::{fs, path::PathBuf};

use cavern_solver::{parse_nth_level, Heuristic, LevelFormat, Outcome, SolverConfig};
use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use itertools::Itertools;

// Format:
// numeric: whitespace-separated tile codes, 0 floor, 1 wall, 2 collectible,
// 3 key, 4 player, 5 door, 6 block, 7 trap, 8 exit, 9 pit, 10 void,
// 11 gate, 12 button, 13 lever.
// glyph: one character per cell, . # * k @ D o ^ E O ~ G _ / in the same order.
//
// Levels in one file are separated by blank lines.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Level file
    level_file: PathBuf,

    /// Which level of the file to solve, counting from zero
    #[clap(short, long, default_value_t = 0)]
    level: usize,

    #[clap(short, long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    #[clap(long, value_enum, default_value_t = HeuristicArg::Mst)]
    heuristic: HeuristicArg,

    /// Stop after expanding this many states
    #[clap(long)]
    max_expansions: Option<usize>,

    /// Search even if the reachability check says the level is hopeless
    #[clap(long)]
    no_precheck: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Auto,
    Numeric,
    Glyph,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    /// Minimum spanning tree, optimal
    Mst,
    /// Fast, may return longer solutions
    Greedy,
    /// Uniform-cost search
    Zero,
}

impl From<HeuristicArg> for Heuristic {
    fn from(h: HeuristicArg) -> Self {
        match h {
            HeuristicArg::Mst => Heuristic::MinimumSpanningTree,
            HeuristicArg::Greedy => Heuristic::Greedy,
            HeuristicArg::Zero => Heuristic::Zero,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.level_file)
        .wrap_err_with(|| format!("reading {}", args.level_file.display()))?;
    let format = match args.format {
        FormatArg::Auto => LevelFormat::detect(&text),
        FormatArg::Numeric => LevelFormat::Numeric,
        FormatArg::Glyph => LevelFormat::Glyph,
    };
    let level = parse_nth_level(&text, format, args.level).wrap_err_with(|| {
        format!("loading level {} of {}", args.level, args.level_file.display())
    })?;

    println!("----");
    println!("{}", level.map);
    println!("----");
    println!(
        "Player at {}, exit at {}, {} collectibles.",
        level.initial.player(),
        level.exit,
        level.initial.remaining_collectibles().len()
    );

    let config = SolverConfig {
        heuristic: args.heuristic.into(),
        max_expansions: args.max_expansions,
        precheck: !args.no_precheck,
    };
    let report = level.search(config);

    match &report.outcome {
        Outcome::Solved(path) => {
            println!("Solution found in {} steps:", path.len());
            for (i, step) in path.iter().enumerate() {
                println!("{:03}: {}", i + 1, step);
            }
            println!("{}", path.iter().join(" "));
        }
        Outcome::Unsolvable => println!("No solution found."),
        Outcome::BudgetExhausted => println!("No solution found within the expansion budget."),
    }

    println!(
        "Expanded {} states (generated {} total, {} stale).",
        report.stats.expanded, report.stats.generated, report.stats.stale
    );

    Ok(())
}
