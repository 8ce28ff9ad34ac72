mod cli;
mod word_count;

use std::io::{BufRead, Read};
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mapreduce::Stage;

use crate::cli::Cli;
use crate::word_count::WordCount;

fn read_lines(cli: &Cli) -> anyhow::Result<Vec<(usize, String)>> {
    let mut text = String::new();
    match &cli.input {
        Some(path) => {
            std::fs::File::open(path)?.read_to_string(&mut text)?;
        }
        None => {
            std::io::stdin().lock().read_to_string(&mut text)?;
        }
    }

    Ok(text.lines().enumerate().map(|(n, line)| (n, line.to_string())).collect())
}

fn progress_bar_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Undefined => "starting",
        Stage::Map => "map",
        Stage::Shuffle => "shuffle",
        Stage::Reduce => "reduce",
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = read_lines(&cli)?;
    log::info!("read {} lines, running with {} workers", input.len(), cli.workers);

    let handle = mapreduce::start(WordCount, input, cli.workers)
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    let bar = (!cli.no_progress).then(|| {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/100%")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    });

    loop {
        let state = handle.get_state();
        if let Some(bar) = &bar {
            bar.set_message(progress_bar_for(state.stage));
            bar.set_position(state.percentage.round() as u64);
        }
        if state.stage == Stage::Reduce && state.percentage >= 100.0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let mut counts = handle.close().map_err(|err| anyhow::anyhow!("{err}"))?;
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (word, count) in counts {
        println!("{count}\t{word}");
    }

    Ok(())
}
