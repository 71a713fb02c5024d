use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::warn;

use nutrilog_core::api::{ExerciseSearch, FoodSearch, SearchSource};
use nutrilog_core::models::{Exercise, Food};
use nutrilog_core::search::{SearchConfig, SearchDebouncer, SearchOutcome};

use super::App;
use super::helpers::{print_exercise_table, print_food_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindTarget {
    Foods,
    Exercises,
}

#[derive(Serialize)]
struct FindResult<'a, T> {
    query: &'a str,
    seq: u64,
    results: &'a [T],
}

fn tune(mut config: SearchConfig, quiet_ms: Option<u64>, min_len: Option<usize>) -> SearchConfig {
    if let Some(ms) = quiet_ms {
        config.quiet_period = Duration::from_millis(ms);
    }
    if let Some(n) = min_len {
        config.min_query_len = n;
    }
    config
}

fn render_foods(foods: &[Food], query: &str) {
    if foods.is_empty() {
        println!("No foods match '{query}'");
    } else {
        let refs: Vec<&Food> = foods.iter().collect();
        print_food_table(&refs);
    }
}

fn render_exercises(exercises: &[Exercise], query: &str) {
    if exercises.is_empty() {
        println!("No exercises match '{query}'");
    } else {
        let refs: Vec<&Exercise> = exercises.iter().collect();
        print_exercise_table(&refs);
    }
}

pub(crate) async fn cmd_find(
    app: &App,
    target: FindTarget,
    quiet_ms: Option<u64>,
    min_len: Option<usize>,
    json: bool,
) -> Result<()> {
    app.require_login()?;
    eprintln!("Type to search, one query per line (Ctrl-D to finish)");
    let input = BufReader::new(tokio::io::stdin());

    match target {
        FindTarget::Foods => {
            let config = tune(SearchConfig::food_library(), quiet_ms, min_len);
            let search = SearchDebouncer::new(FoodSearch(Arc::clone(&app.api)), config);
            run_find(search, input, json, render_foods).await?;
        }
        FindTarget::Exercises => {
            let config = tune(SearchConfig::exercises(), quiet_ms, min_len);
            let search = SearchDebouncer::new(ExerciseSearch(Arc::clone(&app.api)), config);
            run_find(search, input, json, render_exercises).await?;
        }
    }
    Ok(())
}

/// Feed every line of `input` to the debouncer as it arrives and print each
/// committed result set. Returns the outcome of every line, in input order.
async fn run_find<S, R>(
    search: SearchDebouncer<S>,
    input: R,
    json: bool,
    render: fn(&[S::Item], &str),
) -> Result<Vec<SearchOutcome>>
where
    S: SearchSource + 'static,
    S::Item: Serialize + Sync + 'static,
    R: AsyncBufRead + Unpin,
{
    let search = Arc::new(search);
    let mut tasks = JoinSet::new();
    let mut lines = input.lines();
    let mut index = 0_usize;

    while let Some(line) = lines.next_line().await.context("Failed to read query")? {
        let search = Arc::clone(&search);
        let position = index;
        index += 1;
        tasks.spawn(async move {
            let outcome = search.input(&line).await;
            if let SearchOutcome::Committed { seq, .. } = outcome {
                let results = search.results();
                let query = line.trim();
                if json {
                    let result = FindResult {
                        query,
                        seq,
                        results: &results,
                    };
                    match serde_json::to_string(&result) {
                        Ok(s) => println!("{s}"),
                        Err(e) => warn!(error = %e, "could not serialize search results"),
                    }
                } else {
                    render(&results, query);
                }
            }
            (position, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(index);
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("Search task failed")?);
    }
    outcomes.sort_by_key(|(position, _)| *position);
    Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}
