use anyhow::Result;
use std::process;

use nutrilog_core::api::NutritionApi;
use nutrilog_core::models::Exercise;

use super::App;
use super::helpers::print_exercise_table;

fn print_exercises(exercises: &[Exercise], empty_msg: &str, json: bool) -> Result<()> {
    if exercises.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_msg}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(exercises)?);
    } else {
        let refs: Vec<&Exercise> = exercises.iter().collect();
        print_exercise_table(&refs);
    }
    Ok(())
}

pub(crate) async fn cmd_exercise_search(app: &App, query: &str, json: bool) -> Result<()> {
    app.require_login()?;
    let exercises = app
        .api
        .search_exercises(query)
        .await
        .map_err(|e| app.fail(e))?;
    print_exercises(&exercises, &format!("No exercises found for '{query}'"), json)
}

pub(crate) async fn cmd_exercise_list(app: &App, muscle: Option<&str>, json: bool) -> Result<()> {
    app.require_login()?;
    let mut exercises = app.api.list_exercises().await.map_err(|e| app.fail(e))?;
    if let Some(group) = muscle {
        exercises.retain(|e| e.muscle_group.eq_ignore_ascii_case(group));
    }
    print_exercises(&exercises, "No exercises found", json)
}
