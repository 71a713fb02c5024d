mod api;
mod commands;
mod config;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::api::DEFAULT_API_URL;
use nutrilog_core::models::UserProfile;

use crate::commands::{
    App, FindTarget, ItemFields, cmd_analyze, cmd_delete, cmd_exercise_list, cmd_exercise_search,
    cmd_find, cmd_food_add, cmd_food_log, cmd_food_search, cmd_log, cmd_login, cmd_logout,
    cmd_plan_list, cmd_plan_log, cmd_plan_save, cmd_profile_setup, cmd_profile_show,
    cmd_profile_update, cmd_summary, cmd_update, cmd_whoami, cmd_workout_create,
    cmd_workout_delete_log, cmd_workout_delete_plan, cmd_workout_log, cmd_workout_logs,
    cmd_workout_plans, cmd_workout_show,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "nutrilog",
    version,
    about = "Track meals and workouts against a nutrilog server"
)]
struct Cli {
    /// Base URL of the nutrilog API
    #[arg(long, global = true, env = "NUTRILOG_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        /// Account email
        email: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the daily log (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a manually priced item
    Log {
        /// Item name
        name: String,
        /// Quantity in grams
        quantity: String,
        #[command(flatten)]
        macros: MacroArgs,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate macros for a free-text meal description
    Analyze {
        /// Meal description, e.g. "2 eggs and a slice of toast"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Log the analyzed items
        #[arg(long)]
        log: bool,
        /// Date to log for when --log is given (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a logged item
    Update {
        /// Log item ID
        item_id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New quantity in grams
        #[arg(short, long)]
        quantity: Option<String>,
        /// New calories
        #[arg(long)]
        calories: Option<f64>,
        /// New protein (g)
        #[arg(long)]
        protein: Option<f64>,
        /// New carbs (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// New fat (g)
        #[arg(long)]
        fat: Option<f64>,
        /// Date the item was logged on (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged item
    Delete {
        /// Log item ID
        item_id: i64,
        /// Date the item was logged on (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage your food library
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Saved meal plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Browse the exercise catalogue
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Workout plans and the workout log
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Body profile: age, height, weight, goal and activity level
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Interactive search: each line read from stdin is a new query
    Find {
        /// Search exercises instead of foods
        #[arg(long)]
        exercises: bool,
        /// Quiet period before a lookup is issued, in milliseconds
        #[arg(long)]
        quiet_ms: Option<u64>,
        /// Minimum query length before a lookup is issued
        #[arg(long)]
        min_len: Option<usize>,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct MacroArgs {
    /// Calories
    #[arg(long)]
    calories: f64,
    /// Protein (g)
    #[arg(long, default_value = "0")]
    protein: f64,
    /// Carbs (g)
    #[arg(long, default_value = "0")]
    carbs: f64,
    /// Fat (g)
    #[arg(long, default_value = "0")]
    fat: f64,
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to your library
    Add {
        /// Food name
        name: String,
        /// Calories per 100g
        #[arg(long)]
        calories: f64,
        /// Protein per 100g
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carbs per 100g
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat per 100g
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search your food library
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food from your library by weight
    Log {
        /// Food name to search for
        query: String,
        /// Quantity in grams (e.g. "150" or "150g")
        quantity: String,
        /// Pick this food ID from the results instead of prompting
        #[arg(long)]
        food_id: Option<i64>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// List saved meal plans
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the items logged on a date as a meal plan
    Save {
        /// Plan name
        name: String,
        /// Date whose items to save (default: today)
        #[arg(long)]
        from: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log every item of a saved plan
    Log {
        /// Meal plan ID
        plan_id: i64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Search exercises by name
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the exercise catalogue
    List {
        /// Only show exercises for this muscle group
        #[arg(short, long)]
        muscle: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// List your workout plans
    Plans {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one workout plan
    Show {
        /// Workout plan ID
        plan_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a workout plan from catalogue exercises
    Create {
        /// Plan name
        name: String,
        /// Goal: general, strength, hypertrophy or endurance
        #[arg(long, default_value = "general")]
        goal: String,
        /// Exercise as ID:SETS:REPS, e.g. 12:3:8-10 (repeatable)
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a completed workout
    Log {
        /// Start from this plan's exercises
        #[arg(long)]
        plan: Option<i64>,
        /// Set as EXERCISE_ID:REPSxWEIGHT, e.g. 12:10x50 (repeatable)
        #[arg(short, long = "set")]
        sets: Vec<String>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
        /// Date of the workout (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged workouts for a month or a date range
    Logs {
        /// Month as YYYY-MM (default: this month)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        month: Option<String>,
        /// First date of the range
        #[arg(long)]
        from: Option<String>,
        /// Last date of the range (default: --from)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout plan
    DeletePlan {
        /// Workout plan ID
        plan_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a logged workout
    DeleteLog {
        /// Workout log ID
        log_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Age in years
    #[arg(long)]
    age: Option<i64>,
    /// Height in cm
    #[arg(long)]
    height: Option<f64>,
    /// Weight in kg
    #[arg(long)]
    weight: Option<f64>,
    /// Goal: lose_weight, maintain_weight or gain_muscle
    #[arg(long)]
    goal: Option<String>,
    /// Activity: sedentary, lightly_active, moderately_active, very_active or extra_active
    #[arg(long)]
    activity: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl ProfileArgs {
    fn into_profile(self) -> (UserProfile, bool) {
        let profile = UserProfile {
            age: self.age,
            height: self.height,
            weight: self.weight,
            goal: self.goal,
            activity_level: self.activity,
        };
        (profile, self.json)
    }
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create your profile
    Setup(ProfileArgs),
    /// Change the given profile values
    Update(ProfileArgs),
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose)?;
    let config = Config::load(&cli.api_url)?;
    debug!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "configuration loaded");
    let app = App::new(config)?;

    match cli.command {
        Commands::Login { email, password } => cmd_login(&app, &email, password).await,
        Commands::Logout => cmd_logout(&app),
        Commands::Whoami { json } => cmd_whoami(&app, json).await,
        Commands::Summary { date, json } => cmd_summary(&app, date, json).await,
        Commands::Log {
            name,
            quantity,
            macros,
            date,
            json,
        } => {
            let fields = ItemFields {
                name,
                quantity,
                calories: macros.calories,
                protein: macros.protein,
                carbs: macros.carbs,
                fat: macros.fat,
            };
            cmd_log(&app, fields, date, json).await
        }
        Commands::Analyze {
            text,
            log,
            date,
            json,
        } => cmd_analyze(&app, &text.join(" "), log, date, json).await,
        Commands::Update {
            item_id,
            name,
            quantity,
            calories,
            protein,
            carbs,
            fat,
            date,
            json,
        } => {
            let changes = commands::parse_changes(name, quantity, calories, protein, carbs, fat)?;
            cmd_update(&app, item_id, changes, date, json).await
        }
        Commands::Delete {
            item_id,
            date,
            json,
        } => cmd_delete(&app, item_id, date, json).await,
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_food_add(&app, &name, calories, protein, carbs, fat, json).await,
            FoodCommands::Search { query, json } => cmd_food_search(&app, &query, json).await,
            FoodCommands::Log {
                query,
                quantity,
                food_id,
                date,
                json,
            } => cmd_food_log(&app, &query, &quantity, food_id, date, json).await,
        },
        Commands::Plan { command } => match command {
            PlanCommands::List { json } => cmd_plan_list(&app, json).await,
            PlanCommands::Save { name, from, json } => cmd_plan_save(&app, &name, from, json).await,
            PlanCommands::Log {
                plan_id,
                date,
                json,
            } => cmd_plan_log(&app, plan_id, date, json).await,
        },
        Commands::Exercise { command } => match command {
            ExerciseCommands::Search { query, json } => {
                cmd_exercise_search(&app, &query, json).await
            }
            ExerciseCommands::List { muscle, json } => {
                cmd_exercise_list(&app, muscle.as_deref(), json).await
            }
        },
        Commands::Workout { command } => match command {
            WorkoutCommands::Plans { json } => cmd_workout_plans(&app, json).await,
            WorkoutCommands::Show { plan_id, json } => cmd_workout_show(&app, plan_id, json).await,
            WorkoutCommands::Create {
                name,
                goal,
                exercises,
                json,
            } => cmd_workout_create(&app, &name, &goal, &exercises, json).await,
            WorkoutCommands::Log {
                plan,
                sets,
                notes,
                date,
                json,
            } => cmd_workout_log(&app, plan, &sets, notes, date, json).await,
            WorkoutCommands::Logs {
                month,
                from,
                to,
                json,
            } => cmd_workout_logs(&app, month.as_deref(), from, to, json).await,
            WorkoutCommands::DeletePlan { plan_id, json } => {
                cmd_workout_delete_plan(&app, plan_id, json).await
            }
            WorkoutCommands::DeleteLog { log_id, json } => {
                cmd_workout_delete_log(&app, log_id, json).await
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&app, json).await,
            ProfileCommands::Setup(args) => {
                let (profile, json) = args.into_profile();
                cmd_profile_setup(&app, profile, json).await
            }
            ProfileCommands::Update(args) => {
                let (profile, json) = args.into_profile();
                cmd_profile_update(&app, profile, json).await
            }
        },
        Commands::Find {
            exercises,
            quiet_ms,
            min_len,
            json,
        } => {
            let target = if exercises {
                FindTarget::Exercises
            } else {
                FindTarget::Foods
            };
            cmd_find(&app, target, quiet_ms, min_len, json).await
        }
    }
}
