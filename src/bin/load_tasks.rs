#[cfg(feature = "ssr")]
use christmas_25::{
    config::StoreConfig,
    model::Task,
    store::{establish_connection, init_schema, load_tasks},
};

// Usage: load_tasks tasks.json
//
// The file holds a JSON array of tasks, e.g.
// [{"id": 3, "points": 50, "password": ["Rudolf", "Reindeer"], "active": true}]
#[cfg(feature = "ssr")]
fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: load_tasks <tasks.json>");
    let raw = std::fs::read_to_string(&path).expect("Failed to read task file");
    let tasks: Vec<Task> = serde_json::from_str(&raw).expect("Task file is not a JSON task list");

    let database_url = match StoreConfig::from_env().expect("Store configuration missing") {
        StoreConfig::Sqlite { database_url } => database_url,
        StoreConfig::Rest { .. } => {
            eprintln!("Tasks for the hosted data API are managed in its dashboard.");
            std::process::exit(1);
        }
    };

    let mut conn = establish_connection(&database_url).expect("Failed to connect");
    init_schema(&mut conn).expect("Failed to create tables");
    let written = load_tasks(&mut conn, &tasks).expect("Failed to load tasks");
    println!("Loaded {} tasks from {}.", written, path);
}

#[cfg(not(feature = "ssr"))]
fn main() {
    println!("This binary requires the 'ssr' feature to be enabled.");
}
