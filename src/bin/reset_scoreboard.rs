#[cfg(feature = "ssr")]
use christmas_25::config::StoreConfig;

#[cfg(feature = "ssr")]
fn main() {
    let backend = StoreConfig::from_env()
        .expect("Store configuration missing")
        .connect()
        .expect("Failed to open store");
    let removed = backend
        .run(|store| store.clear_scoreboard())
        .expect("Failed to clear scoreboard");
    println!("Scoreboard cleared, {} rows removed.", removed);
}

#[cfg(not(feature = "ssr"))]
fn main() {
    println!("This binary requires the 'ssr' feature to be enabled.");
}
