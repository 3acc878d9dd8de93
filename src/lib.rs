#![recursion_limit = "256"]

pub mod answer;
pub mod app;
#[cfg(feature = "ssr")]
pub mod config;
pub mod identity;
pub mod model;
#[cfg(feature = "ssr")]
pub mod schema;
pub mod store;
pub mod submission;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
