use leptos::ev::SubmitEvent;
use leptos::logging::error;
use leptos::prelude::*;
use leptos::server_fn::error::NoCustomError;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

use crate::identity::{load_team, save_team};
use crate::model::{ScoreboardEntry, TaskTile};
use crate::submission::{check_fields, SubmissionOutcome, CLOSE_DELAY_MS};

#[cfg(feature = "ssr")]
use crate::store::{Backend, EventStore, StoreError};

const GENERIC_ERROR: &str = "Something went wrong. Please try again.";
const LOAD_TASKS_ERROR: &str = "Could not load tasks. Please try again.";
const SNOWFLAKES: usize = 12;

// Runs `f` against the configured store on the blocking pool. Store failures are logged here and
// reach the browser as a plain server error.
#[cfg(feature = "ssr")]
async fn with_store<T, F>(f: F) -> Result<T, ServerFnError<NoCustomError>>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn EventStore) -> Result<T, StoreError> + Send + 'static,
{
    let backend: Backend = expect_context();
    store_result(tokio::task::spawn_blocking(move || backend.run(f)).await)
}

#[cfg(feature = "ssr")]
fn store_result<T>(
    result: Result<Result<T, StoreError>, tokio::task::JoinError>,
) -> Result<T, ServerFnError<NoCustomError>> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("Store error: {}", e);
            Err(ServerFnError::ServerError(e.to_string()))
        }
        Err(e) => {
            error!("Store task failed: {}", e);
            Err(ServerFnError::ServerError(e.to_string()))
        }
    }
}

#[server(GetScoreboard)]
pub async fn get_scoreboard() -> Result<Vec<ScoreboardEntry>, ServerFnError<NoCustomError>> {
    use crate::store::rank;

    with_store(|store| store.scoreboard().map(rank)).await
}

#[server(GetTasks)]
pub async fn get_tasks() -> Result<Vec<TaskTile>, ServerFnError<NoCustomError>> {
    let tasks = with_store(|store| store.tasks()).await?;
    Ok(tasks.iter().map(|task| task.tile()).collect())
}

#[server(SubmitPassword)]
pub async fn submit_password(
    team: String,
    task_id: i32,
    password: String,
) -> Result<SubmissionOutcome, ServerFnError<NoCustomError>> {
    use crate::submission::submit_answer;

    with_store(move |store| submit_answer(store, &team, task_id, &password)).await
}

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/christmas-25.css" />

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=Scoreboard />
                    <Route path=path!("/calendar") view=AdventCalendar />
                </Routes>
            </main>
        </Router>
    }
}

/// CSS class for a row on the scoreboard. The podium gets its own look.
fn rank_class(idx: usize) -> &'static str {
    match idx {
        0 => "sb-item sb-item--top1",
        1 => "sb-item sb-item--top2",
        2 => "sb-item sb-item--top3",
        _ => "sb-item",
    }
}

#[component]
fn Scoreboard() -> impl IntoView {
    let teams = Resource::new(|| (), |_| get_scoreboard());

    view! {
        <Title text="Christmas Scoreboard" />
        <div class="scoreboard">
            <header class="sb-header">
                <h1>"🎄 Christmas Scoreboard"</h1>
            </header>
            <Suspense fallback=|| view! { <ul class="sb-list"></ul> }>
                {move || {
                    teams
                        .with(|t_res| {
                            // A failed load leaves the board empty, the server has logged it.
                            let rows = match t_res {
                                Some(Ok(rows)) => rows.clone(),
                                _ => Vec::new(),
                            };
                            view! {
                                <ul class="sb-list">
                                    {rows
                                        .into_iter()
                                        .enumerate()
                                        .map(|(idx, row)| {
                                            view! {
                                                <li class=rank_class(idx)>
                                                    <span class="sb-rank">{idx + 1}</span>
                                                    <span class="sb-team">{row.team}</span>
                                                    <span class="sb-score">{row.score}</span>
                                                </li>
                                            }
                                        })
                                        .collect_view()}
                                </ul>
                            }
                        })
                }}
            </Suspense>
            <div class="snowflakes" aria-hidden="true">
                {(0..SNOWFLAKES)
                    .map(|_| {
                        view! {
                            <div class="snowflake">
                                <div class="inner">"❅"</div>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}

fn tile_class(active: bool) -> &'static str {
    if active {
        "advent-tile"
    } else {
        "advent-tile advent-tile--inactive"
    }
}

#[component]
fn AdventCalendar() -> impl IntoView {
    let tasks = Resource::new(|| (), |_| get_tasks());

    let team = RwSignal::new(String::new());
    let open_task = RwSignal::new(None::<TaskTile>);
    let password = RwSignal::new(String::new());
    let submitting = RwSignal::new(false);
    let message = RwSignal::new(String::new());

    // Local storage only exists in the browser, so restore the team name after hydration.
    Effect::new(move || {
        team.set(load_team());
    });

    let open_tile = move |tile: TaskTile| {
        if !tile.active {
            return;
        }
        open_task.set(Some(tile));
        password.set(String::new());
        message.set(String::new());
    };

    let close = move || {
        if !submitting.get_untracked() {
            open_task.set(None);
        }
    };

    // Sends the password for the open tile. Blank fields are refused before any round trip. A
    // correct answer closes the modal after a short delay, anything else keeps it open with a
    // message.
    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(tile) = open_task.get_untracked() else {
            return;
        };
        let team_name = team.get_untracked();
        let pw = password.get_untracked();
        if let Some(rejected) = check_fields(&team_name, &pw) {
            message.set(rejected.message());
            return;
        }

        submitting.set(true);
        message.set(String::new());
        spawn_local(async move {
            match submit_password(team_name, tile.id, pw).await {
                Ok(outcome) => {
                    message.set(outcome.message());
                    if outcome.closes_modal() {
                        gloo_timers::future::TimeoutFuture::new(CLOSE_DELAY_MS).await;
                        open_task.set(None);
                    }
                    submitting.set(false);
                }
                Err(e) => {
                    error!("Submission failed: {}", e);
                    message.set(GENERIC_ERROR.to_string());
                    submitting.set(false);
                }
            }
        });
    };

    view! {
        <Title text="Advent Task Calendar" />
        <div class="advent-root">
            <header class="advent-header">
                <h1>"🎄 Advent Task Calendar"</h1>
                <p class="advent-subtitle">"Tap a number, enter the password, win points."</p>

                <div class="team-input">
                    <label for="team">"Team/Nickname"</label>
                    <input
                        id="team"
                        placeholder="e.g., Snow Angels"
                        prop:value=move || team.get()
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            save_team(&value);
                            team.set(value);
                        }
                    />
                </div>
            </header>

            <Suspense fallback=|| {
                view! { <p class="loading">"Loading tasks…"</p> }
            }>
                {move || {
                    tasks
                        .with(|t_res| match t_res {
                            Some(Ok(tiles)) => {
                                view! {
                                    <section class="advent-grid">
                                        {tiles
                                            .iter()
                                            .map(|&tile| {
                                                view! {
                                                    <button
                                                        class=tile_class(tile.active)
                                                        disabled=!tile.active
                                                        aria-label=format!("Task {}", tile.id)
                                                        on:click=move |_| open_tile(tile)
                                                    >
                                                        <span class="tile-number">{tile.id}</span>
                                                        <span class="tile-dot" aria-hidden="true"></span>
                                                    </button>
                                                }
                                            })
                                            .collect_view()}
                                    </section>
                                }
                                    .into_any()
                            }
                            Some(Err(_)) => {
                                view! { <p class="loading">{LOAD_TASKS_ERROR}</p> }.into_any()
                            }
                            None => view! { <p class="loading">"Loading tasks…"</p> }.into_any(),
                        })
                }}
            </Suspense>

            {move || {
                open_task
                    .get()
                    .map(|tile| {
                        view! {
                            <div
                                class="modal-backdrop"
                                role="dialog"
                                aria-modal="true"
                                aria-labelledby="modal-title"
                                on:click=move |_| close()
                            >
                                <div class="modal-card" on:click=|ev| ev.stop_propagation()>
                                    <h2 id="modal-title">"Task #" {tile.id}</h2>
                                    <p class="modal-points">
                                        "Worth " <strong>{tile.points}</strong> " points"
                                    </p>

                                    <form on:submit=submit>
                                        <div class="modal-field">
                                            <label for="password">"Password"</label>
                                            <input
                                                id="password"
                                                type="password"
                                                autofocus=true
                                                placeholder="Enter task password"
                                                prop:value=move || password.get()
                                                on:input=move |ev| password.set(event_target_value(&ev))
                                                disabled=move || submitting.get()
                                            />
                                        </div>

                                        {move || {
                                            let text = message.get();
                                            (!text.is_empty())
                                                .then(|| view! { <p class="modal-message">{text}</p> })
                                        }}

                                        <div class="modal-actions">
                                            <button
                                                type="submit"
                                                class="modal-btn modal-btn--primary"
                                                disabled=move || submitting.get()
                                            >
                                                {move || if submitting.get() { "Sending…" } else { "Send" }}
                                            </button>
                                            <button
                                                type="button"
                                                class="modal-btn modal-btn--ghost"
                                                on:click=move |_| close()
                                                disabled=move || submitting.get()
                                            >
                                                "Cancel"
                                            </button>
                                        </div>
                                    </form>
                                </div>
                            </div>
                        }
                    })
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_class() {
        assert_eq!(rank_class(0), "sb-item sb-item--top1");
        assert_eq!(rank_class(1), "sb-item sb-item--top2");
        assert_eq!(rank_class(2), "sb-item sb-item--top3");
        assert_eq!(rank_class(3), "sb-item");
        assert_eq!(rank_class(40), "sb-item");
    }

    #[test]
    fn test_tile_class() {
        assert_eq!(tile_class(true), "advent-tile");
        assert_eq!(tile_class(false), "advent-tile advent-tile--inactive");
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_store_result_maps_failures() {
        assert_eq!(store_result(Ok(Ok(7))).unwrap(), 7);

        let err = store_result::<i32>(Ok(Err(StoreError::MissingTeam("Yeti".to_string()))));
        assert!(matches!(err, Err(ServerFnError::ServerError(msg)) if msg.contains("Yeti")));

        // A panicking store closure surfaces as a server error.
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let joined = rt.block_on(tokio::task::spawn_blocking(
            || -> Result<i32, StoreError> { panic!("store closure panicked") },
        ));
        assert!(matches!(
            store_result(joined),
            Err(ServerFnError::ServerError(_))
        ));
    }
}
