//! Remembers the team name in the browser so a reload doesn't reset it. Nothing here is validated
//! or shared with other players.

pub const TEAM_KEY: &str = "team";

/// Returns the last saved team name, or an empty string.
pub fn load_team() -> String {
    #[cfg(feature = "hydrate")]
    {
        if let Some(storage) = local_storage() {
            return storage.get_item(TEAM_KEY).ok().flatten().unwrap_or_default();
        }
    }
    String::new()
}

/// Saves the team name exactly as typed.
pub fn save_team(team: &str) {
    #[cfg(feature = "hydrate")]
    {
        use leptos::logging::warn;

        match local_storage() {
            Some(storage) => {
                if let Err(e) = storage.set_item(TEAM_KEY, team) {
                    warn!("Could not save team name: {:?}", e);
                }
            }
            None => warn!("Local storage unavailable, team name won't survive a reload"),
        }
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = team;
}

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}
