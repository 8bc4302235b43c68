mod display;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use podcast_core::{
    Catalog, EpisodeId, FavouritesRegistry, Mutation, ProgressTracker, SharedStore, SqliteStore,
    ThemeSetting, WriteOutcome,
};

use crate::cli::{Cli, Command};
use crate::paths::state_db_path;

use self::display::{render_favourite_groups, render_favourites, render_progress};

pub fn run(cli: Cli) -> Result<()> {
    let store = open_store()?;

    let message = match cli.command {
        Some(Command::Status) | None => status(&store),
        Some(Command::Favourites { group }) => list_favourites(&store, group),
        Some(Command::Favourite {
            catalog,
            show,
            season,
            episode,
        }) => add_favourite(&store, &catalog, &show, season, episode)?,
        Some(Command::Unfavourite { episode_id }) => remove_favourite(&store, &episode_id)?,
        Some(Command::Progress) => list_progress(&store),
        Some(Command::ClearProgress) => clear_progress(&store)?,
        Some(Command::Theme { toggle }) => theme(&store, toggle)?,
    };
    println!("{message}");
    Ok(())
}

fn open_store() -> Result<SharedStore> {
    let db_path = state_db_path()?;
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open state database at {}", db_path.display()))?;
    store.migrate().context("failed to prepare state database")?;
    Ok(Rc::new(store))
}

fn ensure_persisted(outcome: WriteOutcome) -> Result<()> {
    match outcome {
        WriteOutcome::Persisted => Ok(()),
        WriteOutcome::MemoryOnly(err) => Err(anyhow!(err).context("change was not saved")),
    }
}

pub(crate) fn status(store: &SharedStore) -> String {
    let favourites = FavouritesRegistry::load(store.clone());
    let progress = ProgressTracker::load(store.clone());
    let theme = ThemeSetting::load(store.clone());
    format!(
        "Favourites: {}\nEpisodes with progress: {}\nTheme: {}",
        favourites.len(),
        progress.len(),
        theme.current()
    )
}

pub(crate) fn list_favourites(store: &SharedStore, group: bool) -> String {
    let favourites = FavouritesRegistry::load(store.clone());
    if favourites.is_empty() {
        return "No favourites yet.".to_string();
    }
    if group {
        let groups: Vec<_> = favourites
            .grouped_by_show()
            .into_iter()
            .map(|group| (group.show_title, group.records))
            .collect();
        render_favourite_groups(&groups)
    } else {
        let records: Vec<_> = favourites.list().iter().collect();
        render_favourites(&records)
    }
}

pub(crate) fn add_favourite(
    store: &SharedStore,
    catalog_path: &Path,
    show_id: &str,
    season: usize,
    episode: usize,
) -> Result<String> {
    let catalog = Catalog::load(catalog_path)
        .with_context(|| format!("failed to read catalog {}", catalog_path.display()))?;
    let show = catalog
        .find_show(show_id)
        .ok_or_else(|| anyhow!("show {show_id} not found in catalog"))?;
    let episode_ref = season
        .checked_sub(1)
        .zip(episode.checked_sub(1))
        .and_then(|(season_index, episode_index)| show.episode_ref(season_index, episode_index))
        .ok_or_else(|| {
            anyhow!(
                "season {season} episode {episode} does not exist in {}",
                show.title
            )
        })?;

    let episode_id = episode_ref.episode_id.clone();
    let title = episode_ref.episode_title.clone();
    let mut favourites = FavouritesRegistry::load(store.clone());
    match favourites.add(episode_ref) {
        Mutation::Unchanged => Ok(format!("Already a favourite: {episode_id} ({title})")),
        Mutation::Applied(outcome) => {
            ensure_persisted(outcome)?;
            Ok(format!("Added favourite: {episode_id} ({title})"))
        }
    }
}

pub(crate) fn remove_favourite(store: &SharedStore, episode_id: &str) -> Result<String> {
    let mut favourites = FavouritesRegistry::load(store.clone());
    match favourites.remove(&EpisodeId::from(episode_id)) {
        Mutation::Unchanged => Ok(format!("Not a favourite: {episode_id}")),
        Mutation::Applied(outcome) => {
            ensure_persisted(outcome)?;
            Ok(format!("Removed favourite: {episode_id}"))
        }
    }
}

pub(crate) fn list_progress(store: &SharedStore) -> String {
    let progress = ProgressTracker::load(store.clone());
    if progress.is_empty() {
        return "No listening progress saved.".to_string();
    }
    let records: Vec<_> = progress.all().collect();
    render_progress(&records)
}

pub(crate) fn clear_progress(store: &SharedStore) -> Result<String> {
    let mut progress = ProgressTracker::load(store.clone());
    let count = progress.len();
    ensure_persisted(progress.clear_all())?;
    Ok(format!("Cleared listening progress for {count} episode(s)."))
}

pub(crate) fn theme(store: &SharedStore, toggle: bool) -> Result<String> {
    let mut setting = ThemeSetting::load(store.clone());
    if toggle {
        ensure_persisted(setting.toggle())?;
        return Ok(format!("Theme switched to {}", setting.current()));
    }
    Ok(format!("Theme: {}", setting.current()))
}
