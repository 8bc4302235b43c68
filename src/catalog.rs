use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Stable key for one episode, shared by favourites and listening progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(String);

impl EpisodeId {
    /// Builds the id from catalog coordinates. Indices are 0-based, the id
    /// carries 1-based season and episode numbers (`show-S1-E3`).
    pub fn derive(show_id: &str, season_index: usize, episode_index: usize) -> Self {
        Self(format!(
            "{show_id}-S{}-E{}",
            season_index + 1,
            episode_index + 1
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EpisodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EpisodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity plus display data for one playable episode.
///
/// Two references with the same `episode_id` are the same logical episode;
/// the remaining fields are display data and may be stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub episode_id: EpisodeId,
    pub url: String,
    pub episode_number: u32,
    pub episode_title: String,
    #[serde(default)]
    pub episode_description: String,
    pub show_id: String,
    pub show_title: String,
    #[serde(default)]
    pub season_title: String,
    #[serde(default)]
    pub season_image: String,
}

impl EpisodeRef {
    pub fn same_episode(&self, other: &EpisodeRef) -> bool {
        self.episode_id == other.episode_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEpisode {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres: Vec<serde_json::Value>,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

impl Show {
    pub fn episode_ref(&self, season_index: usize, episode_index: usize) -> Option<EpisodeRef> {
        let season = self.seasons.get(season_index)?;
        let episode = season.episodes.get(episode_index)?;
        Some(EpisodeRef {
            episode_id: EpisodeId::derive(&self.id, season_index, episode_index),
            url: episode.file.clone(),
            episode_number: u32::try_from(episode_index + 1).unwrap_or(u32::MAX),
            episode_title: episode.title.clone(),
            episode_description: episode.description.clone(),
            show_id: self.id.clone(),
            show_title: self.title.clone(),
            season_title: season.title.clone(),
            season_image: season.image.clone(),
        })
    }

    /// All episode references of one season, in catalog order.
    pub fn season_refs(&self, season_index: usize) -> Vec<EpisodeRef> {
        let Some(season) = self.seasons.get(season_index) else {
            return Vec::new();
        };
        (0..season.episodes.len())
            .filter_map(|episode_index| self.episode_ref(season_index, episode_index))
            .collect()
    }

    pub fn total_episodes(&self) -> usize {
        self.seasons.iter().map(|season| season.episodes.len()).sum()
    }
}

/// Already-parsed catalog as handed over by the catalog collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub shows: Vec<Show>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn find_show(&self, show_id: &str) -> Option<&Show> {
        self.shows.iter().find(|show| show.id == show_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_show() -> Show {
        Show {
            id: "s1".to_string(),
            title: "Show A".to_string(),
            image: String::new(),
            description: String::new(),
            genres: Vec::new(),
            updated: "2024-05-01T00:00:00Z".to_string(),
            seasons: vec![
                Season {
                    title: "Pilot Season".to_string(),
                    image: "https://img.example/s1.png".to_string(),
                    description: String::new(),
                    episodes: vec![
                        CatalogEpisode {
                            title: "Hello".to_string(),
                            description: String::new(),
                            file: "https://cdn.example/1.mp3".to_string(),
                        },
                        CatalogEpisode {
                            title: "Again".to_string(),
                            description: String::new(),
                            file: "https://cdn.example/2.mp3".to_string(),
                        },
                    ],
                },
                Season {
                    title: "Second".to_string(),
                    image: String::new(),
                    description: String::new(),
                    episodes: vec![CatalogEpisode {
                        title: "Back".to_string(),
                        description: String::new(),
                        file: "https://cdn.example/3.mp3".to_string(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn derived_ids_use_one_based_numbers() {
        assert_eq!(EpisodeId::derive("s1", 0, 0).as_str(), "s1-S1-E1");
        assert_eq!(EpisodeId::derive("abc", 2, 9).as_str(), "abc-S3-E10");
    }

    #[test]
    fn derived_ids_are_stable_for_same_coordinates() {
        let show = sample_show();
        let first = show.episode_ref(1, 0).expect("episode exists");
        let mut renamed = show.clone();
        renamed.title = "Show A (renamed)".to_string();
        let second = renamed.episode_ref(1, 0).expect("episode exists");

        assert_eq!(first.episode_id, second.episode_id);
        assert!(first.same_episode(&second));
        assert_eq!(first.episode_number, 1);
        assert_eq!(first.season_title, "Second");
    }

    #[test]
    fn episode_ref_is_none_out_of_range() {
        let show = sample_show();
        assert!(show.episode_ref(5, 0).is_none());
        assert!(show.episode_ref(0, 2).is_none());
        assert!(show.season_refs(7).is_empty());
    }

    #[test]
    fn season_refs_and_totals() {
        let show = sample_show();
        let refs = show.season_refs(0);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].episode_id.as_str(), "s1-S1-E2");
        assert_eq!(refs[1].url, "https://cdn.example/2.mp3");
        assert_eq!(show.total_episodes(), 3);
    }

    #[test]
    fn catalog_parses_json_and_finds_show() {
        let raw = r#"[{"id":"10","title":"Tech Talk","seasons":[{"title":"S1","episodes":[{"title":"Intro","file":"https://x/1.mp3"}]}]}]"#;
        let catalog = Catalog::from_json(raw).expect("catalog should parse");
        let show = catalog.find_show("10").expect("show should exist");
        let episode = show.episode_ref(0, 0).expect("episode should exist");
        assert_eq!(episode.episode_id.as_str(), "10-S1-E1");
        assert!(catalog.find_show("11").is_none());
    }

    #[test]
    fn episode_ref_serializes_with_camel_case_keys() {
        let episode = sample_show().episode_ref(0, 0).expect("episode exists");
        let value = serde_json::to_value(&episode).expect("serializable");
        assert_eq!(value["episodeId"], "s1-S1-E1");
        assert_eq!(value["showTitle"], "Show A");
        assert_eq!(value["episodeNumber"], 1);
    }
}
