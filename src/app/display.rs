use chrono::{DateTime, Local, Utc};
use podcast_core::{EpisodeId, FavouriteRecord, ProgressRecord, format_clock};

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M %:z")
        .to_string()
}

fn favourite_row(record: &FavouriteRecord) -> String {
    format!(
        "{:<20} {:<24} {:<36} {:<22}",
        truncate(record.episode_id().as_str(), 20),
        truncate(&record.episode.show_title, 24),
        truncate(
            &format!(
                "E{}: {}",
                record.episode.episode_number, record.episode.episode_title
            ),
            36
        ),
        format_timestamp(&record.added_at)
    )
}

fn favourites_header() -> String {
    format!(
        "{:<20} {:<24} {:<36} {:<22}",
        "EPISODE ID", "SHOW", "EPISODE", "ADDED"
    )
}

pub(crate) fn render_favourites(records: &[&FavouriteRecord]) -> String {
    let mut lines = vec![favourites_header()];
    lines.extend(records.iter().map(|record| favourite_row(record)));
    lines.join("\n")
}

pub(crate) fn render_favourite_groups(groups: &[(&str, Vec<&FavouriteRecord>)]) -> String {
    let mut lines = Vec::new();
    for (show_title, records) in groups {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{show_title} ({})", records.len()));
        for record in records {
            lines.push(format!(
                "  {:<20} E{} {}",
                truncate(record.episode_id().as_str(), 20),
                record.episode.episode_number,
                record.episode.episode_title
            ));
        }
    }
    lines.join("\n")
}

pub(crate) fn render_progress(records: &[(&EpisodeId, &ProgressRecord)]) -> String {
    let mut lines = vec![format!(
        "{:<24} {:>8} {:>8} {:>5} {:<22}",
        "EPISODE ID", "POSITION", "LENGTH", "DONE", "UPDATED"
    )];
    for (episode_id, record) in records {
        lines.push(format!(
            "{:<24} {:>8} {:>8} {:>4}% {:<22}",
            truncate(episode_id.as_str(), 24),
            format_clock(record.position_seconds),
            format_clock(record.duration_seconds),
            (record.fraction() * 100.0).round() as u32,
            format_timestamp(&record.updated_at)
        ));
    }
    lines.join("\n")
}
