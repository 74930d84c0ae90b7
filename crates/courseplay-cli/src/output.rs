//! Output formatting for CLI

use courseplay_core::{manifest::LevelInfo, view::format_time, PlayerSnapshot, QualityLevel, VideoRecord};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[derive(Tabled)]
struct VideoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn videos_table(videos: &[VideoRecord]) -> String {
    let rows = videos.iter().map(|v| VideoRow {
        id: v.id.clone(),
        title: v.title.clone(),
        description: v.description.clone().unwrap_or_default(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "Bandwidth")]
    bandwidth: String,
    #[tabled(rename = "Codecs")]
    codecs: String,
}

pub fn level_name(level: &LevelInfo) -> String {
    QualityLevel::new(0, level.resolution, level.bandwidth).name
}

pub fn levels_table(levels: &[LevelInfo]) -> String {
    let rows = levels.iter().enumerate().map(|(index, l)| LevelRow {
        index,
        name: level_name(l),
        resolution: l.resolution.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        bandwidth: format!("{} kbps", l.bandwidth / 1000),
        codecs: l.codecs.clone().unwrap_or_else(|| "-".into()),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One status line for a playback snapshot
pub fn status_line(elapsed_secs: f64, snapshot: &PlayerSnapshot) -> String {
    let p = &snapshot.player;
    let volume = if p.is_muted {
        "muted".to_string()
    } else {
        format!("vol {:.0}%", p.volume * 100.0)
    };
    let mut line = format!(
        "[{:>6.2}s] {:<10} {} / {}  {:<6} {}x  {}",
        elapsed_secs,
        p.phase.to_string(),
        format_time(p.current_time),
        format_time(p.duration),
        p.current_quality.as_str(),
        p.playback_rate,
        volume,
    );
    if let Some(error) = &p.error {
        line.push_str(&format!("  ! {error}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseplay_core::Resolution;
    use url::Url;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("whatever"), OutputFormat::Text);
    }

    #[test]
    fn test_level_names() {
        let level = LevelInfo {
            bandwidth: 128_000,
            resolution: None,
            codecs: None,
            frame_rate: None,
            uri: Url::parse("https://example.com/a.m3u8").unwrap(),
        };
        assert_eq!(level_name(&level), "128k");

        let level = LevelInfo {
            resolution: Some(Resolution::new(1280, 720)),
            ..level
        };
        assert_eq!(level_name(&level), "720p");
        assert!(levels_table(&[level]).contains("1280x720"));
    }
}
