//! CLI command implementations

use crate::output::{self, OutputFormat};
use console::style;
use courseplay_core::{
    manifest::{parse_media_playlist, parse_playlist, ParsedPlaylist},
    net::RequestKind,
    AutoplayPolicy, CatalogClient, ControllerDeps, EngineFactory, Error, HeadlessMedia, HeadlessPlatform,
    HlsEngineFactory, HttpFetch, Intent, ManifestVerifier, MediaElement, NativeOnly, PlaybackPhase,
    PlaybackRate, Player, PlayerConfig, ReqwestFetcher,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Headless media clock resolution
const TICK: Duration = Duration::from_millis(250);

fn fetcher(config: &PlayerConfig) -> anyhow::Result<Arc<ReqwestFetcher>> {
    Ok(Arc::new(ReqwestFetcher::new(config.request_timeout())?))
}

/// List the video catalog
pub async fn list(config: &PlayerConfig, format: &str) -> anyhow::Result<()> {
    let client = CatalogClient::new(fetcher(config)?, config.clone());
    let videos = client.list().await?;
    debug!(count = videos.len(), "Catalog fetched");

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&videos)?),
        OutputFormat::Table => println!("{}", output::videos_table(&videos)),
        OutputFormat::Text => {
            println!("{} videos", videos.len());
            for v in &videos {
                println!("  {}  {}", style(&v.id).dim(), v.title);
            }
        }
    }

    Ok(())
}

/// Verify a video's manifest the way the player does before attaching the engine
pub async fn verify(config: &PlayerConfig, video_id: &str, format: &str) -> anyhow::Result<()> {
    let url = config.manifest_url(video_id)?;
    let verifier = ManifestVerifier::from_config(fetcher(config)?, config);
    let result = verifier.verify(&url).await;
    info!(video_id, ok = result.is_ok(), "Manifest verified");

    match OutputFormat::from(format) {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "video_id": video_id,
                "url": url.as_str(),
                "ok": result.is_ok(),
                "error": result.as_ref().err().map(|e| Error::from(e.clone()).user_message()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table | OutputFormat::Text => match &result {
            Ok(()) => println!("{} {}", style("OK").green().bold(), url),
            Err(e) => println!(
                "{} {} ({})",
                style("FAIL").red().bold(),
                Error::from(e.clone()).user_message(),
                e
            ),
        },
    }

    if result.is_err() {
        std::process::exit(1);
    }

    Ok(())
}

/// Show the quality ladder of a video
pub async fn levels(config: &PlayerConfig, video_id: &str, format: &str) -> anyhow::Result<()> {
    let url = config.manifest_url(video_id)?;
    let fetcher = fetcher(config)?;

    let response = fetcher.get(&url, RequestKind::Manifest).await?;
    if !response.is_success() {
        anyhow::bail!("HTTP {} for {}", response.status, url);
    }

    let levels = match parse_playlist(&response.body, &url)? {
        ParsedPlaylist::Master(levels) => levels,
        ParsedPlaylist::Media(summary) => {
            println!(
                "Single-rendition playlist: {:.1}s in {} segments",
                summary.duration, summary.segment_count
            );
            return Ok(());
        }
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&levels)?),
        OutputFormat::Table => println!("{}", output::levels_table(&levels)),
        OutputFormat::Text => {
            println!("Levels for {}:", video_id);
            for (i, l) in levels.iter().enumerate() {
                println!(
                    "  {}. {} - {} kbps {}",
                    i,
                    output::level_name(l),
                    l.bandwidth / 1000,
                    l.resolution.map(|r| r.to_string()).unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

/// Options of a headless playback session
pub struct PlayOptions {
    pub seconds: u64,
    pub autoplay: AutoplayPolicy,
    pub quality: Option<i64>,
    pub rate: Option<PlaybackRate>,
    pub native: bool,
}

/// Duration a native HLS decoder would report for `url`
async fn probe_duration(fetcher: &dyn HttpFetch, url: &Url) -> anyhow::Result<f64> {
    let response = fetcher.get(url, RequestKind::Manifest).await?;
    if !response.is_success() {
        anyhow::bail!("HTTP {}", response.status);
    }

    match parse_playlist(&response.body, url)? {
        ParsedPlaylist::Media(summary) => Ok(summary.duration),
        ParsedPlaylist::Master(levels) => {
            let first = levels.first().ok_or_else(|| anyhow::anyhow!("no levels"))?;
            let response = fetcher.get(&first.uri, RequestKind::Playlist).await?;
            Ok(parse_media_playlist(&response.body)?.duration)
        }
    }
}

/// Run a headless playback session, printing every state change
pub async fn play(config: PlayerConfig, video_id: &str, options: PlayOptions, format: &str) -> anyhow::Result<()> {
    let format = OutputFormat::from(format);
    let fetcher = fetcher(&config)?;

    let (media, media_events) = if options.native {
        HeadlessMedia::native(options.autoplay)
    } else {
        HeadlessMedia::new(options.autoplay)
    };
    let engines: Arc<dyn EngineFactory> = if options.native {
        Arc::new(NativeOnly)
    } else {
        Arc::new(HlsEngineFactory::new(fetcher.clone()))
    };

    let deps = ControllerDeps {
        config,
        media: media.clone(),
        media_events,
        platform: Arc::new(HeadlessPlatform::default()),
        engines,
        fetcher: fetcher.clone(),
    };
    let player = Player::mount(deps, video_id);
    info!(video_id, session_id = %player.session_id(), native = options.native, "Headless session mounted");
    if format != OutputFormat::Json {
        println!("{} {} (session {})", style("Playing").bold(), video_id, player.session_id());
    }

    if let Some(rate) = options.rate {
        player.dispatch(Intent::SetPlaybackRate(rate))?;
    }

    let mut updates = player.subscribe();
    let start = Instant::now();
    let deadline = start + Duration::from_secs(options.seconds);
    let mut tick = tokio::time::interval(TICK);
    let mut quality_pending = options.quality;
    let mut probed = false;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted");
                break;
            }
            _ = tick.tick() => {
                // Stand-in for the decoder: metadata first, then the clock
                if media.duration().is_none() {
                    if options.native {
                        if let (Some(source), false) = (media.source(), probed) {
                            probed = true;
                            match probe_duration(fetcher.as_ref(), &source).await {
                                Ok(duration) => media.load_metadata(duration),
                                Err(e) => {
                                    warn!(error = %e, "Duration probe failed");
                                    media.fail(Some(&e.to_string()));
                                }
                            }
                        }
                    } else {
                        let duration = player.snapshot().player.duration;
                        if duration > 0.0 {
                            media.load_metadata(duration);
                        }
                    }
                }
                media.advance(TICK.as_secs_f64());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();

                if let Some(index) = quality_pending {
                    if !snapshot.player.available_qualities.is_empty() {
                        quality_pending = None;
                        player.dispatch(Intent::SetQuality(index))?;
                    }
                }

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string(&snapshot)?),
                    OutputFormat::Text | OutputFormat::Table => {
                        println!("{}", output::status_line(start.elapsed().as_secs_f64(), &snapshot));
                    }
                }

                if snapshot.player.phase.is_terminal() {
                    break;
                }
            }
        }
    }

    let last = player.snapshot();
    player.unmount().await?;
    info!(phase = %last.player.phase, elapsed_ms = start.elapsed().as_millis() as u64, "Headless session unmounted");

    if format != OutputFormat::Json {
        let phase = match last.player.phase {
            PlaybackPhase::Failed => style(last.player.phase.to_string()).red().bold(),
            PlaybackPhase::Playing => style(last.player.phase.to_string()).green().bold(),
            _ => style(last.player.phase.to_string()).yellow(),
        };
        println!(
            "Finished: {} at {} / {} ({})",
            phase,
            courseplay_core::view::format_time(last.player.current_time),
            courseplay_core::view::format_time(last.player.duration),
            last.player.current_quality
        );
    }

    if last.player.phase.is_terminal() {
        std::process::exit(1);
    }

    Ok(())
}
