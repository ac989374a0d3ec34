use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use estudio_core::domain::{ReleaseId, TrackId, UserId};
use estudio_lib::config::{ReleaseManifest, SessionConfig};
use estudio_lib::{AppState, infrastructure::logging};
use serde::Serialize;
use tracing::warn;

/// Publish and manage releases in the Estúdio catalog.
#[derive(Debug, Parser)]
#[command(name = "estudio", version = env!("CARGO_PKG_VERSION"), about)]
struct Flags {
  /// Act as this user instead of the saved session
  #[clap(long, global = true)]
  user: Option<UserId>,
  /// subcommand to run
  #[clap(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Create a profile and save it as the current session
  Register {
    #[clap(long)]
    email: String,
    #[clap(long)]
    name: String,
  },
  /// Show the current profile
  Profile,
  /// Replace the profile photo
  Photo { path: PathBuf },
  /// Publish the release described by a JSON manifest
  Publish { manifest: PathBuf },
  /// List your works, newest first
  Works,
  /// Rename a work, or one of its tracks with --track
  Rename {
    release: ReleaseId,
    name: String,
    #[clap(long)]
    track: Option<TrackId>,
  },
  /// Change the genre of a work
  Genre { release: ReleaseId, genre: String },
  /// Delete a work and its files
  Delete { release: ReleaseId },
  /// Search the genre list
  Genres { query: Option<String> },
}

#[test]
fn verify_cli() {
  use clap::CommandFactory;
  Flags::command().debug_assert();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn main() -> anyhow::Result<()> {
  let flags = Flags::parse();
  logging::init();

  let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
  rt.block_on(run(flags))
}

async fn run(flags: Flags) -> anyhow::Result<()> {
  let state = AppState::from_config().context("failed to initialise state")?;
  let user = match flags.user {
    Some(user) => Some(user),
    None => SessionConfig::load()?.user_id,
  };

  match flags.command {
    Command::Register { email, name } => {
      let profile = estudio_lib::profile_register(&state, &email, &name).await.map_err(|e| anyhow!(e))?;
      SessionConfig { user_id: Some(profile.id) }.save()?;
      print_json(&profile)?;
    }
    Command::Profile => {
      print_json(&estudio_lib::profile_show(&state, user).await.map_err(|e| anyhow!(e))?)?;
    }
    Command::Photo { path } => {
      print_json(&estudio_lib::profile_update_photo(&state, user, &path).await.map_err(|e| anyhow!(e))?)?;
    }
    Command::Publish { manifest } => {
      let request = ReleaseManifest::load(&manifest).await?;
      let publish = estudio_lib::release_publish(&state, user, request);
      tokio::pin!(publish);

      let published = tokio::select! {
        result = &mut publish => result,
        _ = tokio::signal::ctrl_c() => {
          warn!("interrupted, cancelling publish");
          state.shutdown().cancel();
          publish.await
        }
      };
      print_json(&published.map_err(|e| anyhow!(e))?)?;
    }
    Command::Works => {
      print_json(&estudio_lib::works_list(&state, user).await.map_err(|e| anyhow!(e))?)?;
    }
    Command::Rename { release, name, track: Some(track) } => {
      estudio_lib::track_rename(&state, user, release, track, &name).await.map_err(|e| anyhow!(e))?;
    }
    Command::Rename { release, name, track: None } => {
      estudio_lib::release_rename(&state, user, release, &name).await.map_err(|e| anyhow!(e))?;
    }
    Command::Genre { release, genre } => {
      estudio_lib::release_set_genre(&state, user, release, &genre).await.map_err(|e| anyhow!(e))?;
    }
    Command::Delete { release } => {
      estudio_lib::release_delete(&state, user, release).await.map_err(|e| anyhow!(e))?;
    }
    Command::Genres { query } => {
      print_json(&estudio_lib::genres_search(query.as_deref().unwrap_or("")).map_err(|e| anyhow!(e))?)?;
    }
  }

  Ok(())
}
