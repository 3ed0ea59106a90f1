//! Local providers wired into the generic controllers over a real directory.

use bridge_desktop::TokioFileSystem;
use core_library::library::LibraryController;
use core_library::playlists::StoredPlaylistsController;
use core_library::query::Query;
use core_runtime::events::EventBus;
use provider_local::{LocalLibraryProvider, M3uPlaylistsProvider};
use std::path::Path;
use std::sync::Arc;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

async fn library(root: &Path) -> Arc<LibraryController> {
    write(
        &root.join("music/tag_cache"),
        "\
songList begin
key: one.mp3
file: one.mp3
Title: One
Artist: Band
key: two.mp3
file: two.mp3
Title: Two
Artist: Band
songList end
",
    );

    let fs = Arc::new(TokioFileSystem::new());
    let provider = LocalLibraryProvider::new(fs, root.join("music/tag_cache"), root.join("music"));
    let library = Arc::new(LibraryController::new(Arc::new(provider), EventBus::new(16)));
    library.refresh(None).await.unwrap();
    library
}

#[tokio::test]
async fn library_search_over_tag_cache() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path()).await;

    assert_eq!(library.len(), 2);
    let hits = library.search(&Query::from_pairs([("artist", vec!["band"])]).unwrap());
    assert_eq!(hits.length(), 2);
}

#[tokio::test]
async fn stored_playlist_skips_missing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let library = library(root).await;

    let music = root.join("music");
    write(
        &root.join("playlists/mix.m3u"),
        &format!(
            "#EXTM3U\n{}\n{}\n{}\n",
            music.join("one.mp3").display(),
            music.join("missing.mp3").display(),
            music.join("two.mp3").display(),
        ),
    );

    let storage = M3uPlaylistsProvider::new(Arc::new(TokioFileSystem::new()), root.join("playlists"));
    let playlists = StoredPlaylistsController::new(Arc::new(storage), library, EventBus::new(16));

    assert_eq!(playlists.refresh().await.unwrap(), 1);
    let mix = playlists.get("mix").await.unwrap();
    let names: Vec<&str> = mix.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
}

#[tokio::test]
async fn created_playlist_survives_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let library = library(dir.path()).await;

    let storage = M3uPlaylistsProvider::new(
        Arc::new(TokioFileSystem::new()),
        dir.path().join("playlists"),
    );
    let playlists = StoredPlaylistsController::new(Arc::new(storage), library.clone(), EventBus::new(16));
    playlists.refresh().await.unwrap();

    let mut created = playlists.create("fresh").await.unwrap();
    created.tracks = library.tracks();
    playlists.save(&created).await.unwrap();

    playlists.refresh().await.unwrap();
    assert_eq!(playlists.get("fresh").await.unwrap().length(), 2);
}
