//! Playlist store: the song catalog and its active filtered view

use std::collections::HashSet;

use super::types::{Song, Tab};

/// The catalog plus the projection of it that is currently on screen.
///
/// The view is always rebuilt wholesale from the catalog and is never
/// patched in place, so it stays an order-preserving subsequence of the
/// catalog by construction. Callers drop their track position after every
/// rebuild; view indices do not survive one.
#[derive(Debug, Default)]
pub struct PlaylistStore {
    catalog: Vec<Song>,
    view: Vec<Song>,
}

impl PlaylistStore {
    /// Replace the catalog and reset the view to the whole of it.
    pub fn set_catalog(&mut self, songs: Vec<Song>) {
        self.catalog = songs;
        self.view = self.catalog.clone();
    }

    /// Recompute the view. A non-empty query wins over the tab: searching
    /// always matches against the full catalog, replacing whichever tab is
    /// selected, the same way the tab selector replaces a search.
    pub fn rebuild(&mut self, tab: Tab, query: &str, favorites: &HashSet<String>) {
        let query = query.trim().to_lowercase();
        self.view = if !query.is_empty() {
            self.catalog
                .iter()
                .filter(|song| {
                    song.title.to_lowercase().contains(&query)
                        || song.artist.to_lowercase().contains(&query)
                })
                .cloned()
                .collect()
        } else {
            match tab {
                Tab::All => self.catalog.clone(),
                Tab::Favorites => self
                    .catalog
                    .iter()
                    .filter(|song| favorites.contains(&song.url))
                    .cloned()
                    .collect(),
            }
        };
    }

    pub fn view(&self) -> &[Song] {
        &self.view
    }

    pub fn song_at(&self, index: usize) -> Option<&Song> {
        self.view.get(index)
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn catalog(&self) -> &[Song] {
        &self.catalog
    }
}

/// One row of the rendered playlist
#[derive(Clone, Debug)]
pub struct SongRow {
    pub title: String,
    pub artist: String,
    pub duration: Option<String>,
    pub favorite: bool,
    pub playing: bool,
}

/// Snapshot handed to the view for the playlist area
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub rows: Vec<SongRow>,
    pub selected: usize,
    pub tab: Tab,
    pub searching: bool,
    pub catalog_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str, artist: &str, url: &str) -> Song {
        Song {
            title: title.to_string(),
            artist: artist.to_string(),
            url: url.to_string(),
        }
    }

    fn catalog() -> Vec<Song> {
        vec![
            song("Alpha", "Ann", "a.mp3"),
            song("Beta", "Bob", "b.mp3"),
            song("Gamma", "Ann", "c.mp3"),
        ]
    }

    fn is_subsequence_of_catalog(store: &PlaylistStore) -> bool {
        let mut catalog = store.catalog().iter();
        store
            .view()
            .iter()
            .all(|song| catalog.any(|candidate| candidate == song))
    }

    #[test]
    fn set_catalog_shows_everything_in_order() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());
        assert_eq!(store.view(), store.catalog());
    }

    #[test]
    fn search_matches_title_or_artist_case_insensitively() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());

        store.rebuild(Tab::All, "ANN", &HashSet::new());
        let titles: Vec<_> = store.view().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Gamma"]);

        store.rebuild(Tab::All, "beta", &HashSet::new());
        let titles: Vec<_> = store.view().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Beta"]);
    }

    #[test]
    fn search_overrides_the_favorites_tab() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());
        let favorites: HashSet<String> = ["b.mp3".to_string()].into();

        store.rebuild(Tab::Favorites, "gamma", &favorites);
        let titles: Vec<_> = store.view().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Gamma"]);
    }

    #[test]
    fn favorites_tab_filters_by_membership_preserving_order() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());
        let favorites: HashSet<String> = ["c.mp3".to_string(), "a.mp3".to_string()].into();

        store.rebuild(Tab::Favorites, "", &favorites);
        let titles: Vec<_> = store.view().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Gamma"]);
        assert!(is_subsequence_of_catalog(&store));
    }

    #[test]
    fn view_is_always_a_subsequence_of_the_catalog() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());
        for query in ["", "a", "ann", "zzz"] {
            store.rebuild(Tab::All, query, &HashSet::new());
            assert!(is_subsequence_of_catalog(&store), "query {query:?}");
        }
    }

    #[test]
    fn no_match_leaves_an_empty_view() {
        let mut store = PlaylistStore::default();
        store.set_catalog(catalog());
        store.rebuild(Tab::All, "does not exist", &HashSet::new());
        assert_eq!(store.len(), 0);
        assert!(store.song_at(0).is_none());
    }
}
