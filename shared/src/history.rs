use crate::geo::GeoPoint;
use crate::model::{FavoriteEntry, RecentEntry};
use crate::{COORDINATE_TOLERANCE_DEG, MAX_RECENT_SEARCHES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// Favorites and recent searches.
///
/// Favorites are keyed by coordinate (within `tolerance_deg`), recents by name.
/// Recents are most-recent-first and never exceed `max_recents`. Every mutation
/// is synchronous; the caller writes the affected list through to storage.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    favorites: Vec<FavoriteEntry>,
    recents: Vec<RecentEntry>,
    max_recents: usize,
    tolerance_deg: f64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(MAX_RECENT_SEARCHES, COORDINATE_TOLERANCE_DEG)
    }
}

impl HistoryStore {
    #[must_use]
    pub fn new(max_recents: usize, tolerance_deg: f64) -> Self {
        Self {
            favorites: Vec::new(),
            recents: Vec::new(),
            max_recents: max_recents.max(1),
            tolerance_deg,
        }
    }

    /// Applies new limits. Recents beyond the new bound are dropped.
    pub fn set_limits(&mut self, max_recents: usize, tolerance_deg: f64) {
        self.max_recents = max_recents.max(1);
        self.tolerance_deg = tolerance_deg;
        self.recents.truncate(self.max_recents);
    }

    #[must_use]
    pub fn favorites(&self) -> &[FavoriteEntry] {
        &self.favorites
    }

    #[must_use]
    pub fn recents(&self) -> &[RecentEntry] {
        &self.recents
    }

    #[must_use]
    pub fn favorite_at(&self, index: usize) -> Option<&FavoriteEntry> {
        self.favorites.get(index)
    }

    #[must_use]
    pub fn recent_at(&self, index: usize) -> Option<&RecentEntry> {
        self.recents.get(index)
    }

    fn position_of(&self, point: GeoPoint) -> Option<usize> {
        self.favorites.iter().position(|f| {
            f.point()
                .is_ok_and(|p| p.same_spot(point, self.tolerance_deg))
        })
    }

    #[must_use]
    pub fn is_favorited(&self, point: GeoPoint) -> bool {
        self.position_of(point).is_some()
    }

    /// Removes any same-name entry, prepends, then truncates.
    pub fn add_recent(&mut self, entry: RecentEntry) {
        self.recents.retain(|r| r.name != entry.name);
        self.recents.insert(0, entry);
        self.recents.truncate(self.max_recents);
    }

    /// Adds the entry, or removes the favorite already at its coordinate.
    pub fn toggle_favorite(&mut self, entry: FavoriteEntry) -> FavoriteToggle {
        let existing = entry.point().ok().and_then(|p| self.position_of(p));
        match existing {
            Some(index) => {
                self.favorites.remove(index);
                FavoriteToggle::Removed
            }
            None => {
                self.favorites.push(entry);
                FavoriteToggle::Added
            }
        }
    }

    pub fn remove_favorite(&mut self, point: GeoPoint) -> Option<FavoriteEntry> {
        self.position_of(point).map(|i| self.favorites.remove(i))
    }

    pub fn remove_favorite_at(&mut self, index: usize) -> Option<FavoriteEntry> {
        (index < self.favorites.len()).then(|| self.favorites.remove(index))
    }

    /// Returns how many favorites were dropped.
    pub fn clear_favorites(&mut self) -> usize {
        let count = self.favorites.len();
        self.favorites.clear();
        count
    }

    /// Merges stored favorites behind the in-memory ones. Entries with invalid
    /// coordinates or duplicate spots are skipped.
    pub fn hydrate_favorites(&mut self, stored: Vec<FavoriteEntry>) {
        for entry in stored {
            let Ok(point) = entry.point() else {
                tracing::warn!(name = %entry.name, "skipping stored favorite with invalid coordinates");
                continue;
            };
            if !self.is_favorited(point) {
                self.favorites.push(entry);
            }
        }
    }

    /// Merges stored recents behind the in-memory ones, then re-bounds.
    pub fn hydrate_recents(&mut self, stored: Vec<RecentEntry>) {
        for entry in stored {
            if entry.point().is_err() {
                tracing::warn!(name = %entry.name, "skipping stored recent with invalid coordinates");
                continue;
            }
            if !self.recents.iter().any(|r| r.name == entry.name) {
                self.recents.push(entry);
            }
        }
        self.recents.truncate(self.max_recents);
    }
}
