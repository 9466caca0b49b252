#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CatalogEntry {
    pub(crate) movie_id: &'static str,
    pub(crate) title: &'static str,
    pub(crate) description: &'static str,
}

/// The three canned movies the backend always serves, in display order.
pub(crate) static CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        movie_id: "movie1",
        title: "The Long Signal",
        description: "A lighthouse keeper on a remote island starts receiving radio messages \
                      from a ship that sank forty years ago.",
    },
    CatalogEntry {
        movie_id: "movie2",
        title: "Paper Cities",
        description: "Two rival origami artists are forced to collaborate on a city-sized \
                      installation before the festival opens.",
    },
    CatalogEntry {
        movie_id: "movie3",
        title: "Night Shift at Kepler Station",
        description: "The only engineer awake on an orbital station has eight hours to find \
                      out why the lights keep moving.",
    },
];

pub(crate) fn find_entry(movie_id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.movie_id == movie_id)
}

pub(crate) fn display_title(movie_id: &str) -> &str {
    find_entry(movie_id).map_or(movie_id, |entry| entry.title)
}

/// Pins a reported percentage into the drawable range. Non-finite values
/// draw as an empty bar.
pub(crate) fn clamp_percent(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Percent watched at `current_time`, or `None` when the duration is not
/// usable yet.
pub(crate) fn playback_percent(current_time: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    let current = if current_time.is_finite() {
        current_time
    } else {
        0.0
    };
    Some(clamp_percent(current / duration * 100.0))
}

pub(crate) fn build_progress_gauge(percent: f64) -> (f64, String) {
    let clamped = clamp_percent(percent);
    (clamped / 100.0, format!("{}%", clamped.round() as u32))
}

pub(crate) fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let total = seconds.floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
