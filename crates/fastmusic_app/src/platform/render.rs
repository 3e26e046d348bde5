use fastmusic_core::{AppViewModel, ResultRowView};

/// Turns view model changes into terminal lines.
///
/// Only what changed since the previous view is printed, so a finished
/// download does not reprint the whole result table.
#[derive(Debug, Default)]
pub struct Renderer {
    last: AppViewModel,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();
        let last = &self.last;

        if view.quality != last.quality {
            lines.push(format!("Quality: {}", view.quality));
        }
        if view.is_searching && !last.is_searching {
            lines.push(format!("Searching for {:?}...", view.query.trim()));
        }
        let rows_changed = view
            .results
            .iter()
            .map(|row| &row.id)
            .ne(last.results.iter().map(|row| &row.id));
        let results_changed = rows_changed || view.no_results_for != last.no_results_for;
        if !view.is_searching && (last.is_searching || results_changed) {
            if !view.results.is_empty() {
                lines.extend(result_table(&view.results));
            } else if let Some(query) = &view.no_results_for {
                lines.push(format!("No results found for {query:?}"));
            }
        }
        for id in view.pending.iter().filter(|id| !last.pending.contains(id)) {
            let label = view
                .results
                .iter()
                .find(|row| row.id == id.as_str())
                .map(|row| row.display_title.clone())
                .unwrap_or_else(|| id.as_str().trim_start_matches("url:").to_string());
            lines.push(format!("Downloading {label}..."));
        }
        if view.notice.is_some() && view.notice != last.notice {
            lines.extend(view.notice.clone());
        }
        if view.error.is_some() && view.error != last.error {
            lines.extend(view.error.as_ref().map(|err| format!("error: {err}")));
        }

        self.last = view.clone();
        lines
    }
}

pub fn result_table(rows: &[ResultRowView]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let marker = if row.downloading { " [downloading]" } else { "" };
            format!(
                "{:>3}. {} | {} | {} | {}{}",
                index + 1,
                row.display_title,
                row.channel,
                row.duration,
                row.id,
                marker
            )
        })
        .collect()
}
