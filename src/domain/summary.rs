use std::collections::BTreeMap;

use serde::Serialize;

use super::detection::FrameLabels;
use super::window::RecentWindow;

pub const SUMMARY_LOG_CAPACITY: usize = 30;

/// Promedio redondeado de apariciones por frame, por etiqueta.
pub type Summary = BTreeMap<String, u32>;

/// Cuenta las apariciones de cada etiqueta.
pub fn count_labels<'a, I>(labels: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.clone()).or_insert(0) += 1;
    }
    counts
}

/// Suaviza el ruido de detección sobre una ventana de frames.
///
/// Cada total se divide entre el número de frames de la ventana (no entre los
/// frames donde aparece la etiqueta) y se redondea a par en caso de empate.
/// Las etiquetas que redondean a 0 se conservan con valor 0.
///
/// Devuelve `None` con la ventana vacía.
pub fn aggregate<'a, I>(history: I) -> Option<Summary>
where
    I: IntoIterator<Item = &'a FrameLabels>,
{
    let mut frames = 0usize;
    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    for labels in history {
        frames += 1;
        for (label, n) in count_labels(labels) {
            *totals.entry(label).or_insert(0) += n;
        }
    }
    if frames == 0 {
        return None;
    }

    Some(
        totals
            .into_iter()
            .map(|(label, total)| {
                let mean = total as f64 / frames as f64;
                (label, mean.round_ties_even() as u32)
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryEntry {
    /// Segundo de reloj, "HH:MM:SS".
    pub time: String,
    pub data: Summary,
}

/// Registro de resúmenes, como máximo uno por segundo de reloj.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct SummaryLog {
    entries: RecentWindow<SummaryEntry>,
}

impl Default for SummaryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryLog {
    pub fn new() -> Self {
        Self { entries: RecentWindow::with_capacity(SUMMARY_LOG_CAPACITY) }
    }

    /// Inserta `summary` si el segundo `now` aún no tiene entrada.
    /// Nunca sobrescribe la entrada existente del mismo segundo.
    pub fn record_if_new(&mut self, summary: Summary, now: &str) -> bool {
        if self.entries.newest().is_some_and(|e| e.time == now) {
            return false;
        }
        self.entries.push_newest(SummaryEntry { time: now.to_string(), data: summary });
        true
    }

    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
