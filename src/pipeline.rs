//! One analysis run: parse, group, match, aggregate, score

use crate::config::AnalysisConfig;
use crate::error::{Result, TerritoryError};
use crate::grouping::{group_clients, UnidentifiedRow};
use crate::metrics::{aggregate, classify_abc, filter_options, score_churn, summarize};
use crate::model::{
    AggregatedRow, ChurnRisk, Client, FilterOptions, PotentialClient, RegionCoverage,
    SummaryTotals,
};
use crate::parser::{parse_rows, read_cells};
use crate::potential::{match_potential, FreePotential};
use crate::sheets::CoordinateCache;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Where the sales rows come from
#[derive(Debug, Clone)]
pub enum SalesSource {
    File(PathBuf),
    /// Already-read cells, header row first
    Cells(Vec<Vec<String>>),
}

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub sales: SalesSource,
    pub potential: Vec<PotentialClient>,
    pub cache: Option<CoordinateCache>,
}

impl AnalysisInput {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sales: SalesSource::File(path.into()),
            potential: Vec::new(),
            cache: None,
        }
    }

    pub fn from_cells(cells: Vec<Vec<String>>) -> Self {
        Self {
            sales: SalesSource::Cells(cells),
            potential: Vec::new(),
            cache: None,
        }
    }

    pub fn with_potential(mut self, potential: Vec<PotentialClient>) -> Self {
        self.potential = potential;
        self
    }

    pub fn with_cache(mut self, cache: CoordinateCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Grouping,
    Matching,
    Aggregating,
    Scoring,
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Reading => "Reading rows",
            Stage::Grouping => "Grouping clients",
            Stage::Matching => "Matching potential",
            Stage::Aggregating => "Aggregating",
            Stage::Scoring => "Scoring churn",
            Stage::Finished => "Done",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    /// Overall completion in [0, 1]
    pub fraction: f64,
}

/// A client whose address matched several cities equally well
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousAddress {
    pub client_key: String,
    pub address: String,
    pub candidates: Vec<String>,
}

/// A client whose address resolved to no region at all; it is still
/// aggregated under the unresolved sentinel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedAddress {
    pub client_key: String,
    pub manager: String,
    pub address: String,
    pub fact: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub rows: Vec<AggregatedRow>,
    pub filters: FilterOptions,
    pub totals: SummaryTotals,
    pub coverage: Vec<RegionCoverage>,
    pub free_potential: Vec<FreePotential>,
    pub churn: Vec<ChurnRisk>,
    pub clients: Vec<Client>,
    pub unidentified: Vec<UnidentifiedRow>,
    pub ambiguous: Vec<AmbiguousAddress>,
    pub unresolved: Vec<UnresolvedAddress>,
}

/// Run the whole analysis on the calling thread
pub fn run_analysis<F>(input: &AnalysisInput, config: &AnalysisConfig, mut progress: F) -> Result<AnalysisResult>
where
    F: FnMut(Progress),
{
    config.validate()?;
    let mut report = |stage, fraction| progress(Progress { stage, fraction });

    report(Stage::Reading, 0.0);
    let parsed = match &input.sales {
        SalesSource::File(path) => parse_rows(&read_cells(path)?)?,
        SalesSource::Cells(cells) => parse_rows(cells)?,
    };
    let dropped = parsed.dropped;
    log::info!("Parsed {} rows ({} dropped)", parsed.rows.len(), dropped);

    report(Stage::Grouping, 0.3);
    let grouping = group_clients(parsed.rows, config, input.cache.as_ref());
    let mut clients = grouping.clients;
    classify_abc(&mut clients, &config.abc);

    report(Stage::Matching, 0.55);
    let matched = match_potential(&mut clients, &input.potential);

    report(Stage::Aggregating, 0.7);
    let rows = aggregate(&clients, &matched, config);
    let filters = filter_options(&rows);
    let totals = summarize(
        &rows,
        clients.len(),
        grouping.unidentified.len(),
        dropped,
        &matched,
    );

    report(Stage::Scoring, 0.85);
    let churn = score_churn(&clients, config.as_of, &config.churn);

    let ambiguous = clients
        .iter()
        .filter(|c| c.parsed.is_ambiguous())
        .map(|c| AmbiguousAddress {
            client_key: c.key.clone(),
            address: c.address.clone().unwrap_or_default(),
            candidates: c.parsed.ambiguous_candidates.clone(),
        })
        .collect();
    let unresolved: Vec<UnresolvedAddress> = clients
        .iter()
        .filter(|c| !c.parsed.is_resolved() && !c.parsed.is_ambiguous())
        .map(|c| UnresolvedAddress {
            client_key: c.key.clone(),
            manager: c.manager.clone(),
            address: c.address.clone().unwrap_or_default(),
            fact: c.fact,
        })
        .collect();
    if !unresolved.is_empty() {
        log::warn!("{} clients have no resolvable region", unresolved.len());
    }

    report(Stage::Finished, 1.0);
    Ok(AnalysisResult {
        rows,
        filters,
        totals,
        coverage: matched.coverage,
        free_potential: matched.free,
        churn,
        clients,
        unidentified: grouping.unidentified,
        ambiguous,
        unresolved,
    })
}

/// Messages from the background analysis thread
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(Progress),
    Done(Box<AnalysisResult>),
    Failed(String),
}

/// Receiving end of a background analysis. Dropping it lets the worker
/// finish unobserved.
pub struct AnalysisHandle {
    receiver: Receiver<WorkerMessage>,
    thread: Option<JoinHandle<()>>,
}

impl AnalysisHandle {
    /// Next message; `None` once the worker is gone
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.receiver.recv().ok()
    }

    /// Next message if one is waiting; never blocks
    pub fn try_recv(&self) -> Option<WorkerMessage> {
        self.receiver.try_recv().ok()
    }

    /// Block until the result, forwarding progress to `on_progress`
    pub fn wait<F>(mut self, mut on_progress: F) -> Result<AnalysisResult>
    where
        F: FnMut(Progress),
    {
        let outcome = loop {
            match self.receiver.recv() {
                Ok(WorkerMessage::Progress(p)) => on_progress(p),
                Ok(WorkerMessage::Done(result)) => break Ok(*result),
                Ok(WorkerMessage::Failed(message)) => break Err(TerritoryError::Worker(message)),
                Err(_) => {
                    break Err(TerritoryError::Worker(
                        "analysis thread exited without a result".to_string(),
                    ))
                }
            }
        };
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
        outcome
    }
}

/// Run the analysis on its own thread; results arrive as [`WorkerMessage`]s
pub fn spawn_analysis(input: AnalysisInput, config: AnalysisConfig) -> Result<AnalysisHandle> {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("territory-analysis".to_string())
        .spawn(move || {
            let progress_sender = sender.clone();
            // Send errors mean the handle was dropped; late messages are ignored
            let result = run_analysis(&input, &config, |p| {
                let _ = progress_sender.send(WorkerMessage::Progress(p));
            });
            let message = match result {
                Ok(result) => WorkerMessage::Done(Box::new(result)),
                Err(e) => WorkerMessage::Failed(e.to_string()),
            };
            let _ = sender.send(message);
        })?;

    Ok(AnalysisHandle {
        receiver,
        thread: Some(thread),
    })
}

/// Smoothing factor applied to each new remaining-time estimate
pub const ETR_SMOOTHING: f64 = 0.3;

/// Exponentially smoothed estimate of the time remaining. Create one per
/// run and keep the value returned by [`EtrSmoother::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EtrSmoother {
    estimate_secs: Option<f64>,
}

impl EtrSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the elapsed time at `fraction` complete
    pub fn update(self, elapsed: Duration, fraction: f64) -> (EtrSmoother, Option<Duration>) {
        if fraction >= 1.0 {
            return (self, Some(Duration::ZERO));
        }
        if !(fraction > 0.0) {
            return (self, self.estimate_secs.map(Duration::from_secs_f64));
        }

        let raw = elapsed.as_secs_f64() * (1.0 - fraction) / fraction;
        let smoothed = match self.estimate_secs {
            Some(previous) => ETR_SMOOTHING * raw + (1.0 - ETR_SMOOTHING) * previous,
            None => raw,
        };
        let smoothed = smoothed.max(0.0);
        (
            EtrSmoother {
                estimate_secs: Some(smoothed),
            },
            Some(Duration::from_secs_f64(smoothed)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sample() -> Vec<Vec<String>> {
        cells(&[
            &["Менеджер", "Адрес", "Объем", "Бренд", "Дата"],
            &["Иванов", "г. Москва, ул. Ленина 1", "100", "Alpha", "01.01.2024"],
            &["Иванов", "Москва Ленина 1", "50", "Alpha", "11.01.2024"],
            &["Петров", "г. Казань, ул. Баумана 3", "20", "Beta", "05.01.2024"],
            &["Петров", "", "5", "Beta", ""],
            &["Петров", "г. Казань, ул. Баумана 4", "abc", "Beta", ""],
        ])
    }

    #[test]
    fn test_run_analysis_reports_every_stage() {
        let mut stages = Vec::new();
        let input = AnalysisInput::from_cells(sample())
            .with_potential(vec![PotentialClient::new("Ромашка", "Казань, Баумана 3")]);
        let result = run_analysis(&input, &AnalysisConfig::default(), |p| stages.push(p.stage)).unwrap();

        assert_eq!(stages.first(), Some(&Stage::Reading));
        assert_eq!(stages.last(), Some(&Stage::Finished));
        assert_eq!(result.clients.len(), 2);
        assert_eq!(result.totals.fact, 170.0);
        assert_eq!(result.totals.unidentified_count, 1);
        assert_eq!(result.totals.dropped_rows, 1);
        assert_eq!(result.totals.covered_count, 1);
        assert!(result.free_potential.is_empty());
        assert_eq!(result.filters.managers, vec!["Иванов", "Петров"]);
    }

    #[test]
    fn test_unresolved_address_is_listed() {
        let input = AnalysisInput::from_cells(cells(&[
            &["Менеджер", "Адрес", "Объем"],
            &["Иванов", "ул. Неизвестная 12", "10"],
            &["Иванов", "г. Москва, ул. Ленина 1", "20"],
        ]));
        let result = run_analysis(&input, &AnalysisConfig::default(), |_| {}).unwrap();

        assert_eq!(result.clients.len(), 2);
        assert!(result.ambiguous.is_empty());
        assert!(result.unidentified.is_empty());
        assert_eq!(result.unresolved.len(), 1);
        let item = &result.unresolved[0];
        assert_eq!(item.address, "ул. Неизвестная 12");
        assert_eq!(item.manager, "Иванов");
        assert_eq!(item.fact, 10.0);
        // still counted in the totals
        assert_eq!(result.totals.fact, 30.0);
    }

    #[test]
    fn test_stage_name_honours_width() {
        assert_eq!(format!("[{:<10}]", Stage::Aggregating), "[Aggregating]");
        assert_eq!(format!("[{:<6}]", Stage::Finished), "[Done  ]");
    }

    #[test]
    fn test_try_recv_polls_until_done() {
        let handle = spawn_analysis(AnalysisInput::from_cells(sample()), AnalysisConfig::default()).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(30);
        let result = loop {
            match handle.try_recv() {
                Some(WorkerMessage::Done(result)) => break result,
                Some(WorkerMessage::Failed(message)) => panic!("analysis failed: {}", message),
                Some(WorkerMessage::Progress(_)) => {}
                None => {
                    assert!(std::time::Instant::now() < deadline, "no result in time");
                    thread::sleep(Duration::from_millis(5));
                }
            }
        };
        assert_eq!(result.clients.len(), 2);
    }

    #[test]
    fn test_spawned_analysis_delivers_result() {
        let handle = spawn_analysis(AnalysisInput::from_cells(sample()), AnalysisConfig::default()).unwrap();
        let mut updates = 0;
        let result = handle.wait(|_| updates += 1).unwrap();
        assert!(updates >= 5);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_spawned_analysis_reports_failure() {
        let bad = cells(&[&["Клиент"], &["Ромашка"]]);
        let handle = spawn_analysis(AnalysisInput::from_cells(bad), AnalysisConfig::default()).unwrap();
        match handle.wait(|_| {}) {
            Err(TerritoryError::Worker(message)) => assert!(message.contains("Missing required columns")),
            other => panic!("unexpected {:?}", other.map(|r| r.rows.len())),
        }
    }

    #[test]
    fn test_etr_smoothing() {
        let smoother = EtrSmoother::new();
        let (smoother, first) = smoother.update(Duration::from_secs(10), 0.5);
        assert_eq!(first, Some(Duration::from_secs(10)));

        let (smoother, second) = smoother.update(Duration::from_secs(30), 0.6);
        // raw 20 s, smoothed 0.3 * 20 + 0.7 * 10
        let second = second.unwrap().as_secs_f64();
        assert!((second - 13.0).abs() < 1e-9);

        let (_, done) = smoother.update(Duration::from_secs(40), 1.0);
        assert_eq!(done, Some(Duration::ZERO));

        // a fresh smoother carries nothing over
        let (_, fresh) = EtrSmoother::new().update(Duration::from_secs(30), 0.6);
        assert!((fresh.unwrap().as_secs_f64() - 20.0).abs() < 1e-9);
    }
}
