//! Interactive explorer session.
//!
//! Each selector change on the dashboard becomes an [`InputEvent`]. Handling
//! an event runs one complete load, aggregate and render cycle and stores the
//! resulting view; a failed cycle keeps the previous view and records an
//! inline error instead.

use crate::analysis::{aggregate_pairwise, aggregate_single, top_combinations};
use crate::config::ExplorerConfig;
use crate::dataset::{Dataset, DatasetCache, DatasetSchema};
use crate::error::{CycleError, DataLoadError, InvalidFeatureError};
use crate::models::{Combination, PairwiseAggregation, SingleAggregation};
use crate::render::{bar_chart, heatmap, BarChart, Heatmap};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a session needs to run a cycle.
#[derive(Debug, Clone)]
pub struct SessionContext {
    cache: Arc<DatasetCache>,
    data_path: PathBuf,
    schema: DatasetSchema,
    explorer: ExplorerConfig,
}

impl SessionContext {
    pub fn new(
        cache: Arc<DatasetCache>,
        data_path: PathBuf,
        schema: DatasetSchema,
        explorer: ExplorerConfig,
    ) -> Self {
        Self {
            cache,
            data_path,
            schema,
            explorer,
        }
    }

    pub fn explorer(&self) -> &ExplorerConfig {
        &self.explorer
    }

    /// The session's dataset, read through the shared cache.
    pub fn dataset(&self) -> Result<Arc<Dataset>, DataLoadError> {
        self.cache.load(&self.data_path, &self.schema)
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Computing,
    Rendered,
}

/// A user selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Driver Explorer feature selector.
    SelectDriver(String),
    /// Heatmap Lab feature pair (rows, columns).
    SelectPair(String, String),
}

/// Rendered Driver Explorer tab.
#[derive(Debug, Clone, Serialize)]
pub struct DriverView {
    pub feature: String,
    pub aggregation: SingleAggregation,
    pub chart: BarChart,
    pub combinations: Vec<Combination>,
}

impl DriverView {
    /// Aggregate, chart and rank combinations for `feature`.
    pub fn build(
        dataset: &Dataset,
        feature: &str,
        explorer: &ExplorerConfig,
    ) -> Result<Self, InvalidFeatureError> {
        let outcome = dataset.outcome_column();
        let aggregation = aggregate_single(dataset, feature, outcome)?;
        let combinations = top_combinations(
            dataset,
            feature,
            dataset.feature_columns(),
            outcome,
            explorer.top_combinations,
            explorer.min_support,
        )?;

        Ok(Self {
            feature: feature.to_string(),
            chart: bar_chart(&aggregation),
            aggregation,
            combinations,
        })
    }
}

/// Rendered Heatmap Lab tab.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub feature_a: String,
    pub feature_b: String,
    pub aggregation: PairwiseAggregation,
    pub chart: Heatmap,
}

impl HeatmapView {
    /// Cross-tabulate and chart `feature_a` (rows) against `feature_b`.
    pub fn build(dataset: &Dataset, feature_a: &str, feature_b: &str) -> Result<Self, InvalidFeatureError> {
        let aggregation = aggregate_pairwise(dataset, feature_a, feature_b, dataset.outcome_column())?;

        Ok(Self {
            feature_a: feature_a.to_string(),
            feature_b: feature_b.to_string(),
            chart: heatmap(&aggregation),
            aggregation,
        })
    }
}

/// One dashboard session.
#[derive(Debug)]
pub struct Session {
    context: SessionContext,
    state: SessionState,
    driver_view: Option<DriverView>,
    heatmap_view: Option<HeatmapView>,
    driver_error: Option<String>,
    heatmap_error: Option<String>,
    cycles: u64,
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            state: SessionState::Idle,
            driver_view: None,
            heatmap_view: None,
            driver_error: None,
            heatmap_error: None,
            cycles: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn driver_view(&self) -> Option<&DriverView> {
        self.driver_view.as_ref()
    }

    pub fn heatmap_view(&self) -> Option<&HeatmapView> {
        self.heatmap_view.as_ref()
    }

    /// Inline error from the last driver selection, if it failed.
    pub fn driver_error(&self) -> Option<&str> {
        self.driver_error.as_deref()
    }

    /// Inline error from the last heatmap selection, if it failed.
    pub fn heatmap_error(&self) -> Option<&str> {
        self.heatmap_error.as_deref()
    }

    /// Number of cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle for `event`.
    ///
    /// The error is also kept as the session's inline message; callers only
    /// need the result when they care about the failure itself.
    pub fn handle(&mut self, event: InputEvent) -> Result<(), CycleError> {
        debug!("Session cycle {} for {:?}", self.cycles + 1, event);
        self.state = SessionState::Computing;
        self.cycles += 1;

        let result = match event {
            InputEvent::SelectDriver(feature) => {
                let result = self.render_driver(&feature);
                settle(result, &mut self.driver_view, &mut self.driver_error)
            }
            InputEvent::SelectPair(a, b) => {
                let result = self.render_pair(&a, &b);
                settle(result, &mut self.heatmap_view, &mut self.heatmap_error)
            }
        };

        self.state = if self.driver_view.is_some() || self.heatmap_view.is_some() {
            SessionState::Rendered
        } else {
            SessionState::Idle
        };

        result
    }

    fn render_driver(&self, feature: &str) -> Result<DriverView, CycleError> {
        let dataset = self.context.dataset()?;
        Ok(DriverView::build(&dataset, feature, &self.context.explorer)?)
    }

    fn render_pair(&self, feature_a: &str, feature_b: &str) -> Result<HeatmapView, CycleError> {
        let dataset = self.context.dataset()?;
        Ok(HeatmapView::build(&dataset, feature_a, feature_b)?)
    }
}

/// Store a cycle's view, or keep the previous one and record the error.
fn settle<V>(
    result: Result<V, CycleError>,
    view: &mut Option<V>,
    error: &mut Option<String>,
) -> Result<(), CycleError> {
    match result {
        Ok(rendered) => {
            *view = Some(rendered);
            *error = None;
            Ok(())
        }
        Err(e) => {
            warn!("Explorer input rejected: {}", e);
            *error = Some(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::tests::schema;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OVERTIME_CSV: &str = "EmployeeNumber,OverTime,Department,Attrition
1,Yes,Sales,Yes
2,Yes,Sales,Yes
3,Yes,R&D,Yes
4,Yes,R&D,No
5,Yes,Sales,No
6,Yes,R&D,No
7,No,Sales,Yes
8,No,R&D,No
9,No,R&D,No
10,No,R&D,No
";

    /// A context over the ten-row overtime scenario. Keep the file alive
    /// for as long as the context may load.
    pub(crate) fn overtime_context() -> (SessionContext, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(OVERTIME_CSV.as_bytes()).unwrap();

        let context = SessionContext::new(
            Arc::new(DatasetCache::new()),
            file.path().to_path_buf(),
            schema(),
            ExplorerConfig {
                top_combinations: 3,
                min_support: 1,
            },
        );
        (context, file)
    }

    pub(crate) fn overtime_session() -> (Session, NamedTempFile) {
        let (context, file) = overtime_context();
        (Session::new(context), file)
    }

    #[test]
    fn test_new_session_is_idle() {
        let (session, _file) = overtime_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.cycles(), 0);
        assert!(session.driver_view().is_none());
    }

    #[test]
    fn test_select_driver_renders_view() {
        let (mut session, _file) = overtime_session();
        session
            .handle(InputEvent::SelectDriver("OverTime".to_string()))
            .unwrap();

        assert_eq!(session.state(), SessionState::Rendered);
        assert_eq!(session.cycles(), 1);

        let view = session.driver_view().unwrap();
        assert_eq!(view.feature, "OverTime");
        assert_eq!(view.aggregation.groups[0].value, "Yes");
        assert_eq!(view.chart.bars.len(), 2);
        assert_eq!(view.combinations[0].value_1, "No");
        assert_eq!(view.combinations[0].value_2, "Sales");
    }

    #[test]
    fn test_one_cycle_per_event() {
        let (mut session, _file) = overtime_session();
        session.handle(InputEvent::SelectDriver("OverTime".to_string())).unwrap();
        session.handle(InputEvent::SelectDriver("Department".to_string())).unwrap();
        session
            .handle(InputEvent::SelectPair("OverTime".to_string(), "Department".to_string()))
            .unwrap();

        assert_eq!(session.cycles(), 3);
        assert_eq!(session.driver_view().unwrap().feature, "Department");
        assert_eq!(session.heatmap_view().unwrap().aggregation.rows, vec!["No", "Yes"]);
    }

    #[test]
    fn test_invalid_feature_keeps_previous_view() {
        let (mut session, _file) = overtime_session();
        session.handle(InputEvent::SelectDriver("OverTime".to_string())).unwrap();

        let err = session
            .handle(InputEvent::SelectDriver("Tenure".to_string()))
            .unwrap_err();
        assert!(matches!(err, CycleError::InvalidFeature(_)));

        assert_eq!(session.state(), SessionState::Rendered);
        assert_eq!(session.driver_view().unwrap().feature, "OverTime");
        assert!(session.driver_error().unwrap().contains("Tenure"));

        session.handle(InputEvent::SelectDriver("Department".to_string())).unwrap();
        assert!(session.driver_error().is_none());
    }

    #[test]
    fn test_errors_stay_with_their_tab() {
        let (mut session, _file) = overtime_session();
        session.handle(InputEvent::SelectDriver("OverTime".to_string())).unwrap();
        session
            .handle(InputEvent::SelectPair("OverTime".to_string(), "Tenure".to_string()))
            .unwrap_err();

        assert!(session.driver_error().is_none());
        assert!(session.heatmap_error().unwrap().contains("Tenure"));
        assert_eq!(session.driver_view().unwrap().feature, "OverTime");

        session
            .handle(InputEvent::SelectPair("OverTime".to_string(), "Department".to_string()))
            .unwrap();
        assert!(session.heatmap_error().is_none());
    }

    #[test]
    fn test_error_before_any_render_stays_idle() {
        let (mut session, _file) = overtime_session();
        let result = session.handle(InputEvent::SelectPair("OverTime".to_string(), "Tenure".to_string()));

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.cycles(), 1);
        assert!(session.heatmap_view().is_none());
    }

    #[test]
    fn test_missing_dataset_is_reported_inline() {
        let context = SessionContext::new(
            Arc::new(DatasetCache::new()),
            PathBuf::from("/nonexistent/hr.csv"),
            schema(),
            ExplorerConfig {
                top_combinations: 3,
                min_support: 1,
            },
        );
        let mut session = Session::new(context);

        let err = session
            .handle(InputEvent::SelectDriver("OverTime".to_string()))
            .unwrap_err();
        assert!(matches!(err, CycleError::DataLoad(_)));
        assert!(session.driver_error().is_some());
        assert!(session.heatmap_error().is_none());
    }
}
