use tender_dash::data::filter::ColumnFilter;
use tender_dash::data::loader::Source;
use tender_dash::data::pipeline::{Dataset, DatasetProfile, Report, Selections};
use tender_dash::DashboardConfig;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Data(DatasetProfile),
}

// ---------------------------------------------------------------------------
// Grid sorting
// ---------------------------------------------------------------------------

/// Which grid column is sorted, and which way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<usize>,
    pub descending: bool,
}

impl SortState {
    pub fn by(column: usize, descending: bool) -> Self {
        SortState {
            column: Some(column),
            descending,
        }
    }

    /// Header click: first click sorts ascending, the next flips direction.
    pub fn toggle(&mut self, column: usize) {
        if self.column == Some(column) {
            self.descending = !self.descending;
        } else {
            *self = SortState::by(column, false);
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page state
// ---------------------------------------------------------------------------

/// One data page: its source, the prepared dataset and the latest report.
pub struct PageState {
    pub profile: DatasetProfile,
    pub use_upload: bool,
    pub upload: Option<Source>,
    pub dataset: Option<Dataset>,
    pub selections: Option<Selections>,
    pub report: Option<Report>,
    /// Load failure shown instead of the page body.
    pub error: Option<String>,
    /// Neutral hint, e.g. waiting for an upload.
    pub info: Option<String>,
    pub summary_sort: SortState,
    pub data_sort: SortState,
    loaded: bool,
}

impl PageState {
    pub fn new(profile: DatasetProfile) -> Self {
        Self {
            profile,
            use_upload: false,
            upload: None,
            dataset: None,
            selections: None,
            report: None,
            error: None,
            info: None,
            summary_sort: SortState::default(),
            data_sort: SortState::default(),
            loaded: false,
        }
    }

    /// Load the page's source the first time it is shown.
    pub fn ensure_loaded(&mut self, config: &DashboardConfig) {
        if !self.loaded {
            self.reload(config);
        }
    }

    /// Re-read the current source and reset every selection.
    pub fn reload(&mut self, config: &DashboardConfig) {
        self.loaded = true;
        self.dataset = None;
        self.selections = None;
        self.report = None;
        self.error = None;
        self.info = None;
        self.summary_sort = SortState::default();
        self.data_sort = SortState::default();

        let source = if self.use_upload {
            match &self.upload {
                Some(src) => Some(src.clone()),
                None => {
                    self.info = Some("Upload a CSV or Excel file to start.".to_string());
                    return;
                }
            }
        } else {
            None
        };

        match Dataset::prepare(self.profile, source, config) {
            Ok(dataset) => {
                log::info!(
                    "{}: {} rows, columns {:?}",
                    dataset.source_name,
                    dataset.table.row_count(),
                    dataset.table.column_names()
                );
                self.selections = Some(dataset.default_selections());
                self.dataset = Some(dataset);
                self.refresh();
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", self.profile.page_title());
                self.error = Some(format!("Error: {e}"));
            }
        }
    }

    /// Recompute the report after a selection change.
    pub fn refresh(&mut self) {
        if let (Some(ds), Some(sel)) = (&self.dataset, &self.selections) {
            let report = ds.evaluate(sel);
            if report.summary.is_some() && self.summary_sort.column.is_none() {
                // summary arrives sorted by its first sum, largest first
                self.summary_sort = SortState::by(1, true);
            }
            self.report = Some(report);
        }
    }

    /// Switch between the default file and an uploaded one.
    pub fn set_use_upload(&mut self, use_upload: bool, config: &DashboardConfig) {
        self.use_upload = use_upload;
        self.reload(config);
    }

    pub fn set_upload(&mut self, source: Source, config: &DashboardConfig) {
        self.upload = Some(source);
        self.use_upload = true;
        self.reload(config);
    }

    /// Select every option of a categorical filter.
    pub fn select_all(&mut self, column: &str) {
        if let Some(sel) = &mut self.selections {
            if let Some(ColumnFilter::Categorical { options, selected }) =
                sel.filters.get_mut(column)
            {
                *selected = options.iter().cloned().collect();
            }
        }
        self.refresh();
    }

    /// Clear a categorical filter, which shows every row again.
    pub fn select_none(&mut self, column: &str) {
        if let Some(sel) = &mut self.selections {
            sel.filters.select(column, Vec::<String>::new());
        }
        self.refresh();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    pub page: Page,
    pub tender: PageState,
    pub estimate: PageState,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            page: Page::Home,
            tender: PageState::new(DatasetProfile::Tender),
            estimate: PageState::new(DatasetProfile::Estimate),
            status_message: None,
        }
    }

    pub fn open(&mut self, page: Page) {
        self.page = page;
        self.status_message = None;
        if let Page::Data(profile) = page {
            let config = self.config.clone();
            self.page_mut(profile).ensure_loaded(&config);
        }
    }

    pub fn page_mut(&mut self, profile: DatasetProfile) -> &mut PageState {
        match profile {
            DatasetProfile::Tender => &mut self.tender,
            DatasetProfile::Estimate => &mut self.estimate,
        }
    }

    /// Current data page with the config it loads against.
    pub fn current_page(&mut self) -> Option<(&mut PageState, &DashboardConfig)> {
        match self.page {
            Page::Home => None,
            Page::Data(DatasetProfile::Tender) => Some((&mut self.tender, &self.config)),
            Page::Data(DatasetProfile::Estimate) => Some((&mut self.estimate, &self.config)),
        }
    }
}
