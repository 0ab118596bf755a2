use crate::logging::LogStore;
use crate::tasks::{TaskEvent, TaskRunner};
use breakout_application::analysis::BreakoutAnalysis;
use breakout_application::config::Config;
use breakout_application::shared::{lookback_start, resolve_request, RequestOverrides};
use breakout_domain::value_objects::date_range::{parse_date, DEFAULT_LOOKBACK_DAYS};
use chrono::NaiveDate;
use crossterm::event::{Event as CtEvent, KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    /// Cursor position in characters.
    pub cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index(self.cursor);
        self.value.remove(idx);
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.chars().count() {
            return;
        }
        let idx = self.byte_index(self.cursor);
        self.value.remove(idx);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Symbol,
    Start,
    End,
    VolumeThreshold,
    PriceThreshold,
    HoldingPeriod,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Symbol,
        FormField::Start,
        FormField::End,
        FormField::VolumeThreshold,
        FormField::PriceThreshold,
        FormField::HoldingPeriod,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Symbol => "Stock Symbol",
            FormField::Start => "Start Date",
            FormField::End => "End Date",
            FormField::VolumeThreshold => "Volume Threshold (%)",
            FormField::PriceThreshold => "Price Change Threshold (%)",
            FormField::HoldingPeriod => "Holding Period (days)",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Symbol => Self::Start,
            Self::Start => Self::End,
            Self::End => Self::VolumeThreshold,
            Self::VolumeThreshold => Self::PriceThreshold,
            Self::PriceThreshold => Self::HoldingPeriod,
            Self::HoldingPeriod => Self::Symbol,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Symbol => Self::HoldingPeriod,
            Self::Start => Self::Symbol,
            Self::End => Self::Start,
            Self::VolumeThreshold => Self::End,
            Self::PriceThreshold => Self::VolumeThreshold,
            Self::HoldingPeriod => Self::PriceThreshold,
        }
    }
}

pub struct FormState {
    pub selected: FormField,
    pub symbol: TextInput,
    pub start: TextInput,
    pub end: TextInput,
    pub volume_threshold: TextInput,
    pub price_threshold: TextInput,
    pub holding_period: TextInput,
}

impl FormState {
    /// Prefilled from the config; dates fall back to the trailing year ending today.
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        let analysis = &config.analysis;
        let end = analysis
            .end
            .as_deref()
            .and_then(|raw| parse_date(raw).ok())
            .unwrap_or(today);
        let lookback = if analysis.lookback_days > 0 {
            analysis.lookback_days
        } else {
            DEFAULT_LOOKBACK_DAYS
        };
        let start = analysis
            .start
            .as_deref()
            .and_then(|raw| parse_date(raw).ok())
            .or_else(|| lookback_start(end, lookback).ok())
            .or_else(|| lookback_start(end, DEFAULT_LOOKBACK_DAYS).ok())
            .unwrap_or(end);

        Self {
            selected: FormField::Symbol,
            symbol: TextInput::new(analysis.symbol.clone()),
            start: TextInput::new(start.to_string()),
            end: TextInput::new(end.to_string()),
            volume_threshold: TextInput::new(format_number(analysis.volume_threshold_pct)),
            price_threshold: TextInput::new(format_number(analysis.price_change_threshold_pct)),
            holding_period: TextInput::new(analysis.holding_period.to_string()),
        }
    }

    pub fn input(&self, field: FormField) -> &TextInput {
        match field {
            FormField::Symbol => &self.symbol,
            FormField::Start => &self.start,
            FormField::End => &self.end,
            FormField::VolumeThreshold => &self.volume_threshold,
            FormField::PriceThreshold => &self.price_threshold,
            FormField::HoldingPeriod => &self.holding_period,
        }
    }

    fn selected_input_mut(&mut self) -> &mut TextInput {
        match self.selected {
            FormField::Symbol => &mut self.symbol,
            FormField::Start => &mut self.start,
            FormField::End => &mut self.end,
            FormField::VolumeThreshold => &mut self.volume_threshold,
            FormField::PriceThreshold => &mut self.price_threshold,
            FormField::HoldingPeriod => &mut self.holding_period,
        }
    }

    /// Parses every field; bounds are checked later by the use case.
    pub fn to_overrides(&self) -> Result<RequestOverrides, String> {
        let number = |field: FormField| -> Result<f64, String> {
            let raw = self.input(field).value.trim();
            raw.parse::<f64>()
                .map_err(|_| format!("{}: '{}' is not a number", field.label(), raw))
        };
        let date = |field: FormField| -> Result<NaiveDate, String> {
            parse_date(&self.input(field).value).map_err(|err| format!("{}: {err}", field.label()))
        };
        let holding_raw = self.holding_period.value.trim();
        let holding_period = holding_raw.parse::<usize>().map_err(|_| {
            format!(
                "{}: '{}' is not a whole number of days",
                FormField::HoldingPeriod.label(),
                holding_raw
            )
        })?;

        Ok(RequestOverrides {
            symbol: Some(self.symbol.value.clone()),
            start: Some(date(FormField::Start)?),
            end: Some(date(FormField::End)?),
            volume_threshold_pct: Some(number(FormField::VolumeThreshold)?),
            price_change_threshold_pct: Some(number(FormField::PriceThreshold)?),
            holding_period: Some(holding_period),
        })
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Form,
    Results,
}

pub struct App {
    pub config: Arc<Config>,
    pub config_path: Option<PathBuf>,
    pub today: NaiveDate,
    pub form: FormState,
    pub focus: Focus,
    pub running: bool,
    pub started_at: Option<Instant>,
    pub analysis: Option<Arc<BreakoutAnalysis>>,
    pub results_scroll: usize,
    pub logs: Arc<parking_lot::Mutex<LogStore>>,
    pub log_scroll: usize,
    pub task_runner: TaskRunner,
    pub dirty: bool,
    pub spinner: usize,
    pub last_error: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        today: NaiveDate,
        logs: Arc<parking_lot::Mutex<LogStore>>,
        task_runner: TaskRunner,
    ) -> Self {
        let form = FormState::from_config(&config, today);
        Self {
            config: Arc::new(config),
            config_path,
            today,
            form,
            focus: Focus::Form,
            running: false,
            started_at: None,
            analysis: None,
            results_scroll: 0,
            logs,
            log_scroll: 0,
            task_runner,
            dirty: true,
            spinner: 0,
            last_error: None,
            info_message: None,
        }
    }

    pub fn spawn_input_reader(&self, tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>) {
        std::thread::spawn(move || {
            while let Ok(event) = crossterm::event::read() {
                if tx.send(TaskEvent::Input(event)).is_err() {
                    break;
                }
            }
        });
    }

    pub fn on_tick(&mut self) {
        if self.running {
            self.spinner = (self.spinner + 1) % 4;
            self.dirty = true;
        }
    }

    pub fn on_event(&mut self, event: TaskEvent) -> Result<bool, String> {
        match event {
            TaskEvent::Input(ct) => self.on_input(ct),
            TaskEvent::AnalysisFinished(result) => {
                self.running = false;
                self.started_at = None;
                self.results_scroll = 0;
                match result {
                    Ok(analysis) => {
                        self.last_error = None;
                        self.info_message = (!analysis.has_breakouts())
                            .then(|| analysis.no_breakouts_message());
                        if analysis.has_breakouts() {
                            self.focus = Focus::Results;
                        }
                        self.analysis = Some(Arc::new(analysis));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "analysis failed");
                        self.analysis = None;
                        self.info_message = None;
                        self.last_error = Some(err);
                    }
                }
                self.dirty = true;
                Ok(false)
            }
            TaskEvent::ExportFinished(result) => {
                match result {
                    Ok(export) => {
                        self.last_error = None;
                        self.info_message =
                            Some(format!("exported {}", export.csv_path.display()));
                    }
                    Err(err) => self.last_error = Some(err),
                }
                self.dirty = true;
                Ok(false)
            }
        }
    }

    fn on_input(&mut self, event: CtEvent) -> Result<bool, String> {
        match event {
            CtEvent::Key(key) => self.on_key(key),
            CtEvent::Resize(_, _) => {
                self.dirty = true;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<bool, String> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return Ok(true),
            KeyCode::Esc => return Ok(true),
            KeyCode::Char('e') if ctrl => {
                self.start_export();
                self.dirty = true;
                return Ok(false);
            }
            KeyCode::F(5) => {
                self.start_analysis();
                self.dirty = true;
                return Ok(false);
            }
            KeyCode::PageUp => {
                let total = self.logs.lock().len();
                self.log_scroll = (self.log_scroll + 5).min(total);
                self.dirty = true;
                return Ok(false);
            }
            KeyCode::PageDown => {
                self.log_scroll = self.log_scroll.saturating_sub(5);
                self.dirty = true;
                return Ok(false);
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Form => Focus::Results,
                    Focus::Results => Focus::Form,
                };
                self.dirty = true;
                return Ok(false);
            }
            _ => {}
        }

        match self.focus {
            Focus::Form => self.handle_form_keys(key),
            Focus::Results => self.handle_results_keys(key),
        }
        self.dirty = true;
        Ok(false)
    }

    fn handle_form_keys(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.start_analysis(),
            KeyCode::Up | KeyCode::BackTab => self.form.selected = self.form.selected.prev(),
            KeyCode::Down => self.form.selected = self.form.selected.next(),
            KeyCode::Backspace => self.form.selected_input_mut().backspace(),
            KeyCode::Delete => self.form.selected_input_mut().delete(),
            KeyCode::Left => self.form.selected_input_mut().move_left(),
            KeyCode::Right => self.form.selected_input_mut().move_right(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.selected_input_mut().insert_char(ch);
            }
            _ => {}
        }
    }

    fn handle_results_keys(&mut self, key: KeyEvent) {
        let rows = self.analysis.as_ref().map(|a| a.events.len()).unwrap_or(0);
        match key.code {
            KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::Down => {
                self.results_scroll = (self.results_scroll + 1).min(rows.saturating_sub(1));
            }
            KeyCode::Home => self.results_scroll = 0,
            KeyCode::End => self.results_scroll = rows.saturating_sub(1),
            KeyCode::Char('x') => self.start_export(),
            KeyCode::Enter | KeyCode::Char('r') => self.start_analysis(),
            _ => {}
        }
    }

    /// Ignored while an analysis is already in flight.
    pub fn start_analysis(&mut self) {
        if self.running {
            return;
        }
        let request = match self
            .form
            .to_overrides()
            .and_then(|overrides| resolve_request(&self.config, &overrides, self.today))
        {
            Ok(request) => request,
            Err(err) => {
                self.last_error = Some(err);
                return;
            }
        };

        tracing::info!(symbol = %request.symbol, start = %request.start, end = %request.end, "analysis requested");
        self.running = true;
        self.started_at = Some(Instant::now());
        self.last_error = None;
        self.info_message = None;
        self.task_runner
            .start_analysis(Arc::clone(&self.config), request, self.today);
    }

    pub fn start_export(&mut self) {
        let Some(analysis) = self.analysis.as_ref().filter(|a| a.has_breakouts()) else {
            self.last_error = Some("nothing to export: run an analysis with breakouts first".to_string());
            return;
        };
        let out_dir = PathBuf::from(&self.config.output.out_dir);
        self.task_runner.start_export(
            Arc::clone(analysis),
            out_dir,
            self.config.output.summary_json,
        );
    }

    pub fn spinner_char(&self) -> char {
        match self.spinner {
            0 => '|',
            1 => '/',
            2 => '-',
            _ => '\\',
        }
    }
}
