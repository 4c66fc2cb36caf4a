//! The planner: application state and every mutation of it.
//!
//! A [`Planner`] is driven from a single task. Slow work (generation
//! requests, the household subscription) runs in spawned tasks that report
//! back as [`PlannerEvent`]s, which the driver feeds to
//! [`Planner::handle_event`]. Local mutations persist the cookbook and are
//! handed to the push scheduler tagged [`Origin::Local`]; data applied from
//! the household document is tagged [`Origin::Remote`] and is never pushed
//! back.
//!
//! [`Origin::Local`]: crate::sync::Origin::Local
//! [`Origin::Remote`]: crate::sync::Origin::Remote

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::generation::{GenerationError, RecipeGenerator};
use crate::history::History;
use crate::household::HouseholdCode;
use crate::models::{GenerationSettings, Recipe, SyncData, ValidationError};
use crate::shopping::ShoppingList;
use crate::storage::{LocalStorage, StorageError};
use crate::sync::{
    DocumentStore, PushScheduler, StateChange, Subscription, SyncCoordinator,
    DEFAULT_QUIET_PERIOD,
};

pub const STATUS_PUSHED: &str = "Saved to cloud!";
pub const STATUS_PUSH_FAILED: &str = "Save failed.";
pub const STATUS_PULLED: &str = "Updated from cloud!";
pub const STATUS_NOTHING_PULLED: &str = "Sync ready.";
pub const STATUS_REMOTE_APPLIED: &str = "Synced!";

const GENERATE_AUTH_MESSAGE: &str = "API Error: The configured API Key has been reported as \
     leaked or invalid. Please update your environment variables with a valid key.";
const GENERATE_FAILED_MESSAGE: &str = "Failed to generate recipes. Please try again.";
const REGENERATE_AUTH_MESSAGE: &str =
    "API Error: API Key invalid or leaked. Please check your configuration.";
const REGENERATE_FAILED_MESSAGE: &str = "Failed to regenerate recipes.";

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("A generation request is already running.")]
    Busy,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Select at least one recipe to regenerate.")]
    NothingSelected,

    #[error("Household code cannot be blank.")]
    BlankCode,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Generate,
    Regenerate,
}

impl RequestKind {
    /// The short text shown to the user when a request of this kind fails.
    pub fn failure_message(&self, error: &GenerationError) -> String {
        match (error, self) {
            (GenerationError::Validation(e), _) => e.to_string(),
            (e, RequestKind::Generate) if e.is_auth() => GENERATE_AUTH_MESSAGE.to_string(),
            (_, RequestKind::Generate) => GENERATE_FAILED_MESSAGE.to_string(),
            (e, RequestKind::Regenerate) if e.is_auth() => REGENERATE_AUTH_MESSAGE.to_string(),
            (_, RequestKind::Regenerate) => REGENERATE_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum PlannerEvent {
    /// A generation or regeneration request finished
    Generated {
        sequence: u64,
        kind: RequestKind,
        result: Result<Vec<Recipe>, GenerationError>,
    },
    /// The household document changed on another device
    Remote(SyncData),
}

#[derive(Debug, Clone, Default)]
pub struct PlannerState {
    pub settings: GenerationSettings,
    pub recipes: Vec<Recipe>,
    pub selected: HashSet<String>,
    pub shopping: ShoppingList,
    pub history: History,
    /// Transient sync feedback
    pub status: Option<String>,
    /// Last generation failure
    pub error: Option<String>,
    pub is_generating: bool,
}

impl PlannerState {
    /// The bundle pushed to the household document.
    pub fn bundle(&self) -> SyncData {
        SyncData::new(
            self.history.items().to_vec(),
            self.shopping.items().to_vec(),
            self.recipes.clone(),
        )
    }
}

pub struct Planner {
    state: PlannerState,
    generator: RecipeGenerator,
    storage: LocalStorage,
    store: Option<Arc<dyn DocumentStore>>,
    quiet_period: Duration,
    coordinator: SyncCoordinator,
    subscription: Subscription,
    scheduler: Option<PushScheduler>,
    sequence: u64,
    events_tx: mpsc::UnboundedSender<PlannerEvent>,
    events_rx: mpsc::UnboundedReceiver<PlannerEvent>,
}

impl Planner {
    pub fn new(generator: RecipeGenerator, storage: LocalStorage) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: PlannerState::default(),
            generator,
            storage,
            store: None,
            quiet_period: DEFAULT_QUIET_PERIOD,
            coordinator: SyncCoordinator::default(),
            subscription: Subscription::inert(),
            scheduler: None,
            sequence: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_store(mut self, store: Option<Arc<dyn DocumentStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Loads the cookbook and the household code, generating and saving a
    /// code on first start, then starts syncing.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(&mut self) -> Result<(), PlannerError> {
        self.state.history = self.storage.load_history()?;

        let code = match self.storage.load_code()? {
            Some(code) => code,
            None => {
                let code = HouseholdCode::generate();
                tracing::info!("Generated household code {}", code);
                self.storage.save_code(&code)?;
                code
            }
        };
        self.set_code(Some(code));
        Ok(())
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn settings_mut(&mut self) -> &mut GenerationSettings {
        &mut self.state.settings
    }

    pub fn code(&self) -> Option<&HouseholdCode> {
        self.coordinator.code()
    }

    pub fn is_sync_configured(&self) -> bool {
        self.coordinator.is_configured()
    }

    /// Returns and clears the current status text.
    pub fn take_status(&mut self) -> Option<String> {
        self.state.status.take()
    }

    /// Returns and clears the last generation failure.
    pub fn take_error(&mut self) -> Option<String> {
        self.state.error.take()
    }

    pub async fn next_event(&mut self) -> Option<PlannerEvent> {
        self.events_rx.recv().await
    }

    // ---- generation ----

    /// Starts generating a new plan from the current settings.
    ///
    /// Returns the request's sequence number.
    pub fn start_generation(&mut self) -> Result<u64, PlannerError> {
        if self.state.is_generating {
            return Err(PlannerError::Busy);
        }
        if let Err(e) = self.state.settings.validate() {
            self.state.error = Some(e.to_string());
            return Err(e.into());
        }

        let sequence = self.begin_request();
        let generator = self.generator.clone();
        let settings = self.state.settings.clone();
        let favorites = self.state.history.items().to_vec();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = generator.generate(&settings, &favorites).await;
            let _ = tx.send(PlannerEvent::Generated {
                sequence,
                kind: RequestKind::Generate,
                result,
            });
        });
        Ok(sequence)
    }

    /// Starts replacing the selected recipes.
    pub fn start_regeneration(
        &mut self,
        options: Vec<String>,
        custom: Option<String>,
    ) -> Result<u64, PlannerError> {
        if self.state.is_generating {
            return Err(PlannerError::Busy);
        }
        if self.state.selected.is_empty() {
            return Err(PlannerError::NothingSelected);
        }

        let sequence = self.begin_request();
        let generator = self.generator.clone();
        let current = self.state.recipes.clone();
        let ids: Vec<String> = self.state.selected.iter().cloned().collect();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = generator
                .regenerate(&current, &ids, &options, custom.as_deref())
                .await;
            let _ = tx.send(PlannerEvent::Generated {
                sequence,
                kind: RequestKind::Regenerate,
                result,
            });
        });
        Ok(sequence)
    }

    /// Abandons the running request. Its result will be ignored. Returns
    /// whether a request was running.
    pub fn cancel_generation(&mut self) -> bool {
        if !self.state.is_generating {
            return false;
        }
        self.sequence += 1;
        self.state.is_generating = false;
        true
    }

    fn begin_request(&mut self) -> u64 {
        self.sequence += 1;
        self.state.is_generating = true;
        self.state.error = None;
        self.sequence
    }

    pub fn handle_event(&mut self, event: PlannerEvent) {
        match event {
            PlannerEvent::Generated {
                sequence,
                kind,
                result,
            } => self.finish_request(sequence, kind, result),
            PlannerEvent::Remote(data) => {
                self.apply_remote(data);
                self.state.status = Some(STATUS_REMOTE_APPLIED.to_string());
            }
        }
    }

    fn finish_request(
        &mut self,
        sequence: u64,
        kind: RequestKind,
        result: Result<Vec<Recipe>, GenerationError>,
    ) {
        if sequence != self.sequence {
            tracing::debug!("Dropping stale response #{}", sequence);
            return;
        }
        self.state.is_generating = false;

        match result {
            Ok(recipes) => {
                self.state.shopping = match kind {
                    RequestKind::Generate => ShoppingList::from_recipes(&recipes),
                    RequestKind::Regenerate => self.state.shopping.regenerated(&recipes),
                };
                self.state.recipes = recipes;
                self.state.selected.clear();
                self.notify_local();
            }
            Err(e) => {
                tracing::error!("{:?} request failed: {}", kind, e);
                self.state.error = Some(kind.failure_message(&e));
            }
        }
    }

    // ---- plan, cookbook and shopping list ----

    /// Selects or deselects a recipe for regeneration. Returns whether it is
    /// now selected.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if self.state.selected.remove(id) {
            false
        } else {
            self.state.selected.insert(id.to_string());
            true
        }
    }

    /// Commits the current plan to the cookbook. Returns the count added.
    pub fn commit_to_history(&mut self) -> usize {
        let added = self.state.history.commit(&self.state.recipes);
        if added > 0 {
            self.notify_local();
        }
        added
    }

    pub fn toggle_star(&mut self, id: &str) -> Option<bool> {
        let starred = self.state.history.toggle_star(id)?;
        self.notify_local();
        Some(starred)
    }

    pub fn toggle_item(&mut self, name: &str) -> usize {
        let flipped = self.state.shopping.toggle(name);
        if flipped > 0 {
            self.notify_local();
        }
        flipped
    }

    pub fn add_item(&mut self, name: &str, quantity: Option<&str>) -> bool {
        let added = self.state.shopping.add_manual(name, quantity);
        if added {
            self.notify_local();
        }
        added
    }

    pub fn clear_purchased(&mut self) -> usize {
        let removed = self.state.shopping.clear_purchased();
        if removed > 0 {
            self.notify_local();
        }
        removed
    }

    pub fn clear_shopping(&mut self) {
        self.state.shopping.clear();
        self.notify_local();
    }

    // ---- household sync ----

    /// Joins the household named by `input`.
    pub fn connect(&mut self, input: &str) -> Result<HouseholdCode, PlannerError> {
        let code = HouseholdCode::parse(input).ok_or(PlannerError::BlankCode)?;
        self.storage.save_code(&code)?;
        self.set_code(Some(code.clone()));
        Ok(code)
    }

    /// Starts a new household with a fresh code.
    pub fn generate_code(&mut self) -> Result<HouseholdCode, PlannerError> {
        let code = HouseholdCode::generate();
        self.storage.save_code(&code)?;
        self.set_code(Some(code.clone()));
        Ok(code)
    }

    pub fn disconnect(&mut self) -> Result<(), PlannerError> {
        self.storage.clear_code()?;
        self.set_code(None);
        Ok(())
    }

    fn set_code(&mut self, code: Option<HouseholdCode>) {
        // Tear down the old listener and scheduler before starting new ones.
        self.subscription.unsubscribe();
        self.scheduler = None;

        self.coordinator = SyncCoordinator::new(self.store.clone(), code);
        if !self.coordinator.is_configured() || self.coordinator.code().is_none() {
            return;
        }

        let tx = self.events_tx.clone();
        self.subscription = self.coordinator.subscribe(move |data| {
            let _ = tx.send(PlannerEvent::Remote(data));
        });
        self.scheduler = Some(PushScheduler::spawn(
            self.coordinator.clone(),
            self.quiet_period,
        ));
        if let Some(code) = self.coordinator.code() {
            tracing::info!("Syncing household {}", code);
        }
    }

    /// Pushes the current state immediately.
    pub async fn push_now(&mut self) -> bool {
        let bundle = self.state.bundle();
        let pushed = match self.coordinator.push(&bundle).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Manual push failed: {}", e);
                false
            }
        };
        let status = if pushed {
            STATUS_PUSHED
        } else {
            STATUS_PUSH_FAILED
        };
        self.state.status = Some(status.to_string());
        pushed
    }

    /// Reads the household document and applies it if present.
    pub async fn pull_now(&mut self) -> bool {
        match self.coordinator.pull().await {
            Some(data) => {
                self.apply_remote(data);
                self.state.status = Some(STATUS_PULLED.to_string());
                true
            }
            None => {
                self.state.status = Some(STATUS_NOTHING_PULLED.to_string());
                false
            }
        }
    }

    /// Replaces the cookbook and shopping list with `data`, and the plan too
    /// when `data` carries one.
    pub fn apply_remote(&mut self, data: SyncData) {
        self.state.history = History::from_items(data.history);
        self.state.shopping = ShoppingList::from_items(data.shopping_list);
        if let Some(recipes) = data.recipes {
            let ids: HashSet<&str> = recipes.iter().map(|r| r.id.as_str()).collect();
            self.state.selected.retain(|id| ids.contains(id.as_str()));
            self.state.recipes = recipes;
        }

        self.save_history();
        if let Some(scheduler) = &self.scheduler {
            scheduler.notify(StateChange::remote(self.state.bundle()));
        }
    }

    fn notify_local(&mut self) {
        self.save_history();
        if let Some(scheduler) = &self.scheduler {
            scheduler.notify(StateChange::local(self.state.bundle()));
        }
    }

    fn save_history(&self) {
        if let Err(e) = self.storage.save_history(&self.state.history) {
            tracing::error!("Failed to save history: {}", e);
        }
    }

    /// Stops syncing, sending any push still waiting out its quiet period.
    pub async fn shutdown(mut self) {
        self.subscription.unsubscribe();
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.flush().await;
        }
    }
}
