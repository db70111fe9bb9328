//! Application context
//!
//! `AppContext` owns every piece of client state (config, REST client,
//! session, receipt store, admin data) and sequences the operations the
//! front end exposes. It is passed around by `&mut` reference, so two
//! mutations can never interleave.
//!
//! Every call that reaches the server goes through `guard`: a 401 from any
//! authenticated request ends the session locally before the error is
//! returned.
//!
//! Once a write has been accepted by the server the operation succeeds, even
//! if the refresh that follows fails. Such failures are queued as notices
//! (see `take_notices`) for the front end to show alongside the result.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::admin::AdminAnalytics;
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::FilterCriteria;
use crate::models::{Attachment, Page, Receipt, ReceiptDraft, SearchQuery, Theme, User};
use crate::session::Session;
use crate::stats::{self, DashboardStats};
use crate::storage::LocalStorage;
use crate::store::{LoadTicket, ReceiptStore};

#[cfg(test)]
mod tests;

const MIN_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;

pub struct AppContext {
    config: Config,
    api: ApiClient,
    session: Session,
    receipts: ReceiptStore,
    users: Vec<User>,
    analytics: Option<AdminAnalytics>,
    notices: Vec<String>,
}

impl AppContext {
    /// Build a context over `storage`, restoring any saved session
    pub fn new(config: Config, storage: LocalStorage) -> Result<Self> {
        let mut api = ApiClient::from_config(&config)?;
        let session = Session::restore(storage)?;
        api.set_token(session.token().map(str::to_string));

        if let Some(user) = session.user() {
            debug!(user = %user.email, "Restored session");
        }

        Ok(Self {
            config,
            api,
            session,
            receipts: ReceiptStore::new(),
            users: Vec::new(),
            analytics: None,
            notices: Vec::new(),
        })
    }

    /// Build a context backed by the storage file in the configured data dir
    pub fn open(config: Config) -> Result<Self> {
        let storage = LocalStorage::open(&config.storage_path())?;
        Self::new(config, storage)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn store(&self) -> &ReceiptStore {
        &self.receipts
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn analytics(&self) -> Option<&AdminAnalytics> {
        self.analytics.as_ref()
    }

    pub fn has_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    /// Drain the notices raised by background refreshes
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    // ========== Session ==========

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Please enter both email and password".into(),
            ));
        }

        let response = match self.api.login(email, password).await {
            Err(Error::Unauthorized) => {
                return Err(Error::Validation("Invalid email or password".into()))
            }
            other => other?,
        };

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Parse("login response has no token".into()))?;

        self.api.set_token(Some(token.clone()));
        let user = match response.user {
            Some(user) => user,
            None => match self.api.current_user().await {
                Ok(user) => user,
                Err(e) => {
                    self.api.set_token(self.session.token().map(str::to_string));
                    return Err(e);
                }
            },
        };

        self.receipts.reset();
        self.users.clear();
        self.analytics = None;
        self.session.establish(&token, user.clone())?;
        Ok(user)
    }

    /// Create an account; the caller logs in separately afterwards
    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim();

        if name.chars().count() < MIN_NAME_LEN {
            return Err(Error::Validation(
                "Name must be at least 2 characters long".into(),
            ));
        }
        if !email.contains('@') {
            return Err(Error::Validation(
                "Please enter a valid email address".into(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(
                "Password must be at least 6 characters long".into(),
            ));
        }

        match self.api.register(name, email, password).await {
            Ok(user) => {
                info!(user = %user.email, "Registered account");
                Ok(user)
            }
            Err(Error::Api { status, message }) => Err(Error::Api {
                status,
                message: friendly_registration_message(message),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        self.reset_state();
        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Re-read the profile from the server and cache it
    pub async fn refresh_profile(&mut self) -> Result<User> {
        self.require_auth()?;
        let result = self.api.current_user().await;
        let user = self.guard(result)?;
        self.session.update_user(user.clone())?;
        Ok(user)
    }

    pub fn theme(&self) -> Theme {
        self.session.theme()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.session.set_theme(theme)
    }

    // ========== Receipts ==========

    /// Replace the collection with every page the server has
    ///
    /// Returns the size of the collection the store holds afterwards. If a
    /// newer load was started while this one was in flight, its result is
    /// discarded and the newer collection is what gets counted.
    pub async fn load_receipts(&mut self) -> Result<usize> {
        self.require_auth()?;
        let ticket = self.receipts.begin_load();
        let result = self.fetch_all_receipts().await;
        let receipts = self.guard(result)?;
        Ok(self.apply_load(ticket, receipts))
    }

    fn apply_load(&mut self, ticket: LoadTicket, receipts: Vec<Receipt>) -> usize {
        let fetched = receipts.len();
        if self.receipts.finish_load(ticket, receipts) {
            info!(count = fetched, "Loaded receipts");
        }
        self.receipts.all().len()
    }

    async fn fetch_all_receipts(&self) -> Result<Vec<Receipt>> {
        let size = self.config.page_size;
        let mut all = Vec::new();
        let mut page = 0;

        loop {
            let batch = self.api.list_receipts(page, size).await?;
            let last = batch.is_last(size) || batch.content.is_empty();
            debug!(page, received = batch.content.len(), last, "Fetched receipt page");
            all.extend(batch.content);
            if last {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    /// Set the filter criteria and return the resulting subset
    pub fn apply_filter(&mut self, criteria: FilterCriteria) -> &[Receipt] {
        self.receipts.set_criteria(criteria);
        self.receipts.filtered()
    }

    pub fn clear_filters(&mut self) {
        self.receipts.clear_criteria();
    }

    pub fn filtered(&self) -> &[Receipt] {
        self.receipts.filtered()
    }

    /// Fetch a single receipt from the server
    pub async fn fetch_receipt(&mut self, id: i64) -> Result<Receipt> {
        self.require_auth()?;
        let result = self.api.get_receipt(id).await;
        self.guard(result)
    }

    /// Pre-fill an edit draft from the loaded collection
    pub fn edit_draft(&self, id: i64) -> Result<ReceiptDraft> {
        self.receipts
            .find(id)
            .map(ReceiptDraft::from_receipt)
            .ok_or_else(|| Error::NotFound(format!("receipt {}", id)))
    }

    /// Create (`edit_id` = None) or update a receipt, then reload the collection
    pub async fn save_receipt(
        &mut self,
        edit_id: Option<i64>,
        draft: &ReceiptDraft,
        attachment: Option<&Attachment>,
    ) -> Result<Receipt> {
        self.require_auth()?;
        draft.validate()?;
        if let Some(file) = attachment {
            file.validate()?;
        }

        let result = match edit_id {
            Some(id) => self.api.update_receipt(id, draft, attachment).await,
            None => self.api.create_receipt(draft, attachment).await,
        };
        let saved = self.guard(result)?;
        info!(id = saved.id, updated = edit_id.is_some(), "Saved receipt");

        self.refresh_receipts_after_write().await;
        Ok(saved)
    }

    /// Delete a receipt, then reload the collection
    pub async fn delete_receipt(&mut self, id: i64) -> Result<()> {
        self.require_auth()?;
        let result = self.api.delete_receipt(id).await;
        self.guard(result)?;
        info!(id, "Deleted receipt");

        self.refresh_receipts_after_write().await;
        Ok(())
    }

    /// Server-side search; does not touch the loaded collection
    pub async fn search_receipts(&mut self, query: &SearchQuery) -> Result<Page<Receipt>> {
        self.require_auth()?;
        let result = self.api.search_receipts(query).await;
        self.guard(result)
    }

    /// Dashboard statistics over the full loaded collection
    pub fn dashboard(&self, now: NaiveDateTime) -> DashboardStats {
        stats::aggregate(self.receipts.all(), now, self.config.monthly_budget)
    }

    // ========== Admin ==========

    pub async fn load_users(&mut self) -> Result<&[User]> {
        self.session.require_admin()?;
        let result = self.api.list_users().await;
        self.users = self.guard(result)?;
        Ok(&self.users)
    }

    /// Delete a user account, then reload both users and analytics
    pub async fn delete_user(&mut self, id: i64) -> Result<()> {
        self.session.require_admin()?;
        let result = self.api.delete_user(id).await;
        self.guard(result)?;
        info!(id, "Deleted user");

        if let Some(e) = self.load_users().await.err() {
            self.note_refresh_failure("users", &e);
        }
        if self.session.is_admin() {
            if let Some(e) = self.load_analytics().await.err() {
                self.note_refresh_failure("analytics", &e);
            }
        }
        Ok(())
    }

    pub async fn load_analytics(&mut self) -> Result<&AdminAnalytics> {
        self.session.require_admin()?;
        let result = self.api.analytics().await;
        let analytics = self.guard(result)?;
        Ok(self.analytics.insert(analytics))
    }

    /// Load receipts, plus analytics when the current user is an admin
    pub async fn load_initial_data(&mut self) -> Result<()> {
        self.load_receipts().await?;
        if self.session.is_admin() {
            self.load_analytics().await?;
        }
        Ok(())
    }

    // ========== Internals ==========

    async fn refresh_receipts_after_write(&mut self) {
        if let Err(e) = self.load_receipts().await {
            self.note_refresh_failure("receipts", &e);
        }
    }

    fn note_refresh_failure(&mut self, what: &str, err: &Error) {
        warn!("Refreshing {} failed after a successful write: {}", what, err);
        self.notices
            .push(format!("Changes were saved, but refreshing {} failed: {}", what, err));
    }

    fn require_auth(&self) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// End the session locally when the server rejects the token
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                warn!("Server rejected the session token, logging out");
                self.reset_state();
                if let Err(clear_err) = self.session.clear() {
                    warn!("Failed to clear stored session: {}", clear_err);
                }
            }
        }
        result
    }

    fn reset_state(&mut self) {
        self.api.set_token(None);
        self.notices.clear();
        self.receipts.reset();
        self.users.clear();
        self.analytics = None;
    }
}

/// Map backend registration errors to messages a user can act on
fn friendly_registration_message(message: String) -> String {
    if message.contains("Email") {
        "This email is already registered or invalid".to_string()
    } else if message.contains("Password") {
        "Password must be at least 6 characters".to_string()
    } else if message.contains("Name") {
        "Name must be between 2 and 100 characters".to_string()
    } else {
        message
    }
}
