use std::{sync::Arc, time::Duration};

use {
    askgeorge_common::types::{Coordinate, InboundMessage},
    askgeorge_config::{MessagesConfig, SearchConfig},
    askgeorge_places::{Place, PlaceStore},
    askgeorge_providers::{GeocodeOutcome, Geocoder, LinkShortener, PlaceDetailsProvider},
    askgeorge_sessions::SessionStore,
    chrono::{DateTime, Utc},
    chrono_tz::Tz,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use askgeorge_metrics::{
    counter, histogram, labels, reply as reply_metrics, session as session_metrics,
};

use crate::{
    background::BackgroundWrites,
    clock::{Clock, SystemClock},
    enrich::{CacheWrite, cache_writes, enrich_page},
    error::{Error, Result},
    format::format_page,
    locks::{SenderGuard, SenderLocks},
    normalize::SearchQuery,
    state::{Action, Intent, SenderState, classify, decide},
};

/// What to send back. Every variant is a normal reply; failures are [`Error`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Welcome text: first contact, or NEXT after the search expired.
    Help(String),
    NotFound(String),
    Ambiguous(String),
    NoMoreResults(String),
    /// A page of nearby places.
    Results { text: String, places: usize },
}

impl ReplyOutcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Help(text)
            | Self::NotFound(text)
            | Self::Ambiguous(text)
            | Self::NoMoreResults(text)
            | Self::Results { text, .. } => text,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Help(text)
            | Self::NotFound(text)
            | Self::Ambiguous(text)
            | Self::NoMoreResults(text)
            | Self::Results { text, .. } => text,
        }
    }

    /// Metric label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Help(_) => "help",
            Self::NotFound(_) => "not_found",
            Self::Ambiguous(_) => "ambiguous",
            Self::NoMoreResults(_) => "no_more_results",
            Self::Results { .. } => "results",
        }
    }
}

/// Tunables for the reply pipeline.
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub page_size: u32,
    pub inactivity: Duration,
    /// Zone whose calendar day selects today's opening hours.
    pub timezone: Tz,
    pub messages: MessagesConfig,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default(), &MessagesConfig::default())
    }
}

impl ReplySettings {
    pub fn from_config(search: &SearchConfig, messages: &MessagesConfig) -> Self {
        let timezone = search.tz().unwrap_or_else(|| {
            warn!(timezone = %search.timezone, "unknown timezone, using America/New_York");
            chrono_tz::America::New_York
        });
        Self {
            page_size: search.page_size.max(1),
            inactivity: search.inactivity(),
            timezone,
            messages: messages.clone(),
        }
    }
}

/// The stores and services a reply depends on.
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub places: Arc<dyn PlaceStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub details: Arc<dyn PlaceDetailsProvider>,
    pub shortener: Arc<dyn LinkShortener>,
}

/// Session orchestrator: turns one inbound text into one reply.
///
/// Messages from the same sender are handled one at a time, so the page
/// cursor read and its write-back never interleave.
pub struct AutoReply {
    sessions: Arc<dyn SessionStore>,
    places: Arc<dyn PlaceStore>,
    geocoder: Arc<dyn Geocoder>,
    details: Arc<dyn PlaceDetailsProvider>,
    shortener: Arc<dyn LinkShortener>,
    clock: Arc<dyn Clock>,
    settings: ReplySettings,
    locks: SenderLocks,
    background: BackgroundWrites,
}

impl AutoReply {
    pub fn new(collaborators: Collaborators, settings: ReplySettings) -> Self {
        let Collaborators {
            sessions,
            places,
            geocoder,
            details,
            shortener,
        } = collaborators;
        Self {
            sessions,
            places,
            geocoder,
            details,
            shortener,
            clock: Arc::new(SystemClock),
            settings,
            locks: SenderLocks::new(),
            background: BackgroundWrites::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &ReplySettings {
        &self.settings
    }

    /// Wait for outstanding history, activity, and cache writes.
    pub async fn drain_background(&self) {
        self.background.drain().await;
    }

    /// Process an inbound message and produce a reply.
    pub async fn get_reply(&self, msg: &InboundMessage) -> Result<ReplyOutcome> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        #[cfg(feature = "metrics")]
        counter!(reply_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

        info!(sender = %msg.from, body = %msg.body, "incoming message");

        let result = self.handle(msg).await;

        match &result {
            Ok(outcome) => {
                debug!(sender = %msg.from, outcome = outcome.label(), "reply ready");
                #[cfg(feature = "metrics")]
                counter!(reply_metrics::REPLIES_TOTAL, labels::OUTCOME => outcome.label())
                    .increment(1);
            },
            Err(e) => {
                error!(
                    sender = %msg.from,
                    error = %e,
                    data_integrity = e.is_data_integrity(),
                    "no reply sent"
                );
                #[cfg(feature = "metrics")]
                counter!(reply_metrics::FAILURES_TOTAL, labels::ERROR_TYPE => e.kind())
                    .increment(1);
            },
        }

        #[cfg(feature = "metrics")]
        histogram!(reply_metrics::DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        result
    }

    async fn handle(&self, msg: &InboundMessage) -> Result<ReplyOutcome> {
        let sender = msg.from.as_str();
        let guard = self.locks.lock(sender).await;

        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        let state = if self.sessions.find_session(sender).await?.is_none() {
            self.sessions
                .create_session(sender, &msg.origin(), now_ms)
                .await?;
            info!(sender, "session created");
            #[cfg(feature = "metrics")]
            counter!(session_metrics::CREATED_TOTAL).increment(1);
            SenderState::New
        } else {
            // Read before this message's own activity write lands.
            let age = self.sessions.last_active_age(sender, now_ms).await?;
            classify(age, self.settings.inactivity)
        };

        self.record_message(sender, &msg.body, now_ms);

        let action = decide(state, Intent::parse(&msg.body));
        debug!(sender, state = state.as_str(), ?action, "classified message");

        let result = match action {
            Action::Welcome | Action::Help => {
                Ok(ReplyOutcome::Help(self.settings.messages.help.clone()))
            },
            Action::NewSearch => self.new_search(sender, &msg.body, now).await,
            Action::ContinueSearch => self.continue_search(sender, now).await,
        };

        self.touch_last_active(sender, now_ms, guard);
        result
    }

    fn record_message(&self, sender: &str, body: &str, now_ms: i64) {
        let sessions = Arc::clone(&self.sessions);
        let (who, text) = (sender.to_string(), body.to_string());
        self.background.spawn("record_message", async move {
            sessions.record_message(&who, &text, now_ms).await
        });
    }

    /// The sender stays locked until the new timestamp is stored, so their
    /// next text is classified against it. The reply does not wait.
    fn touch_last_active(&self, sender: &str, now_ms: i64, guard: SenderGuard) {
        let sessions = Arc::clone(&self.sessions);
        let who = sender.to_string();
        self.background.spawn("touch_last_active", async move {
            let _guard = guard;
            sessions.touch_last_active(&who, now_ms).await
        });
    }

    async fn new_search(
        &self,
        sender: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<ReplyOutcome> {
        let query = SearchQuery::new(body);
        info!(sender, search = %query.normalized, "new search");

        let location = match self.geocoder.geocode(&query.normalized).await? {
            GeocodeOutcome::Found(location) => location,
            GeocodeOutcome::NotFound => {
                return Ok(ReplyOutcome::NotFound(
                    self.settings.messages.not_found.clone(),
                ));
            },
            GeocodeOutcome::Ambiguous(count) => {
                debug!(sender, count, "ambiguous address");
                return Ok(ReplyOutcome::Ambiguous(
                    self.settings.messages.ambiguous.clone(),
                ));
            },
        };

        self.sessions
            .update_active_location(sender, location)
            .await?;
        let page = self.page(location, 0).await?;
        let rendered = self.render(page, now).await;

        // The cursor counts pages already sent; a failed first page sends none.
        let sent = u32::from(rendered.is_ok());
        self.sessions.set_page_cursor(sender, sent).await?;
        rendered
    }

    async fn continue_search(&self, sender: &str, now: DateTime<Utc>) -> Result<ReplyOutcome> {
        let location = self.sessions.active_location(sender).await?.ok_or_else(|| {
            Error::MissingActiveLocation {
                sender: sender.to_string(),
            }
        })?;
        let cursor = self.sessions.page_cursor(sender).await?;
        let offset = cursor.saturating_mul(self.settings.page_size);
        debug!(sender, page = cursor, offset, "continuing search");

        let page = self.page(location, offset).await?;
        if page.is_empty() {
            return Ok(ReplyOutcome::NoMoreResults(
                self.settings.messages.no_more_results.clone(),
            ));
        }
        let outcome = self.render(page, now).await?;
        self.sessions.set_page_cursor(sender, cursor + 1).await?;
        Ok(outcome)
    }

    async fn page(&self, origin: Coordinate, offset: u32) -> Result<Vec<Place>> {
        Ok(self
            .places
            .nearest(origin, self.settings.page_size, offset)
            .await?)
    }

    async fn render(&self, page: Vec<Place>, now: DateTime<Utc>) -> Result<ReplyOutcome> {
        if page.is_empty() {
            return Ok(ReplyOutcome::NoMoreResults(
                self.settings.messages.no_more_results.clone(),
            ));
        }

        let enriched = enrich_page(
            self.details.as_ref(),
            self.shortener.as_ref(),
            page,
            now,
            self.settings.timezone,
        )
        .await?;

        for write in cache_writes(&enriched) {
            let places = Arc::clone(&self.places);
            match write {
                CacheWrite::Hours { id, hours } => {
                    self.background.spawn("cache_hours", async move {
                        places.update_cached_hours(id, &hours).await
                    });
                },
                CacheWrite::Name { id, name } => {
                    self.background.spawn("cache_name", async move {
                        places.update_cached_name(id, &name).await
                    });
                },
            }
        }

        Ok(ReplyOutcome::Results {
            text: format_page(&enriched, &self.settings.messages.more_hint),
            places: enriched.len(),
        })
    }
}
