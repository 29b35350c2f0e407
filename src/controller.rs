use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::IdentityProvider;
use crate::chart::{bar, line, radar, SvgCanvas};
use crate::client::GraphqlClient;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{ProfileData, SkillPoint, Summary, User, XpPoint};
use crate::query::profile_query;
use crate::session::{KeyValueStore, SessionStore};
use crate::transform;
use crate::transport::Transport;

/// Everything shown once a load succeeds. Rebuilt from scratch on every load.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub login: String,
    pub display_name: String,
    pub summary: Summary,
    pub xp_series: Vec<XpPoint>,
    pub project_totals: HashMap<String, f64>,
    pub skills: Vec<SkillPoint>,
    pub xp_progress: SvgCanvas,
    pub xp_by_project: SvgCanvas,
    pub skill_radar: SvgCanvas,
}

impl Dashboard {
    pub fn build(user: &User) -> Self {
        let xp_series = transform::cumulative_xp_series(&user.transactions);
        let project_totals = transform::xp_by_project(&user.transactions);
        let skills = transform::skill_series(&user.skills);

        let mut xp_progress = SvgCanvas::new();
        line::render(&mut xp_progress, &xp_series);
        let mut xp_by_project = SvgCanvas::new();
        bar::render(&mut xp_by_project, &project_totals);
        let mut skill_radar = SvgCanvas::new();
        radar::render(&mut skill_radar, &skills);

        Self {
            login: user.login.clone(),
            display_name: user.display_name(),
            summary: transform::summarize(user),
            xp_series,
            project_totals,
            skills,
            xp_progress,
            xp_by_project,
            skill_radar,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageState {
    LoggedOut { notice: Option<String> },
    Loading,
    Loaded(Box<Dashboard>),
    Error { message: String },
}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::LoggedOut { .. } => "logged-out",
            PageState::Loading => "loading",
            PageState::Loaded(_) => "loaded",
            PageState::Error { .. } => "error",
        }
    }
}

pub struct PageController<S, T> {
    session: SessionStore<S>,
    identity: IdentityProvider<T>,
    client: GraphqlClient<T>,
    query: String,
    state: PageState,
}

impl<S: KeyValueStore, T: Transport> PageController<S, T> {
    pub fn new(session: SessionStore<S>, transport: Arc<T>, config: &Config) -> Self {
        Self {
            session,
            identity: IdentityProvider::new(transport.clone(), config.signin_url()),
            client: GraphqlClient::new(transport, config.graphql_url()),
            query: profile_query(config.event_id),
            state: PageState::LoggedOut { notice: None },
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// Authenticates, stores the token, then loads.
    pub async fn sign_in(&mut self, username: &str, password: &str) -> &PageState {
        if matches!(self.state, PageState::Loading) {
            warn!("sign-in ignored while a load is in flight");
            return &self.state;
        }

        let established = match self.identity.sign_in(username, password).await {
            Ok(token) => self.session.set_token(&token),
            Err(err) => Err(err),
        };
        if let Err(err) = established {
            warn!(error = %err, "sign-in did not establish a session");
            self.transition(PageState::LoggedOut {
                notice: Some(err.user_message()),
            });
            return &self.state;
        }

        self.load().await;
        &self.state
    }

    /// Picks up a persisted session, as on a page reload.
    pub async fn resume(&mut self) -> &PageState {
        match self.session.token() {
            Ok(Some(_)) => self.load().await,
            Ok(None) => self.transition(PageState::LoggedOut { notice: None }),
            Err(err) => {
                error!(error = %err, "could not read session");
                self.transition(PageState::LoggedOut {
                    notice: Some(err.user_message()),
                });
            }
        }
        &self.state
    }

    pub async fn retry(&mut self) -> &PageState {
        if matches!(self.state, PageState::Error { .. }) {
            info!("retrying load");
            self.load().await;
        }
        &self.state
    }

    /// Clears the stored token. A failed clear is returned and noted on the
    /// logged-out state, since the token would otherwise survive.
    pub fn logout(&mut self) -> Result<()> {
        match self.session.clear_token() {
            Ok(()) => {
                self.transition(PageState::LoggedOut { notice: None });
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "could not clear session on logout");
                self.transition(PageState::LoggedOut {
                    notice: Some(err.user_message()),
                });
                Err(err)
            }
        }
    }

    async fn load(&mut self) {
        if matches!(self.state, PageState::Loading) {
            warn!("load already in flight");
            return;
        }
        self.transition(PageState::Loading);

        let next = match self.fetch_dashboard().await {
            Ok(dashboard) => PageState::Loaded(Box::new(dashboard)),
            Err(err) if err.ends_session() => {
                self.session.clear_quietly();
                PageState::LoggedOut {
                    notice: Some(err.user_message()),
                }
            }
            Err(err) => {
                error!(error = %err, "dashboard load failed");
                PageState::Error {
                    message: err.user_message(),
                }
            }
        };
        self.transition(next);
    }

    async fn fetch_dashboard(&mut self) -> Result<Dashboard> {
        let data = self.client.fetch_data(&mut self.session, &self.query).await?;
        let profile = ProfileData::from_data(data)?;
        let user = profile.user.first().ok_or(DashboardError::NoUserData)?;
        Ok(Dashboard::build(user))
    }

    fn transition(&mut self, next: PageState) {
        info!(from = self.state.name(), to = next.name(), "page state");
        self.state = next;
    }
}
