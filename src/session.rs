use crate::client::Client;
use crate::error::ReportError;
use crate::models::{Account, CommissionRecord, ReportFilters, ReportWindow, Session};
use log::debug;

/// A logged-in session that must be ended with [`ActiveSession::close`].
///
/// `close` takes the session by value, so it can only be revoked once.
#[derive(Debug)]
pub struct ActiveSession<'a> {
    client: &'a Client,
    account: Account,
    session: Session,
}

impl<'a> ActiveSession<'a> {
    /// Log in and hold on to the returned account and session.
    pub async fn open(client: &'a Client, email: &str, password: &str) -> Result<Self, ReportError> {
        let context = client.create_session(email, password).await?;
        if let Some(expires) = context.session.expires {
            debug!("Session {} expires at {}", context.session.id, expires);
        }
        Ok(Self {
            client,
            account: context.account,
            session: context.session,
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub async fn fetch_commissions(
        &self,
        window: &ReportWindow,
        filters: &ReportFilters,
    ) -> Result<Vec<CommissionRecord>, ReportError> {
        self.client
            .fetch_commissions(&self.session.token, window, filters)
            .await
    }

    /// Revoke the session on the server.
    pub async fn close(self) -> Result<(), ReportError> {
        self.client
            .delete_session(&self.account.id, &self.session.id, &self.session.token)
            .await
    }
}
