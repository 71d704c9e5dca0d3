use crate::{config::Config, live_query::LiveQueryClient};
use std::sync::mpsc::Sender;

mod login;
mod session;
mod sessions;
mod trace_drawer;

#[cfg(test)]
mod trace_drawer_test;

use login::LoginPage;
use session::SessionPage;
use sessions::SessionsPage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Login,
    Sessions,
    Session(String),
}

pub enum PageAction {
    Navigate(Route),
    Logout,
}

pub struct PageContext<'a> {
    pub live_query: &'a LiveQueryClient,
    pub action_sender: &'a Sender<PageAction>,
    pub config: &'a Config,
}

impl PageContext<'_> {
    pub fn navigate(&self, route: Route) {
        self.action_sender.send(PageAction::Navigate(route)).ok();
    }
}

pub struct PagesRouter {
    current_page: Route,
    login_page: LoginPage,
    sessions_page: SessionsPage,
    session_page: Option<SessionPage>,
}

impl PagesRouter {
    pub fn new(initial: Route) -> Self {
        let mut router = Self {
            current_page: Route::Login,
            login_page: LoginPage::new(),
            sessions_page: SessionsPage::new(),
            session_page: None,
        };
        router.navigate(initial);
        router
    }

    pub fn current(&self) -> &Route {
        &self.current_page
    }

    pub fn mount(&mut self, ctx: &egui::Context, page_ctx: &mut PageContext) {
        match &self.current_page {
            Route::Login => self.login_page.render(ctx, page_ctx),
            Route::Sessions => self.sessions_page.render(ctx, page_ctx),
            Route::Session(_) => {
                if let Some(page) = self.session_page.as_mut() {
                    page.render(ctx, page_ctx);
                }
            }
        }
    }

    /// Leaving a session drops its page, which aborts any stream it owns.
    pub fn navigate(&mut self, page: Route) {
        if self.current_page == page {
            return;
        }
        log::debug!("navigating from {:?} to {:?}", self.current_page, page);

        self.session_page = match &page {
            Route::Session(session_id) => Some(SessionPage::new(session_id.clone())),
            _ => None,
        };
        if page == Route::Login {
            self.login_page = LoginPage::new();
        }
        self.current_page = page;
    }
}
