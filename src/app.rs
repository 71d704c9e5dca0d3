use std::sync::{
    Arc,
    mpsc::{Receiver, Sender, channel},
};

use crate::{
    actions::{ActionContext, handle_action},
    api::AuthSession,
    config::Config,
    live_query::LiveQueryClient,
    pages::{PageAction, PageContext, PagesRouter, Route},
};

pub struct App {
    config: Config,
    auth: Arc<AuthSession>,
    live_query: LiveQueryClient,
    pages_router: PagesRouter,

    action_sender: Sender<PageAction>,
    action_receiver: Receiver<PageAction>,
}

impl App {
    pub fn new(config: Config, auth: Arc<AuthSession>, live_query: LiveQueryClient) -> Self {
        let (action_sender, action_receiver) = channel();
        let initial = if auth.is_authenticated() {
            Route::Sessions
        } else {
            Route::Login
        };

        Self {
            config,
            auth,
            live_query,
            pages_router: PagesRouter::new(initial),

            action_sender,
            action_receiver,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.live_query.poll(ctx);

        if self.auth.take_login_required() {
            log::info!("credentials rejected by the server, returning to login");
            self.live_query.clear();
            self.pages_router.navigate(Route::Login);
        }

        while let Ok(action) = self.action_receiver.try_recv() {
            let mut action_ctx = ActionContext {
                pages_router: &mut self.pages_router,
                live_query: &self.live_query,
                auth: &self.auth,
            };
            handle_action(&mut action_ctx, action);
        }

        self.auth
            .set_on_login_view(*self.pages_router.current() == Route::Login);

        let mut page_ctx = PageContext {
            live_query: &self.live_query,
            action_sender: &self.action_sender,
            config: &self.config,
        };
        self.pages_router.mount(ctx, &mut page_ctx);
    }
}
